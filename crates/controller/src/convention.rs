//! RESTful access control by naming convention.
//!
//! `ArticlesController` guards its actions with `ArticleSentinel`, built
//! from the current user and the request's assigned `article`. Sentinel
//! types are looked up by name in an explicit [`SentinelRegistry`] filled
//! at startup.

use crate::guard::ActionFilter;
use crate::{ControllerBuilder, Error, RequestContext, Result};
use policy::{Capability, Policy, Sentinel};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Attribute carrying the identified actor.
pub const CURRENT_USER: &str = "current_user";

/// Nouns whose singular is not derived by suffix rules.
const IRREGULAR: &[(&str, &str)] = &[
    ("people", "person"),
    ("men", "man"),
    ("women", "woman"),
    ("children", "child"),
    ("mice", "mouse"),
    ("geese", "goose"),
    ("teeth", "tooth"),
    ("feet", "foot"),
    ("oxen", "ox"),
    ("knives", "knife"),
    ("wives", "wife"),
    ("leaves", "leaf"),
    ("halves", "half"),
    ("moves", "move"),
];

/// Nouns with identical singular and plural.
const UNCOUNTABLE: &[&str] = &[
    "equipment",
    "information",
    "news",
    "series",
    "species",
    "sheep",
    "fish",
    "deer",
];

/// Suffix rewrites, most specific first. The first matching suffix wins.
const SINGULAR_RULES: &[(&str, &str)] = &[
    ("quizzes", "quiz"),
    ("matrices", "matrix"),
    ("vertices", "vertex"),
    ("indices", "index"),
    ("aliases", "alias"),
    ("alias", "alias"),
    ("statuses", "status"),
    ("status", "status"),
    ("viruses", "virus"),
    ("virus", "virus"),
    ("octopi", "octopus"),
    ("octopus", "octopus"),
    ("buses", "bus"),
    ("bus", "bus"),
    ("campuses", "campus"),
    ("campus", "campus"),
    ("bonuses", "bonus"),
    ("bonus", "bonus"),
    ("analyses", "analysis"),
    ("crises", "crisis"),
    ("diagnoses", "diagnosis"),
    ("parentheses", "parenthesis"),
    ("synopses", "synopsis"),
    ("theses", "thesis"),
    ("shoes", "shoe"),
    ("movies", "movie"),
    ("oes", "o"),
    ("sses", "ss"),
    ("shes", "sh"),
    ("ches", "ch"),
    ("xes", "x"),
    ("zzes", "zz"),
    ("ies", "y"),
    ("ss", "ss"),
    ("sis", "sis"),
    ("s", ""),
];

/// Singular form of a lowercase English plural.
fn singularize(word: &str) -> String {
    if UNCOUNTABLE.contains(&word) {
        return word.to_string();
    }
    if let Some((plural, singular)) = IRREGULAR.iter().find(|(plural, _)| word.ends_with(plural)) {
        return format!("{}{}", &word[..word.len() - plural.len()], singular);
    }
    for &(suffix, singular) in SINGULAR_RULES {
        let Some(stem) = word.strip_suffix(suffix) else {
            continue;
        };
        // `-ies` becomes `-y` only after a consonant (`categories`) or `qu`.
        if suffix == "ies" && !takes_y(stem) {
            continue;
        }
        return format!("{stem}{singular}");
    }
    word.to_string()
}

fn takes_y(stem: &str) -> bool {
    stem.ends_with("qu") || stem.chars().last().is_some_and(|c| !"aeiouy".contains(c))
}

/// Model attribute name for a controller: `ArticlesController` → `article`.
pub fn model_name_for(controller: &str) -> String {
    let name = controller.rsplit("::").next().unwrap_or(controller);
    let name = name.strip_suffix("Controller").unwrap_or(name);
    singularize(&name.to_lowercase())
}

/// Sentinel type name for a controller: `ArticlesController` → `ArticleSentinel`.
pub fn sentinel_name_for(controller: &str) -> String {
    let model = model_name_for(controller);
    let mut chars = model.chars();
    match chars.next() {
        Some(first) => format!("{}{}Sentinel", first.to_uppercase(), chars.as_str()),
        None => "Sentinel".to_string(),
    }
}

/// Sentinel types known to the application, by type name.
#[derive(Clone, Default)]
pub struct SentinelRegistry {
    policies: BTreeMap<String, Arc<dyn Policy>>,
}

impl SentinelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a policy under its own name. A later registration with the
    /// same name replaces the earlier one.
    pub fn register<P: Policy + 'static>(&mut self, policy: P) -> &mut Self {
        self.register_shared(Arc::new(policy))
    }

    pub fn register_shared(&mut self, policy: Arc<dyn Policy>) -> &mut Self {
        self.policies.insert(policy.name().to_string(), policy);
        self
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<dyn Policy>> {
        match self.policies.get(name) {
            Some(policy) => Ok(Arc::clone(policy)),
            None => {
                tracing::warn!(sentinel = %name, "sentinel type not registered");
                Err(Error::PolicyTypeNotFound(name.to_string()))
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.policies.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.policies.keys().map(String::as_str)
    }
}

impl fmt::Debug for SentinelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.policies.keys()).finish()
    }
}

/// The five standard guards added by [`ControllerBuilder::restful_access_control`].
pub fn restful_guards() -> [(Capability, ActionFilter); 5] {
    [
        (Capability::Index, ActionFilter::only(["index"])),
        (Capability::Create, ActionFilter::only(["new", "create"])),
        (Capability::Read, ActionFilter::only(["show"])),
        (Capability::Update, ActionFilter::only(["edit", "update"])),
        (Capability::Destroy, ActionFilter::only(["destroy"])),
    ]
}

impl<C: RequestContext + 'static> ControllerBuilder<C> {
    /// Attach the conventional sentinel and guard the RESTful actions.
    ///
    /// The sentinel type is resolved from `registry` each time the rule
    /// runs, so a missing type surfaces as [`Error::PolicyTypeNotFound`]
    /// on the first guarded request rather than here.
    pub fn restful_access_control(self, registry: Arc<SentinelRegistry>) -> Self {
        let model = model_name_for(self.name());
        let sentinel = sentinel_name_for(self.name());

        let builder = self.controls_access_with(move |ctx: &C| {
            let policy = registry.lookup(&sentinel)?;
            let subject = ctx.assigned(&model).unwrap_or_default();
            Ok(Sentinel::from_shared(
                policy,
                [(CURRENT_USER.to_string(), ctx.current_user()), (model.clone(), subject)],
            )?)
        });

        restful_guards()
            .into_iter()
            .fold(builder, |builder, (capability, filter)| {
                builder.grants_access_to(capability, filter)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ControllerDefinition, Request};
    use policy::Attributes;
    use serde_json::json;

    #[test]
    fn derives_conventional_names() {
        assert_eq!(model_name_for("ArticlesController"), "article");
        assert_eq!(sentinel_name_for("ArticlesController"), "ArticleSentinel");
        assert_eq!(model_name_for("UsersController"), "user");
        assert_eq!(sentinel_name_for("UsersController"), "UserSentinel");
        assert_eq!(model_name_for("admin::CategoriesController"), "category");
        assert_eq!(sentinel_name_for("BoxesController"), "BoxSentinel");
        assert_eq!(sentinel_name_for("PeopleController"), "PersonSentinel");
        assert_eq!(model_name_for("NewsController"), "news");
        assert_eq!(model_name_for("AddressesController"), "address");
        assert_eq!(model_name_for("StatusController"), "status");
    }

    #[test]
    fn derives_names_for_irregular_suffixes() {
        assert_eq!(model_name_for("MoviesController"), "movie");
        assert_eq!(sentinel_name_for("MoviesController"), "MovieSentinel");
        assert_eq!(sentinel_name_for("StatusesController"), "StatusSentinel");
        assert_eq!(sentinel_name_for("QuizzesController"), "QuizSentinel");
        assert_eq!(sentinel_name_for("BusesController"), "BusSentinel");
        assert_eq!(model_name_for("AnalysesController"), "analysis");
        assert_eq!(model_name_for("HeroesController"), "hero");
        assert_eq!(model_name_for("ShoesController"), "shoe");
        assert_eq!(model_name_for("SoliloquiesController"), "soliloquy");
        assert_eq!(model_name_for("CasesController"), "case");
        assert_eq!(model_name_for("KnivesController"), "knife");
        assert_eq!(model_name_for("MatricesController"), "matrix");
        assert_eq!(model_name_for("DatabasesController"), "database");
        assert_eq!(model_name_for("MenusController"), "menu");
        assert_eq!(model_name_for("AnalysisController"), "analysis");
    }

    #[test]
    fn registry_lookup() {
        let mut registry = SentinelRegistry::new();
        registry.register(UserSentinel);

        assert!(registry.contains("UserSentinel"));
        assert_eq!(registry.lookup("UserSentinel").unwrap().name(), "UserSentinel");
        assert!(matches!(
            registry.lookup("GhostSentinel"),
            Err(Error::PolicyTypeNotFound(ref name)) if name == "GhostSentinel"
        ));
    }

    struct UserSentinel;

    impl Policy for UserSentinel {
        fn name(&self) -> &str {
            "UserSentinel"
        }

        fn declares(&self, attribute: &str) -> bool {
            matches!(attribute, "current_user" | "user")
        }

        fn index(&self, _attrs: &Attributes) -> bool {
            true
        }

        fn update(&self, attrs: &Attributes) -> bool {
            matches!(
                (attrs.get("current_user"), attrs.get("user")),
                (Some(me), Some(them)) if !me.is_null() && me == them
            )
        }
    }

    #[test]
    fn restful_guards_cover_standard_actions() {
        let mut registry = SentinelRegistry::new();
        registry.register(UserSentinel);

        let users = ControllerDefinition::<Request>::builder("UsersController")
            .restful_access_control(Arc::new(registry))
            .build()
            .unwrap();

        let actions: Vec<String> = users.guards().iter().map(|g| g.filter().to_string()).collect();
        assert_eq!(
            actions,
            vec![
                "only [index]",
                "only [create, new]",
                "only [show]",
                "only [edit, update]",
                "only [destroy]",
            ]
        );

        assert!(users.authorize(&mut Request::new("index")).unwrap().proceeds());
        assert!(!users.authorize(&mut Request::new("show")).unwrap().proceeds());
        assert!(!users.authorize(&mut Request::new("new")).unwrap().proceeds());
    }

    #[test]
    fn conventional_rule_binds_actor_and_model() {
        let mut registry = SentinelRegistry::new();
        registry.register(UserSentinel);

        let users = ControllerDefinition::<Request>::builder("UsersController")
            .restful_access_control(Arc::new(registry))
            .build()
            .unwrap();

        let me = json!({"id": 3});
        let mut own = Request::new("update")
            .user(me.clone())
            .assign("user", me.clone());
        assert!(users.authorize(&mut own).unwrap().proceeds());

        let sentinel = users.sentinel(&own).unwrap();
        assert_eq!(sentinel.get("current_user"), Some(&me));
        assert_eq!(sentinel.get("user"), Some(&me));

        let mut other = Request::new("edit")
            .user(me)
            .assign("user", json!({"id": 4}));
        assert!(!users.authorize(&mut other).unwrap().proceeds());
    }

    #[test]
    fn missing_sentinel_type_fails_lazily() {
        let articles = ControllerDefinition::<Request>::builder("ArticlesController")
            .restful_access_control(Arc::new(SentinelRegistry::new()))
            .build()
            .expect("declaration succeeds without the sentinel type");

        let err = articles.authorize(&mut Request::new("show")).unwrap_err();
        assert!(matches!(err, Error::PolicyTypeNotFound(ref name) if name == "ArticleSentinel"));

        // Actions without a guard never touch the registry.
        assert!(articles.authorize(&mut Request::new("feed")).unwrap().proceeds());
    }
}
