//! Configuration loading from sentinel.toml.
//!
//! Declares sentinels whose answers are fixed per capability, and the
//! controllers guarded by them. Predicate guards and computed decisions
//! need code; this file covers everything that can be stated as data.

use controller::convention::{self, CURRENT_USER};
use controller::{ActionFilter, ControllerDefinition, Request, RequestContext, SentinelRegistry};
use policy::{Attributes, Capability, Policy, Sentinel};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Sentinel types by name (`UserSentinel`, ...).
    #[serde(default)]
    pub sentinels: BTreeMap<String, SentinelConfig>,

    /// Controllers by name (`UsersController`, ...).
    #[serde(default)]
    pub controllers: BTreeMap<String, ControllerConfig>,
}

/// A sentinel with fixed answers.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SentinelConfig {
    /// Declared attributes. Defaults to `current_user` plus the model
    /// derived from the sentinel name.
    pub attributes: Option<Vec<String>>,

    /// Capabilities answered `true`.
    #[serde(default)]
    pub grants: BTreeSet<Capability>,

    /// Custom capabilities and their answers.
    #[serde(default)]
    pub custom: BTreeMap<String, bool>,
}

/// Access control of one controller.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControllerConfig {
    /// Attach the conventional sentinel and guard the RESTful actions.
    #[serde(default)]
    pub restful: bool,

    /// Attach this sentinel type instead of the conventional one.
    pub sentinel: Option<String>,

    /// Stop running guards once a handler has rendered.
    #[serde(default)]
    pub halt_on_render: bool,

    /// Extra guards, run after the RESTful ones.
    #[serde(default)]
    pub guards: Vec<GuardConfig>,
}

/// One capability guard.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GuardConfig {
    pub capability: Capability,
    pub only: Option<Vec<String>>,
    pub except: Option<Vec<String>>,
    #[serde(default = "default_handler")]
    pub denies_with: String,
}

fn default_handler() -> String {
    "default".to_string()
}

impl GuardConfig {
    fn filter(&self) -> Result<ActionFilter, ConfigError> {
        match (&self.only, &self.except) {
            (Some(_), Some(_)) => Err(ConfigError::ConflictingFilter(self.capability.to_string())),
            (Some(only), None) => Ok(ActionFilter::only(only.iter().cloned())),
            (None, Some(except)) => Ok(ActionFilter::except(except.iter().cloned())),
            (None, None) => Ok(ActionFilter::All),
        }
    }
}

/// A sentinel built from [`SentinelConfig`].
#[derive(Debug, Clone)]
pub struct StaticSentinel {
    name: String,
    attributes: BTreeSet<String>,
    grants: BTreeSet<Capability>,
    custom: BTreeMap<String, bool>,
}

impl StaticSentinel {
    pub fn from_config(name: &str, config: &SentinelConfig) -> Result<Self, ConfigError> {
        let attributes = match &config.attributes {
            Some(attributes) => attributes.iter().cloned().collect(),
            None => {
                let model = policy::scope::model_for_sentinel(name)
                    .map_err(|e| ConfigError::Invalid(e.to_string()))?;
                [CURRENT_USER.to_string(), model.to_lowercase()].into_iter().collect()
            }
        };

        Ok(Self {
            name: name.to_string(),
            attributes,
            grants: config.grants.clone(),
            custom: config.custom.clone(),
        })
    }
}

impl Policy for StaticSentinel {
    fn name(&self) -> &str {
        &self.name
    }

    fn declares(&self, attribute: &str) -> bool {
        self.attributes.contains(attribute)
    }

    fn index(&self, _attrs: &Attributes) -> bool {
        self.grants.contains(&Capability::Index)
    }

    fn create(&self, _attrs: &Attributes) -> bool {
        self.grants.contains(&Capability::Create)
    }

    fn read(&self, _attrs: &Attributes) -> bool {
        self.grants.contains(&Capability::Read)
    }

    fn update(&self, _attrs: &Attributes) -> bool {
        self.grants.contains(&Capability::Update)
    }

    fn destroy(&self, _attrs: &Attributes) -> bool {
        self.grants.contains(&Capability::Destroy)
    }

    fn custom(&self, capability: &str, _attrs: &Attributes) -> Option<bool> {
        self.custom.get(capability).copied().or_else(|| {
            self.grants
                .contains(&Capability::custom(capability))
                .then_some(true)
        })
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::parse(&content)?;
        debug!(
            path = %path.as_ref().display(),
            sentinels = config.sentinels.len(),
            controllers = config.controllers.len(),
            "loaded config"
        );
        Ok(config)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check references that would otherwise only fail on first request.
    fn validate(&self) -> Result<(), ConfigError> {
        for (controller, config) in &self.controllers {
            if let Some(sentinel) = &config.sentinel {
                if !self.sentinels.contains_key(sentinel) {
                    return Err(ConfigError::UnknownSentinel {
                        controller: controller.clone(),
                        sentinel: sentinel.clone(),
                    });
                }
            }
            for guard in &config.guards {
                guard.filter()?;
            }
        }
        Ok(())
    }

    /// Registry holding every configured sentinel.
    pub fn registry(&self) -> Result<SentinelRegistry, ConfigError> {
        let mut registry = SentinelRegistry::new();
        for (name, config) in &self.sentinels {
            registry.register(StaticSentinel::from_config(name, config)?);
        }
        Ok(registry)
    }

    pub fn controller_config(&self, name: &str) -> Option<&ControllerConfig> {
        self.controllers.get(name)
    }

    /// Build the definition of a configured controller.
    pub fn controller(
        &self,
        name: &str,
        registry: Arc<SentinelRegistry>,
    ) -> Result<ControllerDefinition<Request>, ConfigError> {
        let config = self
            .controller_config(name)
            .ok_or_else(|| ConfigError::UnknownController(name.to_string()))?;

        let mut builder = ControllerDefinition::<Request>::builder(name);
        if config.restful {
            builder = builder.restful_access_control(Arc::clone(&registry));
        }
        if let Some(sentinel) = config.sentinel.clone() {
            let model = policy::scope::model_for_sentinel(&sentinel)
                .map_err(|e| ConfigError::Invalid(e.to_string()))?
                .to_lowercase();
            builder = builder.controls_access_with(move |req: &Request| {
                let policy = registry.lookup(&sentinel)?;
                let subject = req.assigned(&model).unwrap_or_default();
                Ok(Sentinel::from_shared(
                    policy,
                    [(CURRENT_USER.to_string(), req.current_user()), (model.clone(), subject)],
                )?)
            });
        }
        for guard in &config.guards {
            builder = builder.grants_access_to_with(
                guard.capability.clone(),
                guard.filter()?,
                guard.denies_with.clone(),
            );
        }

        let definition = builder.build()?;
        debug!(controller = name, guards = definition.guards().len(), "built controller");
        Ok(definition)
    }

    /// Sentinel the controller is expected to use, for diagnostics.
    pub fn sentinel_for(&self, controller: &str) -> Option<String> {
        let config = self.controller_config(controller)?;
        config
            .sentinel
            .clone()
            .or_else(|| config.restful.then(|| convention::sentinel_name_for(controller)))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("controller '{0}' is not configured")]
    UnknownController(String),

    #[error("{controller} uses sentinel '{sentinel}', which is not configured")]
    UnknownSentinel { controller: String, sentinel: String },

    #[error("guard on '{0}' sets both `only` and `except`")]
    ConflictingFilter(String),

    #[error(transparent)]
    Controller(#[from] controller::Error),
}
