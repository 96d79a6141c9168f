//! Authorization scopes on the data layer.
//!
//! A sentinel may publish a named, filtered query on the model it guards
//! (e.g. `ArticleSentinel` registers `visible_to` on `Article`). Query
//! execution belongs to the host's data layer; this module only derives the
//! model name and hands the filter over.

use crate::{Error, Policy, Result};

/// Data-layer hook that accepts named query scopes.
pub trait ScopeRegistrar<F> {
    /// Register `filter` as a scope called `name` on `model`.
    fn named_scope(&mut self, model: &str, name: &str, filter: F);
}

/// Model name guarded by a sentinel type: `ArticleSentinel` → `Article`.
pub fn model_for_sentinel(sentinel: &str) -> Result<&str> {
    let model = sentinel.rsplit("::").next().unwrap_or(sentinel);
    match model.strip_suffix("Sentinel") {
        Some(model) if !model.is_empty() => Ok(model),
        _ => Err(Error::InvalidSentinelName(sentinel.to_string())),
    }
}

/// Add an authorization scope to the model associated with `policy`.
pub fn auth_scope<R, F>(policy: &dyn Policy, registrar: &mut R, name: &str, filter: F) -> Result<()>
where
    R: ScopeRegistrar<F> + ?Sized,
{
    let model = model_for_sentinel(policy.name())?;
    registrar.named_scope(model, name, filter);
    Ok(())
}
