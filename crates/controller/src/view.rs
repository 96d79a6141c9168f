//! Permission queries for templates.

use crate::{ControllerDefinition, RequestContext, Result};
use policy::{Capability, Sentinel, Value};

/// Would `sentinel` grant `capability` with `overrides` applied?
///
/// Evaluates against an overridden copy; `sentinel` itself is not changed.
pub fn permitted_to<I, K, V>(
    sentinel: &Sentinel,
    capability: &Capability,
    overrides: I,
) -> policy::Result<bool>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    sentinel.with_overrides(overrides)?.permits(capability)
}

impl<C: RequestContext + 'static> ControllerDefinition<C> {
    /// Template helper: ask the request's sentinel about `capability`
    /// under temporary attribute overrides.
    pub fn permitted_to<I, K, V>(
        &self,
        ctx: &C,
        capability: &Capability,
        overrides: I,
    ) -> Result<bool>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let sentinel = self.sentinel(ctx)?;
        Ok(permitted_to(&sentinel, capability, overrides)?)
    }
}
