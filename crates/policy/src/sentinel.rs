//! Sentinel: a policy bound to the attributes of one request.

use crate::{Attributes, Capability, Error, Policy, Result, Value};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;

/// A policy object answering permission questions for one actor and subject.
///
/// Cloning is cheap: the policy is shared and attributes are copied by value.
#[derive(Clone)]
pub struct Sentinel {
    policy: Arc<dyn Policy>,
    attributes: Attributes,
}

impl Sentinel {
    /// Build a sentinel from named attributes.
    ///
    /// Fails with [`Error::UnknownAttribute`] when a name is outside the
    /// policy's schema.
    pub fn new<P, I, K, V>(policy: P, attributes: I) -> Result<Self>
    where
        P: Policy + 'static,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::from_shared(Arc::new(policy), attributes)
    }

    /// Like [`Sentinel::new`] for a policy that is already shared, as held
    /// by a registry.
    pub fn from_shared<I, K, V>(policy: Arc<dyn Policy>, attributes: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut sentinel = Self {
            policy,
            attributes: Attributes::new(),
        };
        for (name, value) in attributes {
            sentinel.set(name, value)?;
        }
        Ok(sentinel)
    }

    /// Sentinel type name.
    pub fn name(&self) -> &str {
        self.policy.name()
    }

    pub fn policy(&self) -> &Arc<dyn Policy> {
        &self.policy
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        self.attributes.get_as(name)
    }

    /// Assign a declared attribute.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let name = name.into();
        if !self.policy.declares(&name) {
            return Err(Error::UnknownAttribute {
                sentinel: self.name().to_string(),
                attribute: name,
            });
        }
        self.attributes.insert(name, value);
        Ok(())
    }

    /// Copy of this sentinel with some attributes temporarily replaced.
    ///
    /// The receiver is left untouched. Attributes not named in `overrides`
    /// keep the receiver's values.
    pub fn with_overrides<I, K, V>(&self, overrides: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut duplicate = self.clone();
        for (name, value) in overrides {
            duplicate.set(name, value)?;
        }
        Ok(duplicate)
    }

    /// Evaluate a capability against the current attributes.
    pub fn permits(&self, capability: &Capability) -> Result<bool> {
        let attrs = &self.attributes;
        let granted = match capability {
            Capability::Index => self.policy.index(attrs),
            Capability::Create => self.policy.create(attrs),
            Capability::Read => self.policy.read(attrs),
            Capability::Update => self.policy.update(attrs),
            Capability::Destroy => self.policy.destroy(attrs),
            Capability::Custom(name) => {
                self.policy
                    .custom(name, attrs)
                    .ok_or_else(|| Error::NoSuchCapability {
                        sentinel: self.name().to_string(),
                        capability: name.clone(),
                    })?
            }
        };
        Ok(granted)
    }

    pub fn index(&self) -> bool {
        self.policy.index(&self.attributes)
    }

    pub fn create(&self) -> bool {
        self.policy.create(&self.attributes)
    }

    pub fn read(&self) -> bool {
        self.policy.read(&self.attributes)
    }

    pub fn update(&self) -> bool {
        self.policy.update(&self.attributes)
    }

    pub fn destroy(&self) -> bool {
        self.policy.destroy(&self.attributes)
    }
}

impl fmt::Debug for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sentinel")
            .field("name", &self.name())
            .field("attributes", &self.attributes)
            .finish()
    }
}
