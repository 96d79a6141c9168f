use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named yes/no permission query answered by a sentinel.
///
/// The five RESTful capabilities have dedicated variants; anything else is
/// carried as [`Capability::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Capability {
    Index,
    Create,
    Read,
    Update,
    Destroy,
    Custom(String),
}

impl Capability {
    /// The built-in capabilities, in declaration order.
    pub const RESTFUL: [Capability; 5] = [
        Capability::Index,
        Capability::Create,
        Capability::Read,
        Capability::Update,
        Capability::Destroy,
    ];

    pub fn custom(name: impl Into<String>) -> Self {
        Self::from(name.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Capability::Index => "index",
            Capability::Create => "create",
            Capability::Read => "read",
            Capability::Update => "update",
            Capability::Destroy => "destroy",
            Capability::Custom(name) => name,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Capability::Custom(_))
    }
}

impl From<String> for Capability {
    fn from(name: String) -> Self {
        match name.as_str() {
            "index" => Capability::Index,
            "create" => Capability::Create,
            "read" => Capability::Read,
            "update" => Capability::Update,
            "destroy" => Capability::Destroy,
            _ => Capability::Custom(name),
        }
    }
}

impl From<&str> for Capability {
    fn from(name: &str) -> Self {
        Self::from(name.to_string())
    }
}

impl From<Capability> for String {
    fn from(capability: Capability) -> Self {
        match capability {
            Capability::Custom(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl FromStr for Capability {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
