//! Target properties that can be predicted for a concrete mix

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Physical property of fiber-reinforced concrete predicted by one of the models.
///
/// Serialized as its label; selectors are parsed case-insensitively both
/// from JSON and through [`FromStr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum TargetProperty {
    /// Split-tensile strength
    #[serde(rename = "STS")]
    Sts,
    /// Compressive strength
    #[serde(rename = "CS")]
    Cs,
    /// Slump
    #[serde(rename = "Slump")]
    Slump,
}

impl TargetProperty {
    /// All properties, in the order the form lists them
    pub const ALL: [TargetProperty; 3] = [TargetProperty::Sts, TargetProperty::Cs, TargetProperty::Slump];

    /// Short selector label (`STS`, `CS`, `Slump`)
    pub fn label(self) -> &'static str {
        match self {
            TargetProperty::Sts => "STS",
            TargetProperty::Cs => "CS",
            TargetProperty::Slump => "Slump",
        }
    }

    /// Human readable name of the property
    pub fn long_name(self) -> &'static str {
        match self {
            TargetProperty::Sts => "split-tensile strength",
            TargetProperty::Cs => "compressive strength",
            TargetProperty::Slump => "slump",
        }
    }

    /// Position of this property in [`TargetProperty::ALL`]
    pub(crate) fn index(self) -> usize {
        match self {
            TargetProperty::Sts => 0,
            TargetProperty::Cs => 1,
            TargetProperty::Slump => 2,
        }
    }
}

impl fmt::Display for TargetProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a selector string names no known property
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown target property '{0}' (expected STS, CS or Slump)")]
pub struct UnknownProperty(pub String);

impl FromStr for TargetProperty {
    type Err = UnknownProperty;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sts" => Ok(TargetProperty::Sts),
            "cs" => Ok(TargetProperty::Cs),
            "slump" => Ok(TargetProperty::Slump),
            _ => Err(UnknownProperty(s.to_string())),
        }
    }
}

impl TryFrom<String> for TargetProperty {
    type Error = UnknownProperty;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
