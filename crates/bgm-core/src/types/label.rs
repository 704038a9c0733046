//! Curve identity labels.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};

/// Qualified curve name, `namespace.name` (e.g. `USD.SOFR`).
///
/// Equality and hashing are by qualified name; ordering is by namespace, then name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurveLabel {
    namespace: String,
    name: String,
}

impl CurveLabel {
    /// Creates a label from its two parts. Neither may be empty or contain `.`.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> CoreResult<Self> {
        let namespace = namespace.into();
        let name = name.into();
        for part in [&namespace, &name] {
            if part.trim().is_empty() {
                return Err(CoreError::invalid_label(
                    format!("{namespace}.{name}"),
                    "empty component",
                ));
            }
            if part.contains('.') {
                return Err(CoreError::invalid_label(
                    format!("{namespace}.{name}"),
                    "component contains '.'",
                ));
            }
        }
        Ok(Self { namespace, name })
    }

    /// Parses `namespace.name`.
    pub fn parse(qualified: &str) -> CoreResult<Self> {
        match qualified.split_once('.') {
            Some((namespace, name)) => Self::new(namespace.trim(), name.trim()),
            None => Err(CoreError::invalid_label(qualified, "expected 'namespace.name'")),
        }
    }

    /// Namespace part (usually a currency).
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Name part.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `namespace.name`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }
}

impl fmt::Display for CurveLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

impl TryFrom<String> for CurveLabel {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurveLabel> for String {
    fn from(label: CurveLabel) -> Self {
        label.qualified_name()
    }
}

/// Identity of an evolving curve: the funding (discounting) curve and the
/// forward (projection) curve.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EvolutionLabels {
    /// Discounting curve label.
    pub funding: CurveLabel,
    /// Projection curve label.
    pub forward: CurveLabel,
}

impl EvolutionLabels {
    /// Creates a label pair.
    #[must_use]
    pub fn new(funding: CurveLabel, forward: CurveLabel) -> Self {
        Self { funding, forward }
    }
}

impl fmt::Display for EvolutionLabels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.funding, self.forward)
    }
}
