use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Canonical identifiers for the two configured data sources.
///
/// Catalog entries carry one of these tags; the service resolves the tag to
/// the matching adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    /// Market data (daily price history, Yahoo chart API shape).
    Yahoo,
    /// Macroeconomic data (FRED observations API shape).
    Fred,
}

impl SourceId {
    pub const ALL: [Self; 2] = [Self::Yahoo, Self::Fred];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yahoo => "yahoo",
            Self::Fred => "fred",
        }
    }

    /// Whether this source needs an API credential at adapter construction.
    pub const fn requires_credential(self) -> bool {
        matches!(self, Self::Fred)
    }
}

impl Display for SourceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for SourceId {}

impl FromStr for SourceId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "yahoo" => Ok(Self::Yahoo),
            "fred" => Ok(Self::Fred),
            other => Err(ValidationError::InvalidSource {
                value: other.to_owned(),
            }),
        }
    }
}
