use thiserror::Error;

use crate::domain::{DateRange, ObservationDate, Symbol};
use crate::source::SourceId;

/// Validation and contract errors raised while constructing domain values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter, digit or '^': '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid source '{value}', expected one of yahoo, fred")]
    InvalidSource { value: String },

    #[error("date must be ISO calendar format (YYYY-MM-DD): '{value}'")]
    InvalidDate { value: String },
    #[error("range start {start} is after end {end}")]
    InvertedRange {
        start: ObservationDate,
        end: ObservationDate,
    },

    #[error("series name cannot be empty")]
    EmptySeriesName,
    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("series dates must be strictly increasing, violated at {date}")]
    OutOfOrderObservation { date: ObservationDate },

    #[error("indicator display name cannot be empty")]
    EmptyIndicatorName,
    #[error("catalog already contains an indicator named '{name}'")]
    DuplicateIndicator { name: String },
}

/// Failure of one series fetch.
///
/// Errors are scoped to a single indicator: a failed fetch must never stop
/// other indicators from being fetched and rendered. `retryable()` marks the
/// transient subset eligible for bounded retry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The source requires a credential and none was configured. Raised at
    /// adapter construction, or per-fetch when the source was left
    /// unconfigured for that reason.
    #[error("no API credential configured for source '{source}'")]
    MissingCredential { source: SourceId },

    /// The provider answered but had no observations for the symbol/range.
    /// Not an empty-series success: callers get the symbol and range back so
    /// the gap can be surfaced per indicator.
    #[error("no observations for '{symbol}' in {range}")]
    NoData { symbol: Symbol, range: DateRange },

    /// Transport failure or non-success status from the provider.
    #[error("source '{source}' unavailable: {message}")]
    ProviderUnavailable { source: SourceId, message: String },

    /// Caller-side request construction error.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The provider returned a payload this crate could not normalize.
    #[error("internal: {0}")]
    Internal(String),
}

impl FetchError {
    pub fn provider_unavailable(source: SourceId, message: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            source,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether a repeat of the same request could plausibly succeed.
    pub const fn retryable(&self) -> bool {
        matches!(self, Self::ProviderUnavailable { .. })
    }

    /// Stable machine-readable code, used in logs and surfaced diagnostics.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingCredential { .. } => "fetch.missing_credential",
            Self::NoData { .. } => "fetch.no_data",
            Self::ProviderUnavailable { .. } => "fetch.provider_unavailable",
            Self::InvalidRequest(_) => "fetch.invalid_request",
            Self::Internal(_) => "fetch.internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_provider_unavailable_is_retryable() {
        let transient = FetchError::provider_unavailable(SourceId::Yahoo, "timeout");
        assert!(transient.retryable());

        let missing = FetchError::MissingCredential {
            source: SourceId::Fred,
        };
        assert!(!missing.retryable());

        let internal = FetchError::internal("bad payload");
        assert!(!internal.retryable());
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(
            FetchError::MissingCredential {
                source: SourceId::Fred
            }
            .code(),
            "fetch.missing_credential"
        );
        assert_eq!(
            FetchError::provider_unavailable(SourceId::Yahoo, "x").code(),
            "fetch.provider_unavailable"
        );
    }
}
