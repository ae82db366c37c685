use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MAX_SYMBOL_LEN: usize = 20;

/// Normalized provider identifier for one series.
///
/// Covers both market tickers (`BTC-USD`, `GC=F`, `^TNX`) and macro series
/// codes (`M2SL`, `CPIAUCSL`). Index tickers may lead with `^`; futures
/// tickers carry `=`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Parse and normalize a symbol to uppercase.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }

        let normalized = trimmed.to_ascii_uppercase();
        let len = normalized.chars().count();
        if len > MAX_SYMBOL_LEN {
            return Err(ValidationError::SymbolTooLong {
                len,
                max: MAX_SYMBOL_LEN,
            });
        }

        for (index, ch) in normalized.chars().enumerate() {
            if index == 0 {
                if !(ch.is_ascii_alphanumeric() || ch == '^') {
                    return Err(ValidationError::SymbolInvalidStart { ch });
                }
                continue;
            }

            let valid = ch.is_ascii_alphanumeric() || ch == '.' || ch == '-' || ch == '=';
            if !valid {
                return Err(ValidationError::SymbolInvalidChar { ch, index });
            }
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for Symbol {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_normalizes_symbol() {
        let parsed = Symbol::parse(" btc-usd ").expect("symbol should parse");
        assert_eq!(parsed.as_str(), "BTC-USD");
    }

    #[test]
    fn accepts_catalog_shapes() {
        for raw in ["GC=F", "CL=F", "^TNX", "M2SL", "CPIAUCSL"] {
            let parsed = Symbol::parse(raw).expect("catalog symbol should parse");
            assert_eq!(parsed.as_str(), raw);
        }
    }

    #[test]
    fn rejects_caret_after_first_char() {
        let err = Symbol::parse("TN^X").expect_err("must fail");
        assert!(matches!(err, ValidationError::SymbolInvalidChar { ch: '^', .. }));
    }

    #[test]
    fn rejects_invalid_chars() {
        let err = Symbol::parse("M2SL$").expect_err("must fail");
        assert!(matches!(err, ValidationError::SymbolInvalidChar { .. }));
    }

    #[test]
    fn rejects_empty_symbol() {
        let err = Symbol::parse("   ").expect_err("must fail");
        assert!(matches!(err, ValidationError::EmptySymbol));
    }
}
