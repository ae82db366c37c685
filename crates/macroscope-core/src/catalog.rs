use serde::Serialize;

use crate::domain::Symbol;
use crate::source::SourceId;
use crate::ValidationError;

/// One dashboard indicator: display name, owning source, provider symbol.
///
/// Static data, built once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndicatorEntry {
    name: String,
    source: SourceId,
    symbol: Symbol,
}

impl IndicatorEntry {
    pub fn new(
        name: impl Into<String>,
        source: SourceId,
        symbol: Symbol,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyIndicatorName);
        }
        Ok(Self {
            name,
            source,
            symbol,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn source(&self) -> SourceId {
        self.source
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }
}

/// Ordered, immutable indicator registry.
///
/// Iteration order is insertion order and is significant: it is the display
/// order downstream. No mutation is exposed after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesCatalog {
    entries: Vec<IndicatorEntry>,
}

impl SeriesCatalog {
    pub fn from_entries(entries: Vec<IndicatorEntry>) -> Result<Self, ValidationError> {
        for (index, entry) in entries.iter().enumerate() {
            let duplicated = entries[..index].iter().any(|seen| seen.name == entry.name);
            if duplicated {
                return Err(ValidationError::DuplicateIndicator {
                    name: entry.name.clone(),
                });
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[IndicatorEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SeriesCatalog {
    /// The six dashboard indicators, in display order.
    fn default() -> Self {
        let entries = [
            ("Bitcoin (BTC-USD)", SourceId::Yahoo, "BTC-USD"),
            ("Gold (GC=F)", SourceId::Yahoo, "GC=F"),
            ("Oil (CL=F)", SourceId::Yahoo, "CL=F"),
            ("US 10Y Treasury Yield (TNX)", SourceId::Yahoo, "^TNX"),
            ("M2 Money Stock", SourceId::Fred, "M2SL"),
            ("Consumer Price Index", SourceId::Fred, "CPIAUCSL"),
        ]
        .into_iter()
        .map(|(name, source, symbol)| {
            IndicatorEntry::new(
                name,
                source,
                Symbol::parse(symbol).expect("catalog symbols are valid"),
            )
            .expect("catalog entries are valid")
        })
        .collect::<Vec<_>>();

        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_keeps_display_order() {
        let catalog = SeriesCatalog::default();
        let names: Vec<&str> = catalog.entries().iter().map(IndicatorEntry::name).collect();

        assert_eq!(
            names,
            vec![
                "Bitcoin (BTC-USD)",
                "Gold (GC=F)",
                "Oil (CL=F)",
                "US 10Y Treasury Yield (TNX)",
                "M2 Money Stock",
                "Consumer Price Index",
            ]
        );
    }

    #[test]
    fn default_catalog_splits_sources() {
        let catalog = SeriesCatalog::default();
        let market = catalog
            .entries()
            .iter()
            .filter(|e| e.source() == SourceId::Yahoo)
            .count();
        let macro_entries = catalog
            .entries()
            .iter()
            .filter(|e| e.source() == SourceId::Fred)
            .count();

        assert_eq!(market, 4);
        assert_eq!(macro_entries, 2);
    }

    #[test]
    fn rejects_duplicate_display_names() {
        let entry = |name: &str, symbol: &str| {
            IndicatorEntry::new(
                name,
                SourceId::Yahoo,
                Symbol::parse(symbol).expect("valid symbol"),
            )
            .expect("valid entry")
        };

        let err = SeriesCatalog::from_entries(vec![
            entry("Bitcoin", "BTC-USD"),
            entry("Bitcoin", "ETH-USD"),
        ])
        .expect_err("must fail");

        assert!(matches!(err, ValidationError::DuplicateIndicator { .. }));
    }

    #[test]
    fn rejects_blank_display_name() {
        let err = IndicatorEntry::new(
            "  ",
            SourceId::Fred,
            Symbol::parse("M2SL").expect("valid symbol"),
        )
        .expect_err("must fail");

        assert!(matches!(err, ValidationError::EmptyIndicatorName));
    }
}
