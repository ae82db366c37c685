//! # Macroscope Core
//!
//! Series acquisition and normalization core for the macroscope indicators
//! dashboard.
//!
//! ## Overview
//!
//! Two heterogeneous providers feed the dashboard: a market-data source
//! (daily price history, Yahoo chart API shape) and a macro-data source
//! (economic observations, FRED API shape). This crate unifies them behind
//! one series contract:
//!
//! - **Canonical domain types** for symbols, calendar dates and series
//! - **Source adapters** translating each provider's response shape
//! - **Single-flight fetch cache** memoizing by exact request key
//! - **Ordered indicator catalog** driving source dispatch
//! - **Dashboard service** with per-indicator error isolation
//!
//! The presentation layer (charts, tabs, tables) is an external
//! collaborator: it hands in a date range and receives one normalized
//! [`Series`] per catalog entry.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Provider adapters (Yahoo chart, FRED observations) |
//! | [`cache`] | Single-flight fetch memoization |
//! | [`catalog`] | Ordered indicator registry |
//! | [`domain`] | Domain types (Symbol, ObservationDate, Series) |
//! | [`error`] | Validation and fetch error types |
//! | [`http_client`] | HTTP client abstraction |
//! | [`retry`] | Bounded retry with backoff |
//! | [`series_source`] | Source adapter contract |
//! | [`service`] | Catalog-driven fetch orchestration |
//! | [`source`] | Source identifiers |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use macroscope_core::{DashboardService, DateRange, ObservationDate};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = DashboardService::builder().from_env().build();
//!
//!     let range = DateRange::new(
//!         ObservationDate::parse("2020-01-01")?,
//!         ObservationDate::today_utc(),
//!     )?;
//!
//!     for indicator in service.fetch_all(range).await {
//!         match indicator.result {
//!             Ok(series) => println!("{}: {} observations", indicator.entry.name(), series.len()),
//!             Err(error) => println!("{}: {error}", indicator.entry.name()),
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │  Presentation layer  │  (external collaborator)
//! └──────────┬───────────┘
//!            │ date range
//!            ▼
//! ┌──────────────────────┐     ┌──────────────────┐
//! │  DashboardService    │────▶│  SeriesCatalog   │
//! └──────────┬───────────┘     └──────────────────┘
//!            │
//!            ▼
//! ┌──────────────────────┐
//! │  FetchCache          │  single flight per key
//! └──────────┬───────────┘
//!            │
//!            ▼
//! ┌──────────────────────┐     ┌──────────────────┐
//! │  SeriesSource        │────▶│  HttpClient      │
//! │  (Yahoo / FRED)      │     │  (reqwest/stub)  │
//! └──────────┬───────────┘     └──────────────────┘
//!            │
//!            ▼
//! ┌──────────────────────┐
//! │  Series              │
//! └──────────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Every fetch returns a structured [`FetchError`] scoped to one indicator:
//!
//! ```rust
//! use macroscope_core::FetchError;
//!
//! fn describe(error: &FetchError) -> &'static str {
//!     match error {
//!         FetchError::MissingCredential { .. } => "configure an API key",
//!         FetchError::NoData { .. } => "nothing published for this range",
//!         FetchError::ProviderUnavailable { .. } => "transient, retry later",
//!         _ => "unexpected",
//!     }
//! }
//! ```
//!
//! ## Security
//!
//! - The macro credential is taken from configuration or environment
//!   variables, never from source literals
//! - Credentials never appear in error messages or logs

pub mod adapters;
pub mod cache;
pub mod catalog;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod retry;
pub mod series_source;
pub mod service;
pub mod source;

// Re-export commonly used types at crate root for convenience

pub use adapters::{FredAdapter, YahooAdapter};
pub use cache::{CachePolicy, FetchCache, FetchRequest};
pub use catalog::{IndicatorEntry, SeriesCatalog};
pub use domain::{DateRange, Observation, ObservationDate, Series, Symbol};
pub use error::{FetchError, ValidationError};
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use retry::{Backoff, RetryConfig};
pub use series_source::{SeriesRequest, SeriesSource};
pub use service::{DashboardService, DashboardServiceBuilder, IndicatorSeries};
pub use source::SourceId;
