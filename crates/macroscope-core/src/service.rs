//! Catalog-driven fetch orchestration.
//!
//! This is the surface the (out-of-scope) presentation layer calls: hand it
//! a date range, get back one normalized series per catalog entry, in
//! catalog order, with failures carried per entry instead of aborting the
//! batch.

use std::env;
use std::sync::Arc;

use crate::adapters::{FredAdapter, YahooAdapter};
use crate::cache::{CachePolicy, FetchCache, FetchRequest};
use crate::catalog::{IndicatorEntry, SeriesCatalog};
use crate::domain::{DateRange, Series};
use crate::error::FetchError;
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::retry::RetryConfig;
use crate::series_source::SeriesSource;
use crate::source::SourceId;

/// One catalog entry paired with its fetch outcome.
#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub entry: IndicatorEntry,
    pub result: Result<Series, FetchError>,
}

/// Resolves catalog entries to adapters and routes every fetch through the
/// cache.
///
/// A missing macro credential does not prevent construction: the macro
/// source is simply left unconfigured and each macro-entry fetch reports
/// [`FetchError::MissingCredential`] while market entries keep working.
pub struct DashboardService {
    catalog: SeriesCatalog,
    cache: FetchCache,
    retry: RetryConfig,
    market_source: Arc<dyn SeriesSource>,
    macro_source: Option<Arc<dyn SeriesSource>>,
}

impl DashboardService {
    pub fn builder() -> DashboardServiceBuilder {
        DashboardServiceBuilder::new()
    }

    pub fn catalog(&self) -> &SeriesCatalog {
        &self.catalog
    }

    pub fn cache(&self) -> &FetchCache {
        &self.cache
    }

    /// Fetches one indicator over `range`, via the cache, retrying
    /// transient provider failures within the configured budget.
    pub async fn fetch_entry(
        &self,
        entry: &IndicatorEntry,
        range: DateRange,
    ) -> Result<Series, FetchError> {
        let source: &dyn SeriesSource = match entry.source() {
            SourceId::Yahoo => self.market_source.as_ref(),
            SourceId::Fred => match &self.macro_source {
                Some(source) => source.as_ref(),
                None => {
                    return Err(FetchError::MissingCredential {
                        source: SourceId::Fred,
                    })
                }
            },
        };

        let request = FetchRequest::new(entry.source(), entry.symbol().clone(), range);
        let mut attempts_made = 0;
        loop {
            match self.cache.get_or_fetch(&request, source).await {
                Ok(series) => return Ok(series),
                Err(error) if self.retry.should_retry(&error, attempts_made) => {
                    let delay = self.retry.delay_for_attempt(attempts_made);
                    log::warn!(
                        "transient failure for {request} ({}), retrying in {delay:?}",
                        error.code()
                    );
                    tokio::time::sleep(delay).await;
                    attempts_made += 1;
                }
                Err(error) => {
                    log::warn!("fetch failed for {request}: {error}");
                    return Err(error);
                }
            }
        }
    }

    /// Fetches every catalog entry over `range`, concurrently, returning
    /// results in catalog order. One entry's failure never affects the
    /// others.
    pub async fn fetch_all(&self, range: DateRange) -> Vec<IndicatorSeries> {
        let fetches = self.catalog.entries().iter().map(|entry| async move {
            IndicatorSeries {
                entry: entry.clone(),
                result: self.fetch_entry(entry, range).await,
            }
        });

        futures::future::join_all(fetches).await
    }
}

/// Builder wiring transport, credential, catalog, cache and retry knobs.
///
/// # Credential sources
///
/// | Method | Behavior |
/// |--------|----------|
/// | `with_fred_api_key` | explicit key string |
/// | `from_env` | `MACROSCOPE_FRED_API_KEY`, falling back to `FRED_API_KEY` |
///
/// A blank or absent key leaves the macro source unconfigured (with a
/// warning) instead of failing the build.
#[derive(Default)]
pub struct DashboardServiceBuilder {
    http_client: Option<Arc<dyn HttpClient>>,
    fred_api_key: Option<String>,
    catalog: Option<SeriesCatalog>,
    cache_policy: CachePolicy,
    retry: Option<RetryConfig>,
    market_source: Option<Arc<dyn SeriesSource>>,
    macro_source: Option<Arc<dyn SeriesSource>>,
}

impl DashboardServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    pub fn with_fred_api_key(mut self, key: impl Into<String>) -> Self {
        self.fred_api_key = Some(key.into());
        self
    }

    /// Reads the macro credential from the process environment.
    pub fn from_env(mut self) -> Self {
        self.fred_api_key = env::var("MACROSCOPE_FRED_API_KEY")
            .or_else(|_| env::var("FRED_API_KEY"))
            .ok();
        self
    }

    pub fn with_catalog(mut self, catalog: SeriesCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache_policy = policy;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Inject a market source, replacing the default Yahoo adapter. Used by
    /// tests to plug in counting or scripted sources.
    pub fn with_market_source(mut self, source: Arc<dyn SeriesSource>) -> Self {
        self.market_source = Some(source);
        self
    }

    /// Inject a macro source, replacing credential-based construction.
    pub fn with_macro_source(mut self, source: Arc<dyn SeriesSource>) -> Self {
        self.macro_source = Some(source);
        self
    }

    pub fn build(self) -> DashboardService {
        let http_client = self
            .http_client
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()));

        let market_source = self
            .market_source
            .unwrap_or_else(|| Arc::new(YahooAdapter::new(Arc::clone(&http_client))));

        let macro_source = match self.macro_source {
            Some(injected) => Some(injected),
            None => match self.fred_api_key {
                Some(key) => match FredAdapter::new(Arc::clone(&http_client), key) {
                    Ok(adapter) => Some(Arc::new(adapter) as Arc<dyn SeriesSource>),
                    Err(error) => {
                        log::warn!("macro source disabled: {error}");
                        None
                    }
                },
                None => {
                    log::warn!("macro source disabled: no API credential configured");
                    None
                }
            },
        };

        DashboardService {
            catalog: self.catalog.unwrap_or_default(),
            cache: FetchCache::new(self.cache_policy),
            retry: self.retry.unwrap_or_default(),
            market_source,
            macro_source,
        }
    }
}
