//! Adapter contract shared by every data source.
//!
//! A source adapter translates one provider's response shape into the
//! uniform [`Series`] contract. The trait has a single endpoint:
//!
//! | Endpoint | Request | Response |
//! |----------|---------|----------|
//! | fetch | [`SeriesRequest`] | [`Series`] |
//!
//! Implementations must be `Send + Sync`; they are shared behind `Arc`
//! between the service, the cache and any concurrent fetch tasks.

use std::future::Future;
use std::pin::Pin;

use crate::domain::{DateRange, Series, Symbol};
use crate::error::FetchError;
use crate::source::SourceId;

/// Validated payload for one adapter fetch: which series, over which
/// inclusive calendar range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesRequest {
    pub symbol: Symbol,
    pub range: DateRange,
}

impl SeriesRequest {
    pub fn new(symbol: Symbol, range: DateRange) -> Self {
        Self { symbol, range }
    }
}

/// Source adapter contract.
///
/// # Errors
///
/// `fetch` returns [`FetchError`]:
/// - [`FetchError::NoData`] when the provider has nothing for the
///   symbol/range; an empty result is never disguised as success.
/// - [`FetchError::ProviderUnavailable`] on transport failures and
///   non-success statuses; this is the retryable class.
/// - [`FetchError::Internal`] when a transport-successful payload cannot be
///   normalized.
pub trait SeriesSource: Send + Sync {
    /// Returns the source identifier used for dispatch and cache keys.
    fn id(&self) -> SourceId;

    /// Fetches and normalizes observations for the requested symbol and
    /// range. Timestamps in the result are within the range and strictly
    /// increasing.
    fn fetch<'a>(
        &'a self,
        req: SeriesRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Series, FetchError>> + Send + 'a>>;
}
