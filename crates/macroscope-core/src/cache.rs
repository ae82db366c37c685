//! In-memory memoization of adapter fetches.
//!
//! The cache is strict: a stored entry satisfies only the exact same
//! `(source, symbol, start, end)` tuple. A request for a sub-range of a
//! stored entry still goes to the network. Entries have no expiry; a range
//! whose end date is in the past is immutable upstream, and the known
//! staleness of a same-day range is handled by an explicit policy knob
//! rather than silently.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;

use crate::domain::{DateRange, ObservationDate, Series, Symbol};
use crate::error::FetchError;
use crate::series_source::{SeriesRequest, SeriesSource};
use crate::source::SourceId;

/// Exact-match cache key for one series fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchRequest {
    source: SourceId,
    symbol: Symbol,
    range: DateRange,
}

impl FetchRequest {
    pub fn new(source: SourceId, symbol: Symbol, range: DateRange) -> Self {
        Self {
            source,
            symbol,
            range,
        }
    }

    pub const fn source(&self) -> SourceId {
        self.source
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub const fn range(&self) -> DateRange {
        self.range
    }

    /// Adapter-call payload for this key.
    pub fn series_request(&self) -> SeriesRequest {
        SeriesRequest::new(self.symbol.clone(), self.range)
    }
}

impl Display for FetchRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}@{}", self.source, self.symbol, self.range)
    }
}

/// Cache behavior knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// When set, a request whose range end is today or later bypasses the
    /// stored entry and refetches, replacing it. The refetch does not join
    /// the single-flight of the stored key; freshness wins over coalescing
    /// for open-ended ranges. Default off, which matches plain memoization
    /// and accepts the documented same-day staleness.
    pub refresh_open_ended: bool,
    /// Optional upper bound on settled entries, evicted least-recently-used.
    /// `None` means unbounded for the process lifetime.
    pub capacity: Option<usize>,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            refresh_open_ended: false,
            capacity: None,
        }
    }
}

struct CacheSlot {
    cell: Arc<OnceCell<Series>>,
    last_used: u64,
}

struct CacheInner {
    slots: HashMap<FetchRequest, CacheSlot>,
    clock: u64,
}

/// Thread-safe, single-flight fetch memoizer.
///
/// Concurrent callers of one key share one adapter invocation: the first
/// caller runs the fetch inside the key's cell while the others await the
/// same cell and receive the same stored series. The map lock is held only
/// for slot lookup, never across the fetch, so unrelated keys proceed
/// independently. A failed flight stores nothing; the next caller retries.
pub struct FetchCache {
    policy: CachePolicy,
    inner: Mutex<CacheInner>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for FetchCache {
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}

impl FetchCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            inner: Mutex::new(CacheInner {
                slots: HashMap::new(),
                clock: 0,
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub const fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Returns the stored series for `request`, fetching through `source`
    /// when the key has not been seen (or when the open-ended refresh
    /// policy applies).
    pub async fn get_or_fetch(
        &self,
        request: &FetchRequest,
        source: &dyn SeriesSource,
    ) -> Result<Series, FetchError> {
        if self.policy.refresh_open_ended
            && request.range().is_open_ended(ObservationDate::today_utc())
        {
            return self.refresh(request, source).await;
        }

        let cell = self.slot_cell(request);
        let hit = cell.initialized();

        let series = cell
            .get_or_try_init(|| source.fetch(request.series_request()))
            .await?
            .clone();

        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
            log::debug!("cache hit for {request}");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            log::debug!("cache miss for {request}, fetched {} observations", series.len());
        }

        self.evict_over_capacity(request);
        Ok(series)
    }

    /// Unconditional refetch for an open-ended key; the settled result
    /// replaces whatever was stored.
    async fn refresh(
        &self,
        request: &FetchRequest,
        source: &dyn SeriesSource,
    ) -> Result<Series, FetchError> {
        log::debug!("refreshing open-ended {request}");
        let series = source.fetch(request.series_request()).await?;
        self.misses.fetch_add(1, Ordering::Relaxed);

        {
            let mut inner = self.inner.lock().expect("cache lock is not poisoned");
            inner.clock += 1;
            let stamp = inner.clock;
            inner.slots.insert(
                request.clone(),
                CacheSlot {
                    cell: Arc::new(OnceCell::new_with(Some(series.clone()))),
                    last_used: stamp,
                },
            );
        }

        self.evict_over_capacity(request);
        Ok(series)
    }

    fn slot_cell(&self, request: &FetchRequest) -> Arc<OnceCell<Series>> {
        let mut inner = self.inner.lock().expect("cache lock is not poisoned");
        inner.clock += 1;
        let stamp = inner.clock;
        let slot = inner
            .slots
            .entry(request.clone())
            .or_insert_with(|| CacheSlot {
                cell: Arc::new(OnceCell::new()),
                last_used: 0,
            });
        slot.last_used = stamp;
        Arc::clone(&slot.cell)
    }

    fn evict_over_capacity(&self, keep: &FetchRequest) {
        let Some(capacity) = self.policy.capacity else {
            return;
        };

        let mut inner = self.inner.lock().expect("cache lock is not poisoned");
        while inner.slots.len() > capacity {
            // Only settled slots are evictable; in-flight cells stay so
            // their waiters still coalesce on one fetch.
            let Some(victim) = inner
                .slots
                .iter()
                .filter(|&(key, slot)| slot.cell.initialized() && key != keep)
                .min_by_key(|&(_, slot)| slot.last_used)
                .map(|(key, _)| key.clone())
            else {
                break;
            };

            log::debug!("evicting {victim} at capacity {capacity}");
            inner.slots.remove(&victim);
        }
    }

    /// Number of cached keys, including in-flight ones.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .expect("cache lock is not poisoned")
            .slots
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner
            .lock()
            .expect("cache lock is not poisoned")
            .slots
            .clear();
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}
