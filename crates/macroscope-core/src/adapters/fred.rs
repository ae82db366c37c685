use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;

use crate::domain::{Observation, ObservationDate, Series};
use crate::error::FetchError;
use crate::http_client::{HttpClient, HttpRequest};
use crate::series_source::{SeriesRequest, SeriesSource};
use crate::source::SourceId;

/// Macro data adapter over the FRED series/observations endpoint.
///
/// The provider requires an API key on every call; the key is taken once at
/// construction and a blank key fails there, before any network traffic.
/// Observation granularity is whatever the series publishes (typically
/// monthly) and is normalized to the same calendar-date representation the
/// market adapter produces.
#[derive(Clone)]
pub struct FredAdapter {
    http_client: Arc<dyn HttpClient>,
    api_key: String,
}

impl std::fmt::Debug for FredAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FredAdapter")
            .field("http_client", &"<dyn HttpClient>")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl FredAdapter {
    /// Fails with [`FetchError::MissingCredential`] when the key is blank.
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        api_key: impl Into<String>,
    ) -> Result<Self, FetchError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(FetchError::MissingCredential {
                source: SourceId::Fred,
            });
        }

        Ok(Self {
            http_client,
            api_key,
        })
    }

    async fn fetch_observations(&self, req: &SeriesRequest) -> Result<Series, FetchError> {
        let endpoint = format!(
            "https://api.stlouisfed.org/fred/series/observations?series_id={}&api_key={}&file_type=json&observation_start={}&observation_end={}",
            urlencoding::encode(req.symbol.as_str()),
            urlencoding::encode(&self.api_key),
            req.range.start().format_iso(),
            req.range.end().format_iso(),
        );

        let request = HttpRequest::get(&endpoint);
        let response = self.http_client.execute(request).await.map_err(|e| {
            FetchError::provider_unavailable(
                SourceId::Fred,
                format!("transport error: {}", e.message()),
            )
        })?;

        // Unknown series ids come back as 400 with an error payload.
        if response.status == 400 {
            return Err(FetchError::NoData {
                symbol: req.symbol.clone(),
                range: req.range,
            });
        }
        if !response.is_success() {
            return Err(FetchError::provider_unavailable(
                SourceId::Fred,
                format!("upstream returned status {}", response.status),
            ));
        }

        let payload: ObservationsResponse = serde_json::from_str(&response.body).map_err(|e| {
            FetchError::internal(format!("failed to parse observations response: {e}"))
        })?;

        let mut observations = Vec::with_capacity(payload.observations.len());
        let mut previous: Option<ObservationDate> = None;
        for raw in &payload.observations {
            // FRED encodes a missing observation as ".".
            if raw.value.trim() == "." {
                continue;
            }

            let value: f64 = raw.value.trim().parse().map_err(|_| {
                FetchError::internal(format!("non-numeric observation value '{}'", raw.value))
            })?;
            let date = ObservationDate::parse(&raw.date)
                .map_err(|e| FetchError::internal(format!("invalid observation date: {e}")))?;
            if !req.range.contains(date) {
                continue;
            }
            if previous == Some(date) {
                continue;
            }
            previous = Some(date);

            let observation = Observation::new(date, value)
                .map_err(|e| FetchError::internal(format!("invalid observation value: {e}")))?;
            observations.push(observation);
        }

        if observations.is_empty() {
            return Err(FetchError::NoData {
                symbol: req.symbol.clone(),
                range: req.range,
            });
        }

        Series::new(req.symbol.as_str(), observations)
            .map_err(|e| FetchError::internal(format!("observations not normalizable: {e}")))
    }
}

impl SeriesSource for FredAdapter {
    fn id(&self) -> SourceId {
        SourceId::Fred
    }

    fn fetch<'a>(
        &'a self,
        req: SeriesRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Series, FetchError>> + Send + 'a>> {
        Box::pin(async move { self.fetch_observations(&req).await })
    }
}

// FRED observations API response structures.
#[derive(Debug, Clone, Deserialize)]
struct ObservationsResponse {
    #[serde(default)]
    observations: Vec<RawObservation>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawObservation {
    date: String,
    value: String,
}
