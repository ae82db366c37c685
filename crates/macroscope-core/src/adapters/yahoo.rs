use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;

use crate::domain::{Observation, ObservationDate, Series};
use crate::error::FetchError;
use crate::http_client::{HttpClient, HttpRequest};
use crate::series_source::{SeriesRequest, SeriesSource};
use crate::source::SourceId;

/// Market data adapter over the Yahoo v8 chart endpoint.
///
/// Fetches daily price history and normalizes it to one close value per
/// trading day. When the response carries an adjusted-close block it is
/// preferred over the plain close column; the fallback mirrors the
/// provider's own behavior of omitting adjusted data for some instruments
/// and is a normalization rule, not an error path.
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
}

impl YahooAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self { http_client }
    }

    async fn fetch_daily_closes(&self, req: &SeriesRequest) -> Result<Series, FetchError> {
        // period2 is exclusive upstream, so push it one day past the
        // inclusive range end; out-of-range rows are dropped below anyway.
        let endpoint = format!(
            "https://query1.finance.yahoo.com/v8/finance/chart/{}?period1={}&period2={}&interval=1d",
            urlencoding::encode(req.symbol.as_str()),
            req.range.start().unix_midnight(),
            req.range.end().unix_next_midnight(),
        );

        let request = HttpRequest::get(&endpoint);
        let response = self.http_client.execute(request).await.map_err(|e| {
            FetchError::provider_unavailable(
                SourceId::Yahoo,
                format!("transport error: {}", e.message()),
            )
        })?;

        // Unknown or delisted symbols come back as 404 with an error body.
        if response.status == 404 {
            return Err(FetchError::NoData {
                symbol: req.symbol.clone(),
                range: req.range,
            });
        }
        if !response.is_success() {
            return Err(FetchError::provider_unavailable(
                SourceId::Yahoo,
                format!("upstream returned status {}", response.status),
            ));
        }

        let chart: ChartResponse = serde_json::from_str(&response.body)
            .map_err(|e| FetchError::internal(format!("failed to parse chart response: {e}")))?;

        if let Some(error) = &chart.chart.error {
            log::debug!(
                "chart error for {}: {} ({})",
                req.symbol,
                error.description.as_deref().unwrap_or("no description"),
                error.code.as_deref().unwrap_or("no code"),
            );
            return Err(FetchError::NoData {
                symbol: req.symbol.clone(),
                range: req.range,
            });
        }

        let result = chart
            .chart
            .result
            .as_deref()
            .and_then(<[ChartResult]>::first)
            .ok_or_else(|| FetchError::NoData {
                symbol: req.symbol.clone(),
                range: req.range,
            })?;

        let timestamps = match result.timestamp.as_deref() {
            Some(timestamps) if !timestamps.is_empty() => timestamps,
            _ => {
                return Err(FetchError::NoData {
                    symbol: req.symbol.clone(),
                    range: req.range,
                })
            }
        };

        let closes = select_close_column(&result.indicators)?;

        let mut observations = Vec::with_capacity(timestamps.len());
        let mut previous: Option<ObservationDate> = None;
        for (index, &seconds) in timestamps.iter().enumerate() {
            // Null slots mark non-trading artifacts; skip them.
            let Some(value) = closes.get(index).copied().flatten() else {
                continue;
            };

            let date = ObservationDate::from_unix_seconds(seconds)
                .map_err(|e| FetchError::internal(format!("invalid chart timestamp: {e}")))?;
            if !req.range.contains(date) {
                continue;
            }
            // Intraday rows collapse onto one calendar date; first wins.
            if previous == Some(date) {
                continue;
            }
            previous = Some(date);

            let observation = Observation::new(date, value)
                .map_err(|e| FetchError::internal(format!("invalid chart value: {e}")))?;
            observations.push(observation);
        }

        if observations.is_empty() {
            return Err(FetchError::NoData {
                symbol: req.symbol.clone(),
                range: req.range,
            });
        }

        Series::new(req.symbol.as_str(), observations)
            .map_err(|e| FetchError::internal(format!("chart rows not normalizable: {e}")))
    }
}

impl SeriesSource for YahooAdapter {
    fn id(&self) -> SourceId {
        SourceId::Yahoo
    }

    fn fetch<'a>(
        &'a self,
        req: SeriesRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Series, FetchError>> + Send + 'a>> {
        Box::pin(async move { self.fetch_daily_closes(&req).await })
    }
}

/// Adjusted close when the block is present, plain close otherwise.
fn select_close_column(indicators: &ChartIndicators) -> Result<&[Option<f64>], FetchError> {
    if let Some(adjusted) = indicators.adjclose.first() {
        if !adjusted.adjclose.is_empty() {
            return Ok(&adjusted.adjclose);
        }
    }

    indicators
        .quote
        .first()
        .map(|quote| quote.close.as_slice())
        .ok_or_else(|| FetchError::internal("chart response missing quote data"))
}

// Yahoo chart API response structures.
#[derive(Debug, Clone, Deserialize)]
struct ChartResponse {
    chart: ChartPayload,
}

#[derive(Debug, Clone, Deserialize)]
struct ChartPayload {
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartErrorBody>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChartErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Clone, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuoteBlock>,
    #[serde(default)]
    adjclose: Vec<ChartAdjCloseBlock>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChartQuoteBlock {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChartAdjCloseBlock {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DateRange, Symbol};
    use crate::http_client::{HttpError, HttpResponse};
    use std::sync::Mutex;

    struct ScriptedHttpClient {
        response: Result<HttpResponse, HttpError>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedHttpClient {
        fn respond_with(response: HttpResponse) -> Self {
            Self {
                response: Ok(response),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                response: Err(HttpError::new("upstream timeout")),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn recorded_requests(&self) -> Vec<HttpRequest> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .clone()
        }
    }

    impl HttpClient for ScriptedHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .push(request);
            let response = self.response.clone();
            Box::pin(async move { response })
        }
    }

    fn request(symbol: &str, start: &str, end: &str) -> SeriesRequest {
        SeriesRequest::new(
            Symbol::parse(symbol).expect("valid symbol"),
            DateRange::new(
                ObservationDate::parse(start).expect("valid date"),
                ObservationDate::parse(end).expect("valid date"),
            )
            .expect("valid range"),
        )
    }

    // 2024-01-01..2024-01-04 midnights UTC.
    const JAN_TIMESTAMPS: &str = "[1704067200,1704153600,1704240000,1704326400]";

    fn chart_body(timestamps: &str, close: &str, adjclose: Option<&str>) -> String {
        let adj = adjclose
            .map(|values| format!(r#","adjclose":[{{"adjclose":{values}}}]"#))
            .unwrap_or_default();
        format!(
            r#"{{"chart":{{"result":[{{"timestamp":{timestamps},"indicators":{{"quote":[{{"close":{close}}}]{adj}}}}}],"error":null}}}}"#
        )
    }

    #[tokio::test]
    async fn prefers_adjusted_close_over_plain_close() {
        let body = chart_body(
            JAN_TIMESTAMPS,
            "[100.0,101.0,102.0,103.0]",
            Some("[90.0,91.0,92.0,93.0]"),
        );
        let client = Arc::new(ScriptedHttpClient::respond_with(HttpResponse::ok_json(body)));
        let adapter = YahooAdapter::new(client);

        let series = adapter
            .fetch(request("BTC-USD", "2024-01-01", "2024-01-05"))
            .await
            .expect("fetch should succeed");

        let values: Vec<f64> = series.observations().iter().map(|o| o.value).collect();
        assert_eq!(values, vec![90.0, 91.0, 92.0, 93.0]);
    }

    #[tokio::test]
    async fn falls_back_to_plain_close_without_adjclose_block() {
        let body = chart_body(JAN_TIMESTAMPS, "[100.0,101.0,102.0,103.0]", None);
        let client = Arc::new(ScriptedHttpClient::respond_with(HttpResponse::ok_json(body)));
        let adapter = YahooAdapter::new(client);

        let series = adapter
            .fetch(request("GC=F", "2024-01-01", "2024-01-05"))
            .await
            .expect("fetch should succeed");

        let values: Vec<f64> = series.observations().iter().map(|o| o.value).collect();
        assert_eq!(values, vec![100.0, 101.0, 102.0, 103.0]);
    }

    #[tokio::test]
    async fn skips_null_close_slots() {
        let body = chart_body(JAN_TIMESTAMPS, "[100.0,null,102.0,103.0]", None);
        let client = Arc::new(ScriptedHttpClient::respond_with(HttpResponse::ok_json(body)));
        let adapter = YahooAdapter::new(client);

        let series = adapter
            .fetch(request("CL=F", "2024-01-01", "2024-01-05"))
            .await
            .expect("fetch should succeed");

        assert_eq!(series.len(), 3);
        assert_eq!(
            series.first().expect("non-empty").date.format_iso(),
            "2024-01-01"
        );
    }

    #[tokio::test]
    async fn drops_rows_outside_requested_range() {
        // Last row lands on 2024-01-04, past the requested end.
        let body = chart_body(JAN_TIMESTAMPS, "[100.0,101.0,102.0,103.0]", None);
        let client = Arc::new(ScriptedHttpClient::respond_with(HttpResponse::ok_json(body)));
        let adapter = YahooAdapter::new(client);

        let series = adapter
            .fetch(request("BTC-USD", "2024-01-01", "2024-01-03"))
            .await
            .expect("fetch should succeed");

        assert_eq!(series.len(), 3);
        assert_eq!(
            series.last().expect("non-empty").date.format_iso(),
            "2024-01-03"
        );
    }

    #[tokio::test]
    async fn not_found_status_maps_to_no_data() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let client = Arc::new(ScriptedHttpClient::respond_with(HttpResponse::with_status(
            404, body,
        )));
        let adapter = YahooAdapter::new(client);

        let error = adapter
            .fetch(request("NOPE", "2024-01-01", "2024-01-05"))
            .await
            .expect_err("fetch should fail");

        assert!(matches!(error, FetchError::NoData { ref symbol, .. } if symbol.as_str() == "NOPE"));
    }

    #[tokio::test]
    async fn error_body_maps_to_no_data() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"Data doesn't exist for the range"}}}"#;
        let client = Arc::new(ScriptedHttpClient::respond_with(HttpResponse::ok_json(body)));
        let adapter = YahooAdapter::new(client);

        let error = adapter
            .fetch(request("BTC-USD", "2030-01-01", "2030-01-05"))
            .await
            .expect_err("fetch should fail");

        assert!(matches!(error, FetchError::NoData { .. }));
    }

    #[tokio::test]
    async fn transport_failure_maps_to_provider_unavailable() {
        let client = Arc::new(ScriptedHttpClient::failing());
        let adapter = YahooAdapter::new(Arc::clone(&client) as Arc<dyn HttpClient>);

        let error = adapter
            .fetch(request("BTC-USD", "2024-01-01", "2024-01-05"))
            .await
            .expect_err("fetch should fail");

        assert!(matches!(
            error,
            FetchError::ProviderUnavailable {
                source: SourceId::Yahoo,
                ..
            }
        ));
        assert_eq!(client.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn request_url_carries_encoded_symbol_and_unix_bounds() {
        let body = chart_body(JAN_TIMESTAMPS, "[100.0,101.0,102.0,103.0]", None);
        let client = Arc::new(ScriptedHttpClient::respond_with(HttpResponse::ok_json(body)));
        let adapter = YahooAdapter::new(Arc::clone(&client) as Arc<dyn HttpClient>);

        adapter
            .fetch(request("^TNX", "2024-01-01", "2024-01-05"))
            .await
            .expect("fetch should succeed");

        let requests = client.recorded_requests();
        assert_eq!(requests.len(), 1);
        let url = &requests[0].url;
        assert!(url.contains("/chart/%5ETNX"), "url was {url}");
        assert!(url.contains("period1=1704067200"), "url was {url}");
        // Exclusive bound: one day past the inclusive end.
        assert!(url.contains("period2=1704499200"), "url was {url}");
    }
}
