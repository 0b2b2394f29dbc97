use crate::metrics::{ApiMetrics, MetricsCollector, RequestMetrics};
use crate::InsightsBackend;
use chrono::{DateTime, Utc};
use insights_core::{
    ChatRequest, CoreError, CurrentInsights, DashboardConfig, ErrorExt, GenerateRequest,
    GenerationCounts, GenerationHistory, GenerationReceipt, GenerationRun, InsightGroups,
    InsightItem, InsightsApiError, RunInsights, ScopeOption, StatsSummary,
};
use reqwest::header::{HeaderValue, COOKIE, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub const CURRENT_INSIGHTS_PATH: &str = "/api/insights";
pub const HISTORY_PATH: &str = "/api/insights/history";
pub const GENERATE_PATH: &str = "/api/insights/generate";
pub const CHAT_PATH: &str = "/api/insights/chat";

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentInsightsResponse {
    #[serde(default)]
    pub insights: InsightGroups,
    #[serde(default)]
    pub stats: Option<StatsSummary>,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    #[serde(default)]
    pub generations: Vec<GenerationRun>,
    #[serde(default)]
    pub available_subreddits: Vec<ScopeOption>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMetadata {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
}

/// A historical run. The server also sends a pre-grouped copy, which is
/// ignored: the flat list is the only source the view groups from.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    #[serde(default)]
    pub insights: Vec<InsightItem>,
    #[serde(default)]
    pub generation: Option<RunMetadata>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub counts: Option<GenerationCounts>,
    #[serde(default)]
    pub generation_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl CurrentInsightsResponse {
    pub fn into_current(self) -> Result<CurrentInsights, InsightsApiError> {
        if let Some(message) = self.error {
            return Err(InsightsApiError::Rejected { message });
        }

        if let Some(reported) = self.stats {
            let derived = self.insights.stats();
            if reported != derived {
                debug!(
                    "Server stats {:?} disagree with displayed items {:?}; using derived counts",
                    reported, derived
                );
            }
        }

        Ok(CurrentInsights {
            groups: self.insights,
            generated_at: self.generated_at,
            message: self.message,
        })
    }
}

impl HistoryResponse {
    pub fn into_history(self) -> Result<GenerationHistory, InsightsApiError> {
        if let Some(message) = self.error {
            return Err(InsightsApiError::Rejected { message });
        }

        let total = self.total.unwrap_or(self.generations.len() as u64);
        Ok(GenerationHistory {
            generations: self.generations,
            available_subreddits: self.available_subreddits,
            total,
        })
    }
}

impl RunResponse {
    pub fn into_run(self, requested_id: &str) -> Result<RunInsights, InsightsApiError> {
        if let Some(message) = self.error {
            return Err(InsightsApiError::Rejected { message });
        }

        let metadata = self.generation.unwrap_or_default();
        if let Some(id) = metadata.id.as_deref() {
            if id != requested_id {
                return Err(InsightsApiError::InvalidResponse {
                    details: format!("asked for generation {requested_id}, received {id}"),
                });
            }
        }

        Ok(RunInsights {
            generation_id: requested_id.to_string(),
            groups: InsightGroups::from_flat(self.insights),
            generated_at: metadata.generated_at,
        })
    }
}

impl GenerateResponse {
    pub fn into_receipt(self) -> Result<GenerationReceipt, InsightsApiError> {
        if !self.success || self.error.is_some() {
            let message = self
                .error
                .or(self.message)
                .unwrap_or_else(|| "Insight generation failed".to_string());
            return Err(InsightsApiError::Rejected { message });
        }

        Ok(GenerationReceipt {
            generation_id: self.generation_id.filter(|id| !id.is_empty()),
            message: self.message,
            counts: self.counts,
        })
    }
}

impl ChatResponse {
    /// An empty reply is still a success here; the chat loop decides how to
    /// present it.
    pub fn into_reply(self) -> Result<String, InsightsApiError> {
        if !self.success || self.error.is_some() {
            let message = self
                .error
                .unwrap_or_else(|| "Chat request failed".to_string());
            return Err(InsightsApiError::Rejected { message });
        }
        Ok(self.message.unwrap_or_default())
    }
}

/// Maps a non-success HTTP status (plus any JSON error body) onto the API
/// error taxonomy.
pub fn classify_status(
    status: StatusCode,
    route: &str,
    retry_after: Option<u64>,
    body: &str,
) -> InsightsApiError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error.or(b.message))
        .filter(|m| !m.trim().is_empty());

    match status {
        StatusCode::UNAUTHORIZED => InsightsApiError::Unauthorized { message },
        StatusCode::FORBIDDEN => InsightsApiError::Forbidden {
            resource: route.to_string(),
            message,
        },
        StatusCode::NOT_FOUND => InsightsApiError::NotFound {
            resource: route.to_string(),
            message,
        },
        StatusCode::TOO_MANY_REQUESTS => InsightsApiError::RateLimitExceeded {
            retry_after,
            message,
        },
        s if s.is_server_error() => InsightsApiError::ServerError {
            status_code: s.as_u16(),
            message,
        },
        s => InsightsApiError::RequestFailed {
            status_code: s.as_u16(),
            message,
        },
    }
}

/// JSON-over-HTTP client for the insights backend.
#[derive(Debug, Clone)]
pub struct HttpInsightsClient {
    http_client: Client,
    base_url: String,
    session_cookie: Option<HeaderValue>,
    metrics: MetricsCollector,
}

impl HttpInsightsClient {
    pub fn new(config: &DashboardConfig) -> Result<Self, CoreError> {
        let mut builder = Client::builder().user_agent(&config.user_agent);
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http_client = builder.build()?;

        let session_cookie = match config.session_cookie.as_deref() {
            Some(cookie) => {
                Some(
                    HeaderValue::from_str(cookie).map_err(|_| CoreError::InvalidInput {
                        message: "session cookie contains characters not allowed in a header"
                            .to_string(),
                    })?,
                )
            }
            None => None,
        };

        Ok(Self {
            http_client,
            base_url: config.api_base_url.as_str().trim_end_matches('/').to_string(),
            session_cookie,
            metrics: MetricsCollector::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get_metrics(&self) -> ApiMetrics {
        self.metrics.get_metrics().await
    }

    pub async fn export_metrics(&self) -> Result<String, CoreError> {
        Ok(self.metrics.export_metrics().await?)
    }

    /// Logs the per-route request summary. Called when the dashboard closes.
    pub fn log_metrics_summary(&self) -> Option<ApiMetrics> {
        let Some(metrics) = self.metrics.try_snapshot() else {
            debug!("Request metrics busy; skipping summary");
            return None;
        };

        info!(
            "API requests: {} total, {} succeeded, {} failed, {:?} average",
            metrics.total_requests,
            metrics.successful_requests,
            metrics.failed_requests,
            metrics.average_response_time
        );
        for (route, stats) in &metrics.requests_by_route {
            debug!(
                "{}: {} requests, {:.0}% ok, {:?} avg, last error {:?}",
                route,
                stats.request_count,
                stats.success_rate() * 100.0,
                stats.average_response_time(),
                stats.last_error
            );
        }
        Some(metrics)
    }

    /// Sends a request, records its metrics and decodes the JSON body.
    async fn send_json<T: DeserializeOwned>(
        &self,
        route: &str,
        request: RequestBuilder,
    ) -> Result<T, CoreError> {
        let request_id = Uuid::new_v4();
        let mut request = request.header(REQUEST_ID_HEADER, request_id.to_string());
        if let Some(cookie) = &self.session_cookie {
            request = request.header(COOKIE, cookie.clone());
        }

        debug!("Sending {} (request id {})", route, request_id);
        let start_time = Instant::now();
        let (result, status_code) = self.execute(route, request).await;

        let request_metrics = RequestMetrics {
            route: route.to_string(),
            status_code,
            response_time: start_time.elapsed(),
            success: result.is_ok(),
            error_code: result.as_ref().err().map(|e| e.error_code()),
        };
        debug!(
            "{} finished with status {:?} in {:?}",
            route, request_metrics.status_code, request_metrics.response_time
        );
        self.metrics.record_request(request_metrics).await;

        result
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        route: &str,
        request: RequestBuilder,
    ) -> (Result<T, CoreError>, Option<u16>) {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                warn!("Request timed out: {}", route);
                return (Err(InsightsApiError::RequestTimeout.into()), None);
            }
            Err(e) => {
                error!("Network error for {}: {}", route, e);
                return (Err(CoreError::Network(e)), None);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let body = response.text().await.unwrap_or_default();
            let api_error = classify_status(status, route, retry_after, &body);
            warn!("{} failed with status {}: {}", route, status, api_error);
            return (Err(api_error.into()), Some(status.as_u16()));
        }

        let decoded = response.json::<T>().await.map_err(|e| {
            error!("Failed to parse response for {}: {}", route, e);
            CoreError::Api(InsightsApiError::InvalidResponse {
                details: format!("could not decode {route} response"),
            })
        });
        (decoded, Some(status.as_u16()))
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, CoreError> {
        let route = format!("POST {path}");
        let request = self.http_client.post(self.url(path)).json(body);
        self.send_json(&route, request).await
    }
}

impl InsightsBackend for HttpInsightsClient {
    async fn fetch_current(&self) -> Result<CurrentInsights, CoreError> {
        let route = format!("GET {CURRENT_INSIGHTS_PATH}");
        let request = self.http_client.get(self.url(CURRENT_INSIGHTS_PATH));
        let response: CurrentInsightsResponse = self.send_json(&route, request).await?;
        let current = response.into_current()?;

        debug!("Retrieved {} current insights", current.groups.len());
        Ok(current)
    }

    async fn fetch_history(&self) -> Result<GenerationHistory, CoreError> {
        let route = format!("GET {HISTORY_PATH}");
        let request = self.http_client.get(self.url(HISTORY_PATH));
        let response: HistoryResponse = self.send_json(&route, request).await?;
        let history = response.into_history()?;

        debug!("Retrieved {} generation runs", history.generations.len());
        Ok(history)
    }

    async fn fetch_run(&self, generation_id: &str) -> Result<RunInsights, CoreError> {
        let route = format!("GET {HISTORY_PATH}?generationId");
        let request = self
            .http_client
            .get(self.url(HISTORY_PATH))
            .query(&[("generationId", generation_id)]);
        let response: RunResponse = self.send_json(&route, request).await?;
        let run = response.into_run(generation_id)?;

        debug!(
            "Retrieved generation {} with {} insights",
            generation_id,
            run.groups.len()
        );
        Ok(run)
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<GenerationReceipt, CoreError> {
        info!(
            "Requesting insight generation (scope: {}, period: {} days)",
            request.subreddit.as_deref().unwrap_or("all"),
            request.period_days
        );
        let response: GenerateResponse = self.post_json(GENERATE_PATH, request).await?;
        let receipt = response.into_receipt()?;

        info!(
            "Insight generation finished (generation id: {:?})",
            receipt.generation_id
        );
        Ok(receipt)
    }

    async fn chat(&self, request: &ChatRequest) -> Result<String, CoreError> {
        debug!(
            "Sending chat turn with {} prior messages",
            request.history.len()
        );
        let response: ChatResponse = self.post_json(CHAT_PATH, request).await?;
        Ok(response.into_reply()?)
    }
}
