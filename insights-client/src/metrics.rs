use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiMetrics {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub average_response_time: Duration,
    pub last_request_time: Option<SystemTime>,
    pub requests_by_route: HashMap<String, RouteMetrics>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteMetrics {
    pub request_count: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub total_response_time: Duration,
    pub min_response_time: Duration,
    pub max_response_time: Duration,
    pub last_error: Option<String>,
}

/// One finished HTTP call. `route` is the endpoint template
/// (e.g. `GET /api/insights/history`), never the concrete URL.
#[derive(Debug, Clone)]
pub struct RequestMetrics {
    pub route: String,
    pub status_code: Option<u16>,
    pub response_time: Duration,
    pub success: bool,
    pub error_code: Option<String>,
}

impl RouteMetrics {
    fn new() -> Self {
        Self {
            request_count: 0,
            success_count: 0,
            error_count: 0,
            total_response_time: Duration::ZERO,
            min_response_time: Duration::MAX,
            max_response_time: Duration::ZERO,
            last_error: None,
        }
    }

    fn update(&mut self, metrics: &RequestMetrics) {
        self.request_count += 1;
        self.total_response_time += metrics.response_time;
        self.min_response_time = self.min_response_time.min(metrics.response_time);
        self.max_response_time = self.max_response_time.max(metrics.response_time);

        if metrics.success {
            self.success_count += 1;
        } else {
            self.error_count += 1;
            self.last_error = metrics.error_code.clone();
        }
    }

    pub fn average_response_time(&self) -> Duration {
        if self.request_count == 0 {
            Duration::ZERO
        } else {
            self.total_response_time / self.request_count as u32
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.request_count == 0 {
            0.0
        } else {
            self.success_count as f64 / self.request_count as f64
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsCollector {
    metrics: Arc<RwLock<ApiMetrics>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(RwLock::new(ApiMetrics::default())),
        }
    }

    pub async fn record_request(&self, request_metrics: RequestMetrics) {
        let mut metrics = self.metrics.write().await;

        metrics.total_requests += 1;
        metrics.last_request_time = Some(SystemTime::now());

        if request_metrics.success {
            metrics.successful_requests += 1;
        } else {
            metrics.failed_requests += 1;
        }

        // Running mean over all requests
        let total_time = metrics.average_response_time * (metrics.total_requests - 1) as u32
            + request_metrics.response_time;
        metrics.average_response_time = total_time / metrics.total_requests as u32;

        metrics
            .requests_by_route
            .entry(request_metrics.route.clone())
            .or_insert_with(RouteMetrics::new)
            .update(&request_metrics);
    }

    pub async fn get_metrics(&self) -> ApiMetrics {
        self.metrics.read().await.clone()
    }

    pub async fn get_route_metrics(&self, route: &str) -> Option<RouteMetrics> {
        let metrics = self.metrics.read().await;
        metrics.requests_by_route.get(route).cloned()
    }

    pub async fn reset_metrics(&self) {
        let mut metrics = self.metrics.write().await;
        *metrics = ApiMetrics::default();
    }

    /// Non-blocking read for callers outside the runtime; `None` while a
    /// request is being recorded.
    pub fn try_snapshot(&self) -> Option<ApiMetrics> {
        self.metrics.try_read().ok().map(|metrics| metrics.clone())
    }

    pub async fn export_metrics(&self) -> Result<String, serde_json::Error> {
        let metrics = self.get_metrics().await;
        serde_json::to_string_pretty(&metrics)
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(route: &str, millis: u64, success: bool) -> RequestMetrics {
        RequestMetrics {
            route: route.to_string(),
            status_code: Some(if success { 200 } else { 500 }),
            response_time: Duration::from_millis(millis),
            success,
            error_code: (!success).then(|| "API_SERVER_ERROR".to_string()),
        }
    }

    #[tokio::test]
    async fn test_metrics_collection() {
        let collector = MetricsCollector::new();

        collector
            .record_request(sample("GET /api/insights", 100, true))
            .await;
        collector
            .record_request(sample("GET /api/insights", 300, false))
            .await;

        let metrics = collector.get_metrics().await;
        assert_eq!(metrics.total_requests, 2);
        assert_eq!(metrics.successful_requests, 1);
        assert_eq!(metrics.failed_requests, 1);
        assert_eq!(metrics.average_response_time, Duration::from_millis(200));
        assert!(metrics.last_request_time.is_some());
    }

    #[test]
    fn test_snapshot_outside_runtime() {
        let collector = MetricsCollector::new();
        tokio_test::block_on(collector.record_request(sample("GET /api/insights", 80, true)));

        let snapshot = collector.try_snapshot().unwrap();
        assert_eq!(snapshot.total_requests, 1);
        assert_eq!(snapshot.requests_by_route["GET /api/insights"].success_rate(), 1.0);
    }

    #[tokio::test]
    async fn test_route_metrics() {
        let collector = MetricsCollector::new();

        collector
            .record_request(sample("POST /api/insights/chat", 100, true))
            .await;
        collector
            .record_request(sample("POST /api/insights/chat", 50, false))
            .await;

        let route = collector
            .get_route_metrics("POST /api/insights/chat")
            .await
            .unwrap();
        assert_eq!(route.request_count, 2);
        assert_eq!(route.min_response_time, Duration::from_millis(50));
        assert_eq!(route.max_response_time, Duration::from_millis(100));
        assert_eq!(route.success_rate(), 0.5);
        assert_eq!(route.last_error.as_deref(), Some("API_SERVER_ERROR"));
        assert!(collector.get_route_metrics("GET /unknown").await.is_none());
    }

    #[tokio::test]
    async fn test_reset_and_export() {
        let collector = MetricsCollector::new();
        collector
            .record_request(sample("GET /api/insights", 10, true))
            .await;

        let exported = collector.export_metrics().await.unwrap();
        assert!(exported.contains("total_requests"));

        collector.reset_metrics().await;
        assert_eq!(collector.get_metrics().await.total_requests, 0);
    }
}
