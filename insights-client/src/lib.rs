pub mod api;
pub mod metrics;


pub use api::HttpInsightsClient;
pub use metrics::{ApiMetrics, MetricsCollector};

use insights_core::{
    ChatRequest, CoreError, CurrentInsights, GenerateRequest, GenerationHistory,
    GenerationReceipt, RunInsights,
};

/// The remote services behind the insights view: query, generation and chat.
///
/// Every call is a single request/response pair; implementations must not
/// retry on their own.
pub trait InsightsBackend {
    /// Current grouped insights, unscoped by generation.
    async fn fetch_current(&self) -> Result<CurrentInsights, CoreError>;

    async fn fetch_history(&self) -> Result<GenerationHistory, CoreError>;

    /// One historical generation, regrouped from its flat insight list.
    async fn fetch_run(&self, generation_id: &str) -> Result<RunInsights, CoreError>;

    async fn generate(&self, request: &GenerateRequest) -> Result<GenerationReceipt, CoreError>;

    /// Returns the assistant's reply text, which may be empty.
    async fn chat(&self, request: &ChatRequest) -> Result<String, CoreError>;
}
