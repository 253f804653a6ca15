use futures::future::BoxFuture;
use tokio::sync::mpsc;

pub type DynError = Box<dyn std::error::Error + Send + Sync>;

pub use crate::adapters::llm::StreamEvent;

/// One completion request: a single composed text prompt, answered as a
/// stream of events on `tx`. Fields are owned so the request can be moved
/// into a spawned task.
#[derive(Debug)]
pub struct GenerateRequest {
    pub api_key: String,
    pub provider: String,
    pub model: String,
    pub prompt: String,
    pub tx: mpsc::UnboundedSender<StreamEvent>,
}

pub trait LlmPort: Send + Sync {
    fn generate(&self, request: GenerateRequest) -> BoxFuture<'_, Result<(), DynError>>;
}
