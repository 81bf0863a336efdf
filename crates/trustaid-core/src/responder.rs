use async_trait::async_trait;

use crate::client::BackendClient;
use crate::error::ChatResult;
use crate::payload::Payload;
use crate::pipeline::Pipeline;

/// Anything that can answer a chat query: the live backend or the demo stand-in.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, query: &str, pipeline: Pipeline) -> ChatResult<Payload>;
}

#[async_trait]
impl Responder for BackendClient {
    async fn respond(&self, query: &str, pipeline: Pipeline) -> ChatResult<Payload> {
        self.query(query, pipeline).await
    }
}
