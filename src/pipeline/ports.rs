use async_trait::async_trait;

use crate::{
    gate::error::GateError,
    pipeline::types::{PostReceipt, PostRequest},
};

/// Performs the network post. Only called for `Decision::Act`.
#[async_trait]
pub trait ResponsePoster: Send + Sync {
    async fn post(&self, req: &PostRequest) -> Result<PostReceipt, GateError>;
}

/// Uniform sample in `[0, 1)`.
pub trait ChanceSource: Send + Sync {
    fn roll(&self) -> f64;
}
