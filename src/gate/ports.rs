use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    gate::{
        error::GateError,
        types::{ActionCategory, Rating, TweetId},
    },
    interaction::types::InteractionRecord,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingRequest {
    pub category: ActionCategory,
    pub target_tweet_id: TweetId,
    pub context: String,
    pub text_response: String,
    pub meme_response: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingReport {
    pub rating: Rating,
    #[serde(default)]
    pub meme_rating: Option<Rating>,
}

/// External judge scoring drafted responses. Failures are reported with
/// `GateErrorKind::RatingUnavailable`.
#[async_trait]
pub trait RatingProvider: Send + Sync {
    async fn rate(&self, req: &RatingRequest) -> Result<RatingReport, GateError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReserveOutcome {
    Reserved,
    AlreadyRecorded,
    InFlight,
}

impl ReserveOutcome {
    pub fn is_reserved(self) -> bool {
        matches!(self, ReserveOutcome::Reserved)
    }
}

/// Append-only record of tweets the agent already acted on.
///
/// `reserve` must be atomic: between a `Reserved` answer and the matching
/// `record` or `release`, every other `reserve` for the same id reports
/// `InFlight`.
pub trait InteractionLog: Send + Sync {
    fn has_interacted(&self, tweet_id: TweetId) -> Result<bool, GateError>;

    fn reserve(&self, tweet_id: TweetId) -> Result<ReserveOutcome, GateError>;

    fn record(&self, record: InteractionRecord) -> Result<(), GateError>;

    fn release(&self, tweet_id: TweetId);
}
