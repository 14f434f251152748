use crate::gate::{
    error::GateErrorKind,
    types::{ActionCategory, TweetId},
};

#[derive(Debug, Clone)]
pub enum GateTelemetryEvent {
    NotSummoned {
        tweet_id: TweetId,
    },
    Sampled {
        tweet_id: TweetId,
        author: String,
        probability: f64,
    },
    RatingFailed {
        tweet_id: TweetId,
        kind: GateErrorKind,
        message: String,
    },
    Decided {
        tweet_id: TweetId,
        category: ActionCategory,
        decision: &'static str,
    },
    Posted {
        tweet_id: TweetId,
        posted_tweet_id: Option<TweetId>,
        delivery: &'static str,
    },
    PostFailed {
        tweet_id: TweetId,
        message: String,
    },
}

pub trait TelemetrySink: Send + Sync {
    fn on_event(&self, event: GateTelemetryEvent);
}

#[derive(Default)]
pub struct NoopTelemetrySink;

impl TelemetrySink for NoopTelemetrySink {
    fn on_event(&self, _event: GateTelemetryEvent) {}
}

#[derive(Default)]
pub struct TracingTelemetrySink;

impl TelemetrySink for TracingTelemetrySink {
    fn on_event(&self, event: GateTelemetryEvent) {
        match event {
            GateTelemetryEvent::NotSummoned { tweet_id } => {
                tracing::debug!(target: "gate", tweet_id, "mention_not_summoned");
            }
            GateTelemetryEvent::Sampled {
                tweet_id,
                author,
                probability,
            } => {
                tracing::info!(
                    target: "gate",
                    tweet_id,
                    author = %author,
                    probability,
                    "follower_reply_sampled_out"
                );
            }
            GateTelemetryEvent::RatingFailed {
                tweet_id,
                kind,
                message,
            } => {
                tracing::warn!(
                    target: "gate",
                    tweet_id,
                    kind = ?kind,
                    error = %message,
                    "rating_unavailable"
                );
            }
            GateTelemetryEvent::Decided {
                tweet_id,
                category,
                decision,
            } => {
                tracing::info!(
                    target: "gate",
                    tweet_id,
                    category = category.as_str(),
                    decision,
                    "candidate_decided"
                );
            }
            GateTelemetryEvent::Posted {
                tweet_id,
                posted_tweet_id,
                delivery,
            } => {
                tracing::info!(
                    target: "gate",
                    tweet_id,
                    posted_tweet_id = ?posted_tweet_id,
                    delivery,
                    "response_posted"
                );
            }
            GateTelemetryEvent::PostFailed { tweet_id, message } => {
                tracing::warn!(target: "gate", tweet_id, error = %message, "response_post_failed");
            }
        }
    }
}
