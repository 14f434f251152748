use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::gate::{
    error::{GateError, internal_error},
    types::{ContentVariant, TweetId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionAction {
    ReplyText,
    ReplyMeme,
    QuoteText,
}

impl InteractionAction {
    pub fn variant(self) -> ContentVariant {
        match self {
            InteractionAction::ReplyText | InteractionAction::QuoteText => ContentVariant::Text,
            InteractionAction::ReplyMeme => ContentVariant::Meme,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub tweet_id: TweetId,
    /// RFC 3339, UTC.
    pub recorded_at: String,
    pub action_taken: InteractionAction,
}

impl InteractionRecord {
    pub fn new(
        tweet_id: TweetId,
        recorded_at: impl Into<String>,
        action_taken: InteractionAction,
    ) -> Self {
        Self {
            tweet_id,
            recorded_at: recorded_at.into(),
            action_taken,
        }
    }

    pub fn now(tweet_id: TweetId, action_taken: InteractionAction) -> Result<Self, GateError> {
        let recorded_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|err| internal_error(format!("failed to format record timestamp: {err}")))?;
        Ok(Self::new(tweet_id, recorded_at, action_taken))
    }
}
