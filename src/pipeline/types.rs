use serde::{Deserialize, Serialize};

use crate::{
    gate::{
        ports::{RatingReport, RatingRequest},
        types::{ActionCategory, CandidateAction, ContentVariant, Decision, TweetId},
    },
    mention::TweetMention,
};

/// A social event with drafted responses, as produced by the feed readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateEvent {
    pub category: ActionCategory,
    pub target_tweet_id: TweetId,
    #[serde(default)]
    pub conversation_id: Option<TweetId>,
    #[serde(default)]
    pub quote_tweet_id: Option<TweetId>,
    pub author: String,
    #[serde(default)]
    pub context: String,
    pub text_response: String,
    #[serde(default)]
    pub meme_response: Option<String>,
    /// Thread context for mentions; when present the tag must be an explicit
    /// summon before anything is rated.
    #[serde(default)]
    pub mention: Option<TweetMention>,
}

impl CandidateEvent {
    pub fn rating_request(&self) -> RatingRequest {
        RatingRequest {
            category: self.category,
            target_tweet_id: self.target_tweet_id,
            context: self.context.clone(),
            text_response: self.text_response.clone(),
            meme_response: self.meme_response.clone(),
        }
    }

    pub fn to_candidate(&self, report: Option<RatingReport>) -> CandidateAction {
        CandidateAction {
            category: self.category,
            target_tweet_id: self.target_tweet_id,
            text_response: self.text_response.clone(),
            meme_response: self.meme_response.clone(),
            rating: report.map(|report| report.rating),
            meme_rating: report.and_then(|report| report.meme_rating),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    Reply,
    QuoteTweet,
}

impl Delivery {
    pub fn as_str(self) -> &'static str {
        match self {
            Delivery::Reply => "reply",
            Delivery::QuoteTweet => "quote_tweet",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRequest {
    pub target_tweet_id: TweetId,
    pub conversation_id: Option<TweetId>,
    pub quote_tweet_id: Option<TweetId>,
    pub delivery: Delivery,
    pub variant: ContentVariant,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PostReceipt {
    #[serde(default)]
    pub posted_tweet_id: Option<TweetId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PipelineOutcome {
    /// The mention was reply-prefix noise rather than an explicit tag.
    NotSummoned { tweet_id: TweetId },
    /// Follower reply probability ruled the tweet out before rating.
    SampledOut {
        tweet_id: TweetId,
        probability: f64,
    },
    /// The gate returned `Skip` or `Fail`; nothing was posted or recorded.
    Declined {
        tweet_id: TweetId,
        decision: Decision,
    },
    Acted {
        tweet_id: TweetId,
        variant: ContentVariant,
        delivery: Delivery,
        receipt: PostReceipt,
    },
}

impl PipelineOutcome {
    pub fn tweet_id(&self) -> TweetId {
        match self {
            PipelineOutcome::NotSummoned { tweet_id }
            | PipelineOutcome::SampledOut { tweet_id, .. }
            | PipelineOutcome::Declined { tweet_id, .. }
            | PipelineOutcome::Acted { tweet_id, .. } => *tweet_id,
        }
    }

    pub fn decision(&self) -> Option<&Decision> {
        match self {
            PipelineOutcome::Declined { decision, .. } => Some(decision),
            _ => None,
        }
    }

    pub fn is_acted(&self) -> bool {
        matches!(self, PipelineOutcome::Acted { .. })
    }
}
