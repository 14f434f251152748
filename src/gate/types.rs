use std::fmt;

use serde::{Deserialize, Serialize};

use crate::gate::error::{GateError, invalid_configuration, invalid_rating};

pub type TweetId = u64;

/// Self-assessed quality score on the 0..=10 scale used by the LLM judge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: Rating = Rating(0);
    pub const MAX: Rating = Rating(10);

    pub fn new(value: u8) -> Result<Self, GateError> {
        if value > Self::MAX.0 {
            return Err(invalid_rating(format!(
                "rating {value} is outside the 0..=10 scale"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = GateError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rating::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    Mention,
    FollowedAccount,
}

impl ActionCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionCategory::Mention => "mention",
            ActionCategory::FollowedAccount => "followed_account",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentVariant {
    Text,
    Meme,
}

/// A drafted response waiting for the gate. `rating` is `None` when the
/// rating provider could not produce a score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateAction {
    pub category: ActionCategory,
    pub target_tweet_id: TweetId,
    pub text_response: String,
    #[serde(default)]
    pub meme_response: Option<String>,
    #[serde(default)]
    pub rating: Option<Rating>,
    #[serde(default)]
    pub meme_rating: Option<Rating>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    DuplicateInteraction,
    BelowThreshold { rating: Rating, threshold: Rating },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailReason {
    RatingUnavailable { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    Act {
        variant: ContentVariant,
        content: String,
    },
    Skip(SkipReason),
    Fail(FailReason),
}

impl Decision {
    pub fn is_act(&self) -> bool {
        matches!(self, Decision::Act { .. })
    }

    pub fn variant(&self) -> Option<ContentVariant> {
        match self {
            Decision::Act { variant, .. } => Some(*variant),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Decision::Act {
                variant: ContentVariant::Text,
                ..
            } => "act_text",
            Decision::Act {
                variant: ContentVariant::Meme,
                ..
            } => "act_meme",
            Decision::Skip(SkipReason::DuplicateInteraction) => "skip_duplicate_interaction",
            Decision::Skip(SkipReason::BelowThreshold { .. }) => "skip_below_threshold",
            Decision::Fail(FailReason::RatingUnavailable { .. }) => "fail_rating_unavailable",
        }
    }
}

const DEFAULT_MENTIONS_THRESHOLD: Rating = Rating(6);
const DEFAULT_FOLLOWERS_THRESHOLD: Rating = Rating(9);
const DEFAULT_MEME_THRESHOLD: Rating = Rating(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdSet {
    #[serde(default = "default_mentions_threshold")]
    pub mentions: Rating,
    #[serde(default = "default_followers_threshold")]
    pub followers: Rating,
    #[serde(default = "default_meme_threshold")]
    pub meme: Rating,
}

fn default_mentions_threshold() -> Rating {
    DEFAULT_MENTIONS_THRESHOLD
}

fn default_followers_threshold() -> Rating {
    DEFAULT_FOLLOWERS_THRESHOLD
}

fn default_meme_threshold() -> Rating {
    DEFAULT_MEME_THRESHOLD
}

impl ThresholdSet {
    pub fn new(mentions: u8, followers: u8, meme: u8) -> Result<Self, GateError> {
        Ok(Self {
            mentions: threshold("mentions", mentions)?,
            followers: threshold("followers", followers)?,
            meme: threshold("meme", meme)?,
        })
    }

    pub fn threshold_for(&self, category: ActionCategory) -> Rating {
        match category {
            ActionCategory::Mention => self.mentions,
            ActionCategory::FollowedAccount => self.followers,
        }
    }
}

impl Default for ThresholdSet {
    fn default() -> Self {
        Self {
            mentions: DEFAULT_MENTIONS_THRESHOLD,
            followers: DEFAULT_FOLLOWERS_THRESHOLD,
            meme: DEFAULT_MEME_THRESHOLD,
        }
    }
}

fn threshold(name: &str, value: u8) -> Result<Rating, GateError> {
    Rating::new(value).map_err(|_| {
        invalid_configuration(format!(
            "{name} threshold {value} is outside the 0..=10 range"
        ))
    })
}
