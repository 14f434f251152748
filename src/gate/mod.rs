pub mod error;
pub mod ports;
pub mod response_gate;
pub mod types;

pub use error::{GateError, GateErrorKind};
pub use ports::{InteractionLog, RatingProvider, RatingReport, RatingRequest, ReserveOutcome};
pub use response_gate::{decide, decide_with_rating_error};
pub use types::{
    ActionCategory, CandidateAction, ContentVariant, Decision, FailReason, Rating, SkipReason,
    ThresholdSet, TweetId,
};
