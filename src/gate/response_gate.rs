use crate::gate::types::{
    CandidateAction, ContentVariant, Decision, FailReason, SkipReason, ThresholdSet,
};

const MISSING_RATING_MESSAGE: &str = "rating provider produced no rating for candidate";

/// Decides whether the agent acts on `candidate`.
///
/// Duplicate interactions are skipped before the rating is even looked at, and
/// a missing rating is reported as a failure rather than folded into a skip.
/// The category threshold is an inclusive lower bound. When the response
/// clears it, the meme draft wins over the text draft only if its own rating
/// clears the meme threshold.
pub fn decide(
    candidate: &CandidateAction,
    thresholds: &ThresholdSet,
    already_interacted: bool,
) -> Decision {
    if already_interacted {
        return Decision::Skip(SkipReason::DuplicateInteraction);
    }

    let Some(rating) = candidate.rating else {
        return Decision::Fail(FailReason::RatingUnavailable {
            message: MISSING_RATING_MESSAGE.to_string(),
        });
    };

    let threshold = thresholds.threshold_for(candidate.category);
    if rating < threshold {
        return Decision::Skip(SkipReason::BelowThreshold { rating, threshold });
    }

    match (&candidate.meme_response, candidate.meme_rating) {
        (Some(meme), Some(meme_rating)) if meme_rating >= thresholds.meme => Decision::Act {
            variant: ContentVariant::Meme,
            content: meme.clone(),
        },
        _ => Decision::Act {
            variant: ContentVariant::Text,
            content: candidate.text_response.clone(),
        },
    }
}

/// Same as [`decide`], but carries the provider's failure message into the
/// `Fail` outcome when the rating is missing.
pub fn decide_with_rating_error(
    candidate: &CandidateAction,
    thresholds: &ThresholdSet,
    already_interacted: bool,
    rating_error: Option<&str>,
) -> Decision {
    match (decide(candidate, thresholds, already_interacted), rating_error) {
        (Decision::Fail(FailReason::RatingUnavailable { .. }), Some(message)) => {
            Decision::Fail(FailReason::RatingUnavailable {
                message: message.to_string(),
            })
        }
        (decision, _) => decision,
    }
}
