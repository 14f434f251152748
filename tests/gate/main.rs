
use echos::gate::{ActionCategory, CandidateAction, Rating};

pub(crate) fn rating(value: u8) -> Rating {
    Rating::new(value).expect("test rating should be in range")
}

pub(crate) fn candidate(category: ActionCategory, rating_value: Option<u8>) -> CandidateAction {
    CandidateAction {
        category,
        target_tweet_id: 1001,
        text_response: "text draft".to_string(),
        meme_response: None,
        rating: rating_value.map(rating),
        meme_rating: None,
    }
}

pub(crate) fn with_meme(mut candidate: CandidateAction, meme_rating: Option<u8>) -> CandidateAction {
    candidate.meme_response = Some("meme draft".to_string());
    candidate.meme_rating = meme_rating.map(rating);
    candidate
}
