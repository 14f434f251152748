//! Collaborators for the `echos-gate` binary. Ratings arrive alongside each
//! candidate on stdin (the LLM judge runs upstream), and posts are written
//! back out as NDJSON instead of hitting a social API.

use std::{
    collections::HashMap,
    sync::{Mutex as StdMutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    sync::Mutex,
};

use crate::{
    gate::{
        error::{GateError, post_failed, rating_unavailable},
        ports::{RatingProvider, RatingReport, RatingRequest},
        types::{Rating, TweetId},
    },
    pipeline::{
        ports::ResponsePoster,
        types::{CandidateEvent, PostReceipt, PostRequest},
    },
};

/// One stdin line: a candidate event plus the judge's scores for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedCandidate {
    #[serde(flatten)]
    pub event: CandidateEvent,
    #[serde(default)]
    pub rating: Option<Rating>,
    #[serde(default)]
    pub meme_rating: Option<Rating>,
}

impl ScriptedCandidate {
    pub fn report(&self) -> Option<RatingReport> {
        self.rating.map(|rating| RatingReport {
            rating,
            meme_rating: self.meme_rating,
        })
    }
}

#[derive(Debug, Default)]
pub struct ReplayRatingProvider {
    staged: StdMutex<HashMap<TweetId, RatingReport>>,
}

impl ReplayRatingProvider {
    /// Makes `candidate`'s scores available to one `rate` call for its tweet
    /// while the returned guard is alive. A candidate without a rating clears
    /// any earlier one.
    pub fn stage(&self, candidate: &ScriptedCandidate) -> StagedRating<'_> {
        let tweet_id = candidate.event.target_tweet_id;
        let mut staged = self.lock();
        match candidate.report() {
            Some(report) => {
                staged.insert(tweet_id, report);
            }
            None => {
                staged.remove(&tweet_id);
            }
        }
        StagedRating {
            provider: self,
            tweet_id,
        }
    }

    pub fn staged_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TweetId, RatingReport>> {
        self.staged.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Drops the staged scores for one tweet when the candidate is done with,
/// whether or not the pipeline got as far as rating it.
#[must_use = "the staged rating is discarded as soon as this guard is dropped"]
pub struct StagedRating<'a> {
    provider: &'a ReplayRatingProvider,
    tweet_id: TweetId,
}

impl Drop for StagedRating<'_> {
    fn drop(&mut self) {
        self.provider.lock().remove(&self.tweet_id);
    }
}

#[async_trait]
impl RatingProvider for ReplayRatingProvider {
    async fn rate(&self, req: &RatingRequest) -> Result<RatingReport, GateError> {
        self.lock()
            .remove(&req.target_tweet_id)
            .ok_or_else(|| {
                rating_unavailable(format!(
                    "no rating supplied for tweet {}",
                    req.target_tweet_id
                ))
            })
    }
}

#[derive(Debug, Serialize)]
struct PostLine<'a> {
    post: &'a PostRequest,
}

/// Serializes values as one JSON document per line onto `W`.
pub struct NdjsonWriter<W> {
    writer: Mutex<W>,
}

impl<W> NdjsonWriter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub async fn write_line<T: Serialize + ?Sized>(&self, value: &T) -> std::io::Result<()> {
        let mut line = serde_json::to_vec(value).map_err(std::io::Error::other)?;
        line.push(b'\n');
        let mut writer = self.writer.lock().await;
        writer.write_all(&line).await?;
        writer.flush().await
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<W> ResponsePoster for NdjsonWriter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn post(&self, req: &PostRequest) -> Result<PostReceipt, GateError> {
        self.write_line(&PostLine { post: req })
            .await
            .map_err(|err| post_failed(format!("failed to emit post request: {err}")))?;
        Ok(PostReceipt::default())
    }
}
