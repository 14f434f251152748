use std::sync::Arc;

use tokio::time::{Duration, timeout};

use crate::{
    config::PipelineRuntimeConfig,
    gate::{
        error::{GateError, rating_unavailable},
        ports::{InteractionLog, RatingProvider, RatingReport, ReserveOutcome},
        response_gate::{decide, decide_with_rating_error},
        types::{ActionCategory, ContentVariant, Decision, ThresholdSet, TweetId},
    },
    interaction::types::{InteractionAction, InteractionRecord},
    mention::should_reply_to_mention,
    pipeline::{
        ports::{ChanceSource, ResponsePoster},
        types::{CandidateEvent, Delivery, PipelineOutcome, PostRequest},
    },
    telemetry::{GateTelemetryEvent, TelemetrySink},
};

pub struct ResponsePipeline {
    thresholds: ThresholdSet,
    settings: PipelineRuntimeConfig,
    rater: Arc<dyn RatingProvider>,
    log: Arc<dyn InteractionLog>,
    poster: Arc<dyn ResponsePoster>,
    chance: Arc<dyn ChanceSource>,
    telemetry: Arc<dyn TelemetrySink>,
}

impl ResponsePipeline {
    pub fn new(
        thresholds: ThresholdSet,
        settings: PipelineRuntimeConfig,
        rater: Arc<dyn RatingProvider>,
        log: Arc<dyn InteractionLog>,
        poster: Arc<dyn ResponsePoster>,
        chance: Arc<dyn ChanceSource>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self {
            thresholds,
            settings,
            rater,
            log,
            poster,
            chance,
            telemetry,
        }
    }

    pub fn thresholds(&self) -> &ThresholdSet {
        &self.thresholds
    }

    /// Runs one candidate through mention filtering, follower sampling,
    /// reservation, rating, the gate and the poster. A record is appended only
    /// after a successful post. Any path that stops before the post, including
    /// dropping the returned future, releases the reservation.
    #[tracing::instrument(
        name = "handle_candidate",
        target = "gate",
        skip(self, event),
        fields(tweet_id = event.target_tweet_id, category = event.category.as_str())
    )]
    pub async fn handle(&self, event: CandidateEvent) -> Result<PipelineOutcome, GateError> {
        let tweet_id = event.target_tweet_id;

        if let (Some(handle), Some(mention)) = (&self.settings.agent_handle, &event.mention)
            && !should_reply_to_mention(handle, mention)
        {
            self.telemetry
                .on_event(GateTelemetryEvent::NotSummoned { tweet_id });
            return Ok(PipelineOutcome::NotSummoned { tweet_id });
        }

        if event.category == ActionCategory::FollowedAccount {
            let probability = self.settings.reply_probability(&event.author);
            if probability < 1.0 && self.chance.roll() >= probability {
                self.telemetry.on_event(GateTelemetryEvent::Sampled {
                    tweet_id,
                    author: event.author.clone(),
                    probability,
                });
                return Ok(PipelineOutcome::SampledOut {
                    tweet_id,
                    probability,
                });
            }
        }

        let outcome = self.log.reserve(tweet_id)?;
        if outcome != ReserveOutcome::Reserved {
            tracing::debug!(
                target: "gate",
                tweet_id,
                reservation = ?outcome,
                "candidate_already_claimed"
            );
            let decision = decide(&event.to_candidate(None), &self.thresholds, true);
            return Ok(self.declined(&event, decision));
        }

        let reservation = Reservation::new(Arc::clone(&self.log), tweet_id);
        self.rate_and_act(&event, reservation).await
    }

    async fn rate_and_act(
        &self,
        event: &CandidateEvent,
        reservation: Reservation,
    ) -> Result<PipelineOutcome, GateError> {
        let tweet_id = event.target_tweet_id;

        let (report, rating_error) = match self.rate(event).await {
            Ok(report) => (Some(report), None),
            Err(err) => {
                self.telemetry.on_event(GateTelemetryEvent::RatingFailed {
                    tweet_id,
                    kind: err.kind,
                    message: err.message.clone(),
                });
                (None, Some(err.message))
            }
        };

        let candidate = event.to_candidate(report);
        let decision = decide_with_rating_error(
            &candidate,
            &self.thresholds,
            false,
            rating_error.as_deref(),
        );

        let label = decision.label();
        let (variant, content) = match decision {
            Decision::Act { variant, content } => (variant, content),
            other => return Ok(self.declined(event, other)),
        };
        self.telemetry.on_event(GateTelemetryEvent::Decided {
            tweet_id,
            category: event.category,
            decision: label,
        });

        let delivery = self.choose_delivery(variant);
        let action = match (variant, delivery) {
            (ContentVariant::Meme, _) => InteractionAction::ReplyMeme,
            (ContentVariant::Text, Delivery::QuoteTweet) => InteractionAction::QuoteText,
            (ContentVariant::Text, Delivery::Reply) => InteractionAction::ReplyText,
        };
        let record = InteractionRecord::now(tweet_id, action)?;
        let request = PostRequest {
            target_tweet_id: tweet_id,
            conversation_id: event.conversation_id,
            quote_tweet_id: match delivery {
                Delivery::QuoteTweet => Some(event.quote_tweet_id.unwrap_or(tweet_id)),
                Delivery::Reply => None,
            },
            delivery,
            variant,
            content,
        };

        let receipt = match self.poster.post(&request).await {
            Ok(receipt) => receipt,
            Err(err) => {
                self.telemetry.on_event(GateTelemetryEvent::PostFailed {
                    tweet_id,
                    message: err.message.clone(),
                });
                return Err(err);
            }
        };

        // Posted: the tweet stays claimed even if the record below fails.
        reservation.consume();
        self.log.record(record)?;

        self.telemetry.on_event(GateTelemetryEvent::Posted {
            tweet_id,
            posted_tweet_id: receipt.posted_tweet_id,
            delivery: delivery.as_str(),
        });

        Ok(PipelineOutcome::Acted {
            tweet_id,
            variant,
            delivery,
            receipt,
        })
    }

    async fn rate(&self, event: &CandidateEvent) -> Result<RatingReport, GateError> {
        let limit: Duration = self.settings.rating_timeout();
        match timeout(limit, self.rater.rate(&event.rating_request())).await {
            Ok(result) => result,
            Err(_) => Err(rating_unavailable(format!(
                "rating provider timed out after {}ms",
                limit.as_millis()
            ))),
        }
    }

    /// Memes always go out as direct replies; text is quoted with the
    /// configured probability.
    fn choose_delivery(&self, variant: ContentVariant) -> Delivery {
        let probability = self.settings.quote_tweet_probability;
        if variant == ContentVariant::Text && probability > 0.0 && self.chance.roll() < probability
        {
            Delivery::QuoteTweet
        } else {
            Delivery::Reply
        }
    }

    fn declined(&self, event: &CandidateEvent, decision: Decision) -> PipelineOutcome {
        self.telemetry.on_event(GateTelemetryEvent::Decided {
            tweet_id: event.target_tweet_id,
            category: event.category,
            decision: decision.label(),
        });
        PipelineOutcome::Declined {
            tweet_id: event.target_tweet_id,
            decision,
        }
    }
}

/// A claimed tweet id. Dropping it without `consume` releases the claim,
/// also when the `handle` future itself is dropped.
struct Reservation {
    log: Arc<dyn InteractionLog>,
    tweet_id: TweetId,
    consumed: bool,
}

impl Reservation {
    fn new(log: Arc<dyn InteractionLog>, tweet_id: TweetId) -> Self {
        Self {
            log,
            tweet_id,
            consumed: false,
        }
    }

    fn consume(mut self) {
        self.consumed = true;
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        if !self.consumed {
            self.log.release(self.tweet_id);
        }
    }
}
