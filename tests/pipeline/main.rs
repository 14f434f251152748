mod mention;
mod reservation;

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use echos::{
    config::PipelineRuntimeConfig,
    gate::{
        ActionCategory, GateError, InteractionLog, Rating, RatingProvider, RatingReport,
        RatingRequest, ThresholdSet, TweetId,
        error::{post_failed, rating_unavailable},
    },
    interaction::InMemoryInteractionLog,
    pipeline::{
        CandidateEvent, PostReceipt, PostRequest, ResponsePipeline, ResponsePoster,
        ScriptedChance,
    },
    telemetry::{GateTelemetryEvent, TelemetrySink},
};

pub(crate) fn rating(value: u8) -> Rating {
    Rating::new(value).expect("test rating should be in range")
}

pub(crate) fn report(value: u8, meme: Option<u8>) -> RatingReport {
    RatingReport {
        rating: rating(value),
        meme_rating: meme.map(rating),
    }
}

pub(crate) fn event(category: ActionCategory, tweet_id: TweetId) -> CandidateEvent {
    CandidateEvent {
        category,
        target_tweet_id: tweet_id,
        conversation_id: Some(tweet_id),
        quote_tweet_id: None,
        author: "userB".to_string(),
        context: "gm frens".to_string(),
        text_response: "text draft".to_string(),
        meme_response: None,
        mention: None,
    }
}

#[derive(Default)]
pub(crate) struct FakeRater {
    reports: Mutex<HashMap<TweetId, Result<RatingReport, GateError>>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl FakeRater {
    pub(crate) fn delayed(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub(crate) fn set(&self, tweet_id: TweetId, result: Result<RatingReport, GateError>) {
        self.reports
            .lock()
            .expect("rater lock")
            .insert(tweet_id, result);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RatingProvider for FakeRater {
    async fn rate(&self, req: &RatingRequest) -> Result<RatingReport, GateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reports
            .lock()
            .expect("rater lock")
            .get(&req.target_tweet_id)
            .cloned()
            .unwrap_or_else(|| Err(rating_unavailable("no fixture rating")))
    }
}

#[derive(Default)]
pub(crate) struct RecordingPoster {
    requests: Mutex<Vec<PostRequest>>,
    fail: bool,
    delay: Option<Duration>,
}

impl RecordingPoster {
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn delayed(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub(crate) fn requests(&self) -> Vec<PostRequest> {
        self.requests.lock().expect("poster lock").clone()
    }
}

#[async_trait]
impl ResponsePoster for RecordingPoster {
    async fn post(&self, req: &PostRequest) -> Result<PostReceipt, GateError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(post_failed("rate limited"));
        }
        self.requests.lock().expect("poster lock").push(req.clone());
        Ok(PostReceipt {
            posted_tweet_id: Some(req.target_tweet_id + 1_000_000),
        })
    }
}

#[derive(Default)]
pub(crate) struct RecordingTelemetry {
    events: Mutex<Vec<GateTelemetryEvent>>,
}

impl RecordingTelemetry {
    pub(crate) fn events(&self) -> Vec<GateTelemetryEvent> {
        self.events.lock().expect("telemetry lock").clone()
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn on_event(&self, event: GateTelemetryEvent) {
        self.events.lock().expect("telemetry lock").push(event);
    }
}

pub(crate) struct Harness {
    pub(crate) pipeline: ResponsePipeline,
    pub(crate) rater: Arc<FakeRater>,
    pub(crate) log: Arc<InMemoryInteractionLog>,
    pub(crate) poster: Arc<RecordingPoster>,
    pub(crate) telemetry: Arc<RecordingTelemetry>,
}

pub(crate) struct HarnessBuilder {
    settings: PipelineRuntimeConfig,
    rater: FakeRater,
    log: InMemoryInteractionLog,
    poster: RecordingPoster,
    chance: ScriptedChance,
}

impl HarnessBuilder {
    pub(crate) fn new() -> Self {
        Self {
            settings: PipelineRuntimeConfig::default(),
            rater: FakeRater::default(),
            log: InMemoryInteractionLog::new(),
            poster: RecordingPoster::default(),
            chance: ScriptedChance::constant(0.99),
        }
    }

    pub(crate) fn settings(mut self, edit: impl FnOnce(&mut PipelineRuntimeConfig)) -> Self {
        edit(&mut self.settings);
        self
    }

    pub(crate) fn rater(mut self, rater: FakeRater) -> Self {
        self.rater = rater;
        self
    }

    pub(crate) fn log(mut self, log: InMemoryInteractionLog) -> Self {
        self.log = log;
        self
    }

    pub(crate) fn poster(mut self, poster: RecordingPoster) -> Self {
        self.poster = poster;
        self
    }

    pub(crate) fn chance(mut self, chance: ScriptedChance) -> Self {
        self.chance = chance;
        self
    }

    pub(crate) fn build(self) -> Harness {
        let rater = Arc::new(self.rater);
        let log = Arc::new(self.log);
        let poster = Arc::new(self.poster);
        let telemetry = Arc::new(RecordingTelemetry::default());
        let pipeline = ResponsePipeline::new(
            ThresholdSet::default(),
            self.settings,
            rater.clone(),
            log.clone(),
            poster.clone(),
            Arc::new(self.chance),
            telemetry.clone(),
        );
        Harness {
            pipeline,
            rater,
            log,
            poster,
            telemetry,
        }
    }
}

/// Pipeline over an arbitrary log, with default settings and no quote rolls.
pub(crate) fn pipeline_with_log(
    log: Arc<dyn InteractionLog>,
    rater: Arc<dyn RatingProvider>,
    poster: Arc<dyn ResponsePoster>,
) -> ResponsePipeline {
    ResponsePipeline::new(
        ThresholdSet::default(),
        PipelineRuntimeConfig::default(),
        rater,
        log,
        poster,
        Arc::new(ScriptedChance::constant(0.99)),
        Arc::new(RecordingTelemetry::default()),
    )
}
