use std::{fs, sync::Arc, time::Duration};

use echos::{
    gate::{
        ActionCategory, Decision, GateErrorKind, InteractionLog, ReserveOutcome, SkipReason,
        TweetId,
        error::{GateError, interaction_log_unavailable},
    },
    interaction::{FileInteractionLog, InMemoryInteractionLog, InteractionAction, InteractionRecord},
    pipeline::PipelineOutcome,
    replay::{ReplayRatingProvider, ScriptedCandidate},
};
use uuid::Uuid;

use super::{FakeRater, HarnessBuilder, RecordingPoster, event, pipeline_with_log, report};

fn duplicate_skip() -> Option<Decision> {
    Some(Decision::Skip(SkipReason::DuplicateInteraction))
}

#[tokio::test]
async fn given_handle_dropped_while_rating_when_retried_then_tweet_is_acted_on() {
    let harness = HarnessBuilder::new()
        .rater(FakeRater::delayed(Duration::from_millis(200)))
        .build();
    harness.rater.set(42, Ok(report(8, None)));

    let cancelled = tokio::time::timeout(
        Duration::from_millis(20),
        harness.pipeline.handle(event(ActionCategory::Mention, 42)),
    )
    .await;
    assert!(cancelled.is_err(), "handle should still be waiting on the rater");
    assert_eq!(harness.log.pending_count(), 0);
    assert!(harness.log.is_empty());

    let retried = harness
        .pipeline
        .handle(event(ActionCategory::Mention, 42))
        .await
        .expect("retry should succeed");
    assert!(retried.is_acted(), "unexpected retry outcome: {retried:?}");
    assert_eq!(harness.poster.requests().len(), 1);
    assert_eq!(harness.log.len(), 1);
}

#[tokio::test]
async fn given_handle_dropped_while_posting_when_retried_then_reservation_was_released() {
    let harness = HarnessBuilder::new()
        .poster(RecordingPoster::delayed(Duration::from_millis(200)))
        .build();
    harness.rater.set(43, Ok(report(8, None)));

    let cancelled = tokio::time::timeout(
        Duration::from_millis(20),
        harness.pipeline.handle(event(ActionCategory::Mention, 43)),
    )
    .await;
    assert!(cancelled.is_err(), "handle should still be waiting on the poster");
    assert_eq!(harness.log.pending_count(), 0);
    assert_eq!(
        harness.log.reserve(43).expect("reserve"),
        ReserveOutcome::Reserved
    );
}

/// Reserves like the in-memory log but can never persist a record.
#[derive(Default)]
struct RecordRejectingLog {
    inner: InMemoryInteractionLog,
}

impl InteractionLog for RecordRejectingLog {
    fn has_interacted(&self, tweet_id: TweetId) -> Result<bool, GateError> {
        self.inner.has_interacted(tweet_id)
    }

    fn reserve(&self, tweet_id: TweetId) -> Result<ReserveOutcome, GateError> {
        self.inner.reserve(tweet_id)
    }

    fn record(&self, _record: InteractionRecord) -> Result<(), GateError> {
        Err(interaction_log_unavailable("state volume is read-only"))
    }

    fn release(&self, tweet_id: TweetId) {
        self.inner.release(tweet_id);
    }
}

#[tokio::test]
async fn given_record_rejected_after_post_when_handled_again_then_duplicate_skip() {
    let rater = Arc::new(FakeRater::default());
    rater.set(44, Ok(report(9, None)));
    let poster = Arc::new(RecordingPoster::default());
    let pipeline = pipeline_with_log(
        Arc::new(RecordRejectingLog::default()),
        rater.clone(),
        poster.clone(),
    );

    let err = pipeline
        .handle(event(ActionCategory::Mention, 44))
        .await
        .expect_err("record failure must surface");
    assert_eq!(err.kind, GateErrorKind::InteractionLogUnavailable);
    assert_eq!(poster.requests().len(), 1);

    let again = pipeline
        .handle(event(ActionCategory::Mention, 44))
        .await
        .expect("second candidate should be declined");
    assert_eq!(again.decision().cloned(), duplicate_skip());
    assert_eq!(poster.requests().len(), 1);
    assert_eq!(rater.calls(), 1);
}

#[tokio::test]
async fn given_file_log_that_cannot_persist_when_post_succeeds_then_record_still_blocks_reposts() {
    let dir = std::env::temp_dir().join(format!("echos-pipeline-test-{}", Uuid::now_v7()));
    fs::create_dir_all(&dir).expect("temp dir should exist");
    let path = dir.join("interactions.json");
    let log = Arc::new(FileInteractionLog::open(path.clone()).expect("log should open"));
    // A directory squatting on the temp file makes every save fail.
    fs::create_dir_all(path.with_extension("tmp")).expect("blocker should be created");

    let rater = Arc::new(FakeRater::default());
    rater.set(45, Ok(report(9, None)));
    let poster = Arc::new(RecordingPoster::default());
    let pipeline = pipeline_with_log(log.clone(), rater, poster.clone());

    let err = pipeline
        .handle(event(ActionCategory::Mention, 45))
        .await
        .expect_err("persist failure must surface");
    assert_eq!(err.kind, GateErrorKind::InteractionLogUnavailable);
    assert!(log.has_interacted(45).expect("lookup"));
    assert_eq!(log.records().len(), 1);

    let again = pipeline
        .handle(event(ActionCategory::Mention, 45))
        .await
        .expect("second candidate should be declined");
    assert_eq!(again.decision().cloned(), duplicate_skip());
    assert_eq!(poster.requests().len(), 1);

    let _ = fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn given_replayed_candidates_that_never_reach_rating_then_nothing_stays_staged() {
    let rater = Arc::new(ReplayRatingProvider::default());
    let log = Arc::new(InMemoryInteractionLog::with_records(vec![InteractionRecord::new(
        46,
        "2026-03-01T12:00:00Z",
        InteractionAction::ReplyText,
    )])
    .expect("seed log"));
    let pipeline = pipeline_with_log(log, rater.clone(), Arc::new(RecordingPoster::default()));

    for _ in 0..3 {
        let scripted: ScriptedCandidate = serde_json::from_str(
            r#"{"category":"mention","target_tweet_id":46,"author":"userB","text_response":"gm","rating":10}"#,
        )
        .expect("candidate should parse");
        let staged = rater.stage(&scripted);
        let outcome = pipeline
            .handle(scripted.event)
            .await
            .expect("duplicate is an outcome");
        drop(staged);

        assert!(matches!(outcome, PipelineOutcome::Declined { .. }));
        assert_eq!(rater.staged_count(), 0);
    }
}
