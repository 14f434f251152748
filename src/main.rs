use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    signal::unix::{SignalKind, signal},
};

use echos::{
    cli::args_from_env,
    config::Config,
    gate::{GateErrorKind, TweetId},
    interaction::FileInteractionLog,
    logging::init_tracing,
    pipeline::{ResponsePipeline, ThreadRngChance},
    replay::{NdjsonWriter, ReplayRatingProvider, ScriptedCandidate},
    telemetry::TracingTelemetrySink,
};

#[derive(Debug, Serialize)]
struct ErrorLine<'a> {
    tweet_id: Option<TweetId>,
    kind: &'a str,
    message: &'a str,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = args_from_env()?;
    let config = Config::load(&args.config_path)
        .with_context(|| format!("failed to load config from {}", args.config_path.display()))?;
    let logging = init_tracing(&config)?;

    let log = Arc::new(
        FileInteractionLog::open(config.interaction_log.state_path.clone()).with_context(|| {
            format!(
                "failed to open interaction log {}",
                config.interaction_log.state_path.display()
            )
        })?,
    );
    let rater = Arc::new(ReplayRatingProvider::default());
    let output = Arc::new(NdjsonWriter::new(tokio::io::stdout()));
    let pipeline = ResponsePipeline::new(
        config.gate.thresholds,
        config.pipeline.clone(),
        rater.clone(),
        log,
        output.clone(),
        Arc::new(ThreadRngChance),
        Arc::new(TracingTelemetrySink),
    );

    tracing::info!(
        target: "gate",
        run_id = logging.run_id(),
        log_dir = %logging.log_dir().display(),
        "gate_started"
    );

    let mut sigint =
        signal(SignalKind::interrupt()).context("unable to listen for SIGINT (Ctrl+C)")?;
    let mut sigterm = signal(SignalKind::terminate()).context("unable to listen for SIGTERM")?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let stop_reason = loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read candidate from stdin")?,
            _ = sigint.recv() => break "SIGINT",
            _ = sigterm.recv() => break "SIGTERM",
        };
        let Some(line) = line else {
            break "EOF";
        };
        if line.trim().is_empty() {
            continue;
        }

        let scripted: ScriptedCandidate = match serde_json::from_str(&line) {
            Ok(scripted) => scripted,
            Err(err) => {
                tracing::warn!(target: "gate", error = %err, "candidate_line_rejected");
                output
                    .write_line(&ErrorLine {
                        tweet_id: None,
                        kind: "invalid_candidate",
                        message: &err.to_string(),
                    })
                    .await
                    .context("failed to write to stdout")?;
                continue;
            }
        };

        let tweet_id = scripted.event.target_tweet_id;
        let staged = rater.stage(&scripted);
        let result = pipeline.handle(scripted.event).await;
        drop(staged);
        match result {
            Ok(outcome) => output
                .write_line(&outcome)
                .await
                .context("failed to write to stdout")?,
            Err(err) => {
                tracing::error!(
                    target: "gate",
                    tweet_id,
                    kind = ?err.kind,
                    error = %err,
                    "candidate_failed"
                );
                if err.kind == GateErrorKind::InteractionLogUnavailable {
                    return Err(err).context("interaction log is unavailable; stopping");
                }
                output
                    .write_line(&ErrorLine {
                        tweet_id: Some(tweet_id),
                        kind: err.kind.as_str(),
                        message: &err.message,
                    })
                    .await
                    .context("failed to write to stdout")?;
            }
        }
    };

    tracing::info!(target: "gate", reason = stop_reason, "gate_stopped");
    Ok(())
}
