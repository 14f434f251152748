use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    gate::{
        error::{GateError, interaction_log_unavailable},
        ports::{InteractionLog, ReserveOutcome},
        types::TweetId,
    },
    interaction::{memory::InMemoryInteractionLog, types::InteractionRecord},
};

const PERSISTENCE_VERSION: u64 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct PersistedInteractionLog {
    version: u64,
    records: Vec<InteractionRecord>,
}

#[derive(Debug, Serialize)]
struct PersistedInteractionLogRef<'a> {
    version: u64,
    records: &'a [InteractionRecord],
}

/// Interaction log persisted as one JSON document, rewritten through a temp
/// file and rename on every append.
#[derive(Debug)]
pub struct FileInteractionLog {
    path: PathBuf,
    inner: InMemoryInteractionLog,
}

impl FileInteractionLog {
    pub fn open(path: PathBuf) -> Result<Self, GateError> {
        let records = load_records(&path)?.unwrap_or_default();
        let inner = InMemoryInteractionLog::with_records(records)?;
        tracing::info!(
            target: "interaction_log",
            path = %path.display(),
            record_count = inner.len(),
            "interaction_log_opened"
        );
        Ok(Self { path, inner })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> Vec<InteractionRecord> {
        self.inner.records()
    }
}

impl InteractionLog for FileInteractionLog {
    fn has_interacted(&self, tweet_id: TweetId) -> Result<bool, GateError> {
        self.inner.has_interacted(tweet_id)
    }

    fn reserve(&self, tweet_id: TweetId) -> Result<ReserveOutcome, GateError> {
        self.inner.reserve(tweet_id)
    }

    fn record(&self, record: InteractionRecord) -> Result<(), GateError> {
        self.inner
            .record_with(record, |records| save_records(&self.path, records))
    }

    fn release(&self, tweet_id: TweetId) {
        self.inner.release(tweet_id);
    }
}

fn load_records(path: &Path) -> Result<Option<Vec<InteractionRecord>>, GateError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(interaction_log_unavailable(format!(
                "failed to read interaction log '{}': {err}",
                path.display()
            )));
        }
    };

    let parsed: PersistedInteractionLog = serde_json::from_str(&content).map_err(|err| {
        interaction_log_unavailable(format!(
            "failed to parse interaction log '{}': {err}",
            path.display()
        ))
    })?;
    if parsed.version != PERSISTENCE_VERSION {
        return Err(interaction_log_unavailable(format!(
            "unsupported interaction log version {} at '{}'",
            parsed.version,
            path.display()
        )));
    }

    Ok(Some(parsed.records))
}

fn save_records(path: &Path, records: &[InteractionRecord]) -> Result<(), GateError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|err| {
        interaction_log_unavailable(format!(
            "failed to create interaction log directory '{}': {err}",
            parent.display()
        ))
    })?;

    let persisted = PersistedInteractionLogRef {
        version: PERSISTENCE_VERSION,
        records,
    };

    let tmp_path = path.with_extension("tmp");
    let file = fs::File::create(&tmp_path).map_err(|err| {
        interaction_log_unavailable(format!(
            "failed to create interaction log temp file '{}': {err}",
            tmp_path.display()
        ))
    })?;
    {
        let mut writer = BufWriter::new(&file);
        serde_json::to_writer_pretty(&mut writer, &persisted).map_err(|err| {
            interaction_log_unavailable(format!(
                "failed to serialize interaction log '{}': {err}",
                tmp_path.display()
            ))
        })?;
        writer.write_all(b"\n").map_err(|err| {
            interaction_log_unavailable(format!(
                "failed to finalize interaction log '{}': {err}",
                tmp_path.display()
            ))
        })?;
        writer.flush().map_err(|err| {
            interaction_log_unavailable(format!(
                "failed to flush interaction log '{}': {err}",
                tmp_path.display()
            ))
        })?;
    }
    file.sync_all().map_err(|err| {
        interaction_log_unavailable(format!(
            "failed to sync interaction log temp file '{}': {err}",
            tmp_path.display()
        ))
    })?;

    fs::rename(&tmp_path, path).map_err(|err| {
        interaction_log_unavailable(format!(
            "failed to replace interaction log '{}' from '{}': {err}",
            path.display(),
            tmp_path.display()
        ))
    })?;

    if let Ok(parent_file) = fs::File::open(parent) {
        let _ = parent_file.sync_all();
    }

    Ok(())
}
