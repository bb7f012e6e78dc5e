use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::naming::ArtifactKind;
use crate::runs::stats::ItemStatus;

/// The `type` of a line in `events.jsonl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    BatchStarted,
    ItemGenerated,
    ItemSkipped,
    ItemFailed,
    ModelCommentary,
    BatchFinished,
}

impl EventKind {
    pub fn for_status(status: ItemStatus) -> Self {
        match status {
            ItemStatus::Generated => Self::ItemGenerated,
            ItemStatus::Skipped => Self::ItemSkipped,
            ItemStatus::Failed => Self::ItemFailed,
        }
    }
}

/// Body of `batch_started`: what was selected and how it will be generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchStarted<'a> {
    pub games: usize,
    pub prizes: usize,
    pub kinds: Vec<ArtifactKind>,
    pub filter: Option<&'a str>,
    pub policy: &'a str,
    pub mode: &'a str,
    pub provider: &'a str,
    pub aspect_ratio: &'a str,
    pub resolution: Option<&'a str>,
}

/// Body of `item_generated`, `item_skipped` and `item_failed`.
///
/// `path` is absent when the names do not form a usable file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemEvent<'a> {
    pub kind: ArtifactKind,
    pub game: &'a str,
    pub prize: Option<&'a str>,
    pub path: Option<String>,
    pub status: ItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<&'a str>,
}

/// Body of `model_commentary`: text the model returned alongside an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Commentary<'a> {
    pub kind: ArtifactKind,
    pub game: &'a str,
    pub prize: Option<&'a str>,
    pub model: &'a str,
    pub text: &'a str,
}

#[derive(Serialize)]
struct Envelope<'a, T> {
    #[serde(rename = "type")]
    kind: EventKind,
    run_id: &'a str,
    ts: String,
    #[serde(flatten)]
    body: &'a T,
}

/// Append-only writer for a batch's `events.jsonl`.
///
/// Every line is one compact JSON object: `type`, `run_id` and `ts` first,
/// then the fields of the event body. The file is reopened in append mode
/// per line so other tools can tail or rotate it mid-run.
#[derive(Debug, Clone)]
pub struct EventWriter {
    inner: Arc<EventWriterInner>,
}

#[derive(Debug)]
struct EventWriterInner {
    path: PathBuf,
    run_id: String,
    lock: Mutex<()>,
}

impl EventWriter {
    pub fn new(path: impl Into<PathBuf>, run_id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(EventWriterInner {
                path: path.into(),
                run_id: run_id.into(),
                lock: Mutex::new(()),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn emit<T: Serialize>(&self, kind: EventKind, body: &T) -> anyhow::Result<()> {
        let line = serde_json::to_string(&Envelope {
            kind,
            run_id: &self.inner.run_id,
            ts: now_utc_iso(),
            body,
        })
        .context("failed to serialize event")?;

        let path = &self.inner.path;
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let _guard = self
            .inner
            .lock
            .lock()
            .map_err(|_| anyhow::anyhow!("event writer lock poisoned"))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        writeln!(file, "{line}").with_context(|| format!("failed to append to {}", path.display()))?;
        Ok(())
    }
}

fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}
