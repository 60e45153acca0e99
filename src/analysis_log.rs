use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use time::{macros::format_description, OffsetDateTime};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::error::AppError;
use crate::nutrition::dto::NutrientRecord;

/// One persisted row. Field order is the column order of the table.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub food_name: String,
    pub protein: String,
    pub calories: String,
    pub carbs: String,
    pub fat: String,
    pub sugar: String,
    pub cholesterol: String,
}

impl LogEntry {
    pub fn new(food_name: &str, record: &NutrientRecord) -> Self {
        Self {
            timestamp: local_timestamp(),
            food_name: food_name.to_string(),
            protein: record.protein.clone(),
            calories: record.calories.clone(),
            carbs: record.carbs.clone(),
            fat: record.fat.clone(),
            sugar: record.sugar.clone(),
            cholesterol: record.cholesterol.clone(),
        }
    }
}

struct AppendRequest {
    entry: LogEntry,
    ack: oneshot::Sender<anyhow::Result<()>>,
}

/// Handle to the append-only analysis table.
///
/// A single writer thread owns the file; handles only enqueue rows, so
/// concurrent requests never interleave a read-modify-write.
#[derive(Clone)]
pub struct AnalysisLog {
    tx: mpsc::Sender<AppendRequest>,
}

impl AnalysisLog {
    pub fn spawn(path: PathBuf) -> anyhow::Result<Self> {
        let (tx, rx) = mpsc::channel(64);
        std::thread::Builder::new()
            .name("analysis-log".into())
            .spawn(move || run_writer(path, rx))
            .context("spawn analysis log writer")?;
        Ok(Self { tx })
    }

    pub async fn append(&self, food_name: &str, record: &NutrientRecord) -> Result<(), AppError> {
        let (ack, done) = oneshot::channel();
        let request = AppendRequest {
            entry: LogEntry::new(food_name, record),
            ack,
        };
        self.tx
            .send(request)
            .await
            .map_err(|_| AppError::Persistence("analysis log writer is not running".into()))?;
        done.await
            .map_err(|_| AppError::Persistence("analysis log writer dropped the request".into()))?
            .map_err(|e| AppError::Persistence(format!("{:#}", e)))
    }
}

fn run_writer(path: PathBuf, mut rx: mpsc::Receiver<AppendRequest>) {
    debug!(path = %path.display(), "analysis log writer started");
    while let Some(AppendRequest { entry, ack }) = rx.blocking_recv() {
        let result = write_row(&path, &entry);
        // the caller may have gone away; the row is written either way
        let _ = ack.send(result);
    }
    debug!(path = %path.display(), "analysis log writer stopped");
}

fn write_row(path: &Path, entry: &LogEntry) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open {}", path.display()))?;
    let needs_header = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);
    writer.serialize(entry).context("write analysis row")?;
    writer.flush().context("flush analysis log")?;
    debug!(food_name = %entry.food_name, "analysis row appended");
    Ok(())
}

fn local_timestamp() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    now.format(&format)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}
