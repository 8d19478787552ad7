//! Trial metrics, ratings, and Q-table dumps

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use smartcab_rl::QTable;

use crate::world::{TrialData, Violation};

/// One finished trial, written as a JSON line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub trial: u32,
    pub testing: bool,
    pub epsilon: f64,
    pub alpha: f64,
    #[serde(flatten)]
    pub data: TrialData,
}

impl TrialRecord {
    pub fn new(
        run_id: Uuid,
        trial: u32,
        testing: bool,
        epsilon: f64,
        alpha: f64,
        data: TrialData,
    ) -> Self {
        Self {
            run_id,
            timestamp: Utc::now(),
            trial,
            testing,
            epsilon,
            alpha,
            data,
        }
    }
}

/// Append-only JSON-lines log of trial records
pub struct MetricsLog {
    path: PathBuf,
    file: File,
}

impl MetricsLog {
    /// Create (truncating) `{dir}/{stem}.jsonl`
    pub fn create(dir: &Path, stem: &str) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

        let path = dir.join(format!("{stem}.jsonl"));
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .with_context(|| format!("Failed to open metrics log {}", path.display()))?;

        info!("Writing trial metrics to {}", path.display());
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&mut self, record: &TrialRecord) -> Result<()> {
        let line = serde_json::to_string(record)?;
        writeln!(self.file, "{line}")?;
        self.file.flush()?;
        Ok(())
    }
}

/// Read every record from a JSON-lines log, skipping blank lines
pub fn read_records(path: &Path) -> Result<Vec<TrialRecord>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let mut records = Vec::new();
    for (number, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: malformed trial record", path.display(), number + 1))?;
        records.push(record);
    }
    debug!("Read {} trial records from {}", records.len(), path.display());
    Ok(records)
}

/// Write `{stem}.txt` and `{stem}_q_table.json` under `dir`
pub fn dump_q_table(table: &QTable, dir: &Path, stem: &str) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let text_path = dir.join(format!("{stem}.txt"));
    fs::write(&text_path, table.render_text())
        .with_context(|| format!("Failed to write {}", text_path.display()))?;

    let json_path = dir.join(format!("{stem}_q_table.json"));
    fs::write(&json_path, serde_json::to_string_pretty(&table.to_json())?)
        .with_context(|| format!("Failed to write {}", json_path.display()))?;

    info!(
        "Dumped {} Q-table states to {}",
        table.len(),
        text_path.display()
    );
    Ok((text_path, json_path))
}

/// Letter grade for a set of testing trials
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rating {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    F,
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rating::APlus => "A+",
            Rating::A => "A",
            Rating::B => "B",
            Rating::C => "C",
            Rating::D => "D",
            Rating::F => "F",
        };
        write!(f, "{s}")
    }
}

impl Rating {
    /// Grade how safely the cab drove. `None` for an empty set.
    pub fn safety(records: &[TrialRecord]) -> Option<Rating> {
        if records.is_empty() {
            return None;
        }

        let total = |v: Violation| -> u32 { records.iter().map(|r| r.data.violations(v)).sum() };
        let actions: u32 = Violation::ALL.iter().map(|v| total(*v)).sum();

        let rating = if total(Violation::None) == actions {
            Rating::APlus
        } else if total(Violation::MajorAccident) > 0 {
            Rating::F
        } else if total(Violation::MinorAccident) > 0 {
            Rating::D
        } else if total(Violation::Major) > 0 {
            Rating::C
        } else {
            let trials_with_minor = records
                .iter()
                .filter(|r| r.data.violations(Violation::Minor) > 0)
                .count();
            if trials_with_minor * 2 >= records.len() {
                Rating::B
            } else {
                Rating::A
            }
        };
        Some(rating)
    }

    /// Grade how often the cab arrived in time. `None` for an empty set.
    pub fn reliability(records: &[TrialRecord]) -> Option<Rating> {
        if records.is_empty() {
            return None;
        }

        let successes = records.iter().filter(|r| r.data.success).count();
        let ratio = successes as f64 / records.len() as f64;

        let rating = if successes == records.len() {
            Rating::APlus
        } else if ratio >= 0.9 {
            Rating::A
        } else if ratio >= 0.8 {
            Rating::B
        } else if ratio >= 0.7 {
            Rating::C
        } else if ratio >= 0.6 {
            Rating::D
        } else {
            Rating::F
        };
        Some(rating)
    }
}

/// Aggregates over the testing trials of a log
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub training_trials: usize,
    pub testing_trials: usize,
    pub safety: Option<Rating>,
    pub reliability: Option<Rating>,
    pub average_reward: f64,
}

/// Grade the testing trials among `records`
pub fn grade(records: &[TrialRecord]) -> Report {
    let testing: Vec<TrialRecord> = records.iter().filter(|r| r.testing).cloned().collect();
    let average_reward = if testing.is_empty() {
        0.0
    } else {
        testing.iter().map(|r| r.data.net_reward).sum::<f64>() / testing.len() as f64
    };

    Report {
        training_trials: records.len() - testing.len(),
        testing_trials: testing.len(),
        safety: Rating::safety(&testing),
        reliability: Rating::reliability(&testing),
        average_reward,
    }
}
