//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use derive_new::new;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::change::Change;
use crate::error::Error;
use crate::path::InstanceId;

// Appends every submitted batch and its outcome to a JSON lines file.
#[derive(Debug)]
pub struct BatchRecorder(std::fs::File);

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub enabled: bool,
    pub dir: String,
}

#[derive(Clone, Debug, new)]
#[derive(Deserialize, Serialize)]
pub struct RecordedBatch {
    #[serde(with = "chrono::serde::ts_seconds")]
    pub date: DateTime<Utc>,
    pub changes: Vec<Change>,
    pub outcome: Outcome,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum Outcome {
    Applied,
    Rejected {
        reason: String,
    },
    Failed {
        unprocessed: BTreeSet<InstanceId>,
        reason: String,
    },
}

// ===== impl BatchRecorder =====

impl BatchRecorder {
    pub const FILENAME: &'static str = "cfgtx-batches.jsonl";

    // Creates new batch recorder, appending to any previous record file.
    pub(crate) fn new(config: &Config) -> Option<BatchRecorder> {
        let path = BatchRecorder::path(config);
        match std::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
        {
            Ok(file) => Some(BatchRecorder(file)),
            Err(error) => {
                warn!(%error, path = %path.display(), "couldn't open record file");
                None
            }
        }
    }

    pub fn path(config: &Config) -> PathBuf {
        Path::new(&config.dir).join(BatchRecorder::FILENAME)
    }

    // Records a batch along with the result of applying it.
    pub(crate) fn record(&mut self, batch: &RecordedBatch) {
        let line = match serde_json::to_string(batch) {
            Ok(line) => line,
            Err(error) => {
                warn!(%error, "couldn't serialize batch");
                return;
            }
        };
        if let Err(error) = writeln!(self.0, "{line}") {
            warn!(%error, "couldn't write to file");
        }
    }
}

// ===== impl Outcome =====

impl Outcome {
    pub(crate) fn from_result(result: &Result<(), Error>) -> Outcome {
        match result {
            Ok(()) => Outcome::Applied,
            Err(Error::BulkUpdate(error)) => Outcome::Failed {
                unprocessed: error.unprocessed_ids().clone(),
                reason: error.cause().to_string(),
            },
            Err(error) => Outcome::Rejected {
                reason: error.to_string(),
            },
        }
    }
}

// ===== impl Config =====

impl Default for Config {
    fn default() -> Config {
        Config {
            enabled: false,
            dir: "/var/opt/cfgtx".to_owned(),
        }
    }
}

// ===== global functions =====

// Loads all batches from a record file, oldest first.
pub fn read_records(
    path: impl AsRef<Path>,
) -> std::io::Result<Vec<RecordedBatch>> {
    let file = std::fs::File::open(path)?;
    let mut batches = vec![];
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        batches.push(serde_json::from_str(&line)?);
    }

    Ok(batches)
}
