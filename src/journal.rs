//! Append-only plain-text journal
//!
//! One `[ISO-8601 timestamp] message` line per event. The file is never
//! rotated and never read back by the bot; it exists for the operator.

use chrono::{SecondsFormat, Utc};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Cloneable handle to the journal file.
#[derive(Clone)]
pub struct Journal {
    writer: Option<Arc<Mutex<BufWriter<File>>>>,
}

impl Journal {
    /// Open (or create) the journal file in append mode.
    pub fn open(path: &Path) -> std::io::Result<Journal> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Journal {
            writer: Some(Arc::new(Mutex::new(BufWriter::new(file)))),
        })
    }

    /// A journal that discards everything. Used by tests and dry runs.
    pub fn disabled() -> Journal {
        Journal { writer: None }
    }

    /// Append one timestamped line. Write failures are logged and swallowed;
    /// the journal must never take the bot down.
    pub fn record(&self, message: &str) {
        let Some(writer) = &self.writer else {
            return;
        };
        let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let line = format!("[{}] {}\n", stamp, message);
        let mut guard = match writer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = guard.write_all(line.as_bytes()).and_then(|_| guard.flush()) {
            warn!(error = %e, "journal write failed");
        }
    }
}
