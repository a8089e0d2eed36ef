//! Import progress reporting.
//!
//! Reports observable progress during `lectio import` so users see how many
//! verses have been written. Progress is emitted on **stderr** so stdout
//! remains parseable for scripts.

use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;

use lectio_core::reconcile::{ImportProgress, ImportProgressEvent, NoProgress};

/// Human-friendly progress on stderr: "import test  writing  1,000 / 31,102 verses".
pub struct StderrProgress;

impl ImportProgress for StderrProgress {
    fn report(&self, event: ImportProgressEvent) {
        let line = match &event {
            ImportProgressEvent::Writing {
                language_code,
                n,
                total,
            } => format!(
                "import {}  writing  {} / {} verses\n",
                language_code,
                format_number(*n),
                format_number(*total)
            ),
            ImportProgressEvent::Finished {
                language_code,
                imported,
                updated,
                errors,
            } => format!(
                "import {}  done  {} new, {} updated, {} errors\n",
                language_code,
                format_number(*imported),
                format_number(*updated),
                format_number(*errors)
            ),
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ImportProgress for JsonProgress {
    fn report(&self, event: ImportProgressEvent) {
        let obj = match &event {
            ImportProgressEvent::Writing {
                language_code,
                n,
                total,
            } => serde_json::json!({
                "event": "progress",
                "language_code": language_code,
                "phase": "writing",
                "n": n,
                "total": total
            }),
            ImportProgressEvent::Finished {
                language_code,
                imported,
                updated,
                errors,
            } => serde_json::json!({
                "event": "progress",
                "language_code": language_code,
                "phase": "done",
                "imported": imported,
                "updated": updated,
                "errors": errors
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Arc<dyn ImportProgress> {
        match self {
            ProgressMode::Off => Arc::new(NoProgress),
            ProgressMode::Human => Arc::new(StderrProgress),
            ProgressMode::Json => Arc::new(JsonProgress),
        }
    }
}

impl FromStr for ProgressMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(ProgressMode::Off),
            "human" => Ok(ProgressMode::Human),
            "json" => Ok(ProgressMode::Json),
            other => Err(format!(
                "unknown progress mode '{}' (expected off, human, or json)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(31_102), "31,102");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn progress_mode_parse() {
        assert_eq!("json".parse::<ProgressMode>().unwrap(), ProgressMode::Json);
        assert!("loud".parse::<ProgressMode>().is_err());
    }
}
