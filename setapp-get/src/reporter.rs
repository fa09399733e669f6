use setapp_lib::{InstallResult, InstallStage, ProgressReporter};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Mutex;

/// Minimum percentage change before another download line is printed
const MIN_PERCENT_DELTA: i32 = 10;

/// Prints pipeline progress as plain lines, one per event, prefixed by the
/// target name so interleaved parallel output stays readable.
pub struct ConsoleReporter {
    out: Mutex<Box<dyn Write + Send>>,
    last_percent: Mutex<HashMap<String, i32>>,
}

impl ConsoleReporter {
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
            last_percent: Mutex::new(HashMap::new()),
        }
    }

    fn emit(&self, line: std::fmt::Arguments<'_>) {
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        // Write errors on the progress stream are ignored
        let _ = writeln!(out, "{}", line);
    }
}

impl ProgressReporter for ConsoleReporter {
    fn start_step(&self, target: &str, stage: InstallStage) {
        if stage == InstallStage::Downloading {
            self.last_percent
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .insert(target.to_string(), -1);
        }
        self.emit(format_args!("[{}] {}...", target, stage));
    }

    fn update_bytes(&self, target: &str, transferred: u64, total: Option<u64>) {
        let Some(total) = total.filter(|t| *t > 0) else {
            return;
        };
        let percent = ((transferred as f64 / total as f64) * 100.0).min(100.0) as i32;

        // Always emit 0 and 100 for clarity
        let allow = {
            let mut last = self.last_percent.lock().unwrap_or_else(|e| e.into_inner());
            let prev = last.entry(target.to_string()).or_insert(-1);
            let allow = percent != *prev
                && (percent == 0 || percent == 100 || percent - *prev >= MIN_PERCENT_DELTA);
            if allow {
                *prev = percent;
            }
            allow
        };
        if allow {
            self.emit(format_args!("[{}] downloaded {}%", target, percent));
        }
    }

    fn set_message(&self, target: &str, message: &str) {
        self.emit(format_args!("[{}] {}", target, message));
    }

    fn done(&self, result: &InstallResult) {
        self.last_percent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&result.name);
        match &result.error {
            Some(e) => self.emit(format_args!("[{}] failed: {}", result.name, e)),
            None if result.skipped => self.emit(format_args!("[{}] already installed", result.name)),
            None => self.emit(format_args!("[{}] done", result.name)),
        }
    }
}
