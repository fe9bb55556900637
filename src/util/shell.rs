//! Shell output and per-stage progress.
//!
//! Status lines go to stderr as `{status:>12} {message}`. In normal mode a
//! spinner runs while a stage builds; verbose mode prints plain lines
//! instead, since child output and debug logs share the terminal.

use std::fmt::Display;
use std::io::{self, IsTerminal};
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

use crate::builder::pipeline::ProgressReporter;
use crate::core::Dependency;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// --quiet: errors only, no progress
    Quiet,
    #[default]
    Normal,
    /// --verbose: immediate status lines, debug info, no spinners
    Verbose,
}

/// Status types for output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Building,
    Finished,
    Restored,
    Removed,
    Info,
    Warning,
}

impl Status {
    fn as_str(&self) -> &'static str {
        match self {
            Status::Building => "Building",
            Status::Finished => "Finished",
            Status::Restored => "Restored",
            Status::Removed => "Removed",
            Status::Info => "Info",
            Status::Warning => "Warning",
        }
    }

    fn color_code(&self) -> &'static str {
        match self {
            Status::Finished | Status::Restored | Status::Removed => "\x1b[1;32m",
            Status::Building => "\x1b[1;36m",
            Status::Info => "\x1b[1;34m",
            Status::Warning => "\x1b[1;33m",
        }
    }
}

const STATUS_WIDTH: usize = 12;

struct ActiveStage {
    dep: Dependency,
    started: Instant,
    spinner: Option<ProgressBar>,
}

/// Central shell for all CLI output.
pub struct Shell {
    verbosity: Verbosity,
    use_color: bool,
    active: Mutex<Option<ActiveStage>>,
}

impl Shell {
    pub fn new(verbosity: Verbosity, color: bool) -> Self {
        Shell {
            verbosity,
            use_color: color,
            active: Mutex::new(None),
        }
    }

    /// Create a shell from CLI flags. Quiet wins over verbose.
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        let verbosity = if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };
        Shell::new(verbosity, io::stderr().is_terminal())
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    pub fn is_verbose(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }

    /// Print a status message. Quiet mode prints nothing; errors are
    /// reported by `main`.
    pub fn status(&self, status: Status, msg: impl Display) {
        if self.is_quiet() {
            return;
        }
        let line = format!("{} {}", self.format_status(status), msg);
        match self.active_spinner() {
            Some(pb) => pb.println(line),
            None => eprintln!("{}", line),
        }
    }

    pub fn note(&self, msg: impl Display) {
        self.status(Status::Info, msg);
    }

    pub fn warn(&self, msg: impl Display) {
        self.status(Status::Warning, msg);
    }

    fn format_status(&self, status: Status) -> String {
        if self.use_color {
            format!(
                "{}{:>width$}\x1b[0m",
                status.color_code(),
                status.as_str(),
                width = STATUS_WIDTH
            )
        } else {
            format!("{:>width$}", status.as_str(), width = STATUS_WIDTH)
        }
    }

    fn active_spinner(&self) -> Option<ProgressBar> {
        self.active
            .lock()
            .ok()
            .and_then(|a| a.as_ref().and_then(|s| s.spinner.clone()))
    }

    fn spinner(&self, dep: Dependency) -> Option<ProgressBar> {
        if self.verbosity != Verbosity::Normal || !io::stderr().is_terminal() {
            return None;
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]") {
            pb.set_style(style);
        }
        pb.set_message(format!("building {}", dep));
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    }

    fn take_active(&self, dep: Dependency) -> Option<ActiveStage> {
        let mut guard = self.active.lock().ok()?;
        match guard.take() {
            Some(stage) if stage.dep == dep => Some(stage),
            other => {
                *guard = other;
                None
            }
        }
    }
}

impl ProgressReporter for Shell {
    fn log(&self, message: &str) {
        if self.is_verbose() {
            self.note(message);
        }
    }

    fn stage_started(&self, dep: Dependency) {
        self.status(Status::Building, dep);
        let stage = ActiveStage {
            dep,
            started: Instant::now(),
            spinner: self.spinner(dep),
        };
        if let Ok(mut guard) = self.active.lock() {
            *guard = Some(stage);
        }
    }

    fn stage_finished(&self, dep: Dependency, install_dir: &Path) {
        let elapsed = match self.take_active(dep) {
            Some(stage) => {
                if let Some(pb) = stage.spinner {
                    pb.finish_and_clear();
                }
                stage.started.elapsed()
            }
            None => Duration::ZERO,
        };
        self.status(
            Status::Finished,
            format!("{} -> {} in {}", dep, install_dir.display(), format_duration(elapsed)),
        );
    }

    fn stage_restored(&self, dep: Dependency, install_dir: &Path) {
        self.status(Status::Restored, format!("{} -> {}", dep, install_dir.display()));
    }
}

impl Drop for Shell {
    fn drop(&mut self) {
        // A failed stage never reports finishing.
        if let Ok(mut guard) = self.active.lock() {
            if let Some(pb) = guard.take().and_then(|s| s.spinner) {
                pb.abandon();
            }
        }
    }
}

/// Format a duration in a human-readable way.
fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 60.0 {
        format!("{:.2}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flags() {
        assert_eq!(Shell::from_flags(false, false).verbosity(), Verbosity::Normal);
        assert!(Shell::from_flags(false, true).is_verbose());
        // quiet wins
        assert!(Shell::from_flags(true, true).is_quiet());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(500)), "0.50s");
        assert_eq!(format_duration(Duration::from_secs(2)), "2.00s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1.5m");
    }

    #[test]
    fn test_status_formatting() {
        let shell = Shell::new(Verbosity::Normal, false);
        let formatted = shell.format_status(Status::Restored);
        assert_eq!(formatted.trim(), "Restored");
        assert_eq!(formatted.len(), STATUS_WIDTH);
    }

    #[test]
    fn test_stage_tracking() {
        let shell = Shell::new(Verbosity::Quiet, false);
        shell.stage_started(Dependency::Zlib);
        assert!(shell.take_active(Dependency::Openssl).is_none());
        assert!(shell.take_active(Dependency::Zlib).is_some());
        assert!(shell.take_active(Dependency::Zlib).is_none());
    }
}
