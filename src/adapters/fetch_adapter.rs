//! External fetcher adapter: runs the bar-download command as a
//! subprocess and tracks its status.
//!
//! The fetcher itself (network access, rate limits, indicator
//! computation) lives outside this crate; we only drive it and read the
//! records files it writes.

use std::process::Command;
use std::sync::{Arc, Mutex};
use std::thread;

use chrono::Local;

use crate::domain::error::TradereviewError;
use crate::ports::fetch_port::{FetchPort, UpdateStatus};

const OUTPUT_TAIL_LINES: usize = 50;

pub struct ProcessFetchAdapter {
    program: String,
    args: Vec<String>,
    state: Arc<Mutex<UpdateStatus>>,
}

impl ProcessFetchAdapter {
    /// Build from a whitespace-separated command line, e.g.
    /// `"python3 fetch_data.py"`. Ticker arguments are appended per run.
    pub fn from_command(command: &str) -> Result<Self, TradereviewError> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or_else(|| TradereviewError::Fetch {
            reason: "empty fetch command".into(),
        })?;
        Ok(Self {
            program,
            args: parts.collect(),
            state: Arc::new(Mutex::new(UpdateStatus::default())),
        })
    }

    fn execute(
        program: &str,
        args: &[String],
        tickers: &[String],
        state: &Mutex<UpdateStatus>,
    ) -> Result<UpdateStatus, TradereviewError> {
        let output = Command::new(program)
            .args(args)
            .args(tickers)
            .output()
            .map_err(|e| {
                let mut st = lock(state);
                st.running = false;
                st.finished_at = Some(Local::now().naive_local());
                st.success = Some(false);
                TradereviewError::Fetch {
                    reason: format!("failed to run {program}: {e}"),
                }
            })?;

        let mut lines: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .chain(String::from_utf8_lossy(&output.stderr).lines())
            .map(str::to_string)
            .collect();
        if lines.len() > OUTPUT_TAIL_LINES {
            lines.drain(..lines.len() - OUTPUT_TAIL_LINES);
        }

        let mut st = lock(state);
        st.running = false;
        st.finished_at = Some(Local::now().naive_local());
        st.success = Some(output.status.success());
        st.output = lines;
        Ok(st.clone())
    }

    fn mark_started(&self) -> Result<(), TradereviewError> {
        let mut st = lock(&self.state);
        if st.running {
            return Err(TradereviewError::Fetch {
                reason: "an update is already running".into(),
            });
        }
        *st = UpdateStatus {
            running: true,
            started_at: Some(Local::now().naive_local()),
            ..UpdateStatus::default()
        };
        Ok(())
    }
}

fn lock(state: &Mutex<UpdateStatus>) -> std::sync::MutexGuard<'_, UpdateStatus> {
    // A fetch thread never panics while holding the lock; recover the
    // data regardless.
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl FetchPort for ProcessFetchAdapter {
    fn start_update(&self, tickers: &[String]) -> Result<(), TradereviewError> {
        self.mark_started()?;
        let program = self.program.clone();
        let args = self.args.clone();
        let tickers = tickers.to_vec();
        let state = Arc::clone(&self.state);
        thread::spawn(move || {
            let _ = Self::execute(&program, &args, &tickers, &state);
        });
        Ok(())
    }

    fn run_update(&self, tickers: &[String]) -> Result<UpdateStatus, TradereviewError> {
        self.mark_started()?;
        let status = Self::execute(&self.program, &self.args, tickers, &self.state)?;
        if status.success == Some(false) {
            return Err(TradereviewError::Fetch {
                reason: format!(
                    "fetch command exited with failure: {}",
                    status.output.last().cloned().unwrap_or_default()
                ),
            });
        }
        Ok(status)
    }

    fn status(&self) -> UpdateStatus {
        lock(&self.state).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_command_is_rejected() {
        assert!(ProcessFetchAdapter::from_command("  ").is_err());
    }

    #[test]
    fn initial_status_is_idle() {
        let adapter = ProcessFetchAdapter::from_command("true").unwrap();
        let st = adapter.status();
        assert!(!st.running);
        assert!(st.started_at.is_none());
        assert!(st.success.is_none());
    }

    #[test]
    fn run_update_records_success() {
        let adapter = ProcessFetchAdapter::from_command("true").unwrap();
        let st = adapter.run_update(&[]).unwrap();
        assert!(!st.running);
        assert_eq!(st.success, Some(true));
        assert!(adapter.status().finished_at.is_some());
    }

    #[test]
    fn run_update_surfaces_failure() {
        let adapter = ProcessFetchAdapter::from_command("false").unwrap();
        assert!(adapter.run_update(&[]).is_err());
        assert_eq!(adapter.status().success, Some(false));
    }

    #[test]
    fn missing_program_is_a_fetch_error() {
        let adapter =
            ProcessFetchAdapter::from_command("/nonexistent/fetcher-binary").unwrap();
        let err = adapter.run_update(&[]).unwrap_err();
        assert!(matches!(err, TradereviewError::Fetch { .. }));
    }

    #[test]
    fn run_update_captures_output_tail() {
        let adapter = ProcessFetchAdapter::from_command("echo done").unwrap();
        let st = adapter.run_update(&["SNDK".into()]).unwrap();
        assert_eq!(st.output, vec!["done SNDK"]);
    }
}
