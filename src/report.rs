//! Run report
//!
//! Outcomes are kept in execution order; [`RunReport::get`] gives keyed
//! access by step name.

use crate::runner::RunState;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::{self, Write as _};
use std::time::Duration;

/// Classification of one executed step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StepStatus {
    Pass,
    Fail,
    Error,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Pass => "PASS",
            StepStatus::Fail => "FAIL",
            StepStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Result of a single step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub name: String,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    /// Failure description, including the response body when there was one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Outcome counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
}

/// Everything a run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub state: RunState,
    pub base_url: String,
    /// Username the session ended with
    pub username: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abort_reason: Option<String>,
    pub outcomes: Vec<StepOutcome>,
    pub summary: Summary,
}

impl RunReport {
    pub(crate) fn new(
        state: RunState,
        base_url: &str,
        username: &str,
        started_at: DateTime<Utc>,
        abort_reason: Option<String>,
        outcomes: Vec<StepOutcome>,
    ) -> Self {
        let summary = summarize(&outcomes);
        Self {
            state,
            base_url: base_url.to_string(),
            username: username.to_string(),
            started_at,
            finished_at: Utc::now(),
            abort_reason,
            outcomes,
            summary,
        }
    }

    /// Outcome of a step by name
    pub fn get(&self, name: &str) -> Option<&StepOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }

    /// Status of a step by name
    pub fn status(&self, name: &str) -> Option<StepStatus> {
        self.get(name).map(|o| o.status)
    }

    /// Completed with every step passing
    pub fn is_success(&self) -> bool {
        self.state == RunState::Completed && self.summary.passed == self.summary.total
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable summary table
    pub fn render(&self) -> String {
        let mut out = String::new();
        let rule = "=".repeat(60);

        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "RESULTS SUMMARY ({})", self.base_url);
        let _ = writeln!(out, "{}", rule);

        if let Some(reason) = &self.abort_reason {
            let _ = writeln!(out, "Run aborted: {}", reason);
            let _ = writeln!(out, "{}", rule);
            return out;
        }

        let width = self
            .outcomes
            .iter()
            .map(|o| o.name.len())
            .max()
            .unwrap_or(0);

        for outcome in &self.outcomes {
            let status = outcome
                .http_status
                .map(|s| format!(" (HTTP {})", s))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "{:<width$}  {:<5}{}",
                outcome.name,
                outcome.status,
                status,
                width = width
            );
            if let Some(detail) = &outcome.detail {
                for line in detail.lines() {
                    let _ = writeln!(out, "    {}", line);
                }
            }
        }

        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(
            out,
            "{} passed, {} failed, {} errors ({} steps)",
            self.summary.passed, self.summary.failed, self.summary.errored, self.summary.total
        );
        let _ = writeln!(out, "{}", rule);
        out
    }
}

fn summarize(outcomes: &[StepOutcome]) -> Summary {
    outcomes.iter().fold(
        Summary {
            total: outcomes.len(),
            ..Summary::default()
        },
        |mut acc, o| {
            match o.status {
                StepStatus::Pass => acc.passed += 1,
                StepStatus::Fail => acc.failed += 1,
                StepStatus::Error => acc.errored += 1,
            }
            acc
        },
    )
}
