//! Run controller
//!
//! Drives a [`Plan`] against a [`Transport`]:
//!
//! ```text
//! NotStarted ──preflight ok──▶ Running ──all steps attempted──▶ Completed
//!      │
//!      └──preflight failed──▶ Aborted (no steps executed)
//! ```
//!
//! Steps run one at a time, in plan order, with a fixed pause between them.
//! A failing step never stops the run; later steps simply see whatever
//! session state the earlier ones left behind.
//!
//! # Example
//!
//! ```no_run
//! use authflow::{config::Config, runner::Runner, session::SessionState};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::default();
//! let mut runner = Runner::from_config(&config)?;
//! let session = SessionState::with_random_username(&config.credentials.username_prefix);
//! let report = runner.run(session).await?;
//! println!("{}", report.render());
//! # Ok(())
//! # }
//! ```

use crate::client::{HttpTransport, Transport, TransportError};
use crate::config::{Config, CredentialsConfig};
use crate::preflight::Preflight;
use crate::report::{RunReport, StepOutcome, StepStatus};
use crate::session::{Field, SessionState};
use crate::steps::{Failure, Plan, PlanError, Step, Verdict};
use chrono::Utc;
use serde::Serialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{error, info, info_span, warn, Instrument};

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    NotStarted,
    Running,
    Completed,
    Aborted,
}

/// Errors that prevent a run from being attempted at all
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Invalid plan: {0}")]
    Plan(#[from] PlanError),

    #[error("Failed to build HTTP transport: {0}")]
    Transport(#[from] TransportError),

    #[error("Runner already used (state: {0:?})")]
    AlreadyStarted(RunState),
}

/// Sequential step executor
pub struct Runner<T: Transport> {
    transport: T,
    plan: Plan,
    preflight: Preflight,
    credentials: CredentialsConfig,
    step_delay: Duration,
    base_url: String,
    state: RunState,
}

impl Runner<HttpTransport> {
    /// Runner for the full lifecycle against the configured service
    pub fn from_config(config: &Config) -> Result<Self, RunError> {
        let transport =
            HttpTransport::with_timeout(&config.target.base_url, config.target.timeout())?;
        Ok(Runner::new(transport, Plan::lifecycle())
            .with_base_url(&config.target.base_url)
            .with_preflight(Preflight::new(&config.preflight))
            .with_credentials(config.credentials.clone())
            .with_step_delay(config.run.step_delay()))
    }
}

impl<T: Transport> Runner<T> {
    pub fn new(transport: T, plan: Plan) -> Self {
        Self {
            transport,
            plan,
            preflight: Preflight::default(),
            credentials: CredentialsConfig::default(),
            step_delay: Duration::ZERO,
            base_url: String::new(),
            state: RunState::NotStarted,
        }
    }

    #[must_use]
    pub fn with_preflight(mut self, preflight: Preflight) -> Self {
        self.preflight = preflight;
        self
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: CredentialsConfig) -> Self {
        self.credentials = credentials;
        self
    }

    #[must_use]
    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    /// Base URL shown in the report
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Preflight, then every step in order.
    ///
    /// A failed preflight is not an error: it yields an `Aborted` report with
    /// no outcomes.
    pub async fn run(&mut self, mut session: SessionState) -> Result<RunReport, RunError> {
        if self.state != RunState::NotStarted {
            return Err(RunError::AlreadyStarted(self.state));
        }

        let seeded: Vec<Field> = [Field::Username, Field::Token, Field::UserId]
            .into_iter()
            .filter(|f| session.has(*f))
            .collect();
        self.plan.validate(&seeded)?;

        let started_at = Utc::now();
        let span = info_span!("run", username = %session.username, steps = self.plan.len());

        let report = async {
            if let Err(e) = self.preflight.check(&self.transport).await {
                error!(error = %e, "Aborting run");
                self.state = RunState::Aborted;
                return RunReport::new(
                    self.state,
                    &self.base_url,
                    &session.username,
                    started_at,
                    Some(e.to_string()),
                    Vec::new(),
                );
            }

            self.state = RunState::Running;
            let mut outcomes = Vec::with_capacity(self.plan.len());

            for (index, step) in self.plan.steps().enumerate() {
                if index > 0 && !self.step_delay.is_zero() {
                    tokio::time::sleep(self.step_delay).await;
                }
                outcomes.push(self.execute_step(step, &mut session).await);
            }

            self.state = RunState::Completed;
            let report = RunReport::new(
                self.state,
                &self.base_url,
                &session.username,
                started_at,
                None,
                outcomes,
            );
            info!(
                passed = report.summary.passed,
                failed = report.summary.failed,
                errors = report.summary.errored,
                "Run completed"
            );
            report
        }
        .instrument(span)
        .await;

        Ok(report)
    }

    /// Execute one step against `session` and classify the result
    pub async fn execute_step(&self, step: &dyn Step, session: &mut SessionState) -> StepOutcome {
        let span = info_span!("step", name = step.name());
        async {
            let start = Instant::now();
            let (verdict, http_status) = self.judge(step, session).await;
            let elapsed = start.elapsed();

            let (status, detail) = match verdict {
                Verdict::Pass => {
                    info!(step = step.name(), http_status, "PASS");
                    (StepStatus::Pass, None)
                }
                Verdict::Fail(failure) => {
                    warn!(
                        step = step.name(),
                        http_status,
                        body = failure.body().unwrap_or_default(),
                        "FAIL: {}",
                        failure
                    );
                    (StepStatus::Fail, Some(describe(&failure)))
                }
                Verdict::Error(failure) => {
                    error!(step = step.name(), "ERROR: {}", failure);
                    (StepStatus::Error, Some(describe(&failure)))
                }
            };

            crate::metrics::record_step(step.name(), status.as_str(), elapsed.as_secs_f64());

            StepOutcome {
                name: step.name().to_string(),
                status,
                http_status,
                detail,
                elapsed,
            }
        }
        .instrument(span)
        .await
    }

    async fn judge(&self, step: &dyn Step, session: &mut SessionState) -> (Verdict, Option<u16>) {
        if let Some(field) = session.first_missing(step.requires()) {
            return (Verdict::Fail(Failure::MissingSession(field)), None);
        }

        let request = match step.request(session, &self.credentials) {
            Ok(request) => request,
            Err(failure) => return (Verdict::Fail(failure), None),
        };

        match self.transport.send(&request).await {
            Ok(response) => {
                let verdict = match step.evaluate(&response, session, &self.credentials) {
                    Ok(()) => Verdict::Pass,
                    Err(failure) => Verdict::Fail(failure),
                };
                (verdict, Some(response.status))
            }
            Err(e) => (step.on_transport_error(e), None),
        }
    }
}

fn describe(failure: &Failure) -> String {
    match failure.body() {
        Some(body) if !body.is_empty() => format!("{}: {}", failure, body),
        _ => failure.to_string(),
    }
}
