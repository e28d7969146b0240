//! Lifecycle step descriptors
//!
//! Each step is a small value implementing [`Step`]: it declares which
//! session fields it reads and writes, builds exactly one request from the
//! current [`SessionState`], and judges the response. The runner owns the
//! control flow, so adding or removing a step is a change to the [`Plan`]
//! and nothing else.

use crate::client::{ApiRequest, ApiResponse, TransportError};
use crate::config::CredentialsConfig;
use crate::session::{Field, SessionState};
use thiserror::Error;

mod login;
mod logout;
mod plan;
mod register;
mod unauthorized;
mod user;

pub use login::Login;
pub use logout::Logout;
pub use plan::{Plan, PlanError};
pub use register::Register;
pub use unauthorized::UnauthorizedAccess;
pub use user::{GetUser, UpdatePassword, UpdateUsername};

/// Why a step did not pass
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// A required session field was absent; no request was sent
    #[error("Missing session field '{0}', request not sent")]
    MissingSession(Field),

    /// No response was obtained
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// A response arrived but its status fails the step's criterion
    #[error("Unexpected status {status} (expected {expected})")]
    UnexpectedStatus {
        expected: String,
        status: u16,
        body: String,
    },

    /// Success status but the body lacks required fields
    #[error("Malformed response: missing {missing}")]
    MalformedResponse {
        status: u16,
        missing: String,
        body: String,
    },
}

impl Failure {
    pub(crate) fn unexpected(expected: &[u16], response: &ApiResponse) -> Self {
        let expected = expected
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(" or ");
        Failure::UnexpectedStatus {
            expected,
            status: response.status,
            body: response.display_body(),
        }
    }

    /// HTTP status involved, if a response was received
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Failure::UnexpectedStatus { status, .. }
            | Failure::MalformedResponse { status, .. } => Some(*status),
            Failure::MissingSession(_) | Failure::Transport(_) => None,
        }
    }

    /// Response body involved, if a response was received
    pub fn body(&self) -> Option<&str> {
        match self {
            Failure::UnexpectedStatus { body, .. } | Failure::MalformedResponse { body, .. } => {
                Some(body)
            }
            Failure::MissingSession(_) | Failure::Transport(_) => None,
        }
    }
}

/// Judgement of a single step execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Postcondition held
    Pass,
    /// The call completed (or was skipped) and the postcondition did not hold
    Fail(Failure),
    /// Execution itself went wrong
    Error(Failure),
}

/// One named call in the lifecycle
pub trait Step: Send + Sync {
    /// Name used as the report key
    fn name(&self) -> &str;

    /// Fields that must be populated before the request is built
    fn requires(&self) -> &'static [Field] {
        &[]
    }

    /// Fields this step may write on success
    fn produces(&self) -> &'static [Field] {
        &[]
    }

    /// Build the request from the current session
    fn request(
        &self,
        session: &SessionState,
        credentials: &CredentialsConfig,
    ) -> Result<ApiRequest, Failure>;

    /// Judge the response and apply this step's state updates on success
    fn evaluate(
        &self,
        response: &ApiResponse,
        session: &mut SessionState,
        credentials: &CredentialsConfig,
    ) -> Result<(), Failure>;

    /// Classify a request that produced no response
    fn on_transport_error(&self, error: TransportError) -> Verdict {
        Verdict::Error(Failure::Transport(error))
    }
}

/// Check `response` against a single expected status
pub(crate) fn expect_status(response: &ApiResponse, expected: u16) -> Result<(), Failure> {
    if response.status == expected {
        Ok(())
    } else {
        Err(Failure::unexpected(&[expected], response))
    }
}

/// Fetch the authenticated view or report the first missing field
pub(crate) fn require_auth(
    session: &SessionState,
) -> Result<crate::session::Authenticated<'_>, Failure> {
    session.authenticated().ok_or_else(|| {
        let missing = session
            .first_missing(&[Field::Token, Field::UserId])
            .unwrap_or(Field::Token);
        Failure::MissingSession(missing)
    })
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_status_formatting() {
        let failure = Failure::unexpected(&[401, 403], &ApiResponse::new(200, "{}"));
        assert_eq!(
            failure.to_string(),
            "Unexpected status 200 (expected 401 or 403)"
        );
        assert_eq!(failure.http_status(), Some(200));
    }

    #[test]
    fn test_require_auth_names_missing_field() {
        let mut session = SessionState::new("alice123");
        assert_eq!(
            require_auth(&session).unwrap_err(),
            Failure::MissingSession(Field::Token)
        );
        session.token = Some("T1".into());
        assert_eq!(
            require_auth(&session).unwrap_err(),
            Failure::MissingSession(Field::UserId)
        );
    }
}
