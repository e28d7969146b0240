use super::{expect_status, Failure, Step};
use crate::client::endpoints::{self, LoginResponse};
use crate::client::{ApiRequest, ApiResponse};
use crate::config::CredentialsConfig;
use crate::session::{Field, SessionState};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Password {
    Initial,
    New,
}

/// What a successful login writes back into the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    /// Token and user id, both mandatory
    Identity,
    /// Token only; the user id from the first login is kept
    TokenOnly,
}

/// `POST /login` with the session's current username.
///
/// The first login of a run must yield both a token and a user id; the
/// re-logins after credential rotation only refresh the token.
#[derive(Debug, Clone)]
pub struct Login {
    name: &'static str,
    password: Password,
    capture: Capture,
}

impl Login {
    /// Login with the initial password, capturing token and user id
    pub fn initial() -> Self {
        Self {
            name: "Login",
            password: Password::Initial,
            capture: Capture::Identity,
        }
    }

    /// Login after the password rotation
    pub fn with_new_password() -> Self {
        Self {
            name: "Login with new password",
            password: Password::New,
            capture: Capture::TokenOnly,
        }
    }

    /// Login after the username rotation
    pub fn with_new_username() -> Self {
        Self {
            name: "Login with new username",
            password: Password::New,
            capture: Capture::TokenOnly,
        }
    }

    fn password<'a>(&self, credentials: &'a CredentialsConfig) -> &'a str {
        match self.password {
            Password::Initial => &credentials.initial_password,
            Password::New => &credentials.new_password,
        }
    }
}

impl Step for Login {
    fn name(&self) -> &str {
        self.name
    }

    fn requires(&self) -> &'static [Field] {
        &[Field::Username]
    }

    fn produces(&self) -> &'static [Field] {
        match self.capture {
            Capture::Identity => &[Field::Token, Field::UserId],
            Capture::TokenOnly => &[Field::Token],
        }
    }

    fn request(
        &self,
        session: &SessionState,
        credentials: &CredentialsConfig,
    ) -> Result<ApiRequest, Failure> {
        Ok(endpoints::login(
            &session.username,
            self.password(credentials),
        ))
    }

    fn evaluate(
        &self,
        response: &ApiResponse,
        session: &mut SessionState,
        _credentials: &CredentialsConfig,
    ) -> Result<(), Failure> {
        expect_status(response, 200)?;

        let parsed = LoginResponse::parse(&response.body).unwrap_or_default();

        match self.capture {
            Capture::Identity => {
                let missing = match (parsed.token(), parsed.user_id()) {
                    (Some(token), Some(user_id)) => {
                        session.token = Some(token.to_string());
                        session.user_id = Some(user_id);
                        return Ok(());
                    }
                    (None, None) => "token and id",
                    (None, Some(_)) => "token",
                    (Some(_), None) => "id",
                };
                Err(Failure::MalformedResponse {
                    status: response.status,
                    missing: missing.to_string(),
                    body: response.display_body(),
                })
            }
            Capture::TokenOnly => {
                session.token = parsed.token().map(str::to_string);
                if session.token.is_none() {
                    warn!(step = self.name, "Login succeeded without a token");
                }
                Ok(())
            }
        }
    }
}
