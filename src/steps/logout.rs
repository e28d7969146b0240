use super::{expect_status, Failure, Step};
use crate::client::{endpoints, ApiRequest, ApiResponse};
use crate::config::CredentialsConfig;
use crate::session::{Field, SessionState};

/// `POST /logout` with the current bearer token.
///
/// Only the token is required. The token is not cleared afterwards; the
/// unauthorized probe that follows never sends it.
#[derive(Debug, Default, Clone)]
pub struct Logout;

impl Step for Logout {
    fn name(&self) -> &str {
        "Logout"
    }

    fn requires(&self) -> &'static [Field] {
        &[Field::Token]
    }

    fn request(
        &self,
        session: &SessionState,
        _credentials: &CredentialsConfig,
    ) -> Result<ApiRequest, Failure> {
        let token = session
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(Failure::MissingSession(Field::Token))?;
        Ok(endpoints::logout(token))
    }

    fn evaluate(
        &self,
        response: &ApiResponse,
        _session: &mut SessionState,
        _credentials: &CredentialsConfig,
    ) -> Result<(), Failure> {
        expect_status(response, 200)
    }
}
