use super::{expect_status, Failure, Step};
use crate::client::{endpoints, ApiRequest, ApiResponse};
use crate::config::CredentialsConfig;
use crate::session::{Field, SessionState};

/// Registers the session's username with the initial password.
///
/// Passes on `201 Created`. Validation rejections and conflicts are failures.
#[derive(Debug, Default, Clone)]
pub struct Register;

impl Step for Register {
    fn name(&self) -> &str {
        "Register user"
    }

    fn requires(&self) -> &'static [Field] {
        &[Field::Username]
    }

    fn request(
        &self,
        session: &SessionState,
        credentials: &CredentialsConfig,
    ) -> Result<ApiRequest, Failure> {
        let email = format!("{}@{}", session.username, credentials.email_domain);
        Ok(endpoints::register(
            &session.username,
            &credentials.initial_password,
            Some(&email),
        ))
    }

    fn evaluate(
        &self,
        response: &ApiResponse,
        _session: &mut SessionState,
        _credentials: &CredentialsConfig,
    ) -> Result<(), Failure> {
        expect_status(response, 201)
    }
}
