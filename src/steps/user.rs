//! Authenticated user-resource steps

use super::{expect_status, require_auth, Failure, Step};
use crate::client::{endpoints, ApiRequest, ApiResponse};
use crate::config::CredentialsConfig;
use crate::session::{Field, SessionState};

const AUTHENTICATED: &[Field] = &[Field::Token, Field::UserId];

/// `GET /users/id/{id}` with the bearer token; passes on 200
#[derive(Debug, Default, Clone)]
pub struct GetUser;

impl Step for GetUser {
    fn name(&self) -> &str {
        "Get user by id"
    }

    fn requires(&self) -> &'static [Field] {
        AUTHENTICATED
    }

    fn request(
        &self,
        session: &SessionState,
        _credentials: &CredentialsConfig,
    ) -> Result<ApiRequest, Failure> {
        let auth = require_auth(session)?;
        Ok(endpoints::get_user(auth.user_id, Some(auth.token)))
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

/// Rotates the initial password to the new one.
///
/// The session is left untouched: the re-login steps read the new password
/// from the same credentials.
#[derive(Debug, Default, Clone)]
pub struct UpdatePassword;

impl Step for UpdatePassword {
    fn name(&self) -> &str {
        "Update password"
    }

    fn requires(&self) -> &'static [Field] {
        AUTHENTICATED
    }

    fn request(
        &self,
        session: &SessionState,
        credentials: &CredentialsConfig,
    ) -> Result<ApiRequest, Failure> {
        let auth = require_auth(session)?;
        Ok(endpoints::update_password(
            auth.user_id,
            auth.token,
            &credentials.initial_password,
            &credentials.new_password,
        ))
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

/// Renames the user to `<rename_prefix><username>`.
///
/// The session username changes only once the service has confirmed it.
#[derive(Debug, Default, Clone)]
pub struct UpdateUsername;

impl UpdateUsername {
    fn new_username(session: &SessionState, credentials: &CredentialsConfig) -> String {
        format!("{}{}", credentials.rename_prefix, session.username)
    }
}

impl Step for UpdateUsername {
    fn name(&self) -> &str {
        "Update username"
    }

    fn requires(&self) -> &'static [Field] {
        &[Field::Username, Field::Token, Field::UserId]
    }

    fn produces(&self) -> &'static [Field] {
        &[Field::Username]
    }

    fn request(
        &self,
        session: &SessionState,
        credentials: &CredentialsConfig,
    ) -> Result<ApiRequest, Failure> {
        let auth = require_auth(session)?;
        Ok(endpoints::update_username(
            auth.user_id,
            auth.token,
            &session.username,
            &Self::new_username(session, credentials),
        ))
    }

    fn evaluate(
        &self,
        response: &ApiResponse,
        session: &mut SessionState,
        credentials: &CredentialsConfig,
    ) -> Result<(), Failure> {
        expect_status(response, 200)?;
        session.username = Self::new_username(session, credentials);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Method;
    use crate::steps::testing::{credentials, logged_in};
    use serde_json::json;

    #[test]
    fn test_get_user_request() {
        let session = logged_in("alice123", "T1", "U1");
        let request = GetUser.request(&session, &credentials()).unwrap();
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.path, "/users/id/U1");
        assert_eq!(request.bearer.as_deref(), Some("T1"));
    }

    #[test]
    fn test_get_user_without_session_fails_locally() {
        let session = SessionState::new("alice123");
        assert_eq!(
            GetUser.request(&session, &credentials()).unwrap_err(),
            Failure::MissingSession(Field::Token)
        );
    }

    #[test]
    fn test_update_password_leaves_session_alone() {
        let mut session = logged_in("alice123", "T1", "U1");
        let before = session.clone();
        let creds = credentials();

        let request = UpdatePassword.request(&session, &creds).unwrap();
        assert_eq!(request.method, Method::Put);
        assert_eq!(request.path, "/users/id/U1/password");
        assert_eq!(
            request.body,
            Some(json!({"currentPassword": "senha123", "newPassword": "novaSenha456"}))
        );

        UpdatePassword
            .evaluate(&ApiResponse::new(200, "{}"), &mut session, &creds)
            .unwrap();
        assert_eq!(session, before);
    }

    #[test]
    fn test_update_username_renames_on_success_only() {
        let mut session = logged_in("alice123", "T2", "U1");
        let creds = credentials();

        let request = UpdateUsername.request(&session, &creds).unwrap();
        assert_eq!(request.path, "/users/id/U1/username");
        assert_eq!(request.bearer.as_deref(), Some("T2"));
        assert_eq!(
            request.body,
            Some(json!({"currentUsername": "alice123", "newUsername": "updated_alice123"}))
        );

        assert!(UpdateUsername
            .evaluate(&ApiResponse::new(409, "taken"), &mut session, &creds)
            .is_err());
        assert_eq!(session.username, "alice123");

        UpdateUsername
            .evaluate(&ApiResponse::new(200, "{}"), &mut session, &creds)
            .unwrap();
        assert_eq!(session.username, "updated_alice123");
    }
}
