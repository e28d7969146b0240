use super::{Failure, Step, Verdict};
use crate::client::{endpoints, ApiRequest, ApiResponse, TransportError};
use crate::config::CredentialsConfig;
use crate::session::SessionState;
use tracing::warn;

const DENIED: [u16; 2] = [401, 403];

/// Reads the user resource without credentials and expects to be refused.
///
/// Uses whatever user id the session holds, stale or absent. A refused
/// connection counts as enforcement too, so transport errors pass.
#[derive(Debug, Default, Clone)]
pub struct UnauthorizedAccess;

impl Step for UnauthorizedAccess {
    fn name(&self) -> &str {
        "Unauthorized access"
    }

    fn request(
        &self,
        session: &SessionState,
        _credentials: &CredentialsConfig,
    ) -> Result<ApiRequest, Failure> {
        Ok(endpoints::get_user(
            session.user_id.as_deref().unwrap_or_default(),
            None,
        ))
    }

    fn evaluate(
        &self,
        response: &ApiResponse,
        _session: &mut SessionState,
        _credentials: &CredentialsConfig,
    ) -> Result<(), Failure> {
        if DENIED.contains(&response.status) {
            Ok(())
        } else {
            Err(Failure::unexpected(&DENIED, response))
        }
    }

    fn on_transport_error(&self, error: TransportError) -> Verdict {
        warn!(step = self.name(), error = %error, "Connection rejected, accepting as denial");
        Verdict::Pass
    }
}
