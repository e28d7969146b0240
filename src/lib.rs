//! authflow library
//!
//! End-to-end account lifecycle checker for HTTP authentication services.
//!
//! # Lifecycle
//!
//! One run registers a fresh user and walks it through:
//!
//! 1. **Register** - `POST /register`, expects 201
//! 2. **Login** - `POST /login`, expects 200 with a token and user id
//! 3. **Get user** - `GET /users/id/{id}` with the bearer token
//! 4. **Update password** - `PUT /users/id/{id}/password`
//! 5. **Login with new password**
//! 6. **Update username** - `PUT /users/id/{id}/username`
//! 7. **Login with new username**
//! 8. **Logout** - `POST /logout`
//! 9. **Unauthorized access** - `GET /users/id/{id}` without a token, expects 401/403
//!
//! A preflight probe gates the run; every step is attempted even when
//! earlier ones fail.
//!
//! # Example
//!
//! ```no_run
//! use authflow::{config::Config, runner::Runner, session::SessionState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("authflow.yaml")?;
//!     let session = SessionState::with_random_username(&config.credentials.username_prefix);
//!     let report = Runner::from_config(&config)?.run(session).await?;
//!     println!("{}", report.render());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod preflight;
pub mod report;
pub mod runner;
pub mod session;
pub mod steps;

// Re-export commonly used types
pub use config::Config;
pub use report::{RunReport, StepOutcome, StepStatus};
pub use runner::{RunState, Runner};
pub use session::SessionState;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
