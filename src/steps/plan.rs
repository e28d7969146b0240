use super::{
    GetUser, Login, Logout, Register, Step, UnauthorizedAccess, UpdatePassword, UpdateUsername,
};
use crate::session::Field;
use std::collections::HashSet;
use thiserror::Error;

/// Plan construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("Step '{step}' requires '{field}' but nothing before it provides it")]
    UnsatisfiedDependency { step: String, field: Field },

    #[error("Duplicate step name '{0}'")]
    DuplicateName(String),
}

/// Ordered list of steps executed by the runner
#[derive(Default)]
pub struct Plan {
    steps: Vec<Box<dyn Step>>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full account lifecycle, in execution order
    pub fn lifecycle() -> Self {
        Self::new()
            .then(Register)
            .then(Login::initial())
            .then(GetUser)
            .then(UpdatePassword)
            .then(Login::with_new_password())
            .then(UpdateUsername)
            .then(Login::with_new_username())
            .then(Logout)
            .then(UnauthorizedAccess)
    }

    /// Append a step
    #[must_use]
    pub fn then(mut self, step: impl Step + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Check that names are unique and that every required field is either
    /// in `seeded` or produced by an earlier step.
    pub fn validate(&self, seeded: &[Field]) -> Result<(), PlanError> {
        let mut available: HashSet<Field> = seeded.iter().copied().collect();
        let mut names = HashSet::new();

        for step in &self.steps {
            if !names.insert(step.name()) {
                return Err(PlanError::DuplicateName(step.name().to_string()));
            }
            if let Some(field) = step.requires().iter().find(|f| !available.contains(*f)) {
                return Err(PlanError::UnsatisfiedDependency {
                    step: step.name().to_string(),
                    field: *field,
                });
            }
            available.extend(step.produces().iter().copied());
        }

        Ok(())
    }

    pub fn steps(&self) -> impl Iterator<Item = &dyn Step> {
        self.steps.iter().map(|s| s.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl std::fmt::Debug for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
