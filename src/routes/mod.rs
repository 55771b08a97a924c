//! HTTP route handlers.
//!
//! Workflows are synchronous and CPU-bound, so every handler hands them to
//! the blocking pool through [`run_cpu_bound`].

mod demo;
mod enrollment;
mod health;
mod identities;
mod verification;

pub use demo::arithmetic_demo;
pub use enrollment::enroll;
pub use health::{build_info, health};
pub use identities::list_identities;
pub use verification::verify;

use crate::app::AppState;
use crate::error::{BiometricError, BiometricResult};

/// Run `task` on the blocking pool once a CPU permit is free.
pub(crate) async fn run_cpu_bound<T, F>(state: &AppState, task: F) -> BiometricResult<T>
where
    F: FnOnce() -> BiometricResult<T> + Send + 'static,
    T: Send + 'static,
{
    let _permit = state
        .cpu_permits
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| BiometricError::Internal("CPU worker pool closed".to_string()))?;

    tokio::task::spawn_blocking(task)
        .await
        .map_err(|error| BiometricError::Internal(format!("CPU task failed: {error}")))?
}
