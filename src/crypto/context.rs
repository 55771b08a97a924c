//! Encryption context lifecycle.
//!
//! The context (parameters, evaluation keys and the secret key) is generated
//! once per deployment and written to a single file. Every stored template is
//! bound to it, so a corrupt file is a startup failure rather than a reason to
//! regenerate.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{info, warn};

use crate::ckks::{CkksContext, CkksParams};
use crate::error::{BiometricError, BiometricResult};

/// Process-wide context, set once before any workflow runs.
static CONTEXT: OnceCell<Arc<CkksContext>> = OnceCell::new();

/// Load the context stored at `path`, or generate one from `params` and
/// persist it there (secret key included).
pub fn get_or_create_context(path: &Path, params: &CkksParams) -> BiometricResult<CkksContext> {
    match std::fs::read(path) {
        Ok(bytes) => load_context(path, &bytes, params),
        Err(error) if error.kind() == ErrorKind::NotFound => create_context(path, params),
        Err(error) => Err(BiometricError::ContextLoad(format!(
            "failed to read {}: {error}",
            path.display()
        ))),
    }
}

fn load_context(path: &Path, bytes: &[u8], params: &CkksParams) -> BiometricResult<CkksContext> {
    let context = CkksContext::deserialize(bytes).map_err(|error| {
        BiometricError::ContextLoad(format!("{} is not a valid context: {error}", path.display()))
    })?;

    if !context.has_secret_key() {
        return Err(BiometricError::ContextLoad(format!(
            "{} holds no secret key; verification needs one",
            path.display()
        )));
    }
    if context.params() != params {
        warn!(
            path = %path.display(),
            "Stored context parameters differ from configuration; using the stored ones"
        );
    }

    info!(
        path = %path.display(),
        fingerprint = %context.fingerprint_hex(),
        "Loaded encryption context from disk"
    );
    Ok(context)
}

fn create_context(path: &Path, params: &CkksParams) -> BiometricResult<CkksContext> {
    warn!(
        path = %path.display(),
        "No persisted encryption context found; generating a new one"
    );
    let context = CkksContext::new(params.clone())
        .map_err(|error| BiometricError::ContextLoad(error.to_string()))?;
    let bytes = context
        .serialize(true)
        .map_err(|error| BiometricError::ContextLoad(error.to_string()))?;

    persist_atomically(path, &bytes).map_err(|error| {
        BiometricError::ContextLoad(format!("failed to write {}: {error}", path.display()))
    })?;

    info!(
        path = %path.display(),
        fingerprint = %context.fingerprint_hex(),
        bytes = bytes.len(),
        "Generated and persisted encryption context"
    );
    Ok(context)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn persist_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = tmp_path(path);
    std::fs::write(&tmp_path, bytes)?;
    if let Err(error) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(error);
    }
    Ok(())
}

/// Initialize the global context. Later calls return the first context
/// regardless of their arguments.
pub fn init_context(path: &Path, params: &CkksParams) -> BiometricResult<Arc<CkksContext>> {
    CONTEXT
        .get_or_try_init(|| get_or_create_context(path, params).map(Arc::new))
        .cloned()
}
