//! Service configuration derived from environment variables.

use std::env;
use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::crypto::DEFAULT_MATCH_TOLERANCE;

const DEFAULT_PORT: u16 = 5002;
const DEFAULT_BODY_LIMIT_MB: usize = 16;
const DEFAULT_CONCURRENCY_LIMIT: usize = 4;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 60_000;
const DEFAULT_TEST_TIMEOUT_MS: u64 = 180_000;
const DEFAULT_DATA_DIR: &str = "/var/lib/biometric-auth";
const DEFAULT_TEMPLATE_DIMENSION: usize = 5;

fn env_trim(name: &str) -> String {
    env::var(name).unwrap_or_default().trim().to_string()
}

fn env_lower(name: &str) -> String {
    env_trim(name).to_lowercase()
}

fn env_path(name: &str) -> Option<PathBuf> {
    let value = env_trim(name);
    if value.is_empty() {
        None
    } else {
        Some(PathBuf::from(value))
    }
}

fn env_f64(name: &str) -> Option<f64> {
    env_trim(name).parse::<f64>().ok()
}

pub(crate) fn is_truthy(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "yes")
}

/// Backend holding enrolled templates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreKind {
    Redb,
    Memory,
}

impl StoreKind {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "" | "redb" => Some(StoreKind::Redb),
            "memory" => Some(StoreKind::Memory),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StoreKind::Redb => "redb",
            StoreKind::Memory => "memory",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    port: u16,
    host: IpAddr,
    body_limit_mb: usize,
    body_limit_bytes: usize,
    concurrency_limit: usize,
    cpu_concurrency_limit: usize,
    request_timeout_ms: u64,
    context_path: PathBuf,
    database_path: PathBuf,
    store: Option<StoreKind>,
    store_raw: String,
    template_dimension: usize,
    match_tolerance: f64,
    normalize_range: Option<(f64, f64)>,
    normalize_partial: bool,
    expose_diagnostics: bool,
}

impl Settings {
    pub fn from_env() -> Self {
        let port = env_trim("PORT").parse::<u16>().unwrap_or(DEFAULT_PORT);
        let host = env_trim("HOST")
            .parse::<IpAddr>()
            .unwrap_or(IpAddr::V6(Ipv6Addr::UNSPECIFIED));
        let body_limit_mb = env_trim("BIOMETRIC_BODY_LIMIT_MB")
            .parse::<usize>()
            .unwrap_or(DEFAULT_BODY_LIMIT_MB);
        let body_limit_bytes = body_limit_mb.saturating_mul(1024 * 1024);
        let concurrency_limit = env_trim("BIOMETRIC_CONCURRENCY_LIMIT")
            .parse::<usize>()
            .ok()
            .filter(|value| *value > 0)
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|value| value.get())
                    .unwrap_or(DEFAULT_CONCURRENCY_LIMIT)
            });
        let cpu_concurrency_limit = env_trim("BIOMETRIC_CPU_CONCURRENCY_LIMIT")
            .parse::<usize>()
            .ok()
            .filter(|value| *value > 0)
            .unwrap_or(concurrency_limit);
        let request_timeout_ms = env_trim("BIOMETRIC_REQUEST_TIMEOUT_MS")
            .parse::<u64>()
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS);

        let data_dir = env_path("BIOMETRIC_DATA_DIR").unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let context_path =
            env_path("BIOMETRIC_CONTEXT_PATH").unwrap_or_else(|| data_dir.join("context.bin"));
        let database_path =
            env_path("BIOMETRIC_DATABASE_PATH").unwrap_or_else(|| data_dir.join("templates.redb"));

        let store_raw = env_lower("BIOMETRIC_STORE");
        let store = StoreKind::parse(&store_raw);

        let template_dimension = env_trim("BIOMETRIC_TEMPLATE_DIMENSION")
            .parse::<usize>()
            .unwrap_or(DEFAULT_TEMPLATE_DIMENSION);
        let match_tolerance = env_f64("BIOMETRIC_MATCH_TOLERANCE").unwrap_or(DEFAULT_MATCH_TOLERANCE);

        let normalize_min = env_f64("BIOMETRIC_NORMALIZE_MIN");
        let normalize_max = env_f64("BIOMETRIC_NORMALIZE_MAX");
        let normalize_range = normalize_min.zip(normalize_max);
        let normalize_partial = normalize_min.is_some() != normalize_max.is_some();

        let expose_diagnostics = is_truthy(&env_lower("BIOMETRIC_EXPOSE_DIAGNOSTICS"));

        Self {
            port,
            host,
            body_limit_mb,
            body_limit_bytes,
            concurrency_limit,
            cpu_concurrency_limit,
            request_timeout_ms,
            context_path,
            database_path,
            store,
            store_raw,
            template_dimension,
            match_tolerance,
            normalize_range,
            normalize_partial,
            expose_diagnostics,
        }
    }

    pub fn for_tests() -> Self {
        let data_dir = env::temp_dir().join("biometric-auth-tests");
        Self {
            port: DEFAULT_PORT,
            host: IpAddr::V6(Ipv6Addr::UNSPECIFIED),
            body_limit_mb: DEFAULT_BODY_LIMIT_MB,
            body_limit_bytes: DEFAULT_BODY_LIMIT_MB.saturating_mul(1024 * 1024),
            concurrency_limit: 32,
            cpu_concurrency_limit: 32,
            request_timeout_ms: DEFAULT_TEST_TIMEOUT_MS,
            context_path: data_dir.join("context.bin"),
            database_path: data_dir.join("templates.redb"),
            store: Some(StoreKind::Memory),
            store_raw: "memory".to_string(),
            template_dimension: DEFAULT_TEMPLATE_DIMENSION,
            match_tolerance: DEFAULT_MATCH_TOLERANCE,
            normalize_range: None,
            normalize_partial: false,
            expose_diagnostics: false,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.store.is_none() {
            return Err(format!(
                "BIOMETRIC_STORE must be \"redb\" or \"memory\", got \"{}\".",
                self.store_raw
            ));
        }
        if self.template_dimension == 0 {
            return Err("BIOMETRIC_TEMPLATE_DIMENSION must be at least 1.".to_string());
        }
        if !self.match_tolerance.is_finite() || self.match_tolerance <= 0.0 {
            return Err("BIOMETRIC_MATCH_TOLERANCE must be a positive number.".to_string());
        }
        if self.normalize_partial {
            return Err(
                "BIOMETRIC_NORMALIZE_MIN and BIOMETRIC_NORMALIZE_MAX must be set together."
                    .to_string(),
            );
        }
        if let Some((min, max)) = self.normalize_range {
            if min >= max {
                return Err(format!(
                    "BIOMETRIC_NORMALIZE_MIN ({min}) must be below BIOMETRIC_NORMALIZE_MAX ({max})."
                ));
            }
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_bytes
    }

    pub fn body_limit_mb(&self) -> usize {
        self.body_limit_mb
    }

    pub fn with_body_limit_bytes(mut self, bytes: usize) -> Self {
        self.body_limit_bytes = bytes;
        self.body_limit_mb = bytes / (1024 * 1024);
        self
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    pub fn cpu_concurrency_limit(&self) -> usize {
        self.cpu_concurrency_limit
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn request_timeout_ms(&self) -> u64 {
        self.request_timeout_ms
    }

    pub fn context_path(&self) -> &Path {
        &self.context_path
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    /// Falls back to redb; `validate` rejects unknown values first.
    pub fn store(&self) -> StoreKind {
        self.store.unwrap_or(StoreKind::Redb)
    }

    pub fn with_store(mut self, store: StoreKind, database_path: Option<PathBuf>) -> Self {
        self.store = Some(store);
        self.store_raw = store.as_str().to_string();
        if let Some(path) = database_path {
            self.database_path = path;
        }
        self
    }

    pub fn template_dimension(&self) -> usize {
        self.template_dimension
    }

    pub fn with_template_dimension(mut self, dimension: usize) -> Self {
        self.template_dimension = dimension;
        self
    }

    pub fn match_tolerance(&self) -> f64 {
        self.match_tolerance
    }

    pub fn normalize_range(&self) -> Option<(f64, f64)> {
        self.normalize_range
    }

    pub fn with_normalize_range(mut self, range: Option<(f64, f64)>) -> Self {
        self.normalize_range = range;
        self.normalize_partial = false;
        self
    }

    pub fn expose_diagnostics(&self) -> bool {
        self.expose_diagnostics
    }

    pub fn with_expose_diagnostics(mut self, expose: bool) -> Self {
        self.expose_diagnostics = expose;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_kind_parse() {
        assert_eq!(StoreKind::parse(""), Some(StoreKind::Redb));
        assert_eq!(StoreKind::parse("redb"), Some(StoreKind::Redb));
        assert_eq!(StoreKind::parse("memory"), Some(StoreKind::Memory));
        assert_eq!(StoreKind::parse("sqlite"), None);
    }

    #[test]
    fn test_for_tests_is_valid() {
        let settings = Settings::for_tests();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.store(), StoreKind::Memory);
        assert_eq!(settings.template_dimension(), 5);
        assert!(!settings.expose_diagnostics());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let settings = Settings::for_tests().with_template_dimension(0);
        assert!(settings.validate().is_err());

        let settings = Settings::for_tests().with_normalize_range(Some((1.0, 0.0)));
        assert!(settings.validate().unwrap_err().contains("BIOMETRIC_NORMALIZE_MIN"));

        let mut settings = Settings::for_tests();
        settings.store = None;
        settings.store_raw = "sqlite".to_string();
        assert!(settings.validate().unwrap_err().contains("sqlite"));
    }

    #[test]
    fn test_truthy_values() {
        assert!(is_truthy("1"));
        assert!(is_truthy(" yes "));
        assert!(!is_truthy("off"));
    }
}
