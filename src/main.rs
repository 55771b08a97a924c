//! Biometric authentication service.
//!
//! Enrolls and verifies biometric feature vectors that stay CKKS-encrypted
//! at rest and during comparison.

use biometric_service::{
    app::build_router,
    ckks::CkksParams,
    crypto, settings::Settings, storage, telemetry,
    workflow::Authenticator,
};

#[tokio::main]
async fn main() {
    let settings = Settings::from_env();
    telemetry::init_tracing(&settings);

    if let Err(message) = settings.validate() {
        tracing::error!("{message}");
        std::process::exit(1);
    }

    tracing::info!(
        path = %settings.context_path().display(),
        "Loading encryption context (first run generates keys)"
    );
    let context = match crypto::init_context(settings.context_path(), &CkksParams::default()) {
        Ok(context) => context,
        Err(error) => {
            tracing::error!(error = %error, "Failed to load encryption context");
            std::process::exit(1);
        }
    };
    tracing::info!(
        fingerprint = %context.fingerprint_hex(),
        slots = context.slots(),
        "Encryption context ready"
    );

    let store = match storage::open_store(&settings) {
        Ok(store) => store,
        Err(error) => {
            tracing::error!(error = %error, "Failed to open template store");
            std::process::exit(1);
        }
    };

    let authenticator = match Authenticator::from_settings(context, store, &settings) {
        Ok(authenticator) => authenticator,
        Err(error) => {
            tracing::error!(error = %error, "Invalid template policy");
            std::process::exit(1);
        }
    };

    let addr = settings.socket_addr();
    tracing::info!(
        addr = %addr,
        store = ?settings.store(),
        dimension = settings.template_dimension(),
        tolerance = settings.match_tolerance(),
        body_limit_mb = settings.body_limit_mb(),
        concurrency_limit = settings.concurrency_limit(),
        cpu_concurrency_limit = settings.cpu_concurrency_limit(),
        request_timeout_ms = settings.request_timeout_ms(),
        "Starting biometric authentication service"
    );

    let app = build_router(&settings, authenticator);
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(error = %error, %addr, "Failed to bind listener");
            std::process::exit(1);
        }
    };

    if let Err(error) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %error, "Server error");
    }

    telemetry::shutdown_tracing();
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %error, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
