//! Asset Gateway - an HTTP gateway for image assets in object storage.
//!
//! This binary wires the configuration, store clients, and HTTP router
//! together, serves until interrupted, and releases the document store
//! connection on the way out.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use asset_gateway::{
    config::Config,
    create_s3_client,
    search::TagIndex,
    server::{create_router, AppState, RouterConfig},
    store::{LocalTree, S3AssetStore},
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Configuration:");
    info!("  S3 bucket: {}", config.s3_bucket);
    if let Some(ref prefix) = config.s3_prefix {
        info!("  S3 prefix: {}", prefix);
    }
    if let Some(ref endpoint) = config.s3_endpoint {
        info!("  S3 endpoint: {}", endpoint);
    }
    info!("  S3 region: {}", config.s3_region);
    if let Some(ref root) = config.local_root {
        info!("  Local root: {} (object store bypassed)", root.display());
    }
    info!("  Signed URL TTL: {}s", config.signed_url_ttl);

    // Create the object store client
    let s3_client = create_s3_client(config.s3_endpoint.as_deref(), &config.s3_region).await;
    let mut store = S3AssetStore::new(s3_client, config.s3_bucket.clone());
    if let Some(ref prefix) = config.s3_prefix {
        store = store.with_prefix(prefix.clone());
    }

    let mut state = AppState::new(store)
        .with_signed_url_ttl(Duration::from_secs(config.signed_url_ttl))
        .with_strict_ranges(config.strict_ranges);

    // Optional local filesystem serving mode
    if let Some(ref root) = config.local_root {
        match LocalTree::new(root.clone()) {
            Ok(tree) => {
                state = state.with_local(tree);
            }
            Err(e) => {
                error!("Failed to open local root: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    // Optional document store for tag search; the client handle is owned
    // here so it can be shut down on every exit path below.
    let mongo_client = match config.mongodb_uri {
        Some(ref uri) => match mongodb::Client::with_uri_str(uri).await {
            Ok(client) => {
                let collection = client
                    .database(&config.mongodb_database)
                    .collection(&config.mongodb_collection);
                state = state.with_search(TagIndex::new(collection, config.search_limit));
                info!(
                    "  Tag search: enabled ({}.{}, limit {})",
                    config.mongodb_database, config.mongodb_collection, config.search_limit
                );
                Some(client)
            }
            Err(e) => {
                error!("Failed to configure document store client: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => {
            info!("  Tag search: disabled (no ASSET_MONGODB_URI)");
            None
        }
    };

    let router_config = build_router_config(&config);
    let router = create_router(state, router_config);

    let addr = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            shutdown_document_store(mongo_client).await;
            return ExitCode::FAILURE;
        }
    };

    info!("Server listening on http://{}", addr);

    let result = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // Release long-lived connections on every exit path
    shutdown_document_store(mongo_client).await;

    if let Err(e) = result {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Shutdown complete");
    ExitCode::SUCCESS
}

/// Resolve when the process receives SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

/// Close the document store client's connection pool, if one was opened.
async fn shutdown_document_store(client: Option<mongodb::Client>) {
    if let Some(client) = client {
        client.shutdown().await;
        info!("Document store connections released");
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "asset_gateway=debug,tower_http=debug"
    } else {
        "asset_gateway=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application Config.
fn build_router_config(config: &Config) -> RouterConfig {
    let mut router_config = RouterConfig::new().with_tracing(!config.no_tracing);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config
}
