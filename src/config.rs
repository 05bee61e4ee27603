//! Configuration management for the asset gateway.
//!
//! Supports command-line arguments via clap, environment variables with an
//! `ASSET_` prefix, and sensible defaults for all optional settings.
//!
//! # Environment Variables
//!
//! - `ASSET_HOST` - Server bind address (default: 0.0.0.0)
//! - `ASSET_PORT` - Server port (default: 3000)
//! - `ASSET_S3_BUCKET` - S3 bucket name (required)
//! - `ASSET_S3_PREFIX` - Key prefix prepended to every asset key
//! - `ASSET_S3_ENDPOINT` - Custom S3 endpoint for S3-compatible services
//! - `ASSET_S3_REGION` - AWS region (default: us-east-1)
//! - `ASSET_LOCAL_ROOT` - Serve /img from this directory instead of S3
//! - `ASSET_SIGNED_URL_TTL` - Signed URL validity in seconds (default: 3600)
//! - `ASSET_STRICT_RANGES` - Respond 416 to malformed Range headers
//! - `ASSET_MONGODB_URI` - Document store connection string (enables search)
//! - `ASSET_MONGODB_DATABASE` - Document database name (default: scrapbook)
//! - `ASSET_MONGODB_COLLECTION` - Record collection name (default: files)
//! - `ASSET_SEARCH_LIMIT` - Max search results per query (default: 50)

use std::path::PathBuf;

use clap::Parser;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default signed URL validity in seconds (1 hour).
pub const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 3600;

/// Default document database name.
pub const DEFAULT_MONGODB_DATABASE: &str = "scrapbook";

/// Default record collection name.
pub const DEFAULT_MONGODB_COLLECTION: &str = "files";

/// Default maximum number of search results per query.
pub const DEFAULT_SEARCH_LIMIT: i64 = 50;

/// Upper bound on the configurable search limit.
pub const MAX_SEARCH_LIMIT: i64 = 50;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Asset Gateway - serves image assets from S3-compatible storage.
///
/// Honors byte-range and conditional (If-None-Match) requests, redirects to
/// presigned URLs, and exposes tag search over a document collection.
#[derive(Parser, Debug, Clone)]
#[command(name = "asset-gateway")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "ASSET_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "ASSET_PORT")]
    pub port: u16,

    // =========================================================================
    // S3 Configuration
    // =========================================================================
    /// S3 bucket name containing the assets.
    #[arg(long, env = "ASSET_S3_BUCKET")]
    pub s3_bucket: String,

    /// Key prefix prepended to every asset key.
    #[arg(long, env = "ASSET_S3_PREFIX")]
    pub s3_prefix: Option<String>,

    /// Custom S3 endpoint URL for S3-compatible services (MinIO, etc.).
    ///
    /// If not specified, uses the default AWS S3 endpoint.
    #[arg(long, env = "ASSET_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS region for S3.
    #[arg(long, default_value = DEFAULT_REGION, env = "ASSET_S3_REGION")]
    pub s3_region: String,

    // =========================================================================
    // Asset Serving Configuration
    // =========================================================================
    /// Serve /img from this local directory instead of the object store.
    #[arg(long, env = "ASSET_LOCAL_ROOT")]
    pub local_root: Option<PathBuf>,

    /// Signed URL validity window in seconds.
    #[arg(long, default_value_t = DEFAULT_SIGNED_URL_TTL_SECS, env = "ASSET_SIGNED_URL_TTL")]
    pub signed_url_ttl: u64,

    /// Respond 416 to malformed Range headers instead of ignoring them.
    #[arg(long, default_value_t = false, env = "ASSET_STRICT_RANGES")]
    pub strict_ranges: bool,

    // =========================================================================
    // Search Configuration
    // =========================================================================
    /// Document store connection string; tag search is enabled when set.
    #[arg(long, env = "ASSET_MONGODB_URI")]
    pub mongodb_uri: Option<String>,

    /// Document database name.
    #[arg(long, default_value = DEFAULT_MONGODB_DATABASE, env = "ASSET_MONGODB_DATABASE")]
    pub mongodb_database: String,

    /// Record collection name.
    #[arg(long, default_value = DEFAULT_MONGODB_COLLECTION, env = "ASSET_MONGODB_COLLECTION")]
    pub mongodb_collection: String,

    /// Maximum number of search results per query (1-50).
    #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT, env = "ASSET_SEARCH_LIMIT")]
    pub search_limit: i64,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "ASSET_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.s3_bucket.is_empty() {
            return Err("S3 bucket name is required. Set --s3-bucket or ASSET_S3_BUCKET".to_string());
        }

        if self.signed_url_ttl == 0 {
            return Err("signed_url_ttl must be greater than 0".to_string());
        }

        if self.search_limit < 1 || self.search_limit > MAX_SEARCH_LIMIT {
            return Err(format!(
                "search_limit must be between 1 and {}",
                MAX_SEARCH_LIMIT
            ));
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Tests
// =============================================================================
