//! Environment configuration for different deployment stages

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion};
use tracing::Level;

/// Default port when `PORT` is unset
const DEFAULT_PORT: u16 = 8000;

/// Secret used to verify tokens in development when `JWT_SECRET` is unset
const DEVELOPMENT_JWT_SECRET: &str = "development-secret";

/// Where uploaded plant images are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaDriver {
    /// S3 bucket with public read access
    S3,
    /// Local public disk, served by the backend under `/storage`
    Local,
}

/// Application environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment (uses `LocalStack` and the local public disk)
    Development {
        /// Skip JWT verification and use the bearer token as the user ID
        disable_auth: bool,
    },
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Panics
    ///
    /// Panics if `APP_ENV` contains an invalid value
    #[must_use]
    pub fn from_env() -> Self {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Self::Production,
            "staging" => Self::Staging,
            "development" => {
                let disable_auth = env::var("DISABLE_AUTH")
                    .ok()
                    .and_then(|val| val.parse::<bool>().ok())
                    .unwrap_or(false);

                Self::Development { disable_auth }
            }
            _ => panic!("Invalid environment: {env}"),
        }
    }

    /// Port the HTTP server listens on
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` is set but is not a valid port number
    pub fn port(&self) -> Result<u16, std::num::ParseIntError> {
        env::var("PORT").map_or(Ok(DEFAULT_PORT), |p| p.parse())
    }

    /// Public base URL under which `/storage/<image_path>` is reachable
    #[must_use]
    pub fn public_storage_base_url(&self) -> String {
        env::var("APP_URL")
            .unwrap_or_else(|_| format!("http://localhost:{DEFAULT_PORT}"))
            .trim_end_matches('/')
            .to_string()
    }

    /// Returns the plants table name for the environment
    ///
    /// # Panics
    ///
    /// Panics if the `PLANTS_TABLE_NAME` environment variable is not set outside development
    #[must_use]
    pub fn plants_table_name(&self) -> String {
        match self {
            Self::Production | Self::Staging => env::var("PLANTS_TABLE_NAME")
                .expect("PLANTS_TABLE_NAME environment variable is not set"),
            Self::Development { .. } => {
                env::var("PLANTS_TABLE_NAME").unwrap_or_else(|_| "plants".to_string())
            }
        }
    }

    /// Returns the name of the plants GSI keyed by owner
    #[must_use]
    pub fn plants_owner_index_name(&self) -> String {
        env::var("PLANTS_OWNER_INDEX_NAME").unwrap_or_else(|_| "owner-index".to_string())
    }

    /// Returns the users table name for the environment
    ///
    /// # Panics
    ///
    /// Panics if the `USERS_TABLE_NAME` environment variable is not set outside development
    #[must_use]
    pub fn users_table_name(&self) -> String {
        match self {
            Self::Production | Self::Staging => env::var("USERS_TABLE_NAME")
                .expect("USERS_TABLE_NAME environment variable is not set"),
            Self::Development { .. } => {
                env::var("USERS_TABLE_NAME").unwrap_or_else(|_| "users".to_string())
            }
        }
    }

    /// Which media driver stores plant images
    ///
    /// Defaults to S3 in production and staging, and to the local disk in development.
    #[must_use]
    pub fn media_driver(&self) -> MediaDriver {
        match env::var("MEDIA_DRIVER")
            .map(|val| val.trim().to_lowercase())
            .as_deref()
        {
            Ok("s3") => MediaDriver::S3,
            Ok("local") => MediaDriver::Local,
            _ => match self {
                Self::Production | Self::Staging => MediaDriver::S3,
                Self::Development { .. } => MediaDriver::Local,
            },
        }
    }

    /// Returns the S3 bucket name for the environment
    ///
    /// # Panics
    ///
    /// Panics if the `S3_BUCKET_NAME` environment variable is not set outside development
    #[must_use]
    pub fn s3_bucket(&self) -> String {
        match self {
            Self::Production | Self::Staging => {
                env::var("S3_BUCKET_NAME").expect("S3_BUCKET_NAME environment variable is not set")
            }
            Self::Development { .. } => {
                env::var("S3_BUCKET_NAME").unwrap_or_else(|_| "plant-images".to_string())
            }
        }
    }

    /// Root directory of the local public disk
    #[must_use]
    pub fn local_storage_root(&self) -> PathBuf {
        env::var("LOCAL_STORAGE_ROOT")
            .map_or_else(|_| PathBuf::from("storage/app/public"), PathBuf::from)
    }

    /// Secret used to verify access tokens
    ///
    /// # Panics
    ///
    /// Panics if the `JWT_SECRET` environment variable is not set outside development
    #[must_use]
    pub fn jwt_secret(&self) -> String {
        match self {
            Self::Production | Self::Staging => {
                env::var("JWT_SECRET").expect("JWT_SECRET environment variable is not set")
            }
            Self::Development { .. } => {
                env::var("JWT_SECRET").unwrap_or_else(|_| DEVELOPMENT_JWT_SECRET.to_string())
            }
        }
    }

    /// Tokens issued before this instant are rejected (`JWT_ISSUED_AFTER`, RFC 3339)
    #[must_use]
    pub fn jwt_issued_after(&self) -> Option<i64> {
        env::var("JWT_ISSUED_AFTER")
            .ok()
            .and_then(|date_str| chrono::DateTime::parse_from_rfc3339(date_str.trim()).ok())
            .map(|dt| dt.timestamp())
    }

    /// Whether bearer tokens are trusted without verification
    #[must_use]
    pub const fn disable_auth(&self) -> bool {
        matches!(self, Self::Development { disable_auth: true })
    }

    /// Whether to show API docs
    #[must_use]
    pub const fn show_api_docs(&self) -> bool {
        matches!(self, Self::Development { .. } | Self::Staging)
    }

    /// Returns the endpoint URL to use for AWS services
    #[must_use]
    pub const fn override_aws_endpoint_url(&self) -> Option<&str> {
        match self {
            Self::Production | Self::Staging => None,
            Self::Development { .. } => Some("http://localhost:4566"),
        }
    }

    /// AWS configuration with retry and timeout settings
    pub async fn aws_config(&self) -> aws_config::SdkConfig {
        let retry_config = RetryConfig::standard()
            .with_max_attempts(3)
            .with_initial_backoff(Duration::from_millis(50));

        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(30))
            .build();

        let mut config_builder = aws_config::load_defaults(BehaviorVersion::latest())
            .await
            .to_builder()
            .retry_config(retry_config)
            .timeout_config(timeout_config);

        if let Some(endpoint_url) = self.override_aws_endpoint_url() {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }

        config_builder.build()
    }

    /// AWS S3 service configuration
    pub async fn s3_client_config(&self) -> aws_sdk_s3::Config {
        let aws_config = self.aws_config().await;
        let s3_config: aws_sdk_s3::Config = (&aws_config).into();
        let mut builder = s3_config.to_builder();

        // LocalStack only supports path-style bucket addressing
        if matches!(self, Self::Development { .. }) {
            builder.set_force_path_style(Some(true));
        }

        builder.build()
    }

    #[must_use]
    pub fn tracing_level(&self) -> Level {
        env::var("TRACING_LEVEL")
            .ok()
            .and_then(|val| val.parse::<Level>().ok())
            .unwrap_or(match self {
                Self::Production | Self::Staging => Level::INFO,
                Self::Development { .. } => Level::DEBUG,
            })
    }
}
