/// Configuration management for the API server
///
/// Loaded once from environment variables at startup and shared immutably
/// through `AppState`.
///
/// # Environment Variables
///
/// - `API_HOST`: host to bind to (default: 0.0.0.0)
/// - `API_PORT`: port to bind to (default: 8080)
/// - `CORS_ORIGINS`: comma-separated allowed origins, `*` for any (default: *)
/// - `PRODUCTION`: enables HSTS (default: false)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `JWT_SECRET`: token signing secret, at least 32 characters (required)
/// - `JWT_ISSUER`: issuer claim (default: volunteer-hub)
/// - `ACCESS_TOKEN_TTL_MINUTES`: access token lifetime (default: 30, at most one year)
/// - `RESET_TOKEN_TTL_MINUTES`: reset token lifetime (default: 15, at most one year)
/// - `PASSWORD_HASH_MEMORY_KIB`, `PASSWORD_HASH_ITERATIONS`,
///   `PASSWORD_HASH_PARALLELISM`: Argon2id cost (default: 65536, 3, 4)
/// - `RUST_LOG`, `LOG_FORMAT`: read by the binary's tracing setup
///
/// # Example
///
/// ```no_run
/// use volunteer_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::{env, str::FromStr};
use volunteer_shared::auth::{
    jwt::{TokenService, DEFAULT_ISSUER},
    password::HashParams,
};

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Production mode turns on HSTS
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Signing secret
    ///
    /// Must be kept secret and be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    pub issuer: String,
    pub access_token_ttl_minutes: i64,
    pub reset_token_ttl_minutes: i64,
}

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        let params = HashParams::default();
        Self {
            memory_kib: params.memory_kib,
            iterations: params.iterations,
            parallelism: params.parallelism,
        }
    }
}

fn parse_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value: {}", name, e)),
        Err(_) => Ok(default),
    }
}

/// Longest accepted token lifetime: one year
pub const MAX_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 365;

/// Checks a token lifetime is positive and no longer than a year
fn check_ttl(name: &str, minutes: i64) -> anyhow::Result<i64> {
    if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&minutes) {
        anyhow::bail!(
            "{} must be between 1 and {} minutes, got {}",
            name,
            MAX_TOKEN_TTL_MINUTES,
            minutes
        );
    }
    Ok(minutes)
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing, a value doesn't
    /// parse, `JWT_SECRET` is shorter than 32 characters, or a token lifetime
    /// is outside 1 minute to one year.
    pub fn from_env() -> anyhow::Result<Self> {
        // .env is optional
        dotenvy::dotenv().ok();

        let host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_or("API_PORT", 8080u16)?;
        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();
        let production = parse_or("PRODUCTION", false)?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
        let max_connections = parse_or("DATABASE_MAX_CONNECTIONS", 10u32)?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let issuer = env::var("JWT_ISSUER").unwrap_or_else(|_| DEFAULT_ISSUER.to_string());
        let access_token_ttl_minutes = check_ttl(
            "ACCESS_TOKEN_TTL_MINUTES",
            parse_or("ACCESS_TOKEN_TTL_MINUTES", 30i64)?,
        )?;
        let reset_token_ttl_minutes = check_ttl(
            "RESET_TOKEN_TTL_MINUTES",
            parse_or("RESET_TOKEN_TTL_MINUTES", 15i64)?,
        )?;

        let defaults = PasswordConfig::default();
        let password = PasswordConfig {
            memory_kib: parse_or("PASSWORD_HASH_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_or("PASSWORD_HASH_ITERATIONS", defaults.iterations)?,
            parallelism: parse_or("PASSWORD_HASH_PARALLELISM", defaults.parallelism)?,
        };

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                issuer,
                access_token_ttl_minutes,
                reset_token_ttl_minutes,
            },
            password,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Builds the token service described by this configuration
    pub fn token_service(&self) -> TokenService {
        TokenService::new(&self.jwt.secret)
            .with_issuer(self.jwt.issuer.clone())
            .with_ttls(
                chrono::Duration::minutes(self.jwt.access_token_ttl_minutes),
                chrono::Duration::minutes(self.jwt.reset_token_ttl_minutes),
            )
    }

    /// Gets the Argon2id parameters
    pub fn hash_params(&self) -> HashParams {
        HashParams {
            memory_kib: self.password.memory_kib,
            iterations: self.password.iterations,
            parallelism: self.password.parallelism,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use volunteer_shared::auth::jwt::TokenPurpose;

    fn test_config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                cors_origins: vec!["*".to_string()],
                production: false,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/test".to_string(),
                max_connections: 10,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
                issuer: "volunteer-hub-test".to_string(),
                access_token_ttl_minutes: 5,
                reset_token_ttl_minutes: 2,
            },
            password: PasswordConfig::default(),
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(test_config().bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_token_service_uses_configured_ttls() {
        let tokens = test_config().token_service();
        assert_eq!(
            tokens.default_ttl(TokenPurpose::Access),
            chrono::Duration::minutes(5)
        );
        assert_eq!(
            tokens.default_ttl(TokenPurpose::PasswordReset),
            chrono::Duration::minutes(2)
        );
    }

    #[test]
    fn test_token_ttl_bounds() {
        assert_eq!(check_ttl("ACCESS_TOKEN_TTL_MINUTES", 30).unwrap(), 30);
        assert_eq!(
            check_ttl("ACCESS_TOKEN_TTL_MINUTES", MAX_TOKEN_TTL_MINUTES).unwrap(),
            MAX_TOKEN_TTL_MINUTES
        );
        assert!(check_ttl("ACCESS_TOKEN_TTL_MINUTES", 0).is_err());
        assert!(check_ttl("RESET_TOKEN_TTL_MINUTES", -5).is_err());

        let err = check_ttl("ACCESS_TOKEN_TTL_MINUTES", i64::MAX).unwrap_err();
        assert!(err.to_string().contains("ACCESS_TOKEN_TTL_MINUTES"));
    }

    #[test]
    fn test_password_defaults_match_hasher() {
        let params = test_config().hash_params();
        assert_eq!(params.memory_kib, 65536);
        assert_eq!(params.iterations, 3);
        assert_eq!(params.parallelism, 4);
    }
}
