//! Process-wide application state.
//!
//! `CoreState` is built once at startup, wrapped in `Arc`, and shared by
//! every request. It owns the connection pool, the token signer and the
//! privilege resolver. Nothing in it is mutated per request.

use crate::access_control::MenuResolver;
use crate::config::AppConfig;
use crate::crypto::{hash_password, CryptoError, TokenSigner};
use crate::db::{self, DbPool, PooledConnection};

/// Username of the administrator created on an empty database.
pub const DEFAULT_ADMIN_USERNAME: &str = "ADMIN";

/// Role the default administrator is assigned to.
const ADMINISTRATOR_ROLE_ID: i64 = 1;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct CoreState {
    pub config: AppConfig,
    pub pool: DbPool,
    pub tokens: TokenSigner,
    pub resolver: MenuResolver,
}

impl CoreState {
    /// Create the data directory, open (and migrate) the database, and set
    /// up token signing.
    pub fn open(config: AppConfig) -> Result<Self, CoreError> {
        if let Some(parent) = config.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let pool = DbPool::open(&config.db_path, config.pool_size)?;

        let tokens = match &config.token_secret {
            Some(secret) => TokenSigner::new(secret.as_bytes(), config.token_ttl_hours)?,
            None => {
                tracing::warn!(
                    "CLINIC_TOKEN_SECRET not set; using a random key, tokens will not survive a restart"
                );
                TokenSigner::random(config.token_ttl_hours)
            }
        };

        Ok(Self {
            config,
            pool,
            tokens,
            resolver: MenuResolver::standard(),
        })
    }

    /// Check a connection out of the pool.
    pub async fn conn(&self) -> Result<PooledConnection, db::DatabaseError> {
        self.pool.acquire().await
    }

    /// Create the `ADMIN` user when the user table is empty. Returns whether
    /// a user was created.
    pub fn seed_default_admin(&self, conn: &rusqlite::Connection) -> Result<bool, CoreError> {
        if db::count_users(conn)? > 0 {
            return Ok(false);
        }
        let hash = hash_password(&self.config.admin_password, self.config.password_iterations);
        let id = db::insert_user(
            conn,
            DEFAULT_ADMIN_USERNAME,
            &hash,
            "Administrator",
            ADMINISTRATOR_ROLE_ID,
        )?;
        tracing::info!(user_id = id, username = DEFAULT_ADMIN_USERNAME, "Default administrator created");
        Ok(true)
    }
}
