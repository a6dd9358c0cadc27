//! # Idempotency Ledger
//!
//! Exactly-once counter adjustments backed by PostgreSQL.
//!
//! Every adjustment request carries a caller-chosen key. The first delivery of
//! a key *claims* it and applies its effect; any later delivery of the same key
//! is a replay and changes nothing. A claimed key can be *reverted* once, which
//! undoes exactly the effect that was recorded for it. Reverting a key that was
//! never claimed leaves a tombstone, so an original delivery that arrives late
//! is still a no-op.
//!
//! All operations take a `&mut PgConnection` so they run inside the caller's
//! transaction, next to the row they protect:
//!
//! ```text
//! BEGIN
//!   claim(key)            -- INSERT ... ON CONFLICT DO NOTHING
//!   UPDATE posts ...      -- only when the claim is fresh
//!   record_effect(key, n) -- what was actually applied
//! COMMIT
//! ```
//!
//! If the protected row does not exist the caller rolls back and no ledger
//! row survives.
//!
//! ## Table
//!
//! ```sql
//! CREATE TABLE idempotency_keys (
//!     key        VARCHAR(255) PRIMARY KEY,
//!     scope      VARCHAR(255) NOT NULL,
//!     state      VARCHAR(16)  NOT NULL,  -- 'applied' | 'reverted'
//!     effect     BIGINT       NOT NULL DEFAULT 0,
//!     created_at TIMESTAMPTZ  NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ  NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! ## Retention
//!
//! Keys only need to outlive the retry window of their callers.
//! [`IdempotencyLedger::cleanup_expired`] removes keys older than the
//! configured retention and is meant to run from a periodic job.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use std::time::Duration;
use tracing::{debug, info};

mod error;

pub use error::{LedgerError, LedgerResult};

/// Maximum key length accepted (matches the column width)
pub const MAX_KEY_LEN: usize = 255;

/// State of a key in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Applied,
    Reverted,
}

impl KeyState {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyState::Applied => "applied",
            KeyState::Reverted => "reverted",
        }
    }

    fn parse(value: &str) -> Self {
        match value {
            "reverted" => KeyState::Reverted,
            _ => KeyState::Applied,
        }
    }
}

/// Outcome of [`IdempotencyLedger::claim`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// First delivery; the caller must apply the effect and record it
    Fresh,
    /// The key was seen before; the caller must not apply anything
    Replayed(KeyState),
}

/// Outcome of [`IdempotencyLedger::revert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Revert {
    /// The key was applied; the caller must undo `effect`
    Undo { effect: i64 },
    /// The key was never claimed; a tombstone now blocks it
    Tombstoned,
    /// The key was already reverted
    AlreadyReverted,
}

impl Revert {
    /// Amount the caller has to subtract from the protected counter
    pub fn effect_to_undo(&self) -> i64 {
        match self {
            Revert::Undo { effect } => *effect,
            Revert::Tombstoned | Revert::AlreadyReverted => 0,
        }
    }
}

/// A ledger row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LedgerEntry {
    pub key: String,
    pub scope: String,
    pub state: String,
    pub effect: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn key_state(&self) -> KeyState {
        KeyState::parse(&self.state)
    }
}

/// Idempotency ledger for counter adjustments
///
/// Cheap to clone; share it through `web::Data` or an `Arc`.
#[derive(Clone)]
pub struct IdempotencyLedger {
    pool: PgPool,
    retention: Duration,
}

impl IdempotencyLedger {
    pub fn new(pool: PgPool, retention: Duration) -> Self {
        Self { pool, retention }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Reject empty, blank or over-long keys
    pub fn validate_key(key: &str) -> LedgerResult<()> {
        if key.trim().is_empty() {
            return Err(LedgerError::InvalidKey(
                "idempotency key cannot be empty".to_string(),
            ));
        }

        if key.len() > MAX_KEY_LEN {
            return Err(LedgerError::InvalidKey(format!(
                "idempotency key too long: {} characters (max {})",
                key.len(),
                MAX_KEY_LEN
            )));
        }

        Ok(())
    }

    /// Claim `key` for `scope` inside the caller's transaction.
    ///
    /// A concurrent claim of the same key blocks on the primary key until the
    /// other transaction finishes, then observes its outcome.
    pub async fn claim(
        &self,
        conn: &mut PgConnection,
        key: &str,
        scope: &str,
    ) -> LedgerResult<Claim> {
        Self::validate_key(key)?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO idempotency_keys (key, scope, state, effect)
            VALUES ($1, $2, 'applied', 0)
            ON CONFLICT (key) DO NOTHING
            "#,
        )
        .bind(key)
        .bind(scope)
        .execute(&mut *conn)
        .await?
        .rows_affected()
            > 0;

        if inserted {
            debug!(key = %key, scope = %scope, "Idempotency key claimed");
            return Ok(Claim::Fresh);
        }

        let entry = self.fetch_for_update(conn, key).await?;
        let entry = match entry {
            Some(entry) => entry,
            // Purged between the insert attempt and the lookup; nothing to replay.
            None => return Ok(Claim::Replayed(KeyState::Reverted)),
        };
        Self::check_scope(&entry, key, scope)?;

        debug!(
            key = %key,
            scope = %scope,
            state = entry.key_state().as_str(),
            "Idempotency key replayed"
        );
        Ok(Claim::Replayed(entry.key_state()))
    }

    /// Record the effect actually applied for a freshly claimed key
    pub async fn record_effect(
        &self,
        conn: &mut PgConnection,
        key: &str,
        effect: i64,
    ) -> LedgerResult<()> {
        sqlx::query(
            r#"
            UPDATE idempotency_keys
            SET effect = $2, updated_at = NOW()
            WHERE key = $1 AND state = 'applied'
            "#,
        )
        .bind(key)
        .bind(effect)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Revert `key` inside the caller's transaction.
    ///
    /// The returned [`Revert`] tells the caller how much to undo; the ledger
    /// row is already marked reverted when this returns.
    pub async fn revert(
        &self,
        conn: &mut PgConnection,
        key: &str,
        scope: &str,
    ) -> LedgerResult<Revert> {
        Self::validate_key(key)?;

        let tombstoned = sqlx::query(
            r#"
            INSERT INTO idempotency_keys (key, scope, state, effect)
            VALUES ($1, $2, 'reverted', 0)
            ON CONFLICT (key) DO NOTHING
            "#,
        )
        .bind(key)
        .bind(scope)
        .execute(&mut *conn)
        .await?
        .rows_affected()
            > 0;

        if tombstoned {
            info!(key = %key, scope = %scope, "Idempotency key tombstoned before first delivery");
            return Ok(Revert::Tombstoned);
        }

        let entry = match self.fetch_for_update(conn, key).await? {
            Some(entry) => entry,
            None => return Ok(Revert::AlreadyReverted),
        };
        Self::check_scope(&entry, key, scope)?;

        if entry.key_state() == KeyState::Reverted {
            debug!(key = %key, "Idempotency key already reverted");
            return Ok(Revert::AlreadyReverted);
        }

        sqlx::query(
            r#"
            UPDATE idempotency_keys
            SET state = 'reverted', updated_at = NOW()
            WHERE key = $1
            "#,
        )
        .bind(key)
        .execute(&mut *conn)
        .await?;

        info!(key = %key, scope = %scope, effect = entry.effect, "Idempotency key reverted");
        Ok(Revert::Undo {
            effect: entry.effect,
        })
    }

    /// Look up a key without locking it
    pub async fn get(&self, key: &str) -> LedgerResult<Option<LedgerEntry>> {
        let entry = sqlx::query_as::<_, LedgerEntry>(
            r#"
            SELECT key, scope, state, effect, created_at, updated_at
            FROM idempotency_keys
            WHERE key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Delete keys older than the retention window. Returns the number removed.
    pub async fn cleanup_expired(&self) -> LedgerResult<u64> {
        let retention_secs = self.retention.as_secs() as i64;

        let result = sqlx::query(
            r#"
            DELETE FROM idempotency_keys
            WHERE created_at < NOW() - make_interval(secs => $1)
            "#,
        )
        .bind(retention_secs as f64)
        .execute(&self.pool)
        .await?;

        let deleted = result.rows_affected();
        if deleted > 0 {
            info!(
                deleted_count = deleted,
                retention_days = retention_secs / 86_400,
                "Purged expired idempotency keys"
            );
        }

        Ok(deleted)
    }

    async fn fetch_for_update(
        &self,
        conn: &mut PgConnection,
        key: &str,
    ) -> LedgerResult<Option<LedgerEntry>> {
        let entry = sqlx::query_as::<_, LedgerEntry>(
            r#"
            SELECT key, scope, state, effect, created_at, updated_at
            FROM idempotency_keys
            WHERE key = $1
            FOR UPDATE
            "#,
        )
        .bind(key)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(entry)
    }

    fn check_scope(entry: &LedgerEntry, key: &str, scope: &str) -> LedgerResult<()> {
        if entry.scope != scope {
            return Err(LedgerError::ScopeMismatch {
                key: key.to_string(),
                existing: entry.scope.clone(),
                requested: scope.to_string(),
            });
        }
        Ok(())
    }
}
