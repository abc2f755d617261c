use crate::db::models::{
    Account, GenerationRecord, GenerationRow, LedgerEntry, LedgerReason, NewGeneration,
    NewPortrait, Portrait, PortraitSource, SessionRow,
};
use crate::db::schema::SQLITE_INIT;
use crate::error::ForgeError;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite, SqliteConnection};
use std::str::FromStr;

pub type SqlitePool = Pool<Sqlite>;

/// Persistent store for accounts, sessions, portraits, generations and the ledger.
///
/// Cheap to clone; handed to the router state instead of living in a global.
#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

const GENERATION_COLUMNS: &str = "id, owner_email, theme, selected_power, tier, profile, \
     portrait_id, derived_from, created_at";

impl Storage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `database_url` and apply the schema.
    pub async fn connect(database_url: &str) -> Result<Self, ForgeError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new().connect_with(connect_opts).await?;
        let storage = Self::new(pool);
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), ForgeError> {
        // sqlx::query runs a single statement at a time
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    // ---- accounts ----

    pub async fn get_account(&self, email: &str) -> Result<Option<Account>, ForgeError> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT email, verified, credits, uber_enabled, created_at FROM accounts WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    /// Load the account, creating it with `signup_credits` when absent.
    /// Returns the account and whether it was created by this call.
    pub async fn ensure_account(
        &self,
        email: &str,
        signup_credits: i64,
        verified: bool,
    ) -> Result<(Account, bool), ForgeError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let inserted = sqlx::query(
            r#"INSERT INTO accounts (email, verified, credits, uber_enabled, created_at)
               VALUES (?, ?, ?, 0, ?)
               ON CONFLICT(email) DO NOTHING"#,
        )
        .bind(email)
        .bind(verified)
        .bind(signup_credits.max(0))
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        if inserted && signup_credits > 0 {
            insert_ledger(&mut tx, email, signup_credits, LedgerReason::Signup, signup_credits)
                .await?;
        }
        if !inserted && verified {
            sqlx::query("UPDATE accounts SET verified = 1 WHERE email = ?")
                .bind(email)
                .execute(&mut *tx)
                .await?;
        }

        let account = sqlx::query_as::<_, Account>(
            "SELECT email, verified, credits, uber_enabled, created_at FROM accounts WHERE email = ?",
        )
        .bind(email)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((account, inserted))
    }

    /// Returns false when the account does not exist.
    pub async fn set_uber_enabled(&self, email: &str, enabled: bool) -> Result<bool, ForgeError> {
        let res = sqlx::query("UPDATE accounts SET uber_enabled = ? WHERE email = ?")
            .bind(enabled)
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() == 1)
    }

    // ---- ledger ----

    /// Conditional decrement. `None` when the account is unknown or the
    /// balance is below `amount`; the balance is left untouched in that case.
    pub async fn debit(
        &self,
        email: &str,
        amount: i64,
        reason: LedgerReason,
    ) -> Result<Option<i64>, ForgeError> {
        let mut tx = self.pool.begin().await?;
        let row: Option<(i64,)> = sqlx::query_as(
            "UPDATE accounts SET credits = credits - ? WHERE email = ? AND credits >= ? RETURNING credits",
        )
        .bind(amount)
        .bind(email)
        .bind(amount)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((balance,)) = row else {
            tx.rollback().await?;
            return Ok(None);
        };
        insert_ledger(&mut tx, email, -amount, reason, balance).await?;
        tx.commit().await?;
        Ok(Some(balance))
    }

    /// Increment, creating an unverified account for unknown emails.
    pub async fn credit(
        &self,
        email: &str,
        amount: i64,
        reason: LedgerReason,
    ) -> Result<i64, ForgeError> {
        let mut tx = self.pool.begin().await?;
        let (balance,): (i64,) = sqlx::query_as(
            r#"INSERT INTO accounts (email, verified, credits, uber_enabled, created_at)
               VALUES (?, 0, ?, 0, ?)
               ON CONFLICT(email) DO UPDATE SET credits = credits + excluded.credits
               RETURNING credits"#,
        )
        .bind(email)
        .bind(amount)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;
        insert_ledger(&mut tx, email, amount, reason, balance).await?;
        tx.commit().await?;
        Ok(balance)
    }

    /// Apply a signed delta, clamping the balance at zero.
    pub async fn adjust(&self, email: &str, delta: i64) -> Result<i64, ForgeError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"INSERT INTO accounts (email, verified, credits, uber_enabled, created_at)
               VALUES (?, 0, 0, 0, ?)
               ON CONFLICT(email) DO NOTHING"#,
        )
        .bind(email)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let (current,): (i64,) = sqlx::query_as("SELECT credits FROM accounts WHERE email = ?")
            .bind(email)
            .fetch_one(&mut *tx)
            .await?;
        let next = current.saturating_add(delta).max(0);

        sqlx::query("UPDATE accounts SET credits = ? WHERE email = ?")
            .bind(next)
            .bind(email)
            .execute(&mut *tx)
            .await?;
        if next != current {
            insert_ledger(&mut tx, email, next - current, LedgerReason::Admin, next).await?;
        }
        tx.commit().await?;
        Ok(next)
    }

    pub async fn ledger_for(&self, email: &str) -> Result<Vec<LedgerEntry>, ForgeError> {
        let rows = sqlx::query_as::<_, LedgerEntry>(
            r#"SELECT id, email, delta, reason, balance_after, created_at
               FROM ledger WHERE email = ? ORDER BY id"#,
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ---- sessions ----

    pub async fn insert_session(
        &self,
        email: &str,
        code: &str,
        created_at: i64,
        expires_at: i64,
    ) -> Result<i64, ForgeError> {
        let res = sqlx::query(
            "INSERT INTO sessions (email, code, attempts, created_at, expires_at) VALUES (?, ?, 0, ?, ?)",
        )
        .bind(email)
        .bind(code)
        .bind(created_at)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(res.last_insert_rowid())
    }

    /// Delete sessions whose expiry is at or before `now`.
    pub async fn purge_expired_sessions(&self, now: i64) -> Result<u64, ForgeError> {
        let res = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    /// Newest unexpired session for the email.
    pub async fn latest_active_session(
        &self,
        email: &str,
        now: i64,
    ) -> Result<Option<SessionRow>, ForgeError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"SELECT id, email, code, attempts, created_at, expires_at
               FROM sessions WHERE email = ? AND expires_at > ?
               ORDER BY created_at DESC, id DESC LIMIT 1"#,
        )
        .bind(email)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn bump_session_attempts(&self, id: i64) -> Result<(), ForgeError> {
        sqlx::query("UPDATE sessions SET attempts = attempts + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_sessions_for(&self, email: &str) -> Result<(), ForgeError> {
        sqlx::query("DELETE FROM sessions WHERE email = ?")
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ---- portraits ----

    pub async fn insert_portrait(&self, portrait: NewPortrait) -> Result<i64, ForgeError> {
        let res = sqlx::query(
            r#"INSERT INTO portraits (owner_email, source, mime, bytes, prompt, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(portrait.owner_email)
        .bind(portrait.source.as_str())
        .bind(portrait.mime)
        .bind(portrait.bytes)
        .bind(portrait.prompt)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(res.last_insert_rowid())
    }

    /// Remove a portrait no record refers to yet.
    pub async fn delete_portrait(&self, id: i64) -> Result<(), ForgeError> {
        sqlx::query("DELETE FROM portraits WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_portrait(&self, id: i64) -> Result<Option<Portrait>, ForgeError> {
        let row = sqlx::query(
            r#"SELECT id, owner_email, source, mime, bytes, prompt, created_at
               FROM portraits WHERE id = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_portrait).transpose()
    }

    // ---- generations ----

    pub async fn insert_generation(
        &self,
        generation: NewGeneration,
    ) -> Result<GenerationRecord, ForgeError> {
        let profile_json = serde_json::to_string(&generation.profile)?;
        let created_at = Utc::now();
        let res = sqlx::query(
            r#"INSERT INTO generations (
                   owner_email, theme, selected_power, tier, profile, threat_level,
                   portrait_id, derived_from, created_at
               ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&generation.owner_email)
        .bind(generation.theme.as_str())
        .bind(&generation.selected_power)
        .bind(generation.tier.as_str())
        .bind(profile_json)
        .bind(generation.profile.threat_level.as_str())
        .bind(generation.portrait_id)
        .bind(generation.derived_from)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(GenerationRecord {
            id: res.last_insert_rowid(),
            owner_email: generation.owner_email,
            theme: generation.theme,
            selected_power: generation.selected_power,
            tier: generation.tier,
            profile: generation.profile,
            portrait_id: generation.portrait_id,
            derived_from: generation.derived_from,
            created_at,
        })
    }

    pub async fn get_generation(&self, id: i64) -> Result<Option<GenerationRecord>, ForgeError> {
        let row = sqlx::query_as::<_, GenerationRow>(&format!(
            "SELECT {GENERATION_COLUMNS} FROM generations WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(GenerationRecord::try_from).transpose()
    }

    /// Newest first.
    pub async fn list_generations(
        &self,
        owner_email: &str,
        limit: u32,
    ) -> Result<Vec<GenerationRecord>, ForgeError> {
        let rows = sqlx::query_as::<_, GenerationRow>(&format!(
            "SELECT {GENERATION_COLUMNS} FROM generations WHERE owner_email = ? ORDER BY id DESC LIMIT ?"
        ))
        .bind(owner_email)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(GenerationRecord::try_from).collect()
    }

    // ---- shares ----

    /// The record's share token, storing `candidate` when it has none yet.
    pub async fn ensure_share_token(
        &self,
        generation_id: i64,
        candidate: &str,
    ) -> Result<String, ForgeError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"INSERT INTO shares (token, generation_id, created_at) VALUES (?, ?, ?)
               ON CONFLICT(generation_id) DO NOTHING"#,
        )
        .bind(candidate)
        .bind(generation_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
        let (token,): (String,) =
            sqlx::query_as("SELECT token FROM shares WHERE generation_id = ?")
                .bind(generation_id)
                .fetch_one(&mut *tx)
                .await?;
        tx.commit().await?;
        Ok(token)
    }

    pub async fn shared_generation(
        &self,
        token: &str,
    ) -> Result<Option<GenerationRecord>, ForgeError> {
        let row = sqlx::query_as::<_, GenerationRow>(&format!(
            "SELECT {GENERATION_COLUMNS} FROM generations \
             WHERE id = (SELECT generation_id FROM shares WHERE token = ?)"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        row.map(GenerationRecord::try_from).transpose()
    }

    // ---- support webhook audit ----

    pub async fn record_support_event(
        &self,
        status: &str,
        email: Option<&str>,
        added_credits: i64,
        raw_payload: &str,
    ) -> Result<(), ForgeError> {
        sqlx::query(
            r#"INSERT INTO support_events (status, email, added_credits, raw_payload, created_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(status)
        .bind(email)
        .bind(added_credits)
        .bind(raw_payload)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn row_to_portrait(row: SqliteRow) -> Result<Portrait, ForgeError> {
        let source_str: String = row.try_get("source")?;
        let source = PortraitSource::parse(&source_str).ok_or_else(|| {
            sqlx::Error::Decode(format!("unknown portrait source `{source_str}`").into())
        })?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        Ok(Portrait {
            id: row.try_get("id")?,
            owner_email: row.try_get("owner_email")?,
            source,
            mime: row.try_get("mime")?,
            bytes: row.try_get("bytes")?,
            prompt: row.try_get("prompt")?,
            created_at,
        })
    }
}

async fn insert_ledger(
    conn: &mut SqliteConnection,
    email: &str,
    delta: i64,
    reason: LedgerReason,
    balance_after: i64,
) -> Result<(), ForgeError> {
    sqlx::query(
        r#"INSERT INTO ledger (email, delta, reason, balance_after, created_at)
           VALUES (?, ?, ?, ?, ?)"#,
    )
    .bind(email)
    .bind(delta)
    .bind(reason.as_str())
    .bind(balance_after)
    .bind(Utc::now())
    .execute(conn)
    .await?;
    Ok(())
}
