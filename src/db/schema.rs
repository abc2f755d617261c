//! SQL DDL for initializing the villain store.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema:
/// - `accounts` keyed by normalized email; `credits` guarded by a CHECK
/// - `sessions` one-time sign-in codes, deleted on success
/// - `portraits` image blobs (AI or uploaded)
/// - `generations` insert-only villain records
/// - `ledger` one row per credit movement
/// - `support_events` webhook audit trail
/// - `shares` public share tokens, at most one per generation
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    email TEXT PRIMARY KEY NOT NULL,
    verified INTEGER NOT NULL DEFAULT 0,
    credits INTEGER NOT NULL DEFAULT 0 CHECK (credits >= 0),
    uber_enabled INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL -- RFC3339
);

CREATE TABLE IF NOT EXISTS sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL,
    code TEXT NOT NULL,
    attempts INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL, -- unix seconds
    expires_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sessions_email ON sessions(email);

CREATE TABLE IF NOT EXISTS portraits (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_email TEXT NOT NULL REFERENCES accounts(email),
    source TEXT NOT NULL, -- 'ai' | 'upload'
    mime TEXT NOT NULL,
    bytes BLOB NOT NULL,
    prompt TEXT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS generations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_email TEXT NOT NULL REFERENCES accounts(email),
    theme TEXT NOT NULL,
    selected_power TEXT NULL,
    tier TEXT NOT NULL,
    profile TEXT NOT NULL, -- JSON VillainProfile
    threat_level TEXT NOT NULL,
    portrait_id INTEGER NULL REFERENCES portraits(id),
    derived_from INTEGER NULL REFERENCES generations(id),
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_generations_owner ON generations(owner_email, id);

CREATE TABLE IF NOT EXISTS ledger (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL,
    delta INTEGER NOT NULL,
    reason TEXT NOT NULL,
    balance_after INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_ledger_email ON ledger(email, id);

CREATE TABLE IF NOT EXISTS support_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    status TEXT NOT NULL,
    email TEXT NULL,
    added_credits INTEGER NOT NULL,
    raw_payload TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS shares (
    token TEXT PRIMARY KEY NOT NULL,
    generation_id INTEGER NOT NULL UNIQUE REFERENCES generations(id),
    created_at TEXT NOT NULL
);
"#;
