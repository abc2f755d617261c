use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::ForgeError;
use crate::types::{Theme, Tier, VillainProfile};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Account {
    pub email: String,
    pub verified: bool,
    pub credits: i64,
    pub uber_enabled: bool,
    pub created_at: DateTime<Utc>,
}

/// Pending one-time code. Timestamps are unix seconds.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct SessionRow {
    pub id: i64,
    pub email: String,
    pub code: String,
    pub attempts: i64,
    pub created_at: i64,
    pub expires_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortraitSource {
    Ai,
    Upload,
}

impl PortraitSource {
    pub fn as_str(self) -> &'static str {
        match self {
            PortraitSource::Ai => "ai",
            PortraitSource::Upload => "upload",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "ai" => Some(PortraitSource::Ai),
            "upload" => Some(PortraitSource::Upload),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portrait {
    pub id: i64,
    pub owner_email: String,
    pub source: PortraitSource,
    pub mime: String,
    pub bytes: Vec<u8>,
    pub prompt: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPortrait {
    pub owner_email: String,
    pub source: PortraitSource,
    pub mime: String,
    pub bytes: Vec<u8>,
    pub prompt: Option<String>,
}

/// A completed generation. Never updated after insert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRecord {
    pub id: i64,
    pub owner_email: String,
    pub theme: Theme,
    pub selected_power: Option<String>,
    pub tier: Tier,
    pub profile: VillainProfile,
    pub portrait_id: Option<i64>,
    pub derived_from: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewGeneration {
    pub owner_email: String,
    pub theme: Theme,
    pub selected_power: Option<String>,
    pub tier: Tier,
    pub profile: VillainProfile,
    pub portrait_id: Option<i64>,
    pub derived_from: Option<i64>,
}

#[derive(Debug, FromRow)]
pub(super) struct GenerationRow {
    pub id: i64,
    pub owner_email: String,
    pub theme: String,
    pub selected_power: Option<String>,
    pub tier: String,
    pub profile: String,
    pub portrait_id: Option<i64>,
    pub derived_from: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<GenerationRow> for GenerationRecord {
    type Error = ForgeError;

    fn try_from(row: GenerationRow) -> Result<Self, Self::Error> {
        let decode = |e: ForgeError| ForgeError::DatabaseError(sqlx::Error::Decode(Box::new(e)));
        Ok(GenerationRecord {
            id: row.id,
            owner_email: row.owner_email,
            theme: row.theme.parse().map_err(decode)?,
            selected_power: row.selected_power,
            tier: row.tier.parse().map_err(decode)?,
            profile: serde_json::from_str(&row.profile)?,
            portrait_id: row.portrait_id,
            derived_from: row.derived_from,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerReason {
    Signup,
    Portrait,
    Refund,
    TopUp,
    Admin,
}

impl LedgerReason {
    pub fn as_str(self) -> &'static str {
        match self {
            LedgerReason::Signup => "signup",
            LedgerReason::Portrait => "portrait",
            LedgerReason::Refund => "refund",
            LedgerReason::TopUp => "top_up",
            LedgerReason::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct LedgerEntry {
    pub id: i64,
    pub email: String,
    pub delta: i64,
    pub reason: String,
    pub balance_after: i64,
    pub created_at: DateTime<Utc>,
}
