use crate::api::GenerationClient;
use crate::compose::{origin_prompt, portrait_prompt, text_prompt};
use crate::config::Config;
use crate::db::models::{NewGeneration, NewPortrait};
use crate::db::{Account, GenerationRecord, LedgerReason, Portrait, PortraitSource, Storage};
use crate::error::ForgeError;
use crate::service::classifier::theme_threat;
use crate::service::ledger::CreditLedger;
use crate::service::reroll::{pick_real_name, rename_in_origin};
use crate::types::{Selection, Theme, Tier, VillainProfile};
use rand::Rng;
use rand::distributions::Alphanumeric;
use tracing::{info, warn};

const SHARE_TOKEN_LEN: usize = 24;

/// Credits charged per AI portrait.
pub const PORTRAIT_COST: i64 = 1;

/// A caller's generation request after parsing.
#[derive(Debug, Clone)]
pub struct VillainOrder {
    pub theme: Theme,
    pub power: Option<String>,
    pub tier: Tier,
    pub portrait: bool,
    pub upload_id: Option<i64>,
}

/// Generation pipeline: validate, write the profile, optionally paint, record.
#[derive(Clone)]
pub struct Forge {
    storage: Storage,
    ledger: CreditLedger,
    client: GenerationClient,
    uber_for_everyone: bool,
}

impl Forge {
    pub fn new(storage: Storage, client: GenerationClient, cfg: &Config) -> Self {
        Self {
            ledger: CreditLedger::new(storage.clone()),
            storage,
            client,
            uber_for_everyone: cfg.uber_enabled,
        }
    }

    pub fn ledger(&self) -> &CreditLedger {
        &self.ledger
    }

    pub fn uber_unlocked(&self, account: &Account) -> bool {
        account.uber_enabled || self.uber_for_everyone
    }

    pub async fn generate(
        &self,
        account: &Account,
        order: VillainOrder,
    ) -> Result<GenerationRecord, ForgeError> {
        let selection = Selection::resolve(
            order.theme,
            order.power.as_deref(),
            order.tier,
            self.uber_unlocked(account),
        )?;
        if order.portrait && order.upload_id.is_some() {
            return Err(ForgeError::InvalidSelection(
                "request either an AI portrait or an uploaded one, not both".to_string(),
            ));
        }

        let upload = match order.upload_id {
            Some(id) => Some(self.owned_upload(&account.email, id).await?),
            None => None,
        };
        // fail before paying for the text call; the debit below is still the real check
        if order.portrait && self.ledger.balance(&account.email).await? < PORTRAIT_COST {
            return Err(ForgeError::InsufficientCredit);
        }

        let prompt = text_prompt(&selection);
        let fixed_power = selection.power.map(|p| p.full());
        let mut profile = self
            .client
            .generate_text(&prompt, fixed_power.as_deref())
            .await?;
        profile.threat_level =
            theme_threat(selection.theme, profile.threat_level, &mut rand::thread_rng());

        let (portrait_id, painted) = if order.portrait {
            let id = self.paint(&account.email, &profile, selection.theme).await?;
            (Some(id), Some(id))
        } else {
            (upload.map(|p| p.id), None)
        };

        let record = self
            .record(
                NewGeneration {
                    owner_email: account.email.clone(),
                    theme: selection.theme,
                    selected_power: selection.power.map(|p| p.title.to_string()),
                    tier: selection.tier,
                    profile,
                    portrait_id,
                    derived_from: None,
                },
                painted,
            )
            .await?;
        info!(
            id = record.id,
            email = %account.email,
            theme = %record.theme,
            tier = record.tier.as_str(),
            portrait = ?record.portrait_id,
            "villain generated"
        );
        Ok(record)
    }

    /// New record with the same profile and a freshly painted AI portrait.
    pub async fn portrait_for(
        &self,
        account: &Account,
        record_id: i64,
    ) -> Result<GenerationRecord, ForgeError> {
        let base = self.owned_record(&account.email, record_id).await?;
        let portrait_id = self.paint(&account.email, &base.profile, base.theme).await?;
        let profile = base.profile.clone();
        self.derive(base, profile, Some(portrait_id), true).await
    }

    /// New record carrying one of the caller's uploaded portraits. Free.
    pub async fn attach_upload(
        &self,
        account: &Account,
        record_id: i64,
        portrait_id: i64,
    ) -> Result<GenerationRecord, ForgeError> {
        let base = self.owned_record(&account.email, record_id).await?;
        let upload = self.owned_upload(&account.email, portrait_id).await?;
        let profile = base.profile.clone();
        self.derive(base, profile, Some(upload.id), false).await
    }

    /// New record with a freshly drawn real name. Free.
    pub async fn reroll_name(
        &self,
        account: &Account,
        record_id: i64,
    ) -> Result<GenerationRecord, ForgeError> {
        let base = self.owned_record(&account.email, record_id).await?;
        let mut profile = base.profile.clone();
        let name = pick_real_name(profile.gender, &profile.name, &mut rand::thread_rng());
        profile.bio = rename_in_origin(&profile.bio, &profile.name, &name);
        profile.name = name;
        let portrait_id = base.portrait_id;
        self.derive(base, profile, portrait_id, false).await
    }

    /// New record with a regenerated origin. Costs one text call and no credit.
    pub async fn reroll_origin(
        &self,
        account: &Account,
        record_id: i64,
    ) -> Result<GenerationRecord, ForgeError> {
        let base = self.owned_record(&account.email, record_id).await?;
        let prompt = origin_prompt(&base.profile, base.theme);
        let mut profile = base.profile.clone();
        profile.bio = self.client.generate_origin(&prompt).await?;
        let portrait_id = base.portrait_id;
        self.derive(base, profile, portrait_id, false).await
    }

    /// Public share token for one of the caller's records; stable across calls.
    pub async fn share(&self, account: &Account, record_id: i64) -> Result<String, ForgeError> {
        let record = self.owned_record(&account.email, record_id).await?;
        let candidate: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SHARE_TOKEN_LEN)
            .map(char::from)
            .collect();
        let token = self.storage.ensure_share_token(record.id, &candidate).await?;
        info!(id = record.id, email = %account.email, "villain shared");
        Ok(token)
    }

    /// The record behind a share token and its portrait, if any.
    pub async fn shared(
        &self,
        token: &str,
    ) -> Result<(GenerationRecord, Option<Portrait>), ForgeError> {
        let Some(record) = self.storage.shared_generation(token.trim()).await? else {
            return Err(ForgeError::NotFound("shared villain"));
        };
        let portrait = match record.portrait_id {
            Some(id) => self.storage.get_portrait(id).await?,
            None => None,
        };
        Ok((record, portrait))
    }

    pub async fn history(
        &self,
        email: &str,
        limit: u32,
    ) -> Result<Vec<GenerationRecord>, ForgeError> {
        self.storage.list_generations(email, limit).await
    }

    pub async fn owned_record(&self, email: &str, id: i64) -> Result<GenerationRecord, ForgeError> {
        match self.storage.get_generation(id).await? {
            Some(record) if record.owner_email == email => Ok(record),
            _ => Err(ForgeError::NotFound("villain")),
        }
    }

    pub async fn owned_portrait(&self, email: &str, id: i64) -> Result<Portrait, ForgeError> {
        match self.storage.get_portrait(id).await? {
            Some(portrait) if portrait.owner_email == email => Ok(portrait),
            _ => Err(ForgeError::NotFound("portrait")),
        }
    }

    pub async fn store_upload(
        &self,
        email: &str,
        mime: &'static str,
        bytes: Vec<u8>,
    ) -> Result<i64, ForgeError> {
        let size = bytes.len();
        let id = self
            .storage
            .insert_portrait(NewPortrait {
                owner_email: email.to_string(),
                source: PortraitSource::Upload,
                mime: mime.to_string(),
                bytes,
                prompt: None,
            })
            .await?;
        info!(id, email, mime, size, "portrait uploaded");
        Ok(id)
    }

    async fn owned_upload(&self, email: &str, id: i64) -> Result<Portrait, ForgeError> {
        let portrait = self.owned_portrait(email, id).await?;
        if portrait.source != PortraitSource::Upload {
            return Err(ForgeError::InvalidSelection(format!(
                "portrait {id} is not an uploaded image"
            )));
        }
        Ok(portrait)
    }

    /// Debit, generate the image and store it. The credit is returned on any failure after the debit.
    async fn paint(
        &self,
        email: &str,
        profile: &VillainProfile,
        theme: Theme,
    ) -> Result<i64, ForgeError> {
        self.ledger
            .debit(email, PORTRAIT_COST, LedgerReason::Portrait)
            .await?;

        let prompt = portrait_prompt(profile, theme);
        let stored = match self.client.generate_image(&prompt).await {
            Ok(bytes) => {
                self.storage
                    .insert_portrait(NewPortrait {
                        owner_email: email.to_string(),
                        source: PortraitSource::Ai,
                        mime: "image/png".to_string(),
                        bytes,
                        prompt: Some(prompt),
                    })
                    .await
            }
            Err(e) => Err(e),
        };

        match stored {
            Ok(id) => Ok(id),
            Err(e) => {
                self.refund(email, &e).await?;
                Err(e)
            }
        }
    }

    async fn refund(&self, email: &str, cause: &ForgeError) -> Result<(), ForgeError> {
        warn!(email, error = %cause, "portrait failed, refunding credit");
        self.ledger
            .credit(email, PORTRAIT_COST, LedgerReason::Refund)
            .await?;
        Ok(())
    }

    /// Insert the record. When it carries a portrait painted for this request
    /// and the insert fails, the portrait is dropped and its credit refunded.
    async fn record(
        &self,
        generation: NewGeneration,
        painted: Option<i64>,
    ) -> Result<GenerationRecord, ForgeError> {
        let email = generation.owner_email.clone();
        match self.storage.insert_generation(generation).await {
            Ok(record) => Ok(record),
            Err(e) => {
                if let Some(portrait_id) = painted {
                    self.refund(&email, &e).await?;
                    self.storage.delete_portrait(portrait_id).await?;
                }
                Err(e)
            }
        }
    }

    async fn derive(
        &self,
        base: GenerationRecord,
        profile: VillainProfile,
        portrait_id: Option<i64>,
        painted: bool,
    ) -> Result<GenerationRecord, ForgeError> {
        let record = self
            .record(
                NewGeneration {
                    owner_email: base.owner_email,
                    theme: base.theme,
                    selected_power: base.selected_power,
                    tier: base.tier,
                    profile,
                    portrait_id,
                    derived_from: Some(base.id),
                },
                portrait_id.filter(|_| painted),
            )
            .await?;
        info!(id = record.id, derived_from = base.id, portrait = ?portrait_id, "villain re-issued");
        Ok(record)
    }
}
