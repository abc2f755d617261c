use crate::config::Config;
use crate::db::{LedgerReason, Storage};
use crate::error::ForgeError;
use crate::service::ledger::CreditLedger;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{info, warn};

const EMAIL_KEYS: &[&str] = &[
    "payer_email",
    "email",
    "supporter_email",
    "payerEmail",
    "customer_email",
    "buyer_email",
];
const QUANTITY_KEYS: &[&str] = &["quantity", "qty", "count", "supports"];
const TITLE_KEYS: &[&str] = &["product_name", "title", "extra_title", "name"];
const MEMBERSHIP_KEYS: &[&str] = &["membership_name", "level_name", "plan_name", "membershipLevel"];
const COFFEE_KEYS: &[&str] = &["support_coffees", "coffees", "coffee", "coffee_count"];

const MAX_STORED_PAYLOAD: usize = 9000;
/// Largest quantity or coffee count a single payment may carry.
const MAX_UNITS: i64 = 10_000;

static TITLE_CREDITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(\d+)\s*credits?\b").expect("title credit regex"));

/// How many credits a supporter payload is worth, and why.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub membership: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shop: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coffees: Option<i64>,
}

impl Breakdown {
    /// `None` when the sum does not fit in an `i64`.
    pub fn total(&self) -> Option<i64> {
        [self.membership, self.shop, self.coffees]
            .into_iter()
            .flatten()
            .try_fold(0i64, i64::checked_add)
    }
}

#[derive(Debug, Serialize)]
pub struct SupportReceipt {
    pub ok: bool,
    pub email: String,
    pub added_credits: i64,
    pub breakdown: Breakdown,
}

/// The top-level object followed by its `data` object, if any.
fn candidates(payload: &Value) -> Vec<&Map<String, Value>> {
    let mut out = Vec::with_capacity(2);
    if let Some(obj) = payload.as_object() {
        out.push(obj);
        if let Some(data) = obj.get("data").and_then(Value::as_object) {
            out.push(data);
        }
    }
    out
}

enum Picked<'a> {
    Text(&'a str),
    Number(f64),
}

fn pick<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<Picked<'a>> {
    keys.iter().find_map(|k| match obj.get(*k)? {
        Value::String(s) if !s.trim().is_empty() => Some(Picked::Text(s.trim())),
        Value::Number(n) => n.as_f64().map(Picked::Number),
        _ => None,
    })
}

fn pick_text<'a>(payload: &'a Value, keys: &[&str]) -> Option<&'a str> {
    candidates(payload).into_iter().find_map(|obj| match pick(obj, keys)? {
        Picked::Text(s) => Some(s),
        Picked::Number(_) => None,
    })
}

fn pick_count(payload: &Value, keys: &[&str]) -> Option<f64> {
    candidates(payload).into_iter().find_map(|obj| match pick(obj, keys)? {
        Picked::Text(s) => s.parse().ok(),
        Picked::Number(n) => Some(n),
    })
}

fn out_of_range(what: String) -> ForgeError {
    ForgeError::Unprocessable(format!("{what} is out of range"))
}

/// A quantity-like field, or `default` when absent. Must lie in `0..=MAX_UNITS`.
fn units(raw: Option<f64>, field: &str, default: i64) -> Result<i64, ForgeError> {
    match raw {
        None => Ok(default),
        Some(n) if n.is_finite() && (0.0..=MAX_UNITS as f64).contains(&n) => Ok(n as i64),
        Some(n) => Err(out_of_range(format!("{field} {n}"))),
    }
}

pub fn extract_email(payload: &Value) -> Option<String> {
    candidates(payload).into_iter().find_map(|obj| match pick(obj, EMAIL_KEYS)? {
        Picked::Text(s) if s.contains('@') => Some(s.to_lowercase()),
        _ => None,
    })
}

fn lookup(map: &HashMap<String, u32>, key: &str) -> Option<i64> {
    map.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key.trim()))
        .map(|(_, v)| i64::from(*v))
}

fn shop_credits(cfg: &Config, title: &str, quantity: i64) -> Result<Option<i64>, ForgeError> {
    let quantity = quantity.max(1);
    let per_item = match lookup(&cfg.shop_credits, title) {
        Some(per_item) => per_item,
        None => {
            let Some(caps) = TITLE_CREDITS.captures(title) else {
                return Ok(None);
            };
            caps[1]
                .parse::<i64>()
                .map_err(|_| out_of_range(format!("title credit count `{}`", &caps[1])))?
        }
    };
    per_item
        .checked_mul(quantity)
        .map(Some)
        .ok_or_else(|| out_of_range(format!("{per_item} credits x {quantity}")))
}

/// Apply the membership, shop and coffee rules to a payload.
///
/// Fails with `Unprocessable` when a count or the resulting total is out of range.
pub fn assess(payload: &Value, cfg: &Config) -> Result<Breakdown, ForgeError> {
    let title = pick_text(payload, TITLE_KEYS);
    let title_is_membership = title.is_some_and(|t| lookup(&cfg.membership_credits, t).is_some());

    let mut breakdown = Breakdown::default();

    let membership_name = pick_text(payload, MEMBERSHIP_KEYS)
        .or(if title_is_membership { title } else { None });
    if let Some(name) = membership_name {
        breakdown.membership = lookup(&cfg.membership_credits, name).filter(|c| *c > 0);
    }

    if let Some(t) = title
        && !title_is_membership
    {
        let qty = units(pick_count(payload, QUANTITY_KEYS), "quantity", 1)?;
        breakdown.shop = shop_credits(cfg, t, qty)?.filter(|c| *c > 0);
    }

    let mut coffees = units(pick_count(payload, COFFEE_KEYS), "coffees", 0)?;
    if coffees == 0 && title.is_some_and(|t| t.to_lowercase().contains("coffee")) {
        coffees = units(pick_count(payload, QUANTITY_KEYS), "quantity", 1)?;
    }
    if coffees > 0 && cfg.credits_per_coffee > 0 {
        // MAX_UNITS * u32::MAX fits in an i64
        breakdown.coffees = Some(coffees * i64::from(cfg.credits_per_coffee));
    }

    if breakdown.total().is_none() {
        return Err(out_of_range("credit total".to_string()));
    }
    Ok(breakdown)
}

fn truncate_payload(raw: &str) -> String {
    if raw.chars().count() <= MAX_STORED_PAYLOAD {
        return raw.to_string();
    }
    let head: String = raw.chars().take(MAX_STORED_PAYLOAD).collect();
    format!("{head}...(truncated)")
}

/// Turns supporter webhooks into credits and keeps an audit trail.
#[derive(Clone)]
pub struct SupportDesk {
    storage: Storage,
    ledger: CreditLedger,
}

impl SupportDesk {
    pub fn new(storage: Storage) -> Self {
        Self {
            ledger: CreditLedger::new(storage.clone()),
            storage,
        }
    }

    pub async fn handle(&self, raw: &str, cfg: &Config) -> Result<SupportReceipt, ForgeError> {
        let payload: Value = if raw.trim().is_empty() {
            Value::Object(Map::new())
        } else {
            serde_json::from_str(raw).unwrap_or_else(|_| serde_json::json!({ "raw": raw }))
        };
        let stored = truncate_payload(raw);

        let Some(email) = extract_email(&payload) else {
            warn!("support webhook without payer email");
            self.storage
                .record_support_event("ignored_no_email", None, 0, &stored)
                .await?;
            return Err(ForgeError::Unprocessable(
                "No email in payload".to_string(),
            ));
        };

        let breakdown = match assess(&payload, cfg) {
            Ok(breakdown) => breakdown,
            Err(e) => {
                warn!(email = %email, error = %e, "support webhook rejected");
                self.storage
                    .record_support_event("rejected_out_of_range", Some(&email), 0, &stored)
                    .await?;
                return Err(e);
            }
        };
        let total = breakdown.total().unwrap_or_default();
        if total > 0 {
            self.ledger
                .credit(&email, total, LedgerReason::TopUp)
                .await?;
            self.storage
                .record_support_event("credited", Some(&email), total, &stored)
                .await?;
            info!(email = %email, total, ?breakdown, "supporter credited");
        } else {
            self.storage
                .record_support_event("ignored_unhandled", Some(&email), 0, &stored)
                .await?;
            info!(email = %email, "support webhook matched no credit rule");
        }

        Ok(SupportReceipt {
            ok: true,
            email,
            added_credits: total,
            breakdown,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cfg() -> Config {
        let mut cfg = Config::default();
        cfg.membership_credits.insert("Shadow Boss".to_string(), 300);
        cfg.shop_credits.insert("Villain Starter Pack".to_string(), 25);
        cfg.credits_per_coffee = 5;
        cfg
    }

    #[test]
    fn email_found_in_nested_data() {
        let payload = json!({ "type": "donation", "data": { "supporter_email": "Fan@Mail.com" } });
        assert_eq!(extract_email(&payload).as_deref(), Some("fan@mail.com"));
        assert_eq!(extract_email(&json!({ "email": "nobody" })), None);
    }

    #[test]
    fn membership_matched_case_insensitively() {
        let b = assess(&json!({ "membership_name": "shadow boss" }), &cfg()).unwrap();
        assert_eq!(b.membership, Some(300));
        assert_eq!(b.total(), Some(300));
    }

    #[test]
    fn membership_title_is_not_counted_as_shop_item() {
        let b = assess(&json!({ "data": { "title": "Shadow Boss" } }), &cfg()).unwrap();
        assert_eq!(b.membership, Some(300));
        assert_eq!(b.shop, None);
    }

    #[test]
    fn shop_titles_use_table_then_leading_count() {
        let cfg = cfg();
        let b = assess(&json!({ "title": "Villain Starter Pack", "quantity": 2 }), &cfg).unwrap();
        assert_eq!(b.shop, Some(50));

        let b = assess(&json!({ "product_name": "10 Credits bundle", "qty": "3" }), &cfg).unwrap();
        assert_eq!(b.shop, Some(30));

        let b = assess(&json!({ "title": "Sticker" }), &cfg).unwrap();
        assert_eq!(b.total(), Some(0));
    }

    #[test]
    fn coffees_need_a_configured_rate() {
        let b = assess(&json!({ "support_coffees": 3 }), &cfg()).unwrap();
        assert_eq!(b.coffees, Some(15));

        let b = assess(&json!({ "support_coffees": 3 }), &Config::default()).unwrap();
        assert_eq!(b.coffees, None);
    }

    #[test]
    fn huge_counts_are_rejected_instead_of_overflowing() {
        let cfg = cfg();
        let err = assess(&json!({ "email": "a@b.c", "support_coffees": 1e19 }), &cfg).unwrap_err();
        assert!(matches!(err, ForgeError::Unprocessable(_)));

        let err = assess(
            &json!({ "title": "9223372036854775807 credits", "quantity": 2 }),
            &Config::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ForgeError::Unprocessable(_)));

        let err = assess(&json!({ "title": "99999999999999999999 credits" }), &cfg).unwrap_err();
        assert!(matches!(err, ForgeError::Unprocessable(_)));

        for bad in [json!(-1), json!("NaN"), json!(10_001)] {
            let err = assess(&json!({ "title": "Villain Starter Pack", "quantity": bad }), &cfg);
            assert!(err.is_err(), "quantity {bad} should be rejected");
        }
    }

    #[test]
    fn totals_that_do_not_fit_are_rejected() {
        let mut cfg = cfg();
        let b = Breakdown {
            membership: Some(1),
            shop: Some(i64::MAX),
            coffees: None,
        };
        assert_eq!(b.total(), None);

        cfg.membership_credits.insert("Overlord".to_string(), 10);
        let err = assess(
            &json!({ "membership_name": "Overlord", "title": "9223372036854775807 credits" }),
            &cfg,
        )
        .unwrap_err();
        assert!(matches!(err, ForgeError::Unprocessable(_)));
    }

    #[test]
    fn long_payloads_are_truncated() {
        let raw = "x".repeat(MAX_STORED_PAYLOAD + 10);
        let stored = truncate_payload(&raw);
        assert!(stored.ends_with("...(truncated)"));
        assert_eq!(stored.len(), MAX_STORED_PAYLOAD + "...(truncated)".len());
    }
}
