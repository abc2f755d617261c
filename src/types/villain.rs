use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::LazyLock;

use crate::service::classifier::ThreatClassifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ThreatLevel {
    #[serde(rename = "Laughably Low")]
    LaughablyLow,
    Moderate,
    High,
    Extreme,
}

impl ThreatLevel {
    pub const ALL: [ThreatLevel; 4] = [
        ThreatLevel::LaughablyLow,
        ThreatLevel::Moderate,
        ThreatLevel::High,
        ThreatLevel::Extreme,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ThreatLevel::LaughablyLow => "Laughably Low",
            ThreatLevel::Moderate => "Moderate",
            ThreatLevel::High => "High",
            ThreatLevel::Extreme => "Extreme",
        }
    }

    /// Zero-based position on the threat meter.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Lenient parse of model output ("Laughable Low", "catastrophic", ...).
    pub fn normalize(raw: &str) -> Option<Self> {
        let s = raw.trim().to_ascii_lowercase();
        if s.starts_with("laugh") || s.starts_with("low") {
            Some(ThreatLevel::LaughablyLow)
        } else if s.starts_with("mod") {
            Some(ThreatLevel::Moderate)
        } else if s.starts_with("high") {
            Some(ThreatLevel::High)
        } else if s.starts_with("ext") || s.starts_with("cat") || s.starts_with("apoc") {
            Some(ThreatLevel::Extreme)
        } else {
            None
        }
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Nonbinary,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Nonbinary => "nonbinary",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            "nonbinary" | "non-binary" => Some(Gender::Nonbinary),
            _ => None,
        }
    }

    fn infer_from_origin(origin: &str) -> Option<Self> {
        let o = format!(" {} ", origin.to_ascii_lowercase());
        if o.contains(" she ") {
            Some(Gender::Female)
        } else if o.contains(" he ") {
            Some(Gender::Male)
        } else {
            None
        }
    }
}

/// A normalized villain profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VillainProfile {
    pub name: String,
    pub alias: String,
    pub power: String,
    pub weakness: String,
    pub nemesis: String,
    pub lair: String,
    pub catchphrase: String,
    pub crimes: Vec<String>,
    pub threat_level: ThreatLevel,
    pub faction: String,
    /// Origin story paragraph.
    pub bio: String,
    pub gender: Gender,
}

/// Loosely-typed profile as returned by the text model.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VillainDraft {
    pub gender: Option<String>,
    pub name: Option<String>,
    pub alias: Option<String>,
    pub power: Option<String>,
    pub weakness: Option<String>,
    pub nemesis: Option<String>,
    pub lair: Option<String>,
    pub catchphrase: Option<String>,
    pub crimes: Option<Crimes>,
    pub threat_level: Option<String>,
    pub faction: Option<String>,
    #[serde(alias = "bio")]
    pub origin: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Crimes {
    List(Vec<String>),
    One(String),
}

fn or_unknown(v: Option<String>) -> String {
    v.map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "Unknown".to_string())
}

impl VillainDraft {
    /// Parse model output, tolerating prose around the object and trailing commas.
    pub fn parse(raw: &str) -> Option<Self> {
        let value = coerce_json(raw)?;
        serde_json::from_value(value).ok()
    }

    pub fn into_profile(
        self,
        selected_power: Option<&str>,
        classifier: &dyn ThreatClassifier,
    ) -> VillainProfile {
        let bio = or_unknown(self.origin);
        let gender = self
            .gender
            .as_deref()
            .and_then(Gender::parse)
            .or_else(|| Gender::infer_from_origin(&bio))
            .unwrap_or(Gender::Nonbinary);

        let power = match selected_power {
            Some(p) => p.to_string(),
            None => or_unknown(self.power),
        };

        let threat_level = self
            .threat_level
            .as_deref()
            .and_then(ThreatLevel::normalize)
            .unwrap_or_else(|| classifier.classify(&power));

        let crimes = match self.crimes {
            Some(Crimes::List(items)) => items
                .into_iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
            Some(Crimes::One(c)) if !c.trim().is_empty() => vec![c.trim().to_string()],
            _ => Vec::new(),
        };

        VillainProfile {
            name: normalize_real_name(self.name.as_deref().unwrap_or_default()),
            alias: or_unknown(self.alias),
            power,
            weakness: or_unknown(self.weakness),
            nemesis: or_unknown(self.nemesis),
            lair: or_unknown(self.lair),
            catchphrase: or_unknown(self.catchphrase),
            crimes,
            threat_level,
            faction: or_unknown(self.faction),
            bio,
            gender,
        }
    }
}

static TITLE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(dr\.?|mr\.?|mrs\.?|ms\.?|mx\.?)\s+").expect("title regex"));
static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").expect("trailing comma regex"));

const FALLBACK_SURNAME: &str = "Reed";

/// Real names are exactly "First Last", capitalized, without honorifics.
pub fn normalize_real_name(name: &str) -> String {
    let stripped = TITLE_PREFIX.replace(name.trim(), "");
    let mut parts: Vec<String> = stripped
        .split_whitespace()
        .take(2)
        .map(capitalize)
        .collect();
    match parts.len() {
        0 => "Unknown Unknown".to_string(),
        1 => {
            parts.push(FALLBACK_SURNAME.to_string());
            parts.join(" ")
        }
        _ => parts.join(" "),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Best-effort extraction of a JSON object from model output.
pub fn coerce_json(raw: &str) -> Option<Value> {
    if let Ok(v) = serde_json::from_str::<Value>(raw)
        && v.is_object()
    {
        return Some(v);
    }
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    let candidate = TRAILING_COMMA.replace_all(&raw[start..=end], "$1");
    serde_json::from_str::<Value>(&candidate)
        .ok()
        .filter(Value::is_object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::classifier::KeywordThreatClassifier;

    #[test]
    fn real_names_are_two_capitalized_parts() {
        assert_eq!(normalize_real_name("dr. ELENA   voss"), "Elena Voss");
        assert_eq!(normalize_real_name("Mx quinn"), "Quinn Reed");
        assert_eq!(normalize_real_name("ava marie stone"), "Ava Marie");
        assert_eq!(normalize_real_name("   "), "Unknown Unknown");
    }

    #[test]
    fn threat_levels_normalize_leniently() {
        assert_eq!(ThreatLevel::normalize("Laughable Low"), Some(ThreatLevel::LaughablyLow));
        assert_eq!(ThreatLevel::normalize("catastrophic"), Some(ThreatLevel::Extreme));
        assert_eq!(ThreatLevel::normalize(" HIGH "), Some(ThreatLevel::High));
        assert_eq!(ThreatLevel::normalize("spicy"), None);
    }

    #[test]
    fn coerce_json_strips_prose_and_trailing_commas() {
        let raw = "Sure! Here it is:\n{\"name\": \"Ava Stone\", \"crimes\": [\"heist\",],}\nEnjoy.";
        let v = coerce_json(raw).unwrap();
        assert_eq!(v["name"], "Ava Stone");
        assert_eq!(v["crimes"][0], "heist");
        assert!(coerce_json("no json here").is_none());
    }

    #[test]
    fn draft_fills_gaps_and_falls_back_on_classifier() {
        let raw = r#"{"name":"mr. Bob","crimes":"stole the moon","threat_level":"???",
                      "power":"cosmic reality rewrite","origin":"One night she woke up changed."}"#;
        let draft = VillainDraft::parse(raw).unwrap();
        let profile = draft.into_profile(None, &KeywordThreatClassifier);
        assert_eq!(profile.name, "Bob Reed");
        assert_eq!(profile.crimes, vec!["stole the moon".to_string()]);
        assert_eq!(profile.threat_level, ThreatLevel::Extreme);
        assert_eq!(profile.gender, Gender::Female);
        assert_eq!(profile.alias, "Unknown");
    }

    #[test]
    fn selected_power_overrides_model_power() {
        let draft = VillainDraft::parse(r#"{"power":"something else","threat_level":"High"}"#)
            .unwrap();
        let profile = draft.into_profile(Some("Umbrakinesis"), &KeywordThreatClassifier);
        assert_eq!(profile.power, "Umbrakinesis");
        assert_eq!(profile.threat_level, ThreatLevel::High);
    }
}
