use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::compose::catalog::{self, PowerDef};
use crate::error::ForgeError;

/// Villain themes offered by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    Dark,
    Funny,
    SciFi,
    Mythic,
    Chaotic,
    Satirical,
    Cyberpunk,
}

impl Theme {
    pub const ALL: [Theme; 7] = [
        Theme::Dark,
        Theme::Funny,
        Theme::SciFi,
        Theme::Mythic,
        Theme::Chaotic,
        Theme::Satirical,
        Theme::Cyberpunk,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Funny => "funny",
            Theme::SciFi => "sci-fi",
            Theme::Mythic => "mythic",
            Theme::Chaotic => "chaotic",
            Theme::Satirical => "satirical",
            Theme::Cyberpunk => "cyberpunk",
        }
    }

    /// Themes only reachable on the Uber tier.
    pub fn is_uber(self) -> bool {
        matches!(self, Theme::Chaotic | Theme::Satirical | Theme::Cyberpunk)
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        let key = match key.as_str() {
            "scifi" | "sci fi" | "sci_fi" => "sci-fi",
            other => other,
        };
        Theme::ALL
            .into_iter()
            .find(|t| t.as_str() == key)
            .ok_or_else(|| ForgeError::InvalidSelection(format!("unknown theme `{}`", s.trim())))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Standard,
    Uber,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Standard => "standard",
            Tier::Uber => "uber",
        }
    }
}

impl FromStr for Tier {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "" => Ok(Tier::Standard),
            "uber" => Ok(Tier::Uber),
            other => Err(ForgeError::InvalidSelection(format!("unknown tier `{other}`"))),
        }
    }
}

/// A validated theme/power/tier combination.
#[derive(Debug, Clone, Copy)]
pub struct Selection {
    pub theme: Theme,
    pub power: Option<&'static PowerDef>,
    pub tier: Tier,
}

impl Selection {
    /// Check a raw choice against the fixed option set.
    ///
    /// `uber_unlocked` is whether the caller may use the Uber tier at all.
    pub fn resolve(
        theme: Theme,
        power: Option<&str>,
        tier: Tier,
        uber_unlocked: bool,
    ) -> Result<Self, ForgeError> {
        if tier == Tier::Uber && !uber_unlocked {
            return Err(ForgeError::InvalidSelection(
                "the Uber tier is not enabled for this account".to_string(),
            ));
        }
        if theme.is_uber() && tier != Tier::Uber {
            return Err(ForgeError::InvalidSelection(format!(
                "theme `{theme}` requires the Uber tier"
            )));
        }

        let power = match power.map(str::trim).filter(|p| !p.is_empty()) {
            None => None,
            Some(wanted) => {
                let def = catalog::find_power(theme, wanted).ok_or_else(|| {
                    ForgeError::InvalidSelection(format!(
                        "power `{wanted}` is not available for theme `{theme}`"
                    ))
                })?;
                if def.uber && tier != Tier::Uber {
                    return Err(ForgeError::InvalidSelection(format!(
                        "power `{}` requires the Uber tier",
                        def.title
                    )));
                }
                Some(def)
            }
        };

        Ok(Self { theme, power, tier })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_parsing_accepts_aliases() {
        assert_eq!("Sci-Fi".parse::<Theme>().unwrap(), Theme::SciFi);
        assert_eq!(" scifi ".parse::<Theme>().unwrap(), Theme::SciFi);
        assert!("epic".parse::<Theme>().is_err());
    }

    #[test]
    fn uber_theme_needs_uber_tier() {
        let err = Selection::resolve(Theme::Cyberpunk, None, Tier::Standard, true).unwrap_err();
        assert!(matches!(err, ForgeError::InvalidSelection(_)));

        let ok = Selection::resolve(Theme::Cyberpunk, None, Tier::Uber, true).unwrap();
        assert_eq!(ok.theme, Theme::Cyberpunk);
    }

    #[test]
    fn locked_accounts_cannot_pick_uber() {
        let err = Selection::resolve(Theme::Dark, None, Tier::Uber, false).unwrap_err();
        assert!(matches!(err, ForgeError::InvalidSelection(_)));
    }

    #[test]
    fn power_must_belong_to_theme() {
        let sel = Selection::resolve(Theme::Dark, Some("umbrakinesis"), Tier::Standard, false)
            .unwrap();
        assert_eq!(sel.power.unwrap().title, "Umbrakinesis");

        let err = Selection::resolve(Theme::Dark, Some("Banana Slipstream"), Tier::Standard, false)
            .unwrap_err();
        assert!(matches!(err, ForgeError::InvalidSelection(_)));
    }

    #[test]
    fn uber_power_rejected_on_standard_tier() {
        let uber_power = catalog::powers(Theme::Dark)
            .iter()
            .find(|p| p.uber)
            .expect("dark pool has an Uber power");
        let err = Selection::resolve(Theme::Dark, Some(uber_power.title), Tier::Standard, true)
            .unwrap_err();
        assert!(matches!(err, ForgeError::InvalidSelection(_)));
    }
}
