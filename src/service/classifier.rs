use crate::compose::catalog;
use crate::types::{Theme, ThreatLevel};
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};

/// Derives a threat level from a power description.
pub trait ThreatClassifier: Send + Sync {
    fn classify(&self, power: &str) -> ThreatLevel;
}

/// Keyword table; later (more dangerous) levels win when several match.
const THREAT_KEYWORDS: &[(ThreatLevel, &[&str])] = &[
    (
        ThreatLevel::LaughablyLow,
        &["prank", "petty", "mischief", "small", "balloon", "confetti"],
    ),
    (
        ThreatLevel::Moderate,
        &[
            "stealth", "toxins", "poisons", "hacking", "gadgets", "marksman", "acrobat",
            "illusion", "hypnosis", "ice", "fire", "weather", "electric", "sonic", "plant",
        ],
    ),
    (
        ThreatLevel::High,
        &[
            "telekinesis", "biokinesis", "mind control", "energy manipulation", "gravity",
            "time dilation", "dimensional", "nanotech", "plague", "nuclear", "stormcalling",
        ],
    ),
    (
        ThreatLevel::Extreme,
        &[
            "reality", "time travel", "cosmic", "planetary", "universal", "multiverse",
            "quantum rewriting", "space-time", "apocalyptic", "godlike", "celestial",
        ],
    ),
];

pub struct KeywordThreatClassifier;

impl ThreatClassifier for KeywordThreatClassifier {
    fn classify(&self, power: &str) -> ThreatLevel {
        let p = power.to_lowercase();
        THREAT_KEYWORDS
            .iter()
            .filter(|(_, words)| words.iter().any(|w| p.contains(w)))
            .map(|(level, _)| *level)
            .next_back()
            .unwrap_or(ThreatLevel::Moderate)
    }
}

/// Pull a threat level toward the theme's distribution.
///
/// Comedic themes mostly take the sampled level, with a small chance of keeping
/// an Extreme one. Chaotic always takes the sample. Every other theme keeps the
/// higher of the two.
pub fn theme_threat<R: Rng + ?Sized>(
    theme: Theme,
    computed: ThreatLevel,
    rng: &mut R,
) -> ThreatLevel {
    let Ok(dist) = WeightedIndex::new(catalog::profile(theme).threat_weights) else {
        return computed;
    };
    let target = ThreatLevel::ALL[dist.sample(rng)];
    match theme {
        Theme::Funny | Theme::Satirical => {
            let keep_extreme = if theme == Theme::Funny { 0.10 } else { 0.15 };
            if computed == ThreatLevel::Extreme && rng.gen_bool(keep_extreme) {
                ThreatLevel::Extreme
            } else {
                target
            }
        }
        Theme::Chaotic => target,
        _ => computed.max(target),
    }
}
