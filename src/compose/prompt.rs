use super::catalog;
use super::sanitize::{DEFAULT_MAX_LEN, sanitize_for_images};
use crate::types::{Gender, Selection, Theme, Tier, VillainProfile};

pub const TEXT_SYSTEM_PROMPT: &str =
    "You are a creative villain generator that returns VALID JSON only.";

/// Appended to every portrait prompt.
pub const QUALITY_HINT: &str = "Cinematic bust portrait, 3/4 view, photorealistic skin texture, \
dramatic lighting, depth of field, rich background bokeh, intricate detail, volumetric light, \
high dynamic range. absolutely no words, no text, no typography, no letters, no numbers, \
no captions, no subtitles, no watermarks, no signatures, no graffiti, no posters, no billboards, \
no logos, no signage, no diagrams, no labels, no UI, no HUD, no interface overlays; \
NOT an icon, NOT a sticker, NOT flat vector art";

#[derive(Debug, Clone, PartialEq)]
pub struct ComposedPrompt {
    pub system: &'static str,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Build the profile-generation prompt for a validated selection.
pub fn text_prompt(selection: &Selection) -> ComposedPrompt {
    let theme = selection.theme;
    let profile = catalog::profile(theme);

    let mut lines = vec![
        format!("Theme: {theme}"),
        format!("Tone words: {}.", profile.tone),
        format!("Prefer concepts like: {}.", profile.encourage.join(", ")),
    ];
    if !profile.ban.is_empty() {
        lines.push(format!("Avoid terms like: {}.", profile.ban.join(", ")));
    }
    if matches!(theme, Theme::Funny | Theme::Satirical) {
        lines.push("Technology is rare; mild gadgets allowed only occasionally.".to_string());
    }
    lines.extend(profile.variety.iter().map(|v| v.to_string()));

    let power_rule = match selection.power {
        Some(p) => format!(
            "- The villain's primary power is fixed: \"{}\". Use it as the `power` value and build the profile around it.",
            p.full()
        ),
        None => "- Choose ANY supervillain power concept from broad fiction (comics, anime, mythology) \
but DO NOT reuse copyrighted names or trademarks."
            .to_string(),
    };

    let dossier = match selection.tier {
        Tier::Standard => "",
        Tier::Uber => {
            "\n- Uber dossier: make every field vivid and specific; give 4-5 crimes, a nemesis with a \
personal grudge, and a lair with one memorable architectural detail."
        }
    };

    let user = format!(
        "Create a unique and original supervillain character profile that strictly follows the **{theme}** theme.

{preface}

Rules:
{power_rule}
- Real name must be a modern, realistic FIRST and LAST name only (no titles). It MUST NOT reference the power.
- Pick a first name appropriate for the chosen gender (male/female/nonbinary); nonbinary uses a unisex name.
- Alias/codename must be different from the real name and not obviously \"dark\" or \"shadow\" themed.
- Keep everything safe-for-work (no graphic gore).
- Keep JSON valid and compact.{dossier}

Return JSON with the following keys:

gender: one of [\"male\",\"female\",\"nonbinary\"]
name: Real full name (first + last only)
alias: Creative codename
power: Primary superpower
weakness: Core vulnerability
nemesis: Their heroic enemy
lair: Where they operate from
catchphrase: A short quote they often say
crimes: List of crimes or signature actions
threat_level: One of [Laughably Low, Moderate, High, Extreme]
faction: Group or syndicate name
origin: A single paragraph origin story with 4-5 sentences (about 80-120 words). No dialogue.",
        preface = lines.join("\n"),
    );

    ComposedPrompt {
        system: TEXT_SYSTEM_PROMPT,
        user,
        temperature: profile.temperature,
        max_tokens: match selection.tier {
            Tier::Standard => 500,
            Tier::Uber => 800,
        },
    }
}

/// Prompt for a fresh origin paragraph that keeps the rest of the profile.
pub fn origin_prompt(villain: &VillainProfile, theme: Theme) -> ComposedPrompt {
    let profile = catalog::profile(theme);
    let crimes = if villain.crimes.is_empty() {
        "unrecorded".to_string()
    } else {
        villain.crimes.join("; ")
    };
    let user = format!(
        "Write a new origin story for an existing supervillain in the **{theme}** theme.

Tone words: {tone}.
Real name: {name}
Alias: {alias}
Power: {power}
Known crimes: {crimes}

Rules:
- Use only the real name and alias above; introduce no other named characters.
- A single paragraph of 4-5 sentences (about 80-120 words). No dialogue.
- Keep everything safe-for-work.

Return JSON with one key:

origin: the new origin paragraph",
        tone = profile.tone,
        name = villain.name,
        alias = villain.alias,
        power = villain.power,
    );
    ComposedPrompt {
        system: TEXT_SYSTEM_PROMPT,
        user,
        temperature: profile.temperature,
        max_tokens: 300,
    }
}

/// Style-injection fragment for portrait prompts.
pub fn style_line(theme: Theme) -> String {
    format!("Theme style: {}.", catalog::profile(theme).visuals)
}

fn gender_phrase(gender: Gender) -> &'static str {
    match gender {
        Gender::Female => "feminine, graceful energy",
        Gender::Male => "masculine, powerful energy",
        Gender::Nonbinary => "mysterious energy",
    }
}

/// Build the image prompt for a generated profile.
pub fn portrait_prompt(profile: &VillainProfile, theme: Theme) -> String {
    let origin = sanitize_for_images(&profile.bio, DEFAULT_MAX_LEN);
    let power = sanitize_for_images(&profile.power, DEFAULT_MAX_LEN);
    format!(
        "PG-13 villain portrait, {gender}. {style} Origin vibe (PG-13 only): {origin} \
Power vibe (PG-13 only): {power} {QUALITY_HINT}",
        gender = gender_phrase(profile.gender),
        style = style_line(theme),
    )
}
