//! Fixed option set: per-theme power pools and prompt/visual profiles.

use serde::Serialize;

use crate::types::{Gender, Theme, Tier};

#[derive(Debug, PartialEq, Eq)]
pub struct PowerDef {
    pub title: &'static str,
    pub blurb: &'static str,
    /// Only selectable on the Uber tier.
    pub uber: bool,
}

impl PowerDef {
    const fn std(title: &'static str, blurb: &'static str) -> Self {
        Self {
            title,
            blurb,
            uber: false,
        }
    }

    const fn uber(title: &'static str, blurb: &'static str) -> Self {
        Self {
            title,
            blurb,
            uber: true,
        }
    }

    pub fn full(&self) -> String {
        format!("{} — {}", self.title, self.blurb)
    }
}

#[derive(Debug)]
pub struct ThemeProfile {
    pub description: &'static str,
    pub tone: &'static str,
    pub encourage: &'static [&'static str],
    pub ban: &'static [&'static str],
    pub variety: &'static [&'static str],
    pub temperature: f32,
    /// Style fragment injected into portrait prompts.
    pub visuals: &'static str,
    /// Card accent colour.
    pub accent: &'static str,
    /// Relative odds of each threat level, lowest first.
    pub threat_weights: [u32; 4],
}

const DARK_POWERS: &[PowerDef] = &[
    PowerDef::std("Umbrakinesis", "command living shadows that claw and bind"),
    PowerDef::std("Dread Pulse", "project waves of terror that weaken will"),
    PowerDef::std("Soul Siphon", "drain life-force and grow stronger"),
    PowerDef::std("Grave Whisper", "commune with the dead for secrets and favors"),
    PowerDef::std("Tombstep", "pass through walls as if they were coffins"),
    PowerDef::std("Ashen Grip", "rot whatever you touch to brittle ash"),
    PowerDef::uber("Hollow Crown", "dominate weakened minds with a word"),
    PowerDef::uber("Stygian Chains", "conjure binding chains from the underdark"),
];

const FUNNY_POWERS: &[PowerDef] = &[
    PowerDef::std("Rubber Reality", "stretch, squash, and bounce like a toon"),
    PowerDef::std("Banana Slipstream", "create instant banana peels you can surf"),
    PowerDef::std("Seltzer Jetpack", "carbonated flight with fizzy evasions"),
    PowerDef::std("Anvil Orbit", "drop comedic anvils from nowhere"),
    PowerDef::std("Confetti Storm", "blinding flurry that also jams weapons"),
    PowerDef::std("Kazooblast", "weaponized kazoo note becomes a sonic beam"),
    PowerDef::uber("Punchline Recall", "rewind the last three seconds for a redo"),
    PowerDef::uber("Cartoon Physics", "once per scene, ignore normal physics"),
];

const SCI_FI_POWERS: &[PowerDef] = &[
    PowerDef::std("Electrokinesis", "shape lightning into blades and nets"),
    PowerDef::std("Nano-Swarm", "print micro-machines that build or devour"),
    PowerDef::std("Hardlight Projectors", "sculpt solid holograms as tools or walls"),
    PowerDef::std("Phase Tunneling", "walk through matter like mist"),
    PowerDef::std("Photonic Cloak", "bend light to disappear in plain sight"),
    PowerDef::std("Kinetic Shunt", "store impacts and release them back"),
    PowerDef::uber("Singularity Seed", "brief micro-well that drags and breaks"),
    PowerDef::uber("Tachyon Tag", "mark a target and strike them a heartbeat later"),
];

const MYTHIC_POWERS: &[PowerDef] = &[
    PowerDef::std("Rune Weaving", "carve living sigils that bind and blaze"),
    PowerDef::std("Stormcalling", "command thunderheads and rain spears"),
    PowerDef::std("Beast Tongue", "bind great creatures with a spoken pact"),
    PowerDef::std("Verdant Pact", "roots and vines heed your summons"),
    PowerDef::std("Stone Sleep", "skin becomes granite, blows glance off"),
    PowerDef::std("Basilisk Glare", "petrify with a meeting of eyes"),
    PowerDef::uber("Fate Thread", "tug destiny a finger-width at a time"),
    PowerDef::uber("Wild Hunt", "the riders answer your horn"),
];

const CHAOTIC_POWERS: &[PowerDef] = &[
    PowerDef::std("Dice of Doom", "weight the odds when it counts"),
    PowerDef::std("Probability Fracture", "force the unlikely to occur"),
    PowerDef::std("Glitchstep", "hop unpredictably between nearby spots"),
    PowerDef::std("Coinflip Aegis", "block everything or nothing at all"),
    PowerDef::std("Jinx Loop", "misfortune rebounds again and again"),
    PowerDef::std("Whimfire", "flames pick a new element each burst"),
    PowerDef::uber("Paradox Note", "erase a tiny event from the record"),
    PowerDef::uber("Tilt Reality", "physics skews at odd angles"),
];

const SATIRICAL_POWERS: &[PowerDef] = &[
    PowerDef::std("Spin Doctor", "reframe events until truth loses"),
    PowerDef::std("Clout Siphon", "steal attention and following"),
    PowerDef::std("Red Tape Storm", "bury the field in forms and stamps"),
    PowerDef::std("Terms & Conditions", "compel compliance to small print"),
    PowerDef::std("Clickbait Lure", "headlines drag crowds to you"),
    PowerDef::std("Paywall", "deny access until tribute is paid"),
    PowerDef::uber("Narrative Rewrite", "swap roles of villain and hero"),
    PowerDef::uber("Plot Armor", "survive one impossible blow"),
];

const CYBERPUNK_POWERS: &[PowerDef] = &[
    PowerDef::std("Ghost in the Grid", "move unseen through networks"),
    PowerDef::std("Synapse Overdrive", "reflexes blaze, decisions sharpen"),
    PowerDef::std("Chrome Shield", "reactive smart armor forms on impact"),
    PowerDef::std("Neural Jack", "slot a new skill like software"),
    PowerDef::std("Optic Scramble", "blind cameras and scopes"),
    PowerDef::std("Shock Gauntlets", "grapple stun with brutal volts"),
    PowerDef::uber("Black ICE Bloom", "unleash offensive counter-AI thorns"),
    PowerDef::uber("Drone Wrangle", "commandeer corporate swarms"),
];

const TECH_BAN: &[&str] = &[
    "quantum",
    "nanotech",
    "plasma",
    "neural",
    "cyber",
    "singularity",
    "neutrino",
    "lattice",
];

const DARK: ThemeProfile = ThemeProfile {
    description: "Dread, decay and the void; villains who make the lights flicker.",
    tone: "ominous, restrained, gothic imagery, slow-burning menace",
    encourage: &["dread", "chiaroscuro", "wither", "void", "decay", "entropy", "curse", "sigil"],
    ban: &["laser", "robot", "spaceship"],
    variety: &[
        "Let the menace build quietly; understatement over spectacle.",
        "Give the origin one eerie, specific sensory detail.",
    ],
    temperature: 0.86,
    visuals: "low-key lighting, chiaroscuro, cold palette, occult hints, oppressive atmosphere",
    accent: "#ff4b4b",
    threat_weights: [0, 20, 50, 30],
};

const FUNNY: ThemeProfile = ThemeProfile {
    description: "Slapstick schemes and cartoon physics; the villain is their own worst enemy.",
    tone: "witty, playful, deadpan humor, punchy sentences",
    encourage: &["prank", "slapstick", "gag", "spoof", "ridiculous", "banana", "confetti", "pie"],
    ban: TECH_BAN,
    variety: &[
        "Lean into slapstick physics or improbable gags that sometimes backfire.",
        "Make the motive comedic or petty; the villain often defeats themselves.",
        "Prefer analog props and clownish contraptions over technology.",
    ],
    temperature: 0.98,
    visuals: "bright, comedic composition, exaggerated expressions, whimsical props, saturated but balanced colors",
    accent: "#ffcc00",
    threat_weights: [60, 30, 10, 0],
};

const SCI_FI: ThemeProfile = ThemeProfile {
    description: "Clean techno-poetry: energy, physics and devices gone rogue.",
    tone: "precise, cinematic, cool-headed, awe at scale",
    encourage: &["orbit", "lattice", "reactor", "signal", "drone", "field", "vector", "fusion"],
    ban: &["curse", "spell", "ghost"],
    variety: &[
        "Ground the power in one plausible-sounding mechanism.",
        "Give the lair a distinct physical location off-world or deep underground.",
    ],
    temperature: 0.9,
    visuals: "clean industrial design, emissive materials, precise geometry, cool palette (no control panels, no monitors)",
    accent: "#00ffcc",
    threat_weights: [0, 30, 50, 20],
};

const MYTHIC: ThemeProfile = ThemeProfile {
    description: "Old law, vows and relics; villains out of forgotten sagas.",
    tone: "lyrical, archaic cadence, heavy with omen",
    encourage: &["rune", "oath", "relic", "storm", "beast", "fate", "shrine", "hearth"],
    ban: TECH_BAN,
    variety: &[
        "Tie the origin to a broken oath or a stolen relic.",
        "Let nature itself take sides in the story.",
    ],
    temperature: 0.9,
    visuals: "ancient textures, carved stone, sacred motifs, weathered materials, natural backdrops",
    accent: "#9933ff",
    threat_weights: [0, 20, 50, 30],
};

const CHAOTIC: ThemeProfile = ThemeProfile {
    description: "Probability, glitches and paradoxes; nothing goes to plan, including theirs.",
    tone: "unstable, mischievous, reality-bending",
    encourage: &["paradox", "glitch", "odds", "entropy", "dice", "loop", "anomaly", "fracture"],
    ban: &[],
    variety: &[
        "Let cause and effect wobble; odd metaphors are welcome.",
        "Include at least one unpredictable chaos quirk in the origin.",
        "Sentence lengths should oscillate: short, then long.",
    ],
    temperature: 1.0,
    visuals: "motion blur, double exposure, textured light leaks (no glitch text, no UI elements)",
    accent: "#ff66cc",
    threat_weights: [25, 25, 25, 25],
};

const SATIRICAL: ThemeProfile = ThemeProfile {
    description: "PR warfare, bureaucracy and narrative weapons.",
    tone: "arch, ironic, punchy commentary",
    encourage: &["parody", "irony", "meme", "absurd", "bureaucracy", "red tape", "clickbait", "propaganda"],
    ban: &["quantum", "nanotech", "plasma", "neural", "singularity"],
    variety: &[
        "Skewer institutions, brands, or trends without naming real companies.",
        "Let the crimes be pranks with social commentary.",
        "Keep the tone clever and self-aware.",
    ],
    temperature: 0.98,
    visuals: "playful yet sharp composition, clever visual irony, illustrative vibe (no posters, no text blocks)",
    accent: "#ff9900",
    threat_weights: [50, 35, 15, 0],
};

const CYBERPUNK: ThemeProfile = ThemeProfile {
    description: "Street-level tech, grit and augments; the Grid never sleeps.",
    tone: "gritty, neon-soaked, terse street slang",
    encourage: &["chrome", "neon", "implant", "grid", "syndicate", "rain", "black market", "augment"],
    ban: &["spell", "rune", "dragon"],
    variety: &[
        "Make the villain's augment both a weapon and a liability.",
        "Pit them against a megacorp without naming real companies.",
    ],
    temperature: 0.95,
    visuals: "neon grime, rain-slick surfaces, retro-futurist color haze and rimlight (no holograms, no signage, no billboards)",
    accent: "#39ff14",
    threat_weights: [0, 40, 40, 20],
};

const MALE_NAMES: &[&str] = &[
    "Alex", "Benjamin", "Carter", "Diego", "Ethan", "Gavin", "Hunter", "Isaac", "Jacob", "Liam",
];
const FEMALE_NAMES: &[&str] = &[
    "Ava", "Bella", "Camila", "Chloe", "Elena", "Emma", "Hannah", "Isabella", "Layla", "Lily",
];
const NEUTRAL_NAMES: &[&str] = &[
    "Avery", "Blair", "Casey", "Charlie", "Dakota", "Eden", "Emery", "Jordan", "Quinn", "Riley",
];
pub const LAST_NAMES: &[&str] = &[
    "Reed", "Hart", "Lane", "Sloan", "Hayes", "Quinn", "Rivera", "Nguyen", "Khan", "Silva",
];

pub fn first_names(gender: Gender) -> &'static [&'static str] {
    match gender {
        Gender::Male => MALE_NAMES,
        Gender::Female => FEMALE_NAMES,
        Gender::Nonbinary => NEUTRAL_NAMES,
    }
}

pub fn profile(theme: Theme) -> &'static ThemeProfile {
    match theme {
        Theme::Dark => &DARK,
        Theme::Funny => &FUNNY,
        Theme::SciFi => &SCI_FI,
        Theme::Mythic => &MYTHIC,
        Theme::Chaotic => &CHAOTIC,
        Theme::Satirical => &SATIRICAL,
        Theme::Cyberpunk => &CYBERPUNK,
    }
}

pub fn powers(theme: Theme) -> &'static [PowerDef] {
    match theme {
        Theme::Dark => DARK_POWERS,
        Theme::Funny => FUNNY_POWERS,
        Theme::SciFi => SCI_FI_POWERS,
        Theme::Mythic => MYTHIC_POWERS,
        Theme::Chaotic => CHAOTIC_POWERS,
        Theme::Satirical => SATIRICAL_POWERS,
        Theme::Cyberpunk => CYBERPUNK_POWERS,
    }
}

/// Look up a power by title (case-insensitive). The "Title — blurb" form is accepted too.
pub fn find_power(theme: Theme, wanted: &str) -> Option<&'static PowerDef> {
    let title = wanted.split('—').next().unwrap_or(wanted).trim();
    powers(theme)
        .iter()
        .find(|p| p.title.eq_ignore_ascii_case(title))
}

#[derive(Debug, Serialize)]
pub struct PowerOption {
    pub title: &'static str,
    pub description: &'static str,
    pub uber: bool,
}

#[derive(Debug, Serialize)]
pub struct ThemeOption {
    pub key: &'static str,
    pub description: &'static str,
    pub uber: bool,
    pub powers: Vec<PowerOption>,
}

/// Options a caller may choose from on the given tier.
pub fn options_for(tier: Tier) -> Vec<ThemeOption> {
    let uber = tier == Tier::Uber;
    Theme::ALL
        .into_iter()
        .filter(|t| uber || !t.is_uber())
        .map(|theme| ThemeOption {
            key: theme.as_str(),
            description: profile(theme).description,
            uber: theme.is_uber(),
            powers: powers(theme)
                .iter()
                .filter(|p| uber || !p.uber)
                .map(|p| PowerOption {
                    title: p.title,
                    description: p.blurb,
                    uber: p.uber,
                })
                .collect(),
        })
        .collect()
}
