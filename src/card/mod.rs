//! Downloadable villain card, rendered as a standalone SVG document.

use crate::compose::catalog;
use crate::db::{GenerationRecord, Portrait};
use crate::types::ThreatLevel;
use base64::Engine;

const CARD_WIDTH: u32 = 1200;
const MARGIN: u32 = 40;
const PORTRAIT_SIZE: u32 = 400;
const LEFT_COL_WIDTH: u32 = CARD_WIDTH - MARGIN * 3 - PORTRAIT_SIZE;
const SECTION_GAP: u32 = 22;
const LABEL_HEIGHT: u32 = 32;
const BODY_LINE: u32 = 30;
const TITLE_LINE: u32 = 62;
const SUBTITLE_LINE: u32 = 40;
const BODY_INDENT: u32 = 10;
const METER_HEIGHT: u32 = 28;
const METER_GAP: u32 = 8;
const FOOTER_BAND: u32 = 96;

// average glyph widths are about half the font size
const LEFT_WRAP: usize = 56;
const ORIGIN_WRAP: usize = 96;
const TITLE_WRAP: usize = 22;

const HASHTAG: &str = "#AIVillains";
const BACKGROUND: &str = "#080808";
const BULLET: &str = "#ff4b4b";
const METER_OFF: &str = "#2a2a2a";

fn meter_colour(level: ThreatLevel) -> &'static str {
    match level {
        ThreatLevel::LaughablyLow => "rgb(56,200,90)",
        ThreatLevel::Moderate => "rgb(255,208,0)",
        ThreatLevel::High => "rgb(255,140,0)",
        ThreatLevel::Extreme => "rgb(220,20,60)",
    }
}

pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if (c as u32) < 0x20 && c != '\n' && c != '\t' => {}
            c => out.push(c),
        }
    }
    out
}

/// Greedy word wrap by character count; over-long words are split.
pub fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_len = 0;

    for word in text.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();
        while chars.len() > max_chars {
            if line_len > 0 {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            }
            let rest = chars.split_off(max_chars);
            lines.push(chars.into_iter().collect());
            chars = rest;
        }
        let word_len = chars.len();
        if word_len == 0 {
            continue;
        }
        if line_len > 0 && line_len + 1 + word_len > max_chars {
            lines.push(std::mem::take(&mut line));
            line_len = 0;
        }
        if line_len > 0 {
            line.push(' ');
            line_len += 1;
        }
        line.extend(chars);
        line_len += word_len;
    }
    if line_len > 0 {
        lines.push(line);
    }
    lines
}

/// `<slug>_card.svg`, safe for a Content-Disposition header.
pub fn card_filename(name: &str) -> String {
    let mut slug = String::new();
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let slug = slug.trim_end_matches('_');
    if slug.is_empty() {
        "villain_card.svg".to_string()
    } else {
        format!("{slug}_card.svg")
    }
}

struct Canvas {
    body: String,
    y: u32,
    accent: &'static str,
}

impl Canvas {
    fn text(&mut self, x: u32, y: u32, size: u32, fill: &str, extra: &str, content: &str) {
        self.body.push_str(&format!(
            r#"<text x="{x}" y="{y}" font-size="{size}" fill="{fill}"{extra}>{}</text>"#,
            escape_xml(content)
        ));
        self.body.push('\n');
    }

    fn label(&mut self, x: u32, label: &str) {
        self.y += LABEL_HEIGHT;
        let accent = self.accent;
        self.text(x, self.y, 24, accent, r#" font-weight="bold" letter-spacing="2""#, label);
        self.y += 8;
    }

    fn paragraph(&mut self, x: u32, text: &str, wrap_at: usize, italic: bool) {
        let extra = if italic { r#" font-style="italic""# } else { "" };
        let lines = wrap(text, wrap_at);
        for line in lines {
            self.y += BODY_LINE;
            self.text(x + BODY_INDENT, self.y, 22, "#f2f2f2", extra, &line);
        }
    }

    fn section(&mut self, x: u32, label: &str, text: &str, italic: bool) {
        self.label(x, label);
        self.paragraph(x, text, LEFT_WRAP, italic);
        self.y += SECTION_GAP;
    }

    fn bullets(&mut self, x: u32, label: &str, items: &[String]) {
        self.label(x, label);
        if items.is_empty() {
            self.paragraph(x, "Unknown", LEFT_WRAP, false);
        }
        for item in items {
            let lines = wrap(item, LEFT_WRAP - 3);
            for (i, line) in lines.iter().enumerate() {
                self.y += BODY_LINE;
                if i == 0 {
                    self.text(x + BODY_INDENT, self.y, 22, BULLET, "", "•");
                }
                self.text(x + BODY_INDENT + 24, self.y, 22, "#f2f2f2", "", line);
            }
        }
        self.y += SECTION_GAP;
    }

    fn threat_meter(&mut self, x: u32, level: ThreatLevel) {
        self.label(x, "THREAT LEVEL");
        self.y += 8;
        let segment = (LEFT_COL_WIDTH - METER_GAP * 3) / 4;
        for (i, lvl) in ThreatLevel::ALL.iter().enumerate() {
            let sx = x + i as u32 * (segment + METER_GAP);
            let fill = if i <= level.index() {
                meter_colour(*lvl)
            } else {
                METER_OFF
            };
            self.body.push_str(&format!(
                r#"<rect class="meter" x="{sx}" y="{y}" width="{segment}" height="{METER_HEIGHT}" rx="6" fill="{fill}"/>"#,
                y = self.y
            ));
            self.body.push('\n');
            let label_y = self.y + METER_HEIGHT + 26;
            let cx = sx + segment / 2;
            let weight = if *lvl == level {
                r#" text-anchor="middle" font-weight="bold""#
            } else {
                r#" text-anchor="middle""#
            };
            self.text(cx, label_y, 18, "#cccccc", weight, lvl.as_str());
        }
        self.y += METER_HEIGHT + 40 + SECTION_GAP;
    }
}

fn portrait_markup(portrait: Option<&Portrait>, accent: &str) -> String {
    let x = CARD_WIDTH - MARGIN - PORTRAIT_SIZE;
    let r = PORTRAIT_SIZE / 2;
    let (cx, cy) = (x + r, MARGIN + r);
    let mut out = format!(
        r#"<defs><clipPath id="portrait-clip"><circle cx="{cx}" cy="{cy}" r="{r}"/></clipPath></defs>
<circle cx="{cx}" cy="{cy}" r="{glow}" fill="none" stroke="{accent}" stroke-opacity="0.45" stroke-width="14"/>
"#,
        glow = r + 6
    );
    match portrait {
        Some(p) => {
            let b64 = base64::engine::general_purpose::STANDARD.encode(&p.bytes);
            out.push_str(&format!(
                r#"<image x="{x}" y="{MARGIN}" width="{PORTRAIT_SIZE}" height="{PORTRAIT_SIZE}" preserveAspectRatio="xMidYMid slice" clip-path="url(#portrait-clip)" href="data:{mime};base64,{b64}"/>"#,
                mime = escape_xml(&p.mime)
            ));
        }
        None => {
            // head and shoulders silhouette
            out.push_str(&format!(
                r##"<g clip-path="url(#portrait-clip)"><rect x="{x}" y="{MARGIN}" width="{PORTRAIT_SIZE}" height="{PORTRAIT_SIZE}" fill="#151515"/><circle cx="{cx}" cy="{head_y}" r="70" fill="{accent}" fill-opacity="0.35"/><ellipse cx="{cx}" cy="{body_y}" rx="140" ry="110" fill="{accent}" fill-opacity="0.35"/></g>"##,
                head_y = cy - 40,
                body_y = cy + 150
            ));
        }
    }
    out.push('\n');
    out
}

/// Render the card for a record and its portrait, if any.
pub fn render_card(record: &GenerationRecord, portrait: Option<&Portrait>) -> String {
    let profile = &record.profile;
    let accent = catalog::profile(record.theme).accent;
    let x = MARGIN;

    let mut canvas = Canvas {
        body: String::new(),
        y: MARGIN,
        accent,
    };

    for line in wrap(&profile.name, TITLE_WRAP) {
        canvas.y += TITLE_LINE;
        canvas.text(x, canvas.y - 10, 56, "#ffffff", r#" font-weight="bold""#, &line);
    }
    for line in wrap(&format!("aka {}", profile.alias), TITLE_WRAP + 12) {
        canvas.y += SUBTITLE_LINE;
        canvas.text(x, canvas.y, 32, accent, "", &line);
    }
    canvas.y += SECTION_GAP;

    canvas.section(x, "POWER", &profile.power, false);
    canvas.section(x, "WEAKNESS", &profile.weakness, false);
    canvas.section(x, "NEMESIS", &profile.nemesis, false);
    canvas.section(x, "LAIR", &profile.lair, false);
    canvas.section(x, "CATCHPHRASE", &format!("\u{201c}{}\u{201d}", profile.catchphrase), true);
    canvas.bullets(x, "CRIMES", &profile.crimes);
    canvas.section(x, "FACTION", &profile.faction, false);
    canvas.threat_meter(x, profile.threat_level);

    canvas.y = canvas.y.max(MARGIN * 2 + PORTRAIT_SIZE);
    canvas.label(x, "ORIGIN");
    canvas.paragraph(x, &profile.bio, ORIGIN_WRAP, false);
    canvas.y += SECTION_GAP;

    let height = canvas.y + FOOTER_BAND + MARGIN;
    let footer_y = height - MARGIN;
    canvas.text(x, footer_y, 20, "#c8c8c8", "", HASHTAG);

    let mut svg = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{CARD_WIDTH}" height="{height}" viewBox="0 0 {CARD_WIDTH} {height}" font-family="Georgia, 'Times New Roman', serif">
<title>{title}</title>
<rect width="100%" height="100%" fill="{BACKGROUND}"/>
<rect x="8" y="8" width="{frame_w}" height="{frame_h}" fill="none" stroke="{accent}" stroke-opacity="0.6" stroke-width="2" rx="12"/>
"#,
        title = escape_xml(&format!("{} aka {}", profile.name, profile.alias)),
        frame_w = CARD_WIDTH - 16,
        frame_h = height - 16,
    );
    svg.push_str(&portrait_markup(portrait, accent));
    svg.push_str(&canvas.body);
    svg.push_str("</svg>\n");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::PortraitSource;
    use crate::types::{Gender, Theme, Tier, VillainProfile};
    use chrono::Utc;

    fn record(level: ThreatLevel) -> GenerationRecord {
        GenerationRecord {
            id: 7,
            owner_email: "a@example.com".into(),
            theme: Theme::SciFi,
            selected_power: None,
            tier: Tier::Standard,
            profile: VillainProfile {
                name: "Ava Stone".into(),
                alias: "<Quietus & Co>".into(),
                power: "Gravity wells".into(),
                weakness: "Static".into(),
                nemesis: "Captain Dawn".into(),
                lair: "Orbital foundry".into(),
                catchphrase: "Mind the \"gap\".".into(),
                crimes: vec!["Stole a moon".into(), "Rerouted tides".into()],
                threat_level: level,
                faction: "The Pull".into(),
                bio: "Once an engineer. ".repeat(20),
                gender: Gender::Female,
            },
            portrait_id: None,
            derived_from: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn text_is_escaped_and_accent_applied() {
        let svg = render_card(&record(ThreatLevel::High), None);
        assert!(svg.contains("Ava Stone"));
        assert!(svg.contains("aka &lt;Quietus &amp; Co&gt;"));
        assert!(svg.contains("&quot;gap&quot;"));
        assert!(!svg.contains("<Quietus"));
        assert!(svg.contains("#00ffcc"));
        assert!(svg.contains(HASHTAG));
        assert!(svg.ends_with("</svg>\n"));
    }

    #[test]
    fn threat_meter_fills_up_to_level() {
        for level in ThreatLevel::ALL {
            let svg = render_card(&record(level), None);
            let lit = ThreatLevel::ALL
                .iter()
                .filter(|l| svg.contains(&format!(r#"fill="{}"/>"#, meter_colour(**l))))
                .count();
            assert_eq!(lit, level.index() + 1, "{level}");
            assert_eq!(svg.matches(r#"class="meter""#).count(), 4);
        }
    }

    #[test]
    fn portrait_is_embedded_as_data_uri() {
        let portrait = Portrait {
            id: 1,
            owner_email: "a@example.com".into(),
            source: PortraitSource::Upload,
            mime: "image/png".into(),
            bytes: vec![1, 2, 3],
            prompt: None,
            created_at: Utc::now(),
        };
        let svg = render_card(&record(ThreatLevel::Moderate), Some(&portrait));
        assert!(svg.contains(r#"href="data:image/png;base64,AQID""#));

        let placeholder = render_card(&record(ThreatLevel::Moderate), None);
        assert!(!placeholder.contains("data:image"));
        assert!(placeholder.contains("portrait-clip"));
    }

    #[test]
    fn wrap_respects_width() {
        let lines = wrap("one two three four five six", 9);
        assert_eq!(lines, vec!["one two", "three", "four five", "six"]);
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert!(wrap("   ", 10).is_empty());
    }

    #[test]
    fn filenames_are_slugged() {
        assert_eq!(card_filename("Ava Stone"), "ava_stone_card.svg");
        assert_eq!(card_filename("  Dr. X/Y!  "), "dr_x_y_card.svg");
        assert_eq!(card_filename("???"), "villain_card.svg");
    }
}
