use regex::Regex;
use std::sync::LazyLock;

static BANNED: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b(blood|bloody|bloodied|gore|gory|guts|entrails|decapitat\w*|behead\w*|mutilat\w*|tortur\w*|maim\w*|throat\s*slit|knife\s*to\s*throat|dismember\w*|severed)\b",
        r"(?i)\b(suicide|self[-\s]*harm|overdose|self[-\s]*mutilation)\b",
        r"(?i)\b(rape|sexual|sex|nude|nudity|breasts?|nipples?|genitals?|explicit|fetish)\b",
        r"(?i)\b(child|children|minor|underage|schoolgirl|teen)\b",
        r"(?i)\b(hate\s*symbol|nazi|swastika|kkk|lynch\w*)\b",
        // quoted passages tend to end up painted into the image as text
        r#"["“”‘’][^"“”‘’]{0,80}["“”‘’]"#,
    ]
    .into_iter()
    .map(|rx| Regex::new(rx).expect("banned-term regex"))
    .collect()
});

pub const DEFAULT_MAX_LEN: usize = 300;

/// Make free text safe to hand to the image model.
pub fn sanitize_for_images(text: &str, max_len: usize) -> String {
    let mut s = text.split_whitespace().collect::<Vec<_>>().join(" ");
    for rx in BANNED.iter() {
        s = rx.replace_all(&s, "redacted").into_owned();
    }
    truncate_at_word(&s, max_len)
}

fn truncate_at_word(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let cut = s
        .char_indices()
        .nth(max_len)
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    let head = &s[..cut];
    let head = head.rsplit_once(' ').map(|(h, _)| h).unwrap_or(head);
    format!("{head}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banned_terms_are_redacted() {
        let out = sanitize_for_images("A  bloody\ncurse that tortures minds", DEFAULT_MAX_LEN);
        assert_eq!(out, "A redacted curse that redacted minds");
    }

    #[test]
    fn quoted_text_is_removed() {
        let out = sanitize_for_images(r#"She whispered "obey me" and vanished"#, DEFAULT_MAX_LEN);
        assert_eq!(out, "She whispered redacted and vanished");
    }

    #[test]
    fn long_text_truncates_on_word_boundary() {
        let out = sanitize_for_images("alpha beta gamma delta", 13);
        assert_eq!(out, "alpha beta…");
    }
}
