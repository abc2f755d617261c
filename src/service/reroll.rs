//! Field rerolls for existing villains.

use crate::compose::catalog::{LAST_NAMES, first_names};
use crate::types::Gender;
use crate::types::villain::normalize_real_name;
use rand::Rng;
use rand::seq::SliceRandom;
use regex::Regex;

/// Draw a "First Last" name from the pools for `gender`, different from `current` when possible.
pub fn pick_real_name<R: Rng + ?Sized>(gender: Gender, current: &str, rng: &mut R) -> String {
    let mut name = String::new();
    for _ in 0..8 {
        let first = first_names(gender).choose(rng).copied().unwrap_or("Alex");
        let last = LAST_NAMES.choose(rng).copied().unwrap_or("Reed");
        name = normalize_real_name(&format!("{first} {last}"));
        if !name.eq_ignore_ascii_case(current) {
            break;
        }
    }
    name
}

fn replace_word(text: &str, word: &str, with: &str) -> String {
    if word.is_empty() || word.eq_ignore_ascii_case("unknown") {
        return text.to_string();
    }
    match Regex::new(&format!(r"\b{}\b", regex::escape(word))) {
        Ok(re) => re.replace_all(text, regex::NoExpand(with)).into_owned(),
        Err(_) => text.to_string(),
    }
}

/// Swap mentions of the old real name in an origin for the new one.
///
/// The full name is replaced first, then the first name and surname on their own.
pub fn rename_in_origin(origin: &str, old: &str, new: &str) -> String {
    let mut text = replace_word(origin, old, new);
    let old_parts = old.split_whitespace();
    let new_parts = new.split_whitespace();
    for (from, to) in old_parts.zip(new_parts) {
        if from != to {
            text = replace_word(&text, from, to);
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn rerolled_names_come_from_the_gendered_pool() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let name = pick_real_name(Gender::Female, "Ava Stone", &mut rng);
            let (first, last) = name.split_once(' ').unwrap();
            assert!(first_names(Gender::Female).contains(&first), "{name}");
            assert!(LAST_NAMES.contains(&last), "{name}");
            assert_ne!(name, "Ava Stone");
        }
    }

    #[test]
    fn origin_mentions_follow_the_new_name() {
        let origin = "Ava Stone was an engineer. Ava built a well; Stone never looked back. Avalanche!";
        let renamed = rename_in_origin(origin, "Ava Stone", "Lily Hart");
        assert_eq!(
            renamed,
            "Lily Hart was an engineer. Lily built a well; Hart never looked back. Avalanche!"
        );
        assert_eq!(rename_in_origin("Unknown origins.", "Unknown Unknown", "Emma Khan"), "Unknown origins.");
    }
}
