//! Small helpers shared by the handler modules.

use rand::seq::SliceRandom;

const EMOJIS: &[&str] = &[
    "😭", "😄", "😌", "🤓", "😎", "😤", "🤖", "😶‍🌫️", "🌏", "📸", "💿", "👋", "🌊", "✨",
];

/// One emoji chosen uniformly at random.
pub fn random_emoji() -> &'static str {
    EMOJIS.choose(&mut rand::thread_rng()).copied().unwrap_or("✨")
}

/// Join rendered entries with `separator`, or fall back to `hint` when there
/// are none.
pub fn list_or_hint(entries: Vec<String>, separator: &str, hint: &str) -> String {
    if entries.is_empty() {
        hint.to_string()
    } else {
        entries.join(separator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_emoji_comes_from_the_set() {
        for _ in 0..32 {
            assert!(EMOJIS.contains(&random_emoji()));
        }
    }

    #[test]
    fn test_list_or_hint() {
        assert_eq!(list_or_hint(Vec::new(), "\n", "empty"), "empty");
        assert_eq!(
            list_or_hint(vec!["a".to_string(), "b".to_string()], "\n", "empty"),
            "a\nb"
        );
    }
}
