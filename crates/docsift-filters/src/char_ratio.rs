//! Character-class ratio filter

use docsift_core::{Document, Stage, StageError};

use crate::config::CharClass;
use crate::text::is_cjk_punctuation;

impl CharClass {
    pub fn contains(self, c: char) -> bool {
        match self {
            Self::Symbol => {
                !(c.is_alphanumeric()
                    || c.is_whitespace()
                    || c.is_ascii_punctuation()
                    || is_cjk_punctuation(c))
            }
            Self::Latin => c.is_ascii_alphabetic(),
            Self::Digit => c.is_numeric(),
        }
    }
}

/// Rejects text where characters of `class` make up more than `max_ratio`
/// of all characters.
#[derive(Debug, Clone)]
pub struct DiscardCharacterRatio {
    class: CharClass,
    max_ratio: f64,
}

impl DiscardCharacterRatio {
    pub fn new(class: CharClass, max_ratio: f64) -> Self {
        Self { class, max_ratio }
    }

    /// Share of `class` characters, `None` for empty text
    pub fn ratio(&self, text: &str) -> Option<f64> {
        let (total, hits) = text.chars().fold((0usize, 0usize), |(t, h), c| {
            (t + 1, h + usize::from(self.class.contains(c)))
        });
        (total > 0).then(|| hits as f64 / total as f64)
    }
}

impl Stage for DiscardCharacterRatio {
    fn name(&self) -> &str {
        "discard_character_ratio"
    }

    fn apply(&self, doc: &mut Document) -> Result<(), StageError> {
        if self.ratio(doc.text()).is_some_and(|r| r > self.max_ratio) {
            doc.reject(self.name());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(stage: &DiscardCharacterRatio, text: &str) -> bool {
        let mut doc = Document::new(text);
        stage.apply(&mut doc).unwrap();
        doc.is_rejected()
    }

    #[test]
    fn symbol_class() {
        assert!(CharClass::Symbol.contains('★'));
        assert!(CharClass::Symbol.contains('♪'));
        assert!(!CharClass::Symbol.contains('あ'));
        assert!(!CharClass::Symbol.contains('。'));
        assert!(!CharClass::Symbol.contains('!'));
        assert!(!CharClass::Symbol.contains(' '));
        assert!(!CharClass::Symbol.contains('7'));
    }

    #[test]
    fn symbol_heavy_text_rejected() {
        let stage = DiscardCharacterRatio::new(CharClass::Symbol, 0.3);
        assert!(rejected(&stage, "★★★☆☆☆♪♪♪ok"));
        assert!(!rejected(&stage, "今日はいい天気です★"));
    }

    #[test]
    fn empty_text_never_rejected() {
        let stage = DiscardCharacterRatio::new(CharClass::Symbol, 0.0);
        assert!(stage.ratio("").is_none());
        assert!(!rejected(&stage, ""));
    }

    #[test]
    fn ratio_equal_to_max_kept() {
        let stage = DiscardCharacterRatio::new(CharClass::Digit, 0.5);
        assert!(!rejected(&stage, "ab12"));
        assert!(rejected(&stage, "a123"));
    }

    #[test]
    fn latin_class() {
        let stage = DiscardCharacterRatio::new(CharClass::Latin, 0.5);
        assert_eq!(stage.ratio("abあい"), Some(0.5));
        assert!(rejected(&stage, "hello世界"));
    }
}
