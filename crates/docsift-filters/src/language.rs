//! Two-phase language acceptance: a leading-window script scan, then
//! statistical identification.

use docsift_core::{Document, Stage, StageError};
use whatlang::Lang;

use crate::config::LanguageConfig;
use crate::error::BuildError;
use crate::text;

/// Identified language (ISO 639-3) with confidence in `[0, 1]`
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub lang: String,
    pub score: f64,
}

/// Statistical language identifier used by the second phase.
pub trait LanguageIdentifier: Send + Sync {
    fn identify(&self, text: &str) -> Option<Detection>;
}

/// Identifier backed by `whatlang` trigram models
#[derive(Debug, Clone, Copy, Default)]
pub struct WhatlangIdentifier;

impl LanguageIdentifier for WhatlangIdentifier {
    fn identify(&self, text: &str) -> Option<Detection> {
        whatlang::detect(text).map(|info| Detection {
            lang: info.lang().code().to_string(),
            score: info.confidence(),
        })
    }
}

/// Writing system whose glyphs mark a plausible target-language text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetScript {
    /// Hiragana or katakana
    Kana,
    Han,
    Hangul,
    Cyrillic,
    Arabic,
    Hebrew,
    Devanagari,
    Thai,
    Greek,
    Latin,
}

impl TargetScript {
    fn for_lang(lang: Lang) -> Self {
        match lang {
            Lang::Jpn => Self::Kana,
            Lang::Cmn => Self::Han,
            Lang::Kor => Self::Hangul,
            Lang::Rus | Lang::Ukr | Lang::Bel | Lang::Bul | Lang::Srp | Lang::Mkd => {
                Self::Cyrillic
            }
            Lang::Ara | Lang::Pes | Lang::Urd => Self::Arabic,
            Lang::Heb | Lang::Yid => Self::Hebrew,
            Lang::Hin | Lang::Mar | Lang::Nep => Self::Devanagari,
            Lang::Tha => Self::Thai,
            Lang::Ell => Self::Greek,
            _ => Self::Latin,
        }
    }

    pub fn contains(self, c: char) -> bool {
        match self {
            Self::Kana => text::is_hiragana(c) || text::is_katakana(c),
            Self::Han => text::is_han(c),
            Self::Hangul => text::is_hangul(c),
            Self::Cyrillic => text::is_cyrillic(c),
            Self::Arabic => text::is_arabic(c),
            Self::Hebrew => text::is_hebrew(c),
            Self::Devanagari => text::is_devanagari(c),
            Self::Thai => text::is_thai(c),
            Self::Greek => text::is_greek(c),
            Self::Latin => text::is_latin_letter(c),
        }
    }
}

/// ISO 639-1 codes for the languages users most often configure
const ISO_639_1: &[(&str, &str)] = &[
    ("ja", "jpn"),
    ("zh", "cmn"),
    ("ko", "kor"),
    ("en", "eng"),
    ("de", "deu"),
    ("fr", "fra"),
    ("es", "spa"),
    ("pt", "por"),
    ("it", "ita"),
    ("ru", "rus"),
    ("ar", "ara"),
    ("hi", "hin"),
    ("vi", "vie"),
    ("th", "tha"),
    ("id", "ind"),
    ("nl", "nld"),
    ("tr", "tur"),
    ("pl", "pol"),
    ("uk", "ukr"),
    ("he", "heb"),
    ("el", "ell"),
];

/// Resolve a configured ISO 639-1 or 639-3 code to a supported language.
pub fn resolve_language(code: &str) -> Result<Lang, BuildError> {
    let code = code.trim().to_ascii_lowercase();
    let iso3 = ISO_639_1
        .iter()
        .find(|(two, _)| *two == code)
        .map_or(code.as_str(), |(_, three)| three);
    Lang::from_code(iso3).ok_or_else(|| {
        BuildError::ClassifierUnavailable(format!("no language model for '{code}'"))
    })
}

/// Keeps only documents identified as the target language.
pub struct AcceptLanguage {
    target: String,
    script: TargetScript,
    lookup_size: usize,
    min_score: f64,
    identifier: Box<dyn LanguageIdentifier>,
}

impl std::fmt::Debug for AcceptLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcceptLanguage")
            .field("target", &self.target)
            .field("script", &self.script)
            .field("lookup_size", &self.lookup_size)
            .field("min_score", &self.min_score)
            .finish_non_exhaustive()
    }
}

impl AcceptLanguage {
    pub fn new(
        config: &LanguageConfig,
        identifier: Box<dyn LanguageIdentifier>,
    ) -> Result<Self, BuildError> {
        if !(0.0..=1.0).contains(&config.min_score) {
            return Err(BuildError::InvalidConfig(format!(
                "language.min_score must be within [0, 1], got {}",
                config.min_score
            )));
        }
        if config.lookup_size == 0 {
            return Err(BuildError::InvalidConfig(
                "language.lookup_size must be positive".into(),
            ));
        }
        let lang = resolve_language(&config.lang)?;
        Ok(Self {
            target: lang.code().to_string(),
            script: TargetScript::for_lang(lang),
            lookup_size: config.lookup_size,
            min_score: config.min_score,
            identifier,
        })
    }

    /// Phase 1: any target-script glyph in the leading window
    fn script_plausible(&self, text: &str) -> bool {
        text.chars()
            .take(self.lookup_size)
            .any(|c| self.script.contains(c))
    }

    /// Phase 2
    fn identified(&self, text: &str) -> bool {
        self.identifier
            .identify(text)
            .is_some_and(|d| d.lang == self.target && d.score >= self.min_score)
    }
}

impl Stage for AcceptLanguage {
    fn name(&self) -> &str {
        "accept_language"
    }

    fn apply(&self, doc: &mut Document) -> Result<(), StageError> {
        let text = doc.text();
        if !self.script_plausible(text) || !self.identified(text) {
            doc.reject(self.name());
        }
        Ok(())
    }
}
