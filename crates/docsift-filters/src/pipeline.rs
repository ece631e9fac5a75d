//! Canonical chain construction

use docsift_core::{Chain, Stage};

use crate::bbs::DiscardBbsComments;
use crate::char_ratio::DiscardCharacterRatio;
use crate::config::{KeywordConfig, StagesConfig};
use crate::dumper::JsonDumper;
use crate::error::BuildError;
use crate::keywords::{KeywordDictionary, KeywordRatioFilter};
use crate::language::{AcceptLanguage, LanguageIdentifier, WhatlangIdentifier};
use crate::length::DocumentLengthFilter;
use crate::loader::JsonLoader;
use crate::normalize::DocumentNormalizer;
use crate::pii::MaskPersonalInformation;
use crate::segments::{MergeSegments, RemoveDate, RemoveOneWord, SplitLines};

/// Built-in keyword lists and default thresholds
struct KeywordDefaults {
    stage: &'static str,
    words: &'static str,
    threshold: f64,
}

const ADS: KeywordDefaults = KeywordDefaults {
    stage: "discard_ads",
    words: include_str!("../dict/ads_ja.txt"),
    threshold: 0.02,
};

const DISCRIMINATION: KeywordDefaults = KeywordDefaults {
    stage: "discard_discrimination",
    words: include_str!("../dict/discrimination_ja.txt"),
    threshold: 0.0,
};

const VIOLENCE: KeywordDefaults = KeywordDefaults {
    stage: "discard_violence",
    words: include_str!("../dict/violence_ja.txt"),
    threshold: 0.0,
};

const ADULT: KeywordDefaults = KeywordDefaults {
    stage: "discard_adult",
    words: include_str!("../dict/adult_ja.txt"),
    threshold: 0.01,
};

fn keyword_filter(
    config: &KeywordConfig,
    defaults: &KeywordDefaults,
) -> Result<KeywordRatioFilter, BuildError> {
    let dictionary = match &config.dict_path {
        Some(path) => KeywordDictionary::from_file(path)?,
        None => KeywordDictionary::parse(defaults.words)?,
    };
    let threshold = config.threshold.unwrap_or(defaults.threshold);
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(BuildError::InvalidConfig(format!(
            "{}.threshold must be a non-negative number, got {threshold}",
            defaults.stage
        )));
    }
    if dictionary.is_empty() {
        log::debug!("{}: empty dictionary, stage never rejects", defaults.stage);
    }
    Ok(KeywordRatioFilter::new(defaults.stage, dictionary, threshold))
}

/// Build the canonical chain with the `whatlang` identifier.
pub fn build_chain(config: &StagesConfig) -> Result<Chain, BuildError> {
    build_chain_with(config, Box::new(WhatlangIdentifier))
}

/// Build the canonical chain with a caller-supplied language identifier.
///
/// Stage order is fixed; disabled stages are left out. Loader and dumper are
/// always present.
pub fn build_chain_with(
    config: &StagesConfig,
    identifier: Box<dyn LanguageIdentifier>,
) -> Result<Chain, BuildError> {
    if config.text_key.is_empty() {
        return Err(BuildError::InvalidConfig("text_key must not be empty".into()));
    }
    let length = &config.length;
    if length.min_doc_len > length.max_doc_len {
        return Err(BuildError::InvalidConfig(format!(
            "length.min_doc_len ({}) exceeds length.max_doc_len ({})",
            length.min_doc_len, length.max_doc_len
        )));
    }

    let mut stages: Vec<Box<dyn Stage>> = vec![Box::new(JsonLoader::new(&config.text_key))];
    if config.normalizer.enabled {
        stages.push(Box::new(DocumentNormalizer));
    }
    if config.bbs.enabled {
        stages.push(Box::new(DiscardBbsComments::new(config.bbs.max_allowed_num)));
    }
    if config.ads.enabled {
        stages.push(Box::new(keyword_filter(&config.ads, &ADS)?));
    }
    if config.discrimination.enabled {
        stages.push(Box::new(keyword_filter(&config.discrimination, &DISCRIMINATION)?));
    }
    if config.violence.enabled {
        stages.push(Box::new(keyword_filter(&config.violence, &VIOLENCE)?));
    }
    if length.enabled {
        stages.push(Box::new(DocumentLengthFilter::new(
            length.min_doc_len,
            length.max_doc_len,
        )));
    }
    if config.adult.enabled {
        stages.push(Box::new(keyword_filter(&config.adult, &ADULT)?));
    }
    if config.char_ratio.enabled {
        let cr = &config.char_ratio;
        stages.push(Box::new(DiscardCharacterRatio::new(cr.class, cr.max_ratio)));
    }
    let seg = &config.segments;
    if seg.enabled {
        stages.push(Box::new(SplitLines));
        if seg.remove_one_word {
            stages.push(Box::new(RemoveOneWord));
        }
        if seg.remove_date {
            stages.push(Box::new(RemoveDate));
        }
        stages.push(Box::new(MergeSegments::new(seg.delimiter.as_str())));
    }
    if config.language.enabled {
        stages.push(Box::new(AcceptLanguage::new(&config.language, identifier)?));
    }
    if config.pii.enabled {
        stages.push(Box::new(MaskPersonalInformation));
    }
    stages.push(Box::new(JsonDumper::new(&config.text_key, &config.dumper)));

    Ok(Chain::new(stages))
}
