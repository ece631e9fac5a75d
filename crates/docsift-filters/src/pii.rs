//! Phone number and e-mail masking

use std::sync::LazyLock;

use docsift_core::{Document, Stage, StageError};
use regex::Regex;

static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+81[- ]?|0)\d{1,4}-\d{1,4}-\d{3,4}").expect("invalid phone pattern")
});

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}")
        .expect("invalid email pattern")
});

const PHONE_MASK: &str = "XXXX";
const DOMAIN_MASK: &str = "xxxx.xxx";

/// Replace the last block of every phone number with `XXXX`.
///
/// A match touching another digit (or a leading `+`) is part of a longer
/// number and left alone.
fn mask_phones(text: &str) -> Option<String> {
    let mut out = String::new();
    let mut last = 0;
    for m in PHONE.find_iter(text) {
        let before = text[..m.start()].chars().next_back();
        let after = text[m.end()..].chars().next();
        if before.is_some_and(|c| c.is_ascii_digit() || c == '+')
            || after.is_some_and(|c| c.is_ascii_digit())
        {
            continue;
        }
        let keep = m.as_str().rfind('-').map_or(0, |i| i + 1);
        out.push_str(&text[last..m.start() + keep]);
        out.push_str(PHONE_MASK);
        last = m.end();
    }
    if last == 0 {
        return None;
    }
    out.push_str(&text[last..]);
    Some(out)
}

fn mask_emails(text: &str) -> Option<String> {
    if !EMAIL.is_match(text) {
        return None;
    }
    let masked = EMAIL.replace_all(text, |caps: &regex::Captures<'_>| {
        let address = &caps[0];
        let local = address.split_once('@').map_or(address, |(l, _)| l);
        format!("{local}@{DOMAIN_MASK}")
    });
    Some(masked.into_owned())
}

/// Masks phone numbers and e-mail addresses. Never rejects.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaskPersonalInformation;

impl Stage for MaskPersonalInformation {
    fn name(&self) -> &str {
        "mask_personal_information"
    }

    fn apply(&self, doc: &mut Document) -> Result<(), StageError> {
        if let Some(masked) = mask_phones(doc.text()) {
            doc.set_text(masked);
        }
        if let Some(masked) = mask_emails(doc.text()) {
            doc.set_text(masked);
        }
        Ok(())
    }
}
