//! Language identification for the guardrail pipeline.
//!
//! Detection is script-first: kana means Japanese, CJK ideographs without
//! kana mean Chinese, Arabic script means Farsi. Latin-script languages are
//! scored against small function-word lists; a configurable minimum score
//! keeps short or mixed snippets from flipping away from the English
//! default.

use core::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Languages the guardrail has pattern tables for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English.
    En,
    /// Spanish.
    Es,
    /// French.
    Fr,
    /// German.
    De,
    /// Italian.
    It,
    /// Portuguese.
    Pt,
    /// Japanese.
    Ja,
    /// Chinese.
    Zh,
    /// Farsi.
    Fa,
    /// Detect from the text.
    Auto,
}

impl Language {
    /// ISO-639-1 style code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
            Self::Fr => "fr",
            Self::De => "de",
            Self::It => "it",
            Self::Pt => "pt",
            Self::Ja => "ja",
            Self::Zh => "zh",
            Self::Fa => "fa",
            Self::Auto => "auto",
        }
    }

    /// Parse a code, defaulting to [`Language::Auto`] for unknown values.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" => Self::En,
            "es" => Self::Es,
            "fr" => Self::Fr,
            "de" => Self::De,
            "it" => Self::It,
            "pt" => Self::Pt,
            "ja" => Self::Ja,
            "zh" => Self::Zh,
            "fa" => Self::Fa,
            _ => Self::Auto,
        }
    }

    /// The concrete (non-auto) languages, in scoring order.
    #[must_use]
    pub const fn all_concrete() -> [Self; 9] {
        [
            Self::En,
            Self::Es,
            Self::Fr,
            Self::De,
            Self::It,
            Self::Pt,
            Self::Ja,
            Self::Zh,
            Self::Fa,
        ]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Function-word indicators per Latin-script language, in scoring order.
const LATIN_INDICATORS: &[(Language, &[&str])] = &[
    (
        Language::Es,
        &[
            "está", "esto", "pero", "como", "para", "con", "que", "los", "las", "una", "del",
        ],
    ),
    (
        Language::Fr,
        &[
            "est", "cette", "mais", "comme", "pour", "avec", "que", "les", "une", "des", "dans",
        ],
    ),
    (
        Language::De,
        &[
            "ist", "diese", "aber", "wie", "für", "mit", "dass", "die", "der", "das", "und",
        ],
    ),
    (
        Language::It,
        &[
            "è", "questa", "ma", "come", "per", "con", "che", "gli", "una", "del", "nella",
        ],
    ),
    (
        Language::Pt,
        &[
            "está", "esta", "mas", "como", "para", "com", "que", "os", "as", "uma", "do",
        ],
    ),
];

static INDICATOR_REGEXES: Lazy<Vec<(Language, Regex)>> = Lazy::new(|| {
    LATIN_INDICATORS
        .iter()
        .map(|(lang, words)| {
            let alternation = words
                .iter()
                .map(|w| regex::escape(w))
                .collect::<Vec<_>>()
                .join("|");
            let re = Regex::new(&format!(r"\b(?:{alternation})\b"))
                .expect("indicator regex must compile");
            (*lang, re)
        })
        .collect()
});

fn has_kana(text: &str) -> bool {
    text.chars()
        .any(|c| ('\u{3040}'..='\u{309f}').contains(&c) || ('\u{30a0}'..='\u{30ff}').contains(&c))
}

fn has_cjk_ideographs(text: &str) -> bool {
    text.chars().any(|c| ('\u{4e00}'..='\u{9fff}').contains(&c))
}

fn has_arabic_script(text: &str) -> bool {
    text.chars().any(|c| ('\u{0600}'..='\u{06ff}').contains(&c))
}

/// Detect the language of `text`.
///
/// `min_score` is the minimum number of function-word hits required to
/// override the English default for Latin-script text; it is the guardrail's
/// main calibration knob and is exposed in configuration.
#[must_use]
pub fn detect(text: &str, min_score: usize) -> Language {
    if text.is_empty() {
        return Language::En;
    }

    // Script detection first.
    if has_kana(text) {
        return Language::Ja;
    }
    if has_cjk_ideographs(text) {
        return Language::Zh;
    }
    if has_arabic_script(text) {
        return Language::Fa;
    }

    let lowered = text.to_lowercase();
    let mut best: Option<(Language, usize)> = None;
    for (lang, re) in INDICATOR_REGEXES.iter() {
        let score = re.find_iter(&lowered).count();
        if score > 0 && best.is_none_or(|(_, s)| score > s) {
            best = Some((*lang, score));
        }
    }

    match best {
        Some((lang, score)) if score >= min_score => lang,
        _ => Language::En,
    }
}
