//! The compliance processing pipeline.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use faro_types::{AssetKind, Region};

use crate::disclaimers::DisclaimerBook;
use crate::language::{self, Language};
use crate::patterns;

/// Actions the guardrail can take on a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardrailAction {
    /// Content was already compliant.
    Passed,
    /// Content was rewritten into compliance.
    Modified,
    /// Content was blocked under strict mode.
    Blocked,
}

/// Result of one guardrail run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardrailResult {
    /// What happened.
    pub action: GuardrailAction,
    /// Input as received.
    pub original_text: String,
    /// Output; empty when blocked.
    pub processed_text: String,
    /// Human-readable record of each rewrite applied.
    pub modifications: Vec<String>,
    /// Human-readable record of each violation found.
    pub violations_found: Vec<String>,
    /// Whether a disclaimer was appended.
    pub disclaimer_added: bool,
    /// Confidence in the processed output, `[0, 1]`.
    pub confidence: f64,
    /// Language the pipeline ran under, when it ran at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_language: Option<Language>,
}

impl GuardrailResult {
    /// Whether the guardrail changed the text.
    #[must_use]
    pub fn was_modified(&self) -> bool {
        self.action == GuardrailAction::Modified
    }

    /// Whether the output may be served (passed or modified).
    #[must_use]
    pub fn is_compliant(&self) -> bool {
        matches!(
            self.action,
            GuardrailAction::Passed | GuardrailAction::Modified
        )
    }
}

/// Constructor parameters with named defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardrailConfig {
    /// Block instead of rewriting when violations exceed the limit.
    pub strict_mode: bool,
    /// Append a disclaimer when none is present.
    pub auto_add_disclaimer: bool,
    /// Language assumed when detection finds no signal.
    pub default_language: Language,
    /// Minimum function-word score to override the default language.
    pub language_detection_threshold: usize,
    /// Violations tolerated before strict mode blocks.
    pub strict_mode_violation_limit: usize,
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            auto_add_disclaimer: true,
            default_language: Language::En,
            language_detection_threshold: 3,
            strict_mode_violation_limit: 5,
        }
    }
}

static TONE_REPLACEMENTS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    const TABLE: &[(&str, &str)] = &[
        (r"\b(you |one )?should buy\b", "purchasing options are available for"),
        (r"\b(you |one )?should sell\b", "selling options are available for"),
        (r"\b(you |one )?should invest( in)?\b", "investment options exist for"),
        (r"\b(you |one )?should hold\b", "holding remains an option for"),
        (r"\b(you |one )?should consider\b", "one may analyze"),
        (r"\b(you |one )?must buy\b", "purchasing is possible for"),
        (r"\b(you |one )?must sell\b", "selling is possible for"),
        (r"\b(you |one )?need to buy\b", "buying is an available option for"),
        (r"\b(you |one )?need to sell\b", "selling is an available option for"),
        (r"\b(it'?s |it is )?better to buy\b", "buying may be considered for"),
        (r"\b(it'?s |it is )?better to sell\b", "selling may be considered for"),
        (r"\b(i |we )?(strongly )?recommend buying\b", "buying is one available option"),
        (r"\b(i |we )?(strongly )?recommend selling\b", "selling is one available option"),
        (
            r"\b(i |we )?(strongly )?recommend investing( in)?\b",
            "investing is one available option",
        ),
        (r"\b(i |we )?advise buying\b", "buying is one available option"),
        (r"\b(i |we )?advise selling\b", "selling is one available option"),
        (r"\b(i |we )?suggest buying\b", "buying is one available option"),
        (r"\b(i |we )?suggest selling\b", "selling is one available option"),
        (r"\b(you |one )?ought to (buy|sell|invest)\b", "${2}ing is an available option"),
        (r"\b(you |one )?have to (buy|sell)\b", "${2}ing is an available option"),
    ];
    TABLE
        .iter()
        .map(|(p, r)| {
            let re = RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .expect("tone pattern must compile");
            (re, *r)
        })
        .collect()
});

static GRAMMAR_FIXES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    const TABLE: &[(&str, &str)] = &[
        (r"\ba an\b", "an"),
        (r"\ban a\b", "a"),
        (r"\bthe the\b", "the"),
        (r"\bis is\b", "is"),
        (r"\bare are\b", "are"),
        (r"\bhas has\b", "has"),
        (r"\bhave have\b", "have"),
        (r"\bis has\b", "has"),
        (r"\bare have\b", "have"),
        (r"\s{2,}", " "),
    ];
    TABLE
        .iter()
        .map(|(p, r)| {
            let re = RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .expect("grammar pattern must compile");
            (re, *r)
        })
        .collect()
});

static SENTENCE_INITIAL_LOWER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)([a-z])").expect("recapitalization pattern must compile"));

/// Final-stage text processor that keeps served narratives descriptive.
///
/// All processing is pure and synchronous; callers on the async path should
/// run it under `spawn_blocking` so pattern scans never stall the scheduler.
#[derive(Debug, Clone, Default)]
pub struct ComplianceGuardrail {
    config: GuardrailConfig,
    book: DisclaimerBook,
}

impl ComplianceGuardrail {
    /// Guardrail with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(GuardrailConfig::default())
    }

    /// Guardrail with explicit configuration.
    #[must_use]
    pub fn with_config(config: GuardrailConfig) -> Self {
        Self {
            config,
            book: DisclaimerBook::new(),
        }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &GuardrailConfig {
        &self.config
    }

    /// The disclaimer book this guardrail appends from.
    #[must_use]
    pub const fn disclaimers(&self) -> &DisclaimerBook {
        &self.book
    }

    fn default_concrete_language(&self) -> Language {
        match self.config.default_language {
            Language::Auto => Language::En,
            other => other,
        }
    }

    /// Detect the language of `text` under the configured threshold.
    #[must_use]
    pub fn detect_language(&self, text: &str) -> Language {
        let detected = language::detect(text, self.config.language_detection_threshold);
        if detected == Language::En {
            // No non-English signal; fall back to the configured default.
            self.default_concrete_language()
        } else {
            detected
        }
    }

    fn resolve_language(&self, text: &str, requested: Language) -> Language {
        match requested {
            Language::Auto => self.detect_language(text),
            other => other,
        }
    }

    /// Run the full scan/rewrite/disclaimer pipeline.
    #[must_use]
    pub fn process(
        &self,
        text: &str,
        asset: AssetKind,
        region: Region,
        requested_language: Language,
    ) -> GuardrailResult {
        if text.trim().is_empty() {
            return GuardrailResult {
                action: GuardrailAction::Passed,
                original_text: text.to_string(),
                processed_text: text.to_string(),
                modifications: Vec::new(),
                violations_found: Vec::new(),
                disclaimer_added: false,
                confidence: 1.0,
                detected_language: None,
            };
        }

        let lang = self.resolve_language(text, requested_language);
        let patterns = patterns::patterns_for(lang);
        let english_patterns =
            (lang != Language::En).then(|| patterns::patterns_for(Language::En));

        // Step 1: scan all four buckets, plus the English prescriptive and
        // advice buckets for code-switched content.
        let mut violations = Vec::new();
        scan_prescriptive(text, &patterns.prescriptive, &mut violations);
        scan_patterns(text, &patterns.advice, "Advice", &mut violations);
        scan_patterns(text, &patterns.opinion, "Opinion", &mut violations);
        scan_patterns(text, &patterns.certainty, "Certainty", &mut violations);
        if let Some(en) = english_patterns {
            scan_prescriptive(text, &en.prescriptive, &mut violations);
            scan_patterns(text, &en.advice, "Advice", &mut violations);
        }

        // Step 2: strict mode blocks rather than rewrites.
        if self.config.strict_mode && violations.len() > self.config.strict_mode_violation_limit {
            warn!(
                target = "faro::guardrail",
                violations = violations.len(),
                language = %lang,
                "content blocked due to excessive violations"
            );
            return GuardrailResult {
                action: GuardrailAction::Blocked,
                original_text: text.to_string(),
                processed_text: String::new(),
                modifications: Vec::new(),
                violations_found: violations,
                disclaimer_added: false,
                confidence: 0.0,
                detected_language: Some(lang),
            };
        }

        // Steps 3-5: advice, opinion and certainty rewrites, sequentially.
        let mut modifications = Vec::new();
        let mut processed = text.to_string();
        processed = apply_replacements(processed, &patterns.advice, &mut modifications);
        if let Some(en) = english_patterns {
            processed = apply_replacements(processed, &en.advice, &mut modifications);
        }
        processed = apply_replacements(processed, &patterns.opinion, &mut modifications);
        processed = apply_replacements(processed, &patterns.certainty, &mut modifications);

        // Step 6: English descriptive-tone pass.
        if lang == Language::En {
            for (re, replacement) in TONE_REPLACEMENTS.iter() {
                if re.is_match(&processed) {
                    processed = re.replace_all(&processed, *replacement).into_owned();
                    modifications.push(format!("Converted prescriptive phrase: {}", re.as_str()));
                }
            }
        }

        // Step 7: grammar cleanup after replacements.
        if !modifications.is_empty() {
            processed = cleanup_grammar(&processed);
        }

        // Step 8: disclaimer injection.
        let mut disclaimer_added = false;
        if self.config.auto_add_disclaimer && !has_disclaimer(&processed) {
            let disclaimer = self.book.generate(asset, region, true);
            processed = append_disclaimer(&processed, &disclaimer);
            disclaimer_added = true;
            modifications.push("Added compliance disclaimer".to_string());
        }

        let action = if modifications.is_empty() && violations.is_empty() {
            GuardrailAction::Passed
        } else {
            GuardrailAction::Modified
        };
        let confidence = confidence_for(violations.len(), modifications.len());

        info!(
            target = "faro::guardrail",
            action = ?action,
            violations = violations.len(),
            modifications = modifications.len(),
            disclaimer_added,
            language = %lang,
            "guardrail processing complete"
        );

        GuardrailResult {
            action,
            original_text: text.to_string(),
            processed_text: processed,
            modifications,
            violations_found: violations,
            disclaimer_added,
            confidence,
            detected_language: Some(lang),
        }
    }

    /// Scan for violations without modifying the text.
    #[must_use]
    pub fn scan_only(&self, text: &str, requested_language: Language) -> Vec<String> {
        let lang = self.resolve_language(text, requested_language);
        let patterns = patterns::patterns_for(lang);

        let mut violations = Vec::new();
        scan_prescriptive(text, &patterns.prescriptive, &mut violations);
        scan_patterns(text, &patterns.advice, "Advice", &mut violations);
        scan_patterns(text, &patterns.opinion, "Opinion", &mut violations);
        scan_patterns(text, &patterns.certainty, "Certainty", &mut violations);
        if lang != Language::En {
            let en = patterns::patterns_for(Language::En);
            scan_prescriptive(text, &en.prescriptive, &mut violations);
            scan_patterns(text, &en.advice, "Advice", &mut violations);
        }
        violations
    }

    /// Whether text is already compliant as-is.
    #[must_use]
    pub fn is_compliant(&self, text: &str, requested_language: Language) -> bool {
        let violations = self.scan_only(text, requested_language);
        violations.is_empty() && (has_disclaimer(text) || !self.config.auto_add_disclaimer)
    }

    /// Append a disclaimer when none is present, leaving the text otherwise
    /// untouched.
    #[must_use]
    pub fn add_disclaimer(&self, text: &str, asset: AssetKind, region: Region) -> String {
        if has_disclaimer(text) {
            return text.to_string();
        }
        let disclaimer = self.book.generate(asset, region, true);
        append_disclaimer(text, &disclaimer)
    }
}

fn scan_prescriptive(text: &str, compiled: &[Regex], violations: &mut Vec<String>) {
    for re in compiled {
        if re.is_match(text) {
            violations.push(format!("Prescriptive verb found: {}", re.as_str()));
        }
    }
}

fn scan_patterns(
    text: &str,
    compiled: &[(Regex, &'static str)],
    bucket: &str,
    violations: &mut Vec<String>,
) {
    for (re, _) in compiled {
        if re.is_match(text) {
            violations.push(format!("{bucket} pattern found: {}", re.as_str()));
        }
    }
}

fn apply_replacements(
    mut text: String,
    compiled: &[(Regex, &'static str)],
    modifications: &mut Vec<String>,
) -> String {
    for (re, replacement) in compiled {
        if re.is_match(&text) {
            text = re.replace_all(&text, *replacement).into_owned();
            modifications.push(format!("Replaced pattern: {}", re.as_str()));
        }
    }
    text
}

fn cleanup_grammar(text: &str) -> String {
    let mut result = text.to_string();
    for (re, replacement) in GRAMMAR_FIXES.iter() {
        result = re.replace_all(&result, *replacement).into_owned();
    }
    result = SENTENCE_INITIAL_LOWER
        .replace(&result, |caps: &regex::Captures<'_>| {
            format!("{}{}", &caps[1], caps[2].to_uppercase())
        })
        .into_owned();
    result.trim().to_string()
}

fn has_disclaimer(text: &str) -> bool {
    // Every language's phrase list is consulted so mixed-language content
    // with a disclaimer in either tongue is not double-stamped.
    let lower = text.to_lowercase();
    patterns::DISCLAIMER_PHRASES
        .iter()
        .flat_map(|(_, phrases)| phrases.iter())
        .any(|phrase| lower.contains(phrase))
}

fn append_disclaimer(text: &str, disclaimer: &str) -> String {
    if text.ends_with("\n\n") {
        format!("{text}{disclaimer}")
    } else if text.ends_with('\n') {
        format!("{text}\n{disclaimer}")
    } else {
        format!("{text}\n\n{disclaimer}")
    }
}

fn confidence_for(violations: usize, modifications: usize) -> f64 {
    if violations == 0 && modifications == 0 {
        return 1.0;
    }
    let reduction = 0.05 * (violations + modifications) as f64;
    (0.95 - reduction).max(0.5)
}
