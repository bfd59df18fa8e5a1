//! Cleanup of subject text taken from grid cells.
//!
//! The rules undo artifacts of the renderers that produce the source
//! documents.  They are heuristics: each one can be switched off in
//! [`NormalizerConfig`].

use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::config::NormalizerConfig;

fn leading_time_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\d{1,2}:\d{2}\s*[-–—]\s*\d{1,2}:\d{2}\s*").expect("valid regex")
    })
}

/// True for letters carrying a diacritic (`ș`, `Ă`, `é`, ...).
pub fn is_diacritic(c: char) -> bool {
    c.is_alphabetic() && std::iter::once(c).nfd().skip(1).any(is_combining_mark)
}

#[derive(Debug, Clone, Default)]
pub struct SubjectNormalizer {
    config: NormalizerConfig,
}

impl SubjectNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        SubjectNormalizer { config }
    }

    /// Returns the cleaned subject, or `None` when nothing usable is left.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        let mut text = raw.split_whitespace().collect::<Vec<_>>().join(" ");

        if self.config.strip_leaked_time {
            if let Some(m) = leading_time_regex().find(&text) {
                text = text[m.end()..].to_string();
            }
        }

        for rewrite in &self.config.prefix_rewrites {
            if let Some(rest) = text.strip_prefix(rewrite.from.as_str()) {
                if rest.is_empty() || rest.starts_with(' ') {
                    text = format!("{}{rest}", rewrite.to);
                    break;
                }
            }
        }

        let mut chars = text.chars();
        let first = chars.next()?;
        let second = chars.next();

        if self.config.reject_single_letter && second.is_none() && first.is_alphabetic() {
            return None;
        }

        if self.config.strip_stray_prefix {
            if let Some(next) = second {
                if first.is_lowercase()
                    && (next.is_uppercase() || next.is_ascii_digit() || is_diacritic(next))
                {
                    text.drain(..first.len_utf8());
                }
            }
        }

        if text.chars().count() < self.config.min_subject_len {
            return None;
        }
        Some(text)
    }
}
