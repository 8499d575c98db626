/*!
 * Locating sluglines inside the raw document.
 *
 * Strategies, first match wins and the earliest position wins ties:
 * 1. exact match of a whole normalized line
 * 2. a line holding the scene number token and the first location token
 * 3. a whitespace-tolerant pattern built from the normalized slugline,
 *    searched in the raw text (catches headings wrapped over two lines)
 *
 * Resolution never involves randomness; the same document and slugline
 * always yield the same offset.
 */

use log::{debug, warn};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::extraction::document::Document;
use crate::extraction::normalize::{normalize, tokens};
use crate::extraction::sluglines::Slugline;

/// Interior/exterior markers as they look after normalization
const INT_EXT_TOKENS: &[&str] = &[
    "INT", "EXT", "INTEXT", "EXTINT", "IE", "EI", "INTERIOR", "EXTERIOR",
];

const DASH_CLASS: &str = r"[-\x{2010}-\x{2015}\x{2212}\x{FE58}\x{FE63}\x{FF0D}]";
const APOSTROPHE_CLASS: &str = r"['`\x{2018}\x{2019}\x{02BC}]";
const PUNCTUATION: &str = r"[^\p{L}\p{N}\s]*";

/// How an offset was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    ExactLine,
    NumberAndLocation,
    Pattern,
}

/// Position of one slugline in the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedOffset {
    pub slugline_index: usize,
    /// Byte offset, `None` when no strategy matched
    pub char_offset: Option<usize>,
    pub strategy: Option<MatchStrategy>,
}

impl ResolvedOffset {
    pub fn is_resolved(&self) -> bool {
        self.char_offset.is_some()
    }

    /// Offset as recorded for reporting; unresolved headings record 0
    pub fn recorded_offset(&self) -> usize {
        self.char_offset.unwrap_or(0)
    }
}

/// Scene number and first location token of a normalized slugline
fn number_and_location(normalized: &str) -> Option<(&str, &str)> {
    let parts: Vec<&str> = tokens(normalized).filter(|t| *t != "-").collect();
    let number = *parts.first()?;
    if !number.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let rest = &parts[1..];
    let location = match rest.iter().position(|t| INT_EXT_TOKENS.contains(t)) {
        Some(marker) => rest.get(marker + 1),
        None => rest.first(),
    };
    location.map(|location| (number, *location))
}

/// Pattern matching the slugline across punctuation, dash and whitespace noise
fn slugline_pattern(normalized: &str) -> Option<Regex> {
    let parts: Vec<String> = tokens(normalized)
        .map(|token| {
            token
                .chars()
                .map(|c| match c {
                    '-' => DASH_CLASS.to_string(),
                    '\'' => APOSTROPHE_CLASS.to_string(),
                    other => regex::escape(&other.to_string()),
                })
                .collect::<String>()
        })
        .collect();

    if parts.is_empty() {
        return None;
    }

    let separator = format!(r"{}\s+{}", PUNCTUATION, PUNCTUATION);
    let pattern = format!(r"{}{}", parts.join(&separator), PUNCTUATION);
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| warn!("Could not build slugline pattern: {}", e))
        .ok()
}

fn next_char_boundary(text: &str, offset: usize) -> usize {
    text.get(offset..)
        .and_then(|rest| rest.chars().next())
        .map(|c| offset + c.len_utf8())
        .unwrap_or(text.len())
}

/// Resolves slugline positions with layered matching
#[derive(Debug, Default, Clone, Copy)]
pub struct OffsetResolver;

impl OffsetResolver {
    pub fn new() -> Self {
        Self
    }

    /// First match at or after `from`
    pub fn resolve_from(&self, document: &Document, slugline: &str, from: usize) -> Option<(usize, MatchStrategy)> {
        let normalized = normalize(slugline);
        if normalized.is_empty() {
            return None;
        }

        let normalized_lines: Vec<(usize, String)> = document
            .lines_from(from)
            .map(|(span, line)| (span.start, normalize(line)))
            .collect();

        if let Some((start, _)) = normalized_lines.iter().find(|(_, line)| *line == normalized) {
            return Some((*start, MatchStrategy::ExactLine));
        }

        if let Some((number, location)) = number_and_location(&normalized) {
            if let Some((start, _)) = normalized_lines
                .iter()
                .find(|(_, line)| tokens(line).any(|t| t == number) && line.contains(location))
            {
                return Some((*start, MatchStrategy::NumberAndLocation));
            }
        }

        let pattern = slugline_pattern(&normalized)?;
        let from = from.min(document.len());
        pattern
            .find_at(document.text(), from)
            .map(|found| (found.start(), MatchStrategy::Pattern))
    }

    /// Resolve one slugline against the whole document
    pub fn resolve(&self, document: &Document, slugline: &Slugline) -> ResolvedOffset {
        let found = self.resolve_from(document, &slugline.text, 0);
        if found.is_none() {
            warn!("Could not resolve slugline {} ({:?})", slugline.index, slugline.text);
        }
        ResolvedOffset {
            slugline_index: slugline.index,
            char_offset: found.map(|(offset, _)| offset),
            strategy: found.map(|(_, strategy)| strategy),
        }
    }

    /// Resolve every slugline, searching after the previous boundary first
    ///
    /// Repeated identical headings land on successive occurrences. A heading
    /// not found after the cursor is searched in the whole document.
    pub fn resolve_all(&self, document: &Document, sluglines: &[Slugline]) -> Vec<ResolvedOffset> {
        let mut cursor = 0;
        let mut resolved = Vec::with_capacity(sluglines.len());

        for slugline in sluglines {
            let mut found = self.resolve_from(document, &slugline.text, cursor);
            if found.is_none() && cursor > 0 {
                found = self.resolve_from(document, &slugline.text, 0);
                if let Some((offset, _)) = found {
                    debug!(
                        "Slugline {} only found before the previous boundary (at {})",
                        slugline.index, offset
                    );
                }
            }

            match found {
                Some((offset, strategy)) => {
                    debug!("Slugline {} resolved at {} via {:?}", slugline.index, offset, strategy);
                    if offset >= cursor {
                        cursor = next_char_boundary(document.text(), offset);
                    }
                }
                None => warn!(
                    "Could not resolve slugline {} ({:?}); its scene will be empty",
                    slugline.index, slugline.text
                ),
            }

            resolved.push(ResolvedOffset {
                slugline_index: slugline.index,
                char_offset: found.map(|(offset, _)| offset),
                strategy: found.map(|(_, strategy)| strategy),
            });
        }

        resolved
    }
}
