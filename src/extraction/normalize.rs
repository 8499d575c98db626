/*!
 * Text normalization used to compare sluglines against document lines.
 *
 * Normalized form:
 * - every dash variant becomes `-`, typographic apostrophes become `'`
 * - characters other than alphanumerics, `-`, `'` and whitespace are removed
 * - whitespace runs collapse to one space, ends are trimmed
 * - letters are uppercased
 */

/// Whether `c` is one of the dash characters found in screenplay exports
pub fn is_dash(c: char) -> bool {
    matches!(
        c,
        '-' | '\u{2010}'
            | '\u{2011}'
            | '\u{2012}'
            | '\u{2013}'
            | '\u{2014}'
            | '\u{2015}'
            | '\u{2212}'
            | '\u{FE58}'
            | '\u{FE63}'
            | '\u{FF0D}'
    )
}

fn is_apostrophe(c: char) -> bool {
    matches!(c, '\'' | '\u{2018}' | '\u{2019}' | '\u{02BC}' | '`')
}

/// Replace dash variants with `-`, leaving everything else untouched
pub fn unify_dashes(text: &str) -> String {
    text.chars()
        .map(|c| if is_dash(c) { '-' } else { c })
        .collect()
}

/// Canonical comparison form of a text fragment
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for c in text.chars() {
        let mapped = if is_dash(c) {
            Some('-')
        } else if is_apostrophe(c) {
            Some('\'')
        } else if c.is_whitespace() {
            pending_space = true;
            None
        } else if c.is_alphanumeric() {
            Some(c)
        } else {
            None
        };

        if let Some(mapped) = mapped {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(mapped.to_uppercase());
        }
    }

    out
}

/// Whitespace-separated tokens of an already normalized string
pub fn tokens(normalized: &str) -> impl Iterator<Item = &str> {
    normalized.split(' ').filter(|t| !t.is_empty())
}
