//! Display-name canonicalization.
//!
//! [`NameNormalizer`] turns a free-form personal name into a [`NormalizedKey`].
//! Two names with equal keys are treated as the same person; nothing else in
//! the crate compares names.
//!
//! The pipeline is: separators become spaces, every character is lowercased
//! and folded to its unaccented base letter(s), the text is split on
//! whitespace, titles and single-letter initials are dropped, and the
//! remaining tokens are sorted and joined with one space.
//!
//! Folding is character-level. Each lowercased character is first looked up
//! in the fold table; otherwise it is canonically decomposed and its
//! combining marks are dropped, which covers Vietnamese and the Latin
//! Extended blocks. "ü" becomes "u", never "ue", so a name spelled "Mueller"
//! in one source and "Müller" in the other does not match.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;
use unicode_normalization::char::{decompose_canonical, is_combining_mark};

use crate::config::NormalizeConfig;

/// Built-in fold table for lowercase Latin-1 Supplement and Latin
/// Extended-A letters. Letters without a canonical decomposition (ø, ł, ß,
/// æ, þ) can only be folded here. User folds from the config are layered on
/// top and take precedence over decomposition.
#[rustfmt::skip]
const DEFAULT_FOLDS: &[(char, &str)] = &[
    ('à', "a"), ('á', "a"), ('â', "a"), ('ã', "a"), ('ä', "a"), ('å', "a"),
    ('ā', "a"), ('ă', "a"), ('ą', "a"),
    ('æ', "ae"),
    ('ç', "c"), ('ć', "c"), ('ĉ', "c"), ('ċ', "c"), ('č', "c"),
    ('ð', "d"), ('ď', "d"), ('đ', "d"),
    ('è', "e"), ('é', "e"), ('ê', "e"), ('ë', "e"),
    ('ē', "e"), ('ĕ', "e"), ('ė', "e"), ('ę', "e"), ('ě', "e"),
    ('ĝ', "g"), ('ğ', "g"), ('ġ', "g"), ('ģ', "g"),
    ('ĥ', "h"), ('ħ', "h"),
    ('ì', "i"), ('í', "i"), ('î', "i"), ('ï', "i"),
    ('ĩ', "i"), ('ī', "i"), ('ĭ', "i"), ('į', "i"), ('ı', "i"),
    ('ĳ', "ij"),
    ('ĵ', "j"),
    ('ķ', "k"), ('ĸ', "k"),
    ('ĺ', "l"), ('ļ', "l"), ('ľ', "l"), ('ŀ', "l"), ('ł', "l"),
    ('ñ', "n"), ('ń', "n"), ('ņ', "n"), ('ň', "n"), ('ŉ', "n"), ('ŋ', "n"),
    ('ò', "o"), ('ó', "o"), ('ô', "o"), ('õ', "o"), ('ö', "o"), ('ø', "o"),
    ('ō', "o"), ('ŏ', "o"), ('ő', "o"),
    ('œ', "oe"),
    ('ŕ', "r"), ('ŗ', "r"), ('ř', "r"),
    ('ś', "s"), ('ŝ', "s"), ('ş', "s"), ('š', "s"), ('ș', "s"), ('ſ', "s"),
    ('ß', "ss"),
    ('ţ', "t"), ('ť', "t"), ('ŧ', "t"), ('ț', "t"),
    ('þ', "th"),
    ('ù', "u"), ('ú', "u"), ('û', "u"), ('ü', "u"),
    ('ũ', "u"), ('ū', "u"), ('ŭ', "u"), ('ů', "u"), ('ű', "u"), ('ų', "u"),
    ('ŵ', "w"),
    ('ý', "y"), ('ÿ', "y"), ('ŷ', "y"),
    ('ź', "z"), ('ż', "z"), ('ž', "z"),
];

/// Canonical matching form of a display name.
///
/// The empty key is produced for names with no usable tokens and never
/// matches anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedKey(String);

impl NormalizedKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pure, deterministic name canonicalizer built from [`NormalizeConfig`].
#[derive(Debug, Clone)]
pub struct NameNormalizer {
    titles: HashSet<String>,
    separators: HashSet<char>,
    folds: HashMap<char, String>,
    drop_initials: bool,
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self::new(&NormalizeConfig::default())
    }
}

impl NameNormalizer {
    pub fn new(config: &NormalizeConfig) -> Self {
        let mut folds: HashMap<char, String> = DEFAULT_FOLDS
            .iter()
            .map(|(c, s)| (*c, s.to_string()))
            .collect();
        for (from, to) in &config.folds {
            for c in from.chars().flat_map(char::to_lowercase) {
                folds.insert(c, to.to_lowercase());
            }
        }

        let separators: HashSet<char> = config
            .separators
            .iter()
            .filter_map(|s| s.chars().next())
            .collect();

        let mut normalizer = Self {
            titles: HashSet::new(),
            separators,
            folds,
            drop_initials: config.drop_initials,
        };
        // Titles go through the same fold so "Dr" in the config matches "DR." or "dr".
        let titles: HashSet<String> = config
            .titles
            .iter()
            .map(|t| normalizer.fold(t.trim().trim_end_matches('.')))
            .filter(|t| !t.is_empty())
            .collect();
        normalizer.titles = titles;

        debug!(
            titles = normalizer.titles.len(),
            folds = normalizer.folds.len(),
            drop_initials = normalizer.drop_initials,
            "built name normalizer"
        );
        normalizer
    }

    /// Compute the matching key for a raw display name.
    pub fn normalize(&self, full_name: &str) -> NormalizedKey {
        let mut text = String::with_capacity(full_name.len());
        for c in full_name.chars() {
            if self.separators.contains(&c) {
                text.push(' ');
            } else {
                self.fold_char_into(c, &mut text);
            }
        }

        let mut tokens: Vec<&str> = text
            .split_whitespace()
            .filter(|token| !self.is_title(token))
            .filter(|token| !(self.drop_initials && token.chars().count() == 1))
            .collect();
        tokens.sort_unstable();

        NormalizedKey(tokens.join(" "))
    }

    fn is_title(&self, token: &str) -> bool {
        self.titles.contains(token.trim_end_matches('.'))
    }

    fn fold(&self, s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        for c in s.chars() {
            self.fold_char_into(c, &mut out);
        }
        out
    }

    fn fold_char_into(&self, c: char, out: &mut String) {
        for lower in c.to_lowercase() {
            if let Some(folded) = self.folds.get(&lower) {
                out.push_str(folded);
                continue;
            }
            decompose_canonical(lower, |part| {
                if is_combining_mark(part) {
                    return;
                }
                match self.folds.get(&part) {
                    Some(folded) => out.push_str(folded),
                    None => out.push(part),
                }
            });
        }
    }
}
