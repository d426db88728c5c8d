//! Static word grammar.
//!
//! ```text
//! WORD := REL STEM STATE | REL STEM | STEM STATE | STEM
//! ```
//!
//! `REL` comes from the operator table, `STATE` from the suffix table and
//! `STEM` is the non-empty residue. The grammar is not recursive, so a
//! token either splits or it doesn't; nothing here can fail.

use std::iter;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::tables::Tables;
use crate::token::Token;

/// Byte lengths of the prefix and suffix cut from a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Split {
    pub prefix_len: usize,
    pub suffix_len: usize,
}

impl Split {
    /// Leading operator substring of `text`.
    ///
    /// All three accessors return `""` when the cut does not fit `text`.
    pub fn prefix<'t>(&self, text: &'t str) -> &'t str {
        text.get(..self.prefix_len).unwrap_or("")
    }

    pub fn root<'t>(&self, text: &'t str) -> &'t str {
        text.len()
            .checked_sub(self.suffix_len)
            .and_then(|end| text.get(self.prefix_len..end))
            .unwrap_or("")
    }

    pub fn suffix<'t>(&self, text: &'t str) -> &'t str {
        text.len()
            .checked_sub(self.suffix_len)
            .and_then(|start| text.get(start..))
            .unwrap_or("")
    }
}

/// Cut `text` into prefix, root and suffix.
///
/// Prefix candidates are tried best-first, then the empty prefix; for each,
/// suffix candidates of the remainder likewise. The first pair leaving a
/// non-empty root wins. Returns `None` when the text is shorter than the
/// minimum token length or holds a non-glyph cluster.
pub fn split(tables: &Tables, text: &str) -> Option<Split> {
    let mut clusters = 0usize;
    for cluster in text.graphemes(true) {
        if !tables.is_glyph_cluster(cluster) {
            return None;
        }
        clusters += 1;
    }
    if clusters < tables.min_token_len() {
        return None;
    }

    let prefixes = tables
        .operators()
        .prefixes_of(text)
        .map(|m| m.pattern.len())
        .chain(iter::once(0));

    for prefix_len in prefixes {
        let rest = &text[prefix_len..];
        let suffixes = tables
            .suffixes()
            .suffixes_of(rest)
            .map(|m| m.pattern.len())
            .chain(iter::once(0));
        for suffix_len in suffixes {
            if prefix_len + suffix_len < text.len() {
                return Some(Split {
                    prefix_len,
                    suffix_len,
                });
            }
        }
    }

    None
}

/// Which production a decomposed token matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Production {
    RelStemState,
    RelStem,
    StemState,
    Stem,
}

impl Production {
    pub const ALL: [Production; 4] = [
        Production::RelStemState,
        Production::RelStem,
        Production::StemState,
        Production::Stem,
    ];

    fn from_parts(rel: bool, state: bool) -> Self {
        match (rel, state) {
            (true, true) => Production::RelStemState,
            (true, false) => Production::RelStem,
            (false, true) => Production::StemState,
            (false, false) => Production::Stem,
        }
    }

    pub fn verdict(self) -> Verdict {
        match self {
            Production::RelStemState => Verdict::Valid,
            _ => Verdict::PartiallyValid,
        }
    }
}

/// Validation outcome for one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Recognized prefix, non-empty root and recognized suffix.
    Valid,
    /// Decomposable, but prefix or suffix is missing.
    PartiallyValid,
    /// Cannot be cut into prefix, root and suffix.
    Invalid,
}

/// Checks token shape against the grammar.
#[derive(Debug, Clone)]
pub struct GrammarValidator {
    tables: Arc<Tables>,
}

impl GrammarValidator {
    pub fn new(tables: Arc<Tables>) -> Self {
        Self { tables }
    }

    /// Cut the token with this validator's tables.
    ///
    /// The cut stored on the token came from the tokenizer's tables and is
    /// not consulted.
    pub fn cut(&self, token: &Token) -> Option<Split> {
        split(&self.tables, token.text())
    }

    /// The production a token matches, or `None` if it cannot be decomposed.
    pub fn production(&self, token: &Token) -> Option<Production> {
        self.cut(token)
            .map(|s| Production::from_parts(s.prefix_len > 0, s.suffix_len > 0))
    }

    pub fn validate(&self, token: &Token) -> Verdict {
        self.production(token)
            .map_or(Verdict::Invalid, Production::verdict)
    }
}
