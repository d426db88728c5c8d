//! Tokens and the line tokenizer.
//!
//! Segmentation works on extended grapheme clusters:
//!
//! 1. clusters made only of whitespace are delimiters and are dropped;
//! 2. a maximal run of glyph clusters is one token;
//! 3. any other cluster becomes a token of its own.
//!
//! Nothing else is ever discarded, so concatenating the token texts of a line
//! gives back [`normalize`]`(line)`. A whitespace character that heads a
//! mixed cluster (a space carrying a combining mark) stays inside its token.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::error::CoverageFault;
use crate::grammar::{self, Split};
use crate::tables::Tables;

/// Byte range of a token within its source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An immutable slice of a source line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    text: String,
    position: usize,
    span: Span,
    split: Option<Split>,
}

impl Token {
    /// Create a token. `split` is the grammar cut, if any.
    pub(crate) fn new(
        text: impl Into<String>,
        position: usize,
        span: Span,
        split: Option<Split>,
    ) -> Self {
        Self {
            text: text.into(),
            position,
            span,
            split,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Index within the source line.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn split(&self) -> Option<Split> {
        self.split
    }

    /// Leading operator substring; empty if none was cut.
    pub fn prefix(&self) -> &str {
        self.split.map_or("", |s| s.prefix(&self.text))
    }

    /// Middle substring; the whole text if the token could not be cut.
    pub fn root(&self) -> &str {
        self.split.map_or(self.text.as_str(), |s| s.root(&self.text))
    }

    /// Trailing state substring; empty if none was cut.
    pub fn suffix(&self) -> &str {
        self.split.map_or("", |s| s.suffix(&self.text))
    }

    /// Length in grapheme clusters.
    pub fn cluster_len(&self) -> usize {
        self.text.graphemes(true).count()
    }
}

/// Remove whitespace-only grapheme clusters from a line.
pub fn normalize(line: &str) -> String {
    line.graphemes(true)
        .filter(|g| !is_whitespace_cluster(g))
        .collect()
}

fn is_whitespace_cluster(cluster: &str) -> bool {
    cluster.chars().all(char::is_whitespace)
}

/// Splits lines into tokens using a fixed table set.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    tables: Arc<Tables>,
}

impl Tokenizer {
    pub fn new(tables: Arc<Tables>) -> Self {
        Self { tables }
    }

    /// Lazily tokenize a line. The iterator is `Clone`, so it can be restarted.
    pub fn tokenize<'a>(&'a self, line: &'a str) -> Tokens<'a> {
        Tokens {
            tables: &self.tables,
            line,
            cursor: 0,
            position: 0,
        }
    }

    pub fn tokenize_all(&self, line: &str) -> Vec<Token> {
        self.tokenize(line).collect()
    }
}

/// Iterator over the tokens of one line.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    tables: &'a Tables,
    line: &'a str,
    cursor: usize,
    position: usize,
}

impl Iterator for Tokens<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let rest = &self.line[self.cursor..];
        let mut clusters = rest
            .grapheme_indices(true)
            .skip_while(|(_, g)| is_whitespace_cluster(g));

        let (offset, first) = clusters.next()?;
        let start = self.cursor + offset;
        let mut end = start + first.len();

        if self.tables.is_glyph_cluster(first) {
            for (offset, cluster) in clusters {
                if !self.tables.is_glyph_cluster(cluster) {
                    break;
                }
                end = self.cursor + offset + cluster.len();
            }
        }

        let text = &self.line[start..end];
        let token = Token::new(
            text,
            self.position,
            Span::new(start, end),
            grammar::split(self.tables, text),
        );

        self.cursor = end;
        self.position += 1;
        Some(token)
    }
}

/// Verify that `tokens` cover `line` exactly, up to whitespace.
///
/// # Errors
///
/// Returns the first [`CoverageFault`] found.
pub fn check_coverage<'t, I>(line: &str, tokens: I) -> Result<(), CoverageFault>
where
    I: IntoIterator<Item = &'t Token>,
{
    let mut cursor = 0usize;

    for (expected, token) in tokens.into_iter().enumerate() {
        let position = token.position();
        if position != expected {
            return Err(CoverageFault::PositionSkipped {
                expected,
                found: position,
            });
        }

        let span = token.span();
        if span.start < cursor {
            return Err(CoverageFault::Overlap { position });
        }
        check_gap(line, cursor, span.start)?;

        match line.get(span.start..span.end) {
            Some(text) if text == token.text() => {}
            Some(_) => return Err(CoverageFault::TextMismatch { position }),
            None => return Err(CoverageFault::OutOfBounds { position }),
        }
        cursor = span.end;
    }

    check_gap(line, cursor, line.len())
}

fn check_gap(line: &str, from: usize, to: usize) -> Result<(), CoverageFault> {
    let gap = line.get(from..to).unwrap_or_default();
    match gap.char_indices().find(|(_, c)| !c.is_whitespace()) {
        Some((offset, found)) => Err(CoverageFault::Gap {
            offset: from + offset,
            found,
        }),
        None => Ok(()),
    }
}
