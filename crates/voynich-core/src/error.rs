//! Error types for table construction and line execution.
//!
//! Classification uncertainty is never an error: `Unclassified` operators
//! and `Unknown` state axes are ordinary data. Only table-authoring bugs and
//! broken internal invariants end up here.

use thiserror::Error;

/// Errors that can occur while building classification tables.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableError {
    /// A table entry has an empty pattern.
    #[error("{table} table contains an empty pattern")]
    EmptyPattern { table: &'static str },

    /// The same pattern is declared twice, so the tie-break is not total.
    #[error("decomposition ambiguous: {table} pattern {pattern:?} is declared twice")]
    DecompositionAmbiguous {
        table: &'static str,
        pattern: String,
    },

    /// A pattern uses a character outside the glyph alphabet.
    #[error("{table} pattern {pattern:?} uses {glyph:?}, which is not a glyph")]
    ForeignGlyph {
        table: &'static str,
        pattern: String,
        glyph: char,
    },

    /// A suffix entry resolves depth beyond the machine maximum.
    #[error("suffix {pattern:?} has depth {depth}, maximum is {max}")]
    DepthOutOfRange { pattern: String, depth: u8, max: u8 },

    /// No glyphs were declared.
    #[error("glyph alphabet is empty")]
    EmptyAlphabet,

    /// Minimum token length of zero would admit empty roots.
    #[error("minimum token length must be at least 1")]
    ZeroMinLength,

    /// The table document could not be parsed.
    #[error("invalid table document: {0}")]
    Parse(String),
}

/// Errors that abort a run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RunError {
    /// The instruction stream does not cover its source line.
    #[error("tokenizer coverage violation: {0}")]
    TokenizerCoverageViolation(CoverageFault),

    /// A run inside a multi-line batch failed.
    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<RunError>,
    },
}

impl RunError {
    /// Attach the index of the line that failed.
    pub fn at_line(self, line: usize) -> Self {
        RunError::AtLine {
            line,
            source: Box::new(self),
        }
    }
}

/// The specific way an instruction stream broke total coverage.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoverageFault {
    /// Non-whitespace text between two tokens was not tokenized.
    #[error("untokenized {found:?} at byte {offset}")]
    Gap { offset: usize, found: char },

    /// A token starts before the previous one ended.
    #[error("token {position} overlaps the previous token")]
    Overlap { position: usize },

    /// Token positions are not consecutive.
    #[error("expected token position {expected}, found {found}")]
    PositionSkipped { expected: usize, found: usize },

    /// A token's text differs from the line text under its span.
    #[error("token {position} does not match the line text under its span")]
    TextMismatch { position: usize },

    /// A token's span runs past the end of the line.
    #[error("token {position} extends past the end of the line")]
    OutOfBounds { position: usize },
}

impl From<CoverageFault> for RunError {
    fn from(fault: CoverageFault) -> Self {
        RunError::TokenizerCoverageViolation(fault)
    }
}
