//! Classification tables.
//!
//! A [`Tables`] value is the complete configuration of the pipeline: glyph
//! alphabet, minimum token length, operator table and suffix table. It is
//! immutable once built and shared through `Arc`, so several table versions
//! can be run side by side against the same corpus.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::TableError;
use crate::matcher::Matcher;
use crate::state::{Depth, Flow, MachineState, OperatorTag, Phase, StateVector};

/// Serializable description of a table set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableSpec {
    /// Every character that may appear inside a word.
    pub glyphs: String,
    /// Shortest decomposable token, in grapheme clusters.
    #[serde(default = "default_min_token_len")]
    pub min_token_len: usize,
    /// Operator prefixes in priority order.
    #[serde(default)]
    pub operators: Vec<OperatorEntry>,
    /// State suffixes in priority order.
    #[serde(default)]
    pub suffixes: Vec<SuffixEntry>,
}

fn default_min_token_len() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperatorEntry {
    pub pattern: String,
    pub tag: OperatorTag,
}

/// A suffix and the axes it resolves. Omitted axes are `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuffixEntry {
    pub pattern: String,
    #[serde(default)]
    pub depth: Option<u8>,
    #[serde(default)]
    pub phase: Option<Phase>,
    #[serde(default)]
    pub flow: Option<Flow>,
}

impl SuffixEntry {
    fn vector(&self) -> StateVector {
        StateVector::new(
            Depth::from(self.depth),
            self.phase.unwrap_or(Phase::Unknown),
            self.flow.unwrap_or(Flow::Unknown),
        )
    }
}

/// Validated, immutable classification tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tables {
    glyphs: BTreeSet<char>,
    min_token_len: usize,
    operators: Matcher<OperatorTag>,
    suffixes: Matcher<StateVector>,
}

impl Tables {
    /// Validate a table description.
    ///
    /// # Errors
    ///
    /// Returns an error if the alphabet is empty, a pattern is empty,
    /// duplicated, or uses a non-glyph character, or a depth is out of range.
    pub fn from_spec(spec: TableSpec) -> Result<Self, TableError> {
        let glyphs: BTreeSet<char> = spec.glyphs.chars().filter(|c| !c.is_whitespace()).collect();
        if glyphs.is_empty() {
            return Err(TableError::EmptyAlphabet);
        }
        if spec.min_token_len == 0 {
            return Err(TableError::ZeroMinLength);
        }

        for entry in &spec.operators {
            check_glyphs("operator", &entry.pattern, &glyphs)?;
        }
        for entry in &spec.suffixes {
            check_glyphs("suffix", &entry.pattern, &glyphs)?;
            if let Some(depth) = entry.depth {
                if depth > MachineState::MAX_DEPTH {
                    return Err(TableError::DepthOutOfRange {
                        pattern: entry.pattern.clone(),
                        depth,
                        max: MachineState::MAX_DEPTH,
                    });
                }
            }
        }

        let operators = Matcher::new(
            "operator",
            spec.operators.into_iter().map(|e| (e.pattern, e.tag)),
        )?;
        let suffixes = Matcher::new(
            "suffix",
            spec.suffixes.iter().map(|e| (e.pattern.clone(), e.vector())),
        )?;

        Ok(Self {
            glyphs,
            min_token_len: spec.min_token_len,
            operators,
            suffixes,
        })
    }

    /// Load tables from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Parse`] for malformed TOML and any validation
    /// error from [`Tables::from_spec`].
    pub fn from_toml_str(source: &str) -> Result<Self, TableError> {
        let spec: TableSpec =
            toml::from_str(source).map_err(|e| TableError::Parse(e.to_string()))?;
        let tables = Self::from_spec(spec)?;
        tracing::debug!(
            operators = tables.operators.len(),
            suffixes = tables.suffixes.len(),
            glyphs = tables.glyphs.len(),
            "loaded classification tables"
        );
        Ok(tables)
    }

    /// The canonical EVA table description.
    pub fn eva_spec() -> TableSpec {
        let op = |pattern: &str, tag| OperatorEntry {
            pattern: pattern.into(),
            tag,
        };
        let sfx = |pattern: &str, depth, phase, flow| SuffixEntry {
            pattern: pattern.into(),
            depth,
            phase,
            flow,
        };

        TableSpec {
            glyphs: ('a'..='z').collect(),
            min_token_len: 1,
            operators: vec![
                op("qo", OperatorTag::Qo),
                op("q", OperatorTag::Q),
                op("ol", OperatorTag::Ol),
                op("or", OperatorTag::Or),
                op("al", OperatorTag::Al),
                op("sh", OperatorTag::Sh),
            ],
            suffixes: vec![
                sfx("chedy", Some(2), Some(Phase::Medial), Some(Flow::Forward)),
                sfx("aiiin", Some(3), Some(Phase::Initial), Some(Flow::Reverse)),
                sfx("aiin", Some(2), Some(Phase::Initial), Some(Flow::Reverse)),
                sfx("ain", Some(1), Some(Phase::Initial), Some(Flow::Reverse)),
                sfx("dy", Some(1), Some(Phase::Final), Some(Flow::Forward)),
                sfx("am", Some(0), Some(Phase::Final), Some(Flow::Neutral)),
                sfx("al", Some(1), Some(Phase::Medial), None),
                sfx("ol", None, Some(Phase::Medial), Some(Flow::Neutral)),
                sfx("or", None, Some(Phase::Medial), Some(Flow::Reverse)),
                sfx("y", None, None, Some(Flow::Neutral)),
            ],
        }
    }

    /// Check if a single character belongs to the glyph alphabet.
    pub fn is_glyph(&self, c: char) -> bool {
        self.glyphs.contains(&c)
    }

    /// Check if a grapheme cluster is exactly one glyph.
    pub fn is_glyph_cluster(&self, cluster: &str) -> bool {
        let mut chars = cluster.chars();
        matches!((chars.next(), chars.next()), (Some(c), None) if self.is_glyph(c))
    }

    pub fn min_token_len(&self) -> usize {
        self.min_token_len
    }

    pub fn operators(&self) -> &Matcher<OperatorTag> {
        &self.operators
    }

    pub fn suffixes(&self) -> &Matcher<StateVector> {
        &self.suffixes
    }
}

impl Default for Tables {
    fn default() -> Self {
        match Self::from_spec(Self::eva_spec()) {
            Ok(tables) => tables,
            Err(e) => unreachable!("canonical tables are valid: {e}"),
        }
    }
}

fn check_glyphs(
    table: &'static str,
    pattern: &str,
    glyphs: &BTreeSet<char>,
) -> Result<(), TableError> {
    match pattern.chars().find(|c| !glyphs.contains(c)) {
        Some(glyph) => Err(TableError::ForeignGlyph {
            table,
            pattern: pattern.to_string(),
            glyph,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables_build() {
        let tables = Tables::default();
        assert_eq!(tables.operators().len(), 6);
        assert_eq!(tables.suffixes().len(), 10);
        assert!(tables.is_glyph('q'));
        assert!(!tables.is_glyph('.'));
    }

    #[test]
    fn test_bundled_toml_matches_default() {
        let bundled = Tables::from_toml_str(include_str!("../tables/eva.toml")).unwrap();
        assert_eq!(bundled, Tables::default());
    }

    #[test]
    fn test_partial_suffix_axes_are_unknown() {
        let tables = Tables::default();
        let y = tables.suffixes().get("y").unwrap();
        assert_eq!(y.depth, Depth::Unknown);
        assert_eq!(y.phase, Phase::Unknown);
        assert_eq!(y.flow, Flow::Neutral);
    }

    #[test]
    fn test_duplicate_operator_rejected() {
        let mut spec = Tables::eva_spec();
        spec.operators.push(OperatorEntry {
            pattern: "ol".into(),
            tag: OperatorTag::Al,
        });
        assert!(matches!(
            Tables::from_spec(spec),
            Err(TableError::DecompositionAmbiguous { table: "operator", .. })
        ));
    }

    #[test]
    fn test_foreign_glyph_rejected() {
        let mut spec = Tables::eva_spec();
        spec.suffixes.push(SuffixEntry {
            pattern: "d!".into(),
            depth: None,
            phase: None,
            flow: None,
        });
        assert_eq!(
            Tables::from_spec(spec),
            Err(TableError::ForeignGlyph {
                table: "suffix",
                pattern: "d!".into(),
                glyph: '!'
            })
        );
    }

    #[test]
    fn test_depth_out_of_range_rejected() {
        let mut spec = Tables::eva_spec();
        spec.suffixes[0].depth = Some(40);
        assert!(matches!(
            Tables::from_spec(spec),
            Err(TableError::DepthOutOfRange { depth: 40, .. })
        ));
    }

    #[test]
    fn test_zero_min_length_rejected() {
        let mut spec = Tables::eva_spec();
        spec.min_token_len = 0;
        assert_eq!(Tables::from_spec(spec), Err(TableError::ZeroMinLength));
    }

    #[test]
    fn test_toml_parse_error() {
        let result = Tables::from_toml_str("glyphs = ");
        assert!(matches!(result, Err(TableError::Parse(_))));
    }

    #[test]
    fn test_toml_unknown_field_rejected() {
        let source = r#"
            glyphs = "abc"
            colour = "blue"
        "#;
        assert!(matches!(Tables::from_toml_str(source), Err(TableError::Parse(_))));
    }
}
