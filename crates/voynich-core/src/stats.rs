//! Corpus statistics over executed lines.

use std::collections::BTreeMap;

use crate::grammar::Verdict;
use crate::runner::{CorpusRun, LineRun};
use crate::state::{OperatorTag, StateVector};

/// Counts and histograms collected from line runs.
///
/// Lines without tokens are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorpusStats {
    pub lines: usize,
    pub tokens: usize,
    pub operator_counts: BTreeMap<OperatorTag, usize>,
    pub vector_counts: BTreeMap<StateVector, usize>,
    pub verdict_counts: BTreeMap<Verdict, usize>,
    /// Token length in grapheme clusters -> count.
    pub token_length_hist: BTreeMap<usize, usize>,
    /// Tokens per line -> count.
    pub line_length_hist: BTreeMap<usize, usize>,
}

impl CorpusStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_corpus(corpus: &CorpusRun) -> Self {
        let mut stats = Self::new();
        for line in &corpus.lines {
            stats.record(line);
        }
        stats
    }

    /// Add one line run.
    pub fn record(&mut self, line: &LineRun) {
        let trace = &line.run.trace;
        if trace.is_empty() {
            return;
        }

        self.lines += 1;
        self.tokens += trace.len();
        *self.line_length_hist.entry(trace.len()).or_default() += 1;

        for record in trace {
            *self.operator_counts.entry(record.op).or_default() += 1;
            *self.vector_counts.entry(record.vector).or_default() += 1;
            *self.verdict_counts.entry(record.verdict).or_default() += 1;
            *self
                .token_length_hist
                .entry(record.token.cluster_len())
                .or_default() += 1;
        }
    }

    /// Share of tokens whose prefix was not recognized.
    pub fn unclassified_ratio(&self) -> f64 {
        if self.tokens == 0 {
            return 0.0;
        }
        let unclassified = self
            .operator_counts
            .get(&OperatorTag::Unclassified)
            .copied()
            .unwrap_or(0);
        unclassified as f64 / self.tokens as f64
    }
}
