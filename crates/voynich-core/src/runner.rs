//! Pipeline orchestration over lines.
//!
//! Each line gets its own VM starting at the origin and its own empty
//! graph. Multi-line runs merge the per-line graphs in line order in one
//! coordinating step, so sequential and parallel runs agree exactly.

use std::sync::Arc;

use rayon::prelude::*;

use crate::classify::{Classifier, Instruction};
use crate::error::RunError;
use crate::graph::TransitionGraph;
use crate::rule::{StandardRule, TransitionRule};
use crate::tables::Tables;
use crate::token::{check_coverage, Token, Tokenizer};
use crate::vm::{Run, Vm};

/// The run of one source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRun {
    /// Index of the line in its batch.
    pub index: usize,
    pub text: String,
    pub run: Run,
}

/// Runs of a batch of lines plus their merged graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorpusRun {
    pub lines: Vec<LineRun>,
    pub merged: TransitionGraph,
}

impl CorpusRun {
    fn assemble(lines: Vec<LineRun>) -> Self {
        let merged = TransitionGraph::merge(lines.iter().map(|l| &l.run.graph));
        Self { lines, merged }
    }

    /// Total instructions executed across all lines.
    pub fn steps(&self) -> usize {
        self.lines.iter().map(|l| l.run.trace.len()).sum()
    }
}

/// Tokenizer, classifier and VM wired to one table set and one rule.
#[derive(Debug, Clone)]
pub struct Runner<R = StandardRule> {
    tables: Arc<Tables>,
    tokenizer: Tokenizer,
    classifier: Classifier,
    rule: R,
}

impl Runner<StandardRule> {
    pub fn new(tables: Arc<Tables>) -> Self {
        Self::with_rule(tables, StandardRule)
    }
}

impl Default for Runner<StandardRule> {
    fn default() -> Self {
        Self::new(Arc::new(Tables::default()))
    }
}

impl<R: TransitionRule + Clone> Runner<R> {
    pub fn with_rule(tables: Arc<Tables>, rule: R) -> Self {
        Self {
            tokenizer: Tokenizer::new(Arc::clone(&tables)),
            classifier: Classifier::new(Arc::clone(&tables)),
            tables,
            rule,
        }
    }

    pub fn tables(&self) -> &Arc<Tables> {
        &self.tables
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Tokenize and classify a line.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::TokenizerCoverageViolation`] if the tokens do not
    /// cover the line.
    pub fn instructions(&self, line: &str) -> Result<Vec<Instruction>, RunError> {
        let tokens: Vec<Token> = self.tokenizer.tokenize(line).collect();
        if let Err(fault) = check_coverage(line, &tokens) {
            tracing::warn!(%fault, "tokens do not cover line");
            return Err(fault.into());
        }
        Ok(tokens
            .into_iter()
            .map(|t| self.classifier.instruction(t))
            .collect())
    }

    /// Run one line from the origin state.
    ///
    /// # Errors
    ///
    /// Returns the first coverage violation.
    pub fn run_line(&self, line: &str) -> Result<Run, RunError> {
        let instructions = self.instructions(line)?;
        let run = Vm::run(self.rule.clone(), instructions)?;
        tracing::debug!(
            tokens = run.trace.len(),
            nodes = run.graph.node_count(),
            edges = run.graph.edge_count(),
            "line executed"
        );
        Ok(run)
    }

    fn run_indexed(&self, index: usize, line: &str) -> Result<LineRun, RunError> {
        let run = self.run_line(line).map_err(|e| e.at_line(index))?;
        Ok(LineRun {
            index,
            text: line.to_string(),
            run,
        })
    }

    /// Run lines one after another and merge their graphs.
    ///
    /// # Errors
    ///
    /// Returns the first failure wrapped in [`RunError::AtLine`].
    pub fn run_lines<I, S>(&self, lines: I) -> Result<CorpusRun, RunError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let _span = tracing::info_span!("run_lines").entered();
        let runs = lines
            .into_iter()
            .enumerate()
            .map(|(i, line)| self.run_indexed(i, line.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CorpusRun::assemble(runs))
    }
}

impl<R: TransitionRule + Clone + Sync + Send> Runner<R> {
    /// Run lines on the rayon pool, then merge in line order.
    ///
    /// Produces exactly what [`Runner::run_lines`] produces.
    ///
    /// # Errors
    ///
    /// Returns the failure of the lowest-indexed failing line.
    pub fn run_lines_parallel<S>(&self, lines: &[S]) -> Result<CorpusRun, RunError>
    where
        S: AsRef<str> + Sync,
    {
        let _span = tracing::info_span!("run_lines_parallel", lines = lines.len()).entered();
        let results: Vec<Result<LineRun, RunError>> = lines
            .par_iter()
            .enumerate()
            .map(|(i, line)| self.run_indexed(i, line.as_ref()))
            .collect();
        let runs = results.into_iter().collect::<Result<Vec<_>, _>>()?;
        Ok(CorpusRun::assemble(runs))
    }
}
