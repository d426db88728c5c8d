//! Voynich VM: deterministic classification and execution of transliterated
//! manuscript lines.
//!
//! # Overview
//!
//! A line of EVA text goes through a fixed pipeline:
//!
//! - **Tokenizer**: splits the line into tokens with total coverage
//! - **Grammar validator**: checks `prefix root suffix` shape
//! - **Prefix / suffix classifiers**: operator tag and state vector
//! - **VM**: folds the instruction stream into a state-transition graph
//!   and an execution trace
//!
//! Classification never fails: unknown prefixes are `Unclassified`, unknown
//! suffix axes are `Unknown`, and both flow into the output as data. The only
//! errors are table-authoring bugs ([`TableError`]) and broken coverage
//! invariants ([`RunError`]).
//!
//! # Example
//!
//! ```
//! use voynich_core::{MachineState, OperatorTag, Runner};
//!
//! let runner = Runner::default();
//! let run = runner.run_line("qokeedy").unwrap();
//!
//! assert_eq!(run.trace.len(), 1);
//! let record = &run.trace.records()[0];
//! assert_eq!(record.op, OperatorTag::Qo);
//! assert_eq!(record.state_before, MachineState::ORIGIN);
//!
//! // One edge from the origin to the new state, labeled `qo`.
//! assert_eq!(run.graph.edge_count(), 1);
//! assert_eq!(run.graph.edges()[0].op, OperatorTag::Qo);
//! ```
//!
//! # Tables
//!
//! All classification data lives in an immutable [`Tables`] value injected
//! at construction. Alternative tables can be loaded from TOML and run side
//! by side with the canonical ones:
//!
//! ```
//! use std::sync::Arc;
//! use voynich_core::{OperatorTag, Runner, Tables};
//!
//! let tables = Tables::from_toml_str(r#"
//!     glyphs = "abcdefghijklmnopqrstuvwxyz"
//!
//!     [[operators]]
//!     pattern = "ok"
//!     tag = "qo"
//! "#).unwrap();
//!
//! let runner = Runner::new(Arc::new(tables));
//! let run = runner.run_line("okeey").unwrap();
//! assert_eq!(run.trace.records()[0].op, OperatorTag::Qo);
//! assert!(run.trace.records()[0].vector.is_undefined());
//! ```

pub mod classify;
pub mod error;
pub mod grammar;
pub mod graph;
pub mod matcher;
pub mod rule;
pub mod runner;
pub mod state;
pub mod stats;
pub mod tables;
pub mod token;
pub mod trace;
pub mod vm;

pub use classify::{Classifier, Instruction, PrefixClassifier, SuffixClassifier};
pub use error::{CoverageFault, RunError, TableError};
pub use grammar::{GrammarValidator, Production, Split, Verdict};
pub use graph::{Edge, EdgeId, GraphBuilder, GraphExport, NodeId, TransitionGraph};
pub use matcher::Matcher;
pub use rule::{StandardRule, TransitionRule};
pub use runner::{CorpusRun, LineRun, Runner};
pub use state::{Depth, Flow, MachineState, OperatorTag, Phase, StateVector};
pub use stats::CorpusStats;
pub use tables::{Tables, TableSpec};
pub use token::{check_coverage, normalize, Span, Token, Tokenizer};
pub use trace::{ExecutionRecord, ExecutionTrace};
pub use vm::{Run, Vm};
