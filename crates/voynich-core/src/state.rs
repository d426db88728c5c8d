//! Operator tags, state vectors and machine states.
//!
//! These are the closed vocabularies the classifiers emit and the VM folds.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Relational operator assigned to a token prefix.
///
/// `Unclassified` is a valid classification, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatorTag {
    Q,
    Qo,
    Ol,
    Or,
    Al,
    Sh,
    /// No operator prefix was recognized.
    Unclassified,
}

impl OperatorTag {
    /// The six classified tags, in canonical order.
    pub const CLASSIFIED: [OperatorTag; 6] = [
        OperatorTag::Q,
        OperatorTag::Qo,
        OperatorTag::Ol,
        OperatorTag::Or,
        OperatorTag::Al,
        OperatorTag::Sh,
    ];

    /// Check whether a prefix was recognized.
    pub fn is_classified(self) -> bool {
        self != OperatorTag::Unclassified
    }

    /// Lowercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            OperatorTag::Q => "q",
            OperatorTag::Qo => "qo",
            OperatorTag::Ol => "ol",
            OperatorTag::Or => "or",
            OperatorTag::Al => "al",
            OperatorTag::Sh => "sh",
            OperatorTag::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for OperatorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Depth axis of a state vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Depth {
    Level(u8),
    Unknown,
}

impl From<Option<u8>> for Depth {
    fn from(level: Option<u8>) -> Self {
        level.map_or(Depth::Unknown, Depth::Level)
    }
}

/// Phase axis: where in a unit the token sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Initial,
    Medial,
    Final,
    Unknown,
}

impl Phase {
    /// Swap initial and final; medial and unknown are fixed points.
    pub fn mirror(self) -> Self {
        match self {
            Phase::Initial => Phase::Final,
            Phase::Final => Phase::Initial,
            other => other,
        }
    }
}

/// Flow axis: direction of the relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    Forward,
    Reverse,
    Neutral,
    Unknown,
}

impl Flow {
    /// Swap forward and reverse.
    pub fn reverse(self) -> Self {
        match self {
            Flow::Forward => Flow::Reverse,
            Flow::Reverse => Flow::Forward,
            other => other,
        }
    }

    /// Blend two flows: agreement keeps, neutral defers, opposition cancels.
    pub fn blend(self, other: Flow) -> Self {
        match (self, other) {
            (a, b) if a == b => a,
            (Flow::Unknown, b) => b,
            (a, Flow::Unknown) => a,
            (Flow::Neutral, b) => b,
            (a, Flow::Neutral) => a,
            _ => Flow::Neutral,
        }
    }
}

/// Three-axis classification of a token suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StateVector {
    pub depth: Depth,
    pub phase: Phase,
    pub flow: Flow,
}

impl StateVector {
    /// Vector assigned when no suffix is recognized.
    pub const UNDEFINED: StateVector = StateVector {
        depth: Depth::Unknown,
        phase: Phase::Unknown,
        flow: Flow::Unknown,
    };

    pub fn new(depth: Depth, phase: Phase, flow: Flow) -> Self {
        Self { depth, phase, flow }
    }

    /// True when every axis is unknown.
    pub fn is_undefined(&self) -> bool {
        *self == Self::UNDEFINED
    }
}

impl Default for StateVector {
    fn default() -> Self {
        Self::UNDEFINED
    }
}

/// Cumulative VM state. Graph nodes are identified by this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MachineState {
    pub depth: u8,
    pub phase: Phase,
    pub flow: Flow,
}

impl MachineState {
    /// Highest depth the machine can hold.
    pub const MAX_DEPTH: u8 = 15;

    /// State every run starts from.
    pub const ORIGIN: MachineState = MachineState {
        depth: 0,
        phase: Phase::Initial,
        flow: Flow::Neutral,
    };

    pub fn new(depth: u8, phase: Phase, flow: Flow) -> Self {
        Self {
            depth: depth.min(Self::MAX_DEPTH),
            phase,
            flow,
        }
    }
}

impl Default for MachineState {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {:?}, {:?})", self.depth, self.phase, self.flow)
    }
}
