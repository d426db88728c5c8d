//! Transition combination functions.

use crate::state::{Depth, Flow, MachineState, OperatorTag, Phase, StateVector};

/// Total function from `(state, op, vector)` to the next state.
///
/// Implementations must be deterministic and defined for every input,
/// including `Unclassified` operators and `Unknown` axes.
pub trait TransitionRule {
    fn apply(&self, state: MachineState, op: OperatorTag, vector: StateVector) -> MachineState;
}

/// The canonical rule.
///
/// `Unclassified` is the identity. Otherwise each axis is combined on its
/// own and an `Unknown` axis leaves the state axis as it was:
///
/// | op   | depth            | phase       | flow          |
/// |------|------------------|-------------|---------------|
/// | `q`  | `d`              | `p`         | `f`           |
/// | `qo` | `s + d` (capped) | `p`         | `f`           |
/// | `ol` | `max(s, d)`      | `p`         | `f`           |
/// | `or` | `min(s, d)`      | mirror `p`  | reverse `f`   |
/// | `al` | `s - d` (sat.)   | `p`         | blend `s`,`f` |
/// | `sh` | `(s + d) / 2`    | `p`         | `f`           |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StandardRule;

impl TransitionRule for StandardRule {
    fn apply(&self, state: MachineState, op: OperatorTag, vector: StateVector) -> MachineState {
        if op == OperatorTag::Unclassified {
            return state;
        }
        MachineState::new(
            combine_depth(state.depth, vector.depth, op),
            combine_phase(state.phase, vector.phase, op),
            combine_flow(state.flow, vector.flow, op),
        )
    }
}

fn combine_depth(current: u8, depth: Depth, op: OperatorTag) -> u8 {
    let Depth::Level(d) = depth else {
        return current;
    };
    match op {
        OperatorTag::Q => d,
        OperatorTag::Qo => current.saturating_add(d).min(MachineState::MAX_DEPTH),
        OperatorTag::Ol => current.max(d),
        OperatorTag::Or => current.min(d),
        OperatorTag::Al => current.saturating_sub(d),
        OperatorTag::Sh => ((u16::from(current) + u16::from(d)) / 2) as u8,
        OperatorTag::Unclassified => current,
    }
}

fn combine_phase(current: Phase, phase: Phase, op: OperatorTag) -> Phase {
    match (phase, op) {
        (Phase::Unknown, _) | (_, OperatorTag::Unclassified) => current,
        (p, OperatorTag::Or) => p.mirror(),
        (p, _) => p,
    }
}

fn combine_flow(current: Flow, flow: Flow, op: OperatorTag) -> Flow {
    match (flow, op) {
        (Flow::Unknown, _) | (_, OperatorTag::Unclassified) => current,
        (f, OperatorTag::Or) => f.reverse(),
        (f, OperatorTag::Al) => current.blend(f),
        (f, _) => f,
    }
}
