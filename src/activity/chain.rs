//=========================================================================
// Follow-up Chain
//=========================================================================
//
// Ordered work a session performs between interactions.
//
// After a correct interaction:
//   ApplyDeltas → Call(after)… → Advance
// When a step activates:
//   Call(before)… → Activate
//
// Ops run strictly in order. A call that asks to wait suspends the chain
// on a session timer; nothing later runs until it resumes. A failing op
// empties the chain so no later op can run against half-applied state.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::VecDeque;

//=== Internal Dependencies ===============================================

use crate::data::{Instruction, ResourceMap};
use crate::functions::{CallSequence, FunctionCall};

//=== ChainOp =============================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ChainOp {
    /// Inventory removals and additions of a completed step.
    ApplyDeltas { remove: ResourceMap, add: ResourceMap },
    Call(FunctionCall),
    /// Leave the step and move to its successor.
    Advance { from: String },
    /// Enable interaction on the step.
    Activate { step: String },
}

//=== FollowUpChain =======================================================

#[derive(Debug, Default)]
pub struct FollowUpChain {
    ops: VecDeque<ChainOp>,
    suspended: bool,
}

impl FollowUpChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the work that follows a resolved step.
    pub fn queue_resolution(&mut self, step: &Instruction) {
        if !step.remove_items.is_empty() || !step.add_items.is_empty() {
            self.ops.push_back(ChainOp::ApplyDeltas {
                remove: step.remove_items.clone(),
                add: step.add_items.clone(),
            });
        }
        self.ops.extend(calls(step, CallSequence::After));
        self.ops.push_back(ChainOp::Advance {
            from: step.id.clone(),
        });
    }

    /// Queues the work that prepares a freshly entered step.
    pub fn queue_activation(&mut self, step: &Instruction) {
        self.ops.extend(calls(step, CallSequence::Before));
        self.ops.push_back(ChainOp::Activate {
            step: step.id.clone(),
        });
    }

    pub fn next(&mut self) -> Option<ChainOp> {
        if self.suspended {
            return None;
        }
        self.ops.pop_front()
    }

    pub fn suspend(&mut self) {
        self.suspended = true;
    }

    pub fn resume(&mut self) {
        self.suspended = false;
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
        self.suspended = false;
    }
}

fn calls(step: &Instruction, sequence: CallSequence) -> impl Iterator<Item = ChainOp> + '_ {
    step.functions
        .iter()
        .filter(move |c| c.sequence == sequence)
        .cloned()
        .map(ChainOp::Call)
}

//=========================================================================
// Unit Tests
//=========================================================================
