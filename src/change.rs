use alloc::vec::Vec;

use crate::clock::VectorClock;
use crate::op::Op;
use crate::opid::ActorId;

/// A causally-atomic unit of operations produced by one actor.
///
/// Changes are immutable value types: once produced they are exchanged and
/// replayed byte-for-byte, never edited. A change may only be applied once
/// every dependency in `deps` has been applied; ops inside take consecutive
/// counters starting at `start_counter`.
///
/// The serialized form is the wire shape exchanged between replicas:
///
/// ```json
/// { "actor": "doc0", "startCounter": 6, "seq": 2,
///   "deps": { "doc0": 5, "doc1": 3 },
///   "ops": [ { "action": "insert", "path": ["text"], "index": 0,
///              "values": ["h", "i"] } ] }
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Change {
    /// Actor that produced the change.
    pub actor: ActorId,
    /// Counter assigned to the first op.
    pub start_counter: u64,
    /// Change number within the actor, starting at 1.
    pub seq: u64,
    /// Clock snapshot at creation: everything this change depends on.
    pub deps: VectorClock,
    /// The primitive operations, in order.
    pub ops: Vec<Op>,
}

impl Change {
    /// Total number of op ids the change consumes (inserts take one per
    /// value, deletes one per character, mark ops one each).
    #[must_use]
    pub fn op_count(&self) -> u64 {
        self.ops.iter().map(Op::id_count).sum()
    }

    /// Counter of the last op in the change.
    #[must_use]
    pub fn last_counter(&self) -> u64 {
        self.start_counter + self.op_count().saturating_sub(1)
    }
}
