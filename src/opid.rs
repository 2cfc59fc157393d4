use alloc::string::String;
use core::cmp::Ordering;
use core::fmt;

/// A replica identity. Assigned once per editing agent and never reused.
pub type ActorId = String;

/// The identity of a single operation: a `(counter, actor)` pair.
///
/// Counters are Lamport-style: every operation is numbered above everything
/// its replica had observed when it was created, so comparing counters
/// respects causality wherever causality exists. Ids are totally ordered by
/// counter first, then lexicographically by actor as a deterministic
/// tie-break for concurrent operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OpId {
    /// Counter assigned at creation time.
    pub counter: u64,
    /// Actor that produced the operation.
    pub actor: ActorId,
}

impl OpId {
    /// Create an op id.
    pub fn new(counter: u64, actor: impl Into<ActorId>) -> Self {
        Self {
            counter,
            actor: actor.into(),
        }
    }
}

impl Ord for OpId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.counter
            .cmp(&other.counter)
            .then_with(|| self.actor.cmp(&other.actor))
    }
}

impl PartialOrd for OpId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.counter, self.actor)
    }
}
