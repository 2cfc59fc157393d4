use alloc::collections::VecDeque;
use alloc::vec::Vec;

use crate::change::Change;
use crate::document::Document;
use crate::error::DocError;

/// Bound on the re-queue retry loop. A healthy change stream converges in
/// far fewer rounds; hitting the bound means some change can never become
/// causally ready.
pub const MAX_SYNC_ROUNDS: usize = 10_000;

/// Apply a batch of changes, re-queueing any that are not causally ready
/// until everything applies or the retry bound is hit.
pub fn apply_changes(doc: &mut Document, changes: Vec<Change>) -> Result<(), DocError> {
    let mut queue: VecDeque<Change> = VecDeque::from(changes);
    let mut rounds = 0;
    while let Some(change) = queue.pop_front() {
        match doc.apply_change(&change) {
            Ok(()) => {}
            Err(DocError::MissingDependency) => {
                rounds += 1;
                if rounds > MAX_SYNC_ROUNDS {
                    return Err(DocError::NonConvergence { rounds });
                }
                queue.push_back(change);
            }
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

/// Exchange missing changes between two replicas in both directions.
///
/// Afterwards both documents have applied the same set of changes and hold
/// identical clocks, text and formatting.
pub fn sync(a: &mut Document, b: &mut Document) -> Result<(), DocError> {
    let for_b = a.changes_since(&b.clock());
    let for_a = b.changes_since(&a.clock());
    apply_changes(b, for_b)?;
    apply_changes(a, for_a)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::VectorClock;
    use crate::op::Op;

    #[test]
    fn apply_changes_reorders_until_ready() {
        let mut alice = Document::new("alice");
        let c1 = alice.change(&[Op::insert(0, "a")]).unwrap();
        let c2 = alice.change(&[Op::insert(1, "b")]).unwrap();
        let c3 = alice.change(&[Op::insert(2, "c")]).unwrap();

        let mut bob = Document::new("bob");
        apply_changes(&mut bob, vec![c3, c1, c2]).unwrap();
        assert_eq!(bob.text(), "abc");
    }

    #[test]
    fn sync_converges_both_replicas() {
        let mut alice = Document::new("alice");
        alice.change(&[Op::insert(0, "hello")]).unwrap();

        let mut bob = Document::new("bob");
        bob.change(&[Op::insert(0, "world")]).unwrap();

        sync(&mut alice, &mut bob).unwrap();
        assert_eq!(alice.clock(), bob.clock());
        assert_eq!(alice.text(), bob.text());
        assert_eq!(alice.len(), 10);
    }

    #[test]
    fn unsatisfiable_change_is_non_convergence() {
        let mut doc = Document::new("doc0");
        let mut deps = VectorClock::new();
        deps.observe("ghost", 5);
        let stuck = Change {
            actor: "other".into(),
            start_counter: 6,
            seq: 1,
            deps,
            ops: vec![Op::insert(0, "x")],
        };
        assert_eq!(
            apply_changes(&mut doc, vec![stuck]),
            Err(DocError::NonConvergence { rounds: MAX_SYNC_ROUNDS + 1 })
        );
        assert!(doc.is_empty());
    }
}
