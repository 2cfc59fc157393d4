use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::change::Change;
use crate::clock::VectorClock;
use crate::error::DocError;
use crate::format::{self, FormatSpan, RangeEdit};
use crate::marks::{insert_mark_op, MarkEdit, MarkOp, MarkSet};
use crate::op::{MarkAttrs, MarkType, Op};
use crate::opid::{ActorId, OpId};
use crate::sequence::{Frame, TextSequence};

/// A single replica of the collaborative rich-text document.
///
/// Each replica edits independently through [`change`](Document::change) and
/// learns of remote edits through [`apply_change`](Document::apply_change).
/// Two replicas that have applied the same set of changes expose identical
/// visible text and identical formatting, regardless of delivery order.
///
/// # Example
///
/// ```
/// use cowrite::{Document, MarkType, Op};
///
/// let mut alice = Document::new("alice");
/// let hello = alice.change(&[Op::insert(0, "hello")]).unwrap();
/// let bold = alice
///     .change(&[Op::add_mark(0, 4, MarkType::Strong, None)])
///     .unwrap();
///
/// let mut bob = Document::new("bob");
/// bob.apply_change(&hello).unwrap();
/// bob.apply_change(&bold).unwrap();
///
/// assert_eq!(bob.text(), "hello");
/// assert_eq!(bob.formatted_text(), alice.formatted_text());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Document {
    actor: ActorId,
    /// Highest op counter observed from any actor. New changes are numbered
    /// above it, which keeps id order causal.
    max_counter: u64,
    text: TextSequence,
    /// Mark operations with anchored ranges, sorted by id.
    marks: Vec<MarkOp>,
    clock: VectorClock,
    /// Append-only change history per actor; the document is fully
    /// reconstructible from it.
    history: BTreeMap<ActorId, Vec<Change>>,
}

impl Document {
    /// Create an empty document for the given actor.
    pub fn new(actor: impl Into<ActorId>) -> Self {
        Self {
            actor: actor.into(),
            max_counter: 0,
            text: TextSequence::new(),
            marks: Vec::new(),
            clock: VectorClock::new(),
            history: BTreeMap::new(),
        }
    }

    /// Copy this replica under a new actor id.
    ///
    /// The fork shares the full state and history but produces its own ids
    /// from then on, so both copies can keep editing without collisions.
    pub fn fork(&self, new_actor: impl Into<ActorId>) -> Self {
        let mut fork = self.clone();
        fork.actor = new_actor.into();
        fork
    }

    /// This replica's actor id.
    #[must_use]
    pub fn actor_id(&self) -> &str {
        &self.actor
    }

    /// A copy of the current vector clock.
    #[must_use]
    pub fn clock(&self) -> VectorClock {
        self.clock.clone()
    }

    /// The visible text.
    #[must_use]
    pub fn text(&self) -> String {
        self.text.text()
    }

    /// Number of visible characters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.visible_len()
    }

    /// Whether the visible text is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply `ops` locally and return the resulting change record for
    /// distribution to other replicas.
    ///
    /// The document reflects the edits when this returns; on error nothing
    /// is mutated. A change must perform at least one edit.
    pub fn change(&mut self, ops: &[Op]) -> Result<Change, DocError> {
        let change = Change {
            actor: self.actor.clone(),
            start_counter: self.max_counter + 1,
            seq: self.applied_seq(&self.actor) + 1,
            deps: self.clock.clone(),
            ops: ops.to_vec(),
        };
        if change.op_count() == 0 {
            return Err(DocError::MalformedOp("change performs no edits"));
        }
        self.integrate(&change)?;
        self.record(change.clone());
        Ok(change)
    }

    /// Apply a change produced by another replica.
    ///
    /// Succeeds as a no-op when the change was already applied. Fails with
    /// [`DocError::MissingDependency`] when the change is not causally ready
    /// yet (re-queue it and retry later); any failure leaves the document
    /// unchanged.
    pub fn apply_change(&mut self, change: &Change) -> Result<(), DocError> {
        let applied = self.applied_seq(&change.actor);
        if change.seq <= applied {
            return Ok(());
        }
        if change.seq > applied + 1 {
            return Err(DocError::MissingDependency);
        }
        if !self.clock.satisfies(&change.deps) {
            return Err(DocError::MissingDependency);
        }
        if change.op_count() == 0 {
            return Err(DocError::MalformedOp("change performs no edits"));
        }
        self.integrate(change)?;
        self.record(change.clone());
        Ok(())
    }

    /// Changes a remote replica at `remote` has not applied yet, ordered so
    /// that earlier counters come first.
    #[must_use]
    pub fn changes_since(&self, remote: &VectorClock) -> Vec<Change> {
        let mut missing: Vec<Change> = Vec::new();
        for changes in self.history.values() {
            for change in changes {
                if change.last_counter() > remote.get(&change.actor) {
                    missing.push(change.clone());
                }
            }
        }
        missing.sort_by(|a, b| {
            a.start_counter
                .cmp(&b.start_counter)
                .then_with(|| a.actor.cmp(&b.actor))
        });
        missing
    }

    /// Current normalized format spans covering the visible text.
    #[must_use]
    pub fn format_spans(&self) -> Vec<FormatSpan> {
        let edits: Vec<RangeEdit> = self
            .marks
            .iter()
            .filter_map(|op| {
                let start = self.text.materialize_start(&op.start);
                let end = self.text.materialize_end(&op.end)?;
                if end < start {
                    return None;
                }
                Some(RangeEdit {
                    start,
                    end,
                    edit: op.edit.clone(),
                })
            })
            .collect();
        format::replay_ops(&edits, self.len())
    }

    /// The visible text split into runs of uniform formatting.
    #[must_use]
    pub fn formatted_text(&self) -> Vec<(String, MarkSet)> {
        let chars = self.text.visible_chars();
        if chars.is_empty() {
            return Vec::new();
        }
        let spans = self.format_spans();
        let mut runs = Vec::with_capacity(spans.len());
        for (i, span) in spans.iter().enumerate() {
            let end = spans.get(i + 1).map_or(chars.len(), |next| next.start);
            let segment: String = chars[span.start..end].iter().collect();
            runs.push((segment, span.marks.clone()));
        }
        runs
    }

    // ---- internal ----

    fn applied_seq(&self, actor: &str) -> u64 {
        self.history.get(actor).map_or(0, |changes| changes.len() as u64)
    }

    /// Bookkeeping after a change has fully applied.
    fn record(&mut self, change: Change) {
        let last = change.last_counter();
        self.clock.observe(change.actor.clone(), last);
        self.max_counter = self.max_counter.max(last);
        self.history.entry(change.actor.clone()).or_default().push(change);
    }

    /// Apply the ops of a causally-ready change. The change is atomic: on
    /// any error the previous state is restored.
    fn integrate(&mut self, change: &Change) -> Result<(), DocError> {
        let text_snapshot = self.text.clone();
        let marks_snapshot = self.marks.clone();
        match self.integrate_ops(change) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.text = text_snapshot;
                self.marks = marks_snapshot;
                Err(err)
            }
        }
    }

    fn integrate_ops(&mut self, change: &Change) -> Result<(), DocError> {
        let mut counter = change.start_counter;
        for op in &change.ops {
            if !path_is_text(op.path()) {
                return Err(DocError::MalformedOp("op addresses an unknown path"));
            }
            match op {
                Op::Insert { index, values, .. } => {
                    let frame = Frame {
                        deps: &change.deps,
                        actor: &change.actor,
                        next_counter: counter,
                    };
                    let mut predecessor = self.text.frame_predecessor(&frame, *index)?;
                    for &value in values {
                        let id = OpId::new(counter, change.actor.clone());
                        self.text.integrate_insert(id.clone(), value, predecessor)?;
                        predecessor = Some(id);
                        counter += 1;
                    }
                }
                Op::Delete { index, count, .. } => {
                    let frame = Frame {
                        deps: &change.deps,
                        actor: &change.actor,
                        next_counter: counter,
                    };
                    let targets = self.text.frame_range_ids(&frame, *index, *count)?;
                    for target in targets {
                        let deleter = OpId::new(counter, change.actor.clone());
                        self.text.apply_delete(deleter, &target)?;
                        counter += 1;
                    }
                }
                Op::AddMark { start_index, end_index, mark_type, attrs, .. } => {
                    counter = self.integrate_mark(
                        change, counter, true, *start_index, *end_index, *mark_type,
                        attrs.as_ref(),
                    )?;
                }
                Op::RemoveMark { start_index, end_index, mark_type, attrs, .. } => {
                    counter = self.integrate_mark(
                        change, counter, false, *start_index, *end_index, *mark_type,
                        attrs.as_ref(),
                    )?;
                }
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn integrate_mark(
        &mut self,
        change: &Change,
        counter: u64,
        add: bool,
        start_index: usize,
        end_index: usize,
        mark_type: MarkType,
        attrs: Option<&MarkAttrs>,
    ) -> Result<u64, DocError> {
        let edit = MarkEdit::from_wire(add, mark_type, attrs)?;
        let frame = Frame {
            deps: &change.deps,
            actor: &change.actor,
            next_counter: counter,
        };
        let (start, end) = self.text.frame_anchors(&frame, start_index, end_index)?;
        insert_mark_op(
            &mut self.marks,
            MarkOp {
                id: OpId::new(counter, change.actor.clone()),
                start,
                end,
                edit,
            },
        );
        Ok(counter + 1)
    }
}

fn path_is_text(path: &[String]) -> bool {
    path.len() == 1 && path[0] == "text"
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}
