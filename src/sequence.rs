use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::clock::VectorClock;
use crate::error::DocError;
use crate::marks::Anchor;
use crate::opid::OpId;

/// A single character in the sequence, tombstones included.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub(crate) struct CharNode {
    pub id: OpId,
    pub value: char,
    /// The character this one was inserted after; `None` for the head.
    pub predecessor: Option<OpId>,
    /// Ids of the delete ops that tombstoned this character. Recording the
    /// deleting ops (rather than a bare flag) lets remote position
    /// resolution decide whether the producing replica had seen a deletion.
    pub deleters: Vec<OpId>,
}

impl CharNode {
    pub fn is_deleted(&self) -> bool {
        !self.deleters.is_empty()
    }
}

/// The causal context an operation's positions are resolved against:
/// everything the producing replica had applied when it created the op.
///
/// A character is in frame if its id is covered by the change's dependency
/// clock, or it was produced by an earlier op of the same change. It is
/// frame-visible if additionally no in-frame delete has tombstoned it. Every
/// replica whose clock satisfies the dependencies reconstructs the same
/// frame, which is what keeps position resolution convergent.
#[derive(Clone, Copy)]
pub(crate) struct Frame<'a> {
    pub deps: &'a VectorClock,
    pub actor: &'a str,
    /// Ops of the same change with a counter below this are in frame.
    pub next_counter: u64,
}

impl Frame<'_> {
    fn sees(&self, id: &OpId) -> bool {
        id.counter <= self.deps.get(&id.actor)
            || (id.actor == self.actor && id.counter < self.next_counter)
    }

    fn visible(&self, node: &CharNode) -> bool {
        self.sees(&node.id) && !node.deleters.iter().any(|d| self.sees(d))
    }
}

/// The RGA-like causal tree holding the document text.
///
/// Every character ever inserted lives in a dense arena; deletion only
/// tombstones. Each character hangs off the character it was inserted after,
/// siblings are kept sorted by descending id (so a later concurrent insert
/// at the same anchor sorts left of an earlier one), and the visible text is
/// the in-order traversal of the tree minus tombstones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub(crate) struct TextSequence {
    /// Dense arena, in application order.
    nodes: Vec<CharNode>,
    /// Id to arena slot.
    index: BTreeMap<OpId, usize>,
    /// Children of each arena slot (`None` keys the sentinel head), each
    /// list sorted by descending child id.
    children: BTreeMap<Option<usize>, Vec<usize>>,
    /// Cached in-order traversal of the tree, tombstones included.
    order: Vec<usize>,
}

impl TextSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Integrate a character inserted after `predecessor` (`None` = head).
    ///
    /// Re-integrating an id already present is a no-op. An unknown
    /// predecessor means the enclosing change was applied out of causal
    /// order and fails with `MissingDependency`.
    pub fn integrate_insert(
        &mut self,
        id: OpId,
        value: char,
        predecessor: Option<OpId>,
    ) -> Result<(), DocError> {
        if self.index.contains_key(&id) {
            return Ok(());
        }
        let parent_slot = match &predecessor {
            Some(p) => Some(*self.index.get(p).ok_or(DocError::MissingDependency)?),
            None => None,
        };

        let slot = self.nodes.len();
        self.nodes.push(CharNode {
            id: id.clone(),
            value,
            predecessor,
            deleters: Vec::new(),
        });
        self.index.insert(id, slot);

        let nodes = &self.nodes;
        let siblings = self.children.entry(parent_slot).or_default();
        let pos = siblings.partition_point(|&s| nodes[s].id > nodes[slot].id);
        siblings.insert(pos, slot);

        self.rebuild_order();
        Ok(())
    }

    /// Tombstone the character `target` on behalf of the delete op
    /// `deleter`. Idempotent per deleter id.
    pub fn apply_delete(&mut self, deleter: OpId, target: &OpId) -> Result<(), DocError> {
        let slot = *self.index.get(target).ok_or(DocError::MissingDependency)?;
        let node = &mut self.nodes[slot];
        if !node.deleters.contains(&deleter) {
            node.deleters.push(deleter);
        }
        Ok(())
    }

    /// Rebuild the linearized traversal from the tree.
    ///
    /// Depth-first from the head's children; sibling lists are already
    /// sorted by descending id, so pushing them onto the stack in reverse
    /// visits the highest id first.
    fn rebuild_order(&mut self) {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<usize> = Vec::new();

        if let Some(roots) = self.children.get(&None) {
            for &slot in roots.iter().rev() {
                stack.push(slot);
            }
        }

        while let Some(slot) = stack.pop() {
            order.push(slot);
            if let Some(kids) = self.children.get(&Some(slot)) {
                for &kid in kids.iter().rev() {
                    stack.push(kid);
                }
            }
        }

        self.order = order;
    }

    // ---- whole-document queries ----

    /// Number of visible (non-tombstoned) characters.
    pub fn visible_len(&self) -> usize {
        self.order
            .iter()
            .filter(|&&slot| !self.nodes[slot].is_deleted())
            .count()
    }

    /// The visible text.
    pub fn text(&self) -> String {
        self.order
            .iter()
            .filter(|&&slot| !self.nodes[slot].is_deleted())
            .map(|&slot| self.nodes[slot].value)
            .collect()
    }

    /// The visible characters in order.
    pub fn visible_chars(&self) -> Vec<char> {
        self.order
            .iter()
            .filter(|&&slot| !self.nodes[slot].is_deleted())
            .map(|&slot| self.nodes[slot].value)
            .collect()
    }

    // ---- frame-relative resolution ----

    /// Number of characters visible within the frame.
    pub fn frame_len(&self, frame: &Frame) -> usize {
        self.order
            .iter()
            .filter(|&&slot| frame.visible(&self.nodes[slot]))
            .count()
    }

    fn frame_nth(&self, frame: &Frame, pos: usize) -> Option<&CharNode> {
        let mut seen = 0;
        for &slot in &self.order {
            let node = &self.nodes[slot];
            if frame.visible(node) {
                if seen == pos {
                    return Some(node);
                }
                seen += 1;
            }
        }
        None
    }

    /// The id an insert at frame position `index` chains after, `None` for
    /// a head insert.
    pub fn frame_predecessor(
        &self,
        frame: &Frame,
        index: usize,
    ) -> Result<Option<OpId>, DocError> {
        if index == 0 {
            return Ok(None);
        }
        match self.frame_nth(frame, index - 1) {
            Some(node) => Ok(Some(node.id.clone())),
            None => Err(DocError::OutOfBounds {
                index,
                len: self.frame_len(frame),
            }),
        }
    }

    /// Ids of the `count` frame-visible characters starting at `index`.
    pub fn frame_range_ids(
        &self,
        frame: &Frame,
        index: usize,
        count: usize,
    ) -> Result<Vec<OpId>, DocError> {
        let mut ids = Vec::with_capacity(count);
        let mut seen = 0;
        for &slot in &self.order {
            let node = &self.nodes[slot];
            if frame.visible(node) {
                if seen >= index && seen < index + count {
                    ids.push(node.id.clone());
                }
                seen += 1;
            }
        }
        if ids.len() < count {
            return Err(DocError::OutOfBounds {
                index: index + count,
                len: seen,
            });
        }
        Ok(ids)
    }

    /// Resolve an inclusive mark range to its gravity anchors: the start
    /// anchors to the character before `start` (head when `start == 0`), the
    /// end anchors to the character at `end`.
    pub fn frame_anchors(
        &self,
        frame: &Frame,
        start: usize,
        end: usize,
    ) -> Result<(Anchor, Anchor), DocError> {
        let len = self.frame_len(frame);
        if start > end || end >= len {
            return Err(DocError::OutOfBounds { index: end, len });
        }
        let start_anchor = if start == 0 {
            Anchor::Head
        } else {
            let node = self
                .frame_nth(frame, start - 1)
                .ok_or(DocError::OutOfBounds { index: start, len })?;
            Anchor::Char(node.id.clone())
        };
        let end_node = self
            .frame_nth(frame, end)
            .ok_or(DocError::OutOfBounds { index: end, len })?;
        Ok((start_anchor, Anchor::Char(end_node.id.clone())))
    }

    // ---- anchor materialization against the current state ----

    /// Number of currently visible characters up to and including `id`.
    fn visible_through(&self, id: &OpId) -> usize {
        let mut seen = 0;
        for &slot in &self.order {
            let node = &self.nodes[slot];
            if !node.is_deleted() {
                seen += 1;
            }
            if &node.id == id {
                break;
            }
        }
        seen
    }

    /// Current position where a range starting after `anchor` begins.
    pub fn materialize_start(&self, anchor: &Anchor) -> usize {
        match anchor {
            Anchor::Head => 0,
            Anchor::Char(id) => self.visible_through(id),
        }
    }

    /// Current position of the last character covered by a range ending at
    /// `anchor`, or `None` when no visible character remains at or before
    /// it (the range has collapsed).
    pub fn materialize_end(&self, anchor: &Anchor) -> Option<usize> {
        match anchor {
            Anchor::Head => None,
            Anchor::Char(id) => self.visible_through(id).checked_sub(1),
        }
    }
}
