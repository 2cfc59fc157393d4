use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::error::DocError;
use crate::op::{MarkAttrs, MarkType};
use crate::opid::OpId;

/// A mark together with its parameters.
///
/// `strong` and `em` are bare; a position carries at most one `link` value
/// but arbitrarily many `comment` values with distinct ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MarkValue {
    /// Bold.
    Strong,
    /// Italic.
    Em,
    /// Hyperlink to `url`.
    Link {
        /// The link destination.
        url: String,
    },
    /// Comment with stable `id`.
    Comment {
        /// The comment id.
        id: String,
    },
}

impl MarkValue {
    /// Whether this is a link value (of any url).
    #[must_use]
    pub fn is_link(&self) -> bool {
        matches!(self, Self::Link { .. })
    }

    /// The mark type of this value.
    #[must_use]
    pub fn mark_type(&self) -> MarkType {
        match self {
            Self::Strong => MarkType::Strong,
            Self::Em => MarkType::Em,
            Self::Link { .. } => MarkType::Link,
            Self::Comment { .. } => MarkType::Comment,
        }
    }
}

impl fmt::Display for MarkValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strong => f.write_str("strong"),
            Self::Em => f.write_str("em"),
            Self::Link { url } => write!(f, "link@{url}"),
            Self::Comment { id } => write!(f, "comment@{id}"),
        }
    }
}

/// The set of marks in effect over a run of text.
pub type MarkSet = BTreeSet<MarkValue>;

/// A stable reference to a slot in the character sequence.
///
/// Mark ranges are anchored to character identities rather than positions so
/// they stay attached to the intended text when concurrent edits shift
/// positions. A range start anchors to the character *before* its first
/// covered position (left gravity: text inserted at the boundary joins the
/// range); a range end anchors to the last covered character itself (right
/// gravity).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Anchor {
    /// The virtual slot before the first character of the document.
    Head,
    /// The character with the given id, tombstoned or not.
    Char(OpId),
}

/// What `removeMark` strips from its range.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MarkTarget {
    /// Remove bold.
    Strong,
    /// Remove italic.
    Em,
    /// Remove a link of any url.
    Link,
    /// Remove only the comment with this id.
    Comment {
        /// The comment id to remove.
        id: String,
    },
}

/// The effect of one mark operation on every character it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MarkEdit {
    /// Apply a mark value.
    Add(MarkValue),
    /// Remove a mark.
    Remove(MarkTarget),
}

impl MarkEdit {
    /// Build an edit from the wire-level mark fields, validating that the
    /// attributes required by the mark type are present.
    pub(crate) fn from_wire(
        add: bool,
        mark_type: MarkType,
        attrs: Option<&MarkAttrs>,
    ) -> Result<Self, DocError> {
        match (add, mark_type, attrs) {
            (true, MarkType::Strong, None) => Ok(Self::Add(MarkValue::Strong)),
            (true, MarkType::Em, None) => Ok(Self::Add(MarkValue::Em)),
            (true, MarkType::Link, Some(MarkAttrs::Link { url })) => {
                Ok(Self::Add(MarkValue::Link { url: url.clone() }))
            }
            (true, MarkType::Link, _) => Err(DocError::MalformedOp("link mark requires a url")),
            (true, MarkType::Comment, Some(MarkAttrs::Comment { id })) => {
                Ok(Self::Add(MarkValue::Comment { id: id.clone() }))
            }
            (true, MarkType::Comment, _) => {
                Err(DocError::MalformedOp("comment mark requires an id"))
            }
            (false, MarkType::Strong, None) => Ok(Self::Remove(MarkTarget::Strong)),
            (false, MarkType::Em, None) => Ok(Self::Remove(MarkTarget::Em)),
            (false, MarkType::Link, None) => Ok(Self::Remove(MarkTarget::Link)),
            (false, MarkType::Comment, Some(MarkAttrs::Comment { id })) => {
                Ok(Self::Remove(MarkTarget::Comment { id: id.clone() }))
            }
            (false, MarkType::Comment, _) => {
                Err(DocError::MalformedOp("comment removal requires an id"))
            }
            _ => Err(DocError::MalformedOp("unexpected attrs for mark type")),
        }
    }
}

/// A mark operation with its range resolved to stable anchors.
///
/// These form the resolved op log: kept sorted by id, which is causal order
/// where causality exists (counters are Lamport-assigned) and a
/// deterministic tie-break otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarkOp {
    /// Identity of the operation.
    pub id: OpId,
    /// Anchor before the first covered position.
    pub start: Anchor,
    /// Anchor at the last covered character.
    pub end: Anchor,
    /// What the operation does to its range.
    pub edit: MarkEdit,
}

/// Insert an op into the log at its sorted position. Re-delivery of an id
/// already present is a no-op.
pub(crate) fn insert_mark_op(log: &mut Vec<MarkOp>, op: MarkOp) {
    match log.binary_search_by(|probe| probe.id.cmp(&op.id)) {
        Ok(_) => {}
        Err(pos) => log.insert(pos, op),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_value_display() {
        assert_eq!(MarkValue::Strong.to_string(), "strong");
        assert_eq!(
            MarkValue::Link { url: "https://example.net".into() }.to_string(),
            "link@https://example.net"
        );
        assert_eq!(MarkValue::Comment { id: "c1".into() }.to_string(), "comment@c1");
    }

    #[test]
    fn from_wire_validates_attrs() {
        assert_eq!(
            MarkEdit::from_wire(true, MarkType::Strong, None),
            Ok(MarkEdit::Add(MarkValue::Strong))
        );
        assert_eq!(
            MarkEdit::from_wire(true, MarkType::Link, None),
            Err(DocError::MalformedOp("link mark requires a url"))
        );
        assert_eq!(
            MarkEdit::from_wire(false, MarkType::Comment, None),
            Err(DocError::MalformedOp("comment removal requires an id"))
        );
        // Removing a link names no url: any link value is stripped.
        assert_eq!(
            MarkEdit::from_wire(false, MarkType::Link, None),
            Ok(MarkEdit::Remove(MarkTarget::Link))
        );
        // Attrs on a bare mark are rejected rather than ignored.
        let attrs = MarkAttrs::Link { url: "x".into() };
        assert_eq!(
            MarkEdit::from_wire(true, MarkType::Strong, Some(&attrs)),
            Err(DocError::MalformedOp("unexpected attrs for mark type"))
        );
    }

    #[test]
    fn log_insertion_keeps_id_order() {
        let op = |counter: u64, actor: &str| MarkOp {
            id: OpId::new(counter, actor),
            start: Anchor::Head,
            end: Anchor::Head,
            edit: MarkEdit::Add(MarkValue::Strong),
        };

        let mut log = Vec::new();
        insert_mark_op(&mut log, op(5, "b"));
        insert_mark_op(&mut log, op(5, "a"));
        insert_mark_op(&mut log, op(2, "z"));
        insert_mark_op(&mut log, op(5, "a")); // duplicate id dropped

        let ids: Vec<_> = log.iter().map(|o| o.id.clone()).collect();
        assert_eq!(
            ids,
            [OpId::new(2, "z"), OpId::new(5, "a"), OpId::new(5, "b")]
        );
    }
}
