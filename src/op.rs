use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use crate::error::DocError;

/// The inline mark kinds understood by the formatting engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MarkType {
    /// Bold text.
    Strong,
    /// Emphasized (italic) text.
    Em,
    /// Hyperlink; carries a target URL.
    Link,
    /// Inline comment; carries a comment id.
    Comment,
}

impl MarkType {
    /// The wire-level name of the mark type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strong => "strong",
            Self::Em => "em",
            Self::Link => "link",
            Self::Comment => "comment",
        }
    }
}

impl fmt::Display for MarkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarkType {
    type Err = DocError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strong" => Ok(Self::Strong),
            "em" => Ok(Self::Em),
            "link" => Ok(Self::Link),
            "comment" => Ok(Self::Comment),
            other => Err(DocError::UnknownMark(other.into())),
        }
    }
}

/// Parameters attached to a mark operation.
///
/// `link` ops carry `{ url }`, `comment` ops carry `{ id }`; `strong` and
/// `em` carry nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum MarkAttrs {
    /// Target of a `link` mark.
    Link {
        /// The link destination.
        url: String,
    },
    /// Identity of a `comment` mark.
    Comment {
        /// Stable comment id.
        id: String,
    },
}

/// A primitive operation inside a change record.
///
/// The serialized form is the wire shape exchanged between replicas, e.g.
///
/// ```json
/// { "action": "addMark", "path": ["text"], "startIndex": 2, "endIndex": 9,
///   "markType": "strong" }
/// ```
///
/// `index`, `startIndex` and `endIndex` are visible-text positions at the
/// replica that produced the operation; remote appliers resolve them against
/// the producer's causal frame, never against their own current text.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "action", rename_all = "camelCase"))]
pub enum Op {
    /// Insert `values` so the first lands at visible position `index`.
    Insert {
        /// Path of the addressed list; always `["text"]`.
        path: Vec<String>,
        /// Visible position the first value is inserted at.
        index: usize,
        /// The characters to insert, in order.
        values: Vec<char>,
    },
    /// Tombstone `count` visible characters starting at `index`.
    Delete {
        /// Path of the addressed list; always `["text"]`.
        path: Vec<String>,
        /// Visible position of the first character to delete.
        index: usize,
        /// Number of characters to delete.
        count: usize,
    },
    /// Apply a mark over the inclusive range `startIndex..=endIndex`.
    #[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
    AddMark {
        /// Path of the addressed list; always `["text"]`.
        path: Vec<String>,
        /// First covered visible position.
        start_index: usize,
        /// Last covered visible position (inclusive).
        end_index: usize,
        /// Which mark to apply.
        mark_type: MarkType,
        /// `{ url }` for links, `{ id }` for comments, absent otherwise.
        #[cfg_attr(
            feature = "serde",
            serde(default, skip_serializing_if = "Option::is_none")
        )]
        attrs: Option<MarkAttrs>,
    },
    /// Remove a mark over the inclusive range `startIndex..=endIndex`.
    #[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
    RemoveMark {
        /// Path of the addressed list; always `["text"]`.
        path: Vec<String>,
        /// First covered visible position.
        start_index: usize,
        /// Last covered visible position (inclusive).
        end_index: usize,
        /// Which mark to remove.
        mark_type: MarkType,
        /// `{ id }` for comments, absent otherwise.
        #[cfg_attr(
            feature = "serde",
            serde(default, skip_serializing_if = "Option::is_none")
        )]
        attrs: Option<MarkAttrs>,
    },
}

fn text_path() -> Vec<String> {
    let mut path = Vec::with_capacity(1);
    path.push(String::from("text"));
    path
}

impl Op {
    /// Build an insert op placing the characters of `text` at `index`.
    pub fn insert(index: usize, text: &str) -> Self {
        Self::Insert {
            path: text_path(),
            index,
            values: text.chars().collect(),
        }
    }

    /// Build a delete op tombstoning `count` characters starting at `index`.
    pub fn delete(index: usize, count: usize) -> Self {
        Self::Delete {
            path: text_path(),
            index,
            count,
        }
    }

    /// Build an `addMark` op over the inclusive range.
    pub fn add_mark(
        start_index: usize,
        end_index: usize,
        mark_type: MarkType,
        attrs: Option<MarkAttrs>,
    ) -> Self {
        Self::AddMark {
            path: text_path(),
            start_index,
            end_index,
            mark_type,
            attrs,
        }
    }

    /// Build a `removeMark` op over the inclusive range.
    pub fn remove_mark(
        start_index: usize,
        end_index: usize,
        mark_type: MarkType,
        attrs: Option<MarkAttrs>,
    ) -> Self {
        Self::RemoveMark {
            path: text_path(),
            start_index,
            end_index,
            mark_type,
            attrs,
        }
    }

    pub(crate) fn path(&self) -> &[String] {
        match self {
            Self::Insert { path, .. }
            | Self::Delete { path, .. }
            | Self::AddMark { path, .. }
            | Self::RemoveMark { path, .. } => path,
        }
    }

    /// How many op ids this operation consumes: one per inserted value, one
    /// per deleted character, one per mark op.
    pub(crate) fn id_count(&self) -> u64 {
        match self {
            Self::Insert { values, .. } => values.len() as u64,
            Self::Delete { count, .. } => *count as u64,
            Self::AddMark { .. } | Self::RemoveMark { .. } => 1,
        }
    }
}
