//! # cowrite
//!
//! The merging and formatting core of a collaborative rich-text editor.
//!
//! Every replica owns a [`Document`] and edits it independently; edits are
//! captured as immutable [`Change`] records that replicas exchange in any
//! order. Once two replicas have applied the same set of changes they
//! converge to identical visible text and identical inline formatting.
//!
//! Two tightly coupled pieces make that work:
//! - a sequence CRDT that assigns every character a stable identity and a
//!   deterministic position, deleting by tombstone;
//! - a formatting engine that replays a log of `addMark`/`removeMark`
//!   operations, anchored to character identities, into normalized
//!   [`FormatSpan`]s.
//!
//! ## Quick Start
//!
//! ```
//! use cowrite::prelude::*;
//!
//! let mut alice = Document::new("alice");
//! alice.change(&[Op::insert(0, "The quick fox")]).unwrap();
//! alice
//!     .change(&[Op::add_mark(4, 8, MarkType::Strong, None)])
//!     .unwrap();
//!
//! let mut bob = Document::new("bob");
//! sync(&mut alice, &mut bob).unwrap();
//!
//! assert_eq!(bob.text(), "The quick fox");
//! assert_eq!(bob.formatted_text(), alice.formatted_text());
//! ```
//!
//! ## Convergence
//!
//! Change records address positions as the producing replica saw them.
//! Appliers resolve those positions against the producer's causal frame
//! (reconstructed from the change's dependency clock), never against their
//! own current text, and mark ranges are pinned to character identities
//! with sticky gravity at both ends. Concurrent conflicts are settled by
//! the total order on operation ids.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

mod change;
mod clock;
mod document;
mod error;
mod format;
mod marks;
mod op;
mod opid;
mod sequence;
mod sync;

pub mod prelude;

pub use change::Change;
pub use clock::VectorClock;
pub use document::Document;
pub use error::{DocError, Result};
pub use format::{normalize, replay_ops, span_at_position, FormatSpan, RangeEdit};
pub use marks::{Anchor, MarkEdit, MarkOp, MarkSet, MarkTarget, MarkValue};
pub use op::{MarkAttrs, MarkType, Op};
pub use opid::{ActorId, OpId};
pub use sync::{apply_changes, sync, MAX_SYNC_ROUNDS};
