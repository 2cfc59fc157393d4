//! Convenient re-exports for common usage.
//!
//! ```
//! use cowrite::prelude::*;
//! ```

pub use crate::sync::{apply_changes, sync};
pub use crate::Change;
pub use crate::DocError;
pub use crate::Document;
pub use crate::FormatSpan;
pub use crate::MarkAttrs;
pub use crate::MarkSet;
pub use crate::MarkType;
pub use crate::MarkValue;
pub use crate::Op;
pub use crate::VectorClock;
