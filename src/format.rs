use alloc::vec::Vec;

use crate::marks::{MarkEdit, MarkSet, MarkTarget, MarkValue};

/// A maximal run of visible positions bearing one set of marks.
///
/// A normalized span list is sorted by `start`, begins at zero, never
/// repeats a mark set across adjacent spans, and contains no span starting
/// at or past the document length.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FormatSpan {
    /// First visible position covered by this span.
    pub start: usize,
    /// Marks in effect over the run.
    pub marks: MarkSet,
}

/// A mark edit over an inclusive range of visible positions, produced by
/// materializing a logged mark op against the current sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeEdit {
    /// First covered position.
    pub start: usize,
    /// Last covered position (inclusive).
    pub end: usize,
    /// The edit to apply over the range.
    pub edit: MarkEdit,
}

/// Find the rightmost span whose `start` does not exceed `pos`.
///
/// Returns the span together with the index one past it in the list, which
/// is where a span beginning at `pos` would be inserted. Returns `None`
/// when `pos` precedes every span (or the list is empty).
#[must_use]
pub fn span_at_position(spans: &[FormatSpan], pos: usize) -> Option<(&FormatSpan, usize)> {
    let idx = spans.partition_point(|span| span.start <= pos);
    if idx == 0 {
        None
    } else {
        Some((&spans[idx - 1], idx))
    }
}

/// Ensure a span boundary exists exactly at `pos`, inheriting the marks of
/// the span being split.
fn split_at(spans: &mut Vec<FormatSpan>, pos: usize) {
    match span_at_position(spans, pos) {
        Some((span, at)) => {
            if span.start != pos {
                let marks = span.marks.clone();
                spans.insert(at, FormatSpan { start: pos, marks });
            }
        }
        None => spans.insert(
            0,
            FormatSpan {
                start: pos,
                marks: MarkSet::new(),
            },
        ),
    }
}

fn apply_edit(marks: &mut MarkSet, edit: &MarkEdit) {
    match edit {
        MarkEdit::Add(value) => {
            // A position holds at most one link value: a new link replaces
            // any previous one. Comments with distinct ids accumulate.
            if value.is_link() {
                marks.retain(|mark| !mark.is_link());
            }
            marks.insert(value.clone());
        }
        MarkEdit::Remove(MarkTarget::Strong) => {
            marks.remove(&MarkValue::Strong);
        }
        MarkEdit::Remove(MarkTarget::Em) => {
            marks.remove(&MarkValue::Em);
        }
        MarkEdit::Remove(MarkTarget::Link) => {
            marks.retain(|mark| !mark.is_link());
        }
        MarkEdit::Remove(MarkTarget::Comment { id }) => {
            marks.retain(|mark| !matches!(mark, MarkValue::Comment { id: c } if c == id));
        }
    }
}

/// Replay a log of materialized mark edits into a normalized span list
/// covering a document of `len` visible characters.
///
/// Edits are applied in log order; where two edits disagree about a
/// position, the later one wins. Ranges that have collapsed below their
/// start (every covered character deleted) are skipped.
#[must_use]
pub fn replay_ops(ops: &[RangeEdit], len: usize) -> Vec<FormatSpan> {
    // Each op can introduce at most two new boundaries.
    let mut spans = Vec::with_capacity(1 + 2 * ops.len());
    spans.push(FormatSpan {
        start: 0,
        marks: MarkSet::new(),
    });

    for op in ops {
        if op.end < op.start {
            continue;
        }
        split_at(&mut spans, op.start);
        split_at(&mut spans, op.end + 1);
        for span in spans.iter_mut() {
            if span.start >= op.start && span.start <= op.end {
                apply_edit(&mut span.marks, &op.edit);
            }
        }
    }

    normalize(spans, len)
}

/// Normalize a span list for a document of `len` visible characters:
/// drop spans starting at or past `len`, collapse adjacent spans with equal
/// marks (keeping the leftmost), and guarantee a span at position zero.
#[must_use]
pub fn normalize(mut spans: Vec<FormatSpan>, len: usize) -> Vec<FormatSpan> {
    spans.retain(|span| span.start < len);
    spans.dedup_by(|current, previous| current.marks == previous.marks);
    if spans.first().map_or(true, |span| span.start != 0) {
        spans.insert(
            0,
            FormatSpan {
                start: 0,
                marks: MarkSet::new(),
            },
        );
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::collections::BTreeSet;
    use alloc::string::String;

    fn span(start: usize, marks: &[MarkValue]) -> FormatSpan {
        FormatSpan {
            start,
            marks: marks.iter().cloned().collect(),
        }
    }

    fn strong(start: usize, end: usize) -> RangeEdit {
        RangeEdit {
            start,
            end,
            edit: MarkEdit::Add(MarkValue::Strong),
        }
    }

    fn unstrong(start: usize, end: usize) -> RangeEdit {
        RangeEdit {
            start,
            end,
            edit: MarkEdit::Remove(MarkTarget::Strong),
        }
    }

    fn link(start: usize, end: usize, url: &str) -> RangeEdit {
        RangeEdit {
            start,
            end,
            edit: MarkEdit::Add(MarkValue::Link { url: url.into() }),
        }
    }

    fn comment(start: usize, end: usize, id: &str) -> RangeEdit {
        RangeEdit {
            start,
            end,
            edit: MarkEdit::Add(MarkValue::Comment { id: id.into() }),
        }
    }

    #[test]
    fn empty_log_is_one_bare_span() {
        assert_eq!(replay_ops(&[], 20), [span(0, &[])]);
    }

    #[test]
    fn single_add() {
        assert_eq!(
            replay_ops(&[strong(2, 9)], 20),
            [
                span(0, &[]),
                span(2, &[MarkValue::Strong]),
                span(10, &[]),
            ]
        );
    }

    #[test]
    fn bold_unbold_bold_overlap() {
        let ops = [strong(2, 9), unstrong(5, 13), strong(11, 16)];
        assert_eq!(
            replay_ops(&ops, 20),
            [
                span(0, &[]),
                span(2, &[MarkValue::Strong]),
                span(5, &[]),
                span(11, &[MarkValue::Strong]),
                span(17, &[]),
            ]
        );
    }

    #[test]
    fn reordering_changes_the_winner() {
        // Same edits as above, but the unbold now comes last and wins over
        // the second bold where they overlap.
        let ops = [strong(2, 9), strong(11, 16), unstrong(5, 13)];
        assert_eq!(
            replay_ops(&ops, 20),
            [
                span(0, &[]),
                span(2, &[MarkValue::Strong]),
                span(5, &[]),
                span(14, &[MarkValue::Strong]),
                span(17, &[]),
            ]
        );
    }

    #[test]
    fn collapsed_range_is_skipped() {
        let collapsed = RangeEdit {
            start: 3,
            end: 2,
            edit: MarkEdit::Add(MarkValue::Em),
        };
        assert_eq!(replay_ops(&[collapsed], 10), [span(0, &[])]);
    }

    #[test]
    fn new_link_replaces_old_link() {
        let ops = [link(0, 5, "https://old.example"), link(2, 4, "https://new.example")];
        let new_link = MarkValue::Link {
            url: String::from("https://new.example"),
        };
        let old_link = MarkValue::Link {
            url: String::from("https://old.example"),
        };
        assert_eq!(
            replay_ops(&ops, 10),
            [
                span(0, &[old_link.clone()]),
                span(2, &[new_link]),
                span(5, &[old_link]),
                span(6, &[]),
            ]
        );
    }

    #[test]
    fn comments_accumulate_and_remove_by_id() {
        let remove_c1 = RangeEdit {
            start: 1,
            end: 2,
            edit: MarkEdit::Remove(MarkTarget::Comment { id: String::from("c1") }),
        };
        let ops = [comment(0, 3, "c1"), comment(1, 2, "c2"), remove_c1];
        let c1 = MarkValue::Comment { id: String::from("c1") };
        let c2 = MarkValue::Comment { id: String::from("c2") };
        assert_eq!(
            replay_ops(&ops, 10),
            [
                span(0, &[c1.clone()]),
                span(1, &[c2]),
                span(3, &[c1]),
                span(4, &[]),
            ]
        );
    }

    #[test]
    fn remove_link_strips_any_url() {
        let remove = RangeEdit {
            start: 0,
            end: 9,
            edit: MarkEdit::Remove(MarkTarget::Link),
        };
        let ops = [link(0, 4, "https://a.example"), link(5, 9, "https://b.example"), remove];
        assert_eq!(replay_ops(&ops, 10), [span(0, &[])]);
    }

    #[test]
    fn normalize_collapses_adjacent_equal_spans() {
        let s = MarkValue::Strong;
        let e = MarkValue::Em;
        let input = vec![
            span(0, &[]),
            span(3, &[]),
            span(4, &[s.clone()]),
            span(7, &[s.clone()]),
            span(12, &[s.clone()]),
            span(14, &[s.clone(), e.clone()]),
            span(16, &[e.clone()]),
            span(18, &[e.clone()]),
        ];
        assert_eq!(
            normalize(input, 1000),
            [
                span(0, &[]),
                span(4, &[s.clone()]),
                span(14, &[s, e.clone()]),
                span(16, &[e]),
            ]
        );
    }

    #[test]
    fn normalize_truncates_past_document_end() {
        let s = MarkValue::Strong;
        let input = vec![
            span(0, &[]),
            span(3, &[]),
            span(4, &[s.clone()]),
            span(7, &[s.clone()]),
            span(10, &[]),
        ];
        assert_eq!(normalize(input, 10), [span(0, &[]), span(4, &[s])]);
    }

    #[test]
    fn normalize_restores_a_leading_span() {
        let input = vec![span(5, &[MarkValue::Em])];
        assert_eq!(
            normalize(input, 10),
            [span(0, &[]), span(5, &[MarkValue::Em])]
        );
    }

    #[test]
    fn normalize_is_idempotent() {
        let inputs = [
            vec![span(0, &[]), span(3, &[]), span(4, &[MarkValue::Strong])],
            vec![span(2, &[MarkValue::Em]), span(8, &[MarkValue::Em]), span(40, &[])],
            Vec::new(),
        ];
        for input in inputs {
            let once = normalize(input, 20);
            assert_eq!(normalize(once.clone(), 20), once);
        }
    }

    #[test]
    fn replay_output_is_already_normalized() {
        let ops = [strong(2, 9), unstrong(5, 13), strong(11, 16), link(0, 3, "https://x.example")];
        let spans = replay_ops(&ops, 20);
        assert_eq!(normalize(spans.clone(), 20), spans);
        for pair in spans.windows(2) {
            assert!(pair[0].start < pair[1].start);
            assert_ne!(pair[0].marks, pair[1].marks);
        }
    }

    #[test]
    fn span_lookup_on_empty_list() {
        assert_eq!(span_at_position(&[], 5), None);
    }

    #[test]
    fn span_lookup_scenarios() {
        let starts = [3usize, 4, 7, 9, 11, 15, 16, 21];
        let spans: Vec<FormatSpan> = starts.iter().map(|&s| span(s, &[])).collect();

        let (found, idx) = span_at_position(&spans, 5).unwrap();
        assert_eq!((found.start, idx), (4, 2));

        let (found, idx) = span_at_position(&spans, 20).unwrap();
        assert_eq!((found.start, idx), (16, 7));

        let (found, idx) = span_at_position(&spans, 10_000).unwrap();
        assert_eq!((found.start, idx), (21, 8));

        assert_eq!(span_at_position(&spans, 2), None);

        // An exact hit returns the span starting at the queried position.
        let (found, idx) = span_at_position(&spans, 15).unwrap();
        assert_eq!((found.start, idx), (15, 6));
    }

    #[test]
    fn marks_set_ordering_is_deterministic() {
        let mut set: MarkSet = BTreeSet::new();
        set.insert(MarkValue::Comment { id: String::from("c9") });
        set.insert(MarkValue::Em);
        set.insert(MarkValue::Strong);
        let rendered: Vec<String> = set.iter().map(|m| m.to_string()).collect();
        assert_eq!(rendered, ["strong", "em", "comment@c9"]);
    }
}
