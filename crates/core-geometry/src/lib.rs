//! Selection geometry: pure conversions between the engine's (cursor, mode,
//! visual) model and the host's selection-range model. No state, no I/O.
//!
//! The reducer consults this crate but never duplicates its logic; any mode
//! whose host-side shape changes in the future is changed here only.

#![forbid(unsafe_code)]

use core_coords::{Cursor, HostPos, Mode, Selection};

/// Project an engine cursor into the host's selection(s).
///
/// Visual-block and select-block fall through to the charwise case: most
/// hosts don't carry disjoint selections, so block Visual renders as a single
/// charwise range spanning the same corners. A future revision may
/// special-case hosts with native disjoint selections.
pub fn selections_from(cursor: Cursor) -> Vec<Selection> {
    match cursor.mode {
        Mode::Normal | Mode::OperatorPending | Mode::Cmdline => {
            let start = cursor.position.to_host();
            vec![Selection::ordered(start, start.plus_cols(1))]
        }
        Mode::Insert | Mode::Replace => {
            vec![Selection::collapsed(cursor.position.to_host())]
        }
        Mode::Visual | Mode::Select | Mode::VisualBlock | Mode::SelectBlock => {
            let (min, max) = cursor.ordered_range();
            let start = min.to_host();
            let end = max.to_host().plus_cols(1);
            vec![Selection::ordered(start, end)]
        }
        Mode::VisualLine | Mode::SelectLine => {
            let (min, max) = cursor.ordered_range();
            let start = HostPos::new(min.to_host().line, 0);
            let end = HostPos::new(max.to_host().line + 1, 0);
            vec![Selection::ordered(start, end)]
        }
        Mode::HitEnterPrompt | Mode::Shell | Mode::Terminal => Vec::new(),
    }
}

/// Normalize a host-reported selection to the engine's expected geometry for
/// `mode`, given the current line contents. Returns `selection` unchanged
/// whenever the precondition for adjustment doesn't hold.
pub fn adjust(selection: Selection, mode: Mode, lines: &[String]) -> Selection {
    if !selection.is_single_line() {
        return selection;
    }
    let span = selection.len_cols();
    if span > 1 {
        return selection;
    }
    let line_idx = selection.start.line as usize;
    let Some(line) = lines.get(line_idx) else {
        return selection;
    };

    match mode {
        Mode::Insert | Mode::Replace => Selection::collapsed(selection.start),
        m if m.is_visual_family() || m.is_select_family() => {
            if span == 1 {
                // Already a non-collapsed selection: leave as-is.
                selection
            } else {
                adjust_normal(selection.start, line)
            }
        }
        _ => adjust_normal(selection.start, line),
    }
}

fn adjust_normal(start: HostPos, line: &str) -> Selection {
    if line.is_empty() {
        let l = HostPos::new(start.line, 0);
        return Selection::ordered(l, l.plus_cols(1));
    }
    let last_col = (line.chars().count() as u32).saturating_sub(1);
    let clamped_start = HostPos::new(start.line, start.column.min(last_col));
    Selection::ordered(clamped_start, clamped_start.plus_cols(1))
}

/// Bounding box (min start, max end) across `selections`; `None` if empty.
pub fn join(selections: &[Selection]) -> Option<Selection> {
    let mut iter = selections.iter().copied();
    let first = iter.next()?;
    let (start, end) = iter.fold((first.start, first.end), |(s, e), sel| {
        (s.min(sel.start), e.max(sel.end))
    });
    Some(Selection::ordered(start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_coords::EnginePos;
    use pretty_assertions::assert_eq;

    fn cur(mode: Mode, pos: (u32, u32), vis: (u32, u32)) -> Cursor {
        Cursor::new(
            mode,
            EnginePos::new(pos.0, pos.1),
            EnginePos::new(vis.0, vis.1),
        )
    }

    #[test]
    fn normal_mode_one_char_block() {
        let c = cur(Mode::Normal, (2, 2), (2, 2));
        let sels = selections_from(c);
        assert_eq!(sels, vec![Selection::ordered(HostPos::new(1, 1), HostPos::new(1, 2))]);
    }

    #[test]
    fn insert_mode_collapsed() {
        let c = cur(Mode::Insert, (1, 1), (1, 1));
        let sels = selections_from(c);
        assert_eq!(sels, vec![Selection::collapsed(HostPos::new(0, 0))]);
    }

    #[test]
    fn visual_mode_inclusive_end() {
        let c = cur(Mode::Visual, (2, 2), (1, 1));
        let sels = selections_from(c);
        assert_eq!(
            sels,
            vec![Selection::ordered(HostPos::new(0, 0), HostPos::new(1, 2))]
        );
    }

    #[test]
    fn visual_line_mode_full_lines() {
        let c = cur(Mode::VisualLine, (3, 5), (1, 1));
        let sels = selections_from(c);
        assert_eq!(
            sels,
            vec![Selection::ordered(HostPos::new(0, 0), HostPos::new(3, 0))]
        );
    }

    #[test]
    fn prompt_modes_have_no_selection() {
        assert!(selections_from(cur(Mode::HitEnterPrompt, (1, 1), (1, 1))).is_empty());
        assert!(selections_from(cur(Mode::Shell, (1, 1), (1, 1))).is_empty());
        assert!(selections_from(cur(Mode::Terminal, (1, 1), (1, 1))).is_empty());
    }

    #[test]
    fn adjust_empty_line_yields_unit_block() {
        let lines = vec![String::new()];
        let sel = Selection::collapsed(HostPos::new(0, 0));
        let out = adjust(sel, Mode::Normal, &lines);
        assert_eq!(out, Selection::ordered(HostPos::new(0, 0), HostPos::new(0, 1)));
    }

    #[test]
    fn adjust_clamps_to_last_column() {
        let lines = vec!["abc".to_string()];
        let sel = Selection::collapsed(HostPos::new(0, 10));
        let out = adjust(sel, Mode::Normal, &lines);
        assert_eq!(out, Selection::ordered(HostPos::new(0, 2), HostPos::new(0, 3)));
    }

    #[test]
    fn adjust_leaves_non_collapsed_visual_selection_alone() {
        let lines = vec!["abcdef".to_string()];
        let sel = Selection::ordered(HostPos::new(0, 1), HostPos::new(0, 2));
        let out = adjust(sel, Mode::Visual, &lines);
        assert_eq!(out, sel);
    }

    #[test]
    fn adjust_multi_line_selection_is_unchanged() {
        let lines = vec!["abc".to_string(), "def".to_string()];
        let sel = Selection::ordered(HostPos::new(0, 1), HostPos::new(1, 1));
        let out = adjust(sel, Mode::Normal, &lines);
        assert_eq!(out, sel);
    }

    #[test]
    fn adjust_out_of_range_line_is_unchanged() {
        let lines = vec!["abc".to_string()];
        let sel = Selection::collapsed(HostPos::new(5, 0));
        let out = adjust(sel, Mode::Normal, &lines);
        assert_eq!(out, sel);
    }

    #[test]
    fn join_computes_bounding_box() {
        let a = Selection::ordered(HostPos::new(0, 0), HostPos::new(0, 3));
        let b = Selection::ordered(HostPos::new(1, 0), HostPos::new(1, 2));
        let joined = join(&[a, b]).unwrap();
        assert_eq!(joined, Selection::ordered(HostPos::new(0, 0), HostPos::new(1, 2)));
    }

    #[test]
    fn join_empty_is_none() {
        assert_eq!(join(&[]), None);
    }

    #[test]
    fn selections_from_then_adjust_is_idempotent_for_short_selections() {
        let c = cur(Mode::Normal, (1, 1), (1, 1));
        let lines = vec!["abc".to_string()];
        let sels = selections_from(c);
        let adjusted = adjust(sels[0], Mode::Normal, &lines);
        let twice = adjust(adjusted, Mode::Normal, &lines);
        assert_eq!(adjusted, twice);
    }
}
