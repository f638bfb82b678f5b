// Copyright 2025 Cameron Swords
// SPDX-License-Identifier: Apache-2.0

//! The layout interpreter, box compositor, and line serializer.
//!
//! This is the one module the rest of the crate routes every render through:
//! [`render`] and [`get_dimensions`] are the only two entry points `Doc`
//! exposes for turning an atom tree into output.

use std::collections::VecDeque;
use std::rc::Rc;

use crate::atom::{Alignment, Atom, Fill};
use crate::doc::{flatten_to_atoms, Doc};
use crate::normalize::normalize;

/// One output line: an ordered run of `Text`/`SoftSpace` atoms plus whether
/// it ends in a newline. Never holds `Newline`, `Blanks`, `Push*`/`Pop*`,
/// `WithColumn`/`WithLineLength`, or (once the box compositor has run) `Box`.
#[derive(Clone)]
pub(crate) struct Line {
    pub(crate) needs_newline: bool,
    pub(crate) atoms: Vec<Atom>,
}

/// The display width a single atom contributes to a line's column count.
/// `SoftSpace` counts as 1 (it prints as a literal space unless it ends up
/// trailing); every other non-`Text`/`Box` atom is layout-transparent and
/// contributes 0 (none ever reach a `Line`'s atom list in practice).
fn atom_width(atom: &Atom) -> i32 {
    match atom {
        Atom::Text { width, .. } => *width,
        Atom::Box { width, .. } => *width,
        Atom::SoftSpace => 1,
        _ => 0,
    }
}

fn spaces(n: i32) -> Rc<str> {
    Rc::from(" ".repeat(n.max(0) as usize))
}

struct RenderState {
    column: i32,
    nesting: Vec<i32>,
    current_nesting: i32,
    alignment: Vec<Alignment>,
    current_alignment: Alignment,
    line_length: Option<i32>,
    blanks: Option<i32>,
    current_line: Vec<Atom>,
    actual_width: i32,
    lines: Vec<Line>,
}

impl RenderState {
    fn new(line_length: Option<i32>) -> Self {
        RenderState {
            column: 0,
            nesting: vec![0],
            current_nesting: 0,
            alignment: vec![Alignment::Left],
            current_alignment: Alignment::Left,
            line_length,
            blanks: None,
            current_line: Vec::new(),
            actual_width: 0,
            lines: Vec::new(),
        }
    }

    /// Inject the left margin for a fresh line and snap `column` to match it.
    /// Idempotent when `column` already equals `current_nesting` (the usual
    /// post-flush case); also correct when a push changed `current_nesting`
    /// before any line has been flushed yet.
    fn inject_margin(&mut self) {
        let w = self.current_nesting;
        if w > 0 {
            self.current_line.push(Atom::Text {
                fill: Fill::Plain,
                width: w,
                text: spaces(w),
            });
        }
        self.column = w;
    }

    fn push_text_or_box(&mut self, atom: Atom, width: i32, triggers_margin: bool) {
        if self.current_line.is_empty() && self.current_nesting > 0 && triggers_margin {
            self.inject_margin();
        }
        self.current_line.push(atom);
        self.column += width;
    }

    /// The line flush algorithm: strip trailing soft spaces, decide
    /// whether the accumulated line fits, split at the rightmost soft space
    /// on overflow, apply alignment padding, and append the result.
    ///
    /// A single trigger (an overflowing `SoftSpace`, `Newline`, `Blanks`, or
    /// end of stream) may need more than one split to fully drain an
    /// accumulated line that overflows by more than one soft-space's worth
    /// (e.g. a long run consumed in one go with no intervening overflow
    /// check), so the split-and-emit step loops until what remains in
    /// `current_line` fits or holds no further soft space to split at.
    fn flush(&mut self, forced: bool) {
        loop {
            let nest_for_line = self.current_nesting;
            let align_for_line = self.current_alignment;

            let mut atoms = std::mem::take(&mut self.current_line);
            while matches!(atoms.last(), Some(Atom::SoftSpace)) {
                atoms.pop();
            }

            let printable_width_full: i32 = atoms.iter().map(atom_width).sum();
            let fits = match self.line_length {
                None => true,
                Some(ll) => self.column <= ll,
            };

            // Split at the rightmost (last-occurring, in document order)
            // soft space: everything before it is complete and emitted now;
            // everything after it continues as the new `current_line`.
            let (emitted, remainder) = if fits {
                (atoms, Vec::new())
            } else {
                match atoms.iter().rposition(|a| matches!(a, Atom::SoftSpace)) {
                    Some(idx) => {
                        let emitted = atoms[..idx].to_vec();
                        let remainder = atoms[idx + 1..].to_vec();
                        (emitted, remainder)
                    }
                    None => (atoms, Vec::new()),
                }
            };

            if remainder.is_empty() {
                self.current_line = Vec::new();
                self.column = nest_for_line;
            } else {
                let remainder_width: i32 = remainder.iter().map(atom_width).sum();
                let mut new_line = Vec::with_capacity(remainder.len() + 1);
                if nest_for_line > 0 {
                    new_line.push(Atom::Text {
                        fill: Fill::Plain,
                        width: nest_for_line,
                        text: spaces(nest_for_line),
                    });
                }
                new_line.extend(remainder);
                self.current_line = new_line;
                self.column = nest_for_line + remainder_width;
            }

            self.actual_width = self.actual_width.max(printable_width_full);

            // The in-flight line's pushes/pops now take visible effect.
            self.current_nesting = *self.nesting.last().unwrap();
            self.current_alignment = *self.alignment.last().unwrap();

            let is_final = self.current_line.is_empty();

            if !emitted.is_empty() {
                self.blanks = Some(0);

                let mut emitted = emitted;
                if let Some(ll) = self.line_length {
                    let printable_width_emitted: i32 = emitted.iter().map(atom_width).sum();
                    if printable_width_emitted > 0 {
                        match align_for_line {
                            Alignment::Left => {
                                let pad = (ll - printable_width_emitted).max(0);
                                for _ in 0..pad {
                                    emitted.push(Atom::SoftSpace);
                                }
                            }
                            Alignment::Right => {
                                let pad = (ll - printable_width_emitted).max(0);
                                if pad > 0 {
                                    emitted.insert(
                                        0,
                                        Atom::Text {
                                            fill: Fill::Plain,
                                            width: pad,
                                            text: spaces(pad),
                                        },
                                    );
                                }
                            }
                            Alignment::Center => {
                                let total_pad = (ll - printable_width_emitted).max(0);
                                let left_pad = total_pad / 2;
                                let right_pad = total_pad - left_pad;
                                if left_pad > 0 {
                                    emitted.insert(
                                        0,
                                        Atom::Text {
                                            fill: Fill::Plain,
                                            width: left_pad,
                                            text: spaces(left_pad),
                                        },
                                    );
                                }
                                for _ in 0..right_pad {
                                    emitted.push(Atom::SoftSpace);
                                }
                            }
                        }
                    }
                }

                // Only the final segment of a (possibly multi-split) flush
                // inherits the caller's `forced` flag; every earlier split
                // is itself a forced break, since content remains after it.
                let needs_newline = if is_final { forced } else { true };
                self.lines.push(Line {
                    needs_newline,
                    atoms: emitted,
                });
            }

            if is_final {
                break;
            }
        }
    }
}

/// The layout interpreter proper: consume the normalized atom stream and
/// produce a raw line list plus the observed maximum width. `Box` atoms are
/// left untouched here (they're just width-bearing atoms at this stage);
/// [`compose`] expands them afterward.
fn layout(line_length: Option<i32>, doc: Doc) -> (Vec<Line>, i32) {
    let atoms = normalize(flatten_to_atoms(doc));
    let mut queue: VecDeque<Atom> = atoms.into();
    let mut st = RenderState::new(line_length);

    while let Some(atom) = queue.pop_front() {
        match atom {
            Atom::WithColumn(f) => {
                let expanded = flatten_to_atoms(f(st.column));
                for a in expanded.into_iter().rev() {
                    queue.push_front(a);
                }
            }
            Atom::WithLineLength(f) => {
                let expanded = flatten_to_atoms(f(st.line_length));
                for a in expanded.into_iter().rev() {
                    queue.push_front(a);
                }
            }
            Atom::PushNesting(nf) => {
                let new_nest = nf.apply(st.column, *st.nesting.last().unwrap());
                st.nesting.push(new_nest);
                st.current_nesting = new_nest;
            }
            Atom::PopNesting => {
                if st.nesting.len() > 1 {
                    st.nesting.pop();
                }
                if st.current_line.is_empty() {
                    st.current_nesting = *st.nesting.last().unwrap();
                }
            }
            Atom::PushAlignment(a) => {
                st.alignment.push(a);
                st.current_alignment = a;
            }
            Atom::PopAlignment => {
                if st.alignment.len() > 1 {
                    st.alignment.pop();
                }
                if st.current_line.is_empty() {
                    st.current_alignment = *st.alignment.last().unwrap();
                }
            }
            Atom::Text { fill, width, text } => {
                let triggers_margin = width > 0;
                st.push_text_or_box(Atom::Text { fill, width, text }, width, triggers_margin);
            }
            Atom::Box { width, inner } => {
                st.push_text_or_box(Atom::Box { width, inner }, width, true);
            }
            Atom::SoftSpace => {
                if let Some(ll) = st.line_length {
                    if st.column > ll {
                        st.flush(true);
                        // Reprocessing at the fresh line start: a soft space
                        // right after a flush is discarded by the same rule
                        // that elides a trailing one, not pushed as a
                        // leading space.
                        continue;
                    }
                }
                st.current_line.push(Atom::SoftSpace);
                st.column += 1;
            }
            Atom::Newline => {
                st.flush(true);
            }
            Atom::Blanks(n) => {
                let n = n.max(0);
                st.flush(true);
                let terminal = queue.is_empty();
                if !terminal {
                    if let Some(cur) = st.blanks {
                        for _ in cur..n {
                            st.lines.push(Line {
                                needs_newline: true,
                                atoms: Vec::new(),
                            });
                        }
                        st.blanks = Some(cur.max(n));
                    }
                }
            }
        }
    }

    st.flush(false);
    (st.lines, st.actual_width)
}

/// Does this line need the box compositor at all?
fn has_box(line: &Line) -> bool {
    line.atoms.iter().any(|a| matches!(a, Atom::Box { .. }))
}

/// If a column's sole (pre-padding) sub-line is, modulo trailing alignment
/// soft-space padding, a lone `Text(VFill, _, t)`, return the fill atom the
/// vfill rule repeats on every padding row.
fn vfill_fill_atom(sub_lines: &[Line], width: i32) -> Option<Atom> {
    if sub_lines.len() != 1 {
        return None;
    }
    let atoms = &sub_lines[0].atoms;
    let mut trimmed: Vec<&Atom> = atoms.iter().collect();
    while matches!(trimmed.last(), Some(Atom::SoftSpace)) {
        trimmed.pop();
    }
    if let [Atom::Text {
        fill: Fill::VFill,
        text,
        ..
    }] = trimmed[..]
    {
        return Some(Atom::Text {
            fill: Fill::VFill,
            width,
            text: Rc::clone(text),
        });
    }
    None
}

/// Expand a single line containing one or more `Box` atoms into the rows
/// its columns produce (per-column recursive layout, row padding by
/// vfill/soft-space/empty fill, then transpose).
fn compose_line(line: Line) -> Vec<Line> {
    let mut columns: Vec<(i32, Vec<Line>)> = Vec::with_capacity(line.atoms.len());
    for atom in line.atoms {
        match atom {
            Atom::Box { width, inner } => {
                let (sub_raw, _) = layout(Some(width), inner);
                let sub = compose(sub_raw);
                columns.push((width, sub));
            }
            other => {
                let w = atom_width(&other);
                columns.push((
                    w,
                    vec![Line {
                        needs_newline: line.needs_newline,
                        atoms: vec![other],
                    }],
                ));
            }
        }
    }

    let max_depth = columns.iter().map(|(_, s)| s.len()).max().unwrap_or(0);
    let n_cols = columns.len();

    for (idx, (width, sub)) in columns.iter_mut().enumerate() {
        let d = sub.len();
        if d >= max_depth {
            continue;
        }
        let is_rightmost = idx + 1 == n_cols;
        let filler = match vfill_fill_atom(sub, *width) {
            Some(a) => Line {
                needs_newline: true,
                atoms: vec![a],
            },
            None if is_rightmost => Line {
                needs_newline: true,
                atoms: Vec::new(),
            },
            None => Line {
                needs_newline: true,
                atoms: vec![Atom::SoftSpace; (*width).max(0) as usize],
            },
        };
        for _ in 0..(max_depth - d - 1) {
            sub.push(filler.clone());
        }
        let mut last = filler;
        last.needs_newline = line.needs_newline;
        sub.push(last);
    }

    let mut rows = Vec::with_capacity(max_depth);
    for r in 0..max_depth {
        let mut atoms = Vec::new();
        let mut needs_newline = false;
        for (_, sub) in &columns {
            if let Some(l) = sub.get(r) {
                atoms.extend(l.atoms.iter().cloned());
                needs_newline |= l.needs_newline;
            }
        }
        rows.push(Line {
            needs_newline,
            atoms,
        });
    }
    rows
}

/// Expand every box-bearing line in `lines`; lines without boxes pass
/// through unchanged.
fn compose(lines: Vec<Line>) -> Vec<Line> {
    let mut out = Vec::with_capacity(lines.len());
    for line in lines {
        if has_box(&line) {
            out.extend(compose_line(line));
        } else {
            out.push(line);
        }
    }
    out
}

/// Full pipeline: layout, then box composition. The actual width is the
/// top-level layout's own (boxes contribute their declared width to their
/// host line's accounting directly, so composing them doesn't change it).
fn render_lines(line_length: Option<i32>, doc: Doc) -> (Vec<Line>, i32) {
    let (raw, actual_width) = layout(line_length, doc);
    (compose(raw), actual_width)
}

/// Fold a line's atoms into a string, dropping genuinely trailing
/// soft spaces and rendering interior ones as literal spaces.
fn serialize_line(line: &Line) -> String {
    let mut end = line.atoms.len();
    while end > 0 && matches!(line.atoms[end - 1], Atom::SoftSpace) {
        end -= 1;
    }
    let mut out = String::new();
    for atom in &line.atoms[..end] {
        match atom {
            Atom::Text { text, .. } => out.push_str(text),
            Atom::SoftSpace => out.push(' '),
            _ => {}
        }
    }
    out
}

/// Render `doc` to a UTF-8 string at wrap width `line_length` (`None` = no
/// wrap).
pub(crate) fn render(line_length: Option<i32>, doc: Doc) -> String {
    let (lines, _) = render_lines(line_length, doc);
    let mut out = String::new();
    for line in &lines {
        out.push_str(&serialize_line(line));
        if line.needs_newline {
            out.push('\n');
        }
    }
    out
}

/// `(actual_width, line_count)` after laying `doc` out at `line_length`.
pub(crate) fn get_dimensions(line_length: Option<i32>, doc: Doc) -> (i32, usize) {
    let (lines, actual_width) = render_lines(line_length, doc);
    (actual_width, lines.len())
}
