// Copyright 2025 Cameron Swords
// SPDX-License-Identifier: Apache-2.0

//! The atom vocabulary the document tree is built from, and the small
//! closure types used by the two lazy, layout-time-expanded atoms.

use std::rc::Rc;

use crate::doc::Doc;

/// A lazily-computed document that depends on the column the renderer has
/// reached. Stored as an `Rc` so `Atom` (and therefore `Doc`) stays cheap to
/// clone.
pub(crate) type ColumnFn = Rc<dyn Fn(i32) -> Doc>;

/// A lazily-computed document that depends on the ambient wrap width.
pub(crate) type LineLenFn = Rc<dyn Fn(Option<i32>) -> Doc>;

/// How a run of `Text` fills vertical space when it is the sole occupant of
/// a box column shorter than its neighbors.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Fill {
    /// An ordinary text run; padded with blank fill lines if its box column
    /// needs to grow to match a taller neighbor.
    Plain,
    /// Repeats its payload on every fill line instead of padding with
    /// blanks.
    VFill,
}

/// Which margin an aligned region's lines are pinned to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Alignment {
    Left,
    Right,
    Center,
}

/// The three useful shapes a nesting push can take, represented as a closed
/// enum (rather than an opaque closure) per the design notes: this keeps
/// `PushNesting` cheap to clone and comparable, and covers every shape the
/// public constructors ever produce (`nest`, `flush`, `aligned`).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum NestFn {
    /// Ignore both column and previous nesting; push a fixed level.
    Const(i32),
    /// Push `previous nesting + k`.
    Delta(i32),
    /// Push the column the renderer has reached.
    CurrentColumn,
}

impl NestFn {
    pub(crate) fn apply(self, column: i32, prev_nest: i32) -> i32 {
        match self {
            NestFn::Const(k) => k,
            NestFn::Delta(k) => prev_nest + k,
            NestFn::CurrentColumn => column,
        }
    }
}

/// One element of a document's atom stream.
///
/// `Atom` is kept separate from [`Doc`]'s tree shape (`Doc` adds only
/// `Empty`/`Concat` around a `Leaf(Atom)`) so normalization and the
/// interpreter can operate on a flat, linear stream of atoms without caring
/// how the caller built the tree that produced it.
#[derive(Clone)]
pub(crate) enum Atom {
    /// A contiguous printable run with no newline. `width` is its display
    /// width per the width oracle, not its byte or character length.
    Text { fill: Fill, width: i32, text: Rc<str> },
    /// Hard line break.
    Newline,
    /// A space that may become a line break on overflow, and is always
    /// elided when it ends up at the end of an emitted line.
    SoftSpace,
    /// Push a new indentation level, computed from the column and the
    /// previous top of the nesting stack.
    PushNesting(NestFn),
    PopNesting,
    PushAlignment(Alignment),
    PopAlignment,
    /// Require at least `n` blank lines at this point in the stream.
    Blanks(i32),
    /// A fixed-width sub-layout, embedded as a single cell on its host
    /// line(s) until the box compositor expands it.
    Box { width: i32, inner: Doc },
    /// Expand, at layout time, to the document `f` produces from the
    /// current column.
    WithColumn(ColumnFn),
    /// Expand, at layout time, to the document `f` produces from the
    /// ambient wrap width.
    WithLineLength(LineLenFn),
}

impl Atom {
    pub(crate) fn text(fill: Fill, s: impl Into<Rc<str>>) -> Atom {
        let text = s.into();
        let width = crate::width::display_width(&text);
        Atom::Text { fill, width, text }
    }
}
