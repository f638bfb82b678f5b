// Copyright 2025 Cameron Swords
// SPDX-License-Identifier: Apache-2.0

//! The stream normalizer: a single stable left-to-right pass that merges
//! adjacent atoms the layout interpreter would otherwise process one at a
//! time with an identical net effect.
//!
//! Merging adjacent `Text` runs of the same fill kind is purely an
//! optimization (the interpreter treats two atoms back to back exactly as
//! it treats their concatenation). Merging adjacent `Blanks` is not a
//! simple sum, though: each `Blanks(n)` means "the trailing blank run must
//! be *at least* n lines", so two requirements back to back compose by
//! taking the stronger (larger) one, not by adding — see the design ledger
//! for the worked example this resolves.

use std::rc::Rc;

use crate::atom::{Atom, Fill};

pub(crate) fn normalize(atoms: Vec<Atom>) -> Vec<Atom> {
    let mut out: Vec<Atom> = Vec::with_capacity(atoms.len());
    for atom in atoms {
        let merged = match (out.last_mut(), &atom) {
            (
                Some(Atom::Text {
                    fill: f1,
                    width: w1,
                    text: t1,
                }),
                Atom::Text {
                    fill: f2,
                    width: w2,
                    text: t2,
                },
            ) if fills_match(*f1, *f2) => {
                let mut merged_text = String::with_capacity(t1.len() + t2.len());
                merged_text.push_str(t1);
                merged_text.push_str(t2);
                *t1 = Rc::from(merged_text);
                *w1 += *w2;
                true
            }
            (Some(Atom::Blanks(n1)), Atom::Blanks(n2)) => {
                *n1 = (*n1).max(*n2);
                true
            }
            _ => false,
        };
        if !merged {
            out.push(atom);
        }
    }
    out
}

fn fills_match(a: Fill, b: Fill) -> bool {
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn text(s: &str) -> Atom {
        Atom::Text {
            fill: Fill::Plain,
            width: s.chars().count() as i32,
            text: Rc::from(s),
        }
    }

    #[test]
    fn merges_adjacent_text_with_matching_fill() {
        let atoms = vec![text("foo"), text("bar")];
        let out = normalize(atoms);
        assert_eq!(out.len(), 1);
        match &out[0] {
            Atom::Text { text, width, .. } => {
                assert_eq!(&**text, "foobar");
                assert_eq!(*width, 6);
            }
            _ => panic!("expected merged text"),
        }
    }

    #[test]
    fn does_not_merge_text_with_differing_fill() {
        let atoms = vec![
            text("foo"),
            Atom::Text {
                fill: Fill::VFill,
                width: 3,
                text: Rc::from("bar"),
            },
        ];
        assert_eq!(normalize(atoms).len(), 2);
    }

    #[test]
    fn merges_adjacent_blanks_by_max_not_sum() {
        let atoms = vec![Atom::Blanks(2), Atom::Blanks(3)];
        let out = normalize(atoms);
        assert_eq!(out.len(), 1);
        assert!(matches!(out[0], Atom::Blanks(3)));
    }

    #[test]
    fn non_mergeable_atoms_keep_order() {
        let atoms = vec![text("a"), Atom::Newline, text("b")];
        let out = normalize(atoms);
        assert_eq!(out.len(), 3);
    }
}
