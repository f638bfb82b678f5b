// Copyright 2025 Cameron Swords
// SPDX-License-Identifier: Apache-2.0

use crate::*;

// -------------------------------------------------------------------------------------------------
// Exp
// -------------------------------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Exp {
    Var(String),
    Lam {
        param: String,
        body: Box<Exp>,
    },
    App {
        fun: Box<Exp>,
        arg: Box<Exp>,
    },
    Let {
        name: String,
        value: Box<Exp>,
        body: Box<Exp>,
    },
}

impl Exp {
    pub fn var<S: Into<String>>(s: S) -> Self {
        Exp::Var(s.into())
    }
    pub fn lam<S: Into<String>>(param: S, body: Exp) -> Self {
        Exp::Lam {
            param: param.into(),
            body: Box::new(body),
        }
    }
    pub fn app(fun: Exp, arg: Exp) -> Self {
        Exp::App {
            fun: Box::new(fun),
            arg: Box::new(arg),
        }
    }
    pub fn let_in<S: Into<String>>(name: S, value: Exp, body: Exp) -> Self {
        Exp::Let {
            name: name.into(),
            value: Box::new(value),
            body: Box::new(body),
        }
    }
}

impl ToDoc for Exp {
    fn to_doc(&self) -> Doc {
        expr_doc(self)
    }
}

// -------------------------------------------------------------------------------------------------
// Exp to Doc
// -------------------------------------------------------------------------------------------------

/// Lower an expression to a `Doc` with minimal parentheses.
///
/// Precedence: `let` (0) < `λ` (1) < application (2) < atom (3). Every
/// space that could become a line break is a [`Doc::space`], so the same
/// `Doc` wraps at any width passed to [`Doc::render`] and prints on one
/// line when rendered with `None`.
///
/// - Precedence: `let` (0) < `λ` (1) < application (2) < atom (3)
pub fn expr_doc(e: &Exp) -> Doc {
    fn go(e: &Exp, ctx: u8) -> Doc {
        match e {
            Exp::Var(v) => Doc::lit(v.as_str()),

            Exp::Lam { param, body } => {
                let me = 1;
                let d = Doc::lit("\\")
                    .concat(Doc::lit(param.as_str()))
                    .concat(Doc::lit("."))
                    .concat(Doc::space())
                    .concat(go(body, me));
                if ctx > me {
                    d.parens()
                } else {
                    d
                }
            }

            Exp::App { fun, arg } => {
                let me = 2;
                let d = go(fun, me).concat_space(go(arg, me + 1).nest(2));
                if ctx > me {
                    d.parens()
                } else {
                    d
                }
            }

            Exp::Let { name, value, body } => {
                let me = 0;
                let head = Doc::lit("let")
                    .concat_space(Doc::lit(name.as_str()))
                    .concat_space(Doc::lit("="));

                let d = head
                    .concat_space(go(value, 0).nest(4))
                    .concat(Doc::space())
                    .concat(Doc::lit("in"))
                    .concat(Doc::space())
                    .concat(go(body, 0).nest(2));

                if ctx > me {
                    d.parens()
                } else {
                    d
                }
            }
        }
    }
    go(e, 0)
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    #[test]
    fn id_lambda() {
        let id = Exp::lam("x", Exp::var("x"));
        assert_snapshot!("id_compact", expr_doc(&id).render(None));
        assert_snapshot!("id_pretty", expr_doc(&id).render(Some(30)));
    }

    #[test]
    fn app_associativity_left() {
        // (f x) y
        let e = Exp::app(Exp::app(Exp::var("f"), Exp::var("x")), Exp::var("y"));
        assert_snapshot!("app_left_compact", expr_doc(&e).render(None));
        assert_snapshot!("app_left_pretty", expr_doc(&e).render(Some(10)));
    }

    #[test]
    fn app_associativity_right() {
        // f (x y)
        let e = Exp::app(Exp::var("f"), Exp::app(Exp::var("x"), Exp::var("y")));
        assert_snapshot!("app_right_compact", expr_doc(&e).render(None));
        assert_snapshot!("app_right_pretty", expr_doc(&e).render(Some(10)));
    }

    #[test]
    fn let_simple() {
        let e = Exp::let_in("x", Exp::var("a"), Exp::app(Exp::var("f"), Exp::var("x")));
        assert_snapshot!("let_simple_compact", expr_doc(&e).render(None));
        assert_snapshot!("let_simple_pretty", expr_doc(&e).render(Some(20)));
    }

    #[test]
    fn let_nested_lambda() {
        let e = Exp::let_in(
            "id",
            Exp::lam("x", Exp::var("x")),
            Exp::app(Exp::var("id"), Exp::var("y")),
        );
        assert_snapshot!("let_nested_lambda_compact", expr_doc(&e).render(None));
        assert_snapshot!("let_nested_lambda_pretty", expr_doc(&e).render(Some(12)));
    }

    #[test]
    fn wide_breaking_case() {
        // Force breaks with long names
        let long = Exp::var("veryLongIdentifierThatForcesWrap");
        let e = Exp::let_in(
            "value",
            Exp::app(long.clone(), Exp::var("arg1")),
            Exp::app(Exp::app(long, Exp::var("arg2")), Exp::var("arg3")),
        );
        assert_snapshot!("wide_compact", expr_doc(&e).render(None));
        assert_snapshot!("wide_pretty", expr_doc(&e).render(Some(24)));
    }

    #[test]
    fn to_list_joins_vars_with_separator() {
        let xs = [Exp::var("a"), Exp::var("b"), Exp::var("c")];
        let joined = crate::to_list(xs.iter(), Doc::lit(", "));
        assert_eq!(joined.render(None), "a, b, c");
    }
}
