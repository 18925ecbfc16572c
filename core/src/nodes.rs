//! The abstract syntax tree of the Tessera Templating Engine.
// Copyright (C) 2024  Frankie Baffa
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use {
    crate::{
        loader::Loader,
        statements::Statement,
        token::Token,
    },
    indexmap::IndexMap,
    std::{
        collections::HashMap,
        fmt::{
            Debug,
            Display,
            Formatter,
            Result as FmtResult,
        },
        sync::Arc,
    },
};

/// A literal constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Const {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Pos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
    Add,
    Sub,
    Concat,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

impl BinaryOp {
    pub
    fn symbol(&self) -> &'static str {
        match self {
            Self::Or => "or",
            Self::And => "and",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::In => "in",
            Self::NotIn => "not in",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Concat => "~",
            Self::Mul => "*",
            Self::Div => "/",
            Self::FloorDiv => "//",
            Self::Mod => "%",
            Self::Pow => "**",
        }
    }
}

/// A filter or test invocation: `name(args, key=value)`.
#[derive(Debug, Clone, PartialEq)]
pub
struct Invocation {
    pub name: String,
    pub args: Vec<Expr>,
    pub kwargs: Vec<(String, Expr)>,
    pub token: Token,
}

/// An expression node. Every node keeps the token it starts at.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Const, Token),
    Name(String, Token),
    List(Vec<Expr>, Token),
    Tuple(Vec<Expr>, Token),
    Dict(Vec<(Expr, Expr)>, Token),
    Unary(UnaryOp, Box<Expr>, Token),
    Binary(BinaryOp, Box<Expr>, Box<Expr>, Token),
    GetAttr(Box<Expr>, String, Token),
    GetItem(Box<Expr>, Box<Expr>, Token),
    GetSlice {
        target: Box<Expr>,
        start: Option<Box<Expr>>,
        stop: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
        token: Token,
    },
    Call {
        target: Box<Expr>,
        args: Vec<Expr>,
        kwargs: Vec<(String, Expr)>,
        token: Token,
    },
    Filtered(Box<Expr>, Vec<Invocation>),
    Test {
        expr: Box<Expr>,
        test: Invocation,
        negated: bool,
    },
    /// Stands in for a macro parameter without a default under
    /// strict-undefined; fails only when evaluated.
    Undefined(String, Token),
}

impl Expr {
    /// The token the expression starts at.
    pub
    fn token(&self) -> &Token {
        match self {
            Self::Literal(_, t) |
            Self::Name(_, t) |
            Self::List(_, t) |
            Self::Tuple(_, t) |
            Self::Dict(_, t) |
            Self::Unary(_, _, t) |
            Self::Binary(_, _, _, t) |
            Self::GetAttr(_, _, t) |
            Self::GetItem(_, _, t) |
            Self::Undefined(_, t) => t,
            Self::GetSlice { token, .. } |
            Self::Call { token, .. } => token,
            Self::Filtered(expr, _) => expr.token(),
            Self::Test { expr, .. } => expr.token(),
        }
    }
}

fn write_list(fmtr: &mut Formatter<'_>, items: &[Expr]) -> FmtResult {
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            fmtr.write_str(", ")?;
        }
        Display::fmt(item, fmtr)?;
    }
    Ok(())
}

fn write_arguments(fmtr: &mut Formatter<'_>, args: &[Expr], kwargs: &[(String, Expr)]) -> FmtResult {
    fmtr.write_str("(")?;
    write_list(fmtr, args)?;
    for (idx, (name, value)) in kwargs.iter().enumerate() {
        if idx > 0 || !args.is_empty() {
            fmtr.write_str(", ")?;
        }
        fmtr.write_fmt(format_args!("{}={}", name, value))?;
    }
    fmtr.write_str(")")
}

impl Display for Invocation {
    fn fmt(&self, fmtr: &mut Formatter<'_>) -> FmtResult {
        fmtr.write_str(&self.name)?;
        if !self.args.is_empty() || !self.kwargs.is_empty() {
            write_arguments(fmtr, &self.args, &self.kwargs)?;
        }
        Ok(())
    }
}

impl Display for Expr {
    fn fmt(&self, fmtr: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Literal(_, token) => fmtr.write_str(&token.text),
            Self::Name(name, _) => fmtr.write_str(name),
            Self::List(items, _) => {
                fmtr.write_str("[")?;
                write_list(fmtr, items)?;
                fmtr.write_str("]")
            },
            Self::Tuple(items, _) => {
                fmtr.write_str("(")?;
                write_list(fmtr, items)?;
                if items.len() == 1 {
                    fmtr.write_str(",")?;
                }
                fmtr.write_str(")")
            },
            Self::Dict(pairs, _) => {
                fmtr.write_str("{")?;
                for (idx, (k, v)) in pairs.iter().enumerate() {
                    if idx > 0 {
                        fmtr.write_str(", ")?;
                    }
                    fmtr.write_fmt(format_args!("{}: {}", k, v))?;
                }
                fmtr.write_str("}")
            },
            Self::Unary(UnaryOp::Not, e, _) => fmtr.write_fmt(format_args!("not {}", e)),
            Self::Unary(UnaryOp::Neg, e, _) => fmtr.write_fmt(format_args!("-{}", e)),
            Self::Unary(UnaryOp::Pos, e, _) => fmtr.write_fmt(format_args!("+{}", e)),
            Self::Binary(op, l, r, _) => fmtr.write_fmt(format_args!(
                "{} {} {}", l, op.symbol(), r
            )),
            Self::GetAttr(target, attr, _) => fmtr.write_fmt(format_args!("{}.{}", target, attr)),
            Self::GetItem(target, index, _) => fmtr.write_fmt(format_args!("{}[{}]", target, index)),
            Self::GetSlice { target, start, stop, step, .. } => {
                Display::fmt(target, fmtr)?;
                fmtr.write_str("[")?;
                if let Some(start) = start {
                    Display::fmt(start, fmtr)?;
                }
                fmtr.write_str(":")?;
                if let Some(stop) = stop {
                    Display::fmt(stop, fmtr)?;
                }
                if let Some(step) = step {
                    fmtr.write_fmt(format_args!(":{}", step))?;
                }
                fmtr.write_str("]")
            },
            Self::Call { target, args, kwargs, .. } => {
                Display::fmt(target, fmtr)?;
                write_arguments(fmtr, args, kwargs)
            },
            Self::Filtered(expr, filters) => {
                Display::fmt(expr, fmtr)?;
                for filter in filters {
                    fmtr.write_fmt(format_args!("|{}", filter))?;
                }
                Ok(())
            },
            Self::Test { expr, test, negated } => fmtr.write_fmt(format_args!(
                "{} is {}{}",
                expr,
                if *negated { "not " } else { "" },
                test,
            )),
            Self::Undefined(name, _) => fmtr.write_str(name),
        }
    }
}

/// Literal template text between tags.
#[derive(Debug, Clone, PartialEq)]
pub
struct Data {
    pub token: Token,
}

impl Data {
    /// The text after applying the trim flags the lexer recorded.
    pub
    fn trimmed(&self) -> &str {
        let text = self.token.text.as_str();

        let mut end = text.len();
        if self.token.trim_right {
            end = text.trim_end().len();
        }
        else if self.token.lstrip {
            let stripped = text.trim_end_matches(|c| c == ' ' || c == '\t');
            // only whitespace that opens a line is stripped
            if stripped.ends_with('\n') ||
                (stripped.is_empty() && self.token.coord.position() == 0)
            {
                end = stripped.len();
            }
        }

        let mut start = 0;
        if self.token.trim_left {
            start = text.len() - text.trim_start().len();
        }
        else if self.token.strip_newline {
            if text.starts_with("\r\n") {
                start = 2;
            }
            else if text.starts_with('\n') {
                start = 1;
            }
        }

        if start >= end {
            return "";
        }

        &text[start..end]
    }
}

/// An `{{ expression }}` tag, optionally `{{ a if cond else b }}`.
#[derive(Debug, Clone, PartialEq)]
pub
struct Output {
    pub expr: Expr,
    pub condition: Option<Expr>,
    pub alternative: Option<Expr>,
    pub token: Token,
}

/// A control structure tag and everything it wraps.
#[derive(Debug, Clone)]
pub
struct StatementBlock {
    pub name: String,
    pub statement: Statement,
    pub token: Token,
}

/// A statement node of the tree.
#[derive(Debug, Clone)]
pub enum Node {
    Data(Data),
    Output(Output),
    Statement(StatementBlock),
    Comment(Token),
}

/// Everything between an opening tag and its matching closing tag.
#[derive(Debug, Clone, Default)]
pub
struct Wrapper {
    pub nodes: Vec<Node>,
    /// The name of the tag that closed the wrapper, `None` at top level.
    pub end_tag: Option<String>,
    /// The closing tag's name token.
    pub end: Option<Token>,
}

/// A macro parameter and the expression bound when no argument is given.
#[derive(Debug, Clone)]
pub
struct MacroParam {
    pub name: String,
    pub default: Expr,
    pub required: bool,
}

/// A `{% macro %}` definition.
#[derive(Debug, Clone)]
pub
struct MacroDef {
    pub name: String,
    pub params: Vec<MacroParam>,
    pub body: Wrapper,
    pub token: Token,
}

/// A parsed template.
///
/// `parent` is resolved while parsing an `extends` tag, so the whole
/// ancestry is available without touching the loader again.
pub
struct Template {
    pub name: String,
    pub root: Wrapper,
    pub parent: Option<Arc<Template>>,
    pub blocks: HashMap<String, Arc<Wrapper>>,
    pub macros: IndexMap<String, Arc<MacroDef>>,
    pub loader: Arc<dyn Loader>,
}

impl Template {
    /// This template followed by its ancestors, most derived first.
    pub
    fn chain(self: &Arc<Self>) -> Vec<Arc<Template>> {
        let mut chain = vec![ self.clone(), ];
        let mut current = self.parent.clone();
        while let Some(t) = current {
            current = t.parent.clone();
            chain.push(t);
        }
        chain
    }
}

impl Debug for Template {
    fn fmt(&self, fmtr: &mut Formatter<'_>) -> FmtResult {
        fmtr.debug_struct("Template")
            .field("name", &self.name)
            .field("root", &self.root)
            .field("parent", &self.parent.as_ref().map(|p| p.name.clone()))
            .field("blocks", &self.blocks.keys().collect::<Vec<&String>>())
            .field("macros", &self.macros.keys().collect::<Vec<&String>>())
            .finish()
    }
}
