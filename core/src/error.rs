//! Error types for the Tessera Templating Engine.
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
    crate::file::Coordinate,
    std::{
        error::Error as StdError,
        fmt::{
            Display,
            Formatter,
            Result as FmtResult,
        },
        io::Error as IOError,
        path::PathBuf,
        result::Result as StdResult,
    },
    serde_json::Error as JsonError,
};

/// The error type for the Tessera Templating Engine.
///
/// Lexing and parsing errors are always fatal. Evaluation errors travel
/// through expressions as [`Value::Error`](crate::Value::Error) and only
/// surface here, as [`Error::Eval`], once they reach a statement.
#[derive(Debug)]
pub enum Error {
    IO(IOError, PathBuf),
    JsonParse(JsonError, PathBuf),
    NotAMap(String),
    InvalidConfig(String),
    TemplateNotFound(String),

    UnterminatedString(Coordinate, String),
    UnexpectedDelimiter(char, Coordinate, String),
    UnclosedDelimiter(char, Coordinate, String),
    UnexpectedCharacter(char, Coordinate, String),
    InvalidNumber(String, Coordinate, String),
    UnterminatedTag(String, Coordinate, String),

    UnknownStatement(String, Coordinate, String),
    UnexpectedToken(String, String, Coordinate, String),
    UnexpectedEof(String, Coordinate, String),
    AlreadyExtending(Coordinate, String),
    CircularExtends(String, Coordinate, String),
    DuplicateBlock(String, Coordinate, String),
    DuplicateParameter(String, Coordinate, String),
    InvalidSyntax(String, Coordinate, String),

    Eval(EvalError, Coordinate, String),
    Include(Box<Error>, Coordinate, String),
}

impl Display for Error {
    fn fmt(&self, fmtr: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::IO(e, p) => fmtr.write_fmt(format_args!("IO error in {:?} {:?}", p, e)),
            Self::JsonParse(e, p) => fmtr.write_fmt(format_args!("Json error in {:?} {:?}", p, e)),
            Self::NotAMap(what) => fmtr.write_fmt(
                format_args!("{} was not a json object", what)
            ),
            Self::InvalidConfig(reason) => fmtr.write_fmt(
                format_args!("Invalid configuration: {}", reason)
            ),
            Self::TemplateNotFound(name) => fmtr.write_fmt(
                format_args!("Template {:?} was not found", name)
            ),
            Self::UnterminatedString(c, t) => fmtr.write_fmt(format_args!(
                "Unterminated string in {:?} at {}",
                t,
                c,
            )),
            Self::UnexpectedDelimiter(ch, c, t) => fmtr.write_fmt(format_args!(
                "Unexpected delimiter '{}' in {:?} at {}",
                ch,
                t,
                c,
            )),
            Self::UnclosedDelimiter(ch, c, t) => fmtr.write_fmt(format_args!(
                "Expected '{}' before the end of the tag in {:?} at {}",
                ch,
                t,
                c,
            )),
            Self::UnexpectedCharacter(ch, c, t) => fmtr.write_fmt(format_args!(
                "Unexpected '{}' character in {:?} at {}",
                ch,
                t,
                c,
            )),
            Self::InvalidNumber(n, c, t) => fmtr.write_fmt(format_args!(
                "Invalid number literal '{}' in {:?} at {}",
                n,
                t,
                c,
            )),
            Self::UnterminatedTag(name, c, t) => fmtr.write_fmt(format_args!(
                "Unterminated {} in {:?} at {}",
                name,
                t,
                c,
            )),
            Self::UnknownStatement(name, c, t) => fmtr.write_fmt(format_args!(
                "Unknown control structure '{}' in {:?} at {}",
                name,
                t,
                c,
            )),
            Self::UnexpectedToken(expected, found, c, t) => fmtr.write_fmt(format_args!(
                "Expected {} but found '{}' in {:?} at {}",
                expected,
                found,
                t,
                c,
            )),
            Self::UnexpectedEof(expected, c, t) => fmtr.write_fmt(format_args!(
                "Unexpected end of template, expected tag '{}' in {:?} at {}",
                expected,
                t,
                c,
            )),
            Self::AlreadyExtending(c, t) => fmtr.write_fmt(format_args!(
                "Template {:?} is already extending another template, but was commanded to extend again at {}",
                t,
                c,
            )),
            Self::CircularExtends(parent, c, t) => fmtr.write_fmt(format_args!(
                "Template {:?} extends {:?} at {}, which is already being extended",
                t,
                parent,
                c,
            )),
            Self::DuplicateBlock(name, c, t) => fmtr.write_fmt(format_args!(
                "Block '{}' is defined more than once in {:?} (again at {})",
                name,
                t,
                c,
            )),
            Self::DuplicateParameter(name, c, t) => fmtr.write_fmt(format_args!(
                "Parameter '{}' is declared more than once in {:?} at {}",
                name,
                t,
                c,
            )),
            Self::InvalidSyntax(reason, c, t) => fmtr.write_fmt(format_args!(
                "{} in {:?} at {}",
                reason,
                t,
                c,
            )),
            Self::Eval(e, c, t) => fmtr.write_fmt(format_args!(
                "{} in {:?} at {}",
                e,
                t,
                c,
            )),
            Self::Include(e, c, t) => fmtr.write_fmt(format_args!(
                "{} (while loading from {:?} at {})",
                e,
                t,
                c,
            )),
        }
    }
}

impl Error {
    /// Carry a render failure back into expression evaluation, as when a
    /// macro body or `super()` fails.
    pub(crate)
    fn into_eval(self) -> EvalError {
        match self {
            Self::Eval(e, c, t) => {
                let message = format!("{} in {:?} at {}", e.message(), t, c);
                let mut out = EvalError::new(e.kind(), message);
                out.trace = e.trace;
                out
            },
            e => EvalError::runtime(e.to_string()),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::IO(e, _) => Some(e),
            Self::JsonParse(e, _) => Some(e),
            Self::Include(e, _, _) => Some(e.as_ref()),
            _ => None,
        }
    }
}

/// The result type for the Tessera Templating Engine.
pub type Result<T> = StdResult<T, Error>;

/// What kind of failure an [`EvalError`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalErrorKind {
    /// An unbound name, attribute or item under strict-undefined.
    Undefined,
    /// Operands of the wrong type for an operation.
    Type,
    /// Bad arguments to a call, filter, test or macro.
    Call,
    /// An unknown filter or test.
    Unknown,
    /// Anything else, e.g. division by zero or a user raised error.
    Runtime,
}

/// An error produced while evaluating an expression.
///
/// The first error in an expression is bubbled unchanged; every enclosing
/// expression only appends its source text to `trace`.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalError {
    kind: EvalErrorKind,
    message: String,
    trace: Vec<String>,
}

impl EvalError {
    pub
    fn new<S: Into<String>>(kind: EvalErrorKind, message: S) -> Self {
        Self {
            kind,
            message: message.into(),
            trace: Vec::new(),
        }
    }

    pub
    fn undefined<S: Into<String>>(message: S) -> Self {
        Self::new(EvalErrorKind::Undefined, message)
    }

    pub
    fn type_error<S: Into<String>>(message: S) -> Self {
        Self::new(EvalErrorKind::Type, message)
    }

    pub
    fn call<S: Into<String>>(message: S) -> Self {
        Self::new(EvalErrorKind::Call, message)
    }

    pub
    fn runtime<S: Into<String>>(message: S) -> Self {
        Self::new(EvalErrorKind::Runtime, message)
    }

    pub
    fn kind(&self) -> EvalErrorKind {
        self.kind
    }

    pub
    fn message(&self) -> &str {
        &self.message
    }

    /// The source text of each expression the error bubbled through,
    /// innermost first.
    pub
    fn trace(&self) -> &[String] {
        &self.trace
    }

    pub
    fn is_undefined(&self) -> bool {
        self.kind == EvalErrorKind::Undefined
    }

    pub(crate)
    fn with_context<S: Into<String>>(mut self, expr: S) -> Self {
        let expr = expr.into();
        if self.trace.last() != Some(&expr) {
            self.trace.push(expr);
        }
        self
    }
}

impl Display for EvalError {
    fn fmt(&self, fmtr: &mut Formatter<'_>) -> FmtResult {
        fmtr.write_str(&self.message)?;

        if let Some(outer) = self.trace.last() {
            fmtr.write_fmt(format_args!(" (while evaluating `{}`)", outer))?;
        }

        Ok(())
    }
}

impl StdError for EvalError {}
