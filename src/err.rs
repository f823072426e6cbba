//! Error-handling.
//!
//! Errors are chained: the [`ErrorChain::source`] is the error that actually happened, the
//! [`ErrorChain::chain`] gives context from the innermost to the outermost operation. User-facing
//! diagnostics (aliased conditions, duplicate slots...) are plain [`Error::Msg`] sources, so that
//! callers can compare them against the exact message.

use std::fmt;

use crate::parse::Span;

/// A position in some app-module text, with the surrounding lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    /// Row of the position (starts at `0`).
    pub row: usize,
    /// Column of the position, in bytes (starts at `0`).
    pub col: usize,
    /// Line of the position.
    pub line: String,
    /// Previous line.
    pub prev: Option<String>,
    /// Next line.
    pub next: Option<String>,
}
impl Located {
    /// Locates the start of a span in some text.
    pub fn of_span(span: Span, txt: &str) -> Self {
        let (prev, row, col, line, next) = span.pretty_of(txt);
        Self {
            row,
            col,
            line,
            prev,
            next,
        }
    }

    /// Multi-line excerpt of the text pointing at the position.
    ///
    /// ```rust
    /// # use svshi_verif::{err::Located, parse::Span};
    /// let txt = "fn f(physical_state: PhysicalState) {\n    return 1 +;\n}\n";
    /// let loc = Located::of_span(Span::new(52, 52), txt);
    /// assert_eq!((loc.row, loc.col), (1, 14));
    /// let excerpt = loc.excerpt("expected an expression");
    /// let lines: Vec<_> = excerpt.lines().collect();
    /// assert_eq!(lines.len(), 4);
    /// assert_eq!(lines[1], "2 |     return 1 +;");
    /// assert_eq!(lines[2].find('^'), Some(4 + 14));
    /// assert!(lines[2].ends_with("^~~~ expected an expression"));
    /// assert_eq!(lines[3], "  | }");
    /// ```
    pub fn excerpt(&self, msg: &str) -> String {
        let row_str = (self.row + 1).to_string();
        let pad = " ".repeat(row_str.len());
        let offset = self
            .line
            .char_indices()
            .take_while(|(idx, _)| *idx < self.col)
            .count();
        let mut lines = vec![];
        if let Some(prev) = &self.prev {
            lines.push(format!("{} | {}", pad, prev))
        }
        lines.push(format!("{} | {}", row_str, self.line));
        lines.push(format!(
            "{} | {}^~~~ {}",
            pad,
            " ".repeat(offset),
            if msg.is_empty() { "here" } else { msg }
        ));
        if let Some(next) = &self.next {
            lines.push(format!("{} | {}", pad, next))
        }
        lines.join("\n")
    }
}

/// Plain errors.
#[derive(Debug)]
pub enum Error {
    /// IO error from `std`.
    Io(std::io::Error),
    /// Error from [`rsmt2`], usually a solver crash or an unexpected answer.
    Smt(rsmt2::errors::Error),
    /// Parse error in an app module.
    Parse {
        /// Message, can be empty.
        msg: String,
        /// Position of the error.
        pos: Box<Located>,
    },
    /// A simple message.
    Msg(String),
}
impl Error {
    /// Parse error constructor.
    pub fn parse(msg: impl Into<String>, pos: Located) -> Self {
        Self::Parse {
            msg: msg.into(),
            pos: Box::new(pos),
        }
    }

    /// Pretty multi-line string representation.
    pub fn pretty(&self) -> String {
        match self {
            Self::Io(e) => format!("IO error: {}", e),
            Self::Smt(e) => {
                let mut s = "solver error:".to_string();
                for e in e.iter() {
                    s.push_str(&format!("\n- {}", e));
                }
                s
            }
            Self::Parse { msg, pos } => format!(
                "parse error at {}:{}\n{}",
                pos.row + 1,
                pos.col + 1,
                pos.excerpt(msg)
            ),
            Self::Msg(msg) => msg.clone(),
        }
    }
}
impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => e.fmt(fmt),
            Self::Smt(e) => e.fmt(fmt),
            Self::Msg(e) => e.fmt(fmt),
            Self::Parse { msg, pos } => write!(
                fmt,
                "parse error at {}:{}: {} | {}",
                pos.row + 1,
                pos.col + 1,
                msg,
                pos.line
            ),
        }
    }
}
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
impl From<rsmt2::errors::Error> for Error {
    fn from(e: rsmt2::errors::Error) -> Self {
        Self::Smt(e)
    }
}
impl From<String> for Error {
    fn from(s: String) -> Self {
        Self::Msg(s)
    }
}
impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Self::Msg(s.into())
    }
}

/// A source error and its context.
#[derive(Debug)]
pub struct ErrorChain {
    /// Source error.
    pub source: Error,
    /// Context errors, innermost first.
    pub chain: Vec<Error>,
}
impl ErrorChain {
    /// Constructor.
    pub fn new(source: impl Into<Error>) -> Self {
        Self {
            source: source.into(),
            chain: vec![],
        }
    }

    /// Iterator over the source and its context, innermost first.
    pub fn iter(&self) -> impl Iterator<Item = &Error> {
        Some(&self.source).into_iter().chain(&self.chain)
    }

    /// Multi-line representation, outermost context first.
    pub fn pretty(&self) -> String {
        let errs: Vec<&Error> = self.iter().collect();
        errs.into_iter()
            .rev()
            .map(|err| format!("- {}", err.pretty().replace('\n', "\n  ")))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
impl fmt::Display for ErrorChain {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.iter().enumerate() {
            if idx > 0 {
                write!(fmt, ", ")?;
            }
            err.fmt(fmt)?;
        }
        Ok(())
    }
}
impl From<Error> for ErrorChain {
    fn from(source: Error) -> Self {
        Self::new(source)
    }
}
impl From<std::io::Error> for ErrorChain {
    fn from(e: std::io::Error) -> Self {
        Self::new(e)
    }
}
impl From<rsmt2::errors::Error> for ErrorChain {
    fn from(e: rsmt2::errors::Error) -> Self {
        Self::new(e)
    }
}
impl From<String> for ErrorChain {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
impl From<&str> for ErrorChain {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Result type.
pub type Res<T> = Result<T, ErrorChain>;

/// Error-chaining extension trait.
pub trait ChainExt {
    /// Error-chaining result type.
    type Res;
    /// Adds some context.
    fn chain_err<E>(self, err: impl FnOnce() -> E) -> Self::Res
    where
        E: Into<Error>;
}
impl ChainExt for ErrorChain {
    type Res = ErrorChain;
    fn chain_err<E>(mut self, err: impl FnOnce() -> E) -> Self::Res
    where
        E: Into<Error>,
    {
        self.chain.push(err().into());
        self
    }
}
impl ChainExt for Error {
    type Res = ErrorChain;
    fn chain_err<E>(self, err: impl FnOnce() -> E) -> Self::Res
    where
        E: Into<Error>,
    {
        ErrorChain::new(self).chain_err(err)
    }
}
impl<T, Err> ChainExt for Result<T, Err>
where
    Err: Into<ErrorChain>,
{
    type Res = Res<T>;
    fn chain_err<E>(self, err: impl FnOnce() -> E) -> Self::Res
    where
        E: Into<Error>,
    {
        self.map_err(|e| e.into().chain_err(err))
    }
}

/// Parse error raised by a grammar action, positioned by a span.
#[derive(Debug)]
pub struct PError {
    /// Span of the offending construct.
    pub span: Span,
    /// Actual error.
    pub error: ErrorChain,
}
impl fmt::Display for PError {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            fmt,
            "[{}, {}] {}",
            self.span.start, self.span.end, self.error.source,
        )
    }
}
impl PError {
    /// Constructor.
    pub fn new(error: impl Into<ErrorChain>, span: impl Into<Span>) -> Self {
        PError {
            span: span.into(),
            error: error.into(),
        }
    }

    /// Adds some context.
    pub fn chain_err<E>(mut self, err: impl FnOnce() -> E) -> Self
    where
        E: Into<Error>,
    {
        self.error = self.error.chain_err(err);
        self
    }

    /// Positions the error in the text it comes from.
    ///
    /// The positioned parse error becomes the source, the original error and its context follow.
    pub fn into_error(self, txt: &str) -> ErrorChain {
        let pos = Located::of_span(self.span, txt);
        let PError { error, .. } = self;
        let mut chain = vec![error.source];
        chain.extend(error.chain);
        ErrorChain {
            source: Error::parse("", pos),
            chain,
        }
    }
}

/// Parse result.
pub type PRes<T> = Result<T, PError>;
