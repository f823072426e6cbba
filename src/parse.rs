//! Frontend parser (app modules) and backend parser (SMT-LIB model values).

crate::prelude!();

use app::{Arg, BinOp, CmpOp, Device, DeviceKind, Expr, ExprKind, Fun, Module, Param, RecordKind, Stmt};
use crate::err::Located;
use expr::Cst;

pub mod kw;

#[cfg(test)]
mod test;

/// A span in the input text.
#[readonly::make]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Span's start (inclusive).
    pub start: usize,
    /// Span's end (exclusive).
    pub end: usize,
}
impl Span {
    /// Constructor.
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Span { start, end }
    }
    /// Merges two spans, `self`'s start and `other`'s end.
    ///
    /// - illegal if `self.start > other.end`.
    pub fn merge(self, other: Self) -> Self {
        (self.start, other.end).into()
    }

    /// Extracts the relevant line of the input, and the previous/next line if any.
    pub fn pretty_of(self, text: &str) -> (Option<String>, usize, usize, String, Option<String>) {
        if text.is_empty() {
            return (None, 0, 0, "<EOI>".into(), None);
        }
        let mut lines = text.lines().enumerate();

        let mut count = self.start;
        let mut prev_line = None;

        while let Some((row, line)) = lines.next() {
            if line.len() >= count {
                let (line, next) = {
                    match lines.next().map(|(_, s)| s.to_string()) {
                        Some(next) if next.is_empty() => (line.into(), None),
                        Some(next) => (line.into(), Some(next)),
                        None if text.ends_with('\n') => (line.into(), None),
                        None => (format!("{}<EOI>", line), None),
                    }
                };
                return (prev_line.map(String::from), row, count, line, next);
            }

            count -= line.len() + 1;
            prev_line = Some(line);
        }

        let row = text.lines().count();
        (prev_line.map(String::from), row, 0, "<EOI>".into(), None)
    }
}
impl From<(usize, usize)> for Span {
    fn from((start, end): (usize, usize)) -> Self {
        Self::new(start, end)
    }
}

/// Wraps something with a span.
#[derive(Debug, Clone, Copy)]
pub struct Spn<T> {
    /// Value wrapped.
    pub inner: T,
    /// Span.
    pub span: Span,
}
impl<T: PartialEq> PartialEq for Spn<T> {
    fn eq(&self, that: &Self) -> bool {
        self.inner == that.inner
    }
}
impl<T: Eq> Eq for Spn<T> {}
impl<T> Spn<T> {
    /// Constructor.
    pub fn new(inner: T, span: impl Into<Span>) -> Self {
        let span = span.into();
        Self { inner, span }
    }

    /// Applies an operation to the inner value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spn<U> {
        Spn {
            inner: f(self.inner),
            span: self.span,
        }
    }
}
impl<T> Deref for Spn<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.inner
    }
}

/// Yields `true` if `ident` is a keyword.
pub fn is_kw(ident: impl AsRef<str>) -> bool {
    kw::all.contains(ident.as_ref())
}

/// Builds a binary expression, merging the spans of its operands.
fn bin(op: BinOp, lft: Expr, rgt: Expr) -> Expr {
    let span = lft.span.merge(rgt.span);
    Expr::new(ExprKind::Bin(op, Box::new(lft), Box::new(rgt)), span)
}

/// Raw device declaration: name, kind and group address.
type RawDevice<'a> = (Spn<&'a str>, Spn<&'a str>, Spn<&'a str>);

peg::parser! {
    /// PEG parsing rules for app modules.
    pub grammar rules() for str {
        /// Whitespace.
        rule whitespace() = quiet! {
            [ ' ' | '\n' | '\t' | '\r' ]
        }

        /// Comment, rust-style.
        ///
        /// ```rust
        /// # use svshi_verif::parse::rules::comment;
        /// assert_eq!(comment("// some comment\n"), Ok(()));
        /// assert_eq!(comment("/// doc comments are comments too"), Ok(()));
        /// ```
        pub rule comment() = quiet! {
            "//" [^ '\n' ]* ("\n" / ![_])
        }
        / expected!("comment")

        /// Whitespace or comment.
        rule _() = quiet! { ( whitespace() / comment() )* }
        /// Whitespace only, used inside expressions where `//` is integer division.
        rule __() = quiet! { whitespace()* }

        rule ident_char() = [ 'a'..='z' | 'A'..='Z' | '_' | '0'..='9' ]

        /// Ident parsing.
        ///
        /// # Examples
        ///
        /// ```rust
        /// # use svshi_verif::parse::rules::ident;
        /// assert_eq!(*ident("GA_0_0_1").unwrap(), "GA_0_0_1");
        /// assert_eq!(*ident("app_one_app_state").unwrap(), "app_one_app_state");
        ///
        /// assert_eq!(
        ///     ident("0_illegal").unwrap_err().to_string(),
        ///     "error at 1:1: expected identifier",
        /// );
        /// assert!(ident("return").is_err());
        /// ```
        pub rule ident() -> Spn<&'input str>
        = quiet! {
            s:position!()
            ident:$(
                [ 'a'..='z' | 'A'..='Z' | '_' ] ident_char()*
            )
            e:position!() {?
                if is_kw(ident) {
                    Err("unexpected keyword")
                } else {
                    Ok(Spn::new(ident, (s, e)))
                }
            }
        }
        / expected!("identifier")

        /// Parses boolean constants.
        ///
        /// ```rust
        /// # use svshi_verif::parse::rules::bool;
        /// assert!(*bool("True").unwrap());
        /// assert!(*bool("true").unwrap());
        /// assert!(!*bool("False").unwrap());
        /// ```
        pub rule bool() -> Spn<bool>
        = s:position!() ("True" / "true") !ident_char() e:position!() { Spn::new(true, (s, e)) }
        / s:position!() ("False" / "false") !ident_char() e:position!() { Spn::new(false, (s, e)) }

        /// Parses an unsigned [`Int`], cannot be followed by a `.`.
        ///
        /// ```rust
        /// # use svshi_verif::{parse::rules::uint, prelude::Int};
        /// assert_eq!(*uint("72054324").unwrap(), Int::from(72054324));
        /// assert!(uint("7.").is_err());
        /// ```
        pub rule uint() -> Spn<Int>
        = quiet! {
            s:position!() digits:$("0" / ['1'..='9']['0'..='9']*) e:position!() !['.' | '0'..='9'] {?
                Int::parse_bytes(digits.as_bytes(), 10)
                    .map(|int| Spn::new(int, (s, e)))
                    .ok_or("illegal unsigned integer")
            }
        }
        / expected!("integer")

        /// Parses a decimal number.
        ///
        /// ```rust
        /// # use svshi_verif::{parse::rules::decimal, prelude::{Int, Rat}};
        /// assert_eq!(*decimal("12.0").unwrap(), Rat::from_integer(12.into()));
        /// assert_eq!(*decimal("0.25").unwrap(), Rat::new(1.into(), 4.into()));
        /// ```
        pub rule decimal() -> Spn<Rat>
        = quiet! {
            s:position!()
            n:$(['0'..='9']+)
            "."
            d:$(['0'..='9']*)
            e:position!() {?
                rat_of_digits(n, d)
                    .map(|rat| Spn::new(rat, (s, e)))
                    .ok_or("illegal decimal")
            }
        }
        / expected!("decimal number")

        /// Parses constants.
        pub rule cst() -> Spn<Cst>
        = quiet! {
            rat:decimal() { rat.map(Cst::R) }
            / int:uint() { int.map(Cst::I) }
            / b:bool() { b.map(Cst::B) }
        }
        / expected!("int/float/bool constant")

        /// Parses a type: `bool`, `int` or `float`.
        pub rule typ() -> Typ
        = quiet! {
            "bool" !ident_char() { Typ::Bool }
            / "int" !ident_char() { Typ::Int }
            / "float" !ident_char() { Typ::Real }
        }
        / expected!("a type (`bool`, `int` or `float`)")

        /// Call argument, positional or named.
        rule arg() -> Arg
        = name:ident() _ "=" !"=" _ value:expr() {
            Arg { name: Some(name.inner.into()), value }
        }
        / value:expr() {
            Arg { name: None, value }
        }

        /// Comma-separated arguments between parens.
        rule args() -> Vec<Arg>
        = "(" _ args:(arg() ** (_ "," _)) _ ","? _ ")" { args }

        /// Atomic expressions.
        rule atom() -> Expr
        = s:position!() "(" _ e:expr() _ ")" end:position!() {
            Expr::new(e.kind, (s, end))
        }
        / s:position!() "None" !ident_char() e:position!() {
            Expr::new(ExprKind::None, (s, e))
        }
        / cst:cst() {
            Expr::new(ExprKind::Cst(cst.inner), cst.span)
        }
        / s:position!() recv:ident() "." method:ident() __ args:args() e:position!() {
            Expr::new(
                ExprKind::Method { recv: recv.inner.into(), method: method.inner.into(), args },
                (s, e),
            )
        }
        / s:position!() base:ident() "." field:ident() e:position!() {
            Expr::new(ExprKind::Field { base: base.inner.into(), field: field.inner.into() }, (s, e))
        }
        / s:position!() fun:ident() __ args:args() e:position!() {
            Expr::new(ExprKind::Call { fun: fun.inner.into(), args }, (s, e))
        }
        / id:ident() {
            Expr::new(ExprKind::Ident(id.inner.into()), id.span)
        }

        /// Arithmetic expressions.
        rule arith() -> Expr
        = precedence! {
            lft:(@) __ "+" __ rgt:@ { bin(BinOp::Add, lft, rgt) }
            lft:(@) __ "-" __ rgt:@ { bin(BinOp::Sub, lft, rgt) }
            --
            lft:(@) __ "*" __ rgt:@ { bin(BinOp::Mul, lft, rgt) }
            lft:(@) __ "//" __ rgt:@ { bin(BinOp::IDiv, lft, rgt) }
            lft:(@) __ "/" __ rgt:@ { bin(BinOp::Div, lft, rgt) }
            lft:(@) __ "%" __ rgt:@ { bin(BinOp::Mod, lft, rgt) }
            --
            e:unary() { e }
        }

        /// Unary minus, binds tighter than any binary operator.
        rule unary() -> Expr
        = s:position!() "-" __ arg:unary() {
            let span = Span::new(s, arg.span.end);
            Expr::new(ExprKind::Neg(Box::new(arg)), span)
        }
        / atom()

        rule cmp_op() -> CmpOp
        = "==" { CmpOp::Eq }
        / "!=" { CmpOp::Ne }
        / "<=" { CmpOp::Le }
        / ">=" { CmpOp::Ge }
        / "<" { CmpOp::Lt }
        / ">" { CmpOp::Gt }

        /// Comparison chains, `21 <= h <= 23` is `21 <= h and h <= 23`.
        rule cmp() -> Expr
        = first:arith() rest:(__ op:cmp_op() _ e:arith() { (op, e) })* {
            match rest.last() {
                None => first,
                Some((_, last)) => {
                    let span = first.span.merge(last.span);
                    Expr::new(ExprKind::Cmp(Box::new(first), rest), span)
                }
            }
        }

        /// Parses expressions.
        ///
        /// # Examples
        ///
        /// ```rust
        /// # use svshi_verif::parse::rules::expr;
        /// use svshi_verif::app::ExprKind;
        /// let e = expr("10 <= svshi_api.get_hour_of_the_day(internal_state) and not sensor.is_on()").unwrap();
        /// assert!(matches!(e.kind, ExprKind::And(_, _)));
        /// let e = expr("21 <= h <= 23").unwrap();
        /// match e.kind {
        ///     ExprKind::Cmp(_, rest) => assert_eq!(rest.len(), 2),
        ///     _ => panic!("expected a comparison chain"),
        /// }
        /// ```
        pub rule expr() -> Expr
        = precedence! {
            lft:(@) _ ("or" !ident_char() / "||") _ rgt:@ {
                let span = lft.span.merge(rgt.span);
                Expr::new(ExprKind::Or(Box::new(lft), Box::new(rgt)), span)
            }
            --
            lft:(@) _ ("and" !ident_char() / "&&") _ rgt:@ {
                let span = lft.span.merge(rgt.span);
                Expr::new(ExprKind::And(Box::new(lft), Box::new(rgt)), span)
            }
            --
            e:negation() { e }
        }

        /// Negation, binds looser than comparisons.
        rule negation() -> Expr
        = s:position!() ("not" !ident_char() / "!" !"=") _ arg:negation() {
            let span = Span::new(s, arg.span.end);
            Expr::new(ExprKind::Not(Box::new(arg)), span)
        }
        / cmp()

        /// A block of statements.
        pub rule block() -> Vec<Stmt>
        = "{" _ stmts:(stmt() ** _) _ "}" { stmts }

        /// A statement.
        pub rule stmt() -> Stmt
        = "let" !ident_char() _ name:ident() _ "=" _ e:expr() _ ";" {
            Stmt::Let(name.inner.into(), e)
        }
        / "return" !ident_char() _ e:expr()? _ ";" {
            Stmt::Return(e)
        }
        / "pass" !ident_char() _ ";" {
            Stmt::Pass
        }
        / "if" !ident_char() _ cnd:expr() _ thn:block()
          elifs:(
              _ "else" !ident_char() _ "if" !ident_char() _ cnd:expr() _ blk:block() { (cnd, blk) }
          )*
          els:(_ "else" !ident_char() _ blk:block() { blk })? {
            let mut branches = vec![(cnd, thn)];
            branches.extend(elifs);
            Stmt::If { branches, els }
        }
        / rec:ident() "." field:ident() _ "=" !"=" _ value:expr() _ ";" {
            Stmt::FieldAssign { rec: rec.inner.into(), field: field.inner.into(), value }
        }
        / name:ident() _ "=" !"=" _ e:expr() _ ";" {
            Stmt::Assign(name.inner.into(), e)
        }
        / e:expr() _ ";" {
            Stmt::Expr(e)
        }

        /// A `name: type` declaration.
        rule decl() -> (Spn<&'input str>, Typ)
        = id:ident() _ ":" _ typ:typ() { (id, typ) }

        /// Declaration of the group addresses of the bus.
        ///
        /// ```rust
        /// # use svshi_verif::parse::rules::physical_state;
        /// let decls = physical_state("physical_state { GA_0_0_1: bool, GA_0_0_4: float, }").unwrap();
        /// assert_eq!(decls.len(), 2);
        /// ```
        pub rule physical_state() -> Vec<(Spn<&'input str>, Typ)>
        = "physical_state" _ "{" _ decls:(decl() ** (_ "," _)) _ ","? _ "}" { decls }

        rule device() -> RawDevice<'input>
        = name:ident() _ ":" _ kind:ident() _ "(" _ ga:ident() _ ")" { (name, kind, ga) }

        /// Device declarations.
        pub rule devices() -> Vec<RawDevice<'input>>
        = "devices" _ "{" _ devices:(device() ** (_ "," _)) _ ","? _ "}" { devices }

        /// Isolated functions and the type of their last value.
        pub rule isolated_fns() -> Vec<(Spn<&'input str>, Typ)>
        = "isolated_fns" _ "{" _ decls:(decl() ** (_ "," _)) _ ","? _ "}" { decls }

        rule param() -> PRes<Param>
        = name:ident() _ ":" _ typ:ident() {
            match RecordKind::of_type_name(typ.inner) {
                Some(kind) => Ok(Param { name: name.inner.into(), kind }),
                None => Err(PError::new(
                    format!(
                        "unknown record type `{}`, expected `AppState`, `PhysicalState` or `InternalState`",
                        typ.inner,
                    ),
                    typ.span,
                )),
            }
        }

        /// A function.
        pub rule fun() -> PRes<Fun>
        = "fn" !ident_char() _ name:ident() _
          "(" _ params:(param() ** (_ "," _)) _ ","? _ ")" _
          ret:("->" _ typ:typ() { typ })? _
          body:block() {
            build_fun(name, params, ret, body)
        }

        /// An app module.
        pub rule module() -> PRes<Module>
        = _ physical:physical_state()?
          _ devices:devices()?
          _ isolated:isolated_fns()?
          _ funs:(fun() ** _) _ ![_] {
            build_module(
                physical.unwrap_or_default(),
                devices.unwrap_or_default(),
                isolated.unwrap_or_default(),
                funs,
            )
        }
    }
}

/// Rational of the integer and decimal digits of a decimal number.
fn rat_of_digits(int: &str, dec: &str) -> Option<Rat> {
    let mut numer = Int::parse_bytes(int.as_bytes(), 10)?;
    let mut denom = Int::one();
    if !dec.is_empty() {
        let digits = Int::parse_bytes(dec.as_bytes(), 10)?;
        for _ in 0..dec.len() {
            numer *= 10;
            denom *= 10;
        }
        numer += digits;
    }
    Some(Rat::new(numer, denom))
}

fn build_fun(
    name: Spn<&str>,
    params: Vec<PRes<Param>>,
    ret: Option<Typ>,
    body: Vec<Stmt>,
) -> PRes<Fun> {
    let params = params.into_iter().collect::<PRes<Vec<_>>>()?;
    Ok(Fun {
        name: name.inner.into(),
        params,
        ret,
        body,
    })
}

fn build_module(
    physical: Vec<(Spn<&str>, Typ)>,
    devices: Vec<RawDevice>,
    isolated: Vec<(Spn<&str>, Typ)>,
    funs: Vec<PRes<Fun>>,
) -> PRes<Module> {
    let physical: Vec<_> = physical
        .into_iter()
        .map(|(ga, typ)| (ga.inner.to_string(), typ))
        .collect();
    let mut device_map = Map::new();
    for (name, kind, ga) in devices {
        let kind = DeviceKind::of_name(kind.inner).ok_or_else(|| {
            PError::new(format!("unknown device kind `{}`", kind.inner), kind.span)
        })?;
        if !physical.iter().any(|(decl, _)| decl == ga.inner) {
            return Err(PError::new(
                format!("undeclared group address `{}`", ga.inner),
                ga.span,
            ));
        }
        let device = Device {
            name: name.inner.into(),
            kind,
            ga: ga.inner.into(),
        };
        if device_map.insert(name.inner.to_string(), device).is_some() {
            return Err(PError::new(
                format!("device `{}` is declared twice", name.inner),
                name.span,
            ));
        }
    }
    let isolated = isolated
        .into_iter()
        .map(|(name, typ)| (name.inner.to_string(), typ))
        .collect();
    let funs = funs.into_iter().collect::<PRes<Vec<_>>>()?;
    Ok(Module {
        src: String::new(),
        physical,
        devices: device_map,
        isolated,
        funs,
    })
}

/// Parses an app module.
///
/// Comments are one-line rust-style: `// ..\n`. A module is composed of
///
/// - an optional `physical_state { GA_a_b_c: type, ... }` block declaring the bus;
/// - an optional `devices { name: kind(GA_a_b_c), ... }` block;
/// - an optional `isolated_fns { name: type, ... }` block;
/// - functions `fn name(record: RecordType, ...) [-> bool] { ... }`.
pub fn module(txt: &str) -> Res<Module> {
    let res: Res<Module> = match rules::module(txt) {
        Ok(res) => res.map_err(|e| e.into_error(txt)),
        Err(e) => {
            let span = Span::new(e.location.offset, e.location.offset);
            let err = Error::parse("", Located::of_span(span, txt));
            Err(err.chain_err(|| format!("expected {}", e.expected)))
        }
    };
    let mut module = res.chain_err(|| "while parsing app module")?;
    module.check_devices()?;
    module.src = txt.into();
    Ok(module)
}

/// Parses SMT-LIB values, as produced by the solver in its models.
pub struct Parser<'txt> {
    /// Text to parse.
    txt: &'txt str,
    /// Position in the text.
    cursor: usize,
}
impl<'txt> Parser<'txt> {
    /// Constructor.
    pub fn new(txt: &'txt str) -> Self {
        Self { txt, cursor: 0 }
    }

    /// Backtracks to a position.
    fn backtrack(&mut self, pos: usize) {
        self.cursor = pos
    }

    /// Fails at the current position.
    pub fn fail(&self, msg: impl Into<String>) -> Error {
        let span = Span::new(self.cursor, self.cursor);
        Error::parse(msg, Located::of_span(span, self.txt))
    }

    /// Yields the part of the text that's not been parsed yet.
    pub fn rest(&self) -> &'txt str {
        &self.txt[self.cursor..]
    }

    /// Parses whitespaces.
    pub fn ws(&mut self) {
        let rest = self.rest();
        self.cursor += rest.len() - rest.trim_start().len();
    }

    /// Tries to parse a tag.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use svshi_verif::parse::*;
    /// let mut parser = Parser::new("(- 7)");
    /// assert!(parser.try_tag("("));
    /// assert!(!parser.try_tag("7"));
    /// assert_eq!(parser.rest(), "- 7)");
    /// ```
    pub fn try_tag(&mut self, tag: &str) -> bool {
        if self.rest().starts_with(tag) {
            self.cursor += tag.len();
            true
        } else {
            false
        }
    }
    /// Parses a tag or fails.
    pub fn tag(&mut self, tag: &str) -> Res<()> {
        if self.try_tag(tag) {
            Ok(())
        } else {
            bail!(self.fail(format!("expected token `{}`", tag)))
        }
    }

    /// Tries to parse a boolean.
    pub fn try_bool(&mut self) -> Option<bool> {
        if self.try_tag("true") {
            Some(true)
        } else if self.try_tag("false") {
            Some(false)
        } else {
            None
        }
    }

    /// Tries to parse a number: an integer, or a decimal real if a `.` follows the digits.
    pub fn try_number(&mut self) -> Option<Cst> {
        let rest = self.rest();
        let int_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if int_len == 0 {
            return None;
        }
        let int = Int::parse_bytes(rest[..int_len].as_bytes(), 10)?;
        self.cursor += int_len;
        if !self.try_tag(".") {
            return Some(Cst::I(int));
        }
        let rest = self.rest();
        let dec_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let mut numer = int;
        let mut denom = Int::one();
        if dec_len > 0 {
            let dec = Int::parse_bytes(rest[..dec_len].as_bytes(), 10)?;
            for _ in 0..dec_len {
                numer *= 10;
                denom *= 10;
            }
            numer += dec;
            self.cursor += dec_len;
        }
        Some(Cst::R(Rat::new(numer, denom)))
    }

    /// Tries to parse a constant.
    ///
    /// Handles negations `(- v)` and divisions `(/ n d)`; divisions always produce reals.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use svshi_verif::{parse::*, expr::Cst, prelude::*};
    /// let txt = "7405 (- (/ 7.0 2.0)) 12.0 false (- 3)";
    /// let mut parser = Parser::new(txt);
    /// assert_eq!(parser.try_cst().unwrap().unwrap().to_string(), "7405");
    /// parser.ws();
    /// assert_eq!(parser.try_cst().unwrap().unwrap().to_string(), "-7/2");
    /// parser.ws();
    /// assert_eq!(parser.try_cst().unwrap().unwrap(), Cst::real(Rat::from_integer(12.into())));
    /// parser.ws();
    /// assert_eq!(parser.try_cst().unwrap().unwrap(), Cst::B(false));
    /// parser.ws();
    /// assert_eq!(parser.try_cst().unwrap().unwrap(), Cst::int(-3));
    /// ```
    pub fn try_cst(&mut self) -> Res<Option<Cst>> {
        self.ws();
        if let Some(b) = self.try_bool() {
            return Ok(Some(Cst::B(b)));
        }
        if let Some(num) = self.try_number() {
            return Ok(Some(num));
        }
        let start = self.cursor;
        if !self.try_tag("(") {
            return Ok(None);
        }
        self.ws();
        let res = if self.try_tag("-") {
            match self.try_cst()? {
                Some(Cst::I(i)) => Cst::I(-i),
                Some(Cst::R(r)) => Cst::R(-r),
                Some(Cst::B(_)) | None => bail!(self.fail("expected arithmetic value")),
            }
        } else if self.try_tag("/") {
            let num = self.try_cst()?.map(|cst| cst.to_real());
            let den = self.try_cst()?.map(|cst| cst.to_real());
            match (num, den) {
                (Some(Cst::R(num)), Some(Cst::R(den))) if !den.is_zero() => Cst::R(num / den),
                _ => bail!(self.fail("illegal division")),
            }
        } else {
            self.backtrack(start);
            return Ok(None);
        };
        self.ws();
        self.tag(")")?;
        Ok(Some(res))
    }
}
