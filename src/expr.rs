//! Solver expressions: typed terms, quantifiers, SMT-LIB printing and source-level rendering.
//!
//! Expressions are printed two ways:
//!
//! - [`Expr2Smt`] produces SMT-LIB 2, where symbolic variables use their canonical
//!   `<name>_<hex-uid>` symbol;
//! - [`fmt::Display`] produces a readable, z3py-like rendering (`And(a, b)`, `x >= 10`,
//!   `ForAll([t], ...)`) where variables appear under their source-level name.

crate::prelude!();

use rsmt2::print::{Expr2Smt, Sort2Smt, Sym2Smt};


pub use crate::{build_expr as build, build_typ};

/// A type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Typ {
    /// Bool type.
    Bool,
    /// Integer type.
    Int,
    /// Real type, used for `float` values.
    Real,
}
impl Typ {
    /// True if the type is an arithmetic one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use svshi_verif::expr::Typ;
    /// assert!(Typ::Int.is_arith());
    /// assert!(Typ::Real.is_arith());
    /// assert!(!Typ::Bool.is_arith());
    /// ```
    pub fn is_arith(self) -> bool {
        match self {
            Self::Bool => false,
            Self::Int | Self::Real => true,
        }
    }

    /// Zero value of an arithmetic type, `false` for `bool`.
    pub fn zero(self) -> Cst {
        match self {
            Self::Bool => Cst::B(false),
            Self::Int => Cst::I(Int::zero()),
            Self::Real => Cst::R(Rat::zero()),
        }
    }
}
impl Sort2Smt for Typ {
    fn sort_to_smt2<W: Write>(&self, w: &mut W) -> SmtRes<()> {
        write!(
            w,
            "{}",
            match self {
                Self::Bool => "Bool",
                Self::Int => "Int",
                Self::Real => "Real",
            }
        )?;
        Ok(())
    }
}

/// Trait implemented by everything that has a type.
pub trait HasTyp {
    /// Type accessor.
    fn typ(&self) -> Typ;
}

/// Constants.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Cst {
    /// Bool constant.
    B(bool),
    /// Integer constant.
    I(Int),
    /// Real constant.
    R(Rat),
}
impl HasTyp for Cst {
    fn typ(&self) -> Typ {
        match self {
            Self::B(_) => Typ::Bool,
            Self::I(_) => Typ::Int,
            Self::R(_) => Typ::Real,
        }
    }
}
impl Cst {
    /// Creates an integer constant.
    pub fn int<I: Into<Int>>(i: I) -> Self {
        Cst::I(i.into())
    }
    /// Creates a real constant.
    pub fn real<R: Into<Rat>>(r: R) -> Self {
        Cst::R(r.into())
    }

    /// Python-style truthiness: `false`, `0` and `0.0` are falsy.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use svshi_verif::expr::Cst;
    /// assert!(Cst::B(true).truthy());
    /// assert!(!Cst::int(0).truthy());
    /// assert!(Cst::int(-7).truthy());
    /// ```
    pub fn truthy(&self) -> bool {
        match self {
            Self::B(b) => *b,
            Self::I(i) => !i.is_zero(),
            Self::R(r) => !r.is_zero(),
        }
    }

    /// Promotes an integer constant to a real one, identity otherwise.
    pub fn to_real(&self) -> Self {
        match self {
            Self::I(i) => Self::R(Rat::from_integer(i.clone())),
            cst => cst.clone(),
        }
    }
}
impl Expr2Smt<()> for Cst {
    fn expr_to_smt2<W: Write>(&self, w: &mut W, _: ()) -> SmtRes<()> {
        match self {
            Self::B(b) => write!(w, "{}", b)?,
            Self::I(i) => {
                if i.sign() == Sign::Minus {
                    write!(w, "(- {})", -i)?
                } else {
                    write!(w, "{}", i)?
                }
            }
            Self::R(r) => {
                let (num, den) = (r.numer(), r.denom());
                if num.sign() == Sign::Minus {
                    write!(w, "(- (/ {}.0 {}.0))", -num, den)?
                } else {
                    write!(w, "(/ {}.0 {}.0)", num, den)?
                }
            }
        }
        Ok(())
    }
}

/// Operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Op {
    /// If-then-else.
    Ite,
    /// Implication.
    Implies,
    /// Addition.
    Add,
    /// Subtraction, or unary minus.
    Sub,
    /// Multiplication.
    Mul,
    /// Real division.
    Div,
    /// Integer division (`//`).
    IDiv,
    /// Modulo.
    Mod,
    /// Greater or equal.
    Ge,
    /// Less or equal.
    Le,
    /// Greater than.
    Gt,
    /// Less than.
    Lt,
    /// Equality.
    Eq,
    /// Negation.
    Not,
    /// Conjunction.
    And,
    /// Disjunction.
    Or,
    /// Int-to-real conversion.
    ToReal,
    /// Real-to-int conversion (floor).
    ToInt,
}
impl Op {
    /// Infix representation, if the operator is rendered infix.
    pub fn infix_str(self) -> Option<&'static str> {
        let s = match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div | Self::IDiv => "/",
            Self::Mod => "%",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Eq => "==",
            Self::Ite
            | Self::Implies
            | Self::Not
            | Self::And
            | Self::Or
            | Self::ToReal
            | Self::ToInt => return None,
        };
        Some(s)
    }

    /// SMT-LIB representation.
    pub fn smt_str(self) -> &'static str {
        match self {
            Self::Ite => "ite",
            Self::Implies => "=>",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::IDiv => "div",
            Self::Mod => "mod",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Eq => "=",
            Self::Not => "not",
            Self::And => "and",
            Self::Or => "or",
            Self::ToReal => "to_real",
            Self::ToInt => "to_int",
        }
    }

    /// True if `self` is an arithmetic relation.
    pub fn is_arith_relation(self) -> bool {
        matches!(self, Self::Ge | Self::Le | Self::Gt | Self::Lt)
    }

    /// True if the arguments of `self` are subject to int-to-real promotion.
    fn promotes(self) -> bool {
        matches!(
            self,
            Self::Add
                | Self::Sub
                | Self::Mul
                | Self::Div
                | Self::Ge
                | Self::Le
                | Self::Gt
                | Self::Lt
                | Self::Eq
        )
    }

    /// Minimal arity of `self`.
    pub fn min_arity(self) -> usize {
        match self {
            Self::Not | Self::Sub | Self::ToReal | Self::ToInt => 1,
            Self::And | Self::Or => 0,
            Self::Add
            | Self::Mod
            | Self::Mul
            | Self::Div
            | Self::IDiv
            | Self::Implies
            | Self::Eq
            | Self::Le
            | Self::Lt
            | Self::Ge
            | Self::Gt => 2,
            Self::Ite => 3,
        }
    }

    /// Maximal arity for `self`, `None` if infinite.
    pub fn max_arity(self) -> Option<usize> {
        match self {
            Self::Not | Self::ToReal | Self::ToInt => Some(1),
            Self::Add | Self::Sub | Self::Mul | Self::And | Self::Or => None,
            Self::Mod
            | Self::Div
            | Self::IDiv
            | Self::Implies
            | Self::Eq
            | Self::Le
            | Self::Lt
            | Self::Ge
            | Self::Gt => Some(2),
            Self::Ite => Some(3),
        }
    }

    /// Type-checks an operator application.
    pub fn type_check(self, args: &[Expr]) -> Res<Typ> {
        if args.len() < self.min_arity() {
            bail!(
                "`{}` expects at least {} argument(s)",
                self,
                self.min_arity(),
            )
        }
        if let Some(max) = self.max_arity() {
            if args.len() > max {
                bail!("`{}` expects at most {} argument(s)", self, max)
            }
        }

        let typ = match self {
            Self::Ite => {
                let typ = args[0].typ();
                if typ != Typ::Bool {
                    bail!("expected first argument of type `bool`, got `{}`", typ)
                }

                let thn_typ = args[1].typ();
                let els_typ = args[2].typ();

                if thn_typ != els_typ {
                    bail!(
                        "`{}`'s second and third arguments should have the same type, got `{}` and `{}`",
                        self, thn_typ, els_typ,
                    )
                }

                thn_typ
            }
            Self::Implies | Self::And | Self::Or | Self::Not => {
                if args.iter().any(|e| e.typ() != Typ::Bool) {
                    bail!("`{}`'s arguments must all be boolean expressions", self)
                }
                Typ::Bool
            }

            Self::ToReal | Self::ToInt => {
                let typ = args[0].typ();
                if !typ.is_arith() {
                    bail!("`{}` expects an arithmetic argument, got `{}`", self, typ)
                }
                if self == Self::ToReal {
                    Typ::Real
                } else {
                    Typ::Int
                }
            }

            Self::Add
            | Self::Sub
            | Self::Mul
            | Self::Div
            | Self::IDiv
            | Self::Mod
            | Self::Le
            | Self::Ge
            | Self::Lt
            | Self::Gt => {
                let first = args[0].typ();
                if !first.is_arith() {
                    bail!(
                        "`{}`'s arguments must have an arithmetic type, unexpected type `{}`",
                        self,
                        first,
                    )
                }
                for typ in args.iter().map(Expr::typ) {
                    if typ != first {
                        bail!(
                            "`{}`'s arguments must all have the same type, found `{}` and `{}`",
                            self,
                            first,
                            typ,
                        )
                    }
                }
                if (self == Self::IDiv || self == Self::Mod) && first != Typ::Int {
                    bail!(
                        "`{}` can only be applied to integer arguments, found `{}`",
                        self,
                        first,
                    )
                }

                if self == Self::Div {
                    Typ::Real
                } else if self.is_arith_relation() {
                    Typ::Bool
                } else {
                    first
                }
            }

            Self::Eq => {
                let first = args[0].typ();
                for typ in args.iter().map(Expr::typ) {
                    if typ != first {
                        bail!(
                            "`{}`'s arguments must all have the same type, found `{}` and `{}`",
                            self,
                            first,
                            typ,
                        )
                    }
                }
                Typ::Bool
            }
        };

        Ok(typ)
    }
}
impl Expr2Smt<()> for Op {
    fn expr_to_smt2<W: Write>(&self, w: &mut W, _: ()) -> SmtRes<()> {
        write!(w, "{}", self.smt_str())?;
        Ok(())
    }
}

/// A variable.
///
/// Symbolic variables carry a uid: their solver-level symbol is `<name>_<hex uid>` while their
/// source-level name is just `<name>`. Variables without a uid (bound variables introduced by the
/// temporal encoder for instance) use their name as symbol.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Var {
    /// Source-level name.
    name: String,
    /// Uid of a symbolic variable.
    uid: Option<usize>,
    /// Type of the variable.
    typ: Typ,
}
impl Var {
    /// Constructor for variables without uid.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use svshi_verif::expr::{Var, Typ};
    /// let var = Var::new("time_min", Typ::Int);
    /// assert_eq!(var.name(), "time_min");
    /// assert_eq!(var.symbol(), "time_min");
    /// ```
    pub fn new<S: Into<String>>(name: S, typ: Typ) -> Self {
        Self {
            name: name.into(),
            uid: None,
            typ,
        }
    }
    /// Constructor for symbolic variables.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use svshi_verif::expr::{Var, Typ};
    /// let var = Var::new_symbolic("GA_0_0_1", 26, Typ::Bool);
    /// assert_eq!(var.name(), "GA_0_0_1");
    /// assert_eq!(var.symbol(), "GA_0_0_1_1a");
    /// assert_eq!(var.to_string(), "GA_0_0_1");
    /// ```
    pub fn new_symbolic<S: Into<String>>(name: S, uid: usize, typ: Typ) -> Self {
        Self {
            name: name.into(),
            uid: Some(uid),
            typ,
        }
    }

    /// Source-level name.
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Uid accessor.
    pub fn uid(&self) -> Option<usize> {
        self.uid
    }
    /// Solver-level symbol.
    pub fn symbol(&self) -> String {
        match self.uid {
            Some(uid) => format!("{}_{:x}", self.name, uid),
            None => self.name.clone(),
        }
    }
}
impl HasTyp for Var {
    fn typ(&self) -> Typ {
        self.typ
    }
}
impl Sym2Smt<()> for Var {
    fn sym_to_smt2<W: Write>(&self, w: &mut W, _: ()) -> SmtRes<()> {
        write!(w, "{}", self.symbol())?;
        Ok(())
    }
}

/// Quantifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Quantifier {
    /// Universal quantification.
    Forall,
    /// Existential quantification.
    Exists,
}

/// The expression structure.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Expr {
    /// A constant.
    Cst(Cst),
    /// A variable.
    Var(Var),
    /// An operator application.
    App {
        /// The operator.
        op: Op,
        /// The arguments.
        args: Vec<Expr>,
    },
    /// A quantified expression.
    Quant {
        /// The quantifier.
        quant: Quantifier,
        /// Bound variables.
        vars: Vec<Var>,
        /// Body of the quantifier.
        body: Box<Expr>,
    },
}
impl Expr {
    /// Variable constructor.
    pub fn new_var(var: Var) -> Self {
        Self::Var(var)
    }

    /// Constant constructor.
    pub fn new_cst(cst: impl Into<Cst>) -> Self {
        Self::Cst(cst.into())
    }

    /// Operator application constructor.
    ///
    /// Promotes integer arguments to reals when an arithmetic operator mixes both, and
    /// type-checks the result.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use svshi_verif::expr::{Expr, Var, Typ, Op, HasTyp};
    /// let read = Expr::new_var(Var::new("GA_0_0_4", Typ::Real));
    /// let cmp = Expr::new_op(Op::Ge, vec![read, Expr::from(14)]).unwrap();
    /// assert_eq!(cmp.to_string(), "GA_0_0_4 >= 14");
    /// assert_eq!(cmp.typ(), Typ::Bool);
    /// ```
    pub fn new_op(op: Op, args: Vec<Self>) -> Res<Self> {
        let args = if op.promotes() || op == Op::Ite {
            Self::promote(op, args)
        } else {
            args
        };
        op.type_check(&args)?;
        Ok(Self::App { op, args })
    }

    /// Int-to-real promotion of the arguments of an operator application.
    fn promote(op: Op, args: Vec<Self>) -> Vec<Self> {
        let branches = if op == Op::Ite { 1 } else { 0 };
        let has_real = args.iter().skip(branches).any(|arg| arg.typ() == Typ::Real);
        let has_int = args.iter().skip(branches).any(|arg| arg.typ() == Typ::Int);
        if !(has_real && has_int) {
            return args;
        }
        args.into_iter()
            .enumerate()
            .map(|(idx, arg)| {
                if idx < branches || arg.typ() != Typ::Int {
                    arg
                } else {
                    arg.to_real()
                }
            })
            .collect()
    }

    /// Converts an integer expression to a real one, identity on other types.
    pub fn to_real(self) -> Self {
        match self {
            Self::Cst(cst) => Self::Cst(cst.to_real()),
            expr if expr.typ() == Typ::Int => Self::App {
                op: Op::ToReal,
                args: vec![expr],
            },
            expr => expr,
        }
    }

    /// Universal quantification, identity if `vars` is empty.
    pub fn forall(vars: Vec<Var>, body: Self) -> Self {
        Self::quant(Quantifier::Forall, vars, body)
    }
    /// Existential quantification, identity if `vars` is empty.
    pub fn exists(vars: Vec<Var>, body: Self) -> Self {
        Self::quant(Quantifier::Exists, vars, body)
    }
    fn quant(quant: Quantifier, vars: Vec<Var>, body: Self) -> Self {
        if vars.is_empty() {
            body
        } else {
            Self::Quant {
                quant,
                vars,
                body: Box::new(body),
            }
        }
    }

    /// Conjunction, kept n-ary even for zero or one argument.
    pub fn and(args: Vec<Self>) -> Self {
        Self::App { op: Op::And, args }
    }
    /// Disjunction, kept n-ary even for zero or one argument.
    pub fn or(args: Vec<Self>) -> Self {
        Self::App { op: Op::Or, args }
    }
    /// Conjunction of a list: `True` if empty, the element itself if only one.
    pub fn conj(mut args: Vec<Self>) -> Self {
        match args.len() {
            0 => true.into(),
            1 => args.pop().unwrap_or_else(|| true.into()),
            _ => Self::and(args),
        }
    }
    /// Negation.
    pub fn not(self) -> Self {
        Self::App {
            op: Op::Not,
            args: vec![self],
        }
    }
    /// Implication.
    pub fn implies(self, rgt: Self) -> Self {
        Self::App {
            op: Op::Implies,
            args: vec![self, rgt],
        }
    }

    /// Python-style truthiness of an expression, as a boolean expression.
    pub fn truthy(self) -> Self {
        match self.typ() {
            Typ::Bool => self,
            typ => Self::App {
                op: Op::Eq,
                args: vec![self, Self::Cst(typ.zero())],
            }
            .not(),
        }
    }

    /// True if `self` is a constant.
    pub fn is_cst(&self) -> bool {
        matches!(self, Self::Cst(_))
    }
    /// True if `self` is a variable.
    pub fn is_var(&self) -> bool {
        matches!(self, Self::Var(_))
    }
    /// True if `self` is a quantifier.
    pub fn is_quantifier(&self) -> bool {
        matches!(self, Self::Quant { .. })
    }
    /// Boolean value of `self`, if it is a boolean constant.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Cst(Cst::B(b)) => Some(*b),
            _ => None,
        }
    }
    /// Variable `self` is, if any.
    pub fn as_var(&self) -> Option<&Var> {
        match self {
            Self::Var(var) => Some(var),
            _ => None,
        }
    }
    /// If `self` is `Not(e)`, yields `e`.
    pub fn as_negation(&self) -> Option<&Self> {
        match self {
            Self::App { op: Op::Not, args } if args.len() == 1 => Some(&args[0]),
            _ => None,
        }
    }

    /// Free variables, in order of first occurrence.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use svshi_verif::build_expr;
    /// let expr = build_expr!(
    ///     (and (>= (h: int) 10) (forall ((h: int) (m: int)) (>= (h: int) (m: int))) (b: bool))
    /// );
    /// let vars: Vec<_> = expr.free_vars().into_iter().map(|v| v.name().to_string()).collect();
    /// assert_eq!(vars, vec!["h", "b"]);
    /// ```
    pub fn free_vars(&self) -> Vec<Var> {
        let mut res = vec![];
        self.collect_free_vars(&mut vec![], &mut res);
        res
    }
    fn collect_free_vars<'a>(&'a self, bound: &mut Vec<&'a Var>, res: &mut Vec<Var>) {
        match self {
            Self::Cst(_) => (),
            Self::Var(var) => {
                if !bound.contains(&var) && !res.contains(var) {
                    res.push(var.clone())
                }
            }
            Self::App { args, .. } => {
                for arg in args {
                    arg.collect_free_vars(bound, res)
                }
            }
            Self::Quant { vars, body, .. } => {
                let len = bound.len();
                bound.extend(vars.iter());
                body.collect_free_vars(bound, res);
                bound.truncate(len);
            }
        }
    }

    /// Substitutes variables by expressions.
    ///
    /// Variables bound by a quantifier are not substituted in its body. Substituted expressions
    /// are not renamed: callers only substitute symbolic variables, which are never bound.
    pub fn subst(&self, map: &Map<Var, Expr>) -> Self {
        match self {
            Self::Cst(_) => self.clone(),
            Self::Var(var) => map.get(var).cloned().unwrap_or_else(|| self.clone()),
            Self::App { op, args } => Self::App {
                op: *op,
                args: args.iter().map(|arg| arg.subst(map)).collect(),
            },
            Self::Quant { quant, vars, body } => {
                if vars.iter().any(|var| map.contains_key(var)) {
                    let map: Map<Var, Expr> = map
                        .iter()
                        .filter(|(var, _)| !vars.contains(var))
                        .map(|(var, expr)| (var.clone(), expr.clone()))
                        .collect();
                    Self::quant(*quant, vars.clone(), body.subst(&map))
                } else {
                    Self::quant(*quant, vars.clone(), body.subst(map))
                }
            }
        }
    }

    /// Simplifies an expression.
    ///
    /// Folds constants, flattens conjunctions and disjunctions, and detects trivially false
    /// conjunctions (`e` and `Not(e)`). Does not reason about arithmetic beyond constants.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use svshi_verif::build_expr;
    /// let expr = build_expr!(
    ///     (or (and (= (ite true 1 (- 1)) 0)))
    /// );
    /// assert_eq!(expr.simplify().to_string(), "False");
    /// let expr = build_expr!(
    ///     (and (b: bool) (>= (h: int) 10) (not (b: bool)))
    /// );
    /// assert_eq!(expr.simplify().to_string(), "False");
    /// ```
    pub fn simplify(&self) -> Self {
        match self {
            Self::Cst(_) | Self::Var(_) => self.clone(),
            Self::App { op, args } => {
                let args = args.iter().map(Self::simplify).collect();
                Self::simplify_app(*op, args)
            }
            Self::Quant { quant, vars, body } => {
                let body = body.simplify();
                if body.is_cst() {
                    body
                } else {
                    Self::quant(*quant, vars.clone(), body)
                }
            }
        }
    }

    /// Simplifies the application of `op` to `args`, **non-recursively**.
    fn simplify_app(op: Op, args: Vec<Self>) -> Self {
        match op {
            Op::Not => match args[0].as_bool() {
                Some(b) => (!b).into(),
                None => match args[0].as_negation() {
                    Some(inner) => inner.clone(),
                    None => Self::App { op, args },
                },
            },
            Op::And | Op::Or => {
                let absorbing = op == Op::Or;
                let mut flat: Vec<Self> = Vec::with_capacity(args.len());
                for arg in args {
                    let sub = match arg {
                        Self::App {
                            op: sub_op,
                            args: sub_args,
                        } if sub_op == op => sub_args,
                        arg => vec![arg],
                    };
                    for arg in sub {
                        match arg.as_bool() {
                            Some(b) if b == absorbing => return absorbing.into(),
                            Some(_) => (),
                            None => {
                                if !flat.contains(&arg) {
                                    flat.push(arg)
                                }
                            }
                        }
                    }
                }
                let complementary = flat.iter().any(|arg| {
                    arg.as_negation()
                        .map(|inner| flat.contains(inner))
                        .unwrap_or(false)
                });
                if complementary {
                    return absorbing.into();
                }
                match flat.len() {
                    0 => (!absorbing).into(),
                    1 => flat.pop().unwrap_or_else(|| (!absorbing).into()),
                    _ => Self::App { op, args: flat },
                }
            }
            Op::Implies => match (args[0].as_bool(), args[1].as_bool()) {
                (Some(false), _) | (_, Some(true)) => true.into(),
                (Some(true), _) => args[1].clone(),
                (_, Some(false)) => Self::simplify_app(Op::Not, vec![args[0].clone()]),
                _ => Self::App { op, args },
            },
            Op::Ite => match args[0].as_bool() {
                Some(true) => args[1].clone(),
                Some(false) => args[2].clone(),
                None if args[1] == args[2] => args[1].clone(),
                None => Self::App { op, args },
            },
            Op::Eq if args[0] == args[1] => true.into(),
            _ => {
                let csts: Option<Vec<&Cst>> = args
                    .iter()
                    .map(|arg| match arg {
                        Self::Cst(cst) => Some(cst),
                        _ => None,
                    })
                    .collect();
                match csts.and_then(|csts| eval_cst_app(op, &csts)) {
                    Some(cst) => Self::Cst(cst),
                    None => Self::App { op, args },
                }
            }
        }
    }
}

/// Evaluates an operator over constants, `None` if not applicable (division by zero...).
fn eval_cst_app(op: Op, args: &[&Cst]) -> Option<Cst> {
    use std::cmp::Ordering;
    macro_rules! cmp {
        ($pred:expr) => {{
            let ord = match (args[0], args[1]) {
                (Cst::I(l), Cst::I(r)) => l.cmp(r),
                (Cst::R(l), Cst::R(r)) => l.cmp(r),
                (Cst::B(l), Cst::B(r)) => l.cmp(r),
                _ => return None,
            };
            let pred: fn(Ordering) -> bool = $pred;
            Some(Cst::B(pred(ord)))
        }};
    }
    match op {
        Op::Eq => cmp!(|ord| ord == Ordering::Equal),
        Op::Ge => cmp!(|ord| ord != Ordering::Less),
        Op::Le => cmp!(|ord| ord != Ordering::Greater),
        Op::Gt => cmp!(|ord| ord == Ordering::Greater),
        Op::Lt => cmp!(|ord| ord == Ordering::Less),
        Op::ToReal => Some(args[0].to_real()),
        Op::ToInt => match args[0] {
            Cst::R(r) => Some(Cst::I(r.floor().to_integer())),
            cst => Some(cst.clone()),
        },
        Op::Sub if args.len() == 1 => match args[0] {
            Cst::I(i) => Some(Cst::I(-i)),
            Cst::R(r) => Some(Cst::R(-r)),
            Cst::B(_) => None,
        },
        Op::Add | Op::Sub | Op::Mul => {
            let mut iter = args.iter();
            let mut acc = (*iter.next()?).clone();
            for arg in iter {
                acc = match (acc, arg) {
                    (Cst::I(l), Cst::I(r)) => Cst::I(match op {
                        Op::Add => l + r,
                        Op::Sub => l - r,
                        _ => l * r,
                    }),
                    (Cst::R(l), Cst::R(r)) => Cst::R(match op {
                        Op::Add => l + r,
                        Op::Sub => l - r,
                        _ => l * r,
                    }),
                    _ => return None,
                }
            }
            Some(acc)
        }
        Op::Div => match (args[0].to_real(), args[1].to_real()) {
            (Cst::R(l), Cst::R(r)) if !r.is_zero() => Some(Cst::R(l / r)),
            _ => None,
        },
        Op::IDiv | Op::Mod => match (args[0], args[1]) {
            (Cst::I(l), Cst::I(r)) if !r.is_zero() => {
                // SMT-LIB semantics: the remainder is always non-negative.
                let mut rem = l % r;
                if rem.is_negative() {
                    rem += r.abs()
                }
                if op == Op::Mod {
                    Some(Cst::I(rem))
                } else {
                    Some(Cst::I((l - rem) / r))
                }
            }
            _ => None,
        },
        Op::Ite | Op::Implies | Op::Not | Op::And | Op::Or => None,
    }
}

impl HasTyp for Expr {
    fn typ(&self) -> Typ {
        match self {
            Self::Var(var) => var.typ(),
            Self::Cst(cst) => cst.typ(),
            Self::Quant { .. } => Typ::Bool,
            Self::App { op, args } => match op.type_check(args) {
                Ok(typ) => typ,
                Err(e) => panic!("illegal operator application `{}`: {}", self, e),
            },
        }
    }
}
impl Expr2Smt<()> for Expr {
    fn expr_to_smt2<W: Write>(&self, w: &mut W, _: ()) -> SmtRes<()> {
        match self {
            Self::Cst(cst) => cst.expr_to_smt2(w, ()),
            Self::Var(var) => var.sym_to_smt2(w, ()),
            Self::App { op, args } if args.is_empty() => {
                write!(w, "{}", if *op == Op::Or { "false" } else { "true" })?;
                Ok(())
            }
            Self::App { op, args } => {
                write!(w, "(")?;
                op.expr_to_smt2(w, ())?;
                for arg in args {
                    write!(w, " ")?;
                    arg.expr_to_smt2(w, ())?
                }
                write!(w, ")")?;
                Ok(())
            }
            Self::Quant { quant, vars, body } => {
                write!(
                    w,
                    "({} (",
                    match quant {
                        Quantifier::Forall => "forall",
                        Quantifier::Exists => "exists",
                    }
                )?;
                for (idx, var) in vars.iter().enumerate() {
                    if idx > 0 {
                        write!(w, " ")?
                    }
                    write!(w, "(")?;
                    var.sym_to_smt2(w, ())?;
                    write!(w, " ")?;
                    var.typ().sort_to_smt2(w)?;
                    write!(w, ")")?;
                }
                write!(w, ") ")?;
                body.expr_to_smt2(w, ())?;
                write!(w, ")")?;
                Ok(())
            }
        }
    }
}

/// Represents the negation of a borrowed expression.
///
/// Used to assert the negation of an expression without cloning it.
///
/// # Examples
///
/// ```rust
/// # use svshi_verif::{build_expr, expr::NotExpr};
/// use svshi_verif::rsmt2::print::Expr2Smt;
/// let expr = build_expr!(
///     (and (>= (v_1: int) 0) (v_2: bool))
/// );
/// let not_expr = NotExpr::from(&expr);
///
/// let mut buff = vec![];
/// not_expr.expr_to_smt2(&mut buff, ()).unwrap();
/// let s = String::from_utf8_lossy(&buff);
/// assert_eq!(&s, "(not (and (>= v_1 0) v_2))")
/// ```
pub struct NotExpr<'a> {
    expr: &'a Expr,
}
impl<'a> From<&'a Expr> for NotExpr<'a> {
    fn from(expr: &'a Expr) -> Self {
        Self { expr }
    }
}
impl<'a> Expr2Smt<()> for NotExpr<'a> {
    fn expr_to_smt2<W: Write>(&self, w: &mut W, _: ()) -> SmtRes<()> {
        write!(w, "(not ")?;
        self.expr.expr_to_smt2(w, ())?;
        write!(w, ")")?;
        Ok(())
    }
}

/// Packs basic trait implementations.
mod trait_impls {
    use super::*;

    impl fmt::Display for Typ {
        fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
            match self {
                Self::Bool => write!(fmt, "bool"),
                Self::Int => write!(fmt, "int"),
                Self::Real => write!(fmt, "float"),
            }
        }
    }

    impl fmt::Display for Op {
        fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
            match self {
                Self::Ite => write!(fmt, "If"),
                Self::Implies => write!(fmt, "Implies"),
                Self::Not => write!(fmt, "Not"),
                Self::And => write!(fmt, "And"),
                Self::Or => write!(fmt, "Or"),
                Self::ToReal => write!(fmt, "ToReal"),
                Self::ToInt => write!(fmt, "ToInt"),
                Self::IDiv => write!(fmt, "div"),
                op => write!(fmt, "{}", op.infix_str().unwrap_or("?")),
            }
        }
    }

    impl fmt::Display for Cst {
        fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
            match self {
                Self::B(true) => write!(fmt, "True"),
                Self::B(false) => write!(fmt, "False"),
                Self::I(i) => i.fmt(fmt),
                Self::R(r) => r.fmt(fmt),
            }
        }
    }
    impl From<bool> for Cst {
        fn from(b: bool) -> Self {
            Self::B(b)
        }
    }
    impl From<Int> for Cst {
        fn from(i: Int) -> Self {
            Self::I(i)
        }
    }
    impl From<i64> for Cst {
        fn from(n: i64) -> Self {
            Self::I(n.into())
        }
    }
    impl From<Rat> for Cst {
        fn from(r: Rat) -> Self {
            Self::R(r)
        }
    }

    impl fmt::Display for Var {
        fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
            self.name.fmt(fmt)
        }
    }

    impl fmt::Display for Quantifier {
        fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
            match self {
                Self::Forall => write!(fmt, "ForAll"),
                Self::Exists => write!(fmt, "Exists"),
            }
        }
    }

    /// Writes an infix argument, with parens if it is itself infix.
    fn infix_arg(fmt: &mut fmt::Formatter, arg: &Expr) -> fmt::Result {
        match arg {
            Expr::App { op, args } if op.infix_str().is_some() && !args.is_empty() => {
                write!(fmt, "({})", arg)
            }
            _ => fmt::Display::fmt(arg, fmt),
        }
    }

    impl fmt::Display for Expr {
        fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
            match self {
                Self::Cst(cst) => cst.fmt(fmt),
                Self::Var(var) => var.fmt(fmt),
                Self::App { op: Op::Sub, args } if args.len() == 1 => {
                    write!(fmt, "-")?;
                    infix_arg(fmt, &args[0])
                }
                Self::App { op, args } => match op.infix_str() {
                    Some(op_str) => {
                        for (idx, arg) in args.iter().enumerate() {
                            if idx > 0 {
                                write!(fmt, " {} ", op_str)?
                            }
                            infix_arg(fmt, arg)?
                        }
                        Ok(())
                    }
                    None => {
                        write!(fmt, "{}(", op)?;
                        for (idx, arg) in args.iter().enumerate() {
                            if idx > 0 {
                                write!(fmt, ", ")?
                            }
                            arg.fmt(fmt)?
                        }
                        write!(fmt, ")")
                    }
                },
                Self::Quant { quant, vars, body } => {
                    write!(fmt, "{}([", quant)?;
                    for (idx, var) in vars.iter().enumerate() {
                        if idx > 0 {
                            write!(fmt, ", ")?
                        }
                        var.fmt(fmt)?
                    }
                    write!(fmt, "], {})", body)
                }
            }
        }
    }
    impl<C> From<C> for Expr
    where
        C: Into<Cst>,
    {
        fn from(cst: C) -> Self {
            Self::Cst(cst.into())
        }
    }
    impl From<(Op, Vec<Expr>)> for Expr {
        fn from((op, args): (Op, Vec<Expr>)) -> Self {
            Self::App { op, args }
        }
    }
}
