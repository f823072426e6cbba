//! Crate-level macros.

/// Imports the crate's prelude, and optionally some items of the crate's modules.
///
/// ```rust,ignore
/// prelude!(expr::*, parse::Span);
/// ```
#[macro_export]
macro_rules! prelude {
    {} => { use $crate::prelude::*; };
    { pub } => { pub use $crate::prelude::*; };
    { $($imports:tt)* } => {
        use $crate::prelude::{*, $($imports)*};
    };
}

/// Convenience macro, provides a DSL for writing expressions.
///
/// - identifiers must be written as `(var_name: var_typ)`, without any quotes, they produce
///   variables without a symbolic uid;
/// - quantifiers are written `(forall ((v: typ) ...) body)` and `(exists ((v: typ) ...) body)`.
///
/// # Examples
///
/// ```rust
/// use svshi_verif::build_expr;
/// let expr = build_expr!(
///     (and (>= (time_hour: int) 10) (GA_0_0_2: bool))
/// );
/// assert_eq!(expr.to_string(), "And(time_hour >= 10, GA_0_0_2)");
/// let expr = build_expr!(
///     (exists ((t: int)) (<= (t: int) 13))
/// );
/// assert_eq!(expr.to_string(), "Exists([t], t <= 13)");
/// ```
#[macro_export]
macro_rules! build_expr {
    (true) => ( $crate::expr::Expr::from(true) );
    (false) => ( $crate::expr::Expr::from(false) );

    ( ($var:ident : $typ:ident) ) => (
        $crate::expr::Expr::new_var(
            $crate::expr::Var::new(stringify!($var), $crate::build_typ!($typ))
        )
    );

    ( (forall ( $( ($qvar:ident : $qtyp:ident) )* ) $body:tt) ) => (
        $crate::expr::Expr::forall(
            vec![ $( $crate::expr::Var::new(stringify!($qvar), $crate::build_typ!($qtyp)) ),* ],
            $crate::build_expr!($body),
        )
    );
    ( (exists ( $( ($qvar:ident : $qtyp:ident) )* ) $body:tt) ) => (
        $crate::expr::Expr::exists(
            vec![ $( $crate::expr::Var::new(stringify!($qvar), $crate::build_typ!($qtyp)) ),* ],
            $crate::build_expr!($body),
        )
    );

    ( ($op:tt $($args:tt)*) ) => (
        $crate::expr::Expr::from((
            $crate::build_expr!(@op $op),
            vec![ $($crate::build_expr!($args)),* ],

        ))
    );

    ($cst:expr) => ( $crate::expr::Expr::from($cst) );

    (@op ite) => ( $crate::expr::Op::Ite );
    (@op =>) => ( $crate::expr::Op::Implies );
    (@op +) => ( $crate::expr::Op::Add );
    (@op -) => ( $crate::expr::Op::Sub );
    (@op *) => ( $crate::expr::Op::Mul );
    (@op /) => ( $crate::expr::Op::Div );
    (@op %) => ( $crate::expr::Op::Mod );
    (@op >=) => ( $crate::expr::Op::Ge );
    (@op <=) => ( $crate::expr::Op::Le );
    (@op >) => ( $crate::expr::Op::Gt );
    (@op <) => ( $crate::expr::Op::Lt );
    (@op =) => ( $crate::expr::Op::Eq );
    (@op not) => ( $crate::expr::Op::Not );
    (@op and) => ( $crate::expr::Op::And );
    (@op or) => ( $crate::expr::Op::Or );
    (@op to_real) => ( $crate::expr::Op::ToReal );
    (@op !) => ( $crate::expr::Op::Not );
    (@op &&) => ( $crate::expr::Op::And );
    (@op ||) => ( $crate::expr::Op::Or );
}

/// Builds a type.
#[macro_export]
macro_rules! build_typ {
    (bool) => {
        $crate::expr::Typ::Bool
    };
    (int) => {
        $crate::expr::Typ::Int
    };
    (real) => {
        $crate::expr::Typ::Real
    };
}
