//! State-function composer.
//!
//! Turns the paths of an iteration function into one post-state function per slot:
//! `If(g_1, v_1, If(g_2, v_2, ..., -1))` where `g_k` is the condition of the `k`-th path and
//! `v_k` the value of the slot at the end of that path. The trailing `-1` stands for "no path",
//! booleans are mapped to `1`/`0` so that it never collides with an actual value.

crate::prelude!();

use explore::PathSummary;
use expr::{Expr, Op, Var};

#[cfg(test)]
mod test;

lazy_static::lazy_static! {
    /// Bare app-state field names.
    static ref BARE_APP_FIELD: regex::Regex = regex::Regex::new(r"^(INT|FLOAT|BOOL)_[0-3]\b")
        .expect("illegal app-state field regex");
}

/// Post-state functions, by slot name.
pub type CdtDict = Map<String, Expr>;

/// True if a slot is an internal-state field, these are never substituted.
pub fn is_internal(slot: &str) -> bool {
    slot == app::SENTINEL || date::TimeUnit::of_descr(slot).is_some()
}

/// Registry of the solver constants met during a verification call, by source-level name.
///
/// Rejects bare app-state field names: app-state fields must be qualified by their record so that
/// apps sharing generic field names do not clash.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    vars: Map<String, Var>,
}
impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the value of a slot.
    ///
    /// Only constants are registered, other values are ignored.
    ///
    /// ```rust
    /// # use svshi_verif::{build_expr, compose::Registry};
    /// let mut registry = Registry::new();
    /// registry.register("GA_0_0_1", &build_expr!((GA_0_0_1: bool))).unwrap();
    /// registry.register("app_one_app_state.INT_0", &build_expr!((+ 1 2))).unwrap();
    /// assert_eq!(registry.len(), 1);
    ///
    /// let err = registry.register("INT_0", &build_expr!((INT_0: int))).unwrap_err();
    /// assert_eq!(
    ///     err.to_string(),
    ///     "adding INT_0 as a key should never happen, could cause app_state conflicts",
    /// );
    /// ```
    pub fn register(&mut self, name: &str, value: &Expr) -> Res<()> {
        if BARE_APP_FIELD.is_match(name) {
            bail!(
                "adding {} as a key should never happen, could cause app_state conflicts",
                name
            )
        }
        match value.as_var() {
            Some(var) => match self.vars.get(name) {
                None => {
                    let _ = self.vars.insert(name.into(), var.clone());
                }
                Some(known) if known != var => tracing::debug!(
                    "several constants for `{}`: `{}` and `{}`",
                    name,
                    known.symbol(),
                    var.symbol()
                ),
                Some(_) => (),
            },
            None => tracing::debug!("ignoring formula {} for var name {}", value, name),
        }
        Ok(())
    }

    /// Registers the variables of some path conditions under their source-level name.
    pub fn register_vars<'e>(&mut self, exprs: impl IntoIterator<Item = &'e Expr>) -> Res<()> {
        for expr in exprs {
            for var in expr.free_vars() {
                let name = var.name().to_string();
                self.register(&name, &Expr::new_var(var))?
            }
        }
        Ok(())
    }

    /// Number of constants registered.
    pub fn len(&self) -> usize {
        self.vars.len()
    }
    /// True if empty.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Post-state function of a list of guarded values.
///
/// Values of a real slot use `-1.0` as sentinel (integers are promoted), boolean values are mapped
/// to `1`/`0`.
///
/// # Examples
///
/// ```rust
/// # use svshi_verif::{build_expr, compose::nested_ifs};
/// let hour = build_expr!((>= (time_hour: int) 10));
/// let f = nested_ifs(vec![
///     (build_expr!((not (>= (time_hour: int) 10))), build_expr!(false)),
///     (hour.clone(), build_expr!(true)),
/// ]).unwrap();
/// assert_eq!(f.to_string(), "If(Not(time_hour >= 10), 0, If(time_hour >= 10, 1, -1))");
///
/// let f = nested_ifs(vec![(hour, build_expr!((GA_0_0_1: bool)))]).unwrap();
/// assert_eq!(f.to_string(), "If(time_hour >= 10, If(GA_0_0_1, 1, 0), -1)");
///
/// assert_eq!(nested_ifs(vec![]).unwrap().to_string(), "-1");
/// ```
pub fn nested_ifs(guarded: Vec<(Expr, Expr)>) -> Res<Expr> {
    let real = guarded.iter().any(|(_, val)| val.typ() == Typ::Real);
    let mut res = if real {
        Expr::from(Rat::from_integer(Int::from(-1)))
    } else {
        Expr::from(-1)
    };
    for (guard, val) in guarded.into_iter().rev() {
        let val = match (val.typ(), val.as_bool()) {
            (Typ::Bool, Some(b)) => Expr::from(if b { 1 } else { 0 }),
            (Typ::Bool, None) => Expr::new_op(Op::Ite, vec![val, Expr::from(1), Expr::from(0)])?,
            (_, _) => val,
        };
        res = Expr::new_op(Op::Ite, vec![guard, val, res])?;
    }
    Ok(res)
}

/// Builds the post-state functions of an iteration from its paths.
///
/// Slots keep the order of the paths. Every slot value is registered in `registry`.
pub fn cdt_dict(paths: &[PathSummary], registry: &mut Registry) -> Res<CdtDict> {
    let mut guarded: Map<String, Vec<(Expr, Expr)>> = Map::new();
    for path in paths {
        let cond = path.condition();
        let mut seen = Set::new();
        for (slot, val) in &path.outputs {
            if !seen.insert(slot) {
                bail!("Duplicate key detected for key {}", slot)
            }
            let list = guarded.entry(slot.clone()).or_insert_with(Vec::new);
            list.push((cond.clone(), val.clone()));
            registry.register(slot, val)?;
        }
    }
    let mut res = Map::new();
    for (slot, list) in guarded {
        let f = nested_ifs(list).chain_err(|| format!("while composing slot `{}`", slot))?;
        tracing::debug!("{} := {}", slot, f);
        let _ = res.insert(slot, f);
    }
    Ok(res)
}
