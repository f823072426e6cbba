//! Temporal-predicate encoder.
//!
//! Compiles `check_time_property(frequency, duration, condition)` into a closed formula over
//! calendar time: for every calendar position, some offset within each frequency period starts a
//! duration-wide window over which the condition holds.
//!
//! The encoding quantifies over bounded integer time fields only, the result is never simplified
//! so that callers can rely on its shape.

crate::prelude!();

use date::{DateKind, TimeUnit};
use expr::{Expr, Op, Var};

#[cfg(test)]
mod test;

/// Name of the window offset variable.
pub const OFFSET: &str = "t";

/// Time variables of a condition, completed with fresh ones.
///
/// Yields all the free variables of `cond` in order of first occurrence, followed by a fresh
/// variable for each time field `cond` does not mention (minute, hour, day, weekday, month and
/// year, in this order). Time variables are recognized by their source-level name.
fn values_of(cond: &Expr) -> (Vec<Var>, Map<TimeUnit, Var>) {
    let mut values = cond.free_vars();
    let mut time = Map::new();
    for var in &values {
        if let Some(unit) = TimeUnit::of_descr(var.name()) {
            time.entry(unit).or_insert_with(|| var.clone());
        }
    }
    for unit in TimeUnit::ALL {
        if !time.contains_key(&unit) {
            let var = Var::new(unit.descr(), Typ::Int);
            values.push(var.clone());
            let _ = time.insert(unit, var);
        }
    }
    (values, time)
}

fn int(i: i64) -> Expr {
    Expr::from(i)
}
fn app(op: Op, args: Vec<Expr>) -> Expr {
    Expr::from((op, args))
}

/// Window of some duration over which `cond` must hold, starting at offset `t`.
///
/// `And(And(t >= min, t <= max - value), ForAll([v], Implies(And(t <= v, v <= t + value), cond)))`
fn window(duration: DateKind, v: &Var, t: &Var, cond: Expr) -> Expr {
    let (t_expr, v_expr) = (Expr::new_var(t.clone()), Expr::new_var(v.clone()));
    let lower = app(Op::Ge, vec![t_expr.clone(), int(duration.min())]);
    let offset = match duration.max() {
        Some(max) => Expr::and(vec![
            lower,
            app(Op::Le, vec![t_expr.clone(), int(max - duration.value)]),
        ]),
        None => lower,
    };
    let inside = Expr::and(vec![
        app(Op::Le, vec![t_expr.clone(), v_expr.clone()]),
        app(
            Op::Le,
            vec![v_expr, app(Op::Add, vec![t_expr, int(duration.value)])],
        ),
    ]);
    Expr::and(vec![
        offset,
        Expr::forall(vec![v.clone()], inside.implies(cond)),
    ])
}

/// Encodes a temporal predicate.
///
/// Fails if the duration exceeds the range of its unit, or if the frequency is a multi-year one.
///
/// # Examples
///
/// ```rust
/// # use svshi_verif::{build_expr, date::{DateKind, TimeUnit}, encode};
/// let cond = build_expr!((>= (time_hour: int) 10));
/// let freq = DateKind::new(TimeUnit::Day, 1).unwrap();
/// let dur = DateKind::new(TimeUnit::Hour, 10).unwrap();
/// let phi = encode::check(freq, dur, cond).unwrap();
/// let phi = phi.to_string();
/// assert!(phi.starts_with("ForAll([time_hour, time_min, time_day, time_weekday, time_month, time_year], Implies("));
/// assert!(phi.contains("Exists([t], And(And(And(t >= 0, t <= 13), ForAll([time_hour], "));
///
/// let freq = DateKind::new(TimeUnit::Year, 2).unwrap();
/// assert!(encode::check(freq, dur, build_expr!(true)).is_err());
/// ```
pub fn check(frequency: DateKind, duration: DateKind, cond: Expr) -> Res<Expr> {
    duration
        .check_fits()
        .chain_err(|| "illegal duration in temporal property")?;

    let (values, time) = values_of(&cond);
    let var_of = |unit: TimeUnit| -> Var {
        time.get(&unit)
            .cloned()
            .unwrap_or_else(|| Var::new(unit.descr(), Typ::Int))
    };
    let t = Var::new(OFFSET, Typ::Int);
    let bounds = date::bounds(&var_of);
    let window = window(duration, &var_of(duration.unit), &t, cond);

    let slices = if frequency.value > 1 {
        let max = match frequency.max() {
            Some(max) => max,
            None => bail!(
                "`{}` cannot be used as a frequency, `{}` values are unbounded",
                frequency,
                frequency.unit
            ),
        };
        if frequency.unit.span().map(|span| frequency.value > span) == Some(true) {
            tracing::warn!(
                "frequency `{}` exceeds the range of `{}` values, using a single period",
                frequency,
                frequency.unit,
            )
        }
        let v_f = var_of(frequency.unit);
        let v_f_expr = Expr::new_var(v_f.clone());
        let mut slices = vec![];
        let mut i = frequency.min();
        while i <= max {
            let upper = (i + frequency.value - 1).min(max);
            slices.push(Expr::exists(
                vec![t.clone(), v_f.clone()],
                Expr::and(vec![
                    bounds.clone(),
                    app(Op::Le, vec![int(i), v_f_expr.clone()]),
                    app(Op::Le, vec![v_f_expr.clone(), int(upper)]),
                    window.clone(),
                ]),
            ));
            i += frequency.value;
        }
        slices
    } else {
        vec![Expr::exists(
            vec![t],
            Expr::and(vec![window, bounds.clone()]),
        )]
    };

    let body = slices
        .into_iter()
        .reduce(|lft, rgt| Expr::and(vec![lft, rgt]))
        .ok_or("empty frequency range")?;

    Ok(Expr::forall(values, bounds.implies(body)))
}
