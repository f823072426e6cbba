//! Invariant rewriter.
//!
//! Temporal predicates cannot be explored symbolically. Each `check_time_property` call of an
//! invariant is replaced by a sentinel call `svshi_api.dummy_check(internal_state, i)`, which the
//! explorer sees as the opaque boolean `i == c0`. Once the iteration is known, the sentinels of
//! the invariant's paths are replaced by the encoding of the corresponding predicate.

crate::prelude!();

use app::{Arg, ExprKind, Fun, Module, Param, RecordKind, Stmt};
use compose::CdtDict;
use date::{DateKind, TimeUnit};
use explore::{Explorer, PathSummary, Value};
use expr::{Cst, Expr, Op};

#[cfg(test)]
mod test;

/// Diagnostic for check conditions the explorer cannot handle, typically aliased conditions.
pub const ALIAS_ERROR: &str =
    "Error on check condition function, make sure your conditions doesn't have any aliases";

/// Warning issued when no path of an invariant is valid.
pub const ALL_NONE: &str = "WARNING: all paths lead to None";

/// A temporal predicate replaced by a sentinel.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckSite {
    /// Index of the sentinel, `index == c0`.
    pub index: usize,
    /// Source text of the call.
    pub text: String,
    /// Frequency argument.
    pub frequency: DateKind,
    /// Duration argument.
    pub duration: DateKind,
    /// Condition argument, nested predicates already replaced.
    pub condition: app::Expr,
    /// Source text of the condition.
    pub condition_text: String,
}

/// An encoded temporal predicate and the source text it comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedCheck {
    /// Rendering of the encoding.
    pub formula: String,
    /// Source text of the call, on one line.
    pub source: String,
}
impl TranslatedCheck {
    /// Replaces the encodings appearing in a rendering by their source text.
    ///
    /// Outer predicates come after the predicates they contain, and are replaced first.
    pub fn render(checks: &[Self], rendered: impl Into<String>) -> String {
        let mut rendered = rendered.into();
        for check in checks.iter().rev() {
            rendered = rendered.replace(&check.formula, &check.source)
        }
        rendered
    }
}

/// An invariant with its temporal predicates replaced.
#[derive(Debug, Clone)]
pub struct RewrittenInvariant {
    /// Rewritten function.
    pub fun: Fun,
    /// Replaced predicates, by increasing index.
    pub sites: Vec<CheckSite>,
    /// Name of the app-state record of the invariant, if any.
    pub app_name: Option<String>,
}

/// Single-line version of some source text.
fn one_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Infers the app-state record of an invariant.
///
/// With several app-state parameters, the one whose name contains the invariant's name minus
/// its `_invariant` suffix is selected.
pub fn app_name(fun: &Fun) -> Res<Option<String>> {
    let candidates: Vec<&str> = fun.app_params().collect();
    match candidates.as_slice() {
        [] => Ok(None),
        [name] => Ok(Some(name.to_string())),
        _ => {
            tracing::debug!("multiple app states detected, inferring from `{}`", fun.name);
            let app = fun.name.strip_suffix("_invariant").unwrap_or(&fun.name);
            let matches: Vec<&str> = candidates
                .iter()
                .cloned()
                .filter(|name| name.contains(app))
                .collect();
            match matches.as_slice() {
                [name] => Ok(Some(name.to_string())),
                [] => bail!(
                    "no match for the possible app name `{}` given {:?}",
                    app,
                    candidates
                ),
                _ => bail!("multiple app names : {:?} cannot decide", matches),
            }
        }
    }
}

/// Date kind of a `Hour(10)` or `svshi_api.Hour(10)` argument.
fn date_arg(module: &Module, e: &app::Expr) -> Res<DateKind> {
    let (name, args) = match &e.kind {
        ExprKind::Call { fun, args } => (fun.as_str(), args),
        ExprKind::Method { recv, method, args } if recv == app::API => (method.as_str(), args),
        _ => bail!(
            "expected a date kind such as `Hour(1)`, got `{}`",
            module.text_of(e.span)
        ),
    };
    let unit = TimeUnit::of_name(name)
        .ok_or_else(|| format!("unknown date kind `{}`", module.text_of(e.span)))?;
    match args.as_slice() {
        [Arg {
            name: None,
            value:
                app::Expr {
                    kind: ExprKind::Cst(Cst::I(i)),
                    ..
                },
        }] => {
            let value = i
                .to_i64()
                .ok_or_else(|| format!("illegal value `{}` for `{}`", i, unit))?;
            DateKind::new(unit, value)
        }
        _ => bail!(
            "`{}` expects a single integer constant, got `{}`",
            unit,
            module.text_of(e.span)
        ),
    }
}

/// Frequency, duration and condition arguments of a predicate, positional or named.
fn check_args(args: Vec<Arg>) -> Res<[app::Expr; 3]> {
    const NAMES: [&str; 3] = ["frequency", "duration", "condition"];
    let mut slots: [Option<app::Expr>; 3] = [None, None, None];
    let mut next = 0;
    for Arg { name, value } in args {
        let idx = match name {
            None => {
                next += 1;
                next - 1
            }
            Some(name) => NAMES
                .iter()
                .position(|n| *n == name)
                .ok_or_else(|| format!("unexpected argument `{}` for `{}`", name, app::CHECK_TIME_PROPERTY))?,
        };
        match slots.get_mut(idx) {
            Some(slot @ None) => *slot = Some(value),
            Some(Some(_)) => bail!(
                "argument `{}` of `{}` given twice",
                NAMES[idx],
                app::CHECK_TIME_PROPERTY
            ),
            None => bail!("too many arguments for `{}`", app::CHECK_TIME_PROPERTY),
        }
    }
    match slots {
        [Some(freq), Some(dur), Some(cond)] => Ok([freq, dur, cond]),
        slots => {
            let missing: Vec<_> = NAMES
                .iter()
                .zip(slots.iter())
                .filter(|(_, slot)| slot.is_none())
                .map(|(name, _)| *name)
                .collect();
            bail!(
                "missing argument(s) {} for `{}`",
                missing.join(", "),
                app::CHECK_TIME_PROPERTY
            )
        }
    }
}

/// Fails on conditions reading anything else than records, devices and the API.
fn check_no_alias(fun: &Fun, cond: &app::Expr) -> Res<()> {
    let mut ok = true;
    cond.visit(&mut |e| match &e.kind {
        ExprKind::Ident(id) => ok = ok && fun.param(id).is_some(),
        ExprKind::Field { base, .. } => {
            ok = ok && (fun.param(base).is_some() || base == app::ISOLATED_VALUES)
        }
        _ => (),
    });
    if ok {
        Ok(())
    } else {
        bail!(ALIAS_ERROR)
    }
}

/// Replaces the temporal predicates of an invariant by sentinels.
///
/// Nested predicates are replaced first, indices follow the order of replacement.
pub fn rewrite_invariant(module: &Module, fun: &Fun) -> Res<RewrittenInvariant> {
    let app_name = app_name(fun)?;
    let internal = fun
        .params
        .iter()
        .find(|param| param.kind == RecordKind::Internal)
        .map(|param| param.name.clone());

    let mut sites: Vec<CheckSite> = vec![];
    let mut replace = |e: app::Expr| -> Res<app::Expr> {
        if !e.is_check_time_property() {
            return Ok(e);
        }
        let span = e.span;
        let text = module.text_of(span).to_string();
        let args = match e.kind {
            ExprKind::Method { args, .. } => args,
            _ => return Ok(e),
        };
        let internal = internal.clone().ok_or_else(|| {
            format!(
                "function `{}` uses `{}` but has no `InternalState` parameter",
                fun.name,
                app::CHECK_TIME_PROPERTY
            )
        })?;
        let [freq, dur, cond] = check_args(args).chain_err(|| format!("in `{}`", text))?;
        check_no_alias(fun, &cond)?;
        let index = sites.len();
        tracing::debug!("replacing `{}` by sentinel {}", one_line(&text), index);
        sites.push(CheckSite {
            index,
            frequency: date_arg(module, &freq)?,
            duration: date_arg(module, &dur)?,
            condition_text: module.text_of(cond.span).to_string(),
            condition: cond,
            text,
        });
        let int = Int::from(index);
        Ok(app::Expr::new(
            ExprKind::Method {
                recv: app::API.into(),
                method: app::DUMMY_CHECK.into(),
                args: vec![
                    Arg {
                        name: None,
                        value: app::Expr::new(ExprKind::Ident(internal), span),
                    },
                    Arg {
                        name: None,
                        value: app::Expr::new(ExprKind::Cst(Cst::I(int)), span),
                    },
                ],
            },
            span,
        ))
    };
    let body = app::rebuild_block(fun.body.clone(), &mut replace)
        .chain_err(|| format!("while rewriting invariant `{}`", fun.name))?;

    Ok(RewrittenInvariant {
        fun: Fun {
            body,
            ..fun.clone()
        },
        sites,
        app_name,
    })
}

/// Path conditions of the paths that make a boolean function hold.
///
/// Paths returning `False` or `None` are dropped, a symbolic return value is added to the path
/// condition of its path.
pub fn extract_valid_paths(paths: &[PathSummary]) -> Vec<Vec<Expr>> {
    let mut res = vec![];
    for path in paths {
        let ret = match &path.ret {
            Value::None => {
                tracing::debug!("path leads to None, ignoring path {}", path.condition());
                continue;
            }
            Value::Expr(e) => e,
            Value::Date(_) | Value::Record(_) => {
                res.push(non_empty(path.guards.clone()));
                continue;
            }
        };
        match ret.as_bool() {
            Some(true) => res.push(non_empty(path.guards.clone())),
            Some(false) => tracing::debug!("ignoring path that returns False: {}", path.condition()),
            None => {
                let mut guards = path.guards.clone();
                guards.push(ret.clone().truthy());
                if Expr::conj(guards.clone()).simplify().as_bool() == Some(false) {
                    tracing::debug!("ignoring trivially false path {}", Expr::conj(guards));
                    continue;
                }
                res.push(guards)
            }
        }
    }
    res
}

fn non_empty(guards: Vec<Expr>) -> Vec<Expr> {
    if guards.is_empty() {
        vec![true.into()]
    } else {
        guards
    }
}

/// Index of a sentinel `i == c0`, either way around.
fn sentinel_index(expr: &Expr) -> Option<usize> {
    match expr {
        Expr::App { op: Op::Eq, args } if args.len() == 2 => match (&args[0], &args[1]) {
            (Expr::Cst(Cst::I(i)), Expr::Var(var)) | (Expr::Var(var), Expr::Cst(Cst::I(i)))
                if var.name() == app::SENTINEL =>
            {
                i.to_usize()
            }
            _ => None,
        },
        _ => None,
    }
}

/// Replaces the sentinels of some encodings by these encodings.
///
/// Negated sentinels become `True`: a predicate on a branch that is not taken imposes nothing.
pub fn substitute_sentinels(expr: &Expr, phis: &Map<usize, Expr>) -> Expr {
    if let Some(idx) = expr.as_negation().and_then(sentinel_index) {
        if phis.contains_key(&idx) {
            return true.into();
        }
    }
    if let Some(phi) = sentinel_index(expr).and_then(|idx| phis.get(&idx)) {
        return phi.clone();
    }
    match expr {
        Expr::App { op, args } => Expr::from((
            *op,
            args.iter()
                .map(|arg| substitute_sentinels(arg, phis))
                .collect(),
        )),
        Expr::Quant { quant, vars, body } => Expr::Quant {
            quant: *quant,
            vars: vars.clone(),
            body: Box::new(substitute_sentinels(body, phis)),
        },
        Expr::Cst(_) | Expr::Var(_) => expr.clone(),
    }
}

/// Function evaluating the condition of a check site.
fn condition_fun(inv: &RewrittenInvariant, site: &CheckSite) -> Fun {
    let params: Vec<Param> = inv
        .fun
        .params
        .iter()
        .filter(|param| match param.kind {
            RecordKind::App => Some(&param.name) == inv.app_name.as_ref(),
            RecordKind::Physical | RecordKind::Internal => true,
        })
        .cloned()
        .collect();
    Fun {
        name: format!("conds{}", site.index),
        params,
        ret: Some(Typ::Bool),
        body: vec![Stmt::Return(Some(site.condition.clone()))],
    }
}

/// Replaces the sentinels of the invariant's paths by the encoding of their predicate.
///
/// Conditions are explored and translated in terms of the iteration's post-state with `cdt`,
/// before encoding. Returns the encodings with their source text, by increasing index.
pub fn replace_removed_checks(
    explorer: &mut Explorer<'_>,
    inv: &RewrittenInvariant,
    paths: &mut [Vec<Expr>],
    cdt: &CdtDict,
) -> Res<Vec<TranslatedCheck>> {
    let mut phis = Map::new();
    let mut translated = vec![];

    for site in &inv.sites {
        let fun = condition_fun(inv, site);
        let exploration = explorer.explore(&fun).map_err(|e| {
            tracing::debug!("condition `{}`:\n{}", site.condition_text, e.pretty());
            ErrorChain::from(ALIAS_ERROR)
        })?;

        let mut disjuncts = vec![];
        for constraint in extract_valid_paths(&exploration.paths) {
            let constraint: Vec<Expr> = constraint
                .iter()
                .map(|atom| substitute_sentinels(atom, &phis))
                .collect();
            disjuncts.push(verify::split(explorer.solver(), &constraint, cdt)?)
        }
        let cond = match disjuncts
            .into_iter()
            .reduce(|lft, rgt| Expr::or(vec![lft, rgt]))
        {
            Some(cond) => cond,
            None => {
                tracing::warn!("condition `{}` never holds", one_line(&site.condition_text));
                false.into()
            }
        };

        let phi = encode::check(site.frequency, site.duration, cond)
            .chain_err(|| format!("while encoding `{}`", one_line(&site.text)))?;
        translated.push(TranslatedCheck {
            formula: phi.to_string(),
            source: one_line(&site.text),
        });
        let _ = phis.insert(site.index, phi);
    }

    for path in paths.iter_mut() {
        for atom in path.iter_mut() {
            *atom = substitute_sentinels(atom, &phis)
        }
    }
    Ok(translated)
}
