//! Verifier: checks an iteration function preserves an invariant.
//!
//! The invariant's valid paths are translated in terms of the iteration's post-state functions,
//! their disjunction `Ψ` must hold for all values of its free variables. When it does not, a
//! model of `¬Ψ` is rendered as a counterexample, with encoded temporal predicates replaced by
//! their source text.
//!
//! [`Driver`] runs all the invariants of a module against its `system_behaviour` function.

crate::prelude!();

use app::{Fun, Module};
use compose::{CdtDict, Registry};
use explore::{Explorer, Symbols};
use expr::{Cst, Expr, Op, Quantifier, Var};
use rewrite::TranslatedCheck;
use solver::{Query, Solver};

#[cfg(test)]
mod test;

/// Message for invariants whose valid paths can never hold.
pub const ALWAYS_FALSE: &str = "ERROR: the conditions are always false, check your functions";

/// Name of the iteration function of a module.
pub const SYSTEM_BEHAVIOUR: &str = "system_behaviour";

/// True if a variable names a bus address or an app-state field.
fn is_state_var(name: &str) -> bool {
    name.starts_with("GA_")
        || name
            .rsplit_once('.')
            .map(|(_, field)| app::app_state_fields().any(|(f, _)| f == field))
            .unwrap_or(false)
}

/// Post-state function of a slot variable, if any.
fn slot_fun<'c>(var: &Var, cdt: &'c CdtDict) -> Option<&'c Expr> {
    if compose::is_internal(var.name()) {
        None
    } else {
        cdt.get(var.name())
    }
}

/// Translates an atom mentioning slot variables in terms of their post-state functions.
fn translate_atom(atom: &Expr, cdt: &CdtDict) -> Res<Option<Expr>> {
    let vars = atom.free_vars();
    let mut map = Map::new();
    for var in &vars {
        match slot_fun(var, cdt) {
            Some(f) => {
                let value = match (var.typ(), f.typ()) {
                    (Typ::Bool, Typ::Int) => Expr::new_op(Op::Eq, vec![f.clone(), Expr::from(1)])?,
                    (v_typ, f_typ) if v_typ == f_typ => f.clone(),
                    (v_typ, f_typ) => bail!(
                        "Can't swap condition {} in the function {} because {} is {} \
                        but in the iteration function it has been assigned to {}",
                        var,
                        f,
                        var,
                        v_typ,
                        f_typ
                    ),
                };
                let _ = map.insert(var.clone(), value);
            }
            None if is_state_var(var.name()) => {
                bail!("variable {} is not on the cdt_dict!", var)
            }
            None => (),
        }
    }
    if map.is_empty() {
        return Ok(None);
    }

    // `s` and `Not(s)` map to `f == 1` and `f == 0`.
    let slot = |e: &Expr| e.as_var().and_then(|var| slot_fun(var, cdt));
    if let Some(f) = slot(atom) {
        if f.typ() == Typ::Int {
            return Ok(Some(Expr::new_op(Op::Eq, vec![f.clone(), Expr::from(1)])?));
        }
    }
    if let Some(f) = atom.as_negation().and_then(slot) {
        if f.typ() == Typ::Int {
            return Ok(Some(Expr::new_op(Op::Eq, vec![f.clone(), Expr::from(0)])?));
        }
    }
    Ok(Some(atom.subst(&map)))
}

/// Translates the atoms of a path condition in terms of the iteration's post-state functions.
///
/// Quantified atoms are encoded temporal predicates, they are kept as is. The quantifier-free
/// atoms must be satisfiable together. Atoms without variables and translated atoms come last,
/// after the atoms that only mention other variables (time fields, isolated functions).
pub fn split(solver: &mut Solver, atoms: &[Expr], cdt: &CdtDict) -> Res<Expr> {
    let (quantified, free): (Vec<&Expr>, Vec<&Expr>) =
        atoms.iter().partition(|atom| atom.is_quantifier());
    if free.is_empty() {
        return Ok(Expr::conj(quantified.into_iter().cloned().collect()));
    }

    if solver.check_conj(free.iter().cloned())? == Some(false) {
        let conj = Expr::and(atoms.to_vec());
        bail!("unsat {}", conj.simplify())
    }

    let (mut slots, mut other) = (vec![], vec![]);
    for atom in free {
        if atom.free_vars().is_empty() {
            slots.push(atom.clone());
            continue;
        }
        match translate_atom(atom, cdt)? {
            Some(translated) => {
                tracing::debug!("translating `{}` to `{}`", atom, translated);
                slots.push(translated)
            }
            None => {
                tracing::debug!("adding non-slot constraint `{}`", atom);
                other.push(atom.clone())
            }
        }
    }
    slots.extend(quantified.into_iter().cloned());

    let res = if slots.is_empty() {
        Expr::conj(other)
    } else if other.is_empty() {
        Expr::conj(slots)
    } else {
        Expr::and(vec![Expr::conj(other), Expr::conj(slots)])
    };
    Ok(res)
}

/// Renders a model as `[name = value, ...]`, restricted to some variables.
fn render_model(model: &[(Var, Cst)], vars: &[Var]) -> Option<String> {
    let mut items = vec![];
    for var in vars {
        if let Some((_, val)) = model.iter().find(|(v, _)| v == var) {
            items.push(format!("{} = {}", var, val))
        }
    }
    if items.is_empty() {
        None
    } else {
        Some(format!("[{}]", items.join(", ")))
    }
}

/// Queries a model of `¬cond` under the bounds of the internal-state fields of `cond`.
fn refute(solver: &mut Solver, cond: &Expr) -> Res<Query> {
    let mut query = explore::field_bounds_of(std::slice::from_ref(cond));
    query.push(cond.clone().not());
    solver.check_model(&query)
}

/// Verifies iteration functions against invariants.
pub struct Verifier<'a> {
    module: &'a Module,
    conf: Conf,
}
impl<'a> Verifier<'a> {
    /// Constructor.
    pub fn new(module: &'a Module, conf: Conf) -> Self {
        Self { module, conf }
    }

    /// Checks an iteration preserves an invariant.
    ///
    /// Returns `(true, "")` if it does, `false` and a counterexample otherwise.
    pub fn check_iteration_satisfies_invariant(
        &self,
        iteration: &Fun,
        invariant: &Fun,
    ) -> Res<(bool, String)> {
        let mut solver = Solver::new(&self.conf, &invariant.name)?;
        let mut symbols = Symbols::new();
        let mut registry = Registry::new();
        let mut explorer = Explorer::new(self.module, &self.conf, &mut solver, &mut symbols);

        let inv = rewrite::rewrite_invariant(self.module, invariant)?;
        let exploration = explorer.explore(&inv.fun)?;
        let mut valid = rewrite::extract_valid_paths(&exploration.paths);
        for path in &valid {
            registry.register_vars(path)?
        }

        let exploration = explorer.explore(iteration)?;
        let cdt = compose::cdt_dict(&exploration.paths, &mut registry)?;

        let translated = if inv.sites.is_empty() {
            vec![]
        } else {
            rewrite::replace_removed_checks(&mut explorer, &inv, &mut valid, &cdt)?
        };
        if valid.is_empty() {
            tracing::warn!("{}, check invariant `{}`", rewrite::ALL_NONE, invariant.name);
            valid.push(vec![true.into()])
        }

        let mut all_cond = Vec::with_capacity(valid.len());
        for path in &valid {
            all_cond.push(split(explorer.solver(), path, &cdt)?)
        }
        let psi = Expr::or(all_cond.clone());
        tracing::debug!("checking {}", psi);
        let solver = explorer.solver();

        let bounds = explore::field_bounds_of(std::slice::from_ref(&psi));
        let closed = Expr::forall(psi.free_vars(), Expr::conj(bounds).implies(psi.clone()));
        if solver.check_conj(Some(&closed))? == Some(true) {
            return Ok((true, String::new()));
        }

        let model = match refute(solver, &psi)? {
            Query::Unsat => return Ok((true, String::new())),
            Query::Unknown => {
                tracing::debug!("inconclusive check, analysing each condition");
                None
            }
            Query::Sat(model) => Some(model),
        };
        if let Some(model) = &model {
            if render_model(model, &psi.free_vars()).is_none()
                && psi.simplify().as_bool() == Some(false)
            {
                return Ok((false, ALWAYS_FALSE.into()));
            }
            if all_cond.iter().all(|cond| !cond.is_quantifier()) {
                let msg = counterexample(solver, &psi, &translated)?;
                return Ok((false, msg));
            }
        }
        let mut msg = String::new();
        for cond in &all_cond {
            msg.push_str(&counterexample(solver, cond, &translated)?)
        }
        if msg.is_empty() {
            let rendered = TranslatedCheck::render(&translated, psi.to_string());
            msg = format!("failed to prove {}\n", rendered)
        }
        Ok((false, msg))
    }
}

/// Counterexample of a condition, empty if the condition is valid.
///
/// A universally quantified condition (an encoded temporal predicate) is refuted through its
/// body: the counterexample is a position of its bound variables where the body fails.
pub fn counterexample(
    solver: &mut Solver,
    cond: &Expr,
    translated: &[TranslatedCheck],
) -> Res<String> {
    let rendered = TranslatedCheck::render(translated, cond.to_string());
    let (mut vars, body) = match cond {
        Expr::Quant {
            quant: Quantifier::Forall,
            vars,
            body,
        } => (vars.clone(), &**body),
        _ => (vec![], cond),
    };
    for var in cond.free_vars() {
        if !vars.contains(&var) {
            vars.push(var)
        }
    }
    let msg = match refute(solver, body)? {
        Query::Unknown => format!("failed to prove {}\n", rendered),
        Query::Unsat => String::new(),
        Query::Sat(model) => match render_model(&model, &vars) {
            Some(model) => format!("counterexample {} for condition: {}\n", model, rendered),
            None => format!("This condition is always false: {}\n", rendered),
        },
    };
    Ok(msg)
}

/// Outcome of the verification of one invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The invariant is preserved.
    Confirmed(String),
    /// The invariant is not preserved.
    Failed {
        /// Invariant.
        invariant: String,
        /// Counterexample message.
        msg: String,
    },
}
impl Verdict {
    /// True if confirmed.
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }
}
impl fmt::Display for Verdict {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Confirmed(inv) => write!(fmt, "CONFIRMED for invariant: {}", inv),
            Self::Failed { invariant, msg } => {
                write!(fmt, "ERROR: unsat for invariant {} {}", invariant, msg)
            }
        }
    }
}

/// Runs all the invariants of a module against its `system_behaviour` function.
pub struct Driver<'a> {
    module: &'a Module,
    verifier: Verifier<'a>,
}
impl<'a> Driver<'a> {
    /// Constructor.
    pub fn new(module: &'a Module, conf: Conf) -> Self {
        Self {
            module,
            verifier: Verifier::new(module, conf),
        }
    }

    /// Invariant functions, in source order.
    pub fn invariants(&self) -> impl Iterator<Item = &'a Fun> {
        self.module
            .funs
            .iter()
            .filter(|fun| fun.name.contains("invariant"))
    }

    /// Verifies the invariants in source order, stops at the first failure.
    pub fn run(&self) -> Res<Vec<Verdict>> {
        let iteration = self
            .module
            .fun(SYSTEM_BEHAVIOUR)
            .ok_or_else(|| format!("no `{}` function in the module", SYSTEM_BEHAVIOUR))?;
        let invariants: Vec<&Fun> = self.invariants().collect();
        if invariants.is_empty() {
            bail!("No invariants on the files")
        }

        let mut verdicts = vec![];
        for invariant in invariants {
            tracing::info!("verifying invariant `{}`", invariant.name);
            let (ok, msg) = self
                .verifier
                .check_iteration_satisfies_invariant(iteration, invariant)
                .chain_err(|| format!("while verifying invariant `{}`", invariant.name))?;
            let verdict = if ok {
                Verdict::Confirmed(invariant.name.clone())
            } else {
                Verdict::Failed {
                    invariant: invariant.name.clone(),
                    msg,
                }
            };
            tracing::info!("{}", verdict);
            let stop = !verdict.is_confirmed();
            verdicts.push(verdict);
            if stop {
                break;
            }
        }
        Ok(verdicts)
    }
}
