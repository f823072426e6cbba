//! Path explorer: symbolic execution of app functions.
//!
//! Exploration is by re-execution. A run replays a prefix of branch decisions, then explores new
//! branches taking the `else` side first, and records the decisions it did not take as new
//! prefixes to run. Branch feasibility is decided by the solver under the bounds of the
//! internal-state fields; sentinel conditions (`i == c0`) are never sent to the solver.
//!
//! Every field of every record parameter starts as a symbolic constant from a [`Symbols`] table
//! shared by all the explorations of a verification call, so that the same field is the same
//! constant in the invariant, the iteration and the condition functions.

crate::prelude!();

use app::{Arg, BinOp, CmpOp, Device, DeviceKind, ExprKind, Fun, Module, RecordKind, Stmt};
use date::{DateKind, TimeUnit};
use expr::{Cst, Expr, Op, Var};
use solver::Solver;

#[cfg(test)]
mod test;

/// Warning issued when an exploration is not exhaustive.
pub const NOT_EXHAUSTED: &str =
    "WARNING: paths not exhausted, increase the condition and path timeout";

/// Symbol table: symbolic constants of record fields, by slot key.
///
/// Keys are the names of the slots (`GA_0_0_1`, `time_hour`, `app_one_app_state.INT_0`), and
/// `isolated_fn_values.<name>` for the last values of isolated functions.
#[derive(Debug, Clone, Default)]
pub struct Symbols {
    vars: Map<String, Var>,
    next_uid: usize,
}
impl Symbols {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Symbolic constant of a key, created if needed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use svshi_verif::{explore::Symbols, expr::Typ};
    /// let mut symbols = Symbols::new();
    /// let ga = symbols.var("GA_0_0_1", "GA_0_0_1", Typ::Bool).unwrap();
    /// let hour = symbols.var("time_hour", "time_hour", Typ::Int).unwrap();
    /// assert_eq!(symbols.var("GA_0_0_1", "GA_0_0_1", Typ::Bool).unwrap(), ga);
    /// assert_ne!(ga.symbol(), hour.symbol());
    ///
    /// let err = symbols.var("GA_0_0_1", "GA_0_0_1", Typ::Int).unwrap_err();
    /// assert_eq!(err.to_string(), "`GA_0_0_1` has type `bool`, cannot use it as `int`");
    /// ```
    pub fn var(&mut self, key: impl Into<String>, name: &str, typ: Typ) -> Res<Var> {
        let key = key.into();
        if let Some(var) = self.vars.get(&key) {
            if var.typ() != typ {
                bail!(
                    "`{}` has type `{}`, cannot use it as `{}`",
                    key,
                    var.typ(),
                    typ
                )
            }
            return Ok(var.clone());
        }
        let var = Var::new_symbolic(name, self.next_uid, typ);
        self.next_uid += 1;
        let _ = self.vars.insert(key, var.clone());
        Ok(var)
    }
}

/// Values manipulated by the explorer.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `None`.
    None,
    /// A solver expression, symbolic or concrete.
    Expr(Expr),
    /// A date kind, frequency or duration of temporal predicates.
    Date(DateKind),
    /// A record parameter, by name.
    Record(String),
}
impl Value {
    /// Expression of a value, if any.
    pub fn as_expr(&self) -> Option<&Expr> {
        match self {
            Self::Expr(e) => Some(e),
            _ => None,
        }
    }
}
impl fmt::Display for Value {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::None => write!(fmt, "None"),
            Self::Expr(e) => e.fmt(fmt),
            Self::Date(date) => date.fmt(fmt),
            Self::Record(name) => write!(fmt, "<record {}>", name),
        }
    }
}
impl From<Expr> for Value {
    fn from(e: Expr) -> Self {
        Self::Expr(e)
    }
}

/// Result of the symbolic exploration of one path.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSummary {
    /// Path condition, as a list of guards.
    pub guards: Vec<Expr>,
    /// Returned value.
    pub ret: Value,
    /// Final value of every field of every record parameter, by slot name.
    pub outputs: Vec<(String, Expr)>,
}
impl PathSummary {
    /// Conjunction of the guards.
    pub fn condition(&self) -> Expr {
        Expr::conj(self.guards.clone())
    }
}

/// Result of the exploration of a function.
#[derive(Debug, Clone)]
pub struct Exploration {
    /// Feasible paths, in exploration order.
    pub paths: Vec<PathSummary>,
    /// False if some timeout or unknown answer was hit.
    pub exhausted: bool,
}

/// Symbolic-execution engine over the functions of a module.
pub struct Explorer<'a> {
    module: &'a Module,
    solver: &'a mut Solver,
    symbols: &'a mut Symbols,
    path_timeout: Duration,
}
impl<'a> Explorer<'a> {
    /// Constructor.
    pub fn new(
        module: &'a Module,
        conf: &Conf,
        solver: &'a mut Solver,
        symbols: &'a mut Symbols,
    ) -> Self {
        Self {
            module,
            solver,
            symbols,
            path_timeout: conf.path_timeout(),
        }
    }

    /// Underlying solver.
    pub fn solver(&mut self) -> &mut Solver {
        self.solver
    }

    /// Enumerates the feasible paths of a function.
    pub fn explore(&mut self, fun: &Fun) -> Res<Exploration> {
        tracing::debug!("exploring function `{}`", fun.name);
        let mut todo: Vec<Vec<bool>> = vec![vec![]];
        let mut paths = vec![];
        let mut exhausted = true;

        while let Some(prefix) = todo.pop() {
            let mut run = Run::new(self, fun, prefix);
            let res = run.exec();
            let Run {
                forks,
                unknown,
                guards,
                records,
                ..
            } = run;
            if unknown {
                exhausted = false
            }
            todo.extend(forks);
            match res {
                Ok(ret) => paths.push(PathSummary {
                    guards,
                    ret,
                    outputs: records.outputs(fun),
                }),
                Err(Halt::Infeasible) => tracing::debug!("dropping infeasible path"),
                Err(Halt::Timeout) => {
                    tracing::debug!("dropping path after timeout");
                    exhausted = false
                }
                Err(Halt::Err(e)) => {
                    return Err(e.chain_err(|| {
                        format!("symbolic exploration failed on function `{}`", fun.name)
                    }))
                }
            }
        }

        if !exhausted {
            tracing::warn!("{}", NOT_EXHAUSTED)
        }
        tracing::debug!("`{}`: {} path(s)", fun.name, paths.len());
        Ok(Exploration { paths, exhausted })
    }
}

/// Reasons a run stops before the end of the function.
enum Halt {
    /// The path is infeasible, or violates a precondition.
    Infeasible,
    /// The path timeout tripped.
    Timeout,
    /// Actual error.
    Err(ErrorChain),
}
impl From<ErrorChain> for Halt {
    fn from(e: ErrorChain) -> Self {
        Self::Err(e)
    }
}
impl From<String> for Halt {
    fn from(s: String) -> Self {
        Self::Err(s.into())
    }
}
impl From<&str> for Halt {
    fn from(s: &str) -> Self {
        Self::Err(s.into())
    }
}

type Exec<T> = Result<T, Halt>;

/// Control flow after a statement.
enum Flow {
    Next,
    Return(Value),
}

/// A field of a record.
#[derive(Debug, Clone)]
struct Field {
    name: String,
    /// Current value, `None` for opaque string fields.
    val: Option<Expr>,
}

/// A record parameter.
#[derive(Debug, Clone)]
struct Record {
    kind: RecordKind,
    fields: Vec<Field>,
}
impl Record {
    fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }
    fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|field| field.name == name)
    }
}

/// Record parameters of a run.
#[derive(Debug, Clone, Default)]
struct Records {
    map: Map<String, Record>,
}
impl Records {
    /// Slot name of a field of a record.
    fn slot(kind: RecordKind, rec: &str, field: &str) -> String {
        match kind {
            RecordKind::App => format!("{}.{}", rec, field),
            RecordKind::Physical | RecordKind::Internal => field.into(),
        }
    }

    fn outputs(&self, fun: &Fun) -> Vec<(String, Expr)> {
        let mut res = vec![];
        for param in &fun.params {
            if let Some(record) = self.map.get(&param.name) {
                for field in &record.fields {
                    if let Some(val) = &field.val {
                        res.push((Self::slot(record.kind, &param.name, &field.name), val.clone()))
                    }
                }
            }
        }
        res
    }
}

/// Time getters of the API.
fn getter_field(method: &str) -> Option<TimeUnit> {
    let unit = match method {
        "get_minute_in_hour" => TimeUnit::Minute,
        "get_hour_of_the_day" => TimeUnit::Hour,
        "get_day_of_week" => TimeUnit::Week,
        "get_day_of_month" => TimeUnit::Day,
        "get_month_in_year" => TimeUnit::Month,
        "get_year" => TimeUnit::Year,
        _ => return None,
    };
    Some(unit)
}
/// Time setters of the API.
fn setter_field(method: &str) -> Option<TimeUnit> {
    let unit = match method {
        "set_minutes" => TimeUnit::Minute,
        "set_hour_of_the_day" => TimeUnit::Hour,
        "set_day_of_week" => TimeUnit::Week,
        "set_day" => TimeUnit::Day,
        "set_month" => TimeUnit::Month,
        "set_year" => TimeUnit::Year,
        _ => return None,
    };
    Some(unit)
}

/// True if an expression mentions the sentinel field.
pub fn mentions_sentinel(expr: &Expr) -> bool {
    expr.free_vars()
        .iter()
        .any(|var| var.name() == app::SENTINEL)
}

/// Bounds of the internal-state fields appearing in some expressions.
///
/// Fields are recognized by their source-level name.
///
/// ```rust
/// # use svshi_verif::{build_expr, explore::field_bounds_of};
/// let bounds = field_bounds_of(&[build_expr!((<= (time_weekday: int) 5))]);
/// let bounds: Vec<_> = bounds.iter().map(|e| e.to_string()).collect();
/// assert_eq!(bounds, vec!["time_weekday >= 1", "time_weekday <= 7"]);
/// assert!(field_bounds_of(&[build_expr!((GA_0_0_1: bool))]).is_empty());
/// ```
pub fn field_bounds_of(exprs: &[Expr]) -> Vec<Expr> {
    let mut res = vec![];
    let mut seen = Set::new();
    for expr in exprs {
        for var in expr.free_vars() {
            if let Some((min, max)) = date::field_bounds(var.name()) {
                if !seen.insert(var.clone()) {
                    continue;
                }
                let v = Expr::new_var(var);
                res.push(Expr::from((Op::Ge, vec![v.clone(), Expr::from(min)])));
                if let Some(max) = max {
                    res.push(Expr::from((Op::Le, vec![v, Expr::from(max)])));
                }
            }
        }
    }
    res
}

/// Constant-folds an expression when it has no free variables.
fn fold(expr: Expr) -> Expr {
    if expr.free_vars().is_empty() {
        expr.simplify()
    } else {
        expr
    }
}

/// A run of a function under a prefix of decisions.
struct Run<'r, 'a> {
    explorer: &'r mut Explorer<'a>,
    fun: &'r Fun,
    /// Decisions to replay.
    prefix: Vec<bool>,
    /// Decisions taken so far.
    decisions: Vec<bool>,
    /// Prefixes of the branches not taken.
    forks: Vec<Vec<bool>>,
    /// Path condition.
    guards: Vec<Expr>,
    locals: Map<String, Value>,
    records: Records,
    start: Instant,
    /// True if some feasibility query was inconclusive.
    unknown: bool,
}
impl<'r, 'a> Run<'r, 'a> {
    fn new(explorer: &'r mut Explorer<'a>, fun: &'r Fun, prefix: Vec<bool>) -> Self {
        Self {
            explorer,
            fun,
            prefix,
            decisions: vec![],
            forks: vec![],
            guards: vec![],
            locals: Map::new(),
            records: Records::default(),
            start: Instant::now(),
            unknown: false,
        }
    }

    fn exec(&mut self) -> Exec<Value> {
        self.init_records()?;
        let fun = self.fun;
        match self.exec_block(&fun.body)? {
            Flow::Next => Ok(Value::None),
            Flow::Return(val) => Ok(val),
        }
    }

    /// Creates the record parameters, every field starts symbolic.
    fn init_records(&mut self) -> Exec<()> {
        let module = self.explorer.module;
        for param in &self.fun.params {
            let mut fields = vec![];
            match param.kind {
                RecordKind::App => {
                    for (field, typ) in app::app_state_fields() {
                        let val = match typ {
                            Some(typ) => {
                                let key = Records::slot(param.kind, &param.name, &field);
                                Some(Expr::new_var(self.explorer.symbols.var(&key, &key, typ)?))
                            }
                            None => None,
                        };
                        fields.push(Field { name: field, val })
                    }
                }
                RecordKind::Physical => {
                    for (ga, typ) in &module.physical {
                        let var = self.explorer.symbols.var(ga, ga, *typ)?;
                        fields.push(Field {
                            name: ga.clone(),
                            val: Some(Expr::new_var(var)),
                        })
                    }
                }
                RecordKind::Internal => {
                    for field in app::internal_state_fields() {
                        let var = self.explorer.symbols.var(field, field, Typ::Int)?;
                        fields.push(Field {
                            name: field.into(),
                            val: Some(Expr::new_var(var)),
                        })
                    }
                }
            }
            let record = Record {
                kind: param.kind,
                fields,
            };
            if self.records.map.insert(param.name.clone(), record).is_some() {
                bail!("parameter `{}` appears twice", param.name)
            }
        }
        Ok(())
    }

    /// Name of the record parameter of some kind.
    fn record_of_kind(&self, kind: RecordKind, ctx: &str) -> Exec<String> {
        self.fun
            .params
            .iter()
            .find(|param| param.kind == kind)
            .map(|param| param.name.clone())
            .ok_or_else(|| {
                format!(
                    "{} requires a parameter of type `{}` in function `{}`",
                    ctx, kind, self.fun.name
                )
                .into()
            })
    }

    fn read_field(&self, rec: &str, field: &str) -> Exec<Expr> {
        let record = self
            .records
            .map
            .get(rec)
            .ok_or_else(|| format!("unknown record `{}`", rec))?;
        match record.field(field) {
            Some(Field { val: Some(val), .. }) => Ok(val.clone()),
            Some(Field { val: None, .. }) => bail!(
                "cannot read `{}.{}`, string fields are opaque to the verifier",
                rec,
                field
            ),
            None => bail!("record `{}` has no field `{}`", rec, field),
        }
    }

    fn write_field(&mut self, rec: &str, field: &str, val: Expr) -> Exec<()> {
        let record = self
            .records
            .map
            .get_mut(rec)
            .ok_or_else(|| format!("unknown record `{}`", rec))?;
        let slot = record
            .field_mut(field)
            .ok_or_else(|| format!("record `{}` has no field `{}`", rec, field))?;
        let typ = match &slot.val {
            Some(old) => old.typ(),
            None => bail!(
                "cannot write `{}.{}`, string fields are opaque to the verifier",
                rec,
                field
            ),
        };
        let val = match (typ, val.typ()) {
            (expected, got) if expected == got => val,
            (Typ::Real, Typ::Int) => fold(val.to_real()),
            (expected, got) => bail!(
                "cannot assign a value of type `{}` to `{}.{}` of type `{}`",
                got,
                rec,
                field,
                expected
            ),
        };
        slot.val = Some(val);
        Ok(())
    }

    /// Decides a branch on a boolean condition.
    fn branch(&mut self, cond: Expr) -> Exec<bool> {
        if let Some(b) = cond.simplify().as_bool() {
            return Ok(b);
        }
        if self.guards.contains(&cond) {
            return Ok(true);
        }
        let neg = cond.clone().not();
        if self.guards.contains(&neg) {
            return Ok(false);
        }
        if let Some(inner) = cond.as_negation() {
            if self.guards.contains(inner) {
                return Ok(false);
            }
        }

        let depth = self.decisions.len();
        let take = match self.prefix.get(depth) {
            Some(take) => *take,
            None => self.new_fork(&cond)?,
        };
        self.decisions.push(take);
        self.guards.push(if take { cond } else { neg });
        Ok(take)
    }

    /// Explores a new branch, `else` side first.
    fn new_fork(&mut self, cond: &Expr) -> Exec<bool> {
        if self.start.elapsed() > self.explorer.path_timeout {
            return Err(Halt::Timeout);
        }
        let (thn, els) = if mentions_sentinel(cond) {
            (true, true)
        } else {
            (self.feasible(cond.clone())?, self.feasible(cond.clone().not())?)
        };
        match (thn, els) {
            (true, true) => {
                let mut alt = self.decisions.clone();
                alt.push(true);
                self.forks.push(alt);
                Ok(false)
            }
            (true, false) => Ok(true),
            (false, true) => Ok(false),
            (false, false) => Err(Halt::Infeasible),
        }
    }

    /// Checks the current path condition and `extra` can hold together.
    ///
    /// Inconclusive answers count as feasible.
    fn feasible(&mut self, extra: Expr) -> Exec<bool> {
        let mut query: Vec<Expr> = self
            .guards
            .iter()
            .filter(|guard| !mentions_sentinel(guard))
            .cloned()
            .collect();
        query.push(extra);
        let bounds = field_bounds_of(&query);
        query.extend(bounds);
        match self.explorer.solver.check_conj(&query)? {
            Some(sat) => Ok(sat),
            None => {
                self.unknown = true;
                Ok(true)
            }
        }
    }

    /// Restricts the path to `cond`, drops it if `cond` cannot hold.
    fn assume(&mut self, cond: Expr) -> Exec<()> {
        match cond.simplify().as_bool() {
            Some(true) => return Ok(()),
            Some(false) => return Err(Halt::Infeasible),
            None => (),
        }
        if !self.feasible(cond.clone())? {
            return Err(Halt::Infeasible);
        }
        self.guards.push(cond);
        Ok(())
    }

    /// Python-style truthiness of a value, branches if symbolic.
    fn truth(&mut self, val: &Value) -> Exec<bool> {
        match val {
            Value::None => Ok(false),
            Value::Record(_) | Value::Date(_) => Ok(true),
            Value::Expr(e) => self.branch(e.clone().truthy()),
        }
    }

    fn exec_block(&mut self, block: &[Stmt]) -> Exec<Flow> {
        for stmt in block {
            if let Flow::Return(val) = self.exec_stmt(stmt)? {
                return Ok(Flow::Return(val));
            }
        }
        Ok(Flow::Next)
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Exec<Flow> {
        match stmt {
            Stmt::Let(name, e) | Stmt::Assign(name, e) => {
                if self.records.map.contains_key(name) {
                    bail!("cannot assign to record parameter `{}`", name)
                }
                let val = self.eval(e)?;
                let _ = self.locals.insert(name.clone(), val);
            }
            Stmt::FieldAssign { rec, field, value } => {
                let val = self.eval(value)?;
                let val = self.expr_of(val, &format!("assignment to `{}.{}`", rec, field))?;
                self.write_field(rec, field, val)?
            }
            Stmt::Expr(e) => {
                let _ = self.eval(e)?;
            }
            Stmt::If { branches, els } => {
                for (cnd, block) in branches {
                    let val = self.eval(cnd)?;
                    if self.truth(&val)? {
                        return self.exec_block(block);
                    }
                }
                if let Some(block) = els {
                    return self.exec_block(block);
                }
            }
            Stmt::Return(e) => {
                let val = match e {
                    Some(e) => self.eval(e)?,
                    None => Value::None,
                };
                return Ok(Flow::Return(val));
            }
            Stmt::Pass => (),
        }
        Ok(Flow::Next)
    }

    fn expr_of(&self, val: Value, ctx: &str) -> Exec<Expr> {
        match val {
            Value::Expr(e) => Ok(e),
            val => bail!("expected a value in {}, got `{}`", ctx, val),
        }
    }

    /// Evaluates some arguments, drops record arguments.
    fn value_args(&mut self, args: &[Arg], ctx: &str) -> Exec<Vec<Expr>> {
        let mut res = Vec::with_capacity(args.len());
        for arg in args {
            match self.eval(&arg.value)? {
                Value::Record(_) => (),
                val => res.push(self.expr_of(val, ctx)?),
            }
        }
        Ok(res)
    }

    fn app(&self, op: Op, args: Vec<Expr>) -> Exec<Expr> {
        Ok(fold(Expr::new_op(op, args)?))
    }

    fn eval(&mut self, expr: &app::Expr) -> Exec<Value> {
        let val = match &expr.kind {
            ExprKind::Cst(cst) => Value::Expr(Expr::new_cst(cst.clone())),
            ExprKind::None => Value::None,
            ExprKind::Ident(id) => {
                if let Some(val) = self.locals.get(id) {
                    val.clone()
                } else if self.records.map.contains_key(id) {
                    Value::Record(id.clone())
                } else {
                    bail!("unknown identifier `{}`", id)
                }
            }
            ExprKind::Field { base, field } => self.eval_field(base, field)?,
            ExprKind::Method { recv, method, args } => {
                let module = self.explorer.module;
                if recv == app::API {
                    self.api_call(method, args)?
                } else if let Some(device) = module.devices.get(recv) {
                    self.device_call(device, method, args)?
                } else {
                    bail!("unknown object `{}` in call to `{}`", recv, method)
                }
            }
            ExprKind::Call { fun, args } => self.call(fun, args)?,
            ExprKind::Not(e) => {
                let val = self.eval(e)?;
                Value::Expr(Expr::from(!self.truth(&val)?))
            }
            ExprKind::Neg(e) => {
                let val = self.eval(e)?;
                let e = self.expr_of(val, "negation")?;
                Value::Expr(self.app(Op::Sub, vec![e])?)
            }
            ExprKind::And(lft, rgt) => {
                let val = self.eval(lft)?;
                if self.truth(&val)? {
                    self.eval(rgt)?
                } else {
                    match val {
                        Value::Expr(e) if e.typ() == Typ::Bool => Value::Expr(false.into()),
                        val => val,
                    }
                }
            }
            ExprKind::Or(lft, rgt) => {
                let val = self.eval(lft)?;
                if self.truth(&val)? {
                    match val {
                        Value::Expr(e) if e.typ() == Typ::Bool => Value::Expr(true.into()),
                        val => val,
                    }
                } else {
                    self.eval(rgt)?
                }
            }
            ExprKind::Bin(op, lft, rgt) => {
                let lft = self.eval(lft)?;
                let lft = self.expr_of(lft, "arithmetic operation")?;
                let rgt = self.eval(rgt)?;
                let rgt = self.expr_of(rgt, "arithmetic operation")?;
                Value::Expr(self.arith(*op, lft, rgt)?)
            }
            ExprKind::Cmp(first, rest) => {
                let mut lft = self.eval(first)?;
                let mut res = Value::Expr(true.into());
                for (idx, (op, e)) in rest.iter().enumerate() {
                    let rgt = self.eval(e)?;
                    res = self.compare(*op, &lft, &rgt)?;
                    if idx + 1 < rest.len() && !self.truth(&res)? {
                        return Ok(Value::Expr(false.into()));
                    }
                    lft = rgt;
                }
                res
            }
        };
        Ok(val)
    }

    fn arith(&self, op: BinOp, lft: Expr, rgt: Expr) -> Exec<Expr> {
        match op {
            BinOp::Add => self.app(Op::Add, vec![lft, rgt]),
            BinOp::Sub => self.app(Op::Sub, vec![lft, rgt]),
            BinOp::Mul => self.app(Op::Mul, vec![lft, rgt]),
            BinOp::Div => self.app(Op::Div, vec![lft.to_real(), rgt.to_real()]),
            BinOp::IDiv if lft.typ() == Typ::Int && rgt.typ() == Typ::Int => {
                self.app(Op::IDiv, vec![lft, rgt])
            }
            BinOp::IDiv => {
                let div = self.app(Op::Div, vec![lft.to_real(), rgt.to_real()])?;
                let floor = self.app(Op::ToInt, vec![div])?;
                Ok(fold(floor.to_real()))
            }
            BinOp::Mod => self.app(Op::Mod, vec![lft, rgt]),
        }
    }

    fn compare(&self, op: CmpOp, lft: &Value, rgt: &Value) -> Exec<Value> {
        let (lft, rgt) = match (lft, rgt) {
            (Value::Expr(lft), Value::Expr(rgt)) => (lft.clone(), rgt.clone()),
            (lft, rgt) if op == CmpOp::Eq || op == CmpOp::Ne => {
                let eq = lft == rgt;
                return Ok(Value::Expr(Expr::from(if op == CmpOp::Eq { eq } else { !eq })));
            }
            (lft, rgt) => bail!("cannot compare `{}` and `{}`", lft, rgt),
        };
        let res = match op {
            CmpOp::Eq => self.app(Op::Eq, vec![lft, rgt])?,
            CmpOp::Ne => fold(self.app(Op::Eq, vec![lft, rgt])?.not()),
            CmpOp::Lt => self.app(Op::Lt, vec![lft, rgt])?,
            CmpOp::Le => self.app(Op::Le, vec![lft, rgt])?,
            CmpOp::Gt => self.app(Op::Gt, vec![lft, rgt])?,
            CmpOp::Ge => self.app(Op::Ge, vec![lft, rgt])?,
        };
        Ok(Value::Expr(res))
    }

    fn eval_field(&mut self, base: &str, field: &str) -> Exec<Value> {
        if self.records.map.contains_key(base) && !self.locals.contains_key(base) {
            return Ok(Value::Expr(self.read_field(base, field)?));
        }
        if base == app::ISOLATED_VALUES {
            let typ = self.explorer.module.isolated_typ(field).ok_or_else(|| {
                format!("unknown isolated function `{}`", field)
            })?;
            let key = format!("{}.{}", app::ISOLATED_VALUES, field);
            let var = self.explorer.symbols.var(key, field, typ)?;
            return Ok(Value::Expr(Expr::new_var(var)));
        }
        bail!("cannot access field `{}` of `{}`", field, base)
    }

    fn date_kind(&mut self, unit: TimeUnit, args: &[Arg]) -> Exec<Value> {
        let vals = self.value_args(args, unit.name())?;
        let value = match vals.as_slice() {
            [Expr::Cst(Cst::I(i))] => i
                .to_i64()
                .ok_or_else(|| format!("illegal value `{}` for `{}`", i, unit))?,
            _ => bail!("`{}` expects a single integer constant", unit),
        };
        Ok(Value::Date(DateKind::new(unit, value)?))
    }

    fn call(&mut self, fun: &str, args: &[Arg]) -> Exec<Value> {
        if let Some(unit) = TimeUnit::of_name(fun) {
            return self.date_kind(unit, args);
        }
        let ctx = format!("call to `{}`", fun);
        let mut vals = self.value_args(args, &ctx)?;
        let res = match (fun, vals.len()) {
            ("float", 1) => {
                let e = vals.remove(0);
                if !e.typ().is_arith() {
                    bail!("`float` expects an arithmetic argument, got `{}`", e.typ())
                }
                fold(e.to_real())
            }
            ("int", 1) => {
                let e = vals.remove(0);
                match e.typ() {
                    Typ::Int => e,
                    Typ::Real => self.app(Op::ToInt, vec![e])?,
                    typ => bail!("`int` expects an arithmetic argument, got `{}`", typ),
                }
            }
            ("abs", 1) => {
                let e = vals.remove(0);
                let zero = Expr::new_cst(e.typ().zero());
                let cnd = self.app(Op::Ge, vec![e.clone(), zero])?;
                let neg = self.app(Op::Sub, vec![e.clone()])?;
                self.app(Op::Ite, vec![cnd, e, neg])?
            }
            ("min", 2) | ("max", 2) => {
                let rgt = vals.remove(1);
                let lft = vals.remove(0);
                let op = if fun == "min" { Op::Le } else { Op::Ge };
                let cnd = self.app(op, vec![lft.clone(), rgt.clone()])?;
                self.app(Op::Ite, vec![cnd, lft, rgt])?
            }
            (fun, arity) => bail!("unknown function `{}` with {} argument(s)", fun, arity),
        };
        Ok(Value::Expr(res))
    }

    fn api_call(&mut self, method: &str, args: &[Arg]) -> Exec<Value> {
        if let Some(unit) = TimeUnit::of_name(method) {
            return self.date_kind(unit, args);
        }
        let ctx = format!("`{}.{}`", app::API, method);
        if let Some(unit) = getter_field(method) {
            let rec = self.record_of_kind(RecordKind::Internal, &ctx)?;
            return Ok(Value::Expr(self.read_field(&rec, unit.descr())?));
        }
        if let Some(unit) = setter_field(method) {
            let rec = self.record_of_kind(RecordKind::Internal, &ctx)?;
            let mut vals = self.value_args(args, &ctx)?;
            let val = match (vals.pop(), vals.is_empty()) {
                (Some(val), true) if val.typ() == Typ::Int => val,
                _ => bail!("{} expects a single integer argument", ctx),
            };
            if let Some((min, max)) = date::field_bounds(unit.descr()) {
                let mut conj = vec![self.app(Op::Le, vec![Expr::from(min), val.clone()])?];
                if let Some(max) = max {
                    conj.push(self.app(Op::Le, vec![val.clone(), Expr::from(max)])?);
                }
                self.assume(fold(Expr::conj(conj)))?;
            }
            self.write_field(&rec, unit.descr(), val)?;
            return Ok(Value::None);
        }
        match method {
            app::DUMMY_CHECK => {
                let rec = self.record_of_kind(RecordKind::Internal, &ctx)?;
                let vals = self.value_args(args, &ctx)?;
                let idx = match vals.as_slice() {
                    [idx @ Expr::Cst(Cst::I(_))] => idx.clone(),
                    _ => bail!("{} expects a single integer constant", ctx),
                };
                let sentinel = self.read_field(&rec, app::SENTINEL)?;
                Ok(Value::Expr(Expr::from((Op::Eq, vec![idx, sentinel]))))
            }
            app::CHECK_TIME_PROPERTY => bail!(
                "{} can only be used in invariants, and is replaced before exploration",
                ctx
            ),
            _ => bail!("unknown API function {}", ctx),
        }
    }

    fn device_call(&mut self, device: &Device, method: &str, args: &[Arg]) -> Exec<Value> {
        let ctx = format!("`{}.{}`", device.name, method);
        let rec = self.record_of_kind(RecordKind::Physical, &ctx)?;
        let mut vals = self.value_args(args, &ctx)?;
        let res = match (device.kind, method) {
            (DeviceKind::BinarySensor | DeviceKind::Switch, "is_on")
            | (
                DeviceKind::TemperatureSensor
                | DeviceKind::HumiditySensor
                | DeviceKind::Co2Sensor
                | DeviceKind::IntDevice
                | DeviceKind::FloatDevice,
                "read",
            ) => Value::Expr(self.read_field(&rec, &device.ga)?),
            (DeviceKind::Switch, "on") | (DeviceKind::Switch, "off") => {
                self.write_field(&rec, &device.ga, Expr::from(method == "on"))?;
                Value::None
            }
            (DeviceKind::IntDevice | DeviceKind::FloatDevice, "set") => {
                let val = match (vals.pop(), vals.is_empty()) {
                    (Some(val), true) => val,
                    _ => bail!("{} expects a single value argument", ctx),
                };
                self.write_field(&rec, &device.ga, val)?;
                Value::None
            }
            (kind, _) => bail!(
                "device `{}` of kind `{}` has no method `{}`",
                device.name,
                kind,
                method
            ),
        };
        Ok(res)
    }
}
