//! Provides a parser-equipped [`rsmt2::Solver`] working over [`Var`]s.

crate::prelude!();

use expr::{Cst, Expr, Var};
use parse::Parser;

/// SMT-LIB parser for idents, types and model values.
#[derive(Debug, Clone, Copy)]
pub struct SmtParser;

impl<'a> rsmt2::parse::IdentParser<String, Typ, &'a str> for SmtParser {
    fn parse_ident(self, input: &'a str) -> SmtRes<String> {
        Ok(input.trim().into())
    }
    fn parse_type(self, input: &'a str) -> SmtRes<Typ> {
        match input {
            "Bool" => Ok(Typ::Bool),
            "Int" => Ok(Typ::Int),
            "Real" => Ok(Typ::Real),
            _ => bail!("unexpected type string `{}`", input),
        }
    }
}
impl<'a, Br: std::io::BufRead>
    rsmt2::parse::ModelParser<String, Typ, Either<Cst, String>, &'a mut RSmtParser<Br>>
    for SmtParser
{
    fn parse_value(
        self,
        input: &'a mut RSmtParser<Br>,
        _: &String,
        _: &[(String, Typ)],
        _: &Typ,
    ) -> SmtRes<Either<Cst, String>> {
        let sexpr = input.get_sexpr()?;
        let mut parser = Parser::new(sexpr);
        if let Ok(Some(cst)) = parser.try_cst() {
            Ok(Either::Left(cst))
        } else {
            Ok(Either::Right(sexpr.into()))
        }
    }
}

/// A model: values of the variables the solver knows about, in declaration order.
pub type Model = Vec<(Var, Cst)>;

/// Result of a satisfiability query.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Satisfiable, with a model if one was requested.
    Sat(Model),
    /// Unsatisfiable.
    Unsat,
    /// Unknown or timeout.
    Unknown,
}

/// Wrapper for rsmt2's solver equipped with our parser.
///
/// Variables are declared lazily at top level, the first time an expression mentioning them is
/// checked. Queries are scoped: assertions are pushed, checked and popped.
pub struct Solver {
    solver: SmtSolver<SmtParser>,
    /// Declared variables, by solver-level symbol.
    declared: Map<String, Var>,
    /// Declaration order of the variables.
    order: Vec<String>,
}
impl Solver {
    /// Constructor.
    ///
    /// Splits `conf.z3_cmd` on whitespace, adds the per-condition timeout and tees the session to
    /// `<smt_log>/<session>.smt2` if logging is active.
    pub fn new(conf: &Conf, session: &str) -> Res<Self> {
        let mut split_cmd = conf.z3_cmd.split(|c: char| c.is_whitespace());
        let z3_cmd = split_cmd
            .next()
            .map(str::trim)
            .filter(|cmd| !cmd.is_empty())
            .ok_or_else(|| format!("illegal Z3 command `{}`", conf.z3_cmd))?;
        let mut smt_conf = SmtConf::z3(z3_cmd);

        for opt in split_cmd {
            let opt = opt.trim();
            if !opt.is_empty() {
                smt_conf.option(opt);
            }
        }
        smt_conf.option(format!("-t:{}", conf.condition_timeout_ms()));
        smt_conf.print_success();

        let mut solver = smt_conf
            .spawn(SmtParser)
            .chain_err(|| "while spawning z3 solver")?;
        if let Some(path) = conf.smt_log_of(session) {
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)
                    .chain_err(|| format!("while creating SMT log directory `{}`", dir.display()))?;
            }
            solver.path_tee(path)?
        }
        tracing::debug!("spawned solver session `{}`", session);
        Ok(Self {
            solver,
            declared: Map::new(),
            order: vec![],
        })
    }

    /// Declares the free variables of some expressions that are not declared yet.
    pub fn declare_vars<'e>(&mut self, exprs: impl IntoIterator<Item = &'e Expr>) -> Res<()> {
        for expr in exprs {
            for var in expr.free_vars() {
                let symbol = var.symbol();
                if self.declared.contains_key(&symbol) {
                    continue;
                }
                self.solver
                    .declare_const(symbol.as_str(), var.typ())
                    .chain_err(|| format!("while declaring variable `{}`", symbol))?;
                self.order.push(symbol.clone());
                let _ = self.declared.insert(symbol, var);
            }
        }
        Ok(())
    }

    /// Checks the satisfiability of a conjunction of expressions.
    ///
    /// Unknown and timeout answers yield `None`.
    pub fn check_conj<'e>(
        &mut self,
        exprs: impl IntoIterator<Item = &'e Expr> + Clone,
    ) -> Res<Option<bool>> {
        match self.query(exprs, false)? {
            Query::Sat(_) => Ok(Some(true)),
            Query::Unsat => Ok(Some(false)),
            Query::Unknown => Ok(None),
        }
    }

    /// Checks the satisfiability of a conjunction of expressions, retrieving a model if `sat`.
    pub fn check_model<'e>(&mut self, exprs: impl IntoIterator<Item = &'e Expr> + Clone) -> Res<Query> {
        self.query(exprs, true)
    }

    fn query<'e>(
        &mut self,
        exprs: impl IntoIterator<Item = &'e Expr> + Clone,
        want_model: bool,
    ) -> Res<Query> {
        self.declare_vars(exprs.clone())?;
        self.solver.push(1)?;
        let res = self.scoped_query(exprs, want_model);
        self.solver.pop(1)?;
        res
    }

    fn scoped_query<'e>(
        &mut self,
        exprs: impl IntoIterator<Item = &'e Expr>,
        want_model: bool,
    ) -> Res<Query> {
        for expr in exprs {
            self.solver
                .assert(expr)
                .chain_err(|| format!("while asserting `{}`", expr))?;
        }
        let sat = match self.solver.check_sat() {
            Ok(sat) => sat,
            Err(e) => {
                use rsmt2::errors::ErrorKind as EK;
                match e.kind() {
                    EK::Unknown | EK::Timeout => return Ok(Query::Unknown),
                    _ => return Err(e.into()),
                }
            }
        };
        if !sat {
            return Ok(Query::Unsat);
        }
        let model = if want_model {
            self.model()?
        } else {
            vec![]
        };
        Ok(Query::Sat(model))
    }

    /// Retrieves a model, the solver must have just answered `sat`.
    ///
    /// Values for symbols the solver made up (and functions) are ignored.
    fn model(&mut self) -> Res<Model> {
        let model = self
            .solver
            .get_model()
            .chain_err(|| "while retrieving model")?;
        let mut values = Map::new();
        for (symbol, args, typ, val) in model {
            match (self.declared.get(&symbol), val) {
                (Some(var), Either::Left(cst)) if args.is_empty() => {
                    let cst = if typ == Typ::Real { cst.to_real() } else { cst };
                    let _ = values.insert(symbol, (var.clone(), cst));
                }
                (_, val) => {
                    let val = val.map_left(|c| c.to_string()).into_inner();
                    tracing::debug!("ignoring model value `{}` for `{}`", val, symbol)
                }
            }
        }
        let mut res = Vec::with_capacity(values.len());
        for symbol in &self.order {
            if let Some(pair) = values.remove(symbol) {
                res.push(pair)
            }
        }
        Ok(res)
    }
}
impl Deref for Solver {
    type Target = SmtSolver<SmtParser>;
    fn deref(&self) -> &Self::Target {
        &self.solver
    }
}
impl DerefMut for Solver {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.solver
    }
}
