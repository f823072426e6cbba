//! App modules: bus declarations, devices, and the functions to verify.
//!
//! An app module is produced by [`parse::module`]. Expressions and statements keep their
//! [`Span`] so that the text of a `check_time_property` call can be recovered from the source.

crate::prelude!();

use date::TimeUnit;
use expr::Cst;
use parse::Span;

/// Name of the API object.
pub const API: &str = "svshi_api";
/// Name of the record holding the last values of isolated functions.
pub const ISOLATED_VALUES: &str = "isolated_fn_values";
/// Name of the temporal predicate in the API.
pub const CHECK_TIME_PROPERTY: &str = "check_time_property";
/// Name of the sentinel API method the rewriter substitutes for temporal predicates.
pub const DUMMY_CHECK: &str = "dummy_check";
/// Name of the sentinel field of the internal state.
pub const SENTINEL: &str = "c0";

/// Fields of app-state records, with their types.
///
/// `STR_*` fields are opaque and have no solver type.
///
/// ```rust
/// # use svshi_verif::{app::app_state_fields, expr::Typ};
/// let fields: Vec<_> = app_state_fields().collect();
/// assert_eq!(fields.len(), 16);
/// assert_eq!(fields[0], ("INT_0".to_string(), Some(Typ::Int)));
/// assert_eq!(fields[5], ("FLOAT_1".to_string(), Some(Typ::Real)));
/// assert_eq!(fields[15], ("STR_3".to_string(), None));
/// ```
pub fn app_state_fields() -> impl Iterator<Item = (String, Option<Typ>)> {
    let typed = [
        ("INT", Some(Typ::Int)),
        ("FLOAT", Some(Typ::Real)),
        ("BOOL", Some(Typ::Bool)),
        ("STR", None),
    ];
    typed
        .into_iter()
        .flat_map(|(pref, typ)| (0..4).map(move |idx| (format!("{}_{}", pref, idx), typ)))
}

/// Fields of the internal-state record, all integers.
pub fn internal_state_fields() -> impl Iterator<Item = &'static str> {
    TimeUnit::ALL
        .into_iter()
        .map(TimeUnit::descr)
        .chain(Some(SENTINEL))
}

/// Kinds of record parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordKind {
    /// An app-state record, `AppState`.
    App,
    /// The bus state, `PhysicalState`.
    Physical,
    /// The internal state, `InternalState`.
    Internal,
}
impl RecordKind {
    /// Record kind of a type name.
    pub fn of_type_name(name: &str) -> Option<Self> {
        match name {
            "AppState" => Some(Self::App),
            "PhysicalState" => Some(Self::Physical),
            "InternalState" => Some(Self::Internal),
            _ => None,
        }
    }
}
impl fmt::Display for RecordKind {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::App => write!(fmt, "AppState"),
            Self::Physical => write!(fmt, "PhysicalState"),
            Self::Internal => write!(fmt, "InternalState"),
        }
    }
}

/// Device kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeviceKind {
    /// Binary sensor, `is_on`.
    BinarySensor,
    /// Switch, `on`, `off` and `is_on`.
    Switch,
    /// Temperature sensor, `read`.
    TemperatureSensor,
    /// Humidity sensor, `read`.
    HumiditySensor,
    /// CO2 sensor, `read`.
    Co2Sensor,
    /// Integer actuator, `set` and `read`.
    IntDevice,
    /// Float actuator, `set` and `read`.
    FloatDevice,
}
impl DeviceKind {
    /// All device kinds.
    pub const ALL: [Self; 7] = [
        Self::BinarySensor,
        Self::Switch,
        Self::TemperatureSensor,
        Self::HumiditySensor,
        Self::Co2Sensor,
        Self::IntDevice,
        Self::FloatDevice,
    ];

    /// Name of the kind in app modules.
    pub fn name(self) -> &'static str {
        match self {
            Self::BinarySensor => "binary_sensor",
            Self::Switch => "switch",
            Self::TemperatureSensor => "temperature_sensor",
            Self::HumiditySensor => "humidity_sensor",
            Self::Co2Sensor => "co2_sensor",
            Self::IntDevice => "int_device",
            Self::FloatDevice => "float_device",
        }
    }
    /// Kind from its name.
    pub fn of_name(name: &str) -> Option<Self> {
        Self::ALL.iter().cloned().find(|kind| kind.name() == name)
    }

    /// Type of the group address the device is bound to.
    pub fn ga_typ(self) -> Typ {
        match self {
            Self::BinarySensor | Self::Switch => Typ::Bool,
            Self::TemperatureSensor | Self::HumiditySensor | Self::Co2Sensor | Self::FloatDevice => {
                Typ::Real
            }
            Self::IntDevice => Typ::Int,
        }
    }
}
impl fmt::Display for DeviceKind {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        self.name().fmt(fmt)
    }
}

/// A device instance bound to a group address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Instance name.
    pub name: String,
    /// Kind.
    pub kind: DeviceKind,
    /// Group address, `GA_a_b_c`.
    pub ga: String,
}

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `//`
    IDiv,
    /// `%`
    Mod,
}
/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

/// A call argument, positional or named.
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    /// Name of the argument, for `name = value` arguments.
    pub name: Option<String>,
    /// Value.
    pub value: Expr,
}

/// Expression kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// A constant.
    Cst(Cst),
    /// `None`.
    None,
    /// An identifier: local variable or record.
    Ident(String),
    /// Field read, `base.field`.
    Field {
        /// Record or object name.
        base: String,
        /// Field name.
        field: String,
    },
    /// Method call `recv.method(args)`, on a device or `svshi_api`.
    Method {
        /// Receiver name.
        recv: String,
        /// Method name.
        method: String,
        /// Arguments.
        args: Vec<Arg>,
    },
    /// Function call: `float(e)`, `int(e)`, `Hour(10)`...
    Call {
        /// Function name.
        fun: String,
        /// Arguments.
        args: Vec<Arg>,
    },
    /// Negation.
    Not(Box<Expr>),
    /// Unary minus.
    Neg(Box<Expr>),
    /// Short-circuit conjunction.
    And(Box<Expr>, Box<Expr>),
    /// Short-circuit disjunction.
    Or(Box<Expr>, Box<Expr>),
    /// Arithmetic.
    Bin(BinOp, Box<Expr>, Box<Expr>),
    /// Comparison chain `e_0 op_1 e_1 op_2 e_2 ...`.
    Cmp(Box<Expr>, Vec<(CmpOp, Expr)>),
}

/// An expression with its span.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    /// Actual expression.
    pub kind: ExprKind,
    /// Position in the source.
    pub span: Span,
}
impl Expr {
    /// Constructor.
    pub fn new(kind: ExprKind, span: impl Into<Span>) -> Self {
        Self {
            kind,
            span: span.into(),
        }
    }

    /// True if the expression is a call to the temporal predicate.
    pub fn is_check_time_property(&self) -> bool {
        matches!(
            &self.kind,
            ExprKind::Method { recv, method, .. } if recv == API && method == CHECK_TIME_PROPERTY
        )
    }

    /// Applies `f` to every sub-expression, post-order.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Expr)) {
        match &self.kind {
            ExprKind::Cst(_) | ExprKind::None | ExprKind::Ident(_) | ExprKind::Field { .. } => (),
            ExprKind::Method { args, .. } | ExprKind::Call { args, .. } => {
                for arg in args {
                    arg.value.visit(f)
                }
            }
            ExprKind::Not(e) | ExprKind::Neg(e) => e.visit(f),
            ExprKind::And(lft, rgt) | ExprKind::Or(lft, rgt) | ExprKind::Bin(_, lft, rgt) => {
                lft.visit(f);
                rgt.visit(f)
            }
            ExprKind::Cmp(first, rest) => {
                first.visit(f);
                for (_, e) in rest {
                    e.visit(f)
                }
            }
        }
        f(self)
    }

    /// Rebuilds the expression bottom-up, `f` yields a replacement for a node whose children
    /// have already been rebuilt.
    pub fn rebuild(self, f: &mut impl FnMut(Expr) -> Res<Expr>) -> Res<Expr> {
        let Expr { kind, span } = self;
        let kind = match kind {
            kind @ (ExprKind::Cst(_) | ExprKind::None | ExprKind::Ident(_) | ExprKind::Field { .. }) => {
                kind
            }
            ExprKind::Method { recv, method, args } => ExprKind::Method {
                recv,
                method,
                args: Arg::rebuild_all(args, f)?,
            },
            ExprKind::Call { fun, args } => ExprKind::Call {
                fun,
                args: Arg::rebuild_all(args, f)?,
            },
            ExprKind::Not(e) => ExprKind::Not(Box::new(e.rebuild(f)?)),
            ExprKind::Neg(e) => ExprKind::Neg(Box::new(e.rebuild(f)?)),
            ExprKind::And(lft, rgt) => {
                ExprKind::And(Box::new(lft.rebuild(f)?), Box::new(rgt.rebuild(f)?))
            }
            ExprKind::Or(lft, rgt) => {
                ExprKind::Or(Box::new(lft.rebuild(f)?), Box::new(rgt.rebuild(f)?))
            }
            ExprKind::Bin(op, lft, rgt) => {
                ExprKind::Bin(op, Box::new(lft.rebuild(f)?), Box::new(rgt.rebuild(f)?))
            }
            ExprKind::Cmp(first, rest) => {
                let first = Box::new(first.rebuild(f)?);
                let mut new_rest = Vec::with_capacity(rest.len());
                for (op, e) in rest {
                    new_rest.push((op, e.rebuild(f)?))
                }
                ExprKind::Cmp(first, new_rest)
            }
        };
        f(Expr { kind, span })
    }
}
impl Arg {
    fn rebuild_all(args: Vec<Arg>, f: &mut impl FnMut(Expr) -> Res<Expr>) -> Res<Vec<Arg>> {
        args.into_iter()
            .map(|Arg { name, value }| value.rebuild(f).map(|value| Arg { name, value }))
            .collect()
    }
}

/// Statements.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `let x = e;`
    Let(String, Expr),
    /// `x = e;`
    Assign(String, Expr),
    /// `rec.field = e;`
    FieldAssign {
        /// Record.
        rec: String,
        /// Field.
        field: String,
        /// Value.
        value: Expr,
    },
    /// Expression statement.
    Expr(Expr),
    /// Conditional, `if` and `else if` branches plus an optional `else`.
    If {
        /// Conditions and their blocks.
        branches: Vec<(Expr, Block)>,
        /// Else block.
        els: Option<Block>,
    },
    /// `return e;` or `return;`
    Return(Option<Expr>),
    /// `pass;`
    Pass,
}
impl Stmt {
    /// Rebuilds all the expressions of a statement.
    pub fn rebuild_exprs(self, f: &mut impl FnMut(Expr) -> Res<Expr>) -> Res<Self> {
        let stmt = match self {
            Self::Let(name, e) => Self::Let(name, e.rebuild(f)?),
            Self::Assign(name, e) => Self::Assign(name, e.rebuild(f)?),
            Self::FieldAssign { rec, field, value } => Self::FieldAssign {
                rec,
                field,
                value: value.rebuild(f)?,
            },
            Self::Expr(e) => Self::Expr(e.rebuild(f)?),
            Self::If { branches, els } => {
                let mut new_branches = Vec::with_capacity(branches.len());
                for (cnd, block) in branches {
                    let cnd = cnd.rebuild(f)?;
                    new_branches.push((cnd, rebuild_block(block, f)?))
                }
                let els = match els {
                    Some(block) => Some(rebuild_block(block, f)?),
                    None => None,
                };
                Self::If {
                    branches: new_branches,
                    els,
                }
            }
            Self::Return(Some(e)) => Self::Return(Some(e.rebuild(f)?)),
            stmt @ (Self::Return(None) | Self::Pass) => stmt,
        };
        Ok(stmt)
    }
}

/// A block of statements.
pub type Block = Vec<Stmt>;

/// Rebuilds all the expressions of a block, in source order.
pub fn rebuild_block(block: Block, f: &mut impl FnMut(Expr) -> Res<Expr>) -> Res<Block> {
    block.into_iter().map(|stmt| stmt.rebuild_exprs(f)).collect()
}

/// A record parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Name, the record name.
    pub name: String,
    /// Kind of record.
    pub kind: RecordKind,
}

/// A function.
#[derive(Debug, Clone, PartialEq)]
pub struct Fun {
    /// Name.
    pub name: String,
    /// Parameters.
    pub params: Vec<Param>,
    /// Return type, if any.
    pub ret: Option<Typ>,
    /// Body.
    pub body: Block,
}
impl Fun {
    /// Names of the app-state parameters.
    pub fn app_params(&self) -> impl Iterator<Item = &str> {
        self.params
            .iter()
            .filter(|param| param.kind == RecordKind::App)
            .map(|param| param.name.as_str())
    }
    /// Parameter of some name.
    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|param| param.name == name)
    }
}

/// An app module.
#[derive(Debug, Clone)]
pub struct Module {
    /// Source text.
    pub src: String,
    /// Group addresses and their types, in declaration order.
    pub physical: Vec<(String, Typ)>,
    /// Devices.
    pub devices: Map<String, Device>,
    /// Isolated functions and the type of their last value.
    pub isolated: Vec<(String, Typ)>,
    /// Functions, in declaration order.
    pub funs: Vec<Fun>,
}
impl Module {
    /// Function of some name.
    pub fn fun(&self, name: &str) -> Option<&Fun> {
        self.funs.iter().find(|fun| fun.name == name)
    }
    /// Type of a group address.
    pub fn ga_typ(&self, ga: &str) -> Option<Typ> {
        self.physical
            .iter()
            .find(|(name, _)| name == ga)
            .map(|(_, typ)| *typ)
    }
    /// Type of the last value of an isolated function.
    pub fn isolated_typ(&self, name: &str) -> Option<Typ> {
        self.isolated
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, typ)| *typ)
    }
    /// Source text of a span.
    pub fn text_of(&self, span: Span) -> &str {
        self.src.get(span.start..span.end).unwrap_or("")
    }

    /// Checks devices are bound to declared group addresses of the right type.
    pub fn check_devices(&self) -> Res<()> {
        for device in self.devices.values() {
            match self.ga_typ(&device.ga) {
                None => bail!(
                    "device `{}` is bound to undeclared group address `{}`",
                    device.name,
                    device.ga,
                ),
                Some(typ) if typ != device.kind.ga_typ() => bail!(
                    "device `{}` of kind `{}` needs a `{}` group address, but `{}` has type `{}`",
                    device.name,
                    device.kind,
                    device.kind.ga_typ(),
                    device.ga,
                    typ,
                ),
                Some(_) => (),
            }
        }
        Ok(())
    }
}
