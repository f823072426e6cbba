//! Common imports throughout this project.

pub use std::{
    collections::{BTreeMap as Map, BTreeSet as Set},
    fmt,
    io::Write,
    ops::{Deref, DerefMut},
    path::PathBuf,
    time::{Duration, Instant},
};

pub use either::Either;
pub use error_chain::bail;
pub use num::{bigint::Sign, BigInt as Int, BigRational as Rat, One, Signed, ToPrimitive, Zero};
pub use rsmt2::{
    parse::SmtParser as RSmtParser, SmtConf, SmtRes, Solver as SmtSolver,
};

pub use crate::{
    app, build_expr, build_typ, compose, conf,
    conf::Conf,
    date, encode,
    err::{ChainExt, Error, ErrorChain, PError, PRes, Res},
    explore, expr,
    expr::{HasTyp, Typ},
    parse, rewrite, solver, verify,
};
