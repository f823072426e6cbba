//! Date kinds: calendar units, their bounds, and the time variables they range over.

crate::prelude!();

use expr::{Expr, Op, Var};

/// Calendar units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeUnit {
    /// Minute in the hour.
    Minute,
    /// Hour of the day.
    Hour,
    /// Day, in the week sense.
    Day,
    /// Week of the month.
    Week,
    /// Month of the year.
    Month,
    /// Year, no upper bound.
    Year,
}
impl TimeUnit {
    /// All units, in the order of the internal-state record.
    pub const ALL: [Self; 6] = [
        Self::Minute,
        Self::Hour,
        Self::Day,
        Self::Week,
        Self::Month,
        Self::Year,
    ];

    /// Bounded units, in the order the date constraint lists them.
    const BOUNDS_ORDER: [Self; 6] = [
        Self::Day,
        Self::Hour,
        Self::Week,
        Self::Month,
        Self::Minute,
        Self::Year,
    ];

    /// Name of the internal-state variable for this unit.
    ///
    /// ```rust
    /// # use svshi_verif::date::TimeUnit;
    /// assert_eq!(TimeUnit::Day.descr(), "time_day");
    /// assert_eq!(TimeUnit::Week.descr(), "time_weekday");
    /// ```
    pub fn descr(self) -> &'static str {
        match self {
            Self::Minute => "time_min",
            Self::Hour => "time_hour",
            Self::Day => "time_day",
            Self::Week => "time_weekday",
            Self::Month => "time_month",
            Self::Year => "time_year",
        }
    }

    /// Lower bound.
    pub fn min(self) -> i64 {
        match self {
            Self::Minute | Self::Hour | Self::Year => 0,
            Self::Day | Self::Week | Self::Month => 1,
        }
    }
    /// Upper bound, `None` for years.
    pub fn max(self) -> Option<i64> {
        match self {
            Self::Minute => Some(59),
            Self::Hour => Some(23),
            Self::Day => Some(7),
            Self::Week => Some(4),
            Self::Month => Some(12),
            Self::Year => None,
        }
    }
    /// Number of values in the unit's range, `None` for years.
    pub fn span(self) -> Option<i64> {
        self.max().map(|max| max - self.min() + 1)
    }

    /// Constructor name, as written in app modules.
    pub fn name(self) -> &'static str {
        match self {
            Self::Minute => "Minute",
            Self::Hour => "Hour",
            Self::Day => "Day",
            Self::Week => "Week",
            Self::Month => "Month",
            Self::Year => "Year",
        }
    }
    /// Unit from its constructor name.
    pub fn of_name(name: &str) -> Option<Self> {
        Self::ALL.iter().cloned().find(|unit| unit.name() == name)
    }
    /// Unit from the name of its internal-state variable.
    pub fn of_descr(descr: &str) -> Option<Self> {
        Self::ALL.iter().cloned().find(|unit| unit.descr() == descr)
    }

    /// Bound constraints of the unit over some variable: `var >= min` and `var <= max`.
    pub fn bounds_of(self, var: &Var) -> Vec<Expr> {
        let var = Expr::new_var(var.clone());
        let mut res = vec![Expr::from((Op::Ge, vec![var.clone(), Expr::from(self.min())]))];
        if let Some(max) = self.max() {
            res.push(Expr::from((Op::Le, vec![var, Expr::from(max)])))
        }
        res
    }
}
impl fmt::Display for TimeUnit {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        self.name().fmt(fmt)
    }
}

/// A quantity of some time unit, used as a frequency or a duration.
///
/// # Examples
///
/// ```rust
/// # use svshi_verif::date::{DateKind, TimeUnit};
/// let hours = DateKind::new(TimeUnit::Hour, 10).unwrap();
/// assert_eq!(hours.to_string(), "Hour(10)");
/// assert_eq!(hours.min(), 0);
/// assert_eq!(hours.max(), Some(23));
/// assert_eq!(hours.descr(), "time_hour");
///
/// let err = DateKind::new(TimeUnit::Day, 0).unwrap_err();
/// assert_eq!(err.to_string(), "illegal value `0` for `Day`, time must be positive");
/// ```
#[readonly::make]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateKind {
    /// Time unit.
    pub unit: TimeUnit,
    /// Quantity.
    pub value: i64,
}
impl DateKind {
    /// Constructor, fails on non-positive values.
    pub fn new(unit: TimeUnit, value: i64) -> Res<Self> {
        if value < 1 {
            bail!(
                "illegal value `{}` for `{}`, time must be positive",
                value,
                unit
            )
        }
        Ok(Self { unit, value })
    }

    /// Lower bound of the unit.
    pub fn min(&self) -> i64 {
        self.unit.min()
    }
    /// Upper bound of the unit.
    pub fn max(&self) -> Option<i64> {
        self.unit.max()
    }
    /// Name of the internal-state variable of the unit.
    pub fn descr(&self) -> &'static str {
        self.unit.descr()
    }

    /// Checks the value fits in the unit's range, for durations.
    pub fn check_fits(&self) -> Res<()> {
        if let Some(span) = self.unit.span() {
            if self.value > span {
                bail!(
                    "`{}` exceeds the range of `{}` values ({} to {})",
                    self,
                    self.unit,
                    self.min(),
                    self.max().unwrap_or(self.min() + span - 1),
                )
            }
        }
        Ok(())
    }
}
impl fmt::Display for DateKind {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}({})", self.unit, self.value)
    }
}

/// Conjunction of the bounds of all units, given a variable for each unit.
///
/// Conjuncts are ordered day, hour, week, month, minute, year.
pub fn bounds(var_of: impl Fn(TimeUnit) -> Var) -> Expr {
    let mut conj = vec![];
    for unit in TimeUnit::BOUNDS_ORDER {
        conj.extend(unit.bounds_of(&var_of(unit)))
    }
    Expr::and(conj)
}

/// Bounds of the internal-state fields, as assumed by the symbolic explorer.
///
/// These are the record invariants of the internal state, `time_day` being a day of the month
/// there. Returns `None` for fields without bounds (`c0`).
pub fn field_bounds(field: &str) -> Option<(i64, Option<i64>)> {
    let bounds = match field {
        "time_min" => (0, Some(59)),
        "time_hour" => (0, Some(23)),
        "time_day" => (1, Some(31)),
        "time_weekday" => (1, Some(7)),
        "time_month" => (1, Some(12)),
        "time_year" => (0, None),
        _ => return None,
    };
    Some(bounds)
}
