//! Verification configuration.

crate::prelude!();

/// Verification configuration.
///
/// # Examples
///
/// ```rust
/// # use svshi_verif::conf::Conf;
/// let conf = Conf::new()
///     .z3_cmd("z3 -T:60")
///     .per_condition_timeout(5.0)
///     .smt_log(Some("smt_logs".into()));
/// assert_eq!(conf.z3_cmd, "z3 -T:60");
/// assert_eq!(conf.per_path_timeout, 30.0);
/// assert_eq!(conf.condition_timeout_ms(), 5000);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Conf {
    /// Z3 command, the first whitespace-separated token is the command, the rest are options.
    pub z3_cmd: String,
    /// Wall-clock budget of one symbolic run, in seconds.
    pub per_path_timeout: f64,
    /// Solver timeout of one branch-feasibility query, in seconds.
    pub per_condition_timeout: f64,
    /// Directory where solver sessions tee their SMT-LIB scripts.
    pub smt_log: Option<PathBuf>,
}
impl Default for Conf {
    fn default() -> Self {
        Self {
            z3_cmd: "z3".into(),
            per_path_timeout: 30.0,
            per_condition_timeout: 30.0,
            smt_log: None,
        }
    }
}
impl Conf {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the z3 command.
    pub fn z3_cmd(mut self, cmd: impl Into<String>) -> Self {
        self.z3_cmd = cmd.into();
        self
    }
    /// Sets the per-path timeout, in seconds.
    pub fn per_path_timeout(mut self, secs: f64) -> Self {
        self.per_path_timeout = secs;
        self
    }
    /// Sets the per-condition timeout, in seconds.
    pub fn per_condition_timeout(mut self, secs: f64) -> Self {
        self.per_condition_timeout = secs;
        self
    }
    /// Sets the SMT log directory.
    pub fn smt_log(mut self, dir: Option<PathBuf>) -> Self {
        self.smt_log = dir;
        self
    }

    /// Per-path timeout as a duration, saturates on illegal values.
    pub fn path_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.per_path_timeout).unwrap_or(Duration::MAX)
    }
    /// Per-condition timeout in milliseconds, as z3 expects it.
    pub fn condition_timeout_ms(&self) -> u64 {
        (self.per_condition_timeout * 1000.0).max(1.0) as u64
    }

    /// Path of the SMT log of a session, if logging is active.
    pub fn smt_log_of(&self, session: &str) -> Option<PathBuf> {
        self.smt_log.as_ref().map(|dir| dir.join(format!("{}.smt2", session)))
    }
}
