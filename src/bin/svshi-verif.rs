//! Verifies the invariants of an SVSHI app module against its `system_behaviour` function.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use svshi_verif::{
    conf::Conf,
    parse,
    prelude::{PathBuf, Res},
    verify::{Driver, Verdict},
};

/// Exit code of failed invariants.
const UNSAT_CODE: i32 = -1;
/// Exit code of errors.
const ERROR_CODE: i32 = 2;

#[derive(Debug, Parser)]
#[command(
    name = "svshi-verif",
    version,
    about = "Checks that an app's iteration preserves its (temporal) invariants"
)]
struct Cli {
    /// App module to verify.
    file: PathBuf,

    /// Solver timeout of one branch-feasibility query, in seconds.
    #[arg(
        short = 'c',
        long = "per_condition_timeout",
        visible_alias = "cto",
        default_value_t = 30.0
    )]
    per_condition_timeout: f64,

    /// Wall-clock budget of one symbolic run, in seconds.
    #[arg(
        short = 'p',
        long = "per_path_timeout",
        visible_alias = "pto",
        default_value_t = 30.0
    )]
    per_path_timeout: f64,

    /// Z3 command, can carry options (`"z3 -T:60"`).
    #[arg(long = "z3_cmd", default_value = "z3")]
    z3_cmd: String,

    /// Directory where solver sessions are logged as SMT-LIB scripts.
    #[arg(long = "smt_log")]
    smt_log: Option<PathBuf>,
}
impl Cli {
    fn conf(&self) -> Conf {
        Conf::new()
            .z3_cmd(self.z3_cmd.clone())
            .per_condition_timeout(self.per_condition_timeout)
            .per_path_timeout(self.per_path_timeout)
            .smt_log(self.smt_log.clone())
    }
}

/// Lines reported for some verdicts, stops at the first invariant that is not preserved.
///
/// The flag is false if some invariant is not preserved.
fn report(verdicts: Vec<Verdict>) -> (Vec<String>, bool) {
    let mut lines = Vec::with_capacity(verdicts.len());
    for verdict in verdicts {
        lines.push(verdict.to_string().trim_end().to_string());
        if let Verdict::Failed { invariant, .. } = verdict {
            tracing::error!("invariant `{}` is not preserved", invariant);
            return (lines, false);
        }
    }
    (lines, true)
}

/// Runs the driver, yields `false` on the first invariant that is not preserved.
fn run(cli: &Cli) -> Res<bool> {
    let txt = std::fs::read_to_string(&cli.file)
        .map_err(|e| format!("failed to read `{}`: {}", cli.file.display(), e))?;
    let module = parse::module(&txt)?;
    tracing::info!(
        "verifying {} functions from `{}`",
        module.funs.len(),
        cli.file.display()
    );
    let driver = Driver::new(&module, cli.conf());
    let (lines, ok) = report(driver.run()?);
    for line in lines {
        println!("{}", line)
    }
    Ok(ok)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(true) => (),
        Ok(false) => std::process::exit(UNSAT_CODE),
        Err(e) => {
            eprintln!("|===| Error(s):");
            eprintln!("{}", e.pretty());
            eprintln!("|===|");
            std::process::exit(ERROR_CODE)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn failed_verdict_line() {
        let verdicts = vec![
            Verdict::Confirmed("first_invariant".into()),
            Verdict::Failed {
                invariant: "boiler_invariant".into(),
                msg: "counterexample [time_hour = 22] for condition: x\n".into(),
            },
            Verdict::Confirmed("last_invariant".into()),
        ];
        let (lines, ok) = report(verdicts);
        assert!(!ok);
        assert_eq!(
            lines,
            vec![
                "CONFIRMED for invariant: first_invariant",
                "ERROR: unsat for invariant boiler_invariant \
                counterexample [time_hour = 22] for condition: x",
            ]
        );

        let (lines, ok) = report(vec![Verdict::Confirmed("first_invariant".into())]);
        assert!(ok);
        assert_eq!(lines, vec!["CONFIRMED for invariant: first_invariant"]);
    }
}
