//! Temporal-predicate encoder tests.

use crate::prelude::{encode::*, *};

use date::{DateKind, TimeUnit};
use expr::{Expr, Quantifier};
use solver::Solver;

fn kind(unit: TimeUnit, value: i64) -> DateKind {
    DateKind::new(unit, value).expect("legal date kind")
}

/// Existential slices of an encoding, in order.
fn slices(phi: &Expr) -> Vec<&Expr> {
    fn collect<'e>(e: &'e Expr, res: &mut Vec<&'e Expr>) {
        match e {
            Expr::Quant {
                quant: Quantifier::Exists,
                ..
            } => res.push(e),
            Expr::App { args, .. } => {
                for arg in args {
                    collect(arg, res)
                }
            }
            _ => (),
        }
    }
    let body = match phi {
        Expr::Quant {
            quant: Quantifier::Forall,
            body,
            ..
        } => body,
        _ => panic!("expected a universal quantifier, got `{}`", phi),
    };
    let mut res = vec![];
    collect(body, &mut res);
    res
}

#[test]
fn shape() {
    let cond = build_expr!((GA_0_0_2: bool));
    let phi = check(kind(TimeUnit::Day, 1), kind(TimeUnit::Hour, 10), cond).unwrap();
    println!("{}", phi);
    match &phi {
        Expr::Quant { vars, .. } => {
            let names: Vec<_> = vars.iter().map(|var| var.name()).collect();
            assert_eq!(
                names,
                vec![
                    "GA_0_0_2",
                    "time_min",
                    "time_hour",
                    "time_day",
                    "time_weekday",
                    "time_month",
                    "time_year"
                ]
            )
        }
        _ => panic!("expected a quantifier"),
    }
    assert_eq!(slices(&phi).len(), 1);

    // Hours by slices of 6: four periods.
    let cond = build_expr!((>= (GA_0_0_4: real) 60));
    let phi = check(kind(TimeUnit::Hour, 6), kind(TimeUnit::Minute, 30), cond).unwrap();
    let periods = slices(&phi);
    assert_eq!(periods.len(), 4);
    let last = periods[3].to_string();
    println!("{}", last);
    assert!(last.starts_with("Exists([t, time_hour], "));
    assert!(last.contains("18 <= time_hour, time_hour <= 23"));

    // The last period is clipped.
    let phi = check(kind(TimeUnit::Month, 5), kind(TimeUnit::Day, 1), build_expr!(true)).unwrap();
    let periods = slices(&phi);
    assert_eq!(periods.len(), 3);
    assert!(periods[2].to_string().contains("11 <= time_month, time_month <= 12"));

    // Frequencies larger than their unit collapse to one period.
    let phi = check(kind(TimeUnit::Day, 10), kind(TimeUnit::Hour, 2), build_expr!(true)).unwrap();
    let periods = slices(&phi);
    assert_eq!(periods.len(), 1);
    assert!(periods[0].to_string().contains("1 <= time_day, time_day <= 7"));
}

#[test]
fn reuses_time_vars() {
    let hour = expr::Var::new_symbolic("time_hour", 7, Typ::Int);
    let cond = Expr::new_op(
        expr::Op::Ge,
        vec![Expr::new_var(hour.clone()), Expr::from(10)],
    )
    .unwrap();
    let phi = check(kind(TimeUnit::Day, 1), kind(TimeUnit::Hour, 1), cond).unwrap();
    let bound: Vec<_> = match &phi {
        Expr::Quant { vars, .. } => vars.clone(),
        _ => panic!("expected a quantifier"),
    };
    assert_eq!(bound[0], hour);
    assert_eq!(
        bound
            .iter()
            .filter(|var| var.name() == "time_hour")
            .count(),
        1
    );
    assert!(phi.free_vars().is_empty());
}

#[test]
fn illegal() {
    let err = check(kind(TimeUnit::Day, 1), kind(TimeUnit::Hour, 30), build_expr!(true)).unwrap_err();
    println!("{}", err);
    assert!(err.to_string().contains("`Hour(30)` exceeds the range of `Hour` values"));

    let err = check(kind(TimeUnit::Year, 2), kind(TimeUnit::Hour, 1), build_expr!(true)).unwrap_err();
    assert!(err.to_string().contains("values are unbounded"));

    // Year durations have no upper offset.
    let phi = check(kind(TimeUnit::Day, 1), kind(TimeUnit::Year, 3), build_expr!(true)).unwrap();
    assert!(phi.to_string().contains("And(t >= 0, ForAll([time_year]"));
}

fn solver() -> Solver {
    Solver::new(&Conf::new(), "encode").expect("could not spawn z3, is it on the PATH?")
}

#[test]
#[ignore = "spawns z3, run with --ignored"]
fn trivial_conditions() {
    let mut solver = solver();
    for (freq, dur) in [
        (kind(TimeUnit::Day, 1), kind(TimeUnit::Hour, 10)),
        (kind(TimeUnit::Hour, 1), kind(TimeUnit::Minute, 5)),
        (kind(TimeUnit::Month, 1), kind(TimeUnit::Day, 2)),
    ] {
        let valid = check(freq, dur, build_expr!(true)).unwrap();
        println!("valid: {}", valid);
        assert_eq!(solver.check_conj(&[valid.not()]).unwrap(), Some(false));

        let unsat = check(freq, dur, build_expr!(false)).unwrap();
        println!("unsat: {}", unsat);
        assert_eq!(solver.check_conj(&[unsat]).unwrap(), Some(false));
    }
}

#[test]
#[ignore = "spawns z3, run with --ignored"]
fn hour_window() {
    let mut solver = solver();
    // Ten consecutive hours after 10 fit in a day.
    let cond = build_expr!((>= (time_hour: int) 10));
    let phi = check(kind(TimeUnit::Day, 1), kind(TimeUnit::Hour, 10), cond).unwrap();
    assert_eq!(solver.check_conj(&[phi.not()]).unwrap(), Some(false));

    // Twenty do not.
    let cond = build_expr!((>= (time_hour: int) 10));
    let phi = check(kind(TimeUnit::Day, 1), kind(TimeUnit::Hour, 20), cond).unwrap();
    assert_eq!(solver.check_conj(&[phi]).unwrap(), Some(false));
}
