//! Verifier tests.
//!
//! Most of these tests spawn `z3` from `PATH`, they are ignored by default. Run them with
//! `cargo test -- --ignored`.

use crate::prelude::{verify::*, *};

use compose::CdtDict;
use solver::Solver;

const FUNCTIONS: &str = include_str!("../../rsc/functions.svshi");
const BOILER: &str = include_str!("../../rsc/boiler.svshi");

/// Lights on every day of the week, the weekday bounds exclude the implicit `else` branch.
const WEEKDAYS: &str = "\
physical_state {
    GA_0_0_2: bool,
}
devices {
    light: switch(GA_0_0_2),
}

fn weekday_light(physical_state: PhysicalState, internal_state: InternalState) {
    if svshi_api.get_day_of_week(internal_state) <= 5 {
        light.on(physical_state);
    } else if svshi_api.get_day_of_week(internal_state) <= 7 {
        light.on(physical_state);
    }
}

fn weekend_dark(physical_state: PhysicalState, internal_state: InternalState) {
    if svshi_api.get_day_of_week(internal_state) <= 5 {
        light.on(physical_state);
    } else {
        light.off(physical_state);
    }
}

fn light_invariant(physical_state: PhysicalState, internal_state: InternalState) -> bool {
    return light.is_on(physical_state);
}
";

fn z3(session: &str) -> Solver {
    Solver::new(&Conf::new(), session).expect("could not spawn z3, is it on the PATH?")
}

fn check_in(src: &str, iteration: &str, invariant: &str) -> Res<(bool, String)> {
    let module = parse::module(src).expect("test module must parse");
    let iteration = module.fun(iteration).expect("unknown iteration function");
    let invariant = module.fun(invariant).expect("unknown invariant function");
    let verifier = Verifier::new(&module, Conf::new());
    let res = verifier.check_iteration_satisfies_invariant(iteration, invariant);
    match &res {
        Ok((ok, msg)) => println!("{} / {}: {} {}", iteration.name, invariant.name, ok, msg),
        Err(e) => println!("{} / {}: error\n{}", iteration.name, invariant.name, e.pretty()),
    }
    res
}

fn check(iteration: &str, invariant: &str) -> Res<(bool, String)> {
    check_in(FUNCTIONS, iteration, invariant)
}

macro_rules! sat {
    ($($iteration:literal => $invariant:literal),* $(,)?) => {
        $(
            let (ok, msg) = check($iteration, $invariant).unwrap();
            assert!(ok, "`{}` should preserve `{}`: {}", $iteration, $invariant, msg);
            assert_eq!(msg, "");
        )*
    };
}
macro_rules! unsat {
    ($($iteration:literal => $invariant:literal),* $(,)?) => {
        $(
            let (ok, msg) = check($iteration, $invariant).unwrap();
            assert!(!ok, "`{}` should not preserve `{}`", $iteration, $invariant);
            assert!(!msg.is_empty());
        )*
    };
}

#[test]
#[ignore = "spawns z3, run with --ignored"]
fn temporal_sat() {
    sat! {
        "app_one_iteration" => "app_one_invariant",
        "app_one_iteration" => "invariant_test_one",
        "app_one_iteration" => "no_fun",
        "switch_on" => "app_one_invariant",
    }
}

#[test]
#[ignore = "spawns z3, run with --ignored"]
fn temporal_unsat() {
    unsat! {
        "app_two_iteration" => "app_two_invariant",
        "switch_off" => "app_one_invariant",
        "empty_fun" => "check_empty_fun_on",
        "empty_fun" => "check_empty_fun_off",
    }
}

#[test]
#[ignore = "spawns z3, run with --ignored"]
fn counterexample_without_check() {
    let (ok, msg) = check("app_two_iteration", "app_two_invariant_no_check").unwrap();
    assert!(!ok);
    assert!(msg.starts_with("counterexample [time_hour = "));
    assert!(msg.contains(", GA_0_0_1 = False] for condition: Or(Not(10 <= time_hour), "));
    assert!(msg.ends_with('\n'));
}

#[test]
#[ignore = "spawns z3, run with --ignored"]
fn aliasing() {
    let err = check("app_two_iteration", "app_three_invariant").unwrap_err();
    assert_eq!(err.source.to_string(), rewrite::ALIAS_ERROR);
}

#[test]
#[ignore = "spawns z3, run with --ignored"]
fn multi_line_condition() {
    // The sensor is free: the switch alone is not enough.
    let (ok, msg) = check("app_two_iteration", "invariant_test_line_return").unwrap();
    assert!(!ok);
    assert!(msg.contains(
        "svshi_api.check_time_property(Day(1), Hour(10), \
        app_one_switch.is_on(physical_state, internal_state) or \
        app_one_binary_sensor.is_on(physical_state, internal_state))"
    ));
    let (ok, _) = check("app_one_iteration", "invariant_test_line_return").unwrap();
    assert!(ok);
}

#[test]
#[ignore = "spawns z3, run with --ignored"]
fn floats() {
    sat! {
        "app_test_float" => "check_on_float_sat",
        "app_test_float" => "inv_on_float_sat",
        "app_test_float" => "multiple_check_sat",
    }
    unsat! {
        "app_test_float" => "check_on_float_unsat",
        "app_test_float" => "inv_on_float_unsat",
    }

    let (ok, msg) = check("app_test_float_depends_on_app_state_var", "inv_on_float_sat").unwrap();
    assert!(!ok);
    assert!(msg.contains("app_one_app_state.FLOAT_0 = "));
}

#[test]
#[ignore = "spawns z3, run with --ignored"]
fn always_false() {
    let (ok, msg) = check("switch_on", "inv_switch_off").unwrap();
    assert!(!ok);
    assert_eq!(msg, ALWAYS_FALSE);

    let (ok, msg) = check("app_test_float", "multiple_check_unsat").unwrap();
    assert!(!ok);
    assert_eq!(
        msg,
        "This condition is always false: Or(And(\
        svshi_api.check_time_property(Day(10), Hour(2), float_dev.read(physical_state, internal_state) >= 14), \
        svshi_api.check_time_property(Day(10), Hour(2), float_dev.read(physical_state, internal_state) >= 11)\
        ))\n"
    );
}

#[test]
#[ignore = "spawns z3, run with --ignored"]
fn boiler() {
    let (ok, msg) = check_in(BOILER, "system_behaviour", "boiler_invariant").unwrap();
    assert!(ok, "{}", msg);
    // The evil variant dips in the evening, the other one depends on the solar heater.
    for (iteration, first) in [
        ("solar_boiler_app_evil", "time_hour"),
        ("solar_boiler_app", "GA_0_0_3"),
    ] {
        let (ok, msg) = check_in(BOILER, iteration, "boiler_invariant").unwrap();
        assert!(!ok);
        assert!(msg.starts_with(&format!("counterexample [{} = ", first)));
        assert!(msg.contains("time_hour = "));
        assert!(msg.contains("] for condition: svshi_api.check_time_property("));
        assert!(msg.ends_with('\n'));
    }
}

#[test]
#[ignore = "spawns z3, run with --ignored"]
fn stricter_window() {
    let (ok, msg) = check("app_one_iteration", "invariant_twenty_hours").unwrap();
    assert!(!ok);
    assert!(msg.starts_with("counterexample [time_hour = "));
    assert!(msg.ends_with(
        "] for condition: svshi_api.check_time_property(Day(1), Hour(20), \
        app_one_switch.is_on(physical_state, internal_state))\n"
    ));
}

#[test]
#[ignore = "spawns z3, run with --ignored"]
fn time_field_bounds() {
    let (ok, msg) = check_in(WEEKDAYS, "weekday_light", "light_invariant").unwrap();
    assert!(ok, "{}", msg);

    let (ok, msg) = check_in(WEEKDAYS, "weekend_dark", "light_invariant").unwrap();
    assert!(!ok);
    assert!(msg.starts_with("counterexample [time_weekday = "));
    // Weekend days only.
    let day: i64 = msg["counterexample [time_weekday = ".len()..]
        .split(']')
        .next()
        .and_then(|day| day.parse().ok())
        .expect("a weekday value");
    assert!(6 <= day && day <= 7, "unexpected weekday {}", day);
}

#[test]
#[ignore = "spawns z3, run with --ignored"]
fn split_diagnostics() {
    let mut solver = z3("split");
    let hour = build_expr!((>= (time_hour: int) 10));

    let atoms = [hour.clone(), hour.clone().not()];
    let err = split(&mut solver, &atoms, &CdtDict::new()).unwrap_err();
    println!("{}", err);
    assert!(err.to_string().starts_with("unsat "));

    let mut cdt = CdtDict::new();
    let _ = cdt.insert("GA_0_0_3".to_string(), build_expr!(true));
    let err = split(&mut solver, &[build_expr!((>= (GA_0_0_3: int) 1))], &cdt).unwrap_err();
    println!("{}", err);
    assert!(err
        .to_string()
        .starts_with("Can't swap condition GA_0_0_3 in the function True because GA_0_0_3 is"));

    let err = split(&mut solver, &[build_expr!((GA_0_0_1: bool))], &cdt).unwrap_err();
    assert_eq!(err.to_string(), "variable GA_0_0_1 is not on the cdt_dict!");

    // Slots become comparisons of their post-state function, time constraints come first.
    let f = build_expr!((ite (>= (time_hour: int) 10) 1 0));
    let _ = cdt.insert("GA_0_0_1".to_string(), f);
    let atoms = [build_expr!((not (GA_0_0_1: bool))), hour];
    let res = split(&mut solver, &atoms, &cdt).unwrap();
    assert_eq!(
        res.to_string(),
        "And(time_hour >= 10, If(time_hour >= 10, 1, 0) == 0)"
    );
}

#[test]
#[ignore = "spawns z3, run with --ignored"]
fn inconclusive_answers() {
    // Sums of three cubes, way out of reach in one millisecond.
    let conf = Conf::new().per_condition_timeout(0.001);
    let mut solver = Solver::new(&conf, "cubes").expect("could not spawn z3, is it on the PATH?");
    let cond = build_expr!(
        (not (= (+ (* (x: int) (x: int) (x: int)) (* (y: int) (y: int) (y: int)) (* (z: int) (z: int) (z: int))) 33))
    );
    let msg = counterexample(&mut solver, &cond, &[]).unwrap();
    println!("{}", msg);
    assert_eq!(msg, format!("failed to prove {}\n", cond));
}

#[test]
#[ignore = "spawns z3, run with --ignored"]
fn driver() {
    let module = parse::module(BOILER).unwrap();
    let driver = Driver::new(&module, Conf::new());
    let names: Vec<_> = driver.invariants().map(|fun| fun.name.as_str()).collect();
    assert_eq!(names, vec!["boiler_invariant"]);
    let verdicts = driver.run().unwrap();
    assert_eq!(verdicts.len(), 1);
    assert_eq!(
        verdicts[0].to_string(),
        "CONFIRMED for invariant: boiler_invariant"
    );
}

#[test]
fn driver_errors() {
    // `functions.svshi` has no `system_behaviour`.
    let module = parse::module(FUNCTIONS).unwrap();
    let err = Driver::new(&module, Conf::new()).run().unwrap_err();
    assert_eq!(err.to_string(), "no `system_behaviour` function in the module");
}

#[test]
fn no_invariants() {
    let module = parse::module(
        "fn system_behaviour(physical_state: PhysicalState) {\n    pass;\n}\n",
    )
    .unwrap();
    let err = Driver::new(&module, Conf::new()).run().unwrap_err();
    assert_eq!(err.to_string(), "No invariants on the files");
}

#[test]
fn verdicts() {
    let failed = Verdict::Failed {
        invariant: "boiler_invariant".into(),
        msg: "This condition is always false: x\n".into(),
    };
    assert!(!failed.is_confirmed());
    assert_eq!(
        failed.to_string(),
        "ERROR: unsat for invariant boiler_invariant This condition is always false: x\n"
    );
}
