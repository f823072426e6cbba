//! Path explorer tests.
//!
//! Most of these tests spawn `z3` from `PATH`, they are ignored by default. Run them with
//! `cargo test -- --ignored`.

use crate::prelude::{explore::*, *};

use solver::Solver;

const MODULE: &str = "\
physical_state {
    GA_0_0_1: bool,
    GA_0_0_2: bool,
    GA_0_0_3: int,
    GA_0_0_4: float,
}
devices {
    presence: binary_sensor(GA_0_0_1),
    light: switch(GA_0_0_2),
    counter: int_device(GA_0_0_3),
    boiler: float_device(GA_0_0_4),
}

fn hour_light(physical_state: PhysicalState, internal_state: InternalState) {
    if svshi_api.get_hour_of_the_day(internal_state) >= 10 {
        light.on(physical_state);
    } else {
        light.off(physical_state);
    }
}

fn sentinels(physical_state: PhysicalState, internal_state: InternalState) -> bool {
    return svshi_api.dummy_check(internal_state, 0) and svshi_api.dummy_check(internal_state, 1);
}

fn bad_setter(physical_state: PhysicalState, internal_state: InternalState) {
    svshi_api.set_hour_of_the_day(25, internal_state);
    light.on(physical_state);
}

fn dead_branch(physical_state: PhysicalState, internal_state: InternalState) {
    let h = svshi_api.get_hour_of_the_day(internal_state);
    if h > 30 {
        light.on(physical_state);
    }
}

fn floats(app_state: AppState, physical_state: PhysicalState, internal_state: InternalState) {
    app_state.FLOAT_0 = 3;
    boiler.set(app_state.FLOAT_0 / 2);
    counter.set(7 // 2);
}

fn strings(app_state: AppState, physical_state: PhysicalState, internal_state: InternalState) -> bool {
    return app_state.STR_0 == None;
}

fn bad_method(physical_state: PhysicalState, internal_state: InternalState) {
    presence.on(physical_state);
}
";

fn explore_with(conf: &Conf, fun: &str) -> Res<Exploration> {
    let module = parse::module(MODULE).expect("test module must parse");
    let mut solver = Solver::new(conf, fun).expect("could not spawn z3, is it on the PATH?");
    let mut symbols = Symbols::new();
    let fun = module.fun(fun).expect("unknown test function");
    let mut explorer = Explorer::new(&module, conf, &mut solver, &mut symbols);
    explorer.explore(fun)
}

fn explore(fun: &str) -> Res<Exploration> {
    explore_with(&Conf::new(), fun)
}

fn output<'p>(path: &'p PathSummary, slot: &str) -> &'p Expr {
    &path
        .outputs
        .iter()
        .find(|(s, _)| s == slot)
        .unwrap_or_else(|| panic!("no output for slot `{}`", slot))
        .1
}

use expr::Expr;

#[test]
#[ignore = "spawns z3, run with --ignored"]
fn else_branch_first() {
    let exploration = explore("hour_light").unwrap();
    assert!(exploration.exhausted);
    assert_eq!(exploration.paths.len(), 2);

    let (els, thn) = (&exploration.paths[0], &exploration.paths[1]);
    println!("else: {:?}", els.guards);
    println!("then: {:?}", thn.guards);
    assert_eq!(els.condition().to_string(), "Not(time_hour >= 10)");
    assert_eq!(thn.condition().to_string(), "time_hour >= 10");
    assert_eq!(output(els, "GA_0_0_2").to_string(), "False");
    assert_eq!(output(thn, "GA_0_0_2").to_string(), "True");
    // Untouched fields keep their pre-state constant.
    assert_eq!(output(thn, "GA_0_0_1").to_string(), "GA_0_0_1");
    assert_eq!(els.ret, Value::None);
}

#[test]
#[ignore = "spawns z3, run with --ignored"]
fn sentinels_never_pruned() {
    let exploration = explore("sentinels").unwrap();
    let rendered: Vec<_> = exploration
        .paths
        .iter()
        .map(|path| (path.condition().to_string(), path.ret.to_string()))
        .collect();
    println!("{:?}", rendered);
    assert_eq!(
        rendered,
        vec![
            ("Not(0 == c0)".to_string(), "False".to_string()),
            ("0 == c0".to_string(), "1 == c0".to_string()),
        ]
    );
}

#[test]
#[ignore = "spawns z3, run with --ignored"]
fn infeasible_paths() {
    // Setter precondition violated: no path at all.
    let exploration = explore("bad_setter").unwrap();
    assert!(exploration.paths.is_empty());

    // Field bounds prune the `then` branch.
    let exploration = explore("dead_branch").unwrap();
    assert_eq!(exploration.paths.len(), 1);
    assert_eq!(
        exploration.paths[0].condition().to_string(),
        "Not(time_hour > 30)"
    );
}

#[test]
#[ignore = "spawns z3, run with --ignored"]
fn arithmetic() {
    let exploration = explore("floats").unwrap();
    assert_eq!(exploration.paths.len(), 1);
    let path = &exploration.paths[0];
    assert_eq!(output(path, "app_state.FLOAT_0").to_string(), "3");
    assert_eq!(output(path, "GA_0_0_4").to_string(), "3/2");
    assert_eq!(output(path, "GA_0_0_3").to_string(), "3");
    // Opaque string fields are not outputs.
    assert!(path.outputs.iter().all(|(slot, _)| !slot.contains("STR")));
}

#[test]
#[ignore = "spawns z3, run with --ignored"]
fn errors() {
    let err = explore("strings").unwrap_err();
    println!("{}", err);
    assert!(err.to_string().contains("string fields are opaque"));
    assert!(err
        .to_string()
        .contains("symbolic exploration failed on function `strings`"));

    let err = explore("bad_method").unwrap_err();
    println!("{}", err);
    assert!(err
        .to_string()
        .contains("device `presence` of kind `binary_sensor` has no method `on`"));
}

#[test]
#[ignore = "spawns z3, run with --ignored"]
fn path_timeout() {
    let conf = Conf::new().per_path_timeout(0.0);
    let exploration = explore_with(&conf, "hour_light").unwrap();
    assert!(!exploration.exhausted);
    assert!(exploration.paths.is_empty());

    let exploration = explore("hour_light").unwrap();
    assert!(exploration.exhausted);
}

#[test]
fn sentinel_detection() {
    let sentinel = build_expr!((= 3 (c0: int)));
    assert!(mentions_sentinel(&sentinel));
    assert!(mentions_sentinel(&sentinel.clone().not()));
    assert!(!mentions_sentinel(&build_expr!((>= (time_hour: int) 10))));
}
