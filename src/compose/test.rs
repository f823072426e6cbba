//! State-function composer tests.

use crate::prelude::{compose::*, *};

use explore::{PathSummary, Value};
use expr::Expr;

fn path(guards: Vec<Expr>, outputs: Vec<(&str, Expr)>) -> PathSummary {
    PathSummary {
        guards,
        ret: Value::None,
        outputs: outputs
            .into_iter()
            .map(|(slot, val)| (slot.to_string(), val))
            .collect(),
    }
}

#[test]
fn slots_follow_path_order() {
    let hour = build_expr!((>= (time_hour: int) 10));
    let app_int = expr::Var::new("app_one_app_state.INT_0", Typ::Int);
    let paths = vec![
        path(
            vec![hour.clone().not()],
            vec![
                ("GA_0_0_2", build_expr!(false)),
                ("app_one_app_state.INT_0", Expr::new_var(app_int.clone())),
            ],
        ),
        path(
            vec![hour],
            vec![
                ("GA_0_0_2", build_expr!(true)),
                ("app_one_app_state.INT_0", build_expr!(3)),
            ],
        ),
    ];
    let mut registry = Registry::new();
    let cdt = cdt_dict(&paths, &mut registry).unwrap();
    for (slot, f) in &cdt {
        println!("{} := {}", slot, f)
    }
    assert_eq!(cdt.len(), 2);
    assert_eq!(
        cdt["GA_0_0_2"].to_string(),
        "If(Not(time_hour >= 10), 0, If(time_hour >= 10, 1, -1))"
    );
    assert_eq!(
        cdt["app_one_app_state.INT_0"].to_string(),
        "If(Not(time_hour >= 10), app_one_app_state.INT_0, If(time_hour >= 10, 3, -1))"
    );
    // Only solver constants are registered, not literals.
    assert_eq!(registry.len(), 1);
    // Registering the same constant again changes nothing.
    registry
        .register("app_one_app_state.INT_0", &Expr::new_var(app_int))
        .unwrap();
    assert_eq!(registry.len(), 1);
}

#[test]
fn single_path() {
    let paths = vec![path(
        vec![build_expr!((GA_0_0_1: bool))],
        vec![("GA_0_0_3", build_expr!((+ (GA_0_0_3: int) 1)))],
    )];
    let cdt = cdt_dict(&paths, &mut Registry::new()).unwrap();
    assert_eq!(cdt["GA_0_0_3"].to_string(), "If(GA_0_0_1, GA_0_0_3 + 1, -1)");

    // No guard at all.
    let paths = vec![path(vec![], vec![("GA_0_0_1", build_expr!((GA_0_0_1: bool)))])];
    let cdt = cdt_dict(&paths, &mut Registry::new()).unwrap();
    assert_eq!(cdt["GA_0_0_1"].to_string(), "If(True, If(GA_0_0_1, 1, 0), -1)");
}

#[test]
fn real_slots() {
    let paths = vec![
        path(
            vec![build_expr!((GA_0_0_1: bool))],
            vec![("GA_0_0_4", Expr::from(Rat::new(Int::from(1), Int::from(2))))],
        ),
        path(
            vec![build_expr!((not (GA_0_0_1: bool)))],
            vec![("GA_0_0_4", build_expr!((GA_0_0_4: real)))],
        ),
    ];
    let cdt = cdt_dict(&paths, &mut Registry::new()).unwrap();
    let f = &cdt["GA_0_0_4"];
    println!("{}", f);
    assert_eq!(f.typ(), Typ::Real);
    assert_eq!(f.to_string(), "If(GA_0_0_1, 1/2, If(Not(GA_0_0_1), GA_0_0_4, -1))");
}

#[test]
fn errors() {
    let paths = vec![path(
        vec![],
        vec![
            ("GA_0_0_2", build_expr!(true)),
            ("GA_0_0_2", build_expr!(false)),
        ],
    )];
    let err = cdt_dict(&paths, &mut Registry::new()).unwrap_err();
    assert_eq!(err.to_string(), "Duplicate key detected for key GA_0_0_2");

    let paths = vec![path(vec![], vec![("BOOL_1", build_expr!((BOOL_1: bool)))])];
    let err = cdt_dict(&paths, &mut Registry::new()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "adding BOOL_1 as a key should never happen, could cause app_state conflicts"
    );

    let mut registry = Registry::new();
    let err = registry
        .register_vars(&[build_expr!((and (FLOAT_3: real) (GA_0_0_1: bool)))])
        .unwrap_err();
    println!("{}", err);
    assert!(err.to_string().contains("FLOAT_3"));
    // Qualified names and longer prefixes are fine.
    registry
        .register_vars(&[build_expr!((and (INT_10: int) (GA_0_0_1: bool)))])
        .unwrap();
    assert_eq!(registry.len(), 2);
}

#[test]
fn internal_slots() {
    assert!(is_internal("c0"));
    assert!(is_internal("time_weekday"));
    assert!(!is_internal("GA_0_0_1"));
    assert!(!is_internal("app_one_app_state.INT_0"));
}
