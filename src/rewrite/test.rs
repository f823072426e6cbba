//! Invariant rewriter tests.

use crate::prelude::{rewrite::*, *};

use explore::{PathSummary, Value};
use expr::{Expr, Var};

const MODULE: &str = "\
physical_state {
    GA_0_0_1: bool,
    GA_0_0_2: bool,
}
devices {
    presence: binary_sensor(GA_0_0_1),
    light: switch(GA_0_0_2),
}

fn app_one_invariant(
    app_one_app_state: AppState,
    physical_state: PhysicalState,
    internal_state: InternalState,
) -> bool {
    return svshi_api.check_time_property(
        frequency=svshi_api.Day(1),
        duration=svshi_api.Hour(2),
        condition=light.is_on(physical_state),
    ) and app_one_app_state.INT_0 >= 0;
}

fn nested_invariant(physical_state: PhysicalState, internal_state: InternalState) -> bool {
    return svshi_api.check_time_property(
        Week(1),
        Day(1),
        svshi_api.check_time_property(Day(1), Hour(1), presence.is_on(physical_state))
    );
}

fn aliased_invariant(physical_state: PhysicalState, internal_state: InternalState) -> bool {
    let on = light.is_on(physical_state);
    return svshi_api.check_time_property(Day(1), Hour(1), on);
}

fn no_internal_invariant(physical_state: PhysicalState) -> bool {
    return svshi_api.check_time_property(Day(1), Hour(1), light.is_on(physical_state));
}

fn bad_kind_invariant(physical_state: PhysicalState, internal_state: InternalState) -> bool {
    return svshi_api.check_time_property(Day(1), Hour(1 + 1), light.is_on(physical_state));
}

fn plain_invariant(physical_state: PhysicalState) -> bool {
    return light.is_on(physical_state);
}

fn two_apps_invariant(
    two_apps_app_state: AppState,
    other_app_state: AppState,
    physical_state: PhysicalState,
) -> bool {
    return true;
}

fn lost_invariant(
    first_app_state: AppState,
    second_app_state: AppState,
    physical_state: PhysicalState,
) -> bool {
    return true;
}

fn shared_invariant(
    shared_app_state: AppState,
    shared_other_app_state: AppState,
    physical_state: PhysicalState,
) -> bool {
    return true;
}
";

fn module() -> app::Module {
    parse::module(MODULE).expect("test module must parse")
}

fn rewrite(fun: &str) -> Res<RewrittenInvariant> {
    let module = module();
    let fun = module.fun(fun).expect("unknown test function");
    rewrite_invariant(&module, fun)
}

#[test]
fn sentinels() {
    let module = module();
    let inv = rewrite("app_one_invariant").unwrap();
    assert_eq!(inv.app_name.as_deref(), Some("app_one_app_state"));
    assert_eq!(inv.sites.len(), 1);
    let site = &inv.sites[0];
    println!("{}", site.text);
    assert_eq!(site.index, 0);
    assert_eq!(site.frequency.to_string(), "Day(1)");
    assert_eq!(site.duration.to_string(), "Hour(2)");
    assert_eq!(site.condition_text, "light.is_on(physical_state)");
    assert!(site.text.starts_with("svshi_api.check_time_property("));
    assert_eq!(module.text_of(site.condition.span), site.condition_text);

    let mut calls = vec![];
    for stmt in &inv.fun.body {
        if let app::Stmt::Return(Some(e)) = stmt {
            e.visit(&mut |e| {
                if let app::ExprKind::Method { method, .. } = &e.kind {
                    calls.push(method.clone())
                }
            })
        }
    }
    assert_eq!(calls, vec![app::DUMMY_CHECK.to_string()]);
}

#[test]
fn nested_sites() {
    let inv = rewrite("nested_invariant").unwrap();
    assert_eq!(inv.app_name, None);
    let sites: Vec<_> = inv
        .sites
        .iter()
        .map(|site| (site.index, site.frequency.to_string(), site.duration.to_string()))
        .collect();
    println!("{:?}", sites);
    assert_eq!(
        sites,
        vec![
            (0, "Day(1)".to_string(), "Hour(1)".to_string()),
            (1, "Week(1)".to_string(), "Day(1)".to_string()),
        ]
    );
    // The outer condition refers to the inner sentinel.
    let outer = &inv.sites[1].condition;
    assert!(!outer.is_check_time_property());
    match &outer.kind {
        app::ExprKind::Method { method, args, .. } => {
            assert_eq!(method, app::DUMMY_CHECK);
            assert_eq!(args.len(), 2);
        }
        kind => panic!("unexpected condition {:?}", kind),
    }
}

#[test]
fn rewrite_errors() {
    let err = rewrite("aliased_invariant").unwrap_err();
    assert_eq!(err.source.to_string(), ALIAS_ERROR);

    let err = rewrite("no_internal_invariant").unwrap_err();
    println!("{}", err.pretty());
    assert!(err
        .to_string()
        .contains("uses `check_time_property` but has no `InternalState` parameter"));

    let err = rewrite("bad_kind_invariant").unwrap_err();
    assert!(err.to_string().contains("expects a single integer constant"));

    let inv = rewrite("plain_invariant").unwrap();
    assert!(inv.sites.is_empty());
}

#[test]
fn app_names() {
    let module = module();
    let app = |name: &str| app_name(module.fun(name).expect("unknown test function"));
    assert_eq!(
        app("two_apps_invariant").unwrap().as_deref(),
        Some("two_apps_app_state")
    );
    assert_eq!(app("plain_invariant").unwrap(), None);
    let err = app("lost_invariant").unwrap_err();
    assert_eq!(
        err.to_string(),
        "no match for the possible app name `lost` given [\"first_app_state\", \"second_app_state\"]"
    );
    let err = app("shared_invariant").unwrap_err();
    assert_eq!(
        err.to_string(),
        "multiple app names : [\"shared_app_state\", \"shared_other_app_state\"] cannot decide"
    );
}

fn sentinel(idx: i64) -> Expr {
    Expr::from((
        expr::Op::Eq,
        vec![
            Expr::from(idx),
            Expr::new_var(Var::new(app::SENTINEL, Typ::Int)),
        ],
    ))
}

fn path(guards: Vec<Expr>, ret: Value) -> PathSummary {
    PathSummary {
        guards,
        ret,
        outputs: vec![],
    }
}

#[test]
fn valid_paths() {
    let ga = build_expr!((GA_0_0_1: bool));
    let paths = vec![
        path(vec![sentinel(0).not()], Value::Expr(false.into())),
        path(vec![sentinel(0)], Value::Expr(sentinel(1))),
        path(vec![ga.clone().not()], Value::None),
        path(vec![], Value::Expr(true.into())),
        path(vec![ga.clone()], Value::Expr(build_expr!((and (GA_0_0_1: bool) false)))),
    ];
    let valid = extract_valid_paths(&paths);
    let valid: Vec<Vec<String>> = valid
        .iter()
        .map(|path| path.iter().map(|e| e.to_string()).collect())
        .collect();
    println!("{:?}", valid);
    assert_eq!(
        valid,
        vec![
            vec!["0 == c0".to_string(), "1 == c0".to_string()],
            vec!["True".to_string()],
        ]
    );
}

#[test]
fn sentinel_substitution() {
    let phi = build_expr!((forall ((t: int)) (>= (t: int) 0)));
    let mut phis = Map::new();
    let _ = phis.insert(0, phi.clone());

    assert_eq!(substitute_sentinels(&sentinel(0), &phis), phi);
    assert_eq!(
        substitute_sentinels(&sentinel(0).not(), &phis),
        Expr::from(true)
    );
    // Unknown sentinels are left alone.
    assert_eq!(substitute_sentinels(&sentinel(1), &phis), sentinel(1));

    let nested = Expr::and(vec![build_expr!((GA_0_0_1: bool)), sentinel(0)]);
    assert_eq!(
        substitute_sentinels(&nested, &phis).to_string(),
        "And(GA_0_0_1, ForAll([t], t >= 0))"
    );
}

#[test]
fn rendering() {
    let checks = vec![
        TranslatedCheck {
            formula: "ForAll([x], x)".into(),
            source: "inner".into(),
        },
        TranslatedCheck {
            formula: "Exists([y], And(y, ForAll([x], x)))".into(),
            source: "outer".into(),
        },
    ];
    assert_eq!(
        TranslatedCheck::render(&checks, "Or(Exists([y], And(y, ForAll([x], x))), ForAll([x], x))"),
        "Or(outer, inner)"
    );
}
