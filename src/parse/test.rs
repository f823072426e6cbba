//! Parser tests.

use crate::prelude::{parse::*, *};

use app::{ExprKind, RecordKind, Stmt};

fn run<T>(input: impl AsRef<str>, action: impl FnOnce(&str) -> Res<T>, expected: Result<&str, &str>)
where
    T: fmt::Display,
{
    let input = input.as_ref();
    println!("input:");
    for line in input.lines() {
        println!("    {}", line);
    }
    let res = action(input)
        .map(|t| t.to_string())
        .map_err(|e| e.to_string());
    println!("result: {:?}", res);
    match (res, expected) {
        (Ok(t), Ok(exp)) => assert_eq!(t, exp),
        (Err(e), Err(exp)) => assert!(
            e.contains(exp),
            "expected error containing `{}`, got `{}`",
            exp,
            e
        ),
        (res, exp) => panic!("expected {:?}, got {:?}", exp, res),
    }
}

#[test]
fn error_pos() {
    run(
        "// Blah.\nerr_token",
        |input| module(input).map(|_| "module"),
        Err("parse error at 2:1"),
    );
    run(
        "fn f(app_state: AppState) {\n    return 1 +;\n}",
        |input| module(input).map(|_| "module"),
        Err("parse error at 2:"),
    );
    run(
        "fn f(state: Foo) { pass; }",
        |input| module(input).map(|_| "module"),
        Err("unknown record type `Foo`"),
    );
}

#[test]
fn devices() {
    run(
        "\
physical_state { GA_0_0_1: bool, GA_0_0_2: float }
devices { presence: binary_sensor(GA_0_0_1), temp: temperature_sensor(GA_0_0_2) }
",
        |input| module(input).map(|m| m.devices.len()),
        Ok("2"),
    );
    run(
        "\
physical_state { GA_0_0_1: bool }
devices { presence: binary_sensor(GA_0_0_9) }
",
        |input| module(input).map(|m| m.devices.len()),
        Err("undeclared group address `GA_0_0_9`"),
    );
    run(
        "\
physical_state { GA_0_0_1: float }
devices { presence: binary_sensor(GA_0_0_1) }
",
        |input| module(input).map(|m| m.devices.len()),
        Err("needs a `bool` group address"),
    );
}

#[test]
fn span() {
    let input = "here is\nsome\ntext";
    macro_rules! run {
        { $pos:expr => @($row:expr, $col:expr) $prev:expr, $line:expr, $next:expr $(,)? } => {{
            let (in_prev, in_next): (Option<&str>, Option<&str>) = ($prev, $next);
            let span = Span::new($pos, $pos);
            let (prev, row, col, line, next) = span.pretty_of(input);
            println!("{} => {:?} {} {} {:?} {:?}", $pos, prev, row, col, line, next);
            assert_eq!(prev.as_ref().map(|s| s.as_ref()), in_prev);
            assert_eq!(row, $row);
            assert_eq!(col, $col);
            assert_eq!(line, $line);
            assert_eq!(next.as_ref().map(|s| s.as_ref()), in_next);
        }}
    }

    // Start.
    run!(0 => @(0, 0) None, "here is", Some("some"));
    // First line's newline.
    run!(7 => @(0, 7) None, "here is", Some("some"));

    // Second line.
    run!(8 => @(1, 0) Some("here is"), "some", Some("text"));
    run!(12 => @(1, 4) Some("here is"), "some", Some("text"));

    // Last line, no trailing newline.
    run!(15 => @(2, 2) Some("some"), "text<EOI>", None);
    run!(input.len() => @(2, 4) Some("some"), "text<EOI>", None);
}

#[test]
fn expressions() {
    let e = rules::expr("a.INT_0 // 2 + -x % 3").unwrap();
    match e.kind {
        ExprKind::Bin(app::BinOp::Add, lft, rgt) => {
            assert!(matches!(lft.kind, ExprKind::Bin(app::BinOp::IDiv, _, _)));
            assert!(matches!(rgt.kind, ExprKind::Bin(app::BinOp::Mod, _, _)));
        }
        kind => panic!("unexpected expression {:?}", kind),
    }

    let e = rules::expr("not a or b and c != 2.5").unwrap();
    match e.kind {
        ExprKind::Or(lft, rgt) => {
            assert!(matches!(lft.kind, ExprKind::Not(_)));
            assert!(matches!(rgt.kind, ExprKind::And(_, _)));
        }
        kind => panic!("unexpected expression {:?}", kind),
    }

    let txt = "svshi_api.check_time_property(frequency=svshi_api.Hour(2), duration=Minute(1), condition=x)";
    let e = rules::expr(txt).unwrap();
    assert!(e.is_check_time_property());
    assert_eq!((e.span.start, e.span.end), (0, txt.len()));
    match e.kind {
        ExprKind::Method { args, .. } => {
            let names: Vec<_> = args.iter().map(|arg| arg.name.clone()).collect();
            assert_eq!(
                names,
                vec![
                    Some("frequency".into()),
                    Some("duration".into()),
                    Some("condition".into())
                ]
            );
        }
        kind => panic!("unexpected expression {:?}", kind),
    }

    // Comparisons are not confused with named arguments.
    let e = rules::expr("f(x == 2)").unwrap();
    match e.kind {
        ExprKind::Call { args, .. } => assert_eq!(args[0].name, None),
        kind => panic!("unexpected expression {:?}", kind),
    }
}

#[test]
fn full_module() {
    let txt = "\
// Bus.
physical_state {
    GA_0_0_1: bool,
    GA_0_0_4: float,
}
devices {
    light: switch(GA_0_0_1),
    temp: temperature_sensor(GA_0_0_4),
}
isolated_fns {
    get_weather: float,
}

fn app_invariant(app_state: AppState, physical_state: PhysicalState, internal_state: InternalState) -> bool {
    let h = svshi_api.get_hour_of_the_day(internal_state);
    // Comments are fine between statements.
    if 8 <= h <= 20 {
        return light.is_on();
    } else if h == 21 {
        return True;
    } else {
        return temp.read() < 20.5;
    }
}

fn iteration(app_state: AppState, physical_state: PhysicalState, internal_state: InternalState) {
    app_state.INT_0 = app_state.INT_0 + 1;
    light.on();
    pass;
    return;
}
";
    let module = module(txt).unwrap();
    assert_eq!(module.physical.len(), 2);
    assert_eq!(module.ga_typ("GA_0_0_4"), Some(Typ::Real));
    assert_eq!(module.isolated_typ("get_weather"), Some(Typ::Real));
    assert_eq!(module.funs.len(), 2);

    let inv = module.fun("app_invariant").unwrap();
    assert_eq!(inv.ret, Some(Typ::Bool));
    assert_eq!(inv.params[2].kind, RecordKind::Internal);
    assert_eq!(inv.app_params().collect::<Vec<_>>(), vec!["app_state"]);
    assert_eq!(inv.body.len(), 2);
    match &inv.body[1] {
        Stmt::If { branches, els } => {
            assert_eq!(branches.len(), 2);
            assert!(els.is_some());
            assert_eq!(module.text_of(branches[0].0.span), "8 <= h <= 20");
        }
        stmt => panic!("unexpected statement {:?}", stmt),
    }

    let iter = module.fun("iteration").unwrap();
    assert_eq!(iter.ret, None);
    assert!(matches!(&iter.body[0], Stmt::FieldAssign { rec, field, .. } if rec == "app_state" && field == "INT_0"));
    assert!(matches!(&iter.body[3], Stmt::Return(None)));
}
