use fixwright_test_support as _;
use serde_json::json;

use fixwright::{Executor, MethodSpec, OperationFault, Report, TestCase};
use fixwright_core::{
    ClassDef, ClassId, ClassKind, ClassRegistry, EngineConfig, FieldDef, ParamNode, StructDef,
    TypeExpr, Value,
};

struct Fixture {
    config: EngineConfig,
    item: ClassId,
}

fn fixture() -> Fixture {
    let mut registry = ClassRegistry::new();
    let item = registry
        .register(ClassDef::new(
            "item",
            ClassKind::Struct(
                StructDef::new()
                    .with_field(FieldDef::new("i", TypeExpr::class(ClassId::I32)))
                    .with_ctor(vec![]),
            ),
        ))
        .expect("register item");
    registry
        .register(
            ClassDef::new(
                "special_item",
                ClassKind::Struct(StructDef::new().with_ctor(vec![])),
            )
            .with_supertype(TypeExpr::class(item)),
        )
        .expect("register special_item");
    Fixture {
        config: EngineConfig::new(registry),
        item,
    }
}

fn case(init: serde_json::Value, verify: serde_json::Value) -> TestCase {
    TestCase::new("case")
        .with_init(ParamNode::from_json(&init))
        .with_verify(ParamNode::from_json(&verify))
        .with_seed(3)
}

#[test]
fn arguments_are_verified_after_the_operation_runs() {
    let fixture = fixture();
    let method = MethodSpec::new("store").with_param(
        "a",
        TypeExpr::parameterized(
            ClassId::LIST,
            vec![TypeExpr::wildcard_extends(TypeExpr::class(fixture.item))],
        ),
    );
    let executor = Executor::new(fixture.config);
    let report = executor.run_cases(
        &method,
        &|_args| Ok(Value::Null),
        &[
            case(
                json!({"a": [{"class": "special_item", "i": 7}]}),
                json!({"a": [{"i": 7}]}),
            ),
            case(json!({"a": [{"i": 7}]}), json!({"a": [{"i": 7}]})),
        ],
    );
    assert_eq!(report.render(), "");
    assert!(report.is_success());
}

#[test]
fn the_operation_result_is_exposed_as_a_record_field() {
    let fixture = fixture();
    let method = MethodSpec::new("echo").with_param("a", TypeExpr::class(fixture.item));
    let executor = Executor::new(fixture.config);
    let report = executor.run_cases(
        &method,
        &|args| Ok(args[0].clone()),
        &[case(
            json!({"a": {"i": 7}}),
            json!({"a": {"i": 7}, "result": {"i": 7, "@class": "item"}}),
        )],
    );
    assert_eq!(report.render(), "");
}

#[test]
fn references_reuse_previously_generated_arguments() {
    let fixture = fixture();
    let method = MethodSpec::new("link")
        .with_param("first", TypeExpr::class(fixture.item))
        .with_param("second", TypeExpr::class(fixture.item));
    let executor = Executor::new(fixture.config);
    let report = executor.run_cases(
        &method,
        &|args| {
            // the reference must be the identical instance
            if args[0] == args[1] {
                Ok(Value::Null)
            } else {
                Err(OperationFault::new("arguments are distinct instances"))
            }
        },
        &[case(
            json!({"first": {"i": 7}, "second": {"reference": "first"}}),
            json!({"first": {"i": 7}, "second": {"i": 7}}),
        )],
    );
    assert_eq!(report.render(), "");
}

#[test]
fn operation_faults_become_a_single_unverified_line() {
    let fixture = fixture();
    let method = MethodSpec::new("explode").with_param("a", TypeExpr::class(fixture.item));
    let executor = Executor::new(fixture.config);
    let report = executor.run_cases(
        &method,
        &|_args| Err(OperationFault::new("boom")),
        &[case(json!({"a": {"i": 7}}), json!({"a": {"i": 7}}))],
    );
    assert!(!report.is_success());
    let rendered = report.render();
    assert_eq!(rendered.lines().count(), 1);
    assert!(rendered.contains("boom"));
    assert!(report.outcomes[0].results.is_empty());
}

#[test]
fn generation_failures_are_fatal_for_the_case() {
    let fixture = fixture();
    let method = MethodSpec::new("store").with_param("a", TypeExpr::class(fixture.item));
    let executor = Executor::new(fixture.config);
    let report = executor.run_cases(
        &method,
        &|_args| Ok(Value::Null),
        &[case(json!({"a": {"class": "nope"}}), json!({}))],
    );
    assert!(!report.is_success());
    let rendered = report.render();
    assert_eq!(rendered.lines().count(), 1);
    assert!(rendered.contains("unknown class"));
}

#[test]
fn failed_verifications_render_one_line_each() {
    let fixture = fixture();
    let method = MethodSpec::new("store").with_param("a", TypeExpr::class(fixture.item));
    let executor = Executor::new(fixture.config);
    let report = executor.run_cases(
        &method,
        &|_args| Ok(Value::Null),
        &[case(
            json!({"a": {"i": 7}}),
            json!({"a": {"i": 8}, "result": null}),
        )],
    );
    let rendered = report.render();
    assert_eq!(rendered.lines().count(), 1);
    assert!(rendered.starts_with("Failure store.a.i."));
    // the passing result check is still recorded
    assert!(report.outcomes[0]
        .results
        .iter()
        .any(|result| result.is_success()));
}

#[test]
fn an_empty_report_renders_empty() {
    let report = Report::default();
    assert!(report.is_success());
    assert_eq!(report.render(), "");
}
