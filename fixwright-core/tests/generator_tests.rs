use std::sync::Arc;

use fixwright_test_support as _;
use proptest::prelude::*;
use serde_json::json;

use fixwright_core::{
    AssignmentMark, ClassDef, ClassId, ClassKind, ClassRegistry, Context, EngineConfig, FieldDef,
    GenerateErrorKind, MapParamLoader, MethodDef, ObjectGenerator, ParamNode, SeqKind, StructDef,
    TypeExpr, Value,
};

mod support;

fn generate_with_spec(
    config: &EngineConfig,
    ty: &TypeExpr,
    spec: Option<serde_json::Value>,
) -> Result<Value, fixwright_core::GenerateError> {
    let root = spec.map(|json| Arc::new(ParamNode::from_json(&json)));
    let mut ctx = Context::with_seed(root, 7);
    ObjectGenerator::new(config.clone()).generate(ty, &mut ctx)
}

#[test]
fn literal_scalar_leaves_convert_exactly() {
    let classes = support::item_classes();
    let value = generate_with_spec(
        &classes.config,
        &TypeExpr::class(classes.item),
        Some(json!({"i": 7})),
    )
    .expect("generate item");
    let Value::Object(object) = &value else {
        panic!("expected an object, got {value:?}");
    };
    assert_eq!(object.field("i"), Some(&Value::I32(7)));
}

#[test]
fn unspecified_fields_are_generated_randomly() {
    let classes = support::item_classes();
    let value = generate_with_spec(&classes.config, &TypeExpr::class(classes.item), None)
        .expect("generate item");
    let Value::Object(object) = &value else {
        panic!("expected an object");
    };
    assert!(matches!(object.field("i"), Some(Value::I32(_))));
}

#[test]
fn structurally_empty_leaf_generates_null() {
    let classes = support::item_classes();
    let value = generate_with_spec(
        &classes.config,
        &TypeExpr::class(classes.item),
        Some(json!(null)),
    )
    .expect("generate null");
    assert!(value.is_null());
}

#[test]
fn explicit_size_is_honored_exactly() {
    let classes = support::item_classes();
    let ty = TypeExpr::parameterized(ClassId::LIST, vec![TypeExpr::class(ClassId::I32)]);
    let value = generate_with_spec(&classes.config, &ty, Some(json!({"@size": "4"})))
        .expect("generate list");
    let Value::Seq(seq) = &value else {
        panic!("expected a sequence");
    };
    assert_eq!(seq.items.len(), 4);
    assert_eq!(seq.kind, SeqKind::List);
    assert_eq!(seq.class, ClassId::VEC);
}

#[test]
fn array_elements_follow_indexed_specification() {
    let classes = support::item_classes();
    let ty = TypeExpr::array(TypeExpr::class(ClassId::I32));
    let value = generate_with_spec(&classes.config, &ty, Some(json!(["5", "6"])))
        .expect("generate array");
    let Value::Seq(seq) = &value else {
        panic!("expected an array");
    };
    assert_eq!(seq.kind, SeqKind::Array);
    assert_eq!(seq.items, vec![Value::I32(5), Value::I32(6)]);
}

#[test]
fn forced_container_class_is_instantiated() {
    let classes = support::item_classes();
    let ty = TypeExpr::parameterized(ClassId::LIST, vec![TypeExpr::class(ClassId::I32)]);
    let value = generate_with_spec(
        &classes.config,
        &ty,
        Some(json!({"class": "hash_set", "@size": "1"})),
    )
    .expect("generate set");
    let Value::Seq(seq) = &value else {
        panic!("expected a sequence");
    };
    assert_eq!(seq.class, ClassId::HASH_SET);
    assert_eq!(seq.kind, SeqKind::Set);
    assert_eq!(seq.items.len(), 1);
}

#[test]
fn map_entries_are_generated_from_key_value_subpaths() {
    let classes = support::item_classes();
    let ty = TypeExpr::parameterized(
        ClassId::MAP,
        vec![TypeExpr::class(ClassId::STR), TypeExpr::class(ClassId::I32)],
    );
    let value = generate_with_spec(
        &classes.config,
        &ty,
        Some(json!([{"key": "k", "value": 5}])),
    )
    .expect("generate map");
    let Value::Map(map) = &value else {
        panic!("expected a map");
    };
    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&Value::Str("k".to_string())), Some(&Value::I32(5)));
}

#[test]
fn reference_resolves_to_the_identical_instance() {
    let classes = support::item_classes();
    let generator = ObjectGenerator::new(classes.config.clone());
    let root = Arc::new(ParamNode::from_json(&json!({
        "first": {"i": 7},
        "second": {"reference": "first"}
    })));
    let mut ctx = Context::with_seed(Some(root), 0);

    ctx.enter("args", "first");
    let first = generator
        .generate(&TypeExpr::class(classes.item), &mut ctx)
        .expect("generate first");
    ctx.leave(&first);
    ctx.register_reference("first", first.clone())
        .expect("register");

    ctx.enter("args", "second");
    let second = generator
        .generate(&TypeExpr::class(classes.item), &mut ctx)
        .expect("generate second");
    ctx.leave(&second);

    // identity, not structural equality
    assert_eq!(first, second);
}

#[test]
fn unregistered_reference_fails_generation() {
    let classes = support::item_classes();
    let error = generate_with_spec(
        &classes.config,
        &TypeExpr::class(classes.item),
        Some(json!({"reference": "ghost"})),
    )
    .expect_err("unregistered reference");
    assert!(matches!(
        error.kind(),
        GenerateErrorKind::IllegalArgument { .. }
    ));
    assert!(error.to_string().contains("ghost"));
}

#[test]
fn self_referential_type_fails_with_possible_cycle() {
    let mut registry = ClassRegistry::new();
    let link = registry.declare("link").expect("declare link");
    registry.define(
        link,
        ClassKind::Struct(
            StructDef::new()
                .with_field(FieldDef::new("next", TypeExpr::class(link)))
                .with_ctor(vec![]),
        ),
    );
    let config = EngineConfig::new(registry);
    let error = generate_with_spec(&config, &TypeExpr::class(link), None)
        .expect_err("cyclic type graph");
    assert!(matches!(
        error.kind(),
        GenerateErrorKind::PossibleCycle { .. }
    ));
    assert!(error.path().iter().any(|segment| segment == "next"));
}

#[test]
fn acyclic_types_generate_within_the_ceiling() {
    let mut registry = ClassRegistry::new();
    let inner = registry
        .register(ClassDef::new(
            "inner",
            ClassKind::Struct(
                StructDef::new()
                    .with_field(FieldDef::new("value", TypeExpr::class(ClassId::I64)))
                    .with_ctor(vec![]),
            ),
        ))
        .expect("register inner");
    let outer = registry
        .register(ClassDef::new(
            "outer",
            ClassKind::Struct(
                StructDef::new()
                    .with_field(FieldDef::new("inner", TypeExpr::class(inner)))
                    .with_ctor(vec![]),
            ),
        ))
        .expect("register outer");
    let config = EngineConfig::new(registry);
    let value = generate_with_spec(&config, &TypeExpr::class(outer), None).expect("acyclic");
    let Value::Object(object) = &value else {
        panic!("expected an object");
    };
    assert!(matches!(object.field("inner"), Some(Value::Object(_))));
}

#[test]
fn missing_constructor_is_an_initialization_error() {
    let mut registry = ClassRegistry::new();
    let bare = registry
        .register(ClassDef::new(
            "bare",
            ClassKind::Struct(StructDef::new()),
        ))
        .expect("register bare");
    let config = EngineConfig::new(registry);
    let error =
        generate_with_spec(&config, &TypeExpr::class(bare), None).expect_err("no constructor");
    assert!(matches!(
        error.kind(),
        GenerateErrorKind::Initialization { .. }
    ));
}

#[test]
fn definition_fragments_merge_with_inline_precedence() {
    let mut registry = ClassRegistry::new();
    let pair = registry
        .register(ClassDef::new(
            "pair",
            ClassKind::Struct(
                StructDef::new()
                    .with_field(FieldDef::new("a", TypeExpr::class(ClassId::I32)))
                    .with_field(FieldDef::new("b", TypeExpr::class(ClassId::I32)))
                    .with_ctor(vec![]),
            ),
        ))
        .expect("register pair");
    let loader =
        MapParamLoader::new().with_fragment("pair", "base", ParamNode::from_json(&json!({
            "a": 1,
            "b": 2
        })));
    let config = EngineConfig::new(registry).with_loader(Arc::new(loader));
    let value = generate_with_spec(
        &config,
        &TypeExpr::class(pair),
        Some(json!({"definition": "base", "b": 9})),
    )
    .expect("generate pair");
    let Value::Object(object) = &value else {
        panic!("expected an object");
    };
    assert_eq!(object.field("a"), Some(&Value::I32(1)));
    assert_eq!(object.field("b"), Some(&Value::I32(9)));
}

#[test]
fn enum_generation_picks_declared_constants() {
    let mut registry = ClassRegistry::new();
    let color = registry
        .register(ClassDef::new(
            "color",
            ClassKind::Enum {
                constants: vec!["RED".into(), "GREEN".into(), "BLUE".into()],
            },
        ))
        .expect("register color");
    let config = EngineConfig::new(registry);
    let value = generate_with_spec(&config, &TypeExpr::class(color), None).expect("random pick");
    let Value::Enum { constant, .. } = &value else {
        panic!("expected an enum constant");
    };
    assert!(["RED", "GREEN", "BLUE"].contains(&constant.as_str()));

    let value = generate_with_spec(&config, &TypeExpr::class(color), Some(json!("BLUE")))
        .expect("literal pick");
    assert!(matches!(value, Value::Enum { constant, .. } if constant == "BLUE"));
}

#[test]
fn dynamic_implementation_precomputes_capability_results() {
    let mut registry = ClassRegistry::new();
    let greeter = registry
        .register(ClassDef::new(
            "greeter",
            ClassKind::Interface {
                methods: vec![
                    MethodDef::new("hello", vec![], TypeExpr::class(ClassId::STR)),
                    MethodDef::new("count", vec![], TypeExpr::class(ClassId::I32)),
                ],
                extends: vec![],
            },
        ))
        .expect("register greeter");
    let config = EngineConfig::new(registry);
    let value = generate_with_spec(
        &config,
        &TypeExpr::class(greeter),
        Some(json!({"hello()": "hi", "count()": 3})),
    )
    .expect("synthesize greeter");
    let Value::Synthetic(synthetic) = &value else {
        panic!("expected a synthetic implementation");
    };
    assert_eq!(
        synthetic.invoke(config.registry(), "hello()").unwrap(),
        &Value::Str("hi".to_string())
    );
    assert_eq!(
        synthetic.invoke(config.registry(), "count()").unwrap(),
        &Value::I32(3)
    );
    let error = synthetic
        .invoke(config.registry(), "absent()")
        .expect_err("uncovered capability");
    assert!(error.to_string().contains("absent()"));
}

#[test]
fn bare_interfaces_are_synthesized_without_a_specification() {
    let mut registry = ClassRegistry::new();
    let greeter = registry
        .register(ClassDef::new(
            "greeter",
            ClassKind::Interface {
                methods: vec![MethodDef::new("hello", vec![], TypeExpr::class(ClassId::STR))],
                extends: vec![],
            },
        ))
        .expect("register greeter");
    let config = EngineConfig::new(registry);
    let value = generate_with_spec(&config, &TypeExpr::class(greeter), None).expect("synthesize");
    let Value::Synthetic(synthetic) = &value else {
        panic!("expected a synthetic implementation");
    };
    assert!(matches!(
        synthetic.invoke(config.registry(), "hello()").unwrap(),
        Value::Str(text) if text.len() == 20
    ));
}

#[test]
fn declared_deferred_assignment_records_the_target() {
    let mut registry = ClassRegistry::new();
    let holder = registry
        .register(ClassDef::new(
            "holder",
            ClassKind::Struct(
                StructDef::new()
                    .with_field(
                        FieldDef::new("owner", TypeExpr::class(ClassId::STR))
                            .with_assignment("ownerRef"),
                    )
                    .with_ctor(vec![]),
            ),
        ))
        .expect("register holder");
    let config = EngineConfig::new(registry);
    let mut ctx = Context::with_seed(None, 0);
    let value = ObjectGenerator::new(config.clone())
        .generate(&TypeExpr::class(holder), &mut ctx)
        .expect("generate holder");
    let Value::Object(object) = &value else {
        panic!("expected an object");
    };
    assert_eq!(
        object.field("owner"),
        Some(&Value::Pending("ownerRef".to_string()))
    );
    assert_eq!(
        ctx.assignments(),
        &[AssignmentMark::Named("ownerRef".to_string())]
    );
}

#[test]
fn pending_static_assignments_defer_the_field() {
    let mut registry = ClassRegistry::new();
    let holder = registry
        .register(ClassDef::new(
            "holder",
            ClassKind::Struct(
                StructDef::new()
                    .with_field(FieldDef::new("owner", TypeExpr::class(ClassId::STR)))
                    .with_ctor(vec![]),
            ),
        ))
        .expect("register holder");
    let config = EngineConfig::new(registry);
    let mut ctx = Context::with_seed(None, 0);
    ctx.register_pending_assignment(holder, "owner");
    let value = ObjectGenerator::new(config)
        .generate(&TypeExpr::class(holder), &mut ctx)
        .expect("generate holder");
    let Value::Object(object) = &value else {
        panic!("expected an object");
    };
    assert_eq!(
        object.field("owner"),
        Some(&Value::Pending("holder.owner".to_string()))
    );
    assert!(matches!(
        ctx.assignments(),
        [AssignmentMark::Field { field, .. }] if field == "owner"
    ));
}

#[test]
fn forced_field_class_wins_when_the_specification_is_silent() {
    let mut registry = ClassRegistry::new();
    let holder = registry
        .register(ClassDef::new(
            "holder",
            ClassKind::Struct(
                StructDef::new()
                    .with_field(
                        FieldDef::new("payload", TypeExpr::class(ClassId::OBJECT))
                            .with_forced(TypeExpr::class(ClassId::BOOL)),
                    )
                    .with_ctor(vec![]),
            ),
        ))
        .expect("register holder");
    let config = EngineConfig::new(registry);
    let value = generate_with_spec(&config, &TypeExpr::class(holder), None).expect("generate");
    let Value::Object(object) = &value else {
        panic!("expected an object");
    };
    assert!(matches!(object.field("payload"), Some(Value::Bool(_))));
}

#[test]
fn self_describing_classes_take_fields_from_the_specification() {
    let mut registry = ClassRegistry::new();
    let bag = registry
        .register(ClassDef::new(
            "bag",
            ClassKind::Struct(StructDef::new().with_ctor(vec![]).dynamic()),
        ))
        .expect("register bag");
    let config = EngineConfig::new(registry);
    let value = generate_with_spec(
        &config,
        &TypeExpr::class(bag),
        Some(json!({"anything": "x", "extra": "y"})),
    )
    .expect("generate bag");
    let Value::Object(object) = &value else {
        panic!("expected an object");
    };
    assert_eq!(object.field("anything"), Some(&Value::Str("x".to_string())));
    assert_eq!(object.field("extra"), Some(&Value::Str("y".to_string())));
}

#[test]
fn inherited_fields_are_populated() {
    let classes = support::item_classes();
    let value = generate_with_spec(
        &classes.config,
        &TypeExpr::class(classes.special_item),
        Some(json!({"i": 7})),
    )
    .expect("generate subclass");
    let Value::Object(object) = &value else {
        panic!("expected an object");
    };
    assert_eq!(object.class, classes.special_item);
    assert_eq!(object.field("i"), Some(&Value::I32(7)));
}

#[test]
fn equal_seeds_generate_equal_graphs() {
    let classes = support::item_classes();
    let ty = TypeExpr::parameterized(ClassId::LIST, vec![TypeExpr::class(classes.item)]);
    let generator = ObjectGenerator::new(classes.config.clone());
    let mut first_ctx = Context::with_seed(None, 42);
    let first = generator.generate(&ty, &mut first_ctx).expect("first");
    let mut second_ctx = Context::with_seed(None, 42);
    let second = generator.generate(&ty, &mut second_ctx).expect("second");
    assert_eq!(
        first.to_json(classes.config.registry()),
        second.to_json(classes.config.registry())
    );
}

proptest! {
    #[test]
    fn unspecified_container_sizes_stay_in_range(seed in any::<u64>()) {
        let classes = support::item_classes();
        let ty = TypeExpr::parameterized(ClassId::LIST, vec![TypeExpr::class(ClassId::I32)]);
        let mut ctx = Context::with_seed(None, seed);
        let value = ObjectGenerator::new(classes.config.clone())
            .generate(&ty, &mut ctx)
            .expect("generate list");
        let Value::Seq(seq) = &value else {
            panic!("expected a sequence");
        };
        prop_assert!((2..5).contains(&seq.items.len()));
    }

    #[test]
    fn literal_integers_round_trip(value in any::<i32>()) {
        let classes = support::item_classes();
        let generated = generate_with_spec(
            &classes.config,
            &TypeExpr::class(classes.item),
            Some(json!({"i": value})),
        )
        .expect("generate item");
        let Value::Object(object) = &generated else {
            panic!("expected an object");
        };
        prop_assert_eq!(object.field("i"), Some(&Value::I32(value)));
    }
}
