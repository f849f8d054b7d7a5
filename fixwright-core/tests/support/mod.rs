//! Shared fixture classes for the integration suites.
#![allow(dead_code)]

use fixwright_core::{
    ClassDef, ClassId, ClassKind, ClassRegistry, EngineConfig, FieldDef, StructDef, TypeExpr,
};

/// A registered base/subclass pair: `item { i: i32 }` and
/// `special_item : item`.
pub struct ItemClasses {
    pub config: EngineConfig,
    pub item: ClassId,
    pub special_item: ClassId,
}

pub fn item_classes() -> ItemClasses {
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
    let special_item = registry
        .register(
            ClassDef::new(
                "special_item",
                ClassKind::Struct(StructDef::new().with_ctor(vec![])),
            )
            .with_supertype(TypeExpr::class(item)),
        )
        .expect("register special_item");
    ItemClasses {
        config: EngineConfig::new(registry),
        item,
        special_item,
    }
}
