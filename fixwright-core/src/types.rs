//! Generic type expressions and their resolution to concrete classes.
//!
//! Types are modeled as an explicit expression tree — raw class, type
//! variable, parameterized type, array, wildcard — with a resolver pass
//! producing a concrete class per node. Wildcard upper bounds resolve to
//! their bound; lower-bounded and unbounded wildcards resolve to the
//! universal `object` type.

use std::collections::BTreeMap;

use crate::class::{ClassId, ClassRegistry};

/// Type-variable substitutions in scope at a point of resolution.
pub type TypeMap = BTreeMap<String, TypeExpr>;

/// A generic type expression.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeExpr {
    /// A raw registered class.
    Class(ClassId),
    /// A free type variable.
    Var(String),
    /// A class applied to type arguments.
    Parameterized { raw: ClassId, args: Vec<TypeExpr> },
    /// An array of some component type.
    Array(Box<TypeExpr>),
    /// A wildcard, optionally bounded from above or below.
    Wildcard {
        upper: Option<Box<TypeExpr>>,
        lower: Option<Box<TypeExpr>>,
    },
}

impl TypeExpr {
    pub fn class(id: ClassId) -> Self {
        TypeExpr::Class(id)
    }

    pub fn var(name: impl Into<String>) -> Self {
        TypeExpr::Var(name.into())
    }

    pub fn parameterized(raw: ClassId, args: Vec<TypeExpr>) -> Self {
        TypeExpr::Parameterized { raw, args }
    }

    pub fn array(component: TypeExpr) -> Self {
        TypeExpr::Array(Box::new(component))
    }

    pub fn wildcard() -> Self {
        TypeExpr::Wildcard {
            upper: None,
            lower: None,
        }
    }

    pub fn wildcard_extends(bound: TypeExpr) -> Self {
        TypeExpr::Wildcard {
            upper: Some(Box::new(bound)),
            lower: None,
        }
    }

    pub fn wildcard_super(bound: TypeExpr) -> Self {
        TypeExpr::Wildcard {
            upper: None,
            lower: Some(Box::new(bound)),
        }
    }

    /// Human-readable form used in error breadcrumbs and signatures.
    pub fn display(&self, registry: &ClassRegistry) -> String {
        match self {
            TypeExpr::Class(id) => registry.name(*id).to_string(),
            TypeExpr::Var(name) => name.clone(),
            TypeExpr::Parameterized { raw, args } => {
                let args: Vec<String> = args.iter().map(|arg| arg.display(registry)).collect();
                format!("{}<{}>", registry.name(*raw), args.join(","))
            }
            TypeExpr::Array(component) => format!("{}[]", component.display(registry)),
            TypeExpr::Wildcard { upper, lower } => match (upper, lower) {
                (Some(bound), _) => format!("? extends {}", bound.display(registry)),
                (None, Some(bound)) => format!("? super {}", bound.display(registry)),
                (None, None) => "?".to_string(),
            },
        }
    }
}

/// The raw class behind a type expression.
///
/// Unresolved variables and informationless wildcards fall back to the
/// universal `object` class; arrays have no registered class of their own
/// and are dispatched before raw resolution by the generator.
pub fn raw_class(registry: &ClassRegistry, ty: &TypeExpr) -> ClassId {
    match ty {
        TypeExpr::Class(id) => *id,
        TypeExpr::Parameterized { raw, .. } => *raw,
        TypeExpr::Var(_) | TypeExpr::Array(_) => ClassId::OBJECT,
        TypeExpr::Wildcard { upper, .. } => match upper {
            Some(bound) => raw_class(registry, bound),
            None => ClassId::OBJECT,
        },
    }
}

/// Resolves a wildcard to its effective type: the upper bound when present,
/// the universal `object` type otherwise. Non-wildcards pass through.
pub fn effective(ty: &TypeExpr) -> TypeExpr {
    match ty {
        TypeExpr::Wildcard { upper, .. } => match upper {
            Some(bound) => effective(bound),
            None => TypeExpr::Class(ClassId::OBJECT),
        },
        other => other.clone(),
    }
}

/// Substitutes free type variables from `map`, leaving unknown variables in
/// place.
pub fn type_proxy(ty: &TypeExpr, map: &TypeMap) -> TypeExpr {
    match ty {
        TypeExpr::Var(name) => map.get(name).cloned().unwrap_or_else(|| ty.clone()),
        TypeExpr::Parameterized { raw, args } => TypeExpr::Parameterized {
            raw: *raw,
            args: args.iter().map(|arg| type_proxy(arg, map)).collect(),
        },
        TypeExpr::Array(component) => TypeExpr::array(type_proxy(component, map)),
        TypeExpr::Wildcard { upper, lower } => TypeExpr::Wildcard {
            upper: upper
                .as_ref()
                .map(|bound| Box::new(type_proxy(bound, map))),
            lower: lower
                .as_ref()
                .map(|bound| Box::new(type_proxy(bound, map))),
        },
        TypeExpr::Class(_) => ty.clone(),
    }
}

/// Bindings of the raw class's declared type parameters as instantiated by
/// `ty`, with `enclosing` substitutions applied to the arguments. A raw
/// (unparameterized) use binds every declared parameter to `object`.
pub fn type_map(registry: &ClassRegistry, ty: &TypeExpr, enclosing: &TypeMap) -> TypeMap {
    let mut map = TypeMap::new();
    match ty {
        TypeExpr::Parameterized { raw, args } => {
            let params = &registry.get(*raw).type_params;
            for (param, arg) in params.iter().zip(args) {
                map.insert(param.clone(), type_proxy(arg, enclosing));
            }
        }
        TypeExpr::Class(id) => {
            for param in &registry.get(*id).type_params {
                map.insert(param.clone(), TypeExpr::Class(ClassId::OBJECT));
            }
        }
        _ => {}
    }
    map
}

/// The actual type argument at `index` of `bounding` as instantiated by
/// `ty`, walking the supertype chain with substitution. Raw uses and broken
/// chains yield the universal `object` type.
pub fn parameter_type(
    registry: &ClassRegistry,
    ty: &TypeExpr,
    bounding: ClassId,
    index: usize,
    map: &TypeMap,
) -> TypeExpr {
    let mut current = effective(&type_proxy(ty, map));
    loop {
        let raw = raw_class(registry, &current);
        if raw == bounding {
            return match &current {
                TypeExpr::Parameterized { args, .. } => args
                    .get(index)
                    .cloned()
                    .unwrap_or(TypeExpr::Class(ClassId::OBJECT)),
                _ => TypeExpr::Class(ClassId::OBJECT),
            };
        }
        let Some(supertype) = registry.get(raw).supertype.clone() else {
            return TypeExpr::Class(ClassId::OBJECT);
        };
        let bindings = type_map(registry, &current, &TypeMap::new());
        current = effective(&type_proxy(&supertype, &bindings));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcards_resolve_to_bound_or_object() {
        let registry = ClassRegistry::new();
        let extends = TypeExpr::wildcard_extends(TypeExpr::class(ClassId::I32));
        assert_eq!(raw_class(&registry, &extends), ClassId::I32);
        assert_eq!(effective(&extends), TypeExpr::class(ClassId::I32));

        let supered = TypeExpr::wildcard_super(TypeExpr::class(ClassId::I32));
        assert_eq!(raw_class(&registry, &supered), ClassId::OBJECT);
        assert_eq!(effective(&supered), TypeExpr::class(ClassId::OBJECT));

        assert_eq!(
            effective(&TypeExpr::wildcard()),
            TypeExpr::class(ClassId::OBJECT)
        );
    }

    #[test]
    fn parameter_type_reads_direct_arguments() {
        let registry = ClassRegistry::new();
        let ty = TypeExpr::parameterized(ClassId::LIST, vec![TypeExpr::class(ClassId::I64)]);
        let element = parameter_type(&registry, &ty, ClassId::LIST, 0, &TypeMap::new());
        assert_eq!(element, TypeExpr::class(ClassId::I64));
    }

    #[test]
    fn parameter_type_walks_the_supertype_chain() {
        let registry = ClassRegistry::new();
        // vec<str> is declared as vec<E> : list<E>
        let ty = TypeExpr::parameterized(ClassId::VEC, vec![TypeExpr::class(ClassId::STR)]);
        let element = parameter_type(&registry, &ty, ClassId::LIST, 0, &TypeMap::new());
        assert_eq!(element, TypeExpr::class(ClassId::STR));
    }

    #[test]
    fn raw_container_uses_yield_object_elements() {
        let registry = ClassRegistry::new();
        let element = parameter_type(
            &registry,
            &TypeExpr::class(ClassId::LIST),
            ClassId::LIST,
            0,
            &TypeMap::new(),
        );
        assert_eq!(element, TypeExpr::class(ClassId::OBJECT));
    }

    #[test]
    fn proxy_substitutes_nested_variables() {
        let mut map = TypeMap::new();
        map.insert("E".to_string(), TypeExpr::class(ClassId::BOOL));
        let ty = TypeExpr::parameterized(
            ClassId::LIST,
            vec![TypeExpr::wildcard_extends(TypeExpr::var("E"))],
        );
        let proxied = type_proxy(&ty, &map);
        assert_eq!(
            proxied,
            TypeExpr::parameterized(
                ClassId::LIST,
                vec![TypeExpr::wildcard_extends(TypeExpr::class(ClassId::BOOL))],
            )
        );
    }

    #[test]
    fn display_renders_wildcard_forms() {
        let registry = ClassRegistry::new();
        let ty = TypeExpr::parameterized(
            ClassId::LIST,
            vec![TypeExpr::wildcard_extends(TypeExpr::class(ClassId::I32))],
        );
        assert_eq!(ty.display(&registry), "list<? extends i32>");
        assert_eq!(
            TypeExpr::array(TypeExpr::class(ClassId::CHAR)).display(&registry),
            "char[]"
        );
    }
}
