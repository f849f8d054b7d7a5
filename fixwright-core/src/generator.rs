//! Type-directed object graph generation from parameter-state trees.
//!
//! Generation is driven by, and faithfully obeys, the specification tree
//! wherever one is present, falling back to randomness only where the tree
//! is silent. The dispatch recognizes, in order: `definition` merges,
//! structurally empty leaves, `reference` reuse, the dynamic-implementation
//! marker, containers, forced classes, literal values, scalars, arrays,
//! interfaces, and finally concrete instantiation with field population.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use log::debug;
use rand::distributions::{Alphanumeric, DistString};
use rand::Rng;

use crate::class::{ClassId, ClassKind, FieldDef, ScalarKind};
use crate::config::EngineConfig;
use crate::context::{AssignmentMark, Context};
use crate::error::GenerateError;
use crate::param::{ParamNode, ATTR_CLASS, ATTR_DEFINITION, ATTR_REFERENCE, DYNAMIC_CLASS};
use crate::types::{self, TypeExpr, TypeMap};
use crate::value::{SeqKind, SyntheticValue, Value};

/// Unspecified container and array lengths are drawn from `[MIN, MAX)`.
const RANDOM_SIZE_MIN: usize = 2;
const RANDOM_SIZE_MAX: usize = 5;

const RANDOM_STRING_LEN: usize = 20;

/// A class requested by the specification's `class` attribute.
enum Requested {
    Dynamic,
    Class(ClassId),
}

/// Builds object graphs from type descriptors and the context's current
/// specification node.
pub struct ObjectGenerator {
    config: EngineConfig,
}

impl ObjectGenerator {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Generates a value of `ty`, honoring the context's current
    /// specification node. Fails with a typed error rather than ever
    /// producing a wrong-shaped value.
    pub fn generate(&self, ty: &TypeExpr, ctx: &mut Context) -> Result<Value, GenerateError> {
        let display = ty.display(self.config.registry());
        debug!("generating {display} at '{}'", ctx.path());
        self.generate_for_type(ty, &TypeMap::new(), ctx)
            .map_err(|error| error.with_segment(display))
    }

    fn generate_for_type(
        &self,
        ty: &TypeExpr,
        map: &TypeMap,
        ctx: &mut Context,
    ) -> Result<Value, GenerateError> {
        let registry = self.config.registry();
        let raw = types::raw_class(registry, ty);
        let mut state = ctx.current().map(Arc::clone);
        let requested = self.class_from_param(state.as_deref())?;

        if let Some(node) = &state {
            if let Some(definition) = node.attribute(ATTR_DEFINITION) {
                let target = match requested {
                    Some(Requested::Class(forced)) => forced,
                    _ => raw,
                };
                let loaded = self.config.loader().load(registry, target, definition)?;
                let merged = Arc::new(self.config.merger().merge(&loaded, node));
                ctx.replace_current(Arc::clone(&merged));
                state = Some(merged);
            }
        }

        if let Some(node) = &state {
            if node.size_param().is_none() && node.value().is_none() {
                return Ok(Value::Null);
            }
            if let Some(name) = node.attribute(ATTR_REFERENCE) {
                return ctx.find_reference(name).ok_or_else(|| {
                    GenerateError::illegal_argument(format!("reference '{name}' not registered"))
                });
            }
        }

        if matches!(requested, Some(Requested::Dynamic)) {
            return self.synthesize(ty, map, ctx);
        }
        if registry.is_collection(raw) {
            return self.fill_collection(ty, map, ctx);
        }
        if registry.is_map(raw) {
            return self.fill_map(ty, map, ctx);
        }
        if let Some(Requested::Class(forced)) = requested {
            return self.generate_for_class(forced, map, ctx);
        }
        if let TypeExpr::Array(component) = ty {
            return self.fill_array(component, map, ctx);
        }
        if let Some(node) = &state {
            if node.is_leaf() {
                let text = node.value().unwrap_or_default();
                return self.config.converter().convert(registry, raw, text);
            }
        }
        if registry.is_interface(raw) {
            return self.synthesize(ty, map, ctx);
        }
        match ty {
            TypeExpr::Parameterized { .. } => {
                let bindings = types::type_map(registry, ty, map);
                self.instantiate_and_fill(raw, &bindings, ctx)
            }
            TypeExpr::Class(class) => self.generate_for_class(*class, map, ctx),
            // unresolved variables and informationless wildcards already
            // collapsed to their raw class
            _ => self.generate_for_class(raw, map, ctx),
        }
    }

    /// Class-directed generation, used once a concrete class is settled:
    /// literal conversion, random scalars and enum picks, or instantiation.
    fn generate_for_class(
        &self,
        class: ClassId,
        map: &TypeMap,
        ctx: &mut Context,
    ) -> Result<Value, GenerateError> {
        let registry = self.config.registry();
        if let Some(node) = ctx.current() {
            if node.is_leaf() {
                return match node.value() {
                    Some(text) => self.config.converter().convert(registry, class, text),
                    None => Ok(Value::Null),
                };
            }
        }
        match &registry.get(class).kind {
            ClassKind::Void => Ok(Value::Null),
            ClassKind::Object => Ok(Value::object(class, BTreeMap::new())),
            ClassKind::Scalar(kind) => Ok(random_scalar(*kind, ctx)),
            ClassKind::Enum { constants } => {
                if constants.is_empty() {
                    return Err(GenerateError::illegal_argument(format!(
                        "enum '{}' declares no constants",
                        registry.name(class)
                    )));
                }
                let index = ctx.rng().gen_range(0..constants.len());
                Ok(Value::Enum {
                    class,
                    constant: constants[index].clone(),
                })
            }
            ClassKind::List { .. } | ClassKind::Set { .. } => {
                self.fill_collection(&TypeExpr::class(class), map, ctx)
            }
            ClassKind::Map { .. } => self.fill_map(&TypeExpr::class(class), map, ctx),
            ClassKind::Interface { .. } => self.synthesize(&TypeExpr::class(class), map, ctx),
            ClassKind::Struct(_) => {
                let bindings = types::type_map(registry, &TypeExpr::class(class), map);
                self.instantiate_and_fill(class, &bindings, ctx)
            }
        }
    }

    fn class_from_param(&self, state: Option<&ParamNode>) -> Result<Option<Requested>, GenerateError> {
        let Some(node) = state else {
            return Ok(None);
        };
        let name = node.attribute(ATTR_CLASS).map(str::to_string).or_else(|| {
            node.element(ATTR_CLASS)
                .and_then(|child| child.value())
                .map(str::to_string)
        });
        let Some(name) = name else {
            return Ok(None);
        };
        if name == DYNAMIC_CLASS {
            return Ok(Some(Requested::Dynamic));
        }
        match self.config.registry().find(&name) {
            Some(class) => Ok(Some(Requested::Class(class))),
            None => Err(GenerateError::conversion("class", name, "unknown class")),
        }
    }

    fn fill_array(
        &self,
        component: &TypeExpr,
        map: &TypeMap,
        ctx: &mut Context,
    ) -> Result<Value, GenerateError> {
        let registry = self.config.registry();
        let component = types::type_proxy(component, map);
        let component_class = types::raw_class(registry, &component);
        let size = self.element_count(ctx);
        let mut items = Vec::with_capacity(size);
        for index in 0..size {
            ctx.enter("array", index.to_string());
            let value = self
                .generate_for_type(&component, map, ctx)
                .map_err(|error| error.with_segment(index.to_string()))?;
            ctx.leave(&value);
            items.push(value);
        }
        Ok(Value::seq(component_class, SeqKind::Array, items))
    }

    fn fill_collection(
        &self,
        ty: &TypeExpr,
        map: &TypeMap,
        ctx: &mut Context,
    ) -> Result<Value, GenerateError> {
        let registry = self.config.registry();
        let declared = types::raw_class(registry, ty);
        let container = self.container_class(declared, ctx, |class| {
            registry.is_collection(class)
        })?;
        let set_like = registry.is_set_like(container);
        let bounding = if registry.is_set_like(declared) {
            ClassId::SET
        } else {
            ClassId::LIST
        };
        let element = types::parameter_type(registry, ty, bounding, 0, map);
        let element = types::effective(&types::type_proxy(&element, map));
        let size = self.element_count(ctx);
        let mut items: Vec<Value> = Vec::with_capacity(size);
        for index in 0..size {
            ctx.enter("collection", index.to_string());
            let value = self
                .generate_for_type(&element, map, ctx)
                .map_err(|error| error.with_segment(index.to_string()))?;
            ctx.leave(&value);
            // set semantics: final membership, not insertion count
            if set_like && items.contains(&value) {
                continue;
            }
            items.push(value);
        }
        let kind = if set_like { SeqKind::Set } else { SeqKind::List };
        Ok(Value::seq(container, kind, items))
    }

    fn fill_map(
        &self,
        ty: &TypeExpr,
        map: &TypeMap,
        ctx: &mut Context,
    ) -> Result<Value, GenerateError> {
        let registry = self.config.registry();
        let declared = types::raw_class(registry, ty);
        let container = self.container_class(declared, ctx, |class| registry.is_map(class))?;
        let key_type = types::parameter_type(registry, ty, ClassId::MAP, 0, map);
        let key_type = types::effective(&types::type_proxy(&key_type, map));
        let value_type = types::parameter_type(registry, ty, ClassId::MAP, 1, map);
        let value_type = types::effective(&types::type_proxy(&value_type, map));
        let size = self.element_count(ctx);
        let mut entries: Vec<(Value, Value)> = Vec::with_capacity(size);
        for index in 0..size {
            ctx.enter("map", index.to_string());
            ctx.enter("entry", "key");
            let key = self
                .generate_for_type(&key_type, map, ctx)
                .map_err(|error| error.with_segment(format!("{index}.key")))?;
            ctx.leave(&key);
            ctx.enter("entry", "value");
            let value = self
                .generate_for_type(&value_type, map, ctx)
                .map_err(|error| error.with_segment(format!("{index}.value")))?;
            ctx.leave(&value);
            ctx.leave(&Value::Null);
            // final membership: an equal key replaces the earlier entry
            entries.retain(|(existing, _)| existing != &key);
            entries.push((key, value));
        }
        Ok(Value::map(container, entries))
    }

    /// Resolves the concrete container implementation: a forced `class`
    /// wins, interfaces get their conventional default, concrete declared
    /// types stand.
    fn container_class(
        &self,
        declared: ClassId,
        ctx: &Context,
        accepts: impl Fn(ClassId) -> bool,
    ) -> Result<ClassId, GenerateError> {
        let registry = self.config.registry();
        if let Some(name) = ctx.current().and_then(|node| node.attribute(ATTR_CLASS)) {
            let forced = registry
                .find(name)
                .ok_or_else(|| GenerateError::conversion("class", name, "unknown class"))?;
            if !accepts(forced) {
                return Err(GenerateError::illegal_argument(format!(
                    "class '{}' is not a usable container implementation",
                    registry.name(forced)
                )));
            }
            return Ok(forced);
        }
        if registry.is_interface(declared) {
            return Ok(if registry.is_set_like(declared) {
                ClassId::HASH_SET
            } else if registry.is_map(declared) {
                ClassId::HASH_MAP
            } else {
                ClassId::VEC
            });
        }
        Ok(declared)
    }

    fn element_count(&self, ctx: &mut Context) -> usize {
        match ctx.current().and_then(|node| node.size_param()) {
            Some(size) => size,
            None => ctx.rng().gen_range(RANDOM_SIZE_MIN..RANDOM_SIZE_MAX),
        }
    }

    /// Synthesizes a dynamic implementation of an interface: every declared
    /// capability of the interface and its ancestors gets an eagerly
    /// generated result, cached by qualified signature.
    fn synthesize(
        &self,
        ty: &TypeExpr,
        map: &TypeMap,
        ctx: &mut Context,
    ) -> Result<Value, GenerateError> {
        ctx.check_depth()?;
        let registry = self.config.registry();
        let raw = types::raw_class(registry, ty);
        if !matches!(registry.get(raw).kind, ClassKind::Interface { .. }) {
            return Err(GenerateError::illegal_argument(format!(
                "class '{}' is not an interface; nothing to synthesize",
                registry.name(raw)
            )));
        }
        let mut results = BTreeMap::new();
        let mut seen = BTreeSet::new();
        let mut worklist = vec![(raw, types::type_map(registry, ty, map))];
        while let Some((iface, bindings)) = worklist.pop() {
            let ClassKind::Interface { methods, extends } = &registry.get(iface).kind else {
                continue;
            };
            for method in methods {
                let qualified = method.signature(registry, true);
                if !seen.insert(qualified.clone()) {
                    continue;
                }
                // the specification may address a capability by its
                // qualified signature or by bare name
                let key = match ctx.current().and_then(|node| node.element(&qualified)) {
                    Some(_) => qualified.clone(),
                    None => method.signature(registry, false),
                };
                ctx.enter(registry.name(iface).to_string(), key.clone());
                let ret = types::type_proxy(&method.ret, &bindings);
                let value = self
                    .generate_for_type(&ret, &bindings, ctx)
                    .map_err(|error| error.with_segment(key))?;
                results.insert(qualified, value.clone());
                ctx.leave(&value);
            }
            for parent in extends {
                let parent_bindings =
                    types::type_map(registry, &TypeExpr::class(*parent), &TypeMap::new());
                worklist.push((*parent, parent_bindings));
            }
        }
        Ok(Value::Synthetic(Arc::new(SyntheticValue {
            class: raw,
            results,
        })))
    }

    /// Instantiates a concrete class through its fewest-parameter
    /// constructor, then populates its fields.
    fn instantiate_and_fill(
        &self,
        class: ClassId,
        bindings: &TypeMap,
        ctx: &mut Context,
    ) -> Result<Value, GenerateError> {
        let registry = self.config.registry();
        let def = registry.get(class);
        let ClassKind::Struct(struct_def) = &def.kind else {
            return Err(GenerateError::initialization(
                def.name.clone(),
                "not a concrete class",
            ));
        };
        let ctor = struct_def
            .ctors
            .iter()
            .min_by_key(|ctor| ctor.params.len())
            .ok_or_else(|| {
                GenerateError::initialization(def.name.clone(), "no constructor declared")
            })?;
        for (index, param) in ctor.params.iter().enumerate() {
            let param = types::type_proxy(param, bindings);
            ctx.enter(def.name.clone(), format!("<init[{index}]>"));
            ctx.set_empty();
            let value = self
                .generate_for_type(&param, &TypeMap::new(), ctx)
                .map_err(|error| error.with_segment(format!("<init[{index}]>")))?;
            ctx.leave(&value);
        }
        let mut fields = BTreeMap::new();
        self.fill_fields(class, &mut fields, bindings, ctx)?;
        Ok(Value::object(class, fields))
    }

    fn fill_fields(
        &self,
        class: ClassId,
        fields: &mut BTreeMap<String, Value>,
        bindings: &TypeMap,
        ctx: &mut Context,
    ) -> Result<(), GenerateError> {
        ctx.check_depth()?;
        let registry = self.config.registry();
        let def = registry.get(class);
        let self_describing = matches!(&def.kind, ClassKind::Struct(s) if s.dynamic);
        let structured = ctx.current().map_or(false, |node| !node.is_leaf());
        if self_describing && structured {
            let names: Vec<String> = ctx
                .current()
                .map(|node| node.names().map(str::to_string).collect())
                .unwrap_or_default();
            for name in names {
                ctx.enter(def.name.clone(), name.clone());
                let value = self
                    .generate_for_type(&TypeExpr::class(ClassId::OBJECT), bindings, ctx)
                    .map_err(|error| error.with_segment(name.clone()))?;
                fields.insert(name, value.clone());
                ctx.leave(&value);
            }
            return Ok(());
        }
        for (field, field_bindings) in self.collect_fields(class, bindings) {
            self.fill_field(class, &field, fields, &field_bindings, ctx)?;
        }
        Ok(())
    }

    /// Own and inherited assignable fields, with the substitutions in force
    /// at each declaration level. Shadowed names keep the subclass field.
    fn collect_fields(&self, class: ClassId, bindings: &TypeMap) -> Vec<(FieldDef, TypeMap)> {
        let registry = self.config.registry();
        let mut out = Vec::new();
        let mut seen = BTreeSet::new();
        let mut raw = class;
        let mut level_bindings = bindings.clone();
        loop {
            let def = registry.get(raw);
            if let ClassKind::Struct(struct_def) = &def.kind {
                for field in &struct_def.fields {
                    if seen.insert(field.name.clone()) {
                        out.push((field.clone(), level_bindings.clone()));
                    }
                }
            }
            let Some(supertype) = def.supertype.clone() else {
                break;
            };
            let supertype = types::type_proxy(&supertype, &level_bindings);
            level_bindings = types::type_map(registry, &supertype, &TypeMap::new());
            raw = types::raw_class(registry, &supertype);
        }
        out
    }

    fn fill_field(
        &self,
        owner: ClassId,
        field: &FieldDef,
        fields: &mut BTreeMap<String, Value>,
        bindings: &TypeMap,
        ctx: &mut Context,
    ) -> Result<(), GenerateError> {
        let registry = self.config.registry();
        ctx.enter(registry.name(owner).to_string(), field.name.clone());
        let unspecified = ctx.current().is_none();
        let produced = if unspecified && ctx.is_assignment_pending(owner, &field.name) {
            ctx.record_assignment(AssignmentMark::Field {
                class: owner,
                field: field.name.clone(),
            });
            Ok(Value::Pending(format!(
                "{}.{}",
                registry.name(owner),
                field.name
            )))
        } else if unspecified && field.assignment.is_some() {
            let target = field.assignment.clone().expect("assignment marker");
            ctx.record_assignment(AssignmentMark::Named(target.clone()));
            Ok(Value::Pending(target))
        } else if unspecified && field.forced.is_some() {
            let forced = field.forced.clone().expect("forced marker");
            ctx.set_empty();
            self.generate_for_type(&types::type_proxy(&forced, bindings), bindings, ctx)
        } else {
            self.generate_for_type(&types::type_proxy(&field.ty, bindings), bindings, ctx)
        };
        let value = produced.map_err(|error| error.with_segment(field.name.clone()))?;
        fields.insert(field.name.clone(), value.clone());
        ctx.leave(&value);
        Ok(())
    }
}

fn random_scalar(kind: ScalarKind, ctx: &mut Context) -> Value {
    let rng = ctx.rng();
    match kind {
        ScalarKind::Bool => Value::Bool(rng.gen()),
        ScalarKind::I32 => Value::I32(rng.gen()),
        ScalarKind::I64 => Value::I64(rng.gen()),
        ScalarKind::F32 => Value::F32(rng.gen()),
        ScalarKind::F64 => Value::F64(rng.gen()),
        ScalarKind::Char => {
            let sampled = Alphanumeric.sample_string(rng, 1);
            Value::Char(sampled.chars().next().expect("sampled char"))
        }
        ScalarKind::Str => Value::Str(Alphanumeric.sample_string(rng, RANDOM_STRING_LEN)),
        ScalarKind::Date => Value::Date(rng.gen()),
    }
}
