//! The runtime class universe: registered class descriptors stand in for the
//! reflection the engine would otherwise need.
//!
//! Callers describe every type the engine may touch — fields, constructors,
//! enum constants, interface capabilities, container natures — and the
//! generator and verifier work purely against these descriptors.

use std::collections::BTreeMap;
use std::fmt;

use crate::types::TypeExpr;

/// Copy handle into a [`ClassRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassId(pub(crate) u32);

impl ClassId {
    pub const VOID: ClassId = ClassId(0);
    /// The universal object type: zero fields, zero-arg constructor.
    pub const OBJECT: ClassId = ClassId(1);
    pub const BOOL: ClassId = ClassId(2);
    pub const I32: ClassId = ClassId(3);
    pub const I64: ClassId = ClassId(4);
    pub const F32: ClassId = ClassId(5);
    pub const F64: ClassId = ClassId(6);
    pub const CHAR: ClassId = ClassId(7);
    pub const STR: ClassId = ClassId(8);
    pub const DATE: ClassId = ClassId(9);
    /// The general sequence interface.
    pub const LIST: ClassId = ClassId(10);
    /// The set interface.
    pub const SET: ClassId = ClassId(11);
    /// The associative container interface.
    pub const MAP: ClassId = ClassId(12);
    /// Conventional default implementation for `list`.
    pub const VEC: ClassId = ClassId(13);
    /// Conventional default implementation for `set`.
    pub const HASH_SET: ClassId = ClassId(14);
    /// Conventional default implementation for `map`.
    pub const HASH_MAP: ClassId = ClassId(15);
}

/// Scalar natures with dedicated random generation and conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    I32,
    I64,
    F32,
    F64,
    Char,
    Str,
    Date,
}

/// A field of a registered struct class.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeExpr,
    /// Deferred-assignment marker: generation records the target name
    /// instead of producing a value.
    pub assignment: Option<String>,
    /// Forced element-class marker: generation uses this type when the
    /// specification is silent about the field.
    pub forced: Option<TypeExpr>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
            assignment: None,
            forced: None,
        }
    }

    pub fn with_assignment(mut self, target: impl Into<String>) -> Self {
        self.assignment = Some(target.into());
        self
    }

    pub fn with_forced(mut self, ty: TypeExpr) -> Self {
        self.forced = Some(ty);
        self
    }
}

/// A constructor of a registered struct class.
#[derive(Clone, Debug, PartialEq)]
pub struct CtorDef {
    pub params: Vec<TypeExpr>,
}

impl CtorDef {
    pub fn new(params: Vec<TypeExpr>) -> Self {
        Self { params }
    }
}

/// A capability (method) declared by a registered interface.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodDef {
    pub name: String,
    pub params: Vec<TypeExpr>,
    pub ret: TypeExpr,
}

impl MethodDef {
    pub fn new(name: impl Into<String>, params: Vec<TypeExpr>, ret: TypeExpr) -> Self {
        Self {
            name: name.into(),
            params,
            ret,
        }
    }

    /// `name(t1,t2)` when qualified, bare `name` otherwise.
    pub fn signature(&self, registry: &ClassRegistry, qualified: bool) -> String {
        if !qualified {
            return self.name.clone();
        }
        let params: Vec<String> = self
            .params
            .iter()
            .map(|param| param.display(registry))
            .collect();
        format!("{}({})", self.name, params.join(","))
    }
}

/// Fields, constructors and capabilities of a concrete class.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StructDef {
    pub fields: Vec<FieldDef>,
    pub ctors: Vec<CtorDef>,
    /// Self-describing capability: instances accept arbitrary named fields
    /// straight from the specification sub-tree.
    pub dynamic: bool,
}

impl StructDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_ctor(mut self, params: Vec<TypeExpr>) -> Self {
        self.ctors.push(CtorDef::new(params));
        self
    }

    pub fn dynamic(mut self) -> Self {
        self.dynamic = true;
        self
    }
}

/// The nature of a registered class.
#[derive(Clone, Debug, PartialEq)]
pub enum ClassKind {
    Void,
    /// The universal object type.
    Object,
    Scalar(ScalarKind),
    Enum { constants: Vec<String> },
    List { interface: bool },
    Set { interface: bool },
    Map { interface: bool },
    Interface {
        methods: Vec<MethodDef>,
        extends: Vec<ClassId>,
    },
    Struct(StructDef),
}

/// A registered class descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassDef {
    pub name: String,
    pub kind: ClassKind,
    pub type_params: Vec<String>,
    /// The direct supertype, possibly parameterized over this class's own
    /// type parameters.
    pub supertype: Option<TypeExpr>,
}

impl ClassDef {
    pub fn new(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            type_params: Vec::new(),
            supertype: None,
        }
    }

    pub fn with_type_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.type_params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_supertype(mut self, supertype: TypeExpr) -> Self {
        self.supertype = Some(supertype);
        self
    }
}

/// The class universe for one engine configuration.
pub struct ClassRegistry {
    classes: Vec<ClassDef>,
    by_name: BTreeMap<String, ClassId>,
}

impl ClassRegistry {
    /// A registry holding only the built-in classes.
    pub fn new() -> Self {
        let mut registry = Self {
            classes: Vec::new(),
            by_name: BTreeMap::new(),
        };
        let builtins = [
            ("void", ClassKind::Void),
            ("object", ClassKind::Object),
            ("bool", ClassKind::Scalar(ScalarKind::Bool)),
            ("i32", ClassKind::Scalar(ScalarKind::I32)),
            ("i64", ClassKind::Scalar(ScalarKind::I64)),
            ("f32", ClassKind::Scalar(ScalarKind::F32)),
            ("f64", ClassKind::Scalar(ScalarKind::F64)),
            ("char", ClassKind::Scalar(ScalarKind::Char)),
            ("str", ClassKind::Scalar(ScalarKind::Str)),
            ("date", ClassKind::Scalar(ScalarKind::Date)),
            ("list", ClassKind::List { interface: true }),
            ("set", ClassKind::Set { interface: true }),
            ("map", ClassKind::Map { interface: true }),
            ("vec", ClassKind::List { interface: false }),
            ("hash_set", ClassKind::Set { interface: false }),
            ("hash_map", ClassKind::Map { interface: false }),
        ];
        for (name, kind) in builtins {
            let mut def = ClassDef::new(name, kind);
            def = match name {
                "list" | "set" => def.with_type_params(["E"]),
                "map" => def.with_type_params(["K", "V"]),
                "vec" => def
                    .with_type_params(["E"])
                    .with_supertype(TypeExpr::parameterized(ClassId::LIST, vec![TypeExpr::var("E")])),
                "hash_set" => def
                    .with_type_params(["E"])
                    .with_supertype(TypeExpr::parameterized(ClassId::SET, vec![TypeExpr::var("E")])),
                "hash_map" => def.with_type_params(["K", "V"]).with_supertype(
                    TypeExpr::parameterized(
                        ClassId::MAP,
                        vec![TypeExpr::var("K"), TypeExpr::var("V")],
                    ),
                ),
                _ => def,
            };
            registry
                .register(def)
                .expect("builtin class names are unique");
        }
        registry
    }

    /// Registers a class, failing on a duplicate qualified name.
    pub fn register(&mut self, def: ClassDef) -> Result<ClassId, String> {
        if self.by_name.contains_key(&def.name) {
            return Err(format!("class '{}' already registered", def.name));
        }
        let id = ClassId(self.classes.len() as u32);
        self.by_name.insert(def.name.clone(), id);
        self.classes.push(def);
        Ok(id)
    }

    /// Reserves a name ahead of its definition, so self-referential and
    /// mutually recursive classes can name each other's ids. The placeholder
    /// is an empty concrete class until [`define`](Self::define) fills it in.
    pub fn declare(&mut self, name: impl Into<String>) -> Result<ClassId, String> {
        self.register(ClassDef::new(name, ClassKind::Struct(StructDef::new())))
    }

    /// Completes a previously declared class.
    pub fn define(&mut self, id: ClassId, kind: ClassKind) {
        self.classes[id.0 as usize].kind = kind;
    }

    pub fn get(&self, id: ClassId) -> &ClassDef {
        &self.classes[id.0 as usize]
    }

    pub fn name(&self, id: ClassId) -> &str {
        &self.get(id).name
    }

    pub fn find(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    /// Sequence-natured: list or set.
    pub fn is_collection(&self, id: ClassId) -> bool {
        matches!(
            self.get(id).kind,
            ClassKind::List { .. } | ClassKind::Set { .. }
        )
    }

    pub fn is_set_like(&self, id: ClassId) -> bool {
        matches!(self.get(id).kind, ClassKind::Set { .. })
    }

    pub fn is_map(&self, id: ClassId) -> bool {
        matches!(self.get(id).kind, ClassKind::Map { .. })
    }

    pub fn is_interface(&self, id: ClassId) -> bool {
        match &self.get(id).kind {
            ClassKind::Interface { .. } => true,
            ClassKind::List { interface }
            | ClassKind::Set { interface }
            | ClassKind::Map { interface } => *interface,
            _ => false,
        }
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassRegistry")
            .field("classes", &self.classes.len())
            .finish()
    }
}
