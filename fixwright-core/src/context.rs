//! Per-call traversal state: path, current specification node, reference
//! registry, deferred assignments and the seeded random source.
//!
//! One context serves exactly one top-level generation or verification call;
//! it is never shared between concurrently executing calls.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, OnceLock};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::class::ClassId;
use crate::error::GenerateError;
use crate::param::ParamNode;
use crate::value::Value;

/// Recursion ceiling: deeper nesting signals a likely cyclic type graph.
pub const MAX_DEPTH: usize = 20;

fn empty_node() -> Arc<ParamNode> {
    static EMPTY: OnceLock<Arc<ParamNode>> = OnceLock::new();
    Arc::clone(EMPTY.get_or_init(|| Arc::new(ParamNode::structured())))
}

/// A population deliberately deferred rather than value-generated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssignmentMark {
    /// A pending owner/field pair.
    Field { class: ClassId, field: String },
    /// A declared deferral target awaiting external resolution.
    Named(String),
}

#[derive(Debug)]
struct Segment {
    #[allow(dead_code)]
    owner: String,
    key: String,
}

/// Call-scoped traversal state shared by the generator's recursion.
#[derive(Debug)]
pub struct Context {
    segments: Vec<Segment>,
    nodes: Vec<Option<Arc<ParamNode>>>,
    root: Option<Arc<ParamNode>>,
    references: BTreeMap<String, Value>,
    pending_static: BTreeSet<(ClassId, String)>,
    marks: Vec<AssignmentMark>,
    produced: BTreeMap<String, Value>,
    rng: StdRng,
}

impl Context {
    /// A context over an optional root specification node, with an
    /// entropy-seeded random source.
    pub fn new(root: Option<Arc<ParamNode>>) -> Self {
        Self::build(root, StdRng::from_entropy())
    }

    /// A deterministic context: equal seeds produce equal graphs.
    pub fn with_seed(root: Option<Arc<ParamNode>>, seed: u64) -> Self {
        Self::build(root, StdRng::seed_from_u64(seed))
    }

    fn build(root: Option<Arc<ParamNode>>, rng: StdRng) -> Self {
        Self {
            segments: Vec::new(),
            nodes: Vec::new(),
            root,
            references: BTreeMap::new(),
            pending_static: BTreeSet::new(),
            marks: Vec::new(),
            produced: BTreeMap::new(),
            rng,
        }
    }

    /// The specification node the traversal currently sits on.
    pub fn current(&self) -> Option<&Arc<ParamNode>> {
        match self.nodes.last() {
            Some(node) => node.as_ref(),
            None => self.root.as_ref(),
        }
    }

    /// Descends one path segment: the current node becomes the child keyed
    /// by `key`, or absent when the specification is silent there.
    pub fn enter(&mut self, owner: impl Into<String>, key: impl Into<String>) {
        let key = key.into();
        let child = self
            .current()
            .and_then(|node| node.element(&key))
            .map(Arc::clone);
        self.segments.push(Segment {
            owner: owner.into(),
            key,
        });
        self.nodes.push(child);
    }

    /// Ascends one segment, exposing `value` as the most recently produced
    /// value at the path being left.
    pub fn leave(&mut self, value: &Value) {
        self.produced.insert(self.path(), value.clone());
        self.segments.pop();
        self.nodes.pop();
    }

    /// Pins an empty structured node as the current specification; used for
    /// constructor parameters, which are never individually addressable.
    pub fn set_empty(&mut self) {
        self.replace_current(empty_node());
    }

    /// Swaps the current node, e.g. after a `definition` merge.
    pub fn replace_current(&mut self, node: Arc<ParamNode>) {
        match self.nodes.last_mut() {
            Some(slot) => *slot = Some(node),
            None => self.root = Some(node),
        }
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn check_depth(&self) -> Result<(), GenerateError> {
        if self.depth() > MAX_DEPTH {
            return Err(GenerateError::possible_cycle(self.depth()));
        }
        Ok(())
    }

    /// The dotted path of entered keys, for diagnostics and produced-value
    /// lookups.
    pub fn path(&self) -> String {
        let keys: Vec<&str> = self
            .segments
            .iter()
            .map(|segment| segment.key.as_str())
            .collect();
        keys.join(".")
    }

    /// Registers a generated object under a reference name; names are
    /// write-once.
    pub fn register_reference(
        &mut self,
        name: impl Into<String>,
        value: Value,
    ) -> Result<(), GenerateError> {
        let name = name.into();
        if self.references.contains_key(&name) {
            return Err(GenerateError::illegal_argument(format!(
                "reference '{name}' already registered"
            )));
        }
        self.references.insert(name, value);
        Ok(())
    }

    pub fn find_reference(&self, name: &str) -> Option<Value> {
        self.references.get(name).cloned()
    }

    /// Pre-registers an owner/field pair whose population must be deferred.
    pub fn register_pending_assignment(&mut self, class: ClassId, field: impl Into<String>) {
        self.pending_static.insert((class, field.into()));
    }

    pub fn is_assignment_pending(&self, class: ClassId, field: &str) -> bool {
        self.pending_static
            .contains(&(class, field.to_string()))
    }

    /// Records a deferral encountered during generation.
    pub fn record_assignment(&mut self, mark: AssignmentMark) {
        self.marks.push(mark);
    }

    /// Deferrals recorded during this call, in encounter order.
    pub fn assignments(&self) -> &[AssignmentMark] {
        &self.marks
    }

    /// The most recently produced value at a dotted path, if any.
    pub fn produced(&self, path: &str) -> Option<&Value> {
        self.produced.get(path)
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}
