use std::collections::HashMap;
use crate::core::error::{Error, Result};
use crate::index::disk_reader::DiskIndexReader;
use crate::iterator::boolean::{Conjunction, Disjunction};
use crate::iterator::feature::FeatureCursor;
use crate::iterator::null::NullCursor;
use crate::iterator::synonym::SynonymCursor;
use crate::iterator::window::WindowCursor;
use crate::iterator::{shared, CursorRef, EstimatorId};
use crate::query::node::Node;

/// Everything a constructor may use to build one cursor
pub struct BuildInput<'a> {
    pub node: &'a Node,
    pub signature: String,
    pub children: Vec<CursorRef>,
    pub index: &'a DiskIndexReader,
    pub estimator: EstimatorId,
    pub scorer: &'a str,
}

pub type Constructor = fn(BuildInput<'_>) -> Result<CursorRef>;

// Built-in operator -> implementation id
const DEFAULT_OPERATORS: &[(&str, &str)] = &[
    ("extents", "extents"),
    ("counts", "counts"),
    ("od", "ordered-window"),
    ("ordered", "ordered-window"),
    ("uw", "unordered-window"),
    ("unordered", "unordered-window"),
    ("syn", "synonym"),
    ("synonym", "synonym"),
    ("band", "conjunction"),
    ("bor", "disjunction"),
    ("feature", "feature"),
    ("combine", "combine"),
    ("null", "null"),
];

/// Maps operator names to cursor constructors.
///
/// Resolution: a session override for the operator, then the built-in
/// mapping, then a constructor registered under the operator name itself.
pub struct OperatorRegistry {
    defaults: HashMap<String, String>,
    overrides: HashMap<String, String>,
    constructors: HashMap<String, Constructor>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        let defaults = DEFAULT_OPERATORS
            .iter()
            .map(|(operator, id)| (operator.to_string(), id.to_string()))
            .collect();

        let mut registry = OperatorRegistry {
            defaults,
            overrides: HashMap::new(),
            constructors: HashMap::new(),
        };
        registry.register("extents", build_extents);
        registry.register("counts", build_counts);
        registry.register("ordered-window", build_ordered);
        registry.register("unordered-window", build_unordered);
        registry.register("synonym", build_synonym);
        registry.register("conjunction", build_conjunction);
        registry.register("disjunction", build_disjunction);
        registry.register("feature", build_feature);
        registry.register("combine", build_combine);
        registry.register("null", build_null);
        registry
    }

    /// Built-ins plus the `operators` overrides of a session config
    pub fn with_overrides(overrides: &HashMap<String, String>) -> Self {
        let mut registry = Self::new();
        for (operator, id) in overrides {
            registry.override_operator(operator, id);
        }
        registry
    }

    pub fn register(&mut self, id: &str, constructor: Constructor) {
        self.constructors.insert(id.to_string(), constructor);
    }

    pub fn override_operator(&mut self, operator: &str, id: &str) {
        self.overrides.insert(operator.to_string(), id.to_string());
    }

    /// Implementation id `node` resolves to, if any
    pub fn implementation_for(&self, node: &Node) -> Option<&str> {
        let operator = node.operator.as_str();
        self.overrides
            .get(operator)
            .or_else(|| self.defaults.get(operator))
            .map(String::as_str)
            .or_else(|| self.constructors.get_key_value(operator).map(|(id, _)| id.as_str()))
    }

    pub fn build(&self, input: BuildInput<'_>) -> Result<CursorRef> {
        let id = self.implementation_for(input.node).ok_or_else(|| {
            Error::unsupported_node(format!("Unknown operator #{}", input.node.operator))
        })?;
        let constructor = self.constructors.get(id).ok_or_else(|| {
            Error::unsupported_node(format!(
                "Operator #{} maps to {}, which has no constructor", input.node.operator, id
            ))
        })?;
        constructor(input)
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn leaf_key(node: &Node) -> Result<String> {
    node.get_string(Node::DEFAULT)
        .or_else(|| node.get_string("term"))
        .ok_or_else(|| Error::unsupported_node(format!("{} names no index key", node)))
}

fn width(node: &Node, default: u32) -> Result<u32> {
    match node.get_long(Node::DEFAULT) {
        Some(width) => u32::try_from(width).map_err(|_| {
            Error::invalid_argument(format!("Window width {} out of range in {}", width, node))
        }),
        None => Ok(default),
    }
}

fn build_extents(input: BuildInput<'_>) -> Result<CursorRef> {
    let key = leaf_key(input.node)?;
    Ok(match input.index.extent_source(key.as_bytes())? {
        Some(source) => shared(source),
        None => shared(NullCursor::new(key)),
    })
}

fn build_counts(input: BuildInput<'_>) -> Result<CursorRef> {
    let key = leaf_key(input.node)?;
    Ok(match input.index.count_source(key.as_bytes())? {
        Some(source) => shared(source),
        None => shared(NullCursor::new(key)),
    })
}

fn build_ordered(input: BuildInput<'_>) -> Result<CursorRef> {
    let width = width(input.node, 1)?;
    Ok(shared(WindowCursor::ordered(input.signature, width, input.children)?))
}

fn build_unordered(input: BuildInput<'_>) -> Result<CursorRef> {
    let default = u32::try_from(input.children.len() * 2).unwrap_or(u32::MAX);
    let width = width(input.node, default)?;
    Ok(shared(WindowCursor::unordered(input.signature, width, input.children)?))
}

fn build_synonym(input: BuildInput<'_>) -> Result<CursorRef> {
    Ok(shared(SynonymCursor::new(input.signature, input.children)?))
}

fn build_conjunction(input: BuildInput<'_>) -> Result<CursorRef> {
    Ok(shared(Conjunction::new(input.signature, input.children)?))
}

fn build_disjunction(input: BuildInput<'_>) -> Result<CursorRef> {
    Ok(shared(Disjunction::counting(input.signature, input.children)?))
}

fn build_combine(input: BuildInput<'_>) -> Result<CursorRef> {
    Ok(shared(Disjunction::combine(input.signature, input.children)?))
}

fn build_feature(input: BuildInput<'_>) -> Result<CursorRef> {
    Ok(shared(FeatureCursor::new(
        input.signature,
        input.children,
        input.estimator,
        input.scorer,
    )?))
}

fn build_null(input: BuildInput<'_>) -> Result<CursorRef> {
    Ok(shared(NullCursor::new(input.signature)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_win_over_defaults() {
        let mut overrides = HashMap::new();
        overrides.insert("a".to_string(), "b".to_string());
        overrides.insert("od".to_string(), "unordered-window".to_string());
        let registry = OperatorRegistry::with_overrides(&overrides);

        assert_eq!(registry.implementation_for(&Node::new("a")), Some("b"));
        assert_eq!(registry.implementation_for(&Node::new("od")), Some("unordered-window"));
        assert_eq!(registry.implementation_for(&Node::new("syn")), Some("synonym"));
        assert_eq!(registry.implementation_for(&Node::new("combine")), Some("combine"));
        assert_eq!(registry.implementation_for(&Node::new("nope")), None);
    }

    #[test]
    fn registered_ids_resolve_by_name() {
        let mut registry = OperatorRegistry::new();
        registry.register("always-null", build_null);
        assert_eq!(registry.implementation_for(&Node::new("always-null")), Some("always-null"));
        assert_eq!(registry.implementation_for(&Node::new("conjunction")), Some("conjunction"));
    }

    #[test]
    fn window_width_parameter() {
        let node = Node::new("od").with_param(Node::DEFAULT, 5i64);
        assert_eq!(width(&node, 1).unwrap(), 5);
        assert_eq!(width(&Node::new("od"), 1).unwrap(), 1);
        assert!(width(&Node::new("od").with_param(Node::DEFAULT, -2i64), 1).is_err());
    }
}
