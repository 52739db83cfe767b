use std::collections::BTreeMap;
use std::fmt;
use serde::{Serialize, Deserialize};

/// Parameter value attached to a query node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Long(i64),
    Double(f64),
    String(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Long(n) => write!(f, "{}", n),
            ParamValue::Double(d) => write!(f, "{}", d),
            ParamValue::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::String(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::String(s)
    }
}

impl From<i64> for ParamValue {
    fn from(n: i64) -> Self {
        ParamValue::Long(n)
    }
}

impl From<u64> for ParamValue {
    fn from(n: u64) -> Self {
        ParamValue::Long(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

impl From<f64> for ParamValue {
    fn from(d: f64) -> Self {
        ParamValue::Double(d)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

/// One node of a structured query: operator, named parameters, children.
///
/// Parameters are kept sorted so the canonical text form is stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub operator: String,
    pub parameters: BTreeMap<String, ParamValue>,
    pub children: Vec<Node>,
}

impl Node {
    pub const DEFAULT: &'static str = "default";

    pub fn new(operator: impl Into<String>) -> Self {
        Node {
            operator: operator.into(),
            parameters: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Leaf over one index key, positions included
    pub fn term(key: &str) -> Self {
        Node::new("extents").with_param(Self::DEFAULT, key)
    }

    /// Leaf over one index key, counts only
    pub fn counts(key: &str) -> Self {
        Node::new("counts").with_param(Self::DEFAULT, key)
    }

    pub fn with_param(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.parameters.insert(name.to_string(), value.into());
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn set_param(&mut self, name: &str, value: impl Into<ParamValue>) {
        self.parameters.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.parameters.get(name)
    }

    pub fn get_string(&self, name: &str) -> Option<String> {
        self.parameters.get(name).map(|value| value.to_string())
    }

    pub fn get_long(&self, name: &str) -> Option<i64> {
        match self.parameters.get(name)? {
            ParamValue::Long(n) => Some(*n),
            ParamValue::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn get_double(&self, name: &str) -> Option<f64> {
        match self.parameters.get(name)? {
            ParamValue::Double(d) => Some(*d),
            ParamValue::Long(n) => Some(*n as f64),
            ParamValue::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.parameters.get(name)? {
            ParamValue::Bool(b) => Some(*b),
            ParamValue::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.children.get(index)
    }

    /// Name used for synthetic-count lookups and statistics: the explicit
    /// `key` parameter, otherwise the canonical text. Cursor sharing always
    /// compares the canonical text, since two trees may carry one `key`.
    pub fn signature(&self) -> String {
        match self.get_string("key") {
            Some(key) => key,
            None => self.to_string(),
        }
    }
}

// Canonical text: #op:default:name=value( child child )
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.operator)?;
        if let Some(default) = self.parameters.get(Self::DEFAULT) {
            write!(f, ":{}", default)?;
        }
        for (name, value) in &self.parameters {
            if name != Self::DEFAULT {
                write!(f, ":{}={}", name, value)?;
            }
        }
        if self.children.is_empty() {
            return write!(f, "()");
        }
        write!(f, "(")?;
        for child in &self.children {
            write!(f, " {}", child)?;
        }
        write!(f, " )")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_text_is_stable() {
        let node = Node::new("od")
            .with_param("default", 1i64)
            .with_param("b", "x")
            .with_param("a", true)
            .with_child(Node::term("white"))
            .with_child(Node::term("house"));
        assert_eq!(
            node.to_string(),
            "#od:1:a=true:b=x( #extents:white() #extents:house() )"
        );
    }

    #[test]
    fn key_parameter_overrides_signature() {
        let node = Node::new("uw").with_child(Node::term("a")).with_param("key", "windowA");
        assert_eq!(node.signature(), "windowA");
        assert_eq!(Node::term("a").signature(), "#extents:a()");
    }

    #[test]
    fn typed_parameter_access() {
        let node = Node::new("od").with_param("default", "3").with_param("w", 2.5);
        assert_eq!(node.get_long("default"), Some(3));
        assert_eq!(node.get_double("w"), Some(2.5));
        assert_eq!(node.get_bool("missing"), None);
    }
}
