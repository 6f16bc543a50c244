// Copyright (c) 2025 - Cowboy AI, Inc.
//! Typed references between declared resources
//!
//! A [`Reference`] names an attribute of a resource in some stack. It is
//! resolved by the provisioning engine, never by this crate, and it is the
//! only way one resource may point at another.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::stack::StackName;

/// Attribute of a provisioned resource that another resource can consume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Attribute {
    Id,
    Arn,
    Name,
    EndpointAddress,
    EndpointPort,
    DnsName,
    FullName,
    Uri,
    DomainName,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Pointer to an attribute of a resource in a stack
///
/// Serializes as `{"Fn::GetAtt": [stack, logicalId, attribute]}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "GetAtt", from = "GetAtt")]
pub struct Reference {
    stack: StackName,
    logical_id: String,
    attribute: Attribute,
}

impl Reference {
    pub fn new(stack: StackName, logical_id: impl Into<String>, attribute: Attribute) -> Self {
        Self {
            stack,
            logical_id: logical_id.into(),
            attribute,
        }
    }

    /// Same resource, different attribute
    pub fn attr(&self, attribute: Attribute) -> Self {
        Self {
            stack: self.stack.clone(),
            logical_id: self.logical_id.clone(),
            attribute,
        }
    }

    pub fn stack(&self) -> &StackName {
        &self.stack
    }

    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    pub fn attribute(&self) -> Attribute {
        self.attribute
    }

    /// Whether two references point at the same resource, ignoring attribute
    pub fn same_resource(&self, other: &Reference) -> bool {
        self.stack == other.stack && self.logical_id == other.logical_id
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}.{}", self.stack, self.logical_id, self.attribute)
    }
}

/// Wire shape of a reference
#[derive(Serialize, Deserialize)]
struct GetAtt {
    #[serde(rename = "Fn::GetAtt")]
    target: (StackName, String, Attribute),
}

impl From<Reference> for GetAtt {
    fn from(reference: Reference) -> Self {
        Self {
            target: (reference.stack, reference.logical_id, reference.attribute),
        }
    }
}

impl From<GetAtt> for Reference {
    fn from(get_att: GetAtt) -> Self {
        let (stack, logical_id, attribute) = get_att.target;
        Self {
            stack,
            logical_id,
            attribute,
        }
    }
}

/// Value that may depend on attributes known only after provisioning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expr {
    Literal(String),
    Ref(Reference),
    Join(Join),
}

/// Concatenation of expressions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Join {
    #[serde(rename = "Fn::Join")]
    pub parts: Vec<Expr>,
}

impl Expr {
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    pub fn join(parts: impl IntoIterator<Item = Expr>) -> Self {
        Self::Join(Join {
            parts: parts.into_iter().collect(),
        })
    }

    /// The literal value, if no part depends on a reference
    pub fn as_literal(&self) -> Option<String> {
        match self {
            Self::Literal(value) => Some(value.clone()),
            Self::Ref(_) => None,
            Self::Join(join) => join
                .parts
                .iter()
                .map(Expr::as_literal)
                .collect::<Option<Vec<_>>>()
                .map(|parts| parts.concat()),
        }
    }

    /// Every reference this expression depends on
    pub fn references(&self) -> Vec<&Reference> {
        match self {
            Self::Literal(_) => Vec::new(),
            Self::Ref(reference) => vec![reference],
            Self::Join(join) => join.parts.iter().flat_map(Expr::references).collect(),
        }
    }
}

impl From<Reference> for Expr {
    fn from(reference: Reference) -> Self {
        Self::Ref(reference)
    }
}

impl From<&Reference> for Expr {
    fn from(reference: &Reference) -> Self {
        Self::Ref(reference.clone())
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Self::Literal(value.to_string())
    }
}

impl From<String> for Expr {
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}

/// Collect every reference embedded anywhere in a serialized value
pub fn collect_references(value: &serde_json::Value, out: &mut Vec<Reference>) {
    match value {
        serde_json::Value::Object(map) => {
            if map.len() == 1 && map.contains_key("Fn::GetAtt") {
                if let Ok(reference) = serde_json::from_value::<Reference>(value.clone()) {
                    out.push(reference);
                    return;
                }
            }
            for nested in map.values() {
                collect_references(nested, out);
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                collect_references(item, out);
            }
        }
        _ => {}
    }
}
