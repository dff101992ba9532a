//! Graph data types
//!
//! Nodes keep their fields and state vector in explicit ordered maps. The
//! serde representation is GUN's JSON node format:
//!
//! ```text
//! {"_": {"#": "<soul>", ">": {"<field>": <state>, ...}}, "<field>": <value>, ...}
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Logical write timestamp of one field
pub type State = f64;

/// JSON key of a node's metadata; never a field name
pub const META_FIELD: &str = "_";

/// A graph keyed by soul; a soul missing from the map is an absent node
pub type GunGraph = BTreeMap<String, GunNode>;

/// A field value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GunValue {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    /// Reference to another node
    Link(SoulRef),
}

/// `{"#": soul}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SoulRef {
    #[serde(rename = "#")]
    pub soul: String,
}

impl GunValue {
    /// A reference to the node `soul`
    pub fn link(soul: impl Into<String>) -> Self {
        GunValue::Link(SoulRef { soul: soul.into() })
    }
}

impl From<&str> for GunValue {
    fn from(s: &str) -> Self {
        GunValue::Text(s.to_string())
    }
}

impl From<String> for GunValue {
    fn from(s: String) -> Self {
        GunValue::Text(s)
    }
}

impl From<bool> for GunValue {
    fn from(b: bool) -> Self {
        GunValue::Bool(b)
    }
}

impl From<i32> for GunValue {
    fn from(n: i32) -> Self {
        GunValue::Number(n.into())
    }
}

impl From<u64> for GunValue {
    fn from(n: u64) -> Self {
        GunValue::Number(n.into())
    }
}

impl From<i64> for GunValue {
    fn from(n: i64) -> Self {
        GunValue::Number(n.into())
    }
}

impl From<f64> for GunValue {
    /// Non-finite numbers have no JSON form and become `Null`
    fn from(n: f64) -> Self {
        serde_json::Number::from_f64(n)
            .map(GunValue::Number)
            .unwrap_or(GunValue::Null)
    }
}

/// Node metadata: its own soul and the state of every field
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeMeta {
    #[serde(rename = "#")]
    pub soul: String,

    #[serde(rename = ">", default)]
    pub state: BTreeMap<String, State>,
}

/// A schemaless node: field values plus the per-field state vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GunNode {
    #[serde(rename = "_")]
    pub meta: NodeMeta,

    #[serde(flatten)]
    pub fields: BTreeMap<String, GunValue>,
}

impl GunNode {
    /// An empty node
    pub fn new(soul: impl Into<String>) -> Self {
        Self {
            meta: NodeMeta {
                soul: soul.into(),
                state: BTreeMap::new(),
            },
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style `set`
    pub fn with(mut self, field: impl Into<String>, value: impl Into<GunValue>, state: State) -> Self {
        self.set(field, value, state);
        self
    }

    /// Set a field's value and state together
    ///
    /// `_` names the metadata and is ignored as a field.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<GunValue>, state: State) {
        let field = field.into();
        if field == META_FIELD {
            return;
        }
        self.meta.state.insert(field.clone(), state);
        self.fields.insert(field, value.into());
    }

    pub fn soul(&self) -> &str {
        &self.meta.soul
    }

    pub fn get(&self, field: &str) -> Option<&GunValue> {
        self.fields.get(field)
    }

    /// State of `field`, if the node carries one
    pub fn state_of(&self, field: &str) -> Option<State> {
        self.meta.state.get(field).copied()
    }

    /// Drop a `_` field inserted through `fields` or `meta.state` directly
    pub(crate) fn without_meta_field(mut self) -> Self {
        self.fields.remove(META_FIELD);
        self.meta.state.remove(META_FIELD);
        self
    }

    /// Number of fields, not counting metadata
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Field selection for `get`
///
/// `exact` selects one field and wins over `from`/`to`. Bounds are inclusive
/// and compare field names byte-wise. Under serde the fields use GUN's wire
/// names (`.`, `>`, `<`). Empty strings count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetOptions {
    #[serde(rename = ".", default, skip_serializing_if = "Option::is_none")]
    pub exact: Option<String>,

    #[serde(rename = ">", default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    #[serde(rename = "<", default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

impl GetOptions {
    /// Select the whole node
    pub fn all() -> Self {
        Self::default()
    }

    /// Select a single field
    pub fn exact(field: impl Into<String>) -> Self {
        Self {
            exact: Some(field.into()),
            ..Self::default()
        }
    }

    /// Select fields in `from..=to`
    pub fn range(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            exact: None,
            from: Some(from.into()),
            to: Some(to.into()),
        }
    }

    /// Select fields `>= from`
    pub fn starting_at(from: impl Into<String>) -> Self {
        Self {
            from: Some(from.into()),
            ..Self::default()
        }
    }

    /// Select fields `<= to`
    pub fn ending_at(to: impl Into<String>) -> Self {
        Self {
            to: Some(to.into()),
            ..Self::default()
        }
    }

    /// True when no bound is set
    pub fn is_unbounded(&self) -> bool {
        self.field_range().is_unbounded()
    }

    pub(crate) fn field_range(&self) -> FieldRange<'_> {
        match non_empty(&self.exact) {
            Some(field) => FieldRange {
                lower: Some(field),
                upper: Some(field),
            },
            None => FieldRange {
                lower: non_empty(&self.from),
                upper: non_empty(&self.to),
            },
        }
    }
}

fn non_empty(bound: &Option<String>) -> Option<&str> {
    bound.as_deref().filter(|s| !s.is_empty())
}

/// Resolved inclusive bounds of a `GetOptions`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldRange<'a> {
    pub lower: Option<&'a str>,
    pub upper: Option<&'a str>,
}

impl FieldRange<'_> {
    pub fn is_unbounded(&self) -> bool {
        self.lower.is_none() && self.upper.is_none()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.lower.map_or(true, |lower| field >= lower)
            && self.upper.map_or(true, |upper| field <= upper)
    }

    /// True once `field` is past the upper bound
    pub fn is_past(&self, field: &str) -> bool {
        self.upper.map_or(false, |upper| field > upper)
    }
}
