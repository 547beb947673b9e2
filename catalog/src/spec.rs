//! Data model for Shortcuts action definitions.
//!
//! The vendor catalog carries far more keys than anything here reads. Every
//! struct keeps the keys it does not model in a flattened `extra` map, so a
//! load/save cycle never drops data.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CatalogError;

/// Keys not modelled explicitly, kept in source order.
pub type Extra = IndexMap<String, Value>;

/// One action definition, keyed in the catalog by its identifier
/// (e.g. `is.workflow.actions.showresult`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActionSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_info: Option<BlockInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Description>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<InputSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<ParameterSpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    /// Content item class for property/filter actions.
    #[serde(
        rename = "WFContentItemClass",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub content_item_class: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl ActionSpec {
    /// One-line summary from the description block, if any.
    pub fn summary(&self) -> Option<&str> {
        self.description
            .as_ref()
            .and_then(|d| d.summary.as_deref())
    }

    pub fn keywords(&self) -> &[String] {
        self.action_keywords.as_deref().unwrap_or_default()
    }

    pub fn parameters(&self) -> &[ParameterSpec] {
        self.parameters.as_deref().unwrap_or_default()
    }
}

/// Editor hints for block actions (`if`, `menu`, `repeat`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BlockInfo {
    pub example: String,
    pub completion: String,
}

impl BlockInfo {
    pub fn new(example: &str, completion: &str) -> Self {
        Self {
            example: example.to_string(),
            completion: completion.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Description {
    #[serde(
        rename = "DescriptionSummary",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub summary: Option<String>,
    #[serde(
        rename = "DescriptionInput",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub input: Option<String>,
    #[serde(
        rename = "DescriptionResult",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub result: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InputSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OutputSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A single action parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParameterSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_item_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_resources: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl ParameterSpec {
    pub fn new(class: &str, key: &str) -> Self {
        Self {
            class: Some(class.to_string()),
            key: Some(key.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    #[must_use]
    pub fn items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items = Some(
            items
                .into_iter()
                .map(|s| Value::String(s.into()))
                .collect(),
        );
        self
    }

    #[must_use]
    pub fn content_item_class(mut self, class: &str) -> Self {
        self.content_item_class = Some(class.to_string());
        self
    }

    #[must_use]
    pub fn required_resources(mut self, resources: Vec<Value>) -> Self {
        self.required_resources = Some(resources);
        self
    }

    /// Enumeration items rendered as plain strings (non-string items use their JSON form).
    pub fn item_labels(&self) -> Vec<String> {
        self.items
            .iter()
            .flatten()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect()
    }
}

/// Ordered map of action identifier → definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    actions: IndexMap<String, ActionSpec>,
}

impl Catalog {
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ActionSpec> {
        self.actions.get(id)
    }

    /// Mutable access to an action that must exist.
    pub fn require_mut(&mut self, id: &str) -> Result<&mut ActionSpec, CatalogError> {
        self.actions
            .get_mut(id)
            .ok_or_else(|| CatalogError::MissingAction(id.to_string()))
    }

    /// Insert or replace an action. Replacing keeps the original position.
    pub fn insert(&mut self, id: &str, action: ActionSpec) {
        self.actions.insert(id.to_string(), action);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ActionSpec)> {
        self.actions.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut ActionSpec)> {
        self.actions.iter_mut()
    }

    /// Parse a vendor catalog. The vendor file is a top-level array whose
    /// first element is the action map; a bare map is accepted as well.
    pub fn from_vendor_str(contents: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(contents)?;
        let map = match value {
            Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
            other => other,
        };
        serde_json::from_value(map)
    }

    pub fn load_vendor(path: &Path) -> Result<Self, CatalogError> {
        let contents = read(path)?;
        Self::from_vendor_str(&contents).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load a catalog previously written by [`Catalog::write_to`].
    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let contents = read(path)?;
        serde_json::from_str(&contents).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Tab-indented JSON.
    pub fn to_pretty_json(&self) -> Result<Vec<u8>, CatalogError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        Ok(buf)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), CatalogError> {
        let bytes = self.to_pretty_json()?;
        std::fs::write(path, bytes).map_err(|source| CatalogError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Property names per coercion type class.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct TypeTable {
    classes: IndexMap<String, CoercionType>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoercionType {
    #[serde(default)]
    pub properties: IndexMap<String, PropertyInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PropertyInfo {
    pub name: String,
}

impl TypeTable {
    pub fn from_json_str(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let contents = read(path)?;
        Self::from_json_str(&contents).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn is_coercion_class(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    /// Display names of a class's properties, in table order.
    pub fn property_names(&self, class: &str) -> Option<Vec<String>> {
        self.classes
            .get(class)
            .map(|t| t.properties.values().map(|p| p.name.clone()).collect())
    }
}

fn read(path: &Path) -> Result<String, CatalogError> {
    std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
        path: path.to_path_buf(),
        source,
    })
}
