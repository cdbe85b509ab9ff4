//! Blueprint specification format.
//!
//! One YAML file holds one unit under a root key of `component`,
//! `components`, `condition` or `loop`. The modifier carries the bindings and
//! the structural links (`extend` chain, condition `left`/`right` branches,
//! loop `feed` template). Map order is preserved end to end so regeneration
//! is byte-stable.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::binding::Binding;

pub type StyleMap = IndexMap<String, Value>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<SpecUnit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<SpecUnit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<SpecUnit>,
    #[serde(rename = "loop", skip_serializing_if = "Option::is_none")]
    pub repeat: Option<SpecUnit>,
}

impl SpecFile {
    /// The component unit, honoring the legacy `components` alias.
    pub fn component_unit(&self) -> Option<&SpecUnit> {
        self.components.as_ref().or(self.component.as_ref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecUnit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    pub modifier: Modifier,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifier {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extend: Option<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub props: IndexMap<String, Value>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub states: IndexMap<String, Value>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub effects: IndexMap<String, EffectSpec>,
    #[serde(skip_serializing_if = "Styles::is_empty")]
    pub styles: Styles,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<FrameField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch: Option<Value>,
}

/// The whole `styles` value is either one logic binding or a key/value map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Styles {
    Logic(String),
    Map(StyleMap),
}

impl Default for Styles {
    fn default() -> Self {
        Styles::Map(StyleMap::new())
    }
}

impl Styles {
    pub fn is_empty(&self) -> bool {
        match self {
            Styles::Logic(_) => false,
            Styles::Map(map) => map.is_empty(),
        }
    }

    /// The single logic-binding name when the whole value is one reference.
    pub fn as_logic(&self) -> Option<String> {
        match self {
            Styles::Logic(s) => match Binding::classify_str(s) {
                Binding::Logic { name, .. } => Some(name),
                _ => None,
            },
            Styles::Map(_) => None,
        }
    }

    pub fn as_map(&self) -> StyleMap {
        match self {
            Styles::Map(map) => map.clone(),
            Styles::Logic(_) => StyleMap::new(),
        }
    }
}

/// `frame` accepts a bare base string or the full descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrameField {
    Base(String),
    Spec(FrameSpec),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub styles: StyleMap,
}

impl FrameField {
    pub fn base(&self) -> &str {
        match self {
            FrameField::Base(s) => s,
            FrameField::Spec(spec) => spec.base.as_deref().unwrap_or(""),
        }
    }

    pub fn styles(&self) -> StyleMap {
        match self {
            FrameField::Base(_) => StyleMap::new(),
            FrameField::Spec(spec) => spec.styles.clone(),
        }
    }
}

/// How the `children` prop renders inside the base element.
#[derive(Debug, Clone, PartialEq)]
pub enum ChildrenValue {
    /// `{value}` interpolation of a state identifier.
    State(String),
    /// `{value}` interpolation of an input slot.
    Input(String),
    /// Nested component reference.
    Component(String),
    /// Literal text, rendered as-is.
    Raw(String),
}

impl Modifier {
    /// Props without the `children` pseudo-prop and without null entries.
    pub fn render_props(&self) -> IndexMap<String, Value> {
        self.props
            .iter()
            .filter(|(k, v)| k.as_str() != "children" && !v.is_null())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn children(&self) -> ChildrenValue {
        let raw = match self.props.get("children") {
            Some(Value::String(s)) => s.clone(),
            Some(other) if !other.is_null() => other.to_string(),
            _ => return ChildrenValue::Raw(String::new()),
        };
        let trimmed = raw.trim();
        let lower = trimmed.to_lowercase();
        if lower.starts_with("components.") {
            return ChildrenValue::Component(trimmed["components.".len()..].to_string());
        }
        match Binding::classify_str(trimmed) {
            Binding::State(name) => ChildrenValue::State(name),
            Binding::Input(name) => ChildrenValue::Input(name),
            _ => ChildrenValue::Raw(raw),
        }
    }

    pub fn frame_base(&self) -> String {
        self.frame
            .as_ref()
            .map(|f| f.base().to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_roundtrip_preserves_key_order() {
        let yaml = "component:\n  base: text\n  modifier:\n    styles:\n      zeta: 1\n      alpha: 2\n      mid: 3\n";
        let spec: SpecFile = serde_yaml::from_str(yaml).unwrap();
        let unit = spec.component_unit().unwrap();
        let map = unit.modifier.styles.as_map();
        let names: Vec<String> = map.keys().cloned().collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_frame_accepts_bare_string() {
        let yaml = "component:\n  modifier:\n    frame: column.start\n";
        let spec: SpecFile = serde_yaml::from_str(yaml).unwrap();
        let unit = spec.component_unit().unwrap();
        assert_eq!(unit.modifier.frame_base(), "column.start");
    }

    #[test]
    fn test_frame_accepts_descriptor() {
        let yaml =
            "condition:\n  modifier:\n    frame:\n      base: row.end.stack\n      id: x_frame\n      styles:\n        flex: 1\n";
        let spec: SpecFile = serde_yaml::from_str(yaml).unwrap();
        let unit = spec.condition.as_ref().unwrap();
        assert_eq!(unit.modifier.frame_base(), "row.end.stack");
        assert_eq!(
            unit.modifier.frame.as_ref().unwrap().styles().get("flex"),
            Some(&serde_json::json!(1))
        );
    }

    #[test]
    fn test_styles_single_logic_binding() {
        let yaml = "component:\n  modifier:\n    styles: logics.getStyle\n";
        let spec: SpecFile = serde_yaml::from_str(yaml).unwrap();
        let unit = spec.component_unit().unwrap();
        assert_eq!(unit.modifier.styles.as_logic(), Some("getStyle".to_string()));
    }

    #[test]
    fn test_children_classification() {
        let mut modifier = Modifier::default();
        modifier
            .props
            .insert("children".into(), serde_json::json!("states.value"));
        assert_eq!(modifier.children(), ChildrenValue::State("value".into()));

        modifier
            .props
            .insert("children".into(), serde_json::json!("Sign in"));
        assert_eq!(modifier.children(), ChildrenValue::Raw("Sign in".into()));
    }
}
