//! Design document model.
//!
//! Best-effort mapping of the design API's file payload. Only the attributes
//! the transformer consumes are typed; unknown fields are ignored and absent
//! fields default, so schema drift on the API side degrades to missing
//! styling instead of a parse failure.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const NODE_FRAME: &str = "FRAME";
pub const NODE_TEXT: &str = "TEXT";
pub const NODE_RECTANGLE: &str = "RECTANGLE";
pub const NODE_VECTOR: &str = "VECTOR";
pub const NODE_INSTANCE: &str = "INSTANCE";
pub const NODE_COMPONENT: &str = "COMPONENT";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DesignFile {
    pub document: Option<DocumentNode>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentNode {
    pub children: Vec<DesignNode>,
}

impl DesignFile {
    /// The working canvas: the first child of the document root.
    pub fn design_document(&self) -> Option<&DesignNode> {
        self.document.as_ref().and_then(|d| d.children.first())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DesignNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub visible: Option<bool>,
    pub children: Vec<DesignNode>,

    // Text
    pub characters: Option<String>,
    /// Raw text style map (fontSize, fontFamily, italic, textAlignHorizontal…)
    pub style: Option<IndexMap<String, Value>>,

    // Auto-layout
    pub layout_mode: Option<String>,
    pub layout_wrap: Option<String>,
    pub layout_sizing_horizontal: Option<String>,
    pub layout_sizing_vertical: Option<String>,
    pub primary_axis_align_items: Option<String>,
    pub counter_axis_align_items: Option<String>,
    pub item_spacing: Option<f64>,
    pub padding_left: Option<f64>,
    pub padding_right: Option<f64>,
    pub padding_top: Option<f64>,
    pub padding_bottom: Option<f64>,

    // Geometry
    pub absolute_bounding_box: Option<Bounds>,
    pub absolute_render_bounds: Option<Bounds>,
    pub corner_radius: Option<f64>,
    pub rectangle_corner_radii: Option<Vec<f64>>,

    // Paint
    pub fills: Vec<Paint>,
    pub strokes: Vec<Paint>,
    pub stroke_weight: Option<f64>,
    pub individual_stroke_weights: Option<StrokeWeights>,
    pub stroke_dashes: Vec<f64>,
    pub effects: Vec<Effect>,
    pub opacity: Option<f64>,
    pub color: Option<Rgba>,

    // Prototyping
    pub transition_node_id: Option<String>,
    pub interactions: Vec<Value>,
    pub flow_starting_points: Vec<FlowStartingPoint>,
}

impl DesignNode {
    pub fn is_visible(&self) -> bool {
        self.visible.unwrap_or(true)
    }

    pub fn is_frame_like(&self) -> bool {
        matches!(
            self.node_type.as_str(),
            NODE_FRAME | NODE_INSTANCE | NODE_COMPONENT
        )
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Bounds {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Paint {
    #[serde(rename = "type")]
    pub paint_type: String,
    pub visible: Option<bool>,
    pub opacity: Option<f64>,
    pub color: Option<Rgba>,
    pub image_ref: Option<String>,
}

pub const PAINT_SOLID: &str = "SOLID";
pub const PAINT_IMAGE: &str = "IMAGE";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StrokeWeights {
    pub top: Option<f64>,
    pub right: Option<f64>,
    pub bottom: Option<f64>,
    pub left: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Effect {
    #[serde(rename = "type")]
    pub effect_type: String,
    pub visible: Option<bool>,
    pub radius: Option<f64>,
    pub spread: Option<f64>,
    pub offset: Option<Offset>,
    pub color: Option<Rgba>,
}

pub const EFFECT_DROP_SHADOW: &str = "DROP_SHADOW";
pub const EFFECT_INNER_SHADOW: &str = "INNER_SHADOW";
pub const EFFECT_BACKGROUND_BLUR: &str = "BACKGROUND_BLUR";
pub const EFFECT_LAYER_BLUR: &str = "LAYER_BLUR";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlowStartingPoint {
    pub node_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_design_document_is_first_canvas() {
        let file: DesignFile = serde_json::from_str(
            r#"{"document":{"children":[{"id":"0:1","name":"Page 1","type":"CANVAS"}]}}"#,
        )
        .unwrap();
        assert_eq!(file.design_document().unwrap().name, "Page 1");
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let node: DesignNode = serde_json::from_str(
            r#"{"id":"1:2","name":"hero_image","type":"RECTANGLE","pluginData":{"x":1},"fills":[{"type":"IMAGE","imageRef":"abc"}]}"#,
        )
        .unwrap();
        assert_eq!(node.fills[0].image_ref.as_deref(), Some("abc"));
        assert!(node.is_visible());
        assert!(!node.is_frame_like());
    }
}
