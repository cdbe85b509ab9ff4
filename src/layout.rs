//! Layout and paint derivation.
//!
//! Pure mapping from design-tool layout attributes onto the normalized style
//! vocabulary the generated components use. Anything that cannot be derived
//! stays absent; absent keys never reach the emitted blueprint.

use serde_json::Value;

use crate::document::{
    DesignNode, Effect, Paint, Rgba, EFFECT_BACKGROUND_BLUR, EFFECT_DROP_SHADOW,
    EFFECT_INNER_SHADOW, EFFECT_LAYER_BLUR, PAINT_IMAGE, PAINT_SOLID,
};
use crate::spec::StyleMap;

pub const LAYOUT_VERTICAL: &str = "VERTICAL";
pub const LAYOUT_HORIZONTAL: &str = "HORIZONTAL";
const SIZING_FIXED: &str = "FIXED";
const SIZING_FILL: &str = "FILL";

/// Alignment enum → flex keyword; anything unknown renders as `normal`.
pub fn axis_align(align: Option<&str>) -> &'static str {
    match align {
        Some("MIN") => "flex-start",
        Some("MAX") => "flex-end",
        Some("CENTER") => "center",
        Some("SPACE_BETWEEN") => "space-between",
        _ => "normal",
    }
}

/// `WRAP` / `NO_WRAP` / `WRAP_REVERSE` → `wrap` / `nowrap` / `wrapreverse`.
pub fn layout_wrap(wrap: Option<&str>) -> String {
    wrap.unwrap_or("NOWRAP").replace('_', "").to_lowercase()
}

/// Only `FIXED` sizing pins an absolute pixel measurement.
pub fn fixed_size(sizing: Option<&str>, size: Option<f64>) -> Option<f64> {
    match sizing {
        Some(SIZING_FIXED) => size,
        _ => None,
    }
}

/// `FILL` sizing along the parent's layout axis grows the child.
pub fn fill_flex(parent_layout_mode: Option<&str>, child: &DesignNode) -> Option<f64> {
    let sizing = if parent_layout_mode == Some(LAYOUT_VERTICAL) {
        child.layout_sizing_vertical.as_deref()
    } else {
        child.layout_sizing_horizontal.as_deref()
    };
    match sizing {
        Some(SIZING_FILL) => Some(1.0),
        _ => None,
    }
}

/// Format a float the way the generated JS expects: no trailing `.0`.
pub fn fmt_num(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// JSON number preserving integral values as integers.
pub fn num_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.is_finite() {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

fn rgba_string(color: &Rgba, opacity: Option<f64>) -> String {
    // Alpha comes from the color itself unless it is fully opaque, in which
    // case the paint-level opacity wins.
    let alpha = if color.a < 1.0 && color.a > 0.0 {
        color.a
    } else {
        opacity.unwrap_or(1.0)
    };
    format!(
        "rgba({},{},{},{})",
        fmt_num(color.r * 255.0),
        fmt_num(color.g * 255.0),
        fmt_num(color.b * 255.0),
        fmt_num(alpha)
    )
}

/// First solid paint as an `rgba(...)` string.
pub fn solid_color(paints: &[Paint]) -> Option<String> {
    paints
        .iter()
        .find(|p| p.paint_type == PAINT_SOLID)
        .and_then(|p| p.color.as_ref().map(|c| rgba_string(c, p.opacity)))
}

/// First image paint's stable content reference.
pub fn image_ref(paints: &[Paint]) -> Option<String> {
    paints
        .iter()
        .find(|p| p.paint_type == PAINT_IMAGE)
        .and_then(|p| p.image_ref.clone())
}

fn find_effect<'a>(node: &'a DesignNode, effect_type: &str) -> Option<&'a Effect> {
    node.effects.iter().find(|e| e.effect_type == effect_type)
}

/// Drop or inner shadow as a CSS box-shadow string, gated on visibility.
pub fn drop_shadow(node: &DesignNode) -> Option<String> {
    let effect = find_effect(node, EFFECT_DROP_SHADOW)
        .or_else(|| find_effect(node, EFFECT_INNER_SHADOW))?;
    if !effect.visible.unwrap_or(false) {
        return None;
    }
    let inner = if effect.effect_type == EFFECT_INNER_SHADOW {
        "inset"
    } else {
        ""
    };
    let offset = effect.offset.unwrap_or_default();
    let color = effect
        .color
        .as_ref()
        .or(node.color.as_ref())
        .map(|c| rgba_string(c, None))
        .unwrap_or_default();
    Some(
        format!(
            "{} {}px {}px {}px {}px {}",
            inner,
            fmt_num(offset.x),
            fmt_num(offset.y),
            fmt_num(effect.radius.unwrap_or(0.0)),
            fmt_num(effect.spread.unwrap_or(0.0)),
            color
        )
        .trim()
        .to_string(),
    )
}

fn blur(node: &DesignNode, effect_type: &str) -> Option<String> {
    let effect = find_effect(node, effect_type)?;
    if !effect.visible.unwrap_or(false) {
        return None;
    }
    Some(format!("blur({}px)", fmt_num(effect.radius.unwrap_or(0.0))))
}

/// Background blur → backdrop filter string.
pub fn background_blur(node: &DesignNode) -> Option<String> {
    blur(node, EFFECT_BACKGROUND_BLUR)
}

/// Layer blur → filter string.
pub fn layer_blur(node: &DesignNode) -> Option<String> {
    blur(node, EFFECT_LAYER_BLUR)
}

pub fn insert_num(map: &mut StyleMap, key: &str, value: Option<f64>) {
    if let Some(v) = value {
        map.insert(key.to_string(), num_value(v));
    }
}

pub fn insert_str(map: &mut StyleMap, key: &str, value: Option<String>) {
    if let Some(v) = value {
        map.insert(key.to_string(), Value::String(v));
    }
}

fn border_styles(node: &DesignNode) -> StyleMap {
    let mut map = StyleMap::new();
    if node.strokes.is_empty() {
        return map;
    }
    let weights = node.individual_stroke_weights;
    let weight_or = |side: Option<f64>| side.or(node.stroke_weight);
    insert_num(
        &mut map,
        "borderTopWidth",
        weight_or(weights.and_then(|w| w.top)),
    );
    insert_num(
        &mut map,
        "borderLeftWidth",
        weight_or(weights.and_then(|w| w.left)),
    );
    insert_num(
        &mut map,
        "borderRightWidth",
        weight_or(weights.and_then(|w| w.right)),
    );
    insert_num(
        &mut map,
        "borderBottomWidth",
        weight_or(weights.and_then(|w| w.bottom)),
    );
    insert_str(&mut map, "borderColor", solid_color(&node.strokes));
    let style = if node.stroke_dashes.is_empty() {
        "solid"
    } else {
        "dashed"
    };
    map.insert("borderStyle".to_string(), Value::from(style));
    map
}

/// Shared container styling: raw text style spread, corner radii, background
/// color/image and border derivation.
pub fn container_styles(node: &DesignNode, background_image: Option<&str>) -> StyleMap {
    let mut map = StyleMap::new();
    if let Some(style) = &node.style {
        for (k, v) in style {
            if !v.is_null() {
                map.insert(k.clone(), v.clone());
            }
        }
    }
    map.extend(paint_styles(node, background_image));
    map
}

/// Corner radii, background and border derivation without the raw style
/// spread, for callers that start from an already-derived style map.
pub fn paint_styles(node: &DesignNode, background_image: Option<&str>) -> StyleMap {
    let mut map = StyleMap::new();
    insert_num(&mut map, "borderRadius", node.corner_radius);
    if let Some(radii) = &node.rectangle_corner_radii {
        insert_num(&mut map, "borderTopLeftRadius", radii.first().copied());
        insert_num(&mut map, "borderTopRightRadius", radii.get(1).copied());
        insert_num(&mut map, "borderBottomRightRadius", radii.get(2).copied());
        insert_num(&mut map, "borderBottomLeftRadius", radii.get(3).copied());
    }
    insert_str(&mut map, "backgroundColor", solid_color(&node.fills));
    if let Some(url) = background_image {
        map.insert("backgroundSize".to_string(), Value::from("cover"));
        map.insert("backgroundPosition".to_string(), Value::from("center"));
        map.insert(
            "backgroundImage".to_string(),
            Value::from(format!("url(\"{}\")", url)),
        );
    }
    map.extend(border_styles(node));
    map
}

/// Frame base for a child of an auto-layout parent.
pub fn main_frame_base(parent_layout_mode: Option<&str>) -> &'static str {
    if parent_layout_mode == Some(LAYOUT_VERTICAL) {
        "column.start"
    } else {
        "row.start"
    }
}

/// Frame base for a leaf: the inverse default, horizontal parents chain rows.
pub fn child_frame_base(parent_layout_mode: Option<&str>) -> &'static str {
    if parent_layout_mode == Some(LAYOUT_HORIZONTAL) {
        "row.start"
    } else {
        "column.start"
    }
}

/// Pages are stacking roots; their frame base carries the `.stack` marker.
pub fn page_frame_base(layout_mode: Option<&str>) -> &'static str {
    if layout_mode == Some(LAYOUT_VERTICAL) {
        "column.start.stack"
    } else {
        "row.start.stack"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Offset;

    fn solid(r: f64, g: f64, b: f64, a: f64, opacity: Option<f64>) -> Paint {
        Paint {
            paint_type: PAINT_SOLID.to_string(),
            color: Some(Rgba { r, g, b, a }),
            opacity,
            ..Default::default()
        }
    }

    #[test]
    fn test_axis_align_mapping() {
        assert_eq!(axis_align(Some("MIN")), "flex-start");
        assert_eq!(axis_align(Some("MAX")), "flex-end");
        assert_eq!(axis_align(Some("CENTER")), "center");
        assert_eq!(axis_align(Some("SPACE_BETWEEN")), "space-between");
        assert_eq!(axis_align(None), "normal");
        assert_eq!(axis_align(Some("BASELINE")), "normal");
    }

    #[test]
    fn test_layout_wrap() {
        assert_eq!(layout_wrap(None), "nowrap");
        assert_eq!(layout_wrap(Some("WRAP")), "wrap");
        assert_eq!(layout_wrap(Some("WRAP_REVERSE")), "wrapreverse");
    }

    #[test]
    fn test_fixed_size() {
        assert_eq!(fixed_size(Some("FIXED"), Some(120.0)), Some(120.0));
        assert_eq!(fixed_size(Some("HUG"), Some(120.0)), None);
        assert_eq!(fixed_size(Some("FILL"), Some(120.0)), None);
    }

    #[test]
    fn test_fill_flex_follows_parent_axis() {
        let child = DesignNode {
            layout_sizing_vertical: Some("FILL".into()),
            layout_sizing_horizontal: Some("FIXED".into()),
            ..Default::default()
        };
        assert_eq!(fill_flex(Some(LAYOUT_VERTICAL), &child), Some(1.0));
        assert_eq!(fill_flex(Some(LAYOUT_HORIZONTAL), &child), None);
    }

    #[test]
    fn test_solid_color_alpha_rules() {
        // Fully opaque color defers to paint opacity.
        let opaque = vec![solid(1.0, 0.0, 0.0, 1.0, Some(0.5))];
        assert_eq!(solid_color(&opaque).as_deref(), Some("rgba(255,0,0,0.5)"));

        // Translucent color keeps its own alpha.
        let translucent = vec![solid(0.0, 1.0, 0.0, 0.25, Some(0.9))];
        assert_eq!(
            solid_color(&translucent).as_deref(),
            Some("rgba(0,255,0,0.25)")
        );
    }

    #[test]
    fn test_drop_shadow_gated_on_visible() {
        let mut node = DesignNode::default();
        node.effects.push(Effect {
            effect_type: EFFECT_DROP_SHADOW.to_string(),
            visible: Some(false),
            radius: Some(4.0),
            ..Default::default()
        });
        assert_eq!(drop_shadow(&node), None);

        node.effects[0].visible = Some(true);
        node.effects[0].offset = Some(Offset { x: 1.0, y: 2.0 });
        node.effects[0].color = Some(Rgba {
            r: 0.0,
            g: 0.0,
            b: 0.0,
            a: 0.5,
        });
        assert_eq!(
            drop_shadow(&node).as_deref(),
            Some("1px 2px 4px 0px rgba(0,0,0,0.5)")
        );
    }

    #[test]
    fn test_inner_shadow_is_inset() {
        let mut node = DesignNode::default();
        node.effects.push(Effect {
            effect_type: EFFECT_INNER_SHADOW.to_string(),
            visible: Some(true),
            radius: Some(3.0),
            ..Default::default()
        });
        let shadow = drop_shadow(&node).unwrap();
        assert!(shadow.starts_with("inset "));
    }

    #[test]
    fn test_border_styles_dashed_iff_dash_pattern() {
        let mut node = DesignNode {
            strokes: vec![solid(0.0, 0.0, 0.0, 1.0, None)],
            stroke_weight: Some(2.0),
            ..Default::default()
        };
        let styles = container_styles(&node, None);
        assert_eq!(styles.get("borderStyle"), Some(&Value::from("solid")));
        assert_eq!(styles.get("borderTopWidth"), Some(&Value::from(2)));

        node.stroke_dashes = vec![2.0, 2.0];
        let styles = container_styles(&node, None);
        assert_eq!(styles.get("borderStyle"), Some(&Value::from("dashed")));
    }

    #[test]
    fn test_frame_bases() {
        assert_eq!(main_frame_base(Some(LAYOUT_VERTICAL)), "column.start");
        assert_eq!(main_frame_base(Some(LAYOUT_HORIZONTAL)), "row.start");
        assert_eq!(child_frame_base(Some(LAYOUT_HORIZONTAL)), "row.start");
        assert_eq!(child_frame_base(None), "column.start");
        assert_eq!(page_frame_base(Some(LAYOUT_VERTICAL)), "column.start.stack");
    }
}
