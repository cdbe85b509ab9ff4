//! Blueprint emitter.
//!
//! Serializes transformed nodes into one YAML unit per node under
//! `modules/<module>/<name>.yml`. Container-ish frames become condition
//! units, `_loop` frames become loop units and leaves become components.
//! Buttons with a resolved transition target additionally patch their
//! companion logic module so the generated `onClick` navigates.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use serde_json::{json, Value};
use tokio::fs;
use tracing::debug;

use crate::api::FigmaApi;
use crate::cache::AssetCache;
use crate::document::{NODE_RECTANGLE, NODE_TEXT, NODE_VECTOR};
use crate::error::{BuildError, Result};
use crate::layout::{self, fixed_size, image_ref, insert_num, insert_str, solid_color};
use crate::logic;
use crate::naming::{base_type, loop_element_field, sanitize_full_colon};
use crate::spec::{
    EffectSpec, FrameField, FrameSpec, Modifier, SpecFile, SpecUnit, StyleMap,
};
use crate::transform::{NodeFrame, PageIndex, RouteTarget, TransformedNode};

pub struct Emitter<'a> {
    pub api: &'a FigmaApi,
    pub assets: &'a AssetCache,
    pub fig_file: &'a str,
    /// Blueprint root (`src/blueprints`).
    pub src_path: &'a Path,
    pub index: &'a PageIndex,
}

type BoxedEmit<'b> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'b>>;

fn on_start_effects() -> indexmap::IndexMap<String, EffectSpec> {
    let mut effects = indexmap::IndexMap::new();
    effects.insert(
        "onStart".to_string(),
        EffectSpec {
            body: Some(json!("logics.onStart")),
            watch: None,
        },
    );
    effects
}

fn size_styles(t: &TransformedNode) -> StyleMap {
    let node = &t.node;
    let mut map = StyleMap::new();
    let width = if t.name.ends_with("_icon") {
        None
    } else {
        fixed_size(
            node.layout_sizing_horizontal.as_deref(),
            node.absolute_bounding_box.and_then(|b| b.width),
        )
    };
    insert_num(&mut map, "width", width);
    insert_num(
        &mut map,
        "height",
        fixed_size(
            node.layout_sizing_vertical.as_deref(),
            node.absolute_bounding_box.and_then(|b| b.height),
        ),
    );
    map
}

/// Transformed leaf styles plus the paint-derived container keys.
fn container_like_styles(t: &TransformedNode, background_image: Option<&str>) -> StyleMap {
    let mut map = t.styles.clone();
    map.extend(layout::paint_styles(&t.node, background_image));
    map
}

fn child_frame_field(t: &TransformedNode) -> Option<FrameField> {
    match &t.frame {
        NodeFrame::Child(spec) => Some(FrameField::Spec(spec.clone())),
        NodeFrame::Main(_) => None,
    }
}

fn loop_aware_id(t: &TransformedNode, suffix: &str) -> String {
    if t.is_loop_element {
        let field = loop_element_field(&t.node.id, &t.name);
        sanitize_full_colon(&format!("'_'+loopIndex+'{}{}'", field, suffix))
    } else {
        sanitize_full_colon(&format!("{}{}", t.name, suffix))
    }
}

impl<'a> Emitter<'a> {
    fn unit_path(&self, t: &TransformedNode) -> PathBuf {
        self.src_path
            .join("modules")
            .join(&t.module)
            .join(format!("{}.yml", t.name))
    }

    fn logic_path(&self, t: &TransformedNode) -> PathBuf {
        self.src_path
            .join("modules")
            .join(&t.module)
            .join("logics")
            .join(format!("{}.mjs", t.name))
    }

    async fn write_yaml(&self, path: &Path, spec: &SpecFile) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| BuildError::io(parent, e))?;
        }
        let yaml = serde_yaml::to_string(spec).expect("blueprint serialization is infallible");
        fs::write(path, yaml)
            .await
            .map_err(|e| BuildError::io(path, e))?;
        debug!("blueprint written: {:?}", path);
        Ok(())
    }

    /// Emit one unit per node, depth first.
    pub fn write_specs<'b>(&'b self, nodes: &'b [TransformedNode]) -> BoxedEmit<'b> {
        Box::pin(async move {
            for t in nodes {
                let path = self.unit_path(t);
                match t.node.node_type.as_str() {
                    NODE_TEXT => {
                        self.write_yaml(&path, &self.text_unit(t)).await?;
                    }
                    NODE_RECTANGLE => {
                        let spec = self.rectangle_unit(t).await;
                        self.write_yaml(&path, &spec).await?;
                    }
                    NODE_VECTOR => {
                        let spec = self.vector_unit(t).await;
                        self.write_yaml(&path, &spec).await?;
                    }
                    _ if t.node.is_frame_like() => {
                        if t.is_loop() {
                            let spec = self.loop_unit(t).await?;
                            self.write_yaml(&path, &spec).await?;
                        } else {
                            let spec = self.condition_unit(t).await?;
                            self.write_yaml(&path, &spec).await?;
                        }
                        self.write_specs(&t.children).await?;
                    }
                    _ => {
                        let background_image = self
                            .assets
                            .resolve(
                                self.api,
                                self.fig_file,
                                image_ref(&t.node.fills).as_deref(),
                                Some(&t.node.id),
                                None,
                            )
                            .await;
                        let spec = self.container_unit(t, background_image.as_deref());
                        self.write_yaml(&path, &spec).await?;
                    }
                }
            }
            Ok(())
        })
    }

    fn text_unit(&self, t: &TransformedNode) -> SpecFile {
        let node = &t.node;
        let mut styles = t.styles.clone();
        styles.extend(size_styles(t));
        insert_str(&mut styles, "color", solid_color(&node.fills));
        let italic = node
            .style
            .as_ref()
            .and_then(|s| s.get("italic"))
            .map(|v| v.as_bool().unwrap_or(false))
            .unwrap_or(false);
        if italic {
            styles.insert("fontStyle".into(), "italic".into());
        }
        let text_align = node
            .style
            .as_ref()
            .and_then(|s| s.get("textAlignHorizontal"))
            .and_then(|v| v.as_str())
            .and_then(|align| match align {
                "LEFT" => Some("start"),
                "CENTER" => Some("center"),
                "RIGHT" => Some("end"),
                _ => None,
            });
        insert_str(&mut styles, "textAlign", text_align.map(|s| s.to_string()));

        let children_binding = if t.is_loop_element {
            format!(
                "inputs.loopElement.{}??value",
                loop_element_field(&node.id, &t.name)
            )
        } else {
            "states.value".to_string()
        };

        let mut props = indexmap::IndexMap::new();
        props.insert("children".to_string(), Value::from(children_binding));
        props.insert(
            "id".to_string(),
            Value::from(sanitize_full_colon(&t.name)),
        );

        let mut states = indexmap::IndexMap::new();
        states.insert(
            "value".to_string(),
            node.characters
                .as_ref()
                .map(|c| Value::from(c.clone()))
                .unwrap_or(Value::from("")),
        );

        SpecFile {
            component: Some(SpecUnit {
                base: Some("text".to_string()),
                modifier: Modifier {
                    extend: t.extend_frame.clone(),
                    props,
                    states,
                    effects: on_start_effects(),
                    styles: crate::spec::Styles::Map(styles),
                    frame: child_frame_field(t),
                    ..Default::default()
                },
            }),
            ..Default::default()
        }
    }

    async fn rectangle_unit(&self, t: &TransformedNode) -> SpecFile {
        match base_type(&t.name).as_str() {
            "input" => {
                let input_type = if t.name.to_lowercase().contains("password") {
                    "password"
                } else {
                    "text"
                };
                self.input_unit(t, input_type)
            }
            "image" => {
                let src_url = self
                    .assets
                    .resolve(
                        self.api,
                        self.fig_file,
                        image_ref(&t.node.fills).as_deref(),
                        Some(&t.node.id),
                        None,
                    )
                    .await;
                self.image_unit(t, src_url.as_deref(), "cover")
            }
            _ => {
                let background_image = self
                    .assets
                    .resolve(
                        self.api,
                        self.fig_file,
                        image_ref(&t.node.fills).as_deref(),
                        Some(&t.node.id),
                        None,
                    )
                    .await;
                self.container_unit(t, background_image.as_deref())
            }
        }
    }

    fn input_unit(&self, t: &TransformedNode, input_type: &str) -> SpecFile {
        let mut styles = container_like_styles(t, None);
        styles.extend(size_styles(t));
        styles.insert("borderColor".into(), Value::from("states.borderColor"));
        styles.insert("fontSize".into(), Value::from(15));
        styles.insert("padding".into(), Value::from("0 8px"));

        let mut props = indexmap::IndexMap::new();
        props.insert("type".to_string(), Value::from("states.inputType"));
        props.insert("value".to_string(), Value::from("states.value"));
        props.insert("onChange".to_string(), Value::from("logics.onTextChange"));
        props.insert("placeholder".to_string(), Value::from("Type here"));
        props.insert("id".to_string(), Value::from(sanitize_full_colon(&t.name)));

        let mut states = indexmap::IndexMap::new();
        states.insert("value".to_string(), Value::from(""));
        states.insert("inputType".to_string(), Value::from(input_type));
        states.insert(
            "borderColor".to_string(),
            Value::from(solid_color(&t.node.strokes).unwrap_or_else(|| "transparent".into())),
        );

        SpecFile {
            component: Some(SpecUnit {
                base: Some("input".to_string()),
                modifier: Modifier {
                    extend: t.extend_frame.clone(),
                    props,
                    states,
                    effects: on_start_effects(),
                    styles: crate::spec::Styles::Map(styles),
                    frame: child_frame_field(t),
                    ..Default::default()
                },
            }),
            ..Default::default()
        }
    }

    fn image_unit(&self, t: &TransformedNode, src_url: Option<&str>, object_fit: &str) -> SpecFile {
        let mut styles = container_like_styles(t, None);
        styles.extend(size_styles(t));
        styles.insert("objectFit".into(), Value::from(object_fit));

        let src_binding = if t.is_loop_element {
            format!(
                "inputs.loopElement.{}??srcUrl",
                loop_element_field(&t.node.id, &t.name)
            )
        } else {
            "states.srcUrl".to_string()
        };

        let mut props = indexmap::IndexMap::new();
        props.insert("id".to_string(), Value::from(sanitize_full_colon(&t.name)));
        props.insert("alt".to_string(), Value::from(t.name.clone()));
        props.insert("src".to_string(), Value::from(src_binding));

        let mut states = indexmap::IndexMap::new();
        states.insert(
            "srcUrl".to_string(),
            Value::from(src_url.unwrap_or("")),
        );

        SpecFile {
            component: Some(SpecUnit {
                base: Some("image".to_string()),
                modifier: Modifier {
                    extend: t.extend_frame.clone(),
                    props,
                    states,
                    effects: on_start_effects(),
                    styles: crate::spec::Styles::Map(styles),
                    frame: child_frame_field(t),
                    ..Default::default()
                },
            }),
            ..Default::default()
        }
    }

    async fn vector_unit(&self, t: &TransformedNode) -> SpecFile {
        // Vectors render server-side as SVG; their own paint must not leak
        // into the style map.
        let mut stripped = t.clone();
        stripped.node.fills = Vec::new();
        stripped.node.strokes = Vec::new();
        stripped.node.stroke_weight = None;
        let src_url = self
            .assets
            .resolve(
                self.api,
                self.fig_file,
                Some(&sanitize_full_colon(&t.name)),
                Some(&t.node.id),
                Some("svg"),
            )
            .await;
        self.image_unit(&stripped, src_url.as_deref(), "none")
    }

    fn container_unit(&self, t: &TransformedNode, background_image: Option<&str>) -> SpecFile {
        let mut styles = container_like_styles(t, background_image);
        styles.extend(size_styles(t));

        let mut props = indexmap::IndexMap::new();
        props.insert("id".to_string(), Value::from(sanitize_full_colon(&t.name)));

        SpecFile {
            component: Some(SpecUnit {
                base: Some("rectangle".to_string()),
                modifier: Modifier {
                    extend: t.extend_frame.clone(),
                    props,
                    effects: on_start_effects(),
                    styles: crate::spec::Styles::Map(styles),
                    frame: child_frame_field(t),
                    ..Default::default()
                },
            }),
            ..Default::default()
        }
    }

    async fn condition_unit(&self, t: &TransformedNode) -> Result<SpecFile> {
        let suffix = base_type(&t.name);
        let navigation_target = t
            .node
            .transition_node_id
            .as_ref()
            .and_then(|id| self.index.get(id));
        if suffix == "button" && (navigation_target.is_some() || !t.node.interactions.is_empty())
        {
            let route = navigation_target
                .cloned()
                .unwrap_or_else(RouteTarget::close);
            logic::ensure_navigation(&self.logic_path(t), &t.module, &route).await?;
        }

        let is_condition = suffix == "condition";
        let (left, right) = if is_condition {
            // First branch is the `right` (truthy) side, second the `left`.
            let right = t.children.first().map(|c| format!("./{}.yml", c.name));
            let left = t.children.get(1).map(|c| format!("./{}.yml", c.name));
            (left, right)
        } else {
            let left = t.children.last().map(|c| format!("./{}.yml", c.name));
            (left, None)
        };

        let mut props = indexmap::IndexMap::new();
        props.insert("id".to_string(), Value::from(loop_aware_id(t, "")));
        if suffix == "button" {
            props.insert("onClick".to_string(), Value::from("logics.onClick"));
        }

        let main = t.frame.spec();
        let mut frame_styles = main.styles.clone();
        if suffix == "button" {
            frame_styles.insert("cursor".into(), Value::from("pointer"));
        }
        frame_styles.insert("overflow".into(), Value::from("auto"));

        Ok(SpecFile {
            condition: Some(SpecUnit {
                base: None,
                modifier: Modifier {
                    extend: t.extend_frame.clone(),
                    props,
                    effects: on_start_effects(),
                    styles: crate::spec::Styles::Map(t.styles.clone()),
                    frame: Some(FrameField::Spec(FrameSpec {
                        base: main.base.clone(),
                        id: Some(loop_aware_id(t, "_frame")),
                        styles: frame_styles,
                    })),
                    left,
                    right,
                    ..Default::default()
                },
            }),
            ..Default::default()
        })
    }

    async fn loop_unit(&self, t: &TransformedNode) -> Result<SpecFile> {
        let item_count = t.children_data.as_ref().map(|d| d.len()).unwrap_or(1);
        logic::ensure_loop_seed(&self.logic_path(t), item_count).await?;

        let mut styles = t.styles.clone();
        styles.insert("overflow".into(), Value::from("auto"));

        let mut props = indexmap::IndexMap::new();
        props.insert("id".to_string(), Value::from(sanitize_full_colon(&t.name)));

        let main = t.frame.spec();
        let mut frame_styles = main.styles.clone();
        frame_styles.insert("overflow".into(), Value::from("auto"));

        let feed = t.children.first().map(|c| format!("./{}.yml", c.name));

        Ok(SpecFile {
            repeat: Some(SpecUnit {
                base: None,
                modifier: Modifier {
                    extend: t.extend_frame.clone(),
                    props,
                    effects: on_start_effects(),
                    styles: crate::spec::Styles::Map(styles),
                    frame: Some(FrameField::Spec(FrameSpec {
                        base: main.base.clone(),
                        id: main.id.clone(),
                        styles: frame_styles,
                    })),
                    feed,
                    ..Default::default()
                },
            }),
            ..Default::default()
        })
    }
}
