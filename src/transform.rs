//! Design tree transformer.
//!
//! Walks the design document and produces, per node, a classified
//! [`TransformedNode`] carrying the derived identifier, the extend-chain
//! link to its previous sibling, the normalized style map and the frame
//! descriptor the emitter serializes. Children run strictly in document
//! order: child *i*'s extend reference is only valid once child *i-1*'s name
//! is fixed.
//!
//! The page pass also assembles the route index (node id → route target).
//! The index is returned to the caller and threaded into the emit phase
//! explicitly; nothing in here is process-global.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use serde::Serialize;

use crate::api::FigmaApi;
use crate::cache::AssetCache;
use crate::document::{DesignNode, NODE_FRAME};
use crate::layout::{
    self, axis_align, background_blur, child_frame_base, drop_shadow, fill_flex, fixed_size,
    image_ref, insert_num, insert_str, layer_blur, layout_wrap, main_frame_base, num_value,
    page_frame_base, LAYOUT_VERTICAL,
};
use crate::naming::{base_type, node_identifier, sanitize_full_colon};
use crate::spec::{FrameSpec, StyleMap};

const TYPE_CONDITION: &str = "condition";
const TYPE_LOOP: &str = "loop";

/// Route target recorded for a page, addressed by node id. Serialized
/// verbatim into generated `setCurrentRoute(...)` calls.
#[derive(Debug, Clone, Serialize)]
pub struct RouteTarget {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub route_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
}

impl RouteTarget {
    pub fn close() -> Self {
        RouteTarget {
            name: None,
            route_type: "close".to_string(),
            module: None,
        }
    }
}

/// Node id → route target, assembled once during the page pass and read-only
/// afterwards.
pub type PageIndex = HashMap<String, RouteTarget>;

/// Frame descriptor attached to a transformed node. A container owns a main
/// frame; a leaf owns a child frame. Exactly one applies.
#[derive(Debug, Clone)]
pub enum NodeFrame {
    Main(FrameSpec),
    Child(FrameSpec),
}

impl NodeFrame {
    pub fn spec(&self) -> &FrameSpec {
        match self {
            NodeFrame::Main(spec) | NodeFrame::Child(spec) => spec,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransformedNode {
    /// Source node attributes; `children` live on the transformed wrapper.
    pub node: DesignNode,
    pub name: String,
    pub module: String,
    pub is_loop_element: bool,
    /// Blueprint path of the previous sibling, forming the render chain.
    pub extend_frame: Option<String>,
    pub styles: StyleMap,
    pub frame: NodeFrame,
    /// Placeholder record keys captured before a loop was collapsed; the
    /// length seeds the feed's initial size.
    pub children_data: Option<Vec<String>>,
    pub children: Vec<TransformedNode>,
}

impl TransformedNode {
    pub fn is_loop(&self) -> bool {
        self.children_data.is_some()
    }
}

pub struct Transformer<'a> {
    pub api: &'a FigmaApi,
    pub assets: &'a AssetCache,
    pub fig_file: &'a str,
}

type BoxedTransform<'b> = Pin<Box<dyn Future<Output = Vec<TransformedNode>> + Send + 'b>>;

fn extend_reference(
    children: &[DesignNode],
    index: usize,
    parent_is_condition: bool,
) -> Option<String> {
    if index == 0 || (parent_is_condition && index == 1) {
        return None;
    }
    let prev = &children[index - 1];
    Some(format!("./{}.yml", node_identifier(&prev.id, &prev.name)))
}

fn loop_styles(child: &DesignNode, parent: &DesignNode) -> StyleMap {
    let vertical = child.layout_mode.as_deref() == Some(LAYOUT_VERTICAL);
    let (justify_src, align_src) = if vertical {
        (&child.primary_axis_align_items, &child.counter_axis_align_items)
    } else {
        (&child.counter_axis_align_items, &child.primary_axis_align_items)
    };
    let mut map = StyleMap::new();
    map.insert("display".into(), "flex".into());
    map.insert("color".into(), "transparent".into());
    map.insert(
        "flexDirection".into(),
        if vertical { "column" } else { "row" }.into(),
    );
    map.insert(
        "flexWrap".into(),
        layout_wrap(child.layout_wrap.as_deref()).into(),
    );
    map.insert(
        "justifyContent".into(),
        axis_align(justify_src.as_deref()).into(),
    );
    map.insert("alignItems".into(), axis_align(align_src.as_deref()).into());
    insert_num(
        &mut map,
        "flex",
        fill_flex(parent.layout_mode.as_deref(), child),
    );
    map
}

fn frame_child_styles(child: &DesignNode, parent: &DesignNode) -> StyleMap {
    let mut map = StyleMap::new();
    insert_str(&mut map, "boxShadow", drop_shadow(child));
    insert_str(&mut map, "backdropFilter", background_blur(child));
    insert_str(&mut map, "WebkitBackdropFilter", background_blur(child));
    insert_str(&mut map, "filter", layer_blur(child));
    insert_num(
        &mut map,
        "flex",
        fill_flex(parent.layout_mode.as_deref(), child),
    );
    map
}

fn main_frame_styles(
    child: &DesignNode,
    parent: &DesignNode,
    background_image: Option<&str>,
    is_last_child: bool,
) -> StyleMap {
    let vertical = child.layout_mode.as_deref() == Some(LAYOUT_VERTICAL);
    let (justify_src, align_src) = if vertical {
        (&child.primary_axis_align_items, &child.counter_axis_align_items)
    } else {
        (&child.counter_axis_align_items, &child.primary_axis_align_items)
    };
    let mut map = StyleMap::new();
    // Sibling spacing rides on every child but the last; the composer turns
    // it into a trailing margin along the parent's axis.
    let space = if is_last_child {
        0.0
    } else {
        parent.item_spacing.unwrap_or(0.0)
    };
    map.insert("spaceValue".into(), num_value(space));
    insert_num(&mut map, "paddingLeft", child.padding_left);
    insert_num(&mut map, "paddingRight", child.padding_right);
    insert_num(&mut map, "paddingTop", child.padding_top);
    insert_num(&mut map, "paddingBottom", child.padding_bottom);
    map.insert(
        "flexWrap".into(),
        layout_wrap(child.layout_wrap.as_deref()).into(),
    );
    insert_num(
        &mut map,
        "flex",
        fill_flex(parent.layout_mode.as_deref(), child),
    );
    map.insert(
        "justifyContent".into(),
        axis_align(justify_src.as_deref()).into(),
    );
    map.insert("alignItems".into(), axis_align(align_src.as_deref()).into());
    insert_num(
        &mut map,
        "width",
        fixed_size(
            child.layout_sizing_horizontal.as_deref(),
            child.absolute_render_bounds.and_then(|b| b.width),
        ),
    );
    insert_num(
        &mut map,
        "height",
        fixed_size(
            child.layout_sizing_vertical.as_deref(),
            child.absolute_render_bounds.and_then(|b| b.height),
        ),
    );
    map.extend(layout::container_styles(child, background_image));
    insert_str(&mut map, "boxShadow", drop_shadow(child));
    insert_str(&mut map, "backdropFilter", background_blur(child));
    insert_str(&mut map, "WebkitBackdropFilter", background_blur(child));
    insert_str(&mut map, "filter", layer_blur(child));
    map
}

fn leaf_styles(child: &DesignNode, parent: &DesignNode, is_last_child: bool) -> StyleMap {
    let mut map = StyleMap::new();
    if let Some(style) = &child.style {
        for (k, v) in style {
            if !v.is_null() {
                map.insert(k.clone(), v.clone());
            }
        }
    }
    if !is_last_child {
        let key = if parent.layout_mode.as_deref() == Some(layout::LAYOUT_HORIZONTAL) {
            "marginRight"
        } else {
            "marginBottom"
        };
        map.insert(key.into(), num_value(parent.item_spacing.unwrap_or(0.0)));
    }
    insert_num(
        &mut map,
        "flex",
        fill_flex(parent.layout_mode.as_deref(), child),
    );
    insert_str(&mut map, "backdropFilter", background_blur(child));
    insert_str(&mut map, "WebkitBackdropFilter", background_blur(child));
    insert_str(&mut map, "filter", layer_blur(child));
    map
}

fn strip_module(name: &str) -> String {
    lazy_static::lazy_static! {
        static ref BRACKET_RE: regex::Regex = regex::Regex::new(r"\[.*\]").unwrap();
    }
    BRACKET_RE.replace_all(name, "").trim().to_string()
}

fn module_of(name: &str) -> String {
    lazy_static::lazy_static! {
        static ref EDGES_RE: regex::Regex = regex::Regex::new(r"(.*\[)|(\].*)").unwrap();
    }
    EDGES_RE.replace_all(name, "").trim().to_string()
}

impl<'a> Transformer<'a> {
    /// Transform every visible top-level FRAME as a page, returning the pages
    /// plus the route index keyed by node id.
    pub async fn transform_pages(
        &self,
        document: &DesignNode,
    ) -> (Vec<TransformedNode>, PageIndex) {
        let mut index = PageIndex::new();
        let mut pages = Vec::new();

        let top_level: Vec<&DesignNode> = document
            .children
            .iter()
            .filter(|c| c.is_visible() && c.node_type == NODE_FRAME)
            .collect();

        for page in top_level {
            let plain_name = strip_module(&page.name);
            let module = module_of(&page.name);
            let mut segments: Vec<&str> = plain_name.split('_').collect();
            let route_type = segments.pop().unwrap_or("").to_string();
            let route_name = segments.join("_");
            index.insert(
                page.id.clone(),
                RouteTarget {
                    name: Some(route_name),
                    route_type,
                    module: Some(module.clone()),
                },
            );

            let background_image = self
                .assets
                .resolve(self.api, self.fig_file, image_ref(&page.fills).as_deref(), None, None)
                .await;

            let children = self.transform_children(page, &module, false).await;

            let mut frame_styles = StyleMap::new();
            insert_num(&mut frame_styles, "paddingLeft", page.padding_left);
            insert_num(&mut frame_styles, "paddingRight", page.padding_right);
            insert_num(&mut frame_styles, "paddingTop", page.padding_top);
            insert_num(&mut frame_styles, "paddingBottom", page.padding_bottom);
            frame_styles.insert("height".into(), "100vh".into());
            frame_styles.insert("width".into(), "100vw".into());
            frame_styles.extend(layout::container_styles(page, background_image.as_deref()));

            let mut node = page.clone();
            node.children = Vec::new();
            pages.push(TransformedNode {
                node,
                name: plain_name.clone(),
                module,
                is_loop_element: false,
                extend_frame: None,
                styles: StyleMap::new(),
                frame: NodeFrame::Main(FrameSpec {
                    base: Some(page_frame_base(page.layout_mode.as_deref()).to_string()),
                    id: Some(sanitize_full_colon(&format!("{}_frame", plain_name))),
                    styles: frame_styles,
                }),
                children_data: None,
                children,
            });
        }

        (pages, index)
    }

    /// Recursive child walk. `parent.name` must already be the derived name
    /// when descending, because the condition classification reads it.
    pub fn transform_children<'b>(
        &'b self,
        parent: &'b DesignNode,
        module: &'b str,
        is_loop_element: bool,
    ) -> BoxedTransform<'b> {
        Box::pin(async move {
            let parent_is_condition = base_type(&parent.name) == TYPE_CONDITION;

            // A condition's children are its branches, never an optional or
            // hidden pair: force them visible.
            let mut children: Vec<DesignNode> = parent
                .children
                .iter()
                .filter(|c| c.is_visible() || parent_is_condition)
                .cloned()
                .collect();
            if parent_is_condition {
                for child in &mut children {
                    child.visible = Some(true);
                    child.absolute_render_bounds = child.absolute_bounding_box;
                }
            }

            let total = children.len();
            let mut out = Vec::with_capacity(total);

            for index in 0..total {
                let extend_frame = extend_reference(&children, index, parent_is_condition);
                let mut child = children[index].clone();
                let is_last_child = index == total - 1;

                if child.is_frame_like() {
                    let background_image = self
                        .assets
                        .resolve(
                            self.api,
                            self.fig_file,
                            image_ref(&child.fills).as_deref(),
                            None,
                            None,
                        )
                        .await;

                    let is_loop = base_type(&child.name) == TYPE_LOOP;
                    let mut children_data = None;
                    if is_loop {
                        let keys = child
                            .children
                            .iter()
                            .enumerate()
                            .map(|(i, c)| {
                                if c.id.is_empty() {
                                    format!("item-{}", i)
                                } else {
                                    c.id.clone()
                                }
                            })
                            .collect::<Vec<_>>();
                        children_data = Some(keys);
                        // The first child is the reusable per-item template;
                        // the rest only contribute their count above.
                        child.children.truncate(1);
                    }

                    let name = node_identifier(&child.id, &child.name);
                    let styles = if is_loop {
                        loop_styles(&child, parent)
                    } else {
                        frame_child_styles(&child, parent)
                    };
                    let frame = NodeFrame::Main(FrameSpec {
                        base: Some(main_frame_base(parent.layout_mode.as_deref()).to_string()),
                        id: Some(sanitize_full_colon(&format!("{}_frame", name))),
                        styles: main_frame_styles(
                            &child,
                            parent,
                            background_image.as_deref(),
                            is_last_child,
                        ),
                    });

                    let mut renamed = child.clone();
                    renamed.name = name.clone();
                    let sub_children = self
                        .transform_children(&renamed, module, is_loop || is_loop_element)
                        .await;

                    let mut node = child;
                    node.children = Vec::new();
                    out.push(TransformedNode {
                        node,
                        name,
                        module: module.to_string(),
                        is_loop_element,
                        extend_frame,
                        styles,
                        frame,
                        children_data,
                        children: sub_children,
                    });
                } else {
                    let name = node_identifier(&child.id, &child.name);
                    let styles = leaf_styles(&child, parent, is_last_child);
                    let frame = NodeFrame::Child(FrameSpec {
                        base: Some(child_frame_base(parent.layout_mode.as_deref()).to_string()),
                        id: Some(sanitize_full_colon(&format!("{}_frame", name))),
                        styles: {
                            let mut map = StyleMap::new();
                            map.insert(
                                "flexWrap".into(),
                                layout_wrap(parent.layout_wrap.as_deref()).into(),
                            );
                            insert_num(
                                &mut map,
                                "flex",
                                fill_flex(parent.layout_mode.as_deref(), &child),
                            );
                            map
                        },
                    });

                    let mut node = child;
                    node.children = Vec::new();
                    out.push(TransformedNode {
                        node,
                        name,
                        module: module.to_string(),
                        is_loop_element,
                        extend_frame,
                        styles,
                        frame,
                        children_data: None,
                        children: Vec::new(),
                    });
                }
            }

            out
        })
    }
}
