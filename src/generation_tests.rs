//! End-to-end generation properties: frame composition ordering, generator
//! determinism, condition/loop views and the extend chain across the
//! transform → emit → parse path.

use std::path::Path;

use pretty_assertions::assert_eq;
use serde_json::json;

use crate::api::FigmaApi;
use crate::cache::AssetCache;
use crate::codegen::{
    compose_component, compose_condition, compose_loop, component_source_path, frame_statement,
    logic_module_path,
};
use crate::document::DesignNode;
use crate::emit::Emitter;
use crate::spec::{EffectSpec, FrameField, FrameSpec, Modifier, SpecFile, SpecUnit, Styles};
use crate::transform::{PageIndex, Transformer};

// ═══════════════════════════════════════════════════════════════════════════════
// FRAME COMPOSITION
// ═══════════════════════════════════════════════════════════════════════════════

fn order_of(frame: &str) -> (usize, usize) {
    let rendered = frame_statement(frame, &|_| "OWN_CONTENT".to_string());
    (
        rendered.find("OWN_CONTENT").expect("content rendered"),
        rendered.find("{view}").expect("view slot rendered"),
    )
}

#[test]
fn test_frame_start_places_content_before_view() {
    for base in ["column.start", "row.start", "column.start.stack", "row.start.stack"] {
        let (content, view) = order_of(base);
        assert!(content < view, "content must precede view for {base}");
    }
}

#[test]
fn test_frame_end_places_view_before_content() {
    for base in ["column.end", "row.end", "column.end.stack", "row.end.stack"] {
        let (content, view) = order_of(base);
        assert!(view < content, "view must precede content for {base}");
    }
}

#[test]
fn test_frame_axis_selects_direction() {
    let column = frame_statement("column.start", &|_| String::new());
    assert!(column.contains("flexDirection: \"column\""));
    let row = frame_statement("row.end", &|_| String::new());
    assert!(row.contains("flexDirection: \"row\""));
}

#[test]
fn test_frame_unknown_base_behaves_as_column_start() {
    let unknown = frame_statement("mystery", &|_| "OWN_CONTENT".to_string());
    let reference = frame_statement("column.start", &|_| "OWN_CONTENT".to_string());
    assert_eq!(unknown, reference);
}

#[test]
fn test_frame_stack_marker_reaches_content_callback() {
    let plain = frame_statement("column.start", &|with_stack| format!("stack:{}", with_stack));
    assert!(plain.contains("stack:false"));
    let stacked =
        frame_statement("column.start.stack", &|with_stack| format!("stack:{}", with_stack));
    assert!(stacked.contains("stack:true"));
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPONENT GENERATION
// ═══════════════════════════════════════════════════════════════════════════════

fn minimal_component() -> SpecUnit {
    let mut modifier = Modifier::default();
    modifier.props.insert("id".into(), json!("widget"));
    modifier.states.insert("value".into(), json!("blue"));
    let mut styles = indexmap::IndexMap::new();
    styles.insert("height".to_string(), json!(54));
    styles.insert("backgroundColor".to_string(), json!("states.value"));
    modifier.styles = Styles::Map(styles);
    modifier.effects.insert(
        "onStart".into(),
        EffectSpec {
            body: Some(json!("logics.onStart")),
            watch: Some(json!(["states.value"])),
        },
    );
    modifier.frame = Some(FrameField::Base("column.start".into()));
    SpecUnit {
        base: Some("rectangle".into()),
        modifier,
    }
}

fn blueprint_path(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("src/blueprints/test_comp.yml");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    path
}

#[tokio::test]
async fn test_generator_output_is_byte_identical_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let spec_path = blueprint_path(dir.path());
    let unit = minimal_component();

    compose_component(Some(&unit), &spec_path).await.unwrap();
    let out_path = component_source_path(&spec_path);
    let first = std::fs::read_to_string(&out_path).unwrap();

    compose_component(Some(&unit), &spec_path).await.unwrap();
    let second = std::fs::read_to_string(&out_path).unwrap();
    assert_eq!(first, second);

    let logic = std::fs::read_to_string(logic_module_path(&spec_path)).unwrap();
    assert!(logic.contains("export function onStart"));
}

#[tokio::test]
async fn test_generated_component_statements() {
    let dir = tempfile::tempdir().unwrap();
    let spec_path = blueprint_path(dir.path());
    compose_component(Some(&minimal_component()), &spec_path)
        .await
        .unwrap();
    let source = std::fs::read_to_string(component_source_path(&spec_path)).unwrap();

    assert!(source.contains("import React from 'react';"));
    assert!(source.contains("import {onStart} from './logics/test_comp.mjs';"));
    assert!(source.contains("export function TestComp({view,loopIndex,loopElement}){"));
    assert!(source.contains("const [value,setValue] = React.useState(\"blue\");"));
    assert!(source.contains(
        "const component = React.useMemo(()=>({states:{\"value\":value, \"setValue\": setValue},inputs:{\"view\":view,\"loopIndex\":loopIndex,\"loopElement\":loopElement}}),[value,view,loopIndex,loopElement]);"
    ));
    // Style depends on exactly the state it references.
    assert!(source.contains(
        "const style = React.useMemo(()=>({\"height\":54,\"backgroundColor\":value}),[value]);"
    ));
    assert!(source.contains(
        "/*onStart*/\n    React.useEffect(()=>onStart({component,args:[]}),[value]);"
    ));
    assert!(source.contains("id={\"widget\"}"));
    // Own content precedes the continuation slot for column.start.
    let content_at = source.find("style={style}").unwrap();
    let view_at = source.rfind("{view}").unwrap();
    assert!(content_at < view_at);
}

#[tokio::test]
async fn test_logic_valued_style_widens_dependency_to_component() {
    let dir = tempfile::tempdir().unwrap();
    let spec_path = blueprint_path(dir.path());
    let mut unit = minimal_component();
    let mut styles = indexmap::IndexMap::new();
    styles.insert("color".to_string(), json!("logics.getColor"));
    unit.modifier.styles = Styles::Map(styles);

    compose_component(Some(&unit), &spec_path).await.unwrap();
    let source = std::fs::read_to_string(component_source_path(&spec_path)).unwrap();
    assert!(source.contains(
        "const style = React.useMemo(()=>({\"color\":getColor({component,args: []})}),[component]);"
    ));
    let logic = std::fs::read_to_string(logic_module_path(&spec_path)).unwrap();
    assert!(logic.contains("Method getColor not implemented"));
}

#[tokio::test]
async fn test_whole_style_logic_binding_memoizes_invocation() {
    let dir = tempfile::tempdir().unwrap();
    let spec_path = blueprint_path(dir.path());
    let mut unit = minimal_component();
    unit.modifier.styles = Styles::Logic("logics.getStyle".into());

    compose_component(Some(&unit), &spec_path).await.unwrap();
    let source = std::fs::read_to_string(component_source_path(&spec_path)).unwrap();
    assert!(source.contains(
        "const style = React.useMemo(()=>getStyle({component,args:[]}),[component]);"
    ));
}

#[tokio::test]
async fn test_extend_renders_view_slot_wrapping() {
    let dir = tempfile::tempdir().unwrap();
    let spec_path = blueprint_path(dir.path());
    let mut unit = minimal_component();
    unit.modifier.extend = Some("./base_card.yml".into());

    compose_component(Some(&unit), &spec_path).await.unwrap();
    let source = std::fs::read_to_string(component_source_path(&spec_path)).unwrap();
    assert!(source.contains("import {BaseCard} from './base_card.mjs';"));
    assert!(source.contains("<BaseCard view={"));
}

#[tokio::test]
async fn test_extend_with_stack_wraps_component_reference() {
    let dir = tempfile::tempdir().unwrap();
    let spec_path = blueprint_path(dir.path());
    let mut unit = minimal_component();
    unit.modifier.extend = Some("./base_card.yml".into());
    unit.modifier.frame = Some(FrameField::Base("column.start.stack".into()));

    compose_component(Some(&unit), &spec_path).await.unwrap();
    let source = std::fs::read_to_string(component_source_path(&spec_path)).unwrap();
    assert!(source.contains("<BaseCard></BaseCard>"));
    assert!(!source.contains("<BaseCard view={"));
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONDITION & LOOP
// ═══════════════════════════════════════════════════════════════════════════════

fn condition_unit(left: Option<&str>, right: Option<&str>) -> SpecUnit {
    let mut modifier = Modifier::default();
    modifier.states.insert("condition".into(), json!(false));
    modifier.left = left.map(|s| s.to_string());
    modifier.right = right.map(|s| s.to_string());
    modifier.frame = Some(FrameField::Spec(FrameSpec {
        base: Some("column.start".into()),
        id: Some("flag_frame".into()),
        styles: {
            let mut styles = indexmap::IndexMap::new();
            styles.insert("spaceValue".to_string(), json!(8));
            styles
        },
    }));
    SpecUnit {
        base: Some("rectangle".into()),
        modifier,
    }
}

#[tokio::test]
async fn test_condition_routes_right_on_true_left_on_false() {
    let dir = tempfile::tempdir().unwrap();
    let spec_path = blueprint_path(dir.path());
    let unit = condition_unit(Some("./left_box.yml"), Some("./right_box.yml"));

    compose_condition(Some(&unit), &spec_path).await.unwrap();
    let source = std::fs::read_to_string(component_source_path(&spec_path)).unwrap();

    let ternary_at = source.find("condition===true?").unwrap();
    let right_at = source.find("<RightBox loopIndex={loopIndex} loopElement={loopElement}/>").unwrap();
    let left_at = source.find("<LeftBox loopIndex={loopIndex} loopElement={loopElement}/>").unwrap();
    assert!(ternary_at < right_at && right_at < left_at);
    // spaceValue becomes the trailing margin on the branch wrapper.
    assert!(source.contains("\"marginBottom\":8"));
    assert!(!source.contains("spaceValue"));
}

#[tokio::test]
async fn test_condition_with_only_left_renders_placeholder_right() {
    let dir = tempfile::tempdir().unwrap();
    let spec_path = blueprint_path(dir.path());
    let unit = condition_unit(Some("./left_box.yml"), None);

    compose_condition(Some(&unit), &spec_path).await.unwrap();
    let source = std::fs::read_to_string(component_source_path(&spec_path)).unwrap();
    assert!(source.contains("condition===true?<span/>:"));
    assert!(source.contains("<LeftBox"));
}

#[tokio::test]
async fn test_loop_renders_feed_per_item_with_index_and_element() {
    let dir = tempfile::tempdir().unwrap();
    let spec_path = blueprint_path(dir.path());
    let mut modifier = Modifier::default();
    modifier.states.insert("data".into(), json!([]));
    modifier.feed = Some("./item_card.yml".into());
    modifier.frame = Some(FrameField::Base("column.start".into()));
    let unit = SpecUnit {
        base: Some("rectangle".into()),
        modifier,
    };

    compose_loop(Some(&unit), &spec_path).await.unwrap();
    let source = std::fs::read_to_string(component_source_path(&spec_path)).unwrap();
    assert!(source.contains("let keyIndex=0;"));
    assert!(source.contains("import {ItemCard} from './item_card.mjs';"));
    assert!(source.contains(
        "{data?.map((item,index)=> (<div key={item?._key??keyIndex++}><ItemCard loopIndex={index} loopElement={item}/></div>))}"
    ));
}

#[tokio::test]
async fn test_loop_without_feed_renders_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    let spec_path = blueprint_path(dir.path());
    let mut modifier = Modifier::default();
    modifier.frame = Some(FrameField::Base("column.start".into()));
    let unit = SpecUnit {
        base: None,
        modifier,
    };

    compose_loop(Some(&unit), &spec_path).await.unwrap();
    let source = std::fs::read_to_string(component_source_path(&spec_path)).unwrap();
    assert!(source.contains("<span/>"));
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRANSFORM → EMIT → PARSE
// ═══════════════════════════════════════════════════════════════════════════════

fn text_leaf(id: &str, name: &str) -> DesignNode {
    DesignNode {
        id: id.to_string(),
        name: name.to_string(),
        node_type: "TEXT".to_string(),
        characters: Some("hello".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_emitted_units_carry_the_extend_chain() {
    let dir = tempfile::tempdir().unwrap();
    let api = FigmaApi::with_base_url("token", "http://127.0.0.1:1");
    let assets = AssetCache::at(dir.path().join("assets"));
    let transformer = Transformer {
        api: &api,
        assets: &assets,
        fig_file: "fig",
    };

    let parent = DesignNode {
        id: "0:1".to_string(),
        name: "root_page".to_string(),
        node_type: "FRAME".to_string(),
        children: vec![
            text_leaf("1:1", "a_text"),
            text_leaf("1:2", "b_text"),
            text_leaf("1:3", "c_text"),
        ],
        ..Default::default()
    };
    let transformed = transformer.transform_children(&parent, "m", false).await;

    let src_path = dir.path().join("src/blueprints");
    let index = PageIndex::new();
    let emitter = Emitter {
        api: &api,
        assets: &assets,
        fig_file: "fig",
        src_path: &src_path,
        index: &index,
    };
    emitter.write_specs(&transformed).await.unwrap();

    let read_unit = |name: &str| -> SpecFile {
        let raw =
            std::fs::read_to_string(src_path.join("modules/m").join(format!("{name}.yml")))
                .unwrap();
        serde_yaml::from_str(&raw).unwrap()
    };

    let first = read_unit("i1_1_A_text");
    assert_eq!(first.component.unwrap().modifier.extend, None);
    let second = read_unit("i1_2_B_text");
    assert_eq!(
        second.component.unwrap().modifier.extend.as_deref(),
        Some("./i1_1_A_text.yml")
    );
    let third = read_unit("i1_3_C_text");
    assert_eq!(
        third.component.unwrap().modifier.extend.as_deref(),
        Some("./i1_2_B_text.yml")
    );
}

#[tokio::test]
async fn test_loop_emission_seeds_feed_length() {
    let dir = tempfile::tempdir().unwrap();
    let api = FigmaApi::with_base_url("token", "http://127.0.0.1:1");
    let assets = AssetCache::at(dir.path().join("assets"));
    let transformer = Transformer {
        api: &api,
        assets: &assets,
        fig_file: "fig",
    };

    let repeated = DesignNode {
        id: "3:0".to_string(),
        name: "cards_loop".to_string(),
        node_type: "FRAME".to_string(),
        children: vec![
            text_leaf("3:1", "row_a_text"),
            text_leaf("3:2", "row_b_text"),
            text_leaf("3:3", "row_c_text"),
        ],
        ..Default::default()
    };
    let parent = DesignNode {
        id: "0:9".to_string(),
        name: "root_page".to_string(),
        node_type: "FRAME".to_string(),
        children: vec![repeated],
        ..Default::default()
    };
    let transformed = transformer.transform_children(&parent, "m", false).await;

    let src_path = dir.path().join("src/blueprints");
    let index = PageIndex::new();
    let emitter = Emitter {
        api: &api,
        assets: &assets,
        fig_file: "fig",
        src_path: &src_path,
        index: &index,
    };
    emitter.write_specs(&transformed).await.unwrap();

    let loop_yaml = std::fs::read_to_string(
        src_path.join("modules/m/i3_0_Cards_loop.yml"),
    )
    .unwrap();
    let spec: SpecFile = serde_yaml::from_str(&loop_yaml).unwrap();
    let unit = spec.repeat.unwrap();
    assert_eq!(
        unit.modifier.feed.as_deref(),
        Some("./i3_1_Row_a_text.yml")
    );

    // Exactly three placeholder records seed the feed.
    let logic = std::fs::read_to_string(
        src_path.join("modules/m/logics/i3_0_Cards_loop.mjs"),
    )
    .unwrap();
    assert!(logic.contains("new Array(3).fill({})"));
    // Only the template child was emitted.
    assert!(src_path.join("modules/m/i3_1_Row_a_text.yml").exists());
    assert!(!src_path.join("modules/m/i3_2_Row_b_text.yml").exists());
}

#[tokio::test]
async fn test_build_spec_file_generates_all_units() {
    let dir = tempfile::tempdir().unwrap();
    let spec_path = blueprint_path(dir.path());
    let yaml = "component:\n  base: text\n  modifier:\n    props:\n      children: states.value\n      id: test_comp\n    states:\n      value: hi\n    styles:\n      height: 54\n    frame: column.start\n";
    std::fs::write(&spec_path, yaml).unwrap();

    crate::compile::build_spec_file(&spec_path).await.unwrap();
    let source = std::fs::read_to_string(component_source_path(&spec_path)).unwrap();
    assert!(source.contains("export function TestComp"));
    assert!(source.contains(">{value}</span>"));
}
