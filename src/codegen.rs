//! Component source generation.
//!
//! Consumes one spec unit and emits the React component module for it. Every
//! step is pure given the unit; the only side effects are the logic-module
//! synthesis (which must run before the import statement is final) and the
//! file write. Repeated runs over an unchanged unit produce byte-identical
//! output.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_json::Value;
use tokio::fs;
use tracing::debug;

use crate::binding::{
    effect_body, input_name, leading_identifier, logic_name, state_initial, watch_dependency,
    Binding,
};
use crate::error::{BuildError, Result};
use crate::logic;
use crate::naming::{component_name, first_upper_case};
use crate::spec::{ChildrenValue, Modifier, SpecUnit, Styles};

const INPUT_SLOTS: [&str; 3] = ["view", "loopIndex", "loopElement"];

// ═══════════════════════════════════════════════════════════════════════════════
// PATHS
// ═══════════════════════════════════════════════════════════════════════════════

/// Blueprint file stem: `modules/auth/login.yml` -> `login`.
pub fn file_stem(spec_path: &Path) -> String {
    spec_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Generated source path: the blueprint path with every `blueprints` segment
/// dropped and the extension swapped to `.mjs`.
pub fn component_source_path(spec_path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for part in spec_path.iter() {
        if part != "blueprints" {
            out.push(part);
        }
    }
    out.set_extension("mjs");
    out
}

/// Companion logic module: sibling `logics/` folder, same stem.
pub fn logic_module_path(spec_path: &Path) -> PathBuf {
    let parent = spec_path.parent().unwrap_or_else(|| Path::new("."));
    parent.join("logics").join(format!("{}.mjs", file_stem(spec_path)))
}

// ═══════════════════════════════════════════════════════════════════════════════
// COLLECTION
// ═══════════════════════════════════════════════════════════════════════════════

fn push_unique(list: &mut Vec<String>, name: String) {
    if !name.is_empty() && !list.iter().any(|n| n == &name) {
        list.push(name);
    }
}

fn watch_entries(watch: Option<&Value>) -> Vec<Value> {
    match watch {
        Some(Value::Array(items)) => items.clone(),
        Some(single) => vec![single.clone()],
        None => Vec::new(),
    }
}

/// Distinct input parameter names: every `inputs.`-prefixed value across
/// props, states, effect watch lists and styles, then the slots a parent
/// fills when chaining or looping this unit.
pub fn collect_inputs(modifier: &Modifier) -> Vec<String> {
    let mut inputs = Vec::new();
    for value in modifier.props.values() {
        if let Some(name) = input_name(value) {
            push_unique(&mut inputs, name);
        }
    }
    for value in modifier.states.values() {
        if let Some(name) = input_name(value) {
            push_unique(&mut inputs, name);
        }
    }
    for effect in modifier.effects.values() {
        for entry in watch_entries(effect.watch.as_ref()) {
            if let Some(name) = input_name(&entry) {
                push_unique(&mut inputs, name);
            }
        }
    }
    if let Styles::Map(map) = &modifier.styles {
        for value in map.values() {
            if let Some(name) = input_name(value) {
                push_unique(&mut inputs, name);
            }
        }
    }
    for slot in INPUT_SLOTS {
        push_unique(&mut inputs, slot.to_string());
    }
    inputs
}

/// Distinct logic-referenced names across props, effect bodies and styles.
pub fn collect_logic_names(modifier: &Modifier) -> Vec<String> {
    let mut names = Vec::new();
    for value in modifier.props.values() {
        if let Some(name) = logic_name(value) {
            push_unique(&mut names, name);
        }
    }
    for effect in modifier.effects.values() {
        if let Some(body) = &effect.body {
            if let Some(name) = logic_name(body) {
                push_unique(&mut names, name);
            }
        }
    }
    match &modifier.styles {
        Styles::Logic(_) => {
            if let Some(name) = modifier.styles.as_logic() {
                push_unique(&mut names, name);
            }
        }
        Styles::Map(map) => {
            for value in map.values() {
                if let Some(name) = logic_name(value) {
                    push_unique(&mut names, name);
                }
            }
        }
    }
    names
}

fn memo_dependencies(modifier: &Modifier, inputs: &[String]) -> String {
    let mut deps: Vec<String> = modifier.states.keys().cloned().collect();
    deps.extend(inputs.iter().cloned());
    deps.join(",")
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATEMENTS
// ═══════════════════════════════════════════════════════════════════════════════

fn states_statement(modifier: &Modifier) -> String {
    modifier
        .states
        .iter()
        .map(|(name, value)| {
            format!(
                "const [{},set{}] = React.useState({});",
                name,
                first_upper_case(name),
                state_initial(value)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\t")
}

fn component_memo_statement(modifier: &Modifier, inputs: &[String]) -> String {
    let states_map = modifier
        .states
        .keys()
        .map(|name| {
            format!(
                "\"{name}\":{name}, \"set{upper}\": set{upper}",
                upper = first_upper_case(name)
            )
        })
        .collect::<Vec<_>>()
        .join(",");
    let inputs_map = inputs
        .iter()
        .map(|name| format!("\"{name}\":{name}"))
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "const component = React.useMemo(()=>({{states:{{{}}},inputs:{{{}}}}}),[{}]);",
        states_map,
        inputs_map,
        memo_dependencies(modifier, inputs)
    )
}

fn style_map_entries(map: &IndexMap<String, Value>) -> String {
    map.iter()
        .map(|(key, value)| {
            format!("\"{}\":{}", key, Binding::classify(value).style_expression())
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Dependencies of the memoized style object: the state/input identifiers it
/// references; any logic-valued entry widens the dependency to the whole
/// component context.
fn style_dependencies(map: &IndexMap<String, Value>) -> String {
    let mut deps = Vec::new();
    let mut uses_logic = false;
    for value in map.values() {
        match Binding::classify(value) {
            Binding::State(name) | Binding::Input(name) => {
                push_unique(&mut deps, leading_identifier(&name));
            }
            Binding::Logic { .. } => uses_logic = true,
            Binding::Literal(_) => {}
        }
    }
    if uses_logic {
        return "component".to_string();
    }
    deps.join(",")
}

fn style_statement(modifier: &Modifier) -> String {
    if let Some(name) = modifier.styles.as_logic() {
        return format!(
            "const style = React.useMemo(()=>{}({{component,args:[]}}),[component]);",
            name
        );
    }
    let map = modifier.styles.as_map();
    format!(
        "const style = React.useMemo(()=>({{{}}}),[{}]);",
        style_map_entries(&map),
        style_dependencies(&map)
    )
}

fn effects_statement(modifier: &Modifier) -> String {
    modifier
        .effects
        .iter()
        .map(|(name, effect)| {
            let deps = watch_entries(effect.watch.as_ref())
                .iter()
                .filter_map(watch_dependency)
                .collect::<Vec<_>>()
                .join(",");
            format!(
                "/*{}*/\n    React.useEffect(()=>{}({{component,args:[]}}),[{}]);",
                name,
                effect_body(effect.body.as_ref()),
                deps
            )
        })
        .collect::<Vec<_>>()
        .join("\n\t")
}

fn props_statement(modifier: &Modifier) -> String {
    modifier
        .render_props()
        .iter()
        .map(|(key, value)| format!("{}={{{}}}", key, Binding::classify(value).prop_expression()))
        .collect::<Vec<_>>()
        .join("\n\t\t\t")
}

fn component_reference(spec_ref: &str) -> String {
    component_name(&file_stem(Path::new(spec_ref)))
}

fn components_import_statement(modifier: &Modifier) -> String {
    [
        modifier.extend.as_ref(),
        modifier.left.as_ref(),
        modifier.right.as_ref(),
        modifier.feed.as_ref(),
    ]
    .into_iter()
    .flatten()
    .filter(|reference| reference.ends_with(".yml"))
    .map(|reference| {
        let import_path = if reference.starts_with('.') {
            reference.clone()
        } else {
            format!("./{}", reference)
        };
        format!(
            "import {{{}}} from '{}';",
            component_reference(reference),
            import_path.replace(".yml", ".mjs")
        )
    })
    .collect::<Vec<_>>()
    .join("\n")
}

fn logics_import_statement(spec_path: &Path, names: &[String]) -> String {
    format!(
        "import {{{}}} from './logics/{}.mjs';",
        names.join(","),
        file_stem(spec_path)
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// FRAME COMPOSITION
// ═══════════════════════════════════════════════════════════════════════════════

const COLUMN_STYLE: &str = "{{display: \"flex\",position: \"relative\",flexDirection: \"column\"}}";
const ROW_STYLE: &str = "{{display: \"flex\",position: \"relative\",flexDirection: \"row\"}}";

/// Compose a unit's own content with the inherited continuation slot.
///
/// `*.start` renders content before `{view}`, `*.end` after; an unknown base
/// behaves as `column.start`. The `.stack` marker is forwarded to the content
/// callback, which switches the extend wrapping from slot-forwarding to a
/// component reference.
pub fn frame_statement(frame_base: &str, on_child: &dyn Fn(bool) -> String) -> String {
    let base = frame_base.trim().to_lowercase();
    let with_stack = base.contains(".stack");
    let (style, content_first) = if base.starts_with("row.start") {
        (ROW_STYLE, true)
    } else if base.starts_with("row.end") {
        (ROW_STYLE, false)
    } else if base.starts_with("column.end") {
        (COLUMN_STYLE, false)
    } else {
        (COLUMN_STYLE, true)
    };
    let content = on_child(with_stack);
    if content_first {
        format!(
            "\n            <div style={}>\n                {}\n                {{view}}\n            </div>\n        ",
            style, content
        )
    } else {
        format!(
            "\n            <div style={}>\n                {{view}}\n                {}\n            </div>\n        ",
            style, content
        )
    }
}

/// Base element tag for a component unit.
fn base_element(unit: &SpecUnit) -> &'static str {
    match unit.base.as_deref() {
        Some("image") => "img",
        Some("text") => "span",
        Some("input") => "input",
        _ => "div",
    }
}

/// Content callback honoring the extend chain: without an extend base the
/// unit's own view renders inline; with one, the base component either wraps
/// this unit's element (stacking roots) or receives the view through its
/// `view` slot.
fn content_view<'a>(
    unit: &'a SpecUnit,
    view_without_extend: String,
) -> impl Fn(bool) -> String + 'a {
    let extend_base = unit
        .modifier
        .extend
        .as_ref()
        .filter(|e| e.ends_with(".yml"))
        .map(|e| component_reference(e));
    let props = props_statement(&unit.modifier);
    let base = base_element(unit);
    move |with_stack: bool| -> String {
        match &extend_base {
            None => view_without_extend.clone(),
            Some(extend) if with_stack => format!(
                "<{base}  style={{style}} {props}><{extend}></{extend}></{base}>",
                base = base,
                props = props,
                extend = extend
            ),
            Some(extend) => format!(
                "<{extend} view={{{view}}}></{extend}>",
                extend = extend,
                view = view_without_extend
            ),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VIEWS
// ═══════════════════════════════════════════════════════════════════════════════

fn component_view(unit: &SpecUnit) -> String {
    let base = base_element(unit);
    let props = props_statement(&unit.modifier);
    let children = match unit.modifier.children() {
        ChildrenValue::State(value) | ChildrenValue::Input(value) => format!("{{{}}}", value),
        ChildrenValue::Component(value) | ChildrenValue::Raw(value) => value,
    };
    format!(
        "\n        <{base} \n            style={{style}}\n            {props}\n        >{children}</{base}>\n    ",
        base = base,
        props = props,
        children = children
    )
}

/// Branch style for a condition: the frame styles with the layout direction
/// inlined and `spaceValue` turned into the trailing margin.
fn condition_branch_style(unit: &SpecUnit) -> String {
    let frame = unit.modifier.frame.as_ref();
    let base = unit.modifier.frame_base();
    let mut styles: IndexMap<String, Value> =
        frame.map(|f| f.styles()).unwrap_or_default();
    let space_value = styles.shift_remove("spaceValue");
    styles.insert("display".into(), Value::from("flex"));
    styles.insert(
        "flexDirection".into(),
        Value::from(if base.starts_with("row") { "row" } else { "column" }),
    );
    if let Some(space) = space_value {
        if !space.is_null() {
            let margin_key = if base.starts_with("row") {
                "marginRight"
            } else {
                "marginBottom"
            };
            styles.insert(margin_key.into(), space);
        }
    }
    serde_json::to_string(&styles).expect("style map serializes")
}

fn condition_view(unit: &SpecUnit) -> String {
    let style = condition_branch_style(unit);
    let props = props_statement(&unit.modifier);
    let branch = |reference: &Option<String>| -> String {
        match reference {
            Some(path) => format!(
                "<div style={{{style}}} {props}><{name} loopIndex={{loopIndex}} loopElement={{loopElement}}/></div>",
                style = style,
                props = props,
                name = component_reference(path)
            ),
            None => "<span/>".to_string(),
        }
    };
    let left = branch(&unit.modifier.left);
    let right = branch(&unit.modifier.right);
    let view = format!("condition===true?{}:{}", right, left);
    if unit.modifier.extend.is_some() {
        view
    } else {
        format!("{{{}}}", view)
    }
}

fn loop_view(unit: &SpecUnit) -> String {
    let Some(feed) = &unit.modifier.feed else {
        return "<span/>".to_string();
    };
    let props = props_statement(&unit.modifier);
    format!(
        "\n        <div \n            style={{style}}\n            {props}\n        >\n            {{data?.map((item,index)=> (<div key={{item?._key??keyIndex++}}><{feed} loopIndex={{index}} loopElement={{item}}/></div>))}}\n        </div>\n    ",
        props = props,
        feed = component_reference(feed)
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPOSERS
// ═══════════════════════════════════════════════════════════════════════════════

async fn write_component_source(spec_path: &Path, content: &str) -> Result<()> {
    let out_path = component_source_path(spec_path);
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| BuildError::io(parent, e))?;
    }
    fs::write(&out_path, content)
        .await
        .map_err(|e| BuildError::io(&out_path, e))?;
    debug!("component source written: {:?}", out_path);
    Ok(())
}

async fn prepared_logics_import(unit: &SpecUnit, spec_path: &Path) -> Result<String> {
    let names = collect_logic_names(&unit.modifier);
    logic::ensure_logic_module(&logic_module_path(spec_path), &names).await?;
    Ok(logics_import_statement(spec_path, &names))
}

/// Generate the source for a component unit.
pub async fn compose_component(unit: Option<&SpecUnit>, spec_path: &Path) -> Result<()> {
    let Some(unit) = unit else { return Ok(()) };

    let inputs = collect_inputs(&unit.modifier);
    let logics_import = prepared_logics_import(unit, spec_path).await?;
    let components_import = components_import_statement(&unit.modifier);
    let view_without_extend = component_view(unit);
    let frame = frame_statement(
        &unit.modifier.frame_base(),
        &content_view(unit, view_without_extend),
    );

    let content = format!(
        "\nimport React from 'react';\n{logics}\n{components}\n\n// eslint-disable-next-line react/prop-types\nexport function {name}({{{inputs}}}){{\n    {states}\n    \n    {component}\n    \n    {style}\n    \n    {effects}\n    \n    return({frame});\n}}\n    ",
        logics = logics_import,
        components = components_import,
        name = component_name(&file_stem(spec_path)),
        inputs = inputs.join(","),
        states = states_statement(&unit.modifier),
        component = component_memo_statement(&unit.modifier, &inputs),
        style = style_statement(&unit.modifier),
        effects = effects_statement(&unit.modifier),
        frame = frame,
    );

    write_component_source(spec_path, &content).await
}

/// Generate the source for a condition unit.
pub async fn compose_condition(unit: Option<&SpecUnit>, spec_path: &Path) -> Result<()> {
    let Some(unit) = unit else { return Ok(()) };

    let inputs = collect_inputs(&unit.modifier);
    let logics_import = prepared_logics_import(unit, spec_path).await?;
    let components_import = components_import_statement(&unit.modifier);
    let view_without_extend = condition_view(unit);
    let frame = frame_statement(
        &unit.modifier.frame_base(),
        &content_view(unit, view_without_extend),
    );

    let content = format!(
        "\nimport React from 'react';\n{logics}\n{components}\n\n// eslint-disable-next-line react/prop-types\nexport function {name}({{view,loopIndex,loopElement}}) {{\n    {states}\n    \n    {component}\n\n    {effects}\n\n    return({frame});\n}}\n    ",
        logics = logics_import,
        components = components_import,
        name = component_name(&file_stem(spec_path)),
        states = states_statement(&unit.modifier),
        component = component_memo_statement(&unit.modifier, &inputs),
        effects = effects_statement(&unit.modifier),
        frame = frame,
    );

    write_component_source(spec_path, &content).await
}

/// Generate the source for a loop unit.
pub async fn compose_loop(unit: Option<&SpecUnit>, spec_path: &Path) -> Result<()> {
    let Some(unit) = unit else { return Ok(()) };

    let inputs = collect_inputs(&unit.modifier);
    let logics_import = prepared_logics_import(unit, spec_path).await?;
    let components_import = components_import_statement(&unit.modifier);
    let view_without_extend = loop_view(unit);
    let frame = frame_statement(
        &unit.modifier.frame_base(),
        &content_view(unit, view_without_extend),
    );

    let content = format!(
        "\nimport React from 'react';\n{logics}\n{components}\n\nlet keyIndex=0;\n\n// eslint-disable-next-line react/prop-types\nexport function {name}({{view,loopIndex,loopElement}}) {{\n    {states}\n    \n    {component}\n    \n    {style}\n\n    {effects}\n\n    return({frame});\n}}\n    ",
        logics = logics_import,
        components = components_import,
        name = component_name(&file_stem(spec_path)),
        states = states_statement(&unit.modifier),
        component = component_memo_statement(&unit.modifier, &inputs),
        style = style_statement(&unit.modifier),
        effects = effects_statement(&unit.modifier),
        frame = frame,
    );

    write_component_source(spec_path, &content).await
}
