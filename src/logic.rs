//! Logic module synthesis.
//!
//! Generated components import hand-implementable functions from a companion
//! `logics/` module. This pass guarantees every referenced name exists
//! without ever discarding user code: the module is parsed statically (never
//! executed), missing exports are appended as throwing stubs, and the two
//! structural patches (the navigation `setCurrentRoute` call in `onClick`
//! and the feed seed in `onStart`) are located on the syntax tree and
//! applied as minimal span-based text edits so unrelated formatting and
//! comments survive. Re-running any of these against their own output is a
//! no-op; a module that fails to parse is left untouched.

use std::collections::HashMap;
use std::path::Path;

use lazy_static::lazy_static;
use oxc_allocator::Allocator;
use oxc_ast::ast::{Declaration, Expression, Statement};
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType};
use regex::Regex;
use tokio::fs;
use tracing::warn;

use crate::error::{BuildError, Result};
use crate::transform::RouteTarget;

lazy_static! {
    static ref IMPORT_SET_ROUTE_RE: Regex =
        Regex::new(r#"import\s*\{\s*setCurrentRoute\s*\}\s*from\s*.*routing.mjs['"]\s*;*\s*"#)
            .unwrap();
    static ref IMPORT_SET_ROUTE_MIXER_RE: Regex =
        Regex::new(r"setCurrentRoute\s*,|,\s*setCurrentRoute").unwrap();
}

const STUB_DOC: &str = "\n/**\n* @param data {\n* {component: {states: *,inputs: *}, args: Array<*>}\n* }\n*/";

#[derive(Debug, Default, Clone, Copy)]
struct FunctionInfo {
    /// Offset just past the body's opening brace.
    body_open: usize,
    /// Span of the first `setCurrentRoute(...)` call inside the body.
    set_route_call: Option<(usize, usize)>,
    /// Any `.setData(...)` member call inside the body.
    has_set_data_call: bool,
}

#[derive(Debug, Default)]
struct ModuleAnalysis {
    export_names: Vec<String>,
    functions: HashMap<String, FunctionInfo>,
}

struct CallScanner {
    set_route_call: Option<(usize, usize)>,
    has_set_data_call: bool,
}

impl<'a> oxc_ast_visit::Visit<'a> for CallScanner {
    fn visit_call_expression(&mut self, expr: &oxc_ast::ast::CallExpression<'a>) {
        match &expr.callee {
            Expression::Identifier(ident) if ident.name == "setCurrentRoute" => {
                if self.set_route_call.is_none() {
                    let span = expr.span();
                    self.set_route_call = Some((span.start as usize, span.end as usize));
                }
            }
            Expression::StaticMemberExpression(member) if member.property.name == "setData" => {
                self.has_set_data_call = true;
            }
            _ => {}
        }
        oxc_ast_visit::walk::walk_call_expression(self, expr);
    }
}

/// Statically inspect a logic module. `None` when the source does not parse;
/// callers must then leave the file alone.
fn analyze_module(source: &str) -> Option<ModuleAnalysis> {
    let allocator = Allocator::default();
    let source_type = SourceType::default().with_module(true);
    let ret = Parser::new(&allocator, source, source_type).parse();
    if !ret.errors.is_empty() {
        return None;
    }

    let mut analysis = ModuleAnalysis::default();
    for stmt in &ret.program.body {
        if let Statement::ExportNamedDeclaration(export) = stmt {
            if let Some(declaration) = &export.declaration {
                match declaration {
                    Declaration::FunctionDeclaration(function) => {
                        let Some(id) = &function.id else { continue };
                        let name = id.name.to_string();
                        let mut info = FunctionInfo::default();
                        if let Some(body) = &function.body {
                            info.body_open = body.span().start as usize + 1;
                            let mut scanner = CallScanner {
                                set_route_call: None,
                                has_set_data_call: false,
                            };
                            for statement in &body.statements {
                                oxc_ast_visit::Visit::visit_statement(&mut scanner, statement);
                            }
                            info.set_route_call = scanner.set_route_call;
                            info.has_set_data_call = scanner.has_set_data_call;
                        }
                        analysis.functions.insert(name.clone(), info);
                        analysis.export_names.push(name);
                    }
                    Declaration::VariableDeclaration(declaration) => {
                        for declarator in &declaration.declarations {
                            if let oxc_ast::ast::BindingPattern::BindingIdentifier(id) =
                                &declarator.id
                            {
                                analysis.export_names.push(id.name.to_string());
                            }
                        }
                    }
                    _ => {}
                }
            }
            for specifier in &export.specifiers {
                analysis.export_names.push(specifier.exported.name().to_string());
            }
        }
    }
    Some(analysis)
}

/// Names exported from a module's top-level declarations.
pub fn exported_function_names(source: &str) -> Vec<String> {
    analyze_module(source)
        .map(|a| a.export_names)
        .unwrap_or_default()
}

async fn ensure_file(path: &Path) -> Result<String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| BuildError::io(parent, e))?;
    }
    match fs::read_to_string(path).await {
        Ok(source) => Ok(source),
        Err(_) => {
            fs::write(path, "")
                .await
                .map_err(|e| BuildError::io(path, e))?;
            Ok(String::new())
        }
    }
}

fn not_implemented_stub(name: &str) -> String {
    format!(
        "{STUB_DOC}\nexport function {name}(data) {{\n    // TODO: Implement the logic\n    throw new Error('Method {name} not implemented');\n}}"
    )
}

/// Append a throwing stub for every required export that is missing.
pub async fn ensure_logic_module(path: &Path, required: &[String]) -> Result<()> {
    let source = ensure_file(path).await?;
    let Some(analysis) = analyze_module(&source) else {
        warn!("logic module {:?} does not parse; leaving it unmodified", path);
        return Ok(());
    };

    let mut updated = source;
    let mut changed = false;
    for name in required {
        if !analysis.export_names.iter().any(|n| n == name) {
            updated.push_str(&not_implemented_stub(name));
            changed = true;
        }
    }
    if changed {
        fs::write(path, updated)
            .await
            .map_err(|e| BuildError::io(path, e))?;
    }
    Ok(())
}

fn routing_import(module: &str) -> String {
    let ups: String = module
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|_| "../")
        .collect();
    format!("import {{setCurrentRoute}} from '../{}../../routing.mjs';\n", ups)
}

/// Guarantee `onClick` navigates to `route`: ensure the routing import, then
/// replace an existing `setCurrentRoute(...)` call, inject one as the first
/// statement, or append a fresh `onClick`, whichever the module needs.
pub async fn ensure_navigation(path: &Path, module: &str, route: &RouteTarget) -> Result<()> {
    let source = ensure_file(path).await?;

    let without_import = IMPORT_SET_ROUTE_RE
        .replace_all(
            &IMPORT_SET_ROUTE_MIXER_RE.replace_all(&source, ""),
            "",
        )
        .into_owned();
    let mut updated = format!("{}{}", routing_import(module), without_import);

    let route_json = serde_json::to_string(route).expect("route target serializes");
    let call = format!("setCurrentRoute({})", route_json);

    match analyze_module(&updated) {
        Some(analysis) => match analysis.functions.get("onClick") {
            Some(info) if info.set_route_call.is_some() => {
                let (start, end) = info.set_route_call.unwrap();
                updated.replace_range(start..end, &call);
            }
            Some(info) if info.body_open > 0 => {
                updated.insert_str(info.body_open, &format!("\n    {};", call));
            }
            _ => {
                updated.push_str(&format!(
                    "{STUB_DOC}\nexport function onClick(data) {{\n    {};\n    // TODO: Implement the logic\n}}",
                    call
                ));
            }
        },
        None => {
            warn!("logic module {:?} does not parse; navigation patch skipped", path);
            return Ok(());
        }
    }

    fs::write(path, updated)
        .await
        .map_err(|e| BuildError::io(path, e))
}

fn seed_call(item_count: usize) -> String {
    format!(
        "data.component.states.setData(new Array({}).fill({{}}).map(()=>({{_key:Math.random()}})))",
        item_count
    )
}

/// Guarantee `onStart` seeds the loop's `data` state. An existing seed,
/// or any customized `setData` call, is left exactly as the developer
/// wrote it.
pub async fn ensure_loop_seed(path: &Path, item_count: usize) -> Result<()> {
    let source = ensure_file(path).await?;
    let Some(analysis) = analyze_module(&source) else {
        warn!("logic module {:?} does not parse; seed patch skipped", path);
        return Ok(());
    };

    let mut updated = source;
    match analysis.functions.get("onStart") {
        Some(info) if info.has_set_data_call => return Ok(()),
        Some(info) if info.body_open > 0 => {
            updated.insert_str(info.body_open, &format!("\n    {};", seed_call(item_count)));
        }
        _ => {
            updated.push_str(&format!(
                "{STUB_DOC}\nexport function onStart(data) {{\n    {};\n}}",
                seed_call(item_count)
            ));
        }
    }

    fs::write(path, updated)
        .await
        .map_err(|e| BuildError::io(path, e))
}
