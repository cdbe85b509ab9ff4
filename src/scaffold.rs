//! Project scaffolding.
//!
//! Materializes the collaborator files generated components depend on: the
//! routing module (whose `setCurrentRoute` the navigation patch imports),
//! the route guard, the page switch, the blueprint watcher and the
//! `package.json` start script. The guard is only written when the user has
//! not already implemented `beforeNavigate`; everything else is owned by the
//! generator and rewritten wholesale.

use std::path::Path;

use serde_json::{json, Value};
use tokio::fs;
use tracing::info;

use crate::config::BLUEPRINTS_DIR;
use crate::error::{BuildError, Result};
use crate::logic;
use crate::naming::component_name;

#[derive(Debug, Clone)]
pub struct PageRoute {
    pub name: String,
    pub module: String,
    pub id: String,
}

impl PageRoute {
    fn route_type(&self) -> String {
        self.name.split('_').last().unwrap_or("").to_lowercase()
    }

    fn route_name(&self) -> String {
        self.name.replace("_page", "").replace("_dialog", "")
    }
}

pub async fn ensure_blueprint_folder(src_path: &Path) -> Result<()> {
    fs::create_dir_all(src_path)
        .await
        .map_err(|e| BuildError::io(src_path, e))
}

const WATCH_FILE: &str = r#"import {watch} from 'node:fs'
import {dirname, join} from 'node:path';
import {fileURLToPath} from 'node:url';
import {exec} from 'node:child_process';

const __dirname = dirname(fileURLToPath(import.meta.url));

watch(join(__dirname, 'src', 'blueprints'), {recursive: true}, (event, filename) => {
    if (!`${filename}`.endsWith('.yml') || `${filename}`.endsWith('~')) {
        return;
    }
    const file = `./src/blueprints/${filename}`;
    exec(`fastui specs build ${file}`, {
        cwd: __dirname
    }, (error, stdout, stderr) => {
    });
});
"#;

pub async fn ensure_watch_file(project_root: &Path) -> Result<()> {
    let path = project_root.join("watch.mjs");
    fs::write(&path, WATCH_FILE)
        .await
        .map_err(|e| BuildError::io(&path, e))
}

/// Wire the blueprint watcher and builder into `scripts.start`, keeping
/// whatever the project already runs as the final command.
pub async fn ensure_start_script(project_root: &Path) -> Result<()> {
    let joiner = if cfg!(windows) { "|" } else { "&" };
    let path = project_root.join("package.json");
    let raw = fs::read_to_string(&path).await.unwrap_or_default();
    let mut manifest: Value = if raw.trim().starts_with('{') {
        serde_json::from_str(&raw).unwrap_or_else(|_| json!({}))
    } else {
        json!({})
    };

    let start = manifest
        .get("scripts")
        .and_then(|s| s.get("start"))
        .and_then(|s| s.as_str())
        .unwrap_or("echo \"no command\"")
        .to_string();
    let last_script = start
        .split(joiner)
        .last()
        .unwrap_or("")
        .trim()
        .to_string();
    let new_start = format!(
        "node ./watch.mjs {j} fastui specs build ./{blueprints} {j} {last}",
        j = joiner,
        blueprints = BLUEPRINTS_DIR,
        last = last_script
    );

    if !manifest.is_object() {
        manifest = json!({});
    }
    let scripts = manifest
        .as_object_mut()
        .expect("manifest is an object")
        .entry("scripts")
        .or_insert_with(|| json!({}));
    if !scripts.is_object() {
        *scripts = json!({});
    }
    scripts
        .as_object_mut()
        .expect("scripts is an object")
        .insert("start".to_string(), Value::from(new_start));

    let rendered = serde_json::to_string_pretty(&manifest).expect("manifest serializes");
    fs::write(&path, rendered)
        .await
        .map_err(|e| BuildError::io(&path, e))
}

const ROUTING_GUARD: &str = r#"
/**
 *
 * @param prev {string|{name:string,type:string}}
 * @param next {string|{name:string,type:string}}
 * @param callback {(next:string|object)=>*}
 */
export function beforeNavigate({prev,next},callback){
    callback(next);
}"#;

const ROUTING_MODULE: &str = r#"
import {BehaviorSubject} from "rxjs";
import {beforeNavigate} from './routing_guard.mjs';

const currentRoute = new BehaviorSubject(undefined);

/**
 *
 * @param route {string|{name: string, type: string, module: string}|{name: string, type: string}}
 * @param pushToState{boolean}
 */
export function setCurrentRoute(route,pushToState=true) {
    beforeNavigate({prev:currentRoute.value,next:route},(nextRoute)=>{
        nextRoute = `${nextRoute?.name??nextRoute}`.trim()?.replace(/^\//ig,'')??'';
        currentRoute.next({name: nextRoute, type: route?.type, module: route?.module});
       if(pushToState && `${route?.type}`.toLowerCase()!=='dialog' && `${route?.type}`.toLowerCase()!=='close'){
           window.history.pushState({}, '', `/${nextRoute}`);
       }
    });
}

/**
 *
 * @param fn {function}
 */
export function listeningForRouteChange(fn) {
    return currentRoute.subscribe(fn);
}

export function getCurrentRouteValue() {
    return currentRoute.value;
}
if (typeof window !== 'undefined') {
    window.onpopstate = function (_) {
        const path = window.location.pathname.replace(/^\//ig,'');
        beforeNavigate({prev:currentRoute.value,next:path},(nextRoute)=>{
            nextRoute = `${nextRoute?.name ?? nextRoute}`.trim()?.replace(/^\//ig,'')??'';
            currentRoute.next({name:nextRoute,type:'page'});
        });
    }
}"#;

fn page_cases(pages: &[PageRoute], route_type: &str) -> String {
    pages
        .iter()
        .filter(|p| p.route_type() == route_type)
        .map(|p| {
            format!(
                "\n        case '{}':\n            return <{}/>",
                p.route_name(),
                component_name(&p.name)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn path_cases(pages: &[PageRoute]) -> String {
    pages
        .iter()
        .map(|p| {
            format!(
                "\n        case '/{name}':\n            return '{name}';",
                name = p.route_name()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn app_route_source(pages: &[PageRoute], initial_page: &str) -> String {
    let imports = pages
        .iter()
        .map(|p| {
            format!(
                "import {{{}}} from './modules/{}/{}';",
                component_name(&p.name),
                p.module.trim_start_matches('/'),
                p.name
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"import {{useState,useEffect}} from 'react';
import {{listeningForRouteChange,setCurrentRoute}} from './routing.mjs';
{imports}

function getPageRoute(current) {{
    switch (current) {{
    {page_cases}
        default:
            return <></>
    }}
}}

function getDialogRoute(current) {{
    switch (current) {{
    {dialog_cases}
        default:
            return <></>
    }}
}}

function handlePathToRouteName(pathname){{
    pathname = `${{pathname}}`.startsWith('/')?pathname:`/${{pathname}}`;
    switch (pathname) {{
        {path_cases}
        default:
            return '{initial_page}';
    }}
}}

export function AppRoute(){{
    const [currentPage, setCurrentPage] = useState('');
    const [currentDialog, setCurrentDialog] = useState(undefined);

    useEffect(() => {{
        const subs = listeningForRouteChange(value => {{
            setCurrentDialog(undefined);
            if(value?.type==='close'){{
                return;
            }}
            if (value?.type === 'dialog' && value?.name) {{
                setCurrentDialog(handlePathToRouteName(value?.name));
            }} else  {{
                setCurrentPage(handlePathToRouteName(value?.name ?? value));
            }}
        }});
        return () => subs.unsubscribe();
    }}, []);

    useEffect(() => {{
        setCurrentRoute(handlePathToRouteName(window.location.pathname),false)
    }}, []);

    return (
        <>
            {{getPageRoute(currentPage)}}
            <div style={{{{display: currentDialog? 'block': 'none', position: 'fixed', top: 0, bottom: 0, left: 0, right: 0}}}}>
                {{getDialogRoute(currentDialog)}}
            </div>
        </>
    )
}}
"#,
        imports = imports,
        page_cases = page_cases(pages, "page"),
        dialog_cases = page_cases(pages, "dialog"),
        path_cases = path_cases(pages),
        initial_page = initial_page,
    )
}

/// Write the routing trio: `AppRoute.jsx`, `routing.mjs` and, only when the
/// user has not implemented `beforeNavigate`, `routing_guard.mjs`.
pub async fn ensure_app_route(
    project_root: &Path,
    pages: &[PageRoute],
    initial_id: Option<&str>,
) -> Result<()> {
    let src = project_root.join("src");
    fs::create_dir_all(&src)
        .await
        .map_err(|e| BuildError::io(&src, e))?;

    let initial_page = pages
        .iter()
        .find(|p| Some(p.id.as_str()) == initial_id && p.name.trim().ends_with("_page"))
        .map(|p| p.name.replace("_page", "").trim().to_string())
        .unwrap_or_else(|| "home".to_string());

    let guard_path = src.join("routing_guard.mjs");
    let guard_source = fs::read_to_string(&guard_path).await.unwrap_or_default();
    let has_guard = logic::exported_function_names(&guard_source)
        .iter()
        .any(|n| n == "beforeNavigate");
    if !has_guard {
        fs::write(&guard_path, ROUTING_GUARD)
            .await
            .map_err(|e| BuildError::io(&guard_path, e))?;
    }

    let routing_path = src.join("routing.mjs");
    fs::write(&routing_path, ROUTING_MODULE)
        .await
        .map_err(|e| BuildError::io(&routing_path, e))?;

    let app_route_path = src.join("AppRoute.jsx");
    fs::write(&app_route_path, app_route_source(pages, &initial_page))
        .await
        .map_err(|e| BuildError::io(&app_route_path, e))?;

    info!("routing scaffolding written for {} page(s)", pages.len());
    Ok(())
}
