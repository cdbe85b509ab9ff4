//! Build pipelines.
//!
//! `build_specs` drives blueprint → source generation with per-file error
//! isolation: a malformed blueprint aborts only its own build. `automate`
//! drives the design import end to end: fetch, transform, emit, route
//! scaffolding. There are no retries anywhere; every step is idempotent, so
//! re-running after a transient failure is the recovery path.

use std::path::Path;

use tracing::{error, info};

use crate::api::FigmaApi;
use crate::cache::AssetCache;
use crate::codegen;
use crate::config::FigmaConfig;
use crate::emit::Emitter;
use crate::error::Result;
use crate::merge;
use crate::scaffold::{self, PageRoute};
use crate::specs;
use crate::transform::Transformer;

/// Build one blueprint file. The component/condition/loop sub-builds write
/// to distinct outputs and are awaited jointly.
pub async fn build_spec_file(spec_path: &Path) -> Result<()> {
    let spec = specs::spec_to_ir(spec_path).await?;
    let component = spec.component_unit().cloned();
    let condition = merge::merged_condition(spec.condition.clone());
    let repeat = merge::merged_loop(spec.repeat.clone());

    let (component_result, condition_result, loop_result) = tokio::join!(
        codegen::compose_component(component.as_ref(), spec_path),
        codegen::compose_condition(condition.as_ref(), spec_path),
        codegen::compose_loop(repeat.as_ref(), spec_path),
    );
    component_result?;
    condition_result?;
    loop_result?;
    Ok(())
}

/// Build every blueprint under `root`; failures are logged per file and do
/// not stop the remaining builds.
pub async fn build_specs(root: &str) -> Result<()> {
    let spec_paths = specs::read_specs(root);
    info!("building {} blueprint(s) from {}", spec_paths.len(), root);
    for path in &spec_paths {
        if let Err(e) = build_spec_file(path).await {
            error!("blueprint {:?} failed: {e}", path);
        }
    }
    Ok(())
}

fn page_routes(pages: &[crate::transform::TransformedNode]) -> Vec<PageRoute> {
    let route = |t: &crate::transform::TransformedNode| PageRoute {
        name: t.name.clone(),
        module: t.module.clone(),
        id: t.node.id.clone(),
    };
    let mut routes: Vec<PageRoute> = pages
        .iter()
        .filter(|t| t.name.split(' ').next().unwrap_or("").trim().ends_with("_page"))
        .map(route)
        .collect();
    routes.extend(
        pages
            .iter()
            .filter(|t| t.name.split(' ').next().unwrap_or("").trim().ends_with("_dialog"))
            .map(route),
    );
    routes
}

/// Run the design import: fetch the document, transform and emit blueprints,
/// then materialize the routing scaffolding.
pub async fn automate(config: &FigmaConfig) -> Result<()> {
    scaffold::ensure_blueprint_folder(&config.src_path).await?;

    let api = FigmaApi::new(&config.token);
    let assets = AssetCache::for_blueprints(&config.src_path);

    let Some(file) = api.fetch_file(&config.fig_file).await else {
        info!("no design document available; nothing to import");
        return Ok(());
    };
    let Some(document) = file.design_document() else {
        info!("design file has no canvas; nothing to import");
        return Ok(());
    };

    let transformer = Transformer {
        api: &api,
        assets: &assets,
        fig_file: &config.fig_file,
    };
    let (pages, index) = transformer.transform_pages(document).await;
    info!("transformed {} page(s)", pages.len());

    let emitter = Emitter {
        api: &api,
        assets: &assets,
        fig_file: &config.fig_file,
        src_path: &config.src_path,
        index: &index,
    };
    emitter.write_specs(&pages).await?;

    let routes = page_routes(&pages);
    let initial_id = document
        .flow_starting_points
        .first()
        .map(|f| f.node_id.clone());
    scaffold::ensure_app_route(Path::new("."), &routes, initial_id.as_deref()).await?;
    Ok(())
}
