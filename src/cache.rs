//! On-disk asset cache.
//!
//! Downloaded design assets are content-addressed by the design tool's own
//! `imageRef` (or the sanitized node name for rendered vectors). A cache hit
//! is any file whose name starts with that reference, whatever its
//! extension, so re-runs never re-download and never need a manifest.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use crate::api::FigmaApi;

const PUBLIC_PREFIX: &str = "/images/figma";

pub struct AssetCache {
    folder: PathBuf,
}

impl AssetCache {
    /// Cache directory for a blueprint root: `<project>/public/images/figma`,
    /// two levels up from `src/blueprints`.
    pub fn for_blueprints(src_path: &Path) -> Self {
        AssetCache {
            folder: src_path.join("..").join("..").join("public/images/figma"),
        }
    }

    pub fn at(folder: impl Into<PathBuf>) -> Self {
        AssetCache {
            folder: folder.into(),
        }
    }

    /// Relative path served to generated components for a cached reference,
    /// if any file with that prefix exists.
    pub fn lookup(&self, image_ref: &str) -> Option<String> {
        let entries = std::fs::read_dir(&self.folder).ok()?;
        let mut matches: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|name| name.trim().starts_with(image_ref))
            .collect();
        matches.sort();
        matches
            .into_iter()
            .next()
            .map(|name| format!("{}/{}", PUBLIC_PREFIX, name))
    }

    /// Resolve a reference to a served path, downloading on a cache miss.
    ///
    /// The second resolution of the same reference is answered from disk
    /// without touching the network.
    pub async fn resolve(
        &self,
        api: &FigmaApi,
        fig_file: &str,
        image_ref: Option<&str>,
        node_id: Option<&str>,
        format: Option<&str>,
    ) -> Option<String> {
        let image_ref = image_ref?;
        if let Err(e) = fs::create_dir_all(&self.folder).await {
            warn!("could not create asset cache dir {:?}: {e}", self.folder);
            return None;
        }
        if let Some(path) = self.lookup(image_ref) {
            debug!("asset cache hit for {image_ref}");
            return Some(path);
        }

        let url = api.image_url(fig_file, node_id, image_ref, format).await?;
        let (bytes, extension) = api.download(&url).await?;
        let file_name = format!("{}.{}", image_ref, extension);
        let file_path = self.folder.join(&file_name);
        if let Err(e) = fs::write(&file_path, &bytes).await {
            warn!("could not persist asset {:?}: {e}", file_path);
            return None;
        }
        debug!("asset {image_ref} materialized as {file_name}");
        Some(format!("{}/{}", PUBLIC_PREFIX, file_name))
    }
}
