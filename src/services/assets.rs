//! Cover-art lookup against the muOS catalogue
//!
//! The aggregator only needs to know whether box art exists for a game
//! and carry an opaque handle to it; reading the image bytes happens in
//! the renderer.

use std::path::PathBuf;

use crate::types::CoverArt;

/// Resolves cover-art presence for a (canonical platform, base name) pair
pub trait CoverArtProvider {
    fn find(&self, platform: &str, base_name: &str) -> Option<CoverArt>;
}

/// Filesystem provider probing `<root>/<platform>/box/<base_name>.png`
pub struct CatalogueCovers {
    root: PathBuf,
}

impl CatalogueCovers {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl CoverArtProvider for CatalogueCovers {
    fn find(&self, platform: &str, base_name: &str) -> Option<CoverArt> {
        let path = self
            .root
            .join(platform)
            .join("box")
            .join(format!("{}.png", base_name));

        // Probe failures (permissions, unreadable mounts) degrade to "no art"
        match path.try_exists() {
            Ok(true) => Some(CoverArt { path }),
            Ok(false) => None,
            Err(e) => {
                eprintln!(
                    "[retroshelf] Warning: cover probe failed for {:?}: {}",
                    path, e
                );
                None
            }
        }
    }
}

/// No-op provider for tests and `--no-covers` runs
pub struct NoCovers;

impl CoverArtProvider for NoCovers {
    fn find(&self, _platform: &str, _base_name: &str) -> Option<CoverArt> {
        None
    }
}
