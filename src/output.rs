use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::content::Collections;

pub const POSTS_FILE: &str = "blog-posts.json";
pub const PAGES_FILE: &str = "pages.json";

/// Write `blog-posts.json` and `pages.json` into `dir`, creating it if needed.
/// Returns the two paths written.
pub fn write_collections(dir: &Path, collections: &Collections) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;

    let posts_path = dir.join(POSTS_FILE);
    let pages_path = dir.join(PAGES_FILE);
    write_json(&posts_path, &collections.posts)?;
    write_json(&pages_path, &collections.pages)?;
    Ok((posts_path, pages_path))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
    info!(path = %path.display(), "wrote");
    Ok(())
}
