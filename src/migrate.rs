use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::content;
use crate::output;
use crate::settings::Settings;

const SAMPLE_SLUGS: usize = 5;

pub struct ParseReport {
    pub posts: usize,
    pub pages: usize,
    pub sample_slugs: Vec<String>,
    pub output_dir: PathBuf,
}

impl ParseReport {
    pub fn print(&self) {
        println!("Extracted {} blog posts", self.posts);
        println!("Extracted {} pages", self.pages);
        println!("Sample blog post slugs: {:?}", self.sample_slugs);
        println!("Data saved to {}/", self.output_dir.display());
    }
}

/// Read both dumps, build the collections and write them out. Nothing is
/// written unless both inputs were read.
pub fn run(posts_path: &Path, meta_path: &Path, output_dir: &Path, settings: &Settings) -> Result<ParseReport> {
    let posts_dump = read_dump(posts_path)?;
    let meta_dump = read_dump(meta_path)?;

    let collections = content::build(
        &posts_dump,
        &meta_dump,
        &settings.filter,
        &settings.featured_meta_key,
    );
    info!(
        posts = collections.posts.len(),
        pages = collections.pages.len(),
        "filtered content"
    );

    output::write_collections(output_dir, &collections)?;

    Ok(ParseReport {
        posts: collections.posts.len(),
        pages: collections.pages.len(),
        sample_slugs: collections
            .posts
            .iter()
            .take(SAMPLE_SLUGS)
            .map(|p| p.slug.clone())
            .collect(),
        output_dir: output_dir.to_path_buf(),
    })
}

fn read_dump(path: &Path) -> Result<String> {
    info!(path = %path.display(), "reading dump");
    fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))
}
