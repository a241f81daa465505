use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::posts::WpPost;

static UPLOADS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"wp-content/uploads/([^\s"'<>]+)"#).unwrap());

/// Minimum columns of a `wp_postmeta` row: meta_id, post_id, meta_key, meta_value.
const META_COLUMNS: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    /// Path relative to `wp-content/uploads/`.
    pub path: String,
    pub title: String,
    pub slug: String,
}

/// Upload path relative to `wp-content/uploads/`, if the text holds an upload URL.
pub fn upload_path(text: &str) -> Option<String> {
    UPLOADS_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Attachment rows keyed by id. Scans every projected row, not only kept ones.
pub fn collect_attachments(rows: &[WpPost]) -> HashMap<i64, Attachment> {
    let mut attachments = HashMap::new();
    for row in rows.iter().filter(|r| r.post_type == "attachment") {
        let Some(path) = upload_path(&row.content).or_else(|| upload_path(&row.guid)) else {
            continue;
        };
        let attachment = Attachment {
            path,
            title: row.title.clone(),
            slug: row.slug.clone(),
        };
        debug!(
            id = row.id,
            path = %attachment.path,
            title = %attachment.title,
            slug = %attachment.slug,
            "attachment"
        );
        attachments.insert(row.id, attachment);
    }
    attachments
}

/// post id → attachment id, from meta rows carrying `meta_key`. Later rows win.
pub fn featured_images<I>(meta_rows: I, meta_key: &str) -> HashMap<i64, i64>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut featured = HashMap::new();
    for fields in meta_rows {
        if fields.len() < META_COLUMNS || fields[2] != meta_key {
            continue;
        }
        let (Ok(post_id), Ok(attachment_id)) =
            (fields[1].trim().parse::<i64>(), fields[3].trim().parse::<i64>())
        else {
            continue;
        };
        featured.insert(post_id, attachment_id);
    }
    featured
}
