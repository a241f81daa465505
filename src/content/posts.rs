use serde::{Deserialize, Serialize};

/// Positional columns of a `wp_posts` row.
pub const WP_POSTS_COLUMNS: usize = 23;

/// One `wp_posts` row, by column position.
#[derive(Debug, Clone)]
pub struct WpPost {
    pub id: i64,
    pub author: i64,
    pub date: String,
    #[allow(dead_code)]
    pub date_gmt: String,
    pub content: String,
    pub title: String,
    pub excerpt: String,
    pub status: String,
    #[allow(dead_code)]
    pub comment_status: String,
    #[allow(dead_code)]
    pub ping_status: String,
    #[allow(dead_code)]
    pub password: String,
    pub slug: String,
    #[allow(dead_code)]
    pub to_ping: String,
    #[allow(dead_code)]
    pub pinged: String,
    pub modified: String,
    #[allow(dead_code)]
    pub modified_gmt: String,
    #[allow(dead_code)]
    pub content_filtered: String,
    pub parent: i64,
    pub guid: String,
    #[allow(dead_code)]
    pub menu_order: i64,
    pub post_type: String,
    #[allow(dead_code)]
    pub mime_type: String,
    #[allow(dead_code)]
    pub comment_count: i64,
}

impl WpPost {
    /// Project a field sequence onto the `wp_posts` columns. Short rows and rows
    /// without a numeric id are malformed and yield `None`.
    pub fn from_fields(fields: Vec<String>) -> Option<Self> {
        if fields.len() < WP_POSTS_COLUMNS {
            return None;
        }
        let id = fields[0].trim().parse().ok()?;

        let mut cols = fields.into_iter().skip(1);
        let mut text = || cols.next().unwrap_or_default();

        Some(WpPost {
            id,
            author: int(&text()),
            date: text(),
            date_gmt: text(),
            content: text(),
            title: text(),
            excerpt: text(),
            status: text(),
            comment_status: text(),
            ping_status: text(),
            password: text(),
            slug: text(),
            to_ping: text(),
            pinged: text(),
            modified: text(),
            modified_gmt: text(),
            content_filtered: text(),
            parent: int(&text()),
            guid: text(),
            menu_order: int(&text()),
            post_type: text(),
            mime_type: text(),
            comment_count: int(&text()),
        })
    }
}

fn int(s: &str) -> i64 {
    s.trim().parse().unwrap_or(0)
}

/// Which published rows survive into the JSON output.
///
/// The two legacy exports disagreed: one kept every published post, the other
/// also dropped child posts and a hand-picked slug. Both are expressible here.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub status: String,
    pub exclude_slugs: Vec<String>,
    pub skip_child_posts: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            status: "publish".to_string(),
            exclude_slugs: Vec::new(),
            skip_child_posts: false,
        }
    }
}

impl FilterConfig {
    pub fn accepts(&self, post: &WpPost) -> bool {
        if post.status != self.status || post.slug.is_empty() {
            return false;
        }
        if self.exclude_slugs.iter().any(|s| *s == post.slug) {
            return false;
        }
        !(self.skip_child_posts && post.post_type == "post" && post.parent != 0)
    }
}

/// Serialized shape of a kept post or page. Field order is the JSON key order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    pub id: i64,
    pub author: i64,
    pub date: String,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub modified: String,
    pub post_type: String,
    pub post_status: String,
    pub parent: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
}

impl From<&WpPost> for ContentRecord {
    fn from(p: &WpPost) -> Self {
        ContentRecord {
            id: p.id,
            author: p.author,
            date: p.date.clone(),
            title: p.title.clone(),
            slug: p.slug.clone(),
            excerpt: p.excerpt.clone(),
            content: p.content.clone(),
            modified: p.modified.clone(),
            post_type: p.post_type.clone(),
            post_status: p.status.clone(),
            parent: p.parent,
            featured_image: None,
        }
    }
}
