use std::env;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::content::parse_wp_date;
use crate::settings::ImportSettings;

const URL_VAR: &str = "NEXT_PUBLIC_SUPABASE_URL";
const KEY_VAR: &str = "SUPABASE_SERVICE_ROLE_KEY";
const EXCERPT_LEN: usize = 200;
const LEGACY_AUTHOR: &str = "Legacy";

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static SHORTCODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[[^\]]*\]").unwrap());
static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static SLUG_JUNK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9-]").unwrap());
static DASHES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").unwrap());

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("missing {0} (set it in the environment or the env file)")]
    MissingCredential(&'static str),
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path:?} is not a JSON array of posts: {source}")]
    Payload {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("upsert failed for rows {offset}..{end}: HTTP {status}: {body}")]
    Batch {
        offset: usize,
        end: usize,
        status: u16,
        body: String,
    },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// A post as found in `blog-posts.json`. Every field is optional so older
/// exports without status/type columns still load.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcePost {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub date: Option<String>,
    pub modified: Option<String>,
    pub post_type: Option<String>,
    pub post_status: Option<String>,
    pub categories: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

/// Row shape of the remote `posts` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpsertRow {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub author: &'static str,
    pub post_status: &'static str,
    pub post_type: String,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

pub struct StoreCredentials {
    pub url: String,
    pub service_key: String,
}

impl StoreCredentials {
    /// Process environment first; `env_file` only fills in what is unset.
    pub fn from_env(env_file: &Path) -> Result<Self, ImportError> {
        if let Err(e) = dotenvy::from_path(env_file) {
            if !e.not_found() {
                warn!(path = %env_file.display(), error = %e, "could not load env file");
            }
        }
        let var = |name: &'static str| {
            env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or(ImportError::MissingCredential(name))
        };
        Ok(StoreCredentials {
            url: var(URL_VAR)?,
            service_key: var(KEY_VAR)?,
        })
    }

    fn endpoint(&self, table: &str) -> String {
        format!(
            "{}/rest/v1/{}?on_conflict=slug",
            self.url.trim_end_matches('/'),
            table
        )
    }
}

pub struct ImportSummary {
    pub prepared: usize,
    pub upserted: usize,
}

/// Load `input`, map it to store rows and upsert them batch by batch. The first
/// failing batch aborts the run; earlier batches stay written.
pub async fn run(
    input: &Path,
    settings: &ImportSettings,
    dry_run: bool,
) -> Result<ImportSummary, ImportError> {
    let posts = load_posts(input)?;
    let rows = prepare_rows(posts);
    info!(rows = rows.len(), "prepared rows for upsert");

    if dry_run || rows.is_empty() {
        return Ok(ImportSummary {
            prepared: rows.len(),
            upserted: 0,
        });
    }

    let creds = StoreCredentials::from_env(&settings.env_file)?;
    let client = reqwest::Client::new();
    let endpoint = creds.endpoint(&settings.table);
    let batch_size = settings.batch_size.max(1);

    let pb = ProgressBar::new(rows.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let mut upserted = 0;
    for (i, chunk) in rows.chunks(batch_size).enumerate() {
        let offset = i * batch_size;
        let resp = client
            .post(&endpoint)
            .header("apikey", &creds.service_key)
            .bearer_auth(&creds.service_key)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(chunk)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            pb.abandon();
            let body = resp.text().await.unwrap_or_default();
            return Err(ImportError::Batch {
                offset,
                end: offset + chunk.len(),
                status: status.as_u16(),
                body,
            });
        }
        upserted += chunk.len();
        pb.inc(chunk.len() as u64);
    }
    pb.finish_and_clear();

    Ok(ImportSummary {
        prepared: rows.len(),
        upserted,
    })
}

pub fn load_posts(path: &Path) -> Result<Vec<SourcePost>, ImportError> {
    let text = std::fs::read_to_string(path).map_err(|source| ImportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let posts: Vec<Option<SourcePost>> =
        serde_json::from_str(&text).map_err(|source| ImportError::Payload {
            path: path.to_path_buf(),
            source,
        })?;
    // `null` entries in hand-edited exports are skipped, not fatal.
    Ok(posts.into_iter().flatten().collect())
}

/// Keep published and draft posts that have a usable slug.
pub fn prepare_rows(posts: Vec<SourcePost>) -> Vec<UpsertRow> {
    posts.into_iter().filter_map(to_upsert_row).collect()
}

fn to_upsert_row(p: SourcePost) -> Option<UpsertRow> {
    let post_status = match p.post_status.as_deref() {
        Some("publish") => "publish",
        Some("draft") => "draft",
        _ => return None,
    };
    let slug = normalize_slug(p.slug.as_deref().unwrap_or_default());
    if slug.is_empty() {
        return None;
    }

    let content = p.content.unwrap_or_default();
    let excerpt = p
        .excerpt
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .or_else(|| excerpt_from_html(&content, EXCERPT_LEN));
    let title = p
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| slug.clone());

    Some(UpsertRow {
        title,
        slug,
        content,
        excerpt,
        author: LEGACY_AUTHOR,
        post_status,
        post_type: p.post_type.unwrap_or_else(|| "post".to_string()),
        categories: p.categories.unwrap_or_default(),
        tags: p.tags.unwrap_or_default(),
        date: p.date.as_deref().and_then(to_iso),
        modified: p.modified.as_deref().and_then(to_iso),
    })
}

/// Lowercase, `[a-z0-9-]` only, no leading/trailing or repeated dashes.
pub fn normalize_slug(slug: &str) -> String {
    let lower = slug.trim().to_lowercase();
    let replaced = SLUG_JUNK_RE.replace_all(&lower, "-");
    DASHES_RE
        .replace_all(&replaced, "-")
        .trim_matches('-')
        .to_string()
}

/// ISO-8601 UTC for the date shapes WordPress exports; `None` for anything else,
/// including the `0000-00-00 00:00:00` placeholder.
pub fn to_iso(s: &str) -> Option<String> {
    let s = s.trim();
    if s.contains('T') {
        return parse_wp_date(s).map(|_| s.to_string());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(format!("{}T00:00:00Z", d.format("%Y-%m-%d")));
    }
    parse_wp_date(s).map(|d| d.format("%Y-%m-%dT%H:%M:%SZ").to_string())
}

/// Plain-text excerpt: tags and shortcodes dropped, whitespace collapsed.
pub fn excerpt_from_html(html: &str, max_len: usize) -> Option<String> {
    let text = TAG_RE.replace_all(html, " ");
    let text = SHORTCODE_RE.replace_all(&text, " ");
    let text = SPACE_RE.replace_all(&text, " ");
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if text.chars().count() <= max_len {
        return Some(text.to_string());
    }
    let cut: String = text.chars().take(max_len).collect();
    Some(format!("{}...", cut.trim_end()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(slug: &str, status: Option<&str>) -> SourcePost {
        SourcePost {
            slug: Some(slug.into()),
            title: Some(format!("  {}  ", slug)),
            content: Some("<p>Fresh <b>stone crab</b> [gallery ids=\"1,2\"] tonight</p>".into()),
            date: Some("2023-01-27 00:00:33".into()),
            post_status: status.map(String::from),
            ..SourcePost::default()
        }
    }

    #[test]
    fn slugs() {
        assert_eq!(normalize_slug("Hello World!"), "hello-world");
        assert_eq!(normalize_slug("--Key  West__Blog--"), "key-west-blog");
        assert_eq!(normalize_slug("café-menu"), "caf-menu");
        assert_eq!(normalize_slug("!!!"), "");
    }

    #[test]
    fn iso_dates() {
        assert_eq!(to_iso("2023-01-27 00:00:33").as_deref(), Some("2023-01-27T00:00:33Z"));
        assert_eq!(to_iso("2023-01-27").as_deref(), Some("2023-01-27T00:00:00Z"));
        assert_eq!(to_iso("2023-01-27T05:00:00+02:00").as_deref(), Some("2023-01-27T05:00:00+02:00"));
        assert_eq!(to_iso("0000-00-00 00:00:00"), None);
        assert_eq!(to_iso("last tuesday"), None);
    }

    #[test]
    fn excerpts() {
        assert_eq!(
            excerpt_from_html("<p>Fresh <b>stone crab</b> [gallery] tonight</p>", 200).as_deref(),
            Some("Fresh stone crab tonight")
        );
        assert_eq!(excerpt_from_html("<p> </p>", 200), None);
        let long = "word ".repeat(100);
        let e = excerpt_from_html(&long, 20).unwrap();
        assert_eq!(e, "word word word word...");
    }

    #[test]
    fn prepare_keeps_publish_and_draft_only() {
        let rows = prepare_rows(vec![
            post("Hello World", Some("publish")),
            post("wip", Some("draft")),
            post("old", Some("private")),
            post("no-status", None),
            post("???", Some("publish")),
        ]);
        let slugs: Vec<&str> = rows.iter().map(|r| r.slug.as_str()).collect();
        assert_eq!(slugs, vec!["hello-world", "wip"]);

        let hello = &rows[0];
        assert_eq!(hello.title, "Hello World");
        assert_eq!(hello.author, "Legacy");
        assert_eq!(hello.post_status, "publish");
        assert_eq!(hello.post_type, "post");
        assert_eq!(hello.excerpt.as_deref(), Some("Fresh stone crab tonight"));
        assert_eq!(hello.date.as_deref(), Some("2023-01-27T00:00:33Z"));
        assert_eq!(hello.modified, None);
        assert_eq!(rows[1].post_status, "draft");
    }

    #[test]
    fn row_json_omits_missing_dates_but_keeps_null_excerpt() {
        let row = to_upsert_row(SourcePost {
            slug: Some("empty".into()),
            post_status: Some("publish".into()),
            ..SourcePost::default()
        })
        .unwrap();
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["title"], "empty");
        assert!(json["excerpt"].is_null());
        assert!(json.get("date").is_none());
        assert_eq!(json["categories"], serde_json::json!([]));
    }

    #[test]
    fn loads_parse_output() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("blog-posts.json");
        std::fs::write(
            &path,
            r#"[{"id":1,"author":1,"date":"2023-01-27 00:00:33","title":"Hello","slug":"hello-world",
                "excerpt":"","content":"<p>Hi</p>","modified":"2023-01-28 10:00:00",
                "postType":"post","postStatus":"publish","parent":0,"featuredImage":"2023/01/hello.jpg"}]"#,
        )
        .unwrap();
        let rows = prepare_rows(load_posts(&path).unwrap());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].modified.as_deref(), Some("2023-01-28T10:00:00Z"));
        assert_eq!(rows[0].excerpt.as_deref(), Some("Hi"));
    }

    #[test]
    fn null_entries_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("blog-posts.json");
        std::fs::write(
            &path,
            r#"[null,{"slug":"hello-world","postStatus":"publish"},null]"#,
        )
        .unwrap();
        let posts = load_posts(&path).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(prepare_rows(posts)[0].slug, "hello-world");
    }

    #[test]
    fn non_array_payload_is_typed_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("blog-posts.json");
        std::fs::write(&path, r#"{"posts": []}"#).unwrap();
        assert!(matches!(load_posts(&path), Err(ImportError::Payload { .. })));
    }

    #[test]
    fn endpoint_targets_upsert_by_slug() {
        let creds = StoreCredentials {
            url: "https://abc.supabase.co/".into(),
            service_key: "k".into(),
        };
        assert_eq!(
            creds.endpoint("posts"),
            "https://abc.supabase.co/rest/v1/posts?on_conflict=slug"
        );
    }

    #[tokio::test]
    async fn dry_run_needs_no_credentials() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("blog-posts.json");
        std::fs::write(&path, r#"[{"slug":"a","postStatus":"publish"},{"slug":"b"}]"#).unwrap();
        let settings = ImportSettings {
            env_file: tmp.path().join(".env.local"),
            ..ImportSettings::default()
        };
        let summary = run(&path, &settings, true).await.unwrap();
        assert_eq!(summary.prepared, 1);
        assert_eq!(summary.upserted, 0);
    }
}
