pub mod media;
pub mod posts;

use std::cmp::Reverse;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::info;

use crate::dump;
use posts::{ContentRecord, FilterConfig, WpPost};

/// The two JSON documents produced by a parse run.
#[derive(Debug, Default)]
pub struct Collections {
    pub posts: Vec<ContentRecord>,
    pub pages: Vec<ContentRecord>,
}

/// Project, filter and enrich both dumps.
///
/// Attachments and featured-image links are resolved over all rows before any
/// record is kept, so a post can point at an attachment listed after it.
pub fn build(
    posts_dump: &str,
    meta_dump: &str,
    filter: &FilterConfig,
    featured_meta_key: &str,
) -> Collections {
    let rows: Vec<WpPost> = dump::parse_dump(posts_dump)
        .filter_map(WpPost::from_fields)
        .collect();
    info!(rows = rows.len(), "projected wp_posts rows");

    let attachments = media::collect_attachments(&rows);
    let featured = media::featured_images(dump::parse_dump(meta_dump), featured_meta_key);
    info!(
        attachments = attachments.len(),
        featured = featured.len(),
        "resolved media"
    );

    let mut out = Collections::default();
    for row in &rows {
        let target = match row.post_type.as_str() {
            "post" => &mut out.posts,
            "page" => &mut out.pages,
            _ => continue,
        };
        if !filter.accepts(row) {
            continue;
        }

        let mut record = ContentRecord::from(row);
        record.featured_image = featured
            .get(&row.id)
            .and_then(|attachment_id| attachments.get(attachment_id))
            .map(|a| a.path.clone());
        target.push(record);
    }

    sort_newest_first(&mut out.posts);
    out
}

/// Stable sort by descending publish date; unparsable dates count as the epoch.
pub fn sort_newest_first(records: &mut [ContentRecord]) {
    records.sort_by_key(|r| Reverse(publish_timestamp(&r.date)));
}

fn publish_timestamp(date: &str) -> i64 {
    parse_wp_date(date)
        .map(|d| d.and_utc().timestamp())
        .unwrap_or(0)
}

/// `YYYY-MM-DD HH:MM:SS`, ISO-8601 / RFC 3339, or a bare `YYYY-MM-DD`.
pub fn parse_wp_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|d| d.naive_utc()))
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(slug: &str, date: &str) -> ContentRecord {
        ContentRecord {
            id: 0,
            author: 1,
            date: date.into(),
            title: String::new(),
            slug: slug.into(),
            excerpt: String::new(),
            content: String::new(),
            modified: String::new(),
            post_type: "post".into(),
            post_status: "publish".into(),
            parent: 0,
            featured_image: None,
        }
    }

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
    }

    fn slugs(records: &[ContentRecord]) -> Vec<&str> {
        records.iter().map(|r| r.slug.as_str()).collect()
    }

    #[test]
    fn dates() {
        assert!(parse_wp_date("2023-01-27 00:00:33").is_some());
        assert!(parse_wp_date("2023-01-27T00:00:33").is_some());
        assert!(parse_wp_date("2023-01-27T00:00:33+02:00").is_some());
        assert!(parse_wp_date("2023-01-27").is_some());
        assert!(parse_wp_date("0000-00-00 00:00:00").is_none());
        assert!(parse_wp_date("").is_none());
    }

    #[test]
    fn newest_first_stable_with_epoch_fallback() {
        let mut records = vec![
            record("undated", "0000-00-00 00:00:00"),
            record("old", "2020-01-01 00:00:00"),
            record("tie-a", "2022-06-01 12:00:00"),
            record("new", "2023-03-01 08:00:00"),
            record("tie-b", "2022-06-01 12:00:00"),
        ];
        sort_newest_first(&mut records);
        assert_eq!(slugs(&records), vec!["new", "tie-a", "tie-b", "old", "undated"]);
    }

    #[test]
    fn fixture_collections() {
        let c = build(
            &fixture("wp_posts.sql"),
            &fixture("wp_postmeta.sql"),
            &FilterConfig::default(),
            "_thumbnail_id",
        );
        assert_eq!(slugs(&c.posts), vec!["hello-world", "older-news", "undated-post"]);
        assert_eq!(slugs(&c.pages), vec!["about-us"]);

        let hello = &c.posts[0];
        assert_eq!(hello.featured_image.as_deref(), Some("2023/01/hello.jpg"));
        assert!(hello.content.contains("(our favourite hour)"));
        assert!(hello.content.contains("It's the best seat"));
        assert!(hello.content.contains("it's open daily"));

        let older = &c.posts[1];
        assert_eq!(older.content, "Menu notes: -- fresh catch daily (ask your server)");
        assert!(older.featured_image.is_none());

        // page 4 points at attachment 99, which is not in the dump
        assert!(c.pages[0].featured_image.is_none());
    }

    #[test]
    fn unpublished_rows_never_kept() {
        let c = build(
            &fixture("wp_posts.sql"),
            &fixture("wp_postmeta.sql"),
            &FilterConfig::default(),
            "_thumbnail_id",
        );
        assert!(c
            .posts
            .iter()
            .chain(c.pages.iter())
            .all(|r| r.post_status == "publish" && !r.slug.is_empty()));
    }

    #[test]
    fn strict_filter_on_fixture() {
        let filter = FilterConfig {
            exclude_slugs: vec!["older-news".into()],
            ..FilterConfig::default()
        };
        let c = build(&fixture("wp_posts.sql"), "", &filter, "_thumbnail_id");
        assert_eq!(slugs(&c.posts), vec!["hello-world", "undated-post"]);
        assert!(c.posts[0].featured_image.is_none());
    }
}
