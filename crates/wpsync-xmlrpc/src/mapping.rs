//! Conversion of `wp.*` responses into domain types.

use chrono::{TimeZone, Utc};

use wpsync_core::error::{SyncError, SyncResult};
use wpsync_core::model::{BlogOptions, Category, Media, OptionValue, PostFormats};

use crate::codec::Value;

fn expect_array<'a>(value: &'a Value, what: &str) -> SyncResult<&'a [Value]> {
    value
        .as_array()
        .ok_or_else(|| SyncError::parse(format!("Expected an array of {}", what)))
}

fn string_field(item: &Value, key: &str) -> String {
    item.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

/// Categories from `wp.getTerms(..., "category")`
pub fn categories_from_terms(value: &Value) -> SyncResult<Vec<Category>> {
    expect_array(value, "terms")?
        .iter()
        .map(|term| {
            let id = term
                .get("term_id")
                .and_then(Value::as_u64)
                .ok_or_else(|| SyncError::parse("Term without term_id"))?;
            Ok(Category {
                id,
                name: string_field(term, "name"),
                slug: string_field(term, "slug"),
                parent_id: term.get("parent").and_then(Value::as_u64).unwrap_or(0),
                post_count: term.get("count").and_then(Value::as_u64),
            })
        })
        .collect()
}

/// Options from `wp.getOptions`
pub fn options_from_value(value: &Value) -> SyncResult<BlogOptions> {
    let members = value
        .as_struct()
        .ok_or_else(|| SyncError::parse("Expected a struct of options"))?;

    Ok(members
        .iter()
        .map(|(name, option)| {
            let entry = match option.get("value") {
                Some(inner) => OptionValue {
                    value: inner.to_json(),
                    readonly: option.get("readonly").and_then(Value::as_bool).unwrap_or(false),
                    description: option.get("desc").and_then(Value::as_str).map(str::to_string),
                },
                // Some plugins register bare values
                None => OptionValue::readonly(option.to_json()),
            };
            (name.clone(), entry)
        })
        .collect())
}

/// Media items from `wp.getMediaLibrary`
pub fn media_from_library(value: &Value) -> SyncResult<Vec<Media>> {
    expect_array(value, "media items")?.iter().map(media_from_item).collect()
}

fn media_from_item(item: &Value) -> SyncResult<Media> {
    let id = item
        .get("attachment_id")
        .and_then(Value::as_u64)
        .ok_or_else(|| SyncError::parse("Media item without attachment_id"))?;

    // Empty metadata arrives as an empty array rather than a struct
    let metadata = item.get("metadata").filter(|m| m.as_struct().is_some());
    let meta_u64 = |key: &str| metadata.and_then(|m| m.get(key)).and_then(Value::as_u64);

    Ok(Media {
        id,
        url: string_field(item, "link"),
        title: string_field(item, "title"),
        caption: string_field(item, "caption"),
        description: string_field(item, "description"),
        date: item
            .get("date_created_gmt")
            .and_then(Value::as_datetime)
            .map(|dt| Utc.from_utc_datetime(&dt)),
        mime_type: item
            .get("type")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        file: metadata
            .and_then(|m| m.get("file"))
            .and_then(Value::as_str)
            .map(str::to_string),
        width: meta_u64("width"),
        height: meta_u64("height"),
        post_id: item.get("parent").and_then(Value::as_u64).filter(|id| *id != 0),
    })
}

/// Slugs listed under `supported`.
///
/// PHP arrays with gaps in their keys arrive as a struct keyed by index.
fn supported_slugs(value: &Value) -> Vec<&str> {
    match value {
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        Value::Struct(members) => members.values().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

/// Post formats from `wp.getPostFormats`.
///
/// With `show-supported` the response carries `all` and `supported`; only the
/// supported formats are kept.
pub fn post_formats_from_value(value: &Value) -> SyncResult<PostFormats> {
    let (all, supported) = match value.get("all") {
        Some(all) => (all, value.get("supported").map(supported_slugs)),
        None => (value, None),
    };

    let all = match all {
        Value::Struct(members) => members,
        // An empty PHP array
        Value::Array(items) if items.is_empty() => return Ok(PostFormats::new()),
        _ => return Err(SyncError::parse("Expected a struct of post formats")),
    };

    let formats = all.iter().filter_map(|(slug, name)| {
        let keep = supported
            .as_ref()
            .map_or(true, |supported| supported.contains(&slug.as_str()));
        let name = name.as_str()?;
        keep.then(|| (slug.clone(), name.to_string()))
    });

    Ok(PostFormats::from_formats(formats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::parse_datetime;

    fn term(id: &str, name: &str, parent: &str) -> Value {
        Value::structure([
            ("term_id", Value::from(id)),
            ("name", Value::from(name)),
            ("slug", Value::from(name.to_lowercase())),
            ("parent", Value::from(parent)),
            ("count", Value::Int(4)),
        ])
    }

    #[test]
    fn test_categories() {
        let terms = Value::Array(vec![term("1", "Uncategorized", "0"), term("5", "Rust", "1")]);
        let categories = categories_from_terms(&terms).unwrap();

        assert_eq!(categories.len(), 2);
        assert!(categories[0].is_root());
        assert_eq!(categories[1].id, 5);
        assert_eq!(categories[1].slug, "rust");
        assert_eq!(categories[1].parent_id, 1);
        assert_eq!(categories[1].post_count, Some(4));

        let broken = Value::Array(vec![Value::structure([("name", Value::from("x"))])]);
        assert!(categories_from_terms(&broken).is_err());
        assert!(categories_from_terms(&Value::Nil).is_err());
    }

    #[test]
    fn test_options() {
        let value = Value::structure([
            (
                "blog_title",
                Value::structure([
                    ("desc", Value::from("Site Title")),
                    ("readonly", Value::Bool(false)),
                    ("value", Value::from("My Blog")),
                ]),
            ),
            (
                "software_version",
                Value::structure([
                    ("desc", Value::from("Software Version")),
                    ("readonly", Value::Bool(true)),
                    ("value", Value::from("6.4")),
                ]),
            ),
        ]);
        let options = options_from_value(&value).unwrap();

        assert_eq!(options.len(), 2);
        assert_eq!(options.get_str("blog_title"), Some("My Blog"));
        assert!(!options.get("blog_title").unwrap().readonly);
        assert!(options.get("software_version").unwrap().readonly);
        assert_eq!(
            options.get("software_version").unwrap().description.as_deref(),
            Some("Software Version")
        );
    }

    #[test]
    fn test_media_item() {
        let item = Value::structure([
            ("attachment_id", Value::from("12")),
            ("date_created_gmt", Value::DateTime(parse_datetime("20131101T10:00:00").unwrap())),
            ("parent", Value::Int(0)),
            ("link", Value::from("https://example.org/wp-content/uploads/a.jpg")),
            ("title", Value::from("a")),
            ("caption", Value::from("")),
            ("description", Value::from("")),
            ("type", Value::from("image/jpeg")),
            (
                "metadata",
                Value::structure([
                    ("width", Value::Int(640)),
                    ("height", Value::Int(480)),
                    ("file", Value::from("2013/11/a.jpg")),
                ]),
            ),
        ]);
        let bare = Value::structure([
            ("attachment_id", Value::Int(13)),
            ("parent", Value::Int(9)),
            ("metadata", Value::Array(Vec::new())),
        ]);

        let media = media_from_library(&Value::Array(vec![item, bare])).unwrap();
        assert_eq!(media[0].id, 12);
        assert_eq!(media[0].post_id, None);
        assert_eq!(media[0].width, Some(640));
        assert_eq!(media[0].file.as_deref(), Some("2013/11/a.jpg"));
        assert_eq!(media[0].mime_type.as_deref(), Some("image/jpeg"));
        assert_eq!(media[0].date.unwrap().to_rfc3339(), "2013-11-01T10:00:00+00:00");

        assert_eq!(media[1].post_id, Some(9));
        assert_eq!(media[1].width, None);
        assert_eq!(media[1].url, "");
    }

    #[test]
    fn test_post_formats_filtered_by_support() {
        let value = Value::structure([
            (
                "all",
                Value::structure([
                    ("aside", Value::from("Aside")),
                    ("gallery", Value::from("Gallery")),
                    ("video", Value::from("Video")),
                    ("standard", Value::from("Standard")),
                ]),
            ),
            ("supported", Value::Array(vec![Value::from("aside"), Value::from("video")])),
        ]);
        let formats = post_formats_from_value(&value).unwrap();

        assert_eq!(formats.slugs().collect::<Vec<_>>(), vec!["aside", "standard", "video"]);
        assert!(!formats.contains("gallery"));
    }

    #[test]
    fn test_post_formats_supported_as_struct() {
        let value = Value::structure([
            (
                "all",
                Value::structure([
                    ("aside", Value::from("Aside")),
                    ("gallery", Value::from("Gallery")),
                    ("video", Value::from("Video")),
                ]),
            ),
            (
                "supported",
                Value::structure([("0", Value::from("aside")), ("2", Value::from("video"))]),
            ),
        ]);
        let formats = post_formats_from_value(&value).unwrap();

        assert_eq!(formats.slugs().collect::<Vec<_>>(), vec!["aside", "standard", "video"]);
        assert!(!formats.contains("gallery"));
    }

    #[test]
    fn test_post_formats_plain_and_empty() {
        let plain = Value::structure([("status", Value::from("Status"))]);
        let formats = post_formats_from_value(&plain).unwrap();
        assert_eq!(formats.len(), 2);
        assert_eq!(formats.get("status"), Some("Status"));

        let empty = post_formats_from_value(&Value::Array(Vec::new())).unwrap();
        assert_eq!(empty, PostFormats::new());
    }
}
