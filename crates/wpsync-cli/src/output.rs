//! Output formatting utilities for CLI

use anyhow::Result;
use console::style;
use serde::Serialize;

use wpsync_core::remote::MetadataEvent;
use wpsync_service::BlogSnapshot;

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Format an error message
pub fn format_error(msg: &str) -> String {
    style(format!("Error: {}", msg)).red().to_string()
}

/// Format a success message
pub fn format_success(msg: &str) -> String {
    style(msg).green().to_string()
}

/// Format a warning message
pub fn format_warning(msg: &str) -> String {
    style(format!("Warning: {}", msg)).yellow().to_string()
}

/// One line per metadata sub-result
pub fn format_event(event: &MetadataEvent) -> String {
    match event {
        MetadataEvent::Media(media) => format!("  {} media items", style(media.len()).cyan()),
        MetadataEvent::Options(options) => format!("  {} options", style(options.len()).cyan()),
        MetadataEvent::PostFormats(formats) => {
            format!("  {} post formats", style(formats.len()).cyan())
        }
        MetadataEvent::Completed => format_success("  metadata complete"),
    }
}

/// Summary line for a synced blog
pub fn format_snapshot(snapshot: &BlogSnapshot) -> String {
    let mut parts = Vec::new();
    if let Some(categories) = &snapshot.categories {
        parts.push(format!("{} categories", categories.len()));
    }
    if let Some(media) = &snapshot.media {
        parts.push(format!("{} media", media.len()));
    }
    if let Some(options) = &snapshot.options {
        parts.push(format!("{} options", options.len()));
    }
    if let Some(formats) = &snapshot.post_formats {
        parts.push(format!("{} post formats", formats.len()));
    }

    let mut line = format!(
        "{} ({}): {}",
        style(&snapshot.blog).bold(),
        snapshot.transport,
        parts.join(", ")
    );
    if !snapshot.skipped.is_empty() {
        let skipped: Vec<String> = snapshot.skipped.iter().map(ToString::to_string).collect();
        line.push_str(&format!(" [skipped: {}]", skipped.join(", ")));
    }
    line
}
