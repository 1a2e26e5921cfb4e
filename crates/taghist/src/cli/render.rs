//! # Rendering Module
//!
//! Turns library values into terminal text. Layout calculations (column widths,
//! padding) are Unicode-aware; colors come from `styles` and are dropped
//! automatically when stdout is not a terminal.

use super::styles;
use chrono::{DateTime, Utc};
use taghistory::{ChannelTag, RootHash, Tag, TagList};
use unicode_width::UnicodeWidthStr;

pub const TIME_WIDTH: usize = 16;

pub struct InfoView<'a> {
    pub fqrn: &'a str,
    pub path: Option<&'a std::path::Path>,
    pub writable: bool,
    pub tags: usize,
    pub previous_revision: Option<RootHash>,
    pub head: Option<&'a Tag>,
}

fn pad_to(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}

pub fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);
    let formatter = timeago::Formatter::new();
    formatter.convert(duration.to_std().unwrap_or_default())
}

pub fn render_tag_table(list: &TagList) -> String {
    if list.is_empty() {
        return format!("{}\n", styles::muted().apply_to("No tags."));
    }

    let name_width = list
        .tags()
        .iter()
        .map(|t| t.name.width())
        .max()
        .unwrap_or(0)
        .max("NAME".len());

    let mut out = format!(
        "{}  {}  {}  {}  {}\n",
        styles::header().apply_to(format!("{:>5}", "REV")),
        styles::header().apply_to(pad_to("NAME", name_width)),
        styles::header().apply_to(pad_to("CHANNEL", 11)),
        styles::header().apply_to(pad_to("PUBLISHED", TIME_WIDTH)),
        styles::header().apply_to("ROOT HASH"),
    );
    for tag in list.tags() {
        out.push_str(&format!(
            "{:>5}  {}  {}  {}  {}\n",
            tag.revision,
            styles::name().apply_to(pad_to(&tag.name, name_width)),
            styles::channel(tag.channel).apply_to(pad_to(tag.channel_name(), 11)),
            styles::muted().apply_to(pad_to(&format_time_ago(tag.timestamp()), TIME_WIDTH)),
            styles::hash().apply_to(tag.root_hash),
        ));
    }
    out
}

pub fn render_tag_detail(tag: &Tag) -> String {
    let rows = [
        ("Name", tag.name.clone()),
        ("Revision", tag.revision.to_string()),
        ("Channel", tag.channel_name().to_string()),
        ("Root hash", tag.root_hash.to_string()),
        ("Size", format!("{} bytes", tag.size)),
        (
            "Published",
            format!(
                "{} ({})",
                tag.timestamp().to_rfc3339(),
                format_time_ago(tag.timestamp())
            ),
        ),
        ("Description", tag.description.clone()),
    ];
    rows.iter()
        .map(|(label, value)| format!("{}  {}\n", styles::name().apply_to(pad_to(label, 12)), value))
        .collect()
}

pub fn render_channels(tops: &[ChannelTag]) -> String {
    if tops.is_empty() {
        return format!("{}\n", styles::muted().apply_to("No tags."));
    }
    tops.iter()
        .map(|top| {
            format!(
                "{}  {}\n",
                styles::channel(top.channel).apply_to(pad_to(top.channel.name(), 11)),
                styles::hash().apply_to(top.root_hash)
            )
        })
        .collect()
}

pub fn render_info(info: &InfoView<'_>) -> String {
    let mut out = format!("{}  {}\n", styles::name().apply_to(pad_to("Repository", 12)), info.fqrn);
    if let Some(path) = info.path {
        out.push_str(&format!(
            "{}  {}\n",
            styles::name().apply_to(pad_to("Store", 12)),
            path.display()
        ));
    }
    out.push_str(&format!(
        "{}  {}\n",
        styles::name().apply_to(pad_to("Mode", 12)),
        if info.writable { "read-write" } else { "read-only" }
    ));
    out.push_str(&format!(
        "{}  {}\n",
        styles::name().apply_to(pad_to("Tags", 12)),
        info.tags
    ));
    if let Some(head) = info.head {
        out.push_str(&format!(
            "{}  {} (revision {}, {})\n",
            styles::name().apply_to(pad_to("Head", 12)),
            head.name,
            head.revision,
            head.channel_name()
        ));
    }
    let previous = info
        .previous_revision
        .map(|h| h.to_string())
        .unwrap_or_else(|| "none".to_string());
    out.push_str(&format!(
        "{}  {}\n",
        styles::name().apply_to(pad_to("Previous", 12)),
        previous
    ));
    out
}

pub fn render_success(message: &str) -> String {
    format!("{}\n", styles::success().apply_to(message))
}

pub fn render_warning(message: &str) -> String {
    format!("{}\n", styles::warning().apply_to(message))
}
