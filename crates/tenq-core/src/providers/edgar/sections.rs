//! Plain-text extraction and item splitting for 10-Q HTML documents.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::model::{FilingItem, ItemKey};

/// Item headings longer than this are treated as body text.
const MAX_HEADING_LEN: usize = 200;

fn hidden_blocks() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>|<head\b.*?</head\s*>|<ix:header\b.*?</ix:header\s*>")
            .expect("valid hidden block regex")
    })
}

fn line_breaks() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)<\s*(br|/p|/div|/tr|/li|/h[1-6]|/table)\b[^>]*>")
            .expect("valid line break regex")
    })
}

fn cell_ends() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)</\s*t[dh]\s*>").expect("valid cell regex"))
}

fn tags() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"))
}

fn numeric_entities() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").expect("valid entity regex"))
}

fn inline_space() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t\u{a0}]+").expect("valid space regex"))
}

fn part_heading() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^part\s+(ii|i)\b").expect("valid part regex"))
}

fn item_heading() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^item\s+(\d{1,2}[a-z]?)\s*(?:[.:\-\u{2013}\u{2014}]|$)")
            .expect("valid item regex")
    })
}

/// Item number of a heading line such as `Item 2. Management's Discussion`.
///
/// The number must be followed by a delimiter or the end of the line, and the
/// title must not continue in lower case, so cross-references like
/// `Item 1A of our Annual Report` stay in the body.
fn parse_item_heading(line: &str) -> Option<String> {
    if line.len() > MAX_HEADING_LEN {
        return None;
    }
    let caps = item_heading().captures(line)?;
    let rest = line[caps.get(0)?.end()..].trim_start();
    if rest.starts_with(|c: char| c.is_lowercase()) {
        return None;
    }
    Some(caps[1].to_ascii_uppercase())
}

fn decode_entities(text: &str) -> String {
    let numeric = numeric_entities().replace_all(text, |caps: &regex::Captures<'_>| {
        let raw = &caps[1];
        let code = match raw.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => raw.parse::<u32>().ok(),
        };
        code.and_then(char::from_u32)
            .map(|c| c.to_string())
            .unwrap_or_default()
    });

    numeric
        .replace("&nbsp;", " ")
        .replace("&rsquo;", "'")
        .replace("&lsquo;", "'")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&mdash;", "\u{2014}")
        .replace("&ndash;", "\u{2013}")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Reduce an EDGAR HTML document to line-oriented plain text.
pub fn html_to_text(html: &str) -> String {
    let text = hidden_blocks().replace_all(html, "");
    let text = line_breaks().replace_all(&text, "\n");
    let text = cell_ends().replace_all(&text, " ");
    let text = tags().replace_all(&text, "");
    let text = decode_entities(&text);

    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.lines() {
        let line = inline_space().replace_all(line, " ");
        let line = line.trim();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}

struct Heading {
    key: ItemKey,
    title: String,
    body_start: usize,
    line_start: usize,
}

/// Split plain 10-Q text into items keyed by part and number, in document order.
///
/// Headings repeat between the table of contents and the body, so each
/// (part, item) keeps its longest section and items are ordered by where that
/// section starts. Part I and Part II items with the same number stay distinct.
pub fn split_items(text: &str) -> Vec<(ItemKey, FilingItem)> {
    let mut headings: Vec<Heading> = Vec::new();
    let mut boundaries: Vec<usize> = Vec::new();
    let mut part = "I".to_string();
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        let trimmed = line.trim();

        if let Some(caps) = part_heading().captures(trimmed) {
            part = caps[1].to_ascii_uppercase();
            boundaries.push(line_start);
            continue;
        }
        if let Some(number) = parse_item_heading(trimmed) {
            headings.push(Heading {
                key: ItemKey::new(&part, &number),
                title: trimmed.to_string(),
                body_start: offset,
                line_start,
            });
            boundaries.push(line_start);
        }
    }

    let mut best: HashMap<ItemKey, (usize, FilingItem)> = HashMap::new();

    for heading in &headings {
        let end = boundaries
            .iter()
            .copied()
            .find(|&b| b > heading.line_start)
            .unwrap_or(text.len());
        let contents = text[heading.body_start.min(end)..end].trim().to_string();

        let longer = best
            .get(&heading.key)
            .map_or(true, |(_, existing)| contents.len() > existing.contents.len());
        if longer {
            best.insert(
                heading.key.clone(),
                (
                    heading.line_start,
                    FilingItem {
                        name: heading.title.clone(),
                        contents,
                    },
                ),
            );
        }
    }

    let mut items: Vec<(ItemKey, (usize, FilingItem))> = best.into_iter().collect();
    items.sort_by_key(|(_, (position, _))| *position);
    items
        .into_iter()
        .map(|(key, (_, item))| (key, item))
        .collect()
}
