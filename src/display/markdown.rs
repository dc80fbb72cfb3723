//! Inline image handling for issue and note markdown.

use std::collections::HashMap;
use std::future::Future;
use std::ops::Range;

use comrak::nodes::{LineColumn, NodeValue};
use comrak::{Arena, Options};

fn options() -> Options<'static> {
    let mut options = Options::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.tasklist = true;
    options.extension.autolink = true;
    // Inline nodes only track their lines with this on.
    options.render.sourcepos = true;
    options
}

/// Byte range of one image destination in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ImageDestination {
    url: String,
    range: Range<usize>,
}

/// Every image with its destination located in `markdown`, in document
/// order. Images whose destination cannot be found verbatim (escaped or
/// entity-encoded URLs) are skipped.
fn image_destinations(markdown: &str) -> Vec<ImageDestination> {
    let arena = Arena::new();
    let root = comrak::parse_document(&arena, markdown, &options());

    let line_starts: Vec<usize> = std::iter::once(0)
        .chain(markdown.match_indices('\n').map(|(i, _)| i + 1))
        .collect();
    let offset = |pos: LineColumn| {
        line_starts
            .get(pos.line.checked_sub(1)?)
            .map(|start| start + pos.column.saturating_sub(1))
    };

    let mut found: Vec<ImageDestination> = Vec::new();
    for node in root.descendants() {
        let data = node.data.borrow();
        let NodeValue::Image(ref link) = data.value else {
            continue;
        };
        if link.url.is_empty() {
            continue;
        }

        let after_previous = found.last().map_or(0, |d| d.range.end);
        let located = offset(data.sourcepos.start)
            .filter(|&at| markdown.get(at..).is_some_and(|t| t.starts_with("![")))
            .and_then(|at| {
                let end = offset(data.sourcepos.end).map_or(markdown.len(), |e| e + 1);
                destination_in(markdown, at, end.clamp(at, markdown.len()), &link.url)
            })
            .or_else(|| scan_for_destination(markdown, after_previous, &link.url));

        if let Some(range) = located {
            found.push(ImageDestination {
                url: link.url.clone(),
                range,
            });
        }
    }
    found
}

/// Destination `url` of the image starting at `start`, looking no further
/// than `end`. Only a complete destination counts: it must be followed by
/// `)`, whitespace before a title, or `>` when written in angle brackets.
fn destination_in(markdown: &str, start: usize, end: usize, url: &str) -> Option<Range<usize>> {
    let image = markdown.get(start..end)?;
    let mut from = 0;
    while let Some(i) = image[from..].find("](") {
        let open = from + i + 2;
        let rest = &image[open..];
        let (skip, terminators): (usize, &[char]) = if rest.starts_with('<') {
            (1, &['>'][..])
        } else {
            (0, &[')', ' ', '\t', '\r', '\n'][..])
        };
        if let Some(after) = rest[skip..].strip_prefix(url)
            && after.starts_with(terminators)
        {
            let begin = start + open + skip;
            return Some(begin..begin + url.len());
        }
        from = open;
    }
    None
}

/// Fallback when the parser gave no usable position: the first `![` at or
/// after `from` whose destination is `url`, staying within its paragraph.
fn scan_for_destination(markdown: &str, from: usize, url: &str) -> Option<Range<usize>> {
    let tail = markdown.get(from..)?;
    tail.match_indices("![").find_map(|(i, _)| {
        let start = from + i;
        let end = markdown[start..]
            .find("\n\n")
            .map_or(markdown.len(), |e| start + e);
        destination_in(markdown, start, end, url)
    })
}

/// Image destinations in document order, without duplicates.
pub fn image_sources(markdown: &str) -> Vec<String> {
    let arena = Arena::new();
    let root = comrak::parse_document(&arena, markdown, &options());

    let mut sources: Vec<String> = Vec::new();
    for node in root.descendants() {
        if let NodeValue::Image(ref link) = node.data.borrow().value
            && !link.url.is_empty()
            && !sources.contains(&link.url)
        {
            sources.push(link.url.clone());
        }
    }
    sources
}

/// Swap each image destination found in `replacements` for its new value.
///
/// Only the destination of each image is touched; links, code and the rest
/// of the body are left exactly as written.
pub fn replace_image_sources(markdown: &str, replacements: &HashMap<String, String>) -> String {
    let mut output = markdown.to_string();
    // Back to front so earlier ranges stay valid.
    for destination in image_destinations(markdown).into_iter().rev() {
        if let Some(to) = replacements.get(&destination.url)
            && *to != destination.url
        {
            output.replace_range(destination.range, to);
        }
    }
    output
}

/// Run every image destination through `resolve` and rewrite the body.
/// Each distinct source is resolved once; the lookups run concurrently.
pub async fn resolve_images<F, Fut>(markdown: &str, mut resolve: F) -> String
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = String>,
{
    let sources = image_sources(markdown);
    if sources.is_empty() {
        return markdown.to_string();
    }

    let pending: Vec<_> = sources.iter().map(|s| resolve(s.clone())).collect();
    let resolved = futures::future::join_all(pending).await;

    let replacements: HashMap<String, String> = sources.into_iter().zip(resolved).collect();
    replace_image_sources(markdown, &replacements)
}
