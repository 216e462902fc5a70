//! `&ref(...)` / `#ref(...)` attachment references.

use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::links::{join_url, link_destination, PageContext};

static INLINE_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&ref\(([^)]+)\);").expect("Invalid inline ref regex"));

static BLOCK_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#ref\(([^)]+)\)").expect("Invalid block ref regex"));

/// Rewrite attachment references into Markdown images.
pub(crate) fn convert_images(content: &str, ctx: &PageContext) -> String {
    let result = INLINE_REF.replace_all(content, |caps: &Captures<'_>| render_image(&caps[1], ctx));

    BLOCK_REF
        .replace_all(&result, |caps: &Captures<'_>| {
            format!("\n{}\n", render_image(&caps[1], ctx))
        })
        .into_owned()
}

fn render_image(args: &str, ctx: &PageContext) -> String {
    let mut parts = args.split(',');
    let target = strip_quotes(parts.next().unwrap_or("").trim());

    let path = Path::new(target);
    let alt = path.file_stem().and_then(|s| s.to_str()).unwrap_or(target);
    let filename = path.file_name().and_then(|s| s.to_str()).unwrap_or(target);

    let src = link_destination(&join_url(&[
        &ctx.top_dir(),
        &ctx.images_dir,
        &ctx.page,
        filename,
    ]));
    let options = image_options(parts);

    if options.is_empty() {
        format!("![{}]({})", alt, src)
    } else {
        format!("![{}]({}){{ {} }}", alt, src, options.join(" "))
    }
}

/// Translate `&ref` options into attribute list entries.
///
/// `N%` scales the image; every image opens in the lightbox unless
/// `nolink` is given.
fn image_options<'a>(parts: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut options = Vec::new();
    let mut zoom_link = true;

    for part in parts.map(str::trim) {
        if part == "nolink" {
            zoom_link = false;
            continue;
        }
        if let Some(percent) = part.strip_suffix('%') {
            match percent.trim().parse::<f64>() {
                Ok(value) => options.push(format!("style=\"zoom: {}\"", format_scale(value / 100.0))),
                Err(_) => tracing::debug!("Ignoring image scale: {}", part),
            }
        }
    }

    if zoom_link {
        options.push(".on-glb".to_string());
    }

    options
}

fn format_scale(scale: f64) -> String {
    if scale.fract() == 0.0 {
        format!("{:.1}", scale)
    } else {
        scale.to_string()
    }
}

fn strip_quotes(text: &str) -> &str {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        if first == bytes[bytes.len() - 1] && matches!(first, b'"' | b'\'' | b'`') {
            return &text[1..text.len() - 1];
        }
    }
    text
}
