//! Line-oriented block conversion: comments, preformatted text, lists,
//! definition lists, anchors, embeds and line breaks.

use std::sync::LazyLock;

use regex::Regex;

const FENCE: &str = "```";

static DEF_LIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:(.+)\|(.+)$").expect("Invalid definition list regex"));

static ANAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&aname\((.*)\);").expect("Invalid aname regex"));

static YOUTUBE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#youtube\((.*)\)").expect("Invalid youtube regex"));

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+)~$").expect("Invalid line break regex"));

/// List markers, deepest first: (pattern, markdown prefix).
static LIST_ITEMS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"^---([^-].+)$", "        * "),
        (r"^--([^-].+)$", "    * "),
        (r"^-([^-].+)$", "* "),
        (r"^\+\+\+([^+].+)$", "        1. "),
        (r"^\+\+([^+].+)$", "    1. "),
        (r"^\+([^+].+)$", "1. "),
    ]
    .into_iter()
    .map(|(pattern, prefix)| (Regex::new(pattern).expect("Invalid list regex"), prefix))
    .collect()
});

/// Convert block-level PukiWiki markup.
pub fn convert_blocks(content: &str) -> String {
    let lines: Vec<String> = content
        .lines()
        .map(|line| line.replace("<pre>", FENCE).replace("</pre>", FENCE))
        .collect();

    let lines = drop_comments(lines);
    let lines = fence_indented(lines);
    let lines = convert_definitions(lines);
    let lines = convert_lists(lines);
    let lines = convert_inline_lines(lines);

    let mut output = lines.join("\n");
    output.push('\n');
    output
}

fn is_fence(line: &str) -> bool {
    line.trim_start().starts_with(FENCE)
}

/// Tracks whether the current line is inside fenced code.
#[derive(Default)]
struct FenceState {
    inside: bool,
}

impl FenceState {
    /// Returns true when `line` must be left untouched.
    fn skip(&mut self, line: &str) -> bool {
        if is_fence(line) {
            self.inside = !self.inside;
            return true;
        }
        self.inside
    }
}

fn drop_comments(lines: Vec<String>) -> Vec<String> {
    let mut fences = FenceState::default();
    lines
        .into_iter()
        .filter(|line| fences.skip(line) || !line.starts_with("//"))
        .collect()
}

/// Lines starting with a single space form a preformatted block.
fn fence_indented(lines: Vec<String>) -> Vec<String> {
    let mut output = Vec::with_capacity(lines.len());
    let mut fences = FenceState::default();
    let mut in_block = false;

    for line in lines {
        let indented = line.len() > 1 && line.starts_with(' ');

        if in_block {
            if indented {
                output.push(line[1..].to_string());
                continue;
            }
            output.push(FENCE.to_string());
            in_block = false;
        }

        if fences.skip(&line) {
            output.push(line);
            continue;
        }

        if indented {
            output.push(FENCE.to_string());
            output.push(line[1..].to_string());
            in_block = true;
        } else {
            output.push(line);
        }
    }

    if in_block {
        output.push(FENCE.to_string());
    }

    output
}

fn convert_definitions(lines: Vec<String>) -> Vec<String> {
    let mut output = Vec::with_capacity(lines.len());
    let mut fences = FenceState::default();

    for line in lines {
        if fences.skip(&line) {
            output.push(line);
            continue;
        }
        match DEF_LIST.captures(&line) {
            Some(caps) => {
                output.push(String::new());
                output.push(caps[1].trim().to_string());
                output.push(format!(":   {}", caps[2].trim()));
            }
            None => output.push(line),
        }
    }

    output
}

fn list_item(line: &str) -> Option<String> {
    LIST_ITEMS.iter().find_map(|(pattern, prefix)| {
        pattern
            .captures(line)
            .map(|caps| format!("{}{}", prefix, caps[1].trim_start()))
    })
}

/// Convert list markers; a list that does not follow a blank line gets one.
fn convert_lists(lines: Vec<String>) -> Vec<String> {
    let mut output = Vec::with_capacity(lines.len());
    let mut fences = FenceState::default();
    let mut prev_list = false;
    let mut prev_blank = false;

    for line in lines {
        if fences.skip(&line) {
            prev_list = false;
            prev_blank = false;
            output.push(line);
            continue;
        }

        match list_item(&line) {
            Some(item) => {
                if !prev_list && !prev_blank {
                    output.push(String::new());
                }
                output.push(item);
                prev_list = true;
            }
            None => {
                prev_list = false;
                prev_blank = line.is_empty();
                output.push(line);
                continue;
            }
        }
        prev_blank = false;
    }

    output
}

/// Anchors, embeds and explicit line breaks.
fn convert_inline_lines(lines: Vec<String>) -> Vec<String> {
    let mut output = Vec::with_capacity(lines.len());
    let mut fences = FenceState::default();

    for line in lines {
        if fences.skip(&line) {
            output.push(line);
            continue;
        }

        if let Some(caps) = ANAME.captures(&line) {
            let id = caps[1].split(',').next().unwrap_or("").trim().to_string();
            output.push(format!("<a id=\"{}\"></a>", id));
            let rest = ANAME.replace_all(&line, "");
            output.push(break_line(&rest));
            continue;
        }

        if let Some(caps) = YOUTUBE.captures(&line) {
            output.extend(youtube_embed(&caps[1]));
            continue;
        }

        output.push(break_line(&line));
    }

    output
}

fn break_line(line: &str) -> String {
    LINE_BREAK.replace(line, "${1}<br/>").into_owned()
}

fn youtube_embed(args: &str) -> Vec<String> {
    let args: Vec<&str> = args.split(',').map(str::trim).collect();
    let video_id = args.first().copied().unwrap_or("");
    let autoplay = if args.len() == 2 && args[1] == "loop" {
        "autoplay=1&loop=1&"
    } else {
        ""
    };

    vec![
        String::new(),
        format!(
            "<iframe width=\"425\" height=\"350\" src=\"https://www.youtube.com/embed/{id}?mute=1&{autoplay}controls=1&rel=0&playlist={id}\"",
            id = video_id,
            autoplay = autoplay
        ),
        "        title=\"YouTube video player\"".to_string(),
        "        frameborder=\"0\"".to_string(),
        "        allow=\"autoplay; encrypted-media\"".to_string(),
        "        allowfullscreen>".to_string(),
        "</iframe>".to_string(),
        String::new(),
    ]
}
