//! Regex rewrite rules for PukiWiki inline and heading markup.

use std::sync::LazyLock;

use regex::Regex;

/// A single pattern/replacement pair applied to the whole page.
pub struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

impl Rule {
    fn new(pattern: &str, replacement: &'static str) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("Invalid markup rule"),
            replacement,
        }
    }

    /// Apply the rule to `content`.
    pub fn apply(&self, content: &str) -> String {
        self.pattern
            .replace_all(content, self.replacement)
            .into_owned()
    }
}

/// Markup rules in application order.
///
/// Triple quotes must be handled before double quotes, otherwise
/// `'''italic'''` is consumed by the bold rule.
pub static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new(r"(?m)^#access$", ""),
        Rule::new(r"(?m)^#contents$", ""),
        // quotes need a blank line before them
        Rule::new(r"(?m)^>([^>].*)$", "\n>${1}"),
        Rule::new(r"(?m)^>>([^>].*)$", "\n>>${1}"),
        // headings shift one level down, h1 is the page title
        Rule::new(r"(?m)^\*\s*([^\s\*].+)$", "## ${1}"),
        Rule::new(r"(?m)^\*\*\s*([^\s\*].+)$", "### ${1}"),
        Rule::new(r"(?m)^\*\*\*\s*([^\s\*].+)$", "#### ${1}"),
        // fixed heading anchors: "* Title [#a1b2c3d4]"
        Rule::new(
            r"(?m)^(#{2,4} .*?)\s*\[#([A-Za-z0-9_-]+)\]\s*$",
            "${1} { #${2} }",
        ),
        Rule::new(r"'''(.+?)'''", "*${1}*"),
        Rule::new(r"''(.+?)''", "**${1}**"),
        Rule::new(r"%%(.+?)%%", "~~${1}~~"),
        Rule::new(r"__(.+?)__", "<u>${1}</u>"),
    ]
});

/// Apply every markup rule in order.
pub fn apply_rules(content: &str) -> String {
    RULES
        .iter()
        .fold(content.to_string(), |acc, rule| rule.apply(&acc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn converts_headings() {
        let src = "*Intro\n** Details\n***Notes";
        assert_eq!(apply_rules(src), "## Intro\n### Details\n#### Notes");
    }

    #[test]
    fn converts_heading_anchors() {
        assert_eq!(
            apply_rules("* Install [#p1a2b3c4]"),
            "## Install { #p1a2b3c4 }"
        );
    }

    #[test]
    fn converts_emphasis() {
        assert_eq!(
            apply_rules("''bold'' and '''italic''' and %%gone%% and __under__"),
            "**bold** and *italic* and ~~gone~~ and <u>under</u>"
        );
    }

    #[test]
    fn removes_directives() {
        assert_eq!(apply_rules("#contents\ntext\n#access"), "\ntext\n");
    }

    #[test]
    fn separates_quotes() {
        assert_eq!(apply_rules("text\n>quoted"), "text\n\n>quoted");
    }

    #[test]
    fn leaves_list_markers_alone() {
        assert_eq!(apply_rules("-item\n----"), "-item\n----");
    }
}
