//! Single page conversion.

use crate::blocks::convert_blocks;
use crate::images::convert_images;
use crate::links::{convert_internal_links, PageContext};
use crate::rules::apply_rules;

/// Convert the decoded source of one wiki page into Markdown.
///
/// Links and attachment references are resolved first so that the markup
/// rules never see `[[...]]` or `&ref(...)` syntax.
pub fn convert_page(source: &str, ctx: &PageContext) -> String {
    let content = convert_internal_links(source, ctx);
    let content = convert_images(&content, ctx);
    let content = apply_rules(&content);
    convert_blocks(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn converts_a_front_page() {
        let source = "#contents\n\
*CueMol2\n\
''CueMol'' is a molecular viewer.~\n\
-[[Download]]\n\
-[[Manual>cuemol2/Manual]]\n\
// internal note\n\
#ref(top.png,nolink)\n";

        let ctx = PageContext::new("index", "ja", "ja");
        let expected = "\n\
## CueMol2\n\
**CueMol** is a molecular viewer.<br/>\n\
\n\
* [Download](Download)\n\
* [Manual](cuemol2/Manual)\n\
\n\
![top](assets/images/index/top.png)\n\
\n";

        assert_eq!(convert_page(source, &ctx), expected);
    }

    #[test]
    fn converts_pages_for_other_locale() {
        let ctx = PageContext::new("Manual", "en", "ja");
        let out = convert_page("See [[Download]] &ref(shot.png);", &ctx);

        assert_eq!(
            out,
            "See [Download](../../en/Download) ![shot](../../assets/images/Manual/shot.png){ .on-glb }\n"
        );
    }
}
