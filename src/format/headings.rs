use super::tree::{Element, Node};

/// Glyphs that mark a heading as already annotated.
const ANNOTATED_GLYPHS: &[&str] = &[
    "🔗", "📝", "💡", "🚀", "📊", "🎯", "💻", "🌟", "🎨", "📖", "🏗️", "🗺️",
];

/// Keyword → glyph, first match wins. Order is the tie-break.
const HEADING_EMOJI: &[(&str, &str)] = &[
    ("introduction", "🌟"),
    ("implementation", "💻"),
    ("example", "🎮"),
    ("practice", "🎯"),
    ("advanced", "🚀"),
    ("conclusion", "🎬"),
    ("features", "✨"),
    ("structure", "🏗️"),
    ("usage", "🛠️"),
    ("overview", "📖"),
    ("summary", "📝"),
    ("installation", "⚙️"),
    ("configuration", "⚙️"),
    ("setup", "🔧"),
    ("tutorial", "📚"),
    ("guide", "🗺️"),
    ("tips", "💡"),
    ("best practices", "✅"),
    ("common", "📊"),
    ("performance", "⚡"),
    ("security", "🔒"),
    ("testing", "🧪"),
    ("debugging", "🐛"),
    ("deployment", "🚀"),
    ("api", "🔌"),
    ("database", "💾"),
    ("architecture", "🏛️"),
    ("design", "🎨"),
    ("patterns", "🔄"),
];

const DEFAULT_EMOJI: &str = "📌";

/// Prefix every `h1`-`h3` in the tree with an emoji. Returns how many changed.
pub fn annotate_headings(root: &mut Element) -> usize {
    let mut changed = 0;
    for child in root.children.iter_mut() {
        let Node::Element(el) = child else { continue };
        if matches!(el.tag.as_str(), "h1" | "h2" | "h3") {
            if annotate(el) {
                changed += 1;
            }
        } else {
            changed += annotate_headings(el);
        }
    }
    changed
}

fn annotate(heading: &mut Element) -> bool {
    let text = heading.text();
    if ANNOTATED_GLYPHS.iter().any(|g| text.contains(g)) {
        return false;
    }
    let emoji = emoji_for_heading(&text.to_lowercase());
    heading.set_text(format!("{} {}", emoji, text.trim()));
    true
}

/// Pick the glyph for an already lower-cased heading.
pub fn emoji_for_heading(heading: &str) -> &'static str {
    HEADING_EMOJI
        .iter()
        .find(|(keyword, _)| heading.contains(keyword))
        .map(|(_, emoji)| *emoji)
        .unwrap_or(DEFAULT_EMOJI)
}
