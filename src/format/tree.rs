use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An HTML element as the markdown renderer would emit it.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub classes: Vec<String>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Element {
            tag: tag.to_string(),
            classes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Concatenated text of all descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Replace all children with a single text node.
    pub fn set_text(&mut self, text: String) {
        self.children = vec![Node::Text(text)];
    }

    /// First descendant element with the given tag, depth-first.
    pub fn find(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find_map(|child| match child {
            Node::Element(el) if el.tag == tag => Some(el),
            Node::Element(el) => el.find(tag),
            Node::Text(_) => None,
        })
    }

    pub fn child_elements<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter_map(move |child| match child {
            Node::Element(el) if el.tag == tag => Some(el),
            _ => None,
        })
    }

    fn push_text(&mut self, text: &str) {
        if let Some(Node::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(Node::Text(text.to_string()));
        }
    }
}

fn collect_text(el: &Element, out: &mut String) {
    for child in &el.children {
        match child {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => collect_text(e, out),
        }
    }
}

// ── Markdown → tree ──

/// Parse markdown into a `body` element holding the block-level elements.
/// Raw HTML is dropped.
pub fn to_tree(markdown: &str) -> Element {
    let mut stack: Vec<Element> = vec![Element::new("body")];
    let mut image_depth = 0usize;

    for event in Parser::new_ext(markdown, Options::ENABLE_TABLES) {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let mut code = Element::new("code");
                if let CodeBlockKind::Fenced(info) = kind {
                    if let Some(lang) = info.split_whitespace().next() {
                        code.classes.push(format!("language-{}", lang));
                    }
                }
                stack.push(Element::new("pre"));
                stack.push(code);
            }
            Event::End(TagEnd::CodeBlock) => {
                close(&mut stack);
                close(&mut stack);
            }
            Event::Start(tag) => {
                if matches!(tag, Tag::Image { .. }) {
                    image_depth += 1;
                }
                stack.push(Element::new(tag_name(&tag)));
            }
            Event::End(end) => {
                if matches!(end, TagEnd::Image) {
                    image_depth = image_depth.saturating_sub(1);
                }
                close(&mut stack);
            }
            Event::Text(text) if image_depth == 0 => top(&mut stack).push_text(&text),
            Event::Code(text) if image_depth == 0 => {
                let mut code = Element::new("code");
                code.set_text(text.to_string());
                top(&mut stack).children.push(Node::Element(code));
            }
            Event::SoftBreak | Event::HardBreak if image_depth == 0 => {
                top(&mut stack).push_text("\n")
            }
            Event::Rule => top(&mut stack).children.push(Node::Element(Element::new("hr"))),
            _ => {}
        }
    }

    // Parser events are balanced; fold anything left open just in case.
    while stack.len() > 1 {
        close(&mut stack);
    }
    stack.pop().unwrap_or_else(|| Element::new("body"))
}

fn top(stack: &mut Vec<Element>) -> &mut Element {
    if stack.is_empty() {
        stack.push(Element::new("body"));
    }
    let last = stack.len() - 1;
    &mut stack[last]
}

fn close(stack: &mut Vec<Element>) {
    if stack.len() < 2 {
        return;
    }
    if let Some(el) = stack.pop() {
        top(stack).children.push(Node::Element(el));
    }
}

fn tag_name(tag: &Tag) -> &'static str {
    match tag {
        Tag::Paragraph => "p",
        Tag::Heading { level, .. } => match level {
            HeadingLevel::H1 => "h1",
            HeadingLevel::H2 => "h2",
            HeadingLevel::H3 => "h3",
            HeadingLevel::H4 => "h4",
            HeadingLevel::H5 => "h5",
            HeadingLevel::H6 => "h6",
        },
        Tag::BlockQuote(_) => "blockquote",
        Tag::CodeBlock(_) => "pre",
        Tag::List(None) => "ul",
        Tag::List(Some(_)) => "ol",
        Tag::Item => "li",
        Tag::Table(_) => "table",
        Tag::TableHead => "thead",
        Tag::TableRow => "tr",
        Tag::TableCell => "td",
        Tag::Emphasis => "em",
        Tag::Strong => "strong",
        Tag::Strikethrough => "del",
        Tag::Link { .. } => "a",
        Tag::Image { .. } => "img",
        _ => "div",
    }
}

// ── Tree → markdown ──

/// Re-emit markdown from the root's direct children.
///
/// Lossy by construction: only `h1`-`h3`, `p`, `pre>code`, `ul` and `ol` survive.
/// Deeper headings, blockquotes, tables, rules and inline formatting are dropped
/// or flattened to plain text, and nested lists fold into their parent item.
pub fn from_tree(root: &Element) -> String {
    let mut blocks: Vec<String> = Vec::new();

    for child in &root.children {
        let Node::Element(el) = child else { continue };
        match el.tag.as_str() {
            "h1" => blocks.push(format!("# {}", el.text().trim())),
            "h2" => blocks.push(format!("## {}", el.text().trim())),
            "h3" => blocks.push(format!("### {}", el.text().trim())),
            "p" => blocks.push(el.text().trim().to_string()),
            "pre" => {
                if let Some(code) = el.find("code") {
                    let lang = code
                        .classes
                        .first()
                        .map(|c| c.trim_start_matches("language-"))
                        .filter(|l| !l.is_empty())
                        .unwrap_or("text");
                    blocks.push(format!("```{}\n{}\n```", lang, trim_blank_lines(&code.text())));
                }
            }
            "ul" => {
                let items: Vec<String> = el
                    .child_elements("li")
                    .map(|li| format!("- {}", li.text().trim()))
                    .collect();
                if !items.is_empty() {
                    blocks.push(items.join("\n"));
                }
            }
            "ol" => {
                let items: Vec<String> = el
                    .child_elements("li")
                    .enumerate()
                    .map(|(i, li)| format!("{}. {}", i + 1, li.text().trim()))
                    .collect();
                if !items.is_empty() {
                    blocks.push(items.join("\n"));
                }
            }
            _ => {}
        }
    }

    blocks
        .iter()
        .map(|b| format!("{}\n", b))
        .collect::<Vec<_>>()
        .join("\n")
}

fn trim_blank_lines(code: &str) -> &str {
    let code = code.trim_end();
    let start = code
        .char_indices()
        .take_while(|(_, c)| c.is_whitespace())
        .filter(|(_, c)| *c == '\n')
        .last()
        .map(|(i, _)| i + 1)
        .unwrap_or(0);
    &code[start..]
}
