use std::sync::LazyLock;

use regex::{Captures, Regex};

static FLOWCHART_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```mermaid\s*\nflowchart(\s)").unwrap());
static MINDMAP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```mermaid\s*\nmindmap\s*\n\s*root").unwrap());
static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?ms)^```([^\n`]*)\n(.*?)^```").unwrap());

/// Rewrite `flowchart` diagrams to `graph` and re-indent mindmap roots.
/// Other mermaid syntax passes through.
pub fn fix_mermaid(content: &str) -> String {
    let content = FLOWCHART_RE.replace_all(content, "```mermaid\ngraph$1");
    MINDMAP_RE
        .replace_all(&content, "```mermaid\nmindmap\n    root")
        .into_owned()
}

/// Tag every untagged fence with a guessed language. Fences open and close at
/// the start of a line; any non-blank info string counts as a tag.
pub fn fix_code_blocks(content: &str) -> String {
    FENCE_RE
        .replace_all(content, |caps: &Captures| {
            if !caps[1].trim().is_empty() {
                return caps[0].to_string();
            }
            let code = &caps[2];
            format!("```{}\n{}```", detect_language(code), code)
        })
        .into_owned()
}

/// Best-effort guess; a wrong tag is harmless.
pub fn detect_language(code: &str) -> &'static str {
    if code.contains("def ") || code.contains("class ") || code.contains("import ") {
        return "python";
    }
    if code.contains('{') && (code.contains(':') || code.contains(';')) {
        return "javascript";
    }
    if code.contains('<') && code.contains('>') {
        return "html";
    }
    if code.contains('{') && code.contains('}') && code.contains(';') {
        return "css";
    }
    "text"
}
