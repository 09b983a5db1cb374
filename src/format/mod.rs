pub mod blocks;
pub mod headings;
pub mod tree;

use tracing::debug;

/// markdown → tree → annotated headings → markdown → mermaid fix → fence tags.
pub fn format_markdown(markdown: &str) -> String {
    let mut root = tree::to_tree(markdown);
    let annotated = headings::annotate_headings(&mut root);
    debug!("Annotated {} headings", annotated);

    let content = tree::from_tree(&root);
    let content = blocks::fix_mermaid(&content);
    blocks::fix_code_blocks(&content)
}
