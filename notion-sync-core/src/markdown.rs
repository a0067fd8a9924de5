//! Assembles a block tree into one markdown string.

use crate::contract::Block;

/// Block types that render as tight list lines instead of paragraphs.
const LIST_TYPES: [&str; 3] = ["bulleted_list_item", "numbered_list_item", "to_do"];

/// Renders `blocks` to markdown. Paragraph-like blocks are surrounded by blank
/// lines, list items are emitted one per line, and nested children are
/// indented with one tab per level (synced blocks are transparent and do not
/// add a level).
pub fn to_markdown(blocks: &[Block]) -> String {
    let mut out = String::new();
    write_blocks(&mut out, blocks, 0);
    out
}

fn write_blocks(out: &mut String, blocks: &[Block], depth: usize) {
    for block in blocks {
        if !block.parent.is_empty() {
            let text = indent(&block.parent, depth);
            if LIST_TYPES.contains(&block.block_type.as_str()) {
                out.push_str(&text);
                out.push('\n');
            } else {
                out.push('\n');
                out.push_str(&text);
                out.push_str("\n\n");
            }
        }
        if !block.children.is_empty() {
            let child_depth = if block.block_type == "synced_block" {
                depth
            } else {
                depth + 1
            };
            write_blocks(out, &block.children, child_depth);
        }
    }
}

fn indent(text: &str, depth: usize) -> String {
    if depth == 0 {
        return text.to_string();
    }
    let tabs = "\t".repeat(depth);
    text.lines()
        .map(|line| format!("{tabs}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
