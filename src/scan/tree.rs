//! Syntax-tree scanning.

use std::fs;
use std::path::Path;

use tree_sitter::{Node, Parser};

use super::source_files;
use crate::error::AddonError;

/// Builds a parser configured for the Python grammar.
pub(crate) fn python_parser() -> Option<Parser> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .ok()?;
    Some(parser)
}

/// Parses every matching file under `root` and visits matching syntax nodes.
///
/// Each file is parsed in full; every node of its tree whose kind equals
/// `node_kind` and for which `predicate` holds is passed to `visit` together
/// with the file path and the file's source text.
///
/// A file that fails to parse is logged and skipped, and the scan continues
/// with the next file; a malformed source file is data to route around. An
/// unreadable file is an environment error and still aborts the whole scan,
/// matching [`super::scan_lines`].
pub fn scan_tree<F, P, V>(
    root: &Path,
    file_filter: F,
    node_kind: &str,
    predicate: P,
    mut visit: V,
) -> Result<(), AddonError>
where
    F: Fn(&str) -> bool,
    P: Fn(Node<'_>, &str) -> bool,
    V: FnMut(&Path, Node<'_>, &str),
{
    let Some(mut parser) = python_parser() else {
        tracing::warn!("python grammar unavailable; tree scan yields nothing");
        return Ok(());
    };

    for file in source_files(root, file_filter)? {
        let source = fs::read_to_string(&file)?;
        let tree = match parser.parse(&source, None) {
            Some(tree) if !tree.root_node().has_error() => tree,
            _ => {
                tracing::warn!(file = %file.display(), "file has syntax errors, skipping");
                continue;
            }
        };
        visit_nodes(tree.root_node(), &mut |node| {
            if node.kind() == node_kind && predicate(node, &source) {
                visit(&file, node, &source);
            }
        });
    }
    Ok(())
}

fn visit_nodes<'tree>(node: Node<'tree>, f: &mut impl FnMut(Node<'tree>)) {
    f(node);
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        visit_nodes(child, f);
    }
}
