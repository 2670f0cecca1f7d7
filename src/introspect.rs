//! Static introspection of an addon's source tree.
//!
//! Derives the models, records, and fields an addon declares by scanning its
//! sources. Nothing here is cached: every query re-walks the directory tree
//! and re-parses files, so results always reflect the tree as it is now.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use tree_sitter::Node;

use crate::addon::Addon;
use crate::error::AddonError;
use crate::manifest::string_literal;
use crate::scan::{scan_lines, scan_tree};

static MODEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*_name\s*=\s*["']([a-z][\w.]*)["']"#).expect("valid pattern")
});

static INHERIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*_inherit\s*=\s*["']([a-z][\w.]*)["']"#).expect("valid pattern")
});

static RECORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"id\s*=\s*["']([^"]*)["']"#).expect("valid pattern"));

/// One field declared by a class in the addon's sources.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FieldDecl {
    /// File the declaring class lives in.
    pub file: PathBuf,
    /// Model the class maps to, when a `_name` or `_inherit` string
    /// assignment resolves one.
    pub model: Option<String>,
    /// Field name, a key of the class's columns dictionary.
    pub field: String,
}

impl Addon {
    /// Model identifiers this addon declares and inherits, as
    /// `(declared − inherited, inherited)`.
    ///
    /// An identifier appearing both as `_name` and `_inherit` somewhere in
    /// the tree counts as purely inherited.
    pub fn models(&self) -> Result<(BTreeSet<String>, BTreeSet<String>), AddonError> {
        let results = scan_lines(
            self.source_dir(),
            |name| name.ends_with(".py"),
            &[("model", &MODEL_RE), ("inherit", &INHERIT_RE)],
        )?;

        let mut declared = BTreeSet::new();
        let mut inherited = BTreeSet::new();
        for result in results {
            if result.pattern == "model" {
                declared.extend(result.matches);
            } else {
                inherited.extend(result.matches);
            }
        }
        let declared = declared.difference(&inherited).cloned().collect();
        Ok((declared, inherited))
    }

    /// Distinct `id="..."` values declared in the addon's XML files.
    pub fn record_ids(&self) -> Result<BTreeSet<String>, AddonError> {
        let results = scan_lines(
            self.source_dir(),
            |name| name.ends_with(".xml"),
            &[("record", &RECORD_RE)],
        )?;
        Ok(results.into_iter().flat_map(|r| r.matches).collect())
    }

    /// Every XML file declaring a record with the given id. An id may
    /// legitimately appear in more than one file.
    pub fn record_locations(&self, entity: &str) -> Result<Vec<PathBuf>, AddonError> {
        let results = scan_lines(
            self.source_dir(),
            |name| name.ends_with(".xml"),
            &[("record", &RECORD_RE)],
        )?;
        Ok(results
            .into_iter()
            .filter(|r| r.matches.iter().any(|id| id == entity))
            .map(|r| r.file)
            .collect())
    }

    /// Fields declared by classes in the addon's Python sources.
    ///
    /// A class contributes when its direct body assigns a dictionary to
    /// `_columns`; each dictionary key becomes one [`FieldDecl`]. The model
    /// identifier comes from a string assignment to `_name`, falling back to
    /// `_inherit`; a class with columns but no resolvable model still emits
    /// declarations with `model = None`.
    pub fn fields(&self) -> Result<BTreeSet<FieldDecl>, AddonError> {
        let mut fields = BTreeSet::new();
        scan_tree(
            self.source_dir(),
            |name| name.ends_with(".py"),
            "class_definition",
            |class, src| !column_names(class, src).is_empty(),
            |file, class, src| {
                let model = model_identifier(class, src);
                for field in column_names(class, src) {
                    fields.insert(FieldDecl {
                        file: file.to_path_buf(),
                        model: model.clone(),
                        field,
                    });
                }
            },
        )?;
        Ok(fields)
    }
}

/// Direct `target = value` assignments in a class body.
fn body_assignments<'t>(class: Node<'t>, assignments: &mut Vec<(Node<'t>, Node<'t>)>) {
    let Some(body) = class.child_by_field_name("body") else {
        return;
    };
    let mut cursor = body.walk();
    for statement in body.named_children(&mut cursor) {
        if statement.kind() != "expression_statement" {
            continue;
        }
        let Some(assignment) = statement.named_child(0) else {
            continue;
        };
        if assignment.kind() != "assignment" {
            continue;
        }
        if let (Some(left), Some(right)) = (
            assignment.child_by_field_name("left"),
            assignment.child_by_field_name("right"),
        ) {
            assignments.push((left, right));
        }
    }
}

/// Model identifier of a class, from its `_name` or `_inherit` assignment.
///
/// `_name` wins over `_inherit`; a later assignment to the same attribute
/// overrides an earlier one; a non-string `_name` resolves to nothing even
/// when a string `_inherit` is present.
fn model_identifier(class: Node<'_>, src: &str) -> Option<String> {
    let mut assignments = Vec::new();
    body_assignments(class, &mut assignments);

    let mut name: Option<Option<String>> = None;
    let mut inherit: Option<Option<String>> = None;
    for (left, right) in assignments {
        if left.kind() != "identifier" {
            continue;
        }
        match left.utf8_text(src.as_bytes()).unwrap_or_default() {
            "_name" => name = Some(string_literal(right, src)),
            "_inherit" => inherit = Some(string_literal(right, src)),
            _ => {}
        }
    }
    name.or(inherit).flatten()
}

/// String keys of a class's `_columns` dictionary assignment.
fn column_names(class: Node<'_>, src: &str) -> Vec<String> {
    let mut assignments = Vec::new();
    body_assignments(class, &mut assignments);

    let mut names = Vec::new();
    for (left, right) in assignments {
        if left.kind() != "identifier"
            || left.utf8_text(src.as_bytes()).unwrap_or_default() != "_columns"
            || right.kind() != "dictionary"
        {
            continue;
        }
        let mut cursor = right.walk();
        for pair in right.named_children(&mut cursor) {
            if pair.kind() != "pair" {
                continue;
            }
            if let Some(key) = pair
                .child_by_field_name("key")
                .and_then(|key| string_literal(key, src))
            {
                names.push(key);
            }
        }
    }
    names
}
