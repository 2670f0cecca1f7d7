//! Addon manifest parsing.
//!
//! A manifest file's entire content is a single Python literal expression
//! that evaluates to a mapping with string keys. The original tooling ran
//! the file through an unrestricted evaluator; this module instead walks the
//! tree-sitter parse tree and accepts literals only (strings, numbers,
//! booleans, `None`, lists, tuples, dictionaries), so a manifest can never
//! execute code.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tree_sitter::Node;

use crate::error::AddonError;
use crate::scan::tree::python_parser;

/// A literal value from a manifest.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// String literal, escapes resolved.
    Str(String),
    /// Integer literal.
    Int(i64),
    /// Float literal.
    Float(f64),
    /// Boolean literal.
    Bool(bool),
    /// The `None` literal.
    None,
    /// List or tuple literal.
    List(Vec<Value>),
    /// Dictionary literal with string keys.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Returns the string content, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns the elements, if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Returns the entries, if this is a mapping.
    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

/// A parsed addon manifest.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    entries: BTreeMap<String, Value>,
}

impl Manifest {
    /// Reads and parses a manifest file.
    pub fn load(path: &Path) -> Result<Self, AddonError> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parses manifest text into a mapping of literal values.
    pub fn parse(text: &str) -> Result<Self, AddonError> {
        let entries = eval_manifest(text).map_err(AddonError::ManifestSyntax)?;
        Ok(Self { entries })
    }

    /// Looks up a top-level manifest key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Returns all top-level entries.
    #[must_use]
    pub fn entries(&self) -> &BTreeMap<String, Value> {
        &self.entries
    }
}

fn eval_manifest(text: &str) -> Result<BTreeMap<String, Value>, String> {
    let mut parser = python_parser().ok_or("python grammar unavailable")?;
    let tree = parser.parse(text, None).ok_or("manifest could not be parsed")?;
    let root = tree.root_node();
    if root.has_error() {
        return Err("manifest contains a syntax error".into());
    }

    let mut expression = None;
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        match child.kind() {
            "comment" => {}
            "expression_statement" if expression.is_none() => expression = Some(child),
            other => return Err(format!("unexpected top-level `{other}` statement")),
        }
    }
    let statement = expression.ok_or("manifest is empty")?;
    let inner = statement
        .named_child(0)
        .ok_or("manifest is empty")?;

    match eval_value(inner, text)? {
        Value::Map(entries) => Ok(entries),
        _ => Err("top-level expression is not a dictionary".into()),
    }
}

fn eval_value(node: Node<'_>, src: &str) -> Result<Value, String> {
    match node.kind() {
        "string" => Ok(Value::Str(eval_string(node, src)?)),
        "concatenated_string" => {
            let mut joined = String::new();
            let mut cursor = node.walk();
            for part in node.named_children(&mut cursor) {
                if part.kind() == "comment" {
                    continue;
                }
                joined.push_str(&eval_string(part, src)?);
            }
            Ok(Value::Str(joined))
        }
        "integer" => {
            let text = node_text(node, src)?.replace('_', "");
            text.parse::<i64>()
                .map(Value::Int)
                .map_err(|_| format!("unsupported integer literal `{text}`"))
        }
        "float" => {
            let text = node_text(node, src)?.replace('_', "");
            text.parse::<f64>()
                .map(Value::Float)
                .map_err(|_| format!("unsupported float literal `{text}`"))
        }
        "true" => Ok(Value::Bool(true)),
        "false" => Ok(Value::Bool(false)),
        "none" => Ok(Value::None),
        "unary_operator" => eval_negated(node, src),
        "parenthesized_expression" => {
            let inner = node
                .named_child(0)
                .ok_or("empty parenthesized expression")?;
            eval_value(inner, src)
        }
        "list" | "tuple" => {
            let mut items = Vec::new();
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                if child.kind() == "comment" {
                    continue;
                }
                items.push(eval_value(child, src)?);
            }
            Ok(Value::List(items))
        }
        "dictionary" => {
            let mut entries = BTreeMap::new();
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                match child.kind() {
                    "comment" => {}
                    "pair" => {
                        let key = child.child_by_field_name("key").ok_or("pair without key")?;
                        let value = child
                            .child_by_field_name("value")
                            .ok_or("pair without value")?;
                        let Value::Str(key) = eval_value(key, src)? else {
                            return Err("dictionary key is not a string".into());
                        };
                        entries.insert(key, eval_value(value, src)?);
                    }
                    other => return Err(format!("disallowed `{other}` in dictionary")),
                }
            }
            Ok(Value::Map(entries))
        }
        other => Err(format!("disallowed construct `{other}` in manifest")),
    }
}

fn eval_negated(node: Node<'_>, src: &str) -> Result<Value, String> {
    let text = node_text(node, src)?;
    let operand = node
        .child_by_field_name("argument")
        .ok_or("unary operator without operand")?;
    let negate = text.trim_start().starts_with('-');
    match eval_value(operand, src)? {
        Value::Int(n) => Ok(Value::Int(if negate { -n } else { n })),
        Value::Float(f) => Ok(Value::Float(if negate { -f } else { f })),
        _ => Err("unary operator on a non-numeric literal".into()),
    }
}

/// Strips quotes and prefixes from a string literal and resolves escapes.
fn eval_string(node: Node<'_>, src: &str) -> Result<String, String> {
    if node.kind() != "string" {
        return Err(format!("expected a string literal, found `{}`", node.kind()));
    }
    let raw = node_text(node, src)?;

    let mut rest = raw;
    let mut is_raw = false;
    loop {
        let Some(c) = rest.chars().next() else {
            return Err("empty string literal".into());
        };
        match c {
            'r' | 'R' => is_raw = true,
            'u' | 'U' => {}
            'b' | 'B' => return Err("bytes literal in manifest".into()),
            'f' | 'F' => return Err("formatted string in manifest".into()),
            '"' | '\'' => break,
            other => return Err(format!("unsupported string prefix `{other}`")),
        }
        rest = &rest[c.len_utf8()..];
    }

    let body = strip_quotes(rest).ok_or("unterminated string literal")?;
    if is_raw {
        Ok(body.to_string())
    } else {
        Ok(unescape(body))
    }
}

fn strip_quotes(quoted: &str) -> Option<&str> {
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if let Some(body) = quoted
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return Some(body);
        }
    }
    None
}

fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            // Backslash-newline is a line continuation.
            Some('\n') => {}
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Extracts the content of a plain string literal node, if it is one.
pub(crate) fn string_literal(node: Node<'_>, src: &str) -> Option<String> {
    eval_string(node, src).ok()
}

fn node_text<'a>(node: Node<'_>, src: &'a str) -> Result<&'a str, String> {
    node.utf8_text(src.as_bytes())
        .map_err(|err| format!("invalid UTF-8 in literal: {err}"))
}
