use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use tree_sitter::Node;

use crate::document::{DocBlock, Document, Entity, EntityKind, FileRecord, HookType};
use crate::error::{ParserError, Result};
use crate::indexer::docblock::{is_docblock, parse_docblock};
use crate::indexer::parser::{ParsedFile, Parser};

/// Produces a structured document from a set of source files.
pub trait Extractor {
    /// `files` are absolute paths; record paths are reported relative to `base`.
    fn extract(&self, files: &[PathBuf], base: &Path) -> Result<Document>;
}

/// Extracts PHPDoc-documented declarations and hooks using tree-sitter-php.
pub struct PhpDocExtractor {
    parser: Parser,
}

impl PhpDocExtractor {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }

    /// Extracts a single file's record from source text.
    pub fn extract_source(&self, source: &str, record_path: &str) -> Result<FileRecord> {
        let parsed = self.parser.parse_source(source)?;
        Ok(extract_record(&parsed, record_path))
    }
}

impl Default for PhpDocExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for PhpDocExtractor {
    fn extract(&self, files: &[PathBuf], base: &Path) -> Result<Document> {
        let mut records = Vec::with_capacity(files.len());

        for file in files {
            let parsed = self
                .parser
                .parse_file(file)
                .map_err(|e| ParserError::ExtractionFailed {
                    path: file.clone(),
                    message: e.to_string(),
                })?;

            let record = extract_record(&parsed, &relative_path(file, base));
            debug!(
                "Extracted {} entities from {}",
                record.entities.len(),
                record.path
            );
            records.push(record);
        }

        Ok(Document::new(records))
    }
}

/// Formats `file` relative to `base` with `/` separators.
pub fn relative_path(file: &Path, base: &Path) -> String {
    match file.strip_prefix(base) {
        Ok(rel) => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => file.to_string_lossy().to_string(),
    }
}

fn extract_record(parsed: &ParsedFile, record_path: &str) -> FileRecord {
    let mut visitor = Visitor {
        parsed,
        path: record_path,
        entities: Vec::new(),
        seen: HashSet::new(),
        consumed_comments: HashSet::new(),
    };

    let mut namespace = None;
    visitor.visit_children(parsed.root_node(), &mut namespace, None);

    let file_doc = visitor.file_docblock();

    FileRecord {
        path: record_path.to_string(),
        doc: file_doc,
        entities: visitor.entities,
    }
}

struct Visitor<'a> {
    parsed: &'a ParsedFile,
    path: &'a str,
    entities: Vec<Entity>,
    /// Qualified names already emitted for this file
    seen: HashSet<String>,
    /// Docblock comments attached to an entity
    consumed_comments: HashSet<usize>,
}

impl<'a> Visitor<'a> {
    fn visit_children(&mut self, node: Node, namespace: &mut Option<String>, class: Option<&str>) {
        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        for child in children {
            self.visit_node(child, namespace, class);
        }
    }

    fn visit_node(&mut self, node: Node, namespace: &mut Option<String>, class: Option<&str>) {
        match node.kind() {
            "namespace_definition" => {
                let name = node
                    .child_by_field_name("name")
                    .map(|n| self.text(&n).to_string());
                match node.child_by_field_name("body") {
                    Some(body) => {
                        let mut scoped = name;
                        self.visit_children(body, &mut scoped, None);
                    }
                    // `namespace Foo;` applies to the rest of the file
                    None => *namespace = name,
                }
            }
            "class_declaration" | "interface_declaration" | "trait_declaration"
            | "enum_declaration" => {
                let Some(name) = self.field_text(&node, "name") else {
                    return;
                };
                let keyword = match node.kind() {
                    "interface_declaration" => "interface",
                    "trait_declaration" => "trait",
                    "enum_declaration" => "enum",
                    _ => "class",
                };
                let entity = Entity::new(EntityKind::Class, &name, start_line(&node), end_line(&node))
                    .with_namespace(namespace.clone())
                    .with_signature(format!("{} {}", keyword, name));
                self.emit(entity, &node);

                if let Some(body) = node.child_by_field_name("body") {
                    let mut class_namespace = namespace.clone();
                    self.visit_children(body, &mut class_namespace, Some(name.as_str()));
                }
            }
            // Members of an anonymous class have no class to qualify them
            "anonymous_class" => self.visit_children(node, namespace, None),
            "method_declaration" => {
                if let (Some(class), Some(name)) = (class, self.field_text(&node, "name")) {
                    let entity =
                        Entity::new(EntityKind::Method, &name, start_line(&node), end_line(&node))
                            .with_namespace(namespace.clone())
                            .with_parent(class)
                            .with_signature(self.method_signature(&node, &name));
                    self.emit(entity, &node);
                }
                self.visit_body(&node, namespace);
            }
            "function_definition" => {
                let Some(name) = self.field_text(&node, "name") else {
                    return;
                };
                let entity =
                    Entity::new(EntityKind::Function, &name, start_line(&node), end_line(&node))
                        .with_namespace(namespace.clone())
                        .with_signature(self.function_signature(&node, &name));
                self.emit(entity, &node);
                self.visit_body(&node, namespace);
            }
            "function_call_expression" => {
                if let Some(entity) = self.hook(&node) {
                    let anchor = statement_of(node);
                    self.emit(entity, &anchor);
                }
                self.visit_children(node, namespace, class);
            }
            _ => self.visit_children(node, namespace, class),
        }
    }

    /// Descends into a function or method body looking for hooks.
    fn visit_body(&mut self, node: &Node, namespace: &Option<String>) {
        if let Some(body) = node.child_by_field_name("body") {
            let mut inner = namespace.clone();
            self.visit_children(body, &mut inner, None);
        }
    }

    /// Records `entity` unless its qualified name is already taken in this file.
    fn emit(&mut self, entity: Entity, anchor: &Node) {
        let qualified = entity.qualified_name();
        if self.seen.contains(&qualified) {
            if entity.kind == EntityKind::Hook {
                debug!("Hook {} fired again at {}:{}", qualified, self.path, entity.line);
            } else {
                warn!(
                    "Duplicate declaration of {} at {}:{}, keeping the first",
                    qualified, self.path, entity.line
                );
            }
            return;
        }
        self.seen.insert(qualified);
        let doc = self.docblock_for(anchor).unwrap_or_default();
        self.entities.push(entity.with_doc(doc));
    }

    fn hook(&self, node: &Node) -> Option<Entity> {
        let function = node.child_by_field_name("function")?;
        let hook_type = HookType::from_function(self.text(&function).trim_start_matches('\\'))?;

        let arguments = node.child_by_field_name("arguments")?;
        let mut cursor = arguments.walk();
        let first = arguments
            .named_children(&mut cursor)
            .find(|n| n.kind() == "argument")?;

        let mut cursor = first.walk();
        let value = first.named_children(&mut cursor).find(|n| n.kind() != "name")?;
        let Some(name) = string_literal(value.kind(), self.text(&value)) else {
            debug!(
                "Skipping hook with a computed name at {}:{}",
                self.path,
                start_line(node)
            );
            return None;
        };

        Some(
            Entity::new(EntityKind::Hook, name, start_line(node), end_line(node))
                .with_hook_type(hook_type),
        )
    }

    fn docblock_for(&mut self, node: &Node) -> Option<DocBlock> {
        let prev = node.prev_named_sibling()?;
        if prev.kind() != "comment" {
            return None;
        }
        let text = self.text(&prev);
        if !is_docblock(text) {
            return None;
        }
        let doc = parse_docblock(text);
        self.consumed_comments.insert(prev.id());
        Some(doc)
    }

    /// First top-level docblock that does not document a declaration.
    fn file_docblock(&self) -> Option<DocBlock> {
        let root = self.parsed.root_node();
        let mut cursor = root.walk();
        let comment = root
            .named_children(&mut cursor)
            .filter(|n| n.kind() == "comment")
            .find(|n| !self.consumed_comments.contains(&n.id()) && is_docblock(self.text(n)))?;
        Some(parse_docblock(self.text(&comment)))
    }

    fn function_signature(&self, node: &Node, name: &str) -> String {
        let params = self
            .field_text(node, "parameters")
            .unwrap_or_else(|| "()".to_string());
        match self.field_text(node, "return_type") {
            Some(ret) => format!("{}{}: {}", name, params, ret),
            None => format!("{}{}", name, params),
        }
    }

    fn method_signature(&self, node: &Node, name: &str) -> String {
        let mut modifiers = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "visibility_modifier" | "static_modifier" | "abstract_modifier"
                | "final_modifier" | "readonly_modifier" => {
                    modifiers.push(self.text(&child).to_string())
                }
                _ => {}
            }
        }

        let signature = format!("function {}", self.function_signature(node, name));
        if modifiers.is_empty() {
            signature
        } else {
            format!("{} {}", modifiers.join(" "), signature)
        }
    }

    fn field_text(&self, node: &Node, field: &str) -> Option<String> {
        node.child_by_field_name(field)
            .map(|n| self.text(&n).to_string())
    }

    fn text(&self, node: &Node) -> &'a str {
        self.parsed.node_text(node)
    }
}

/// Climbs from a call to the statement that contains it.
fn statement_of(node: Node) -> Node {
    let mut current = node;
    while !current.kind().ends_with("_statement") {
        match current.parent() {
            Some(parent) if parent.kind() != "compound_statement" && parent.kind() != "program" => {
                current = parent
            }
            _ => break,
        }
    }
    current
}

/// Value of a quoted string node, or `None` for any other expression.
///
/// Interpolations in double-quoted strings are kept as written.
fn string_literal(kind: &str, text: &str) -> Option<String> {
    let (quote, escapes): (char, &[char]) = match kind {
        "string" => ('\'', &['\'', '\\'][..]),
        "encapsed_string" => ('"', &['"', '\\', '$'][..]),
        _ => return None,
    };
    let inner = text.strip_prefix(quote)?.strip_suffix(quote)?;
    Some(unescape(inner, escapes))
}

/// Resolves backslash escapes of `escapes`; other backslashes stay literal.
fn unescape(text: &str, escapes: &[char]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(next) if escapes.contains(&next) => out.push(next),
            Some(next) => {
                out.push('\\');
                out.push(next);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn start_line(node: &Node) -> u32 {
    node.start_position().row as u32 + 1
}

fn end_line(node: &Node) -> u32 {
    node.end_position().row as u32 + 1
}
