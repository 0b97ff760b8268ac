use std::path::Path;

use crate::error::{ParserError, Result};

/// Thin wrapper around a tree-sitter parser configured for PHP.
pub struct Parser {
    language: tree_sitter::Language,
}

impl Parser {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_php::LANGUAGE_PHP.into(),
        }
    }

    pub fn parse_file(&self, path: &Path) -> Result<ParsedFile> {
        let bytes = std::fs::read(path)?;
        let source = String::from_utf8(bytes)
            .map_err(|e| ParserError::Parse(format!("{} is not valid UTF-8: {}", path.display(), e)))?;
        self.parse_source(&source)
    }

    pub fn parse_source(&self, source: &str) -> Result<ParsedFile> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| ParserError::Parse(e.to_string()))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| ParserError::Parse("Failed to parse source".to_string()))?;

        Ok(ParsedFile {
            tree,
            source: source.to_string(),
        })
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct ParsedFile {
    pub tree: tree_sitter::Tree,
    pub source: String,
}

impl ParsedFile {
    pub fn root_node(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    pub fn source_bytes(&self) -> &[u8] {
        self.source.as_bytes()
    }

    pub fn node_text(&self, node: &tree_sitter::Node) -> &str {
        node.utf8_text(self.source_bytes()).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_source_php() {
        let source = "<?php\nfunction hello() { return 1; }\n";
        let parsed = Parser::new().parse_source(source).unwrap();

        assert_eq!(parsed.root_node().kind(), "program");
        assert!(parsed.root_node().child_count() > 0);
    }

    #[test]
    fn test_parse_source_empty() {
        let parsed = Parser::new().parse_source("").unwrap();
        assert_eq!(parsed.source, "");
    }

    #[test]
    fn test_parsed_file_node_text() {
        let source = "<?php echo 1;";
        let parsed = Parser::new().parse_source(source).unwrap();

        let root = parsed.root_node();
        assert_eq!(parsed.node_text(&root), source);
        assert_eq!(parsed.source_bytes(), source.as_bytes());
    }

    #[test]
    fn test_parse_file_rejects_invalid_utf8() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("latin1.php");
        fs::write(&path, [b'<', b'?', b'p', b'h', b'p', b' ', 0xe9]).unwrap();

        let err = Parser::new().parse_file(&path).unwrap_err();
        assert!(matches!(err, ParserError::Parse(_)));
        assert!(err.to_string().contains("latin1.php"));
    }

    #[test]
    fn test_parse_file_missing() {
        let temp_dir = TempDir::new().unwrap();
        let err = Parser::new()
            .parse_file(&temp_dir.path().join("missing.php"))
            .unwrap_err();
        assert!(matches!(err, ParserError::Io(_)));
    }
}
