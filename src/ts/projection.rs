//! Projection of a tree-sitter CST into addressed view entries.
//!
//! A projection is rebuilt from scratch whenever its document changes;
//! nodes find their entry again by address, which only depends on names and
//! sibling positions.

use crate::pool::with_parser;
use crate::ts::errors::TreeSitterError;
use crate::ts::language::Language;
use crate::ts::parser::count_error_nodes;
use std::collections::{BTreeMap, HashMap};
use std::ops::Range;
use tracing::debug;
use tree_sitter::Node;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    /// Grammar node kind
    pub kind: String,
    pub tags: Vec<String>,
    /// Byte span in the document
    pub span: Range<usize>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub address: String,
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
pub struct Projection {
    entries: Vec<Entry>,
    by_address: HashMap<String, usize>,
}

impl Projection {
    /// Parse `source` and project it. Entry 0 is the view root, covering the
    /// whole document at `root_address`.
    pub fn build(
        language: Language,
        path: &str,
        root_address: &str,
        source: &str,
    ) -> Result<Self, TreeSitterError> {
        let tree = with_parser(language, |parser| parser.parse(path, source))??;
        let root = tree.root_node();

        let mut builder = Builder {
            source,
            language,
            projection: Projection::default(),
        };
        builder.push_root(root_address, root.kind(), source.len());
        match language {
            Language::Yaml => builder.yaml_stream(root),
            _ => builder.generic(root, 0),
        }

        let errors = count_error_nodes(root);
        debug!(
            path,
            %language,
            entries = builder.projection.entries.len(),
            errors,
            "projected syntax tree"
        );
        Ok(builder.projection)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    pub fn index_of(&self, address: &str) -> Option<usize> {
        self.by_address.get(address).copied()
    }

    /// Entry covering exactly `span`, preferring one of the given kind.
    pub fn find_by_span(&self, span: &Range<usize>, kind: &str) -> Option<usize> {
        let mut fallback = None;
        for (index, entry) in self.entries.iter().enumerate().skip(1) {
            if entry.span != *span {
                continue;
            }
            if entry.kind == kind {
                return Some(index);
            }
            fallback.get_or_insert(index);
        }
        fallback
    }
}

struct Builder<'s> {
    source: &'s str,
    language: Language,
    projection: Projection,
}

impl Builder<'_> {
    fn push_root(&mut self, address: &str, kind: &str, len: usize) {
        self.projection.entries.push(Entry {
            name: self.language.view_type_name().to_string(),
            kind: kind.to_string(),
            tags: vec![
                self.language.view_type_name().to_string(),
                self.language.node_tag().to_string(),
            ],
            span: 0..len,
            parent: None,
            children: Vec::new(),
            address: address.to_string(),
            properties: BTreeMap::new(),
        });
        self.projection.by_address.insert(address.to_string(), 0);
    }

    fn push(
        &mut self,
        parent: usize,
        name: String,
        kind: &str,
        tags: Vec<String>,
        span: Range<usize>,
        properties: BTreeMap<String, String>,
    ) -> usize {
        let entries = &self.projection.entries;
        let same_named = entries[parent]
            .children
            .iter()
            .filter(|&&sibling| entries[sibling].name == name)
            .count();
        let mut address = format!("{}/{}", entries[parent].address, escape_segment(&name));
        if same_named > 0 {
            address.push_str(&format!("[{same_named}]"));
        }

        let index = entries.len();
        self.projection.entries.push(Entry {
            name,
            kind: kind.to_string(),
            tags,
            span,
            parent: Some(parent),
            children: Vec::new(),
            address: address.clone(),
            properties,
        });
        self.projection.entries[parent].children.push(index);
        let previous = self.projection.by_address.insert(address, index);
        debug_assert!(previous.is_none(), "address assigned twice");
        index
    }

    fn text(&self, node: Node<'_>) -> &str {
        self.source.get(node.byte_range()).unwrap_or_default()
    }

    /// Every named node, named by its kind.
    fn generic(&mut self, node: Node<'_>, parent: usize) {
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
        for child in children {
            let kind = child.kind();
            let mut properties = BTreeMap::new();
            if let Some(name) = child.child_by_field_name("name") {
                properties.insert("identifier".to_string(), self.text(name).to_string());
            }
            let tags = vec![self.language.node_tag().to_string(), kind.to_string()];
            let index = self.push(
                parent,
                kind.to_string(),
                kind,
                tags,
                child.byte_range(),
                properties,
            );
            self.generic(child, index);
        }
    }

    fn yaml_stream(&mut self, stream: Node<'_>) {
        let mut cursor = stream.walk();
        let documents: Vec<Node<'_>> = stream
            .named_children(&mut cursor)
            .filter(|n| n.kind() == "document")
            .collect();
        for document in documents {
            let mut cursor = document.walk();
            let contents: Vec<Node<'_>> = document
                .named_children(&mut cursor)
                .filter(|n| !is_yaml_decoration(n.kind()))
                .collect();
            for content in contents {
                self.yaml_members(content, 0);
            }
        }
    }

    /// Pairs of a mapping, or items of a sequence, as children of `parent`.
    fn yaml_members(&mut self, node: Node<'_>, parent: usize) {
        let Some(inner) = yaml_content(node) else {
            return;
        };
        let mut cursor = inner.walk();
        let members: Vec<Node<'_>> = inner.named_children(&mut cursor).collect();
        match yaml_shape(inner.kind()) {
            YamlShape::Map => {
                for pair in members
                    .into_iter()
                    .filter(|n| matches!(n.kind(), "block_mapping_pair" | "flow_pair"))
                {
                    self.yaml_pair(pair, parent);
                }
            }
            YamlShape::Sequence => {
                for item in members {
                    let value = match item.kind() {
                        "block_sequence_item" => first_content_child(item),
                        "flow_node" | "block_node" => Some(item),
                        _ => None,
                    };
                    if let Some(value) = value {
                        self.yaml_value("item".to_string(), value, None, item.byte_range(), parent);
                    }
                }
            }
            YamlShape::Scalar => {}
        }
    }

    fn yaml_pair(&mut self, pair: Node<'_>, parent: usize) {
        let (key, value) = match (
            pair.child_by_field_name("key"),
            pair.child_by_field_name("value"),
        ) {
            (None, None) => {
                let mut cursor = pair.walk();
                let mut named = pair
                    .named_children(&mut cursor)
                    .filter(|n| !is_yaml_decoration(n.kind()));
                (named.next(), named.next())
            }
            fields => fields,
        };

        let key_text = key
            .and_then(yaml_content)
            .map(|k| unquote(k.kind(), self.text(k)))
            .unwrap_or_default();

        match value {
            Some(value) => {
                self.yaml_value(key_text.clone(), value, Some(key_text), pair.byte_range(), parent)
            }
            None => {
                let mut properties = BTreeMap::new();
                properties.insert("key".to_string(), key_text.clone());
                let tags = yaml_tags(None, true);
                self.push(
                    parent,
                    key_text,
                    pair.kind(),
                    tags,
                    pair.byte_range(),
                    properties,
                );
            }
        }
    }

    /// A value node named `name`. Scalars span just the scalar text; maps
    /// and sequences span their content and get their members as children.
    fn yaml_value(
        &mut self,
        name: String,
        node: Node<'_>,
        key: Option<String>,
        fallback_span: Range<usize>,
        parent: usize,
    ) {
        let inner = yaml_content(node);
        let shape = inner.map(|n| yaml_shape(n.kind())).unwrap_or(YamlShape::Scalar);
        let kind = inner.map(|n| n.kind()).unwrap_or_else(|| node.kind());
        let span = inner.map(|n| n.byte_range()).unwrap_or(fallback_span);

        let mut properties = BTreeMap::new();
        if let Some(key) = &key {
            properties.insert("key".to_string(), key.clone());
        }
        if let (YamlShape::Scalar, Some(scalar)) = (shape, inner) {
            properties.insert("value".to_string(), unquote(kind, self.text(scalar)));
        }

        let tags = yaml_tags(Some(shape), key.is_some());
        let index = self.push(parent, name, kind, tags, span, properties);
        if shape != YamlShape::Scalar {
            self.yaml_members(node, index);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum YamlShape {
    Map,
    Sequence,
    Scalar,
}

fn yaml_shape(kind: &str) -> YamlShape {
    match kind {
        "block_mapping" | "flow_mapping" => YamlShape::Map,
        "block_sequence" | "flow_sequence" => YamlShape::Sequence,
        _ => YamlShape::Scalar,
    }
}

fn yaml_tags(shape: Option<YamlShape>, is_pair: bool) -> Vec<String> {
    let mut tags = Vec::new();
    match shape {
        Some(YamlShape::Map) => tags.push("YamlMap"),
        Some(YamlShape::Sequence) => tags.push("YamlSequence"),
        Some(YamlShape::Scalar) => tags.push("YamlString"),
        None => {}
    }
    if is_pair {
        tags.push("YamlKeyValue");
    }
    tags.push("YamlNode");
    tags.into_iter().map(str::to_string).collect()
}

fn is_yaml_decoration(kind: &str) -> bool {
    matches!(kind, "comment" | "anchor" | "tag")
}

fn first_content_child(node: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .find(|n| !is_yaml_decoration(n.kind()));
    found
}

/// Unwrap `block_node`/`flow_node` wrappers down to the node carrying content.
fn yaml_content(node: Node<'_>) -> Option<Node<'_>> {
    let mut current = node;
    while matches!(current.kind(), "block_node" | "flow_node") {
        current = first_content_child(current)?;
    }
    Some(current)
}

/// Scalar value without quoting.
fn unquote(kind: &str, text: &str) -> String {
    match kind {
        "double_quote_scalar" => {
            let inner = text
                .strip_prefix('"')
                .and_then(|t| t.strip_suffix('"'))
                .unwrap_or(text);
            let mut out = String::with_capacity(inner.len());
            let mut chars = inner.chars();
            while let Some(c) = chars.next() {
                if c != '\\' {
                    out.push(c);
                    continue;
                }
                match chars.next() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(other) => out.push(other),
                    None => out.push('\\'),
                }
            }
            out
        }
        "single_quote_scalar" => text
            .strip_prefix('\'')
            .and_then(|t| t.strip_suffix('\''))
            .unwrap_or(text)
            .replace("''", "'"),
        _ => text.trim().to_string(),
    }
}

/// Names become address segments. `/` separates segments and a trailing
/// `[k]` marks a repeated sibling, so neither may appear literally.
fn escape_segment(name: &str) -> String {
    name.replace('%', "%25")
        .replace('/', "%2F")
        .replace('[', "%5B")
        .replace(']', "%5D")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(projection: &Projection, index: usize) -> Vec<String> {
        projection.entries()[index]
            .children
            .iter()
            .map(|&c| projection.entries()[c].name.clone())
            .collect()
    }

    #[test]
    fn yaml_pairs_are_named_by_key() {
        let source = "group:\n  value: queen\n  other: 'it''s'\nlist:\n  - a\n  - b\n";
        let projection = Projection::build(Language::Yaml, "x.yml", "/x.yml/YamlFile()", source)
            .unwrap();
        assert_eq!(names(&projection, 0), vec!["group", "list"]);

        let value = projection
            .index_of("/x.yml/YamlFile()/group/value")
            .unwrap();
        let entry = &projection.entries()[value];
        assert_eq!(&source[entry.span.clone()], "queen");
        assert!(entry.tags.contains(&"YamlString".to_string()));
        assert_eq!(entry.properties.get("value").map(String::as_str), Some("queen"));

        let other = projection
            .index_of("/x.yml/YamlFile()/group/other")
            .unwrap();
        assert_eq!(
            projection.entries()[other].properties.get("value").map(String::as_str),
            Some("it's")
        );

        assert!(projection.index_of("/x.yml/YamlFile()/list/item[1]").is_some());
    }

    #[test]
    fn generic_projection_uses_kinds_and_identifiers() {
        let source = "fn helper() {}\nfn main() { helper(); }\n";
        let projection =
            Projection::build(Language::Rust, "main.rs", "/main.rs/RustFile()", source).unwrap();
        assert_eq!(names(&projection, 0), vec!["function_item", "function_item"]);
        let main = projection
            .index_of("/main.rs/RustFile()/function_item[1]")
            .unwrap();
        assert_eq!(
            projection.entries()[main].properties.get("identifier").map(String::as_str),
            Some("main")
        );
    }

    #[test]
    fn find_by_span_prefers_kind() {
        let source = "fn main() {}";
        let projection =
            Projection::build(Language::Rust, "main.rs", "/main.rs/RustFile()", source).unwrap();
        let index = projection.find_by_span(&(0..12), "function_item").unwrap();
        assert_eq!(projection.entries()[index].kind, "function_item");
    }

    #[test]
    fn segments_are_escaped() {
        assert_eq!(escape_segment("a/b"), "a%2Fb");
        assert_eq!(escape_segment("a[1]"), "a%5B1%5D");
    }

    #[test]
    fn literal_index_key_does_not_collide_with_repeated_key() {
        let source = "a: 1\na: 2\n\"a[1]\": 3\n";
        let projection =
            Projection::build(Language::Yaml, "d.yml", "/d.yml/YamlFile()", source).unwrap();
        let addresses: Vec<&str> = projection.entries()[0]
            .children
            .iter()
            .map(|&c| projection.entries()[c].address.as_str())
            .collect();
        assert_eq!(
            addresses,
            vec![
                "/d.yml/YamlFile()/a",
                "/d.yml/YamlFile()/a[1]",
                "/d.yml/YamlFile()/a%5B1%5D",
            ]
        );

        let second = projection.index_of("/d.yml/YamlFile()/a[1]").unwrap();
        let entry = &projection.entries()[second];
        assert_eq!(entry.name, "a");
        assert_eq!(entry.properties.get("value").map(String::as_str), Some("2"));
    }
}
