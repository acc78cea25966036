//! Microgrammars: dynamic types located by a small grammar over node text.
//!
//! ```text
//! <artifactId>$artifact</artifactId>
//! def $name($params)
//! ```
//!
//! Literal text matches literally, `$binding` captures a sub-match, and a run
//! of whitespace matches any whitespace (at least one character between two
//! words, otherwise optional). The grammar is compiled to a regex once.

use crate::edit::{EditError, EditResult, TextEdit};
use crate::tree::{
    Addressed, FormatInfo, GraphNode, NodeError, NodeRef, ParentAwareTreeNode, TextTreeNode,
    TreeNode,
};
use crate::types::errors::MicrogrammarError;
use crate::types::TypeProvider;
use regex::Regex;
use std::any::Any;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::ops::Range;
use std::rc::{Rc, Weak};
use tracing::debug;

const DEFAULT_SUBMATCHER: &str = r"[A-Za-z0-9_.\-]+";

#[derive(Debug, Clone)]
pub struct Microgrammar {
    name: String,
    grammar: String,
    submatchers: BTreeMap<String, String>,
    bindings: Vec<String>,
    regex: Regex,
    anchored: Regex,
}

/// One occurrence of a microgrammar in a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MicroMatch {
    pub span: Range<usize>,
    pub text: String,
    /// Binding name and span, relative to `text`. Bindings that did not
    /// participate are absent.
    pub captures: Vec<(String, Range<usize>)>,
}

enum Token {
    Literal(String),
    Space,
    Binding(String),
}

impl Microgrammar {
    pub fn new<I, K, V>(
        name: impl Into<String>,
        grammar: impl Into<String>,
        submatchers: I,
    ) -> Result<Self, MicrogrammarError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let name = name.into();
        let grammar = grammar.into();
        let submatchers: BTreeMap<String, String> = submatchers
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let tokens = tokenize(&name, grammar.trim())?;
        if tokens.is_empty() {
            return Err(MicrogrammarError::EmptyGrammar { name });
        }

        let mut bindings = Vec::new();
        let mut pattern = String::new();
        for (i, token) in tokens.iter().enumerate() {
            match token {
                Token::Literal(text) => pattern.push_str(&regex::escape(text)),
                Token::Binding(binding) => {
                    if bindings.contains(binding) {
                        return Err(MicrogrammarError::DuplicateBinding {
                            name,
                            binding: binding.clone(),
                        });
                    }
                    let sub = submatchers
                        .get(binding)
                        .map(String::as_str)
                        .unwrap_or(DEFAULT_SUBMATCHER);
                    pattern.push_str(&format!("(?P<{binding}>(?:{sub}))"));
                    bindings.push(binding.clone());
                }
                Token::Space => {
                    let before = i.checked_sub(1).and_then(|j| tokens.get(j));
                    let after = tokens.get(i + 1);
                    if ends_in_word(before) && starts_with_word(after) {
                        pattern.push_str(r"\s+");
                    } else {
                        pattern.push_str(r"\s*");
                    }
                }
            }
        }

        let invalid = |e: regex::Error| MicrogrammarError::InvalidPattern {
            name: name.clone(),
            message: e.to_string(),
        };
        let regex = Regex::new(&pattern).map_err(invalid)?;
        let anchored = Regex::new(&format!("^(?:{pattern})$")).map_err(invalid)?;

        Ok(Self {
            name,
            grammar,
            submatchers,
            bindings,
            regex,
            anchored,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn grammar(&self) -> &str {
        &self.grammar
    }

    pub fn submatchers(&self) -> &BTreeMap<String, String> {
        &self.submatchers
    }

    /// Binding names in grammar order.
    pub fn bindings(&self) -> &[String] {
        &self.bindings
    }

    /// Non-overlapping occurrences in `text`, leftmost first.
    pub fn scan(&self, text: &str) -> Vec<MicroMatch> {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                Some(MicroMatch {
                    span: whole.range(),
                    text: whole.as_str().to_string(),
                    captures: self.captures_relative_to(&caps, whole.start()),
                })
            })
            .collect()
    }

    /// Captures when `text` as a whole is one occurrence of the grammar.
    pub fn parse_exact(&self, text: &str) -> Option<Vec<(String, Range<usize>)>> {
        let caps = self.anchored.captures(text)?;
        Some(self.captures_relative_to(&caps, 0))
    }

    fn captures_relative_to(
        &self,
        caps: &regex::Captures<'_>,
        base: usize,
    ) -> Vec<(String, Range<usize>)> {
        self.bindings
            .iter()
            .filter_map(|binding| {
                let m = caps.name(binding)?;
                Some((binding.clone(), m.start() - base..m.end() - base))
            })
            .collect()
    }
}

fn tokenize(name: &str, grammar: &str) -> Result<Vec<Token>, MicrogrammarError> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = grammar.char_indices().peekable();

    while let Some((offset, ch)) = chars.next() {
        if ch.is_whitespace() {
            while chars.peek().is_some_and(|(_, c)| c.is_whitespace()) {
                chars.next();
            }
            flush(&mut literal, &mut tokens);
            tokens.push(Token::Space);
        } else if ch == '$' {
            let mut binding = String::new();
            while let Some(&(_, c)) = chars.peek() {
                let valid = if binding.is_empty() {
                    c.is_ascii_alphabetic() || c == '_'
                } else {
                    c.is_ascii_alphanumeric() || c == '_'
                };
                if !valid {
                    break;
                }
                binding.push(c);
                chars.next();
            }
            if binding.is_empty() {
                return Err(MicrogrammarError::DanglingBinding {
                    name: name.to_string(),
                    offset,
                });
            }
            flush(&mut literal, &mut tokens);
            tokens.push(Token::Binding(binding));
        } else {
            literal.push(ch);
        }
    }
    flush(&mut literal, &mut tokens);
    Ok(tokens)
}

fn flush(literal: &mut String, tokens: &mut Vec<Token>) {
    if !literal.is_empty() {
        tokens.push(Token::Literal(std::mem::take(literal)));
    }
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn ends_in_word(token: Option<&Token>) -> bool {
    match token {
        Some(Token::Literal(text)) => text.chars().last().is_some_and(is_word),
        Some(Token::Binding(_)) => true,
        _ => false,
    }
}

fn starts_with_word(token: Option<&Token>) -> bool {
    match token {
        Some(Token::Literal(text)) => text.chars().next().is_some_and(is_word),
        Some(Token::Binding(_)) => true,
        _ => false,
    }
}

/// [`TypeProvider`] scanning the text of the context node.
pub struct MicrogrammarType {
    grammar: Rc<Microgrammar>,
}

impl MicrogrammarType {
    pub fn new(grammar: Microgrammar) -> Self {
        Self {
            grammar: Rc::new(grammar),
        }
    }
}

impl TypeProvider for MicrogrammarType {
    fn type_name(&self) -> &str {
        self.grammar.name()
    }

    fn find(&self, context: &NodeRef) -> Result<Vec<NodeRef>, NodeError> {
        let Some(text_node) = context.clone().into_text() else {
            return Ok(Vec::new());
        };
        let value = text_node.value();
        let found: Vec<NodeRef> = self
            .grammar
            .scan(&value)
            .into_iter()
            .enumerate()
            .map(|(index, m)| {
                MicroMatchNode::new(self.grammar.clone(), text_node.clone(), index, m) as NodeRef
            })
            .collect();
        debug!(
            microgrammar = %self.grammar.name(),
            context = %context.address(),
            count = found.len(),
            "scanned microgrammar"
        );
        Ok(found)
    }
}

/// One microgrammar occurrence within a text node.
///
/// The match keeps a snapshot of its text; updates splice into the context
/// node after checking the context still holds that text.
pub struct MicroMatchNode {
    grammar: Rc<Microgrammar>,
    context: Rc<dyn TextTreeNode>,
    index: usize,
    state: RefCell<MicroMatch>,
    me: Weak<MicroMatchNode>,
}

impl MicroMatchNode {
    fn new(
        grammar: Rc<Microgrammar>,
        context: Rc<dyn TextTreeNode>,
        index: usize,
        found: MicroMatch,
    ) -> Rc<Self> {
        Rc::new_cyclic(|me| Self {
            grammar,
            context,
            index,
            state: RefCell::new(found),
            me: me.clone(),
        })
    }

    pub fn grammar(&self) -> &Microgrammar {
        &self.grammar
    }

    /// Text of one binding, if it participated in the match.
    pub fn capture(&self, binding: &str) -> Option<String> {
        let state = self.state.borrow();
        let (_, range) = state.captures.iter().find(|(b, _)| b == binding)?;
        state.text.get(range.clone()).map(str::to_string)
    }

    /// Where the snapshot text currently sits in the context value.
    ///
    /// Tries the recorded span first, then the rescanned occurrence with the
    /// same text nearest to it.
    fn locate(&self, context_value: &str) -> Option<Range<usize>> {
        let state = self.state.borrow();
        if context_value.get(state.span.clone()) == Some(state.text.as_str()) {
            return Some(state.span.clone());
        }
        self.grammar
            .scan(context_value)
            .into_iter()
            .filter(|m| m.text == state.text)
            .min_by_key(|m| m.span.start.abs_diff(state.span.start))
            .map(|m| m.span)
    }

    fn splice_binding(&self, binding: &str, new_value: &str) -> Result<(), NodeError> {
        let spliced = {
            let state = self.state.borrow();
            let (_, range) = state
                .captures
                .iter()
                .find(|(b, _)| b == binding)
                .ok_or_else(|| NodeError::Stale {
                    address: format!("{}/{binding}", self.address()),
                })?;
            let mut text = state.text.clone();
            text.replace_range(range.clone(), new_value);
            text
        };
        self.update(&spliced)
    }
}

impl GraphNode for MicroMatchNode {
    fn node_name(&self) -> String {
        self.grammar.name().to_string()
    }

    fn node_tags(&self) -> Vec<String> {
        vec!["Microgrammar".to_string(), self.grammar.name().to_string()]
    }
}

impl Addressed for MicroMatchNode {
    fn address(&self) -> String {
        let base = format!("{}/{}()", self.context.address(), self.grammar.name());
        if self.index == 0 {
            base
        } else {
            format!("{base}[{}]", self.index)
        }
    }
}

impl TreeNode for MicroMatchNode {
    fn children(&self) -> Vec<NodeRef> {
        let Some(me) = self.me.upgrade() else {
            return Vec::new();
        };
        self.state
            .borrow()
            .captures
            .iter()
            .map(|(binding, _)| {
                Rc::new(SubmatchNode {
                    parent: me.clone(),
                    binding: binding.clone(),
                }) as NodeRef
            })
            .collect()
    }

    fn property(&self, key: &str) -> Option<String> {
        match key {
            "name" => Some(self.node_name()),
            "value" => Some(self.value()),
            binding => self.capture(binding),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_parent_aware(&self) -> Option<&dyn ParentAwareTreeNode> {
        Some(self)
    }

    fn as_text(&self) -> Option<&dyn TextTreeNode> {
        Some(self)
    }

    fn into_parent_aware(self: Rc<Self>) -> Option<Rc<dyn ParentAwareTreeNode>> {
        Some(self)
    }

    fn into_text(self: Rc<Self>) -> Option<Rc<dyn TextTreeNode>> {
        Some(self)
    }
}

impl ParentAwareTreeNode for MicroMatchNode {
    fn parent(&self) -> Option<NodeRef> {
        Some(self.context.clone() as NodeRef)
    }
}

impl TextTreeNode for MicroMatchNode {
    fn value(&self) -> String {
        self.state.borrow().text.clone()
    }

    fn update(&self, new_value: &str) -> Result<(), NodeError> {
        let context_value = self.context.value();
        let span = self.locate(&context_value).ok_or_else(|| NodeError::Stale {
            address: self.address(),
        })?;

        let edit = TextEdit::replacing(&context_value, span.clone(), new_value);
        match edit.apply_to(&context_value) {
            Ok(EditResult::Applied { text, .. }) => self.context.update(&text)?,
            Ok(EditResult::AlreadyApplied) => {}
            Err(EditError::BeforeTextMismatch { .. }) => {
                return Err(NodeError::Stale {
                    address: self.address(),
                })
            }
            Err(source) => {
                return Err(NodeError::Edit {
                    address: self.address(),
                    source,
                })
            }
        }

        let captures = self.grammar.parse_exact(new_value).unwrap_or_default();
        *self.state.borrow_mut() = MicroMatch {
            span: span.start..span.start + new_value.len(),
            text: new_value.to_string(),
            captures,
        };
        debug!(address = %self.address(), "updated microgrammar match");
        Ok(())
    }

    fn format_info(&self) -> Option<FormatInfo> {
        let base = self.context.format_info()?;
        let context_value = self.context.value();
        let span = self.locate(&context_value)?;
        Some(FormatInfo::within(&base.start, &context_value, span))
    }
}

/// A bound sub-match (`$name`) of a microgrammar occurrence.
pub struct SubmatchNode {
    parent: Rc<MicroMatchNode>,
    binding: String,
}

impl GraphNode for SubmatchNode {
    fn node_name(&self) -> String {
        self.binding.clone()
    }

    fn node_tags(&self) -> Vec<String> {
        Vec::new()
    }
}

impl Addressed for SubmatchNode {
    fn address(&self) -> String {
        format!("{}/{}", self.parent.address(), self.binding)
    }
}

impl TreeNode for SubmatchNode {
    fn children(&self) -> Vec<NodeRef> {
        Vec::new()
    }

    fn property(&self, key: &str) -> Option<String> {
        match key {
            "name" => Some(self.node_name()),
            "value" => Some(self.value()),
            _ => None,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_parent_aware(&self) -> Option<&dyn ParentAwareTreeNode> {
        Some(self)
    }

    fn as_text(&self) -> Option<&dyn TextTreeNode> {
        Some(self)
    }

    fn into_parent_aware(self: Rc<Self>) -> Option<Rc<dyn ParentAwareTreeNode>> {
        Some(self)
    }

    fn into_text(self: Rc<Self>) -> Option<Rc<dyn TextTreeNode>> {
        Some(self)
    }
}

impl ParentAwareTreeNode for SubmatchNode {
    fn parent(&self) -> Option<NodeRef> {
        Some(self.parent.clone() as NodeRef)
    }
}

impl TextTreeNode for SubmatchNode {
    fn value(&self) -> String {
        self.parent.capture(&self.binding).unwrap_or_default()
    }

    fn update(&self, new_value: &str) -> Result<(), NodeError> {
        self.parent.splice_binding(&self.binding, new_value)
    }

    fn format_info(&self) -> Option<FormatInfo> {
        let base = self.parent.format_info()?;
        let state = self.parent.state.borrow();
        let (_, range) = state.captures.iter().find(|(b, _)| *b == self.binding)?;
        Some(FormatInfo::within(&base.start, &state.text, range.clone()))
    }
}
