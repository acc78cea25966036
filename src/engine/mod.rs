//! The public query surface: `evaluate`, `with`, `scalar`, `cast` and
//! `children` over any root implementing the node model.
//!
//! # Example
//!
//! ```no_run
//! use pathexpr::{Engine, Project};
//!
//! let project = Project::new("demo");
//! project.add_file("x.yml", "group:\n  value: queen\n").unwrap();
//! let engine = Engine::with_defaults();
//! let found = engine
//!     .evaluate(&project.root(), "/*[@name='x.yml']/YamlFile()/group/value")
//!     .unwrap();
//! assert_eq!(found.len(), 1);
//! ```

pub mod errors;
pub mod eval;
pub mod matches;

pub use errors::EngineError;
pub use matches::Match;

use crate::cache::get_or_compile_program;
use crate::config::Config;
use crate::expr::Expression;
use crate::sg::PatternType;
use crate::tree::{NodeError, NodeRef, NodeView};
use crate::ts::{Language, LanguageType};
use crate::types::{DynamicType, Microgrammar, TypeRegistry};
use tracing::debug;

/// Knobs that change evaluation results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// Drop later matches whose address was already matched.
    pub dedupe_by_address: bool,
}

/// Owns one type registry; registrations live as long as the engine.
pub struct Engine {
    registry: TypeRegistry,
    options: EngineOptions,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Engine knowing only the project tags (`Project`, `Directory`, `File`).
    pub fn new() -> Self {
        Self {
            registry: TypeRegistry::new(),
            options: EngineOptions::default(),
        }
    }

    /// Engine with every built-in language view registered.
    pub fn with_defaults() -> Self {
        let mut engine = Self::new();
        for language in Language::ALL {
            engine
                .add_type(DynamicType::provider(LanguageType::new(*language)))
                .register_tags(language.tags());
        }
        engine
    }

    /// Build an engine from a loaded configuration, registering its
    /// microgrammars and structural patterns.
    pub fn from_config(config: &Config) -> Result<Self, EngineError> {
        let mut engine = if config.engine.default_types {
            Self::with_defaults()
        } else {
            Self::new()
        };
        engine.options.dedupe_by_address = config.engine.dedupe_by_address;

        for def in &config.microgrammars {
            let microgrammar =
                Microgrammar::new(&def.name, &def.grammar, def.submatchers.clone())?;
            engine.add_type(microgrammar);
        }
        for def in &config.patterns {
            let language: Language = def.language.parse().map_err(NodeError::from)?;
            engine.add_type(DynamicType::provider(PatternType::new(
                &def.name,
                language,
                &def.pattern,
            )));
        }
        Ok(engine)
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Register a dynamic type. A later registration under the same name
    /// replaces the earlier one.
    pub fn add_type(&mut self, dynamic_type: impl Into<DynamicType>) -> &mut Self {
        self.registry.register(dynamic_type.into());
        self
    }

    /// Make tag names known so `Name()` steps using them resolve.
    pub fn register_tags<I, S>(&mut self, tags: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.registry.register_tags(tags);
        self
    }

    /// Evaluate `expr` against `root`. Zero matches is an empty result, not an error.
    pub fn evaluate<E>(
        &self,
        root: &E::Root,
        expr: &E,
    ) -> Result<Match<E::Root, E::Output>, EngineError>
    where
        E: Expression + ?Sized,
    {
        let program = get_or_compile_program(expr.expression())?;
        let found = eval::run(&program, &root.to_node(), &self.registry, &self.options)?;

        let matches = found
            .into_iter()
            .map(|node| view::<E::Output>(node))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Match {
            root: root.clone(),
            matches,
        })
    }

    /// Evaluate, then call `f` once per match in document order.
    ///
    /// The match list is fixed before the first call. The first error from
    /// `f` stops the batch and is returned. Returns the number of matches.
    pub fn with<E, F, Err>(&self, root: &E::Root, expr: &E, mut f: F) -> Result<usize, Err>
    where
        E: Expression + ?Sized,
        F: FnMut(&E::Output) -> Result<(), Err>,
        Err: From<EngineError>,
    {
        let found = self.evaluate(root, expr)?;
        for (index, node) in found.iter().enumerate() {
            if let Err(e) = f(node) {
                debug!(
                    expression = expr.expression(),
                    index,
                    remaining = found.len() - index - 1,
                    "callback failed, aborting batch"
                );
                return Err(e);
            }
        }
        Ok(found.len())
    }

    /// Evaluate and require exactly one match.
    pub fn scalar<E>(&self, root: &E::Root, expr: &E) -> Result<E::Output, EngineError>
    where
        E: Expression + ?Sized,
    {
        let found = self.evaluate(root, expr)?;
        match found.len() {
            0 => Err(EngineError::NoMatch {
                expression: expr.expression().to_string(),
            }),
            1 => found
                .into_iter()
                .next()
                .ok_or_else(|| EngineError::NoMatch {
                    expression: expr.expression().to_string(),
                }),
            count => Err(EngineError::AmbiguousMatch {
                expression: expr.expression().to_string(),
                count,
            }),
        }
    }

    /// View `node` as `type_name` without re-querying from a root.
    ///
    /// A registered dynamic type must find exactly one node from `node`; a
    /// tag the node carries, or a capability it supports, gives back the
    /// node itself.
    pub fn cast(&self, node: &NodeRef, type_name: &str) -> Result<NodeRef, EngineError> {
        let invalid = || EngineError::InvalidCast {
            address: node.address(),
            type_name: type_name.to_string(),
        };

        if let Some(provider) = self.registry.provider(type_name) {
            let mut found = provider.find(node)?;
            return if found.len() == 1 {
                found.pop().ok_or_else(invalid)
            } else {
                Err(invalid())
            };
        }

        let supported = node.has_tag(type_name)
            || match type_name {
                "TreeNode" | "GraphNode" | "Addressed" => true,
                "ParentAwareTreeNode" => node.as_parent_aware().is_some(),
                "TextTreeNode" => node.as_text().is_some(),
                "FileArtifact" => node.as_file().is_some(),
                _ => false,
            };
        if supported {
            Ok(node.clone())
        } else {
            Err(invalid())
        }
    }

    /// Typed capability probe.
    pub fn cast_as<V: NodeView>(&self, node: &NodeRef) -> Result<V, EngineError> {
        view::<V>(node.clone())
    }

    /// Direct children of `root` matching `name`. A registered tag filters
    /// by `node_tags()`; any other name filters by `node_name()`. Never
    /// looks below the first level.
    pub fn children(&self, root: &NodeRef, name: &str) -> Vec<NodeRef> {
        let by_tag = self.registry.is_tag(name);
        root.children()
            .into_iter()
            .filter(|child| {
                if by_tag {
                    child.has_tag(name)
                } else {
                    child.node_name() == name
                }
            })
            .collect()
    }
}

fn view<V: NodeView>(node: NodeRef) -> Result<V, EngineError> {
    let address = node.address();
    V::from_node(node).ok_or_else(|| EngineError::InvalidCast {
        address,
        type_name: V::TYPE_NAME.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::Project;

    fn three_files() -> Project {
        let project = Project::new("p");
        project.add_file("a.txt", "alpha").unwrap();
        project.add_file("b.txt", "beta").unwrap();
        project.add_file("c.txt", "gamma").unwrap();
        project
    }

    #[test]
    fn zero_matches_is_empty_not_error() {
        let project = three_files();
        let found = Engine::new().evaluate(&project.root(), "/nothing").unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn unknown_type_fails_before_traversal() {
        let project = three_files();
        let err = Engine::new()
            .evaluate(&project.root(), "/nothing/Fiel()")
            .unwrap_err();
        match err {
            EngineError::UnknownType { name, suggestion } => {
                assert_eq!(name, "Fiel");
                assert_eq!(suggestion.as_deref(), Some("File"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn scalar_cardinality() {
        let project = three_files();
        let engine = Engine::new();
        let root = project.root();
        assert!(matches!(
            engine.scalar(&root, "/missing.txt"),
            Err(EngineError::NoMatch { .. })
        ));
        assert!(matches!(
            engine.scalar(&root, "/File()"),
            Err(EngineError::AmbiguousMatch { count: 3, .. })
        ));
        let b = engine.scalar(&root, "/b.txt").unwrap();
        assert_eq!(b.address(), "/b.txt");
    }

    #[test]
    fn cast_by_tag_and_capability() {
        let project = three_files();
        let engine = Engine::new();
        let file = engine.scalar(&project.root(), "/a.txt").unwrap();
        assert!(engine.cast(&file, "File").is_ok());
        assert!(engine.cast(&file, "FileArtifact").is_ok());
        assert!(matches!(
            engine.cast(&file, "Directory"),
            Err(EngineError::InvalidCast { .. })
        ));
        assert!(matches!(
            engine.cast_as::<std::rc::Rc<dyn crate::tree::FileArtifact>>(&project.root()),
            Err(EngineError::InvalidCast { .. })
        ));
    }

    #[test]
    fn children_never_descends() {
        let project = three_files();
        project.add_file("sub/d.txt", "delta").unwrap();
        let engine = Engine::new();
        let files = engine.children(&project.root(), "File");
        assert_eq!(files.len(), 3);
        assert_eq!(engine.children(&project.root(), "sub").len(), 1);
    }

    #[test]
    fn children_by_tag_ignores_same_named_directory() {
        let project = three_files();
        project.add_file("File/inner.txt", "").unwrap();
        let engine = Engine::new();

        let files = engine.children(&project.root(), "File");
        let names: Vec<String> = files.iter().map(|f| f.node_name()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
        assert!(files.iter().all(|f| f.has_tag("File")));
    }
}
