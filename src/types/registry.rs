use crate::types::{DynamicType, TypeProvider};
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;
use tracing::debug;

/// Tags every engine knows about, whatever backends are in use.
pub const CORE_TAGS: &[&str] = &["Project", "Directory", "File", "Microgrammar"];

/// How a `Name()` step is evaluated.
#[derive(Clone)]
pub enum TypeResolution {
    /// Filter expanded nodes by `node_tags()`.
    Tag(String),
    /// Ask the provider for candidates relative to each context node.
    Dynamic(Rc<dyn TypeProvider>),
}

impl std::fmt::Debug for TypeResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeResolution::Tag(name) => f.debug_tuple("Tag").field(name).finish(),
            TypeResolution::Dynamic(p) => f.debug_tuple("Dynamic").field(&p.type_name()).finish(),
        }
    }
}

/// Built-in tag names plus caller-registered dynamic types, owned by one engine.
#[derive(Default)]
pub struct TypeRegistry {
    tags: BTreeSet<String>,
    dynamic: HashMap<String, Rc<dyn TypeProvider>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register_tags(CORE_TAGS.iter().copied());
        registry
    }

    /// Register a dynamic type. A later registration under the same name
    /// replaces the earlier one; the replaced provider is returned.
    pub fn register(&mut self, dynamic_type: DynamicType) -> Option<Rc<dyn TypeProvider>> {
        let provider = dynamic_type.into_provider();
        let name = provider.type_name().to_string();
        let replaced = self.dynamic.insert(name.clone(), provider);
        if replaced.is_some() {
            debug!(type_name = %name, "replaced dynamic type registration");
        } else {
            debug!(type_name = %name, "registered dynamic type");
        }
        replaced
    }

    pub fn register_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
    }

    pub fn is_tag(&self, name: &str) -> bool {
        self.tags.contains(name)
    }

    pub fn provider(&self, name: &str) -> Option<Rc<dyn TypeProvider>> {
        self.dynamic.get(name).cloned()
    }

    /// Dynamic registrations take precedence over a tag of the same name.
    pub fn resolve(&self, name: &str) -> Option<TypeResolution> {
        if let Some(provider) = self.provider(name) {
            return Some(TypeResolution::Dynamic(provider));
        }
        self.is_tag(name)
            .then(|| TypeResolution::Tag(name.to_string()))
    }

    /// Every known type name, sorted.
    pub fn type_names(&self) -> Vec<String> {
        let mut names: BTreeSet<String> = self.tags.clone();
        names.extend(self.dynamic.keys().cloned());
        names.into_iter().collect()
    }

    /// Closest known name to a misspelled one, if any is reasonably close.
    pub fn suggestion(&self, name: &str) -> Option<String> {
        self.type_names()
            .into_iter()
            .map(|candidate| (strsim::jaro_winkler(name, &candidate), candidate))
            .filter(|(score, _)| *score >= 0.8)
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, candidate)| candidate)
    }
}
