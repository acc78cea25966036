//! Runtime-pluggable node types.
//!
//! A step such as `/Dependency()` resolves either to a built-in tag carried
//! by nodes (`File`, `YamlString`) or to a [`TypeProvider`] registered with
//! the engine, whose `find` locates members relative to a context node.

pub mod errors;
pub mod microgrammar;
pub mod registry;

pub use errors::MicrogrammarError;
pub use microgrammar::{MicroMatchNode, Microgrammar, MicrogrammarType, SubmatchNode};
pub use registry::{TypeRegistry, TypeResolution, CORE_TAGS};

use crate::tree::{NodeError, NodeRef};
use std::fmt;
use std::rc::Rc;

/// Locates the members of a dynamic type.
pub trait TypeProvider {
    /// Name used in path expressions, without the trailing `()`.
    fn type_name(&self) -> &str;

    /// Members of this type found under (or derived from) `context`, in
    /// document order. An unrelated context yields an empty vector.
    fn find(&self, context: &NodeRef) -> Result<Vec<NodeRef>, NodeError>;
}

/// What [`crate::Engine::add_type`] accepts.
#[derive(Clone)]
pub enum DynamicType {
    Provider(Rc<dyn TypeProvider>),
    Microgrammar(Microgrammar),
}

impl DynamicType {
    pub fn provider(provider: impl TypeProvider + 'static) -> Self {
        DynamicType::Provider(Rc::new(provider))
    }

    pub fn type_name(&self) -> &str {
        match self {
            DynamicType::Provider(p) => p.type_name(),
            DynamicType::Microgrammar(m) => m.name(),
        }
    }

    pub fn into_provider(self) -> Rc<dyn TypeProvider> {
        match self {
            DynamicType::Provider(p) => p,
            DynamicType::Microgrammar(m) => Rc::new(MicrogrammarType::new(m)),
        }
    }
}

impl From<Rc<dyn TypeProvider>> for DynamicType {
    fn from(provider: Rc<dyn TypeProvider>) -> Self {
        DynamicType::Provider(provider)
    }
}

impl From<Microgrammar> for DynamicType {
    fn from(microgrammar: Microgrammar) -> Self {
        DynamicType::Microgrammar(microgrammar)
    }
}

impl fmt::Debug for DynamicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynamicType::Provider(p) => f.debug_tuple("Provider").field(&p.type_name()).finish(),
            DynamicType::Microgrammar(m) => f.debug_tuple("Microgrammar").field(m).finish(),
        }
    }
}
