//! Step program execution.

use crate::engine::errors::EngineError;
use crate::engine::EngineOptions;
use crate::expr::{Axis, NodeTest, Predicate, Program, Step};
use crate::tree::{descendants_or_self, NodeRef};
use crate::types::{TypeRegistry, TypeResolution};
use std::collections::HashSet;
use tracing::{debug, instrument, trace};

/// Run `program` from `root`. The result keeps document order; duplicates
/// reached through different context nodes are kept unless deduplication is on.
#[instrument(level = "debug", skip_all, fields(expression = %program.expression()))]
pub(crate) fn run(
    program: &Program,
    root: &NodeRef,
    registry: &TypeRegistry,
    options: &EngineOptions,
) -> Result<Vec<NodeRef>, EngineError> {
    let resolutions = resolve_types(program, registry)?;

    let mut current = vec![root.clone()];
    for (step, resolution) in program.steps().iter().zip(&resolutions) {
        let mut next = Vec::new();
        for context in &current {
            let candidates = expand(context, step, resolution.as_ref())?;
            next.extend(apply_predicates(candidates, &step.predicates));
        }
        trace!(step = %step, contexts = current.len(), candidates = next.len(), "step evaluated");
        current = next;
        if current.is_empty() {
            break;
        }
    }

    if options.dedupe_by_address {
        let mut seen = HashSet::new();
        current.retain(|node| seen.insert(node.address()));
    }

    debug!(
        steps = program.steps().len(),
        matches = current.len(),
        "evaluated path expression"
    );
    Ok(current)
}

/// Every `Name()` step is resolved up front, so a misspelled type fails even
/// when an earlier step already matches nothing.
fn resolve_types(
    program: &Program,
    registry: &TypeRegistry,
) -> Result<Vec<Option<TypeResolution>>, EngineError> {
    program
        .steps()
        .iter()
        .map(|step| match &step.test {
            NodeTest::Type(name) => registry
                .resolve(name)
                .map(Some)
                .ok_or_else(|| EngineError::UnknownType {
                    name: name.clone(),
                    suggestion: registry.suggestion(name),
                }),
            _ => Ok(None),
        })
        .collect()
}

fn expand(
    context: &NodeRef,
    step: &Step,
    resolution: Option<&TypeResolution>,
) -> Result<Vec<NodeRef>, EngineError> {
    if let Some(TypeResolution::Dynamic(provider)) = resolution {
        return match step.axis {
            Axis::Child => Ok(provider.find(context)?),
            Axis::DescendantOrSelf => {
                let mut found = Vec::new();
                for node in descendants_or_self(context) {
                    found.extend(provider.find(&node)?);
                }
                Ok(found)
            }
        };
    }

    let nodes = match step.axis {
        Axis::Child => context.children(),
        Axis::DescendantOrSelf => descendants_or_self(context),
    };

    Ok(match (&step.test, resolution) {
        (NodeTest::Any, _) => nodes,
        (NodeTest::Name(name), _) => nodes
            .into_iter()
            .filter(|n| n.node_name() == *name)
            .collect(),
        (NodeTest::Type(_), Some(TypeResolution::Tag(tag))) => {
            nodes.into_iter().filter(|n| n.has_tag(tag)).collect()
        }
        (NodeTest::Type(_), _) => Vec::new(),
    })
}

fn apply_predicates(mut candidates: Vec<NodeRef>, predicates: &[Predicate]) -> Vec<NodeRef> {
    for predicate in predicates {
        match predicate {
            Predicate::Attribute { name, value } => {
                candidates.retain(|n| n.property(name).as_deref() == Some(value.as_str()));
            }
            Predicate::HasChild(name) => {
                candidates.retain(|n| n.children().iter().any(|c| c.node_name() == *name));
            }
            Predicate::Position(position) => {
                candidates = position
                    .checked_sub(1)
                    .and_then(|index| candidates.into_iter().nth(index))
                    .into_iter()
                    .collect();
            }
        }
    }
    candidates
}
