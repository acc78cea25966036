use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// `/`: direct children only
    Child,
    /// `//`: the node itself and every descendant, in document order
    DescendantOrSelf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// `*`
    Any,
    /// `name`: structural name equality
    Name(String),
    /// `Name()`: built-in tag or registered dynamic type
    Type(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `[@name='value']`
    Attribute { name: String, value: String },
    /// `[name]`: at least one direct child named `name`
    HasChild(String),
    /// `[n]`: the n-th (1-based) candidate of each context node
    Position(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Predicate>,
}

/// A compiled path expression: an ordered list of axis steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    expression: String,
    steps: Vec<Step>,
}

impl Program {
    pub(crate) fn new(expression: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            expression: expression.into(),
            steps,
        }
    }

    /// Source text the program was compiled from.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Type names referenced by `Name()` steps, in step order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().filter_map(|step| match &step.test {
            NodeTest::Type(name) => Some(name.as_str()),
            _ => None,
        })
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Child => write!(f, "/"),
            Axis::DescendantOrSelf => write!(f, "//"),
        }
    }
}

impl fmt::Display for NodeTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeTest::Any => write!(f, "*"),
            NodeTest::Name(name) => write!(f, "{name}"),
            NodeTest::Type(name) => write!(f, "{name}()"),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Attribute { name, value } => {
                write!(f, "[@{name}='{}']", value.replace('\\', "\\\\").replace('\'', "\\'"))
            }
            Predicate::HasChild(name) => write!(f, "[{name}]"),
            Predicate::Position(n) => write!(f, "[{n}]"),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.axis, self.test)?;
        for predicate in &self.predicates {
            write!(f, "{predicate}")?;
        }
        Ok(())
    }
}

/// Canonical form of the program; compiles back to an equal program.
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(f, "{step}")?;
        }
        Ok(())
    }
}
