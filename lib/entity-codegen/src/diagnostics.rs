use std::fmt::Display;

/// Non-fatal findings recorded while collecting types or emitting declarations.
///
/// Diagnostics never abort a build: the partial result stays usable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Diagnostic {
    /// A named type reference that the schema does not define.
    UnknownType { name: String },
    /// A second built type claimed a name already held by a different built type.
    ConflictingBuiltType { name: String },
    /// A scalar with no entry in the scalar table; emitted with the fallback primitive.
    UnknownScalar { name: String, fallback: String },
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::UnknownType { name } => {
                write!(f, "type '{}' is not defined in the schema", name)
            }
            Diagnostic::ConflictingBuiltType { name } => write!(
                f,
                "built type '{}' conflicts with an already registered built type",
                name
            ),
            Diagnostic::UnknownScalar { name, fallback } => write!(
                f,
                "scalar '{}' has no mapping, falling back to '{}'",
                name, fallback
            ),
        }
    }
}

/// Ordered, duplicate-free list of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Records a diagnostic. Returns `false` when it was already present.
    pub fn push(&mut self, diagnostic: Diagnostic) -> bool {
        if self.items.contains(&diagnostic) {
            return false;
        }
        self.items.push(diagnostic);
        true
    }

    pub fn extend(&mut self, other: &Diagnostics) {
        for diagnostic in other.iter() {
            self.push(diagnostic.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
