use indexmap::IndexMap;
use tracing::warn;

/// Primitive used for scalars that have no entry in the table.
pub const FALLBACK_PRIMITIVE: &str = "string";

static DEFAULT_SCALARS: [(&str, &str); 19] = [
    ("String", "string"),
    ("EntityGuid", "string"),
    // Emitted targets have no 64-bit integer type.
    ("Int", "string"),
    ("Nrql", "string"),
    ("Float", "number"),
    ("ID", "string"),
    ("DashboardWidgetRawConfiguration", "string"),
    ("DateTime", "string"),
    ("EpochMilliseconds", "string"),
    ("Boolean", "boolean"),
    ("Milliseconds", "string"),
    ("AttributeMap", "Record<string, any>"),
    ("EntityAlertViolationInt", "string"),
    ("NerdStorageDocument", "string"),
    ("NrdbResult", "string"),
    ("Seconds", "string"),
    ("NrdbRawResults", "string"),
    ("SecureValue", "string"),
    ("NaiveDateTime", "string"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarMapping<'a> {
    pub primitive: &'a str,
    /// `true` when the scalar was unknown and `primitive` is the fallback.
    pub fallback: bool,
}

/// Scalar name to target primitive name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarTable {
    mappings: IndexMap<String, String>,
}

impl Default for ScalarTable {
    fn default() -> Self {
        Self {
            mappings: DEFAULT_SCALARS
                .iter()
                .map(|(scalar, primitive)| (scalar.to_string(), primitive.to_string()))
                .collect(),
        }
    }
}

impl ScalarTable {
    /// Adds or replaces entries. Overrides keep the position of an entry they replace.
    pub fn with_overrides<I, K, V>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (scalar, primitive) in overrides {
            self.mappings.insert(scalar.into(), primitive.into());
        }
        self
    }

    pub fn contains(&self, scalar: &str) -> bool {
        self.mappings.contains_key(scalar)
    }

    pub fn resolve(&self, scalar: &str) -> ScalarMapping<'_> {
        match self.mappings.get(scalar) {
            Some(primitive) => ScalarMapping {
                primitive,
                fallback: false,
            },
            None => {
                warn!(
                    "scalar '{}' has no mapping, using '{}'",
                    scalar, FALLBACK_PRIMITIVE
                );
                ScalarMapping {
                    primitive: FALLBACK_PRIMITIVE,
                    fallback: true,
                }
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.mappings
            .iter()
            .map(|(scalar, primitive)| (scalar.as_str(), primitive.as_str()))
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}
