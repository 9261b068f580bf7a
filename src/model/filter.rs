use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{Id, ID_FIELD};

/// Filter expression understood by every entity store backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterExpr {
    /// Logical AND - all conditions must be true. An empty list is always true.
    All { all: Vec<FilterExpr> },
    /// Logical OR - any condition must be true. An empty list is always false.
    Any { any: Vec<FilterExpr> },
    /// Exact equality on a field
    Eq { eq: (FieldPath, Value) },
    /// Set membership: field value is one of the listed values
    In { r#in: (FieldPath, Vec<Value>) },
    /// Unanchored regular expression match on a string field
    Matches { matches: (FieldPath, Pattern) },
}

/// Dotted path to a document field, e.g. `address.city`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    pub regex: String,
    #[serde(default)]
    pub case_insensitive: bool,
}

impl FilterExpr {
    /// The no-op predicate
    pub fn always() -> Self {
        FilterExpr::All { all: Vec::new() }
    }

    pub fn eq(path: &str, value: impl Into<Value>) -> Self {
        FilterExpr::Eq {
            eq: (FieldPath(path.to_string()), value.into()),
        }
    }

    pub fn is_in(path: &str, values: Vec<Value>) -> Self {
        FilterExpr::In {
            r#in: (FieldPath(path.to_string()), values),
        }
    }

    /// Membership of a reference field in a set of ids
    pub fn ref_in(path: &str, ids: &[Id]) -> Self {
        Self::is_in(path, ids.iter().cloned().map(Value::String).collect())
    }

    pub fn id_in(ids: &[Id]) -> Self {
        Self::ref_in(ID_FIELD, ids)
    }

    pub fn matches(path: &str, regex: &str) -> Self {
        FilterExpr::Matches {
            matches: (
                FieldPath(path.to_string()),
                Pattern {
                    regex: regex.to_string(),
                    case_insensitive: false,
                },
            ),
        }
    }

    pub fn matches_ignore_case(path: &str, regex: &str) -> Self {
        FilterExpr::Matches {
            matches: (
                FieldPath(path.to_string()),
                Pattern {
                    regex: regex.to_string(),
                    case_insensitive: true,
                },
            ),
        }
    }

    pub fn any(predicates: Vec<FilterExpr>) -> Self {
        FilterExpr::Any { any: predicates }
    }

    pub fn all(predicates: Vec<FilterExpr>) -> Self {
        FilterExpr::All { all: predicates }
    }
}

/// Accumulates the predicates of a listing request and ANDs them together.
/// Parameters that are absent simply contribute nothing.
#[derive(Debug, Default, Clone)]
pub struct FilterBuilder {
    predicates: Vec<FilterExpr>,
}

impl FilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and_some<T>(
        mut self,
        value: Option<T>,
        predicate: impl FnOnce(T) -> FilterExpr,
    ) -> Self {
        if let Some(value) = value {
            self.predicates.push(predicate(value));
        }
        self
    }

    pub fn build(self) -> FilterExpr {
        FilterExpr::All {
            all: self.predicates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_parameters_contribute_nothing() {
        let role: Option<&str> = None;
        let ids: Option<Vec<Id>> = Some(vec!["a".to_string()]);

        let filter = FilterBuilder::new()
            .and_some(role, |role| FilterExpr::eq("role", role))
            .and_some(ids, |ids| FilterExpr::id_in(&ids))
            .build();

        assert_eq!(
            filter,
            FilterExpr::all(vec![FilterExpr::is_in("_id", vec![json!("a")])])
        );
    }

    #[test]
    fn serializes_to_readable_json() {
        let filter = FilterExpr::all(vec![
            FilterExpr::eq("periode", "morning"),
            FilterExpr::matches_ignore_case("title", "gmail"),
        ]);
        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(
            json,
            json!({"all": [
                {"eq": ["periode", "morning"]},
                {"matches": ["title", {"regex": "gmail", "case_insensitive": true}]}
            ]})
        );
        let back: FilterExpr = serde_json::from_value(json).unwrap();
        assert_eq!(back, filter);
    }
}
