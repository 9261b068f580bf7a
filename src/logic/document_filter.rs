use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use serde_json::Value;

use crate::model::{Document, FilterExpr};

/// A [`FilterExpr`] with its patterns compiled, ready to test documents
#[derive(Debug, Clone)]
pub enum DocumentMatcher {
    All(Vec<DocumentMatcher>),
    Any(Vec<DocumentMatcher>),
    Eq(String, Value),
    In(String, Vec<Value>),
    Matches(String, Regex),
}

impl DocumentMatcher {
    pub fn compile(filter: &FilterExpr) -> Result<Self> {
        Ok(match filter {
            FilterExpr::All { all } => DocumentMatcher::All(
                all.iter().map(Self::compile).collect::<Result<Vec<_>>>()?,
            ),
            FilterExpr::Any { any } => DocumentMatcher::Any(
                any.iter().map(Self::compile).collect::<Result<Vec<_>>>()?,
            ),
            FilterExpr::Eq { eq: (path, value) } => {
                DocumentMatcher::Eq(path.0.clone(), value.clone())
            }
            FilterExpr::In { r#in: (path, values) } => {
                DocumentMatcher::In(path.0.clone(), values.clone())
            }
            FilterExpr::Matches {
                matches: (path, pattern),
            } => {
                let regex = RegexBuilder::new(&pattern.regex)
                    .case_insensitive(pattern.case_insensitive)
                    .build()
                    .with_context(|| format!("Invalid pattern: {}", pattern.regex))?;
                DocumentMatcher::Matches(path.0.clone(), regex)
            }
        })
    }

    pub fn matches(&self, document: &Document) -> bool {
        match self {
            DocumentMatcher::All(all) => all.iter().all(|matcher| matcher.matches(document)),
            DocumentMatcher::Any(any) => any.iter().any(|matcher| matcher.matches(document)),
            DocumentMatcher::Eq(path, expected) => {
                field_values(document, path).any(|value| value == expected)
            }
            DocumentMatcher::In(path, candidates) => {
                field_values(document, path).any(|value| candidates.contains(value))
            }
            DocumentMatcher::Matches(path, regex) => field_values(document, path)
                .any(|value| value.as_str().is_some_and(|text| regex.is_match(text))),
        }
    }
}

/// Values a predicate is tested against: the field itself, or each element when the
/// field holds an array.
fn field_values<'a>(
    document: &'a Document,
    path: &str,
) -> Box<dyn Iterator<Item = &'a Value> + 'a> {
    match document.get_path(path) {
        Some(Value::Array(items)) => Box::new(items.iter()),
        Some(value) => Box::new(std::iter::once(value)),
        None => Box::new(std::iter::empty()),
    }
}

/// Keep the documents matching the filter, preserving their order
pub fn filter_documents<'a, I>(documents: I, filter: &FilterExpr) -> Result<Vec<Document>>
where
    I: IntoIterator<Item = &'a Document>,
{
    let matcher = DocumentMatcher::compile(filter)?;
    Ok(documents
        .into_iter()
        .filter(|document| matcher.matches(document))
        .cloned()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        serde_json::from_value(value).unwrap()
    }

    fn people() -> Vec<Document> {
        vec![
            doc(json!({"_id": "1", "firstName": "Marie", "lastName": "Dupond", "role": "child"})),
            doc(json!({
                "_id": "2", "firstName": "Jean", "lastName": "Marais", "role": "assistant"
            })),
            doc(json!({"_id": "3", "firstName": "Luc", "lastName": "Favre", "role": "boss"})),
        ]
    }

    fn ids(documents: &[Document]) -> Vec<&str> {
        documents.iter().filter_map(Document::id).collect()
    }

    #[test]
    fn empty_all_matches_everything() {
        let people = people();
        let found = filter_documents(&people, &FilterExpr::always()).unwrap();
        assert_eq!(ids(&found), vec!["1", "2", "3"]);
    }

    #[test]
    fn empty_in_matches_nothing() {
        let people = people();
        let found = filter_documents(&people, &FilterExpr::id_in(&[])).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn case_insensitive_substring() {
        let people = people();
        let filter = FilterExpr::any(vec![
            FilterExpr::matches_ignore_case("firstName", "mar"),
            FilterExpr::matches_ignore_case("lastName", "mar"),
        ]);
        let found = filter_documents(&people, &filter).unwrap();
        assert_eq!(ids(&found), vec!["1", "2"]);
    }

    #[test]
    fn case_sensitive_pattern() {
        let people = people();
        let found = filter_documents(&people, &FilterExpr::matches("lastName", "mar")).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn and_of_eq_and_membership() {
        let people = people();
        let filter = FilterExpr::all(vec![
            FilterExpr::eq("role", "assistant"),
            FilterExpr::id_in(&["1".to_string(), "2".to_string()]),
        ]);
        let found = filter_documents(&people, &filter).unwrap();
        assert_eq!(ids(&found), vec!["2"]);
    }

    #[test]
    fn array_fields_match_any_element() {
        let course = doc(json!({"_id": "c", "absence": ["1", "3"]}));
        let matcher = DocumentMatcher::compile(&FilterExpr::eq("absence", "3")).unwrap();
        assert!(matcher.matches(&course));
    }

    #[test]
    fn nested_paths() {
        let canton = doc(json!({"_id": "c", "address": {"city": "Delémont"}}));
        let filter = FilterExpr::eq("address.city", "Delémont");
        let matcher = DocumentMatcher::compile(&filter).unwrap();
        assert!(matcher.matches(&canton));
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        assert!(DocumentMatcher::compile(&FilterExpr::matches("title", "(")).is_err());
    }
}
