/// Raw query-string pairs of a listing request.
///
/// Kept as pairs rather than a struct so repeated keys (`?canton=Jura&canton=Vaud`)
/// survive. Empty values count as absent.
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pairs: Vec<(String, String)>,
}

impl ListParams {
    pub fn first(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, v)| k == key && !v.is_empty())
            .map(|(_, v)| v.as_str())
    }

    pub fn all(&self, key: &str) -> Option<Vec<String>> {
        let values: Vec<String> = self
            .pairs
            .iter()
            .filter(|(k, v)| k == key && !v.is_empty())
            .map(|(_, v)| v.clone())
            .collect();
        (!values.is_empty()).then_some(values)
    }
}

impl From<Vec<(String, String)>> for ListParams {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> ListParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn repeated_keys_are_collected() {
        let p = params(&[("canton", "Jura"), ("role", "child"), ("canton", "Vaud")]);
        assert_eq!(p.all("canton"), Some(vec!["Jura".to_string(), "Vaud".to_string()]));
        assert_eq!(p.first("canton"), Some("Jura"));
        assert_eq!(p.all("name"), None);
    }

    #[test]
    fn empty_values_are_absent() {
        let p = params(&[("name", ""), ("canton", "")]);
        assert_eq!(p.first("name"), None);
        assert_eq!(p.all("canton"), None);
    }
}
