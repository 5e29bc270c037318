//! Ordered, multi-valued HTML form fields.
//!
//! HTML forms may legally repeat a field name and the server sees every
//! occurrence in document order. [`FormFieldSet`] therefore stores a plain
//! list of pairs rather than a map: adding a name that already exists appends
//! a second entry instead of replacing the first.

use crate::error::GotoesError;
use serde::{Deserialize, Serialize};

/// Ordered list of `(name, value)` form fields. Duplicate names are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormFieldSet {
    fields: Vec<(String, String)>,
}

impl FormFieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. Never replaces an existing field of the same name.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// First value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every value for `name`, in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// `application/x-www-form-urlencoded` body, duplicates and order preserved.
    pub fn encode(&self) -> Result<String, GotoesError> {
        serde_urlencoded::to_string(&self.fields)
            .map_err(|e| GotoesError::parse(format!("failed to encode form fields: {e}")))
    }

    /// Inverse of [`FormFieldSet::encode`].
    pub fn decode(body: &str) -> Result<Self, GotoesError> {
        let fields: Vec<(String, String)> = serde_urlencoded::from_str(body)
            .map_err(|e| GotoesError::parse(format!("failed to decode form fields: {e}")))?;
        Ok(Self { fields })
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for FormFieldSet {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_keeps_duplicates() {
        let mut f = FormFieldSet::new();
        f.add("outputFormat", "TCX");
        f.add("outputFormat", "GPX");
        assert_eq!(f.len(), 2);
        assert_eq!(f.get("outputFormat"), Some("TCX"));
        assert_eq!(f.get_all("outputFormat").collect::<Vec<_>>(), ["TCX", "GPX"]);
    }

    #[test]
    fn encode_preserves_order_and_escapes() {
        let f: FormFieldSet = [("b", "2"), ("a", "x y&z"), ("b", "1")].into_iter().collect();
        assert_eq!(f.encode().unwrap(), "b=2&a=x+y%26z&b=1");
    }

    #[test]
    fn decode_reproduces_encoded_pairs() {
        let f: FormFieldSet = [
            ("f", "8009945965089910"),
            ("spoofStartTime", "2024-05-01T08:00:00+02:00"),
            ("dup", "first"),
            ("empty", ""),
            ("dup", "second"),
        ]
        .into_iter()
        .collect();
        let back = FormFieldSet::decode(&f.encode().unwrap()).unwrap();
        assert_eq!(back, f);
        assert_eq!(back.get_all("dup").collect::<Vec<_>>(), ["first", "second"]);
    }

    #[test]
    fn empty_set_encodes_to_empty_body() {
        assert_eq!(FormFieldSet::new().encode().unwrap(), "");
        assert!(FormFieldSet::decode("").unwrap().is_empty());
    }
}
