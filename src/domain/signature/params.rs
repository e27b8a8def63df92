//! Insertion-ordered request parameters.

use url::form_urlencoded;

/// Key → value pairs that remember the order they were added in.
///
/// Providers sign either the insertion-ordered query string or the
/// key-sorted values, so the order is part of the data. Re-inserting an
/// existing key replaces the value in place and keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedParams(Vec<(String, String)>);

impl OrderedParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes an `application/x-www-form-urlencoded` string.
    pub fn from_urlencoded(input: &str) -> Self {
        form_urlencoded::parse(input.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// Sets `key`, replacing the value in place if it already exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    /// Builder-style `insert`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the value for `key`, or an empty string when absent.
    pub fn get_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    /// Removes `key` and returns its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(pos).1)
    }

    /// Merges `other` into self; `other` wins on duplicate keys.
    pub fn extend_from(&mut self, other: OrderedParams) {
        for (k, v) in other.0 {
            self.insert(k, v);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encodes the pairs in insertion order the way PHP's
    /// `http_build_query` does (`urlencode` on keys and values, `&` joined).
    pub fn to_query_string(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}={}", php_urlencode(k), php_urlencode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Values ordered by their keys (byte order).
    pub fn values_sorted_by_key(&self) -> Vec<&str> {
        let mut pairs: Vec<&(String, String)> = self.0.iter().collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        pairs.into_iter().map(|(_, v)| v.as_str()).collect()
    }

    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.0
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for OrderedParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = OrderedParams::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

/// `urlencode` as PHP defines it: space becomes `+`, and only
/// `[A-Za-z0-9._-]` pass through unescaped.
pub fn php_urlencode(input: &str) -> String {
    form_urlencoded::byte_serialize(input.as_bytes())
        .collect::<String>()
        .replace('*', "%2A")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order() {
        let params = OrderedParams::new().with("b", "2").with("a", "1").with("c", "3");
        let keys: Vec<&str> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn reinsert_replaces_value_in_place() {
        let mut params = OrderedParams::new().with("a", "1").with("b", "2");
        params.insert("a", "9");
        assert_eq!(params.to_query_string(), "a=9&b=2");
    }

    #[test]
    fn query_string_matches_php_encoding() {
        let params = OrderedParams::new()
            .with("redirect_uri", "https://host/mancgi/x?elid=5")
            .with("limits[RUB]", "0;0;0")
            .with("description", "Order #1 *now*~");

        assert_eq!(
            params.to_query_string(),
            "redirect_uri=https%3A%2F%2Fhost%2Fmancgi%2Fx%3Felid%3D5\
             &limits%5BRUB%5D=0%3B0%3B0\
             &description=Order+%231+%2Anow%2A%7E"
        );
    }

    #[test]
    fn values_sorted_by_key_ignores_insertion_order() {
        let params = OrderedParams::new()
            .with("status", "paid")
            .with("amount", "100.00")
            .with("ccy", "RUB");
        assert_eq!(params.values_sorted_by_key(), vec!["100.00", "RUB", "paid"]);
    }

    #[test]
    fn decodes_urlencoded_input() {
        let params = OrderedParams::from_urlencoded("a=1&b=hello+world&c=%D1%80");
        assert_eq!(params.get("b"), Some("hello world"));
        assert_eq!(params.get("c"), Some("р"));
        assert_eq!(params.get_or_empty("missing"), "");
    }

    #[test]
    fn extend_from_overrides_duplicates() {
        let mut query = OrderedParams::new().with("elid", "1").with("auth", "x");
        query.extend_from(OrderedParams::new().with("elid", "2"));
        assert_eq!(query.get("elid"), Some("2"));
        assert_eq!(query.len(), 2);
    }

    #[test]
    fn remove_returns_value() {
        let mut params = OrderedParams::new().with("sign", "abc").with("a", "1");
        assert_eq!(params.remove("sign"), Some("abc".to_string()));
        assert_eq!(params.remove("sign"), None);
        assert_eq!(params.len(), 1);
    }
}
