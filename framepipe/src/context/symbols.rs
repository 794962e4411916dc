//! Job-scoped symbol table.

use crate::frame::Value;
use std::collections::HashMap;

const TOKEN_OPEN: &str = "[#";
const TOKEN_CLOSE: &str = "#]";

/// Named values visible to every stage of a job.
///
/// Symbols back bare-name fallthrough in expressions and `[#name#]`
/// template tokens.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, Value>,
}

impl SymbolTable {
    /// Creates an empty symbol table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a symbol table from a JSON object. Non-object input yields an
    /// empty table.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        let symbols = value
            .as_object()
            .map(|map| {
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect()
            })
            .unwrap_or_default();
        Self { symbols }
    }

    /// Gets a symbol value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.symbols.get(name)
    }

    /// Sets a symbol, replacing any previous value.
    pub fn put(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.symbols.insert(name.into(), value.into());
    }

    /// Removes a symbol.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.symbols.remove(name)
    }

    /// Checks if a symbol exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    /// Returns the number of symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns true if there are no symbols.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Iterates over all symbols.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.symbols.iter()
    }

    /// Replaces `[#name#]` tokens with symbol values.
    ///
    /// Tokens naming unknown symbols are left in place.
    #[must_use]
    pub fn resolve_template(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find(TOKEN_OPEN) {
            out.push_str(&rest[..start]);
            let after_open = &rest[start + TOKEN_OPEN.len()..];
            match after_open.find(TOKEN_CLOSE) {
                Some(end) => {
                    let name = after_open[..end].trim();
                    match self.symbols.get(name) {
                        Some(value) => out.push_str(&value.to_text()),
                        None => {
                            out.push_str(TOKEN_OPEN);
                            out.push_str(&after_open[..end]);
                            out.push_str(TOKEN_CLOSE);
                        }
                    }
                    rest = &after_open[end + TOKEN_CLOSE.len()..];
                }
                None => {
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_get() {
        let mut table = SymbolTable::new();
        table.put("region", "west");
        assert_eq!(table.get("region"), Some(&Value::from("west")));
        assert!(table.contains("region"));
        assert!(!table.contains("Region"));
    }

    #[test]
    fn test_resolve_template() {
        let mut table = SymbolTable::new();
        table.put("host", "db01");
        table.put("port", 5432);

        assert_eq!(
            table.resolve_template("jdbc://[#host#]:[#port#]/app"),
            "jdbc://db01:5432/app"
        );
    }

    #[test]
    fn test_unknown_and_unterminated_tokens_are_kept() {
        let table = SymbolTable::new();
        assert_eq!(table.resolve_template("a [#missing#] b"), "a [#missing#] b");
        assert_eq!(table.resolve_template("open [#never"), "open [#never");
    }

    #[test]
    fn test_from_json() {
        let table = SymbolTable::from_json(&serde_json::json!({"limit": 10, "name": "x"}));
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("limit"), Some(&Value::Integer(10)));
    }
}
