//! The frame record type.

use super::Value;
use std::fmt;

/// A single field of a frame. Anonymous fields have no name.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: Option<String>,
    value: Value,
}

impl Field {
    /// Returns the field name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the field value.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }
}

/// An ordered record of uniquely named fields.
///
/// Frames may nest (a field value may itself be a frame) and may be
/// array-biased, holding anonymous positional values. Frames have no
/// identity beyond their contents and are copied by value between the
/// source, working and target views of a transaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    fields: Vec<Field>,
    array_biased: bool,
}

impl Frame {
    /// Creates a new empty frame.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty array-biased frame.
    #[must_use]
    pub fn array() -> Self {
        Self {
            fields: Vec::new(),
            array_biased: true,
        }
    }

    /// Sets a field and returns the frame.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.put(name, value);
        self
    }

    /// Sets a named field, replacing an existing value in place.
    pub fn put(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|f| f.name.as_deref() == Some(name.as_str())) {
            Some(field) => field.value = value,
            None => self.fields.push(Field {
                name: Some(name),
                value,
            }),
        }
    }

    /// Appends an anonymous positional value.
    pub fn push(&mut self, value: impl Into<Value>) {
        self.fields.push(Field {
            name: None,
            value: value.into(),
        });
    }

    /// Gets a field value by exact (case-sensitive) name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|f| f.name.as_deref() == Some(name))
            .map(|f| &f.value)
    }

    /// Gets a mutable field value by exact name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields
            .iter_mut()
            .find(|f| f.name.as_deref() == Some(name))
            .map(|f| &mut f.value)
    }

    /// Gets a field value by position.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.fields.get(index).map(|f| &f.value)
    }

    /// Resolves a dotted path through nested frames.
    ///
    /// An exact field name always wins, so a field literally named `a.b`
    /// shadows the nested path `a` → `b`. Numeric segments address
    /// positional values when no field carries that name.
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        if let Some(value) = self.get(path) {
            return Some(value);
        }
        if let Ok(index) = path.parse::<usize>() {
            return self.get_index(index);
        }
        for (pos, _) in path.match_indices('.') {
            let (head, rest) = (&path[..pos], &path[pos + 1..]);
            let nested = self
                .get(head)
                .or_else(|| head.parse::<usize>().ok().and_then(|i| self.get_index(i)));
            if let Some(Value::Frame(child)) = nested {
                if let Some(value) = child.get_path(rest) {
                    return Some(value);
                }
            }
        }
        None
    }

    /// Returns true if a field with the exact name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Removes a named field, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let index = self
            .fields
            .iter()
            .position(|f| f.name.as_deref() == Some(name))?;
        Some(self.fields.remove(index).value)
    }

    /// Removes all fields.
    pub fn clear(&mut self) {
        self.fields.clear();
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the frame has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns true if the frame holds positional values.
    #[must_use]
    pub const fn is_array_biased(&self) -> bool {
        self.array_biased
    }

    /// Iterates over the fields in order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    /// Returns the names of all named fields in order.
    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().filter_map(Field::name).collect()
    }

    /// Converts to JSON. Array-biased frames become arrays.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        if self.array_biased {
            return serde_json::Value::Array(self.fields.iter().map(|f| f.value.to_json()).collect());
        }
        let mut map = serde_json::Map::new();
        for (index, field) in self.fields.iter().enumerate() {
            let key = field
                .name
                .clone()
                .unwrap_or_else(|| index.to_string());
            map.insert(key, field.value.to_json());
        }
        serde_json::Value::Object(map)
    }

    /// Builds a frame from JSON.
    ///
    /// Objects become named frames and arrays become array-biased frames. A
    /// scalar becomes a single anonymous value.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Object(map) => map
                .iter()
                .fold(Self::new(), |frame, (k, v)| frame.with(k.clone(), Value::from_json(v))),
            serde_json::Value::Array(items) => {
                let mut frame = Self::array();
                for item in items {
                    frame.push(Value::from_json(item));
                }
                frame
            }
            scalar => {
                let mut frame = Self::array();
                frame.push(Value::from_json(scalar));
                frame
            }
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Frame {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut frame = Self::new();
        for (k, v) in iter {
            frame.put(k, v);
        }
        frame
    }
}
