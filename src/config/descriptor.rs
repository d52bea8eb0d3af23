//! Typed records parsed from an application descriptor.
//!
//! # Design Decisions
//! - Records are validated on construction; holding an `ApplicationDescriptor`
//!   means every mapping references a declared handler
//! - Declaration order is preserved everywhere

/// Ordered init-parameter list. Later entries shadow earlier ones on lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitParameters {
    entries: Vec<(String, String)>,
}

impl InitParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Value of the parameter, or `None` if it was never declared.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for InitParameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

/// A declared handler: name, backing type identifier, init params.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerDescriptor {
    pub name: String,
    pub class: String,
    pub init_parameters: InitParameters,
}

/// A declared `url-pattern` → `handler-name` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingDeclaration {
    /// Always starts with exactly one `/`.
    pub url_pattern: String,
    pub handler_name: String,
}

/// Everything one application's descriptor declares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationDescriptor {
    pub context_parameters: InitParameters,
    pub handlers: Vec<HandlerDescriptor>,
    pub mappings: Vec<MappingDeclaration>,
}

impl ApplicationDescriptor {
    pub fn handler(&self, name: &str) -> Option<&HandlerDescriptor> {
        self.handlers.iter().find(|h| h.name == name)
    }
}

/// Trim every leading slash, then prepend exactly one.
pub fn normalize_url_pattern(pattern: &str) -> String {
    format!("/{}", pattern.trim_start_matches('/'))
}
