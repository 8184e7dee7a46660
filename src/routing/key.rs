//! Function identity derived from the request path.

use std::fmt;

/// Path prefix under which functions are invoked.
pub const FUNCTION_PATH_PREFIX: &str = "/function/";

/// Identifies one scalable unit: a function name inside a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionKey {
    name: String,
    namespace: String,
}

impl FunctionKey {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// Derive the key from an invocation path such as `/function/figlet.dev/rest?q=1`.
    ///
    /// Returns `None` when the path does not address a function.
    pub fn from_path(path: &str, default_namespace: &str) -> Option<Self> {
        let full_name = service_name(path)?;
        let (name, namespace) = split_namespace(full_name, default_namespace);
        Some(Self::new(name, namespace))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl fmt::Display for FunctionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.name, self.namespace)
    }
}

/// Extract the `<name>[.<namespace>]` segment following `/function/`.
pub fn service_name(path: &str) -> Option<&str> {
    let rest = path.strip_prefix(FUNCTION_PATH_PREFIX)?;
    let end = rest.find(['/', '?']).unwrap_or(rest.len());
    let segment = rest[..end].trim();
    if segment.is_empty() {
        None
    } else {
        Some(segment)
    }
}

/// Split on the last `.`; anything without a usable suffix lands in `default_namespace`.
pub fn split_namespace<'a>(full_name: &'a str, default_namespace: &'a str) -> (&'a str, &'a str) {
    match full_name.rsplit_once('.') {
        Some((name, namespace)) if !name.is_empty() && !namespace.is_empty() => (name, namespace),
        _ => (full_name, default_namespace),
    }
}
