//! REST page descriptor: a path plus query parameters.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name.
    pub key: String,
    /// Parameter value, unencoded.
    pub value: String,
}

impl Param {
    /// Creates a parameter.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Request for one page of a REST resource.
///
/// This is the descriptor type carried in [`RelativeLinks`](super::RelativeLinks)
/// by both the HTTP fetcher and the in-memory stats store. Parameter order
/// is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    path: String,
    params: Vec<Param>,
}

impl PageRequest {
    /// Creates a request for `path` with no parameters.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: Vec::new(),
        }
    }

    /// Creates a request for `path` with `params`.
    pub fn with_params(path: impl Into<String>, params: Vec<Param>) -> Self {
        Self {
            path: path.into(),
            params,
        }
    }

    /// Returns the resource path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the query parameters in order.
    #[must_use]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Returns the value of the first parameter named `key`.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value.as_str())
    }

    /// Sets `key` to `value`, replacing every existing occurrence.
    #[must_use]
    pub fn set_param(mut self, key: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        match self.params.iter().position(|p| p.key == key) {
            Some(pos) => {
                self.params.retain(|p| p.key != key);
                self.params.insert(pos, Param::new(key, value));
            }
            None => self.params.push(Param::new(key, value)),
        }
        self
    }

    /// Removes every parameter named `key`.
    #[must_use]
    pub fn without_param(mut self, key: &str) -> Self {
        self.params.retain(|p| p.key != key);
        self
    }
}

impl fmt::Display for PageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        for (i, p) in self.params.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{}={}", p.key, p.value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PageRequest {
        PageRequest::with_params(
            "/stats",
            vec![Param::new("direction", "forwards"), Param::new("limit", "1")],
        )
    }

    #[test]
    fn param_lookup() {
        let req = request();
        assert_eq!(req.param("limit"), Some("1"));
        assert_eq!(req.param("unit"), None);
    }

    #[test]
    fn set_param_keeps_position() {
        let req = request().set_param("direction", "backwards");
        assert_eq!(req.to_string(), "/stats?direction=backwards&limit=1");
    }

    #[test]
    fn set_param_appends_new_key() {
        let req = request().set_param("cursor", "x");
        assert_eq!(req.params().len(), 3);
        assert_eq!(req.without_param("cursor"), request());
    }
}
