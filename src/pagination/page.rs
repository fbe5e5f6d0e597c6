//! Pages and their relative links.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Named relation between a page and another page of the same result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    /// Head of the result set in the query's direction.
    First,
    /// The page itself.
    Current,
    /// The following page in the query's direction.
    Next,
}

impl Relation {
    /// Returns the relation name as used in `Link` headers.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Current => "current",
            Self::Next => "next",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Relation {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(Self::First),
            "current" => Ok(Self::Current),
            "next" => Ok(Self::Next),
            other => Err(FetchError::InvalidLink(format!("unknown relation `{other}`"))),
        }
    }
}

/// Fetch descriptors for the pages related to one page.
///
/// Supplied by the fetch collaborator together with the page; the cursor
/// never computes links itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativeLinks<D> {
    first: Option<D>,
    current: Option<D>,
    next: Option<D>,
}

impl<D> Default for RelativeLinks<D> {
    fn default() -> Self {
        Self {
            first: None,
            current: None,
            next: None,
        }
    }
}

impl<D> RelativeLinks<D> {
    /// Creates an empty link set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the descriptor for `relation`, replacing any previous one.
    #[must_use]
    pub fn with(mut self, relation: Relation, descriptor: D) -> Self {
        self.set(relation, descriptor);
        self
    }

    /// Sets the descriptor for `relation`, replacing any previous one.
    pub fn set(&mut self, relation: Relation, descriptor: D) {
        *self.slot(relation) = Some(descriptor);
    }

    /// Returns the descriptor for `relation`, if present.
    #[must_use]
    pub const fn get(&self, relation: Relation) -> Option<&D> {
        match relation {
            Relation::First => self.first.as_ref(),
            Relation::Current => self.current.as_ref(),
            Relation::Next => self.next.as_ref(),
        }
    }

    /// Returns `true` if a descriptor for `relation` is present.
    #[must_use]
    pub const fn contains(&self, relation: Relation) -> bool {
        self.get(relation).is_some()
    }

    fn slot(&mut self, relation: Relation) -> &mut Option<D> {
        match relation {
            Relation::First => &mut self.first,
            Relation::Current => &mut self.current,
            Relation::Next => &mut self.next,
        }
    }
}

/// One bounded, ordered slice of a remote result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T, D> {
    items: Vec<T>,
    links: RelativeLinks<D>,
}

impl<T, D> Page<T, D> {
    /// Creates a page from its items and links.
    #[must_use]
    pub const fn new(items: Vec<T>, links: RelativeLinks<D>) -> Self {
        Self { items, links }
    }

    /// Returns the page's items in order.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Returns the page's relative links.
    #[must_use]
    pub const fn links(&self) -> &RelativeLinks<D> {
        &self.links
    }

    /// Consumes the page, returning its items.
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Consumes the page, returning items and links.
    #[must_use]
    pub fn into_parts(self) -> (Vec<T>, RelativeLinks<D>) {
        (self.items, self.links)
    }
}
