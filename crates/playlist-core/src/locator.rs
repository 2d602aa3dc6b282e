//! Name-based lookup over the backend's listing endpoints.
//!
//! Lookups are fail-open: a query that cannot be answered is reported as
//! [`Lookup::QueryFailed`] and callers collapse it to "not found", falling
//! back to their create/upload path. Only the first page is inspected.

use crate::error::{Result, TransportError};
use crate::transport::{Query, Session, Transport};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Listing shapes
// ---------------------------------------------------------------------------

/// One element of a listing's `items` array. Fields are kept loose so that a
/// single odd item does not invalidate the whole page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListedItem {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    name: Value,
}

impl ListedItem {
    /// The item's id, if present and a well-formed UUID.
    pub fn id(&self) -> Option<Uuid> {
        self.id.as_str().and_then(|s| Uuid::parse_str(s).ok())
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_str()
    }
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    items: Vec<ListedItem>,
}

/// Read the `items` of a listing response.
pub fn parse_items(path: &str, body: Value) -> Result<Vec<ListedItem>> {
    serde_json::from_value::<Page>(body)
        .map(|page| page.items)
        .map_err(|e| TransportError::Decode {
            path: path.to_string(),
            reason: e.to_string(),
        })
}

/// Fetch one page of a listing and return its items.
pub fn list_items<T: Transport + ?Sized>(
    session: &Session<'_, T>,
    path: &str,
    query: Query<'_>,
) -> Result<Vec<ListedItem>> {
    let body = session.get(path, query)?;
    parse_items(path, body)
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(Uuid),
    NotFound,
    QueryFailed(TransportError),
}

impl Lookup {
    /// Collapse to an optional id, treating a failed query as a miss.
    pub fn or_not_found(self, what: &str) -> Option<Uuid> {
        match self {
            Lookup::Found(id) => Some(id),
            Lookup::NotFound => None,
            Lookup::QueryFailed(e) => {
                warn!(what, error = %e, "lookup failed; treating as not found");
                None
            }
        }
    }
}

/// Return the id of the first listed item that satisfies `matches` and has a
/// well-formed id.
pub fn find<T, F>(session: &Session<'_, T>, path: &str, query: Query<'_>, matches: F) -> Lookup
where
    T: Transport + ?Sized,
    F: Fn(&ListedItem) -> bool,
{
    match find_all(session, path, query, matches) {
        Ok(ids) => ids.first().copied().map_or(Lookup::NotFound, Lookup::Found),
        Err(e) => Lookup::QueryFailed(e),
    }
}

/// Ids of every listed item on the first page that satisfies `matches`.
pub fn find_all<T, F>(
    session: &Session<'_, T>,
    path: &str,
    query: Query<'_>,
    matches: F,
) -> Result<Vec<Uuid>>
where
    T: Transport + ?Sized,
    F: Fn(&ListedItem) -> bool,
{
    let items = list_items(session, path, query)?;
    Ok(items
        .iter()
        .filter(|item| matches(item))
        .filter_map(ListedItem::id)
        .collect())
}

/// Read the `id` of a create/upload response; the nil UUID counts as absent.
pub fn created_id(body: &Value) -> Option<Uuid> {
    body.get("id")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .filter(|id| !id.is_nil())
}

/// Case-insensitive name equality predicate.
pub fn name_eq(name: &str) -> impl Fn(&ListedItem) -> bool {
    let wanted = name.to_lowercase();
    move |item| item.name().is_some_and(|n| n.to_lowercase() == wanted)
}
