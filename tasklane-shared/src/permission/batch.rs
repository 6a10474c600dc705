/// Helpers for requests that name several ids at once
///
/// Ids come from URLs, so they are raw strings. They are deduplicated in
/// first-seen order, and anything that is not a UUID simply never matches.

use std::collections::HashSet;

use uuid::Uuid;

use super::outcome::MissingIds;

/// Removes repeated ids, keeping the first spelling of each
///
/// Two spellings of the same UUID (upper case, braces, `urn:uuid:`) count
/// as one id. Malformed ids are compared as written.
pub fn dedup_ids<S: AsRef<str>>(ids: &[S]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(ids.len());

    ids.iter()
        .map(|id| id.as_ref())
        .filter(|id| {
            let key = Uuid::parse_str(id)
                .map(|uuid| uuid.to_string())
                .unwrap_or_else(|_| id.to_string());
            seen.insert(key)
        })
        .map(str::to_string)
        .collect()
}

/// Distinct UUIDs among `ids`, skipping malformed entries
pub fn parse_ids<S: AsRef<str>>(ids: &[S]) -> Vec<Uuid> {
    let mut seen = HashSet::with_capacity(ids.len());

    ids.iter()
        .filter_map(|id| Uuid::parse_str(id.as_ref()).ok())
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Matches a batch fetch against the ids that were asked for
///
/// Returns the found entities in request order (one per distinct id), or
/// every requested id that has no entity, including malformed ones.
pub fn collect_found<T, F>(
    requested: &[String],
    found: Vec<T>,
    id_of: F,
) -> Result<Vec<T>, MissingIds>
where
    T: Clone,
    F: Fn(&T) -> Uuid,
{
    let mut entities = Vec::with_capacity(requested.len());
    let mut missing = Vec::new();

    for raw in dedup_ids(requested) {
        let entity = Uuid::parse_str(&raw)
            .ok()
            .and_then(|id| found.iter().find(|e| id_of(e) == id));

        match entity {
            Some(entity) => entities.push(entity.clone()),
            None => missing.push(raw),
        }
    }

    if missing.is_empty() {
        Ok(entities)
    } else {
        Err(MissingIds(missing))
    }
}
