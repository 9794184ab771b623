//! Tag registry: named, ordered groups of service ids.

use crate::internal::FastMap;
use crate::key::ServiceId;

#[derive(Default)]
pub(crate) struct TagRegistry {
    tags: FastMap<String, Vec<ServiceId>>,
}

impl TagRegistry {
    /// Adds `ids` under `tag`. Merging keeps existing order and appends
    /// unseen ids; replacing swaps the whole set.
    pub(crate) fn tag(&mut self, tag: &str, ids: Vec<ServiceId>, merge: bool) {
        let set = self.tags.entry(tag.to_string()).or_default();
        if !merge {
            set.clear();
        }
        for id in ids {
            if !set.contains(&id) {
                set.push(id);
            }
        }
    }

    /// Removes `ids` from `tag`, dropping the tag once empty.
    pub(crate) fn untag(&mut self, tag: &str, ids: &[ServiceId]) {
        if let Some(set) = self.tags.get_mut(tag) {
            set.retain(|id| !ids.contains(id));
            if set.is_empty() {
                self.tags.remove(tag);
            }
        }
    }

    pub(crate) fn get(&self, tag: &str) -> &[ServiceId] {
        self.tags.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tags.keys().cloned().collect();
        names.sort();
        names
    }

    pub(crate) fn clear(&mut self) {
        self.tags.clear();
    }
}
