use std::collections::HashMap;

use super::ado::{AdoWorkItem, Relation};

/// Work items fetched during the listing pass, keyed by id and kept in
/// listing order. Relation targets are resolved through it.
#[derive(Debug, Default)]
pub struct WorkItemCache {
    by_id: HashMap<u64, AdoWorkItem>,
    order: Vec<u64>,
}

impl WorkItemCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Record a listing entry. The item is stored only the first time its id is seen.
    pub fn insert(&mut self, item: AdoWorkItem) {
        let id = item.id;
        self.by_id.entry(id).or_insert(item);
        self.order.push(id);
    }

    /// Record a repeated listing entry for an id that is already cached.
    pub fn push_listed(&mut self, id: u64) {
        if self.by_id.contains_key(&id) {
            self.order.push(id);
        }
    }

    pub fn get(&self, id: u64) -> Option<&AdoWorkItem> {
        self.by_id.get(&id)
    }

    pub fn title_of(&self, id: u64) -> Option<&str> {
        self.get(id).map(AdoWorkItem::title)
    }

    /// Title of the work item a relation points at.
    pub fn resolve_title(&self, relation: &Relation) -> Option<&str> {
        relation.target_id().and_then(|id| self.title_of(id))
    }

    /// Listed work items, in listing order.
    pub fn items(&self) -> Vec<&AdoWorkItem> {
        self.order.iter().filter_map(|id| self.by_id.get(id)).collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }
}
