use std::collections::BTreeMap;

use crate::node::NodeId;
use crate::shield::ShieldData;

/// Worksheets keyed by shield node id.
///
/// Joined to the diagram only by id: removing a node leaves its worksheet
/// here until the store is cleared or the entry is removed explicitly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShieldStorage {
    entries: BTreeMap<NodeId, ShieldData>,
}

impl ShieldStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: NodeId) -> Option<&ShieldData> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut ShieldData> {
        self.entries.get_mut(&id)
    }

    /// Returns the worksheet for `id`, creating it with `create` first if
    /// absent.
    pub fn get_or_insert_with(
        &mut self,
        id: NodeId,
        create: impl FnOnce() -> ShieldData,
    ) -> &mut ShieldData {
        self.entries.entry(id).or_insert_with(create)
    }

    pub fn insert(
        &mut self,
        id: NodeId,
        data: ShieldData,
    ) -> Option<ShieldData> {
        self.entries.insert(id, data)
    }

    pub fn remove(&mut self, id: NodeId) -> Option<ShieldData> {
        self.entries.remove(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &ShieldData)> {
        self.entries.iter().map(|(id, data)| (*id, data))
    }

    pub fn iter_mut(
        &mut self,
    ) -> impl Iterator<Item = (NodeId, &mut ShieldData)> {
        self.entries.iter_mut().map(|(id, data)| (*id, data))
    }

    /// Keeps only the worksheets for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(NodeId) -> bool) {
        self.entries.retain(|id, _| keep(*id));
    }
}

impl FromIterator<(NodeId, ShieldData)> for ShieldStorage {
    fn from_iter<I: IntoIterator<Item = (NodeId, ShieldData)>>(
        iter: I,
    ) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_insert_creates_once() {
        let mut storage = ShieldStorage::new();
        storage
            .get_or_insert_with(NodeId(3), || ShieldData::new("SH-3"))
            .demand_ratio = 0.8;
        let again = storage
            .get_or_insert_with(NodeId(3), || ShieldData::new("other"));

        assert_eq!(again.name, "SH-3");
        assert_eq!(again.demand_ratio, 0.8);
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_iteration_is_ordered_by_id() {
        let storage: ShieldStorage = [
            (NodeId(9), ShieldData::new("c")),
            (NodeId(2), ShieldData::new("a")),
            (NodeId(5), ShieldData::new("b")),
        ]
        .into_iter()
        .collect();

        let ids: Vec<_> = storage.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![NodeId(2), NodeId(5), NodeId(9)]);
    }

    #[test]
    fn test_retain_and_clear() {
        let mut storage: ShieldStorage = (1..=4)
            .map(|i| (NodeId(i), ShieldData::default()))
            .collect();
        storage.retain(|id| id.0 % 2 == 0);
        assert!(storage.contains(NodeId(2)));
        assert!(!storage.contains(NodeId(3)));

        storage.clear();
        assert!(storage.is_empty());
    }
}
