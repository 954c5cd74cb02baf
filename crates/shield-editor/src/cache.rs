use crate::store::{ProjectSummary, Store};
use crate::topology::Topology;
use crate::versioned::Memoized;

pub struct Cache {
    pub topology: Memoized<Store, (u64, u64), Topology>,
    pub summary: Memoized<Store, ((u64, u64), u64), ProjectSummary>,
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

impl Cache {
    pub fn new() -> Self {
        let topology = Memoized::new(
            |s: &Store| s.canvas_key(),
            |s: &Store| s.topology_uncached(),
        );

        let summary = Memoized::new(
            |s: &Store| (s.canvas_key(), s.shields.version()),
            |s: &Store| s.summary_uncached(),
        );

        Self { topology, summary }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shield_model::{NodeKind, Vec2};

    #[test]
    fn test_topology_follows_canvas_revision() {
        let mut store = Store::default();
        let mut cache = Cache::new();

        let a = store
            .add_node(NodeKind::PowerSource, "Grid", Vec2::ZERO)
            .unwrap();
        let b = store.add_node(NodeKind::Shield, "SH", Vec2::ZERO).unwrap();
        assert_eq!(cache.topology.get(&store).edge_count(), 0);
        assert_eq!(cache.topology.get(&store).edge_count(), 0);
        assert_eq!(cache.topology.version(), 1);

        store.canvas.add_connection(a, b);
        assert_eq!(cache.topology.get(&store).feeders(b), vec![a]);
        assert_eq!(cache.topology.version(), 2);
    }

    #[test]
    fn test_summary_follows_worksheet_edits() {
        let mut store = Store::default();
        let mut cache = Cache::new();
        let id = store.add_node(NodeKind::Shield, "SH", Vec2::ZERO).unwrap();
        assert_eq!(cache.summary.get(&store).consumers, 0);

        store
            .edit_shield(id, |s| {
                s.add_consumer(shield_model::ConsumerModel::new("A", 1.0));
                Ok(())
            })
            .unwrap();
        assert_eq!(cache.summary.get(&store).consumers, 1);
    }

    #[test]
    fn test_replacing_document_invalidates() {
        let mut store = Store::default();
        let mut cache = Cache::new();
        store.add_node(NodeKind::Shield, "SH", Vec2::ZERO).unwrap();
        assert_eq!(cache.topology.get(&store).node_count(), 1);

        // A fresh canvas restarts its revision count.
        store.replace_document(Default::default());
        assert_eq!(cache.topology.get(&store).node_count(), 0);
    }
}
