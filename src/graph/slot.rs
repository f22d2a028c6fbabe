//! Per-vertex storage: out-edge slab with free list, predecessor links

use std::collections::HashMap;

use super::VertexId;

/// Arena state of one vertex id
#[derive(Debug)]
pub enum VertexSlot<V, E> {
    /// Never allocated (gap below the highest explicit id)
    Vacant,
    Live(VertexData<V, E>),
    /// Tombstone: the id was deleted and is never handed out again
    Retired,
}

impl<V, E> VertexSlot<V, E> {
    pub fn live(&self) -> Option<&VertexData<V, E>> {
        match self {
            VertexSlot::Live(data) => Some(data),
            _ => None,
        }
    }

    pub fn live_mut(&mut self) -> Option<&mut VertexData<V, E>> {
        match self {
            VertexSlot::Live(data) => Some(data),
            _ => None,
        }
    }
}

/// Forward edge as stored in its source's slab
#[derive(Debug)]
pub struct OutEdge<E> {
    pub target: VertexId,
    pub property: E,
    /// Slot of the reverse record in the target's slab (undirected only)
    pub twin: Option<u32>,
}

#[derive(Debug)]
struct EdgeSlot<E> {
    generation: u32,
    edge: Option<OutEdge<E>>,
}

/// Reverse entry held at the target: which source slot produced this edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredLink {
    pub source: VertexId,
    pub slot: u32,
    pub generation: u32,
}

/// Live vertex payload
#[derive(Debug)]
pub struct VertexData<V, E> {
    pub property: V,
    slots: Vec<EdgeSlot<E>>,
    free: Vec<u32>,
    by_target: HashMap<VertexId, u32>,
    preds: Vec<PredLink>,
}

impl<V, E> VertexData<V, E> {
    pub fn new(property: V) -> Self {
        Self {
            property,
            slots: Vec::new(),
            free: Vec::new(),
            by_target: HashMap::new(),
            preds: Vec::new(),
        }
    }

    pub fn out_degree(&self) -> usize {
        self.by_target.len()
    }

    pub fn in_degree(&self) -> usize {
        self.preds.len()
    }

    pub fn slot_of(&self, target: VertexId) -> Option<u32> {
        self.by_target.get(&target).copied()
    }

    pub fn generation(&self, slot: u32) -> u32 {
        self.slots.get(slot as usize).map_or(0, |s| s.generation)
    }

    /// Edge at `slot` if it is live and still of `generation`
    pub fn edge_checked(&self, slot: u32, generation: u32) -> Option<&OutEdge<E>> {
        let entry = self.slots.get(slot as usize)?;
        if entry.generation != generation {
            return None;
        }
        entry.edge.as_ref()
    }

    pub fn edge_checked_mut(&mut self, slot: u32, generation: u32) -> Option<&mut OutEdge<E>> {
        let entry = self.slots.get_mut(slot as usize)?;
        if entry.generation != generation {
            return None;
        }
        entry.edge.as_mut()
    }

    pub fn edge_mut(&mut self, slot: u32) -> Option<&mut OutEdge<E>> {
        self.slots.get_mut(slot as usize)?.edge.as_mut()
    }

    /// Store a new out-edge, recycling a tombstoned slot when one is free.
    /// Caller guarantees no live edge to `target` exists yet.
    pub fn insert_out(&mut self, target: VertexId, property: E, twin: Option<u32>) -> u32 {
        let edge = OutEdge { target, property, twin };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot as usize].edge = Some(edge);
                slot
            }
            None => {
                let slot = self.slots.len() as u32;
                self.slots.push(EdgeSlot { generation: 0, edge: Some(edge) });
                slot
            }
        };
        self.by_target.insert(target, slot);
        slot
    }

    /// Tombstone the edge at `slot`; bumps the generation so old handles die
    pub fn remove_out(&mut self, slot: u32) -> Option<OutEdge<E>> {
        let entry = self.slots.get_mut(slot as usize)?;
        let edge = entry.edge.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(slot);
        self.by_target.remove(&edge.target);
        Some(edge)
    }

    pub fn set_twin(&mut self, slot: u32, twin: u32) {
        if let Some(edge) = self.edge_mut(slot) {
            edge.twin = Some(twin);
        }
    }

    /// Live out-edges in slot order
    pub fn out_edges(&self) -> impl Iterator<Item = (u32, &OutEdge<E>)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, entry)| entry.edge.as_ref().map(|edge| (slot as u32, edge)))
    }

    pub fn out_edges_mut(&mut self) -> impl Iterator<Item = &mut OutEdge<E>> + '_ {
        self.slots.iter_mut().filter_map(|entry| entry.edge.as_mut())
    }

    pub fn push_pred(&mut self, link: PredLink) {
        self.preds.push(link);
    }

    /// Drop the predecessor entry for `(source, slot)`, keeping order
    pub fn remove_pred(&mut self, source: VertexId, slot: u32) -> bool {
        match self.preds.iter().position(|p| p.source == source && p.slot == slot) {
            Some(pos) => {
                self.preds.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn preds(&self) -> &[PredLink] {
        &self.preds
    }

    /// Every vertex this one shares an edge with, either direction
    pub fn neighbor_ids(&self) -> Vec<VertexId> {
        let mut ids: Vec<VertexId> = self
            .by_target
            .keys()
            .copied()
            .chain(self.preds.iter().map(|p| p.source))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Consume the vertex, returning `(slot, target)` of each out-edge and the predecessor links
    pub fn into_adjacency(self) -> (Vec<(u32, VertexId)>, Vec<PredLink>) {
        let out = self.out_edges().map(|(slot, edge)| (slot, edge.target)).collect();
        (out, self.preds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let mut data: VertexData<(), u8> = VertexData::new(());
        let a = data.insert_out(7, 1, None);
        let b = data.insert_out(9, 2, None);

        assert_eq!(data.out_degree(), 2);
        assert_eq!(data.slot_of(7), Some(a));
        assert_eq!(data.slot_of(9), Some(b));
        assert_eq!(data.slot_of(8), None);

        let targets: Vec<_> = data.out_edges().map(|(_, e)| e.target).collect();
        assert_eq!(targets, vec![7, 9]);
    }

    #[test]
    fn test_removed_slot_is_recycled_with_new_generation() {
        let mut data: VertexData<(), u8> = VertexData::new(());
        let slot = data.insert_out(7, 1, None);
        let old_gen = data.generation(slot);

        let removed = data.remove_out(slot).unwrap();
        assert_eq!(removed.target, 7);
        assert_eq!(data.out_degree(), 0);
        assert!(data.edge_checked(slot, old_gen).is_none());

        let reused = data.insert_out(11, 3, None);
        assert_eq!(reused, slot);
        assert_ne!(data.generation(reused), old_gen);
        assert!(data.edge_checked(reused, old_gen).is_none());
        assert_eq!(data.edge_checked(reused, data.generation(reused)).unwrap().target, 11);
    }

    #[test]
    fn test_remove_twice_is_noop() {
        let mut data: VertexData<(), u8> = VertexData::new(());
        let slot = data.insert_out(1, 0, None);
        assert!(data.remove_out(slot).is_some());
        assert!(data.remove_out(slot).is_none());
        assert!(data.remove_out(42).is_none());
    }

    #[test]
    fn test_pred_removal_keeps_order() {
        let mut data: VertexData<(), ()> = VertexData::new(());
        data.push_pred(PredLink { source: 1, slot: 0, generation: 0 });
        data.push_pred(PredLink { source: 2, slot: 0, generation: 0 });
        data.push_pred(PredLink { source: 3, slot: 4, generation: 1 });

        assert!(data.remove_pred(2, 0));
        assert!(!data.remove_pred(2, 0));
        let sources: Vec<_> = data.preds().iter().map(|p| p.source).collect();
        assert_eq!(sources, vec![1, 3]);
    }

    #[test]
    fn test_neighbor_ids_merges_both_directions() {
        let mut data: VertexData<(), ()> = VertexData::new(());
        data.insert_out(5, (), None);
        data.insert_out(2, (), None);
        data.push_pred(PredLink { source: 5, slot: 0, generation: 0 });
        data.push_pred(PredLink { source: 1, slot: 0, generation: 0 });

        assert_eq!(data.neighbor_ids(), vec![1, 2, 5]);
    }
}
