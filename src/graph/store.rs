//! PropertyGraph: in-memory dynamic graph with dual adjacency
//!
//! Every vertex owns an out-edge slab plus a list of predecessor links, so
//! both directions are walkable without a scan. Vertices sit in an id-indexed
//! arena of `RwLock`s; edge and vertex mutations lock only the vertices they
//! touch, always in ascending id order.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::slot::{PredLink, VertexData, VertexSlot};
use super::traversal;
use super::{Directedness, EdgeHandle, EdgeInsertion, VertexId};
use crate::error::{GraphError, Result};

type SlotLock<V, E> = RwLock<VertexSlot<V, E>>;
type SlotWriteGuard<'a, V, E> = RwLockWriteGuard<'a, VertexSlot<V, E>>;

/// Dynamic property graph.
///
/// Vertex creation needs `&mut self` (it may grow the arena). Edge insertion,
/// edge deletion, vertex deletion and property writes take `&self` and may run
/// from many threads at once.
pub struct PropertyGraph<V, E> {
    directedness: Directedness,
    slots: Vec<SlotLock<V, E>>,
    vertex_count: AtomicUsize,
    /// Forward edge records; an undirected pair counts twice, a self-loop once
    edge_count: AtomicUsize,
}

impl<V, E> PropertyGraph<V, E> {
    pub fn new(directedness: Directedness) -> Self {
        Self::with_capacity(directedness, 0)
    }

    pub fn directed() -> Self {
        Self::new(Directedness::Directed)
    }

    pub fn undirected() -> Self {
        Self::new(Directedness::Undirected)
    }

    pub fn with_capacity(directedness: Directedness, vertices: usize) -> Self {
        Self {
            directedness,
            slots: Vec::with_capacity(vertices),
            vertex_count: AtomicUsize::new(0),
            edge_count: AtomicUsize::new(0),
        }
    }

    pub fn directedness(&self) -> Directedness {
        self.directedness
    }

    pub fn is_directed(&self) -> bool {
        self.directedness == Directedness::Directed
    }

    pub fn num_vertices(&self) -> usize {
        self.vertex_count.load(Ordering::Acquire)
    }

    pub fn num_edges(&self) -> usize {
        self.edge_count.load(Ordering::Acquire)
    }

    /// One past the highest id ever allocated. Live ids are a subset of `0..id_bound()`.
    pub fn id_bound(&self) -> VertexId {
        self.slots.len() as VertexId
    }

    fn slot(&self, id: VertexId) -> Option<&SlotLock<V, E>> {
        usize::try_from(id).ok().and_then(|idx| self.slots.get(idx))
    }

    // === VERTEX OPERATIONS ===

    /// Allocate the next id (the current `id_bound`)
    pub fn add_vertex(&mut self, property: V) -> VertexId {
        let id = self.id_bound();
        self.slots.push(RwLock::new(VertexSlot::Live(VertexData::new(property))));
        *self.vertex_count.get_mut() += 1;
        id
    }

    pub fn add_vertex_default(&mut self) -> VertexId
    where
        V: Default,
    {
        self.add_vertex(V::default())
    }

    /// Whether `id` may still be claimed by `add_vertex_with_id`
    pub fn claimable(&self, id: VertexId) -> Result<()> {
        let Some(lock) = self.slot(id) else {
            return Ok(());
        };
        match &*lock.read() {
            VertexSlot::Vacant => Ok(()),
            VertexSlot::Live(_) => Err(GraphError::VertexExists(id)),
            VertexSlot::Retired => Err(GraphError::VertexRetired(id)),
        }
    }

    /// Create a vertex under an explicit id. Gaps below `id` become vacant
    /// slots that may be claimed later; a deleted id never comes back.
    pub fn add_vertex_with_id(&mut self, id: VertexId, property: V) -> Result<VertexId> {
        let idx = usize::try_from(id).map_err(|_| GraphError::VertexIdTooLarge {
            id,
            limit: usize::MAX as VertexId,
        })?;
        if idx >= self.slots.len() {
            self.slots.resize_with(idx + 1, || RwLock::new(VertexSlot::Vacant));
        }

        let slot = self.slots[idx].get_mut();
        match *slot {
            VertexSlot::Vacant => {}
            VertexSlot::Live(_) => return Err(GraphError::VertexExists(id)),
            VertexSlot::Retired => return Err(GraphError::VertexRetired(id)),
        }
        *slot = VertexSlot::Live(VertexData::new(property));
        *self.vertex_count.get_mut() += 1;
        Ok(id)
    }

    pub fn contains_vertex(&self, id: VertexId) -> bool {
        self.slot(id).map_or(false, |lock| lock.read().live().is_some())
    }

    /// Read view of a live vertex. Holds its read lock until dropped.
    pub fn find_vertex(&self, id: VertexId) -> Option<VertexRef<'_, V, E>> {
        let guard = self.slot(id)?.read();
        let data = RwLockReadGuard::try_map(guard, VertexSlot::live).ok()?;
        Some(VertexRef { id, data })
    }

    /// Live vertices in ascending id order. Each item holds its vertex's read lock.
    pub fn vertices(&self) -> impl Iterator<Item = VertexRef<'_, V, E>> + '_ {
        (0..self.id_bound()).filter_map(move |id| self.find_vertex(id))
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..self.id_bound()).filter(move |&id| self.contains_vertex(id))
    }

    pub fn vertex_property(&self, id: VertexId) -> Option<V>
    where
        V: Clone,
    {
        self.find_vertex(id).map(|v| v.property().clone())
    }

    pub fn set_property(&self, id: VertexId, property: V) -> bool {
        self.update_property(id, |p| *p = property)
    }

    /// Mutate a vertex property in place. Returns false when `id` is not live.
    pub fn update_property(&self, id: VertexId, f: impl FnOnce(&mut V)) -> bool {
        let Some(lock) = self.slot(id) else {
            return false;
        };
        let mut guard = lock.write();
        match guard.live_mut() {
            Some(data) => {
                f(&mut data.property);
                true
            }
            None => false,
        }
    }

    // === EDGE OPERATIONS ===

    /// Handle of the forward edge `src -> dst`, if present
    pub fn find_out_edge(&self, src: VertexId, dst: VertexId) -> Option<EdgeHandle> {
        let guard = self.slot(src)?.read();
        let data = guard.live()?;
        let slot = data.slot_of(dst)?;
        Some(EdgeHandle::new(src, slot, data.generation(slot)))
    }

    pub fn add_edge(&self, src: VertexId, dst: VertexId) -> EdgeInsertion
    where
        E: Clone + Default,
    {
        self.add_edge_with_property(src, dst, E::default())
    }

    /// Insert `src -> dst` (plus the reverse record when undirected).
    ///
    /// The duplicate check and the insert happen under the same locks, so
    /// racing inserts of one pair produce exactly one edge.
    pub fn add_edge_with_property(&self, src: VertexId, dst: VertexId, property: E) -> EdgeInsertion
    where
        E: Clone,
    {
        if src == dst {
            return self.add_self_loop(src, property);
        }

        let Some((mut src_guard, mut dst_guard)) = self.write_pair(src, dst) else {
            return EdgeInsertion::MissingEndpoint;
        };
        let (Some(source), Some(target)) = (src_guard.live_mut(), dst_guard.live_mut()) else {
            return EdgeInsertion::MissingEndpoint;
        };

        if let Some(slot) = source.slot_of(dst) {
            return EdgeInsertion::Exists(EdgeHandle::new(src, slot, source.generation(slot)));
        }

        let slot = match self.directedness {
            Directedness::Directed => {
                let slot = source.insert_out(dst, property, None);
                let generation = source.generation(slot);
                target.push_pred(PredLink { source: src, slot, generation });
                self.edge_count.fetch_add(1, Ordering::AcqRel);
                slot
            }
            Directedness::Undirected => {
                let slot = source.insert_out(dst, property.clone(), None);
                let back = target.insert_out(src, property, Some(slot));
                source.set_twin(slot, back);
                target.push_pred(PredLink { source: src, slot, generation: source.generation(slot) });
                source.push_pred(PredLink { source: dst, slot: back, generation: target.generation(back) });
                self.edge_count.fetch_add(2, Ordering::AcqRel);
                slot
            }
        };

        EdgeInsertion::Created(EdgeHandle::new(src, slot, source.generation(slot)))
    }

    fn add_self_loop(&self, id: VertexId, property: E) -> EdgeInsertion {
        let Some(lock) = self.slot(id) else {
            return EdgeInsertion::MissingEndpoint;
        };
        let mut guard = lock.write();
        let Some(vertex) = guard.live_mut() else {
            return EdgeInsertion::MissingEndpoint;
        };

        if let Some(slot) = vertex.slot_of(id) {
            return EdgeInsertion::Exists(EdgeHandle::new(id, slot, vertex.generation(slot)));
        }

        let slot = vertex.insert_out(id, property, None);
        let generation = vertex.generation(slot);
        vertex.push_pred(PredLink { source: id, slot, generation });
        self.edge_count.fetch_add(1, Ordering::AcqRel);
        EdgeInsertion::Created(EdgeHandle::new(id, slot, generation))
    }

    /// Write-lock two distinct vertices, lower id first
    fn write_pair(&self, a: VertexId, b: VertexId) -> Option<(SlotWriteGuard<'_, V, E>, SlotWriteGuard<'_, V, E>)> {
        let (lock_a, lock_b) = (self.slot(a)?, self.slot(b)?);
        if a < b {
            let guard_a = lock_a.write();
            let guard_b = lock_b.write();
            Some((guard_a, guard_b))
        } else {
            let guard_b = lock_b.write();
            let guard_a = lock_a.write();
            Some((guard_a, guard_b))
        }
    }

    /// Write-lock every id in `ids` (sorted, deduplicated) in order
    fn write_sorted(&self, ids: &[VertexId]) -> Vec<(VertexId, SlotWriteGuard<'_, V, E>)> {
        ids.iter()
            .filter_map(|&id| self.slot(id).map(|lock| (id, lock.write())))
            .collect()
    }

    pub fn edge_target(&self, handle: EdgeHandle) -> Option<VertexId> {
        let guard = self.slot(handle.source())?.read_recursive();
        guard
            .live()?
            .edge_checked(handle.slot(), handle.generation())
            .map(|edge| edge.target)
    }

    /// Property of the edge behind `handle`; None once the edge is gone
    pub fn edge_property(&self, handle: EdgeHandle) -> Option<E>
    where
        E: Clone,
    {
        let guard = self.slot(handle.source())?.read_recursive();
        guard
            .live()?
            .edge_checked(handle.slot(), handle.generation())
            .map(|edge| edge.property.clone())
    }

    /// Overwrite an edge property. For undirected stores both records change.
    pub fn set_edge_property(&self, handle: EdgeHandle, property: E) -> bool
    where
        E: Clone,
    {
        let source = handle.source();
        let Some(target) = self.edge_target(handle) else {
            return false;
        };

        if target == source || self.is_directed() {
            let Some(lock) = self.slot(source) else {
                return false;
            };
            let mut guard = lock.write();
            return match guard
                .live_mut()
                .and_then(|data| data.edge_checked_mut(handle.slot(), handle.generation()))
            {
                Some(edge) => {
                    edge.property = property;
                    true
                }
                None => false,
            };
        }

        let Some((mut source_guard, mut target_guard)) = self.write_pair(source, target) else {
            return false;
        };
        // Revalidate: the edge may have been deleted between the two lock acquisitions
        let Some(edge) = source_guard
            .live_mut()
            .and_then(|data| data.edge_checked_mut(handle.slot(), handle.generation()))
        else {
            return false;
        };
        let twin = edge.twin;
        edge.property = property.clone();

        if let (Some(twin), Some(data)) = (twin, target_guard.live_mut()) {
            if let Some(back) = data.edge_mut(twin) {
                back.property = property;
            }
        }
        true
    }

    /// Remove the edge `src -> dst` (and its reverse record when undirected)
    pub fn delete_edge(&self, src: VertexId, dst: VertexId) -> bool {
        if src == dst {
            let Some(lock) = self.slot(src) else {
                return false;
            };
            let mut guard = lock.write();
            let Some(vertex) = guard.live_mut() else {
                return false;
            };
            let Some(slot) = vertex.slot_of(src) else {
                return false;
            };
            vertex.remove_out(slot);
            vertex.remove_pred(src, slot);
            self.edge_count.fetch_sub(1, Ordering::AcqRel);
            return true;
        }

        let Some((mut src_guard, mut dst_guard)) = self.write_pair(src, dst) else {
            return false;
        };
        let (Some(source), Some(target)) = (src_guard.live_mut(), dst_guard.live_mut()) else {
            return false;
        };
        let Some(slot) = source.slot_of(dst) else {
            return false;
        };

        source.remove_out(slot);
        target.remove_pred(src, slot);
        let mut removed = 1;

        if self.directedness == Directedness::Undirected {
            if let Some(back) = target.slot_of(src) {
                target.remove_out(back);
                source.remove_pred(dst, back);
                removed += 1;
            }
        }

        self.edge_count.fetch_sub(removed, Ordering::AcqRel);
        true
    }

    /// Delete a vertex and every incident edge. Returns false if `id` was not
    /// live (never created, or already deleted by another caller).
    ///
    /// Locks `id` together with its neighbours in ascending order; if the
    /// neighbourhood grew between snapshot and lock the attempt is retried.
    pub fn delete_vertex(&self, id: VertexId) -> bool {
        let Some(lock) = self.slot(id) else {
            return false;
        };

        loop {
            let mut locked = match lock.read().live() {
                Some(data) => data.neighbor_ids(),
                None => return false,
            };
            locked.push(id);
            locked.sort_unstable();
            locked.dedup();

            let mut guards = self.write_sorted(&locked);
            let Some(me) = locate(&guards, id) else {
                return false;
            };

            let stable = match guards[me].1.live() {
                Some(data) => data
                    .neighbor_ids()
                    .iter()
                    .all(|n| locate(&guards, *n).is_some()),
                None => return false,
            };
            if !stable {
                drop(guards);
                continue;
            }

            let VertexSlot::Live(data) = std::mem::replace(&mut *guards[me].1, VertexSlot::Retired) else {
                return false;
            };
            let (out, preds) = data.into_adjacency();

            let mut removed = 0usize;
            for (slot, target) in out {
                removed += 1;
                if target == id {
                    continue;
                }
                if let Some(pos) = locate(&guards, target) {
                    if let Some(vertex) = guards[pos].1.live_mut() {
                        vertex.remove_pred(id, slot);
                    }
                }
            }
            for link in preds {
                // Self-loop was already counted with the out-edges
                if link.source == id {
                    continue;
                }
                removed += 1;
                if let Some(pos) = locate(&guards, link.source) {
                    if let Some(vertex) = guards[pos].1.live_mut() {
                        vertex.remove_out(link.slot);
                    }
                }
            }

            self.edge_count.fetch_sub(removed, Ordering::AcqRel);
            self.vertex_count.fetch_sub(1, Ordering::AcqRel);
            return true;
        }
    }

    // === QUERIES ===

    /// Targets of every out-edge of `id`, in slot order
    pub fn successors(&self, id: VertexId) -> Vec<VertexId> {
        match self.find_vertex(id) {
            Some(v) => v.out_edges().map(|e| e.target()).collect(),
            None => Vec::new(),
        }
    }

    /// Sources of every in-edge of `id`, in insertion order
    pub fn predecessors(&self, id: VertexId) -> Vec<VertexId> {
        match self.find_vertex(id) {
            Some(v) => v.preds().map(|p| p.source()).collect(),
            None => Vec::new(),
        }
    }

    /// Some vertex on a directed cycle, or None if the out-edge relation is acyclic
    pub fn find_cycle(&self) -> Option<VertexId> {
        traversal::find_cycle(self.vertex_ids(), self.id_bound() as usize, |id| self.successors(id))
    }

    /// `(id, out_degree)` for every live vertex, ascending id
    pub fn degree_summary(&self) -> Vec<(VertexId, usize)> {
        self.vertices().map(|v| (v.id(), v.out_degree())).collect()
    }

    /// Reassign every property from sequential counters: vertices in id
    /// order, edges in (source id, slot) order. Returns both counts.
    pub fn renumber<F, G>(&mut self, mut vertex_property: F, mut edge_property: G) -> (u64, u64)
    where
        F: FnMut(u64) -> V,
        G: FnMut(u64) -> E,
    {
        let (mut vcount, mut ecount) = (0u64, 0u64);
        for lock in &mut self.slots {
            let Some(data) = lock.get_mut().live_mut() else {
                continue;
            };
            data.property = vertex_property(vcount);
            vcount += 1;
            for edge in data.out_edges_mut() {
                edge.property = edge_property(ecount);
                ecount += 1;
            }
        }
        (vcount, ecount)
    }
}

fn locate<G>(guards: &[(VertexId, G)], id: VertexId) -> Option<usize> {
    guards.binary_search_by_key(&id, |(gid, _)| *gid).ok()
}

impl<V, E> Default for PropertyGraph<V, E> {
    fn default() -> Self {
        Self::directed()
    }
}

impl<V, E> fmt::Debug for PropertyGraph<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyGraph")
            .field("directedness", &self.directedness)
            .field("vertices", &self.num_vertices())
            .field("edges", &self.num_edges())
            .field("id_bound", &self.id_bound())
            .finish()
    }
}

/// Borrowed view of a live vertex
pub struct VertexRef<'a, V, E> {
    id: VertexId,
    data: MappedRwLockReadGuard<'a, VertexData<V, E>>,
}

impl<'a, V, E> VertexRef<'a, V, E> {
    pub fn id(&self) -> VertexId {
        self.id
    }

    pub fn property(&self) -> &V {
        &self.data.property
    }

    pub fn out_degree(&self) -> usize {
        self.data.out_degree()
    }

    pub fn in_degree(&self) -> usize {
        self.data.in_degree()
    }

    pub fn out_edges(&self) -> impl Iterator<Item = EdgeRef<'_, E>> + '_ {
        let source = self.id;
        let data = &*self.data;
        data.out_edges().map(move |(slot, edge)| EdgeRef {
            handle: EdgeHandle::new(source, slot, data.generation(slot)),
            target: edge.target,
            property: &edge.property,
        })
    }

    /// In-edges, as handles into each source's slab
    pub fn preds(&self) -> impl Iterator<Item = PredEdge> + '_ {
        self.data.preds().iter().map(|link| PredEdge {
            handle: EdgeHandle::new(link.source, link.slot, link.generation),
        })
    }
}

impl<V: fmt::Debug, E> fmt::Debug for VertexRef<'_, V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VertexRef")
            .field("id", &self.id)
            .field("property", self.property())
            .field("out_degree", &self.out_degree())
            .field("in_degree", &self.in_degree())
            .finish()
    }
}

/// Out-edge as seen from its source
#[derive(Debug, Clone, Copy)]
pub struct EdgeRef<'a, E> {
    handle: EdgeHandle,
    target: VertexId,
    property: &'a E,
}

impl<'a, E> EdgeRef<'a, E> {
    pub fn handle(&self) -> EdgeHandle {
        self.handle
    }

    pub fn source(&self) -> VertexId {
        self.handle.source()
    }

    pub fn target(&self) -> VertexId {
        self.target
    }

    pub fn property(&self) -> &'a E {
        self.property
    }
}

/// In-edge as seen from its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredEdge {
    handle: EdgeHandle,
}

impl PredEdge {
    pub fn source(&self) -> VertexId {
        self.handle.source()
    }

    /// Resolve through `PropertyGraph::edge_property` for the payload
    pub fn handle(&self) -> EdgeHandle {
        self.handle
    }
}
