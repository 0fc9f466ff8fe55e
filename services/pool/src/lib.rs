#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Reusable-instance pooling for short-lived scene nodes.
//!
//! The pool amortizes instantiation and destruction cost for projectiles,
//! enemies, and effects by recycling instances per template. Every instance
//! ever vended is either active in the live scene or parked in exactly one
//! per-template free list; the pool exclusively owns the free lists, the
//! container subtrees, and the reverse owner mapping, and mutates them only
//! from its own operations. Free lists are FIFO so repeatedly recycled
//! nodes reuse the most-settled instances first.
//!
//! All operations are synchronous: a suspended acquire could race itself on
//! the same free list, so none of them yield.

use std::collections::{HashMap, VecDeque};

use bastion_core::{NodeId, TemplateId};
use bastion_scene::{Pose, ReleaseQueue, SceneError, SceneGraph};
use log::{debug, warn};

struct PoolEntry {
    container: NodeId,
    free: VecDeque<NodeId>,
    created: usize,
}

/// Per-template cache of reusable scene-node instances.
#[derive(Default)]
pub struct PoolService {
    entries: HashMap<TemplateId, PoolEntry>,
    owners: HashMap<NodeId, TemplateId>,
    releases: ReleaseQueue,
    root: Option<NodeId>,
}

impl PoolService {
    /// Creates an empty pool service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cloneable handle pooled instances use to request self-release.
    ///
    /// Requests are only recorded; [`PoolService::flush_releases`] applies
    /// them, so pool state never mutates outside pool operations.
    #[must_use]
    pub fn handle(&self) -> ReleaseQueue {
        self.releases.clone()
    }

    /// Returns a ready-to-use instance of the template.
    ///
    /// Reuses the head of the template's free list when one exists,
    /// otherwise creates a fresh instance through the scene factory. `pose`
    /// defaults to the parent's pose, then to the identity. A freshly
    /// created poolable is bound to the release handle before anything
    /// else; `on_acquire` fires immediately before the instance is
    /// returned. Never blocks, never vends the same live instance twice.
    ///
    /// The only error is the factory's fatal instantiation failure.
    pub fn acquire(
        &mut self,
        scene: &mut SceneGraph,
        template: NodeId,
        pose: Option<Pose>,
        parent: Option<NodeId>,
    ) -> Result<NodeId, SceneError> {
        let tid = self.ensure_entry(scene, template)?;
        let pose = pose
            .or_else(|| parent.and_then(|parent| scene.pose(parent)))
            .unwrap_or(Pose::IDENTITY);

        loop {
            let head = self
                .entries
                .get_mut(&tid)
                .and_then(|entry| entry.free.pop_front());
            match head {
                Some(node) if scene.is_alive(node) => {
                    scene.set_parent(node, parent);
                    scene.set_pose(node, pose);
                    scene.set_active(node, true);
                    if let Some(poolable) = scene.poolable_mut(node) {
                        poolable.on_acquire();
                    }
                    debug!("reused {node:?} from pool {tid:?}");
                    return Ok(node);
                }
                Some(node) => {
                    // A free instance died outside the pool; drop it from
                    // the books and try the next one.
                    warn!("pooled instance {node:?} was destroyed externally");
                    let _ = self.owners.remove(&node);
                    if let Some(entry) = self.entries.get_mut(&tid) {
                        entry.created = entry.created.saturating_sub(1);
                    }
                }
                None => break,
            }
        }

        let node = scene.instantiate(template, pose, parent)?;
        let _ = self.owners.insert(node, tid);
        if let Some(entry) = self.entries.get_mut(&tid) {
            entry.created += 1;
        }
        if let Some(poolable) = scene.poolable_mut(node) {
            poolable.bind(node, self.releases.clone());
            poolable.on_acquire();
        }
        debug!("created {node:?} for pool {tid:?}");
        Ok(node)
    }

    /// Quiesces an instance and returns it to its template's free list.
    ///
    /// A pool-owned instance gets `on_release`, is deactivated, reparented
    /// under its pool container, and enqueued for FIFO reuse. An instance
    /// the pool does not know is destroyed outright rather than admitted.
    /// Dead or already-destroyed handles are silent no-ops.
    pub fn release(&mut self, scene: &mut SceneGraph, instance: NodeId) {
        if !scene.is_alive(instance) {
            return;
        }
        match self.owners.get(&instance).copied() {
            Some(tid) => {
                let Some(entry) = self.entries.get_mut(&tid) else {
                    return;
                };
                if entry.free.contains(&instance) {
                    warn!("{instance:?} is already free; ignoring repeat release");
                    return;
                }
                if let Some(poolable) = scene.poolable_mut(instance) {
                    poolable.on_release();
                }
                scene.set_active(instance, false);
                scene.set_parent(instance, Some(entry.container));
                entry.free.push_back(instance);
                debug!("released {instance:?} into pool {tid:?}");
            }
            None => {
                warn!("{instance:?} is not pool-owned; destroying it");
                scene.destroy(instance);
            }
        }
    }

    /// Ensures the template's free list holds at least `count` instances.
    ///
    /// Existing free inventory counts toward the target. Shortfall
    /// instances are created inactive under the pool container and bound to
    /// the release handle, but stay inert: neither `on_acquire` nor
    /// `on_release` fires until their first acquire.
    pub fn prewarm(
        &mut self,
        scene: &mut SceneGraph,
        template: NodeId,
        count: usize,
    ) -> Result<(), SceneError> {
        let tid = self.ensure_entry(scene, template)?;
        let (container, existing) = match self.entries.get(&tid) {
            Some(entry) => (entry.container, entry.free.len()),
            None => return Ok(()),
        };
        for _ in existing..count {
            let node = scene.instantiate(template, Pose::IDENTITY, Some(container))?;
            scene.set_active(node, false);
            if let Some(poolable) = scene.poolable_mut(node) {
                poolable.bind(node, self.releases.clone());
            }
            let _ = self.owners.insert(node, tid);
            if let Some(entry) = self.entries.get_mut(&tid) {
                entry.created += 1;
                entry.free.push_back(node);
            }
        }
        Ok(())
    }

    /// Destroys every tracked instance and drops all pool entries.
    pub fn clear(&mut self, scene: &mut SceneGraph) {
        for (instance, _) in self.owners.drain() {
            scene.destroy(instance);
        }
        for (_, entry) in self.entries.drain() {
            scene.destroy(entry.container);
        }
        if let Some(root) = self.root.take() {
            scene.destroy(root);
        }
    }

    /// Destroys every instance tracked for one template and drops its entry.
    pub fn clear_template(&mut self, scene: &mut SceneGraph, template: NodeId) {
        let tid = TemplateId::of(template);
        let entry = match self.entries.remove(&tid) {
            Some(entry) => entry,
            None => return,
        };
        self.owners.retain(|instance, owner| {
            if *owner == tid {
                scene.destroy(*instance);
                false
            } else {
                true
            }
        });
        scene.destroy(entry.container);
    }

    /// Number of instances of the template currently vended out.
    #[must_use]
    pub fn active_count(&self, template: NodeId) -> usize {
        self.entries
            .get(&TemplateId::of(template))
            .map_or(0, |entry| entry.created - entry.free.len())
    }

    /// Number of instances of the template currently parked in the pool.
    #[must_use]
    pub fn free_count(&self, template: NodeId) -> usize {
        self.entries
            .get(&TemplateId::of(template))
            .map_or(0, |entry| entry.free.len())
    }

    /// Applies all queued self-release requests in submission order.
    ///
    /// Called once per host frame by the runtime tick.
    pub fn flush_releases(&mut self, scene: &mut SceneGraph) {
        for instance in self.releases.drain() {
            self.release(scene, instance);
        }
    }

    fn ensure_entry(
        &mut self,
        scene: &mut SceneGraph,
        template: NodeId,
    ) -> Result<TemplateId, SceneError> {
        let tid = TemplateId::of(template);
        if !scene.is_alive(template) {
            return Err(SceneError::DeadNode(template));
        }
        if self.entries.contains_key(&tid) {
            return Ok(tid);
        }
        let root = match self.root {
            Some(root) if scene.is_alive(root) => root,
            _ => {
                let root = scene.add_node(None)?;
                scene.set_active(root, false);
                self.root = Some(root);
                root
            }
        };
        let container = scene.add_node(Some(root))?;
        scene.set_active(container, false);
        let _ = self.entries.insert(
            tid,
            PoolEntry {
                container,
                free: VecDeque::new(),
                created: 0,
            },
        );
        Ok(tid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_report_zero_for_unknown_templates() {
        let pool = PoolService::new();
        let template = NodeId::new(0, 0);
        assert_eq!(pool.active_count(template), 0);
        assert_eq!(pool.free_count(template), 0);
    }

    #[test]
    fn clear_on_empty_pool_is_a_no_op() {
        let mut scene = SceneGraph::new();
        let mut pool = PoolService::new();
        pool.clear(&mut scene);
        assert_eq!(scene.node_count(), 0);
    }

    #[test]
    fn acquire_of_dead_template_fails() {
        let mut scene = SceneGraph::new();
        let mut pool = PoolService::new();
        let template = scene.add_node(None).expect("template");
        scene.destroy(template);
        assert!(matches!(
            pool.acquire(&mut scene, template, None, None),
            Err(SceneError::DeadNode(_))
        ));
    }
}
