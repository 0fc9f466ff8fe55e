#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless retained-mode scene graph for the Bastion Defence runtime.
//!
//! The scene graph stands in for the host engine's node hierarchy. It stores
//! nodes in generational slots so destroyed handles are detectably dead,
//! and exposes exactly the capability set the services rely on: activation,
//! reparenting, pose mutation, recursive destruction, and the factory
//! operation [`SceneGraph::instantiate`] that materializes an instance from
//! a template node. Templates additionally carry the opt-in capabilities
//! copied onto instances at creation: a [`LevelMap`] data component and a
//! spawner producing [`Poolable`] behaviors.

use std::{
    cell::RefCell,
    collections::{BTreeMap, VecDeque},
    rc::Rc,
};

use bastion_core::NodeId;
use glam::{Quat, Vec3};
use log::warn;
use thiserror::Error;

/// Default ceiling on the number of simultaneously live nodes.
pub const DEFAULT_NODE_BUDGET: usize = 4096;

/// World-space position and orientation of a node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    /// Translation component.
    pub position: Vec3,
    /// Orientation component.
    pub rotation: Quat,
}

impl Pose {
    /// Pose at the world origin with no rotation.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    /// Creates a pose at the provided position with no rotation.
    #[must_use]
    pub const fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }
}

/// Level-map capability published by a level visual template.
///
/// Exposes the spawn point, end point, and ordered waypoint path that
/// gameplay systems consume. The level service requires this component on
/// every instantiated level node.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelMap {
    spawn_point: Vec3,
    end_point: Vec3,
    waypoints: Vec<Vec3>,
}

impl LevelMap {
    /// Creates a level map from its authored landmark positions.
    #[must_use]
    pub fn new(spawn_point: Vec3, end_point: Vec3, waypoints: Vec<Vec3>) -> Self {
        Self {
            spawn_point,
            end_point,
            waypoints,
        }
    }

    /// Position where enemies enter the level.
    #[must_use]
    pub const fn spawn_point(&self) -> Vec3 {
        self.spawn_point
    }

    /// Position enemies attempt to reach.
    #[must_use]
    pub const fn end_point(&self) -> Vec3 {
        self.end_point
    }

    /// Ordered waypoints connecting spawn point to end point.
    #[must_use]
    pub fn waypoints(&self) -> &[Vec3] {
        &self.waypoints
    }
}

/// Opt-in capability letting a pooled instance react to pool transitions.
///
/// `on_acquire` runs immediately before the pool vends the instance and
/// `on_release` immediately before the pool quiesces it. The pool injects
/// the instance's own handle and a [`ReleaseQueue`] through `bind` on
/// freshly created instances so they can request self-release without
/// owning a reference to the pool.
pub trait Poolable {
    /// Receives the instance's handle and the self-release back-reference.
    fn bind(&mut self, instance: NodeId, releases: ReleaseQueue) {
        let _ = (instance, releases);
    }

    /// Invoked immediately before the pool returns the instance.
    fn on_acquire(&mut self);

    /// Invoked immediately before the pool quiesces the instance.
    fn on_release(&mut self);
}

/// Factory closure producing a fresh [`Poolable`] behavior for an instance.
pub type PoolableSpawner = Rc<dyn Fn() -> Box<dyn Poolable>>;

/// Cloneable handle through which pooled instances request self-release.
///
/// The queue only records requests; the owning pool drains it once per
/// frame, so all pool-state mutation stays inside pool operations. The
/// ownership edge runs one way: the pool owns the instance, the instance
/// holds only this queue handle.
#[derive(Clone, Debug, Default)]
pub struct ReleaseQueue {
    inner: Rc<RefCell<VecDeque<NodeId>>>,
}

impl ReleaseQueue {
    /// Creates an empty release queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a request to release the provided instance.
    pub fn request_release(&self, instance: NodeId) {
        self.inner.borrow_mut().push_back(instance);
    }

    /// Removes and returns all queued requests in submission order.
    #[must_use]
    pub fn drain(&self) -> Vec<NodeId> {
        self.inner.borrow_mut().drain(..).collect()
    }

    /// Number of queued requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Reports whether the queue holds no requests.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

/// Failures surfaced by scene-graph operations.
#[derive(Debug, Error)]
pub enum SceneError {
    /// The host's instantiation budget is exhausted.
    #[error("scene node budget of {budget} is exhausted")]
    BudgetExhausted {
        /// Ceiling that was reached.
        budget: usize,
    },
    /// The operation referenced a node that is no longer alive.
    #[error("node {0:?} is not alive")]
    DeadNode(NodeId),
}

struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    pose: Pose,
    active: bool,
    level_map: Option<LevelMap>,
    poolable: Option<Box<dyn Poolable>>,
    spawner: Option<PoolableSpawner>,
}

impl Node {
    fn new(parent: Option<NodeId>) -> Self {
        Self {
            parent,
            children: Vec::new(),
            pose: Pose::IDENTITY,
            active: true,
            level_map: None,
            poolable: None,
            spawner: None,
        }
    }
}

struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Retained node store with generational handles and a creation budget.
pub struct SceneGraph {
    slots: Vec<Slot>,
    free_slots: Vec<u32>,
    live: usize,
    budget: usize,
    templates: BTreeMap<String, NodeId>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Creates an empty scene graph with the default node budget.
    #[must_use]
    pub fn new() -> Self {
        Self::with_budget(DEFAULT_NODE_BUDGET)
    }

    /// Creates an empty scene graph with an explicit node budget.
    #[must_use]
    pub fn with_budget(budget: usize) -> Self {
        Self {
            slots: Vec::new(),
            free_slots: Vec::new(),
            live: 0,
            budget,
            templates: BTreeMap::new(),
        }
    }

    /// Creates a plain node under the provided parent.
    ///
    /// Counts against the instantiation budget like any other creation.
    pub fn add_node(&mut self, parent: Option<NodeId>) -> Result<NodeId, SceneError> {
        if let Some(parent) = parent {
            if !self.is_alive(parent) {
                return Err(SceneError::DeadNode(parent));
            }
        }
        let id = self.allocate(parent)?;
        if let Some(parent) = parent {
            if let Some(node) = self.get_mut(parent) {
                node.children.push(id);
            }
        }
        Ok(id)
    }

    /// Materializes an instance of the provided template node.
    ///
    /// This is the factory operation: the instance starts active at `pose`
    /// under `parent`, with the template's [`LevelMap`] copied onto it and a
    /// fresh [`Poolable`] behavior attached when the template registered a
    /// spawner. The only fatal condition is budget exhaustion.
    pub fn instantiate(
        &mut self,
        template: NodeId,
        pose: Pose,
        parent: Option<NodeId>,
    ) -> Result<NodeId, SceneError> {
        let (level_map, spawner) = match self.get(template) {
            Some(node) => (node.level_map.clone(), node.spawner.clone()),
            None => return Err(SceneError::DeadNode(template)),
        };
        let id = self.add_node(parent)?;
        if let Some(node) = self.get_mut(id) {
            node.pose = pose;
            node.level_map = level_map;
            node.poolable = spawner.map(|spawn| spawn());
        }
        Ok(id)
    }

    /// Reports whether the handle still addresses a live node.
    #[must_use]
    pub fn is_alive(&self, node: NodeId) -> bool {
        self.get(node).is_some()
    }

    /// Number of currently live nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.live
    }

    /// Ceiling on the number of simultaneously live nodes.
    #[must_use]
    pub const fn budget(&self) -> usize {
        self.budget
    }

    /// Sets the activation flag of a live node; dead handles are ignored.
    pub fn set_active(&mut self, node: NodeId, active: bool) {
        if let Some(node) = self.get_mut(node) {
            node.active = active;
        }
    }

    /// Reports whether the node is alive and active.
    #[must_use]
    pub fn is_active(&self, node: NodeId) -> bool {
        self.get(node).map_or(false, |node| node.active)
    }

    /// Retrieves the pose of a live node.
    #[must_use]
    pub fn pose(&self, node: NodeId) -> Option<Pose> {
        self.get(node).map(|node| node.pose)
    }

    /// Mutates the pose of a live node; dead handles are ignored.
    pub fn set_pose(&mut self, node: NodeId, pose: Pose) {
        if let Some(node) = self.get_mut(node) {
            node.pose = pose;
        }
    }

    /// Retrieves the parent of a live node.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node).and_then(|node| node.parent)
    }

    /// Children of a live node in attachment order.
    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.get(node).map_or(&[], |node| node.children.as_slice())
    }

    /// Moves a live node under a new parent, detaching it from the old one.
    ///
    /// Requests naming a dead node or a dead parent are ignored.
    pub fn set_parent(&mut self, node: NodeId, parent: Option<NodeId>) {
        if !self.is_alive(node) {
            return;
        }
        if let Some(parent) = parent {
            if !self.is_alive(parent) {
                return;
            }
        }
        self.detach(node);
        if let Some(entry) = self.get_mut(node) {
            entry.parent = parent;
        }
        if let Some(parent) = parent {
            if let Some(entry) = self.get_mut(parent) {
                entry.children.push(node);
            }
        }
    }

    /// Destroys a node and its entire subtree; dead handles are a no-op.
    pub fn destroy(&mut self, node: NodeId) {
        if !self.is_alive(node) {
            return;
        }
        self.detach(node);
        self.free_subtree(node);
    }

    /// Registers a named template node; the first registration wins.
    pub fn register_template(&mut self, name: &str, node: NodeId) {
        if self.templates.contains_key(name) {
            warn!("template '{name}' is already registered; keeping the first");
            return;
        }
        let _ = self.templates.insert(name.to_owned(), node);
    }

    /// Resolves a registered template by name, ignoring destroyed templates.
    #[must_use]
    pub fn template(&self, name: &str) -> Option<NodeId> {
        self.templates
            .get(name)
            .copied()
            .filter(|node| self.is_alive(*node))
    }

    /// Attaches a level-map capability to a live node.
    pub fn set_level_map(&mut self, node: NodeId, map: LevelMap) {
        if let Some(node) = self.get_mut(node) {
            node.level_map = Some(map);
        }
    }

    /// Borrows the level-map capability of a live node, if present.
    #[must_use]
    pub fn level_map(&self, node: NodeId) -> Option<&LevelMap> {
        self.get(node).and_then(|node| node.level_map.as_ref())
    }

    /// Registers the poolable spawner instantiation copies from a template.
    pub fn set_poolable_spawner(
        &mut self,
        template: NodeId,
        spawner: impl Fn() -> Box<dyn Poolable> + 'static,
    ) {
        if let Some(node) = self.get_mut(template) {
            node.spawner = Some(Rc::new(spawner));
        }
    }

    /// Borrows the poolable behavior of a live node, if present.
    ///
    /// The `'static` bound on the returned object mirrors the stored
    /// `Box<dyn Poolable>`; eliding it would tie the object lifetime to the
    /// borrow and reject the unsizing.
    pub fn poolable_mut(&mut self, node: NodeId) -> Option<&mut (dyn Poolable + 'static)> {
        self.get_mut(node)
            .and_then(|node| node.poolable.as_deref_mut())
    }

    fn allocate(&mut self, parent: Option<NodeId>) -> Result<NodeId, SceneError> {
        if self.live >= self.budget {
            return Err(SceneError::BudgetExhausted {
                budget: self.budget,
            });
        }
        let index = match self.free_slots.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: None,
                });
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        slot.node = Some(Node::new(parent));
        self.live += 1;
        Ok(NodeId::new(index, slot.generation))
    }

    fn detach(&mut self, node: NodeId) {
        let parent = self.get(node).and_then(|entry| entry.parent);
        if let Some(parent) = parent {
            if let Some(entry) = self.get_mut(parent) {
                entry.children.retain(|child| *child != node);
            }
        }
    }

    fn free_subtree(&mut self, node: NodeId) {
        let children = match self.get(node) {
            Some(entry) => entry.children.clone(),
            None => return,
        };
        for child in children {
            self.free_subtree(child);
        }
        if let Some(slot) = self.slots.get_mut(node.index() as usize) {
            if slot.generation == node.generation() && slot.node.is_some() {
                slot.node = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free_slots.push(node.index());
                self.live -= 1;
            }
        }
    }

    fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.index() as usize).and_then(|slot| {
            if slot.generation == id.generation() {
                slot.node.as_ref()
            } else {
                None
            }
        })
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots.get_mut(id.index() as usize).and_then(|slot| {
            if slot.generation == id.generation() {
                slot.node.as_mut()
            } else {
                None
            }
        })
    }
}
