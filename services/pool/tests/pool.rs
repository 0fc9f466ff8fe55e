use std::{cell::RefCell, rc::Rc};

use bastion_core::NodeId;
use bastion_scene::{Poolable, Pose, ReleaseQueue, SceneGraph};
use bastion_service_pool::PoolService;
use glam::Vec3;

#[derive(Debug, Default)]
struct Counters {
    acquires: u32,
    releases: u32,
    binds: u32,
}

struct Probe {
    counters: Rc<RefCell<Counters>>,
    binding: Rc<RefCell<Option<(NodeId, ReleaseQueue)>>>,
}

impl Poolable for Probe {
    fn bind(&mut self, instance: NodeId, releases: ReleaseQueue) {
        self.counters.borrow_mut().binds += 1;
        *self.binding.borrow_mut() = Some((instance, releases));
    }

    fn on_acquire(&mut self) {
        self.counters.borrow_mut().acquires += 1;
    }

    fn on_release(&mut self) {
        self.counters.borrow_mut().releases += 1;
    }
}

struct Harness {
    scene: SceneGraph,
    pool: PoolService,
    template: NodeId,
    counters: Rc<RefCell<Counters>>,
    binding: Rc<RefCell<Option<(NodeId, ReleaseQueue)>>>,
}

impl Harness {
    fn new() -> Self {
        let mut scene = SceneGraph::new();
        let template = scene.add_node(None).expect("template");
        let counters = Rc::new(RefCell::new(Counters::default()));
        let binding = Rc::new(RefCell::new(None));
        let spawner_counters = Rc::clone(&counters);
        let spawner_binding = Rc::clone(&binding);
        scene.set_poolable_spawner(template, move || {
            Box::new(Probe {
                counters: Rc::clone(&spawner_counters),
                binding: Rc::clone(&spawner_binding),
            })
        });
        Self {
            scene,
            pool: PoolService::new(),
            template,
            counters,
            binding,
        }
    }

    fn acquire(&mut self) -> NodeId {
        self.pool
            .acquire(&mut self.scene, self.template, None, None)
            .expect("acquire")
    }
}

#[test]
fn conservation_holds_across_acquire_and_release() {
    let mut h = Harness::new();
    let a = h.acquire();
    let b = h.acquire();
    assert_eq!(h.pool.active_count(h.template), 2);
    assert_eq!(h.pool.free_count(h.template), 0);

    h.pool.release(&mut h.scene, a);
    assert_eq!(h.pool.active_count(h.template), 1);
    assert_eq!(h.pool.free_count(h.template), 1);

    h.pool.release(&mut h.scene, b);
    assert_eq!(h.pool.active_count(h.template), 0);
    assert_eq!(h.pool.free_count(h.template), 2);

    // Total created never changes without clear.
    let c = h.acquire();
    assert_eq!(h.pool.active_count(h.template) + h.pool.free_count(h.template), 2);
    assert_eq!(c, a);
}

#[test]
fn fifo_reuse_returns_instances_in_release_order() {
    let mut h = Harness::new();
    h.pool
        .prewarm(&mut h.scene, h.template, 3)
        .expect("prewarm");

    let a = h.acquire();
    let b = h.acquire();
    let c = h.acquire();
    assert_eq!(h.pool.active_count(h.template), 3);
    assert_eq!(h.pool.free_count(h.template), 0);

    h.pool.release(&mut h.scene, a);
    h.pool.release(&mut h.scene, b);
    h.pool.release(&mut h.scene, c);

    assert_eq!(h.acquire(), a);
    assert_eq!(h.acquire(), b);
    assert_eq!(h.acquire(), c);
    assert_eq!(h.pool.active_count(h.template), 3);
    assert_eq!(h.pool.free_count(h.template), 0);
}

#[test]
fn no_instance_is_vended_twice_while_active() {
    let mut h = Harness::new();
    let mut vended = Vec::new();
    for _ in 0..5 {
        let node = h.acquire();
        assert!(!vended.contains(&node), "instance vended twice: {node:?}");
        vended.push(node);
    }
}

#[test]
fn prewarm_creates_inert_instances() {
    let mut h = Harness::new();
    h.pool
        .prewarm(&mut h.scene, h.template, 3)
        .expect("prewarm");

    assert_eq!(h.pool.free_count(h.template), 3);
    assert_eq!(h.pool.active_count(h.template), 0);
    {
        let counters = h.counters.borrow();
        assert_eq!(counters.acquires, 0, "prewarm must not fire on_acquire");
        assert_eq!(counters.releases, 0, "prewarm must not fire on_release");
        assert_eq!(counters.binds, 3, "prewarmed instances are bound");
    }

    // Existing inventory counts toward the target.
    h.pool
        .prewarm(&mut h.scene, h.template, 2)
        .expect("prewarm");
    assert_eq!(h.pool.free_count(h.template), 3);

    let first = h.acquire();
    assert_eq!(h.counters.borrow().acquires, 1);
    assert!(h.scene.is_active(first));
}

#[test]
fn prewarmed_instances_start_inactive_under_the_pool() {
    let mut h = Harness::new();
    h.pool
        .prewarm(&mut h.scene, h.template, 2)
        .expect("prewarm");

    let node = h.acquire();
    h.pool.release(&mut h.scene, node);
    assert!(!h.scene.is_active(node));
}

#[test]
fn foreign_release_destroys_without_touching_pool_state() {
    let mut h = Harness::new();
    let a = h.acquire();

    // Instance created through the factory directly, bypassing the pool.
    let foreign = h
        .scene
        .instantiate(h.template, Pose::IDENTITY, None)
        .expect("foreign instance");

    h.pool.release(&mut h.scene, a);
    assert_eq!(h.pool.free_count(h.template), 1);

    let active_before = h.pool.active_count(h.template);
    let free_before = h.pool.free_count(h.template);
    h.pool.release(&mut h.scene, foreign);

    assert!(!h.scene.is_alive(foreign));
    assert_eq!(h.pool.active_count(h.template), active_before);
    assert_eq!(h.pool.free_count(h.template), free_before);
}

#[test]
fn releasing_a_destroyed_instance_is_a_silent_no_op() {
    let mut h = Harness::new();
    let a = h.acquire();
    h.pool.release(&mut h.scene, a);
    h.scene.destroy(a);

    let free_before = h.pool.free_count(h.template);
    h.pool.release(&mut h.scene, a);
    assert_eq!(h.pool.free_count(h.template), free_before);
}

#[test]
fn repeat_release_of_a_free_instance_does_not_double_enqueue() {
    let mut h = Harness::new();
    let a = h.acquire();
    h.pool.release(&mut h.scene, a);
    h.pool.release(&mut h.scene, a);
    assert_eq!(h.pool.free_count(h.template), 1);
    assert_eq!(h.counters.borrow().releases, 1);
}

#[test]
fn acquire_defaults_pose_to_the_parent() {
    let mut h = Harness::new();
    let parent = h.scene.add_node(None).expect("parent");
    h.scene
        .set_pose(parent, Pose::from_position(Vec3::new(3.0, 0.0, 1.0)));

    let node = h
        .pool
        .acquire(&mut h.scene, h.template, None, Some(parent))
        .expect("acquire");

    assert_eq!(h.scene.parent(node), Some(parent));
    assert_eq!(
        h.scene.pose(node).expect("pose").position,
        Vec3::new(3.0, 0.0, 1.0)
    );

    let explicit = h
        .pool
        .acquire(
            &mut h.scene,
            h.template,
            Some(Pose::from_position(Vec3::Y)),
            Some(parent),
        )
        .expect("acquire");
    assert_eq!(h.scene.pose(explicit).expect("pose").position, Vec3::Y);
}

#[test]
fn released_instances_are_deactivated_and_reparented() {
    let mut h = Harness::new();
    let a = h.acquire();
    assert!(h.scene.is_active(a));
    assert_eq!(h.scene.parent(a), None);

    h.pool.release(&mut h.scene, a);
    assert!(!h.scene.is_active(a));
    assert!(h.scene.parent(a).is_some(), "free instances live under the pool");
    assert_eq!(h.counters.borrow().releases, 1);
}

#[test]
fn self_release_through_the_bound_handle() {
    let mut h = Harness::new();
    let node = h.acquire();

    let (bound_node, queue) = h
        .binding
        .borrow()
        .clone()
        .expect("instance was bound on creation");
    assert_eq!(bound_node, node);

    queue.request_release(bound_node);
    assert_eq!(h.pool.free_count(h.template), 0, "requests are deferred");

    h.pool.flush_releases(&mut h.scene);
    assert_eq!(h.pool.free_count(h.template), 1);
    assert!(!h.scene.is_active(node));
}

#[test]
fn clear_destroys_active_and_free_instances() {
    let mut h = Harness::new();
    h.pool
        .prewarm(&mut h.scene, h.template, 2)
        .expect("prewarm");
    let active = h.acquire();
    let nodes_before = h.scene.node_count();
    assert!(nodes_before > 1);

    h.pool.clear(&mut h.scene);

    assert!(!h.scene.is_alive(active));
    assert_eq!(h.pool.active_count(h.template), 0);
    assert_eq!(h.pool.free_count(h.template), 0);
    // Only the template survives.
    assert_eq!(h.scene.node_count(), 1);
    assert!(h.scene.is_alive(h.template));
}

#[test]
fn clear_template_scopes_destruction_to_one_pool() {
    let mut h = Harness::new();
    let other_template = h.scene.add_node(None).expect("other template");

    let a = h.acquire();
    let other = h
        .pool
        .acquire(&mut h.scene, other_template, None, None)
        .expect("acquire other");

    h.pool.clear_template(&mut h.scene, h.template);

    assert!(!h.scene.is_alive(a));
    assert!(h.scene.is_alive(other));
    assert_eq!(h.pool.active_count(h.template), 0);
    assert_eq!(h.pool.active_count(other_template), 1);
}

#[test]
fn distinct_templates_use_distinct_pools() {
    let mut h = Harness::new();
    let other_template = h.scene.add_node(None).expect("other template");

    let a = h.acquire();
    h.pool.release(&mut h.scene, a);

    let other = h
        .pool
        .acquire(&mut h.scene, other_template, None, None)
        .expect("acquire other");
    assert_ne!(other, a, "free inventory never crosses templates");
    assert_eq!(h.pool.free_count(h.template), 1);
    assert_eq!(h.pool.free_count(other_template), 0);
}
