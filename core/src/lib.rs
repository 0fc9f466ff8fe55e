#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Bastion Defence runtime.
//!
//! This crate defines the identifiers and events that connect the scene
//! graph, the runtime services, and host adapters. Services own their state
//! exclusively and communicate outcomes through [`LevelEvent`] values pushed
//! into caller-supplied buffers, so every observer sees the same totally
//! ordered stream.

use serde::{Deserialize, Serialize};

/// Canonical asset root scanned for configuration payloads at startup.
pub const CONFIG_ROOT: &str = "Configs";

/// Generational handle identifying a node in the scene graph.
///
/// A handle stays valid until its node is destroyed; afterwards the slot may
/// be reused under a bumped generation, so stale handles are detectably dead
/// rather than silently aliasing a new node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Creates a node handle from a slot index and generation counter.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index addressed by the handle.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Generation the slot carried when the handle was issued.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

/// Stable integer identity of a pool template.
///
/// Derived from the template node itself: two distinct template nodes are
/// two distinct pools even when their content is identical, because
/// configuration authors use per-variant templates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateId(u64);

impl TemplateId {
    /// Derives the template identity of the provided template node.
    #[must_use]
    pub const fn of(node: NodeId) -> Self {
        Self(((node.generation() as u64) << 32) | node.index() as u64)
    }

    /// Retrieves the numeric representation of the identity.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Authoring-time identifier of a gameplay level, such as `"Lvl_01"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LevelId(String);

impl LevelId {
    /// Creates a level identifier from its authoring-time name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrows the textual form of the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Enumerated set of loadable scenes known to the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SceneId {
    /// Primary gameplay scene.
    Main,
    /// Staging scene entered between the current scene and a requested one.
    Interstitial,
}

impl SceneId {
    /// Textual name consumed by the host's scene loading machinery.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Main => "Main",
            Self::Interstitial => "Interstitial",
        }
    }
}

/// Stable identity of a registered UI page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageKey(&'static str);

impl PageKey {
    /// Creates a page key from its stable name.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Retrieves the textual form of the key.
    #[must_use]
    pub const fn get(&self) -> &'static str {
        self.0
    }
}

/// Events emitted by the level service during a setup transaction.
///
/// For any setup call that ultimately succeeds, observers see
/// `SetupStarted`, then `Unloaded` for the previous level if one existed,
/// then `SetupCompleted`, in that total order. Failed setups still emit
/// `SetupStarted` and, where applicable, `Unloaded`, but never
/// `SetupCompleted`.
#[derive(Clone, Debug, PartialEq)]
pub enum LevelEvent {
    /// A level swap began for the named level.
    SetupStarted {
        /// Level the swap is transitioning to.
        level: LevelId,
    },
    /// The previously current level was torn down.
    Unloaded {
        /// Level that was current before the swap.
        level: LevelId,
    },
    /// The swap finished and the named level is now current.
    SetupCompleted {
        /// Level that became current.
        level: LevelId,
        /// Node carrying the level-map capability for the new level.
        map: NodeId,
    },
}

#[cfg(test)]
mod tests {
    use super::{LevelId, NodeId, PageKey, SceneId, TemplateId};
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let text = serde_json::to_string(value).expect("serialize");
        let restored: T = serde_json::from_str(&text).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn node_id_round_trips_through_json() {
        assert_round_trip(&NodeId::new(7, 3));
    }

    #[test]
    fn level_id_round_trips_through_json() {
        assert_round_trip(&LevelId::new("Lvl_01"));
    }

    #[test]
    fn template_identity_distinguishes_generations() {
        let first = TemplateId::of(NodeId::new(4, 0));
        let second = TemplateId::of(NodeId::new(4, 1));
        assert_ne!(first, second);
        assert_ne!(first.get(), second.get());
    }

    #[test]
    fn template_identity_is_stable() {
        let node = NodeId::new(11, 2);
        assert_eq!(TemplateId::of(node), TemplateId::of(node));
    }

    #[test]
    fn scene_names_match_host_expectations() {
        assert_eq!(SceneId::Main.name(), "Main");
        assert_eq!(SceneId::Interstitial.name(), "Interstitial");
    }

    #[test]
    fn page_key_preserves_name() {
        assert_eq!(PageKey::new("hud").get(), "hud");
    }
}
