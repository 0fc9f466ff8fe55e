#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Asynchronous scene switching with interstitial staging.
//!
//! A requested transition returns immediately and takes effect on a later
//! host frame, when [`SceneLoader::tick`] runs; completion is observed only
//! by the new scene becoming active. There is no progress surface and no
//! cancellation. A transition routed through the interstitial scene stages
//! its real target for the interstitial to consult once it is up.

use bastion_core::SceneId;
use log::{info, warn};

/// Frame-driven scene transition state.
#[derive(Debug)]
pub struct SceneLoader {
    active: SceneId,
    pending: Option<SceneId>,
    staged: Option<SceneId>,
}

impl Default for SceneLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneLoader {
    /// Creates the loader with the main scene active.
    #[must_use]
    pub fn new() -> Self {
        Self {
            active: SceneId::Main,
            pending: None,
            staged: None,
        }
    }

    /// Scene currently in effect.
    #[must_use]
    pub const fn active(&self) -> SceneId {
        self.active
    }

    /// Reports whether a transition is waiting for the next frame.
    #[must_use]
    pub const fn is_transitioning(&self) -> bool {
        self.pending.is_some()
    }

    /// Initiates an asynchronous transition to the named scene.
    ///
    /// Returns immediately; the switch happens on a later [`Self::tick`].
    /// A still-pending earlier request is superseded.
    pub fn load_async(&mut self, scene: SceneId) {
        if let Some(previous) = self.pending.replace(scene) {
            warn!(
                "superseding pending transition to '{}' with '{}'",
                previous.name(),
                scene.name()
            );
        }
    }

    /// Stages `target` and transitions to the interstitial scene.
    ///
    /// The interstitial consults [`Self::take_staged_target`] once active
    /// to continue toward the real destination.
    pub fn load_via_interstitial_async(&mut self, target: SceneId) {
        self.staged = Some(target);
        self.load_async(SceneId::Interstitial);
    }

    /// Target staged for the interstitial, if any, without consuming it.
    #[must_use]
    pub const fn staged_target(&self) -> Option<SceneId> {
        self.staged
    }

    /// Consumes and returns the staged post-interstitial target.
    pub fn take_staged_target(&mut self) -> Option<SceneId> {
        self.staged.take()
    }

    /// Applies at most one pending transition; called once per host frame.
    pub fn tick(&mut self) {
        if let Some(scene) = self.pending.take() {
            info!("scene '{}' is now active", scene.name());
            self.active = scene;
        }
    }
}
