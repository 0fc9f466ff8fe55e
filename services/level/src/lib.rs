#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level lifecycle coordination for the Bastion Defence runtime.
//!
//! At most one level node exists at any instant. Swapping levels is a
//! transaction observable through [`LevelEvent`] values pushed, in a
//! guaranteed total order, into a caller-supplied buffer: `SetupStarted`,
//! then `Unloaded` for the previous level if one existed, then
//! `SetupCompleted` on success. A failed setup never emits
//! `SetupCompleted`, and a freshly instantiated node that lacks the
//! level-map capability is destroyed rather than leaked.

use bastion_core::{LevelEvent, LevelId, NodeId};
use bastion_scene::{Pose, SceneError, SceneGraph};
use bastion_service_config::{ConfigRegistry, LevelConfig, LevelVisualConfig};
use log::{error, info, warn};

/// Owner of the single currently instantiated level.
#[derive(Debug, Default)]
pub struct LevelService {
    current: Option<(LevelId, NodeId)>,
}

impl LevelService {
    /// Creates the service with no level loaded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gameplay payload (wave schedule) of the provided level.
    #[must_use]
    pub fn level_config(
        &self,
        registry: &ConfigRegistry,
        level: &LevelId,
    ) -> Option<LevelConfig> {
        registry.get_named(level.as_str())
    }

    /// Visual payload (scene template) of the provided level.
    #[must_use]
    pub fn visual_config(
        &self,
        registry: &ConfigRegistry,
        level: &LevelId,
    ) -> Option<LevelVisualConfig> {
        registry.get_named(&LevelVisualConfig::entry_name(level.as_str()))
    }

    /// Instantiates the level's visual template at the world origin.
    ///
    /// Returns the new node, or `Ok(None)` when the level has no visual
    /// payload or its template is not registered. Factory failures such as
    /// budget exhaustion are fatal and propagate to the caller. Does not
    /// alter the current level.
    pub fn load_level(
        &self,
        scene: &mut SceneGraph,
        registry: &ConfigRegistry,
        level: &LevelId,
    ) -> Result<Option<NodeId>, SceneError> {
        let visual = match self.visual_config(registry, level) {
            Some(visual) => visual,
            None => {
                warn!("level '{}' has no visual payload", level.as_str());
                return Ok(None);
            }
        };
        let template = match scene.template(&visual.template) {
            Some(template) => template,
            None => {
                warn!(
                    "level '{}' names unregistered template '{}'",
                    level.as_str(),
                    visual.template
                );
                return Ok(None);
            }
        };
        let node = scene.instantiate(template, Pose::IDENTITY, None)?;
        Ok(Some(node))
    }

    /// Swaps to the provided level, tearing the previous one down first.
    ///
    /// Observers of `events` see the transaction in total order: started,
    /// unloaded for the previous level if any, then completed carrying the
    /// node with the level-map capability. When the instantiated node
    /// carries no level map the setup fails: the node is destroyed, the
    /// failure is logged, and no level is current afterwards. Factory
    /// failures propagate as errors after started and unloaded have been
    /// emitted; `SetupCompleted` is never emitted on any failure path.
    pub fn setup_level(
        &mut self,
        scene: &mut SceneGraph,
        registry: &ConfigRegistry,
        level: LevelId,
        events: &mut Vec<LevelEvent>,
    ) -> Result<(), SceneError> {
        info!("setting up level '{}'", level.as_str());
        events.push(LevelEvent::SetupStarted {
            level: level.clone(),
        });

        if let Some((previous, node)) = self.current.take() {
            events.push(LevelEvent::Unloaded {
                level: previous,
            });
            scene.destroy(node);
        }

        let node = match self.load_level(scene, registry, &level)? {
            Some(node) => node,
            None => return Ok(()),
        };
        if scene.level_map(node).is_none() {
            error!(
                "level '{}' instantiated without a level-map capability",
                level.as_str()
            );
            scene.destroy(node);
            return Ok(());
        }
        self.current = Some((level.clone(), node));
        events.push(LevelEvent::SetupCompleted { level, map: node });
        Ok(())
    }

    /// Restarts the current level; warns and does nothing when none is set.
    pub fn setup_current(
        &mut self,
        scene: &mut SceneGraph,
        registry: &ConfigRegistry,
        events: &mut Vec<LevelEvent>,
    ) -> Result<(), SceneError> {
        match self.current_id() {
            Some(level) => self.setup_level(scene, registry, level, events),
            None => {
                warn!("no current level to set up");
                Ok(())
            }
        }
    }

    /// Node of the currently instantiated level, if any.
    #[must_use]
    pub fn current_node(&self) -> Option<NodeId> {
        self.current.as_ref().map(|(_, node)| *node)
    }

    /// Identifier of the currently instantiated level, if any.
    #[must_use]
    pub fn current_id(&self) -> Option<LevelId> {
        self.current.as_ref().map(|(level, _)| level.clone())
    }
}
