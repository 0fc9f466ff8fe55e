//! Concrete configuration payload types consumed by gameplay services.

use serde::{Deserialize, Serialize};

use crate::ConfigPayload;

/// Process-wide gameplay parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Gold the player starts a run with.
    pub starting_gold: u32,
    /// Lives the player starts a run with.
    pub starting_lives: u32,
    /// Level the experience opens on.
    pub first_level: String,
}

impl ConfigPayload for GameConfig {
    const KIND: &'static str = "GameConfig";
}

/// Mixer volumes applied at startup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Master bus volume in `[0, 1]`.
    pub master_volume: f32,
    /// Music bus volume in `[0, 1]`.
    pub music_volume: f32,
    /// Effects bus volume in `[0, 1]`.
    pub effects_volume: f32,
}

impl ConfigPayload for AudioConfig {
    const KIND: &'static str = "AudioConfig";
}

/// Combat tuning shared by towers and enemies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BalanceConfig {
    /// Damage dealt per tower shot.
    pub tower_damage: f32,
    /// Interval between tower shots in milliseconds.
    pub tower_fire_interval_ms: u64,
    /// Base enemy hit points.
    pub enemy_health: f32,
    /// Base enemy movement speed in world units per second.
    pub enemy_speed: f32,
}

impl ConfigPayload for BalanceConfig {
    const KIND: &'static str = "BalanceConfig";
}

/// One wave inside a level's schedule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveEntry {
    /// Enemy template spawned by the wave.
    pub enemy: String,
    /// Number of enemies the wave emits.
    pub count: u32,
    /// Interval between spawns in milliseconds.
    pub interval_ms: u64,
}

/// Gameplay payload of a level: its wave schedule.
///
/// Registered under the level identifier itself, so
/// `get_named::<LevelConfig>("Lvl_01")` resolves level one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Level the schedule belongs to.
    pub level: String,
    /// Waves emitted over the course of the level, in order.
    pub waves: Vec<WaveEntry>,
}

impl ConfigPayload for LevelConfig {
    const KIND: &'static str = "LevelConfig";
}

/// Visual payload of a level: the template its scene subtree is built from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelVisualConfig {
    /// Level the template belongs to.
    pub level: String,
    /// Name of the registered scene template to instantiate.
    pub template: String,
}

impl LevelVisualConfig {
    /// Registry entry name for the visual payload of the provided level.
    ///
    /// Gameplay and visual payloads of one level share the single name map,
    /// so visual entries are registered under `"<level>.visual"`.
    #[must_use]
    pub fn entry_name(level: &str) -> String {
        format!("{level}.visual")
    }
}

impl ConfigPayload for LevelVisualConfig {
    const KIND: &'static str = "LevelVisualConfig";
}
