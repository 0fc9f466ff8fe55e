#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Composition root for the Bastion Defence runtime services.
//!
//! The service graph is wired by plain construction in dependency order —
//! scene graph and persistence backend first, then the registries and
//! façades, then the pool, the level service, and the scene loader. Hosts
//! own the [`Runtime`] value and call [`Runtime::tick`] once per frame to
//! pump the deferred work: queued pool self-releases and pending scene
//! transitions.

use std::path::Path;

use anyhow::Context;
use bastion_scene::SceneGraph;
use bastion_service_config::ConfigRegistry;
use bastion_service_level::LevelService;
use bastion_service_pool::PoolService;
use bastion_service_save::{FileBackend, SaveService};
use bastion_service_scene_flow::SceneLoader;
use bastion_service_ui_pages::PageRegistry;
use log::info;

/// Fully wired runtime service layer.
pub struct Runtime {
    /// Headless scene graph shared by the services.
    pub scene: SceneGraph,
    /// Eagerly loaded configuration payloads.
    pub configs: ConfigRegistry,
    /// Durable key/value persistence façade.
    pub save: SaveService<FileBackend>,
    /// Reusable-instance pool.
    pub pool: PoolService,
    /// Level lifecycle coordinator.
    pub level: LevelService,
    /// Registry of UI page handles.
    pub pages: PageRegistry,
    /// Asynchronous scene switcher.
    pub loader: SceneLoader,
}

impl Runtime {
    /// Constructs the service graph from an asset root and a save path.
    pub fn new(config_root: &Path, save_path: &Path) -> anyhow::Result<Self> {
        let scene = SceneGraph::new();
        let backend = FileBackend::open(save_path)
            .with_context(|| format!("opening save file {}", save_path.display()))?;
        let save = SaveService::new(backend);
        let configs = ConfigRegistry::new(config_root);
        info!(
            "runtime up: {} config payloads under {}",
            configs.len(),
            config_root.display()
        );
        Ok(Self {
            scene,
            configs,
            save,
            pool: PoolService::new(),
            level: LevelService::new(),
            pages: PageRegistry::new(),
            loader: SceneLoader::new(),
        })
    }

    /// Pumps deferred work once per host frame.
    pub fn tick(&mut self) {
        self.pool.flush_releases(&mut self.scene);
        self.loader.tick();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bastion_core::{LevelEvent, LevelId, SceneId};
    use bastion_scene::LevelMap;
    use glam::Vec3;
    use std::fs;
    use tempfile::TempDir;

    fn runtime_with_level() -> (Runtime, TempDir) {
        let dir = TempDir::new().expect("tempdir");
        let configs = dir.path().join("Configs");
        fs::create_dir(&configs).expect("configs dir");
        fs::write(
            configs.join("lvl_01.toml"),
            r#"
kind = "LevelConfig"
name = "Lvl_01"

[payload]
level = "Lvl_01"
waves = []
"#,
        )
        .expect("level config");
        fs::write(
            configs.join("lvl_01_visual.toml"),
            r#"
kind = "LevelVisualConfig"
name = "Lvl_01.visual"

[payload]
level = "Lvl_01"
template = "map_one"
"#,
        )
        .expect("visual config");

        let mut runtime =
            Runtime::new(&configs, &dir.path().join("save.json")).expect("runtime");
        let template = runtime.scene.add_node(None).expect("template");
        runtime
            .scene
            .set_level_map(template, LevelMap::new(Vec3::ZERO, Vec3::X, Vec::new()));
        runtime.scene.register_template("map_one", template);
        (runtime, dir)
    }

    #[test]
    fn construction_wires_every_service() {
        let (mut runtime, _dir) = runtime_with_level();

        let mut events = Vec::new();
        runtime
            .level
            .setup_level(
                &mut runtime.scene,
                &runtime.configs,
                LevelId::new("Lvl_01"),
                &mut events,
            )
            .expect("setup");
        assert!(matches!(
            events.last(),
            Some(LevelEvent::SetupCompleted { .. })
        ));

        runtime.save.save("boot", "ok").expect("save");
        assert_eq!(
            runtime.save.load("boot").expect("load").as_deref(),
            Some("ok")
        );
    }

    #[test]
    fn tick_pumps_scene_transitions() {
        let (mut runtime, _dir) = runtime_with_level();
        runtime.loader.load_via_interstitial_async(SceneId::Main);
        runtime.tick();
        assert_eq!(runtime.loader.active(), SceneId::Interstitial);
        assert_eq!(runtime.loader.take_staged_target(), Some(SceneId::Main));
    }
}
