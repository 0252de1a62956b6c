#![doc = r"Drives a presentation-model tree from a platform host and persists its snapshots."]

mod config;
mod error;

pub use config::HostConfig;
pub use error::HostError;

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::rc::Rc;

use pmtree_core::{
    downcast_pm, Description, JsonStateCodec, LifecycleState, Pm, PmContext, PmFactory, PmState,
    PresentationModel, SequentialTags,
};

/// Owner of a root presentation model. Platform callbacks are forwarded to
/// the root, which propagates them through the tree.
pub struct PmHost<D: Description> {
    config: HostConfig,
    context: PmContext<D>,
    root: Pm<D>,
}

impl<D: Description> PmHost<D> {
    pub fn new(
        config: HostConfig,
        factory: Rc<dyn PmFactory<D>>,
        description: D,
    ) -> Result<Self, HostError> {
        Self::build(config, factory, description, None)
    }

    /// Rebuilds the tree a previous [`PmHost::save`] described.
    pub fn from_snapshot(
        config: HostConfig,
        factory: Rc<dyn PmFactory<D>>,
        state: PmState<D>,
    ) -> Result<Self, HostError> {
        let description = state.description.clone();
        Self::build(config, factory, description, Some(state))
    }

    pub fn from_snapshot_json(
        config: HostConfig,
        factory: Rc<dyn PmFactory<D>>,
        json: &str,
    ) -> Result<Self, HostError> {
        let state: PmState<D> = serde_json::from_str(json)?;
        Self::from_snapshot(config, factory, state)
    }

    /// Rebuilds from a file written by [`PmHost::write_snapshot`].
    pub fn read_snapshot(
        config: HostConfig,
        factory: Rc<dyn PmFactory<D>>,
        path: impl AsRef<Path>,
    ) -> Result<Self, HostError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(HostError::io("read", path))?;
        log::debug!("read snapshot from {}", path.display());
        Self::from_snapshot_json(config, factory, &json)
    }

    fn build(
        config: HostConfig,
        factory: Rc<dyn PmFactory<D>>,
        description: D,
        state: Option<PmState<D>>,
    ) -> Result<Self, HostError> {
        let context = PmContext::new(
            factory,
            Rc::new(JsonStateCodec),
            Rc::new(SequentialTags::new(config.tag_prefix.clone())),
        );
        let root = context.create_root(description, config.root_tag.clone(), state)?;
        Ok(Self {
            config,
            context,
            root,
        })
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn context(&self) -> &PmContext<D> {
        &self.context
    }

    pub fn root(&self) -> &Pm<D> {
        &self.root
    }

    /// The root as its concrete presentation-model type.
    pub fn root_as<P: PresentationModel<D>>(&self) -> Option<Rc<P>> {
        downcast_pm(&self.root)
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        self.root.lifecycle_state()
    }

    pub fn on_create(&self) {
        self.move_to(LifecycleState::Created);
    }

    pub fn on_foreground(&self) {
        self.move_to(LifecycleState::InForeground);
    }

    pub fn on_background(&self) {
        self.move_to(LifecycleState::Created);
    }

    pub fn on_destroy(&self) {
        self.move_to(LifecycleState::Destroyed);
    }

    fn move_to(&self, target: LifecycleState) {
        log::trace!("host {}: {target:?}", self.root.tag());
        self.root.node().move_lifecycle_to(target);
    }

    /// Offers a system back press to the tree. `false` means the host should
    /// close.
    pub fn handle_back(&self) -> bool {
        self.root.node().handle_back()
    }

    pub fn save(&self) -> Result<PmState<D>, HostError> {
        Ok(self.root.node().save_state()?)
    }

    pub fn save_json(&self) -> Result<String, HostError> {
        let state = self.save()?;
        let json = if self.config.pretty_snapshots {
            serde_json::to_string_pretty(&state)?
        } else {
            serde_json::to_string(&state)?
        };
        Ok(json)
    }

    /// Brings the live tree back to `state` without rebuilding the root.
    pub fn restore(&self, state: &PmState<D>) -> Result<(), HostError> {
        Ok(self.root.node().restore_state(state)?)
    }

    /// Writes the snapshot next to `path` first and renames it into place, so
    /// a crash never leaves a truncated file behind.
    pub fn write_snapshot(&self, path: impl AsRef<Path>) -> Result<(), HostError> {
        let path = path.as_ref();
        let json = self.save_json()?;

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(HostError::io("create directory", parent))?;
        }
        let temp_path = path.with_extension("tmp");
        let mut file = File::create(&temp_path).map_err(HostError::io("create", &temp_path))?;
        file.write_all(json.as_bytes())
            .map_err(HostError::io("write", &temp_path))?;
        file.sync_all().map_err(HostError::io("sync", &temp_path))?;
        fs::rename(&temp_path, path).map_err(HostError::io("replace", path))?;

        log::debug!("wrote snapshot to {}", path.display());
        Ok(())
    }
}
