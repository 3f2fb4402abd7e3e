//! Plugin registry
//!
//! Owns every plugin, grouped by category, and tracks at most one active
//! plugin per category. Single writer: share it as [`SharedRegistry`].

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, error, info};

use crate::contracts::{AsrPlugin, DirectorPlugin, LlmPlugin, RecorderPlugin};
use crate::error::PluginError;
use crate::plugin::{PluginCategory, PluginState};

/// Registry shared between the application and the director
pub type SharedRegistry = Arc<RwLock<PluginRegistry>>;

/// A registered plugin, tagged with its capability set
#[derive(Clone)]
pub enum PluginHandle {
    Recorder(Arc<dyn RecorderPlugin>),
    Asr(Arc<dyn AsrPlugin>),
    Llm(Arc<dyn LlmPlugin>),
    Director(Arc<dyn DirectorPlugin>),
}

macro_rules! with_plugin {
    ($handle:expr, $p:ident => $body:expr) => {
        match $handle {
            PluginHandle::Recorder($p) => $body,
            PluginHandle::Asr($p) => $body,
            PluginHandle::Llm($p) => $body,
            PluginHandle::Director($p) => $body,
        }
    };
}

impl PluginHandle {
    pub fn category(&self) -> PluginCategory {
        match self {
            PluginHandle::Recorder(_) => PluginCategory::Recorder,
            PluginHandle::Asr(_) => PluginCategory::Asr,
            PluginHandle::Llm(_) => PluginCategory::Llm,
            PluginHandle::Director(_) => PluginCategory::Director,
        }
    }

    pub fn id(&self) -> &str {
        with_plugin!(self, p => p.id())
    }

    pub fn state(&self) -> PluginState {
        with_plugin!(self, p => p.state())
    }

    pub fn initialize(&self) -> Result<(), PluginError> {
        with_plugin!(self, p => p.initialize())
    }

    pub fn enable(&self) -> Result<(), PluginError> {
        with_plugin!(self, p => p.enable())
    }

    pub fn disable(&self) -> Result<(), PluginError> {
        with_plugin!(self, p => p.disable())
    }

    pub fn shutdown(&self) -> Result<(), PluginError> {
        with_plugin!(self, p => p.shutdown())
    }

    pub fn update_options(&self, options: serde_json::Value) -> Result<(), PluginError> {
        with_plugin!(self, p => p.update_options(options))
    }
}

impl std::fmt::Debug for PluginHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginHandle")
            .field("category", &self.category())
            .field("id", &self.id())
            .finish()
    }
}

/// Plugins by category plus the active id of each
#[derive(Default)]
pub struct PluginRegistry {
    plugins: HashMap<PluginCategory, Vec<PluginHandle>>,
    active: HashMap<PluginCategory, String>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap in the shared handle the director expects
    pub fn into_shared(self) -> SharedRegistry {
        Arc::new(RwLock::new(self))
    }

    /// Initialize a plugin and append it to its category.
    ///
    /// Ids are not deduplicated; registering the same id twice is a caller bug.
    pub fn register(&mut self, plugin: PluginHandle) -> Result<(), PluginError> {
        plugin.initialize()?;
        info!("Registered {} plugin {}", plugin.category(), plugin.id());
        self.plugins.entry(plugin.category()).or_default().push(plugin);
        Ok(())
    }

    /// Make `id` the active plugin of `category`.
    ///
    /// The previous plugin is disabled before the new one is enabled so two
    /// plugins of a category never hold resources at once. No-op if already active.
    /// If the new plugin fails to enable, the category is left without an
    /// active plugin.
    pub fn set_active_by_id(&mut self, category: PluginCategory, id: &str) -> Result<(), PluginError> {
        if self.active_id(category) == Some(id) {
            debug!("{} plugin {} already active", category, id);
            return Ok(());
        }

        let target = self
            .get_plugin_by_id(category, id)
            .ok_or_else(|| PluginError::NotFound {
                category,
                id: id.to_string(),
            })?;

        if let Some(previous) = self.get_active(category) {
            previous.disable()?;
            debug!("Disabled {} plugin {}", category, previous.id());
        }

        if let Err(e) = target.enable() {
            self.active.remove(&category);
            error!("Failed to enable {} plugin {}: {}", category, id, e);
            return Err(e);
        }
        self.active.insert(category, id.to_string());
        info!("Activated {} plugin {}", category, id);
        Ok(())
    }

    pub fn active_id(&self, category: PluginCategory) -> Option<&str> {
        self.active.get(&category).map(String::as_str)
    }

    pub fn get_active(&self, category: PluginCategory) -> Option<PluginHandle> {
        let id = self.active_id(category)?;
        self.get_plugin_by_id(category, id)
    }

    pub fn get_plugin_by_id(&self, category: PluginCategory, id: &str) -> Option<PluginHandle> {
        self.plugins
            .get(&category)?
            .iter()
            .find(|p| p.id() == id)
            .cloned()
    }

    /// Registered plugins of a category, in registration order
    pub fn plugins(&self, category: PluginCategory) -> &[PluginHandle] {
        self.plugins.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Hand a new options value to a registered plugin
    pub fn update_options(
        &self,
        category: PluginCategory,
        id: &str,
        options: serde_json::Value,
    ) -> Result<(), PluginError> {
        self.get_plugin_by_id(category, id)
            .ok_or_else(|| PluginError::NotFound {
                category,
                id: id.to_string(),
            })?
            .update_options(options)
    }

    pub fn active_recorder(&self) -> Option<Arc<dyn RecorderPlugin>> {
        match self.get_active(PluginCategory::Recorder)? {
            PluginHandle::Recorder(p) => Some(p),
            _ => None,
        }
    }

    pub fn active_asr(&self) -> Option<Arc<dyn AsrPlugin>> {
        match self.get_active(PluginCategory::Asr)? {
            PluginHandle::Asr(p) => Some(p),
            _ => None,
        }
    }

    pub fn active_llm(&self) -> Option<Arc<dyn LlmPlugin>> {
        match self.get_active(PluginCategory::Llm)? {
            PluginHandle::Llm(p) => Some(p),
            _ => None,
        }
    }

    pub fn active_director(&self) -> Option<Arc<dyn DirectorPlugin>> {
        match self.get_active(PluginCategory::Director)? {
            PluginHandle::Director(p) => Some(p),
            _ => None,
        }
    }

    /// Disable and shut down every registered plugin, active or not.
    ///
    /// Failures are logged and the sweep continues.
    pub fn shutdown_all(&mut self) {
        for category in PluginCategory::ALL {
            for plugin in self.plugins(category) {
                if let Err(e) = plugin.disable() {
                    error!("Failed to disable {} plugin {}: {}", category, plugin.id(), e);
                }
                if let Err(e) = plugin.shutdown() {
                    error!("Failed to shut down {} plugin {}: {}", category, plugin.id(), e);
                }
            }
        }
        self.active.clear();
        info!("All plugins shut down");
    }
}
