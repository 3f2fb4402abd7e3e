//! Plugin trait and lifecycle
//!
//! `Created → Initialized → Enabled ⇄ Disabled → ShutDown`. The transition
//! methods on [`Plugin`] are provided; implementors supply the `on_*` hooks.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PluginError;

/// Capability set a plugin provides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginCategory {
    Recorder,
    Asr,
    Llm,
    Director,
}

impl PluginCategory {
    pub const ALL: [PluginCategory; 4] = [
        PluginCategory::Recorder,
        PluginCategory::Asr,
        PluginCategory::Llm,
        PluginCategory::Director,
    ];
}

impl fmt::Display for PluginCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PluginCategory::Recorder => "recorder",
            PluginCategory::Asr => "ASR",
            PluginCategory::Llm => "LLM",
            PluginCategory::Director => "director",
        })
    }
}

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginState {
    Created,
    Initialized,
    Enabled,
    Disabled,
    ShutDown,
}

impl fmt::Display for PluginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PluginState::Created => "created",
            PluginState::Initialized => "initialized",
            PluginState::Enabled => "enabled",
            PluginState::Disabled => "disabled",
            PluginState::ShutDown => "shut down",
        })
    }
}

/// Lifecycle state holder embedded in every plugin
#[derive(Debug)]
pub struct Lifecycle {
    state: Mutex<PluginState>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PluginState::Created),
        }
    }

    pub fn state(&self) -> PluginState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set(&self, state: PluginState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Common surface of every plugin
///
/// Hooks run without the lifecycle lock held. A hook error leaves the state
/// unchanged.
pub trait Plugin: Send + Sync {
    /// Stable identifier, unique within a category
    fn id(&self) -> &str;

    fn lifecycle(&self) -> &Lifecycle;

    /// Replace the plugin's options. Each plugin deserializes its own type.
    fn update_options(&self, options: serde_json::Value) -> Result<(), PluginError>;

    fn on_initialize(&self) -> Result<(), PluginError> {
        Ok(())
    }

    fn on_enable(&self) -> Result<(), PluginError> {
        Ok(())
    }

    fn on_disable(&self) -> Result<(), PluginError> {
        Ok(())
    }

    fn on_shutdown(&self) -> Result<(), PluginError> {
        Ok(())
    }

    fn state(&self) -> PluginState {
        self.lifecycle().state()
    }

    fn is_enabled(&self) -> bool {
        self.state() == PluginState::Enabled
    }

    /// `Created → Initialized`; repeated calls are no-ops
    fn initialize(&self) -> Result<(), PluginError> {
        match self.state() {
            PluginState::Created => {
                self.on_initialize()?;
                self.lifecycle().set(PluginState::Initialized);
                debug!("Plugin {} initialized", self.id());
                Ok(())
            }
            PluginState::ShutDown => Err(invalid(self.id(), "initialize", PluginState::ShutDown)),
            _ => Ok(()),
        }
    }

    /// `Initialized | Disabled → Enabled`; no-op when already enabled
    fn enable(&self) -> Result<(), PluginError> {
        match self.state() {
            PluginState::Initialized | PluginState::Disabled => {
                self.on_enable()?;
                self.lifecycle().set(PluginState::Enabled);
                debug!("Plugin {} enabled", self.id());
                Ok(())
            }
            PluginState::Enabled => Ok(()),
            state => Err(invalid(self.id(), "enable", state)),
        }
    }

    /// `Enabled → Disabled`; no-op in any other state
    fn disable(&self) -> Result<(), PluginError> {
        if self.state() != PluginState::Enabled {
            return Ok(());
        }
        self.on_disable()?;
        self.lifecycle().set(PluginState::Disabled);
        debug!("Plugin {} disabled", self.id());
        Ok(())
    }

    /// Terminal. Disables first if still enabled.
    fn shutdown(&self) -> Result<(), PluginError> {
        match self.state() {
            PluginState::ShutDown => Ok(()),
            state => {
                if state == PluginState::Enabled {
                    self.disable()?;
                }
                self.on_shutdown()?;
                self.lifecycle().set(PluginState::ShutDown);
                debug!("Plugin {} shut down", self.id());
                Ok(())
            }
        }
    }
}

fn invalid(id: &str, action: &'static str, state: PluginState) -> PluginError {
    PluginError::InvalidState {
        id: id.to_string(),
        action,
        state,
    }
}

/// Deserialize a plugin's options, mapping failures to [`PluginError::InvalidOptions`]
pub fn parse_options<T: serde::de::DeserializeOwned>(
    plugin_id: &str,
    options: serde_json::Value,
) -> Result<T, PluginError> {
    serde_json::from_value(options).map_err(|e| PluginError::InvalidOptions {
        id: plugin_id.to_string(),
        message: e.to_string(),
    })
}
