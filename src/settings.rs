//! Core Settings
//!
//! Configuration consumed when the core layer starts up.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use tessera::settings::{CoreSettings, DeviceInfo};
//!
//! let settings = CoreSettings {
//!     device: DeviceInfo::new("Vulkan", "Forward"),
//!     command_queue_capacity: 256,
//!     ..Default::default()
//! };
//!
//! let core = CoreThread::spawn(&settings)?;
//! ```

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DeviceInfo
// ---------------------------------------------------------------------------

/// Identifies the active render system and renderer.
///
/// Shaders pick the technique to run from these two names. A technique that
/// names [`DeviceInfo::ANY`] for either field matches every device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub render_system: String,
    pub renderer: String,
}

impl DeviceInfo {
    /// Wildcard name accepted by technique matching.
    pub const ANY: &'static str = "Any";

    #[must_use]
    pub fn new(render_system: impl Into<String>, renderer: impl Into<String>) -> Self {
        Self {
            render_system: render_system.into(),
            renderer: renderer.into(),
        }
    }
}

impl Default for DeviceInfo {
    #[inline]
    fn default() -> Self {
        Self::new("wgpu", Self::ANY)
    }
}

// ---------------------------------------------------------------------------
// CoreSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreSettings {
    /// Device used to select shader techniques.
    pub device: DeviceInfo,

    /// Maximum number of commands waiting for the render thread.
    ///
    /// `0` means unbounded. With a bound, producers block once the queue is
    /// full.
    pub command_queue_capacity: usize,

    /// OS name of the spawned render thread.
    pub render_thread_name: String,

    /// Number of platform drag events buffered between two ticks.
    pub drag_event_capacity: usize,
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            device: DeviceInfo::default(),
            command_queue_capacity: 0,
            render_thread_name: "tessera-core".to_string(),
            drag_event_capacity: 64,
        }
    }
}
