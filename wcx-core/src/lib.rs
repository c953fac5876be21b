//! Packer plugin protocol core.
//!
//! Everything behind the exported entry points lives here: handle
//! bookkeeping, the header cursor, extraction dispatch and the byte layouts
//! of the host's structures. `wcx-ffi` only decodes raw arguments and calls
//! into [`ArchiveManager`].

pub mod backend;
pub mod codec;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod manager;
pub mod registry;
pub mod session;
pub mod wcxhead;

#[cfg(test)]
mod testing;

use std::path::Path;
use std::sync::Once;

pub use backend::{ArchiveOpener, BethesdaOpener};
pub use config::PluginConfig;
pub use dispatch::{Destination, Operation};
pub use error::{Result, WcxError};
pub use manager::ArchiveManager;
pub use registry::Handle;
pub use session::{HeaderRecord, OpenMode};

static INIT: Once = Once::new();

/// One-time plugin setup: configuration from the host ini file, then the file log.
pub fn initialize(ini_path: Option<&Path>) {
    INIT.call_once(|| {
        config::init(ini_path.map(PluginConfig::from_ini).unwrap_or_default());
        let config = config::get();
        if logging::init(config) {
            log::info!(
                "{} {} initialized (level {})",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                config.log_level
            );
        }
    });
}
