//! # Configuration Commands

use tracing::debug;

use crate::state::ConfigState;

/// The loaded configuration, for display in a settings view.
pub fn get_config(config: &ConfigState) -> ConfigState {
    debug!("get_config command");
    config.clone()
}
