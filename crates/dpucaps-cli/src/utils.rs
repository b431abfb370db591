// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::error::CliError;
use crate::source::JsonSource;
use dpucaps::backend::QueryInterface;
use dpucaps::interface::{DeviceInterface, DisplayDevice};
use dpucaps::restriction::ChannelAttributes;
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
use signal_hook::flag;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Stand-in owning device for a description file
struct DescriptionDevice {
    name: String,
}

impl DisplayDevice for DescriptionDevice {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Bring up a query interface over a JSON description and load it once.
///
/// The returned interface keeps its device alive through the returned `Arc`.
pub fn load_interface(
    path: &Path,
    min_version: u32,
) -> Result<(Arc<dyn DisplayDevice>, QueryInterface<JsonSource>), CliError> {
    let device: Arc<dyn DisplayDevice> = Arc::new(DescriptionDevice {
        name: path.display().to_string(),
    });

    let mut iface = QueryInterface::new(JsonSource::new(path, min_version));
    iface.init(&device);
    iface.post_init()?;
    iface.update_restrictions()?;

    log::debug!(
        "Loaded {} general and {} special channels from {}",
        iface.channel_count(),
        iface.special_channel_count(),
        device.name()
    );

    Ok((device, iface))
}

/// Attribute names in flag order, for text and JSON output
pub fn attribute_names(attributes: ChannelAttributes) -> Vec<String> {
    attributes
        .iter_names()
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Install signal handler for graceful shutdown (SIGINT and SIGTERM)
pub fn install_signal_handler() -> Result<Arc<AtomicBool>, CliError> {
    let term = Arc::new(AtomicBool::new(false));

    for signal in [SIGINT, SIGTERM] {
        flag::register(signal, Arc::clone(&term)).map_err(|e| {
            CliError::General(format!("Failed to register signal {}: {}", signal, e))
        })?;
    }

    Ok(term)
}

/// Install the reload trigger (SIGHUP)
pub fn install_reload_handler() -> Result<Arc<AtomicBool>, CliError> {
    let reload = Arc::new(AtomicBool::new(false));

    flag::register(SIGHUP, Arc::clone(&reload))
        .map_err(|e| CliError::General(format!("Failed to register SIGHUP handler: {}", e)))?;

    Ok(reload)
}
