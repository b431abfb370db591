// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::error::CliError;
use crate::show::{print_text_summary, summarize};
use crate::utils::{self, load_interface};
use clap::Args as ClapArgs;
use dpucaps::backend::RefreshHandler;
use dpucaps::interface::DeviceInterface;
use std::fs::{self, File};
use std::os::fd::AsRawFd;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};

#[derive(ClapArgs, Debug)]
pub struct Args {
    /// Restriction description (JSON)
    file: PathBuf,

    /// Polling interval for file changes in milliseconds
    #[arg(short, long, default_value = "500")]
    interval: u64,

    /// Reject descriptions older than this restriction version
    #[arg(long, default_value = "0")]
    min_version: u32,
}

fn modified(path: &std::path::Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Reload the description on SIGHUP or when the file changes.
///
/// Refreshes go through a sysfs handler registered for the open description
/// file, the same path a hotplug notification takes. A failed reload keeps
/// the previous restrictions.
pub fn execute(args: Args, json: bool) -> Result<(), CliError> {
    log::debug!("Executing watch command: {:?}", args);

    if args.interval == 0 {
        return Err(CliError::InvalidArgs(
            "interval must be greater than zero".to_string(),
        ));
    }

    let term = utils::install_signal_handler()?;
    let reload = utils::install_reload_handler()?;

    let (_device, iface) = load_interface(&args.file, args.min_version)?;
    let iface = Arc::new(iface);
    let target: Arc<dyn DeviceInterface> = iface.clone();

    // Keeps the descriptor the handler is registered under alive
    let watched = File::open(&args.file).map_err(dpucaps::Error::from)?;
    let fd = watched.as_raw_fd();
    iface.register_sysfs_event_handler(Arc::new(RefreshHandler::new(fd, &target)))?;

    report(iface.as_ref(), json)?;
    log::info!(
        "Watching {} (SIGHUP to reload, Ctrl+C to stop)",
        args.file.display()
    );

    let mut last_modified = modified(&args.file);
    let mut last_version = iface.capability_info().table().version;
    let mut refreshes = 0u64;

    while !term.load(Ordering::Relaxed) {
        thread::sleep(Duration::from_millis(args.interval));

        let current = modified(&args.file);
        let changed = current != last_modified;
        if !reload.swap(false, Ordering::Relaxed) && !changed {
            continue;
        }
        last_modified = current;

        let Some(handler) = iface.sysfs_handler(fd) else {
            log::warn!("No refresh handler registered for fd {}", fd);
            break;
        };
        handler.handle_sysfs_event();
        refreshes += 1;

        let info = iface.capability_info();
        if info.table().version != last_version || changed {
            last_version = info.table().version;
            report(iface.as_ref(), json)?;
        }
    }

    iface.unregister_sysfs_event_handler(fd)?;
    log::info!("Stopped after {} refreshes", refreshes);
    Ok(())
}

fn report(iface: &dyn DeviceInterface, json: bool) -> Result<(), CliError> {
    let summary = summarize(iface)?;
    if json {
        // One object per line so the stream can be consumed incrementally
        let json_str = serde_json::to_string(&summary)
            .map_err(|e| CliError::General(format!("Failed to serialize JSON: {}", e)))?;
        println!("{}", json_str);
    } else {
        print_text_summary(&summary);
        println!();
    }
    Ok(())
}
