// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::error::CliError;
use crate::utils::load_interface;
use clap::Args as ClapArgs;
use dpucaps::interface::DeviceInterface;
use serde::Serialize;
use std::path::PathBuf;

#[derive(ClapArgs, Debug)]
pub struct Args {
    /// Restriction description (JSON)
    file: PathBuf,

    /// Reject descriptions older than this restriction version
    #[arg(long, default_value = "0")]
    min_version: u32,
}

#[derive(Debug, Serialize)]
struct CheckReport {
    file: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    channels: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    special_channels: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    overlapping_pairs: Option<usize>,
}

fn print_json(report: &CheckReport) -> Result<(), CliError> {
    let json_str = serde_json::to_string_pretty(report)
        .map_err(|e| CliError::General(format!("Failed to serialize JSON: {}", e)))?;
    println!("{}", json_str);
    Ok(())
}

/// Validate a description; malformed input exits with code 4.
///
/// With `--json` a rejected description still prints a report with
/// `"valid": false` before the error is returned.
pub fn execute(args: Args, json: bool) -> Result<(), CliError> {
    log::debug!("Executing check command: {:?}", args);

    let file = args.file.display().to_string();

    let (_device, iface) = match load_interface(&args.file, args.min_version) {
        Ok(loaded) => loaded,
        Err(err @ CliError::Malformed(_)) => {
            if json {
                print_json(&CheckReport {
                    file,
                    valid: false,
                    error: Some(err.to_string()),
                    version: None,
                    channels: None,
                    special_channels: None,
                    overlapping_pairs: None,
                })?;
            }
            return Err(err);
        }
        Err(err) => return Err(err),
    };
    let info = iface.capability_info();

    let report = CheckReport {
        file,
        valid: true,
        error: None,
        version: Some(info.table().version),
        channels: Some(info.channel_count()),
        special_channels: Some(info.special_channel_count()),
        overlapping_pairs: Some(info.features().overlap().pairs().count()),
    };

    if json {
        print_json(&report)?;
    } else {
        println!(
            "OK: {} (version {}, {} general, {} special channels)",
            report.file,
            info.table().version,
            info.channel_count(),
            info.special_channel_count()
        );
    }

    Ok(())
}
