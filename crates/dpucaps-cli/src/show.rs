// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::error::CliError;
use crate::utils::{attribute_names, load_interface};
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
pub(crate) struct Summary {
    pub version: u32,
    pub interface: String,
    pub use_query: bool,
    pub ppc: u32,
    pub max_disp_freq: u32,
    pub channels: usize,
    pub special_channels: Vec<SpecialChannel>,
    pub attributes: Vec<String>,
    pub formats: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SpecialChannel {
    pub index: usize,
    pub id: i32,
    pub attributes: Vec<String>,
}

/// Summarize the committed tables of a loaded interface
pub(crate) fn summarize(iface: &dyn DeviceInterface) -> Result<Summary, CliError> {
    let info = iface.capability_info();
    let table = info.table();

    let mut special_channels = Vec::with_capacity(iface.special_channel_count());
    for index in 0..iface.special_channel_count() {
        special_channels.push(SpecialChannel {
            index,
            id: iface.special_channel_id(index)?,
            attributes: attribute_names(iface.special_channel_attributes(index)?),
        });
    }

    Ok(Summary {
        version: table.version,
        interface: iface.interface_type().to_string(),
        use_query: iface.use_query(),
        ppc: table.ppc,
        max_disp_freq: table.max_disp_freq,
        channels: iface.channel_count(),
        special_channels,
        attributes: attribute_names(info.features().attributes()),
        formats: info.features().formats().iter().map(|f| f.to_string()).collect(),
    })
}

pub(crate) fn print_text_summary(summary: &Summary) {
    println!("Restriction version: {}", summary.version);
    println!(
        "Interface:           {} (live query: {})",
        summary.interface,
        if summary.use_query { "yes" } else { "no" }
    );
    println!("Pixels per clock:    {}", summary.ppc);
    println!("Max display freq:    {} kHz", summary.max_disp_freq);
    println!("General channels:    {}", summary.channels);
    println!("Special channels:    {}", summary.special_channels.len());
    for ch in &summary.special_channels {
        println!(
            "  [{}] id {}: {}",
            ch.index,
            ch.id,
            if ch.attributes.is_empty() {
                "none".to_string()
            } else {
                ch.attributes.join(" | ")
            }
        );
    }
    println!("Attributes:          {}", summary.attributes.join(" | "));
    println!("Formats:             {}", summary.formats.join(" "));
}

pub fn execute(args: Args, json: bool) -> Result<(), CliError> {
    log::debug!("Executing show command: {:?}", args);

    let (_device, iface) = load_interface(&args.file, args.min_version)?;
    let summary = summarize(&iface)?;

    if json {
        let json_str = serde_json::to_string_pretty(&summary)
            .map_err(|e| CliError::General(format!("Failed to serialize JSON: {}", e)))?;
        println!("{}", json_str);
    } else {
        print_text_summary(&summary);
    }

    Ok(())
}
