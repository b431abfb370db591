// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::error::CliError;
use crate::utils::load_interface;
use clap::Args as ClapArgs;
use dpucaps::feature::{FormatClass, SizeRestriction};
use dpucaps::interface::DeviceInterface;
use dpucaps::restriction::{ChannelClass, ChannelEntry};
use serde::Serialize;
use std::path::PathBuf;

#[derive(ClapArgs, Debug)]
pub struct Args {
    /// Restriction description (JSON)
    file: PathBuf,

    /// List special channels instead of general channels
    #[arg(long)]
    special: bool,

    /// Only show the channel with this hardware id
    #[arg(long)]
    id: Option<i32>,

    /// Show derived RGB and YUV size limits (general channels only)
    #[arg(long)]
    sizes: bool,

    /// Reject descriptions older than this restriction version
    #[arg(long, default_value = "0")]
    min_version: u32,
}

#[derive(Debug, Serialize)]
struct ChannelReport<'a> {
    index: usize,
    #[serde(flatten)]
    entry: &'a ChannelEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    capability_class: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sizes: Option<Sizes>,
}

#[derive(Debug, Serialize)]
struct Sizes {
    rgb: SizeRestriction,
    yuv: SizeRestriction,
}

pub fn execute(args: Args, json: bool) -> Result<(), CliError> {
    log::debug!("Executing channels command: {:?}", args);

    if args.special && args.sizes {
        return Err(CliError::InvalidArgs(
            "--sizes applies to general channels only".to_string(),
        ));
    }

    let (_device, iface) = load_interface(&args.file, args.min_version)?;
    let info = iface.capability_info();
    let class = if args.special {
        ChannelClass::Special
    } else {
        ChannelClass::General
    };
    let features = info.features();

    let reports: Vec<ChannelReport> = info
        .table()
        .channels(class)
        .iter()
        .enumerate()
        .filter(|(_, entry)| args.id.map_or(true, |id| entry.id == id))
        .map(|(index, entry)| {
            let general = class == ChannelClass::General;
            let sizes = if general && args.sizes {
                match (
                    features.size_restriction(index, FormatClass::Rgb),
                    features.size_restriction(index, FormatClass::Yuv),
                ) {
                    (Some(&rgb), Some(&yuv)) => Some(Sizes { rgb, yuv }),
                    _ => None,
                }
            } else {
                None
            };
            ChannelReport {
                index,
                entry,
                capability_class: if general {
                    features.class_of(index)
                } else {
                    None
                },
                sizes,
            }
        })
        .collect();

    if let Some(id) = args.id {
        if reports.is_empty() {
            return Err(CliError::InvalidArgs(format!(
                "no {} channel with id {}",
                class, id
            )));
        }
    }

    if json {
        let json_str = serde_json::to_string_pretty(&reports)
            .map_err(|e| CliError::General(format!("Failed to serialize JSON: {}", e)))?;
        println!("{}", json_str);
    } else {
        print_text_channels(class, &reports);
    }

    Ok(())
}

fn print_text_channels(class: ChannelClass, reports: &[ChannelReport]) {
    if reports.is_empty() {
        println!("No {} channels", class);
        return;
    }

    for report in reports {
        match report.capability_class {
            Some(c) if c != report.index => {
                println!("[{}] {} channel (same class as [{}])", report.index, class, c)
            }
            _ => println!("[{}] {} channel", report.index, class),
        }
        println!("{}", report.entry);
        if let Some(sizes) = &report.sizes {
            print_size("rgb", &sizes.rgb);
            print_size("yuv", &sizes.yuv);
        }
    }
}

fn print_size(label: &str, s: &SizeRestriction) {
    println!(
        "  {}: scale down {} up {}, full {}x{}..{}x{} align {}x{}",
        label,
        s.max_down_scale,
        s.max_up_scale,
        s.min_full_width,
        s.min_full_height,
        s.max_full_width,
        s.max_full_height,
        s.full_width_align,
        s.full_height_align,
    );
    println!(
        "  {}: crop {}x{}..{}x{} align x{} y{} w{} h{}",
        label,
        s.min_crop_width,
        s.min_crop_height,
        s.max_crop_width,
        s.max_crop_height,
        s.crop_x_align,
        s.crop_y_align,
        s.crop_width_align,
        s.crop_height_align,
    );
}
