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

    /// Print the full matrix instead of only the overlapping pairs
    #[arg(long)]
    matrix: bool,

    /// Reject descriptions older than this restriction version
    #[arg(long, default_value = "0")]
    min_version: u32,
}

#[derive(Debug, Serialize)]
struct OverlapReport {
    channels: usize,
    pairs: Vec<[usize; 2]>,
    classes: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    matrix: Option<Vec<Vec<bool>>>,
}

pub fn execute(args: Args, json: bool) -> Result<(), CliError> {
    log::debug!("Executing overlap command: {:?}", args);

    let (_device, iface) = load_interface(&args.file, args.min_version)?;
    let info = iface.capability_info();
    let features = info.features();
    let count = info.channel_count();

    let report = OverlapReport {
        channels: count,
        pairs: features.overlap().pairs().map(|(i, j)| [i, j]).collect(),
        classes: (0..count)
            .map(|i| features.class_of(i).unwrap_or(i))
            .collect(),
        matrix: args.matrix.then(|| {
            (0..count)
                .map(|i| (0..count).map(|j| features.overlaps(i, j)).collect())
                .collect()
        }),
    };

    if json {
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::General(format!("Failed to serialize JSON: {}", e)))?;
        println!("{}", json_str);
    } else {
        print_text_overlap(&report);
    }

    Ok(())
}

fn print_text_overlap(report: &OverlapReport) {
    println!("General channels: {}", report.channels);

    if report.pairs.is_empty() {
        println!("No overlapping channels");
    } else {
        println!("Overlapping pairs:");
        for [i, j] in &report.pairs {
            println!("  {} <-> {}", i, j);
        }
    }

    let classes: Vec<String> = report.classes.iter().map(|c| c.to_string()).collect();
    println!("Capability classes: {}", classes.join(" "));

    if let Some(matrix) = &report.matrix {
        print!("   ");
        for j in 0..report.channels {
            print!("{:>3}", j);
        }
        println!();
        for (i, row) in matrix.iter().enumerate() {
            print!("{:>3}", i);
            for &cell in row {
                print!("{:>3}", if cell { "x" } else { "." });
            }
            println!();
        }
    }
}
