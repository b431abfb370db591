// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use dpucaps::backend::RestrictionSource;
use dpucaps::restriction::RestrictionTable;
use dpucaps::Error;
use std::fs;
use std::path::PathBuf;

/// Restriction source backed by a JSON description file
///
/// The file is re-read on every query so that `watch` picks up edits.
#[derive(Debug)]
pub struct JsonSource {
    path: PathBuf,
    min_version: u32,
}

impl JsonSource {
    pub fn new(path: impl Into<PathBuf>, min_version: u32) -> Self {
        Self {
            path: path.into(),
            min_version,
        }
    }
}

impl RestrictionSource for JsonSource {
    fn open(&mut self) -> Result<(), Error> {
        let meta = fs::metadata(&self.path)?;
        if !meta.is_file() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not a regular file", self.path.display()),
            )));
        }
        log::debug!("Opened restriction description {}", self.path.display());
        Ok(())
    }

    fn query(&self) -> Result<RestrictionTable, Error> {
        let text = fs::read_to_string(&self.path)?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Source(format!("{}: {}", self.path.display(), e).into()))
    }

    fn min_version(&self) -> u32 {
        self.min_version
    }
}
