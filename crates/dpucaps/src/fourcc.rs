// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies
//
// DRM fourcc codes. Unlike V4L2 buffers these are always little-endian:
// the first character lives in the least significant byte on every host.

use core::{fmt, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub const ARGB8888: FourCC = FourCC(*b"AR24");
    pub const ABGR8888: FourCC = FourCC(*b"AB24");
    pub const RGBA8888: FourCC = FourCC(*b"RA24");
    pub const XRGB8888: FourCC = FourCC(*b"XR24");
    pub const XBGR8888: FourCC = FourCC(*b"XB24");
    pub const RGB565: FourCC = FourCC(*b"RG16");
    pub const ABGR2101010: FourCC = FourCC(*b"AB30");
    pub const NV12: FourCC = FourCC(*b"NV12");
    pub const NV21: FourCC = FourCC(*b"NV21");
    pub const P010: FourCC = FourCC(*b"P010");
    pub const YUYV: FourCC = FourCC(*b"YUYV");

    const YUV: [FourCC; 6] = [
        FourCC::NV12,
        FourCC::NV21,
        FourCC::P010,
        FourCC::YUYV,
        FourCC(*b"NV16"),
        FourCC(*b"YU12"),
    ];

    pub const fn to_u32(self) -> u32 {
        u32::from_le_bytes(self.0)
    }

    /// Whether the format carries chroma subsampled YUV data.
    ///
    /// YUV planes get stricter size restrictions because crop offsets and
    /// sizes must land on chroma sample boundaries.
    pub fn is_yuv(self) -> bool {
        Self::YUV.contains(&self)
    }
}

impl From<&[u8; 4]> for FourCC {
    fn from(buf: &[u8; 4]) -> FourCC {
        FourCC(*buf)
    }
}

impl From<u32> for FourCC {
    fn from(val: u32) -> FourCC {
        FourCC(val.to_le_bytes())
    }
}

impl From<FourCC> for u32 {
    fn from(val: FourCC) -> Self {
        val.to_u32()
    }
}

/// Error parsing a fourcc string that is not exactly four ASCII bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFourCCError(pub String);

impl fmt::Display for ParseFourCCError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fourcc must be exactly 4 ASCII characters: {:?}", self.0)
    }
}

impl std::error::Error for ParseFourCCError {}

impl FromStr for FourCC {
    type Err = ParseFourCCError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match <[u8; 4]>::try_from(s.as_bytes()) {
            Ok(bytes) if s.is_ascii() => Ok(FourCC(bytes)),
            _ => Err(ParseFourCCError(s.to_string())),
        }
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match core::str::from_utf8(&self.0) {
            Ok(s) => f.write_str(s),
            Err(_) => {
                // Returning fmt::Error would make format!() panic
                let b = &self.0;
                f.write_fmt(format_args!(
                    "{}{}{}{}",
                    core::ascii::escape_default(b[0]),
                    core::ascii::escape_default(b[1]),
                    core::ascii::escape_default(b[2]),
                    core::ascii::escape_default(b[3])
                ))
            }
        }
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_tuple("FourCC")
            .field(&format_args!("{}", self))
            .finish()
    }
}

impl Serialize for FourCC {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FourCC {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
