//! [`Guid`]: the 128-bit Microsoft GUID used throughout the exmdb wire
//! protocol (domain store identity, named property GUIDs, change keys).

use binrw::prelude::*;

use crate::error::{DtypError, Result};

/// A 128-bit Microsoft GUID, as laid out on the wire: little-endian
/// `time_low`/`time_mid`/`time_hi_version`, followed by the eight
/// big-endian-ish `clock_seq`/`node` bytes (those two fields are byte
/// arrays, so there is no endianness to speak of for them).
#[binrw::binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Guid {
    pub time_low: u32,
    pub time_mid: u16,
    pub time_hi_version: u16,
    pub clock_seq: [u8; 2],
    pub node: [u8; 6],
}

/// The fixed suffix substituted for every domain-derived GUID. Taken from
/// the exmdb public-folder domain-GUID convention: only `time_low` varies
/// (it carries the domain id), the rest of the fields are constant.
const DOMAIN_GUID_TIME_MID: u16 = 0x0afb;
const DOMAIN_GUID_TIME_HI_VERSION: u16 = 0x7df6;
const DOMAIN_GUID_CLOCK_SEQ: [u8; 2] = [0x91, 0x92];
const DOMAIN_GUID_NODE: [u8; 6] = [0x49, 0x88, 0x6a, 0xa7, 0x38, 0xce];

impl Guid {
    pub const SIZE: usize = 16;

    /// Builds the GUID a public-folder store for `domain_id` is identified
    /// by: the domain id becomes `time_low`, the remaining fields are the
    /// fixed domain-GUID suffix.
    pub fn from_domain_id(domain_id: u32) -> Self {
        Guid {
            time_low: domain_id,
            time_mid: DOMAIN_GUID_TIME_MID,
            time_hi_version: DOMAIN_GUID_TIME_HI_VERSION,
            clock_seq: DOMAIN_GUID_CLOCK_SEQ,
            node: DOMAIN_GUID_NODE,
        }
    }

    /// Parses the canonical `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx` hex
    /// form (braces and hyphens optional other than the 4 required
    /// hyphens at the canonical positions are not enforced strictly; we
    /// simply strip `{`, `}`, and `-` and expect 32 hex digits left).
    pub fn parse(s: &str) -> Result<Self> {
        let stripped: String = s.chars().filter(|c| *c != '{' && *c != '}' && *c != '-').collect();
        if stripped.len() != 32 || !stripped.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DtypError::InvalidGuid(s.to_string()));
        }
        let byte = |i: usize| -> Result<u8> {
            u8::from_str_radix(&stripped[i * 2..i * 2 + 2], 16)
                .map_err(|_| DtypError::InvalidGuid(s.to_string()))
        };
        let time_low = u32::from_be_bytes([byte(0)?, byte(1)?, byte(2)?, byte(3)?]);
        let time_mid = u16::from_be_bytes([byte(4)?, byte(5)?]);
        let time_hi_version = u16::from_be_bytes([byte(6)?, byte(7)?]);
        let clock_seq = [byte(8)?, byte(9)?];
        let mut node = [0u8; 6];
        for (i, n) in node.iter_mut().enumerate() {
            *n = byte(10 + i)?;
        }
        Ok(Guid {
            time_low,
            time_mid,
            time_hi_version,
            clock_seq,
            node,
        })
    }
}

impl std::fmt::Display for Guid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            self.time_low,
            self.time_mid,
            self.time_hi_version,
            self.clock_seq[0],
            self.clock_seq[1],
            self.node[0],
            self.node[1],
            self.node[2],
            self.node[3],
            self.node[4],
            self.node[5],
        )
    }
}
