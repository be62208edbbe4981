//! Base types for structure of a pak file.

use binrw::{binrw, BinRead, BinWrite};

use crate::compression::CompressionMethod;

/// Magic tag every pak file starts with ("SNAPPAK" zero-padded to 8 bytes)
pub const MAGIC: [u8; 8] = *b"SNAPPAK\0";

/// Size of a versioned header: magic, version, reserved and entry count
pub const HEADER_SIZE: u64 = 16;

/// Size of a legacy (v1) header: magic and entry count
pub const LEGACY_HEADER_SIZE: u64 = 12;

/// Size of the random nonce that prefixes every encrypted payload
pub const NONCE_SIZE: usize = 12;

/// Size of the authentication tag that suffixes every encrypted payload
pub const TAG_SIZE: usize = 16;

/// Layout revision of a pak file
///
/// Version 1 archives predate the version field entirely: their entry count
/// sits directly after the magic. See [`FormatVersion::sniff`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum FormatVersion {
    /// path, offset and length per entry
    V1 = 1,
    /// adds original size and compression method
    V2 = 2,
    /// adds the encrypted flag
    V3 = 3,
}

impl FormatVersion {
    /// The layout the writer produces
    pub const LATEST: FormatVersion = FormatVersion::V3;

    /// Resolve the layout from the four bytes following the magic.
    ///
    /// The first two bytes are read as a little endian candidate version. Only
    /// 2 and 3 are recognised; anything else means there is no version field
    /// and those bytes already belong to a v1 entry count. A v1 archive whose
    /// entry count has 2 or 3 in its low 16 bits is therefore read as v2/v3.
    pub fn sniff(prefix: [u8; 4]) -> FormatVersion {
        match u16::from_le_bytes([prefix[0], prefix[1]]) {
            3 => FormatVersion::V3,
            2 => FormatVersion::V2,
            _ => FormatVersion::V1,
        }
    }

    /// Bytes taken by the header of this layout
    pub const fn header_size(self) -> u64 {
        match self {
            FormatVersion::V1 => LEGACY_HEADER_SIZE,
            FormatVersion::V2 | FormatVersion::V3 => HEADER_SIZE,
        }
    }
}

/// Header of a versioned (v2 and later) pak file
#[derive(BinRead, BinWrite, Debug, Copy, Clone, PartialEq, Eq)]
#[brw(magic = b"SNAPPAK\0", little)]
pub struct PakHeader {
    /// Layout revision, 2 or 3
    pub version: u16,

    /// Always zero
    pub reserved: u16,

    /// The number of table of contents entries that follow
    pub entries: u32,
}

impl Default for PakHeader {
    fn default() -> Self {
        Self {
            version: FormatVersion::LATEST as u16,
            reserved: 0,
            entries: 0,
        }
    }
}

/// A `u16` length prefixed UTF-8 path
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TocPath {
    #[br(temp)]
    #[bw(calc = bytes.len() as u16)]
    len: u16,

    /// The raw path bytes
    #[br(count = len)]
    pub bytes: Vec<u8>,
}

impl TocPath {
    /// Serialized size of this path including its length prefix
    pub fn serialized_size(&self) -> u64 {
        2 + self.bytes.len() as u64
    }
}

impl From<&str> for TocPath {
    fn from(value: &str) -> Self {
        Self {
            bytes: value.as_bytes().to_vec(),
        }
    }
}

/// Version 1 table of contents record
#[derive(BinRead, BinWrite, Debug, Clone, Default, PartialEq, Eq)]
#[brw(little)]
pub struct TocRecordV1 {
    /// Archive relative path
    pub path: TocPath,
    /// Absolute offset of the payload
    pub offset: u64,
    /// Length of the payload
    pub length: u64,
}

/// Version 2 table of contents record
#[derive(BinRead, BinWrite, Debug, Clone, Default, PartialEq, Eq)]
#[brw(little)]
pub struct TocRecordV2 {
    /// Archive relative path
    pub path: TocPath,
    /// Absolute offset of the payload
    pub offset: u64,
    /// Length of the payload as stored
    pub stored: u64,
    /// Length of the payload once decoded
    pub original: u64,
    /// Codec used for the payload
    pub compression: CompressionMethod,
}

/// Version 3 table of contents record
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TocRecordV3 {
    /// Archive relative path
    pub path: TocPath,
    /// Absolute offset of the payload
    pub offset: u64,
    /// Length of the payload as stored
    pub stored: u64,
    /// Length of the payload once decoded
    pub original: u64,
    /// Codec used for the payload
    pub compression: CompressionMethod,
    /// Whether the payload is sealed with AES-256-GCM
    #[br(map = |b: u8| b != 0)]
    #[bw(map = |e: &bool| u8::from(*e))]
    pub encrypted: bool,
}

/// Fixed bytes of a v3 record besides the path bytes
const V3_FIXED_SIZE: u64 = 2 + 8 + 8 + 8 + 1 + 1;

/// Uniform view of a table of contents entry, whatever layout it was read from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TocEntry {
    /// Archive relative path, forward slash separated
    pub path: String,
    /// Absolute offset of the payload from the start of the file
    pub offset: u64,
    /// Length of the payload as it sits in the archive
    pub stored: u64,
    /// Length of the payload once decrypted and decompressed
    pub original: u64,
    /// Codec used for the payload
    pub compression: CompressionMethod,
    /// Whether the payload is sealed with AES-256-GCM
    pub encrypted: bool,
}

impl TocEntry {
    /// Size of this entry once serialized as a v3 record
    pub fn serialized_size(&self) -> u64 {
        V3_FIXED_SIZE + self.path.len() as u64
    }

    /// One past the last payload byte
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.stored)
    }

    pub(crate) fn to_record(&self) -> TocRecordV3 {
        TocRecordV3 {
            path: self.path.as_str().into(),
            offset: self.offset,
            stored: self.stored,
            original: self.original,
            compression: self.compression,
            encrypted: self.encrypted,
        }
    }
}

/// A decoded record whose path bytes still need validating
pub(crate) struct RawEntry {
    pub path: Vec<u8>,
    pub offset: u64,
    pub stored: u64,
    pub original: u64,
    pub compression: CompressionMethod,
    pub encrypted: bool,
}

impl From<TocRecordV1> for RawEntry {
    fn from(r: TocRecordV1) -> Self {
        RawEntry {
            path: r.path.bytes,
            offset: r.offset,
            stored: r.length,
            original: r.length,
            compression: CompressionMethod::None,
            encrypted: false,
        }
    }
}

impl From<TocRecordV2> for RawEntry {
    fn from(r: TocRecordV2) -> Self {
        RawEntry {
            path: r.path.bytes,
            offset: r.offset,
            stored: r.stored,
            original: r.original,
            compression: r.compression,
            encrypted: false,
        }
    }
}

impl From<TocRecordV3> for RawEntry {
    fn from(r: TocRecordV3) -> Self {
        RawEntry {
            path: r.path.bytes,
            offset: r.offset,
            stored: r.stored,
            original: r.original,
            compression: r.compression,
            encrypted: r.encrypted,
        }
    }
}
