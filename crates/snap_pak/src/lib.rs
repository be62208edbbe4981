//! This library handles reading from and creating **SNAPPAK** content archives.
//!
//! # Pak Archive Format Documentation
//!
//! A pak file packs a directory tree into a single seekable file. Every entry can be compressed
//! (Brotli or Deflate) and sealed with AES-256-GCM independently of the others. The reader lists,
//! verifies and streams single entries without loading the whole archive into memory.
//!
//! ## File Structure
//!
//! A pak file consists of a header, followed by the table of contents (TOC), followed by the data
//! region holding every payload back to back in TOC order.
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Magic number           | 8 bytes: "SNAPPAK" followed by a zero byte                 |
//! | 0x0008         | Version                | 2 bytes: 2 or 3, absent in version 1                       |
//! | 0x000A         | Reserved               | 2 bytes: zero, absent in version 1                         |
//! | 0x000C         | Entry Count            | 4 bytes: Number of TOC entries (at 0x0008 in version 1)    |
//!
//! ### Table of Contents
//!
//! Each entry has the following structure:
//!
//! | Size (bytes)   | Field                  | Description                                             |
//! |----------------|------------------------|---------------------------------------------------------|
//! | 2              | Path Length            | Length of the path in bytes                             |
//! | Path Length    | Path                   | UTF-8, forward slash separated, no leading slash        |
//! | 8              | Offset                 | Absolute offset of the payload                          |
//! | 8              | Stored Size            | Size of the payload as it sits in the archive           |
//! | 8              | Original Size          | Size once decoded (version 2 and later)                 |
//! | 1              | Compression            | 0: none, 1: Brotli, 2: Deflate (version 2 and later)    |
//! | 1              | Encrypted              | 0 or 1 (version 3 only)                                 |
//!
//! Version 1 entries stop after the stored size: their original size equals the stored size, and
//! they are neither compressed nor encrypted. Version 2 entries are never encrypted.
//!
//! The first payload starts right after the TOC, and every following payload starts where the
//! previous one ended.
//!
//! ### Version Detection
//!
//! Version 1 has no version field. After the magic, the reader looks at the next two bytes: 3 or
//! 2 select those layouts; anything else is treated as the low half of a version 1 entry count.
//! See [`types::FormatVersion::sniff`]. The writer always produces version 3.
//!
//! ### Encrypted Payloads
//!
//! An encrypted payload is `nonce (12) || ciphertext || tag (16)`. The associated data is the
//! entry path, its original size as a little endian 64-bit integer, and its compression byte,
//! so editing any of those TOC fields makes decryption fail. Compression happens before
//! encryption.
//!
//! ## Additional Information
//!
//! - **File Extension**: `.pak`
//! - **Endianness**: Little-endian for all multi-byte integers
//!

pub mod compression;
pub mod crypto;
pub mod error;
pub mod key;
pub mod pack;
pub mod read;
pub mod substream;
pub mod types;
pub mod write;

pub use compression::CompressionMethod;
pub use key::{ArchiveKey, EnvKeyProvider, KeyProvider};
pub use pack::{build, PackOptions};
pub use read::{read_index, PakArchive, PakIndex};
pub use types::{FormatVersion, TocEntry};
pub use write::PakWriter;
