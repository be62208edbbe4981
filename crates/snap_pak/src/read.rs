//! Types for reading pak archives
//!

use binrw::{meta::ReadEndian, BinRead};
use byteorder::{LittleEndian, ReadBytesExt};
use indexmap::IndexMap;
use std::{
    fmt::{self, Debug},
    fs::File,
    io::{self, BufReader, Cursor, Read, Seek, SeekFrom, Write},
    path::{Component, Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, info, instrument, warn};

use crate::{
    compression::{CompressionMethod, PakBlockReader},
    crypto,
    error::{ConfigurationError, Error, FileNotFoundError, FormatError, IntegrityError, Result},
    key::ArchiveKey,
    substream::SubStream,
    types::{FormatVersion, RawEntry, TocEntry, TocRecordV1, TocRecordV2, TocRecordV3, MAGIC},
};

/// Size of the buffer entries are copied through
const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Stored bytes of an entry, decrypted if needed
enum PayloadReader<'a, R: Read + Seek> {
    Stored(SubStream<&'a mut R>),
    Decrypted(Cursor<Vec<u8>>),
}

impl<R: Read + Seek> Read for PayloadReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            PayloadReader::Stored(r) => r.read(buf),
            PayloadReader::Decrypted(r) => r.read(buf),
        }
    }
}

/// A struct for reading an entry from a pak file
///
/// Reading yields the original bytes: the payload is decrypted when the
/// entry is encrypted, then decompressed.
pub struct PakFile<'a, R: Read + Seek> {
    data: &'a TocEntry,
    reader: PakBlockReader<PayloadReader<'a, R>>,
    decoded: u64,
}

impl<R: Read + Seek> Debug for PakFile<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PakFile({:#?})", self.data)
    }
}

/// Methods for retrieving information on pak file entries
impl<R: Read + Seek> PakFile<'_, R> {
    /// Get the archive relative path of the file
    ///
    /// # Warnings
    ///
    /// It is dangerous to use this name directly when extracting an archive.
    /// It may contain an absolute path (`/etc/shadow`), or break out of the
    /// current directory (`../runtime`). [`PakArchive::extract_all`] refuses
    /// such paths.
    pub fn name(&self) -> &str {
        &self.data.path
    }

    /// Get the size of the file, in bytes, as stored in the archive
    pub fn stored_size(&self) -> u64 {
        self.data.stored
    }

    /// Get the size of the file, in bytes, once decoded
    pub fn size(&self) -> u64 {
        self.data.original
    }

    /// Get the absolute offset of the stored payload
    pub fn data_start(&self) -> u64 {
        self.data.offset
    }

    /// Get the compression method used for this file
    pub fn compression_method(&self) -> CompressionMethod {
        self.data.compression
    }

    /// Whether the payload is encrypted
    pub fn is_encrypted(&self) -> bool {
        self.data.encrypted
    }

    /// Decoded bytes handed out so far
    pub fn bytes_read(&self) -> u64 {
        self.decoded
    }

    /// Get the table of contents entry
    pub fn entry(&self) -> &TocEntry {
        self.data
    }

    /// Copy the rest of this file into `out` through `buffer`, then check
    /// the total decoded length against the table of contents.
    pub fn copy_checked<W: Write + ?Sized>(&mut self, out: &mut W, buffer: &mut [u8]) -> Result<u64> {
        loop {
            let read = match self.read_decoded(buffer) {
                Ok(0) => break,
                Ok(read) => read,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(IntegrityError::Corrupt {
                        path: self.data.path.clone(),
                        source,
                    }
                    .into())
                }
            };
            if self.decoded > self.data.original {
                return Err(self.length_mismatch().into());
            }
            out.write_all(&buffer[..read])?;
        }

        if self.decoded != self.data.original {
            return Err(self.length_mismatch().into());
        }

        Ok(self.decoded)
    }

    fn read_decoded(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.reader.read(buf)?;
        self.decoded += read as u64;
        Ok(read)
    }

    fn length_mismatch(&self) -> IntegrityError {
        IntegrityError::LengthMismatch {
            path: self.data.path.clone(),
            expected: self.data.original,
            actual: self.decoded,
        }
    }
}

/// Fails with [`io::ErrorKind::InvalidData`] wrapping
/// [`IntegrityError::LengthMismatch`] as soon as the decoded stream runs past
/// the original size, or ends before reaching it.
impl<R: Read + Seek> Read for PakFile<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.read_decoded(buf)?;
        let short = read == 0 && !buf.is_empty() && self.decoded < self.data.original;
        if short || self.decoded > self.data.original {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                self.length_mismatch(),
            ));
        }
        Ok(read)
    }
}

/// The parsed header and table of contents of a pak file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PakIndex {
    /// Layout the archive was read with
    pub version: FormatVersion,
    /// Entries in table of contents order
    pub entries: Vec<TocEntry>,
    /// Offset just past the table of contents
    pub data_start: u64,
}

/// Map a short read into a format error
fn truncated(e: io::Error) -> Error {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        FormatError::Truncated.into()
    } else {
        e.into()
    }
}

impl PakIndex {
    /// Parse the header and table of contents from the start of `reader`.
    #[instrument(skip(reader), err)]
    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<PakIndex> {
        reader.rewind()?;

        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic).map_err(truncated)?;
        if magic != MAGIC {
            return Err(FormatError::BadMagic.into());
        }

        let after_magic = reader.stream_position()?;
        let mut prefix = [0u8; 4];
        reader.read_exact(&mut prefix).map_err(truncated)?;

        let version = FormatVersion::sniff(prefix);
        if version == FormatVersion::V1 {
            reader.seek(SeekFrom::Start(after_magic))?;
        }

        let count = reader.read_u32::<LittleEndian>().map_err(truncated)?;
        debug!(?version, count, "reading table of contents");

        let raw = match version {
            FormatVersion::V1 => read_records::<TocRecordV1, _>(reader, count)?,
            FormatVersion::V2 => read_records::<TocRecordV2, _>(reader, count)?,
            FormatVersion::V3 => read_records::<TocRecordV3, _>(reader, count)?,
        };

        let entries = raw
            .into_iter()
            .enumerate()
            .map(|(index, r)| -> Result<TocEntry> {
                Ok(TocEntry {
                    path: String::from_utf8(r.path)
                        .map_err(|_| FormatError::InvalidPath { index })?,
                    offset: r.offset,
                    stored: r.stored,
                    original: r.original,
                    compression: r.compression,
                    encrypted: r.encrypted,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(PakIndex {
            version,
            entries,
            data_start: reader.stream_position()?,
        })
    }

    /// Whether any entry needs a key to be read
    pub fn has_encrypted_entries(&self) -> bool {
        self.entries.iter().any(|e| e.encrypted)
    }
}

fn read_records<T, R>(reader: &mut R, count: u32) -> Result<Vec<RawEntry>>
where
    T: for<'a> BinRead<Args<'a> = ()> + ReadEndian + Into<RawEntry>,
    R: Read + Seek,
{
    // the count is untrusted until the records are actually there
    let mut out = Vec::with_capacity((count as usize).min(4096));
    for _ in 0..count {
        let record = T::read(reader).map_err(FormatError::Toc)?;
        out.push(record.into());
    }
    Ok(out)
}

/// Read the index of the pak file at `path`
pub fn read_index(path: impl AsRef<Path>) -> Result<PakIndex> {
    let mut reader = BufReader::new(File::open(path)?);
    PakIndex::read(&mut reader)
}

#[derive(Debug)]
pub(crate) struct Shared {
    index: PakIndex,
    names: IndexMap<Box<str>, usize>,
}

/// Pak archive reader
///
/// Keys are passed per call and are never kept by the archive.
///
/// ```no_run
/// use std::io::prelude::*;
///
/// fn list_pak_contents(reader: impl Read + Seek) -> snap_pak::error::Result<()> {
///     let mut pak = snap_pak::PakArchive::new(reader)?;
///
///     for i in 0..pak.len() {
///         let mut file = pak.by_index(i, None)?;
///         println!("Filename: {}", file.name());
///         std::io::copy(&mut file, &mut std::io::stdout())?;
///     }
///
///     Ok(())
/// }
/// ```
pub struct PakArchive<R> {
    reader: R,
    shared: Arc<Shared>,
}

impl<R> PakArchive<R> {
    /// Total size of the files in the archive once decoded, if it fits.
    pub fn decompressed_size(&self) -> Option<u128> {
        let mut total = 0u128;
        for file in &self.shared.index.entries {
            total = total.checked_add(file.original as u128)?;
        }
        Some(total)
    }

    /// The parsed index
    pub fn index(&self) -> &PakIndex {
        &self.shared.index
    }

    /// Entries in table of contents order
    pub fn entries(&self) -> &[TocEntry] {
        &self.shared.index.entries
    }

    /// Layout the archive was read with
    pub fn version(&self) -> FormatVersion {
        self.shared.index.version
    }

    /// Whether any entry needs a key to be read
    pub fn has_encrypted_entries(&self) -> bool {
        self.shared.index.has_encrypted_entries()
    }

    /// Number of entries contained in this pak.
    pub fn len(&self) -> usize {
        self.shared.index.entries.len()
    }

    /// Whether this pak archive contains no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an iterator over all the file names in this archive.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.shared.index.entries.iter().map(|e| e.path.as_str())
    }

    /// Get the index of a file entry by name, if it's present.
    #[inline(always)]
    pub fn index_for_name(&self, name: &str) -> Option<usize> {
        self.shared.names.get(name).copied()
    }

    /// Get the name of a file entry, if it's present.
    #[inline(always)]
    pub fn name_for_index(&self, index: usize) -> Option<&str> {
        self.shared
            .index
            .entries
            .get(index)
            .map(|e| e.path.as_str())
    }

    /// Write one `path<TAB>original size<TAB>compression` line per entry
    pub fn list<W: Write + ?Sized>(&self, sink: &mut W) -> Result<()> {
        for entry in &self.shared.index.entries {
            writeln!(sink, "{}\t{}\t{}", entry.path, entry.original, entry.compression)?;
        }
        Ok(())
    }

    /// Unwrap and return the inner reader object
    ///
    /// The position of the reader is undefined.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read + Seek> PakArchive<R> {
    /// Read a pak archive collecting the files it contains.
    pub fn new(mut reader: R) -> Result<PakArchive<R>> {
        let index = PakIndex::read(&mut reader)?;

        let mut names = IndexMap::with_capacity(index.entries.len());
        for (i, entry) in index.entries.iter().enumerate() {
            if names.insert(entry.path.as_str().into(), i).is_some() {
                warn!(path = %entry.path, "duplicate entry, the later one wins lookups by name");
            }
        }

        Ok(PakArchive {
            reader,
            shared: Arc::new(Shared { index, names }),
        })
    }

    /// Search for a file entry by name
    pub fn by_name(&mut self, name: &str, key: Option<&ArchiveKey>) -> Result<PakFile<'_, R>> {
        let Some(index) = self.index_for_name(name) else {
            return Err(Error::FileNotFound(FileNotFoundError::Name(
                name.to_owned(),
            )));
        };
        self.by_index(index, key)
    }

    /// Get a contained file by index
    ///
    /// The payload range is checked against the length of the archive first.
    /// Encrypted entries are read and authenticated in full before the first
    /// byte is returned, so tampering fails here rather than mid-stream.
    pub fn by_index(&mut self, file_number: usize, key: Option<&ArchiveKey>) -> Result<PakFile<'_, R>> {
        if file_number >= self.len() {
            return Err(Error::FileNotFound(FileNotFoundError::Index(file_number)));
        }
        let len = self.reader.seek(SeekFrom::End(0))?;
        self.check_bounds(file_number, len)?;

        let data = &self.shared.index.entries[file_number];

        let mut stored = SubStream::new(&mut self.reader, data.offset, data.stored);

        let payload = if data.encrypted {
            let key = key.ok_or_else(|| ConfigurationError::MissingEntryKey {
                path: data.path.clone(),
            })?;

            let mut sealed = Vec::with_capacity(usize::try_from(data.stored).unwrap_or(0));
            stored.read_to_end(&mut sealed)?;
            let plain = crypto::open(key, &data.path, data.original, data.compression, &sealed)?;
            PayloadReader::Decrypted(Cursor::new(plain))
        } else {
            PayloadReader::Stored(stored)
        };

        Ok(PakFile {
            data,
            reader: PakBlockReader::new(payload, data.compression),
            decoded: 0,
        })
    }

    /// Decode every entry and check it against the table of contents.
    ///
    /// Stops at the first entry that is out of bounds, fails authentication or
    /// decodes to the wrong length. Returns the number of entries checked.
    #[instrument(skip_all, err)]
    pub fn verify(&mut self, key: Option<&ArchiveKey>) -> Result<usize> {
        let mut buffer = vec![0u8; COPY_BUFFER_SIZE];

        for i in 0..self.len() {
            let mut file = self.by_index(i, key)?;
            let size = file.copy_checked(&mut io::sink(), &mut buffer)?;
            debug!(path = %file.name(), size, "verified");
        }

        info!(entries = self.len(), "archive verified");
        Ok(self.len())
    }

    /// Extract every entry below `directory`, recreating the relative paths.
    ///
    /// Returns the number of entries written.
    #[instrument(skip_all, fields(directory = %directory.as_ref().display()), err)]
    pub fn extract_all(&mut self, directory: impl AsRef<Path>, key: Option<&ArchiveKey>) -> Result<usize> {
        let directory = directory.as_ref();
        let mut buffer = vec![0u8; COPY_BUFFER_SIZE];

        for i in 0..self.len() {
            let target = directory.join(enclosed_path(&self.shared.index.entries[i].path)?);

            let mut file = self.by_index(i, key)?;
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let mut out = io::BufWriter::new(File::create(&target)?);
            file.copy_checked(&mut out, &mut buffer)?;
            out.flush()?;
            debug!(path = %file.name(), target = %target.display(), "extracted");
        }

        info!(entries = self.len(), "archive extracted");
        Ok(self.len())
    }

    fn check_bounds(&self, index: usize, len: u64) -> Result<()> {
        let entry = &self.shared.index.entries[index];
        if entry.offset.checked_add(entry.stored).map_or(true, |end| end > len) {
            return Err(IntegrityError::OutOfBounds {
                path: entry.path.clone(),
                offset: entry.offset,
                stored: entry.stored,
                len,
            }
            .into());
        }
        Ok(())
    }
}

/// Translate a forward slash archive path into a relative host path,
/// refusing anything that could land outside the extraction directory.
pub fn enclosed_path(name: &str) -> Result<PathBuf> {
    let unsafe_path = || FormatError::UnsafePath(name.to_owned());

    let mut out = PathBuf::new();
    for part in name.split('/') {
        if part.is_empty() || part == "." || part == ".." || part.contains('\\') {
            return Err(unsafe_path().into());
        }
        let mut components = Path::new(part).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(c)), None) => out.push(c),
            _ => return Err(unsafe_path().into()),
        }
    }

    if out.as_os_str().is_empty() {
        return Err(unsafe_path().into());
    }
    Ok(out)
}

#[cfg(test)]
mod test {
    use std::io::prelude::*;

    use pretty_assertions::assert_eq;

    use crate::compression::CompressionMethod;
    use crate::error::{Error, FormatError, IntegrityError, Result};
    use crate::read::{enclosed_path, PakArchive, PakIndex};
    use crate::types::FormatVersion;
    use std::io::Cursor;

    #[test]
    fn read_invalid_magic() {
        #[rustfmt::skip]
        let input = [
            0x53, 0x4E, 0x41, 0x50, 0x50, 0x41, 0x4B, 0x01,
            0x03, 0x00,
            0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
        ];

        let archive = PakArchive::new(Cursor::new(input));
        assert!(matches!(archive, Err(Error::Format(FormatError::BadMagic))));
    }

    #[test]
    fn read_truncated_header() {
        let input = [0x53, 0x4E, 0x41, 0x50, 0x50, 0x41, 0x4B, 0x00, 0x03];

        let archive = PakArchive::new(Cursor::new(input));
        assert!(matches!(archive, Err(Error::Format(FormatError::Truncated))));
    }

    #[test]
    fn read_truncated_toc() {
        #[rustfmt::skip]
        let input = [
            0x53, 0x4E, 0x41, 0x50, 0x50, 0x41, 0x4B, 0x00,
            0x03, 0x00,
            0x00, 0x00,
            0x02, 0x00, 0x00, 0x00,
            0x05, 0x00, 0x61, 0x2E,
        ];

        let archive = PakArchive::new(Cursor::new(input));
        assert!(matches!(archive, Err(Error::Format(FormatError::Toc(_)))));
    }

    #[test]
    fn read_empty_v3() -> Result<()> {
        #[rustfmt::skip]
        let input = [
            0x53, 0x4E, 0x41, 0x50, 0x50, 0x41, 0x4B, 0x00,
            0x03, 0x00,
            0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
        ];

        let archive = PakArchive::new(Cursor::new(input))?;
        assert!(archive.is_empty());
        assert_eq!(archive.version(), FormatVersion::V3);
        assert_eq!(archive.index().data_start, 16);
        Ok(())
    }

    #[test]
    fn read_v1_with_entries() -> Result<()> {
        #[rustfmt::skip]
        let input = [
            // Magic
            0x53, 0x4E, 0x41, 0x50, 0x50, 0x41, 0x4B, 0x00,
            // Count, directly after the magic
            0x01, 0x00, 0x00, 0x00,
            // Records (27)
            0x09, 0x00, 0x68, 0x65, 0x6C, 0x6C, 0x6F, 0x2E, 0x74, 0x78, 0x74,
            0x27, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x0B, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            // Data (11)
            0x48, 0x65, 0x6C, 0x6C, 0x6F, 0x20, 0x57, 0x6F, 0x72, 0x6C, 0x64,
        ];

        let mut archive = PakArchive::new(Cursor::new(input))?;
        assert_eq!(archive.version(), FormatVersion::V1);
        assert_eq!(archive.len(), 1);
        assert_eq!(archive.index().data_start, 39);

        let entry = &archive.entries()[0];
        assert_eq!(entry.original, entry.stored);
        assert_eq!(entry.compression, CompressionMethod::None);
        assert!(!entry.encrypted);

        let mut buffer = Vec::new();
        let mut file = archive.by_name("hello.txt", None)?;
        assert_eq!(file.data_start(), 39);
        file.read_to_end(&mut buffer)?;
        assert_eq!(buffer, b"Hello World");

        assert_eq!(archive.verify(None)?, 1);
        Ok(())
    }

    #[test]
    fn read_v1_with_zero_entries() -> Result<()> {
        let input = [
            0x53, 0x4E, 0x41, 0x50, 0x50, 0x41, 0x4B, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];

        let index = PakIndex::read(&mut Cursor::new(input))?;
        assert_eq!(index.version, FormatVersion::V1);
        assert!(index.entries.is_empty());
        assert_eq!(index.data_start, index.version.header_size());
        Ok(())
    }

    #[test]
    fn read_v2_with_entries() -> Result<()> {
        #[rustfmt::skip]
        let input = [
            // Header
            0x53, 0x4E, 0x41, 0x50, 0x50, 0x41, 0x4B, 0x00,
            0x02, 0x00,
            0x00, 0x00,
            0x02, 0x00, 0x00, 0x00,
            // Records (36 each)
            0x09, 0x00, 0x68, 0x65, 0x6C, 0x6C, 0x6F, 0x2E, 0x74, 0x78, 0x74,
            0x58, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x0B, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x0B, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00,

            0x09, 0x00, 0x77, 0x6F, 0x72, 0x6C, 0x64, 0x2E, 0x74, 0x78, 0x74,
            0x63, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00,
            // Data
            0x48, 0x65, 0x6C, 0x6C, 0x6F, 0x20, 0x57, 0x6F, 0x72, 0x6C, 0x64,
            0x57, 0x6F, 0x72, 0x6C, 0x64,
        ];

        let mut archive = PakArchive::new(Cursor::new(input))?;
        assert_eq!(archive.version(), FormatVersion::V2);
        assert_eq!(
            archive.file_names().collect::<Vec<_>>(),
            vec!["hello.txt", "world.txt"]
        );
        assert!(!archive.has_encrypted_entries());

        let mut buffer = Vec::new();
        archive.by_index(1, None)?.read_to_end(&mut buffer)?;
        assert_eq!(buffer, b"World");

        assert_eq!(archive.verify(None)?, 2);
        Ok(())
    }

    #[test]
    fn verify_reports_length_mismatch() {
        #[rustfmt::skip]
        let input = [
            0x53, 0x4E, 0x41, 0x50, 0x50, 0x41, 0x4B, 0x00,
            0x02, 0x00,
            0x00, 0x00,
            0x01, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x61,
            0x2C, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00,
            0x41, 0x41,
        ];

        let mut archive = PakArchive::new(Cursor::new(input)).expect("index parses");
        let result = archive.verify(None);
        assert!(matches!(
            result,
            Err(Error::Integrity(IntegrityError::LengthMismatch { expected: 3, actual: 2, .. }))
        ));
    }

    #[test]
    fn verify_reports_out_of_bounds() {
        #[rustfmt::skip]
        let input = [
            0x53, 0x4E, 0x41, 0x50, 0x50, 0x41, 0x4B, 0x00,
            0x01, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x61,
            0x1F, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x41, 0x41,
        ];

        let mut archive = PakArchive::new(Cursor::new(input)).expect("index parses");
        let result = archive.verify(None);
        assert!(matches!(
            result,
            Err(Error::Integrity(IntegrityError::OutOfBounds { .. }))
        ));
    }

    #[test]
    fn list_writes_one_line_per_entry() -> Result<()> {
        #[rustfmt::skip]
        let input = [
            0x53, 0x4E, 0x41, 0x50, 0x50, 0x41, 0x4B, 0x00,
            0x02, 0x00,
            0x00, 0x00,
            0x01, 0x00, 0x00, 0x00,
            0x03, 0x00, 0x61, 0x2F, 0x62,
            0x2E, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x40, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x01,
        ];

        let archive = PakArchive::new(Cursor::new(input))?;
        let mut out = Vec::new();
        archive.list(&mut out)?;
        assert_eq!(String::from_utf8_lossy(&out), "a/b\t64\tbrotli\n");
        Ok(())
    }

    #[test]
    fn missing_entries_are_reported() -> Result<()> {
        let input = [
            0x53, 0x4E, 0x41, 0x50, 0x50, 0x41, 0x4B, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];

        let mut archive = PakArchive::new(Cursor::new(input))?;
        assert!(matches!(
            archive.by_name("nope", None),
            Err(Error::FileNotFound(_))
        ));
        assert!(matches!(archive.by_index(0, None), Err(Error::FileNotFound(_))));
        Ok(())
    }

    #[test]
    fn enclosed_paths() {
        assert!(enclosed_path("a/b/c.txt").is_ok());
        assert_eq!(
            enclosed_path("a/b/c.txt").ok(),
            Some(["a", "b", "c.txt"].iter().collect())
        );

        for bad in ["", "/etc/passwd", "../up", "a/../../b", "a//b", "a/./b", "a\\..\\b"] {
            assert!(
                matches!(enclosed_path(bad), Err(Error::Format(FormatError::UnsafePath(_)))),
                "{bad} should be refused"
            );
        }
    }
}
