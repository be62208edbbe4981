//! Types for writing pak archives
//!

use binrw::BinWrite;
use bon::Builder;
use indexmap::IndexSet;
use std::fmt::Debug;
use std::io::{self, Write};
use tracing::{debug, instrument, Level};

use crate::compression::{self, worth_keeping, CompressionMethod};
use crate::crypto;
use crate::error::{ConfigurationError, FormatError, Result};
use crate::key::ArchiveKey;
use crate::types::{PakHeader, TocEntry, HEADER_SIZE};

/// Savings ratio used when none is configured
pub const DEFAULT_MIN_SAVINGS_RATIO: f64 = 0.03;

/// Options for how each entry should be stored
#[derive(Debug, Clone, Builder)]
pub struct PakWriterOptions {
    /// Try Brotli first when compressing
    #[builder(default = true)]
    pub use_brotli: bool,

    /// Try Deflate, after Brotli when both are enabled
    #[builder(default)]
    pub use_deflate: bool,

    /// Fraction of the original size a codec has to save to be kept
    #[builder(default = DEFAULT_MIN_SAVINGS_RATIO)]
    pub min_savings_ratio: f64,

    /// Seal every entry with this key
    pub key: Option<ArchiveKey>,
}

impl Default for PakWriterOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl PakWriterOptions {
    /// Codecs to try, preferred first
    pub fn codecs(&self) -> impl Iterator<Item = CompressionMethod> {
        [
            (self.use_brotli, CompressionMethod::Brotli),
            (self.use_deflate, CompressionMethod::Deflate),
        ]
        .into_iter()
        .filter_map(|(enabled, method)| enabled.then_some(method))
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_savings_ratio) {
            return Err(ConfigurationError::InvalidSavingsRatio(self.min_savings_ratio).into());
        }
        Ok(())
    }
}

/// Normalize a relative path to the form stored in the table of contents
///
/// Backslashes become forward slashes and leading slashes are removed.
pub fn normalize_path(name: &str) -> String {
    name.replace('\\', "/").trim_start_matches('/').to_owned()
}

/// Pak archive generator
///
/// Every payload is held in memory until [`PakWriter::finish`], because the
/// table of contents precedes the data and needs each stored size.
///
/// ```
/// # fn doit() -> snap_pak::error::Result<()>
/// # {
/// use std::io::Write;
/// use snap_pak::write::{PakWriter, PakWriterOptions};
///
/// let mut pak = PakWriter::new(Vec::new(), PakWriterOptions::default())?;
///
/// pak.start_file("hello_world.txt")?;
/// pak.write_all(b"Hello, World!")?;
///
/// let bytes = pak.finish()?;
/// assert!(bytes.starts_with(b"SNAPPAK\0"));
/// # Ok(())
/// # }
/// # doit().unwrap();
/// ```
pub struct PakWriter<W: Write> {
    inner: W,
    options: PakWriterOptions,
    names: IndexSet<String>,
    entries: Vec<TocEntry>,
    data_block: Vec<u8>,
    current: Option<(String, Vec<u8>)>,
}

impl<W: Write> Debug for PakWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PakWriter")
            .field("options", &self.options)
            .field("entries", &self.entries.len())
            .field("data", &self.data_block.len())
            .finish()
    }
}

impl<W: Write> PakWriter<W> {
    /// Initializes the archive.
    ///
    /// Before writing to this object, the [`PakWriter::start_file`] function should be called.
    pub fn new(inner: W, options: PakWriterOptions) -> Result<PakWriter<W>> {
        options.validate()?;
        Ok(PakWriter {
            inner,
            options,
            names: IndexSet::new(),
            entries: Vec::new(),
            data_block: Vec::new(),
            current: None,
        })
    }

    /// Returns true if a file is currently open for writing.
    pub const fn is_writing_file(&self) -> bool {
        self.current.is_some()
    }

    /// Number of entries started so far
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no entries have been started
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Start a new entry at the archive relative path `name`.
    #[instrument(skip(self, name), fields(name = %name.as_ref()), err)]
    pub fn start_file(&mut self, name: impl AsRef<str>) -> Result<()> {
        if self.current.is_some() {
            self.finish_file()?;
        }

        let path = normalize_path(name.as_ref());
        if path.is_empty() {
            return Err(FormatError::UnsafePath(name.as_ref().to_owned()).into());
        }
        if path.len() > u16::MAX as usize {
            return Err(FormatError::PathTooLong { path }.into());
        }
        if !self.names.insert(path.clone()) {
            return Err(FormatError::DuplicatePath(path).into());
        }

        self.current = Some((path, Vec::new()));
        Ok(())
    }

    /// Pick the stored form of the open entry and append it to the data block.
    #[instrument(skip(self), err)]
    fn finish_file(&mut self) -> Result<()> {
        let Some((path, raw)) = self.current.take() else {
            return Ok(());
        };

        let original = raw.len() as u64;
        let (compression, payload) = self.choose_compression(&path, raw)?;

        let (encrypted, payload) = match &self.options.key {
            Some(key) => (
                true,
                crypto::seal(key, &path, original, compression, &payload)?,
            ),
            None => (false, payload),
        };

        debug!(
            %path,
            original,
            stored = payload.len(),
            %compression,
            encrypted,
            "stored entry"
        );

        self.entries.push(TocEntry {
            path,
            offset: self.data_block.len() as u64,
            stored: payload.len() as u64,
            original,
            compression,
            encrypted,
        });
        self.data_block.extend_from_slice(&payload);

        Ok(())
    }

    fn choose_compression(&self, path: &str, raw: Vec<u8>) -> Result<(CompressionMethod, Vec<u8>)> {
        let original = raw.len() as u64;

        for method in self.options.codecs() {
            let compressed = compression::compress(method, &raw)?;
            if worth_keeping(
                original,
                compressed.len() as u64,
                self.options.min_savings_ratio,
            ) {
                return Ok((method, compressed));
            }
            debug!(
                %path,
                %method,
                original,
                compressed = compressed.len(),
                "compression not worth keeping"
            );
        }

        Ok((CompressionMethod::None, raw))
    }

    /// Finish the last file and write the header, table of contents and data.
    ///
    /// This will return the writer, but one should normally not append any data to the end of the file.
    #[instrument(skip(self), err)]
    pub fn finish(self) -> Result<W> {
        self.finish_with_index().map(|(inner, _)| inner)
    }

    /// Like [`PakWriter::finish`], also returning the entries as written.
    #[instrument(skip(self), err)]
    pub fn finish_with_index(mut self) -> Result<(W, Vec<TocEntry>)> {
        self.finish_file()?;

        let toc_size: u64 = self.entries.iter().map(TocEntry::serialized_size).sum();
        let mut cursor = HEADER_SIZE + toc_size;
        for entry in &mut self.entries {
            entry.offset = cursor;
            cursor += entry.stored;
        }

        let header = PakHeader {
            entries: u32::try_from(self.entries.len()).map_err(|_| {
                io::Error::new(io::ErrorKind::InvalidInput, "too many entries for one archive")
            })?,
            ..Default::default()
        };

        let mut head = io::Cursor::new(Vec::with_capacity((HEADER_SIZE + toc_size) as usize));
        header.write(&mut head)?;
        for entry in &self.entries {
            entry.to_record().write(&mut head)?;
        }

        self.inner.write_all(head.get_ref())?;
        self.inner.write_all(&self.data_block)?;
        self.inner.flush()?;

        debug!(
            entries = self.entries.len(),
            size = cursor,
            "finished archive"
        );

        Ok((self.inner, self.entries))
    }
}

impl<W: Write> Write for PakWriter<W> {
    #[instrument(skip_all, err, ret(level = Level::TRACE), fields(size=buf.len()) )]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.current.as_mut() {
            Some((_, data)) => data.write(buf),
            None => Err(io::Error::new(
                io::ErrorKind::Other,
                "No file has been started",
            )),
        }
    }

    #[instrument(skip(self), err)]
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
