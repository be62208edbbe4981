//! Payload compression and decompression handling.

use std::fmt;
use std::io::{self, Read, Write};

use binrw::{BinRead, BinWrite};
use flate2::{read::DeflateDecoder, write::DeflateEncoder, Compression};
use tracing::instrument;

/// Brotli quality used when packing.
const BROTLI_QUALITY: u32 = 9;

/// Brotli window size (log2) used when packing.
const BROTLI_WINDOW: u32 = 22;

/// Internal buffer size handed to the brotli encoder and decoder.
const BROTLI_BUFFER: usize = 4096;

/// Identifies the codec used to compress an entry's payload
///
/// The discriminant is the byte stored in the table of contents and is also
/// folded into the associated data of encrypted entries.
#[derive(BinRead, BinWrite, Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
#[brw(repr = u8)]
#[repr(u8)]
pub enum CompressionMethod {
    /// Stores the data as it is
    #[default]
    None = 0,

    /// Compress the data using Brotli
    Brotli = 1,

    /// Compress the data using raw Deflate
    Deflate = 2,
}

impl CompressionMethod {
    /// Byte written to the table of contents for this method.
    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CompressionMethod::None => "none",
            CompressionMethod::Brotli => "brotli",
            CompressionMethod::Deflate => "deflate",
        })
    }
}

/// Returns true when a compressed payload saves enough to be worth storing.
///
/// The result must be strictly smaller than the original, and the bytes saved
/// must be at least `min_savings_ratio` of the original size.
pub fn worth_keeping(original: u64, compressed: u64, min_savings_ratio: f64) -> bool {
    // compare as a quotient so decimal ratios hold exactly at the boundary
    compressed < original
        && (original - compressed) as f64 / original as f64 >= min_savings_ratio
}

/// Compress `data` in full with the requested method.
#[instrument(skip(data), fields(size = data.len()), err)]
pub fn compress(method: CompressionMethod, data: &[u8]) -> io::Result<Vec<u8>> {
    let mut writer = PakBlockWriter::new(Vec::with_capacity(data.len() / 2), method);
    writer.write_all(data)?;
    writer.finalize()
}

/// Decoding reader over a stored payload.
pub(crate) enum PakBlockReader<R: Read> {
    Raw(R),
    Brotli(Box<brotli::Decompressor<R>>),
    Deflate(Box<DeflateDecoder<R>>),
}

impl<R: Read> PakBlockReader<R> {
    pub fn new(reader: R, compression: CompressionMethod) -> Self {
        match compression {
            CompressionMethod::None => PakBlockReader::Raw(reader),
            CompressionMethod::Brotli => {
                PakBlockReader::Brotli(Box::new(brotli::Decompressor::new(reader, BROTLI_BUFFER)))
            }
            CompressionMethod::Deflate => {
                PakBlockReader::Deflate(Box::new(DeflateDecoder::new(reader)))
            }
        }
    }
}

impl<R: Read> Read for PakBlockReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            PakBlockReader::Raw(r) => r.read(buf),
            PakBlockReader::Brotli(r) => r.read(buf),
            PakBlockReader::Deflate(r) => r.read(buf),
        }
    }
}

/// Encoding writer producing a stored payload.
pub(crate) enum PakBlockWriter<W: Write> {
    Raw(W),
    Brotli(Box<brotli::CompressorWriter<W>>),
    Deflate(Box<DeflateEncoder<W>>),
}

impl<W: Write> PakBlockWriter<W> {
    pub fn new(writer: W, compression: CompressionMethod) -> Self {
        match compression {
            CompressionMethod::None => PakBlockWriter::Raw(writer),
            CompressionMethod::Brotli => PakBlockWriter::Brotli(Box::new(
                brotli::CompressorWriter::new(writer, BROTLI_BUFFER, BROTLI_QUALITY, BROTLI_WINDOW),
            )),
            CompressionMethod::Deflate => PakBlockWriter::Deflate(Box::new(DeflateEncoder::new(
                writer,
                Compression::best(),
            ))),
        }
    }

    /// Flush any pending compressed data and return the inner writer.
    pub fn finalize(self) -> io::Result<W> {
        match self {
            PakBlockWriter::Raw(w) => Ok(w),
            PakBlockWriter::Brotli(w) => Ok(w.into_inner()),
            PakBlockWriter::Deflate(w) => w.finish(),
        }
    }
}

impl<W: Write> Write for PakBlockWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            PakBlockWriter::Raw(w) => w.write(buf),
            PakBlockWriter::Brotli(w) => w.write(buf),
            PakBlockWriter::Deflate(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            PakBlockWriter::Raw(w) => w.flush(),
            PakBlockWriter::Brotli(w) => w.flush(),
            PakBlockWriter::Deflate(w) => w.flush(),
        }
    }
}

#[cfg(test)]
mod test {
    use std::io::Read;

    use pretty_assertions::assert_eq;

    use super::{compress, worth_keeping, CompressionMethod, PakBlockReader, PakBlockWriter};
    use std::io::Write;

    #[test]
    fn keep_rule_accepts_exact_ratio() {
        assert!(worth_keeping(100, 75, 0.25));
        assert!(worth_keeping(100, 50, 0.5));
    }

    #[test]
    fn keep_rule_accepts_exact_decimal_ratio() {
        assert!(worth_keeping(100, 93, 0.07));
        assert!(worth_keeping(1000, 970, 0.03));
        assert!(worth_keeping(10, 9, 0.1));
        assert!(worth_keeping(100, 71, 0.29));
        assert!(!worth_keeping(100, 94, 0.07));
        assert!(!worth_keeping(1000, 971, 0.03));
    }

    #[test]
    fn keep_rule_rejects_short_savings() {
        assert!(!worth_keeping(100, 76, 0.25));
        assert!(!worth_keeping(100, 51, 0.5));
    }

    #[test]
    fn keep_rule_requires_strictly_smaller() {
        assert!(!worth_keeping(100, 100, 0.0));
        assert!(!worth_keeping(0, 0, 0.0));
        assert!(!worth_keeping(10, 12, 0.0));
        assert!(worth_keeping(100, 99, 0.0));
    }

    #[test]
    fn decode_what_was_encoded() -> std::io::Result<()> {
        let input = b"Hello World, Hello World, Hello World, Hello World".repeat(20);

        for method in [
            CompressionMethod::None,
            CompressionMethod::Brotli,
            CompressionMethod::Deflate,
        ] {
            let stored = compress(method, &input)?;
            if method != CompressionMethod::None {
                assert!(stored.len() < input.len(), "{method} did not shrink input");
            }

            let mut output = Vec::new();
            PakBlockReader::new(&stored[..], method).read_to_end(&mut output)?;
            assert_eq!(output, input);
        }

        Ok(())
    }

    #[test]
    fn raw_writer_passes_bytes_through() -> std::io::Result<()> {
        let mut writer = PakBlockWriter::new(Vec::new(), CompressionMethod::None);
        writer.write_all(&[7u8; 300])?;
        assert_eq!(writer.finalize()?, vec![7u8; 300]);
        Ok(())
    }

    #[test]
    fn method_bytes_are_stable() {
        assert_eq!(CompressionMethod::None.as_byte(), 0);
        assert_eq!(CompressionMethod::Brotli.as_byte(), 1);
        assert_eq!(CompressionMethod::Deflate.as_byte(), 2);
        assert_eq!(CompressionMethod::Brotli.to_string(), "brotli");
    }
}
