//! Error types that can be emitted from this library

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent wrapper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent wrapper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// file is not a valid pak archive
    #[error(transparent)]
    #[diagnostic(transparent)]
    Format(#[from] FormatError),

    /// entry data failed an integrity check
    #[error(transparent)]
    #[diagnostic(transparent)]
    Integrity(#[from] IntegrityError),

    /// the requested operation was misconfigured
    #[error(transparent)]
    #[diagnostic(transparent)]
    Configuration(#[from] ConfigurationError),

    /// unable to find requested file
    #[error("unable to find requested file")]
    FileNotFound(#[from] FileNotFoundError),
}

/// The archive bytes do not describe a parseable archive
#[derive(Error, Diagnostic, Debug)]
pub enum FormatError {
    /// the magic tag does not match
    #[error("file is not a pak archive (bad magic)")]
    #[diagnostic(code(snap_pak::format::magic))]
    BadMagic,

    /// the header ended early
    #[error("pak header is truncated")]
    #[diagnostic(code(snap_pak::format::truncated))]
    Truncated,

    /// the table of contents could not be decoded
    #[error("unable to decode the table of contents")]
    #[diagnostic(code(snap_pak::format::toc))]
    Toc(#[source] binrw::Error),

    /// a path stored in the table of contents is not UTF-8
    #[error("entry {index} has a path that is not valid UTF-8")]
    InvalidPath { index: usize },

    /// a path is too long to be stored
    #[error("path is longer than {max} bytes: {path}", max = u16::MAX)]
    PathTooLong { path: String },

    /// a file to pack has a name that is not valid UTF-8
    #[error("file name is not valid UTF-8: {}", .0.display())]
    #[diagnostic(help("archive paths are stored as UTF-8, rename the file"))]
    NonUtf8Path(PathBuf),

    /// an archive path was added twice
    #[error("duplicate entry path: {0}")]
    DuplicatePath(String),

    /// an archive path would escape the extraction directory
    #[error("refusing to extract unsafe path: {0}")]
    #[diagnostic(help("archive paths must be relative and must not contain `..`"))]
    UnsafePath(String),
}

/// An entry's payload did not decode to what the table of contents promises
#[derive(Error, Diagnostic, Debug)]
pub enum IntegrityError {
    /// decoded size does not match the recorded original size
    #[error("{path}: expected {expected} bytes, decoded {actual}")]
    #[diagnostic(code(snap_pak::integrity::length))]
    LengthMismatch {
        path: String,
        expected: u64,
        actual: u64,
    },

    /// authenticated decryption rejected the payload or its metadata
    #[error("{path}: authentication failed, the entry is corrupt, tampered or the key is wrong")]
    #[diagnostic(code(snap_pak::integrity::authentication))]
    Authentication { path: String },

    /// payload range lies outside the archive file
    #[error("{path}: payload [{offset}, {offset}+{stored}) lies outside the archive ({len} bytes)")]
    #[diagnostic(code(snap_pak::integrity::bounds))]
    OutOfBounds {
        path: String,
        offset: u64,
        stored: u64,
        len: u64,
    },

    /// the payload stream could not be decoded
    #[error("{path}: payload could not be decoded")]
    #[diagnostic(code(snap_pak::integrity::corrupt))]
    Corrupt {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// The caller supplied options that cannot be satisfied
#[derive(Error, Diagnostic, Debug)]
pub enum ConfigurationError {
    /// encryption requested without a key
    #[error("encryption was requested but no key was supplied")]
    #[diagnostic(help("pass a 32 byte key as 64 hex characters"))]
    MissingKey,

    /// an encrypted entry was opened without a key
    #[error("{path} is encrypted but no key was supplied")]
    MissingEntryKey { path: String },

    /// key material has the wrong size
    #[error("archive keys must be 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    /// key material is not hex encoded
    #[error("archive key is not valid hex")]
    InvalidKeyEncoding(#[from] hex::FromHexError),

    /// output already exists and overwriting was not allowed
    #[error("output already exists: {}", .0.display())]
    #[diagnostic(help("pass --overwrite to replace it"))]
    OutputExists(PathBuf),

    /// input is not a directory
    #[error("input is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// savings ratio outside of [0, 1]
    #[error("minimum savings ratio must be within [0, 1], got {0}")]
    InvalidSavingsRatio(f64),
}

/// Error type to provide further information when a file has not been found
#[derive(Error, Diagnostic, Debug)]
#[error("unable to find requested file")]
pub enum FileNotFoundError {
    /// at index {0}
    #[error("at index {0}")]
    Index(usize),

    /// by name {0}
    #[error("by name {0}")]
    Name(String),
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
