//! Packing a directory tree into a pak file.

use std::fs::File;
use std::io::{self, BufWriter, Read};
use std::path::{Path, PathBuf};

use bon::Builder;
use tracing::{debug, info, instrument};
use walkdir::WalkDir;

use crate::error::{ConfigurationError, Error, FormatError, Result};
use crate::key::ArchiveKey;
use crate::types::TocEntry;
use crate::write::{normalize_path, PakWriter, PakWriterOptions, DEFAULT_MIN_SAVINGS_RATIO};

/// Everything needed to pack one directory into one archive
///
/// ```no_run
/// # fn doit() -> snap_pak::error::Result<()> {
/// use snap_pak::PackOptions;
///
/// let options = PackOptions::builder()
///     .input("assets")
///     .output("assets.pak")
///     .use_deflate(true)
///     .build();
/// snap_pak::pack::build(&options)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Builder)]
pub struct PackOptions {
    /// Directory to pack
    #[builder(into)]
    pub input: PathBuf,

    /// Archive to create
    #[builder(into)]
    pub output: PathBuf,

    /// Replace `output` when it already exists
    #[builder(default)]
    pub overwrite: bool,

    /// Try Brotli first when compressing
    #[builder(default = true)]
    pub use_brotli: bool,

    /// Try Deflate, after Brotli when both are enabled
    #[builder(default)]
    pub use_deflate: bool,

    /// Fraction of the original size a codec has to save to be kept
    #[builder(default = DEFAULT_MIN_SAVINGS_RATIO)]
    pub min_savings_ratio: f64,

    /// Seal every entry with `key`
    #[builder(default)]
    pub encrypt: bool,

    /// Key used when `encrypt` is set
    pub key: Option<ArchiveKey>,
}

impl PackOptions {
    /// Writer options implied by these pack options, validated
    pub fn writer_options(&self) -> Result<PakWriterOptions> {
        let key = if self.encrypt {
            Some(self.key.clone().ok_or(ConfigurationError::MissingKey)?)
        } else {
            None
        };

        let options = PakWriterOptions {
            use_brotli: self.use_brotli,
            use_deflate: self.use_deflate,
            min_savings_ratio: self.min_savings_ratio,
            key,
        };
        options.validate()?;
        Ok(options)
    }
}

/// Files under `input` to pack, as `(archive path, host path)` sorted by
/// archive path bytes.
///
/// Files sharing the output's extension and the output itself are skipped so
/// an archive can be rebuilt in place.
#[instrument(skip_all, fields(input = %input.display()), err)]
pub fn collect_files(input: &Path, output: &Path) -> Result<Vec<(String, PathBuf)>> {
    let output_ext = output.extension();
    let output_canon = output.canonicalize().ok();

    let mut files = Vec::new();
    for entry in WalkDir::new(input).follow_links(false) {
        let entry = entry.map_err(|e| {
            let msg = e.to_string();
            e.into_io_error()
                .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, msg))
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if output_ext.is_some() && path.extension() == output_ext {
            debug!(path = %path.display(), "skipping archive");
            continue;
        }
        if output_canon.is_some() && path.canonicalize().ok() == output_canon {
            continue;
        }

        let rel = path
            .strip_prefix(input)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let name = rel
            .components()
            .map(|c| {
                c.as_os_str()
                    .to_str()
                    .ok_or_else(|| FormatError::NonUtf8Path(path.to_path_buf()))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?
            .join("/");

        files.push((normalize_path(&name), path.to_path_buf()));
    }

    files.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
    Ok(files)
}

/// Pack `options.input` into `options.output`.
///
/// Configuration is checked before anything is written. A failure part way
/// through can leave a truncated output file behind.
#[instrument(skip_all, fields(input = %options.input.display(), output = %options.output.display()), err)]
pub fn build(options: &PackOptions) -> Result<Vec<TocEntry>> {
    let writer_options = options.writer_options()?;

    if !options.input.is_dir() {
        return Err(ConfigurationError::NotADirectory(options.input.clone()).into());
    }
    if !options.overwrite && options.output.exists() {
        return Err(ConfigurationError::OutputExists(options.output.clone()).into());
    }

    let files = collect_files(&options.input, &options.output)?;

    let out = if !options.overwrite {
        File::create_new(&options.output).map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => {
                Error::from(ConfigurationError::OutputExists(options.output.clone()))
            }
            _ => e.into(),
        })?
    } else {
        File::create(&options.output)?
    };

    let mut pak = PakWriter::new(BufWriter::new(out), writer_options)?;
    let mut buffer = Vec::new();
    for (name, path) in &files {
        debug!(%name, "packing");
        pak.start_file(name)?;
        File::open(path)?.read_to_end(&mut buffer)?;
        io::Write::write_all(&mut pak, &buffer)?;
        buffer.clear();
    }

    let (_, entries) = pak.finish_with_index()?;

    let original: u64 = entries.iter().map(|e| e.original).sum();
    let stored: u64 = entries.iter().map(|e| e.stored).sum();
    info!(entries = entries.len(), original, stored, "archive built");

    Ok(entries)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    use super::{build, collect_files, PackOptions};
    use crate::error::{ConfigurationError, Error, FormatError, Result};

    #[traced_test]
    #[test]
    fn collect_is_sorted_and_skips_archives() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::create_dir_all(dir.path().join("sub"))?;
        std::fs::write(dir.path().join("b.txt"), b"b")?;
        std::fs::write(dir.path().join("a.txt"), b"a")?;
        std::fs::write(dir.path().join("sub").join("c.txt"), b"c")?;
        std::fs::write(dir.path().join("old.pak"), b"SNAPPAK")?;

        let files = collect_files(dir.path(), &dir.path().join("out.pak"))?;
        let names = files.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["a.txt", "b.txt", "sub/c.txt"]);

        Ok(())
    }

    #[test]
    fn encryption_without_key_is_rejected() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let output = dir.path().join("out.pak");
        let options = PackOptions::builder()
            .input(dir.path())
            .output(&output)
            .encrypt(true)
            .build();

        assert!(matches!(
            build(&options),
            Err(Error::Configuration(ConfigurationError::MissingKey))
        ));
        assert!(!output.exists());
        Ok(())
    }

    #[test]
    fn existing_output_is_kept() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let output = dir.path().join("out.pak");
        std::fs::write(&output, b"keep me")?;

        let options = PackOptions::builder()
            .input(dir.path())
            .output(&output)
            .build();

        assert!(matches!(
            build(&options),
            Err(Error::Configuration(ConfigurationError::OutputExists(_)))
        ));
        assert_eq!(std::fs::read(&output)?, b"keep me");
        Ok(())
    }

    #[test]
    fn invalid_ratio_keeps_existing_output() -> Result<()> {
        let input = tempfile::tempdir()?;
        std::fs::write(input.path().join("a.txt"), b"data")?;
        let out = tempfile::tempdir()?;
        let output = out.path().join("out.pak");
        std::fs::write(&output, b"previous archive")?;

        for ratio in [2.0, -0.5, f64::NAN] {
            let options = PackOptions::builder()
                .input(input.path())
                .output(&output)
                .overwrite(true)
                .min_savings_ratio(ratio)
                .build();

            assert!(matches!(
                build(&options),
                Err(Error::Configuration(ConfigurationError::InvalidSavingsRatio(_)))
            ));
            assert_eq!(std::fs::read(&output)?, b"previous archive");
        }
        Ok(())
    }

    #[test]
    fn invalid_ratio_creates_no_output() -> Result<()> {
        let input = tempfile::tempdir()?;
        let out = tempfile::tempdir()?;
        let output = out.path().join("out.pak");

        let options = PackOptions::builder()
            .input(input.path())
            .output(&output)
            .min_savings_ratio(1.5)
            .build();

        assert!(build(&options).is_err());
        assert!(!output.exists());
        Ok(())
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn non_utf8_names_are_rejected() -> Result<()> {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join(OsStr::from_bytes(b"bad\xFF.txt")), b"x")?;

        assert!(matches!(
            collect_files(dir.path(), &dir.path().join("out.pak")),
            Err(Error::Format(FormatError::NonUtf8Path(_)))
        ));
        Ok(())
    }

    #[test]
    fn input_must_be_a_directory() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let options = PackOptions::builder()
            .input(dir.path().join("missing"))
            .output(dir.path().join("out.pak"))
            .build();

        assert!(matches!(
            build(&options),
            Err(Error::Configuration(ConfigurationError::NotADirectory(_)))
        ));
        Ok(())
    }
}
