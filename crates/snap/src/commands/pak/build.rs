use clap::Args;
use miette::{Context, Result};
use snap_pak::{write::DEFAULT_MIN_SAVINGS_RATIO, PackOptions};
use std::path::PathBuf;
use tracing::info;

#[derive(Args)]
pub struct BuildArgs {
    /// An input directory
    #[arg(short, long, value_name = "DIR")]
    directory: PathBuf,

    /// A target pak file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,

    /// Do not try Brotli
    #[arg(long, default_value_t = false)]
    no_brotli: bool,

    /// Try Deflate when Brotli is disabled or not worth it
    #[arg(long, default_value_t = false)]
    deflate: bool,

    /// Fraction of the original size compression has to save to be kept
    #[arg(long, value_name = "RATIO", default_value_t = DEFAULT_MIN_SAVINGS_RATIO)]
    min_savings: f64,

    /// Encrypt every entry
    #[arg(long, default_value_t = false)]
    encrypt: bool,

    /// 32 byte key as 64 hex characters
    #[arg(long, value_name = "HEX", env = "SNAPPAK_KEY", hide_env_values = true)]
    key: Option<String>,
}

impl BuildArgs {
    pub fn handle(&self) -> Result<()> {
        info!("creating {}", &self.file.display());

        let key = if self.encrypt {
            super::resolve_key(self.key.as_deref())?
        } else {
            None
        };

        let options = PackOptions::builder()
            .input(&self.directory)
            .output(&self.file)
            .overwrite(self.overwrite)
            .use_brotli(!self.no_brotli)
            .use_deflate(self.deflate)
            .min_savings_ratio(self.min_savings)
            .encrypt(self.encrypt)
            .maybe_key(key)
            .build();

        let entries = snap_pak::build(&options)
            .context(format!("building {}", &self.file.display()))?;
        info!("packed {} files", entries.len());

        Ok(())
    }
}
