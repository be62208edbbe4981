use clap::Args;
use miette::{miette, Context, IntoDiagnostic, Result};
use snap_pak::PakArchive;
use std::io::BufReader;
use std::{fs::File, path::PathBuf};
use tracing::info;

#[derive(Args)]
pub struct ExtractArgs {
    /// An input pak file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// A target directory
    #[arg(short, long, value_name = "DIR")]
    directory: PathBuf,

    /// Allow extracting into a directory that is not empty
    #[arg(long, default_value_t = false)]
    overwrite: bool,

    /// 32 byte key as 64 hex characters
    #[arg(long, value_name = "HEX", env = "SNAPPAK_KEY", hide_env_values = true)]
    key: Option<String>,
}

impl ExtractArgs {
    pub fn handle(&self) -> Result<()> {
        let key = super::resolve_key(self.key.as_deref())?;

        if !self.overwrite && self.directory.read_dir().is_ok_and(|mut d| d.next().is_some()) {
            return Err(miette!(
                help = "pass --overwrite to extract anyway",
                "{} is not empty",
                self.directory.display()
            ));
        }

        let f = File::open(&self.file)
            .into_diagnostic()
            .context(format!("path: {}", &self.file.display()))?;
        let mut pak = PakArchive::new(BufReader::new(f))?;

        info!("extracting into {}", &self.directory.display());
        let count = pak
            .extract_all(&self.directory, key.as_ref())
            .context(format!("extracting {}", &self.file.display()))?;
        info!("wrote {} files", count);

        Ok(())
    }
}
