use clap::Args;
use miette::{Context, IntoDiagnostic, Result};
use snap_pak::PakArchive;
use std::io::BufReader;
use std::{fs::File, path::PathBuf};
use tracing::info;

#[derive(Args)]
pub struct VerifyArgs {
    /// An input pak file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// 32 byte key as 64 hex characters
    #[arg(long, value_name = "HEX", env = "SNAPPAK_KEY", hide_env_values = true)]
    key: Option<String>,
}

impl VerifyArgs {
    pub fn handle(&self) -> Result<()> {
        let key = super::resolve_key(self.key.as_deref())?;

        let f = File::open(&self.file)
            .into_diagnostic()
            .context(format!("path: {}", &self.file.display()))?;
        let mut pak = PakArchive::new(BufReader::new(f))?;

        let count = pak
            .verify(key.as_ref())
            .context(format!("verifying {}", &self.file.display()))?;
        info!("{} entries ok", count);

        Ok(())
    }
}
