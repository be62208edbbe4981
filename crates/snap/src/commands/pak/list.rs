use clap::Args;
use miette::{Context, IntoDiagnostic, Result};
use snap_pak::PakArchive;
use std::io::{BufReader, BufWriter, Write};
use std::{fs::File, path::PathBuf};
use tracing::warn;

#[derive(Args)]
pub struct ListArgs {
    /// An input pak file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Also print offset, stored size and whether the entry is encrypted
    #[arg(short, long, default_value_t = false)]
    long: bool,

    /// 32 byte key as 64 hex characters, only used to decide whether to warn
    #[arg(long, value_name = "HEX", env = "SNAPPAK_KEY", hide_env_values = true)]
    key: Option<String>,
}

impl ListArgs {
    pub fn handle(&self) -> Result<()> {
        let f = File::open(&self.file)
            .into_diagnostic()
            .context(format!("path: {}", &self.file.display()))?;
        let pak = PakArchive::new(BufReader::new(f))?;

        if pak.has_encrypted_entries() && super::resolve_key(self.key.as_deref())?.is_none() {
            warn!("{} has encrypted entries but no key is available", &self.file.display());
        }

        let stdout = std::io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        if self.long {
            for entry in pak.entries() {
                writeln!(
                    out,
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    entry.path,
                    entry.original,
                    entry.compression,
                    entry.offset,
                    entry.stored,
                    if entry.encrypted { "encrypted" } else { "plain" },
                )
                .into_diagnostic()?;
            }
        } else {
            pak.list(&mut out)?;
        }
        out.flush().into_diagnostic()?;

        Ok(())
    }
}
