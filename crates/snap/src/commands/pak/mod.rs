use miette::Result;
use snap_pak::{ArchiveKey, EnvKeyProvider, KeyProvider};

pub mod build;
pub mod extract;
pub mod list;
pub mod verify;

#[derive(clap::Subcommand)]
pub enum PakCommands {
    /// Pack a directory into a pak file
    Build(build::BuildArgs),
    /// List the entries of a pak file
    List(list::ListArgs),
    /// Decode every entry of a pak file and check it
    Verify(verify::VerifyArgs),
    /// Extract a pak file into a directory
    Extract(extract::ExtractArgs),
}

impl PakCommands {
    pub fn handle(&self) -> Result<()> {
        match self {
            PakCommands::Build(build) => build.handle(),
            PakCommands::List(list) => list.handle(),
            PakCommands::Verify(verify) => verify.handle(),
            PakCommands::Extract(extract) => extract.handle(),
        }
    }
}

/// Key given on the command line, else the one in the environment
fn resolve_key(key: Option<&str>) -> Result<Option<ArchiveKey>> {
    match key {
        Some(hex) => Ok(Some(ArchiveKey::from_hex(hex)?)),
        None => Ok(EnvKeyProvider::default().archive_key()?),
    }
}
