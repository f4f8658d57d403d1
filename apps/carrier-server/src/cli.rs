use std::ffi::OsString;
use std::path::PathBuf;

use carrier_auth::ProviderRegistry;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};

#[derive(Parser, Debug)]
#[command(name = "carrier-server", about = "Carrier API server", version)]
pub struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Authentication providers to try, in order.
    #[arg(long, value_delimiter = ',', default_value = "OIDC")]
    pub authentication_mode: Vec<String>,
}

impl Cli {
    /// Parse `args` against the server flags plus every provider's flags.
    ///
    /// The raw matches are returned too; providers read their own flags
    /// from them during init.
    ///
    /// # Errors
    /// Returns the clap error for invalid arguments, including `--help`.
    pub fn parse_with<I, T>(registry: &ProviderRegistry, args: I) -> Result<(Self, ArgMatches), clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = registry.add_flags(Self::command()).try_get_matches_from(args)?;
        let cli = Self::from_arg_matches(&matches)?;
        Ok((cli, matches))
    }
}
