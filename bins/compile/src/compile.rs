//! Compile command - turn a profile into device configuration.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use roswan::{Error, Result, compile};

use crate::profile::Profile;

#[derive(Args)]
pub struct CompileArgs {
    /// Profile file (YAML, or JSON with a .json extension)
    pub profile: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "script")]
    pub format: OutputFormat,
}

#[derive(Clone, ValueEnum)]
pub enum OutputFormat {
    /// Exportable configuration script
    Script,
    /// Section-keyed JSON
    Json,
}

pub fn run(args: CompileArgs) -> Result<()> {
    let text = std::fs::read_to_string(&args.profile)?;
    let profile: Profile = if args.profile.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&text)
            .map_err(|e| Error::InvalidProfile(format!("JSON parse failed: {e}")))?
    } else {
        serde_yaml::from_str(&text)
            .map_err(|e| Error::InvalidProfile(format!("YAML parse failed: {e}")))?
    };

    let uplinks = profile.uplinks();
    let strategy = profile.strategy()?;
    let doc = compile(&uplinks, &strategy)?;

    match args.format {
        OutputFormat::Script => print!("{}", doc.to_script()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&doc)?),
    }

    Ok(())
}
