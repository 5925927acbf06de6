use anyhow::Result;
use clap::Args;
use perceiver_roster::canonicalize;
use serde::Serialize;

use crate::cli::output::OutputFormat;

#[derive(Args, Clone, Debug)]
pub struct CanonArgs {
    /// Names as they appear on a roster, e.g. "Doe, Jane"
    #[arg(required = true)]
    pub names: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CanonEntry<'a> {
    input: &'a str,
    canonical: String,
}

pub fn cmd_canon(args: CanonArgs, output: &OutputFormat) -> Result<()> {
    let entries: Vec<CanonEntry<'_>> = args
        .names
        .iter()
        .map(|name| CanonEntry {
            input: name,
            canonical: canonicalize(name),
        })
        .collect();

    match output {
        OutputFormat::Human => {
            for entry in &entries {
                println!("{}", entry.canonical);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&entries)?),
    }
    Ok(())
}
