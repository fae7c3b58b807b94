use std::path::PathBuf;

use clap::{
    ValueEnum,
    value_parser,
};
use kc_core::discovery::{
    Case,
    discover_cases,
};
use kc_core::prelude::*;

#[derive(Clone, Debug, ValueEnum)]
pub enum PrintFormat {
    Json,
    List,
    Yaml,
}

#[derive(clap::Args)]
pub struct Args {
    #[arg(long, long_help = "directory containing one subdirectory per test case", default_value = DEFAULT_CASES_DIR)]
    pub cases_dir: PathBuf,

    #[arg(
        short,
        long,
        long_help = "format to display the discovered cases",
        default_value = "list",
        value_parser = value_parser!(PrintFormat),
    )]
    pub format: PrintFormat,
}

pub fn cmd(args: &Args) -> EmptyResult {
    let cases = discover_cases(&args.cases_dir)?;
    print!("{}", render(&cases, &args.format)?);
    Ok(())
}

pub(crate) fn render(cases: &[Case], format: &PrintFormat) -> anyhow::Result<String> {
    Ok(match format {
        PrintFormat::Json => serde_json::to_string_pretty(cases)? + "\n",
        PrintFormat::List => cases.iter().map(list_entry).collect(),
        PrintFormat::Yaml => serde_yaml::to_string(cases)?,
    })
}

fn list_entry(case: &Case) -> String {
    let config = if case.config.is_file() { "with config" } else { "no config" };
    format!(
        "{}: {} deploy, {} created, {} not created ({config})\n",
        case.name,
        case.deploy.len(),
        case.expected.created.len(),
        case.expected.not_created.len(),
    )
}
