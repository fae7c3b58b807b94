mod discover;
mod kinds;
mod run;

use clap::{
    Parser,
    Subcommand,
    crate_version,
};
use kc_core::logging;
use kc_core::prelude::*;

#[derive(Parser)]
#[command(
    about = "command-line app for running declarative kubernetes controller test cases",
    version,
    propagate_version = true
)]
struct KcCommandRoot {
    #[command(subcommand)]
    subcommand: KcSubcommand,

    #[arg(short, long, default_value = "warn")]
    verbosity: String,
}

#[derive(Subcommand)]
enum KcSubcommand {
    #[command(about = "list the test cases in a directory", visible_aliases = &["ls", "d"])]
    Discover(discover::Args),

    #[command(about = "print the resource kinds that can be compared")]
    Kinds,

    #[command(about = "run test cases against the current cluster", visible_alias = "r")]
    Run(run::Args),

    #[command(about = "kubecase version")]
    Version,
}

#[tokio::main]
async fn main() -> EmptyResult {
    let args = KcCommandRoot::parse();
    logging::setup_for_cli(&args.verbosity);

    // Only `run` needs a kube client; the others should work without a kubeconfig
    match &args.subcommand {
        KcSubcommand::Discover(args) => discover::cmd(args),
        KcSubcommand::Kinds => kinds::cmd(),
        KcSubcommand::Run(args) => {
            let client = kube::Client::try_default().await?;
            run::cmd(args, client).await
        },
        KcSubcommand::Version => {
            println!("kcctl {}", crate_version!());
            Ok(())
        },
    }
}

#[cfg(test)]
mod tests;
