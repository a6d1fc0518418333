use clap::{Parser, Subcommand};
use lentil::run_align::*;
use log::info;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "LENTIL",
    long_about = "Quantile alignment of shared factor loadings across datasets.\n\
		  Cells are assigned to their dominant factor, and each dataset's\n\
		  per-cluster factor distributions are warped onto a reference."
)]
struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// verbosity
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Quantile-align factor loadings",
        long_about = "Quantile-align factor loadings in three stages: \n\
		      (1) Assign cells to dominant factors (optionally by kNN vote)\n\
		      (2) Pick the reference dataset\n\
		      (3) Warp each cluster and factor onto the reference quantiles.\n"
    )]
    Align(AlignArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.verbose && std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    match &cli.commands {
        Commands::Align(args) => {
            run_align(args)?;
        }
    }

    info!("Done");
    Ok(())
}
