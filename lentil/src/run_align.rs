use crate::config::QuantileNormArgs;
use crate::io::*;
use crate::lentil_common::*;
use crate::quantile_align::quantile_align;

use clap::Args;

/// Values below this are clamped by `--clamp-negative`
pub const NONNEG_EPS: f32 = 1e-16;

#[derive(Args, Debug)]
pub struct AlignArgs {
    /// factor loading files (comma-separated), one per dataset, cells x
    /// factors; `.csv(.gz)` is comma-delimited, anything else tab
    #[arg(long, short = 'l', value_delimiter(','), required = true)]
    pub loading_files: Vec<Box<str>>,

    /// barcode files (comma-separated), one barcode per line, matching
    /// the rows of each loading file
    #[arg(long, short = 'b', value_delimiter(','))]
    pub barcode_files: Option<Vec<Box<str>>>,

    /// dataset names (comma-separated; default: loading file names)
    #[arg(long, short = 'n', value_delimiter(','))]
    pub names: Option<Vec<Box<str>>>,

    /// Output header
    #[arg(long, short, required = true)]
    pub out: Box<str>,

    /// clamp loadings below 1e-16 before alignment
    #[arg(long, default_value_t = false)]
    pub clamp_negative: bool,

    /// number of threads (default: all logical CPUs)
    #[arg(long)]
    pub threads: Option<usize>,

    #[command(flatten)]
    pub quantile_norm: QuantileNormArgs,
}

pub fn run_align(args: &AlignArgs) -> anyhow::Result<()> {
    let nthreads = args.threads.unwrap_or_else(num_cpus::get).max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(nthreads)
        .build()?;
    info!("Using {} threads", nthreads);

    pool.install(|| -> anyhow::Result<()> {
        let mut session = read_session(ReadArgs {
            loading_files: &args.loading_files,
            barcode_files: args.barcode_files.as_deref(),
            names: args.names.as_deref(),
        })?;

        if args.clamp_negative {
            session.clamp_nonnegative(NONNEG_EPS);
        }

        quantile_align(&mut session, &args.quantile_norm)?;
        write_aligned(&session, &args.out)?;
        Ok(())
    })
}
