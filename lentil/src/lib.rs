pub mod cluster_assign;
pub mod config;
pub mod dataset;
pub mod error;
pub mod io;
pub mod lentil_common;
pub mod neighbor_vote;
pub mod quantile_align;
pub mod quantile_map;
pub mod reference;
pub mod run_align;

pub use config::QuantileNormArgs;
pub use dataset::{AlignedLabels, Dataset, FactorSession};
pub use error::AlignError;
pub use quantile_align::{quantile_align, quantile_align_with_cancel};
