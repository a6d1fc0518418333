use crate::error::AlignError;
use clap::Args;

/// Options of the quantile alignment; shared by the library call and
/// the `align` subcommand
#[derive(Args, Debug, Clone)]
pub struct QuantileNormArgs {
    /// number of quantile points per cluster and factor
    #[arg(long, short = 'q', default_value_t = 50)]
    pub quantiles: usize,

    /// name of the reference dataset (default: the one with most cells)
    #[arg(long, short = 'r')]
    pub reference_dataset: Option<Box<str>>,

    /// minimum number of cells to consider a cluster shared across datasets
    #[arg(long, default_value_t = 20)]
    pub min_cells: usize,

    /// factor indices to align (comma-separated, default: all)
    #[arg(long, value_delimiter(','))]
    pub factors_used: Option<Vec<usize>>,

    /// centre the data when scaling factors; reserved for less sparse
    /// modalities and currently has no effect on the alignment
    #[arg(long, default_value_t = false)]
    pub center_on_scale: bool,

    /// maximum number of cells used to estimate quantiles of each
    /// cluster and factor
    #[arg(long, default_value_t = 1000)]
    pub max_sample: usize,

    /// error tolerance of the neighbour search (0 = exact)
    #[arg(long, default_value_t = 0.9)]
    pub precision: f32,

    /// refine cluster assignments by a kNN vote
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub use_knn_refine: bool,

    /// #k-nearest neighbours within each dataset for the vote
    #[arg(long, default_value_t = 20)]
    pub knn_k: usize,

    /// random seed for quantile subsampling (default: drawn from the OS)
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Default for QuantileNormArgs {
    fn default() -> Self {
        Self {
            quantiles: 50,
            reference_dataset: None,
            min_cells: 20,
            factors_used: None,
            center_on_scale: false,
            max_sample: 1000,
            precision: 0.9,
            use_knn_refine: true,
            knn_k: 20,
            seed: None,
        }
    }
}

impl QuantileNormArgs {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.quantiles < 2 {
            anyhow::bail!("need at least 2 quantiles, got {}", self.quantiles);
        }
        if self.max_sample == 0 {
            anyhow::bail!("max_sample must be positive");
        }
        if self.use_knn_refine && self.knn_k == 0 {
            anyhow::bail!("knn_k must be positive");
        }
        if !self.precision.is_finite() {
            anyhow::bail!("precision must be finite, got {}", self.precision);
        }
        Ok(())
    }

    /// Factor columns to align, out of `num_factors`
    pub fn factors(&self, num_factors: usize) -> anyhow::Result<Vec<usize>> {
        match self.factors_used.as_ref() {
            None => Ok((0..num_factors).collect()),
            Some(factors) => {
                if let Some(&factor) = factors.iter().find(|&&f| f >= num_factors) {
                    return Err(AlignError::FactorOutOfRange {
                        factor,
                        num_factors,
                    }
                    .into());
                }
                let mut factors = factors.clone();
                factors.sort_unstable();
                factors.dedup();
                Ok(factors)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let args = QuantileNormArgs::default();
        assert!(args.validate().is_ok());
        assert_eq!(args.factors(3).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn factor_selection() {
        let args = QuantileNormArgs {
            factors_used: Some(vec![2, 0, 2]),
            ..Default::default()
        };
        assert_eq!(args.factors(3).unwrap(), vec![0, 2]);

        let err = args.factors(2).unwrap_err();
        assert_eq!(
            err.downcast_ref::<AlignError>(),
            Some(&AlignError::FactorOutOfRange {
                factor: 2,
                num_factors: 2
            })
        );
    }

    #[test]
    fn too_few_quantiles() {
        let args = QuantileNormArgs {
            quantiles: 1,
            ..Default::default()
        };
        assert!(args.validate().is_err());
    }
}
