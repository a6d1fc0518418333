pub use nalgebra::{DMatrix, DVector};
pub use rand::Rng;
use rand_distr::{Distribution, Gamma, StandardNormal};

use crate::traits::MatOps;

/// Sample d,n matrix from N(0,1)
pub fn rnorm<R: Rng + ?Sized>(dd: usize, nn: usize, rng: &mut R) -> DMatrix<f32> {
    DMatrix::<f32>::from_fn(dd, nn, |_, _| rng.sample(StandardNormal))
}

/// Sample d,n matrix from a gamma distribution with `(shape, scale)`
pub fn rgamma<R: Rng + ?Sized>(
    dd: usize,
    nn: usize,
    param: (f32, f32),
    rng: &mut R,
) -> anyhow::Result<DMatrix<f32>> {
    let (shape, scale) = param;
    let gam = Gamma::new(shape, scale)
        .map_err(|e| anyhow::anyhow!("invalid gamma parameters ({}, {}): {}", shape, scale, e))?;
    Ok(DMatrix::<f32>::from_fn(dd, nn, |_, _| gam.sample(rng)))
}

impl MatOps for DMatrix<f32> {
    type Mat = Self;
    type Scalar = f32;

    fn column_mean_sd(&self) -> (Vec<f32>, Vec<f32>) {
        let nn = self.nrows();
        self.column_iter()
            .map(|x_j| {
                if nn == 0 {
                    return (f32::NAN, 0.0);
                }
                // accumulate in f64; f32 sums drift on long columns
                let mu = x_j.iter().map(|&x| x as f64).sum::<f64>() / nn as f64;
                if nn < 2 {
                    return (mu as f32, 0.0);
                }
                let ss = x_j
                    .iter()
                    .map(|&x| {
                        let d = x as f64 - mu;
                        d * d
                    })
                    .sum::<f64>();
                (mu as f32, (ss / (nn - 1) as f64).sqrt() as f32)
            })
            .unzip()
    }

    fn scale_columns_with(&self, mu: &[f32], sig: &[f32]) -> Self::Mat {
        let mut ret = self.clone();
        for (j, mut x_j) in ret.column_iter_mut().enumerate() {
            if sig[j] > 0.0 {
                x_j.apply(|x| *x = (*x - mu[j]) / sig[j]);
            } else {
                x_j.apply(|x| *x -= mu[j]);
            }
        }
        ret
    }

    fn clamp_below_inplace(&mut self, eps: f32) {
        self.apply(|x| {
            if *x < eps {
                *x = eps;
            }
        });
    }
}
