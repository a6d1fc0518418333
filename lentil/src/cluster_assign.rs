use crate::lentil_common::*;
use crate::neighbor_vote::refine_clusters_knn;

use matrix_util::traits::MatOps;

/// Assign each cell (row) to the factor with the largest standardized
/// loading.
///
/// Columns are centred and scaled by their sample standard deviation
/// (`n - 1`); a column without positive variance fails with
/// [`AlignError::DegenerateColumn`]. Ties go to the lower factor index.
/// With `use_knn_refine`, the labels are then smoothed by
/// [`refine_clusters_knn`] on the raw (unscaled) loadings.
///
/// * `name` - dataset name for error messages
/// * `h` - cells x factors loadings
///
pub fn assign_max_factor_clusters(
    name: &str,
    h: &Mat,
    use_knn_refine: bool,
    knn: usize,
    precision: f32,
) -> anyhow::Result<Vec<usize>> {
    if h.ncols() == 0 {
        anyhow::bail!("dataset '{}' has no factors", name);
    }

    let (mu, sig) = h.column_mean_sd();

    if let Some(column) = sig.iter().position(|&s| !(s > 0.0 && s.is_finite())) {
        return Err(AlignError::DegenerateColumn {
            dataset: name.into(),
            column,
        }
        .into());
    }

    let scaled = h.scale_columns_with(&mu, &sig);

    let labels = scaled
        .row_iter()
        .map(|row| {
            let mut best = 0;
            for (j, &x) in row.iter().enumerate() {
                if x > row[best] {
                    best = j;
                }
            }
            best
        })
        .collect::<Vec<_>>();

    if use_knn_refine {
        refine_clusters_knn(h, &labels, knn, precision)
    } else {
        Ok(labels)
    }
}
