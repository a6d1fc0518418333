//! Quantile alignment of factor loadings across datasets.
//!
//! 1. Assign each cell of each dataset to its dominant factor.
//! 2. Pick a reference dataset.
//! 3. For every other dataset, cluster and factor, warp the target
//!    cells' loadings onto the reference cells' quantiles.
//!
//! Each `(dataset, cluster, factor)` slice is estimated independently
//! from the pre-alignment loadings and committed only after all of
//! them succeeded, so a failed call leaves the session untouched.

use crate::cluster_assign::assign_max_factor_clusters;
use crate::config::QuantileNormArgs;
use crate::dataset::{AlignedLabels, FactorSession};
use crate::lentil_common::*;
use crate::quantile_map::QuantileWarp;
use crate::reference::select_reference;

use anyhow::Context;
use indicatif::ParallelProgressIterator;
use matrix_util::utils::{membership_sizes, partition_by_membership};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};

struct AlignTask {
    dataset: usize,
    cluster: usize,
    factor: usize,
}

struct SliceUpdate {
    dataset: usize,
    cluster: usize,
    factor: usize,
    values: Vec<f32>,
}

/// Quantile-align the loadings of all datasets in `session` to the
/// reference dataset, cluster by cluster and factor by factor.
///
/// On success the session's loadings are rewritten and the combined
/// cluster labels are stored on the session and returned.
pub fn quantile_align<'a>(
    session: &'a mut FactorSession,
    args: &QuantileNormArgs,
) -> anyhow::Result<&'a AlignedLabels> {
    let never = AtomicBool::new(false);
    quantile_align_with_cancel(session, args, &never)
}

/// [`quantile_align`] that gives up with [`AlignError::Cancelled`] once
/// `cancel` is raised
pub fn quantile_align_with_cancel<'a>(
    session: &'a mut FactorSession,
    args: &QuantileNormArgs,
    cancel: &AtomicBool,
) -> anyhow::Result<&'a AlignedLabels> {
    let num_factors = session.num_factors()?;
    args.validate()?;
    let factors = args.factors(num_factors)?;

    let reference = select_reference(session.datasets(), args.reference_dataset.as_deref())?;
    let num_clusters = session.dataset(reference).num_factors();

    info!(
        "Reference dataset: '{}' ({} cells); {} datasets, {} factors",
        session.dataset(reference).name(),
        session.dataset(reference).num_cells(),
        session.num_datasets(),
        num_factors
    );

    if args.center_on_scale {
        warn!("center_on_scale is reserved and does not change the alignment");
    }

    ///////////////////////////////////////////
    // step 1: dominant factor of every cell //
    ///////////////////////////////////////////

    let mut labels = Vec::with_capacity(session.num_datasets());
    for d in session.datasets() {
        check_cancel(cancel)?;
        let clusters = assign_max_factor_clusters(
            d.name(),
            d.loadings(),
            args.use_knn_refine,
            args.knn_k,
            args.precision,
        )
        .with_context(|| format!("cluster assignment of dataset '{}'", d.name()))?;

        info!(
            "'{}': cluster sizes {:?}",
            d.name(),
            membership_sizes(&clusters, num_clusters)
        );
        labels.push(clusters);
    }

    let groups = labels
        .iter()
        .map(|l| partition_by_membership(l, num_clusters))
        .collect::<anyhow::Result<Vec<_>>>()?;

    /////////////////////////////////////////////
    // step 2: shared clusters worth warping   //
    /////////////////////////////////////////////

    let mut tasks = vec![];
    for k in 0..session.num_datasets() {
        if k == reference {
            continue;
        }
        for j in 0..num_clusters {
            let ncells1 = groups[reference][j].len();
            let ncells2 = groups[k][j].len();
            if ncells1 < args.min_cells && ncells2 < args.min_cells {
                debug!(
                    "skip dataset {} cluster {}: {} reference and {} target cells",
                    k, j, ncells1, ncells2
                );
                continue;
            }
            if ncells2 == 0 {
                debug!("skip dataset {} cluster {}: no target cells", k, j);
                continue;
            }
            tasks.extend(factors.iter().map(|&i| AlignTask {
                dataset: k,
                cluster: j,
                factor: i,
            }));
        }
    }

    let base_seed = args.seed.unwrap_or_else(rand::random);
    info!(
        "Quantile alignment over {} (dataset, cluster, factor) slices, seed {}",
        tasks.len(),
        base_seed
    );

    //////////////////////////////////////////////
    // step 3: estimate all warps, then commit  //
    //////////////////////////////////////////////

    let current: &FactorSession = &*session;
    let h_ref = current.dataset(reference).loadings();

    let updates = tasks
        .par_iter()
        .enumerate()
        .progress_count(tasks.len() as u64)
        .map(|(t, task)| -> anyhow::Result<SliceUpdate> {
            check_cancel(cancel)?;

            let cells1 = &groups[reference][task.cluster];
            let cells2 = &groups[task.dataset][task.cluster];
            let h_k = current.dataset(task.dataset).loadings();

            let reference_values = cells1
                .iter()
                .map(|&c| h_ref[(c, task.factor)])
                .collect::<Vec<_>>();
            let target_values = cells2
                .iter()
                .map(|&c| h_k[(c, task.factor)])
                .collect::<Vec<_>>();

            let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(t as u64));

            let warp = QuantileWarp::build(
                &reference_values,
                &target_values,
                args.quantiles,
                args.max_sample,
                &mut rng,
            )
            .with_context(|| {
                format!(
                    "dataset {} ('{}'), cluster {}, factor {}",
                    task.dataset,
                    current.dataset(task.dataset).name(),
                    task.cluster,
                    task.factor
                )
            })?;

            Ok(SliceUpdate {
                dataset: task.dataset,
                cluster: task.cluster,
                factor: task.factor,
                values: warp.apply(&target_values),
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    check_cancel(cancel)?;

    for upd in updates {
        let cells = &groups[upd.dataset][upd.cluster];
        session
            .dataset_mut(upd.dataset)
            .write_column_slice(cells, upd.factor, &upd.values);
    }

    let aligned = AlignedLabels::from_datasets(
        session.datasets(),
        labels,
        num_clusters,
        reference,
        base_seed,
    );

    info!("Aligned {} cells", aligned.len());
    Ok(session.set_aligned(aligned))
}

fn check_cancel(cancel: &AtomicBool) -> anyhow::Result<()> {
    if cancel.load(Ordering::Relaxed) {
        Err(AlignError::Cancelled.into())
    } else {
        Ok(())
    }
}
