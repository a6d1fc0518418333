use crate::lentil_common::*;

use indicatif::ParallelProgressIterator;
use matrix_util::knn_match::{ColumnDict, NeighbourSearch};
use rayon::prelude::*;

/// Re-label each point by a plurality vote of its `knn` nearest
/// neighbours (the point itself included as the first neighbour).
///
/// Votes are tallied in neighbour order; among labels with the most
/// votes, the one that was seen first wins. Points are re-labelled one
/// at a time in index order on a copy of `labels`, so later points vote
/// with the labels already updated. `labels` itself is left as is.
///
/// * `points` - n x d matrix, one point per row
/// * `labels` - current label of each point
/// * `knn` - neighbourhood size, `1 <= knn <= n`
/// * `precision` - error tolerance of the neighbour search (0 = exact)
///
pub fn refine_clusters_knn(
    points: &Mat,
    labels: &[usize],
    knn: usize,
    precision: f32,
) -> anyhow::Result<Vec<usize>> {
    let nn = points.nrows();

    if nn == 0 {
        anyhow::bail!("no points to vote on");
    }
    if labels.len() != nn {
        anyhow::bail!("{} labels for {} points", labels.len(), nn);
    }
    if knn == 0 || knn > nn {
        anyhow::bail!("knn = {} must be within [1, {}]", knn, nn);
    }

    let search = NeighbourSearch::with_tolerance(nn, knn, precision);
    info!("kNN vote over {} points, k = {}, {:?}", nn, knn, search);

    let dict = ColumnDict::from_rows(points, search);

    let neighbours = (0..nn)
        .into_par_iter()
        .progress_count(nn as u64)
        .map(|i| -> anyhow::Result<Vec<usize>> { Ok(dict.search_with_self(i, knn)?.0) })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut refined = labels.to_vec();
    for (i, nbrs) in neighbours.iter().enumerate() {
        let k = plurality_label(nbrs.iter().map(|&j| refined[j]));
        refined[i] = k;
    }
    Ok(refined)
}

/// The most frequent label; the first label to be seen among those
/// with the highest count wins ties
fn plurality_label(votes: impl Iterator<Item = usize>) -> usize {
    // (label, count) in first-seen order
    let mut tally: Vec<(usize, usize)> = Vec::new();
    for k in votes {
        match tally.iter_mut().find(|(l, _)| *l == k) {
            Some((_, c)) => *c += 1,
            None => tally.push((k, 1)),
        }
    }

    let mut best = (usize::MAX, 0);
    for &(l, c) in tally.iter() {
        if c > best.1 {
            best = (l, c);
        }
    }
    best.0
}
