use matrix_util::dmatrix_util::rnorm;
use matrix_util::knn_match::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// two blobs far apart: rows [0, n) around the origin, [n, 2n) around 50
fn two_blobs(n: usize, dim: usize) -> nalgebra::DMatrix<f32> {
    let mut rng = StdRng::seed_from_u64(11);
    let mut xx = rnorm(2 * n, dim, &mut rng);
    for mut row in xx.rows_mut(n, n).row_iter_mut() {
        row.add_scalar_mut(50.0);
    }
    xx
}

#[test]
fn hnsw_neighbours_stay_in_blob() -> anyhow::Result<()> {
    let n = 1500;
    let xx = two_blobs(n, 4);
    let search = NeighbourSearch::with_tolerance(xx.nrows(), 10, 0.9);
    assert!(matches!(search, NeighbourSearch::Hnsw { .. }));

    let dict = ColumnDict::from_rows(&xx, search);
    assert_eq!(dict.num_points(), 2 * n);

    for query in (0..2 * n).step_by(97) {
        let (idx, dist) = dict.search_with_self(query, 10)?;
        assert_eq!(idx.len(), 10);
        assert_eq!(idx[0], query);
        assert!(dist.windows(2).all(|w| w[0] <= w[1]));
        let blob = query / n;
        assert!(idx.iter().all(|&j| j / n == blob));
    }
    Ok(())
}

#[test]
fn exact_matches_brute_force_order() -> anyhow::Result<()> {
    let xx = two_blobs(40, 3);
    let dict = ColumnDict::from_rows(&xx, NeighbourSearch::Exact);
    assert!(!dict.is_empty());

    let (idx, dist) = dict.search_with_self(5, 8)?;
    let mut expected = (0..xx.nrows())
        .filter(|&j| j != 5)
        .map(|j| ((xx.row(5) - xx.row(j)).norm(), j))
        .collect::<Vec<_>>();
    expected.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    assert_eq!(idx[0], 5);
    for (k, &(d, j)) in expected.iter().take(7).enumerate() {
        assert_eq!(idx[k + 1], j);
        approx::assert_abs_diff_eq!(dist[k + 1], d, epsilon = 1e-4);
    }
    Ok(())
}

/// 2500 copies of one point, then three points repeated in turn
fn duplicate_heavy() -> nalgebra::DMatrix<f32> {
    nalgebra::DMatrix::from_fn(3000, 3, |i, j| {
        if i < 2500 {
            if j == 0 {
                1.0
            } else {
                0.0
            }
        } else if (i - 2500) % 3 == j {
            5.0
        } else {
            0.0
        }
    })
}

#[test]
fn hnsw_agrees_with_exact_on_repeated_rows() -> anyhow::Result<()> {
    let xx = duplicate_heavy();
    let knn = 20;

    let search = NeighbourSearch::with_tolerance(xx.nrows(), knn, 0.9);
    assert!(matches!(search, NeighbourSearch::Hnsw { .. }));

    let approx_dict = ColumnDict::from_rows(&xx, search);
    let exact_dict = ColumnDict::from_rows(&xx, NeighbourSearch::Exact);

    for query in [0, 1, 1234, 2499, 2500, 2501, 2502, 2700, 2999] {
        let (idx, dist) = approx_dict.search_with_self(query, knn)?;
        let (idx_exact, _) = exact_dict.search_with_self(query, knn)?;
        assert_eq!(idx, idx_exact, "query {}", query);
        assert!(dist.iter().all(|&d| d == 0.0));
    }
    Ok(())
}
