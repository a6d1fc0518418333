use instant_distance::{Builder, HnswMap, Search};
use log::debug;
use nalgebra::DMatrix;
use fnv::FnvHashMap as HashMap;

/// Inputs up to this many points are always searched exhaustively
pub const EXACT_SEARCH_MAX_POINTS: usize = 2048;

const HNSW_SEED: u64 = 42;

/// How neighbours are looked up
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NeighbourSearch {
    /// brute-force scan; ties in distance go to the lower index
    Exact,
    /// approximate search on an HNSW graph
    Hnsw { ef_search: usize },
}

impl NeighbourSearch {
    /// Pick a search strategy for `npoints` points and `knn`
    /// neighbours given an error tolerance `eps`. Smaller `eps` widens
    /// the HNSW candidate list; `eps <= 0` asks for exact search.
    pub fn with_tolerance(npoints: usize, knn: usize, eps: f32) -> Self {
        if eps <= 0.0 || !eps.is_finite() || npoints <= EXACT_SEARCH_MAX_POINTS {
            NeighbourSearch::Exact
        } else {
            let ef = (knn as f32 * (1.0 + 1.0 / eps)).ceil() as usize;
            NeighbourSearch::Hnsw {
                ef_search: ef.max(knn + 1),
            }
        }
    }
}

/// A dictionary of points for fast nearest neighbour look-up.
/// Points are referred to by their position in the input.
pub struct ColumnDict {
    data_vec: Vec<VecPoint>,
    dict: Option<DistinctDict>,
}

/// HNSW over the distinct points; identical rows share one entry
struct DistinctDict {
    hnsw: HnswMap<VecPoint, usize>,
    /// distinct point of each input point
    point_to_distinct: Vec<usize>,
    /// input points of each distinct point, in increasing order
    members: Vec<Vec<usize>>,
}

impl ColumnDict {
    /// Build a dictionary over the rows of `data` (n x d)
    pub fn from_rows(data: &DMatrix<f32>, search: NeighbourSearch) -> Self {
        let data_vec = data.row_iter().map(|r| r.to_vp()).collect::<Vec<_>>();
        Self::from_points(data_vec, search)
    }

    fn from_points(data_vec: Vec<VecPoint>, search: NeighbourSearch) -> Self {
        let dict = match search {
            NeighbourSearch::Exact => None,
            NeighbourSearch::Hnsw { ef_search } => {
                let (point_to_distinct, members) = collapse_duplicates(&data_vec);
                let distinct = members
                    .iter()
                    .map(|m| data_vec[m[0]].clone())
                    .collect::<Vec<_>>();
                let names = (0..distinct.len()).collect::<Vec<_>>();
                debug!(
                    "building HNSW over {} distinct of {} points, ef_search = {}",
                    distinct.len(),
                    data_vec.len(),
                    ef_search
                );
                let hnsw = Builder::default()
                    .ef_search(ef_search)
                    .seed(HNSW_SEED)
                    .build(distinct, names);
                Some(DistinctDict {
                    hnsw,
                    point_to_distinct,
                    members,
                })
            }
        };
        ColumnDict { data_vec, dict }
    }

    pub fn num_points(&self) -> usize {
        self.data_vec.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data_vec.is_empty()
    }

    /// `knn` nearest neighbours of the point `query`, the point itself
    /// first, followed by the others in increasing distance. Identical
    /// points come right after `query`, lower index first.
    ///
    /// * `query` - index of the query point
    /// * `knn` - number of neighbours to return, including `query`
    ///
    pub fn search_with_self(
        &self,
        query: usize,
        knn: usize,
    ) -> anyhow::Result<(Vec<usize>, Vec<f32>)> {
        let nn = self.data_vec.len();
        if query >= nn {
            anyhow::bail!("query {} out of {} points", query, nn);
        }
        if knn == 0 || knn > nn {
            anyhow::bail!("need 1 <= knn <= {}, got {}", nn, knn);
        }

        let nothers = knn - 1;
        let mut indices = Vec::with_capacity(knn);
        let mut distances = Vec::with_capacity(knn);
        indices.push(query);
        distances.push(0_f32);

        if nothers == 0 {
            return Ok((indices, distances));
        }

        if let Some(dict) = self.dict.as_ref() {
            let u = dict.point_to_distinct[query];

            for &j in dict.members[u].iter().filter(|&&j| j != query) {
                if indices.len() == knn {
                    break;
                }
                indices.push(j);
                distances.push(0_f32);
            }

            if indices.len() < knn {
                let mut search = Search::default();
                let point = &self.data_vec[query];
                for item in dict
                    .hnsw
                    .search(point, &mut search)
                    .filter(|item| *item.value != u)
                {
                    for &j in dict.members[*item.value].iter() {
                        if indices.len() == knn {
                            break;
                        }
                        indices.push(j);
                        distances.push(item.distance);
                    }
                    if indices.len() == knn {
                        break;
                    }
                }
            }

            if indices.len() == knn {
                return Ok((indices, distances));
            }
            debug!(
                "HNSW returned {} of {} neighbours for point {}; scanning exhaustively",
                indices.len() - 1,
                nothers,
                query
            );
            indices.truncate(1);
            distances.truncate(1);
        }

        let (others, dists) = self.exact_others(query, nothers);
        indices.extend(others);
        distances.extend(dists);
        Ok((indices, distances))
    }

    fn exact_others(&self, query: usize, nothers: usize) -> (Vec<usize>, Vec<f32>) {
        use instant_distance::Point;
        let point = &self.data_vec[query];

        let mut cand = self
            .data_vec
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != query)
            .map(|(j, other)| (point.distance(other), j))
            .collect::<Vec<_>>();

        let by_dist_then_index =
            |a: &(f32, usize), b: &(f32, usize)| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1));

        if nothers < cand.len() {
            cand.select_nth_unstable_by(nothers, by_dist_then_index);
            cand.truncate(nothers);
        }
        cand.sort_by(by_dist_then_index);

        cand.into_iter().map(|(d, j)| (j, d)).unzip()
    }
}

/// Group identical points. Returns the group of each point and the
/// members of each group, groups in order of first appearance.
fn collapse_duplicates(data_vec: &[VecPoint]) -> (Vec<usize>, Vec<Vec<usize>>) {
    let mut groups: HashMap<Vec<u32>, usize> = HashMap::default();
    let mut point_to_group = Vec::with_capacity(data_vec.len());
    let mut members: Vec<Vec<usize>> = vec![];

    for (i, p) in data_vec.iter().enumerate() {
        // -0.0 and 0.0 are the same point
        let key = p
            .data
            .iter()
            .map(|&x| if x == 0.0 { 0 } else { x.to_bits() })
            .collect::<Vec<u32>>();
        let g = *groups.entry(key).or_insert_with(|| {
            members.push(vec![]);
            members.len() - 1
        });
        members[g].push(i);
        point_to_group.push(g);
    }
    (point_to_group, members)
}

#[derive(Clone, Debug)]
/// a wrapper for Vec<f32>
pub struct VecPoint {
    pub data: Vec<f32>,
}

pub trait MakeVecPoint {
    fn to_vp(&self) -> VecPoint;
}

impl<R, C, S> MakeVecPoint for nalgebra::Matrix<f32, R, C, S>
where
    R: nalgebra::Dim,
    C: nalgebra::Dim,
    S: nalgebra::storage::RawStorage<f32, R, C>,
{
    fn to_vp(&self) -> VecPoint {
        VecPoint {
            data: self.iter().cloned().collect(),
        }
    }
}

impl instant_distance::Point for VecPoint {
    fn distance(&self, other: &Self) -> f32 {
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_points() -> DMatrix<f32> {
        // 1-d points at 0, 1, 2, 10, 11
        DMatrix::from_column_slice(5, 1, &[0.0, 1.0, 2.0, 10.0, 11.0])
    }

    #[test]
    fn exact_search_puts_self_first() -> anyhow::Result<()> {
        let dict = ColumnDict::from_rows(&line_points(), NeighbourSearch::Exact);
        let (idx, dist) = dict.search_with_self(1, 3)?;
        assert_eq!(idx[0], 1);
        assert_eq!(dist[0], 0.0);
        // 0 and 2 are equidistant from 1; lower index first
        assert_eq!(idx, vec![1, 0, 2]);
        Ok(())
    }

    #[test]
    fn knn_one_is_self_only() -> anyhow::Result<()> {
        let dict = ColumnDict::from_rows(&line_points(), NeighbourSearch::Exact);
        for i in 0..5 {
            assert_eq!(dict.search_with_self(i, 1)?.0, vec![i]);
        }
        Ok(())
    }

    #[test]
    fn too_many_neighbours() {
        let dict = ColumnDict::from_rows(&line_points(), NeighbourSearch::Exact);
        assert!(dict.search_with_self(0, 6).is_err());
        assert!(dict.search_with_self(0, 0).is_err());
    }

    #[test]
    fn hnsw_agrees_on_separated_points() -> anyhow::Result<()> {
        let dict = ColumnDict::from_rows(&line_points(), NeighbourSearch::Hnsw { ef_search: 10 });
        let (idx, _) = dict.search_with_self(4, 2)?;
        assert_eq!(idx, vec![4, 3]);
        Ok(())
    }

    #[test]
    fn duplicates_are_collapsed_in_order() {
        let xx = DMatrix::from_column_slice(5, 1, &[1.0, -0.0, 1.0, 0.0, 2.0]);
        let points = xx.row_iter().map(|r| r.to_vp()).collect::<Vec<_>>();
        let (group, members) = collapse_duplicates(&points);
        assert_eq!(group, vec![0, 1, 0, 1, 2]);
        assert_eq!(members, vec![vec![0, 2], vec![1, 3], vec![4]]);
    }

    #[test]
    fn hnsw_returns_duplicates_first() -> anyhow::Result<()> {
        let xx = DMatrix::from_column_slice(6, 1, &[3.0, 0.0, 3.0, 3.0, 1.0, 3.0]);
        let dict = ColumnDict::from_rows(&xx, NeighbourSearch::Hnsw { ef_search: 10 });
        let (idx, dist) = dict.search_with_self(3, 5)?;
        assert_eq!(idx, vec![3, 0, 2, 5, 4]);
        assert_eq!(&dist[..4], &[0.0; 4]);
        assert_eq!(dist[4], 2.0);
        Ok(())
    }

    #[test]
    fn tolerance_picks_exact_for_small_inputs() {
        assert_eq!(
            NeighbourSearch::with_tolerance(100, 20, 0.9),
            NeighbourSearch::Exact
        );
        assert_eq!(
            NeighbourSearch::with_tolerance(10_000, 20, 0.0),
            NeighbourSearch::Exact
        );
        match NeighbourSearch::with_tolerance(10_000, 20, 0.5) {
            NeighbourSearch::Hnsw { ef_search } => assert_eq!(ef_search, 60),
            other => panic!("unexpected {:?}", other),
        }
    }
}
