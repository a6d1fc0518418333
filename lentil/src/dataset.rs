use crate::lentil_common::*;
use matrix_util::traits::MatOps;

/// One dataset of a session: cell barcodes and their factor loadings
/// (cells x factors)
#[derive(Clone, Debug)]
pub struct Dataset {
    name: Box<str>,
    barcodes: Vec<Box<str>>,
    loadings: Mat,
}

impl Dataset {
    /// * `name` - dataset name, used to pick a reference
    /// * `barcodes` - one identifier per row of `loadings`
    /// * `loadings` - non-negative cells x factors matrix
    pub fn new(name: &str, barcodes: Vec<Box<str>>, loadings: Mat) -> anyhow::Result<Self> {
        if barcodes.len() != loadings.nrows() {
            anyhow::bail!(
                "dataset '{}': {} barcodes for {} cells",
                name,
                barcodes.len(),
                loadings.nrows()
            );
        }
        if loadings.iter().any(|x| !x.is_finite()) {
            anyhow::bail!("dataset '{}': non-finite factor loadings", name);
        }
        Ok(Self {
            name: name.into(),
            barcodes,
            loadings,
        })
    }

    /// Name cells `{name}_{row}`
    pub fn with_default_barcodes(name: &str, loadings: Mat) -> anyhow::Result<Self> {
        let barcodes = (0..loadings.nrows())
            .map(|i| format!("{}_{}", name, i).into_boxed_str())
            .collect();
        Self::new(name, barcodes, loadings)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_cells(&self) -> usize {
        self.loadings.nrows()
    }

    pub fn num_factors(&self) -> usize {
        self.loadings.ncols()
    }

    pub fn barcodes(&self) -> &[Box<str>] {
        &self.barcodes
    }

    pub fn loadings(&self) -> &Mat {
        &self.loadings
    }

    /// Set loadings below `eps` to `eps`
    pub fn clamp_nonnegative(&mut self, eps: f32) {
        self.loadings.clamp_below_inplace(eps);
    }

    /// Overwrite `loadings[cells, factor]` with `values`
    pub(crate) fn write_column_slice(&mut self, cells: &[usize], factor: usize, values: &[f32]) {
        debug_assert_eq!(cells.len(), values.len());
        let mut col = self.loadings.column_mut(factor);
        for (&i, &v) in cells.iter().zip(values) {
            col[i] = v;
        }
    }
}

/// Cluster labels of all cells after alignment, datasets concatenated
/// in session order
#[derive(Clone, Debug)]
pub struct AlignedLabels {
    pub barcodes: Vec<Box<str>>,
    pub clusters: Vec<usize>,
    /// `offsets[k]..offsets[k+1]` are the cells of dataset `k`
    pub offsets: Vec<usize>,
    pub num_clusters: usize,
    /// index of the reference dataset
    pub reference: usize,
    /// base seed of the quantile subsampling
    pub seed: u64,
}

impl AlignedLabels {
    pub fn from_datasets(
        datasets: &[Dataset],
        labels: Vec<Vec<usize>>,
        num_clusters: usize,
        reference: usize,
        seed: u64,
    ) -> Self {
        let mut offsets = vec![0];
        let mut barcodes = vec![];
        for d in datasets {
            barcodes.extend(d.barcodes().iter().cloned());
            offsets.push(barcodes.len());
        }
        let clusters = labels.into_iter().flatten().collect::<Vec<_>>();
        debug_assert_eq!(clusters.len(), barcodes.len());
        Self {
            barcodes,
            clusters,
            offsets,
            num_clusters,
            reference,
            seed,
        }
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Cluster labels of the `k`-th dataset
    pub fn dataset_clusters(&self, k: usize) -> &[usize] {
        &self.clusters[self.offsets[k]..self.offsets[k + 1]]
    }
}

/// Datasets sharing one factorization, plus the last alignment result
#[derive(Clone, Debug, Default)]
pub struct FactorSession {
    datasets: Vec<Dataset>,
    aligned: Option<AlignedLabels>,
}

impl FactorSession {
    pub fn new(datasets: Vec<Dataset>) -> Self {
        Self {
            datasets,
            aligned: None,
        }
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn dataset(&self, k: usize) -> &Dataset {
        &self.datasets[k]
    }

    pub fn num_datasets(&self) -> usize {
        self.datasets.len()
    }

    pub fn num_cells(&self) -> usize {
        self.datasets.iter().map(|d| d.num_cells()).sum()
    }

    pub fn aligned(&self) -> Option<&AlignedLabels> {
        self.aligned.as_ref()
    }

    /// The shared number of factors. Fails if any dataset disagrees
    /// with the first one.
    pub fn num_factors(&self) -> anyhow::Result<usize> {
        let first = self.datasets.first().ok_or(AlignError::EmptySession)?;
        let expected = first.num_factors();
        for d in self.datasets.iter() {
            if d.num_factors() != expected {
                return Err(AlignError::DimensionMismatch {
                    dataset: d.name.clone(),
                    expected,
                    found: d.num_factors(),
                }
                .into());
            }
        }
        Ok(expected)
    }

    pub(crate) fn dataset_mut(&mut self, k: usize) -> &mut Dataset {
        &mut self.datasets[k]
    }

    pub(crate) fn set_aligned(&mut self, aligned: AlignedLabels) -> &AlignedLabels {
        self.aligned.insert(aligned)
    }

    /// Clamp every dataset's loadings at `eps`
    pub fn clamp_nonnegative(&mut self, eps: f32) {
        for d in self.datasets.iter_mut() {
            d.clamp_nonnegative(eps);
        }
    }
}
