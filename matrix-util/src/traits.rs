use crate::common_io::Delimiter;

/// Column-wise location/scale operations
pub trait MatOps {
    type Mat;
    type Scalar;

    /// Column means and sample standard deviations (`n - 1`
    /// denominator). A column with fewer than two rows reports zero
    /// deviation.
    fn column_mean_sd(&self) -> (Vec<Self::Scalar>, Vec<Self::Scalar>);

    /// `(x - mu[j]) / sig[j]` for each column `j`, given statistics
    /// from [`MatOps::column_mean_sd`]; a column without positive
    /// deviation is only centred
    fn scale_columns_with(&self, mu: &[Self::Scalar], sig: &[Self::Scalar]) -> Self::Mat;

    /// Replace values below `eps` with `eps`
    fn clamp_below_inplace(&mut self, eps: Self::Scalar);
}

/// Read and write matrices from and to files
pub trait IoOps {
    type Scalar;
    type Mat;

    fn read_file_delim(
        file: &str,
        delim: impl Into<Delimiter>,
        skip: Option<usize>,
    ) -> anyhow::Result<Self::Mat>;

    fn from_tsv(tsv_file: &str, skip: Option<usize>) -> anyhow::Result<Self::Mat> {
        Self::read_file_delim(tsv_file, "\t", skip)
    }

    fn write_file_delim(&self, file: &str, delim: &str) -> anyhow::Result<()>;

    fn to_tsv(&self, tsv_file: &str) -> anyhow::Result<()> {
        self.write_file_delim(tsv_file, "\t")
    }

    fn to_csv(&self, csv_file: &str) -> anyhow::Result<()> {
        self.write_file_delim(csv_file, ",")
    }
}
