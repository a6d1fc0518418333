use crate::common_io::{read_lines_of_types, write_lines, Delimiter};
use crate::traits::*;
pub use nalgebra::{DMatrix, DVector};

use std::fmt::Display;
use std::str::FromStr;

impl<T> IoOps for DMatrix<T>
where
    T: nalgebra::Scalar + Send + FromStr + Display + Copy,
    <T as FromStr>::Err: Display,
{
    type Scalar = T;
    type Mat = Self;

    fn read_file_delim(
        tsv_file: &str,
        delim: impl Into<Delimiter>,
        skip: Option<usize>,
    ) -> anyhow::Result<Self::Mat> {
        let hdr_line = match skip {
            Some(skip) => skip as i64,
            None => -1, // no skipping
        };

        let data = read_lines_of_types::<T>(tsv_file, delim, hdr_line)?.lines;

        if data.is_empty() {
            return Err(anyhow::anyhow!("No data in file {}", tsv_file));
        }

        let ncols = data[0].len();
        let nrows = data.len();

        if let Some(i) = data.iter().position(|row| row.len() != ncols) {
            anyhow::bail!(
                "{}: line {} has {} fields, expected {}",
                tsv_file,
                i + 1,
                data[i].len(),
                ncols
            );
        }

        let data = data.into_iter().flatten().collect::<Vec<_>>();

        Ok(DMatrix::<T>::from_row_iterator(nrows, ncols, data))
    }

    fn write_file_delim(&self, tsv_file: &str, delim: &str) -> anyhow::Result<()> {
        // par_iter() or par_bridge() will
        // mess up the order of the rows
        let lines = self
            .row_iter()
            .map(|row| {
                row.iter()
                    .map(|x| format!("{}", *x))
                    .collect::<Vec<String>>()
                    .join(delim)
                    .into_boxed_str()
            })
            .collect::<Vec<_>>();

        write_lines(&lines, tsv_file)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ragged_rows_are_rejected() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("ragged.tsv");
        let file = file.to_str().unwrap();

        let lines: Vec<Box<str>> = vec!["1\t2\t3".into(), "4\t5".into()];
        write_lines(&lines, file)?;

        assert!(DMatrix::<f32>::from_tsv(file, None).is_err());
        Ok(())
    }

    #[test]
    fn corrupt_file_is_not_truncated() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("corrupt.tsv");
        std::fs::write(&file, b"1\t2\n3\t4\n5\t\xff\n7\t8\n9\t10\n")?;
        let file = file.to_str().unwrap();

        assert!(DMatrix::<f32>::from_tsv(file, None).is_err());
        Ok(())
    }
}
