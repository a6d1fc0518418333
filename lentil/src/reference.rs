use crate::dataset::Dataset;
use crate::lentil_common::*;

/// Index of the reference dataset: the first one named `explicit_name`
/// if given, otherwise the first dataset with the most cells
pub fn select_reference(datasets: &[Dataset], explicit_name: Option<&str>) -> anyhow::Result<usize> {
    if datasets.is_empty() {
        return Err(AlignError::EmptySession.into());
    }

    match explicit_name {
        Some(name) => datasets
            .iter()
            .position(|d| d.name() == name)
            .ok_or_else(|| AlignError::ReferenceNotFound { name: name.into() }.into()),
        None => {
            let mut best = 0;
            for (k, d) in datasets.iter().enumerate() {
                if d.num_cells() > datasets[best].num_cells() {
                    best = k;
                }
            }
            Ok(best)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datasets(sizes: &[(&str, usize)]) -> Vec<Dataset> {
        sizes
            .iter()
            .map(|&(name, n)| Dataset::with_default_barcodes(name, Mat::zeros(n, 2)).unwrap())
            .collect()
    }

    #[test]
    fn largest_dataset_first_on_ties() -> anyhow::Result<()> {
        let ds = datasets(&[("a", 10), ("b", 30), ("c", 30)]);
        assert_eq!(select_reference(&ds, None)?, 1);
        Ok(())
    }

    #[test]
    fn explicit_name() -> anyhow::Result<()> {
        let ds = datasets(&[("a", 10), ("b", 30), ("a", 5)]);
        assert_eq!(select_reference(&ds, Some("a"))?, 0);

        let err = select_reference(&ds, Some("z")).unwrap_err();
        assert_eq!(
            err.downcast_ref::<AlignError>(),
            Some(&AlignError::ReferenceNotFound { name: "z".into() })
        );
        Ok(())
    }

    #[test]
    fn empty_session() {
        assert!(select_reference(&[], None).is_err());
    }
}
