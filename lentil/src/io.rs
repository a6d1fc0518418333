use crate::dataset::{Dataset, FactorSession};
use crate::lentil_common::*;

use matrix_util::common_io::{delimiter_of, mkdir, read_lines, write_lines};
use matrix_util::traits::IoOps;
use std::path::Path;

/// Where to find each dataset of a session
pub struct ReadArgs<'a> {
    /// cells x factors loadings, one file per dataset
    pub loading_files: &'a [Box<str>],
    /// one barcode per line, matching the loading rows
    pub barcode_files: Option<&'a [Box<str>]>,
    /// dataset names (default: file names without extensions)
    pub names: Option<&'a [Box<str>]>,
}

/// Read the loadings (and barcodes) of every dataset
pub fn read_session(args: ReadArgs) -> anyhow::Result<FactorSession> {
    let nfiles = args.loading_files.len();
    if nfiles == 0 {
        return Err(AlignError::EmptySession.into());
    }

    if let Some(names) = args.names {
        if names.len() != nfiles {
            anyhow::bail!("{} names for {} loading files", names.len(), nfiles);
        }
    }
    if let Some(barcodes) = args.barcode_files {
        if barcodes.len() != nfiles {
            anyhow::bail!("{} barcode files for {} loading files", barcodes.len(), nfiles);
        }
    }

    let mut datasets = Vec::with_capacity(nfiles);

    for (k, file) in args.loading_files.iter().enumerate() {
        let name = match args.names {
            Some(names) => names[k].clone(),
            None => file_stem(file)?,
        };

        let loadings = Mat::read_file_delim(file, delimiter_of(file), None)?;
        info!(
            "Read '{}': {} cells x {} factors from {}",
            name,
            loadings.nrows(),
            loadings.ncols(),
            file
        );

        let dataset = match args.barcode_files {
            Some(barcode_files) => {
                let barcodes = read_lines(&barcode_files[k])?
                    .into_iter()
                    .map(|line| {
                        line.split_whitespace()
                            .next()
                            .unwrap_or_default()
                            .to_string()
                            .into_boxed_str()
                    })
                    .collect();
                Dataset::new(&name, barcodes, loadings)?
            }
            None => Dataset::with_default_barcodes(&name, loadings)?,
        };

        if dataset.loadings().iter().any(|&x| x < 0.0) {
            warn!("'{}' has negative loadings", name);
        }

        datasets.push(dataset);
    }

    Ok(FactorSession::new(datasets))
}

/// Output files of [`write_aligned`]
pub fn normalized_loadings_file(out: &str, name: &str) -> Box<str> {
    format!("{}.{}.h_norm.tsv.gz", out, name).into_boxed_str()
}

pub fn clusters_file(out: &str) -> Box<str> {
    format!("{}.clusters.tsv.gz", out).into_boxed_str()
}

/// Write the aligned loadings of every dataset and the combined
/// cluster labels (`barcode`, `dataset`, `cluster`)
pub fn write_aligned(session: &FactorSession, out: &str) -> anyhow::Result<()> {
    let aligned = session
        .aligned()
        .ok_or_else(|| anyhow::anyhow!("session has not been aligned"))?;

    mkdir(out)?;

    for d in session.datasets() {
        let file = normalized_loadings_file(out, d.name());
        d.loadings().to_tsv(&file)?;
        info!("Wrote {}", file);
    }

    let mut lines: Vec<Box<str>> = Vec::with_capacity(aligned.len() + 1);
    lines.push("#barcode\tdataset\tcluster".into());
    for (k, d) in session.datasets().iter().enumerate() {
        let clusters = aligned.dataset_clusters(k);
        for (b, c) in d.barcodes().iter().zip(clusters) {
            lines.push(format!("{}\t{}\t{}", b, d.name(), c).into_boxed_str());
        }
    }

    let file = clusters_file(out);
    write_lines(&lines, &file)?;
    info!("Wrote {}", file);
    Ok(())
}

/// File name without directory and (possibly gzipped) extension
fn file_stem(file: &str) -> anyhow::Result<Box<str>> {
    let base = Path::new(file)
        .file_name()
        .and_then(|x| x.to_str())
        .ok_or_else(|| anyhow::anyhow!("no file name in {}", file))?;
    let base = base.strip_suffix(".gz").unwrap_or(base);
    let stem = match base.rfind('.') {
        Some(pos) if pos > 0 => &base[..pos],
        _ => base,
    };
    Ok(stem.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stems() -> anyhow::Result<()> {
        assert_eq!(file_stem("dir/a.tsv.gz")?.as_ref(), "a");
        assert_eq!(file_stem("b.csv")?.as_ref(), "b");
        assert_eq!(file_stem("c")?.as_ref(), "c");
        Ok(())
    }
}
