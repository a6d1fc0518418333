use lentil::io::*;
use lentil::*;
use matrix_util::common_io::{read_lines, write_lines};
use matrix_util::traits::IoOps;
use nalgebra::DMatrix;

fn loadings(nn: usize, scale: f32) -> DMatrix<f32> {
    DMatrix::from_fn(nn, 3, |i, j| {
        let base = if i % 3 == j { 4.0 } else { 0.2 };
        scale * (base + ((i * 13 + j * 7) % 10) as f32 * 0.05)
    })
}

#[test]
fn read_align_write() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = |f: &str| -> Box<str> { dir.path().join(f).to_str().unwrap().into() };

    let a_file = path("a.tsv.gz");
    let b_file = path("b.csv");
    loadings(60, 1.0).to_tsv(&a_file)?;
    loadings(45, 2.0).to_csv(&b_file)?;

    let b_barcodes: Vec<Box<str>> = (0..45).map(|i| format!("bc{}", i).into()).collect();
    let b_barcode_file = path("b_barcodes.txt");
    write_lines(&b_barcodes, &b_barcode_file)?;
    let a_barcodes: Vec<Box<str>> = (0..60).map(|i| format!("ac{}", i).into()).collect();
    let a_barcode_file = path("a_barcodes.txt.gz");
    write_lines(&a_barcodes, &a_barcode_file)?;

    let loading_files = vec![a_file, b_file];
    let barcode_files = vec![a_barcode_file, b_barcode_file];

    let mut session = read_session(ReadArgs {
        loading_files: &loading_files,
        barcode_files: Some(&barcode_files),
        names: None,
    })?;

    assert_eq!(session.dataset(0).name(), "a");
    assert_eq!(session.dataset(1).name(), "b");
    assert_eq!(session.dataset(1).loadings().shape(), (45, 3));

    let args = QuantileNormArgs {
        use_knn_refine: false,
        min_cells: 5,
        seed: Some(1),
        ..Default::default()
    };
    quantile_align(&mut session, &args)?;

    let out = path("out/run");
    write_aligned(&session, &out)?;

    let clusters = read_lines(&clusters_file(&out))?;
    assert_eq!(clusters.len(), 1 + 60 + 45);
    assert_eq!(clusters[1].as_ref(), "ac0\ta\t0");
    assert!(clusters[61].starts_with("bc0\tb\t"));

    let h_b = DMatrix::<f32>::from_tsv(&normalized_loadings_file(&out, "b"), None)?;
    assert_eq!(h_b.shape(), (45, 3));
    Ok(())
}

#[test]
fn mismatched_names() {
    let files: Vec<Box<str>> = vec!["x.tsv".into(), "y.tsv".into()];
    let names: Vec<Box<str>> = vec!["x".into()];
    assert!(read_session(ReadArgs {
        loading_files: &files,
        barcode_files: None,
        names: Some(&names),
    })
    .is_err());
}
