//! Integration tests for the log-ratio transforms and pipeline.

use approx::assert_relative_eq;
use geochem_coda::prelude::*;
use nalgebra::DMatrix;
use std::io::Write;
use tempfile::NamedTempFile;

const MAJORS: [&str; 5] = ["SiO2", "Al2O3", "FeO", "MgO", "CaO"];

/// Random strictly positive compositions, rows closed to 1.
fn random_compositions(n_rows: usize, n_parts: usize, seed: u64) -> DMatrix<f64> {
    let mut rng_seed = seed;
    let mut simple_rand = || -> f64 {
        rng_seed = rng_seed.wrapping_mul(1103515245).wrapping_add(12345);
        ((rng_seed >> 16) & 0x7FFF) as f64 / 32768.0
    };
    let raw = DMatrix::from_fn(n_rows, n_parts, |_, _| 0.05 + simple_rand());
    close(&raw)
}

fn majors_table() -> CompositionTable {
    let data = random_compositions(12, MAJORS.len(), 7) * 100.0;
    let columns = MAJORS.iter().map(|c| c.to_string()).collect();
    let index = (0..12).map(|i| format!("sample_{}", i)).collect();
    CompositionTable::new(data, columns, index).unwrap()
}

fn assert_matrix_eq(a: &DMatrix<f64>, b: &DMatrix<f64>, epsilon: f64) {
    assert_eq!(a.shape(), b.shape());
    for (x, y) in a.iter().zip(b.iter()) {
        assert_relative_eq!(*x, *y, epsilon = epsilon);
    }
}

#[test]
fn test_closure_sums_to_one() {
    let x = random_compositions(20, 6, 1) * 37.5;
    let closed = close(&x);
    for row in closed.row_iter() {
        assert_relative_eq!(row.sum(), 1.0, epsilon = 1e-12);
    }
}

#[test]
fn test_close_and_alr_on_small_table() {
    let x = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let closed = close(&x);
    assert_relative_eq!(closed[(0, 0)], 1.0 / 6.0, epsilon = 1e-12);
    assert_relative_eq!(closed[(1, 2)], 6.0 / 15.0, epsilon = 1e-12);

    let y = alr(&x, -1, false).unwrap();
    assert_relative_eq!(y[(0, 0)], (1.0f64 / 3.0).ln(), epsilon = 1e-12);
    assert_relative_eq!(y[(0, 1)], (2.0f64 / 3.0).ln(), epsilon = 1e-12);
    assert_relative_eq!(y[(1, 0)], (4.0f64 / 6.0).ln(), epsilon = 1e-12);
    assert_relative_eq!(y[(1, 1)], (5.0f64 / 6.0).ln(), epsilon = 1e-12);

    assert_matrix_eq(&inverse_alr(&y, -1, false).unwrap(), &closed, 1e-12);
}

#[test]
fn test_alr_roundtrip_every_index() {
    let x = random_compositions(15, 5, 11);
    for null_col in [false, true] {
        for ind in -5isize..5 {
            let y = alr(&x, ind, null_col).unwrap();
            let expected_width = if null_col { 5 } else { 4 };
            assert_eq!(y.ncols(), expected_width);

            let recovered = inverse_alr(&y, ind, null_col).unwrap();
            assert_matrix_eq(&recovered, &x, 1e-10);
        }
    }
}

#[test]
fn test_clr_roundtrip_and_zero_row_sums() {
    let x = random_compositions(15, 4, 23);
    let y = clr(&x).unwrap();
    for row in y.row_iter() {
        assert_relative_eq!(row.sum(), 0.0, epsilon = 1e-10);
    }
    assert_matrix_eq(&inverse_clr(&y), &x, 1e-10);
}

#[test]
fn test_ilr_roundtrip_across_widths() {
    for d in 2..=8 {
        let x = random_compositions(10, d, 100 + d as u64);
        let y = ilr(&x).unwrap();
        assert_eq!(y.ncols(), d - 1);
        assert_matrix_eq(&inverse_ilr(&y, None).unwrap(), &x, 1e-10);
        assert_matrix_eq(&inverse_ilr(&y, Some(&x)).unwrap(), &x, 1e-10);
    }
}

#[test]
fn test_default_basis_is_orthonormal() {
    for d in 2..=25 {
        let basis = orthogonal_basis_default(d).unwrap();
        assert_eq!(basis.shape(), (d - 1, d));
        check_orthonormal(&basis).unwrap();
    }
}

#[test]
fn test_renormalise_sub_composition() {
    let table = majors_table();
    let renormed = table.renormalise(&["SiO2", "MgO", "Missing"], 100.0);

    for row in 0..renormed.n_rows() {
        let si = renormed.get(row, 0);
        let mg = renormed.get(row, 3);
        assert_relative_eq!(si + mg, 100.0, epsilon = 1e-10);
        // Parts outside the sub-composition are untouched
        assert_relative_eq!(renormed.get(row, 1), table.get(row, 1), epsilon = 1e-12);
    }
}

#[test]
fn test_renormalise_all_columns_to_hundred() {
    let table = majors_table().renormalise::<&str>(&[], 1.0);
    let renormed = table.renormalise::<&str>(&[], 100.0);
    for row in 0..renormed.n_rows() {
        let total: f64 = renormed.row(row).iter().sum();
        assert_relative_eq!(total, 100.0, epsilon = 1e-10);
    }
}

#[test]
fn test_boxcox_fixed_lambda_roundtrip() {
    let x = random_compositions(30, 3, 5) * 100.0;
    let result = boxcox(&x, &BoxCoxConfig::with_lambda(2.0)).unwrap();
    assert_relative_eq!(result.lambda, 2.0);
    assert_matrix_eq(&result.inverse(), &x, 1e-9);
}

#[test]
fn test_boxcox_search_returns_grid_point() {
    let x = random_compositions(30, 3, 9) * 100.0;
    let config = BoxCoxConfig::search(-1.0, 5.0, 61);
    let result = boxcox(&x, &config).unwrap();
    let on_grid = ((result.lambda + 1.0) / 0.1).round() * 0.1 - 1.0;
    assert_relative_eq!(result.lambda, on_grid, epsilon = 1e-9);
    assert_matrix_eq(&inverse_boxcox(&result.data, result.lambda), &x, 1e-8);
}

#[test]
fn test_labeled_roundtrips_restore_columns() {
    let table = majors_table();
    let closed = table.close();

    let transforms = [
        table.alr(&AlrReference::Column("MgO".to_string()), false).unwrap(),
        table.alr(&AlrReference::Index(-2), true).unwrap(),
        table.clr().unwrap(),
        table.ilr().unwrap(),
    ];

    for transformed in &transforms {
        assert_eq!(transformed.index, table.index().to_vec());
        let recovered = transformed.invert().unwrap();
        assert_eq!(recovered.columns(), table.columns());
        assert_eq!(recovered.index(), table.index());
        assert_matrix_eq(recovered.data(), closed.data(), 1e-10);
    }

    assert_eq!(transforms[0].columns[0], "SiO2/MgO");
    assert_eq!(transforms[3].columns, vec!["ILR1", "ILR2", "ILR3", "ILR4"]);
}

#[test]
fn test_logratiomean_of_identical_rows() {
    let row = [55.0, 15.0, 10.0, 12.0, 8.0];
    let values: Vec<f64> = row.iter().cycle().take(5 * 6).copied().collect();
    let table = CompositionTable::from_row_slice(&MAJORS, 6, &values).unwrap();

    for kind in [
        LogRatioKind::Clr,
        LogRatioKind::Ilr,
        LogRatioKind::Alr {
            ind: 2,
            null_col: false,
        },
    ] {
        let mean = table.logratiomean(&kind).unwrap();
        for (j, (name, value)) in mean.iter().enumerate() {
            assert_eq!(name, MAJORS[j]);
            assert_relative_eq!(value, row[j] / 100.0, epsilon = 1e-12);
        }
    }
}

#[test]
fn test_tsv_roundtrip_with_missing_values() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "sample\tSiO2\tMgO\tCaO").unwrap();
    writeln!(file, "a\t50.0\t30.0\t20.0").unwrap();
    writeln!(file, "b\t60.0\t\t40.0").unwrap();
    file.flush().unwrap();

    let table = CompositionTable::from_tsv(file.path()).unwrap();
    assert_eq!(table.index_name(), "sample");
    assert_eq!(table.n_rows(), 2);
    assert!(table.get(1, 1).is_nan());

    let out = NamedTempFile::new().unwrap();
    table.to_tsv(out.path()).unwrap();
    let reloaded = CompositionTable::from_tsv(out.path()).unwrap();
    assert_eq!(reloaded.columns(), table.columns());
    assert_relative_eq!(reloaded.get(0, 0), 50.0);
    assert!(reloaded.get(1, 1).is_nan());

    // Renormalisation skips the missing part, plain closure propagates it
    let renormed = reloaded.renormalise::<&str>(&[], 1.0);
    assert_relative_eq!(renormed.get(1, 0), 0.6, epsilon = 1e-12);
    assert!(reloaded.close().get(1, 0).is_nan());
}

#[test]
fn test_pipeline_from_yaml() {
    let yaml = r#"
name: majors-ilr
description: Renormalise then round-trip through ILR
steps:
  - !Renormalise
    components: [SiO2, Al2O3, FeO, MgO, CaO]
    scale: 100.0
  - Ilr
  - Invert
"#;
    let config = PipelineConfig::from_yaml(yaml).unwrap();
    let pipeline = Pipeline::from_config(&config);
    assert_eq!(pipeline.steps().len(), 3);

    let table = majors_table();
    let output = pipeline.run(&table).unwrap();
    let recovered = output.as_composition().unwrap();
    assert_eq!(recovered.columns(), table.columns());
    assert_matrix_eq(recovered.data(), table.close().data(), 1e-10);

    let out = NamedTempFile::new().unwrap();
    output.to_tsv(out.path()).unwrap();
    let reloaded = CompositionTable::from_tsv(out.path()).unwrap();
    assert_eq!(reloaded.index(), table.index());
}

#[test]
fn test_pipeline_config_roundtrip_through_yaml() {
    let pipeline = Pipeline::new()
        .name("boxcox")
        .close()
        .boxcox(&BoxCoxConfig::with_lambda(0.5))
        .invert();
    let yaml = pipeline.to_config(None).to_yaml().unwrap();
    let parsed = PipelineConfig::from_yaml(&yaml).unwrap();
    assert_eq!(Pipeline::from_config(&parsed).steps(), pipeline.steps());
}

#[test]
fn test_pipeline_rejects_transform_on_transformed_data() {
    let result = Pipeline::new().clr().ilr().run(&majors_table());
    assert!(matches!(result, Err(CodaError::Pipeline(_))));
}
