mod common;

use std::fs;

use transcar_read::{
    decode_initial_condition, FormatVersion, InitParam, RawMatrix, ReaderError, StateParam,
};

use common::{cell, record_words, write_words, NCOL};

#[test]
fn write_reproduces_input_bytes() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let src = dir.path().join("ic.dat");
    let dest = dir.path().join("ic_copy.dat");
    write_words(&src, &record_words(5, NCOL, 13.0, 0.0));

    let ic = decode_initial_condition(&src)?;
    ic.write(&dest)?;
    assert_eq!(fs::read(&src)?, fs::read(&dest)?);

    Ok(())
}

#[test]
fn transconvec13_columns_include_diagnostics() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("ic.dat");
    write_words(&path, &record_words(5, NCOL, 13.0, 0.0));

    let ic = decode_initial_condition(&path)?;
    assert_eq!(ic.header().version(), FormatVersion::Transconvec13);
    assert_eq!(ic.altitudes(), &[100.0, 110.0, 120.0, 130.0, 140.0]);
    assert_eq!(ic.raw().rows(), 5);
    assert_eq!(ic.raw().cols(), NCOL);

    let table = ic.table();
    assert_eq!(table.params.len(), 37);
    assert_eq!(
        table.column(InitParam::State(StateParam::T1t)),
        Some((0..5).map(|r| cell(r, 13)).collect())
    );
    assert_eq!(
        table.column(InitParam::Heat),
        Some((0..5).map(|r| cell(r, 33)).collect())
    );
    assert_eq!(
        table.column(InitParam::Uo1d),
        Some((0..5).map(|r| cell(r, 62)).collect())
    );
    assert_eq!(
        table.column(InitParam::State(StateParam::N7)),
        Some((0..5).map(|r| cell(r, 49)).collect())
    );

    Ok(())
}

#[test]
fn legacy_columns_without_diagnostics() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("ic.dat");
    write_words(&path, &record_words(4, 55, 12.0, 0.0));

    let ic = decode_initial_condition(&path)?;
    assert_eq!(ic.header().version(), FormatVersion::Legacy);
    let table = ic.table();
    assert_eq!(table.params.len(), 34);
    assert_eq!(table.column(InitParam::Po1d), None);
    assert_eq!(
        table.column(InitParam::State(StateParam::T1p)),
        table.column(InitParam::State(StateParam::T1t))
    );
    assert_eq!(
        table.column(InitParam::Heat),
        Some((0..4).map(|r| cell(r, 28)).collect())
    );

    let profile = ic.state_profile();
    assert_eq!(profile.value(2, StateParam::Tmt), Some(cell(2, 15)));
    assert_eq!(profile.value(2, StateParam::N7), Some(cell(2, 49)));
    assert_eq!(ic.isr().rows.len(), 4);

    Ok(())
}

#[test]
fn too_few_columns_is_layout_mismatch() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("ic.dat");
    write_words(&path, &record_words(5, 45, 13.0, 0.0));

    assert!(matches!(
        decode_initial_condition(&path),
        Err(ReaderError::LayoutMismatch(_))
    ));

    Ok(())
}

#[test]
fn short_data_is_truncated_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("ic.dat");
    let mut words = record_words(3, NCOL, 13.0, 0.0);
    // 5行あるものとする
    words[0] = 5.0;
    write_words(&path, &words);

    assert!(matches!(
        decode_initial_condition(&path),
        Err(ReaderError::TruncatedFile(_))
    ));

    Ok(())
}

#[test]
fn huge_altitude_count_is_truncated_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("ic.dat");
    let mut words = record_words(3, NCOL, 13.0, 0.0);
    words[0] = 1.0e12;
    write_words(&path, &words);

    assert!(matches!(
        decode_initial_condition(&path),
        Err(ReaderError::TruncatedFile(_))
    ));

    // 乗算がオーバーフローする高度の数
    words[0] = 1.0e30;
    write_words(&path, &words);
    assert!(matches!(
        decode_initial_condition(&path),
        Err(ReaderError::TruncatedFile(_))
    ));

    Ok(())
}

#[test]
fn replaced_grid_is_written_with_new_altitude_count() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let src = dir.path().join("ic.dat");
    let dest = dir.path().join("ic_regrid.dat");
    write_words(&src, &record_words(5, NCOL, 13.0, 0.0));

    let mut ic = decode_initial_condition(&src)?;
    let values: Vec<f32> = (0..3)
        .flat_map(|r| (0..NCOL).map(move |c| if c == 0 { 90.0 + 25.0 * r as f32 } else { c as f32 }))
        .collect();
    ic.replace_grid(RawMatrix::from_row_major(3, NCOL, values)?)?;
    assert_eq!(ic.header().nx, 3);
    assert_eq!(ic.altitudes(), &[90.0, 115.0, 140.0]);
    ic.write(&dest)?;

    assert_eq!(fs::metadata(&dest)?.len(), ((2 * NCOL + 3 * NCOL) * 4) as u64);
    let written = decode_initial_condition(&dest)?;
    assert_eq!(written.header().nx, 3);
    assert_eq!(written.altitudes(), &[90.0, 115.0, 140.0]);
    assert_eq!(written.raw(), ic.raw());
    assert_eq!(written.header().time, ic.header().time);

    Ok(())
}

#[test]
fn replaced_grid_must_keep_column_count() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("ic.dat");
    write_words(&path, &record_words(5, NCOL, 13.0, 0.0));

    let mut ic = decode_initial_condition(&path)?;
    let raw = RawMatrix::from_row_major(2, 10, vec![0.0; 20])?;
    assert!(matches!(
        ic.replace_grid(raw),
        Err(ReaderError::LayoutMismatch(_))
    ));
    assert_eq!(ic.header().nx, 5);

    Ok(())
}
