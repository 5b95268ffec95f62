use std::io::{Read, Write};
use std::path::PathBuf;

use color_eyre::{
    eyre::{ensure, WrapErr},
    Result,
};
use serde::{Deserialize, Serialize};

use crate::{
    io::{get_input, get_output, get_tsv_reader, SiteWriter},
    stats::standardize,
    subcommands::ihs::IhsRow,
};

pub const DEFAULT_AF_DIFF: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedIhsRow {
    pub seqid: String,
    pub pos: u64,
    pub af: f64,
    pub ihh_ref: f64,
    pub ihh_alt: f64,
    pub ihs: f64,
    pub normalized_ihs: f64,
    pub ref_failures: usize,
    pub alt_failures: usize,
}

impl NormalizedIhsRow {
    fn new(row: IhsRow, normalized_ihs: f64) -> Self {
        Self {
            seqid: row.seqid,
            pos: row.pos,
            af: row.af,
            ihh_ref: row.ihh_ref,
            ihh_alt: row.ihh_alt,
            ihs: row.ihs,
            normalized_ihs,
            ref_failures: row.ref_failures,
            alt_failures: row.alt_failures,
        }
    }
}

#[doc(hidden)]
pub fn run(file: PathBuf, af_diff: f64, output: Option<PathBuf>) -> Result<()> {
    let rows = read_ihs(get_input(Some(file.clone()))?).wrap_err(format!("Failed to read {file:?}"))?;
    tracing::info!("Read {} iHS rows from {file:?}", rows.len());

    let wtr = SiteWriter::new(get_output(output)?);
    for row in normalize(rows, af_diff)? {
        wtr.write_row(row)?;
    }
    wtr.into_inner()?.flush()?;

    Ok(())
}

pub fn read_ihs<R: Read>(input: R) -> Result<Vec<IhsRow>> {
    let mut rdr = get_tsv_reader(input, false);
    let rows = rdr.deserialize().collect::<Result<Vec<IhsRow>, _>>()?;
    Ok(rows)
}

/// Standardize iHS within windows of similar allele frequency.
///
/// Rows are sorted by allele frequency and a window collects the rows whose frequency differs
/// from the first row of the window by less than `af_diff`.
pub fn normalize(mut rows: Vec<IhsRow>, af_diff: f64) -> Result<Vec<NormalizedIhsRow>> {
    ensure!(af_diff > 0.0, "The allele frequency window must be positive, got {af_diff}");

    rows.sort_by(|a, b| a.af.total_cmp(&b.af));

    let mut normalized = Vec::with_capacity(rows.len());
    let mut rows = rows.into_iter().peekable();

    while let Some(first) = rows.next() {
        let start = first.af;
        let mut window = vec![first];
        while let Some(row) = rows.next_if(|row| (row.af - start).abs() < af_diff) {
            window.push(row);
        }

        tracing::debug!("Window at allele frequency {start} has {} rows", window.len());
        if window.len() < 2 {
            tracing::warn!("Only one site with allele frequency {start}, its score is undefined");
        }

        let scores = standardize(&window.iter().map(|row| row.ihs).collect::<Vec<f64>>());
        normalized.extend(
            window
                .into_iter()
                .zip(scores)
                .map(|(row, score)| NormalizedIhsRow::new(row, score)),
        );
    }

    Ok(normalized)
}
