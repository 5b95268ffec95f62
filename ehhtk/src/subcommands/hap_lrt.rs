use std::io::Write;

use color_eyre::Result;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::{
    args::StatArgs,
    io::{get_output, SiteWriter},
    read_vcf::{open_stream, scan_sequences},
    stats::{chi_square_sf, exponential_lrt},
    structs::{PopulationSummary, SequenceData},
    utils::check_disjoint,
};

/// Sequences with at most this many retained sites are not scored
pub const MIN_SITES: usize = 10;

/// Degrees of freedom of the likelihood ratio test
pub const LRT_DF: f64 = 2.0;

// Rounding noise around zero for groups with identical block lengths
const LRT_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HapLrtRow {
    pub seqid: String,
    pub pos: u64,
    pub target_mean: f64,
    pub background_mean: f64,
    pub p: f64,
    pub sign: i8,
}

pub fn keep_site(summary: &PopulationSummary, cutoff: f64) -> bool {
    summary.af >= cutoff && summary.af <= 1.0 - cutoff
}

#[doc(hidden)]
pub fn run(args: StatArgs, background: Vec<usize>) -> Result<()> {
    let wtr = SiteWriter::new(get_output(args.output.clone())?);
    scan(&args, &background, &wtr)?;
    wtr.into_inner()?.flush()?;
    Ok(())
}

pub fn scan<W: Write>(args: &StatArgs, background: &[usize], wtr: &SiteWriter<W>) -> Result<()> {
    check_disjoint(&args.target, background)?;
    let stream = open_stream(args, &[("target", &args.target), ("background", background)])?;

    let samples = args
        .target
        .iter()
        .chain(background)
        .copied()
        .sorted()
        .collect::<Vec<usize>>();

    // Matrix rows of both groups
    let rows = |group: &[usize]| -> Vec<usize> {
        group
            .iter()
            .filter_map(|idx| samples.iter().position(|s| s == idx))
            .collect()
    };
    let (target_rows, background_rows) = (rows(&args.target), rows(background));

    scan_sequences(
        stream,
        args.encoding.into(),
        &samples,
        |summary| keep_site(summary, args.af),
        |data| {
            if data.nsites() <= MIN_SITES {
                tracing::warn!(
                    "Skipping {} with {} retained sites, at least {} are required",
                    data.seqid,
                    data.nsites(),
                    MIN_SITES + 1
                );
                return Ok(());
            }

            tracing::info!("Scanning {} sites on {}", data.nsites(), data.seqid);
            let mut nrows = 0;
            for focal in 0..data.nsites() {
                if let Some(row) = hap_lrt_at(data, &target_rows, &background_rows, focal)? {
                    wtr.write_row(row)?;
                    nrows += 1;
                }
            }
            tracing::info!("Wrote {nrows} hapLRT rows for {}", data.seqid);

            Ok(())
        },
    )?;

    Ok(())
}

/// Number of sites two haplotypes share around `focal`, 0 if they differ at `focal`
pub fn shared_block(a: &[u8], b: &[u8], focal: usize) -> usize {
    if a[focal] != b[focal] {
        return 0;
    }

    let right = a[focal + 1..]
        .iter()
        .zip(&b[focal + 1..])
        .take_while(|(x, y)| x == y)
        .count();
    let left = a[..focal]
        .iter()
        .rev()
        .zip(b[..focal].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();

    1 + left + right
}

/// For every haplotype of the group, the longest block it shares with another one of the group
pub fn longest_blocks(haplotypes: &[&[u8]], focal: usize) -> Vec<f64> {
    haplotypes
        .iter()
        .enumerate()
        .map(|(i, a)| {
            haplotypes
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, b)| shared_block(a, b, focal))
                .max()
                .unwrap_or(0) as f64
        })
        .collect()
}

fn group_haplotypes<'a>(data: &'a SequenceData, rows: &[usize]) -> Vec<&'a [u8]> {
    let first = rows.iter().map(|row| data.haplotypes.sample(*row).0);
    let second = rows.iter().map(|row| data.haplotypes.sample(*row).1);
    first.chain(second).collect()
}

pub fn hap_lrt_at(
    data: &SequenceData,
    target_rows: &[usize],
    background_rows: &[usize],
    focal: usize,
) -> Result<Option<HapLrtRow>> {
    let target = longest_blocks(&group_haplotypes(data, target_rows), focal);
    let background = longest_blocks(&group_haplotypes(data, background_rows), focal);

    let l = exponential_lrt(&target, &background);
    if !l.is_finite() || l < -LRT_TOLERANCE {
        tracing::trace!("Skipping {}:{} with statistic {l}", data.seqid, data.positions[focal]);
        return Ok(None);
    }

    let (target_mean, background_mean) = (target.iter().mean(), background.iter().mean());
    let sign = if target_mean > background_mean { 1 } else { -1 };

    Ok(Some(HapLrtRow {
        seqid: data.seqid.clone(),
        pos: data.positions[focal],
        target_mean,
        background_mean,
        p: chi_square_sf(l.max(0.0), LRT_DF)?,
        sign,
    }))
}
