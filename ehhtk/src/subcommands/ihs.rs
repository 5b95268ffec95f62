use std::io::Write;
use std::path::{Path, PathBuf};

use color_eyre::Result;
use rayon::prelude::*;
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};

use crate::{
    args::StatArgs,
    ehh::{integrate, IntegrationParams},
    gmap::GeneticMap,
    io::{get_output, SiteWriter},
    read_vcf::{open_stream, scan_sequences},
    structs::{Direction, PopulationSummary, SequenceData},
};

/// Sites where either integrated haplotype homozygosity is below this are skipped
pub const MIN_IHH: f64 = 0.0001;

/// One output row of the iHS scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IhsRow {
    pub seqid: String,
    pub pos: u64,
    pub af: f64,
    pub ihh_ref: f64,
    pub ihh_alt: f64,
    pub ihs: f64,
    pub ref_failures: usize,
    pub alt_failures: usize,
}

/// Integrated haplotype homozygosity of one allele over both directions
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct AlleleIhh {
    pub ihh: f64,
    pub failures: usize,
    pub map_misses: usize,
}

pub fn keep_site(summary: &PopulationSummary, cutoff: f64) -> bool {
    summary.af > cutoff && summary.nref >= 2 && summary.nalt >= 2
}

#[doc(hidden)]
pub fn run(args: StatArgs, gen: Option<PathBuf>, threads: usize) -> Result<()> {
    let wtr = SiteWriter::new(get_output(args.output.clone())?);
    scan(&args, gen.as_deref(), threads, &wtr)?;
    wtr.into_inner()?.flush()?;
    Ok(())
}

pub fn scan<W: Write + Send>(
    args: &StatArgs,
    gen: Option<&Path>,
    threads: usize,
    wtr: &SiteWriter<W>,
) -> Result<()> {
    let stream = open_stream(args, &[("target", &args.target)])?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()?;
    tracing::info!("Computing iHS with {} threads", pool.current_num_threads());

    scan_sequences(
        stream,
        args.encoding.into(),
        &args.target,
        |summary| keep_site(summary, args.af),
        |data| {
            let gmap = GeneticMap::for_sequence(gen, &data.seqid, &data.positions)?;
            scan_sequence(data, &gmap, &pool, wtr)
        },
    )?;

    Ok(())
}

/// Score every retained site of a sequence on the pool, rows are written as workers finish
pub fn scan_sequence<W: Write + Send>(
    data: &SequenceData,
    gmap: &GeneticMap,
    pool: &ThreadPool,
    wtr: &SiteWriter<W>,
) -> Result<()> {
    tracing::info!("Scanning {} sites on {}", data.nsites(), data.seqid);

    let (rows, failed, map_misses) = pool.install(|| {
        (0..data.nsites())
            .into_par_iter()
            .with_max_len(1)
            .map(|focal| -> Result<(usize, usize, usize)> {
                let Some((row, misses)) = ihs_at(data, gmap, focal)? else {
                    return Ok((0, 0, 0));
                };
                let failed = usize::from(row.ref_failures + row.alt_failures > 0);
                wtr.write_row(row)?;
                Ok((1, failed, misses))
            })
            .try_reduce(|| (0, 0, 0), |a, b| Ok((a.0 + b.0, a.1 + b.1, a.2 + b.2)))
    })?;

    tracing::info!("Wrote {rows} iHS rows for {}", data.seqid);
    if failed > 0 {
        tracing::warn!("{failed} sites on {} hit a boundary or a gap before EHH decayed", data.seqid);
    }
    if map_misses > 0 {
        tracing::warn!(
            "The genetic map did not cover {map_misses} integration steps on {}, used the default distance",
            data.seqid
        );
    }

    Ok(())
}

/// Integrate both directions for the haplotypes carrying `allele` at `focal`
pub fn allele_ihh(
    data: &SequenceData,
    gmap: &GeneticMap,
    focal: usize,
    allele: u8,
) -> Result<AlleleIhh> {
    let params = IntegrationParams::ihs();
    let mut result = AlleleIhh::default();

    for direction in [Direction::Right, Direction::Left] {
        let integral = integrate(
            &data.haplotypes,
            &data.positions,
            gmap,
            focal,
            allele,
            direction,
            &params,
            |_| Ok(()),
        )?;
        result.ihh += integral.area;
        result.failures += integral.outcome.failures();
        result.map_misses += integral.map_misses;
    }

    Ok(result)
}

/// iHS of a single site, `None` when either allele barely integrates
pub fn ihs_at(
    data: &SequenceData,
    gmap: &GeneticMap,
    focal: usize,
) -> Result<Option<(IhsRow, usize)>> {
    let reference = allele_ihh(data, gmap, focal, b'0')?;
    let alt = allele_ihh(data, gmap, focal, b'1')?;

    if reference.ihh < MIN_IHH || alt.ihh < MIN_IHH {
        tracing::trace!(
            "Skipping {}:{} with iHH {} / {}",
            data.seqid,
            data.positions[focal],
            reference.ihh,
            alt.ihh
        );
        return Ok(None);
    }

    let row = IhsRow {
        seqid: data.seqid.clone(),
        pos: data.positions[focal],
        af: data.afs[focal],
        ihh_ref: reference.ihh,
        ihh_alt: alt.ihh,
        ihs: (alt.ihh / reference.ihh).ln(),
        ref_failures: reference.failures,
        alt_failures: alt.failures,
    };

    Ok(Some((row, reference.map_misses + alt.map_misses)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::haplotypes::HaplotypeMatrix;

    fn sequence(copies: &[(&str, &str)]) -> SequenceData {
        let haplotypes = HaplotypeMatrix::from_strings(copies).unwrap();
        let nsites = haplotypes.nsites();
        SequenceData {
            seqid: "chr1".to_string(),
            positions: (1..=nsites as u64).map(|i| i * 100).collect(),
            afs: vec![0.5; nsites],
            haplotypes,
        }
    }

    #[test]
    fn site_filter() {
        let summary = |af, nref, nalt| PopulationSummary { af, nref, nalt };
        assert!(keep_site(&summary(0.5, 2, 2), 0.05));
        assert!(!keep_site(&summary(0.05, 2, 2), 0.05));
        assert!(!keep_site(&summary(0.5, 1, 2), 0.05));
        assert!(!keep_site(&summary(0.5, 2, 1), 0.05));
    }

    #[test]
    fn extended_alt_haplotype_has_positive_score() {
        // Alt carriers share the whole sequence, ref carriers diverge within two sites
        let data = sequence(&[
            ("00000", "01110"),
            ("10001", "01110"),
            ("01010", "11011"),
        ]);
        let gmap = GeneticMap::absent();

        let (row, misses) = ihs_at(&data, &gmap, 2).unwrap().unwrap();
        assert_eq!(misses, 0);
        assert!(row.ihh_alt > row.ihh_ref);
        assert!(row.ihs > 0.0);
        assert_eq!(row.alt_failures, 2);
        assert_eq!(row.pos, 300);
    }

    #[test]
    fn degenerate_sites_are_skipped() {
        // Both ref carriers differ from each other right next to the focal site
        let data = sequence(&[("000", "111"), ("101", "111"), ("111", "111")]);
        let gmap = GeneticMap::absent();
        assert_eq!(ihs_at(&data, &gmap, 1).unwrap(), None);
    }

    #[test]
    fn rows_are_independent_of_thread_count() {
        let data = sequence(&[
            ("00000", "01110"),
            ("10001", "01110"),
            ("01010", "11011"),
        ]);
        let gmap = GeneticMap::absent();

        let mut outputs = vec![];
        for threads in [1, 4] {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build().unwrap();
            let wtr = SiteWriter::new(vec![]);
            scan_sequence(&data, &gmap, &pool, &wtr).unwrap();
            let out = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
            let mut lines = out.lines().map(str::to_string).collect::<Vec<_>>();
            lines.sort();
            outputs.push(lines);
        }

        assert!(!outputs[0].is_empty());
        assert_eq!(outputs[0], outputs[1]);
    }
}
