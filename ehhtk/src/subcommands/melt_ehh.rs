use std::io::Write;
use std::path::{Path, PathBuf};

use color_eyre::Result;

use crate::{
    args::StatArgs,
    ehh::{integrate, EhhStep, Integral, IntegrationParams},
    gmap::GeneticMap,
    io::{get_output, SiteWriter},
    read_vcf::{open_stream, scan_sequences},
    structs::{Direction, SequenceData},
    subcommands::ihs::keep_site,
};

#[doc(hidden)]
pub fn run(args: StatArgs, gen: Option<PathBuf>, pos: u64) -> Result<()> {
    let wtr = SiteWriter::new(get_output(args.output.clone())?);
    scan(&args, gen.as_deref(), pos, &wtr)?;
    wtr.into_inner()?.flush()?;
    Ok(())
}

/// Write the EHH curves around `pos`. Returns the integrals in the order ref right, ref left,
/// alt right, alt left, or `None` if `pos` is not a retained site.
pub fn scan<W: Write>(
    args: &StatArgs,
    gen: Option<&Path>,
    pos: u64,
    wtr: &SiteWriter<W>,
) -> Result<Option<Vec<Integral>>> {
    let stream = open_stream(args, &[("target", &args.target)])?;

    let mut integrals = None;
    scan_sequences(
        stream,
        args.encoding.into(),
        &args.target,
        |summary| keep_site(summary, args.af),
        |data| {
            let Some(focal) = data.idx_by_pos(pos) else {
                return Ok(());
            };
            if integrals.is_some() {
                tracing::warn!("Position {pos} was already melted, skipping it on {}", data.seqid);
                return Ok(());
            }

            let gmap = GeneticMap::for_sequence(gen, &data.seqid, &data.positions)?;
            integrals = Some(melt(data, &gmap, focal, wtr)?);
            Ok(())
        },
    )?;

    if integrals.is_none() {
        tracing::warn!("Position {pos} is not among the retained sites");
    }

    Ok(integrals)
}

/// Write the anchor row and every extension step of the four integrations at `focal`
pub fn melt<W: Write>(
    data: &SequenceData,
    gmap: &GeneticMap,
    focal: usize,
    wtr: &SiteWriter<W>,
) -> Result<Vec<Integral>> {
    let params = IntegrationParams::melt();
    wtr.write_row((data.positions[focal], 1, 0, 0))?;

    let mut integrals = vec![];
    for allele in [b'0', b'1'] {
        let mut ihh = 0.0;
        for direction in [Direction::Right, Direction::Left] {
            let integral = integrate(
                &data.haplotypes,
                &data.positions,
                gmap,
                focal,
                allele,
                direction,
                &params,
                |step: EhhStep| {
                    wtr.write_row((
                        step.pos,
                        step.ehh,
                        step.allele - b'0',
                        u8::from(step.direction.is_right()),
                    ))
                },
            )?;
            tracing::debug!(
                "{} allele {} {direction}: {:?} after area {}",
                data.positions[focal],
                allele as char,
                integral.outcome,
                integral.area
            );
            ihh += integral.area;
            integrals.push(integral);
        }
        tracing::info!("iHH of allele {} at {}: {ihh}", allele as char, data.positions[focal]);
    }

    Ok(integrals)
}
