use std::collections::HashSet;

use color_eyre::eyre::{ensure, eyre, OptionExt, WrapErr};
use color_eyre::Result;

use crate::error::EhhError::{
    CoordsParseError, GroupTooSmallError, OverlappingGroupsError, PosParseError, SampleIndexError,
};

/// Smallest number of individuals in a target or background group
pub const MIN_GROUP_SIZE: usize = 2;

// Coords are in the format [contig] or [contig]:[start]-[stop]
pub fn parse_coords(coords: &str) -> Result<(&str, Option<u64>, Option<u64>)> {
    let mut coord_split = coords.split(':');

    let contig = coord_split
        .next()
        .filter(|contig| !contig.is_empty())
        .ok_or_eyre(CoordsParseError(coords.into()))?;

    let Some(positions) = coord_split.next() else {
        return Ok((contig, None, None));
    };

    let mut pos_split = positions.split('-');
    let (start, stop) = (pos_split.next(), pos_split.next());

    if let (Some(start), Some(stop), None) = (start, stop, pos_split.next()) {
        let start = start
            .parse::<u64>()
            .wrap_err(eyre!(PosParseError((coords.into(), start.into()))))?;
        let stop = stop
            .parse::<u64>()
            .wrap_err(eyre!(PosParseError((coords.into(), stop.into()))))?;

        ensure!(start <= stop, CoordsParseError(coords.into()));

        Ok((contig, Some(start), Some(stop)))
    } else {
        Err(eyre!(CoordsParseError(coords.into())))
    }
}

/// Check a group of VCF sample indices against the number of samples in the file
pub fn check_group(group: &'static str, indices: &[usize], nsamples: usize) -> Result<()> {
    ensure!(
        indices.len() >= MIN_GROUP_SIZE,
        GroupTooSmallError {
            group,
            size: indices.len(),
            min: MIN_GROUP_SIZE,
        }
    );

    if let Some(idx) = indices.iter().find(|idx| **idx >= nsamples) {
        return Err(eyre!(SampleIndexError((*idx, nsamples))));
    }

    let mut seen = HashSet::new();
    if let Some(idx) = indices.iter().find(|idx| !seen.insert(**idx)) {
        return Err(eyre!("Sample index {idx} is listed twice in the {group} group"));
    }

    Ok(())
}

/// Ensure that no individual is in both groups
pub fn check_disjoint(target: &[usize], background: &[usize]) -> Result<()> {
    let target = target.iter().collect::<HashSet<_>>();
    match background.iter().find(|idx| target.contains(idx)) {
        Some(idx) => Err(eyre!(OverlappingGroupsError(*idx))),
        None => Ok(()),
    }
}
