use std::path::Path;

use color_eyre::{
    eyre::{ensure, eyre, WrapErr},
    Result,
};

use crate::{
    error::EhhError::{EmptyGeneticMapError, MapOrderError},
    io::{get_input, get_tsv_reader},
};

/// Genetic distance used whenever the map is absent or does not cover a position
pub const DEFAULT_CM: f64 = 0.001;

/// Physical position to cumulative centimorgan map of one sequence.
///
/// Values between the known points are interpolated linearly. An absent map answers every
/// distance query with [`DEFAULT_CM`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct GeneticMap {
    points: Vec<(u64, f64)>,
}

impl GeneticMap {
    /// A map without data, every distance is [`DEFAULT_CM`]
    pub fn absent() -> Self {
        Self { points: vec![] }
    }

    /// Load the rows of `seqid` that are needed to cover `start..=end`.
    ///
    /// The file is tab separated: column 0 holds the sequence id, column 2 the centimorgans and
    /// column 3 the physical position. Rows must be sorted by position.
    pub fn load(path: &Path, seqid: &str, start: u64, end: u64) -> Result<Self> {
        let mut rdr = get_tsv_reader(get_input(Some(path.to_path_buf()))?, false);

        let mut points: Vec<(u64, f64)> = vec![];
        let mut skipped = 0;

        for (i, line) in rdr.records().enumerate() {
            let record = line?;

            if record.get(0) != Some(seqid) {
                skipped += 1;
                continue;
            }

            let (cm, pos) = match (record.get(2), record.get(3)) {
                (Some(cm), Some(pos)) => (cm, pos),
                _ => {
                    return Err(eyre!(
                        "Genetic map row {} has {} columns, at least 4 are required (seqid, id, cm, position)",
                        i + 1,
                        record.len()
                    ))
                }
            };
            let cm = cm
                .trim()
                .parse::<f64>()
                .wrap_err(eyre!("Invalid centimorgan value {cm:?} on genetic map row {}", i + 1))?;
            let pos = pos
                .trim()
                .parse::<u64>()
                .wrap_err(eyre!("Invalid position {pos:?} on genetic map row {}", i + 1))?;

            if let Some((last_pos, _)) = points.last() {
                ensure!(*last_pos <= pos, MapOrderError((*last_pos, pos)));
            }

            // Keep the last point before the span as the left anchor for interpolation
            if pos < start {
                points.clear();
            }
            points.push((pos, cm));

            if pos > end {
                break;
            }
        }

        if skipped > 0 {
            tracing::warn!("Skipped {skipped} genetic map rows that are not on sequence {seqid}");
        }

        ensure!(!points.is_empty(), EmptyGeneticMapError(seqid.to_string()));

        tracing::info!(
            "Loaded {} genetic map points for {seqid} covering {}-{}",
            points.len(),
            points[0].0,
            points[points.len() - 1].0
        );

        Ok(Self { points })
    }

    /// The map covering the retained positions of a sequence, absent without a map file
    pub fn for_sequence(path: Option<&Path>, seqid: &str, positions: &[u64]) -> Result<Self> {
        match (path, positions.first(), positions.last()) {
            (Some(path), Some(start), Some(end)) => Self::load(path, seqid, *start, *end),
            _ => Ok(Self::absent()),
        }
    }

    pub fn from_points(points: Vec<(u64, f64)>) -> Self {
        Self { points }
    }

    pub fn is_absent(&self) -> bool {
        self.points.is_empty()
    }

    /// Interpolated centimorgans at a position, `None` outside of the loaded span
    pub fn cm(&self, pos: u64) -> Option<f64> {
        let first = self.points.first()?;
        let last = self.points.last()?;
        if pos < first.0 || pos > last.0 {
            return None;
        }

        let idx = self.points.partition_point(|(p, _)| *p <= pos);
        let (x1, y1) = self.points[idx - 1];
        if x1 == pos || idx == self.points.len() {
            return Some(y1);
        }

        let (x2, y2) = self.points[idx];
        let chunk = (y2 - y1) / (x2 - x1) as f64;
        Some(y1 + chunk * (pos - x1) as f64)
    }

    /// Genetic distance between two positions.
    ///
    /// `None` when the map is present but does not cover both positions, callers fall back to
    /// [`DEFAULT_CM`].
    pub fn distance(&self, a: u64, b: u64) -> Option<f64> {
        if self.is_absent() {
            return Some(DEFAULT_CM);
        }
        Some((self.cm(a)? - self.cm(b)?).abs())
    }
}
