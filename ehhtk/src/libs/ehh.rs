use std::collections::HashMap;
use std::ops::Range;

use color_eyre::{eyre::ensure, Result};

use crate::{
    error::EhhError::HomozygosityError,
    gmap::{GeneticMap, DEFAULT_CM},
    haplotypes::HaplotypeMatrix,
    structs::Direction,
};

/// How physical gaps between neighbouring markers are treated during integration
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GapPolicy {
    Ignore,
    /// Fail on gaps larger than `max_gap` and scale the area of gaps larger than `correct_above`
    /// by `correct_above / gap`
    Corrected { max_gap: u64, correct_above: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegrationParams {
    /// Integration stops once EHH falls to or below this
    pub decay: f64,
    pub gap_policy: GapPolicy,
}

impl IntegrationParams {
    pub fn ihs() -> Self {
        Self {
            decay: 0.05,
            gap_policy: GapPolicy::Corrected {
                max_gap: 10_000,
                correct_above: 5_000,
            },
        }
    }

    pub fn melt() -> Self {
        Self {
            decay: 0.01,
            gap_policy: GapPolicy::Ignore,
        }
    }
}

/// Why an integration stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// EHH decayed below the threshold
    Decayed,
    /// The window ran off the end of the haplotypes
    Boundary,
    /// Two neighbouring markers are too far apart
    Gap,
}

impl Outcome {
    pub fn failures(&self) -> usize {
        match self {
            Outcome::Decayed => 0,
            Outcome::Boundary | Outcome::Gap => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Integral {
    pub area: f64,
    pub outcome: Outcome,
    /// Steps where the genetic map did not cover the markers and the default distance was used
    pub map_misses: usize,
}

/// A single extension step of the EHH window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EhhStep {
    pub pos: u64,
    pub ehh: f64,
    pub allele: u8,
    pub direction: Direction,
}

fn pairs(n: usize) -> f64 {
    (n * n.saturating_sub(1)) as f64 / 2.0
}

/// Count the distinct haplotype substrings inside a window over all chromosome copies
pub fn count_allele_combinations(
    haplotypes: &HaplotypeMatrix,
    window: Range<usize>,
) -> HashMap<&[u8], usize> {
    let mut counts = HashMap::new();
    for hap in haplotypes.iter() {
        *counts.entry(&hap[window.clone()]).or_insert(0) += 1;
    }
    counts
}

/// Extended haplotype homozygosity of a window for the haplotypes carrying `anchor` at the
/// focal end of the window (the first site when extending right, the last when extending left).
pub fn homozygosity(
    haplotypes: &HaplotypeMatrix,
    window: Range<usize>,
    anchor: u8,
    direction: Direction,
) -> Result<f64> {
    let counts = count_allele_combinations(haplotypes, window);

    let (mut identical_pairs, mut carriers) = (0.0, 0);
    for (hap, count) in counts {
        let focal = match direction {
            Direction::Right => hap.first(),
            Direction::Left => hap.last(),
        };
        if focal != Some(&anchor) {
            continue;
        }
        carriers += count;
        if count >= 2 {
            identical_pairs += pairs(count);
        }
    }

    if carriers < 2 {
        return Ok(0.0);
    }

    let ehh = identical_pairs / pairs(carriers);
    ensure!(ehh <= 1.0, HomozygosityError(ehh));

    Ok(ehh)
}

/// Integrate the EHH decay curve outward from `focal` over genetic distance.
///
/// The window is widened one site at a time, every step is handed to `trace` and the area
/// between the previous and the current EHH is added with the trapezoidal rule.
pub fn integrate<F>(
    haplotypes: &HaplotypeMatrix,
    positions: &[u64],
    gmap: &GeneticMap,
    focal: usize,
    anchor: u8,
    direction: Direction,
    params: &IntegrationParams,
    mut trace: F,
) -> Result<Integral>
where
    F: FnMut(EhhStep) -> Result<()>,
{
    let nsites = haplotypes.nsites();
    ensure!(
        positions.len() == nsites && focal < nsites,
        "Focal site {focal} is outside of the {nsites} sites"
    );

    let (mut start, mut end) = (focal, focal + 1);
    let mut ehh = 1.0;
    let mut integral = Integral {
        area: 0.0,
        outcome: Outcome::Decayed,
        map_misses: 0,
    };

    loop {
        let (prev, curr) = match direction {
            Direction::Right => {
                if end == nsites {
                    integral.outcome = Outcome::Boundary;
                    return Ok(integral);
                }
                end += 1;
                (end - 2, end - 1)
            }
            Direction::Left => {
                if start == 0 {
                    integral.outcome = Outcome::Boundary;
                    return Ok(integral);
                }
                start -= 1;
                (start + 1, start)
            }
        };

        let current = homozygosity(haplotypes, start..end, anchor, direction)?;

        trace(EhhStep {
            pos: positions[curr],
            ehh: current,
            allele: anchor,
            direction,
        })?;

        if current <= params.decay {
            integral.outcome = Outcome::Decayed;
            return Ok(integral);
        }

        let gap = positions[prev].abs_diff(positions[curr]);
        let correction = match params.gap_policy {
            GapPolicy::Ignore => 1.0,
            GapPolicy::Corrected {
                max_gap,
                correct_above,
            } => {
                if gap > max_gap {
                    integral.outcome = Outcome::Gap;
                    return Ok(integral);
                }
                if gap > correct_above {
                    correct_above as f64 / gap as f64
                } else {
                    1.0
                }
            }
        };

        let gdist = gmap
            .distance(positions[prev], positions[curr])
            .unwrap_or_else(|| {
                integral.map_misses += 1;
                DEFAULT_CM
            });

        integral.area += (ehh + current) / 2.0 * gdist * correction;
        ehh = current;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_trace(_: EhhStep) -> Result<()> {
        Ok(())
    }

    fn matrix() -> HaplotypeMatrix {
        // Focal site is index 2
        HaplotypeMatrix::from_strings(&[
            ("00100", "00101"),
            ("10100", "01111"),
            ("00000", "11011"),
        ])
        .unwrap()
    }

    #[test]
    fn combinations_in_window() {
        let matrix = matrix();
        let counts = count_allele_combinations(&matrix, 2..4);
        assert_eq!(counts.get(b"10".as_slice()), Some(&3));
        assert_eq!(counts.get(b"11".as_slice()), Some(&1));
        assert_eq!(counts.get(b"00".as_slice()), Some(&1));
        assert_eq!(counts.get(b"01".as_slice()), Some(&1));
    }

    #[test]
    fn focal_site_is_fully_homozygous() {
        let matrix = matrix();
        assert_eq!(homozygosity(&matrix, 2..3, b'1', Direction::Right).unwrap(), 1.0);
        assert_eq!(homozygosity(&matrix, 2..3, b'0', Direction::Left).unwrap(), 1.0);
    }

    #[test]
    fn homozygosity_decays_to_the_right() {
        let matrix = matrix();
        // Carriers of 1 at site 2: "100", "100", "101", "111" -> 1 identical pair of 6
        let ehh = homozygosity(&matrix, 2..5, b'1', Direction::Right).unwrap();
        assert!((ehh - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn homozygosity_anchors_on_the_last_site_to_the_left() {
        let matrix = matrix();
        // Carriers of 0 at site 2: "000", "110" -> no identical pairs
        let ehh = homozygosity(&matrix, 0..3, b'0', Direction::Left).unwrap();
        assert_eq!(ehh, 0.0);
        // Carriers of 1 at site 2: "001", "001", "101", "011"
        let ehh = homozygosity(&matrix, 0..3, b'1', Direction::Left).unwrap();
        assert!((ehh - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn homozygosity_stays_within_bounds_and_decays() {
        let matrix = matrix();
        for anchor in [b'0', b'1'] {
            let mut prev = 1.0;
            for end in 3..=5 {
                let ehh = homozygosity(&matrix, 2..end, anchor, Direction::Right).unwrap();
                assert!((0.0..=1.0).contains(&ehh));
                assert!(ehh <= prev);
                prev = ehh;
            }
        }
    }

    #[test]
    fn single_carrier_has_no_pairs() {
        let matrix = HaplotypeMatrix::from_strings(&[("01", "11"), ("00", "00")]).unwrap();
        assert_eq!(homozygosity(&matrix, 0..2, b'1', Direction::Right).unwrap(), 0.0);
    }

    #[test]
    fn identical_haplotypes_hit_the_boundary() {
        let matrix = HaplotypeMatrix::from_strings(&[("0101", "0101"), ("0101", "0101")]).unwrap();
        let positions = [100, 200, 300, 400];
        let gmap = GeneticMap::absent();

        let mut steps = vec![];
        let integral = integrate(
            &matrix,
            &positions,
            &gmap,
            1,
            b'1',
            Direction::Right,
            &IntegrationParams::melt(),
            |step| {
                steps.push(step);
                Ok(())
            },
        )
        .unwrap();

        assert_eq!(integral.outcome, Outcome::Boundary);
        assert_eq!(integral.outcome.failures(), 1);
        assert_eq!(
            steps.iter().map(|s| (s.pos, s.ehh)).collect::<Vec<_>>(),
            vec![(300, 1.0), (400, 1.0)]
        );
        assert!((integral.area - 2.0 * DEFAULT_CM).abs() < 1e-12);
    }

    #[test]
    fn integration_stops_at_decay() {
        let matrix = HaplotypeMatrix::from_strings(&[
            ("0100", "0000"),
            ("0111", "0000"),
            ("0000", "0000"),
        ])
        .unwrap();
        let positions = [100, 200, 300, 400];
        let gmap = GeneticMap::absent();

        // Carriers of 1 at site 1: "10" and "11" are distinct after one step
        let integral = integrate(
            &matrix,
            &positions,
            &gmap,
            1,
            b'1',
            Direction::Right,
            &IntegrationParams::ihs(),
            no_trace,
        )
        .unwrap();

        assert_eq!(integral.outcome, Outcome::Decayed);
        assert_eq!(integral.area, 0.0);
    }

    #[test]
    fn large_gaps_are_corrected_or_fail() {
        let matrix = HaplotypeMatrix::from_strings(&[("000", "000"), ("000", "000")]).unwrap();
        let gmap = GeneticMap::absent();
        let params = IntegrationParams::ihs();

        let integral =
            integrate(&matrix, &[0, 8000, 16000], &gmap, 0, b'0', Direction::Right, &params, no_trace)
                .unwrap();
        assert_eq!(integral.outcome, Outcome::Boundary);
        let expected = 2.0 * DEFAULT_CM * 5000.0 / 8000.0;
        assert!((integral.area - expected).abs() < 1e-12);

        let integral =
            integrate(&matrix, &[0, 100, 20100], &gmap, 0, b'0', Direction::Right, &params, no_trace)
                .unwrap();
        assert_eq!(integral.outcome, Outcome::Gap);
        assert!((integral.area - DEFAULT_CM).abs() < 1e-12);

        // No gap policy when melting
        let integral = integrate(
            &matrix,
            &[0, 100, 20100],
            &gmap,
            2,
            b'0',
            Direction::Left,
            &IntegrationParams::melt(),
            no_trace,
        )
        .unwrap();
        assert_eq!(integral.outcome, Outcome::Boundary);
        assert!((integral.area - 2.0 * DEFAULT_CM).abs() < 1e-12);
    }

    #[test]
    fn genetic_map_weights_the_area() {
        let matrix = HaplotypeMatrix::from_strings(&[("000", "000"), ("000", "000")]).unwrap();
        let gmap = GeneticMap::from_points(vec![(100, 0.0), (300, 1.0)]);

        let integral = integrate(
            &matrix,
            &[100, 200, 400],
            &gmap,
            0,
            b'0',
            Direction::Right,
            &IntegrationParams::melt(),
            no_trace,
        )
        .unwrap();

        // 100 -> 200 is covered by the map, 200 -> 400 is not
        assert_eq!(integral.map_misses, 1);
        assert!((integral.area - (0.5 + DEFAULT_CM)).abs() < 1e-12);
    }
}
