use color_eyre::{
    eyre::{ensure, eyre},
    Result,
};

use crate::{
    args::GenotypeEncoding,
    error::EhhError::{FieldLengthError, MissingFieldError},
    structs::{PopulationSummary, SampleFields, SiteContext},
};

/// Decodes one group's genotype fields into a [`PopulationSummary`].
///
/// The variant is picked once from the validated encoding and reused for every site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenotypeDecoder {
    Gt,
    Pl,
    Gl,
    Gp,
}

impl From<GenotypeEncoding> for GenotypeDecoder {
    fn from(encoding: GenotypeEncoding) -> Self {
        match encoding {
            GenotypeEncoding::Gt => Self::Gt,
            GenotypeEncoding::Pl => Self::Pl,
            GenotypeEncoding::Gl => Self::Gl,
            GenotypeEncoding::Gp => Self::Gp,
        }
    }
}

impl GenotypeDecoder {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Gt => "GT",
            Self::Pl => "PL",
            Self::Gl => "GL",
            Self::Gp => "GP",
        }
    }

    /// Summarize a group of samples, given as (VCF sample index, fields) pairs.
    ///
    /// Returns `None` when not a single sample of the group has usable values, in which case the
    /// allele frequency is undefined.
    pub fn summarize(
        &self,
        samples: &[(usize, &SampleFields)],
        ctx: SiteContext,
    ) -> Result<Option<PopulationSummary>> {
        let mut acc = Accumulator::default();

        for (sample, fields) in samples {
            let values = self.values(fields, *sample, ctx)?;

            match self {
                Self::Gt => acc.add_called(&values[0]),
                _ => {
                    if values.iter().all(|v| v == ".") {
                        continue;
                    }
                    ensure!(
                        values.len() == 3,
                        FieldLengthError {
                            field: self.key().to_string(),
                            seqid: ctx.seqid.to_string(),
                            pos: ctx.pos,
                            sample: *sample,
                            len: values.len(),
                        }
                    );
                    if let Some(probs) = self.probabilities(values) {
                        acc.add_probabilities(probs);
                    }
                }
            }
        }

        Ok(acc.summary())
    }

    fn values<'a>(
        &self,
        fields: &'a SampleFields,
        sample: usize,
        ctx: SiteContext,
    ) -> Result<&'a [String]> {
        match fields.get(self.key()) {
            Some(values) if !values.is_empty() => Ok(values),
            _ => Err(eyre!(MissingFieldError {
                field: self.key().to_string(),
                seqid: ctx.seqid.to_string(),
                pos: ctx.pos,
                sample,
            })),
        }
    }

    /// Normalized hom-ref, het, hom-alt probabilities, `None` for missing values
    fn probabilities(&self, values: &[String]) -> Option<[f64; 3]> {
        let mut parsed = [0.0; 3];
        for (slot, value) in parsed.iter_mut().zip(values) {
            *slot = value.parse::<f64>().ok().filter(|v| v.is_finite())?;
        }

        match self {
            Self::Pl => normalize_log(parsed.map(|pl| -pl / 10.0 * std::f64::consts::LN_10)),
            Self::Gl => normalize_log(parsed.map(|gl| gl * std::f64::consts::LN_10)),
            Self::Gp => {
                let sum: f64 = parsed.iter().sum();
                (sum > 0.0 && parsed.iter().all(|p| *p >= 0.0)).then(|| parsed.map(|p| p / sum))
            }
            Self::Gt => None,
        }
    }
}

fn normalize_log(log_likelihoods: [f64; 3]) -> Option<[f64; 3]> {
    let max = log_likelihoods
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return None;
    }
    let unscaled = log_likelihoods.map(|l| (l - max).exp());
    let sum: f64 = unscaled.iter().sum();
    Some(unscaled.map(|p| p / sum))
}

#[derive(Debug, Default)]
struct Accumulator {
    alt_weight: f64,
    alleles: f64,
    nref: usize,
    nalt: usize,
}

impl Accumulator {
    fn add_called(&mut self, gt: &str) {
        let alleles = gt
            .split(['|', '/'])
            .map(|a| a.parse::<u32>().ok())
            .collect::<Option<Vec<u32>>>();

        let Some(alleles) = alleles else {
            return;
        };

        let nalt = alleles.iter().filter(|a| **a != 0).count();
        self.alt_weight += nalt as f64;
        self.alleles += alleles.len() as f64;

        if nalt == 0 {
            self.nref += 1;
        } else if nalt == alleles.len() {
            self.nalt += 1;
        }
    }

    fn add_probabilities(&mut self, probs: [f64; 3]) {
        self.alt_weight += probs[1] + 2.0 * probs[2];
        self.alleles += 2.0;

        let call = probs
            .iter()
            .enumerate()
            .fold(0, |best, (i, p)| if *p > probs[best] { i } else { best });
        match call {
            0 => self.nref += 1,
            2 => self.nalt += 1,
            _ => (),
        }
    }

    fn summary(&self) -> Option<PopulationSummary> {
        (self.alleles > 0.0).then(|| PopulationSummary {
            af: self.alt_weight / self.alleles,
            nref: self.nref,
            nalt: self.nalt,
        })
    }
}
