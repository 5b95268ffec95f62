use color_eyre::{
    eyre::{ensure, eyre},
    Result,
};

use crate::{
    error::EhhError::{InvalidGenotypeError, UnphasedVariantError},
    structs::SiteContext,
};

/// Phased haplotypes of a group of samples over the retained sites of one sequence.
///
/// Every chromosome copy is a sequence of `b'0'` / `b'1'` calls and all copies share the same
/// length: column `i` is the `i`-th retained site.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HaplotypeMatrix {
    copies: Vec<(Vec<u8>, Vec<u8>)>,
}

impl HaplotypeMatrix {
    pub fn new(nsamples: usize) -> Self {
        Self {
            copies: vec![(vec![], vec![]); nsamples],
        }
    }

    /// Build a matrix from (first copy, second copy) strings of equal length
    pub fn from_strings<S: AsRef<str>>(copies: &[(S, S)]) -> Result<Self> {
        let copies = copies
            .iter()
            .map(|(a, b)| (a.as_ref().as_bytes().to_vec(), b.as_ref().as_bytes().to_vec()))
            .collect::<Vec<_>>();

        if let Some((first, _)) = copies.first() {
            let len = first.len();
            ensure!(
                copies.iter().all(|(a, b)| a.len() == len && b.len() == len),
                "All haplotypes must have the same length"
            );
            ensure!(
                copies
                    .iter()
                    .all(|(a, b)| a.iter().chain(b.iter()).all(|c| *c == b'0' || *c == b'1')),
                "Haplotypes can only contain 0 and 1 calls"
            );
        }

        Ok(Self { copies })
    }

    pub fn nsamples(&self) -> usize {
        self.copies.len()
    }

    pub fn nsites(&self) -> usize {
        self.copies.first().map_or(0, |(first, _)| first.len())
    }

    pub fn is_empty(&self) -> bool {
        self.nsites() == 0
    }

    /// Both chromosome copies of a sample
    pub fn sample(&self, idx: usize) -> (&[u8], &[u8]) {
        let (first, second) = &self.copies[idx];
        (first, second)
    }

    /// Iterate over all chromosome copies
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.copies
            .iter()
            .flat_map(|(first, second)| [first.as_slice(), second.as_slice()])
    }

    /// Append one site given the (sample index, phased GT) of every sample in matrix order.
    ///
    /// All calls are validated before the matrix is touched so that every copy keeps the same
    /// length even if the site is rejected.
    pub fn append_site(&mut self, calls: &[(usize, &str)], ctx: SiteContext) -> Result<()> {
        ensure!(
            calls.len() == self.nsamples(),
            "Expected phased calls for {} samples, got {} at {}:{}",
            self.nsamples(),
            calls.len(),
            ctx.seqid,
            ctx.pos
        );

        let alleles = calls
            .iter()
            .map(|(sample, gt)| parse_phased(gt, *sample, ctx))
            .collect::<Result<Vec<(u8, u8)>>>()?;

        for ((first, second), (a, b)) in self.copies.iter_mut().zip(alleles) {
            first.push(a);
            second.push(b);
        }

        Ok(())
    }

    /// Empty all haplotypes, keeping the samples
    pub fn reset(&mut self) {
        for (first, second) in self.copies.iter_mut() {
            first.clear();
            second.clear();
        }
    }
}

fn parse_phased(gt: &str, sample: usize, ctx: SiteContext) -> Result<(u8, u8)> {
    let invalid = || {
        eyre!(InvalidGenotypeError {
            seqid: ctx.seqid.to_string(),
            pos: ctx.pos,
            sample,
            genotype: gt.to_string(),
        })
    };

    if gt.contains('/') {
        return Err(eyre!(UnphasedVariantError((ctx.seqid.to_string(), ctx.pos))));
    }

    let mut alleles = gt.split('|').map(|allele| match allele {
        "0" => Some(b'0'),
        "1" => Some(b'1'),
        _ => None,
    });

    match (alleles.next(), alleles.next(), alleles.next()) {
        (Some(Some(a)), Some(Some(b)), None) => Ok((a, b)),
        _ => Err(invalid()),
    }
}
