use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::genotype::GenotypeDecoder;

pub const DEFAULT_AF_CUTOFF: f64 = 0.05;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct StatArgs {
    /// Properly formatted and phased VCF / BCF
    #[cfg_attr(feature = "clap", arg(short = 'f', long, value_hint = clap::ValueHint::FilePath))]
    pub file: PathBuf,

    /// Genotype likelihood format
    #[cfg_attr(feature = "clap", arg(short = 'y', long = "type", value_enum))]
    pub encoding: GenotypeEncoding,

    /// A zero based comma separated list of target individuals corresponding to VCF columns
    #[cfg_attr(feature = "clap", arg(short = 't', long, value_delimiter = ',', num_args = 1.., required = true))]
    pub target: Vec<usize>,

    /// A tabix compliant genomic range, i.e. chr1 or chr1:1-1000
    #[cfg_attr(feature = "clap", arg(short = 'r', long))]
    pub region: Option<String>,

    /// Allele frequency cutoff for retaining sites
    #[cfg_attr(feature = "clap", arg(short = 'a', long, default_value_t = DEFAULT_AF_CUTOFF))]
    pub af: f64,

    /// Write the rows to a file instead of stdout
    #[cfg_attr(feature = "clap", arg(short = 'o', long, value_hint = clap::ValueHint::FilePath))]
    pub output: Option<PathBuf>,
}

impl Default for StatArgs {
    fn default() -> Self {
        Self {
            file: PathBuf::new(),
            encoding: GenotypeEncoding::Gt,
            target: vec![],
            region: None,
            af: DEFAULT_AF_CUTOFF,
            output: None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum GenotypeEncoding {
    /// Called genotypes
    #[default]
    #[cfg_attr(feature = "clap", value(name = "GT"))]
    Gt,
    /// Phred-scaled genotype likelihoods
    #[cfg_attr(feature = "clap", value(name = "PL"))]
    Pl,
    /// Log10-scaled genotype likelihoods
    #[cfg_attr(feature = "clap", value(name = "GL"))]
    Gl,
    /// Genotype probabilities
    #[cfg_attr(feature = "clap", value(name = "GP"))]
    Gp,
}

impl std::fmt::Display for GenotypeEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", GenotypeDecoder::from(*self).key())
    }
}
