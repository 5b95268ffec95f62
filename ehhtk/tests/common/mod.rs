#![allow(dead_code)]
use std::path::PathBuf;

use ehhtk::args::{GenotypeEncoding, StatArgs};

pub const IHS_VCF: &str = "tests/data/ihs.vcf";
pub const SCENARIO_VCF: &str = "tests/data/scenario.vcf";
pub const UNPHASED_VCF: &str = "tests/data/unphased.vcf";
pub const LIKELIHOODS_VCF: &str = "tests/data/likelihoods.vcf";
pub const GENETIC_MAP: &str = "tests/data/genetic_map.tsv";
pub const OUTDIR: &str = "tests/results";

pub fn stat_args(file: &str, target: &[usize]) -> StatArgs {
    StatArgs {
        file: PathBuf::from(file),
        encoding: GenotypeEncoding::Gt,
        target: target.to_vec(),
        ..Default::default()
    }
}

pub fn output(name: &str) -> PathBuf {
    std::fs::create_dir_all(OUTDIR).unwrap();
    PathBuf::from(OUTDIR).join(name)
}

pub fn rows(out: &str) -> Vec<Vec<String>> {
    out.lines()
        .map(|line| line.split('\t').map(str::to_string).collect())
        .collect()
}

#[cfg(feature = "clap")]
pub fn silent_verbosity() -> ehhtk::clap::LogAndVerbosity {
    ehhtk::clap::LogAndVerbosity {
        verbosity: 1,
        log_file: None,
        silent: false,
    }
}
