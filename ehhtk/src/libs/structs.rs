use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::haplotypes::HaplotypeMatrix;

/// FORMAT key -> values of a single sample
pub type SampleFields = IndexMap<String, Vec<String>>;

/// A single record of the variant stream
#[derive(Debug, Default, Clone, PartialEq)]
pub struct VariantRecord {
    pub seqid: String,
    /// 1-based
    pub pos: u64,
    pub reference: String,
    pub alts: Vec<String>,
    pub phased: bool,
    /// Sample name -> fields, in VCF column order
    pub samples: IndexMap<String, SampleFields>,
}

impl VariantRecord {
    pub fn is_biallelic(&self) -> bool {
        self.alts.len() == 1
    }

    pub fn sample_fields(&self, idx: usize) -> Option<&SampleFields> {
        self.samples.get_index(idx).map(|(_, fields)| fields)
    }
}

impl std::fmt::Display for VariantRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.seqid,
            self.pos,
            self.reference,
            self.alts.join(",")
        )
    }
}

/// Where a genotype came from, for error messages
#[derive(Debug, Clone, Copy)]
pub struct SiteContext<'a> {
    pub seqid: &'a str,
    pub pos: u64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopulationSummary {
    pub af: f64,
    pub nref: usize,
    pub nalt: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn is_right(&self) -> bool {
        matches!(self, Direction::Right)
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Direction::Right => write!(f, "right"),
            Direction::Left => write!(f, "left"),
        }
    }
}

/// Haplotypes and site series of one contiguous sequence
#[derive(Debug, Clone)]
pub struct SequenceData {
    pub seqid: String,
    pub positions: Vec<u64>,
    pub afs: Vec<f64>,
    pub haplotypes: HaplotypeMatrix,
}

impl SequenceData {
    pub fn new(nsamples: usize) -> Self {
        Self {
            seqid: String::new(),
            positions: vec![],
            afs: vec![],
            haplotypes: HaplotypeMatrix::new(nsamples),
        }
    }

    pub fn nsites(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn idx_by_pos(&self, pos: u64) -> Option<usize> {
        self.positions.iter().position(|p| *p == pos)
    }

    pub fn reset(&mut self, seqid: &str) {
        self.seqid = seqid.to_string();
        self.positions.clear();
        self.afs.clear();
        self.haplotypes.reset();
    }
}
