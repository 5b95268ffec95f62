// EHHTK - Extended haplotype homozygosity toolkit
// Copyright (C) 2022  Osma S. Rautila
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//
//
//

//! EHHTK - Extended haplotype homozygosity toolkit
//!
//! This library and program scan phased genomes for the haplotype decay signatures left behind
//! by recent positive selection.
//!
//! EHHTK toolkit commands
//!
//! * Integrated haplotype score (iHS) of every intermediate frequency site
//! * Haplotype block length likelihood ratio test between a target and a background group
//! * EHH decay curves around a single site
//! * Allele frequency binned normalization of iHS scores
//!
//! # Getting started
//!
//! ## Installing EHHTK
//!
//! Rust and its package manager cargo can be installed following the instruction for [rustup](https://rustup.rs/).
//!
//! After installing cargo, run the following command
//!
//! ```bash
//! cargo install ehhtk
//! ```
//!
//! ## Running EHHTK
//!
//! To print the available commands use:
//! ```bash
//! ehhtk --help
//! ```
//!
//! A typical iHS run over one chromosome with a genetic map:
//! ```bash
//!ehhtk ihs -f $file -y GT -t 0,1,2,3,4,5 -r chr1 -g $map -x 8 > ${outdir}/ihs.tsv
//!
//!ehhtk normalize-ihs -f ${outdir}/ihs.tsv > ${outdir}/ihs.norm.tsv
//!
//!ehhtk hap-lrt -f $file -y GT -t 0,1,2 -b 3,4,5 -r chr1 > ${outdir}/haplrt.tsv
//!
//!ehhtk melt-ehh -f $file -y GT -t 0,1,2,3,4,5 -r chr1 -p 13500 > ${outdir}/ehh.tsv
//!```
//!

#[doc(hidden)]
pub mod args;

#[doc(hidden)]
pub mod io;

/// Reading variant files into per sequence haplotypes
pub mod read_vcf;

/// EHHTK structs
pub mod structs;

#[doc(hidden)]
pub mod utils;

#[doc(hidden)]
pub mod stats;

#[doc(hidden)]
pub mod error;

/// Allele frequencies from called genotypes or genotype likelihoods
pub mod genotype;

/// Phased haplotype matrix
pub mod haplotypes;

/// Genetic map interpolation
pub mod gmap;

/// Extended haplotype homozygosity and its integration
pub mod ehh;

#[cfg(feature = "clap")]
pub mod clap;
