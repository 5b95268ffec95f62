/// Integrated haplotype score of every intermediate frequency site
pub mod ihs;

/// Likelihood ratio test of shared haplotype block lengths between two groups
pub mod hap_lrt;

/// EHH decay curves around a single site
pub mod melt_ehh;

/// Allele frequency binned standardization of iHS
pub mod normalize_ihs;
