#[derive(Debug)]
pub enum EhhError {
    CoordsParseError(String),
    PosParseError((String, String)),
    RegionNotFoundError(String),
    UnphasedVariantError((String, u64)),
    MissingFieldError {
        field: String,
        seqid: String,
        pos: u64,
        sample: usize,
    },
    FieldLengthError {
        field: String,
        seqid: String,
        pos: u64,
        sample: usize,
        len: usize,
    },
    InvalidGenotypeError {
        seqid: String,
        pos: u64,
        sample: usize,
        genotype: String,
    },
    HomozygosityError(f64),
    GroupTooSmallError {
        group: &'static str,
        size: usize,
        min: usize,
    },
    SampleIndexError((usize, usize)),
    OverlappingGroupsError(usize),
    EmptyGeneticMapError(String),
    MapOrderError((u64, u64)),
}

impl std::error::Error for EhhError {}

impl std::fmt::Display for EhhError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CoordsParseError(coords) => write!(f, "Failed to parse coords: {coords:?}"),
            Self::PosParseError((coords, value)) => write!(
                f,
                "Position {value:?} is not an integer in coords {coords:?}"
            ),
            Self::RegionNotFoundError(region) => write!(
                f,
                "You specified an invalid region: {region:?} does not match any contig in the VCF header"
            ),
            Self::UnphasedVariantError((seqid, pos)) => write!(
                f,
                "Found an unphased variant at {seqid}:{pos}. All genotypes must be phased!"
            ),
            Self::MissingFieldError { field, seqid, pos, sample } => write!(
                f,
                "Bad file format: genotype field {field} is not present for: {seqid} {pos} in sample {sample}"
            ),
            Self::FieldLengthError { field, seqid, pos, sample, len } => write!(
                f,
                "Bad file format: genotype field {field} should have 3 values but has {len} for: {seqid} {pos} in sample {sample}"
            ),
            Self::InvalidGenotypeError { seqid, pos, sample, genotype } => write!(
                f,
                "Genotype {genotype:?} of sample {sample} at {seqid}:{pos} is not a phased biallelic call. Remember: missing genotypes are not allowed."
            ),
            Self::HomozygosityError(value) => write!(
                f,
                "Internal error: haplotype homozygosity {value} is larger than one"
            ),
            Self::GroupTooSmallError { group, size, min } => write!(
                f,
                "The {group} group has {size} individuals, at least {min} are required"
            ),
            Self::SampleIndexError((index, nsamples)) => write!(
                f,
                "Sample index {index} is out of range, the VCF has {nsamples} samples"
            ),
            Self::OverlappingGroupsError(index) => write!(
                f,
                "Sample index {index} is in both the target and the background group"
            ),
            Self::EmptyGeneticMapError(seqid) => write!(
                f,
                "Problem loading genetic map: no usable rows for {seqid}"
            ),
            Self::MapOrderError((prev_pos, pos)) => write!(
                f,
                "Genetic map is not sorted by position: {prev_pos} > {pos}"
            ),
        }
    }
}
