use std::path::Path;

use color_eyre::{
    eyre::{ensure, eyre, WrapErr},
    Result,
};
use indexmap::IndexMap;
use rust_htslib::bcf::header::HeaderView;
use rust_htslib::bcf::record::GenotypeAllele;
use rust_htslib::bcf::{self, Read, Record};

use crate::{
    args::StatArgs,
    error::EhhError::{MissingFieldError, RegionNotFoundError, SampleIndexError, UnphasedVariantError},
    genotype::GenotypeDecoder,
    structs::{PopulationSummary, SampleFields, SequenceData, SiteContext, VariantRecord},
    utils::{check_group, parse_coords},
};

// BCF sentinels, see the htslib vcf.h
const MISSING_INTEGER: i32 = i32::MIN;
const VECTOR_END_INTEGER: i32 = i32::MIN + 1;
const MISSING_FLOAT: u32 = 0x7F80_0001;
const VECTOR_END_FLOAT: u32 = 0x7F80_0002;

pub enum VcfReader {
    Plain(bcf::Reader),
    Indexed(bcf::IndexedReader),
}

impl VcfReader {
    /// Open the whole file, or only a region of the form `seqid` or `seqid:start-end`.
    /// Region queries need a tabix or csi index next to the file.
    pub fn new(path: &Path, region: Option<&str>) -> Result<Self> {
        let plain = bcf::Reader::from_path(path)
            .wrap_err(eyre!("Failed to open variant file {path:?}"))?;

        let Some(region) = region else {
            return Ok(Self::Plain(plain));
        };

        let (contig, start, end) = parse_coords(region)?;
        let rid = plain
            .header()
            .name2rid(contig.as_bytes())
            .map_err(|_| eyre!(RegionNotFoundError(region.to_string())))?;
        drop(plain);

        let mut reader = bcf::IndexedReader::from_path(path)
            .wrap_err(eyre!("Failed to open an index for {path:?}, region queries need one"))?;

        match (start, end) {
            // RUST-HTSLIB is 0-based so subtract 1
            (Some(start), Some(end)) => {
                reader.fetch(rid, start.saturating_sub(1), Some(end.saturating_sub(1)))?
            }
            _ => reader.fetch(rid, 0, None)?,
        };

        Ok(Self::Indexed(reader))
    }

    pub fn header(&self) -> &HeaderView {
        match self {
            Self::Plain(reader) => reader.header(),
            Self::Indexed(reader) => reader.header(),
        }
    }

    pub fn nsamples(&self) -> usize {
        self.header().sample_count() as usize
    }

    pub fn samples(&self) -> Vec<String> {
        self.header()
            .samples()
            .into_iter()
            .map(|sample| String::from_utf8_lossy(sample).to_string())
            .collect()
    }

    fn next_record(&mut self) -> Option<Result<Record>> {
        let (mut record, read) = match self {
            Self::Plain(reader) => {
                let mut record = reader.empty_record();
                let read = reader.read(&mut record);
                (record, read)
            }
            Self::Indexed(reader) => {
                let mut record = reader.empty_record();
                let read = reader.read(&mut record);
                (record, read)
            }
        };

        match read? {
            Ok(()) => {
                record.unpack();
                Some(Ok(record))
            }
            Err(err) => Some(Err(eyre!(err))),
        }
    }
}

/// Open the variant file of `args` and check that all `groups` fit in it
pub fn open_stream(args: &StatArgs, groups: &[(&'static str, &[usize])]) -> Result<VariantStream> {
    tracing::info!("Input VCF: {:?}", args.file);
    let reader = VcfReader::new(&args.file, args.region.as_deref())?;

    let nsamples = reader.nsamples();
    for (name, indices) in groups.iter().copied() {
        check_group(name, indices, nsamples)?;
        tracing::info!("Using {} {name} individuals out of {nsamples}", indices.len());
    }

    Ok(VariantStream::new(reader, args.encoding.into()))
}

/// Forward-only stream of [`VariantRecord`]s carrying `GT` plus the fields of one encoding
pub struct VariantStream {
    reader: VcfReader,
    keys: Vec<&'static str>,
}

impl VariantStream {
    pub fn new(reader: VcfReader, decoder: GenotypeDecoder) -> Self {
        let keys = match decoder {
            GenotypeDecoder::Gt => vec!["GT"],
            other => vec!["GT", other.key()],
        };
        Self { reader, keys }
    }
}

impl Iterator for VariantStream {
    type Item = Result<VariantRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.reader.next_record()? {
            Ok(record) => record,
            Err(err) => return Some(Err(err)),
        };
        Some(to_variant_record(&record, self.reader.header(), &self.keys))
    }
}

pub fn to_variant_record(record: &Record, header: &HeaderView, keys: &[&str]) -> Result<VariantRecord> {
    let rid = record
        .rid()
        .ok_or_else(|| eyre!("Variant record without a sequence id"))?;
    let seqid = String::from_utf8_lossy(header.rid2name(rid)?).to_string();
    // HTSlib is 0-based so add 1
    let pos = (record.pos() + 1) as u64;

    let alleles = record.alleles();
    let (reference, alts) = match alleles.split_first() {
        Some((reference, alts)) => (
            String::from_utf8_lossy(reference).to_string(),
            alts.iter()
                .map(|alt| String::from_utf8_lossy(alt).to_string())
                .collect(),
        ),
        None => (String::new(), vec![]),
    };

    let names = header.samples();
    let mut samples: IndexMap<String, SampleFields> = names
        .iter()
        .map(|name| (String::from_utf8_lossy(name).to_string(), SampleFields::new()))
        .collect();

    let mut phased = true;
    for key in keys {
        let Some(values) = format_values(record, key, names.len(), &mut phased) else {
            tracing::trace!("FORMAT field {key} is not present at {seqid}:{pos}");
            continue;
        };
        for (fields, values) in samples.values_mut().zip(values) {
            fields.insert(key.to_string(), values);
        }
    }

    Ok(VariantRecord {
        seqid,
        pos,
        reference,
        alts,
        phased,
        samples,
    })
}

/// Per sample values of a FORMAT field as strings, missing values become `.`
fn format_values(record: &Record, key: &str, nsamples: usize, phased: &mut bool) -> Option<Vec<Vec<String>>> {
    match key {
        "GT" => {
            let genotypes = record.genotypes().ok()?;
            Some(
                (0..nsamples)
                    .map(|i| {
                        let gt = genotypes.get(i);
                        if gt
                            .iter()
                            .skip(1)
                            .any(|a| !matches!(a, GenotypeAllele::Phased(_) | GenotypeAllele::PhasedMissing))
                        {
                            *phased = false;
                        }
                        vec![gt.to_string()]
                    })
                    .collect(),
            )
        }
        "PL" => {
            let values = record.format(key.as_bytes()).integer().ok()?;
            Some(
                values
                    .iter()
                    .map(|sample| {
                        sample
                            .iter()
                            .take_while(|v| **v != VECTOR_END_INTEGER)
                            .map(|v| match *v {
                                MISSING_INTEGER => ".".to_string(),
                                v => v.to_string(),
                            })
                            .collect()
                    })
                    .collect(),
            )
        }
        _ => {
            let values = record.format(key.as_bytes()).float().ok()?;
            Some(
                values
                    .iter()
                    .map(|sample| {
                        sample
                            .iter()
                            .take_while(|v| v.to_bits() != VECTOR_END_FLOAT)
                            .map(|v| match v.to_bits() {
                                MISSING_FLOAT => ".".to_string(),
                                _ => v.to_string(),
                            })
                            .collect()
                    })
                    .collect(),
            )
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanCounts {
    pub records: usize,
    pub multiallelic: usize,
    pub filtered: usize,
    pub sequences: usize,
}

/// Consume the stream and build the haplotypes of `samples` one sequence at a time.
///
/// A site is retained when `keep` accepts the summary of `samples`. Whenever the sequence id
/// changes, and after the last record, the finished sequence is handed to `on_sequence`.
pub fn scan_sequences<I, F, G>(
    stream: I,
    decoder: GenotypeDecoder,
    samples: &[usize],
    keep: F,
    mut on_sequence: G,
) -> Result<ScanCounts>
where
    I: IntoIterator<Item = Result<VariantRecord>>,
    F: Fn(&PopulationSummary) -> bool,
    G: FnMut(&SequenceData) -> Result<()>,
{
    let mut data = SequenceData::new(samples.len());
    let mut counts = ScanCounts::default();

    for record in stream {
        let record = record?;
        counts.records += 1;

        if record.seqid != data.seqid {
            if !data.is_empty() {
                counts.sequences += 1;
                on_sequence(&data)?;
            }
            tracing::debug!("Reading sequence {}", record.seqid);
            data.reset(&record.seqid);
        }

        let ctx = SiteContext {
            seqid: &record.seqid,
            pos: record.pos,
        };

        ensure!(
            record.phased,
            UnphasedVariantError((record.seqid.clone(), record.pos))
        );

        if !record.is_biallelic() {
            tracing::trace!("Skipping multi-allelic variant {record}");
            counts.multiallelic += 1;
            continue;
        }

        let group = samples
            .iter()
            .map(|idx| {
                record
                    .sample_fields(*idx)
                    .map(|fields| (*idx, fields))
                    .ok_or_else(|| eyre!(SampleIndexError((*idx, record.samples.len()))))
            })
            .collect::<Result<Vec<_>>>()?;

        let summary = match decoder.summarize(&group, ctx)? {
            Some(summary) if keep(&summary) => summary,
            _ => {
                counts.filtered += 1;
                continue;
            }
        };

        let calls = group
            .iter()
            .map(|(idx, fields)| match fields.get("GT").and_then(|gt| gt.first()) {
                Some(gt) => Ok((*idx, gt.as_str())),
                None => Err(eyre!(MissingFieldError {
                    field: "GT".to_string(),
                    seqid: record.seqid.clone(),
                    pos: record.pos,
                    sample: *idx,
                })),
            })
            .collect::<Result<Vec<_>>>()?;

        data.haplotypes.append_site(&calls, ctx)?;
        data.positions.push(record.pos);
        data.afs.push(summary.af);
    }

    if !data.is_empty() {
        counts.sequences += 1;
        on_sequence(&data)?;
    }

    tracing::info!(
        "Read {} records: {} multi-allelic skipped, {} filtered, {} sequences analysed",
        counts.records,
        counts.multiallelic,
        counts.filtered,
        counts.sequences
    );

    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(seqid: &str, pos: u64, gts: &[&str]) -> Result<VariantRecord> {
        let samples = gts
            .iter()
            .enumerate()
            .map(|(i, gt)| {
                let mut fields = SampleFields::new();
                fields.insert("GT".to_string(), vec![gt.to_string()]);
                (format!("S{i}"), fields)
            })
            .collect();

        Ok(VariantRecord {
            seqid: seqid.to_string(),
            pos,
            reference: "A".to_string(),
            alts: vec!["T".to_string()],
            phased: gts.iter().all(|gt| !gt.contains('/')),
            samples,
        })
    }

    #[test]
    fn sequences_are_flushed_on_change() {
        let stream = vec![
            record("chr1", 10, &["0|1", "1|1", "0|0"]),
            record("chr1", 20, &["1|1", "1|0", "0|0"]),
            record("chr2", 5, &["0|1", "0|0", "1|0"]),
        ];

        let mut seen = vec![];
        let counts = scan_sequences(stream, GenotypeDecoder::Gt, &[0, 1], |_| true, |data| {
            seen.push((data.seqid.clone(), data.positions.clone(), data.haplotypes.clone()));
            Ok(())
        })
        .unwrap();

        assert_eq!(counts.sequences, 2);
        assert_eq!(seen[0].0, "chr1");
        assert_eq!(seen[0].1, vec![10, 20]);
        assert_eq!(seen[0].2.sample(1), (b"11".as_slice(), b"10".as_slice()));
        assert_eq!(seen[1].0, "chr2");
        assert_eq!(seen[1].1, vec![5]);
    }

    #[test]
    fn filtered_sites_are_not_retained() {
        let stream = vec![
            record("chr1", 10, &["0|0", "0|0"]),
            record("chr1", 20, &["0|1", "1|0"]),
        ];

        let mut positions = vec![];
        let counts = scan_sequences(stream, GenotypeDecoder::Gt, &[0, 1], |s| s.af > 0.05, |data| {
            positions.extend(data.positions.iter().copied());
            Ok(())
        })
        .unwrap();

        assert_eq!(counts.filtered, 1);
        assert_eq!(positions, vec![20]);
    }

    #[test]
    fn multiallelic_sites_are_skipped() {
        let mut multi = record("chr1", 10, &["0|1", "1|0"]).unwrap();
        multi.alts.push("G".to_string());

        let stream = vec![Ok(multi), record("chr1", 20, &["0|1", "1|0"])];
        let counts = scan_sequences(stream, GenotypeDecoder::Gt, &[0, 1], |_| true, |_| Ok(())).unwrap();

        assert_eq!(counts.multiallelic, 1);
        assert_eq!(counts.sequences, 1);
    }

    #[test]
    fn unphased_site_stops_the_scan() {
        let stream = vec![
            record("chr1", 10, &["0|1", "1|0"]),
            record("chr1", 20, &["0/1", "1|0"]),
            record("chr2", 30, &["0|1", "1|0"]),
        ];

        let mut called = false;
        let err = scan_sequences(stream, GenotypeDecoder::Gt, &[0, 1], |_| true, |_| {
            called = true;
            Ok(())
        })
        .unwrap_err();

        assert_eq!(err.to_string(), "Found an unphased variant at chr1:20. All genotypes must be phased!");
        assert!(!called);
    }

    #[test]
    fn unphased_multiallelic_site_stops_the_scan() {
        let mut multi = record("chr1", 20, &["0/2", "1/0"]).unwrap();
        multi.alts.push("G".to_string());

        let stream = vec![
            record("chr1", 10, &["0|1", "1|0"]),
            Ok(multi),
            record("chr1", 30, &["0|1", "1|0"]),
        ];

        let mut called = false;
        let err = scan_sequences(stream, GenotypeDecoder::Gt, &[0, 1], |_| true, |_| {
            called = true;
            Ok(())
        })
        .unwrap_err();

        assert_eq!(err.to_string(), "Found an unphased variant at chr1:20. All genotypes must be phased!");
        assert!(!called);
    }

    #[test]
    fn empty_stream_is_a_no_op() {
        let stream: Vec<Result<VariantRecord>> = vec![];
        let counts = scan_sequences(stream, GenotypeDecoder::Gt, &[0, 1], |_| true, |_| Ok(())).unwrap();
        assert_eq!(counts, ScanCounts::default());
    }
}
