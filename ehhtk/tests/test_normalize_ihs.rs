mod common;

use ehhtk::io::SiteWriter;
use ehhtk::subcommands::{ihs, normalize_ihs};

const ALL: [usize; 8] = [0, 1, 2, 3, 4, 5, 6, 7];

fn ihs_rows() -> Vec<ihs::IhsRow> {
    let args = common::stat_args(common::IHS_VCF, &ALL);
    let wtr = SiteWriter::new(vec![]);
    ihs::scan(&args, None, 1, &wtr).unwrap();
    normalize_ihs::read_ihs(wtr.into_inner().unwrap().as_slice()).unwrap()
}

#[test]
fn read_back_scan_output() {
    let rows = ihs_rows();
    assert_eq!(rows.len(), 20);
    let row = rows.iter().find(|row| row.pos == 10000).unwrap();
    assert_eq!(row.af, 0.5);
    assert!((row.ihh_ref - 0.004107142857142857).abs() < 1e-12);
}

#[test]
fn one_window_is_centered() {
    let rows = ihs_rows();
    let n = rows.len();

    // Every frequency of the fixture fits in a single window
    let normalized = normalize_ihs::normalize(rows, 1.0).unwrap();
    assert_eq!(normalized.len(), n);

    let mean = normalized.iter().map(|r| r.normalized_ihs).sum::<f64>() / n as f64;
    assert!(mean.abs() < 1e-9);
    assert!(normalized.windows(2).all(|w| w[0].af <= w[1].af));
}

#[test]
#[cfg(feature = "clap")]
fn normalize_ihs_subcommand() {
    let ihs_output = common::output("normalize_input.tsv");
    let mut args = common::stat_args(common::IHS_VCF, &ALL);
    args.output = Some(ihs_output.clone());
    ehhtk::clap::run_cmd(ehhtk::clap::SubCommand::Ihs {
        args,
        log_and_verbosity: common::silent_verbosity(),
        gen: None,
        threads: 2,
    })
    .unwrap();

    let output = common::output("normalize_ihs.tsv");
    ehhtk::clap::run_cmd(ehhtk::clap::SubCommand::NormalizeIhs {
        file: ihs_output,
        log_and_verbosity: common::silent_verbosity(),
        af_diff: normalize_ihs::DEFAULT_AF_DIFF,
        output: Some(output.clone()),
    })
    .unwrap();

    let res = std::fs::read_to_string(output).unwrap();
    let rows = common::rows(&res);
    assert_eq!(rows.len(), 20);
    assert!(rows.iter().all(|row| row.len() == 9));
}
