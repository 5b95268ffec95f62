mod common;

use ehhtk::ehh::Outcome;
use ehhtk::io::SiteWriter;
use ehhtk::subcommands::melt_ehh;

const ALL: [usize; 8] = [0, 1, 2, 3, 4, 5, 6, 7];

#[test]
fn curves_around_a_site() {
    let args = common::stat_args(common::IHS_VCF, &ALL);
    let wtr = SiteWriter::new(vec![]);
    let integrals = melt_ehh::scan(&args, None, 10000, &wtr).unwrap().unwrap();
    let out = String::from_utf8(wtr.into_inner().unwrap()).unwrap();

    let lines = out.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 39);
    assert_eq!(
        &lines[..3],
        &["10000\t1\t0\t0", "11000\t0.42857142857142855\t0\t1", "12000\t0.2857142857142857\t0\t1"]
    );

    assert!(integrals.iter().all(|i| i.outcome == Outcome::Boundary));
    let expected = [
        0.002089285714285714,
        0.002017857142857143,
        0.008142857142857143,
        0.008,
    ];
    for (integral, area) in integrals.iter().zip(expected) {
        assert!((integral.area - area).abs() < 1e-12, "{} != {area}", integral.area);
    }

    // The alt haplotypes stay identical up to 17000
    let alt_right = common::rows(&out)
        .into_iter()
        .filter(|row| row[2] == "1" && row[3] == "1")
        .map(|row| (row[0].clone(), row[1].clone()))
        .collect::<Vec<_>>();
    assert!(alt_right[..7].iter().all(|(_, ehh)| ehh == "1.0"));
    assert_eq!(alt_right[7], ("18000".to_string(), "0.42857142857142855".to_string()));
}

#[test]
fn unknown_position() {
    let args = common::stat_args(common::IHS_VCF, &ALL);
    let wtr = SiteWriter::new(vec![]);

    // Multi-allelic sites are never retained
    let integrals = melt_ehh::scan(&args, None, 10500, &wtr).unwrap();
    assert!(integrals.is_none());
    assert!(wtr.into_inner().unwrap().is_empty());
}

#[test]
fn genetic_map_scales_the_areas() {
    let args = common::stat_args(common::IHS_VCF, &ALL);
    let gen = std::path::Path::new(common::GENETIC_MAP);

    let wtr = SiteWriter::new(vec![]);
    let physical = melt_ehh::scan(&args, None, 10000, &wtr).unwrap().unwrap();
    let physical_rows = wtr.into_inner().unwrap();

    let wtr = SiteWriter::new(vec![]);
    let genetic = melt_ehh::scan(&args, Some(gen), 10000, &wtr).unwrap().unwrap();

    // Same curves, different distances
    assert_eq!(physical_rows, wtr.into_inner().unwrap());
    assert!(genetic.iter().zip(&physical).all(|(g, p)| g.area > p.area));
    assert!(genetic.iter().all(|i| i.map_misses == 0));
}

#[test]
#[cfg(feature = "clap")]
fn melt_ehh_subcommand() {
    let output = common::output("melt_ehh.tsv");
    let mut args = common::stat_args(common::IHS_VCF, &ALL);
    args.output = Some(output.clone());

    let cmd = ehhtk::clap::SubCommand::MeltEhh {
        args,
        log_and_verbosity: common::silent_verbosity(),
        gen: None,
        pos: 10000,
    };
    ehhtk::clap::run_cmd(cmd).unwrap();

    let res = std::fs::read_to_string(output).unwrap();
    insta::assert_snapshot!(res.lines().next().unwrap().replace('\t', " "), @"10000 1 0 0");
}
