use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use color_eyre::{eyre::ensure, Result};
use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::time::OffsetTime;

use crate::args::StatArgs;
use crate::subcommands::{hap_lrt, ihs, melt_ehh, normalize_ihs};

#[derive(Parser, Debug)]
#[command(author, version, about, styles=get_styles())]
pub struct Arguments {
    #[command(subcommand)]
    pub cmd: SubCommand,
}

#[derive(Args, Debug, Clone)]
pub struct LogAndVerbosity {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, default_value_t = 3)]
    pub verbosity: u8,

    /// A file path to save logs to
    #[arg(short, long)]
    pub log_file: Option<PathBuf>,

    /// Silence all warning and info messages
    #[arg(long)]
    pub silent: bool,
}

#[derive(Subcommand, Debug)]
pub enum SubCommand {
    /// Integrated haplotype score (iHS) of every intermediate frequency site
    Ihs {
        #[command(flatten)]
        args: StatArgs,

        #[command(flatten)]
        log_and_verbosity: LogAndVerbosity,

        /// A genetic map: seqid, id, cM and position in tab separated columns
        #[arg(short = 'g', long, value_hint = clap::ValueHint::FilePath)]
        gen: Option<PathBuf>,

        /// Number of threads
        #[arg(short = 'x', long, default_value_t = 1)]
        threads: usize,
    },

    /// Compare the shared haplotype block lengths of a target and a background group
    HapLrt {
        #[command(flatten)]
        args: StatArgs,

        #[command(flatten)]
        log_and_verbosity: LogAndVerbosity,

        /// A zero based comma separated list of background individuals corresponding to VCF columns
        #[arg(short = 'b', long, value_delimiter = ',', num_args = 1.., required = true)]
        background: Vec<usize>,
    },

    /// Print the EHH decay of both alleles around a single position
    MeltEhh {
        #[command(flatten)]
        args: StatArgs,

        #[command(flatten)]
        log_and_verbosity: LogAndVerbosity,

        /// A genetic map: seqid, id, cM and position in tab separated columns
        #[arg(short = 'g', long, value_hint = clap::ValueHint::FilePath)]
        gen: Option<PathBuf>,

        /// The focal position
        #[arg(short = 'p', long)]
        pos: u64,
    },

    /// Standardize iHS scores within allele frequency windows
    NormalizeIhs {
        /// Output of the ihs command
        #[arg(short = 'f', long, value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        #[command(flatten)]
        log_and_verbosity: LogAndVerbosity,

        /// Width of the allele frequency windows
        #[arg(short = 's', long, default_value_t = normalize_ihs::DEFAULT_AF_DIFF)]
        af_diff: f64,

        /// Write the rows to a file instead of stdout
        #[arg(short = 'o', long, value_hint = clap::ValueHint::FilePath)]
        output: Option<PathBuf>,
    },
}

impl SubCommand {
    pub fn threads(&self) -> usize {
        match self {
            SubCommand::Ihs { threads, .. } => *threads,
            _ => 1,
        }
    }

    #[rustfmt::skip]
    pub fn log_and_verbosity(&self) -> (u8, &Option<PathBuf>, bool) {
        match self {
            SubCommand::Ihs { log_and_verbosity, .. }
            | SubCommand::HapLrt { log_and_verbosity, .. }
            | SubCommand::MeltEhh { log_and_verbosity, .. }
            | SubCommand::NormalizeIhs { log_and_verbosity, .. }
            => (log_and_verbosity.verbosity, &log_and_verbosity.log_file, log_and_verbosity.silent),
        }
    }

    pub fn check_args(&self) -> Result<()> {
        ensure!(self.threads() >= 1, "Number of threads needs to be at least one");
        match self {
            SubCommand::Ihs { args, .. }
            | SubCommand::HapLrt { args, .. }
            | SubCommand::MeltEhh { args, .. } => {
                ensure!(
                    (0.0..0.5).contains(&args.af),
                    "Allele frequency cutoff needs to be in [0, 0.5), got {}",
                    args.af
                );
            }
            SubCommand::NormalizeIhs { .. } => (),
        };
        Ok(())
    }
}

pub fn run_args(args: Arguments) -> Result<()> {
    let (verbosity, log_file, is_silent) = args.cmd.log_and_verbosity();

    let (level, wrtr, _guard) = init_tracing(verbosity, log_file, is_silent)?;

    let timer = time::format_description::parse("[hour]:[minute]:[second].[subsecond digits:3]")?;
    let time_offset = time::UtcOffset::current_local_offset().unwrap_or(time::UtcOffset::UTC);
    let timer = OffsetTime::new(time_offset, timer);

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(wrtr)
        .with_timer(timer)
        .init();

    args.cmd.check_args()?;

    run_cmd(args.cmd)?;

    Ok(())
}

#[rustfmt::skip]
pub fn run_cmd(cmd: SubCommand) -> Result<()> {
    match cmd {
        SubCommand::Ihs { args, gen, threads, .. } => ihs::run(args, gen, threads)?,
        SubCommand::HapLrt { args, background, .. } => hap_lrt::run(args, background)?,
        SubCommand::MeltEhh { args, gen, pos, .. } => melt_ehh::run(args, gen, pos)?,
        SubCommand::NormalizeIhs { file, af_diff, output, .. } => normalize_ihs::run(file, af_diff, output)?,
    };
    Ok(())
}

pub fn init_tracing(
    verbosity: u8,
    log_file: &Option<PathBuf>,
    is_silent: bool,
) -> Result<(Level, NonBlocking, WorkerGuard)> {
    let level = if is_silent {
        Level::ERROR
    } else {
        match verbosity {
            0 | 1 => Level::ERROR,
            2 => Level::WARN,
            3 => Level::INFO,
            4 => Level::DEBUG,
            5..=u8::MAX => Level::TRACE,
        }
    };

    // Write logs to stderr or file
    let (wrtr, _guard) = match log_file {
        Some(path) => {
            let file = std::fs::File::options()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)?;
            tracing_appender::non_blocking(file)
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    Ok((level, wrtr, _guard))
}

pub fn get_styles() -> clap::builder::Styles {
    clap::builder::Styles::styled()
        .usage(
            anstyle::Style::new()
                .bold()
                .underline()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
        )
        .header(
            anstyle::Style::new()
                .bold()
                .underline()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
        )
        .literal(
            anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
        )
        .invalid(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
        )
        .error(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
        )
        .valid(
            anstyle::Style::new()
                .bold()
                .underline()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
        )
        .placeholder(
            anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))),
        )
}
