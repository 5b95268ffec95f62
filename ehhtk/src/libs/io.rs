use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use csv::{Reader, ReaderBuilder, Writer, WriterBuilder};
use serde::Serialize;

pub fn get_tsv_reader<R: io::Read>(input: R, has_headers: bool) -> Reader<R> {
    ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(has_headers)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(input)
}

pub fn get_strict_tsv_writer<W: io::Write>(output: W) -> Writer<W> {
    WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_writer(output)
}

/// Open a possibly compressed file, `None` or `-` reads from stdin
pub fn get_input(filename: Option<PathBuf>) -> Result<Box<dyn io::Read>> {
    let input: Box<dyn io::Read> = match filename {
        Some(name) => match name.to_str() {
            Some("-") => Box::new(io::stdin()),
            Some(name) => {
                let r = match niffler::from_path(name) {
                    Ok(x) => x.0,
                    Err(err) => {
                        let msg = format!("failed to open \"{name}\": {err}");
                        return Err(eyre!(msg))?;
                    }
                };
                Box::new(r)
            }
            None => return Err(eyre!("Unknown I/O error")),
        },
        None => Box::new(io::stdin()),
    };
    Ok(input)
}

pub fn get_output(filename: Option<PathBuf>) -> Result<Box<dyn io::Write + Send>> {
    let output: Box<dyn io::Write + Send> = match filename {
        Some(name) => match name.to_str() {
            Some("-") => Box::new(io::stdout()),
            Some(name) => Box::new(
                std::fs::File::options()
                    .create(true)
                    .write(true)
                    .truncate(true)
                    .open(name)
                    .wrap_err(eyre!("failed to open \"{name}\""))?,
            ),
            None => return Err(eyre!("Unknown I/O error")),
        },
        None => Box::new(io::stdout()),
    };
    Ok(output)
}

/// Tab separated result rows shared by the workers of a scan.
///
/// Every row is written and flushed while holding the lock so rows never interleave.
pub struct SiteWriter<W: io::Write> {
    inner: Mutex<Writer<W>>,
}

impl<W: io::Write> SiteWriter<W> {
    pub fn new(output: W) -> Self {
        Self {
            inner: Mutex::new(get_strict_tsv_writer(output)),
        }
    }

    pub fn write_row<S: Serialize>(&self, row: S) -> Result<()> {
        let mut wtr = self
            .inner
            .lock()
            .map_err(|_| eyre!("Output writer was poisoned by a panicking worker"))?;
        wtr.serialize(row)?;
        wtr.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W> {
        let wtr = self
            .inner
            .into_inner()
            .map_err(|_| eyre!("Output writer was poisoned by a panicking worker"))?;
        wtr.into_inner()
            .map_err(|err| eyre!("Failed to flush output: {}", err.error()))
    }
}
