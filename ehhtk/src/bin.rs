use clap::Parser;
use color_eyre::Result;

use ehhtk::clap::{run_args, Arguments};

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = match Arguments::try_parse() {
        Ok(args) => args,
        Err(e) => {
            e.print()?;
            // Help and version are not errors
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    run_args(args)?;

    Ok(())
}
