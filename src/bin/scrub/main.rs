mod cli;

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::debug;

use gpx_scrub::files::scrub_file;
use gpx_scrub::options::ScrubOptions;

use crate::cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level)).init();

    debug!("Started; args: {:?}", cli);

    // Checked before either file is touched.
    let options = ScrubOptions::from_arg(&cli.max_dist)?;

    let report = scrub_file(&cli.filepath, &cli.output_file, &options).with_context(|| {
        format!(
            "failed to scrub {} into {}",
            cli.filepath.display(),
            cli.output_file.display()
        )
    })?;

    if cli.summary_json {
        println!("{}", serde_json::to_string(&report)?);
    }

    Ok(())
}
