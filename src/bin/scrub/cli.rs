use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "scrub", version, about = "GPX File Scrubber", long_about = None)]
pub struct Cli {
    /// The path to the gpx file to be scrubbed
    pub filepath: PathBuf,

    /// The maximum distance between points, in meters
    #[arg(allow_hyphen_values = true)]
    pub max_dist: String,

    /// The path to the file to be written with the output
    pub output_file: PathBuf,

    #[arg(long = "loglevel", default_value_t = String::from("info"))]
    pub log_level: String,

    /// Print a JSON summary of kept and dropped points on stdout
    #[arg(long = "summary-json")]
    pub summary_json: bool,
}
