use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "ufolint",
    version,
    about = "Source format linter for UFO v2/v3 font packages"
)]
pub struct Cli {
    #[arg(required = true, value_name = "PACKAGE")]
    pub paths: Vec<PathBuf>,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}
