//! Command line arguments parsing.

// SPDX-License-Identifier: AGPL-3.0-or-later

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "routecfg-importer", disable_version_flag = true)]
pub struct Importer {
    /// Config file path
    #[arg(long)]
    pub config_file: Option<PathBuf>,
    /// Print version
    #[arg(short = 'v')]
    pub print_version: bool,
    /// Print version including the pre-release suffix
    #[arg(long = "version")]
    pub print_full_version: bool,
    /// Address-assignment input file
    pub input_file: Option<PathBuf>,
}
