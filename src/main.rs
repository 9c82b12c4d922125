//! Importer entry point: one-shot batch run from assignment file to
//! submitted routing configuration

// SPDX-License-Identifier: AGPL-3.0-or-later

mod arg;

use clap::Parser;
use routecfg::{client, coalesce, config, input, resolver};
use simplelog::{ColorChoice, CombinedLogger, SharedLogger, TermLogger, TerminalMode, WriteLogger};
use std::fs::{File, OpenOptions};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const COMPONENT: &str = "routecfg-importer";
const VERSION: &str = env!("CARGO_PKG_VERSION");
const PRE_RELEASE: &str = "-rc.0";
const CONFIG_FILENAME: &str = "routecfg-importer.yml";

/// Default config location is next to the executable
fn default_config_path() -> std::io::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let dir = exe.parent().unwrap_or_else(|| Path::new("."));
    Ok(dir.join(CONFIG_FILENAME))
}

fn setup_logger(cfg: &config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let level = cfg.level_filter()?;
    let log_config = simplelog::ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();
    std::fs::create_dir_all(&cfg.log_directory)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(Path::new(&cfg.log_directory).join(format!("{COMPONENT}.log")))?;
    let loggers: Vec<Box<dyn SharedLogger>> = vec![
        TermLogger::new(
            level,
            log_config.clone(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(level, log_config, file),
    ];
    CombinedLogger::init(loggers)?;
    Ok(())
}

fn run(input_file: &Path, cfg: &config::Config) -> Result<(), String> {
    let mapping = resolver::fetch_office_groups(cfg)
        .map_err(|e| format!("failed to get mapping info, {e}"))?;

    let file =
        File::open(input_file).map_err(|e| format!("failed to open input file, {e}"))?;
    let records = input::read_records(
        BufReader::new(file),
        cfg.input_format,
        &mapping,
        cfg.dedup_records,
    )
    .map_err(|e| format!("failed to get routing records, {e}"))?;

    let merged = coalesce::coalesce(records);
    log::info!("success to merge, records[{}]", merged.len());
    let document = coalesce::group(&merged);

    client::submit_json(&cfg.submit_api_url, &document)
        .map_err(|e| format!("failed to post routing records, {e}"))?;
    Ok(())
}

fn main() -> ExitCode {
    let args = arg::Importer::parse();

    if args.print_version {
        println!("{COMPONENT} {VERSION}");
        return ExitCode::SUCCESS;
    }
    if args.print_full_version {
        println!("{COMPONENT} {VERSION}{PRE_RELEASE}");
        return ExitCode::SUCCESS;
    }

    let Some(input_file) = args.input_file else {
        eprintln!("there is no INPUT_FILE");
        return ExitCode::FAILURE;
    };
    if !input_file.exists() {
        eprintln!("no such file, {}", input_file.display());
        return ExitCode::FAILURE;
    }

    let config_path = match args.config_file {
        Some(path) => path,
        None => match default_config_path() {
            Ok(path) => path,
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
        },
    };
    let cfg = match config::Config::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = setup_logger(&cfg) {
        eprintln!("failed to initialize logger, {e}");
        return ExitCode::FAILURE;
    }

    log::info!("program started");
    let code = match run(&input_file, &cfg) {
        Ok(()) => {
            let msg = format!("success to import, {}", input_file.display());
            log::info!("{msg}");
            println!("{msg}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    };
    log::info!("program ended");
    code
}
