use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use passprep_core::Settings;
use passprep_server::commands::{
    self, parse_description_length, parse_title_style, parse_workbook_depth,
};
use passprep_server::{init_tracing, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;

fn cli() -> Command {
    Command::new("passprep")
        .version(passprep_server::VERSION)
        .about("PassPrep course-plan pipeline and run ledger")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Directory holding runs.json"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .help("Tracing filter, e.g. info or passprep_run=debug"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("serve").about("Serve the run API").arg(
                Arg::new("addr")
                    .long("addr")
                    .value_parser(value_parser!(SocketAddr))
                    .help("Bind address"),
            ),
        )
        .subcommand(
            Command::new("process")
                .about("Run a project file through the whole pipeline and write exports")
                .arg(
                    Arg::new("input")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Project JSON upload"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory for exported files"),
                )
                .arg(
                    Arg::new("modules")
                        .long("modules")
                        .default_value("4")
                        .value_parser(value_parser!(usize))
                        .help("Requested module count"),
                )
                .arg(
                    Arg::new("title-style")
                        .long("title-style")
                        .default_value("clear-practical")
                        .help("clear-practical, academic or inspirational"),
                )
                .arg(
                    Arg::new("description-length")
                        .long("description-length")
                        .default_value("medium")
                        .help("short, medium or long"),
                )
                .arg(
                    Arg::new("workbook-depth")
                        .long("workbook-depth")
                        .default_value("standard")
                        .help("light, standard or heavy"),
                ),
        )
        .subcommand(
            Command::new("show")
                .about("Print a stored run as JSON")
                .arg(Arg::new("run-id").required(true).help("Run id")),
        )
}

fn load_config(matches: &ArgMatches) -> Result<ServerConfig> {
    let mut config = ServerConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))
        .context("failed to load configuration")?;
    if let Some(dir) = matches.get_one::<PathBuf>("data-dir") {
        config = config.with_data_dir(dir);
    }
    if let Some(level) = matches.get_one::<String>("log-level") {
        config = config.with_log_level(level);
    }
    if matches.get_flag("log-json") {
        config = config.with_log_json(true);
    }
    Ok(config)
}

fn process_settings(matches: &ArgMatches) -> Result<Settings> {
    let arg = |name: &str| {
        matches
            .get_one::<String>(name)
            .map(String::as_str)
            .unwrap_or_default()
    };
    Ok(Settings::new()
        .with_module_count(matches.get_one::<usize>("modules").copied().unwrap_or(4))
        .with_title_style(parse_title_style(arg("title-style"))?)
        .with_description_length(parse_description_length(arg("description-length"))?)
        .with_workbook_depth(parse_workbook_depth(arg("workbook-depth"))?))
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    let mut config = load_config(&matches)?;

    match matches.subcommand() {
        Some(("serve", sub)) => {
            if let Some(addr) = sub.get_one::<SocketAddr>("addr") {
                config = config.with_bind_addr(*addr);
            }
            init_tracing(&config)?;
            commands::serve(&config).await
        }
        Some(("process", sub)) => {
            init_tracing(&config)?;
            let input = sub
                .get_one::<PathBuf>("input")
                .context("missing input file")?;
            let out = sub.get_one::<PathBuf>("out").context("missing --out")?;
            let outcome = commands::process(&config, input, out, process_settings(sub)?)?;
            for path in &outcome.written {
                eprintln!("wrote {}", path.display());
            }
            println!("{}", outcome.run_id);
            Ok(())
        }
        Some(("show", sub)) => {
            init_tracing(&config)?;
            let run_id = sub.get_one::<String>("run-id").context("missing run id")?;
            println!("{}", commands::show(&config, run_id)?);
            Ok(())
        }
        other => anyhow::bail!("unsupported command: {:?}", other.map(|(name, _)| name)),
    }
}
