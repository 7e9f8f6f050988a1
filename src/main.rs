use std::{env, error::Error};

use clap::Parser;
use extraneous::{cli::args::CliArgs, config::ExtraneousConfig, Extraneous};

fn main() {
    let cli_args = CliArgs::parse();
    let default_filter = if cli_args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(e) = run(cli_args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli_args: CliArgs) -> Result<(), Box<dyn Error>> {
    let root = match cli_args.root {
        Some(root) => root,
        None => env::current_dir()?,
    };
    let config = ExtraneousConfig::load(&root)?;

    let mut builder = Extraneous::builder()
        .root(&root)
        .full(cli_args.full || config.full)
        .verbose(cli_args.verbose)
        .color(true);

    builder = if cli_args.exclude.is_empty() {
        builder.exclude(config.exclude)
    } else {
        builder.exclude(cli_args.exclude)
    };

    if !cli_args.include.is_empty() {
        builder = builder.requirement_files(cli_args.include);
    } else if let Some(files) = config.requirement_files {
        builder = builder.requirement_files(files);
    }

    if !cli_args.site_packages.is_empty() {
        builder = builder.site_packages(cli_args.site_packages);
    } else if let Some(dirs) = config.site_packages {
        builder = builder.site_packages(dirs);
    }

    let extraneous = builder.try_build()?;
    extraneous.check(&mut anstream::stdout().lock())?;

    Ok(())
}
