#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

mod cli;
mod error_fmt;
mod run;

use clap::Parser;
use cli::{Cli, Commands, RegistryCmd, FILE_GUARD, JSON_MODE};
use error_fmt::{exit_code_for_error, format_error_json, humanize};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

fn init_logging(args: &Cli, cfg: &padcal_config::Config) -> eyre::Result<()> {
    let level = cfg
        .logging
        .level
        .clone()
        .unwrap_or_else(|| args.log_level.clone());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Optional JSON-lines file sink with rotation from config.
    let file_layer = match &cfg.logging.file {
        Some(path) => {
            let path = std::path::Path::new(path);
            let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
            let name = path
                .file_name()
                .map_or_else(|| "padcal.log".into(), |n| n.to_string_lossy().into_owned());
            let appender = match cfg.logging.rotation.as_deref() {
                Some("daily") => tracing_appender::rolling::daily(dir, name),
                Some("hourly") => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_ansi(false),
            )
        }
        None => None,
    };

    // Box the console layer so both output modes share one composition.
    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);
    let console = if args.json {
        console.json().boxed()
    } else {
        console.boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| eyre::eyre!("init logging: {e}"))?;
    Ok(())
}

fn load_config(args: &Cli) -> eyre::Result<padcal_config::Config> {
    if args.config.exists() {
        let text = std::fs::read_to_string(&args.config)
            .map_err(|e| eyre::eyre!("read config {:?}: {}", args.config, e))?;
        let cfg = padcal_config::load_toml(&text)
            .map_err(|e| eyre::eyre!("parse config {:?}: {}", args.config, e))?;
        cfg.validate()?;
        Ok(cfg)
    } else {
        // Commands that take explicit file arguments work without a config;
        // grid dimensions then come from the files themselves.
        Ok(padcal_config::load_toml("[grid]\nrows = 64\ncols = 64\n")
            .map_err(|e| eyre::eyre!("built-in config: {e}"))?)
    }
}

fn dispatch(args: &Cli, cfg: &padcal_config::Config) -> eyre::Result<()> {
    match &args.cmd {
        Commands::Analyze {
            frame,
            threshold,
            no_clusters,
        } => run::run_analyze(cfg, frame, *threshold, *no_clusters),
        Commands::GenMap { frame, out, target } => run::run_gen_map(cfg, frame, out, *target),
        Commands::ApplyMap { frame, map, out } => {
            run::run_apply_map(frame, map, out.as_deref())
        }
        Commands::Weigh {
            frame,
            registry,
            map,
            tare,
        } => run::run_weigh(registry, frame, map.as_deref(), tare.as_deref()),
        Commands::Registry { cmd } => match cmd {
            RegistryCmd::Summary { registry } => run::run_registry_summary(registry),
            RegistryCmd::Update {
                registry,
                id,
                slope,
                intercept,
                r_squared,
                measurement_count,
            } => run::run_registry_update(
                registry,
                id,
                *slope,
                *intercept,
                *r_squared,
                *measurement_count,
            ),
        },
        Commands::Audit { doc } => run::run_audit(doc),
        Commands::SelfCheck { registry } => run::run_self_check(cfg, registry.as_deref()),
    }
}

fn main() {
    let args = Cli::parse();
    let _ = JSON_MODE.set(args.json);

    if let Err(e) = color_eyre::install() {
        eprintln!("failed to install error reporting: {e}");
    }

    let outcome = load_config(&args).and_then(|cfg| {
        init_logging(&args, &cfg)?;
        dispatch(&args, &cfg)
    });

    if let Err(err) = outcome {
        if args.json {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}
