use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

use calc_cli::app::{self, RunOptions};
use calc_cli::config::AppConfig;
use calc_cli::logging;
use calc_core::format::Locale;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Financial and tax calculators.
///
/// Computes results from literal defaults plus `--set` overrides, prints
/// them with a text chart, and optionally keeps a capped history.
#[derive(Debug, Parser)]
#[command(name = "calc")]
#[command(version, about, long_about = None)]
struct Cli {
    /// TOML config file. Defaults to `calc.toml` when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output locale (en, it, es). Overrides the config file.
    #[arg(long, global = true)]
    locale: Option<Locale>,

    /// Log filter, e.g. `debug`. Overrides the config file, not `RUST_LOG`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every calculator.
    List,

    /// Show a calculator's input fields and outputs.
    Describe { slug: String },

    /// Compute a calculator's results.
    Run {
        slug: String,

        /// Field edit, repeatable.
        #[arg(long = "set", value_name = "ID=VALUE")]
        set: Vec<String>,

        /// Append the result to the saved history.
        #[arg(long)]
        save: bool,

        /// Write the result as JSON into this directory.
        #[arg(long, value_name = "DIR")]
        export: Option<PathBuf>,
    },

    /// Show saved results, newest first.
    History {
        /// Only results of this calculator.
        #[arg(long)]
        slug: Option<String>,

        /// Delete every saved result instead.
        #[arg(long)]
        clear: bool,
    },
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_default_logging();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(locale) = cli.locale {
        config.locale = locale;
    }
    logging::apply_config(&config.logging, cli.log_level.as_deref())?;
    debug!(?config, "configuration loaded");

    let catalog = app::build_catalog(&config)?;

    match cli.command {
        Command::List => print!("{}", app::list(&catalog)),
        Command::Describe { slug } => print!("{}", app::describe(&catalog, &slug)?),
        Command::Run {
            slug,
            set,
            save,
            export,
        } => {
            let store = if save {
                app::open_store(&app::build_registry(), &config.store).await
            } else {
                None
            };
            let options = RunOptions {
                overrides: set,
                save,
                export,
            };

            let report = app::run(&catalog, store.as_deref(), &config, &slug, &options).await?;

            print!("{}", report.output);
            if let Some(path) = &report.exported {
                println!("Exported to {}", path.display());
            }
            for notice in &report.notices {
                println!("Notice: {notice}");
            }
        }
        Command::History { slug, clear } => {
            let store = app::open_store(&app::build_registry(), &config.store).await;
            let text = app::history(
                &catalog,
                store.as_deref(),
                config.locale,
                slug.as_deref(),
                clear,
            )
            .await;
            print!("{text}");
        }
    }

    Ok(())
}
