use std::fmt::Write as _;
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use calc_core::format::Locale;
use calc_core::store::{MemoryStoreFactory, StoreConfig, StoreRegistry};
use calc_core::{Catalog, ResultStore, SavedResult};
use calc_data::RateTableLoader;
use calc_store_sqlite::SqliteStoreFactory;
use tracing::{debug, error, info};

use crate::config::AppConfig;
use crate::render::{render_chart, render_description, render_history, render_outputs};
use crate::utils::parse_override;

/// Registry with every storage backend this binary ships.
pub fn build_registry() -> StoreRegistry {
    let mut registry = StoreRegistry::new();
    registry.register(Box::new(MemoryStoreFactory));
    registry.register(Box::new(SqliteStoreFactory));
    registry
}

/// Built-in calculators, with tables from `config.rate_tables` when set.
pub fn build_catalog(config: &AppConfig) -> Result<Catalog> {
    let Some(path) = &config.rate_tables else {
        return Ok(Catalog::builtin()?);
    };

    let file = File::open(path)
        .with_context(|| format!("Failed to open rate tables: {}", path.display()))?;
    let tables = RateTableLoader::load(file)
        .with_context(|| format!("Failed to load rate tables: {}", path.display()))?;
    info!(path = %path.display(), tables = tables.len(), "Loaded rate tables");

    Catalog::builtin_with_tables(&tables).context("Rate tables rejected by calculator catalog")
}

/// Opens the configured store. Failure is logged and yields `None`;
/// nothing that depends on storage is allowed to stop a calculation.
pub async fn open_store(
    registry: &StoreRegistry,
    config: &StoreConfig,
) -> Option<Box<dyn ResultStore>> {
    match registry.create(config).await {
        Ok(store) => Some(store),
        Err(e) => {
            error!(backend = %config.backend, error = %e, "Failed to open result store");
            None
        }
    }
}

pub fn list(catalog: &Catalog) -> String {
    let width = catalog.slugs().iter().map(|s| s.len()).max().unwrap_or(0);
    let mut out = String::new();
    for calculator in catalog.iter() {
        let _ = writeln!(out, "{:<width$}  {}", calculator.slug(), calculator.title());
    }
    out
}

pub fn describe(
    catalog: &Catalog,
    slug: &str,
) -> Result<String> {
    let calculator = catalog.get(slug)?;
    Ok(render_description(calculator, &calculator.default_inputs()))
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Raw `id=value` edits applied on top of the defaults, in order.
    pub overrides: Vec<String>,
    pub save: bool,
    /// Directory that receives a JSON copy of the result.
    pub export: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub result: SavedResult,
    /// Formatted outputs followed by the chart.
    pub output: String,
    /// Non-fatal storage and export problems, for the user.
    pub notices: Vec<String>,
    pub exported: Option<PathBuf>,
}

/// Computes `slug` with `options.overrides` applied, then saves and
/// exports as requested.
///
/// # Errors
///
/// Unknown calculators, unknown fields and malformed overrides fail the
/// run. Storage and export failures never do; they are reported in
/// [`RunReport::notices`].
pub async fn run(
    catalog: &Catalog,
    store: Option<&dyn ResultStore>,
    config: &AppConfig,
    slug: &str,
    options: &RunOptions,
) -> Result<RunReport> {
    let calculator = catalog.get(slug)?;
    let spec = calculator.input_spec();

    let mut inputs = calculator.default_inputs();
    for raw in &options.overrides {
        let (id, value) = parse_override(raw)?;
        inputs
            .set_raw(spec, &id, &value)
            .with_context(|| format!("Cannot apply '{raw}' to {slug}"))?;
        debug!(field = %id, value = %value, "Applied override");
    }

    let outputs = calculator.compute(&inputs);
    let chart = calculator.chart(&inputs, &outputs);

    let mut output = render_outputs(calculator.output_spec(), &outputs, config.locale);
    output.push('\n');
    output.push_str(&render_chart(&chart, config.locale));

    let result = SavedResult::capture(slug, calculator.title(), inputs, outputs);
    let mut notices = Vec::new();

    if options.save {
        match store {
            Some(store) => match store.append(result.clone(), config.history_cap).await {
                Ok(()) => info!(slug, "Saved result"),
                Err(e) => {
                    error!(slug, error = %e, "Failed to save result");
                    notices.push(format!("Result not saved: {e}"));
                }
            },
            None => notices.push("Result not saved: storage is unavailable".to_string()),
        }
    }

    let mut exported = None;
    if let Some(dir) = &options.export {
        match export_result(&result, dir) {
            Ok(path) => {
                info!(path = %path.display(), "Exported result");
                exported = Some(path);
            }
            Err(e) => {
                error!(error = ?e, "Failed to export result");
                notices.push(format!("Export failed: {e:#}"));
            }
        }
    }

    Ok(RunReport {
        result,
        output,
        notices,
        exported,
    })
}

/// Writes `record` as pretty JSON to `<dir>/<slug>-<timestamp>.json`.
/// A partially written file is removed on failure.
pub fn export_result(
    record: &SavedResult,
    dir: &Path,
) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(record).context("Failed to serialize result")?;

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory: {}", dir.display()))?;

    let path = dir.join(format!("{}-{}.json", record.slug, record.timestamp));
    if let Err(e) = std::fs::write(&path, json) {
        let _ = std::fs::remove_file(&path);
        return Err(e).with_context(|| format!("Failed to write export: {}", path.display()));
    }
    Ok(path)
}

/// Saved results, newest first, optionally limited to one calculator.
/// With `clear`, empties the store instead.
pub async fn history(
    catalog: &Catalog,
    store: Option<&dyn ResultStore>,
    locale: Locale,
    slug: Option<&str>,
    clear: bool,
) -> String {
    let Some(store) = store else {
        return "History unavailable: storage is unavailable\n".to_string();
    };

    if clear {
        return match store.clear().await {
            Ok(()) => "History cleared.\n".to_string(),
            Err(e) => {
                error!(error = %e, "Failed to clear history");
                format!("History not cleared: {e}\n")
            }
        };
    }

    match store.list().await {
        Ok(records) => {
            let records: Vec<SavedResult> = records
                .into_iter()
                .filter(|r| slug.is_none_or(|s| r.slug == s))
                .collect();
            render_history(&records, catalog, locale)
        }
        Err(e) => {
            error!(error = %e, "Failed to read history");
            format!("History unavailable: {e}\n")
        }
    }
}
