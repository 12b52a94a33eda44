//! `carjoin run` / `carjoin validate`: config-driven fuzzy price join.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use carjoin_recon::merge::{write_enriched_csv, CsvOptions};
use carjoin_recon::{JoinConfig, JoinError, JoinResult, ReferenceTable, TargetTable};

use crate::exit_codes::{join_exit_code, Stage, EXIT_EMPTY, EXIT_ERROR, EXIT_TARGET_IO, EXIT_USAGE};
use crate::source;
use crate::CliError;

pub struct RunOptions {
    pub json: bool,
    pub report: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub fail_on_empty: bool,
    pub quiet: bool,
}

fn join_err(err: JoinError, stage: Stage) -> CliError {
    let hint = match &err {
        JoinError::MissingColumn { .. } => {
            Some("map the column under [target.columns] or [reference.columns]".to_string())
        }
        JoinError::LoadTimeout { .. } => Some("raise reference.timeout_secs".to_string()),
        _ => None,
    };
    CliError { code: join_exit_code(&err, stage), message: err.to_string(), hint }
}

fn load_config(config_path: &Path) -> Result<JoinConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| CliError {
        code: EXIT_USAGE,
        message: format!("cannot read config {}: {e}", config_path.display()),
        hint: None,
    })?;
    JoinConfig::from_toml(&config_str).map_err(|e| join_err(e, Stage::Config))
}

pub fn cmd_run(config_path: PathBuf, opts: RunOptions) -> Result<(), CliError> {
    let config = load_config(&config_path)?;

    // Resolve file paths relative to the config file's directory
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let target_path = base_dir.join(&config.target.file);
    let targets = source::read_target(&target_path)
        .and_then(|csv| TargetTable::from_csv(&csv, &config.target))
        .map_err(|e| join_err(e, Stage::Target))?;

    let references = source::read_reference(&config.reference, base_dir)
        .and_then(|csv| ReferenceTable::from_csv(&csv, &config.reference))
        .map_err(|e| join_err(e, Stage::Reference))?;

    tracing::info!(
        targets = targets.len(),
        references = references.len(),
        "inputs loaded"
    );

    let result = carjoin_recon::run(&config, &targets, &references)
        .map_err(|e| join_err(e, Stage::Join))?;

    // Output: --output wins over [output].file; neither means stdout
    // unless stdout is taken by --json.
    let csv_options = CsvOptions { include_key: config.output.include_key };
    let csv_path = opts
        .output
        .clone()
        .or_else(|| config.output.file.as_ref().map(|f| base_dir.join(f)));

    match csv_path {
        Some(ref path) => {
            let file = File::create(path).map_err(|e| CliError {
                code: EXIT_TARGET_IO,
                message: format!("cannot write output {}: {e}", path.display()),
                hint: None,
            })?;
            write_enriched_csv(&targets.headers, &result.records, BufWriter::new(file), csv_options)
                .map_err(|e| join_err(e, Stage::Target))?;
            if !opts.quiet {
                eprintln!("wrote {}", path.display());
            }
        }
        None if !opts.json => {
            let stdout = io::stdout();
            write_enriched_csv(&targets.headers, &result.records, stdout.lock(), csv_options)
                .map_err(|e| join_err(e, Stage::Target))?;
        }
        None => {}
    }

    if opts.json || opts.report.is_some() {
        let json_str = serde_json::to_string_pretty(&result).map_err(|e| CliError {
            code: EXIT_ERROR,
            message: format!("JSON serialization error: {e}"),
            hint: None,
        })?;

        if let Some(ref path) = opts.report {
            std::fs::write(path, &json_str).map_err(|e| CliError {
                code: EXIT_TARGET_IO,
                message: format!("cannot write report {}: {e}", path.display()),
                hint: None,
            })?;
            if !opts.quiet {
                eprintln!("wrote {}", path.display());
            }
        }

        if opts.json {
            let mut out = io::stdout().lock();
            let _ = writeln!(out, "{json_str}");
        }
    }

    if !opts.quiet {
        print_summary(&result);
    }

    if opts.fail_on_empty && result.records.is_empty() {
        return Err(CliError {
            code: EXIT_EMPTY,
            message: "join produced no enriched rows".into(),
            hint: Some(format!(
                "{} of {} reference keys matched; try a lower matching.cutoff",
                result.summary.matched_reference_keys, result.summary.reference_keys
            )),
        });
    }

    Ok(())
}

fn print_summary(result: &JoinResult) {
    let s = &result.summary;
    eprintln!(
        "join '{}': {} of {} target rows priced ({} dropped, {} filtered)",
        result.meta.config_name,
        s.enriched_rows,
        s.target_rows,
        s.dropped_target_rows,
        s.filtered_target_rows,
    );
    eprintln!(
        "reference: {} keys, {} matched, {} unmatched, {} rows skipped; {} priced target keys",
        s.reference_keys,
        s.matched_reference_keys,
        s.unmatched_reference_keys,
        s.skipped_reference_rows,
        s.indexed_target_keys,
    );
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let m = &config.matching;
    eprintln!(
        "valid: join '{}' ({} -> {}), metric {}, cutoff {}, prefix {}",
        config.name,
        config.reference.source,
        config.target.file,
        m.metric,
        m.cutoff,
        m.prefix_len,
    );
    Ok(())
}
