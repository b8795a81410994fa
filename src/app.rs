//! Application orchestrator.
//! Loads and merges config, initializes logging, installs the signal handler,
//! opens the stores and dispatches the subcommand.

use anyhow::{Context, Result};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

use media_relocate::cli::{Args, Command};
use media_relocate::config::{load_config, LoadResult, CONFIG_ENV};
use media_relocate::output as out;
use media_relocate::{
    default_config_path, reconcile, shutdown, Config, JsonHistoryLog, JsonMetadataStore, LocalFs,
    RelocateError, Relocator,
};

use crate::logging::init_tracing;

type AppRelocator = Relocator<JsonMetadataStore, JsonHistoryLog, LocalFs>;

const EXIT_FAILED: u8 = 1;
const EXIT_FATAL: u8 = 2;

pub fn run(args: Args) -> Result<ExitCode> {
    if args.print_config {
        print_config_location();
        return Ok(ExitCode::SUCCESS);
    }

    let mut cfg = match load_config()? {
        LoadResult::Loaded(cfg, _) => cfg,
        LoadResult::CreatedTemplate(path) => {
            out::print_success(&format!("A template config was written to: {}", path.display()));
            out::print_info("Edit `root_dir` and `base_url` (and optionally the data file locations), then re-run.");
            out::print_info(&format!("To use a different location set {CONFIG_ENV}."));
            return Ok(ExitCode::SUCCESS);
        }
        LoadResult::Missing(path) => {
            if let Some(p) = path {
                out::print_warn(&format!("Config {} not found; using defaults and flags", p.display()));
            }
            Config::default()
        }
    };
    args.apply_overrides(&mut cfg);

    let guard = init_tracing(cfg.log_level, cfg.log_file.as_deref(), args.json).map_err(|e| {
        out::print_error(&format!("Failed to initialize logging: {e}"));
        e
    })?;
    let guard_slot = Arc::new(Mutex::new(guard));
    {
        let guard_slot = Arc::clone(&guard_slot);
        ctrlc::set_handler(move || {
            shutdown::request();
            out::print_warn("Interrupt received; finishing the current item before stopping...");
            if let Ok(mut g) = guard_slot.lock() {
                let _ = g.take();
            }
        })
        .context("install signal handler")?;
    }

    debug!(?args, "Starting media_relocate");
    let result = dispatch(&args, &cfg);

    if let Ok(mut g) = guard_slot.lock() {
        let _ = g.take();
    }
    result
}

fn print_config_location() {
    if let Some(p) = std::env::var_os(CONFIG_ENV) {
        out::print_info(&format!(
            "Using {CONFIG_ENV} (explicit):\n  {}",
            std::path::Path::new(&p).display()
        ));
        return;
    }
    match default_config_path() {
        Some(p) => {
            out::print_info(&format!("Default config path:\n  {}", p.display()));
            if p.exists() {
                out::print_info("A config file already exists at that location.");
            } else {
                out::print_info("No config file exists there yet. Run any command to create a template.");
            }
        }
        None => out::print_error("Could not determine a default config path"),
    }
}

fn dispatch(args: &Args, cfg: &Config) -> Result<ExitCode> {
    let Some(command) = &args.command else {
        out::print_error("No command given; see --help");
        return Ok(ExitCode::from(EXIT_FAILED));
    };
    cfg.validate()?;

    let history = JsonHistoryLog::open(&cfg.history_file)
        .with_context(|| format!("open history log '{}'", cfg.history_file.display()))?;

    if let Command::History = command {
        let pending = reconcile::pending(&history).context("read history log")?;
        if args.json {
            out::print_json(&pending)?;
        } else {
            out::print_pending(&pending);
        }
        return Ok(ExitCode::SUCCESS);
    }

    // Leftovers from an earlier run are only reported here; `history` lists them.
    let leftovers = reconcile::pending(&history).context("read history log")?;
    if !leftovers.is_empty() {
        out::print_warn(&format!(
            "{} unfinished relocation(s) in the history log; run `history` to inspect",
            leftovers.len()
        ));
    }

    let store = JsonMetadataStore::open(&cfg.metadata_file)
        .with_context(|| format!("open metadata store '{}'", cfg.metadata_file.display()))?;
    let mut relocator = Relocator::new(cfg.tree(), store, history, LocalFs, cfg.relocator_options());

    if cfg.dry_run {
        return dry_run(&relocator, command, args.json);
    }

    match command {
        Command::Rename { old, new } => single(args, old, relocator.rename(old, new)),
        Command::Mkdir { path } => single(args, path, relocator.create_folder(path)),
        Command::Move { to, items } => batch(args, &mut relocator, items, to),
        Command::History => Ok(ExitCode::SUCCESS),
    }
}

fn single(args: &Args, label: &str, result: Result<media_relocate::Outcome, RelocateError>) -> Result<ExitCode> {
    match result {
        Ok(outcome) => {
            if args.json {
                out::print_json(&outcome)?;
            } else {
                out::print_outcome(label, &outcome);
            }
            Ok(if outcome.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_FAILED)
            })
        }
        Err(e) => Ok(report_error(label, &e)),
    }
}

fn batch(args: &Args, relocator: &mut AppRelocator, items: &[String], to: &str) -> Result<ExitCode> {
    let outcome = match relocator.move_items(items, to) {
        Ok(o) => o,
        Err(e) => return Ok(report_error(to, &e)),
    };
    if args.json {
        out::print_json(&outcome)?;
    } else {
        out::print_batch(&outcome);
    }
    for id in &outcome.unrecoverable {
        out::print_error(&format!(
            "Integrity at risk: inspect history entry {id} before retrying (run `history`)"
        ));
    }
    info!(
        moved = outcome.successful.len(),
        failed = outcome.failed.len(),
        status = outcome.status(),
        "Batch finished"
    );
    Ok(if !outcome.status() {
        ExitCode::from(EXIT_FATAL)
    } else if outcome.all_succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_FAILED)
    })
}

fn dry_run(relocator: &AppRelocator, command: &Command, json: bool) -> Result<ExitCode> {
    let plans = match command {
        Command::Rename { old, new } => vec![relocator.plan(old, new)],
        Command::Move { to, items } => items.iter().map(|i| relocator.plan_move(i, to)).collect(),
        Command::Mkdir { path } => {
            out::print_info(&format!("Dry-run: would create folder {path}"));
            return Ok(ExitCode::SUCCESS);
        }
        Command::History => Vec::new(),
    };

    let mut all_valid = true;
    let mut ok_plans = Vec::new();
    for plan in plans {
        match plan {
            Ok(p) => {
                all_valid &= p.valid;
                ok_plans.push(p);
            }
            Err(e) => {
                all_valid = false;
                out::print_error(&e.to_string());
            }
        }
    }
    if json {
        out::print_json(&ok_plans)?;
    } else {
        ok_plans.iter().for_each(out::print_plan);
    }
    Ok(if all_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_FAILED)
    })
}

/// Structured log plus a user line; the fatal case gets its own exit code.
fn report_error(label: &str, e: &RelocateError) -> ExitCode {
    let code = e.code();
    match e {
        RelocateError::Input(msg) => error!(code, kind = "input", item = label, %msg, "Rejected input"),
        RelocateError::NotFound(path) => {
            error!(code, kind = "not_found", path = %path.display(), "Item does not exist")
        }
        RelocateError::UnsupportedType(path) => {
            error!(code, kind = "unsupported_type", path = %path.display(), "Item is neither file nor folder")
        }
        RelocateError::HistoryUnavailable(err) => {
            error!(code, kind = "history_unavailable", error = %err, "Could not record relocation intent")
        }
        RelocateError::Metadata(err) => error!(code, kind = "metadata", error = %err, "Metadata store failed"),
        RelocateError::Io(err) => error!(code, kind = "io", error = %err, "I/O failure"),
        RelocateError::IntegrityAtRisk { history_id, details } => {
            error!(code, kind = "integrity_at_risk", %history_id, %details, "Rollback failed")
        }
    }
    out::print_error(&e.to_string());
    if e.is_fatal() {
        ExitCode::from(EXIT_FATAL)
    } else {
        ExitCode::from(EXIT_FAILED)
    }
}
