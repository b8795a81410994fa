//! User-facing printing.
//!
//! Status lines are colored only when stdout is a TTY. Command results go to
//! stdout, either as plain lines or as one JSON document with `--json`.

use owo_colors::OwoColorize;
use serde::Serialize;

use crate::reconcile::PendingEntry;
use crate::relocator::{BatchOutcome, Outcome, Plan};

fn is_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

pub fn print_info(msg: &str) {
    if is_tty() {
        println!("{} {}", "info:".cyan().bold(), msg);
    } else {
        println!("info: {msg}");
    }
}

pub fn print_warn(msg: &str) {
    if is_tty() {
        eprintln!("{} {}", "warn:".yellow().bold(), msg);
    } else {
        eprintln!("warn: {msg}");
    }
}

pub fn print_error(msg: &str) {
    if is_tty() {
        eprintln!("{} {}", "error:".red().bold(), msg);
    } else {
        eprintln!("error: {msg}");
    }
}

pub fn print_success(msg: &str) {
    if is_tty() {
        println!("{} {}", "ok:".green().bold(), msg);
    } else {
        println!("ok: {msg}");
    }
}

/// Plain line without prefix, for output users may script against.
pub fn print_user(msg: &str) {
    println!("{msg}");
}

/// One JSON document on stdout.
pub fn print_json<T: Serialize>(value: &T) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_outcome(old: &str, outcome: &Outcome) {
    match (&outcome.new_path, &outcome.error_message) {
        (Some(new), _) if outcome.success => print_success(&format!("{old} -> {new}")),
        (_, Some(reason)) => print_error(&format!("{old}: {reason}")),
        _ => print_error(&format!("{old}: failed")),
    }
}

pub fn print_batch(outcome: &BatchOutcome) {
    for path in &outcome.successful {
        print_success(path);
    }
    for failed in &outcome.failed {
        print_error(&format!("{}: {}", failed.path, failed.reason));
    }
    print_user(&format!(
        "{} moved, {} failed",
        outcome.successful.len(),
        outcome.failed.len()
    ));
}

pub fn print_plan(plan: &Plan) {
    if plan.valid {
        print_info(&format!("Dry-run: {} {} -> {}", plan.kind, plan.old, plan.new));
    } else {
        print_warn(&format!(
            "Dry-run: {} -> {} would fail: {}",
            plan.old,
            plan.new,
            plan.reason.as_deref().unwrap_or("invalid")
        ));
    }
    for mv in &plan.moves {
        print_user(&format!("  {} -> {}", mv.old.display(), mv.new.display()));
    }
}

pub fn print_pending(entries: &[PendingEntry]) {
    if entries.is_empty() {
        print_success("No unfinished relocations");
        return;
    }
    for e in entries {
        print_warn(&format!(
            "{} ({}): {} -> {}",
            e.id,
            e.created_at,
            e.old.display(),
            e.new.display()
        ));
        for (old, new) in &e.unreversed {
            print_user(&format!("  possibly moved: {} -> {}", old.display(), new.display()));
        }
    }
}
