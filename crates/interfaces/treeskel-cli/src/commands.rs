use crate::prompt::StdinPrompt;
use crate::CliFormat;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use treeskel_pipeline::{
    copy_structure, AssumeYes, ConfirmPort, CopyReport, CopyRequest, Outcome, ProgressMessage,
    ValidatedPair, Validator,
};

/// What `check` found at the target root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    /// Will be created by the copy.
    Missing,
    Empty,
    /// Copy will ask before writing into it.
    NonEmpty,
}

#[derive(Debug, Clone)]
pub struct CheckSummary {
    pub pair: ValidatedPair,
    pub target_state: TargetState,
}

pub fn cmd_copy(
    source: String,
    target: String,
    assume_yes: bool,
    format: CliFormat,
) -> Result<CopyReport> {
    let request = CopyRequest {
        source,
        target,
        assume_yes,
    };
    if assume_yes {
        run_copy(&request, &AssumeYes, format)
    } else {
        run_copy(&request, &StdinPrompt, format)
    }
}

fn run_copy<C: ConfirmPort>(
    request: &CopyRequest,
    confirm: &C,
    format: CliFormat,
) -> Result<CopyReport> {
    let mut print = |message: &ProgressMessage| match format {
        CliFormat::Text => println!("{}", message),
        CliFormat::Json => match serde_json::to_string(message) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::error!("Cannot encode {:?}: {}", message, e),
        },
    };

    let report = copy_structure(request, confirm, &mut print).context("Copy not started")?;

    match format {
        CliFormat::Text => {
            println!("\n:: Copy Result");
            println!("   Directories created: {}", report.stats.dirs_created);
            println!("   Files created:       {}", report.stats.files_created);
            println!("   Symlinks skipped:    {}", report.stats.symlinks_skipped);
            println!("   Failures:            {}", report.stats.failures);
        }
        CliFormat::Json => println!("{}", serde_json::to_string(&report)?),
    }

    Ok(report)
}

pub fn cmd_check(source: String, target: String) -> Result<CheckSummary> {
    println!(":: Checking structure copy...");
    println!("   Source: {}", source.trim());
    println!("   Target: {}", target.trim());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Scanning source for conflicts...");

    let checked = Validator::check(&source, &target).and_then(|outcome| match outcome {
        Outcome::Ready(pair) => {
            let target_state = if pair.target.exists() {
                TargetState::Empty
            } else {
                TargetState::Missing
            };
            Ok(CheckSummary { pair, target_state })
        }
        // Read-only: look past the question to report conflicts too.
        Outcome::NeedsConfirmation(pending) => pending.accept().map(|pair| CheckSummary {
            pair,
            target_state: TargetState::NonEmpty,
        }),
    });

    match &checked {
        Ok(_) => pb.finish_with_message("Scan complete."),
        Err(_) => pb.abandon_with_message("Scan stopped."),
    }
    let summary = checked.context("Check failed")?;

    println!("\n:: Check Result");
    println!(
        "   Target:    {}",
        match summary.target_state {
            TargetState::Missing => "missing (will be created)",
            TargetState::Empty => "empty",
            TargetState::NonEmpty => "not empty (copy will ask first)",
        }
    );
    println!("   Conflicts: none");
    println!("   Status:    Ready (run `copy`)");

    Ok(summary)
}
