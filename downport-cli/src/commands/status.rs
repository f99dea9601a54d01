//! `downport status` — sync visibility.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use downport_core::config::SyncConfig;
use downport_core::store::SyncStore;
use downport_core::types::{SyncPhase, SyncRecord};

/// Arguments for `downport status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct SyncJson {
    pr: u64,
    phase: String,
    issue: u64,
    source_branch: Option<String>,
    target_branch: Option<String>,
    updated_at: String,
}

#[derive(Tabled)]
struct SyncTableRow {
    #[tabled(rename = "pr")]
    pr: u64,
    #[tabled(rename = "phase")]
    phase: String,
    #[tabled(rename = "issue")]
    issue: u64,
    #[tabled(rename = "workspaces")]
    workspaces: String,
    #[tabled(rename = "updated")]
    updated: String,
}

impl StatusArgs {
    pub fn run(self, config: &SyncConfig) -> Result<()> {
        let store = SyncStore::open(&config.paths.store);
        let state = store.snapshot().context("failed to load sync store")?;

        if self.json {
            let payload: Vec<SyncJson> = state.syncs.iter().map(to_json).collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize status")?
            );
            return Ok(());
        }

        if state.syncs.is_empty() {
            println!("No syncs tracked. Feed a change-request event with `downport intake`.");
            return Ok(());
        }

        let errored = state
            .syncs
            .iter()
            .filter(|s| s.phase == SyncPhase::Error)
            .count();
        println!(
            "downport v{} | {} syncs | {} errored",
            env!("CARGO_PKG_VERSION"),
            state.syncs.len(),
            errored,
        );

        let rows: Vec<SyncTableRow> = state.syncs.iter().map(to_row).collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");

        if errored > 0 {
            println!(
                "{}",
                "Errored syncs keep their workspaces; see the tracker issue for details."
                    .yellow()
            );
        }
        Ok(())
    }
}

fn to_json(sync: &SyncRecord) -> SyncJson {
    SyncJson {
        pr: sync.pr.0,
        phase: sync.phase.to_string(),
        issue: sync.issue.0,
        source_branch: sync.source_branch.as_ref().map(|b| b.0.clone()),
        target_branch: sync.target_branch.as_ref().map(|b| b.0.clone()),
        updated_at: sync.updated_at.to_rfc3339(),
    }
}

fn to_row(sync: &SyncRecord) -> SyncTableRow {
    let workspaces = match (&sync.source_branch, &sync.target_branch) {
        (None, None) => "—".to_owned(),
        (source, target) => format!(
            "{} / {}",
            source.as_ref().map(|b| b.0.as_str()).unwrap_or("—"),
            target.as_ref().map(|b| b.0.as_str()).unwrap_or("—"),
        ),
    };
    SyncTableRow {
        pr: sync.pr.0,
        phase: phase_label(sync.phase),
        issue: sync.issue.0,
        workspaces,
        updated: format_age(sync.updated_at),
    }
}

fn phase_label(phase: SyncPhase) -> String {
    match phase {
        SyncPhase::Reported => phase.to_string().green().to_string(),
        SyncPhase::Error => phase.to_string().red().bold().to_string(),
        other => other.to_string(),
    }
}

fn format_age(timestamp: chrono::DateTime<chrono::Utc>) -> String {
    let seconds = chrono::Utc::now()
        .signed_duration_since(timestamp)
        .num_seconds()
        .max(0) as u64;
    if seconds < 60 {
        return format!("{seconds}s");
    }
    if seconds < 60 * 60 {
        return format!("{}m", seconds / 60);
    }
    if seconds < 60 * 60 * 24 {
        return format!("{}h", seconds / (60 * 60));
    }
    format!("{}d", seconds / (60 * 60 * 24))
}
