//! Routing classifier: turns changed file paths into a tracker routing
//! decision.
//!
//! The per-path classification query is advisory and may be ambiguous or
//! unavailable; every failure mode here recovers to the caller's default.
//! Report format: a header line names a classification, each indented line
//! under it is one path attributed to that classification.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use downport_core::capabilities::BuildTool;
use downport_core::types::RoutingDecision;

/// The non-actionable sentinel the query emits for unowned paths.
const UNKNOWN: &str = "UNKNOWN";

/// Choose a routing decision for `files_changed`.
///
/// Empty input returns `default` immediately: early in translation the files
/// may not exist in the target tree yet, so there is nothing to ask the
/// query about.
pub fn classify(
    build: &dyn BuildTool,
    workdir: &Path,
    dir_prefix: &Path,
    files_changed: &BTreeSet<String>,
    default: &RoutingDecision,
) -> RoutingDecision {
    if files_changed.is_empty() {
        return default.clone();
    }

    let paths: Vec<PathBuf> = files_changed
        .iter()
        .map(|file| dir_prefix.join(file))
        .collect();

    let report = match build.classify_paths(workdir, &paths) {
        Ok(report) => report,
        Err(err) => {
            tracing::warn!(error = %err, "classification query failed; using default routing");
            return default.clone();
        }
    };

    match pick(&tally(&report)) {
        Some(label) => RoutingDecision::from_label(&label).unwrap_or_else(|| {
            tracing::warn!(label = %label, "classification label not in Product :: Component form");
            default.clone()
        }),
        None => default.clone(),
    }
}

/// Count detail lines per classification header, preserving first-seen order.
fn tally(report: &str) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut current: Option<usize> = None;

    for line in report.lines() {
        if line.starts_with(' ') {
            let Some(index) = current else {
                // Detail line before any header; the report is malformed
                // around it, so it attributes to nothing.
                continue;
            };
            counts[index].1 += 1;
        } else {
            let header = line.trim().to_owned();
            let index = match counts.iter().position(|(name, _)| name == &header) {
                Some(index) => index,
                None => {
                    counts.push((header, 0));
                    counts.len() - 1
                }
            };
            current = Some(index);
        }
    }

    // Headers with no attributed paths carry no signal.
    counts.retain(|(_, count)| *count > 0);
    counts
}

/// Highest frequency wins; ties keep first-seen order. `UNKNOWN` is demoted
/// when any alternative exists, and loses outright when it is the only
/// candidate.
fn pick(counts: &[(String, usize)]) -> Option<String> {
    let mut ranked: Vec<&(String, usize)> = counts.iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let mut winner = ranked.first()?.0.as_str();
    if winner == UNKNOWN {
        winner = ranked.get(1)?.0.as_str();
    }
    if winner == UNKNOWN {
        return None;
    }
    Some(winner.to_owned())
}
