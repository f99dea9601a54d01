//! Try-run support: affected-test discovery, try-message construction, and
//! the try push itself.
//!
//! The try message is a single-line directive naming platforms, job suites,
//! and colon-prefixed `suite:path` test selectors. It rides on an empty
//! marker commit that is always reset away after the push.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use regex::Regex;

use downport_core::capabilities::{BuildTool, CapabilityError, VcsWorkspace};

use crate::error::EngineError;

const TRY_TEMPLATE: &str = "try: -b do -p win32,win64,linux64,linux -u {test_jobs} \
                            -t none --artifact --try-test-paths {prefixed_paths}";
const PLATFORM_SUFFIX: &str = "[linux64-stylo,Ubuntu,10.10,Windows 7,Windows 8,Windows 10]";

/// Tests affected by `revish`, grouped by test type, parsed from the build
/// tool's tab-separated `(path, type)` report. Malformed lines are logged
/// and skipped.
pub fn affected_tests(
    build: &dyn BuildTool,
    workdir: &Path,
    revish: Option<&str>,
) -> Result<BTreeMap<String, BTreeSet<String>>, CapabilityError> {
    let report = build.tests_affected(workdir, revish)?;
    let mut by_type: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for line in report.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.split_once('\t') {
            Some((path, test_type)) => {
                by_type
                    .entry(test_type.trim().to_owned())
                    .or_default()
                    .insert(path.trim().to_owned());
            }
            None => {
                tracing::warn!(line, "unparseable tests-affected line");
            }
        }
    }
    Ok(by_type)
}

fn suite_for(test_type: &str) -> Option<&'static str> {
    match test_type {
        "testharness" => Some("web-platform-tests"),
        "reftest" => Some("web-platform-tests-reftests"),
        "wdspec" => Some("web-platform-tests-wdspec"),
        _ => None,
    }
}

/// Render the try directive for a set of affected tests.
pub fn try_message(tests_by_type: &BTreeMap<String, BTreeSet<String>>) -> String {
    let mut test_jobs = Vec::new();
    let mut prefixed_paths = Vec::new();

    for (test_type, paths) in tests_by_type {
        let Some(suite) = suite_for(test_type) else {
            tracing::warn!(test_type = %test_type, "no try suite for test type");
            continue;
        };
        if !paths.is_empty() {
            let machines = if suite == "web-platform-tests" {
                PLATFORM_SUFFIX
            } else {
                ""
            };
            test_jobs.push(format!("{suite}{machines}"));
            test_jobs.push(format!("{suite}-e10s{machines}"));
        }
        for path in paths {
            prefixed_paths.push(format!("{suite}:{path}"));
        }
    }

    TRY_TEMPLATE
        .replace("{test_jobs}", &test_jobs.join(","))
        .replace("{prefixed_paths}", &prefixed_paths.join(","))
}

/// Push the workspace tip to the `try` remote under an empty marker commit
/// carrying `message`.
///
/// The marker commit is reset away whether or not the push succeeds.
/// Returns the results URL when the push output carries a revision token.
pub fn push_to_try(
    work: &dyn VcsWorkspace,
    message: &str,
) -> Result<Option<String>, EngineError> {
    let try_err = |detail: String| EngineError::TryPush { detail };

    work.commit(message, true)
        .map_err(|e| try_err(format!("creating try commit: {e}")))?;

    let push = work.push("try");
    let reset = work.reset_hard("HEAD~");

    let output = push.map_err(|e| try_err(format!("pushing to try: {e}")))?;
    reset.map_err(|e| try_err(format!("dropping try commit: {e}")))?;
    if !output.success() {
        return Err(try_err(format!(
            "push exited with {}: {}",
            output.status,
            output.stderr.trim()
        )));
    }

    // The revision token shows up on stdout or stderr depending on the
    // server; scan both.
    let combined = format!("{}\n{}", output.stdout, output.stderr);
    Ok(find_revision(&combined)
        .map(|rev| format!("https://treeherder.mozilla.org/#/jobs?repo=try&revision={rev}")))
}

fn find_revision(text: &str) -> Option<String> {
    let re = Regex::new(r"revision=(?P<rev>[0-9a-f]{40})").ok()?;
    re.captures(text)
        .map(|caps| caps["rev"].to_owned())
}
