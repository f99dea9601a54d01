//! Console-backed tracker stand-in.
//!
//! The production tracker client lives outside this workspace; the CLI wires
//! the engine to this implementation, which prints every issue operation and
//! hands out sequential issue references for the lifetime of the process.

use std::cell::Cell;

use colored::Colorize;

use downport_core::capabilities::{CapabilityError, Tracker};
use downport_core::types::IssueRef;

#[derive(Debug, Default)]
pub struct ConsoleTracker {
    next_id: Cell<u64>,
}

impl Tracker for ConsoleTracker {
    fn create(
        &self,
        summary: &str,
        body: &str,
        product: &str,
        component: &str,
    ) -> Result<IssueRef, CapabilityError> {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        println!(
            "{} issue {id}: {summary} [{product} :: {component}]",
            "tracker/create".cyan()
        );
        if !body.is_empty() {
            println!("  {body}");
        }
        Ok(IssueRef(id))
    }

    fn comment(&self, issue: &IssueRef, text: &str) -> Result<(), CapabilityError> {
        println!("{} {issue}:\n{text}", "tracker/comment".yellow());
        Ok(())
    }

    fn set_routing(
        &self,
        issue: &IssueRef,
        product: &str,
        component: &str,
    ) -> Result<(), CapabilityError> {
        println!(
            "{} {issue} -> {product} :: {component}",
            "tracker/routing".green()
        );
        Ok(())
    }
}
