use std::fmt;
use std::io::{self, Write};

use thiserror::Error;

/// One failed check. The `Display` form is the diagnostic line printed for it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Mismatch {
    #[error("Problem for Jira issue '{issue}': field '{field}' did not match the target work item. ('{jira}' vs '{ado}')")]
    Value {
        issue: String,
        field: String,
        jira: String,
        ado: String,
    },
    #[error("Problem for Jira issue '{issue}': field '{field}' did not exist when it should.")]
    Missing { issue: String, field: String },
    #[error("Problem for Jira issue '{issue}': field '{field}': an unformatted attachment link was detected")]
    UnformattedAttachmentLink { issue: String, field: String },
    #[error("Problem for Jira issue '{issue}': field '{field}': an unformatted issue link was detected")]
    UnformattedIssueLink { issue: String, field: String },
    #[error("Problem for Jira issue '{issue}': no work item with a matching title was found in the target project")]
    NoCounterpart { issue: String },
    #[error("Jira issue count does not match ADO work item count ({jira} vs {ado})")]
    IssueCount { jira: usize, ado: usize },
    #[error("Problem for Jira issue '{issue}': could not fetch {what}: {reason}")]
    Transport {
        issue: String,
        what: String,
        reason: String,
    },
}

impl Mismatch {
    pub fn value(
        issue: &str,
        field: &str,
        jira: impl fmt::Display,
        ado: impl fmt::Display,
    ) -> Self {
        Mismatch::Value {
            issue: issue.to_string(),
            field: field.to_string(),
            jira: jira.to_string(),
            ado: ado.to_string(),
        }
    }

    /// Field the mismatch is about, if it concerns a single field.
    pub fn field(&self) -> Option<&str> {
        match self {
            Mismatch::Value { field, .. }
            | Mismatch::Missing { field, .. }
            | Mismatch::UnformattedAttachmentLink { field, .. }
            | Mismatch::UnformattedIssueLink { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Everything a run found wrong, in the order it was found.
#[derive(Debug, Default)]
pub struct Report {
    mismatches: Vec<Mismatch>,
    issues_checked: usize,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, mismatch: Mismatch) {
        tracing::debug!(field = mismatch.field(), "{mismatch}");
        self.mismatches.push(mismatch);
    }

    pub fn extend(&mut self, mismatches: impl IntoIterator<Item = Mismatch>) {
        for m in mismatches {
            self.record(m);
        }
    }

    pub fn mark_checked(&mut self) {
        self.issues_checked += 1;
    }

    pub fn issues_checked(&self) -> usize {
        self.issues_checked
    }

    pub fn mismatches(&self) -> &[Mismatch] {
        &self.mismatches
    }

    pub fn is_success(&self) -> bool {
        self.mismatches.is_empty()
    }

    /// One diagnostic line per mismatch, then the summary line.
    pub fn write_to(&self, out: &mut impl Write) -> io::Result<()> {
        for mismatch in &self.mismatches {
            writeln!(out, "{mismatch}")?;
        }
        if self.is_success() {
            writeln!(
                out,
                "{} Jira issues verified, no problems found",
                self.issues_checked
            )
        } else {
            writeln!(
                out,
                "{} problem(s) found across {} verified Jira issues",
                self.mismatches.len(),
                self.issues_checked
            )
        }
    }

    pub fn exit_code(&self) -> u8 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}
