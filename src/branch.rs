//! Branch naming rules
//!
//! Validates the form fields and composes branch names of the shape
//! `{type}/{ticket}/{base}/{description}`. Also filters a repository's
//! branch list down to the branches that can serve as a base.

use regex::Regex;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Default pattern a ticket key must fully match (e.g. `ABC-123`)
pub const TICKET_PATTERN: &str = r"^[A-Za-z]+-\d+$";

/// Branches under these prefixes are derived branches, never a base
pub const RESERVED_PREFIXES: [&str; 4] = ["feature/", "feat/", "bug/", "bugfix/"];

/// Built-in branch types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchType {
    Feature,
    Bugfix,
}

impl BranchType {
    pub const ALL: [BranchType; 2] = [BranchType::Feature, BranchType::Bugfix];

    pub fn as_str(&self) -> &'static str {
        match self {
            BranchType::Feature => "feature",
            BranchType::Bugfix => "bugfix",
        }
    }
}

impl fmt::Display for BranchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A form field that can be reported as missing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Repository,
    Ticket,
    Description,
    BaseBranch,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Repository => "repository",
            Field::Ticket => "ticket",
            Field::Description => "description",
            Field::BaseBranch => "base branch",
        };
        f.write_str(name)
    }
}

/// Why a form could not be turned into a branch name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Jira ticket name must follow the pattern *-*, e.g. ABC-123. (got '{ticket}')")]
    InvalidTicketFormat { ticket: String },

    #[error("All fields are required. Missing: {0}")]
    MissingField(Field),

    #[error("Unknown branch type '{value}'")]
    UnknownBranchType { value: String },
}

/// Compiled naming rules
#[derive(Debug, Clone)]
pub struct NamingRules {
    ticket: Regex,
    branch_types: Vec<String>,
    reserved_prefixes: Vec<String>,
}

impl Default for NamingRules {
    fn default() -> Self {
        Self::new(
            TICKET_PATTERN,
            BranchType::ALL.iter().map(|t| t.to_string()).collect(),
            RESERVED_PREFIXES.iter().map(|p| p.to_string()).collect(),
        )
        .expect("built-in ticket pattern is valid")
    }
}

impl NamingRules {
    /// Compile rules from a ticket pattern, allowed types and reserved prefixes
    ///
    /// The pattern is anchored, so a ticket must match it as a whole.
    pub fn new(
        ticket_pattern: &str,
        branch_types: Vec<String>,
        reserved_prefixes: Vec<String>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            ticket: Regex::new(&format!("^(?:{ticket_pattern})$"))?,
            branch_types,
            reserved_prefixes,
        })
    }

    pub fn branch_types(&self) -> &[String] {
        &self.branch_types
    }

    /// Whether a branch lives under one of the reserved prefixes
    pub fn is_reserved(&self, branch: &str) -> bool {
        self.reserved_prefixes
            .iter()
            .any(|prefix| branch.starts_with(prefix.as_str()))
    }
}

/// Check a ticket key against the ticket pattern
pub fn validate_ticket(ticket: &str, rules: &NamingRules) -> Result<(), ValidationError> {
    if rules.ticket.is_match(ticket) {
        Ok(())
    } else {
        Err(ValidationError::InvalidTicketFormat {
            ticket: ticket.to_string(),
        })
    }
}

/// Snapshot of the branch form as filled in by the user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchForm {
    pub repository: Option<PathBuf>,
    pub branch_type: String,
    pub ticket: String,
    pub base: String,
    pub description: String,
}

/// A composed branch name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchName(String);

impl BranchName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validate the form and compose the branch name
///
/// The ticket is checked first, so an empty ticket reports
/// `InvalidTicketFormat` rather than `MissingField`. Spaces in the
/// description become hyphens; nothing else is rewritten.
pub fn build_branch_name(form: &BranchForm, rules: &NamingRules) -> Result<BranchName, ValidationError> {
    let ticket = form.ticket.trim();
    let base = form.base.trim();
    let description = form.description.trim();
    let branch_type = form.branch_type.trim();

    validate_ticket(ticket, rules)?;

    let repository_missing = form
        .repository
        .as_ref()
        .is_none_or(|path| path.as_os_str().is_empty());
    if repository_missing {
        return Err(ValidationError::MissingField(Field::Repository));
    }
    // only reachable with a configured pattern that accepts ""
    if ticket.is_empty() {
        return Err(ValidationError::MissingField(Field::Ticket));
    }
    if description.is_empty() {
        return Err(ValidationError::MissingField(Field::Description));
    }
    if base.is_empty() {
        return Err(ValidationError::MissingField(Field::BaseBranch));
    }

    if !rules.branch_types.iter().any(|t| t == branch_type) {
        return Err(ValidationError::UnknownBranchType {
            value: branch_type.to_string(),
        });
    }

    let description = description.replace(' ', "-");
    Ok(BranchName(format!("{branch_type}/{ticket}/{base}/{description}")))
}

/// Drop derived branches, keeping the order of the rest
pub fn filter_base_branches<I, S>(branches: I, rules: &NamingRules) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    branches
        .into_iter()
        .map(Into::into)
        .filter(|name| !rules.is_reserved(name))
        .collect()
}
