//! The branch form: notices shown to the user and the interactive
//! prompt session that fills the form step by step.

use std::fmt;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::branch::{BranchForm, Field, NamingRules, ValidationError, build_branch_name};
use crate::git::{LocateError, Repository, ScanOptions, VersionControlError, find_repositories};
use crate::workflow::{CreateBranchError, CreatedBranch, create_branch, list_base_branches};

/// How loudly an outcome is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Information,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Information => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        };
        f.write_str(label)
    }
}

/// Message shown to the user at the end of an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub title: String,
    pub message: String,
    /// Whether the operation failed (drives the exit status)
    pub is_error: bool,
}

impl Notice {
    fn new(severity: Severity, title: &str, message: String, is_error: bool) -> Self {
        Self {
            severity,
            title: title.to_string(),
            message,
            is_error,
        }
    }

    /// Nothing to pick from; informational, not a failure
    pub fn no_repositories() -> Self {
        Self::new(
            Severity::Warning,
            "No Repositories",
            "No Git repositories found in the selected folder.".to_string(),
            false,
        )
    }

    pub fn scan_failed(err: &LocateError) -> Self {
        Self::new(Severity::Warning, "Error", err.to_string(), true)
    }

    pub fn load_failed(err: &VersionControlError) -> Self {
        Self::new(
            Severity::Warning,
            "Error",
            format!("Failed to load branches: {err}"),
            true,
        )
    }

    pub fn invalid(err: &ValidationError) -> Self {
        Self::new(Severity::Warning, "Error", err.to_string(), true)
    }

    pub fn git_error(err: &CreateBranchError) -> Self {
        let mut message = err.version_control_error().to_string();
        if let Some(base) = err.left_on() {
            message.push_str(&format!("\nThe repository is left on '{base}'"));
            if let Some(previous) = err.previous() {
                message.push_str(&format!(" instead of '{previous}'"));
            }
            message.push('.');
        }
        Self::new(Severity::Critical, "Git Error", message, true)
    }

    pub fn created(created: &CreatedBranch) -> Self {
        Self::new(
            Severity::Information,
            "Success",
            format!("Branch {} created and switched.", created.name),
            false,
        )
    }

    /// Process exit status for this outcome
    pub fn exit_code(&self) -> u8 {
        if self.is_error { 1 } else { 0 }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.title, self.message)
    }
}

/// Interactive form session over any line-based input and output
pub struct FormSession<'a, R, W> {
    input: R,
    output: W,
    rules: &'a NamingRules,
    scan: &'a ScanOptions,
    default_folder: PathBuf,
}

impl<'a, R: BufRead, W: Write> FormSession<'a, R, W> {
    pub fn new(input: R, output: W, rules: &'a NamingRules, scan: &'a ScanOptions, default_folder: PathBuf) -> Self {
        Self {
            input,
            output,
            rules,
            scan,
            default_folder,
        }
    }

    /// Walk through the form and create the branch
    ///
    /// I/O errors on the terminal (including end of input) are returned as
    /// errors; every other outcome is a [`Notice`].
    pub fn run(&mut self) -> io::Result<Notice> {
        writeln!(self.output, "Git Branch Builder")?;
        writeln!(self.output, "==================")?;
        writeln!(self.output)?;

        let folder = self.ask(&format!("Folder to scan [{}]: ", self.default_folder.display()))?;
        let folder = if folder.is_empty() {
            self.default_folder.clone()
        } else {
            PathBuf::from(folder)
        };
        writeln!(self.output, "Selected Folder: {}", folder.display())?;

        let repos = match find_repositories(&folder, self.scan) {
            Ok(repos) => repos,
            Err(e) => return Ok(Notice::scan_failed(&e)),
        };
        if repos.is_empty() {
            return Ok(Notice::no_repositories());
        }

        let repo_names: Vec<String> = repos.iter().map(|p| p.display().to_string()).collect();
        let repo_path = repos[self.choose("Select Repository:", &repo_names)?].clone();

        let bases = match load_base_branches(&repo_path, self.rules) {
            Ok(bases) => bases,
            Err(e) => return Ok(Notice::load_failed(&e)),
        };
        let base = if bases.is_empty() {
            writeln!(self.output, "No base branches available.")?;
            String::new()
        } else {
            bases[self.choose("Select Base Branch:", &bases)?].clone()
        };

        let types = self.rules.branch_types().to_vec();
        let branch_type = if types.is_empty() {
            String::new()
        } else {
            types[self.choose("Branch Type:", &types)?].clone()
        };

        let ticket = self.ask("Jira Ticket: (e.g ABC-123) ")?;
        let description = self.ask("Branch Description: ")?;

        let form = BranchForm {
            repository: Some(repo_path),
            branch_type,
            ticket,
            base,
            description,
        };
        debug!("Submitting form: {:?}", form);

        Ok(submit(&form, self.rules))
    }

    /// Prompt for one line, returned trimmed
    fn ask(&mut self, prompt: &str) -> io::Result<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
        }
        Ok(line.trim().to_string())
    }

    /// Pick an entry from a numbered list; empty input picks the first
    fn choose(&mut self, label: &str, items: &[String]) -> io::Result<usize> {
        writeln!(self.output)?;
        writeln!(self.output, "{}", label)?;
        for (i, item) in items.iter().enumerate() {
            writeln!(self.output, "  {}) {}", i + 1, item)?;
        }

        loop {
            let answer = self.ask(&format!("Choice [1-{}, default 1]: ", items.len()))?;
            if answer.is_empty() {
                return Ok(0);
            }
            match answer.parse::<usize>() {
                Ok(n) if (1..=items.len()).contains(&n) => return Ok(n - 1),
                _ => writeln!(
                    self.output,
                    "Please enter a number between 1 and {}.",
                    items.len()
                )?,
            }
        }
    }
}

/// Open a repository and list its base branches
pub fn load_base_branches(path: &Path, rules: &NamingRules) -> Result<Vec<String>, VersionControlError> {
    let repo = Repository::open(path)?;
    list_base_branches(&repo, rules)
}

/// Validate the form, then check out the base and create the branch
pub fn submit(form: &BranchForm, rules: &NamingRules) -> Notice {
    let name = match build_branch_name(form, rules) {
        Ok(name) => name,
        Err(e) => return Notice::invalid(&e),
    };

    // build_branch_name guarantees a repository
    let Some(path) = form.repository.as_deref() else {
        return Notice::invalid(&ValidationError::MissingField(Field::Repository));
    };

    let repo = match Repository::open(path) {
        Ok(repo) => repo,
        Err(e) => {
            return Notice::new(Severity::Critical, "Git Error", e.to_string(), true);
        }
    };

    match create_branch(&repo, form.base.trim(), &name) {
        Ok(created) => {
            debug!(
                "Created {} from {} (previously on {:?})",
                created.name, created.base, created.previous
            );
            Notice::created(&created)
        }
        Err(e) => Notice::git_error(&e),
    }
}
