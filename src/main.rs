//! Git Branch Builder - create ticket-named branches from a base branch
//!
//! Finds the git repositories under a folder, offers the base branches of
//! the chosen one and creates `{type}/{ticket}/{base}/{description}`
//! branches after checking out the base.

mod branch;
mod config;
mod form;
mod git;
mod workflow;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result, eyre};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use branch::{BranchForm, NamingRules, build_branch_name};
use config::Config;
use form::{FormSession, Notice};

/// Git Branch Builder - Create ticket-named branches
#[derive(Parser, Debug)]
#[command(name = "gbb")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Path to the config file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Initialize configuration interactively
    #[arg(long)]
    init: bool,

    /// Print the current configuration
    #[arg(long)]
    show_config: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the git repositories under a folder
    Scan {
        /// Folder to scan (defaults to the configured folder, then home)
        folder: Option<PathBuf>,
    },

    /// List the branches of a repository that can serve as a base
    Branches {
        /// Repository root
        repo: PathBuf,
    },

    /// Validate the fields and print the branch name
    Name {
        #[command(flatten)]
        fields: FormArgs,
    },

    /// Check out the base branch and create the new branch from it
    Create {
        #[command(flatten)]
        fields: FormArgs,

        /// Only validate and print the branch name
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(clap::Args, Debug)]
struct FormArgs {
    /// Repository root (defaults to current directory)
    #[arg(short, long)]
    repo: Option<PathBuf>,

    /// Branch type (e.g. feature, bugfix)
    #[arg(short = 't', long = "type", default_value = "feature")]
    branch_type: String,

    /// Jira ticket (e.g. ABC-123)
    #[arg(short = 'k', long)]
    ticket: String,

    /// Base branch to create the branch from
    #[arg(short, long)]
    base: String,

    /// Short description, spaces become hyphens
    #[arg(short = 'm', long)]
    description: String,
}

impl FormArgs {
    fn to_form(&self) -> Result<BranchForm> {
        let repository = match &self.repo {
            Some(repo) => repo.clone(),
            None => std::env::current_dir().context("Failed to get current directory")?,
        };
        Ok(BranchForm {
            repository: Some(repository),
            branch_type: self.branch_type.clone(),
            ticket: self.ticket.clone(),
            base: self.base.clone(),
            description: self.description.clone(),
        })
    }
}

fn main() -> Result<ExitCode> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize color_eyre for better error reporting
    color_eyre::install()?;

    init_logging(&args)?;

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => Config::default_path()
            .ok_or_else(|| eyre!("Could not determine the config directory, use --config"))?,
    };
    debug!("Using config file: {}", config_path.display());

    if args.show_config {
        show_config(&config_path)?;
        return Ok(ExitCode::SUCCESS);
    }

    if args.init {
        init_config(&config_path)?;
        return Ok(ExitCode::SUCCESS);
    }

    let config = Config::load(&config_path)?;
    let rules = config.naming_rules()?;

    let outcome = match &args.command {
        None => Outcome::Notice(run_form(&config, &rules)?),
        Some(command) => run_command(command, &config, &rules)?,
    };

    Ok(outcome.report())
}

/// Result of a command: plain lines for stdout, or a notice
#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Lines(Vec<String>),
    Notice(Notice),
}

impl Outcome {
    fn exit_code(&self) -> u8 {
        match self {
            Outcome::Lines(_) => 0,
            Outcome::Notice(notice) => notice.exit_code(),
        }
    }

    /// Print the outcome; failures go to stderr
    fn report(&self) -> ExitCode {
        match self {
            Outcome::Lines(lines) => {
                for line in lines {
                    println!("{}", line);
                }
            }
            Outcome::Notice(notice) if notice.is_error => eprintln!("{}", notice),
            Outcome::Notice(notice) => println!("{}", notice),
        }
        ExitCode::from(self.exit_code())
    }
}

/// Run a one-shot subcommand
fn run_command(command: &Command, config: &Config, rules: &NamingRules) -> Result<Outcome> {
    let outcome = match command {
        Command::Scan { folder } => {
            let folder = match folder {
                Some(folder) => folder.clone(),
                None => config.scan_folder()?,
            };
            scan(&folder, config)
        }
        Command::Branches { repo } => match form::load_base_branches(repo, rules) {
            Ok(bases) => Outcome::Lines(bases),
            Err(e) => Outcome::Notice(Notice::load_failed(&e)),
        },
        Command::Name { fields } => branch_name(&fields.to_form()?, rules),
        Command::Create { fields, dry_run } => {
            let form = fields.to_form()?;
            if *dry_run {
                branch_name(&form, rules)
            } else {
                Outcome::Notice(form::submit(&form, rules))
            }
        }
    };
    Ok(outcome)
}

/// Set up tracing: stderr by default, a plain-text file with --log-file
fn init_logging(args: &Args) -> Result<()> {
    let filter = if args.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    match &args.log_file {
        Some(path) => {
            let log_file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create log file: {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(log_file),
                )
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }

    Ok(())
}

/// Run the interactive form on the terminal
fn run_form(config: &Config, rules: &NamingRules) -> Result<Notice> {
    let scan = config.scan_options();
    let stdin = std::io::stdin();
    let mut session = FormSession::new(
        stdin.lock(),
        std::io::stdout(),
        rules,
        &scan,
        config.scan_folder()?,
    );
    let notice = session.run().context("Form input ended")?;
    println!();
    Ok(notice)
}

/// The repositories under a folder, one per line
fn scan(folder: &Path, config: &Config) -> Outcome {
    match git::find_repositories(folder, &config.scan_options()) {
        Ok(repos) if repos.is_empty() => Outcome::Notice(Notice::no_repositories()),
        Ok(repos) => Outcome::Lines(repos.iter().map(|p| p.display().to_string()).collect()),
        Err(e) => Outcome::Notice(Notice::scan_failed(&e)),
    }
}

/// Validate a form and return the branch name it produces
fn branch_name(form: &BranchForm, rules: &NamingRules) -> Outcome {
    match build_branch_name(form, rules) {
        Ok(name) => Outcome::Lines(vec![name.to_string()]),
        Err(e) => Outcome::Notice(Notice::invalid(&e)),
    }
}

/// Show the current configuration
fn show_config(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)?;

    println!("Git Branch Builder Configuration");
    println!("================================");
    println!();
    println!("Config file: {}", config_path.display());
    println!("Ticket pattern: {}", config.ticket_pattern);
    println!(
        "Default folder: {}",
        config
            .default_folder
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(home directory)".to_string())
    );
    println!("Descend into repositories: {}", config.descend_into_repositories);
    println!();
    println!("Branch types ({}):", config.branch_types.len());
    for branch_type in &config.branch_types {
        println!("  + {}", branch_type);
    }
    println!();
    println!("Reserved prefixes ({}):", config.reserved_prefixes.len());
    for prefix in &config.reserved_prefixes {
        println!("  - {}", prefix);
    }
    println!();
    println!("Skip patterns ({}):", config.skip_patterns.len());
    for pattern in &config.skip_patterns {
        println!("  * {}", pattern);
    }

    Ok(())
}

/// Initialize configuration interactively
fn init_config(config_path: &Path) -> Result<()> {
    use std::io::{self, Write};

    let mut config = Config::load(config_path)?;

    println!("Git Branch Builder - Configuration");
    println!("==================================");
    println!();

    // Get default folder
    print!(
        "Default folder to scan [{}]: ",
        config
            .default_folder
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    );
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();
    if !input.is_empty() {
        config.default_folder = Some(PathBuf::from(input));
    }

    // Get branch types
    print!("Branch types, comma separated [{}]: ", config.branch_types.join(","));
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let types = split_list(&input);
    if !types.is_empty() {
        config.branch_types = types;
    }

    // Get ticket pattern
    print!("Ticket pattern [{}]: ", config.ticket_pattern);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();
    if !input.is_empty() {
        config.ticket_pattern = input.to_string();
        config.naming_rules()?;
    }

    // Get nested repository policy
    print!(
        "Report repositories nested inside other repositories? [{}]: ",
        if config.descend_into_repositories { "y" } else { "n" }
    );
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim().to_lowercase();
    if input == "y" || input == "yes" {
        config.descend_into_repositories = true;
    } else if input == "n" || input == "no" {
        config.descend_into_repositories = false;
    }

    // Get skip patterns
    print!(
        "Folders to skip, comma separated globs [{}]: ",
        config.skip_patterns.join(",")
    );
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let patterns = split_list(&input);
    if !patterns.is_empty() {
        config.skip_patterns = patterns;
    }

    // Save configuration
    config.save(config_path)?;

    println!();
    println!("Configuration saved to {}", config_path.display());
    println!();
    println!("You can now run 'gbb' to create a branch.");

    Ok(())
}

fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::test_support::{git, init_test_repo};
    use tempfile::TempDir;

    fn run(argv: &[&str]) -> Outcome {
        let args = Args::try_parse_from(argv).unwrap();
        let config = Config::default();
        let rules = config.naming_rules().unwrap();
        run_command(args.command.as_ref().unwrap(), &config, &rules).unwrap()
    }

    #[test]
    fn test_dry_run_leaves_repository_untouched() {
        let (dir, _repo) = init_test_repo();
        git(dir.path(), &["branch", "develop"]);
        let repo = dir.path().to_string_lossy().to_string();

        let outcome = run(&[
            "gbb", "create", "--repo", &repo, "--ticket", "ABC-1", "--base", "develop",
            "--description", "add login", "--dry-run",
        ]);

        assert_eq!(
            outcome,
            Outcome::Lines(vec!["feature/ABC-1/develop/add-login".to_string()])
        );
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(git(dir.path(), &["branch", "--show-current"]), "main");
        assert_eq!(
            git(dir.path(), &["for-each-ref", "--format=%(refname:short)", "refs/heads"]),
            "develop\nmain"
        );
    }

    #[test]
    fn test_create_exit_codes() {
        let (dir, _repo) = init_test_repo();
        let repo = dir.path().to_string_lossy().to_string();
        let create = |ticket: &str| {
            run(&[
                "gbb", "create", "-r", &repo, "-t", "bugfix", "-k", ticket, "-b", "main",
                "-m", "fix it",
            ])
        };

        let outcome = create("ABC-2");
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(
            git(dir.path(), &["branch", "--show-current"]),
            "bugfix/ABC-2/main/fix-it"
        );

        // same name again: git refuses
        let outcome = create("ABC-2");
        assert_eq!(outcome.exit_code(), 1);
        assert!(matches!(outcome, Outcome::Notice(ref n) if n.title == "Git Error"));

        let outcome = create("ABC2");
        assert_eq!(outcome.exit_code(), 1);
    }

    #[test]
    fn test_name_validation_failure_exits_non_zero() {
        let outcome = run(&[
            "gbb", "name", "--repo", "/repos/app", "--ticket", "123-ABC", "--base", "main",
            "--description", "x",
        ]);

        match &outcome {
            Outcome::Notice(notice) => assert!(notice.message.starts_with("Jira ticket name")),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(outcome.exit_code(), 1);
    }

    #[test]
    fn test_scan_without_repositories_exits_zero() {
        let dir = TempDir::new().unwrap();
        let folder = dir.path().to_string_lossy().to_string();

        let outcome = run(&["gbb", "scan", &folder]);

        assert_eq!(outcome, Outcome::Notice(Notice::no_repositories()));
        assert_eq!(outcome.exit_code(), 0);
    }

    #[test]
    fn test_scan_missing_folder_exits_non_zero() {
        let dir = TempDir::new().unwrap();
        let folder = dir.path().join("missing").to_string_lossy().to_string();

        assert_eq!(run(&["gbb", "scan", &folder]).exit_code(), 1);
    }

    #[test]
    fn test_branches_lists_base_candidates() {
        let (dir, _repo) = init_test_repo();
        git(dir.path(), &["branch", "feature/x"]);
        git(dir.path(), &["branch", "develop"]);
        let repo = dir.path().to_string_lossy().to_string();

        assert_eq!(
            run(&["gbb", "branches", &repo]),
            Outcome::Lines(vec!["develop".to_string(), "main".to_string()])
        );
    }
}
