use clap::{Parser, Subcommand};

use relflow::config;
use relflow::engine::{ReleaseFlow, TagOutcome};
use relflow::error::{RelflowError, Result};
use relflow::git::Git2Repository;
use relflow::policy::BranchRef;
use relflow::store::VersionStore;
use relflow::ui;
use relflow::version::Version;

#[derive(Parser)]
#[command(
    name = "relflow",
    about = "Release-flow automation: versioned release branches, fix branches and tags"
)]
struct Args {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(short, long, global = true, help = "Remote to push to (overrides config)")]
    remote: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Initialize version.info from existing release branches (run on main)
    Init,
    /// Cut the next minor release branch from main
    Release,
    /// Cut the next major release branch from main
    Major,
    /// Branch a fix off a tagged release
    Fix {
        /// Version of the release tag to fix (e.g. 1.2.0)
        tag_version: String,
        /// Short description for the fix branch name
        description: String,
    },
    /// Tag the current release branch at its current version
    Tag {
        #[arg(long, help = "Delete and recreate the tag if it already exists")]
        force: bool,
    },
    /// Create a timestamped snapshot tag on the current branch
    Snap,
    /// Print the current version
    Version,
    /// Show the active branch classification and version state
    Status,
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        ui::display_error(&e.to_string());
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = config::load_config(args.config.as_deref())?;
    let remote = args.remote.unwrap_or(config.remote);

    let repo = Git2Repository::discover(".")?;
    let store = VersionStore::new(repo.workdir()?.join(&config.version_file));
    let flow = ReleaseFlow::new(repo, store, remote);

    match args.command {
        Command::Init => match flow.init() {
            Ok(record) => {
                ui::display_success(&format!(
                    "Initialized version.info with version {}",
                    record.current_version
                ));
            }
            // Re-running init is a reported no-op, not a failure.
            Err(RelflowError::AlreadyInitialized) => {
                println!("{}", RelflowError::AlreadyInitialized);
            }
            Err(e) => return Err(e),
        },

        Command::Release => {
            let outcome = flow.release()?;
            ui::display_success(&format!(
                "Release branch {} created and pushed.",
                outcome.branch
            ));
        }

        Command::Major => {
            let outcome = flow.major()?;
            ui::display_success(&format!(
                "Major release branch {} created and pushed.",
                outcome.branch
            ));
        }

        Command::Fix {
            tag_version,
            description,
        } => {
            let version = Version::parse(&tag_version)?;
            let outcome = flow.fix(&version, &description)?;

            if outcome.release_branch_created {
                ui::display_status(&format!(
                    "Release branch {} created from tag v{}.",
                    outcome.release_branch, version
                ));
            }
            if !outcome.release_branch_updated {
                ui::display_warning(&format!(
                    "Release branch {} has moved past tag v{}; its version.info was not updated. Manual intervention required.",
                    outcome.release_branch, version
                ));
            }
            ui::display_success(&format!(
                "Fix branch {} created and pushed.",
                outcome.fix_branch
            ));
        }

        Command::Tag { force } => match flow.tag(force)? {
            TagOutcome::Created(tag) => {
                ui::display_success(&format!("Tag {} created and pushed.", tag));
            }
            TagOutcome::Recreated(tag) => {
                ui::display_success(&format!("Tag {} recreated and pushed.", tag));
            }
            TagOutcome::AlreadyExists(tag) => {
                println!(
                    "Tag {} already exists. Use --force to recreate it.",
                    tag
                );
            }
        },

        Command::Snap => {
            let tag = flow.snap()?;
            ui::display_success(&format!("Snapshot tag {} created and pushed.", tag));
        }

        Command::Version => {
            println!("{}", flow.current_version()?);
        }

        Command::Status => {
            let report = flow.status()?;
            println!("Branch: {} ({})", report.branch, describe(&report.classification));
            match report.record {
                Some(record) => {
                    println!("Current version: {}", record.current_version);
                    println!("Next version:    {}", record.next_version);
                }
                None => println!("version.info not present - run 'relflow init' on main."),
            }
            if let Some(first) = report.first_commit {
                println!(
                    "First commit relative to main: {}",
                    if first { "yes" } else { "no" }
                );
            }
        }
    }

    Ok(())
}

fn describe(branch: &BranchRef) -> String {
    match branch {
        BranchRef::Main => "main branch".to_string(),
        BranchRef::Release(version) => format!("release branch for {}", version),
        BranchRef::Fix {
            description,
            source: Some(source),
        } => format!("fix branch '{}' from {}", description, source),
        BranchRef::Fix { description, .. } => format!("fix branch '{}'", description),
        BranchRef::Other(_) => "unmanaged branch".to_string(),
    }
}
