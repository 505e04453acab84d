//! gh-pr-sidebar: console host for the pull request tree
//!
//! Loads the sidebar settings, builds the repository collaborators from a
//! workspace fixture, and renders the tree the provider materializes.

use anyhow::{Context, Result};
use clap::Parser;
use gh_client::Fixture;
use gh_pr_config::{FileMemento, Memento, MemoryMemento, SidebarConfig};
use gh_pr_tree::{ConfigSettings, PullRequestTarget, PullRequestsTreeProvider, TreeCommands};
use std::path::PathBuf;
use std::sync::Arc;

mod console;
mod logger;
mod workspace;

use console::ConsoleView;
use workspace::{FixtureCredentials, FixtureWorkspace};

#[derive(Parser, Debug)]
#[command(name = "gh-pr-sidebar")]
#[command(about = "Render the pull request sidebar of a workspace fixture", long_about = None)]
struct Args {
    /// Workspace root; keys the persisted expansion and checkbox state
    #[arg(short, long, value_name = "DIR")]
    workspace: Option<PathBuf>,

    /// Fixture describing folders, remotes and pull requests
    #[arg(short, long, value_name = "FILE", default_value = "demos/workspace.json")]
    fixture: PathBuf,

    /// Reveal this pull request in "All Open" after rendering
    #[arg(long, value_name = "N")]
    expand_pr: Option<u64>,

    /// Only search this workspace folder for --expand-pr
    #[arg(long, value_name = "NAME", requires = "expand_pr")]
    folder: Option<String>,

    /// Run a tree command (pr.refreshList, pr.loadMore, ...) before rendering
    #[arg(long = "run", value_name = "COMMAND_ID")]
    run_command: Option<String>,

    /// Argument of the command given with --run
    #[arg(long, value_name = "ARG", requires = "run_command")]
    argument: Option<String>,

    /// Announce a local file change in this workspace folder before rendering
    #[arg(long, value_name = "NAME")]
    local_change: Option<String>,

    /// Keep workspace state in memory only
    #[arg(long)]
    ephemeral: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load .env before the logger reads RUST_LOG
    let dotenv = dotenvy::dotenv();
    let log_file = logger::init()?;
    log::info!("Starting gh-pr-sidebar, logging to {:?}", log_file);
    match dotenv {
        Ok(path) => log::debug!("Loaded .env file from: {:?}", path),
        Err(_) => log::debug!(".env file not found, using the process environment"),
    }

    let root = match &args.workspace {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };
    let config = SidebarConfig::load();
    let fixture = Fixture::load(&args.fixture)?;
    log::info!(
        "Workspace {:?}: {} folders from {:?}",
        root,
        fixture.folders.len(),
        args.fixture
    );

    let memento: Arc<dyn Memento> = if args.ephemeral {
        Arc::new(MemoryMemento::new())
    } else {
        Arc::new(FileMemento::for_workspace(&root)?)
    };
    let view = Arc::new(ConsoleView::new());
    let workspace = Arc::new(FixtureWorkspace::new(&fixture, config.remotes.clone()));
    let provider =
        PullRequestsTreeProvider::new(view.clone(), Arc::new(ConfigSettings::new(config)), memento);
    provider.initialize(
        workspace.clone(),
        workspace.review_models(),
        Arc::new(FixtureCredentials::new(&fixture)),
    )?;
    workspace.mark_loaded();

    if let Some(name) = &args.local_change {
        let model = workspace
            .review_model(name)
            .with_context(|| format!("No workspace folder named {}", name))?;
        model.touch();
    }

    if let Some(id) = &args.run_command {
        // Commands address materialized nodes
        console::render_tree(&provider).await?;
        TreeCommands::new(provider.clone())
            .execute(id, args.argument.as_deref())
            .await?;
        for setting in view.opened_settings() {
            println!("Open settings: {}", setting);
        }
    }

    for line in console::render_tree(&provider).await? {
        println!("{}", line);
    }

    if let Some(number) = args.expand_pr {
        let mut target = PullRequestTarget::new(number);
        if let Some(folder) = &args.folder {
            target = target.in_folder(folder.clone());
        }
        if provider.expand_pull_request(&target).await? {
            for id in view.revealed() {
                println!("Revealed {}", id);
            }
        } else {
            println!("Pull request #{} not found", number);
        }
    }

    provider.dispose();
    log::info!("Exiting gh-pr-sidebar");
    Ok(())
}
