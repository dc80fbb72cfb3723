use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::io;
use std::path::PathBuf;

use crate::config::FileConfigProvider;
use crate::types::{IssueIid, ProjectId, UserId};

#[derive(Parser)]
#[command(name = "issuelens")]
#[command(about = "Browse GitLab issues from the terminal")]
#[command(version)]
pub struct Cli {
    /// Config file (default: $ISSUELENS_CONFIG or the platform config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// More log output on stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List issues, optionally filtered
    #[command(visible_alias = "ls")]
    Issues {
        /// Project ID (default: all accessible projects)
        #[arg(short, long)]
        project: Option<ProjectId>,

        /// Assignee user ID
        #[arg(long)]
        assignee: Option<UserId>,

        /// Author user ID
        #[arg(long)]
        author: Option<UserId>,

        /// Page number (1-based)
        #[arg(long, default_value = "1")]
        page: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show an issue with its notes
    #[command(visible_alias = "s")]
    Show {
        /// Project ID
        project: ProjectId,

        /// Issue number within the project
        iid: IssueIid,

        /// Keep downloaded images in this directory
        #[arg(long, value_name = "DIR")]
        assets_dir: Option<PathBuf>,

        /// Do not download images
        #[arg(long, conflicts_with = "assets_dir")]
        no_assets: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search your projects
    Projects {
        /// Search term
        term: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search members of a project
    Users {
        /// Project ID
        project: ProjectId,

        /// Search term (name or username)
        term: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check the configured URL and token
    Verify {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for [possible values: bash, zsh, fish, powershell, elvish]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration (token masked)
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    fn provider(&self) -> crate::error::Result<FileConfigProvider> {
        match self.config {
            Some(ref path) => Ok(FileConfigProvider::new(path)),
            None => FileConfigProvider::from_default_path(),
        }
    }

    /// Execute the command, dispatching to the appropriate handler.
    pub async fn run(self) -> crate::error::Result<()> {
        use crate::commands::{
            IssuesOptions, ShowOptions, cmd_config_show, cmd_issues, cmd_projects, cmd_show,
            cmd_users, cmd_verify,
        };

        if let Commands::Completions { shell } = self.command {
            generate_completions(shell);
            return Ok(());
        }

        let provider = self.provider()?;

        match self.command {
            Commands::Issues {
                project,
                assignee,
                author,
                page,
                json,
            } => {
                cmd_issues(
                    provider,
                    IssuesOptions {
                        project,
                        assignee,
                        author,
                        page,
                    },
                    json,
                )
                .await
            }
            Commands::Show {
                project,
                iid,
                assets_dir,
                no_assets,
                json,
            } => {
                cmd_show(
                    provider,
                    project,
                    iid,
                    ShowOptions {
                        assets_dir,
                        no_assets,
                    },
                    json,
                )
                .await
            }
            Commands::Projects { term, json } => cmd_projects(provider, term.as_deref(), json).await,
            Commands::Users {
                project,
                term,
                json,
            } => cmd_users(provider, project, term.as_deref(), json).await,
            Commands::Verify { json } => cmd_verify(provider, json).await,
            Commands::Config { action } => match action {
                ConfigAction::Show { json } => cmd_config_show(&provider, json),
            },
            Commands::Completions { .. } => Ok(()),
        }
    }
}

pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "issuelens", &mut io::stdout());
}
