use clap::{Args, Parser, Subcommand};
use releaselens_lib::commands::links;
use releaselens_lib::commands::settings::{load_settings_from_disk, save_settings_to_disk};
use releaselens_lib::commands::summary::{build_release_summary, render_text};
use releaselens_lib::commands::{db, settings};
use releaselens_lib::models::modifications::ReleaseContext;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "releaselens", about = "Correlate tracker tickets with commits into a release summary")]
struct Cli {
    /// Override the data directory (database and settings).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct ContextArgs {
    /// Tracker project key, e.g. ABC.
    #[arg(long)]
    project: String,

    /// Tracker fix version the release is cut for.
    #[arg(long)]
    fix_version: String,

    /// Repository id; defaults to the configured gitlabProjectId.
    #[arg(long)]
    repo: Option<String>,

    /// Tag the release starts after.
    #[arg(long)]
    from: String,

    /// Tag the release ends at.
    #[arg(long)]
    to: String,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch, correlate and print the release summary.
    Summary {
        #[command(flatten)]
        context: ContextArgs,

        /// Read commits from a local checkout instead of the hosted API.
        #[arg(long)]
        local_repo: Option<String>,

        /// Emit the raw summary as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Manually link an issue to a commit.
    Match {
        issue_id: String,
        commit_id: String,
        #[command(flatten)]
        context: ContextArgs,
    },
    /// Sever a pair so it is never auto-matched again.
    Unmatch {
        item1_id: String,
        item2_id: String,
        #[command(flatten)]
        context: ContextArgs,
    },
    /// Mark an item as needing action.
    Flag {
        item_id: String,
        /// Clear the flag instead of setting it.
        #[arg(long)]
        clear: bool,
        #[command(flatten)]
        context: ContextArgs,
    },
    /// Drop all stored modifications for a context.
    Reset {
        #[command(flatten)]
        context: ContextArgs,
    },
    /// Inspect or update stored settings.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the stored settings.
    Get,
    /// Merge a JSON object into the stored settings.
    Set { json: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let data_dir = cli.data_dir.unwrap_or_else(db::default_data_dir);

    match cli.command {
        Command::Summary {
            context,
            local_repo,
            json,
        } => {
            let ctx = resolve_context(&data_dir, context)?;
            let summary = build_release_summary(&data_dir, &ctx, local_repo.as_deref()).await?;
            if json {
                let raw = serde_json::to_string_pretty(&summary)
                    .map_err(|e| format!("Serialize error: {e}"))?;
                println!("{raw}");
            } else {
                print!("{}", render_text(&summary));
            }
            Ok(())
        }
        Command::Match {
            issue_id,
            commit_id,
            context,
        } => {
            let ctx = resolve_context(&data_dir, context)?;
            let status = links::record_match(&data_dir, &ctx, &issue_id, &commit_id)?;
            println!("{status}");
            Ok(())
        }
        Command::Unmatch {
            item1_id,
            item2_id,
            context,
        } => {
            let ctx = resolve_context(&data_dir, context)?;
            let status = links::record_unmatch(&data_dir, &ctx, &item1_id, &item2_id)?;
            println!("{status}");
            Ok(())
        }
        Command::Flag {
            item_id,
            clear,
            context,
        } => {
            let ctx = resolve_context(&data_dir, context)?;
            let status = links::set_flag(&data_dir, &ctx, &item_id, !clear)?;
            println!("{status}");
            Ok(())
        }
        Command::Reset { context } => {
            let ctx = resolve_context(&data_dir, context)?;
            let status = links::reset_context(&data_dir, &ctx)?;
            println!("{status}");
            Ok(())
        }
        Command::Settings { action } => match action {
            SettingsAction::Get => {
                let stored = load_settings_from_disk(&data_dir)?;
                println!("{}", serde_json::to_string_pretty(&stored).unwrap_or_default());
                Ok(())
            }
            SettingsAction::Set { json } => {
                let incoming: serde_json::Value = serde_json::from_str(&json)
                    .map_err(|e| format!("Invalid settings JSON: {e}"))?;
                let stored = save_settings_to_disk(&data_dir, incoming)?;
                println!("{}", serde_json::to_string_pretty(&stored).unwrap_or_default());
                Ok(())
            }
        },
    }
}

/// Fill the repo id from settings when the flag is omitted.
fn resolve_context(data_dir: &std::path::Path, args: ContextArgs) -> Result<ReleaseContext, String> {
    let repo = match args.repo {
        Some(repo) => repo,
        None => {
            let effective = settings::load_effective_settings(data_dir)?;
            if effective.gitlab_project_id.is_empty() {
                return Err(
                    "REPO_MISSING: pass --repo or configure gitlabProjectId".to_string()
                );
            }
            effective.gitlab_project_id
        }
    };

    Ok(ReleaseContext {
        project_key: args.project,
        fix_version: args.fix_version,
        repo,
        tag_from: args.from,
        tag_to: args.to,
    })
}
