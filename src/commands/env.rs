use clap::{Args, Subcommand};
use serde::Serialize;

use toolchain::config;
use toolchain::project_env::{self, AppliedProject, CurrentProject, ProjectEnvConfig};

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct EnvArgs {
    #[command(subcommand)]
    command: EnvCommand,
}

#[derive(Subcommand)]
enum EnvCommand {
    /// List registry projects
    List,
    /// Detect the project the current .env belongs to
    Show,
    /// Write a project's variables to .env
    Use {
        /// Project key (prompts when omitted)
        project: Option<String>,
    },
    /// Add or replace a project from JSON
    Set {
        /// Project key
        key: String,
        /// JSON spec (inline, @file, or - for stdin)
        spec: String,
    },
    /// Remove a project from the registry
    Remove {
        /// Project key
        key: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvProjectSummary {
    pub key: String,
    pub name: String,
    pub description: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvListOutput {
    pub projects: Vec<EnvProjectSummary>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvShowOutput {
    pub project: Option<CurrentProject>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvChangeOutput {
    pub action: String,
    pub key: String,
    pub project: ProjectEnvConfig,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum EnvOutput {
    List(EnvListOutput),
    Show(EnvShowOutput),
    Use(AppliedProject),
    Change(EnvChangeOutput),
}

pub fn run(args: EnvArgs, global: &GlobalArgs) -> CmdResult<EnvOutput> {
    let root = global.root()?;

    let output = match args.command {
        EnvCommand::List => {
            let file = project_env::load(&root)?;
            EnvOutput::List(EnvListOutput {
                projects: file
                    .projects
                    .into_iter()
                    .map(|(key, project)| EnvProjectSummary {
                        key,
                        name: project.name,
                        description: project.description,
                    })
                    .collect(),
            })
        }
        EnvCommand::Show => {
            let file = project_env::load(&root)?;
            let project = project_env::current_project(&root, &file)?;
            if let Some(current) = &project {
                toolchain::log_info!("env", "Current project: {} ({})", current.name, current.key);
            }
            EnvOutput::Show(EnvShowOutput { project })
        }
        EnvCommand::Use { project } => {
            let key = match project {
                Some(key) => key,
                None => {
                    let file = project_env::load(&root)?;
                    let choices: Vec<(String, String)> = file
                        .projects
                        .into_iter()
                        .map(|(key, project)| (key, project.name))
                        .collect();
                    crate::tty::select("Select a project:", &choices, "project")?
                }
            };
            EnvOutput::Use(project_env::apply(&root, &key)?)
        }
        EnvCommand::Set { key, spec } => {
            let project: ProjectEnvConfig = config::parse_json_spec(&spec, "env project")?;
            let project = project_env::set(&root, &key, project)?;
            toolchain::log_success!("env", "Saved project '{}'", key);
            EnvOutput::Change(EnvChangeOutput {
                action: "set".to_string(),
                key,
                project,
            })
        }
        EnvCommand::Remove { key } => {
            let project = project_env::remove(&root, &key)?;
            toolchain::log_success!("env", "Removed project '{}'", key);
            EnvOutput::Change(EnvChangeOutput {
                action: "remove".to_string(),
                key,
                project,
            })
        }
    };

    Ok((output, 0))
}
