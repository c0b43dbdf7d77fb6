use clap::{Args, Subcommand};
use deckhand::project::{self, Project};
use serde::Serialize;

use super::CmdResult;

#[derive(Args)]
pub struct ProjectArgs {
    #[command(subcommand)]
    pub subcommand: ProjectSubcommand,
}

#[derive(Subcommand)]
pub enum ProjectSubcommand {
    /// List configured projects
    List,
    /// Show one project
    Show { id: String },
    /// Create a project from a JSON spec (must include "id")
    Create { json: String },
    /// Merge a JSON patch into a project config
    Set { id: String, json: String },
    /// Remove a project config
    Remove { id: String },
}

#[derive(Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ProjectOutput {
    List { projects: Vec<Project> },
    Show { project: Project },
    Create { project: Project },
    #[serde(rename_all = "camelCase")]
    Set {
        id: String,
        updated_fields: Vec<String>,
    },
    Remove { id: String },
}

pub fn run(args: ProjectArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<ProjectOutput> {
    let output = match args.subcommand {
        ProjectSubcommand::List => ProjectOutput::List {
            projects: project::list()?,
        },
        ProjectSubcommand::Show { id } => ProjectOutput::Show {
            project: project::load(&id)?,
        },
        ProjectSubcommand::Create { json } => ProjectOutput::Create {
            project: project::create(&json)?,
        },
        ProjectSubcommand::Set { id, json } => {
            let updated_fields = project::merge(&id, &json)?;
            ProjectOutput::Set { id, updated_fields }
        }
        ProjectSubcommand::Remove { id } => {
            project::delete(&id)?;
            ProjectOutput::Remove { id }
        }
    };

    Ok((output, 0))
}
