use clap::{Args, Subcommand};
use deckhand::db::{self, DbResult};
use deckhand::deploy::{self, OperationReport};
use serde::Serialize;

use super::CmdResult;

#[derive(Args)]
pub struct DbArgs {
    #[command(subcommand)]
    pub subcommand: DbSubcommand,
}

#[derive(Subcommand)]
pub enum DbSubcommand {
    /// Create the database and grant the project user privileges
    Create {
        /// Project ID
        project_id: String,
    },
    /// Drop the database (tolerated when it does not exist)
    Destroy {
        /// Project ID
        project_id: String,
    },
    /// Dump the database to the configured backup path
    Dump {
        /// Project ID
        project_id: String,
    },
    /// Erase the database and reload it from the SQL dump
    /// (maintenance page stays up while data loads)
    LoadNew {
        /// Project ID
        project_id: String,
    },
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum DbOutput {
    Lifecycle(DbResult),
    LoadNew(OperationReport),
}

pub fn run(args: DbArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<DbOutput> {
    let output = match args.subcommand {
        DbSubcommand::Create { project_id } => DbOutput::Lifecycle(db::create(&project_id)?),
        DbSubcommand::Destroy { project_id } => DbOutput::Lifecycle(db::destroy(&project_id)?),
        DbSubcommand::Dump { project_id } => DbOutput::Lifecycle(db::dump(&project_id)?),
        DbSubcommand::LoadNew { project_id } => {
            DbOutput::LoadNew(deploy::load_new_data(&project_id)?)
        }
    };

    Ok((output, 0))
}
