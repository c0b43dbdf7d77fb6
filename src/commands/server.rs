use clap::{Args, Subcommand};
use deckhand::server::{self, Server};
use serde::Serialize;

use super::CmdResult;

#[derive(Args)]
pub struct ServerArgs {
    #[command(subcommand)]
    pub subcommand: ServerSubcommand,
}

#[derive(Subcommand)]
pub enum ServerSubcommand {
    /// List configured servers
    List,
    /// Show one server
    Show { id: String },
    /// Create a server from a JSON spec (must include "id")
    Create { json: String },
    /// Merge a JSON patch into a server config
    Set { id: String, json: String },
    /// Remove a server config
    Remove { id: String },
}

#[derive(Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ServerOutput {
    List { servers: Vec<Server> },
    Show { server: Server },
    Create { server: Server },
    #[serde(rename_all = "camelCase")]
    Set {
        id: String,
        updated_fields: Vec<String>,
    },
    Remove { id: String },
}

pub fn run(args: ServerArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<ServerOutput> {
    let output = match args.subcommand {
        ServerSubcommand::List => ServerOutput::List {
            servers: server::list()?,
        },
        ServerSubcommand::Show { id } => ServerOutput::Show {
            server: server::load(&id)?,
        },
        ServerSubcommand::Create { json } => ServerOutput::Create {
            server: server::create(&json)?,
        },
        ServerSubcommand::Set { id, json } => {
            let updated_fields = server::merge(&id, &json)?;
            ServerOutput::Set { id, updated_fields }
        }
        ServerSubcommand::Remove { id } => {
            server::delete(&id)?;
            ServerOutput::Remove { id }
        }
    };

    Ok((output, 0))
}
