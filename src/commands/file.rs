use clap::{Args, Subcommand};
use deckhand::transfer::{self, GetResult, PutResult};
use serde::Serialize;

use super::CmdResult;

#[derive(Args)]
pub struct FileArgs {
    #[command(subcommand)]
    pub subcommand: FileSubcommand,
}

#[derive(Subcommand)]
pub enum FileSubcommand {
    /// Copy a local file to the project's host (mode preserved)
    Put {
        /// Project ID
        project_id: String,
        local_path: String,
        remote_path: String,

        /// Explicit chmod mode for the uploaded file, e.g. 0755
        #[arg(long)]
        mode: Option<String>,
    },
    /// Fetch a file from the project's host (mode preserved)
    Get {
        /// Project ID
        project_id: String,
        remote_path: String,
        local_path: String,
    },
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum FileOutput {
    Put(PutResult),
    Get(GetResult),
}

pub fn run(args: FileArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<FileOutput> {
    let output = match args.subcommand {
        FileSubcommand::Put {
            project_id,
            local_path,
            remote_path,
            mode,
        } => FileOutput::Put(transfer::put(
            &project_id,
            &local_path,
            &remote_path,
            mode.as_deref(),
        )?),
        FileSubcommand::Get {
            project_id,
            remote_path,
            local_path,
        } => FileOutput::Get(transfer::get(&project_id, &remote_path, &local_path)?),
    };

    Ok((output, 0))
}
