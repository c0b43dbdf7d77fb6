pub type CmdResult<T> = deckhand::Result<(T, i32)>;

pub(crate) struct GlobalArgs {}

pub mod apache;
pub mod db;
pub mod deploy;
pub mod file;
pub mod manage;
pub mod project;
pub mod run;
pub mod server;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $handler:path) => {
        crate::output::map_cmd_result_to_json($handler($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (deckhand::Result<serde_json::Value>, i32) {
    match command {
        crate::Commands::Setup(args) => dispatch!(args, global, deploy::run_setup),
        crate::Commands::Deploy(args) => dispatch!(args, global, deploy::run_deploy),
        crate::Commands::Rollback(args) => dispatch!(args, global, deploy::run_rollback),
        crate::Commands::Destroy(args) => dispatch!(args, global, deploy::run_destroy),
        crate::Commands::Db(args) => dispatch!(args, global, db::run),
        crate::Commands::Manage(args) => dispatch!(args, global, manage::run),
        crate::Commands::Runserver(args) => dispatch!(args, global, manage::run_runserver),
        crate::Commands::Apache(args) => dispatch!(args, global, apache::run),
        crate::Commands::Run(args) => dispatch!(args, global, run::run),
        crate::Commands::Server(args) => dispatch!(args, global, server::run),
        crate::Commands::Project(args) => dispatch!(args, global, project::run),
        crate::Commands::File(args) => dispatch!(args, global, file::run),
    }
}
