use clap::{Parser, Subcommand};

use commands::GlobalArgs;

mod commands;
mod output;

use commands::{apache, db, deploy, file, manage, project, run, server};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "deckhand")]
#[command(version = VERSION)]
#[command(about = "CLI for provisioning and deploying a Django site over SSH")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision a fresh host: directories, virtualenv, clone, database, Apache
    Setup(deploy::SetupArgs),
    /// Deploy the latest code and restart Apache
    Deploy(deploy::DeployArgs),
    /// Roll back to a git commit hash or tag
    Rollback(deploy::RollbackArgs),
    /// Remove everything associated with the application from the host
    Destroy(deploy::DestroyArgs),
    /// Database lifecycle operations
    Db(db::DbArgs),
    /// Run a Django management command for a project
    Manage(manage::ManageArgs),
    /// Run the Django development server (development projects only)
    Runserver(manage::RunserverArgs),
    /// Apache configuration operations
    Apache(apache::ApacheArgs),
    /// Execute a raw command on a project's host or a configured server
    Run(run::RunArgs),
    /// Manage SSH server configurations
    #[command(visible_alias = "servers")]
    Server(server::ServerArgs),
    /// Manage project configurations
    #[command(visible_alias = "projects")]
    Project(project::ProjectArgs),
    /// Transfer files to and from a project's host
    File(file::FileArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let global = GlobalArgs {};

    let (json_result, exit_code) = commands::run_json(cli.command, &global);
    output::print_json_result(json_result);

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
