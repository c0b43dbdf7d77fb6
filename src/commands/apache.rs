use clap::{Args, Subcommand};
use deckhand::apache::{self, ApacheResult};

use super::CmdResult;

#[derive(Args)]
pub struct ApacheArgs {
    #[command(subcommand)]
    pub subcommand: ApacheSubcommand,
}

#[derive(Subcommand)]
pub enum ApacheSubcommand {
    /// Render conf/wsgi templates and install the site configuration
    Install {
        /// Project ID
        project_id: String,
    },
    /// Test the Apache configuration on the target host
    Configtest {
        /// Project ID
        project_id: String,
    },
    /// Restart Apache on the target host
    Reload {
        /// Project ID
        project_id: String,
    },
    /// Swap in the maintenance page configuration
    MaintenanceUp {
        /// Project ID
        project_id: String,
    },
    /// Reinstall the normal site configuration
    MaintenanceDown {
        /// Project ID
        project_id: String,
    },
}

pub fn run(args: ApacheArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<ApacheResult> {
    let result = match args.subcommand {
        ApacheSubcommand::Install { project_id } => apache::run_install(&project_id)?,
        ApacheSubcommand::Configtest { project_id } => apache::run_configtest(&project_id)?,
        ApacheSubcommand::Reload { project_id } => apache::run_reload(&project_id)?,
        ApacheSubcommand::MaintenanceUp { project_id } => apache::run_maintenance_up(&project_id)?,
        ApacheSubcommand::MaintenanceDown { project_id } => {
            apache::run_maintenance_down(&project_id)?
        }
    };

    Ok((result, 0))
}
