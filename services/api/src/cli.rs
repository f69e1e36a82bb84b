use crate::error::AppError;
use crate::report::{run_funnel_report, FunnelReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Enrollment Funnel Analytics",
    about = "Serve the enrollment analytics API or render reports from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Render a funnel and revenue report from local CSV exports
    Funnel {
        #[command(subcommand)]
        command: FunnelCommand,
    },
}

#[derive(Subcommand, Debug)]
enum FunnelCommand {
    /// Compute and print the reconciled enrollment report
    Report(FunnelReportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Funnel {
            command: FunnelCommand::Report(args),
        } => run_funnel_report(args),
    }
}
