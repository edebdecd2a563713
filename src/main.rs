use anyhow::Result;
use clap::Parser;
use meetvocal::cli::{
    handle_download_command, handle_health_command, handle_jobs_command, handle_login_command,
    handle_logout_command, handle_register_command, handle_report_command, handle_upload_command,
    handle_whoami_command, Cli, CliCommand, CliContext,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        CliCommand::Version => {
            println!("MeetVocal {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        CliCommand::Health => return handle_health_command(cli.api_url).await,
        _ => {}
    }

    let mut context = CliContext::open(cli.api_url).await?;
    let result = match cli.command {
        CliCommand::Login(args) => handle_login_command(&mut context, args).await,
        CliCommand::Register(args) => handle_register_command(&mut context, args).await,
        CliCommand::Logout => handle_logout_command(&mut context).await,
        CliCommand::Whoami => handle_whoami_command(&mut context).await,
        CliCommand::Jobs => handle_jobs_command(&mut context).await,
        CliCommand::Upload(args) => handle_upload_command(&mut context, args).await,
        CliCommand::Report(args) => handle_report_command(&mut context, args).await,
        CliCommand::Download(args) => handle_download_command(&mut context, args).await,
        CliCommand::Version | CliCommand::Health => Ok(()),
    };
    context.finish().await?;
    result
}
