use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::api::JobId;

#[derive(Parser, Debug)]
#[command(name = "meetvocal")]
#[command(about = "Upload meeting recordings and read their reports", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override the backend URL from the config file
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Sign in and remember the session
    Login(LoginCliArgs),
    /// Create an account and sign in with it
    Register(RegisterCliArgs),
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List your recordings and their status
    Jobs,
    /// Upload a recording for transcription
    Upload(UploadCliArgs),
    /// Show the generated report of a recording
    Report(ReportCliArgs),
    /// Download the PDF report of a recording
    Download(DownloadCliArgs),
    /// Check that the backend is reachable
    Health,
    /// Print version information
    Version,
}

#[derive(ClapArgs, Debug)]
pub struct LoginCliArgs {
    #[arg(short, long)]
    pub email: Option<String>,
    /// Prompted for when omitted
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(ClapArgs, Debug)]
pub struct RegisterCliArgs {
    #[arg(short, long)]
    pub name: Option<String>,
    #[arg(short, long)]
    pub email: Option<String>,
    /// Prompted for (with confirmation) when omitted
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(ClapArgs, Debug)]
pub struct UploadCliArgs {
    /// Audio file (mp3, wav, m4a, ogg, flac)
    pub file: PathBuf,
    /// Meeting title (defaults to the file name)
    #[arg(short, long)]
    pub title: Option<String>,
    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(ClapArgs, Debug)]
pub struct ReportCliArgs {
    /// Recording ID as shown by `meetvocal jobs`
    pub id: JobId,
    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
pub struct DownloadCliArgs {
    /// Recording ID as shown by `meetvocal jobs`
    pub id: JobId,
    /// Directory to save into (defaults to the configured download directory)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}
