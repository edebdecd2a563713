//! Job listing, report viewing and PDF download commands.

use anyhow::{Context, Result};

use crate::api::AudioJob;
use crate::cli::args::{DownloadCliArgs, ReportCliArgs};
use crate::cli::CliContext;
use crate::download::DirectorySink;
use crate::jobs::StatusBadge;
use crate::report::{format_date, format_duration};

pub async fn handle_jobs_command(context: &mut CliContext) -> Result<()> {
    context.require_session().await?;
    let result = context.client().jobs().refresh(context.cancel()).await;
    let jobs = context.check(result)?;
    print_jobs(&jobs);
    Ok(())
}

pub async fn handle_report_command(context: &mut CliContext, args: ReportCliArgs) -> Result<()> {
    context.require_session().await?;
    let result = context
        .client()
        .reports()
        .open(args.id, context.cancel())
        .await;
    let view = context.check(result)?;
    let text = view.render();

    if let Some(output_path) = &args.output {
        std::fs::write(output_path, &text).context("Failed to write report file")?;
        context
            .notices()
            .success(format!("Report saved to {}", output_path.display()));
    } else {
        println!("{}", text);
    }
    Ok(())
}

pub async fn handle_download_command(
    context: &mut CliContext,
    args: DownloadCliArgs,
) -> Result<()> {
    context.require_session().await?;

    let client = context.client();
    let refreshed = client.jobs().refresh(context.cancel()).await;
    context.check(refreshed)?;
    let found = context.client().jobs().get(args.id).await;
    let job = context.check(found)?;

    let dir = args
        .output_dir
        .unwrap_or_else(|| context.client().config().download.output_dir());
    let sink = DirectorySink::new(dir);
    let result = context
        .client()
        .downloads()
        .export(&job, &sink, context.cancel())
        .await;
    let path = context.check(result)?;

    context
        .notices()
        .success(format!("Saved {}", path.display()));
    Ok(())
}

/// Print the job list in backend order.
pub fn print_jobs(jobs: &[AudioJob]) {
    if jobs.is_empty() {
        println!("No recordings yet. Upload one with `meetvocal upload <file>`.");
        return;
    }

    println!(
        "{:<6} {:<14} {:<18} {:<8} {}",
        "ID", "STATUS", "UPLOADED", "LENGTH", "TITLE"
    );
    for job in jobs {
        let badge = match StatusBadge::for_job(job) {
            Ok(badge) => badge.to_string(),
            Err(_) => format!("? {}", job.raw_status()),
        };
        let uploaded = job
            .uploaded_at
            .as_deref()
            .map(format_date)
            .unwrap_or_default();
        println!(
            "{:<6} {:<14} {:<18} {:<8} {}",
            job.id,
            badge,
            uploaded,
            format_duration(job.duration_seconds),
            job.title
        );
    }
}
