//! CLI handler for uploading a recording.
//!
//! Streams the file to the backend while rendering progress, then shows the
//! job list once the delayed refresh has run.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

use crate::cli::args::UploadCliArgs;
use crate::cli::jobs::print_jobs;
use crate::cli::CliContext;
use crate::upload::UploadEvent;

pub async fn handle_upload_command(context: &mut CliContext, args: UploadCliArgs) -> Result<()> {
    context.require_session().await?;

    let title = args.title.unwrap_or_else(|| {
        args.file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Meeting")
            .to_string()
    });

    let (tx, mut rx) = mpsc::unbounded_channel::<UploadEvent>();
    let pb = if args.no_progress {
        None
    } else {
        let pb = create_progress_bar();
        pb.set_message("Uploading...");
        Some(pb)
    };

    let renderer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                UploadEvent::Progress { percent, .. } => {
                    if let Some(pb) = &pb {
                        pb.set_position(percent as u64);
                    }
                }
                UploadEvent::Succeeded(_) => {
                    if let Some(pb) = &pb {
                        pb.set_position(100);
                        pb.finish_with_message("Uploaded");
                    }
                }
                UploadEvent::Failed { message, .. } => {
                    if let Some(pb) = &pb {
                        pb.abandon_with_message(message);
                    }
                }
            }
        }
    });

    let result = context
        .client()
        .upload_file(&args.file, &title, &tx, context.cancel())
        .await;
    drop(tx);
    if let Err(e) = renderer.await {
        warn!("Progress renderer stopped: {}", e);
    }
    let outcome = context.check(result)?;

    context.notices().success(format!(
        "Uploaded '{}' as recording #{}; transcription is in progress",
        outcome.job.title, outcome.job.id
    ));

    eprintln!("Refreshing job list...");
    match outcome.refresh.join().await {
        Some(Ok(jobs)) => print_jobs(&jobs),
        Some(Err(e)) => {
            context.check::<()>(Err(e))?;
        }
        None => {}
    }
    Ok(())
}

fn create_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━╸━"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
