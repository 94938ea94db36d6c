use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

use clippyio_client::app_state::AppState;
use clippyio_client::config::ClientConfig;
use clippyio_client::models::job::JobId;
use clippyio_client::models::options::{ProcessingOptions, UploadRequest};
use clippyio_client::services::access::{AccessGate, FileStore};
use clippyio_client::telemetry;
use clippyio_client::view::{JobView, ViewAction, ViewStatus};

type Input = Lines<BufReader<Stdin>>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "ClippyIO client: turn long videos into share-ready clips",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Enter the early-access code
    Unlock { code: String },
    /// Upload a video and follow its processing
    Upload {
        file: PathBuf,
        #[command(flatten)]
        stages: StageFlags,
    },
    /// Follow an existing job
    Track { job_id: String },
}

#[derive(Args, Clone, Copy)]
struct StageFlags {
    /// Skip the text summary
    #[arg(long)]
    no_summary: bool,
    /// Skip the social caption
    #[arg(long)]
    no_video_caption: bool,
    /// Skip burnt-in captions on clips
    #[arg(long)]
    no_captions: bool,
}

impl From<StageFlags> for ProcessingOptions {
    fn from(flags: StageFlags) -> Self {
        Self {
            summary: !flags.no_summary,
            video_caption: !flags.no_video_caption,
            captions: !flags.no_captions,
        }
    }
}

/// What to do after a job view settles.
enum Next {
    Quit,
    Upload,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env()?;

    if let Some(addr) = &config.metrics_addr {
        let addr: SocketAddr = addr.parse()?;
        PrometheusBuilder::new().with_http_listener(addr).install()?;
        telemetry::describe();
        tracing::info!(%addr, "Prometheus exporter listening");
    }

    let gate = AccessGate::new(
        Box::new(FileStore::new(&config.access_store_path)),
        config.access_code.clone(),
    );

    if let Command::Unlock { code } = &cli.command {
        gate.unlock(code)?;
        println!("Access granted.");
        return Ok(());
    }

    gate.require()?;

    let state = AppState::from_config(&config)?;
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    let mut job_id = match cli.command {
        Command::Upload { file, stages } => {
            match upload(&state, &file, stages.into()).await {
                Ok(job_id) => job_id,
                Err(e) => {
                    eprintln!("Upload failed: {}", e);
                    match prompt_upload(&state, &mut input).await? {
                        Some(job_id) => job_id,
                        None => return Ok(()),
                    }
                }
            }
        }
        Command::Track { job_id } => JobId::new(job_id),
        Command::Unlock { .. } => return Ok(()),
    };

    loop {
        match track(&state, job_id, &mut input).await? {
            Next::Quit => return Ok(()),
            Next::Upload => match prompt_upload(&state, &mut input).await? {
                Some(next_job) => job_id = next_job,
                None => return Ok(()),
            },
        }
    }
}

async fn upload(
    state: &AppState,
    path: &Path,
    options: ProcessingOptions,
) -> Result<JobId, Box<dyn std::error::Error>> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    println!("Uploading {} ({} bytes)...", file_name, bytes.len());
    let job_id = state
        .uploader
        .submit(UploadRequest::new(file_name, bytes, options))
        .await?;
    println!("Job {} created.", job_id);
    Ok(job_id)
}

/// Ask for a file until an upload succeeds. `None` on end of input or an empty line.
async fn prompt_upload(
    state: &AppState,
    input: &mut Input,
) -> Result<Option<JobId>, Box<dyn std::error::Error>> {
    loop {
        println!("Path of the video to upload (empty line to quit):");
        let Some(line) = input.next_line().await? else {
            return Ok(None);
        };
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        match upload(state, Path::new(line), ProcessingOptions::default()).await {
            Ok(job_id) => return Ok(Some(job_id)),
            Err(e) => eprintln!("Upload failed: {}", e),
        }
    }
}

async fn track(
    state: &AppState,
    job_id: JobId,
    input: &mut Input,
) -> Result<Next, Box<dyn std::error::Error>> {
    let mut view = JobView::attach(state, job_id);

    println!("Processing your video. This usually takes 1-5 minutes.");
    let mut status = view.view_status();
    println!("Status: {}", status_label(status));
    while !status.is_settled() {
        status = view.changed().await;
        println!("Status: {}", status_label(status));
    }

    if status == ViewStatus::Failed {
        println!("Something went wrong. The job failed to process.");
        let restart = view.with_state(|s| s.restart());
        view.detach();
        return Ok(match restart {
            Some(ViewAction::NewUpload) => Next::Upload,
            _ => Next::Quit,
        });
    }

    print_results(&view);

    loop {
        let actions = view.with_state(|s| s.available_actions());
        println!("{}", prompt_line(&actions));

        let Some(line) = input.next_line().await? else {
            view.detach();
            return Ok(Next::Quit);
        };

        let action = match line.trim() {
            "n" => ViewAction::NextClip,
            "p" => ViewAction::PrevClip,
            "u" => ViewAction::NewUpload,
            "q" => {
                view.detach();
                return Ok(Next::Quit);
            }
            _ => continue,
        };

        match action {
            ViewAction::NextClip => view.with_state(|s| s.next_clip()),
            ViewAction::PrevClip => view.with_state(|s| s.prev_clip()),
            ViewAction::NewUpload => {
                view.detach();
                return Ok(Next::Upload);
            }
        }
        print_current_clip(&view);
    }
}

fn status_label(status: ViewStatus) -> &'static str {
    match status {
        ViewStatus::Queued => "queued",
        ViewStatus::Processing => "processing",
        ViewStatus::AwaitingResults => "fetching results",
        ViewStatus::Viewing => "done",
        ViewStatus::Failed => "failed",
    }
}

fn print_results(view: &JobView) {
    view.with_state(|s| {
        if let Some(results) = s.results() {
            println!();
            println!("Summary:");
            println!("  {}", results.summary.as_deref().unwrap_or("No summary generated."));
            println!("Caption:");
            println!("  {}", results.caption.as_deref().unwrap_or("No caption generated."));
            println!();
        }
    });
    print_current_clip(view);
}

fn print_current_clip(view: &JobView) {
    view.with_state(|s| match (s.clip_position(), s.current_clip()) {
        (Some((position, total)), Ok(clip)) => {
            println!("Clip {} of {}", position, total);
            println!("  {}  ({})", clip.url, clip.duration_label());
        }
        _ => println!("No clips were produced for this video."),
    });
}

fn prompt_line(actions: &[ViewAction]) -> String {
    let mut choices: Vec<&str> = actions
        .iter()
        .map(|action| match action {
            ViewAction::PrevClip => "[p]rev",
            ViewAction::NextClip => "[n]ext",
            ViewAction::NewUpload => "[u]pload another video",
        })
        .collect();
    choices.push("[q]uit");
    choices.join("  ")
}
