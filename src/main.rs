use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use log::{info, warn};

use studio_av::models::{EditorMode, SelectedFile};
use studio_av::notification::{
    ConsoleNotifier, ConsoleProgressObserver, LogNotifier, LogProgressObserver, UserNotifier,
};
use studio_av::utils::logger::init_logger;
use studio_av::{Shell, StudioConfig, Tab};

const USAGE: &str = "usage: studio-av [--config <file>] <text-file> [media...]";

struct Args {
    config: Option<PathBuf>,
    text_file: PathBuf,
    media: Vec<PathBuf>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut config = std::env::var_os("STUDIO_CONFIG").map(PathBuf::from);
    let mut positional = Vec::new();

    let mut args = std::env::args_os().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            let path = args.next().context("--config needs a path")?;
            config = Some(PathBuf::from(path));
        } else {
            positional.push(PathBuf::from(arg));
        }
    }

    if positional.is_empty() {
        bail!(USAGE);
    }
    let text_file = positional.remove(0);
    Ok(Args {
        config,
        text_file,
        media: positional,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let args = parse_args()?;
    let config = StudioConfig::load_or_default(args.config.as_deref())?;
    let download_dir = config.download_dir();
    std::fs::create_dir_all(&download_dir)
        .with_context(|| format!("Failed to create {}", download_dir.display()))?;

    // Без терминала всё идёт в лог
    let interactive = std::io::stderr().is_terminal();
    let notifier: Arc<dyn UserNotifier> = if interactive {
        Arc::new(ConsoleNotifier)
    } else {
        Arc::new(LogNotifier)
    };

    let mut shell = Shell::with_system_backends(&config, notifier)?;
    for (tracker, prefix) in [
        (shell.audio().tracker(), "[audio] "),
        (shell.video().tracker(), "[video] "),
    ] {
        if interactive {
            tracker.add_observer(Box::new(ConsoleProgressObserver::with_prefix(prefix)));
        } else {
            tracker.add_observer(Box::new(LogProgressObserver));
        }
    }

    let text = std::fs::read_to_string(&args.text_file)
        .with_context(|| format!("Failed to read {}", args.text_file.display()))?;
    shell.audio_mut().set_text(&text);

    let clip = shell.generate_audio().await?;
    info!("Generated {} bytes of {}", clip.len(), clip.format_label());
    if let Some(path) = shell.audio().download(&download_dir)? {
        println!("Audio saved to {}", path.display());
    }

    if args.media.is_empty() {
        warn!("No media given, skipping video preview");
        return Ok(());
    }

    shell.select_tab(Tab::Video);
    let video = shell.video_mut();
    video.set_mode(EditorMode::Simple);
    let added = video
        .upload(args.media.into_iter().map(SelectedFile::from_path))
        .await;
    info!("Uploaded {} media files", added.len());
    video.apply_simple_mode()?;

    shell.render_video().await?;
    if let Some(path) = shell.video().download(&download_dir)? {
        println!("Preview saved to {}", path.display());
    }

    Ok(())
}
