use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use newscast_bridge::{
    BridgeChannels, HostRequest, StyleId, TabId,
    config::{AudioOutput, AutoplayPolicy},
    notification::{NotificationMessage, NotificationType},
};
use newscast_executor::config::{data_dir, load_config, load_config_at};
use newscast_panel::{ActiveTab, ControlPanel, TriggerOutcome};
use newscast_store::FileStore;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Turn a news article into a spoken commentary and control its playback.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Address of the article to comment on.
    url: String,
    /// Tab the article is open in.
    #[arg(long, default_value_t = 1)]
    tab: u64,
    /// Commentary style (Uwu, RAP, Poetic, Funny, Casual).
    #[arg(long)]
    style: Option<StyleId>,
    /// Configuration file to use instead of the per-user one.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Block playback until the first command, like a browser without a
    /// prior user gesture.
    #[arg(long)]
    require_gesture: bool,
    /// Do not open an audio device; playback only advances a clock.
    #[arg(long)]
    headless: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    simple_logger::SimpleLogger::new()
        .with_colors(true)
        .with_threads(true)
        .with_local_timestamps()
        .env()
        .init()?;

    let args = Args::parse();
    let (mut config, state_dir) = match &args.config {
        Some(path) => (load_config_at(path).await?, data_dir()?),
        None => load_config().await?,
    };
    if args.require_gesture {
        config.playback.autoplay = AutoplayPolicy::RequiresGesture;
    }
    if args.headless {
        config.playback.output = AudioOutput::Headless;
    }

    let store = FileStore::open_session(state_dir.join("session.toml"))
        .await
        .context("failed to open the session store")?;
    let channels = BridgeChannels::new(&config.bus);
    let host = newscast_executor::spawn(channels.host_rx, channels.bus.clone(), &config)?;

    let tab = ActiveTab {
        id: TabId(args.tab),
        url: args.url,
    };
    let mut panel = ControlPanel::open(
        tab,
        channels.bus,
        Arc::new(store),
        channels.panel_tx.clone(),
        config.panel,
    )
    .await?;
    if let Some(style) = args.style {
        panel.select_style(style).await?;
    }
    render(&mut panel);

    if panel.trigger().await? == TriggerOutcome::Accepted {
        println!("Generating a {} commentary, please wait.", panel.style());
    }
    render(&mut panel);
    println!("Commands: t = play/pause, s = stop, r = restart, g = regenerate, q = quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.trim() {
                    "t" => { panel.toggle().await?; }
                    "s" => { panel.stop().await?; }
                    "r" => { panel.restart().await?; }
                    "g" => { panel.trigger().await?; }
                    "q" => break,
                    "" => continue,
                    other => println!("Unknown command {other:?}"),
                }
                render(&mut panel);
            }
            envelope = panel.recv_broadcast() => match envelope {
                Some(envelope) => {
                    panel.apply_broadcast(envelope).await?;
                    render(&mut panel);
                }
                None => {
                    log::warn!("Another panel took over the bus");
                    break;
                }
            },
        }
    }

    let tab = panel.tab().id;
    panel.close();
    channels
        .panel_tx
        .send(HostRequest::Unload { tab })
        .await
        .context("page host stopped unexpectedly")?;
    drop(channels.panel_tx);
    host.await?;

    Ok(())
}

fn render(panel: &mut ControlPanel) {
    for NotificationMessage {
        notification_type,
        message,
    } in panel.take_notices()
    {
        match notification_type {
            NotificationType::Info => println!("(i) {message}"),
            NotificationType::Warning => println!("(!) {message}"),
            NotificationType::Error => println!("(x) {message}"),
        }
    }

    let view = panel.view();
    let mut hints = Vec::new();
    if let Some(toggle) = view.toggle_label() {
        hints.push(format!("(t) {toggle}"));
    }
    if view.has_transport() {
        hints.push("(s) stop".to_string());
        hints.push("(r) restart".to_string());
    }
    println!("{view}  {}", hints.join("  "));
}
