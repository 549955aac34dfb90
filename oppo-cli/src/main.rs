use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use oppo_media_player::logging::{self, LoggingMode};
use oppo_media_player::{
    ConfigEntry, MediaPlayerEntity, NoopStateWriter, OppoMediaPlayer, PlayerConfig,
    UpdateScheduler, WatchStateWriter,
};

pub mod output;

use output::OutputFormat;

/// Oppo UDP-203 telnet control
///
/// Sends a single command to an Oppo player, refreshes its state and prints
/// the result. `watch` keeps polling until interrupted.
#[derive(Parser, Debug)]
#[command(name = "oppo-cli")]
#[command(about = "Control an Oppo UDP-203 player over its telnet interface")]
#[command(version)]
pub struct Args {
    /// Player host name or IP address
    #[arg(long)]
    pub host: Option<String>,

    /// Telnet port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Per-command timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// JSON config entry to read the player settings from
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Logging mode (silent, development, debug, json)
    #[arg(long, default_value = "development")]
    pub log_mode: String,

    /// Print state as JSON
    #[arg(long)]
    pub json: bool,

    #[command(subcommand)]
    pub action: Action,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Action {
    /// Refresh and print the player state
    Status,
    /// Power the player on
    On,
    /// Power the player off
    Off,
    Play,
    Pause,
    Stop,
    /// Skip to the next track
    Next,
    /// Go back to the previous track
    Prev,
    Mute,
    Unmute,
    /// Set the volume (0.0 to 1.0)
    Volume { level: f64 },
    /// Poll the player and print every state change
    Watch {
        /// Seconds between refreshes
        #[arg(short, long)]
        interval: Option<u64>,
    },
}

impl Args {
    /// Validate command line arguments
    pub fn validate(&self) -> Result<()> {
        if let Action::Volume { level } = self.action {
            if !(0.0..=1.0).contains(&level) {
                return Err(anyhow::anyhow!(
                    "Invalid volume {}. Expected a value between 0.0 and 1.0",
                    level
                ));
            }
        }

        if let Action::Watch { interval: Some(0) } = self.action {
            return Err(anyhow::anyhow!("Watch interval must be positive"));
        }

        self.log_mode.parse::<LoggingMode>()?;

        Ok(())
    }

    /// Resolve the player settings.
    ///
    /// Starts from `--config` when given, otherwise from `--host` or the
    /// `OPPO_*` environment variables. Explicit flags override either source.
    pub fn player_config(&self) -> Result<PlayerConfig> {
        let mut config = if let Some(path) = &self.config {
            ConfigEntry::load(path)
                .with_context(|| format!("Failed to load config entry {}", path.display()))?
                .data
        } else if let Some(host) = &self.host {
            PlayerConfig::new(host.clone())
        } else {
            PlayerConfig::from_env().context("No player host given. Pass --host or set OPPO_HOST")?
        };

        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = Some(timeout_ms);
        }
        if let Action::Watch { interval: Some(secs) } = self.action {
            config.scan_interval_secs = secs;
        }

        config.validate().context("Invalid player configuration")?;
        Ok(config)
    }

    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Run a one-shot action, then refresh so the printed state is current
async fn run_action(player: &OppoMediaPlayer, action: &Action) {
    match action {
        Action::Status | Action::Watch { .. } => {}
        Action::On => player.turn_on().await,
        Action::Off => player.turn_off().await,
        Action::Play => player.media_play().await,
        Action::Pause => player.media_pause().await,
        Action::Stop => player.media_stop().await,
        Action::Next => player.media_next_track().await,
        Action::Prev => player.media_previous_track().await,
        Action::Mute => player.mute_volume(true).await,
        Action::Unmute => player.mute_volume(false).await,
        Action::Volume { level } => player.set_volume_level(*level).await,
    }

    player.update().await;
}

/// Poll until Ctrl+C, printing each published snapshot
async fn watch(config: &PlayerConfig, format: OutputFormat) -> Result<()> {
    let (writer, mut changes) = WatchStateWriter::new();
    let player: Arc<dyn MediaPlayerEntity> =
        Arc::new(OppoMediaPlayer::from_config(config, Arc::new(writer)));

    info!(
        "Watching {} every {}s (Press Ctrl+C to stop)",
        player.name(),
        config.scan_interval_secs
    );
    let scheduler = UpdateScheduler::start(Arc::clone(&player), config.scan_interval());

    let mut last = None;
    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = *changes.borrow_and_update();
                if last != Some(snapshot) {
                    println!("{}", output::render(&snapshot, format)?);
                    last = Some(snapshot);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping refresh loop");
                break;
            }
        }
    }

    let stats = scheduler.stats();
    scheduler.shutdown().await.context("Failed to stop refresh loop")?;
    info!(
        "Completed {} refreshes in {:?}",
        stats.update_count,
        stats.started_at.elapsed().unwrap_or(Duration::ZERO)
    );

    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let config = args.player_config()?;
    let format = args.output_format();

    if let Action::Watch { .. } = args.action {
        return watch(&config, format).await;
    }

    let player = OppoMediaPlayer::from_config(&config, Arc::new(NoopStateWriter));
    run_action(&player, &args.action).await;

    println!("{}", output::render(&player.snapshot(), format)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    args.validate()?;

    let mode: LoggingMode = args.log_mode.parse()?;
    logging::init_logging(mode).context("Failed to initialize logging")?;

    if let Err(e) = run(args).await {
        error!("oppo-cli failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
