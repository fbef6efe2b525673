//! Photobooth CLI — Command-line interface for shooting and composing photo strips.
//!
//! Usage:
//!   photobooth check            Report platform capabilities
//!   photobooth layouts          List layouts and frame colors
//!   photobooth shoot [OPTIONS]  Run a timed capture and export the composite
//!   photobooth compose <PNG>... Compose existing images and export

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use photobooth_common::config::AppConfig;
use photobooth_common::error::PhotoboothError;

mod commands;

#[derive(Parser)]
#[command(
    name = "photobooth",
    about = "Camera photobooth with framed multi-photo layouts",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report what the host platform supports
    Check {
        /// User-agent string to classify
        #[arg(long)]
        user_agent: Option<String>,

        /// Page URL the booth would be served from
        #[arg(long, default_value = "http://localhost/")]
        url: String,
    },

    /// List available layouts and frame colors
    Layouts,

    /// Open the camera, run a timed capture, compose, and export
    Shoot {
        /// Layout id (single, column, row, grid); defaults to the config value
        #[arg(short, long)]
        layout: Option<String>,

        /// Frame color name or hex; defaults to the config value
        #[arg(short, long)]
        color: Option<String>,

        /// Fill every cell of the layout with one countdown per photo
        #[arg(long)]
        multi: bool,

        /// Countdown length in seconds
        #[arg(long)]
        count_secs: Option<u8>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// User-agent string of the simulated browser
        #[arg(long)]
        user_agent: Option<String>,

        /// Page URL of the simulated browser
        #[arg(long, default_value = "http://localhost/")]
        url: String,

        /// Use the synthetic test-pattern camera instead of hardware
        #[arg(long)]
        synthetic: bool,

        /// Video device index for the front camera (/dev/videoN)
        #[arg(long, default_value = "0")]
        device: usize,

        /// Video device index for the rear camera, if there is one
        #[arg(long)]
        rear_device: Option<usize>,

        /// Native width of the synthetic camera
        #[arg(long, default_value = "1280")]
        width: u32,

        /// Native height of the synthetic camera
        #[arg(long, default_value = "720")]
        height: u32,
    },

    /// Compose existing images into a framed layout and export it
    Compose {
        /// Images in slot order
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Layout id (single, column, row, grid); defaults to the config value
        #[arg(short, long)]
        layout: Option<String>,

        /// Frame color name or hex; defaults to the config value
        #[arg(short, long)]
        color: Option<String>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write a save page instead of downloading the PNG
        #[arg(long)]
        surface: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let mut config = photobooth_common::config::AppConfig::load();

    // Initialize logging
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    photobooth_common::logging::init_logging(&config.logging);

    if let Err(err) = run(cli.command, config).await {
        tracing::error!(error = %format!("{err:#}"), "Command failed");
        eprintln!("Error: {}", describe_error(&err));
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: AppConfig) -> anyhow::Result<()> {
    match command {
        Commands::Check { user_agent, url } => commands::check::run(user_agent, url),
        Commands::Layouts => commands::layouts::run(),
        Commands::Shoot {
            layout,
            color,
            multi,
            count_secs,
            output,
            user_agent,
            url,
            synthetic,
            device,
            rear_device,
            width,
            height,
        } => {
            commands::shoot::run(
                config.booth,
                commands::shoot::ShootOptions {
                    layout,
                    color,
                    multi,
                    count_secs,
                    output,
                    user_agent,
                    url,
                    width,
                    height,
                    synthetic,
                    device,
                    rear_device,
                },
            )
            .await
        }
        Commands::Compose {
            images,
            layout,
            color,
            output,
            surface,
        } => commands::compose::run(config.booth, images, layout, color, output, surface),
    }
}

/// What to tell the person at the booth when a command fails.
///
/// Booth errors carry their own guidance; anything else falls back to the
/// full error chain.
fn describe_error(err: &anyhow::Error) -> String {
    let Some(booth_err) = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<PhotoboothError>())
    else {
        return format!("{err:#}");
    };
    let mut message = booth_err.user_message();
    if booth_err.is_camera_error() {
        message.push_str(
            "\nCheck that a camera is connected and not in use by another program, \
             or pass --synthetic to use the test-pattern camera.",
        );
    }
    message
}
