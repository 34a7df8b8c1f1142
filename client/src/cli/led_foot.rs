mod commands;
mod utils;

use clap::{Parser, Subcommand};
use led_foot_client::{DEFAULT_SERVER_API, LedFootClientError};
use tracing_subscriber::EnvFilter;

#[derive(Subcommand, Debug, Clone)]
enum ColorCommands {
    /// Print the current color
    Get,
    /// Set a solid RGBW color, each channel 0-255, in place of any sequence
    Set { r: u8, g: u8, b: u8, w: u8 },
    /// Turn the strip on with the default color
    On,
    /// Turn the strip off
    Off,
}

#[derive(Subcommand, Debug, Clone)]
enum SequenceCommands {
    Get,
    Set { name: String },
}

#[derive(Subcommand, Debug, Clone)]
enum RoomCommands {
    List,
    On { id: String },
    Off { id: String },
    /// Enable one room and disable all the others
    Only { id: String },
}

#[derive(Subcommand, Debug, Default, Clone)]
enum Commands {
    #[default]
    Status,
    Ping,
    Color {
        #[command(subcommand)]
        command: ColorCommands,
    },
    Sequence {
        #[command(subcommand)]
        command: SequenceCommands,
    },
    Rooms {
        #[command(subcommand)]
        command: RoomCommands,
    },
}

#[derive(Parser, Debug)]
#[command(about = "Control a LED Foot lighting server")]
pub struct Params {
    /// Base URL of the LED Foot server API
    #[clap(long, env = "LED_FOOT_SERVER", default_value = DEFAULT_SERVER_API)]
    server: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() -> Result<(), LedFootClientError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let params = Params::parse();

    match params.command.clone().unwrap_or_default() {
        Commands::Status => commands::status(&params).await?,
        Commands::Ping => commands::ping(&params).await?,
        Commands::Color { command } => match command {
            ColorCommands::Get => commands::get_color(&params).await?,
            ColorCommands::Set { r, g, b, w } => {
                commands::set_color(&params, (r, g, b, w).into()).await?
            }
            ColorCommands::On => commands::turn_on(&params).await?,
            ColorCommands::Off => commands::turn_off(&params).await?,
        },
        Commands::Sequence { command } => match command {
            SequenceCommands::Get => commands::get_sequence(&params).await?,
            SequenceCommands::Set { name } => commands::set_sequence(&params, &name).await?,
        },
        Commands::Rooms { command } => match command {
            RoomCommands::List => commands::list_rooms(&params).await?,
            RoomCommands::On { id } => commands::switch_room(&params, &id, true).await?,
            RoomCommands::Off { id } => commands::switch_room(&params, &id, false).await?,
            RoomCommands::Only { id } => commands::only_room(&params, &id).await?,
        },
    }

    Ok(())
}
