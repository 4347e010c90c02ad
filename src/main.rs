// Copyright 2025 Tim Roberts
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod config;
mod prefs;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use log::{debug, info};
use roku_session::store::read_last_device;
use roku_session::{
    ClientConfig, Device, DeviceInfoClient, HttpDeviceClient, LastDevice, PreferenceStore,
    SelectionSource, Session, SessionConfig, SessionController, StoreError, ViewState,
};

use config::AppConfig;
use prefs::FileStore;

/// Exit status when a reconnect attempt ends anywhere but `DeviceReconnected`.
const EXIT_NOT_RECONNECTED: i32 = 2;

/// Exit status when `select` could not persist the chosen device.
const EXIT_NOT_REMEMBERED: i32 = 3;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Preferences file holding the last-used device
    #[arg(long, global = true)]
    prefs: Option<PathBuf>,

    /// Device-info request timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Try to reach the last-used device again
    Reconnect,
    /// Query a device and remember it as the last-used device
    Select {
        /// Device location, e.g. http://192.168.1.20:8060/
        location: String,
    },
    /// Print a device's device-info document
    Info {
        location: String,
        #[arg(long)]
        json: bool,
    },
    /// Show the remembered device and file locations
    Status,
    /// Persist settings to the configuration file
    Configure {
        #[arg(long)]
        request_timeout_ms: Option<u64>,
        #[arg(long)]
        preferences_path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match run(cli).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<i32, Box<dyn std::error::Error>> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(timeout_ms) = cli.timeout_ms {
        config.request_timeout_ms = timeout_ms;
    }
    if let Some(path) = cli.prefs.clone() {
        config.preferences_path = Some(path);
    }
    debug!("Configuration: {config:?}");

    match cli.command {
        Commands::Reconnect => reconnect(&config).await,
        Commands::Select { location } => select(&config, &location).await,
        Commands::Info { location, json } => info_command(&config, &location, json).await,
        Commands::Status => status(&config, cli.config.is_some()),
        Commands::Configure {
            request_timeout_ms,
            preferences_path,
        } => configure(cli.config.as_deref(), request_timeout_ms, preferences_path),
    }
}

fn http_client(config: &AppConfig) -> Result<HttpDeviceClient, Box<dyn std::error::Error>> {
    Ok(HttpDeviceClient::new(ClientConfig {
        timeout: config.request_timeout(),
        ..Default::default()
    })?)
}

fn open_store(config: &AppConfig) -> Result<FileStore, Box<dyn std::error::Error>> {
    Ok(FileStore::open(config.preferences_path()?))
}

fn controller(
    config: &AppConfig,
) -> Result<SessionController<HttpDeviceClient, FileStore>, Box<dyn std::error::Error>> {
    Ok(SessionController::with_config(
        http_client(config)?,
        open_store(config)?,
        SessionConfig {
            request_timeout: config.request_timeout(),
        },
    ))
}

async fn reconnect(config: &AppConfig) -> Result<i32, Box<dyn std::error::Error>> {
    let session = Session::spawn(controller(config)?);
    let state = session.reconnect_last_device().await?;
    session.shutdown();

    println!("{state}");
    Ok(match state {
        ViewState::DeviceReconnected(_) => 0,
        _ => EXIT_NOT_RECONNECTED,
    })
}

async fn select(config: &AppConfig, location: &str) -> Result<i32, Box<dyn std::error::Error>> {
    let client = http_client(config)?;
    let info = client.device_info(location).await?;
    let device = Device::new(location, info.friendly_device_name, info.device_id);

    let mut controller = controller(config)?;
    controller.select_device(device.clone(), SelectionSource::User);
    println!("{}", controller.state());

    // The controller never reports store failures, so check the file itself.
    let store = open_store(config)?;
    if !is_remembered(&store, &device)? {
        eprintln!(
            "Device selected but could not be remembered in {}",
            store.path().display()
        );
        return Ok(EXIT_NOT_REMEMBERED);
    }
    info!("Remembered device in {}", store.path().display());
    Ok(0)
}

/// Whether the store's last-device record is exactly `device`.
fn is_remembered(store: &impl PreferenceStore, device: &Device) -> Result<bool, StoreError> {
    Ok(match read_last_device(store)? {
        LastDevice::Complete { location, name } => {
            location == device.location() && name == device.friendly_name().trim()
        }
        LastDevice::None | LastDevice::Partial { .. } => false,
    })
}

async fn info_command(
    config: &AppConfig,
    location: &str,
    json: bool,
) -> Result<i32, Box<dyn std::error::Error>> {
    let info = http_client(config)?.device_info(location).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(0);
    }

    println!("Name:      {}", info.friendly_device_name);
    println!("Device ID: {}", info.device_id);
    let optional = [
        ("Vendor", &info.vendor_name),
        ("Model", &info.model_name),
        ("Model no.", &info.model_number),
        ("Serial", &info.serial_number),
        ("Software", &info.software_version),
        ("Power", &info.power_mode),
        ("Network", &info.network_name),
    ];
    for (label, value) in optional {
        if let Some(value) = value {
            println!("{:<10} {value}", format!("{label}:"));
        }
    }
    Ok(0)
}

fn status(config: &AppConfig, custom_config: bool) -> Result<i32, Box<dyn std::error::Error>> {
    let store = open_store(config)?;

    match read_last_device(&store)? {
        LastDevice::None => println!("No device remembered"),
        LastDevice::Complete { location, name } => {
            println!("Last device: {name} at {location}");
        }
        LastDevice::Partial { location, name } => println!(
            "Incomplete record (location: {}, name: {}); it will be discarded on next reconnect",
            location.as_deref().unwrap_or("-"),
            name.as_deref().unwrap_or("-"),
        ),
    }

    if !custom_config {
        println!("Config file: {}", AppConfig::get_config_path()?.display());
    }
    println!("Preferences file: {}", store.path().display());
    println!("Request timeout: {} ms", config.request_timeout_ms);
    Ok(0)
}

fn configure(
    path: Option<&std::path::Path>,
    request_timeout_ms: Option<u64>,
    preferences_path: Option<PathBuf>,
) -> Result<i32, Box<dyn std::error::Error>> {
    // Reload so that global overrides are not written back by accident.
    let mut config = AppConfig::load(path)?;
    if let Some(timeout_ms) = request_timeout_ms {
        config.request_timeout_ms = timeout_ms;
    }
    if preferences_path.is_some() {
        config.preferences_path = preferences_path;
    }
    config.save(path)?;

    println!("Saved configuration: {config:?}");
    Ok(0)
}
