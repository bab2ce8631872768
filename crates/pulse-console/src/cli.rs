use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// PULSE 设备管理控制台
#[derive(Parser, Debug)]
#[command(name = "pulse", author, version, about = "IoT vitals admin console", long_about = None)]
pub struct Cli {
    /// Config file path (defaults to ./pulse.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL, overrides the config file
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Register a new device
    Register {
        #[arg(long)]
        device_id: String,
        #[arg(long, default_value = "")]
        model: String,
        #[arg(long, default_value = "")]
        patient_id: String,
        #[arg(long, default_value = "")]
        vital_type: String,
    },

    /// List registered devices
    List,

    /// Edit a device's model or patient
    Update {
        device_id: String,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        patient_id: Option<String>,
    },

    /// Delete a device
    Delete {
        device_id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Fetch and render readings once
    Data {
        /// Look-back window in hours
        #[arg(long)]
        hours: Option<u32>,
        /// Only this device
        #[arg(long)]
        device: Option<String>,
        /// Measurement to read, e.g. weather (defaults to the configured one)
        #[arg(long)]
        measurement: Option<String>,
        /// Also draw a chart per device
        #[arg(long)]
        chart: bool,
    },

    /// Poll readings and re-render until Ctrl-C
    ///
    /// While running, type a number of hours to change the window or an empty line to refresh.
    Watch {
        #[arg(long)]
        hours: Option<u32>,
        #[arg(long)]
        measurement: Option<String>,
        #[arg(long)]
        chart: bool,
    },

    /// Run the sensor simulator until Ctrl-C
    Simulate {
        /// vitals or weather
        #[arg(long)]
        profile: Option<String>,
    },

    /// Print the effective configuration
    ShowConfig,
}
