use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};

use keylight_control_lib::control_interface::{LightAdjustment, PowerAction};
use keylight_control_lib::errors::Error;
use keylight_control_lib::operations::{self, LightSelection, LightStatus};
use keylight_control_lib::util::discovery::{Device, Discovery, MdnsDiscovery};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    handle_cli(cli).await
}

/// This struct defines the command line interface of the application
#[derive(Parser)]
#[clap(
    name = "keylight-control",
    about = "Discovers and controls Elgato Key Light accessories",
    version
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum OutputFormat {
    /// Plain text format.
    Plaintext,
    /// JSON format.
    Json,
    /// YAML format.
    Yaml,
}

/// Which lights a command acts on.
#[derive(Args)]
pub struct SelectionArgs {
    /// Act on all keylights discovered within the timeout window
    #[clap(long, conflicts_with = "light")]
    pub all: bool,

    /// A light to act on. Can be a full name (Elgato\ Key\ Light\ 111A), a
    /// short ID (111A), or a host:port address that skips discovery.
    /// May be provided multiple times.
    #[clap(long = "light", required_unless_present = "all")]
    pub light: Vec<String>,
}

impl SelectionArgs {
    fn into_selection(self) -> LightSelection {
        LightSelection {
            lights: self.light,
            all: self.all,
        }
    }
}

/// Subcommands available for the CLI
#[derive(Subcommand)]
pub enum Commands {
    /// Discover keylights on the local network
    #[clap(name = "discover")]
    Discover {
        /// Output format (plaintext, json, yaml)
        #[clap(short, long, value_enum, default_value_t = OutputFormat::Plaintext)]
        output: OutputFormat,

        /// Maximum time to listen for accessories, in milliseconds
        #[clap(short = 't', long = "timeout", default_value_t = 5000)]
        timeout: u64,
    },
    /// Describe the current state of the selected keylights
    #[clap(name = "describe")]
    Describe {
        #[clap(flatten)]
        selection: SelectionArgs,

        /// Also fetch accessory info (product name, firmware) per light
        #[clap(long)]
        verbose: bool,

        /// Output format (plaintext, json, yaml)
        #[clap(short, long, value_enum, default_value_t = OutputFormat::Plaintext)]
        output: OutputFormat,

        /// Maximum time to listen for accessories, in milliseconds
        #[clap(short = 't', long = "timeout", default_value_t = 5000)]
        timeout: u64,
    },
    /// Switch keylights on and off
    #[clap(name = "switch")]
    Switch {
        /// The power transition to apply
        #[clap(value_enum)]
        action: PowerAction,

        #[clap(flatten)]
        selection: SelectionArgs,

        /// Brightness to set while switching; negative leaves it unchanged
        #[clap(short, long, default_value_t = -1, allow_negative_numbers = true)]
        brightness: i32,

        /// Temperature to set while switching; negative leaves it unchanged
        #[clap(long, default_value_t = -1, allow_negative_numbers = true)]
        temperature: i32,

        /// Maximum time to listen for accessories, in milliseconds
        #[clap(short = 't', long = "timeout", default_value_t = 5000)]
        timeout: u64,
    },
}

fn new_discovery() -> Result<Box<dyn Discovery>, Error> {
    Ok(Box::new(MdnsDiscovery::new()?))
}

async fn handle_cli(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Discover { output, timeout } => {
            let devices =
                operations::discover_lights(new_discovery, Duration::from_millis(timeout)).await?;
            match output {
                OutputFormat::Plaintext => {
                    if devices.is_empty() {
                        println!("Found no accessories during discovery");
                    } else {
                        print_devices(&devices);
                        println!("Found {} light(s) during discovery", devices.len());
                    }
                }
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string(&devices)?);
                }
                OutputFormat::Yaml => {
                    print!("{}", serde_yaml::to_string(&devices)?);
                }
            }
        }
        Commands::Describe {
            selection,
            verbose,
            output,
            timeout,
        } => {
            let statuses = operations::describe_lights(
                new_discovery,
                &selection.into_selection(),
                Duration::from_millis(timeout),
                verbose,
            )
            .await?;
            match output {
                OutputFormat::Plaintext => print_statuses(&statuses, verbose),
                OutputFormat::Json => println!("{}", serde_json::to_string(&statuses)?),
                OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&statuses)?),
            }
        }
        Commands::Switch {
            action,
            selection,
            brightness,
            temperature,
            timeout,
        } => {
            let adjustment = LightAdjustment {
                action,
                brightness,
                temperature,
            };
            let updated = operations::switch_lights(
                new_discovery,
                &selection.into_selection(),
                &adjustment,
                Duration::from_millis(timeout),
            )
            .await?;
            for device in &updated {
                println!("Updated {}", device.label());
            }
        }
    }

    Ok(())
}

fn print_devices(devices: &[Device]) {
    let rows: Vec<Vec<String>> = devices
        .iter()
        .map(|device| {
            vec![
                device.label(),
                device.address.clone(),
                device.port.to_string(),
            ]
        })
        .collect();
    print_table(&["Name", "Address", "Port"], &rows);
}

fn print_statuses(statuses: &[LightStatus], verbose: bool) {
    let mut header = vec!["Name", "Light", "Power", "Brightness", "Temperature"];
    if verbose {
        header.push("Product");
        header.push("Firmware");
    }

    let mut rows = Vec::new();
    for status in statuses {
        for (idx, light) in status.group.lights.iter().enumerate() {
            let mut row = vec![
                status.device.label(),
                idx.to_string(),
                if light.on == 1 { "on" } else { "off" }.to_string(),
                light.brightness.to_string(),
                light.temperature.to_string(),
            ];
            if verbose {
                let (product, firmware) = match &status.info {
                    Some(info) => (info.product_name.clone(), info.firmware_version.clone()),
                    None => (String::new(), String::new()),
                };
                row.push(product);
                row.push(firmware);
            }
            rows.push(row);
        }
    }

    print_table(&header, &rows);
}

/// Prints a left-aligned column table, sizing each column to its widest
/// cell.
fn print_table(header: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = header.iter().map(|h| h.len()).collect();
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.len());
        }
    }

    let render = |cells: Vec<String>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<w$}", cell, w = *width))
            .collect::<Vec<String>>()
            .join("  ")
    };

    println!("{}", render(header.iter().map(|h| h.to_string()).collect()));
    println!(
        "{}",
        render(widths.iter().map(|width| "-".repeat(*width)).collect())
    );
    for row in rows {
        println!("{}", render(row.clone()));
    }
}
