use clap::{Parser as ClapParser, Subcommand};
use disksel::cli::{self, CliError, MatchOptions};
use disksel::units;
use std::io::{self, Read};

#[derive(ClapParser)]
#[command(name = "disksel")]
#[command(about = "disksel - a device-selection expression language for storage disks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and validate a selection expression
    Check {
        /// The selection expression to check
        expression: String,
    },

    /// Filter a device list with a selection expression
    Match {
        /// The selection expression to evaluate
        expression: String,

        /// JSON device list file (reads from stdin if not provided)
        #[arg(short, long)]
        devices: Option<String>,

        /// Host name to evaluate as (defaults to $HOSTNAME, shortened)
        #[arg(long)]
        host: Option<String>,

        /// Provide output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Print the derived stable device path for each device
    Path {
        /// JSON device list file (reads from stdin if not provided)
        #[arg(short, long)]
        devices: Option<String>,
    },

    /// List known functions and variables
    Functions,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { expression } => run_check(expression),
        Commands::Match {
            expression,
            devices,
            host,
            json,
        } => run_match(expression, devices, host, json),
        Commands::Path { devices } => run_paths(devices),
        Commands::Functions => {
            println!("Functions: {}", disksel::known_functions().join(", "));
            println!("Variables: {}", disksel::known_variables().join(", "));
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_check(expression: String) -> Result<(), CliError> {
    cli::execute_check(&expression)?;
    println!("Expression is valid");
    Ok(())
}

fn run_match(
    expression: String,
    devices: Option<String>,
    host: Option<String>,
    json: bool,
) -> Result<(), CliError> {
    let devices_json = read_devices(devices)?;

    let options = MatchOptions {
        expression,
        devices_json,
        hostname: resolve_host(host),
    };

    let matched = cli::execute_match(&options)?;

    if json {
        let out: Vec<_> = matched.iter().map(cli::device_to_json).collect();
        println!("{}", serde_json::Value::Array(out));
    } else {
        for d in &matched {
            println!(
                "{}\t{}\t{}\t{}",
                disksel::get_device_path(d),
                d.device_type,
                units::format_bytes(d.size as f64),
                d.model
            );
        }
    }
    Ok(())
}

fn run_paths(devices: Option<String>) -> Result<(), CliError> {
    let devices_json = read_devices(devices)?;

    for (device, path) in cli::execute_paths(&devices_json)? {
        println!("{}\t{}", device.id, path);
    }
    Ok(())
}

/// Device JSON from a file, or from stdin when piped.
fn read_devices(devices: Option<String>) -> Result<String, CliError> {
    match devices {
        Some(path) => Ok(std::fs::read_to_string(path).map_err(CliError::Io)?),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(CliError::Io)?;
            Ok(buffer)
        }
        None => Err(CliError::NoDevices),
    }
}

fn resolve_host(host: Option<String>) -> String {
    let name = host
        .or_else(|| std::env::var("HOSTNAME").ok())
        .unwrap_or_default();
    cli::short_hostname(&name).to_string()
}
