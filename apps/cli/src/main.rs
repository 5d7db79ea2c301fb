use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use rn2483_core::protocol::Namespace;
use rn2483_core::{Command, DownlinkMessage, JoinMode, ModuleConfig, Rn2483, SerialTransport};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "RN2483 LoRa module tool", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial port (overrides the configuration)
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate (overrides the configuration)
    #[arg(short, long)]
    baud: Option<u32>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print the firmware version
    Version,
    /// Print the hardware EUI
    Hweui,
    /// Print the supply voltage in millivolts
    Vdd,
    /// Reset the module
    Reset,
    /// Join the network
    Join {
        /// otaa or abp
        mode: JoinMode,
    },
    /// Send an uplink and print any downlink
    Tx {
        /// Request a confirmation from the network
        #[arg(long)]
        confirmed: bool,
        /// Application port (1-223)
        port: u8,
        /// Payload as hex
        payload: String,
    },
    /// Pause the LoRaWAN stack and transmit a raw radio packet
    RadioTx {
        /// Payload as hex
        payload: String,
    },
    /// Pause the LoRaWAN stack and wait for a raw radio packet
    RadioRx {
        /// Receive window in symbols (LoRa) or ms (FSK); 0 is continuous
        window: u16,
        /// Give up after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Read a parameter, e.g. `get mac dr`
    Get {
        namespace: String,
        #[arg(required = true)]
        param: Vec<String>,
    },
    /// Write a parameter, e.g. `set radio pwr 14`
    Set {
        namespace: String,
        param: String,
        #[arg(required = true)]
        value: Vec<String>,
    },
    /// Write the effective configuration to a TOML file
    WriteConfig { path: PathBuf },
}

fn load_config(args: &Args) -> Result<ModuleConfig> {
    let mut config = match &args.config {
        Some(path) => ModuleConfig::load_from_file(path)?,
        None => ModuleConfig::default(),
    };
    if let Some(port) = &args.port {
        config.port = port.clone();
    }
    if let Some(baud) = args.baud {
        config.baud_rate = baud;
    }
    Ok(config)
}

fn parse_namespace(name: &str) -> Result<Namespace> {
    Namespace::parse(name).ok_or_else(|| anyhow!("unknown namespace '{}' (mac, radio, sys)", name))
}

fn decode_payload(payload: &str) -> Result<Vec<u8>> {
    hex::decode(payload).with_context(|| format!("payload '{}' is not valid hex", payload))
}

fn print_downlink(msg: DownlinkMessage) {
    println!("downlink port {}: {}", msg.port, hex::encode_upper(&msg.payload));
}

fn drive(module: &mut Rn2483<SerialTransport>, command: Cmd) -> Result<()> {
    match command {
        Cmd::Version => println!("{}", module.version()?),
        Cmd::Hweui => println!("{}", module.hardware_eui()?),
        Cmd::Vdd => println!("{} mV", module.supply_voltage()?),
        Cmd::Reset => module.reset()?,
        Cmd::Join { mode } => {
            let state = module.join(mode)?;
            println!("{}", state);
            if !state.is_accepted() {
                bail!("join finished in {}", state);
            }
        }
        Cmd::Tx {
            confirmed,
            port,
            payload,
        } => {
            let data = decode_payload(&payload)?;
            let state = module.transmit_with(confirmed, port, &data, print_downlink)?;
            println!("{}", state);
            if !state.is_success() {
                bail!("uplink finished in {}", state);
            }
        }
        Cmd::RadioTx { payload } => {
            let data = decode_payload(&payload)?;
            module.mac_pause()?;
            let result = module.radio_tx(&data);
            if let Err(e) = module.mac_resume() {
                warn!(error = %e, "Failed to resume LoRaWAN stack");
            }
            result?;
            println!("sent {} bytes", data.len());
        }
        Cmd::RadioRx { window, timeout_ms } => {
            module.mac_pause()?;
            let result = module.radio_rx(window, timeout_ms.map(Duration::from_millis));
            if let Err(e) = module.mac_resume() {
                warn!(error = %e, "Failed to resume LoRaWAN stack");
            }
            println!("{}", hex::encode_upper(result?));
        }
        Cmd::Get { namespace, param } => {
            let mut builder = Command::builder(parse_namespace(&namespace)?, "get");
            for p in &param {
                builder = builder.arg(p);
            }
            println!("{}", module.get_parameter(&builder.build())?);
        }
        Cmd::Set {
            namespace,
            param,
            value,
        } => {
            let mut builder = Command::builder(parse_namespace(&namespace)?, "set").arg(&param);
            for v in &value {
                builder = builder.arg(v);
            }
            module.set_parameter(&builder.build())?;
            println!("ok");
        }
        Cmd::WriteConfig { path } => module.config().save_to_file(path)?,
    }
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;

    // Writing the configuration must not need a connected module.
    if let Cmd::WriteConfig { path } = &args.command {
        config.save_to_file(path)?;
        info!(path = %path.display(), "Configuration written");
        return Ok(());
    }

    let transport = SerialTransport::from_config(&config)
        .with_context(|| format!("failed to open {}", config.port))?;
    info!(port = %transport.name(), "Connected");
    let mut module = Rn2483::new(transport, config);
    drive(&mut module, args.command)
}

fn main() {
    let args = Args::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(if args.verbose {
                    tracing::Level::DEBUG.into()
                } else {
                    tracing::Level::INFO.into()
                })
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    if let Err(e) = run(args) {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tx() {
        let args = Args::try_parse_from(["rn2483", "tx", "--confirmed", "1", "CAFE"]).unwrap();
        assert!(matches!(
            args.command,
            Cmd::Tx { confirmed: true, port: 1, ref payload } if payload == "CAFE"
        ));
    }

    #[test]
    fn test_parse_join_mode() {
        let args = Args::try_parse_from(["rn2483", "join", "OTAA"]).unwrap();
        assert!(matches!(args.command, Cmd::Join { mode: JoinMode::Otaa }));
        assert!(Args::try_parse_from(["rn2483", "join", "lora"]).is_err());
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let args =
            Args::try_parse_from(["rn2483", "--port", "/dev/ttyACM3", "-b", "115200", "vdd"])
                .unwrap();
        let config = load_config(&args).unwrap();
        assert_eq!(config.port, "/dev/ttyACM3");
        assert_eq!(config.baud_rate, 115200);
    }

    #[test]
    fn test_namespace_and_payload_helpers() {
        assert_eq!(parse_namespace("radio").unwrap(), Namespace::Radio);
        assert!(parse_namespace("lorawan").is_err());
        assert_eq!(decode_payload("0aff").unwrap(), vec![0x0A, 0xFF]);
        assert!(decode_payload("xyz").is_err());
    }
}
