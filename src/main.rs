use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use osc2midi::general::check::{print_bridge_active, print_bridge_failed};
use osc2midi::io::devices::{list_devices, MidirBackend};
use osc2midi::remote::monitor::spawn_monitor;
use osc2midi::remote::osc_sender::send_command;
use osc2midi::{BridgeSession, Config, Result};

#[derive(Parser, Debug)]
#[command(name = "osc2midi")]
#[command(version, about = "Bridge /midi OSC messages to a MIDI output, send OSC, list MIDI devices")]
struct Args {
    /// JSON config file (defaults to ./config.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging; goes before the subcommand so `send` can carry `-v`
    #[arg(long, short = 'v', default_value = "false")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List MIDI inputs and outputs
    #[command(alias = "listmidi")]
    List,

    /// Translate /midi OSC messages into MIDI on the named output
    #[command(alias = "servemidi")]
    Serve {
        /// OSC port to listen on
        port: Option<u16>,
        /// Exact name of the MIDI output
        output: Option<String>,
    },

    /// Send one OSC message; argument types are inferred (int, float, string)
    Send {
        /// Destination OSC port
        port: u16,
        /// OSC address, must start with '/'
        address: String,
        #[arg(num_args = 0.., trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Print every received OSC message with a timestamp
    Listen {
        /// OSC port to listen on
        port: Option<u16>,
    },
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "osc2midi=debug" } else { "osc2midi=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let sub = fmt().with_env_filter(filter).with_target(false).finish();
    if let Err(err) = tracing::subscriber::set_global_default(sub) {
        eprintln!("Failed to set global subscriber: {}", err);
    }
}

fn main() {
    let args = Args::parse();
    let config = Config::load(args.config.as_deref());
    let verbose = args.verbose || config.as_ref().map(|c| c.verbose).unwrap_or(false);
    init_tracing(verbose);

    let result = config.and_then(|mut config| {
        config.verbose = verbose;
        run(args.command, config)
    });
    if let Err(err) = result {
        error!("{}", err);
    }
}

fn run(command: Command, mut config: Config) -> Result<()> {
    match command {
        Command::List => {
            let backend = MidirBackend::new(&config.midi.client_name);
            list_devices(&backend)?;
        }
        Command::Serve { port, output } => {
            if let Some(port) = port {
                config.osc.listen_port = port;
            }
            if let Some(output) = output {
                config.midi.output_name = output;
            }
            if config.osc.listen_port == 0 || config.midi.output_name.is_empty() {
                warn!("Usage: osc2midi serve {{oscport}} {{midioutput}}");
                return Ok(());
            }
            serve(config)?;
        }
        Command::Send { port, address, args } => {
            config.osc.destination_port = port;
            send_command(&config.osc.destination_addr(), &address, &args[..])?;
        }
        Command::Listen { port } => {
            if let Some(port) = port {
                config.osc.listen_port = port;
            }
            if config.osc.listen_port == 0 {
                warn!("Missing osc port number");
                return Ok(());
            }
            let listener = spawn_monitor(&config.osc.listen_addr(), config.osc.workers)?;
            info!("Listening for OSC on {}", listener.local_addr());
            listener.wait();
        }
    }
    Ok(())
}

fn serve(config: Config) -> Result<()> {
    let backend = MidirBackend::new(&config.midi.client_name);
    let mut session = BridgeSession::new(config);

    if let Err(err) = session.bind(&backend) {
        print_bridge_failed(&err.to_string());
        return Err(err);
    }
    let addr = match session.listen() {
        Ok(addr) => addr,
        Err(err) => {
            print_bridge_failed(&err.to_string());
            return Err(err);
        }
    };
    print_bridge_active(&addr.to_string(), &session.config().midi.output_name);

    info!("Blocking forever");
    session.run();
    Ok(())
}
