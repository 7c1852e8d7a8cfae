use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "console-relay")]
#[command(about = "Mirror a process's output to remote console viewers")]
pub struct AppArgs {
    #[arg(long, global = true, help = "JSON config file with console options")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run a command and mirror its standard output
    Run(RunArgs),
    /// Accept mirrored output and print it to this terminal
    Viewer(ViewerArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[arg(long, help = "Viewer websocket url (e.g. ws://host:8090/)")]
    pub url: Option<String>,

    #[arg(long, help = "Viewer port on localhost, used when --url is not given")]
    pub port: Option<u16>,

    #[arg(long, help = "Client name announced to the viewer")]
    pub name: Option<String>,

    #[arg(
        long,
        env = "CONSOLE_RELAY_PASSWORD",
        default_value = "",
        help = "Viewer password (or set CONSOLE_RELAY_PASSWORD)"
    )]
    pub password: String,

    #[arg(long, default_value_t = 10, help = "Seconds to wait for the viewer handshake")]
    pub connect_timeout: u64,

    #[arg(long, help = "Also echo output to this terminal")]
    pub local: bool,

    #[arg(long, help = "Send output without color markup")]
    pub no_color: bool,

    #[arg(long, help = "Prefix each echoed line with its timestamp")]
    pub timestamps: bool,

    #[arg(long, help = "Upper bound on buffered log text, in characters")]
    pub max_log_length: Option<usize>,

    #[arg(long, help = "Print the rolling log to stderr when the command exits")]
    pub print_log: bool,

    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        help = "Command to run"
    )]
    pub command: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ViewerArgs {
    #[arg(long, default_value = "127.0.0.1", help = "Address to listen on")]
    pub host: String,

    #[arg(long, default_value_t = 8090, help = "Port to listen on")]
    pub port: u16,

    #[arg(
        long,
        env = "CONSOLE_RELAY_PASSWORD",
        help = "Password clients must present (or set CONSOLE_RELAY_PASSWORD)"
    )]
    pub password: Option<String>,
}

impl AppArgs {
    pub fn from_cli() -> Self {
        <Self as Parser>::parse()
    }
}
