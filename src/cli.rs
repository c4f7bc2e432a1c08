use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "logsink")]
#[command(about = "Minute-partitioned logging backend", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to $LOGSINK_CONFIG or config/logsink.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Server(ServerArgs),
}

#[derive(clap::Args, Debug)]
pub struct ServerArgs {
    /// Address to bind the HTTP server to (overrides server.bind_addr)
    #[arg(long)]
    pub address: Option<SocketAddr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_server_with_overrides() {
        let cli = Cli::parse_from([
            "logsink",
            "server",
            "--address",
            "0.0.0.0:9000",
            "--config",
            "/etc/logsink.toml",
        ]);

        let Commands::Server(args) = cli.command;
        assert_eq!(args.address, Some("0.0.0.0:9000".parse().unwrap()));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/logsink.toml")));
    }

    #[test]
    fn test_parse_server_defaults() {
        let cli = Cli::parse_from(["logsink", "server"]);

        let Commands::Server(args) = cli.command;
        assert!(args.address.is_none());
        assert!(cli.config.is_none());
    }
}
