use clap::Parser;

/// Command line interface for the relay
#[derive(Parser)]
#[command(version, about = "Streams model output to chat clients and dispatches semantic search")]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "relay.yaml")]
    pub config: String,

    /// Sets the logging verbosity level for the application
    /// Possible values: "error", "warn", "info", "debug", "trace"
    /// Default: "info"
    #[arg(long, default_value_t = String::from("info"))]
    pub logging_level: String,

    /// Also write logs to a daily rolling file
    #[arg(long)]
    pub log_to_file: bool,

    /// Overrides `server.port` from the configuration file
    #[arg(short, long)]
    pub port: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["streamrelay"]);
        assert_eq!(cli.config, "relay.yaml");
        assert_eq!(cli.logging_level, "info");
        assert!(!cli.log_to_file);
        assert!(cli.port.is_none());
    }

    #[test]
    fn overrides() {
        let cli = Cli::parse_from([
            "streamrelay",
            "-c",
            "prod.yaml",
            "--logging-level",
            "streamrelay=debug",
            "--log-to-file",
            "--port",
            "8080",
        ]);
        assert_eq!(cli.config, "prod.yaml");
        assert_eq!(cli.logging_level, "streamrelay=debug");
        assert!(cli.log_to_file);
        assert_eq!(cli.port, Some(8080));
    }
}
