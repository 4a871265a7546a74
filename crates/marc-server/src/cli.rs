use std::{net::IpAddr, path::PathBuf};

use clap::Parser;
use marc_core::{
    RelayConfig,
    config::{DEFAULT_MAX_MESSAGES, default_data_dir},
};

#[derive(Parser, Debug)]
#[command(name = "marc-server")]
#[command(version, about = "mARC - message relay for cooperating agents")]
pub struct Cli {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3001)]
    pub port: u16,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Directory holding store.json (defaults to ~/.marc)
    #[arg(short, long, env = "MARC_DATA")]
    pub data: Option<PathBuf>,

    /// Messages kept in the log before the oldest are evicted
    #[arg(long, default_value_t = DEFAULT_MAX_MESSAGES)]
    pub max_messages: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn data_dir(&self) -> PathBuf {
        self.data.clone().unwrap_or_else(default_data_dir)
    }

    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig::new(self.data_dir()).with_max_messages(self.max_messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "marc-server",
            "--port",
            "4000",
            "--data",
            "/tmp/marc-test",
            "--max-messages",
            "10",
            "-v",
        ])
        .unwrap();

        assert_eq!(cli.port, 4000);
        assert!(cli.verbose);
        let config = cli.relay_config();
        assert_eq!(config.max_messages, 10);
        assert_eq!(config.store_file(), PathBuf::from("/tmp/marc-test/store.json"));
    }

    #[test]
    fn rejects_bad_port() {
        assert!(Cli::try_parse_from(["marc-server", "--port", "nope"]).is_err());
    }
}
