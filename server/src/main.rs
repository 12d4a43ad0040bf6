use clap::Parser;
use env_logger::Env;
use log::{error, info};
use server::config::ServerConfig;
use server::dictionary::WordList;
use server::network::Server;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Dictionary file with one word per line
    dictionary: PathBuf,
    /// TOML file with server settings
    #[clap(short, long)]
    config: Option<PathBuf>,
    /// Server IP address to bind to
    #[clap(short = 'H', long)]
    host: Option<String>,
    /// Server port to listen on
    #[clap(short, long)]
    port: Option<u16>,
    /// Wrong guesses allowed per word
    #[clap(short, long)]
    max_misses: Option<u32>,
}

impl Args {
    /// Loads the config file, if any, and applies the flags on top of it.
    fn server_config(&self) -> Result<ServerConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_file(path)?,
            None => ServerConfig::default(),
        };

        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(max_misses) = self.max_misses {
            config.max_misses = max_misses;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.server_config()?;

    let words = WordList::from_file(&args.dictionary)?;
    info!(
        "Loaded {} words from {}",
        words.words().len(),
        args.dictionary.display()
    );

    let mut server = Server::bind(&config, Box::new(words)).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::parse_from(["server", "words.txt", "-p", "4000", "-m", "6"]);
        let config = args.server_config().unwrap();

        assert_eq!(args.dictionary, PathBuf::from("words.txt"));
        assert_eq!(config.port, 4000);
        assert_eq!(config.max_misses, 6);
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn test_invalid_host_flag_is_rejected() {
        let args = Args::parse_from(["server", "words.txt", "-H", "nowhere"]);
        assert!(args.server_config().is_err());
    }

    #[test]
    fn test_dictionary_is_required() {
        assert!(Args::try_parse_from(["server"]).is_err());
    }
}
