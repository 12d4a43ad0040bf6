//! Minimal terminal client for manual testing
//!
//! Prints every line the server sends and forwards each line typed on stdin
//! with a network newline appended.

use clap::Parser;
use env_logger::Env;
use log::{debug, info};
use shared::frame;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server address to connect to
    #[clap(short, long, default_value = "127.0.0.1:59994")]
    server: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let stream = TcpStream::connect(&args.server).await?;
    info!("Connected to {}", stream.peer_addr()?);

    let (read_half, mut write_half) = stream.into_split();
    let mut server_lines = BufReader::new(read_half).lines();
    let mut stdin_lines = BufReader::new(io::stdin()).lines();

    loop {
        tokio::select! {
            line = server_lines.next_line() => {
                match line? {
                    Some(line) => println!("{}", line),
                    None => {
                        info!("Server closed the connection");
                        break;
                    }
                }
            }

            line = stdin_lines.next_line() => {
                match line? {
                    Some(line) => {
                        debug!("Sending {:?}", line);
                        write_half.write_all(frame(&line).as_bytes()).await?;
                    }
                    None => {
                        // Stdin closed: stop sending but keep printing until the server hangs up
                        write_half.shutdown().await?;
                        while let Some(line) = server_lines.next_line().await? {
                            println!("{}", line);
                        }
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}
