//! `enginedock` — talk to a compile service from the command line.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use enginedock_compile::CompileClient;
use enginedock_protocol::RemoteOperation;
use tracing_subscriber::{EnvFilter, fmt};

/// Sends model POJOs to a compile service and saves what comes back.
#[derive(Parser, Debug)]
#[command(name = "enginedock", version, about)]
struct Args {
    /// Compile service address (`host:port`).
    #[arg(short, long, default_value = "localhost:8080")]
    address: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the compile service is reachable.
    Ping,
    /// Compile a POJO into a `.jar` next to it.
    Compile {
        /// Generated model POJO.
        pojo: PathBuf,
        /// Runtime JAR the POJO compiles against.
        jar: PathBuf,
    },
    /// Package a POJO into a `.war` next to it.
    Makewar {
        /// Generated model POJO.
        pojo: PathBuf,
        /// Runtime JAR the POJO compiles against.
        jar: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries only the result path.
    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("enginedock_compile=info,warn")),
        )
        .init();

    let client = CompileClient::new(args.address.clone())?;

    match args.command {
        Command::Ping => {
            client
                .ping()
                .await
                .with_context(|| format!("compile service at {} is unreachable", args.address))?;
            println!("ok");
        }
        Command::Compile { pojo, jar } => {
            let out = client
                .compile_pojo(&pojo, &jar, RemoteOperation::Compile)
                .await?;
            println!("{}", out.display());
        }
        Command::Makewar { pojo, jar } => {
            let out = client
                .compile_pojo(&pojo, &jar, RemoteOperation::MakeWar)
                .await?;
            println!("{}", out.display());
        }
    }

    Ok(())
}
