// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Patchbay - a model-routing relay for chat completions.
//!
//! This is the binary entry point for the Patchbay gateway.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

mod doctor;
mod serve;
mod shutdown;

/// Patchbay - a model-routing relay for chat completions.
#[derive(Parser, Debug)]
#[command(name = "patchbay", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the relay gateway.
    Serve,
    /// Run diagnostic checks against the configured collaborators.
    Doctor,
    /// Print the resolved configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match patchbay_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            patchbay_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Doctor) => match doctor::run_doctor(&config).await {
            Ok(true) => {}
            Ok(false) => std::process::exit(1),
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        },
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(rendered) => print!("{rendered}"),
            Err(e) => {
                eprintln!("error: failed to render configuration: {e}");
                std::process::exit(1);
            }
        },
        None => {
            println!("patchbay: use --help for available commands");
        }
    }
}

#[cfg(test)]
mod tests {
    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn global_allocator_is_jemalloc() {
        // Epoch advance is a jemalloc-only operation; it errors under the
        // system allocator.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "allocation stats came back empty");
    }

    #[test]
    fn defaults_alone_pass_validation() {
        let config = patchbay_config::load_and_validate()
            .expect("built-in defaults failed validation");
        assert_eq!(config.server.port, 9091);
        assert_eq!(config.upstream.chat_path, "/v1/chat/completions");
    }

    #[test]
    fn config_renders_as_toml() {
        let config = patchbay_config::load_and_validate()
            .expect("built-in defaults failed validation");
        let rendered = toml::to_string_pretty(&config).expect("config failed to serialize");
        assert!(rendered.contains("[server]"));
        assert!(rendered.contains("[upstream]"));
        assert!(rendered.contains("[classifier]"));
    }
}
