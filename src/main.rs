//! Command line front end for fcompress.

use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use fcompress::cli::Command;
use fcompress::{Cli, CompressionRequest, compressed_filename, uncompress_zip_file};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    let result = match cli.command {
        Command::Compress {
            file,
            src_dir,
            dst_dir,
            algo,
            level,
        } => {
            let mut request = CompressionRequest::new(file, src_dir, algo).level(level);
            if let Some(dir) = dst_dir {
                request = request.destination(dir);
            }
            request.execute()
        }
        Command::Extract { archive, dest_dir } => {
            uncompress_zip_file(&archive, dest_dir.as_deref().unwrap_or_default())
        }
        Command::Name { file, algo } => {
            println!("{}", compressed_filename(&file, algo));
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            // negative status codes become their magnitude
            ExitCode::from(e.code().as_i32().unsigned_abs() as u8)
        }
    }
}

/// Log to stderr; `RUST_LOG` overrides the -v/-q derived level.
fn init_tracing(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
