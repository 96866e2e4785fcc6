use clap::{ArgAction, Parser, Subcommand};

use crate::gzip::DEFAULT_LEVEL;
use crate::naming::Algorithm;

#[derive(Parser, Debug)]
#[command(name = "fcompress")]
#[command(version)]
#[command(about = "Compress a file into a GZIP or ZIP container, or extract a ZIP archive")]
#[command(long_about = None)]
#[command(after_help = "Examples:\n  \
  fcompress compress app.log -s /var/log -d /tmp        write /tmp/app.log.gz\n  \
  fcompress compress app.log -a zip -l 9                write ./app.log.zip\n  \
  fcompress extract bundle.zip -d out                   extract all files into out/")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// More log output (-v debug, -vv trace)
    #[arg(short = 'v', action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compress a single file
    Compress {
        /// Name of the file to compress
        #[arg(value_name = "FILE")]
        file: String,

        /// Directory containing FILE
        #[arg(short = 's', long = "src", value_name = "DIR", default_value = ".")]
        src_dir: String,

        /// Directory to write the compressed file to (default: current directory)
        #[arg(short = 'd', long = "dst", value_name = "DIR")]
        dst_dir: Option<String>,

        /// Container format
        #[arg(short = 'a', long = "algo", value_enum, default_value_t = Algorithm::Gzip)]
        algo: Algorithm,

        /// Compression level, 0 (store) to 9 (best)
        #[arg(short = 'l', long, default_value_t = DEFAULT_LEVEL,
              value_parser = clap::value_parser!(u32).range(0..=9))]
        level: u32,
    },

    /// Extract every file of a ZIP archive into one directory
    Extract {
        /// ZIP archive path
        #[arg(value_name = "ARCHIVE")]
        archive: String,

        /// Destination directory (default: current directory)
        #[arg(short = 'd', long = "dest", value_name = "DIR")]
        dest_dir: Option<String>,
    },

    /// Print the name FILE would get once compressed
    Name {
        #[arg(value_name = "FILE")]
        file: String,

        #[arg(short = 'a', long = "algo", value_enum, default_value_t = Algorithm::Gzip)]
        algo: Algorithm,
    },
}

impl Cli {
    /// Default log filter when `RUST_LOG` is not set
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
