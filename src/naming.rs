//! Output file naming and path joining.

use std::fmt;

use clap::ValueEnum;

const GZIP_EXT: &str = ".gz";
const ZIP_EXT: &str = ".zip";

/// Container format used for the compressed output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Algorithm {
    None,
    Gzip,
    Zip,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Algorithm::None => "none",
            Algorithm::Gzip => "gzip",
            Algorithm::Zip => "zip",
        };
        f.write_str(name)
    }
}

/// Replace the characters a ZIP entry name cannot carry safely (`\`, `/`, `:`) with `_`.
pub fn sanitize_entry_name(name: &str) -> String {
    name.replace(['\\', '/', ':'], "_")
}

/// Name of the file produced when compressing `name` with `algo`.
///
/// ```
/// use fcompress::{compressed_filename, Algorithm};
///
/// assert_eq!(compressed_filename("report.txt", Algorithm::Gzip), "report.txt.gz");
/// assert_eq!(compressed_filename("a/b:c", Algorithm::Zip), "a_b_c.zip");
/// ```
pub fn compressed_filename(name: &str, algo: Algorithm) -> String {
    match algo {
        Algorithm::Gzip => format!("{name}{GZIP_EXT}"),
        Algorithm::Zip => format!("{}{ZIP_EXT}", sanitize_entry_name(name)),
        Algorithm::None => name.to_string(),
    }
}

/// Join `dir` and `name` with exactly one `/` between them.
///
/// Backslashes in `dir` are converted to forward slashes. The directory is
/// not checked for existence.
pub fn join_path(dir: &str, name: &str) -> String {
    let mut path = dir.replace('\\', "/");
    if !path.ends_with('/') {
        path.push('/');
    }
    path.push_str(name);
    path
}
