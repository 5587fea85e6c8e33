//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use apkgrab_core::download::constants::DEFAULT_DOWNLOAD_DIR;
use apkgrab_core::mirror::DEFAULT_MIRROR_URL;

/// Resolve an app name to a mirror-hosted APK/XAPK and download it.
///
/// Prints exactly one JSON result line on standard output.
#[derive(Parser, Debug)]
#[command(name = "apkgrab")]
#[command(author, version, about)]
pub struct Args {
    /// App name (e.g. "whatsapp") or package identifier (e.g. "org.telegram.messenger")
    pub query: Option<String>,

    /// Only resolve the direct download link; do not download
    #[arg(long)]
    pub link_only: bool,

    /// Directory downloads are written to
    #[arg(short = 'o', long, env = "APKGRAB_DOWNLOAD_DIR", default_value = DEFAULT_DOWNLOAD_DIR)]
    pub output_dir: PathBuf,

    /// Mirror origin URL
    #[arg(long, env = "APKGRAB_MIRROR_URL", default_value = DEFAULT_MIRROR_URL)]
    pub mirror: String,

    /// JSON file replacing the built-in known-app table
    #[arg(long, env = "APKGRAB_KNOWN_APPS")]
    pub known_apps: Option<PathBuf>,

    /// Increase log verbosity on stderr (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error log output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// The query, if one was supplied and is not blank.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|query| !query.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["apkgrab"]).unwrap();
        assert_eq!(args.query(), None);
        assert!(!args.link_only);
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
    }

    #[test]
    fn test_cli_positional_query_with_spaces() {
        let args = Args::try_parse_from(["apkgrab", "clash of clans"]).unwrap();
        assert_eq!(args.query(), Some("clash of clans"));
    }

    #[test]
    fn test_cli_blank_query_is_none() {
        let args = Args::try_parse_from(["apkgrab", "   "]).unwrap();
        assert_eq!(args.query(), None);
    }

    #[test]
    fn test_cli_link_only_flag() {
        let args = Args::try_parse_from(["apkgrab", "--link-only", "whatsapp"]).unwrap();
        assert!(args.link_only);
        assert_eq!(args.query(), Some("whatsapp"));
    }

    #[test]
    fn test_cli_output_dir_and_mirror_flags() {
        let args = Args::try_parse_from([
            "apkgrab",
            "-o",
            "/tmp/apks",
            "--mirror",
            "http://127.0.0.1:9000",
            "spotify",
        ])
        .unwrap();
        assert_eq!(args.output_dir, PathBuf::from("/tmp/apks"));
        assert_eq!(args.mirror, "http://127.0.0.1:9000");
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["apkgrab", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let result = Args::try_parse_from(["apkgrab", "--help"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let result = Args::try_parse_from(["apkgrab", "--invalid-flag"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
