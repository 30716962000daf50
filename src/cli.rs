//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Render a CMS article as mobile app JSON.
///
/// Reads one article (JSON) from FILE or stdin, splits its body into typed
/// content items, resolves embedded media and prints the envelope to stdout.
#[derive(Parser, Debug)]
#[command(name = "mobile-feed")]
#[command(author, version, about)]
pub struct Args {
    /// Article JSON file ("-" or omitted reads stdin)
    #[arg(value_name = "FILE")]
    pub article: Option<PathBuf>,

    /// Increase output verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Maximum concurrent media lookups per article (1-64)
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..=64))]
    pub concurrency: Option<u8>,

    /// Configuration file (defaults to ~/.config/mobile-feed/config.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Pretty-print the output JSON
    #[arg(long)]
    pub pretty: bool,

    /// Skip all network lookups; embeds render with their fallback fields
    #[arg(long)]
    pub no_lookups: bool,
}

impl Args {
    /// Article path, or `None` when the article comes from stdin.
    #[must_use]
    pub fn article_path(&self) -> Option<&PathBuf> {
        self.article
            .as_ref()
            .filter(|path| path.as_os_str() != "-")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["mobile-feed"]).unwrap();
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!(!args.pretty);
        assert!(!args.no_lookups);
        assert_eq!(args.concurrency, None);
        assert!(args.article_path().is_none());
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["mobile-feed", "-v"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["mobile-feed", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["mobile-feed", "--quiet"]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["mobile-feed", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = Args::try_parse_from(["mobile-feed", "--invalid-flag"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_cli_article_path_and_stdin_dash() {
        let args = Args::try_parse_from(["mobile-feed", "story.json"]).unwrap();
        assert_eq!(args.article_path(), Some(&PathBuf::from("story.json")));

        let args = Args::try_parse_from(["mobile-feed", "-"]).unwrap();
        assert!(args.article_path().is_none());
    }

    #[test]
    fn test_cli_concurrency_bounds() {
        let args = Args::try_parse_from(["mobile-feed", "-c", "64"]).unwrap();
        assert_eq!(args.concurrency, Some(64));

        for value in ["0", "65"] {
            let err = Args::try_parse_from(["mobile-feed", "-c", value]).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        }
    }

    #[test]
    fn test_cli_combined_flags() {
        let args = Args::try_parse_from([
            "mobile-feed",
            "--pretty",
            "--no-lookups",
            "--config",
            "alt.toml",
            "a.json",
        ])
        .unwrap();
        assert!(args.pretty);
        assert!(args.no_lookups);
        assert_eq!(args.config, Some(PathBuf::from("alt.toml")));
    }
}
