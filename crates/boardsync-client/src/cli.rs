//! Command-line interface definition.

use std::path::PathBuf;

use clap::Parser;

/// boardsync - put your top project board task on the calendar
#[derive(Debug, Parser)]
#[command(name = "boardsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// GitHub repository in owner/name form
    #[arg(long, short, env = "BOARDSYNC_REPO")]
    pub repo: Option<String>,

    /// Path to the .env configuration file
    #[arg(long, short, default_value = ".env")]
    pub env: PathBuf,

    /// Name of the project board to read
    #[arg(long, short)]
    pub project: Option<String>,

    /// Directory holding Google credentials.json and token.json
    #[arg(long, short = 'g')]
    pub google_dir: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_flags_parse() {
        let cli = Cli::try_parse_from([
            "boardsync",
            "-r",
            "octocat/hello-world",
            "-p",
            "Sprint 7",
            "-g",
            "/tmp/google",
        ])
        .unwrap();

        assert_eq!(cli.repo.as_deref(), Some("octocat/hello-world"));
        assert_eq!(cli.project.as_deref(), Some("Sprint 7"));
        assert_eq!(cli.google_dir, Some(PathBuf::from("/tmp/google")));
    }

    #[test]
    fn env_file_defaults_to_dotenv() {
        let cli = Cli::try_parse_from(["boardsync", "-r", "a/b"]).unwrap();
        assert_eq!(cli.env, PathBuf::from(".env"));
        assert!(!cli.debug);
    }

    #[test]
    fn env_file_override() {
        let cli = Cli::try_parse_from(["boardsync", "-e", "conf/prod.env"]).unwrap();
        assert_eq!(cli.env, PathBuf::from("conf/prod.env"));
    }
}
