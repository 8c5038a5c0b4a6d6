//! Command-line arguments

use crate::config::OrganizerConfig;
use crate::error::OrganizeError;
use crate::execution::scanner::resolve_lenient;
use crate::execution::RunRequest;
use crate::models::{InputSource, OrganizeMode};
use clap::{ArgGroup, Parser, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "file-organizer")]
#[command(about = "Organize files by content, date or type using local models", long_about = None)]
#[command(group(ArgGroup::new("input").required(true).args(["input_dir", "input_file"])))]
pub struct Cli {
    /// Directory to organize (scanned recursively)
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Single file to organize
    #[arg(long)]
    pub input_file: Option<PathBuf>,

    /// Destination root (default: <input>/organized_folder)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Organizing strategy
    #[arg(long, value_enum, default_value_t = ModeArg::Content)]
    pub mode: ModeArg,

    /// Move files instead of only reporting the plan
    #[arg(long)]
    pub apply: bool,

    /// No console output; log and report go to the log file
    #[arg(long)]
    pub silent: bool,

    /// Run log used in silent mode
    #[arg(long, default_value = "log.txt")]
    pub log_file: PathBuf,

    /// Configuration file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Folders and names from what the file contains
    #[value(alias = "1")]
    Content,
    /// YYYY/YYYY-MM folders
    #[value(alias = "2")]
    Date,
    /// One folder per file category
    #[value(alias = "3")]
    Type,
}

impl From<ModeArg> for OrganizeMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Content => OrganizeMode::Content,
            ModeArg::Date => OrganizeMode::Date,
            ModeArg::Type => OrganizeMode::Type,
        }
    }
}

impl Cli {
    /// Resolve paths into a request; input problems are fatal here, before any work
    pub fn to_request(&self, config: &OrganizerConfig) -> Result<RunRequest, OrganizeError> {
        let input = match (&self.input_dir, &self.input_file) {
            (Some(dir), None) => {
                let dir = canonical(dir)?;
                if !dir.is_dir() {
                    return Err(OrganizeError::InvalidInput(format!(
                        "not a directory: {}",
                        dir.display()
                    )));
                }
                InputSource::Directory(dir)
            }
            (None, Some(file)) => {
                let file = canonical(file)?;
                if !file.is_file() {
                    return Err(OrganizeError::InvalidInput(format!(
                        "not a regular file: {}",
                        file.display()
                    )));
                }
                InputSource::File(file)
            }
            _ => {
                return Err(OrganizeError::InvalidInput(
                    "exactly one of --input-dir or --input-file is required".to_string(),
                ))
            }
        };

        let output_root = match &self.output_dir {
            Some(dir) => resolve_lenient(&absolute(dir)?),
            None => input.root().join(&config.output_folder_name),
        };
        if output_root.is_file() {
            return Err(OrganizeError::InvalidInput(format!(
                "output path is a file: {}",
                output_root.display()
            )));
        }

        Ok(RunRequest {
            input,
            output_root,
            mode: self.mode.into(),
            dry_run: !self.apply,
        })
    }
}

fn canonical(path: &Path) -> Result<PathBuf, OrganizeError> {
    path.canonicalize().map_err(|e| {
        OrganizeError::InvalidInput(format!("cannot access {}: {}", path.display(), e))
    })
}

fn absolute(path: &Path) -> Result<PathBuf, OrganizeError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|source| OrganizeError::Io {
        context: "failed to read working directory",
        path: path.to_path_buf(),
        source,
    })?;
    Ok(cwd.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_input_flags_are_exclusive_and_required() {
        assert!(Cli::try_parse_from(["file-organizer"]).is_err());
        assert!(Cli::try_parse_from([
            "file-organizer",
            "--input-dir",
            "a",
            "--input-file",
            "b"
        ])
        .is_err());
    }

    #[test]
    fn test_defaults_are_dry_run_content() {
        let cli = Cli::try_parse_from(["file-organizer", "--input-dir", "docs"]).unwrap();
        assert_eq!(cli.mode, ModeArg::Content);
        assert!(!cli.apply);
        assert!(!cli.silent);
        assert_eq!(cli.log_file, PathBuf::from("log.txt"));
    }

    #[test]
    fn test_numeric_mode_aliases() {
        for (raw, expected) in [("1", ModeArg::Content), ("2", ModeArg::Date), ("3", ModeArg::Type)] {
            let cli = Cli::try_parse_from(["file-organizer", "--input-dir", "d", "--mode", raw]).unwrap();
            assert_eq!(cli.mode, expected);
        }
        let cli = Cli::try_parse_from(["file-organizer", "--input-dir", "d", "--mode", "date"]).unwrap();
        assert_eq!(OrganizeMode::from(cli.mode), OrganizeMode::Date);
    }

    #[test]
    fn test_default_output_under_input_root() {
        let dir = tempdir().unwrap();
        let input = dir.path().canonicalize().unwrap();
        let cli = Cli::try_parse_from([
            "file-organizer",
            "--input-dir",
            input.to_str().unwrap(),
            "--apply",
        ])
        .unwrap();

        let request = cli.to_request(&OrganizerConfig::default()).unwrap();
        assert_eq!(request.output_root, input.join("organized_folder"));
        assert!(!request.dry_run);
    }

    #[test]
    fn test_single_file_output_under_parent() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("memo.txt");
        std::fs::write(&file, "x").unwrap();
        let cli = Cli::try_parse_from([
            "file-organizer",
            "--input-file",
            file.to_str().unwrap(),
        ])
        .unwrap();

        let request = cli.to_request(&OrganizerConfig::default()).unwrap();
        let parent = dir.path().canonicalize().unwrap();
        assert_eq!(request.output_root, parent.join("organized_folder"));
        assert_eq!(request.input, InputSource::File(parent.join("memo.txt")));
    }

    #[test]
    fn test_missing_input_dir_is_invalid() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing");
        let cli = Cli::try_parse_from([
            "file-organizer",
            "--input-dir",
            missing.to_str().unwrap(),
        ])
        .unwrap();

        let result = cli.to_request(&OrganizerConfig::default());
        assert!(matches!(result, Err(OrganizeError::InvalidInput(_))));
    }

    #[test]
    fn test_output_dir_is_normalized() {
        let dir = tempdir().unwrap();
        let input = dir.path().canonicalize().unwrap();
        std::fs::create_dir_all(input.join("sub")).unwrap();
        let spelled = input.join("sub/../out");
        let cli = Cli::try_parse_from([
            "file-organizer",
            "--input-dir",
            input.to_str().unwrap(),
            "--output-dir",
            spelled.to_str().unwrap(),
        ])
        .unwrap();

        let request = cli.to_request(&OrganizerConfig::default()).unwrap();
        assert_eq!(request.output_root, input.join("out"));
    }
}
