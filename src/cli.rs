//! Command-line argument parsing
//!
//! Supports:
//! - Printing a row range from a delimited file (`--start`, `--count`)
//! - Printing the rows visible at a scroll offset (`--scroll`, `--viewport`)
//! - The procedural UUID table (`--uuid`), addressable past 2^64 rows

use clap::Parser;
use std::path::PathBuf;

use crate::channel::ExecutionMode;
use crate::csv::Delimiter;
use crate::loader::Encoding;
use crate::scroll::RowId;

/// Rows printed when neither `--count` nor `--scroll` is given
pub const DEFAULT_COUNT: u64 = 20;

/// Print rows of huge delimited files through a virtualized table
#[derive(Parser, Debug)]
#[command(name = "vastrow", version, about = "Print rows of huge delimited files")]
pub struct CliArgs {
    /// Delimited file to read
    #[arg(value_name = "PATH", required_unless_present = "uuid")]
    pub path: Option<PathBuf>,

    /// Field separator: a literal, a name (comma, tab, pipe, semicolon) or `auto`
    #[arg(short = 'd', long, value_name = "SEP")]
    pub delimiter: Option<String>,

    /// Text encoding of the file
    #[arg(short = 'e', long, value_name = "ENCODING", default_value = "utf-8")]
    pub encoding: String,

    /// First row to print (0-indexed; may exceed 2^64 with --uuid)
    #[arg(short = 's', long, value_name = "N", conflicts_with = "scroll")]
    pub start: Option<String>,

    /// Number of rows to print
    #[arg(short = 'n', long, value_name = "N")]
    pub count: Option<u64>,

    /// Print the rows visible at this scrollbar offset in pixels
    #[arg(long, value_name = "PX")]
    pub scroll: Option<f64>,

    /// Scroller height in pixels (used with --scroll)
    #[arg(long, value_name = "PX", requires = "scroll")]
    pub viewport: Option<f64>,

    /// Load on the calling thread instead of a background worker
    #[arg(long)]
    pub inline: bool,

    /// Show the table of every version 4 UUID instead of a file
    #[arg(long, conflicts_with = "path")]
    pub uuid: bool,
}

/// How the field separator is chosen
#[derive(Debug, Clone, PartialEq)]
pub enum DelimiterChoice {
    /// Sniff from the first lines of the file
    Auto,
    /// Derive from the file extension (`.tsv`, `.psv`)
    Extension,
    Fixed(Delimiter),
}

impl DelimiterChoice {
    /// Resolve against the file path and, for `Auto`, a text sample
    pub fn resolve(&self, path: &std::path::Path, sample: impl FnOnce() -> String) -> Delimiter {
        match self {
            DelimiterChoice::Fixed(delimiter) => delimiter.clone(),
            DelimiterChoice::Extension => path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(Delimiter::from_extension)
                .unwrap_or_default(),
            DelimiterChoice::Auto => crate::csv::detect_delimiter(&sample()),
        }
    }
}

/// What to read rows from
#[derive(Debug, Clone, PartialEq)]
pub enum SourceChoice {
    File {
        path: PathBuf,
        delimiter: DelimiterChoice,
        encoding: Encoding,
    },
    /// Procedural UUID space
    UuidSpace,
}

/// Which rows to print
#[derive(Debug, Clone, PartialEq)]
pub enum RowSelection {
    /// `count` rows from `start`
    Range { start: RowId, count: u64 },
    /// Visible rows at a scroll offset; `count` caps them when given
    Scroll {
        px: f64,
        viewport: Option<f64>,
        count: Option<u64>,
    },
}

/// Run configuration derived from CLI arguments
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub source: SourceChoice,
    pub selection: RowSelection,
    /// Overrides the configured execution mode
    pub execution: Option<ExecutionMode>,
}

impl CliArgs {
    /// Convert parsed CLI args into a run configuration
    pub fn into_config(self) -> Result<RunConfig, String> {
        let source = if self.uuid {
            SourceChoice::UuidSpace
        } else {
            let path = self
                .path
                .ok_or_else(|| "A PATH is required unless --uuid is given".to_string())?;
            let delimiter = match self.delimiter.as_deref() {
                None => DelimiterChoice::Extension,
                Some(s) if s.eq_ignore_ascii_case("auto") => DelimiterChoice::Auto,
                Some(s) => DelimiterChoice::Fixed(s.parse().unwrap_or_default()),
            };
            let encoding = self.encoding.parse().map_err(|e| format!("{}", e))?;
            SourceChoice::File {
                path,
                delimiter,
                encoding,
            }
        };

        let selection = match self.scroll {
            Some(px) => {
                if !px.is_finite() || px < 0.0 {
                    return Err(format!("Invalid --scroll offset: {}", px));
                }
                RowSelection::Scroll {
                    px,
                    viewport: self.viewport,
                    count: self.count,
                }
            }
            None => {
                let start = match self.start.as_deref() {
                    None => 0,
                    Some(s) => parse_row(s)?,
                };
                RowSelection::Range {
                    start,
                    count: self.count.unwrap_or(DEFAULT_COUNT),
                }
            }
        };

        Ok(RunConfig {
            source,
            selection,
            execution: self.inline.then_some(ExecutionMode::Inline),
        })
    }
}

/// Parse a row number, accepting `_` digit separators
fn parse_row(s: &str) -> Result<RowId, String> {
    let digits: String = s.chars().filter(|&c| c != '_').collect();
    digits
        .parse::<RowId>()
        .map_err(|_| format!("Invalid row number: {}", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn parse(args: &[&str]) -> Result<RunConfig, String> {
        let args = CliArgs::try_parse_from(std::iter::once("vastrow").chain(args.iter().copied()))
            .map_err(|e| e.to_string())?;
        args.into_config()
    }

    #[test]
    fn test_path_defaults() {
        let config = parse(&["data.csv"]).unwrap();
        assert_eq!(
            config.source,
            SourceChoice::File {
                path: PathBuf::from("data.csv"),
                delimiter: DelimiterChoice::Extension,
                encoding: Encoding::Utf8,
            }
        );
        assert_eq!(
            config.selection,
            RowSelection::Range {
                start: 0,
                count: DEFAULT_COUNT
            }
        );
        assert_eq!(config.execution, None);
    }

    #[test]
    fn test_missing_path_is_rejected() {
        assert!(parse(&[]).is_err());
    }

    #[test]
    fn test_uuid_with_huge_start() {
        let config = parse(&["--uuid", "--start", "340_282_366_920_938_463_463_374_607_431_768_211_455", "-n", "1"]).unwrap();
        assert_eq!(config.source, SourceChoice::UuidSpace);
        assert_eq!(
            config.selection,
            RowSelection::Range {
                start: RowId::MAX,
                count: 1
            }
        );
    }

    #[test]
    fn test_uuid_conflicts_with_path() {
        assert!(parse(&["--uuid", "data.csv"]).is_err());
    }

    #[test]
    fn test_start_conflicts_with_scroll() {
        assert!(parse(&["data.csv", "--start", "5", "--scroll", "100"]).is_err());
    }

    #[test]
    fn test_viewport_requires_scroll() {
        assert!(parse(&["data.csv", "--viewport", "400"]).is_err());
    }

    #[test]
    fn test_scroll_selection() {
        let config = parse(&["data.csv", "--scroll", "1200", "--viewport", "400", "--inline"]).unwrap();
        assert_eq!(
            config.selection,
            RowSelection::Scroll {
                px: 1200.0,
                viewport: Some(400.0),
                count: None
            }
        );
        assert_eq!(config.execution, Some(ExecutionMode::Inline));
    }

    #[test]
    fn test_delimiter_choices() {
        let auto = parse(&["data.txt", "-d", "AUTO"]).unwrap();
        let tab = parse(&["data.txt", "--delimiter", "tab"]).unwrap();
        let SourceChoice::File { delimiter, .. } = auto.source else {
            panic!("Expected a file source");
        };
        assert_eq!(delimiter, DelimiterChoice::Auto);
        let SourceChoice::File { delimiter, .. } = tab.source else {
            panic!("Expected a file source");
        };
        assert_eq!(delimiter, DelimiterChoice::Fixed(Delimiter::Tab));
    }

    #[test]
    fn test_bad_encoding_and_start() {
        assert!(parse(&["data.csv", "-e", "ebcdic"]).is_err());
        assert!(parse(&["data.csv", "--start", "-3"]).is_err());
        assert!(parse(&["data.csv", "--start", "many"]).is_err());
    }

    #[test]
    fn test_resolve_delimiter() {
        let path = Path::new("rows.tsv");
        assert_eq!(DelimiterChoice::Extension.resolve(path, String::new), Delimiter::Tab);
        assert_eq!(
            DelimiterChoice::Extension.resolve(Path::new("rows"), String::new),
            Delimiter::Comma
        );
        assert_eq!(
            DelimiterChoice::Auto.resolve(path, || "a;b;c\n1;2;3\n".to_string()),
            Delimiter::Semicolon
        );
        assert_eq!(
            DelimiterChoice::Fixed(Delimiter::Pipe).resolve(path, String::new),
            Delimiter::Pipe
        );
    }
}
