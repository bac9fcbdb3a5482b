use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use gamedata_store::Encoding;

#[derive(Parser)]
#[command(
    name = "gamedata",
    about = "Inspect and manage persisted game data",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Base name of the save file (without extension)
    #[arg(long, global = true)]
    pub name: Option<String>,

    /// Save file encoding
    #[arg(long, global = true)]
    pub encoding: Option<EncodingArg>,

    /// Obscure text saves the way release builds do
    #[arg(long, global = true)]
    pub release: bool,

    /// Use this directory instead of the platform data directory
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    /// Read store settings from a TOML file (flags take precedence)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum EncodingArg {
    Text,
    Binary,
}

impl From<EncodingArg> for Encoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Text => Encoding::Text,
            EncodingArg::Binary => Encoding::Binary,
        }
    }
}

/// Value type used to interpret an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    String,
    DateTime,
    TimeSpan,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::DateTime => "date-time",
            ValueKind::TimeSpan => "time-span",
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Open the store and show where it lives (writes nothing)
    Init(InitArgs),
    /// Open the store and save it
    Save(SaveArgs),
    /// Delete the save file
    Clear(ClearArgs),
    /// Show the save directory and the first file in it
    Locate(LocateArgs),
    /// Print all entries and session metadata
    Show(ShowArgs),
    /// Read one entry as a typed value
    Get(GetArgs),
    /// Write one typed entry and save
    Set(SetArgs),
}

#[derive(Args)]
pub struct InitArgs {}

#[derive(Args)]
pub struct SaveArgs {}

#[derive(Args)]
pub struct ClearArgs {}

#[derive(Args)]
pub struct LocateArgs {}

#[derive(Args)]
pub struct ShowArgs {}

#[derive(Args)]
pub struct GetArgs {
    pub key: String,
    #[arg(short = 't', long = "type", default_value = "string")]
    pub kind: ValueKind,
    /// Returned when the stored value is missing or zero
    #[arg(short, long)]
    pub default: Option<String>,
}

#[derive(Args)]
pub struct SetArgs {
    pub key: String,
    #[arg(allow_hyphen_values = true)]
    pub value: String,
    #[arg(short = 't', long = "type", default_value = "string")]
    pub kind: ValueKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_save() {
        let cli = Cli::try_parse_from(["gamedata", "save"]).unwrap();
        assert!(matches!(cli.command, Command::Save(_)));
        assert!(!cli.release);
        assert!(cli.name.is_none());
    }

    #[test]
    fn parse_global_store_flags() {
        let cli = Cli::try_parse_from([
            "gamedata", "show", "--name", "slot1", "--encoding", "binary", "--release", "--dir", "/tmp/s",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Show(_)));
        assert_eq!(cli.name, Some("slot1".into()));
        assert!(matches!(cli.encoding, Some(EncodingArg::Binary)));
        assert!(cli.release);
        assert_eq!(cli.dir, Some(PathBuf::from("/tmp/s")));
    }

    #[test]
    fn parse_get_with_type_and_default() {
        let cli = Cli::try_parse_from(["gamedata", "get", "lives", "--type", "int", "-d", "3"]).unwrap();
        if let Command::Get(args) = cli.command {
            assert_eq!(args.key, "lives");
            assert_eq!(args.kind, ValueKind::Int);
            assert_eq!(args.default, Some("3".into()));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_get_defaults_to_string() {
        let cli = Cli::try_parse_from(["gamedata", "get", "name"]).unwrap();
        if let Command::Get(args) = cli.command {
            assert_eq!(args.kind, ValueKind::String);
            assert!(args.default.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_set_negative_value() {
        let cli = Cli::try_parse_from(["gamedata", "set", "score", "-5", "-t", "int"]).unwrap();
        if let Command::Set(args) = cli.command {
            assert_eq!(args.value, "-5");
            assert_eq!(args.kind, ValueKind::Int);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_time_span_kind() {
        let cli = Cli::try_parse_from(["gamedata", "set", "lap", "00:01:30", "--type", "time-span"]).unwrap();
        if let Command::Set(args) = cli.command {
            assert_eq!(args.kind, ValueKind::TimeSpan);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_json_format() {
        let cli = Cli::try_parse_from(["gamedata", "--format", "json", "show"]).unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["gamedata", "--verbose", "locate"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Locate(_)));
    }

    #[test]
    fn rejects_unknown_encoding() {
        assert!(Cli::try_parse_from(["gamedata", "save", "--encoding", "yaml"]).is_err());
    }
}
