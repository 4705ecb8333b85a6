use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Store directory used when neither `--store` nor the config names one.
pub const DEFAULT_STORE_DIR: &str = ".dagkv";

#[derive(Parser)]
#[command(
    name = "dagkv",
    about = "Flatten per-piece multihash indices into one ordered key-value store",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Store directory (overrides the config file)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Seed the cursor counter of a store
    Init(InitArgs),
    /// Import every index file in a directory
    Import(ImportArgs),
    /// Import one index file for a piece
    ImportFile(ImportFileArgs),
    /// Show the namespace a piece is bound to
    Lookup(LookupArgs),
    /// Print the entries stored for a piece
    Dump(DumpArgs),
    /// Look up the offset of one hash inside a piece
    Offset(OffsetArgs),
    /// List every registered piece
    Pieces(PiecesArgs),
    /// Show the next free cursor
    Cursor(CursorArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// First cursor to hand out (overrides the config file)
    #[arg(long)]
    pub first_cursor: Option<u64>,
    /// Move an already seeded counter forward to the first cursor
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ImportArgs {
    pub dir: PathBuf,
    /// Index file name suffix (overrides the config file)
    #[arg(long)]
    pub suffix: Option<String>,
    #[arg(long)]
    pub no_verify: bool,
}

#[derive(Args)]
pub struct ImportFileArgs {
    pub piece: String,
    pub path: PathBuf,
    #[arg(long)]
    pub no_verify: bool,
}

#[derive(Args)]
pub struct LookupArgs {
    pub piece: String,
}

#[derive(Args)]
pub struct DumpArgs {
    pub piece: String,
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

#[derive(Args)]
pub struct OffsetArgs {
    pub piece: String,
    /// Hex multihash
    pub hash: String,
}

#[derive(Args)]
pub struct PiecesArgs {}

#[derive(Args)]
pub struct CursorArgs {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_init() {
        let cli = Cli::try_parse_from(["dagkv", "init"]).unwrap();
        assert!(matches!(cli.command, Command::Init(_)));
    }

    #[test]
    fn parse_init_force() {
        let cli =
            Cli::try_parse_from(["dagkv", "init", "--force", "--first-cursor", "500"]).unwrap();
        if let Command::Init(args) = cli.command {
            assert!(args.force);
            assert_eq!(args.first_cursor, Some(500));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_import() {
        let cli = Cli::try_parse_from(["dagkv", "import", "/data/idx", "--no-verify"]).unwrap();
        if let Command::Import(args) = cli.command {
            assert_eq!(args.dir, PathBuf::from("/data/idx"));
            assert!(args.no_verify);
            assert!(args.suffix.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_import_file() {
        let cli = Cli::try_parse_from(["dagkv", "import-file", "bafy", "a.idx"]).unwrap();
        if let Command::ImportFile(args) = cli.command {
            assert_eq!(args.piece, "bafy");
            assert_eq!(args.path, PathBuf::from("a.idx"));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_dump_limit() {
        let cli = Cli::try_parse_from(["dagkv", "dump", "bafy", "-n", "5"]).unwrap();
        if let Command::Dump(args) = cli.command {
            assert_eq!(args.limit, Some(5));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_offset() {
        let cli = Cli::try_parse_from(["dagkv", "offset", "bafy", "1e20ab"]).unwrap();
        if let Command::Offset(args) = cli.command {
            assert_eq!(args.hash, "1e20ab");
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "dagkv", "pieces", "--store", "/tmp/s", "--format", "json", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.format, OutputFormat::Json));
        assert_eq!(cli.store, Some(PathBuf::from("/tmp/s")));
    }

    #[test]
    fn parse_cursor() {
        let cli = Cli::try_parse_from(["dagkv", "cursor"]).unwrap();
        assert!(matches!(cli.command, Command::Cursor(_)));
    }
}
