//! papa: build driver for the papa Tock board.

mod commands;

use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use papa_board::manifest::load_board;
use papa_board::{Board, BoardOverrides};
use papa_build::{BuildAction, SystemRunner};
use papa_size::ReportOptions;

#[derive(Parser)]
#[command(name = "papa", version, about = "Build the Tock kernel for the papa board")]
struct Cli {
    #[command(flatten)]
    board: BoardArgs,
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

/// Which board to use, and values overriding its `Board.toml`.
#[derive(Args, Debug, Default)]
struct BoardArgs {
    /// Board directory (default: nearest Board.toml above the current directory)
    #[arg(long, global = true)]
    board_dir: Option<PathBuf>,
    /// Target triple (e.g., thumbv7m-none-eabi)
    #[arg(long, global = true, env = "TARGET")]
    target: Option<String>,
    /// Platform name (e.g., papa)
    #[arg(long, global = true, env = "PLATFORM")]
    platform: Option<String>,
    /// Architecture tag (e.g., cortex-m3)
    #[arg(long, global = true, env = "TOCK_ARCH")]
    tock_arch: Option<String>,
    /// Build profile (release, debug)
    #[arg(long, global = true)]
    profile: Option<String>,
}

impl BoardArgs {
    fn overrides(&self) -> BoardOverrides {
        BoardOverrides {
            target: self.target.clone(),
            platform: self.platform.clone(),
            tock_arch: self.tock_arch.clone(),
            profile: self.profile.clone(),
        }
    }

    fn start_dir(&self, cwd: &Path) -> PathBuf {
        match self.board_dir {
            Some(ref dir) => cwd.join(dir),
            None => cwd.to_path_buf(),
        }
    }

    fn load(&self, cwd: &Path) -> anyhow::Result<Board> {
        let start = self.start_dir(cwd);
        load_board(&start, &self.overrides())
            .with_context(|| format!("loading board from {}", start.display()))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the kernel image
    Build,
    /// Type-check the kernel without producing an image
    Check,
    /// Remove build artifacts for the board's target triple
    Clean,
    /// Build the kernel documentation
    Doc,
    /// Build and convert the kernel image to a raw binary
    Bin,
    /// Build and write a disassembly listing
    Lst,
    /// Report kernel flash and RAM usage
    Memory {
        /// Kernel ELF (default: the board's kernel image)
        #[arg(long)]
        elf: Option<PathBuf>,
        /// Group symbols by this many path components
        #[arg(short, long, default_value_t = 1)]
        depth: usize,
        /// Report padding between variables
        #[arg(short, long)]
        show_waste: bool,
        /// Output format (human, json)
        #[arg(long)]
        format: Option<String>,
    },
    /// Inspect and manage board definitions
    Board {
        #[command(subcommand)]
        action: BoardAction,
    },
    /// Check toolchain and board status
    Doctor,
}

#[derive(Subcommand)]
enum BoardAction {
    /// Show the resolved board
    Show {
        /// Output format (default: human-readable, "toml" or "json")
        #[arg(long)]
        format: Option<String>,
    },
    /// Validate the resolved board
    Validate,
    /// List built-in and discovered boards
    List {
        /// Directory holding one sub-directory per board (default: current directory)
        root: Option<PathBuf>,
    },
    /// Create a Board.toml in a directory
    Init {
        /// Board directory
        dir: PathBuf,
        /// Architecture tag (default: cortex-m3)
        #[arg(long = "arch")]
        arch: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::builder().filter_level(log_level).init();

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let args = &cli.board;

    match cli.command {
        Commands::Build => build(args, &cwd, BuildAction::Build),
        Commands::Check => build(args, &cwd, BuildAction::Check),
        Commands::Doc => build(args, &cwd, BuildAction::Doc),
        Commands::Bin => build(args, &cwd, BuildAction::Bin),
        Commands::Lst => build(args, &cwd, BuildAction::Lst),

        Commands::Clean => {
            let board = args.load(&cwd)?;
            commands::clean::run(&board, &mut SystemRunner)
        }

        Commands::Memory {
            elf,
            depth,
            show_waste,
            format,
        } => {
            let board = args.load(&cwd)?;
            let options = ReportOptions {
                depth,
                verbose: cli.verbose,
                show_waste,
            };
            let elf = elf.map(|p| cwd.join(p));
            commands::memory::run(&board, elf.as_deref(), &options, format.as_deref())
        }

        Commands::Board { action } => match action {
            BoardAction::Show { format } => {
                let board = args.load(&cwd)?;
                commands::board::show(&board, format.as_deref())
            }
            BoardAction::Validate => {
                let board = args.load(&cwd)?;
                commands::board::validate(&board)
            }
            BoardAction::List { root } => {
                let root = root.map_or_else(|| cwd.clone(), |r| cwd.join(r));
                commands::board::list(&root)
            }
            BoardAction::Init { dir, arch } => commands::board::init(
                &cwd.join(dir),
                args.platform.as_deref(),
                arch.as_deref().or(args.tock_arch.as_deref()),
            ),
        },

        Commands::Doctor => commands::doctor::run(&args.start_dir(&cwd), &args.overrides()),
    }
}

fn build(args: &BoardArgs, cwd: &Path, action: BuildAction) -> anyhow::Result<()> {
    let board = args.load(cwd)?;
    commands::build::run(&board, action, &mut SystemRunner)
}
