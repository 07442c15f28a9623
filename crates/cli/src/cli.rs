use std::path::PathBuf;

#[derive(clap::Parser, Debug)]
#[clap(name = "catnav", about = "Manage the 猫猫导航 data stored in GitHub", version)]
pub struct Cli {
    /// Configuration file (defaults to the per-user config directory)
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// Show what would be written without committing anything
    #[clap(long, global = true)]
    pub dry_run: bool,

    /// Enable debug logging
    #[clap(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[clap(short, long, global = true)]
    pub quiet: bool,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Check credentials and repository access
    Verify {
        /// Print the status as JSON
        #[clap(long)]
        json: bool,
    },
    /// Show the navigation data
    Show {
        /// Use the bundled sample data when the remote copy cannot be loaded
        #[clap(long)]
        fallback: bool,
        /// Print the full document as JSON
        #[clap(long)]
        json: bool,
    },
    /// Save the navigation data to a local JSON file
    Pull {
        /// Output file
        output: PathBuf,
    },
    /// Commit a local JSON file as the new navigation data
    Push {
        /// Input file
        input: PathBuf,
    },
    /// Print a file from the repository
    Cat {
        /// Repository path
        path: String,
        /// Print the raw base64 payload instead of text
        #[clap(long)]
        binary: bool,
    },
    /// Create or replace a binary file in the repository
    Upload {
        /// Local file to upload
        local: PathBuf,
        /// Destination path in the repository
        remote: String,
        /// Commit message
        #[clap(short, long)]
        message: Option<String>,
    },
    /// Download remotely hosted site icons
    Icons {
        /// Output directory
        #[clap(long)]
        out: Option<PathBuf>,
        /// Pause between downloads in milliseconds
        #[clap(long)]
        delay_ms: Option<u64>,
        /// Use the bundled sample data when the remote copy cannot be loaded
        #[clap(long)]
        fallback: bool,
    },
    /// Manage CLI configuration
    Config {
        #[clap(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum ConfigCommands {
    /// Set a configuration value
    Set { key: String, value: String },
    /// Get a configuration value
    Get { key: String },
    /// Show all configuration
    Show,
    /// Reset configuration to defaults
    Reset {
        /// Skip confirmation prompt
        #[clap(long)]
        force: bool,
    },
}
