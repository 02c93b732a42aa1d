//! Command-line interface for the `star-notary` binary.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// Star Notary ledger tool.
///
/// Opens the ledger database, runs one command, and prints the result as
/// JSON on stdout.
#[derive(Parser, Debug)]
#[command(name = "star-notary", version, propagate_version = true)]
pub struct Cli {
    /// Path to the ledger database (SQLite).
    #[arg(long, global = true, env = "STAR_NOTARY_DB", default_value = "star-notary.db")]
    pub db: PathBuf,

    /// Path to a TOML configuration file.
    #[arg(long, global = true, env = "STAR_NOTARY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the ledger if missing and print its genesis block.
    Init,
    /// Print the block at a height.
    Block { height: u64 },
    /// Print the block with a hash (64 hex characters).
    Hash { hash: String },
    /// Print every block registered by an address, ascending height.
    Address { address: String },
    /// Audit the whole chain and print any integrity faults.
    Verify,
    /// Derive a wallet from a seed and sign a challenge message with it.
    Sign(SignArgs),
}

/// Arguments for `sign`.
#[derive(Parser, Debug)]
pub struct SignArgs {
    /// Address scheme of the wallet.
    #[arg(long, value_enum, default_value_t = Scheme::Bitcoin)]
    pub scheme: Scheme,

    /// 32-byte secret seed, hex encoded.
    #[arg(long, env = "STAR_NOTARY_SEED", hide_env_values = true)]
    pub seed: String,

    /// Use the Bitcoin testnet version byte.
    #[arg(long)]
    pub testnet: bool,

    /// Sign with the uncompressed Bitcoin public key.
    #[arg(long)]
    pub uncompressed: bool,

    /// Challenge message. Only the address is printed when omitted.
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scheme {
    /// Legacy P2PKH address, BIP-137 signature.
    Bitcoin,
    /// Base58 Ed25519 public key.
    Ed25519,
}
