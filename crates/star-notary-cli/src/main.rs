//! # star-notary
//!
//! Operator tool for a Star Notary ledger. Each invocation opens the ledger
//! database, runs one command, and prints JSON on stdout. Logs go to stderr.

mod cli;
mod logging;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde::Serialize;
use std::process::ExitCode;

use star_notary::core::{BitcoinKeypair, BitcoinNetwork, Keypair, WalletSigner};
use star_notary::store::SqliteStore;
use star_notary::{ChainFault, Notary, NotaryConfig, Response};

use cli::{Cli, Commands, Scheme, SignArgs};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init_logging("star_notary=info,star_notary_store=info", cli.log_format);

    Ok(if run(&cli).await? {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn open_notary(cli: &Cli) -> Result<Notary<SqliteStore>> {
    let config = match &cli.config {
        Some(path) => NotaryConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => NotaryConfig::default(),
    };

    let store = SqliteStore::open(&cli.db)
        .with_context(|| format!("failed to open ledger at {}", cli.db.display()))?;
    tracing::debug!(path = %cli.db.display(), "ledger opened");

    Notary::open(store, config)
        .await
        .context("failed to initialize chain")
}

/// Run one command. Returns true when the command reports a failure.
///
/// `sign` never touches the ledger; every other command opens it.
async fn run(cli: &Cli) -> Result<bool> {
    match &cli.command {
        Commands::Sign(args) => {
            print_json(&sign(args)?)?;
            Ok(false)
        }
        Commands::Init => {
            let notary = open_notary(cli).await?;
            let height = notary.height().await?;
            tracing::info!(?height, "ledger ready");
            emit(notary.get_block(0).await.into())
        }
        Commands::Block { height } => {
            let notary = open_notary(cli).await?;
            emit(notary.get_block(*height).await.into())
        }
        Commands::Hash { hash } => {
            let notary = open_notary(cli).await?;
            emit(notary.get_block_by_hash(hash).await.into())
        }
        Commands::Address { address } => {
            let notary = open_notary(cli).await?;
            emit(notary.get_blocks_by_address(address).await.into())
        }
        Commands::Verify => {
            let notary = open_notary(cli).await?;
            let faults = notary.audit_chain().await?;
            for fault in &faults {
                tracing::warn!(height = fault.height(), ?fault, "integrity fault");
            }
            let report = AuditReport::new(notary.height().await?, faults);
            print_json(&report)?;
            Ok(!report.heights.is_empty())
        }
    }
}

/// Print a response. Returns true for a failure response.
fn emit<T: Serialize>(response: Response<T>) -> Result<bool> {
    let failed = matches!(response, Response::Failure(_));
    print_json(&response)?;
    Ok(failed)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuditReport {
    head: Option<u64>,
    heights: Vec<u64>,
    faults: Vec<ChainFault>,
}

impl AuditReport {
    fn new(head: Option<u64>, faults: Vec<ChainFault>) -> Self {
        let mut heights: Vec<u64> = faults.iter().map(ChainFault::height).collect();
        heights.sort_unstable();
        heights.dedup();
        Self {
            head,
            heights,
            faults,
        }
    }
}

#[derive(Debug, Serialize)]
struct Signed {
    address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    signature: Option<String>,
}

fn sign(args: &SignArgs) -> Result<Signed> {
    let bytes = hex::decode(args.seed.trim()).context("seed is not valid hex")?;
    let seed: [u8; 32] = bytes
        .try_into()
        .map_err(|b: Vec<u8>| anyhow!("seed must be 32 bytes, got {}", b.len()))?;

    let wallet: Box<dyn WalletSigner> = match args.scheme {
        Scheme::Bitcoin => {
            let mut wallet = BitcoinKeypair::from_seed(&seed)?;
            if args.testnet {
                wallet = wallet.on_network(BitcoinNetwork::Testnet);
            }
            if args.uncompressed {
                wallet = wallet.uncompressed();
            }
            Box::new(wallet)
        }
        Scheme::Ed25519 => Box::new(Keypair::from_seed(&seed)),
    };

    Ok(Signed {
        address: wallet.address(),
        signature: args.message.as_deref().map(|m| wallet.sign_message(m)),
        message: args.message.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use star_notary::core::{SignatureVerifier, WalletVerifier};

    fn args(scheme: Scheme, message: Option<&str>) -> SignArgs {
        SignArgs {
            scheme,
            seed: "07".repeat(32),
            testnet: false,
            uncompressed: false,
            message: message.map(str::to_string),
        }
    }

    #[test]
    fn test_sign_output_verifies() {
        let verifier = WalletVerifier::new();
        for scheme in [Scheme::Bitcoin, Scheme::Ed25519] {
            let signed = sign(&args(scheme, Some("addr:1700000000:starRegistry"))).unwrap();
            let signature = signed.signature.unwrap();
            assert!(verifier.verify(&signed.address, "addr:1700000000:starRegistry", &signature));
        }
    }

    #[test]
    fn test_sign_without_message_prints_address() {
        let signed = sign(&args(Scheme::Bitcoin, None)).unwrap();
        assert!(signed.address.starts_with('1'));
        assert!(signed.signature.is_none());
    }

    #[test]
    fn test_sign_rejects_short_seed() {
        let mut bad = args(Scheme::Ed25519, None);
        bad.seed = "abcd".into();
        assert!(sign(&bad).is_err());
    }

    #[tokio::test]
    async fn test_sign_leaves_ledger_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("ledger.db");
        let seed = "07".repeat(32);
        let cli = Cli::try_parse_from([
            "star-notary",
            "--db",
            db.to_str().unwrap(),
            "sign",
            "--seed",
            seed.as_str(),
            "hello",
        ])
        .unwrap();

        assert!(!run(&cli).await.unwrap());
        assert!(!db.exists());
    }

    #[tokio::test]
    async fn test_init_then_verify_clean() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("ledger.db");
        let parse = |command: &str| {
            Cli::try_parse_from(["star-notary", "--db", db.to_str().unwrap(), command]).unwrap()
        };

        assert!(!run(&parse("init")).await.unwrap());
        assert!(db.exists());
        assert!(!run(&parse("verify")).await.unwrap());
    }

    #[test]
    fn test_audit_report_heights() {
        use star_notary::BlockHash;

        let h = BlockHash::from_bytes([1; 32]);
        let report = AuditReport::new(
            Some(5),
            vec![
                ChainFault::BrokenLink {
                    height: 4,
                    expected: h,
                    found: None,
                },
                ChainFault::HashMismatch {
                    height: 2,
                    stored: h,
                    computed: h,
                },
                ChainFault::GenesisMalformed { height: 0 },
            ],
        );
        assert_eq!(report.heights, vec![0, 2, 4]);
    }
}
