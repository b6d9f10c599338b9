// Licensed under the Apache-2.0 license

use amdcert::{AmdCert, ChainValidator, AMD_CERT_MAX_SIZE};
use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use crypto::OpensslCrypto;
use log::{debug, info};
use platform::{plat_println, DefaultPlatform, Platform};
use std::path::PathBuf;
use zerocopy::IntoBytes;

mod printer;

/// Inspects and validates AMD Root Key / AMD Signing Key certificates.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validates the ARK -> ASK chain.
    Validate(ChainArgs),

    /// Validates the chain and writes the signing key as an SEV certificate.
    Export {
        #[command(flatten)]
        chain: ChainArgs,

        /// Output file for the SEV certificate.
        #[arg(long)]
        out: PathBuf,
    },

    /// Prints a certificate.
    Print {
        /// Certificate file.
        file: PathBuf,

        /// Dump the certificate's bytes instead of the decoded fields.
        #[arg(long)]
        hex: bool,
    },
}

#[derive(Args, Debug)]
struct ChainArgs {
    /// AMD Root Key certificate.
    #[arg(long, requires = "ask", conflicts_with = "chain")]
    ark: Option<PathBuf>,

    /// AMD Signing Key certificate.
    #[arg(long, requires = "ark", conflicts_with = "chain")]
    ask: Option<PathBuf>,

    /// ASK and ARK certificates stored back to back.
    #[arg(long, required_unless_present = "ark")]
    chain: Option<PathBuf>,
}

fn path_str(path: &std::path::Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| anyhow!("{} is not valid UTF-8", path.display()))
}

/// Reads a whole certificate file. Files larger than two certificates are
/// rejected before reading.
fn load_file(platform: &mut dyn Platform, path: &std::path::Path) -> Result<Vec<u8>> {
    let path = path_str(path)?;
    let size = platform
        .get_file_size(path)
        .map_err(|err| anyhow!("{path}: {err:?}"))?;
    if size > 2 * AMD_CERT_MAX_SIZE {
        bail!("{path}: {size} bytes is too large for an AMD certificate file");
    }

    let mut buf = vec![0u8; size];
    let len = platform
        .read_file(path, &mut buf)
        .map_err(|err| anyhow!("{path}: {err:?}"))?;
    buf.truncate(len);
    debug!("read {len} bytes from {path}");
    Ok(buf)
}

fn parse_file(platform: &mut dyn Platform, path: &std::path::Path) -> Result<AmdCert> {
    let bytes = load_file(platform, path)?;
    AmdCert::parse(&bytes).map_err(|err| anyhow!("{}: {err}", path.display()))
}

/// Loads the chain and returns `(ask, ark)`.
fn load_chain(platform: &mut dyn Platform, args: &ChainArgs) -> Result<(AmdCert, AmdCert)> {
    match (&args.ark, &args.ask, &args.chain) {
        (Some(ark), Some(ask), None) => Ok((parse_file(platform, ask)?, parse_file(platform, ark)?)),
        (None, None, Some(chain)) => {
            let bytes = load_file(platform, chain)?;
            AmdCert::parse_chain(&bytes).map_err(|err| anyhow!("{}: {err}", chain.display()))
        }
        _ => bail!("pass either --ark and --ask, or --chain"),
    }
}

fn validate(crypto: &OpensslCrypto, ask: &AmdCert, ark: &AmdCert) -> Result<()> {
    let validator = ChainValidator::new(crypto);
    validator
        .validate_root(ark)
        .map_err(|err| anyhow!("ARK validation failed: {err}"))?;
    info!("ARK is valid");
    validator
        .validate_subordinate(ask, ark)
        .map_err(|err| anyhow!("ASK validation failed: {err}"))?;
    info!("ASK is valid");
    Ok(())
}

fn run(platform: &mut dyn Platform, crypto: &OpensslCrypto, command: Command) -> Result<()> {
    match command {
        Command::Validate(args) => {
            let (ask, ark) = load_chain(platform, &args)?;
            validate(crypto, &ask, &ark)?;
            plat_println!(platform, "ARK -> ASK chain is valid")
                .map_err(|err| anyhow!("{err:?}"))?;
        }
        Command::Export { chain, out } => {
            let (ask, ark) = load_chain(platform, &chain)?;
            validate(crypto, &ask, &ark)?;
            let sev_cert = ask
                .export_pub_key()
                .map_err(|err| anyhow!("export failed: {err}"))?;
            let out = path_str(&out)?;
            platform
                .write_file(out, sev_cert.as_bytes())
                .map_err(|err| anyhow!("{out}: {err:?}"))?;
            info!("wrote SEV certificate to {out}");
        }
        Command::Print { file, hex } => {
            let cert = parse_file(platform, &file)?;
            let printed = if hex {
                printer::print_cert_hex(platform, &cert)
            } else {
                printer::print_cert(platform, crypto, &cert)
            };
            printed.map_err(|err| anyhow!("{err:?}"))?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let crypto = OpensslCrypto::new();
    let mut platform = DefaultPlatform;
    run(&mut platform, &crypto, cli.command).context("amdcert-tool")
}
