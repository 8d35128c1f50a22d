use crate::crypto::DigestAlgorithm;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "csr-signer")]
#[command(version = "1.0.0")]
#[command(about = "Sign certificate signing requests with a local CA key")]
#[command(long_about = None)]
pub struct Cli {
    /// Config file path (defaults to ~/.config/csr-signer/config.yaml when present)
    #[arg(long, env = "CSR_SIGNER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (repeat for more verbosity: -v INFO, -vv DEBUG, -vvv TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Output raw tab-separated values (no formatting)
    #[arg(short, long)]
    pub raw: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Issue a certificate for a CSR
    Sign(SignArgs),
    /// Check a CSR's self-signature without issuing anything
    VerifyCsr {
        /// CSR file path
        #[arg(value_hint = clap::ValueHint::FilePath)]
        csr_file: PathBuf,
    },
    /// Show the contents of a PEM certificate
    Inspect {
        /// Certificate file path
        #[arg(value_hint = clap::ValueHint::FilePath)]
        cert_file: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completion scripts
    Completion {
        #[command(subcommand)]
        command: CompletionCommands,
    },
}

#[derive(Args)]
pub struct SignArgs {
    /// CA private key (PEM)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub ca_key: PathBuf,
    /// CA certificate (PEM)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub ca_cert: PathBuf,
    /// Certificate signing request (PEM)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub csr: PathBuf,
    /// Write the certificate here instead of stdout
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub out: Option<PathBuf>,
    /// Validity period in days
    #[arg(long)]
    pub days: Option<u32>,
    /// Signature digest
    #[arg(long, ignore_case = true)]
    pub digest: Option<DigestAlgorithm>,
    /// Explicit serial number in hex (colons allowed)
    #[arg(long, conflicts_with = "serial_policy")]
    pub serial: Option<String>,
    /// Serial number policy
    #[arg(long)]
    pub serial_policy: Option<SerialPolicyArg>,
    /// Read the CA key passphrase from this environment variable
    #[arg(long, conflicts_with = "ask_passphrase")]
    pub passphrase_env: Option<String>,
    /// Prompt for the CA key passphrase
    #[arg(long)]
    pub ask_passphrase: bool,
    /// Sign even if the CA key does not match the CA certificate
    #[arg(long)]
    pub skip_key_check: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SerialPolicyArg {
    /// 128-bit random serial
    Random,
    /// Counter starting at 1
    Counter,
    /// Always zero
    Zero,
}

#[derive(Subcommand)]
pub enum CompletionCommands {
    /// Generate bash completion script
    Bash,
    /// Generate zsh completion script
    Zsh,
    /// Generate fish completion script
    Fish,
    /// Generate PowerShell completion script
    PowerShell,
}

impl CompletionCommands {
    pub fn shell(&self) -> Shell {
        match self {
            CompletionCommands::Bash => Shell::Bash,
            CompletionCommands::Zsh => Shell::Zsh,
            CompletionCommands::Fish => Shell::Fish,
            CompletionCommands::PowerShell => Shell::PowerShell,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sign() {
        let cli = Cli::try_parse_from([
            "csr-signer",
            "-vv",
            "sign",
            "--ca-key",
            "ca.key",
            "--ca-cert",
            "ca.crt",
            "--csr",
            "leaf.csr",
            "--days",
            "90",
            "--serial-policy",
            "zero",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Sign(args) => {
                assert_eq!(args.days, Some(90));
                assert_eq!(args.serial_policy, Some(SerialPolicyArg::Zero));
                assert!(args.out.is_none());
            }
            _ => panic!("expected sign command"),
        }
    }

    #[test]
    fn test_serial_conflicts_with_policy() {
        let result = Cli::try_parse_from([
            "csr-signer",
            "sign",
            "--ca-key",
            "k",
            "--ca-cert",
            "c",
            "--csr",
            "r",
            "--serial",
            "01",
            "--serial-policy",
            "random",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_digest_values() {
        let parse = |digest: &str| {
            Cli::try_parse_from([
                "csr-signer",
                "sign",
                "--ca-key",
                "k",
                "--ca-cert",
                "c",
                "--csr",
                "r",
                "--digest",
                digest,
            ])
        };

        for (name, expected) in [
            ("sha384", DigestAlgorithm::Sha384),
            ("SHA-512", DigestAlgorithm::Sha512),
        ] {
            match parse(name).unwrap().command {
                Commands::Sign(args) => assert_eq!(args.digest, Some(expected)),
                _ => panic!("expected sign command"),
            }
        }
        assert!(parse("md5").is_err());
    }
}
