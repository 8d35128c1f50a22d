use crate::cert::{inspect_certificate, SerialNumber, SigningRequest, SigningService};
use crate::cli::args::*;
use crate::cli::completions::handle_completion_command;
use crate::crypto::{init_crypto, Passphrase};
use crate::utils::config::{SerialPolicy, SignerConfig};
use crate::utils::errors::{CaError, Result};
use crate::utils::output::OutputFormat;
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

pub fn handle_command(cli: Cli) -> Result<()> {
    // Initialize logging - always to stderr
    if !cli.quiet {
        let log_level = match cli.verbose {
            0 => "csr_signer=warn",  // Default: warnings only
            1 => "csr_signer=info",  // -v: info level
            2 => "csr_signer=debug", // -vv: debug level
            _ => "csr_signer=trace", // -vvv+: trace level
        };

        tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_env_filter(log_level)
            .init();
    }

    let output = OutputFormat::new(cli.raw);

    match cli.command {
        Commands::Sign(ref args) => {
            let config = SignerConfig::load_or_default(cli.config.as_deref())?;
            handle_sign_command(args, config, &output, cli.quiet)
        }
        Commands::VerifyCsr { ref csr_file } => {
            let config = SignerConfig::load_or_default(cli.config.as_deref())?;
            handle_verify_command(csr_file, config, &output, cli.quiet)
        }
        Commands::Inspect {
            ref cert_file,
            json,
        } => handle_inspect_command(cert_file, json, &output),
        Commands::Completion { ref command } => handle_completion_command(command),
    }
}

fn handle_sign_command(
    args: &SignArgs,
    config: SignerConfig,
    output: &OutputFormat,
    quiet: bool,
) -> Result<()> {
    init_crypto();
    let config = apply_sign_overrides(config, args)?;

    let ca_key = read_input(&args.ca_key)?;
    let ca_cert = read_input(&args.ca_cert)?;
    let csr = read_input(&args.csr)?;
    let passphrase = read_passphrase(args)?;

    let service = SigningService::new(config)?;
    let mut request = SigningRequest::new(&ca_key, &ca_cert, &csr);
    if let Some(passphrase) = passphrase.as_ref() {
        request = request.with_passphrase(passphrase);
    }

    let issued = service.sign_request(request)?;

    match &args.out {
        Some(path) => {
            fs::write(path, issued.pem())?;
            if !quiet {
                println!("Certificate written to {}", path.display());
                output.print_key_value(&[
                    ("Serial".to_string(), issued.serial().as_colon_hex()),
                    ("Subject".to_string(), issued.subject().to_string()),
                    ("Issuer".to_string(), issued.issuer().to_string()),
                    (
                        "Not After".to_string(),
                        issued
                            .validity()
                            .not_after()
                            .format("%Y-%m-%d %H:%M:%S UTC")
                            .to_string(),
                    ),
                ]);
            }
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(issued.pem())?;
            stdout.flush()?;
        }
    }

    Ok(())
}

/// Command-line flags take precedence over the config file
fn apply_sign_overrides(mut config: SignerConfig, args: &SignArgs) -> Result<SignerConfig> {
    if let Some(days) = args.days {
        config.validity_days = days;
    }

    if let Some(digest) = args.digest {
        config.digest = digest;
    }

    if let Some(serial) = &args.serial {
        let value = SerialNumber::parse(serial)
            .map_err(|e| CaError::Config(format!("Invalid serial number '{serial}': {e}")))?;
        config.serial = SerialPolicy::Fixed { value };
    } else if let Some(policy) = args.serial_policy {
        config.serial = match policy {
            SerialPolicyArg::Random => SerialPolicy::Random,
            SerialPolicyArg::Counter => SerialPolicy::Counter { start: 1 },
            SerialPolicyArg::Zero => SerialPolicy::Fixed {
                value: SerialNumber::zero(),
            },
        };
    }

    if args.skip_key_check {
        config.verify_ca_key_pair = false;
    }

    config.validate()?;
    Ok(config)
}

fn read_passphrase(args: &SignArgs) -> Result<Option<Passphrase>> {
    if let Some(var) = &args.passphrase_env {
        let value = env::var(var).map_err(|_| {
            CaError::Input(format!("Environment variable {var} is not set"))
        })?;
        return Ok(Some(Passphrase::from(value)));
    }

    if args.ask_passphrase {
        let value = rpassword::prompt_password("CA key passphrase: ")
            .map_err(|e| CaError::Input(format!("Failed to read passphrase: {e}")))?;
        return Ok(Some(Passphrase::from(value)));
    }

    Ok(None)
}

fn handle_verify_command(
    csr_file: &Path,
    config: SignerConfig,
    output: &OutputFormat,
    quiet: bool,
) -> Result<()> {
    init_crypto();
    let csr = read_input(csr_file)?;
    let summary = SigningService::new(config)?.verify_request(&csr)?;

    if !quiet {
        println!("CSR signature is valid");
        output.print_key_value(&summary.rows());
    }
    Ok(())
}

fn handle_inspect_command(cert_file: &Path, json: bool, output: &OutputFormat) -> Result<()> {
    let pem = read_input(cert_file)?;
    let summary = inspect_certificate(&pem)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        output.print_key_value(&summary.rows());
    }
    Ok(())
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| CaError::Input(format!("Failed to read '{}': {e}", path.display())))
}
