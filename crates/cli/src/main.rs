//! CLI tool for zkid attribute disclosure proofs
//!
//! Runs the key ceremony, derives DIDs and commitments, generates threshold
//! proofs and verifies them.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use zkid_core::circuit::{compute_commitment, Commitment, ProofRequest, ProverService, PublicInputs, VerifierService, CIRCUIT_ID};
use zkid_core::identity::{check_did, compute_did, AttributeSet, Did};
use zkid_core::keys::{export_verifier_constants, FileKeyStore, KeyCeremony, KeyStore, ProofBytes};
use zkid_core::presentation::Presentation;

#[derive(Parser)]
#[command(name = "zkid")]
#[command(about = "Zero-knowledge attribute threshold proofs (Groth16, BN254)", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the one-time key ceremony
    Setup {
        /// Key directory
        #[arg(short, long, default_value = "keys")]
        keys: PathBuf,
    },

    /// Derive the DID for an attribute file
    Did {
        /// Attribute JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Compute the public commitment for an attribute file
    Commit {
        /// Attribute JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Policy identifier
        #[arg(long)]
        policy_id: u64,

        /// Rule version
        #[arg(long)]
        rule_version: u64,
    },

    /// Generate a threshold proof
    Prove {
        /// Attribute JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Key directory
        #[arg(short, long, default_value = "keys")]
        keys: PathBuf,

        /// Policy identifier
        #[arg(long)]
        policy_id: u64,

        /// Rule version
        #[arg(long)]
        rule_version: u64,

        /// Minimum age threshold
        #[arg(short, long)]
        threshold: u64,

        /// Claimed DID (derived from the attributes if omitted)
        #[arg(long)]
        did: Option<String>,

        /// Claimed commitment (derived from the attributes if omitted)
        #[arg(long)]
        commitment: Option<String>,

        /// Output file for proof
        #[arg(short, long, default_value = "proof_age.bin")]
        output: PathBuf,

        /// Also write a presentation JSON to this path
        #[arg(long)]
        presentation: Option<PathBuf>,

        /// Proof generation timeout in seconds
        #[arg(long, default_value_t = 300)]
        timeout: u64,
    },

    /// Verify a proof
    Verify {
        /// Key directory
        #[arg(short, long, default_value = "keys")]
        keys: PathBuf,

        /// Path to proof file
        #[arg(short, long, required_unless_present = "presentation")]
        proof: Option<PathBuf>,

        /// Public inputs as decimal strings: policy_id,version,commitment,threshold
        #[arg(short = 'i', long, value_delimiter = ',', required_unless_present = "presentation")]
        public_inputs: Vec<String>,

        /// Presentation JSON (replaces --proof and --public-inputs)
        #[arg(long, conflicts_with_all = ["proof", "public_inputs"])]
        presentation: Option<PathBuf>,
    },

    /// Export verifying key constants for an external verifier
    ExportVerifier {
        /// Key directory
        #[arg(short, long, default_value = "keys")]
        keys: PathBuf,

        /// Output JSON file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print proof points as decimal strings
    Calldata {
        /// Path to proof file
        #[arg(short, long)]
        proof: PathBuf,
    },

    /// Show example usage
    Examples,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    match cli.command {
        Commands::Setup { keys } => cmd_setup(keys),
        Commands::Did { file } => cmd_did(file),
        Commands::Commit { file, policy_id, rule_version } => cmd_commit(file, policy_id, rule_version),
        Commands::Prove {
            file,
            keys,
            policy_id,
            rule_version,
            threshold,
            did,
            commitment,
            output,
            presentation,
            timeout,
        } => cmd_prove(ProveArgs {
            file,
            keys,
            policy_id,
            rule_version,
            threshold,
            did,
            commitment,
            output,
            presentation,
            timeout,
        }),
        Commands::Verify { keys, proof, public_inputs, presentation } => {
            cmd_verify(keys, proof, public_inputs, presentation)
        }
        Commands::ExportVerifier { keys, output } => cmd_export_verifier(keys, output),
        Commands::Calldata { proof } => cmd_calldata(proof),
        Commands::Examples => cmd_examples(),
    }
}

fn load_attributes(path: &Path) -> Result<AttributeSet> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read attribute file {}", path.display()))?;
    Ok(AttributeSet::from_json(&json)?)
}

fn cmd_setup(keys: PathBuf) -> Result<()> {
    println!("🔑 Running key ceremony for {}...", CIRCUIT_ID);
    println!();

    let store = FileKeyStore::new(&keys);
    let report = KeyCeremony::run(&store)?;

    println!("✅ Keys generated successfully!");
    println!("   Directory:     {}", keys.join(CIRCUIT_ID).display());
    println!("   Fingerprint:   {}", report.fingerprint);
    println!("   VK hash:       {}", report.vk_hash);
    println!("   Constraints:   {}", report.num_constraints);
    println!("   Proving key:   {} bytes", report.proving_key_len);
    println!("   Verifying key: {} bytes", report.verifying_key_len);
    println!();
    println!("⚠️  Keep the proving key with the proving operator; publish the verifying key.");

    Ok(())
}

fn cmd_did(file: PathBuf) -> Result<()> {
    let attrs = load_attributes(&file)?;
    let did = compute_did(&attrs);
    println!("DID: {}", did);
    Ok(())
}

fn cmd_commit(file: PathBuf, policy_id: u64, rule_version: u64) -> Result<()> {
    let attrs = load_attributes(&file)?;
    let did = compute_did(&attrs);
    let commitment = compute_commitment(policy_id, rule_version, &attrs, &did);

    println!("DID:        {}", did);
    println!("Commitment: {}", commitment);
    Ok(())
}

struct ProveArgs {
    file: PathBuf,
    keys: PathBuf,
    policy_id: u64,
    rule_version: u64,
    threshold: u64,
    did: Option<String>,
    commitment: Option<String>,
    output: PathBuf,
    presentation: Option<PathBuf>,
    timeout: u64,
}

fn cmd_prove(args: ProveArgs) -> Result<()> {
    println!("🎂 Generating age proof (age >= {})...", args.threshold);
    println!();

    let attrs = load_attributes(&args.file)?;

    let did = match &args.did {
        Some(text) => check_did(&attrs, &text.parse::<Did>()?)?,
        None => compute_did(&attrs),
    };
    let commitment = match &args.commitment {
        Some(text) => text.parse::<Commitment>()?,
        None => compute_commitment(args.policy_id, args.rule_version, &attrs, &did),
    };

    println!("DID:        {}", did);
    println!("Commitment: {}", commitment);
    println!();

    let store: Arc<dyn KeyStore> = Arc::new(FileKeyStore::new(&args.keys));
    let prover = ProverService::new(store.clone());
    let request = ProofRequest {
        attributes: attrs,
        did,
        commitment,
        policy_id: args.policy_id,
        version: args.rule_version,
        threshold: args.threshold,
    };
    let output = prover.prove_with_timeout(request, Duration::from_secs(args.timeout))?;

    output.proof.write_atomic(&args.output)?;

    println!("✅ Age proof generated successfully!");
    println!("   Size: {} bytes", output.proof.len());
    println!("   Saved to: {}", args.output.display());
    println!();
    println!("Public inputs (policy_id, version, commitment, threshold):");
    let inputs = output.public_decimal_strings();
    for value in &inputs {
        println!("  {}", value);
    }

    if let Some(path) = &args.presentation {
        let vk = store.verifying_key(CIRCUIT_ID)?;
        let presentation = Presentation::new(&output, vk.vk_hash_hex());
        std::fs::write(path, presentation.to_json()?)?;
        println!();
        println!("Presentation written to {}", path.display());
    }

    println!();
    println!("To verify this proof, use:");
    println!(
        "  zkid verify --keys {} --proof {} --public-inputs {}",
        args.keys.display(),
        args.output.display(),
        inputs.join(",")
    );

    Ok(())
}

fn cmd_verify(
    keys: PathBuf,
    proof: Option<PathBuf>,
    public_inputs: Vec<String>,
    presentation: Option<PathBuf>,
) -> Result<()> {
    println!("🔍 Verifying proof...");
    println!();

    let store = FileKeyStore::new(&keys);
    let verifier = VerifierService::from_store(&store)?;

    let is_valid = match presentation {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read presentation {}", path.display()))?;
            let presentation = Presentation::from_json(&json)?;
            println!("Public inputs: {}", presentation.public_inputs.join(", "));
            verifier.verify_presentation(&presentation)?
        }
        None => {
            let proof_path = proof.context("--proof is required without --presentation")?;
            let proof = ProofBytes::read(&proof_path)?;
            let inputs = PublicInputs::from_decimal_strings(&public_inputs)?;
            println!("Proof size: {} bytes", proof.len());
            println!("Policy: {}  Version: {}  Threshold: {}", inputs.policy_id, inputs.version, inputs.threshold);
            println!("Commitment: {}", inputs.commitment);
            verifier.verify(&inputs, &proof)?
        }
    };
    println!();

    if is_valid {
        println!("✅ Proof is VALID!");
        println!("   (attributes are hidden)");
        Ok(())
    } else {
        println!("❌ Proof is INVALID!");
        std::process::exit(1);
    }
}

fn cmd_export_verifier(keys: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let store = FileKeyStore::new(&keys);
    let vk = store.verifying_key(CIRCUIT_ID)?;
    let constants = export_verifier_constants(&vk)?;
    let json = serde_json::to_string_pretty(&constants)?;

    match output {
        Some(path) => {
            std::fs::write(&path, json)?;
            println!("✅ Verifier constants written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn cmd_calldata(proof: PathBuf) -> Result<()> {
    let proof = ProofBytes::read(&proof)?;
    let calldata = proof.to_calldata()?;
    println!("{}", serde_json::to_string_pretty(&calldata)?);
    Ok(())
}

fn cmd_examples() -> Result<()> {
    println!("📚 Example Usage");
    println!();
    println!("Attribute file (alice.json):");
    println!(r#"   {{"name":"Alice","nation":"Wonderland","address":"123 Fantasy Rd","age":28,"identity_id":123456789,"attr_value":"0x01020304"}}"#);
    println!();
    println!("1. Run the key ceremony (once per circuit version):");
    println!("   zkid setup --keys keys");
    println!();
    println!("2. Derive the DID and commitment:");
    println!("   zkid did -f alice.json");
    println!("   zkid commit -f alice.json --policy-id 1 --rule-version 1");
    println!();
    println!("3. Prove age >= 18:");
    println!("   zkid prove -f alice.json --policy-id 1 --rule-version 1 -t 18 -o proof_age.bin --presentation alice.presentation.json");
    println!();
    println!("4. Verify:");
    println!("   zkid verify --proof proof_age.bin --public-inputs 1,1,<commitment>,18");
    println!("   zkid verify --presentation alice.presentation.json");
    println!();
    println!("5. Export for an on-chain verifier:");
    println!("   zkid export-verifier -o verifier.json");
    println!("   zkid calldata -p proof_age.bin");
    println!();
    println!("💡 Tips:");
    println!("   - Use --verbose or -v for detailed logging");
    println!("   - The commitment binds the proof to the policy, version and DID");
    println!("   - Proofs are zero-knowledge: the verifier never sees the attributes");
    println!();

    Ok(())
}
