//! Example: full setup, prove and verify round trip in memory
//!
//! Usage:
//!   cargo run --example zkid_flow -- [threshold]

use std::sync::Arc;

use zkid_core::circuit::{ProofRequest, ProverService, VerifierService};
use zkid_core::identity::AttributeSet;
use zkid_core::keys::{KeyCeremony, MemoryKeyStore};
use zkid_core::presentation::Presentation;

fn main() {
    env_logger::init();

    let threshold: u64 = match std::env::args().nth(1) {
        Some(arg) => match arg.parse() {
            Ok(value) => value,
            Err(_) => {
                eprintln!("Threshold must be a non-negative integer, got '{}'", arg);
                std::process::exit(1);
            }
        },
        None => 18,
    };

    let attrs = AttributeSet::new("Alice", "Wonderland", "123 Fantasy Rd", 28, 123456789, vec![1u8, 2, 3, 4]);

    println!("🔑 Running key ceremony...");
    let store = Arc::new(MemoryKeyStore::new());
    let report = match KeyCeremony::run(&*store) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("❌ Ceremony failed: {}", e);
            std::process::exit(1);
        }
    };
    println!("  VK hash: {}", report.vk_hash);
    println!();

    let request = ProofRequest::derive(attrs, 1, 1, threshold);
    println!("📋 Public binding:");
    println!("  DID:        {}", request.did);
    println!("  Commitment: {}", request.commitment);
    println!("  Threshold:  {}", threshold);
    println!();

    let prover = ProverService::new(store.clone());
    let output = match prover.prove(&request) {
        Ok(output) => output,
        Err(e) if e.is_negative_outcome() => {
            println!("❌ No proof: {}", e);
            return;
        }
        Err(e) => {
            eprintln!("❌ Proving failed: {}", e);
            std::process::exit(1);
        }
    };
    println!("✅ Proof generated ({} bytes)", output.proof.len());

    let verifier = match VerifierService::from_store(&*store) {
        Ok(verifier) => verifier,
        Err(e) => {
            eprintln!("❌ Cannot load verifying key: {}", e);
            std::process::exit(1);
        }
    };

    let presentation = Presentation::new(&output, verifier.vk_hash());
    match verifier.verify_presentation(&presentation) {
        Ok(true) => println!("✅ Presentation is VALID (age >= {} without revealing age)", threshold),
        Ok(false) => println!("❌ Presentation is INVALID"),
        Err(e) => eprintln!("❌ Verification error: {}", e),
    }
}
