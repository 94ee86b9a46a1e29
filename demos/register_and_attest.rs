//! Example: registering a schema and attesting to a subject
//!
//! Run with: cargo run --example register_and_attest
//! Set RUST_LOG=debug to see state transitions.

use credentials_client::{AccountSigner, AttestationOrchestrator, ClientConfig, KeypairSigner, MemoryLedger};
use credentials_core::{record, PrimitiveType, SchemaDefinition, Value};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("Credentials - Example Usage\n");
    println!("==============================================\n");

    // Step 1: Account and ledger
    println!("1. Generating issuer account...");
    let ledger = Arc::new(MemoryLedger::new());
    let signer = Arc::new(KeypairSigner::generate());
    let orchestrator = AttestationOrchestrator::new(ledger.clone(), signer.clone(), ClientConfig::default());
    println!("   Account: {}\n", signer.address());

    // Step 2: Issuer
    println!("2. Creating issuer...");
    let issuer = orchestrator.create_issuer("acme-games", vec![signer.address()]).await?;
    println!("   Issuer hash: {issuer}\n");

    // Step 3: Schema
    println!("3. Defining schema...");
    let schema = SchemaDefinition::new([
        ("games_played", PrimitiveType::U32),
        ("verified", PrimitiveType::Bool),
        ("rank", PrimitiveType::Char),
    ]);
    for (name, ty) in schema.canonical_entries() {
        println!("   {name}: {}", ty.name());
    }
    println!("   Schema hash: {}\n", schema.schema_hash());

    // Step 4: First attestation registers the schema in the same batch
    println!("4. Attesting (schema not yet registered)...");
    let subject = KeypairSigner::generate().address();
    let receipt = orchestrator
        .attest(
            &schema,
            &subject,
            &record([
                ("games_played", Value::from(27u32)),
                ("verified", Value::from(true)),
                ("rank", Value::from('A')),
            ]),
        )
        .await?;
    println!("   Attestation id: {}", receipt.attestation_id);
    println!("   Block: {}", receipt.block);
    println!("   Registered schema in batch: {}\n", receipt.registered_schema);

    // Step 5: Update
    println!("5. Updating attestation {}...", receipt.attestation_id);
    orchestrator
        .update(
            &schema,
            &subject,
            receipt.attestation_id,
            &record([
                ("games_played", Value::from(28u32)),
                ("verified", Value::from(true)),
                ("rank", Value::from('S')),
            ]),
        )
        .await?;
    println!("   Updated\n");

    // Step 6: Read back
    println!("6. Reading attestations for subject...");
    for (id, values) in orchestrator.get_attestations(&schema, &subject).await? {
        println!("   #{id}: {values:?}");
    }

    println!("\n==============================================");
    println!("{} submissions, {} blocks", ledger.submissions().await.len(), ledger.block_number().await);

    Ok(())
}
