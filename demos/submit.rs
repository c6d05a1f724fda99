//! Submission demo for the crpt-api crate.
//!
//! Runs offline against a printing transport by default. Set
//! `CRPT_BASE_URL` to send real requests to a registry endpoint instead.
//!
//! ```text
//! RUST_LOG=crpt_api=debug cargo run --example submit
//! ```

use crpt_api::{
    decode_base64, BodyRequest, CrptApiBuilder, CrptError, Description, Document, Product,
    SharedCrptApi, Transport, TransportError,
};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Prints each envelope instead of sending it.
struct PrintingTransport;

impl Transport for PrintingTransport {
    fn post(&self, url: &str, body: String, _content_type: &str) -> Result<String, TransportError> {
        match serde_json::from_str::<BodyRequest>(&body) {
            Ok(envelope) => {
                let document = decode_base64(&envelope.product_document).unwrap_or_default();
                println!(
                    "   POST {} -> {} bytes of document JSON, signature {:?}",
                    url,
                    document.len(),
                    envelope.signature
                );
            }
            Err(e) => println!("   POST {} -> unreadable envelope: {}", url, e),
        }
        Ok("{\"value\":\"demo\"}".to_string())
    }
}

fn main() -> Result<(), CrptError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== CRPT Submission Example ===\n");

    let builder = CrptApiBuilder::new()
        .request_limit(3)
        .refill_interval(Duration::from_secs(1));

    let builder = match std::env::var("CRPT_BASE_URL") {
        Ok(url) => builder.base_url(url),
        Err(_) => builder.transport(PrintingTransport),
    };

    let api: SharedCrptApi = Arc::new(builder.build()?);
    println!("1. Client: {:?}\n", api);

    println!("2. Eight submissions from two threads, 3 per second:");
    let start = Instant::now();
    let handles: Vec<_> = (0..2)
        .map(|worker| {
            let api = api.clone();
            thread::spawn(move || {
                for n in 0..4 {
                    let doc = sample(format!("{}-{}", worker, n));
                    match api.create_document(&doc, "demo-signature") {
                        Ok(response) => println!(
                            "   [{:>4}ms] worker {} doc {} -> {:?}",
                            start.elapsed().as_millis(),
                            worker,
                            n,
                            response
                        ),
                        Err(e) => println!("   worker {} stopped: {}", worker, e),
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        let _ = handle.join();
    }

    println!("\n3. Metrics:\n{}", api.metrics());

    api.shutdown();
    println!("\n4. After shutdown:");
    match api.create_document(&sample("late".into()), "demo-signature") {
        Err(e) => println!("   rejected: {}", e),
        Ok(_) => println!("   unexpectedly accepted"),
    }

    Ok(())
}

fn sample(doc_id: String) -> Document {
    Document {
        description: Some(Description {
            participant_inn: Some("7701234567".into()),
        }),
        doc_id: Some(doc_id),
        doc_status: Some("NEW".into()),
        doc_type: Some("LP_INTRODUCE_GOODS".into()),
        owner_inn: Some("7701234567".into()),
        participant_inn: Some("7701234567".into()),
        producer_inn: Some("7701234567".into()),
        production_date: Some("2024-03-01".into()),
        production_type: Some("OWN_PRODUCTION".into()),
        products: Some(vec![Product {
            tnved_code: Some("6403".into()),
            uit_code: Some("0104600000000001".into()),
            ..Default::default()
        }]),
        ..Default::default()
    }
}
