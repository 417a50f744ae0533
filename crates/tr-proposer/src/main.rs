//! TraceRail proposer — turns a free-text query into exactly one
//! machine-verifiable semantic trace via grammar-constrained decoding.
//!
//! Emits a single structured record on stdout and conveys the outcome in
//! the exit status: 0 on success, 2 on any failure.

use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use tr_decoder::HttpBackend;
use tr_exec_tools::Executor;
use tr_proposer::{ProposerConfig, ground_check, pipeline};
use tr_protocol::{RunMeta, RunRecord};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let query = std::env::args().nth(1).unwrap_or_default();
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        run_id = %Uuid::now_v7(),
        query = %query,
        "tr-proposer starting"
    );

    let record = run(&query).await;

    match serde_json::to_string(&record) {
        Ok(line) => println!("{line}"),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize run record");
            std::process::exit(2);
        }
    }
    std::process::exit(record.exit_code());
}

/// Outermost boundary: any unexpected failure is converted into the same
/// structured failure shape rather than propagated as an unhandled fault.
async fn run(query: &str) -> RunRecord {
    let config = match ProposerConfig::load() {
        Ok(c) => c,
        Err(e) => {
            return RunRecord::failure(
                query,
                None,
                "",
                format!("exception: config load failed: {e}"),
                RunMeta::before_generation("unknown"),
            );
        }
    };
    tracing::info!(
        backend_host = %config.backend.host,
        model = %config.backend.model,
        ground_check = config.ground_check,
        "config loaded"
    );

    let backend = match HttpBackend::new(config.backend.clone()) {
        Ok(b) => b,
        Err(e) => {
            return RunRecord::failure(
                query,
                None,
                "",
                format!("exception: backend construction failed: {e}"),
                RunMeta::before_generation(config.backend.model),
            );
        }
    };

    let record = pipeline::run_query(&backend, query).await;

    if record.ok && config.ground_check {
        ground_check(&record, &Executor::new());
    }

    record
}
