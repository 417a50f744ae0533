//! The single-request pipeline: precondition → interpret → constrained
//! decode → strict validate → run record.

use tr_decoder::{DecodeError, TokenBackend, decode_constrained, validate};
use tr_exec_tools::Executor;
use tr_protocol::{RunMeta, RunRecord};

/// The exact text given to the model.
pub fn build_prompt(query: &str) -> String {
    format!(
        "You are a semantic trace generator.\n\
         Convert the query into a sequence of operations.\n\
         Output ONLY the trace, no commentary.\n\
         \n\
         Query: {query}\n\
         Trace:\n"
    )
}

/// Run one query to completion or validated failure.
///
/// Every failure is normalized into the record shape with `ok=false`;
/// nothing propagates as an unhandled fault and nothing substitutes a
/// default trace while the backend ran. The only short-circuit is the
/// backend-unavailable precondition, reported before any prompt is built.
pub async fn run_query(backend: &dyn TokenBackend, query: &str) -> RunRecord {
    // Precondition: the accelerated device must be usable.
    let health = match backend.health().await {
        Ok(h) => h,
        Err(e) => {
            return RunRecord::failure(
                query,
                None,
                "",
                format!("backend health check failed: {e}"),
                RunMeta::before_generation(backend.name()),
            );
        }
    };
    if !health.accelerated {
        tracing::error!(device = %health.device, "required acceleration backend unavailable");
        return RunRecord::failure(
            query,
            None,
            "",
            format!(
                "execution backend unavailable on device '{}' (acceleration required)",
                health.device
            ),
            RunMeta::before_generation(health.device),
        );
    }

    let candidates = tr_interpreter::candidates(query);
    tracing::info!(
        candidate_count = candidates.len(),
        "candidate set assembled"
    );
    let prompt = build_prompt(query);

    let decoded = match decode_constrained(backend, &prompt, &candidates).await {
        Ok(d) => d,
        Err(e) => {
            return RunRecord::failure(
                query,
                Some(prompt),
                "",
                format!("generation failed: {e}"),
                RunMeta::before_generation(health.device),
            );
        }
    };

    let meta = RunMeta {
        device: health.device,
        inference_s: Some(decoded.inference_s),
        tokens_generated: decoded.tokens_generated,
    };

    match validate(&decoded.raw_text, &candidates) {
        Ok(trace) => {
            let ops = trace.ops.iter().map(ToString::to_string).collect();
            RunRecord::success(query, prompt, decoded.raw_text, ops, meta)
        }
        Err(DecodeError::OffGrammar { raw_text }) => {
            tracing::error!(tokens = meta.tokens_generated, "off-grammar output rejected");
            RunRecord::failure(
                query,
                Some(prompt),
                raw_text,
                "generated output not in trace grammar language",
                meta,
            )
        }
        Err(e) => RunRecord::failure(
            query,
            Some(prompt),
            decoded.raw_text,
            format!("validation failed: {e}"),
            meta,
        ),
    }
}

/// Replay a successful record's trace against the certified universe and
/// log the outcome. Diagnostics only — the record is never modified.
pub fn ground_check(record: &RunRecord, executor: &Executor) {
    if !record.ok {
        return;
    }
    let trace = match tr_protocol::Trace::parse(&record.raw_text) {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(error = %e, "ground check could not parse validated trace");
            return;
        }
    };
    match executor.run(&trace) {
        Ok(outcome) => tracing::info!(
            final_count = outcome.final_count,
            witness = outcome.witness.as_deref().unwrap_or("-"),
            steps = outcome.steps.len(),
            "ground check passed"
        ),
        Err(e) => tracing::warn!(error = %e, "ground check failed"),
    }
}
