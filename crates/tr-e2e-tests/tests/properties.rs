//! Cross-crate property checks: determinism, totality, commutativity
//! capture, grammar soundness, validator strictness.

use tr_decoder::{ConstrainedStep, MockTokenBackend, TrieIndex, validate};
use tr_interpreter::{candidates, interpret};
use tr_proposer::run_query;

const QUERIES: &[&str] = &[
    "",
    "Find fractions similar to 7/200 but with denominator ≤ 6",
    "positive proper fractions near 1/3",
    "positive integer even fractions like -2/5, proper ones",
    "Show right triangles like 5,12,13",
    "primitive triangles with perimeter <= 20, return up to 5",
    "any triangle, include witness",
    "completely unrelated text with no signals whatsoever",
];

#[test]
fn interpret_twice_yields_identical_candidate_sets() {
    for query in QUERIES {
        let a = candidates(query);
        let b = candidates(query);
        assert_eq!(a, b, "nondeterministic candidates for {query:?}");
        assert_eq!(a.texts(), b.texts());
    }
}

#[test]
fn every_query_yields_a_non_empty_candidate_set() {
    for query in QUERIES {
        assert!(!candidates(query).is_empty(), "empty set for {query:?}");
    }
}

#[test]
fn commutativity_capture() {
    for query in QUERIES {
        let it = interpret(query);
        let expected = if it.bits.len() >= 2 { 2 } else { 1 };
        assert_eq!(
            it.candidates().len(),
            expected,
            "wrong candidate count for {query:?} with bits {:?}",
            it.bits
        );
    }
}

/// Byte-level tokenization of a candidate set, as the mock backend does it.
fn tokenize(texts: &[String]) -> Vec<Vec<u32>> {
    texts
        .iter()
        .map(|t| t.bytes().map(u32::from).collect())
        .collect()
}

#[test]
fn constrained_step_never_offers_a_token_outside_the_prefix_closure() {
    const EOS: u32 = 256;
    for query in QUERIES {
        let sequences = tokenize(candidates(query).texts());
        let trie = TrieIndex::build(&sequences);
        let step = ConstrainedStep::new(&trie, Some(EOS));

        for seq in &sequences {
            for depth in 0..=seq.len() {
                let prefix = &seq[..depth];
                for token in step.allowed(prefix) {
                    if token == EOS {
                        // Forced termination at a terminal node.
                        assert!(
                            sequences.iter().any(|s| s.as_slice() == prefix),
                            "EOS offered mid-candidate for {query:?} at depth {depth}"
                        );
                        continue;
                    }
                    let mut extended = prefix.to_vec();
                    extended.push(token);
                    assert!(
                        sequences.iter().any(|s| {
                            s.len() >= extended.len() && s[..extended.len()] == extended[..]
                        }),
                        "token {token} leaves the prefix closure for {query:?} at depth {depth}"
                    );
                }
            }
        }
    }
}

#[test]
fn generation_budget_equals_longest_tokenization() {
    for query in QUERIES {
        let sequences = tokenize(candidates(query).texts());
        let trie = TrieIndex::build(&sequences);
        let longest = sequences.iter().map(Vec::len).max().unwrap_or(0);
        assert_eq!(trie.max_len(), longest);
    }
}

#[test]
fn validator_rejects_any_single_character_mutation() {
    let cands = candidates("Show right triangles like 5,12,13");
    let member = cands.texts()[0].clone();

    // Flip each character in turn; every mutant must be rejected verbatim.
    for (i, c) in member.char_indices() {
        let replacement = if c == 'X' { 'Y' } else { 'X' };
        let mut mutant = String::with_capacity(member.len());
        mutant.push_str(&member[..i]);
        mutant.push(replacement);
        mutant.push_str(&member[i + c.len_utf8()..]);

        let err = validate(&mutant, &cands).unwrap_err();
        match err {
            tr_decoder::DecodeError::OffGrammar { raw_text } => assert_eq!(raw_text, mutant),
            other => panic!("expected OffGrammar, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn full_pipeline_is_deterministic_per_query() {
    for query in QUERIES {
        let a = run_query(&MockTokenBackend::new(), query).await;
        let b = run_query(&MockTokenBackend::new(), query).await;
        assert_eq!(a.ok, b.ok);
        assert_eq!(a.raw_text, b.raw_text);
        assert_eq!(a.ops, b.ops);
    }
}

#[tokio::test]
async fn pipeline_output_always_belongs_to_the_candidate_set() {
    for query in QUERIES {
        let record = run_query(&MockTokenBackend::new(), query).await;
        assert!(record.ok, "pipeline failed for {query:?}");
        assert!(
            candidates(query).contains(&record.raw_text),
            "output outside candidate set for {query:?}"
        );
    }
}
