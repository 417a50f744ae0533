//! Test-only crate. The integration tests live in `tests/` and exercise
//! real code paths across every TraceRail crate boundary.
