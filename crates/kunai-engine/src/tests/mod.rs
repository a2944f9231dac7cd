//! Engine integration tests against an in-memory store.
