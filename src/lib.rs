//! Workspace-level integration tests for pagepool. See `tests/`.
