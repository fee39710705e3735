//! Tests for server configuration utilities.
//!
//! This module exercises the `CalcServer` builder, covering worker counts,
//! back-off settings and binding behaviour. Fixtures from `test_util`
//! provide shared setup via `rstest`.
