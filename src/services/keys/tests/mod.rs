//! Tests for key material, keystore transitions, and the manager.

mod keystore_tests;
