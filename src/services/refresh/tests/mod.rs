//! Tests for the rotation protocol and the cleanup sweep.

mod cleanup_tests;
