//! Tests for the layered token codec.
