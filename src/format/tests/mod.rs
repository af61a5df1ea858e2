//! Unit tests for the sidecar codecs, class registry, and store.

mod classes_tests;
