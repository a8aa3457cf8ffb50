// Test module organization
pub mod test_anchors;
pub mod test_compile_errors;
pub mod test_scanning;
