// ABOUTME: Integration tests for REPL functionality

// Note: REPL integration tests are hard to automate in a meaningful way
// without mock input/output. The main REPL testing is done manually.
// These tests verify the underlying functionality that the REPL uses.

#[cfg(test)]
mod repl_tests {
    // The REPL itself is tested manually via:
    // 1. cargo run
    // 2. Interactive session
    // 3. History file creation/loading
    // 4. Special commands ((help), (clear), (quit)/(exit))

    #[test]
    fn test_repl_infrastructure_exists() {
        // This test just ensures the binary compiles successfully
        // The actual REPL tests are done via manual testing
        // No assertion needed - the test passing means compilation succeeded
    }
}
