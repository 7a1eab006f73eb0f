//! Pure formatting functions for terminal output.
//!
//! Success and status messages go to stdout, errors and warnings to stderr.

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("\x1b[31mError:\x1b[0m {}", message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("\x1b[32m✓\x1b[0m {}", message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("\x1b[33m→\x1b[0m {}", message);
}

/// Format and print a warning for a step left to manual handling.
pub fn display_warning(message: &str) {
    eprintln!("\x1b[33m⚠ WARNING:\x1b[0m {}", message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_functions_do_not_panic() {
        // Visual verification - output goes to stdout/stderr
        display_error("test error");
        display_success("test success");
        display_status("test status");
        display_warning("test warning");
    }
}
