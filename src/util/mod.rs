//! Shared utilities

pub mod cancel;
pub mod config;
pub mod context;
pub mod diagnostic;
pub mod fs;
pub mod shell;

pub use cancel::CancelToken;
pub use config::Config;
pub use context::GlobalContext;
pub use diagnostic::Diagnostic;

/// Case-insensitive name comparison used for project and package names.
pub fn names_match(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_match() {
        assert!(names_match("Core", "core"));
        assert!(names_match("ÜBER", "über"));
        assert!(!names_match("Core", "Core2"));
    }
}
