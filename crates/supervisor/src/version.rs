//! Version string extraction from `<daemon> -v` output.

use std::sync::LazyLock;

use regex::Regex;

/// Label shown when the version could not be determined.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Release tags (`v1.18.5`) or alpha build hashes (`alpha-1a2b3c4`).
const VERSION_PATTERN: &str = r"\bv\d+\.\d+\.\d+\b|\balpha-[0-9a-f]+\b";

static VERSION_RE: LazyLock<Option<Regex>> = LazyLock::new(|| match Regex::new(VERSION_PATTERN) {
    Ok(re) => Some(re),
    Err(e) => {
        tracing::error!("invalid version pattern: {e}");
        None
    }
});

/// Returns the first version token found in `output`, if any.
pub fn extract_version(output: &str) -> Option<String> {
    let re = VERSION_RE.as_ref()?;
    re.find(output).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_compiles() {
        assert!(VERSION_RE.is_some());
    }

    #[test]
    fn release_version() {
        let out = "Mihomo Meta v1.18.5 linux amd64 with go1.22.3 Mon May 20 2024";
        assert_eq!(extract_version(out).as_deref(), Some("v1.18.5"));
    }

    #[test]
    fn alpha_build() {
        let out = "Mihomo Meta alpha-2f3e9a1 windows amd64 with go1.22.0";
        assert_eq!(extract_version(out).as_deref(), Some("alpha-2f3e9a1"));
    }

    #[test]
    fn first_match_wins() {
        let out = "Clash v1.2.3\nbuilt with v9.9.9";
        assert_eq!(extract_version(out).as_deref(), Some("v1.2.3"));
    }

    #[test]
    fn non_matching_output_is_none() {
        assert_eq!(extract_version("clash: unknown flag -v"), None);
        assert_eq!(extract_version(""), None);
    }

    #[test]
    fn partial_tokens_are_rejected() {
        // Needs a full major.minor.patch and a word boundary.
        assert_eq!(extract_version("v1.18"), None);
        assert_eq!(extract_version("prev1.2.3"), None);
        assert_eq!(extract_version("alpha-XYZ"), None);
    }
}
