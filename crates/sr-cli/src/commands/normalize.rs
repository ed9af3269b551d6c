//! Normalize command: show how raw timestamps are read.

use sr_core::normalize_timestamp;

pub fn run(values: &[String]) {
    for value in values {
        println!("{}", format_normalized(value));
    }
}

/// `raw<TAB>normalized`, or `raw<TAB>unparseable`.
pub fn format_normalized(value: &str) -> String {
    normalize_timestamp(value).map_or_else(
        || format!("{value}\tunparseable"),
        |ts| format!("{value}\t{ts}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_value() {
        assert_eq!(
            format_normalized("Oct 15, 2025 @ 11:54:40.903"),
            "Oct 15, 2025 @ 11:54:40.903\t2025-10-15 11:54:40.903"
        );
    }

    #[test]
    fn test_unparseable_value() {
        assert_eq!(format_normalized("soon"), "soon\tunparseable");
    }
}
