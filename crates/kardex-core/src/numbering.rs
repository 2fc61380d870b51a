//! Invoice number formatting.
//!
//! Numbers look like `<prefix>-<sequence>` with the sequence zero-padded to
//! [`SEQUENCE_WIDTH`] digits: `INV-000001`, `INV-000042`. Sequences past the
//! padding width simply grow (`INV-1000000`).

/// Minimum digit count of the sequence part.
pub const SEQUENCE_WIDTH: usize = 6;

/// Formats a sequence value with the tenant's prefix.
///
/// ```rust
/// use kardex_core::numbering::format_invoice_number;
///
/// assert_eq!(format_invoice_number("INV", 42), "INV-000042");
/// ```
pub fn format_invoice_number(prefix: &str, sequence: i64) -> String {
    format!("{}-{:0width$}", prefix, sequence, width = SEQUENCE_WIDTH)
}

/// Extracts the sequence value from a number issued under `prefix`.
///
/// Returns `None` for numbers issued under another prefix or with a
/// non-numeric tail.
pub fn parse_sequence(prefix: &str, invoice_number: &str) -> Option<i64> {
    let tail = invoice_number.strip_prefix(prefix)?.strip_prefix('-')?;
    if tail.is_empty() || !tail.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    tail.parse().ok()
}

/// Normalizes a configured prefix, falling back to the default when blank.
pub fn effective_prefix(configured: Option<&str>) -> &str {
    match configured.map(str::trim) {
        Some(p) if !p.is_empty() => p,
        _ => crate::DEFAULT_INVOICE_PREFIX,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        assert_eq!(format_invoice_number("INV", 1), "INV-000001");
        assert_eq!(format_invoice_number("FAC", 123_456), "FAC-123456");
        assert_eq!(format_invoice_number("INV", 1_000_000), "INV-1000000");
    }

    #[test]
    fn test_parse() {
        assert_eq!(parse_sequence("INV", "INV-000042"), Some(42));
        assert_eq!(parse_sequence("INV", "INV-1000000"), Some(1_000_000));
        assert_eq!(parse_sequence("INV", "FAC-000042"), None);
        assert_eq!(parse_sequence("INV", "INV-"), None);
        assert_eq!(parse_sequence("INV", "INV-12a"), None);
        assert_eq!(parse_sequence("INV", "INV000042"), None);
    }

    #[test]
    fn test_effective_prefix() {
        assert_eq!(effective_prefix(None), "INV");
        assert_eq!(effective_prefix(Some("  ")), "INV");
        assert_eq!(effective_prefix(Some("FAC")), "FAC");
    }
}
