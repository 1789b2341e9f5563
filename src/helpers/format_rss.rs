const KIB_PER_MIB: u64 = 1024;
const KIB_PER_GIB: u64 = 1024 * 1024;

/// Format a resident set size given in KiB, e.g. `512.0 MiB`.
pub(crate) fn format_rss(kib: u64) -> String {
    if kib < KIB_PER_MIB {
        format!("{kib} KiB")
    } else if kib < KIB_PER_GIB {
        format!("{:.1} MiB", kib as f64 / KIB_PER_MIB as f64)
    } else {
        format!("{:.1} GiB", kib as f64 / KIB_PER_GIB as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_rss_kibibytes() {
        assert_eq!(format_rss(0), "0 KiB");
        assert_eq!(format_rss(1023), "1023 KiB");
    }

    #[test]
    fn test_format_rss_mebibytes() {
        assert_eq!(format_rss(1024), "1.0 MiB");
        assert_eq!(format_rss(1536), "1.5 MiB");
        assert_eq!(format_rss(524_288), "512.0 MiB");
    }

    #[test]
    fn test_format_rss_gibibytes() {
        assert_eq!(format_rss(1_048_576), "1.0 GiB");
        assert_eq!(format_rss(3 * 1_048_576 + 524_288), "3.5 GiB");
    }
}
