/// A single parsed line: the first two coordinates plus the original text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointRecord<'a> {
    pub x: f64,
    pub y: f64,
    /// The line as read, without its terminator
    pub raw: &'a str,
}

/// Strips a trailing `\n` or `\r\n` from a line.
pub fn trim_line_ending(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Parses X and Y out of a point line. Any further fields (Z, intensity, ...)
/// are ignored.
///
/// Returns `None` for malformed lines: fewer than two fields, or a field that
/// is not a floating point number. Callers still count such lines as scanned.
pub fn parse_line(line: &str) -> Option<PointRecord<'_>> {
    let raw = trim_line_ending(line);
    let mut fields = raw.split_whitespace();

    let x = fields.next()?.parse::<f64>().ok()?;
    let y = fields.next()?.parse::<f64>().ok()?;

    Some(PointRecord { x, y, raw })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_xyz_line() {
        let point = parse_line("462000.50 101000.25 312.07").unwrap();
        assert_eq!(point.x, 462000.50);
        assert_eq!(point.y, 101000.25);
        assert_eq!(point.raw, "462000.50 101000.25 312.07");
    }

    #[test]
    fn test_parse_two_fields() {
        let point = parse_line("1 2").unwrap();
        assert_eq!((point.x, point.y), (1.0, 2.0));
    }

    #[test]
    fn test_parse_extra_whitespace() {
        let point = parse_line("  1.5\t\t-2.5   7  ").unwrap();
        assert_eq!((point.x, point.y), (1.5, -2.5));
        assert_eq!(point.raw, "  1.5\t\t-2.5   7  ");
    }

    #[test]
    fn test_parse_strips_line_endings() {
        assert_eq!(parse_line("1 2 3\n").unwrap().raw, "1 2 3");
        assert_eq!(parse_line("1 2 3\r\n").unwrap().raw, "1 2 3");
    }

    #[test]
    fn test_parse_scientific_notation() {
        let point = parse_line("4.62e5 1.01E5 3").unwrap();
        assert_eq!((point.x, point.y), (462000.0, 101000.0));
    }

    #[test]
    fn test_malformed_lines() {
        assert!(parse_line("").is_none());
        assert!(parse_line("   ").is_none());
        assert!(parse_line("5").is_none());
        assert!(parse_line("bad line").is_none());
        assert!(parse_line("5 y 1").is_none());
        assert!(parse_line("x 5 1").is_none());
        assert!(parse_line("5,5,1").is_none());
    }

    #[test]
    fn test_nan_parses_but_is_not_finite() {
        // The float parser accepts "NaN"; the region test rejects it later.
        let point = parse_line("NaN 1 2").unwrap();
        assert!(point.x.is_nan());
    }

    #[test]
    fn test_trim_line_ending() {
        assert_eq!(trim_line_ending("a\r\n"), "a");
        assert_eq!(trim_line_ending("a\n"), "a");
        assert_eq!(trim_line_ending("a"), "a");
        assert_eq!(trim_line_ending("a\r"), "a");
    }
}
