//! Code frames for ranged compiler errors.
//!
//! Offsets and widths are counted in UTF-16 code units, the unit the
//! template compiler reports ranges in.

use source_map::split_lines;

/// Lines of context shown above and below the start line.
const CONTEXT_LINES: usize = 2;

/// Renders the lines around `start..end` of `source` with carets under the
/// range, in the template compiler's frame format:
///
/// ```text
/// 1  |  <div>
/// 2  |    <span>
///    |    ^^^^^^
/// 3  |  </div>
/// ```
pub fn generate_code_frame(source: &str, start: usize, end: usize) -> String {
    let lines: Vec<&str> = split_lines(source).collect();
    let widths: Vec<usize> = lines.iter().map(|l| l.encode_utf16().count()).collect();
    let end = end.min(source.encode_utf16().count());

    let mut frame = Vec::new();
    let mut count = 0usize;

    for (i, width) in widths.iter().enumerate() {
        count += width + 1;
        if count < start {
            continue;
        }

        let mut j = i.saturating_sub(CONTEXT_LINES);
        while j < lines.len() && (j <= i + CONTEXT_LINES || end > count) {
            let number = (j + 1).to_string();
            frame.push(format!(
                "{}{}|  {}",
                number,
                " ".repeat(3usize.saturating_sub(number.len())),
                lines[j]
            ));

            let line_width = widths[j];
            if j == i {
                let pad = (start + line_width + 1).saturating_sub(count);
                let length = if end > count {
                    line_width.saturating_sub(pad)
                } else {
                    end.saturating_sub(start)
                };
                frame.push(format!("   |  {}{}", " ".repeat(pad), "^".repeat(length)));
            } else if j > i {
                if end > count {
                    let length = (end - count).min(line_width);
                    frame.push(format!("   |  {}", "^".repeat(length)));
                }
                count += line_width + 1;
            }
            j += 1;
        }
        break;
    }

    frame.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_line_range() {
        let source = "<div>\n  <span>\n</div>";
        let frame = generate_code_frame(source, 8, 14);
        assert_eq!(
            frame,
            "1  |  <div>\n2  |    <span>\n   |    ^^^^^^\n3  |  </div>"
        );
    }

    #[test]
    fn test_range_spanning_lines() {
        let source = "<a>\n<b>\n<c>\n<d>";
        // From `b>` to `<c`
        let frame = generate_code_frame(source, 5, 10);
        assert_eq!(
            frame,
            "1  |  <a>\n2  |  <b>\n   |   ^^\n3  |  <c>\n   |  ^^\n4  |  <d>"
        );
    }

    #[test]
    fn test_context_is_limited() {
        let source = "1\n2\n3\n4\n5\n6\n7";
        let frame = generate_code_frame(source, 8, 9);
        assert_eq!(frame.lines().next(), Some("2  |  2"));
        assert_eq!(frame.lines().last(), Some("6  |  6"));
    }

    #[test]
    fn test_out_of_range_end_is_clamped() {
        let frame = generate_code_frame("<p>", 0, 1000);
        assert_eq!(frame, "1  |  <p>\n   |  ^^^");
    }
}
