use line_index::{LineIndex, TextSize};
use tree_sitter::Point;

/// Maps byte offsets of one text snapshot to tree-sitter points.
///
/// Columns are byte columns, matching what tree-sitter stores in its nodes.
pub struct PointMapper<'a> {
    text: &'a str,
    index: LineIndex,
}

impl<'a> PointMapper<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            index: LineIndex::new(text),
        }
    }

    /// Convert a byte offset to a point.
    ///
    /// Offsets past the end clamp to the end of the text; offsets inside a
    /// multi-byte character snap back to the character start.
    pub fn point_at(&self, offset: usize) -> Point {
        let offset = floor_char_boundary(self.text, offset);
        match TextSize::try_from(offset) {
            Ok(size) => {
                let line_col = self.index.line_col(size);
                Point::new(line_col.line as usize, line_col.col as usize)
            }
            // Texts beyond u32::MAX bytes: count lines by hand
            Err(_) => scan_point(&self.text[..offset]),
        }
    }
}

/// Convert a byte offset in `text` to a point.
pub fn point_at(text: &str, offset: usize) -> Point {
    PointMapper::new(text).point_at(offset)
}

/// Clamp `offset` into `text` and move it back onto a char boundary.
pub fn floor_char_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// Point reached after walking over `text` from the origin.
fn scan_point(text: &str) -> Point {
    match text.rfind('\n') {
        Some(last_newline) => Point::new(
            text.bytes().filter(|b| *b == b'\n').count(),
            text.len() - last_newline - 1,
        ),
        None => Point::new(0, text.len()),
    }
}

/// Point reached after inserting `inserted` at `start`.
pub fn advance_point(start: Point, inserted: &str) -> Point {
    let end = scan_point(inserted);
    if end.row == 0 {
        Point::new(start.row, start.column + end.column)
    } else {
        Point::new(start.row + end.row, end.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_at_first_line() {
        assert_eq!(point_at("hello world", 6), Point::new(0, 6));
    }

    #[test]
    fn test_point_at_after_newline() {
        let text = "fn a() {}\nfn b() {}\n";
        assert_eq!(point_at(text, 10), Point::new(1, 0));
        assert_eq!(point_at(text, 13), Point::new(1, 3));
        assert_eq!(point_at(text, text.len()), Point::new(2, 0));
    }

    #[test]
    fn test_point_at_uses_byte_columns() {
        // 'é' is two bytes
        let text = "é = 1";
        assert_eq!(point_at(text, 2), Point::new(0, 2));
        // middle of 'é' snaps back to its start
        assert_eq!(point_at(text, 1), Point::new(0, 0));
    }

    #[test]
    fn test_point_at_clamps_past_end() {
        assert_eq!(point_at("abc", 42), Point::new(0, 3));
    }

    #[test]
    fn test_advance_point_single_line() {
        assert_eq!(advance_point(Point::new(3, 4), "abc"), Point::new(3, 7));
    }

    #[test]
    fn test_advance_point_multi_line() {
        assert_eq!(
            advance_point(Point::new(3, 4), "a\nbc\ndef"),
            Point::new(5, 3)
        );
        assert_eq!(advance_point(Point::new(0, 9), "\n"), Point::new(1, 0));
    }

    #[test]
    fn test_advance_point_empty_insert() {
        assert_eq!(advance_point(Point::new(2, 5), ""), Point::new(2, 5));
    }
}
