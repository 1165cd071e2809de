//! Pane layout: splits the terminal area into one rectangle per pane.

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub cols: u16,
    pub rows: u16,
}

/// A pane's screen rectangle. `x`/`y` are zero-based cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    #[must_use]
    pub fn area(self) -> u32 {
        u32::from(self.width) * u32::from(self.height)
    }

    #[must_use]
    pub fn contains(self, x: u16, y: u16) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// Narrower than this and a pane header stops being readable.
pub const DEFAULT_MIN_PANE_WIDTH: u16 = 40;

/// Compute one rectangle per pane, in pane order.
///
/// Panes fill a single row while each keeps at least `min_width` columns,
/// then wrap into additional rows. Width within a row is split evenly with
/// remainder columns going to the row's last pane; height is split evenly
/// across rows with remainder rows going to the last row. The rectangles
/// tile the terminal exactly whenever `count > 0`.
#[must_use]
pub fn compute_layout(size: Size, count: usize, min_width: u16) -> Vec<Rect> {
    if count == 0 || size.cols == 0 || size.rows == 0 {
        return Vec::new();
    }

    let min_width = min_width.max(1);
    let per_row = (size.cols / min_width).max(1) as usize;
    let per_row = per_row.min(count);
    let row_count = count.div_ceil(per_row);
    let row_count = row_count.min(usize::from(size.rows)).max(1);
    // Height may be too short for the ideal row count; rows absorb the
    // overflow by holding more panes than `per_row`.
    let per_row = count.div_ceil(row_count);
    let row_count = count.div_ceil(per_row);

    let base_height = size.rows / row_count as u16;
    let extra_rows = size.rows % row_count as u16;

    let mut rects = Vec::with_capacity(count);
    let mut y = 0u16;
    let mut remaining = count;

    for row in 0..row_count {
        let height = if row + 1 == row_count {
            base_height + extra_rows
        } else {
            base_height
        };
        let in_row = per_row.min(remaining);
        let base_width = size.cols / in_row as u16;
        let extra_cols = size.cols % in_row as u16;

        let mut x = 0u16;
        for col in 0..in_row {
            let width = if col + 1 == in_row {
                base_width + extra_cols
            } else {
                base_width
            };
            rects.push(Rect {
                x,
                y,
                width,
                height,
            });
            x += width;
        }

        remaining -= in_row;
        y += height;
        if remaining == 0 {
            break;
        }
    }

    rects
}

#[cfg(test)]
mod tests {
    use super::{compute_layout, Rect, Size, DEFAULT_MIN_PANE_WIDTH};

    fn assert_tiles(size: Size, rects: &[Rect]) {
        let total: u32 = rects.iter().map(|rect| rect.area()).sum();
        assert_eq!(
            total,
            u32::from(size.cols) * u32::from(size.rows),
            "rect areas must sum to the terminal area"
        );
        for (i, a) in rects.iter().enumerate() {
            assert!(a.x + a.width <= size.cols);
            assert!(a.y + a.height <= size.rows);
            for b in rects.iter().skip(i + 1) {
                let overlap_x = a.x < b.x + b.width && b.x < a.x + a.width;
                let overlap_y = a.y < b.y + b.height && b.y < a.y + a.height;
                assert!(!(overlap_x && overlap_y), "rects {a:?} and {b:?} overlap");
            }
        }
    }

    #[test]
    fn zero_panes_yields_empty_layout() {
        let size = Size { cols: 80, rows: 24 };
        assert!(compute_layout(size, 0, DEFAULT_MIN_PANE_WIDTH).is_empty());
    }

    #[test]
    fn single_pane_takes_whole_screen() {
        let size = Size { cols: 80, rows: 24 };
        let rects = compute_layout(size, 1, DEFAULT_MIN_PANE_WIDTH);
        assert_eq!(
            rects,
            vec![Rect {
                x: 0,
                y: 0,
                width: 80,
                height: 24
            }]
        );
    }

    #[test]
    fn two_panes_share_one_row_when_wide_enough() {
        let size = Size {
            cols: 100,
            rows: 30,
        };
        let rects = compute_layout(size, 2, 40);
        assert_eq!(rects.len(), 2);
        assert_eq!(rects[0].height, 30);
        assert_eq!(rects[1].height, 30);
        assert_eq!(rects[0].width, 50);
        assert_eq!(rects[1].width, 50);
        assert_tiles(size, &rects);
    }

    #[test]
    fn panes_wrap_into_rows_below_min_width() {
        let size = Size { cols: 90, rows: 30 };
        // 90 cols fits two 40-wide panes per row, so three panes need two rows.
        let rects = compute_layout(size, 3, 40);
        assert_eq!(rects.len(), 3);
        assert_eq!(rects[0].y, 0);
        assert_eq!(rects[1].y, 0);
        assert_eq!(rects[2].y, 15);
        // The short last row gives its single pane the full width.
        assert_eq!(rects[2].width, 90);
        assert_tiles(size, &rects);
    }

    #[test]
    fn remainder_columns_go_to_last_pane_in_row() {
        let size = Size {
            cols: 101,
            rows: 24,
        };
        let rects = compute_layout(size, 2, 40);
        assert_eq!(rects[0].width, 50);
        assert_eq!(rects[1].width, 51);
        assert_tiles(size, &rects);
    }

    #[test]
    fn remainder_rows_go_to_last_row() {
        let size = Size { cols: 40, rows: 25 };
        let rects = compute_layout(size, 2, 40);
        assert_eq!(rects[0].height, 12);
        assert_eq!(rects[1].height, 13);
        assert_tiles(size, &rects);
    }

    #[test]
    fn tiling_holds_across_sizes_and_counts() {
        for cols in [20u16, 41, 79, 80, 137, 200] {
            for rows in [5u16, 24, 49, 60] {
                for count in 1..=9usize {
                    let size = Size { cols, rows };
                    let rects = compute_layout(size, count, DEFAULT_MIN_PANE_WIDTH);
                    assert_eq!(rects.len(), count, "size {size:?} count {count}");
                    assert_tiles(size, &rects);
                }
            }
        }
    }

    #[test]
    fn more_panes_than_terminal_rows_still_tiles() {
        let size = Size { cols: 30, rows: 4 };
        let rects = compute_layout(size, 9, 40);
        assert_eq!(rects.len(), 9);
        assert_tiles(size, &rects);
    }
}
