use crate::config::LayoutConfig;

/// Vertical write position for one function.
///
/// `y` is the next free row; `lowest` is the smallest row ever handed out or
/// pinned, which is where the function's End terminator goes.
#[derive(Debug, Clone)]
pub(super) struct Cursor {
    y: f32,
    lowest: f32,
    row: f32,
}

impl Cursor {
    pub(super) fn new(y: f32, row: f32) -> Self {
        Self { y, lowest: y, row }
    }

    pub(super) fn y(&self) -> f32 {
        self.y
    }

    pub(super) fn lowest(&self) -> f32 {
        self.lowest
    }

    /// Hands out the current row and moves one row down.
    pub(super) fn next_row(&mut self) -> f32 {
        let y = self.y;
        self.move_to(y - self.row);
        y
    }

    /// Moves the write position without forgetting how low a branch went.
    pub(super) fn move_to(&mut self, y: f32) {
        self.y = y;
        self.touch(y);
    }

    pub(super) fn touch(&mut self, y: f32) {
        if y < self.lowest {
            self.lowest = y;
        }
    }

    /// Starts a new function at `y`; earlier functions no longer count.
    pub(super) fn restart(&mut self, y: f32) {
        self.y = y;
        self.lowest = y;
    }
}

/// Horizontal distance from a double-branch decision to each branch column.
/// Shrinks with nesting but stays positive for every finite depth.
pub(super) fn branch_offset(config: &LayoutConfig, depth: usize) -> f32 {
    config.branch_spacing / (depth as f32 + 1.0)
}

/// Distance from a single-branch decision to its false-path column.
pub(super) fn side_offset(config: &LayoutConfig, depth: usize) -> f32 {
    config.side_branch_offset * (depth as f32 + 1.0)
}

/// Distance from a loop's column to its loop-back and exit columns.
pub(super) fn loop_offset(config: &LayoutConfig, depth: usize) -> f32 {
    let inner = depth as f32 + 0.5;
    if depth == 0 {
        inner + config.loop_outer_margin
    } else {
        inner
    }
}

/// Columns for `count` switch arms, centred under `center`.
pub(super) fn case_columns(config: &LayoutConfig, center: f32, count: usize) -> Vec<f32> {
    if count == 0 {
        return Vec::new();
    }
    let base = center - (count - 1) as f32 * config.branch_spacing / 2.0;
    (0..count)
        .map(|index| base + index as f32 * config.branch_spacing)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_row_moves_down_and_tracks_lowest() {
        let mut cursor = Cursor::new(0.0, 1.5);
        assert_eq!(cursor.next_row(), 0.0);
        assert_eq!(cursor.next_row(), -1.5);
        assert_eq!(cursor.y(), -3.0);
        cursor.move_to(-1.5);
        assert_eq!(cursor.y(), -1.5);
        assert_eq!(cursor.lowest(), -3.0);
    }

    #[test]
    fn restart_forgets_previous_function() {
        let mut cursor = Cursor::new(0.0, 1.5);
        cursor.next_row();
        cursor.next_row();
        cursor.restart(-10.0);
        assert_eq!(cursor.lowest(), -10.0);
    }

    #[test]
    fn branch_offset_shrinks_but_stays_positive() {
        let config = LayoutConfig::default();
        let offsets: Vec<f32> = (0..50).map(|depth| branch_offset(&config, depth)).collect();
        assert_eq!(offsets[0], 3.0);
        assert_eq!(offsets[1], 1.5);
        for pair in offsets.windows(2) {
            assert!(pair[1] < pair[0]);
            assert!(pair[1] > 0.0);
        }
    }

    #[test]
    fn side_offset_grows_with_depth() {
        let config = LayoutConfig::default();
        assert_eq!(side_offset(&config, 0), 1.3);
        assert!(side_offset(&config, 1) > side_offset(&config, 0));
        assert!(side_offset(&config, 2) > side_offset(&config, 1));
    }

    #[test]
    fn outermost_loop_gets_extra_margin() {
        let config = LayoutConfig::default();
        assert_eq!(loop_offset(&config, 0), 2.0);
        assert_eq!(loop_offset(&config, 1), 1.5);
        assert_eq!(loop_offset(&config, 2), 2.5);
    }

    #[test]
    fn case_columns_are_centred() {
        let config = LayoutConfig::default();
        assert_eq!(case_columns(&config, 12.0, 3), vec![9.0, 12.0, 15.0]);
        assert_eq!(case_columns(&config, 12.0, 2), vec![10.5, 13.5]);
        assert_eq!(case_columns(&config, 12.0, 1), vec![12.0]);
        assert!(case_columns(&config, 12.0, 0).is_empty());
    }
}
