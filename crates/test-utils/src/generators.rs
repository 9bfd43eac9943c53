//! Synthetic grid generators.
//!
//! Patterns are predictable so tests can compute expected statistics by
//! hand.

/// Creates a grid where each cell is `row * width + col`.
///
/// # Example
///
/// ```
/// use test_utils::create_index_grid;
///
/// let grid = create_index_grid(4, 3);
/// assert_eq!(grid.len(), 12);
/// assert_eq!(grid[5], 5.0); // row 1, col 1
/// ```
pub fn create_index_grid(width: usize, height: usize) -> Vec<f32> {
    (0..width * height).map(|i| i as f32).collect()
}

/// Creates a grid filled with a constant value.
pub fn create_constant_grid<T: Copy>(width: usize, height: usize, value: T) -> Vec<T> {
    vec![value; width * height]
}

/// Creates a vegetation-index-like grid of raw integers in `[-2000, 10000]`.
///
/// Values increase left to right, so the western half of any region has
/// a lower mean than the eastern half.
pub fn create_vegetation_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for _row in 0..height {
        for col in 0..width {
            let t = if width > 1 {
                col as f32 / (width - 1) as f32
            } else {
                0.0
            };
            data.push((-2000.0 + t * 12000.0).round());
        }
    }
    data
}

/// Replaces the listed (col, row) cells with `value`.
pub fn with_cells<T: Copy>(mut data: Vec<T>, width: usize, cells: &[(usize, usize)], value: T) -> Vec<T> {
    for &(col, row) in cells {
        if col < width {
            if let Some(cell) = data.get_mut(row * width + col) {
                *cell = value;
            }
        }
    }
    data
}

/// Creates a quality-code grid cycling through `codes` cell by cell.
pub fn create_code_grid(width: usize, height: usize, codes: &[u16]) -> Vec<u16> {
    if codes.is_empty() {
        return vec![0; width * height];
    }
    (0..width * height).map(|i| codes[i % codes.len()]).collect()
}
