//! Scanline strides for interlaced and parallel rendering.
//!
//! A stride is every `step`-th row of the image starting at `offset`. The
//! strides generated for one `step` cover each row exactly once, so they
//! can be rendered as separate passes or handed to separate workers.

use lumo_math::Color;

/// One interleaved group of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stride {
    /// First row of the stride
    pub offset: u32,
    /// Distance between consecutive rows
    pub step: u32,
}

impl Stride {
    /// Create a new stride. A zero `step` is treated as 1.
    pub fn new(offset: u32, step: u32) -> Self {
        Self {
            offset,
            step: step.max(1),
        }
    }

    /// Rows of an image `height` rows tall that belong to this stride.
    pub fn rows(&self, height: u32) -> impl Iterator<Item = u32> {
        (self.offset..height).step_by(self.step as usize)
    }

    /// Number of rows this stride covers in an image `height` rows tall.
    pub fn row_count(&self, height: u32) -> u32 {
        self.rows(height).count() as u32
    }

    /// True if row `y` belongs to this stride.
    pub fn owns(&self, y: u32) -> bool {
        y >= self.offset && (y - self.offset) % self.step == 0
    }
}

/// All `count` strides with step `count`, ordered by offset.
///
/// Rendering them in order gives a coarse-to-fine preview: after the first
/// pass every `count`-th row is done.
pub fn generate_strides(count: u32) -> Vec<Stride> {
    let count = count.max(1);
    (0..count).map(|offset| Stride::new(offset, count)).collect()
}

/// A row of the output image with its index.
pub type Row<'a> = (u32, &'a mut [Color]);

/// Split a row-major pixel buffer into the rows owned by each stride.
///
/// Element `i` of the result holds the rows of `strides[i]`. Every row ends
/// up in exactly one group as long as the strides come from
/// [`generate_strides`], so the groups can be written concurrently.
pub fn partition_rows<'a>(pixels: &'a mut [Color], width: u32, strides: &[Stride]) -> Vec<Vec<Row<'a>>> {
    if width == 0 {
        return strides.iter().map(|_| Vec::new()).collect();
    }

    let height = (pixels.len() / width as usize) as u32;
    let mut groups: Vec<Vec<Row<'a>>> = strides
        .iter()
        .map(|stride| Vec::with_capacity(stride.row_count(height) as usize))
        .collect();

    for (y, row) in pixels.chunks_mut(width as usize).enumerate() {
        let y = y as u32;
        if let Some(group) = strides.iter().position(|stride| stride.owns(y)) {
            groups[group].push((y, row));
        }
    }

    groups
}
