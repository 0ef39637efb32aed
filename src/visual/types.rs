use serde::{Deserialize, Serialize};

/// A decoded grayscale frame
///
/// Intensities are stored row-major as `f32` in `0.0..=255.0`. Every frame
/// carries an explicit sequence index assigned at decode time; nothing in
/// the reducers infers order from identifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    index: usize,
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl Frame {
    /// Create a frame from row-major intensities.
    ///
    /// Returns `None` when the buffer length does not match the
    /// dimensions.
    pub fn from_intensities(index: usize, width: u32, height: u32, data: Vec<f32>) -> Option<Self> {
        if data.len() != (width as usize) * (height as usize) {
            return None;
        }
        Some(Self {
            index,
            width,
            height,
            data,
        })
    }

    /// Create a frame filled with one intensity
    pub fn uniform(index: usize, width: u32, height: u32, value: f32) -> Self {
        Self {
            index,
            width,
            height,
            data: vec![value; (width as usize) * (height as usize)],
        }
    }

    /// Create a frame from a decoded grayscale image
    pub fn from_luma(index: usize, image: &image::GrayImage) -> Self {
        Self {
            index,
            width: image.width(),
            height: image.height(),
            data: image.pixels().map(|p| p.0[0] as f32).collect(),
        }
    }

    /// Position of the frame in the clip's capture order
    pub fn index(&self) -> usize {
        self.index
    }

    /// Frame width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Intensity at the given coordinates
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[(y as usize) * (self.width as usize) + (x as usize)]
    }

    /// Row-major intensity buffer
    pub fn intensities(&self) -> &[f32] {
        &self.data
    }

    /// Intensities of a rectangular region, row-major.
    ///
    /// The region is clamped to the frame bounds.
    pub fn region(&self, x0: u32, y0: u32, x1: u32, y1: u32) -> Vec<f32> {
        let x1 = x1.min(self.width);
        let y1 = y1.min(self.height);
        let mut out = Vec::new();
        for y in y0..y1 {
            for x in x0..x1 {
                out.push(self.get(x, y));
            }
        }
        out
    }
}

/// A `(start, end)` scene interval in seconds, half-open
///
/// Boundary lists are not required to arrive sorted; the scene reducer
/// sorts by start time itself. `end >= start` is expected of well-formed
/// boundaries but not validated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneBoundary {
    /// Scene start in seconds
    pub start_seconds: f64,

    /// Scene end in seconds
    pub end_seconds: f64,
}

impl SceneBoundary {
    /// Create a boundary from start and end times
    pub fn new(start_seconds: f64, end_seconds: f64) -> Self {
        Self {
            start_seconds,
            end_seconds,
        }
    }

    /// Scene duration in seconds
    pub fn duration(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }
}
