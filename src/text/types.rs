use serde::{Deserialize, Serialize};

/// One OCR-detected token with its bounding box
///
/// Coordinates are pixels in the source frame. Tokens carry no ordering
/// invariant within a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrToken {
    /// Recognized text, possibly with surrounding whitespace
    pub text: String,

    /// Left edge of the bounding box
    pub x: u32,

    /// Top edge of the bounding box
    pub y: u32,

    /// Bounding box width
    pub width: u32,

    /// Bounding box height
    pub height: u32,
}

impl OcrToken {
    /// Create a token from text and box geometry
    pub fn new<S: Into<String>>(text: S, x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
            height,
        }
    }

    /// Bounding box area in pixels
    pub fn box_area(&self) -> f64 {
        self.width as f64 * self.height as f64
    }
}

/// All tokens recognized on a single frame
///
/// Carries the frame's dimensions so relative box areas can be computed
/// without holding the pixels, and the explicit sequence index so order
/// never depends on identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameTokens {
    /// Position of the frame in the clip's capture order
    pub frame_index: usize,

    /// Source frame width in pixels
    pub frame_width: u32,

    /// Source frame height in pixels
    pub frame_height: u32,

    /// Tokens detected on this frame
    pub tokens: Vec<OcrToken>,
}

impl FrameTokens {
    /// Create an empty token set for a frame
    pub fn new(frame_index: usize, frame_width: u32, frame_height: u32) -> Self {
        Self {
            frame_index,
            frame_width,
            frame_height,
            tokens: Vec::new(),
        }
    }

    /// Create a token set with tokens attached
    pub fn with_tokens(
        frame_index: usize,
        frame_width: u32,
        frame_height: u32,
        tokens: Vec<OcrToken>,
    ) -> Self {
        Self {
            frame_index,
            frame_width,
            frame_height,
            tokens,
        }
    }

    /// Frame area in pixels
    pub fn frame_area(&self) -> f64 {
        self.frame_width as f64 * self.frame_height as f64
    }
}
