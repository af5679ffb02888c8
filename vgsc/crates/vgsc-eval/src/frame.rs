//! Per-frame evaluation context supplied by the host.

use vgsc_util::FxHashMap;

/// Everything the host knows about the frame being drawn.
///
/// # Example
///
/// ```
/// use vgsc_eval::Frame;
///
/// let frame = Frame::new(640.0, 360.0)
///     .at(12.0, 0.5)
///     .with_duration(1.0 / 25.0)
///     .with_metadata("score", "42");
/// assert_eq!(frame.n, 12.0);
/// ```
#[derive(Clone, Debug)]
pub struct Frame {
    /// Zero-based frame number.
    pub n: f64,
    /// Timestamp in seconds, NaN when unknown.
    pub t: f64,
    /// Frame width in pixels.
    pub w: f64,
    /// Frame height in pixels.
    pub h: f64,
    /// Frame duration in seconds, NaN when unknown.
    pub duration: f64,
    /// String metadata readable through `getmetadata`.
    pub metadata: FxHashMap<String, String>,
}

impl Frame {
    /// A frame of the given dimensions, with everything else unknown.
    pub fn new(w: f64, h: f64) -> Self {
        Self {
            n: 0.0,
            t: f64::NAN,
            w,
            h,
            duration: f64::NAN,
            metadata: FxHashMap::default(),
        }
    }

    /// Sets the frame number and timestamp.
    pub fn at(mut self, n: f64, t: f64) -> Self {
        self.n = n;
        self.t = t;
        self
    }

    /// Sets the frame duration in seconds.
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    /// Adds one metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
