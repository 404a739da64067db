use std::fmt;

/// Failure reported by a [`super::Backend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Zero-sized or larger than the device allows.
    InvalidTextureSize { width: u32, height: u32, max: u32 },
    /// Pixel buffer length does not match `width * height * 4`.
    PixelDataMismatch { expected: usize, actual: usize },
    /// `begin_pass` without a render target.
    NoRenderTarget,
    /// Any other device-level failure.
    Device(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTextureSize { width, height, max } => {
                write!(f, "invalid texture size {width}x{height} (max {max})")
            }
            Self::PixelDataMismatch { expected, actual } => {
                write!(f, "pixel data is {actual} bytes, expected {expected}")
            }
            Self::NoRenderTarget => f.write_str("no render target set"),
            Self::Device(msg) => write!(f, "device error: {msg}"),
        }
    }
}

impl std::error::Error for BackendError {}
