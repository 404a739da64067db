use crate::error::RenderError;

/// How recorded draws reach the backend.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum SubmitMode {
    /// One upload per buffer per frame; redundant binds are elided.
    #[default]
    Batched,
    /// Each draw uploads its own geometry and uniform block right before it is
    /// issued, and every bind is forced. For backends or debugging sessions
    /// where batching must be ruled out.
    PerDraw,
}

/// Renderer setup parameters.
///
/// Keep this structure minimal; add fields only for a concrete need.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Maximum number of simultaneously live texture handles (1..=255).
    pub max_handles: u8,

    /// Frames a deferred release waits after the frame it was queued in.
    /// `0` frees at the end of the same frame.
    pub release_latency: usize,

    pub submit_mode: SubmitMode,

    /// Keep a CPU copy of texture pixels so textures can be recreated.
    pub retain_texture_sources: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            max_handles: 128,
            release_latency: 0,
            submit_mode: SubmitMode::Batched,
            retain_texture_sources: false,
        }
    }
}

/// Releases further out than this are almost certainly a misconfiguration.
const MAX_RELEASE_LATENCY: usize = 16;

impl RendererConfig {
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.max_handles == 0 {
            return Err(RenderError::InvalidConfig(
                "max_handles must be greater than 0".to_string(),
            ));
        }
        if self.release_latency > MAX_RELEASE_LATENCY {
            return Err(RenderError::InvalidConfig(format!(
                "release_latency {} exceeds {MAX_RELEASE_LATENCY}",
                self.release_latency
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(RendererConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_handles_and_large_latency() {
        let zero = RendererConfig { max_handles: 0, ..RendererConfig::default() };
        assert!(matches!(zero.validate(), Err(RenderError::InvalidConfig(_))));

        let slow = RendererConfig { release_latency: 64, ..RendererConfig::default() };
        assert!(matches!(slow.validate(), Err(RenderError::InvalidConfig(_))));
    }
}
