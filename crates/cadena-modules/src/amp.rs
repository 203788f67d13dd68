//! Amplitude transforms.

use cadena_core::error::{ChainError, Result};
use cadena_core::module::{Module, ModuleBase};

/// Multiplies every sample by a fixed factor.
#[derive(Debug, Clone)]
pub struct AmplitudeScale {
    base: ModuleBase,
    factor: f64,
}

impl AmplitudeScale {
    /// Builds a gain stage with the given linear factor.
    pub fn new(factor: f64) -> Self {
        Self {
            base: ModuleBase::new(),
            factor,
        }
    }

    /// Linear gain factor.
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Sets the gain factor. Takes effect at the next pass.
    pub fn set_factor(&mut self, factor: f64) {
        self.factor = factor;
    }
}

impl Module for AmplitudeScale {
    fn base(&self) -> &ModuleBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ModuleBase {
        &mut self.base
    }

    fn process(&mut self) -> Result<()> {
        let factor = self.factor;
        let buf = self.base.buffer_mut().ok_or(ChainError::MissingBuffer)?;
        for s in buf.iter_sequential_mut() {
            *s *= factor;
        }
        Ok(())
    }
}

/// Adds a fixed offset to every sample.
#[derive(Debug, Clone)]
pub struct AmplitudeAdd {
    base: ModuleBase,
    offset: f64,
}

impl AmplitudeAdd {
    /// Builds a DC offset stage.
    pub fn new(offset: f64) -> Self {
        Self {
            base: ModuleBase::new(),
            offset,
        }
    }

    /// Offset added per sample.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Sets the offset. Takes effect at the next pass.
    pub fn set_offset(&mut self, offset: f64) {
        self.offset = offset;
    }
}

impl Module for AmplitudeAdd {
    fn base(&self) -> &ModuleBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ModuleBase {
        &mut self.base
    }

    fn process(&mut self) -> Result<()> {
        let offset = self.offset;
        let buf = self.base.buffer_mut().ok_or(ChainError::MissingBuffer)?;
        for s in buf.iter_sequential_mut() {
            *s += offset;
        }
        Ok(())
    }
}
