//! Knock-out barrier masking for simulated spot paths.

use fd_core::{
    errors::{Error, Result},
    Price,
};

/// Optional upper and lower knock-out levels.
///
/// A path stays alive while its spot lies strictly between `bottom` and
/// `top`; touching or crossing a level kills it for good.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Barrier {
    /// Upper knock-out level, if any.
    pub top: Option<Price>,
    /// Lower knock-out level, if any.
    pub bottom: Option<Price>,
}

impl Barrier {
    /// An up-and-out barrier.
    pub fn up_and_out(top: Price) -> Self {
        Self {
            top: Some(top),
            bottom: None,
        }
    }

    /// A down-and-out barrier.
    pub fn down_and_out(bottom: Price) -> Self {
        Self {
            top: None,
            bottom: Some(bottom),
        }
    }

    /// Add a lower level.
    pub fn with_bottom(mut self, bottom: Price) -> Self {
        self.bottom = Some(bottom);
        self
    }

    /// Add an upper level.
    pub fn with_top(mut self, top: Price) -> Self {
        self.top = Some(top);
        self
    }

    /// Whether a spot is strictly inside the barriers.
    #[inline]
    pub fn inside(&self, spot: Price) -> bool {
        self.top.map_or(true, |top| spot < top) && self.bottom.map_or(true, |bottom| spot > bottom)
    }

    /// `alive[i] &= bottom < samples[i] < top`. Dead paths never revive.
    pub fn knock_out(&self, samples: &[Price], alive: &mut [bool]) -> Result<()> {
        if samples.len() != alive.len() {
            return Err(Error::InvalidArgument(format!(
                "{} samples for {} path states",
                samples.len(),
                alive.len()
            )));
        }
        for (state, &s) in alive.iter_mut().zip(samples) {
            *state &= self.inside(s);
        }
        Ok(())
    }
}
