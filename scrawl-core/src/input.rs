//! Pointer input, as delivered by the host.

use crate::geometry::Point;

bitflags::bitflags! {
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
    pub struct Modifiers : u8 {
        /// Extend the selection instead of replacing it.
        const SHIFT = 0b0000_0001;
        const CTRL  = 0b0000_0010;
        const ALT   = 0b0000_0100;
        const META  = 0b0000_1000;
    }
}

/// One pointer sample, in scene coordinates.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
pub struct PointerSample {
    pub position: Point,
    /// Normalized `[0, 1]` pressure, or `None` if the device doesn't report it.
    pub pressure: Option<f32>,
}
impl PointerSample {
    #[must_use]
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            position: Point::new(x, y),
            pressure: None,
        }
    }
    #[must_use]
    pub fn with_pressure(self, pressure: f32) -> Self {
        Self {
            pressure: Some(pressure),
            ..self
        }
    }
    /// The sample's pressure if it is reported and usable.
    #[must_use]
    pub fn usable_pressure(&self) -> Option<f32> {
        self.pressure
            .filter(|p| p.is_finite())
            .map(|p| p.clamp(0.0, 1.0))
    }
}

#[derive(Copy, Clone, PartialEq, Debug)]
pub enum PointerEvent {
    Down(PointerSample, Modifiers),
    Move(PointerSample),
    Up(PointerSample),
}
