//! Continuous changes spread over time, e.g. a volume swell.

/// Receives progress once per scheduler millisecond while active.
///
/// The scheduler starts an interpolator on the first millisecond after it is
/// added, then calls [`Interpolator::update`] every millisecond until the
/// elapsed time reaches its duration.
pub trait Interpolator: Send {
    fn start(&mut self) {}

    /// `percent` runs from just above 0.0 to 1.0.
    fn update(&mut self, elapsed_ms: u64, percent: f64);

    fn end(&mut self) {}
}

/// Adapts a closure taking `(elapsed_ms, percent)`.
pub struct FnInterpolator<F>(pub F);

impl<F> Interpolator for FnInterpolator<F>
where
    F: FnMut(u64, f64) + Send,
{
    fn update(&mut self, elapsed_ms: u64, percent: f64) {
        (self.0)(elapsed_ms, percent)
    }
}

/// Linear ramp between two 7-bit values, reported only when the value moves.
pub struct LinearRamp<F> {
    from: u8,
    to: u8,
    last: Option<u8>,
    apply: F,
}

impl<F> LinearRamp<F>
where
    F: FnMut(u8) + Send,
{
    pub fn new(from: u8, to: u8, apply: F) -> Self {
        Self {
            from: from.min(127),
            to: to.min(127),
            last: None,
            apply,
        }
    }

    fn emit(&mut self, value: u8) {
        if self.last != Some(value) {
            self.last = Some(value);
            (self.apply)(value);
        }
    }
}

impl<F> Interpolator for LinearRamp<F>
where
    F: FnMut(u8) + Send,
{
    fn start(&mut self) {
        let from = self.from;
        self.emit(from);
    }

    fn update(&mut self, _elapsed_ms: u64, percent: f64) {
        let span = self.to as f64 - self.from as f64;
        let value = (self.from as f64 + span * percent.clamp(0.0, 1.0)).round() as u8;
        self.emit(value);
    }
}
