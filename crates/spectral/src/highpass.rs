//! Zero-phase Butterworth highpass.
//!
//! Fallback for channels configured for the highpass variant when the dataset
//! did not supply one.

use contracts::ContractError;

/// Cutoff used when none is configured, as a fraction of the sample rate
pub const DEFAULT_CUTOFF_FRACTION: f64 = 0.005;

/// Second-order Butterworth highpass biquad (direct form I)
#[derive(Debug, Clone)]
pub struct ButterworthHighpass {
    b: [f64; 3],
    a: [f64; 2],
    x: [f64; 2],
    y: [f64; 2],
}

impl ButterworthHighpass {
    /// # Errors
    /// - `InvalidSignal` unless `0 < cutoff_hz < sample_rate_hz / 2`
    pub fn new(cutoff_hz: f64, sample_rate_hz: f64) -> Result<Self, ContractError> {
        if !(sample_rate_hz.is_finite() && sample_rate_hz > 0.0) {
            return Err(ContractError::invalid_signal(format!(
                "sample rate must be finite and > 0, got {sample_rate_hz}"
            )));
        }
        if !(cutoff_hz.is_finite() && cutoff_hz > 0.0 && cutoff_hz < sample_rate_hz / 2.0) {
            return Err(ContractError::invalid_signal(format!(
                "highpass cutoff {cutoff_hz} Hz outside (0, {}) Hz",
                sample_rate_hz / 2.0
            )));
        }

        // Pre-warped analog cutoff, bilinear transform
        let omega = (std::f64::consts::PI * cutoff_hz / sample_rate_hz).tan();
        let sqrt2 = std::f64::consts::SQRT_2;
        let omega2 = omega * omega;
        let norm = 1.0 / (1.0 + sqrt2 * omega + omega2);

        Ok(Self {
            b: [norm, -2.0 * norm, norm],
            a: [2.0 * (omega2 - 1.0) * norm, (1.0 - sqrt2 * omega + omega2) * norm],
            x: [0.0; 2],
            y: [0.0; 2],
        })
    }

    /// Prime the history as if `value` had been held forever (zero output for a constant)
    fn prime(&mut self, value: f64) {
        self.x = [value; 2];
        self.y = [0.0; 2];
    }

    fn filter(&mut self, x: f64) -> f64 {
        let y = self.b[0] * x + self.b[1] * self.x[0] + self.b[2] * self.x[1]
            - self.a[0] * self.y[0]
            - self.a[1] * self.y[1];
        self.x = [x, self.x[0]];
        self.y = [y, self.y[0]];
        y
    }

    fn run(&mut self, signal: &mut [f64]) {
        if let Some(&first) = signal.first() {
            self.prime(first);
        }
        for v in signal.iter_mut() {
            *v = self.filter(*v);
        }
    }

    /// Forward-backward filtering: zero phase, squared magnitude response
    pub fn filtfilt(&mut self, signal: &[f64]) -> Vec<f64> {
        let mut out = signal.to_vec();
        self.run(&mut out);
        out.reverse();
        self.run(&mut out);
        out.reverse();
        out
    }
}

/// Highpass a single axis
///
/// `cutoff_hz = None` uses `DEFAULT_CUTOFF_FRACTION · sample_rate_hz`.
pub fn highpass_fallback(
    waveform: &[f64],
    sample_rate_hz: f64,
    cutoff_hz: Option<f64>,
) -> Result<Vec<f64>, ContractError> {
    let cutoff = cutoff_hz.unwrap_or(sample_rate_hz * DEFAULT_CUTOFF_FRACTION);
    let mut filter = ButterworthHighpass::new(cutoff, sample_rate_hz)?;
    Ok(filter.filtfilt(waveform))
}
