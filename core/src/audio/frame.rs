//! Frequency frames pulled once per render tick.

use super::AnalyzerError;

/// Byte-scaled magnitudes for one analysis window.
///
/// The bin count is a non-zero power of two and stays fixed for the lifetime
/// of the analysis session that produced it. Modes only ever read a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyFrame {
    bins: Vec<u8>,
}

impl FrequencyFrame {
    pub fn new(bins: Vec<u8>) -> Result<Self, AnalyzerError> {
        if bins.is_empty() {
            return Err(AnalyzerError::EmptyFrame);
        }
        if !bins.len().is_power_of_two() {
            return Err(AnalyzerError::NonPowerOfTwo(bins.len()));
        }
        Ok(Self { bins })
    }

    /// A frame with every bin set to `value`.
    pub fn filled(len: usize, value: u8) -> Result<Self, AnalyzerError> {
        Self::new(vec![value; len])
    }

    pub fn silent(len: usize) -> Result<Self, AnalyzerError> {
        Self::filled(len, 0)
    }

    /// Build from normalized magnitudes in `[0, 1]`.
    pub fn from_normalized(values: &[f32]) -> Result<Self, AnalyzerError> {
        Self::new(
            values
                .iter()
                .map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
                .collect(),
        )
    }

    /// Caller guarantees a non-empty power-of-two length.
    pub(crate) fn from_bins_unchecked(bins: Vec<u8>) -> Self {
        debug_assert!(bins.len().is_power_of_two());
        Self { bins }
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn bins(&self) -> &[u8] {
        &self.bins
    }

    pub fn get(&self, index: usize) -> u8 {
        self.bins.get(index).copied().unwrap_or(0)
    }

    /// Magnitude at `index` mapped to `[0, 1]`.
    pub fn normalized(&self, index: usize) -> f32 {
        self.get(index) as f32 / 255.0
    }

    /// Sensitivity-scaled magnitude. Not clamped: values above 1 are allowed.
    pub fn intensity(&self, index: usize, sensitivity: f32) -> f32 {
        self.normalized(index) * sensitivity
    }

    /// Average intensity over the whole frame.
    pub fn mean(&self, sensitivity: f32) -> f32 {
        let sum: u32 = self.bins.iter().map(|&b| b as u32).sum();
        sum as f32 / self.bins.len() as f32 / 255.0 * sensitivity
    }

    /// Average intensity of contiguous band `band` out of `bands`.
    ///
    /// Every band covers at least one bin, so asking for more bands than
    /// bins repeats bins instead of reading past the end.
    pub fn band_average(&self, band: usize, bands: usize, sensitivity: f32) -> f32 {
        let (start, end) = self.band_range(band, bands);
        let sum: u32 = self.bins[start..end].iter().map(|&b| b as u32).sum();
        sum as f32 / (end - start) as f32 / 255.0 * sensitivity
    }

    /// All band averages in order.
    pub fn downsample(&self, bands: usize, sensitivity: f32) -> Vec<f32> {
        (0..bands)
            .map(|band| self.band_average(band, bands, sensitivity))
            .collect()
    }

    fn band_range(&self, band: usize, bands: usize) -> (usize, usize) {
        let len = self.bins.len();
        let bands = bands.max(1);
        let start = (band.min(bands - 1) * len / bands).min(len - 1);
        let end = ((band + 1).min(bands) * len / bands).clamp(start + 1, len);
        (start, end)
    }
}
