//! Mode registry and factory functions.

use std::collections::HashMap;

use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::bars::{BarMode, GridMode, MirrorMode, SpectrumMode};
use super::electric::{LightningMode, QuantumMode, TeslaMode};
use super::fields::{
    Aurora2Mode, FractalsMode, HexagonMode, MembraneMode, VoronoiMode, WaveInterferenceMode,
};
use super::lines::{DnaMode, FlowerMode, SoundwaveMode, SpiralMode, WaveMode};
use super::networks::{MatrixRainMode, NeuralMode};
use super::orbits::{AtomMode, CrystalMode, CubeMode, PlanetMode, StarfieldMode};
use super::particles::{FireworksMode, FlockMode, FluidMode, ParticleMode};
use super::radial::{
    CircleMode, GalaxySpiralMode, KaleidoMode, PrismMode, RippleMode, TunnelMode, WormholeMode,
};
use super::{ModeContext, ModeKind, RenderMode};
use crate::audio::FrequencyFrame;
use crate::render::Surface;

/// Per-mode random stream derived from a registry seed.
fn mode_rng(seed: u64, kind: ModeKind) -> StdRng {
    let salt = (kind as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    StdRng::seed_from_u64(seed ^ salt)
}

/// Create a mode instance with fresh state.
///
/// Two instances created with the same `seed` evolve identically when fed
/// the same frames.
pub fn create_mode(kind: ModeKind, seed: u64) -> Box<dyn RenderMode> {
    let rng = mode_rng(seed, kind);
    match kind {
        ModeKind::Bar => Box::new(BarMode),
        ModeKind::Wave => Box::new(WaveMode),
        ModeKind::Circle => Box::new(CircleMode),
        ModeKind::Particle => Box::new(ParticleMode::new(rng)),
        ModeKind::Spectrum => Box::new(SpectrumMode),
        ModeKind::Spiral => Box::new(SpiralMode),
        ModeKind::Mirror => Box::new(MirrorMode),
        ModeKind::Dna => Box::new(DnaMode),
        ModeKind::Flower => Box::new(FlowerMode),
        ModeKind::Tunnel => Box::new(TunnelMode),
        ModeKind::Grid => Box::new(GridMode),
        ModeKind::Starfield => Box::new(StarfieldMode),
        ModeKind::Kaleido => Box::new(KaleidoMode),
        ModeKind::Lightning => Box::new(LightningMode::new(rng)),
        ModeKind::Ripple => Box::new(RippleMode),
        ModeKind::Cube => Box::new(CubeMode),
        ModeKind::Wormhole => Box::new(WormholeMode),
        ModeKind::MatrixRain => Box::new(MatrixRainMode::new(rng)),
        ModeKind::Soundwave => Box::new(SoundwaveMode),
        ModeKind::Planet => Box::new(PlanetMode),
        ModeKind::Neural => Box::new(NeuralMode::new(rng)),
        ModeKind::Prism => Box::new(PrismMode),
        ModeKind::Voronoi => Box::new(VoronoiMode::new(rng)),
        ModeKind::Crystal => Box::new(CrystalMode),
        ModeKind::Fluid => Box::new(FluidMode::new(rng)),
        ModeKind::GalaxySpiral => Box::new(GalaxySpiralMode),
        ModeKind::Membrane => Box::new(MembraneMode),
        ModeKind::Quantum => Box::new(QuantumMode::new(rng)),
        ModeKind::Fractals => Box::new(FractalsMode),
        ModeKind::WaveInterference => Box::new(WaveInterferenceMode),
        ModeKind::Fireworks => Box::new(FireworksMode::new(rng)),
        ModeKind::Aurora2 => Box::new(Aurora2Mode),
        ModeKind::Atom => Box::new(AtomMode),
        ModeKind::Flock => Box::new(FlockMode::new(rng)),
        ModeKind::Tesla => Box::new(TeslaMode::new(rng)),
        ModeKind::Hexagon => Box::new(HexagonMode),
    }
}

/// Owns one lazily created mode instance per kind.
///
/// State slots are never shared between kinds. A slot is created on the
/// first render of its kind and dropped on [`ModeRegistry::reset`].
pub struct ModeRegistry {
    seed: u64,
    modes: HashMap<ModeKind, Box<dyn RenderMode>>,
}

impl ModeRegistry {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            modes: HashMap::new(),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// An empty registry with the same seed.
    pub fn fork(&self) -> Self {
        Self::new(self.seed)
    }

    pub fn render(
        &mut self,
        kind: ModeKind,
        frame: &FrequencyFrame,
        ctx: &ModeContext<'_>,
        surface: &mut dyn Surface,
    ) {
        let seed = self.seed;
        let mode = self.modes.entry(kind).or_insert_with(|| {
            debug!("creating state for mode '{}'", kind);
            create_mode(kind, seed)
        });
        mode.render(frame, ctx, surface);
    }

    /// Drop the state of `kind`. Returns whether any state existed.
    pub fn reset(&mut self, kind: ModeKind) -> bool {
        self.modes.remove(&kind).is_some()
    }

    pub fn reset_all(&mut self) {
        self.modes.clear();
    }

    pub fn contains(&self, kind: ModeKind) -> bool {
        self.modes.contains_key(&kind)
    }

    pub fn get(&self, kind: ModeKind) -> Option<&dyn RenderMode> {
        self.modes.get(&kind).map(|m| m.as_ref())
    }

    /// Number of live state slots.
    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }
}

impl Default for ModeRegistry {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ThemeCatalog;
    use crate::modes::RenderParameters;
    use crate::render::RecordingSurface;

    #[test]
    fn test_create_mode_matches_kind() {
        for &kind in ModeKind::all() {
            assert_eq!(create_mode(kind, 7).kind(), kind);
        }
    }

    #[test]
    fn test_slots_are_lazy_and_resettable() {
        let mut registry = ModeRegistry::new(1);
        assert!(registry.is_empty());

        let params = RenderParameters::default();
        let themes = ThemeCatalog::builtin();
        let ctx = ModeContext::new(&params, &themes, 0.0);
        let frame = FrequencyFrame::filled(256, 128).unwrap();
        let mut surface = RecordingSurface::new(320, 240);

        registry.render(ModeKind::Particle, &frame, &ctx, &mut surface);
        registry.render(ModeKind::Bar, &frame, &ctx, &mut surface);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(ModeKind::Particle).map(|m| m.state_len()), Some(100));

        assert!(registry.reset(ModeKind::Particle));
        assert!(!registry.reset(ModeKind::Particle));
        assert!(!registry.contains(ModeKind::Particle));

        registry.reset_all();
        assert!(registry.is_empty());
        assert_eq!(registry.fork().seed(), 1);
    }
}
