//! Integration tests for the render modes and theme resolution.

use music_visualizer::color::{Rgb, ThemeCatalog};
use music_visualizer::modes::{create_mode, ModeContext, ModeKind, RenderParameters};
use music_visualizer::render::{DrawCommand, PathElement, Point, RecordingSurface};
use music_visualizer::FrequencyFrame;

const WIDTH: u32 = 320;
const HEIGHT: u32 = 240;

fn params(mode: ModeKind) -> RenderParameters {
    RenderParameters {
        mode,
        ..Default::default()
    }
}

/// Run `ticks` frames through a fresh instance of `kind` and return every
/// command drawn on the last one.
fn run(kind: ModeKind, frame: &FrequencyFrame, ticks: usize, seed: u64) -> Vec<DrawCommand> {
    let themes = ThemeCatalog::builtin();
    let params = params(kind);
    let mut mode = create_mode(kind, seed);
    let mut surface = RecordingSurface::new(WIDTH, HEIGHT);
    let log = surface.log();

    let mut last = Vec::new();
    for tick in 0..ticks {
        let ctx = ModeContext::new(&params, &themes, tick as f32 / 60.0);
        mode.render(frame, &ctx, &mut surface);
        last = log.take();
    }
    last
}

fn command_points(command: &DrawCommand) -> Vec<Point> {
    let elements = match command {
        DrawCommand::FillPath { path, .. } | DrawCommand::StrokePath { path, .. } => path.elements().to_vec(),
        DrawCommand::FillText { at, .. } => return vec![*at],
        _ => return Vec::new(),
    };
    elements
        .iter()
        .flat_map(|element| match *element {
            PathElement::MoveTo(p) | PathElement::LineTo(p) => vec![p],
            PathElement::QuadTo(c, p) => vec![c, p],
            PathElement::Close => vec![],
        })
        .collect()
}

// ==================== Every Mode ====================

#[test]
fn test_every_mode_creates_its_own_kind() {
    for kind in ModeKind::all() {
        assert_eq!(create_mode(*kind, 0).kind(), *kind);
    }
}

#[test]
fn test_every_mode_handles_silence() {
    let silent = FrequencyFrame::silent(256).unwrap();
    for kind in ModeKind::all() {
        for command in run(*kind, &silent, 3, 1) {
            for p in command_points(&command) {
                assert!(p.is_finite(), "{} drew a non-finite point on silence", kind);
            }
        }
    }
}

#[test]
fn test_every_mode_draws_when_loud() {
    let loud = FrequencyFrame::filled(256, 255).unwrap();
    for kind in ModeKind::all() {
        let commands = run(*kind, &loud, 30, 1);
        assert!(!commands.is_empty(), "{} drew nothing at full volume", kind);
        for command in &commands {
            for p in command_points(command) {
                assert!(p.is_finite(), "{} drew a non-finite point", kind);
            }
        }
    }
}

#[test]
fn test_same_seed_same_pictures() {
    let frames: Vec<FrequencyFrame> = (0..6)
        .map(|i| FrequencyFrame::from_normalized(&vec![i as f32 / 6.0; 128]).unwrap())
        .collect();
    let themes = ThemeCatalog::builtin();

    for kind in ModeKind::all() {
        let params = params(*kind);
        let mut a = create_mode(*kind, 42);
        let mut b = create_mode(*kind, 42);
        let mut surface_a = RecordingSurface::new(WIDTH, HEIGHT);
        let mut surface_b = RecordingSurface::new(WIDTH, HEIGHT);
        let (log_a, log_b) = (surface_a.log(), surface_b.log());

        for (tick, frame) in frames.iter().enumerate() {
            let ctx = ModeContext::new(&params, &themes, tick as f32 / 60.0);
            a.render(frame, &ctx, &mut surface_a);
            b.render(frame, &ctx, &mut surface_b);
        }
        assert_eq!(log_a.take(), log_b.take(), "{} diverged with the same seed", kind);
    }
}

#[test]
fn test_persistent_state_stays_bounded() {
    let loud = FrequencyFrame::filled(128, 255).unwrap();
    let themes = ThemeCatalog::builtin();

    for kind in ModeKind::all() {
        let params = params(*kind);
        let mut mode = create_mode(*kind, 3);
        let mut surface = RecordingSurface::new(WIDTH, HEIGHT);
        let log = surface.log();

        let mut sizes = Vec::new();
        for tick in 0..300 {
            let ctx = ModeContext::new(&params, &themes, tick as f32 / 60.0);
            mode.render(&loud, &ctx, &mut surface);
            log.take();
            sizes.push(mode.state_len());
        }
        let first = sizes[0];
        assert!(
            sizes.iter().all(|&n| n == first),
            "{} grew its state from {} to {:?}",
            kind,
            first,
            sizes.iter().max()
        );
        assert_eq!(mode.state_points().len(), mode.state_len());
    }
}

// ==================== Scenario: Silent Bars ====================

#[test]
fn test_silent_bars_draw_no_geometry() {
    let silent = FrequencyFrame::silent(256).unwrap();
    assert!(run(ModeKind::Bar, &silent, 1, 0).is_empty());
}

#[test]
fn test_bar_height_grows_with_level() {
    let bar_heights = |value: u8| -> f32 {
        run(ModeKind::Bar, &FrequencyFrame::filled(256, value).unwrap(), 1, 0)
            .iter()
            .filter_map(|command| match command {
                DrawCommand::FillRect { rect, .. } => Some(rect.height),
                _ => None,
            })
            .fold(0.0, f32::max)
    };
    assert!(bar_heights(64) < bar_heights(128));
    assert!(bar_heights(128) < bar_heights(255));
}

// ==================== Theme Resolution ====================

#[test]
fn test_neon_midpoint_resolves_to_middle_knot() {
    let themes = ThemeCatalog::builtin();
    let params = RenderParameters {
        color_theme: "neon".into(),
        ..Default::default()
    };
    let ctx = ModeContext::new(&params, &themes, 0.0);
    assert_eq!(ctx.color(0.5), Rgb::new(0x83, 0x38, 0xec));
    assert_eq!(ctx.color(0.0), Rgb::new(0xff, 0x00, 0x6e));
    assert_eq!(ctx.color(1.0), Rgb::new(0x3a, 0x86, 0xff));
}

#[test]
fn test_every_theme_hits_its_end_knots() {
    let themes = ThemeCatalog::builtin();
    for name in themes.names() {
        let colors = themes.palette(name).colors();
        assert_eq!(themes.resolve(name, 0.0), colors[0], "theme {name}");
        assert_eq!(themes.resolve(name, 1.0), colors[colors.len() - 1], "theme {name}");
        assert_eq!(themes.resolve(name, -3.0), colors[0], "theme {name}");
        assert_eq!(themes.resolve(name, 7.5), colors[colors.len() - 1], "theme {name}");
    }
}

#[test]
fn test_layer_colors_repeat_every_palette_length() {
    let themes = ThemeCatalog::builtin();
    for name in themes.names() {
        let len = themes.palette(name).len();
        for i in 0..3 * len {
            assert_eq!(
                themes.resolve_layer(name, i),
                themes.resolve_layer(name, i + len),
                "theme {name} layer {i}"
            );
            assert_eq!(themes.resolve_layer(name, i), themes.palette(name).colors()[i % len]);
        }
    }
}

#[test]
fn test_channels_move_monotonically_between_knots() {
    const STEPS: usize = 64;
    let themes = ThemeCatalog::builtin();
    for name in themes.names() {
        let colors = themes.palette(name).colors();
        let segments = colors.len() - 1;
        for k in 0..segments {
            let (from, to) = (colors[k], colors[k + 1]);
            let samples: Vec<Rgb> = (0..=STEPS)
                .map(|j| themes.resolve(name, (k as f32 + j as f32 / STEPS as f32) / segments as f32))
                .collect();
            let channels: [fn(Rgb) -> u8; 3] = [|c| c.r, |c| c.g, |c| c.b];
            for channel in channels {
                let rising = channel(to) >= channel(from);
                for pair in samples.windows(2) {
                    let (a, b) = (channel(pair[0]), channel(pair[1]));
                    assert!(
                        if rising { a <= b } else { a >= b },
                        "theme {name} segment {k}: {a} then {b}"
                    );
                }
            }
        }
    }
}

#[test]
fn test_unknown_theme_layers_fall_back_to_default() {
    let themes = ThemeCatalog::builtin();
    for i in 0..6 {
        assert_eq!(themes.resolve_layer("no-such-theme", i), themes.resolve_layer("neon", i));
    }
}

#[test]
fn test_unknown_theme_falls_back_to_default() {
    let themes = ThemeCatalog::builtin();
    let unknown = RenderParameters {
        color_theme: "no-such-theme".into(),
        ..Default::default()
    };
    let neon = RenderParameters {
        color_theme: "neon".into(),
        ..Default::default()
    };
    let a = ModeContext::new(&unknown, &themes, 0.0);
    let b = ModeContext::new(&neon, &themes, 0.0);
    for t in [0.0, 0.25, 0.7, 1.0] {
        assert_eq!(a.color(t), b.color(t));
    }
}

#[test]
fn test_builtin_catalog_has_every_theme() {
    let themes = ThemeCatalog::builtin();
    assert_eq!(themes.len(), 33);
    for name in themes.names() {
        assert!(!themes.palette(name).is_empty());
    }
}
