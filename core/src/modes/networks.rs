//! Modes built from a fixed set of persistent nodes or columns.

use rand::rngs::StdRng;
use rand::Rng;

use super::{stroke_line, ModeContext, ModeKind, RenderMode};
use crate::audio::FrequencyFrame;
use crate::render::{GradientStop, Paint, Path, Point, Surface};

struct Neuron {
    pos: Point,
    /// Indices of later neurons this one links to.
    links: Vec<usize>,
}

/// A random graph whose nodes swell and links thicken with their bins.
pub struct NeuralMode {
    rng: StdRng,
    nodes: Vec<Neuron>,
}

const NEURAL_NODES: usize = 20;
const NEURAL_LINK_CHANCE: f32 = 0.3;

impl NeuralMode {
    pub fn new(rng: StdRng) -> Self {
        Self {
            rng,
            nodes: Vec::new(),
        }
    }

    fn seed_graph(&mut self, width: f32, height: f32) {
        let rng = &mut self.rng;
        let mut nodes: Vec<Neuron> = (0..NEURAL_NODES)
            .map(|_| Neuron {
                pos: Point::new(rng.gen::<f32>() * width, rng.gen::<f32>() * height),
                links: Vec::new(),
            })
            .collect();
        for (i, node) in nodes.iter_mut().enumerate() {
            node.links = ((i + 1)..NEURAL_NODES)
                .filter(|_| rng.gen::<f32>() < NEURAL_LINK_CHANCE)
                .collect();
        }
        self.nodes = nodes;
    }
}

impl RenderMode for NeuralMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Neural
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        if self.nodes.is_empty() {
            self.seed_graph(surface.width() as f32, surface.height() as f32);
        }

        let n = frame.len();
        let level = |index: usize| frame.intensity(index * n / NEURAL_NODES, ctx.sensitivity());

        for (index, node) in self.nodes.iter().enumerate() {
            let intensity = level(index);
            let color = ctx.color(intensity);

            for &target in &node.links {
                let link = (intensity + level(target)) / 2.0;
                stroke_line(surface, node.pos, self.nodes[target].pos, color.with_alpha(link * 0.5), link * 3.0);
            }

            let radius = 5.0 + intensity * 15.0;
            let paint = Paint::radial(
                node.pos,
                0.0,
                radius,
                vec![
                    GradientStop::new(0.0, color.lighten(100)),
                    GradientStop::new(1.0, color.with_alpha(intensity)),
                ],
            );
            surface.fill_path(&Path::circle(node.pos, radius), &paint);
        }
    }

    fn state_len(&self) -> usize {
        self.nodes.len()
    }

    fn state_points(&self) -> Vec<Point> {
        self.nodes.iter().map(|n| n.pos).collect()
    }
}

struct Glyph {
    ch: char,
    y: f32,
    age: u32,
}

struct RainColumn {
    x: f32,
    y: f32,
    glyphs: Vec<Glyph>,
}

/// Falling columns of Hangul syllables, faster and denser when loud.
pub struct MatrixRainMode {
    rng: StdRng,
    columns: Vec<RainColumn>,
}

const RAIN_COLUMNS: usize = 60;
const GLYPH_LIFETIME: u32 = 60;
const HANGUL_FIRST: u32 = 0xAC00;
const HANGUL_LAST: u32 = 0xD7A3;

impl MatrixRainMode {
    pub fn new(rng: StdRng) -> Self {
        Self {
            rng,
            columns: Vec::new(),
        }
    }
}

impl RenderMode for MatrixRainMode {
    fn kind(&self) -> ModeKind {
        ModeKind::MatrixRain
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let width = surface.width() as f32;
        let height = surface.height() as f32;
        let column_width = width / RAIN_COLUMNS as f32;
        if self.columns.is_empty() {
            let rng = &mut self.rng;
            self.columns = (0..RAIN_COLUMNS)
                .map(|col| RainColumn {
                    x: col as f32 * column_width + column_width / 2.0,
                    y: rng.gen::<f32>() * height,
                    glyphs: Vec::new(),
                })
                .collect();
        }

        let n = frame.len();
        for (col, column) in self.columns.iter_mut().enumerate() {
            let intensity = frame.intensity(col * n / RAIN_COLUMNS, ctx.sensitivity());
            let color = ctx.color(intensity);

            column.y += 2.0 + intensity * 15.0;
            if column.y > height + 50.0 {
                column.y = -50.0;
                column.glyphs.clear();
            }

            if self.rng.gen::<f32>() < intensity * 0.3 {
                let code = self.rng.gen_range(HANGUL_FIRST..=HANGUL_LAST);
                if let Some(ch) = char::from_u32(code) {
                    column.glyphs.push(Glyph { ch, y: column.y, age: 0 });
                }
            }

            let size = 12.0 + intensity * 10.0;
            let last = column.glyphs.len().saturating_sub(1);
            for (index, glyph) in column.glyphs.iter_mut().enumerate() {
                glyph.age += 1;
                let alpha = (1.0 - glyph.age as f32 / GLYPH_LIFETIME as f32).max(0.0);
                if alpha <= 0.0 {
                    continue;
                }

                let mut paint = Paint::solid(color.with_alpha(alpha));
                if index == last && intensity > 0.5 {
                    paint = paint.with_glow(10.0, color);
                }
                surface.fill_text(glyph.ch.encode_utf8(&mut [0; 4]), Point::new(column.x, glyph.y), size, &paint);
            }

            column.glyphs.retain(|g| g.age < GLYPH_LIFETIME);
        }
    }

    fn state_len(&self) -> usize {
        self.columns.len()
    }

    fn state_points(&self) -> Vec<Point> {
        self.columns.iter().map(|d| Point::new(d.x, d.y)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ThemeCatalog;
    use crate::modes::RenderParameters;
    use crate::render::{DrawCommand, RecordingSurface};
    use rand::SeedableRng;

    fn render_ticks(mode: &mut dyn RenderMode, frame: &FrequencyFrame, ticks: usize) -> Vec<DrawCommand> {
        let params = RenderParameters::default();
        let themes = ThemeCatalog::builtin();
        let mut surface = RecordingSurface::new(1280, 720);
        let log = surface.log();
        for tick in 0..ticks {
            log.take();
            let ctx = ModeContext::new(&params, &themes, tick as f32 / 60.0);
            mode.render(frame, &ctx, &mut surface);
        }
        log.take()
    }

    #[test]
    fn test_silent_network_draws_only_nodes() {
        let frame = FrequencyFrame::silent(256).unwrap();
        let mut mode = NeuralMode::new(StdRng::seed_from_u64(5));
        let commands = render_ticks(&mut mode, &frame, 1);
        assert_eq!(commands.len(), NEURAL_NODES);
        assert!(commands.iter().all(|c| matches!(c, DrawCommand::FillPath { .. })));
    }

    #[test]
    fn test_loud_network_draws_every_link() {
        let frame = FrequencyFrame::filled(256, 255).unwrap();
        let mut mode = NeuralMode::new(StdRng::seed_from_u64(5));
        let commands = render_ticks(&mut mode, &frame, 1);
        let links: usize = mode.nodes.iter().map(|n| n.links.len()).sum();
        let strokes = commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::StrokePath { .. }))
            .count();
        assert_eq!(strokes, links);
        assert!(mode
            .nodes
            .iter()
            .enumerate()
            .all(|(i, n)| n.links.iter().all(|&j| j > i)));
    }

    #[test]
    fn test_graph_survives_between_ticks() {
        let frame = FrequencyFrame::filled(256, 128).unwrap();
        let mut mode = NeuralMode::new(StdRng::seed_from_u64(8));
        render_ticks(&mut mode, &frame, 1);
        let before = mode.state_points();
        render_ticks(&mut mode, &frame, 3);
        assert_eq!(mode.state_points(), before);
    }

    #[test]
    fn test_silent_rain_draws_nothing() {
        let frame = FrequencyFrame::silent(256).unwrap();
        let mut mode = MatrixRainMode::new(StdRng::seed_from_u64(1));
        assert!(render_ticks(&mut mode, &frame, 30).is_empty());
        assert_eq!(mode.state_len(), RAIN_COLUMNS);
    }

    #[test]
    fn test_rain_glyphs_are_hangul_and_expire() {
        let frame = FrequencyFrame::filled(256, 255).unwrap();
        let mut mode = MatrixRainMode::new(StdRng::seed_from_u64(3));
        let commands = render_ticks(&mut mode, &frame, 400);
        assert!(!commands.is_empty());
        for command in &commands {
            let DrawCommand::FillText { text, .. } = command else {
                panic!("expected text");
            };
            let ch = text.chars().next().unwrap() as u32;
            assert!((HANGUL_FIRST..=HANGUL_LAST).contains(&ch));
        }
        for column in &mode.columns {
            assert!(column.glyphs.len() <= GLYPH_LIFETIME as usize);
            assert!(column.glyphs.iter().all(|g| g.age < GLYPH_LIFETIME));
            assert!(column.y >= -50.0 && column.y <= 720.0 + 50.0 + 17.0);
        }
    }
}
