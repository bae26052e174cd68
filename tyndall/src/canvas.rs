//! 2D drawing interface used by the scene renderers
//!
//! Scenes describe each frame as filled and stroked paths painted with solid colors or
//! gradients, inside an optional rectangular clip, in either normal or additive blending.
//! [`Canvas2D`] is the collaborator that receives those primitives; [`DrawList`] records them
//! for inspection and the tessellator turns them into GPU triangles.

use glam::Vec2;
use std::f32::consts::TAU;

/// Axis-aligned rectangle in scene pixels (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    /// Rectangle from its top-left corner and size
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            max: Vec2::new(x + width, y + height),
        }
    }

    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn clamp(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min, self.max)
    }

    /// Shrink (or grow, with a negative amount) on every side
    pub fn inset(&self, amount: f32) -> Self {
        Self::from_min_max(self.min + Vec2::splat(amount), self.max - Vec2::splat(amount))
    }

    pub fn translate(&self, offset: Vec2) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        (min.x <= max.x && min.y <= max.y).then_some(Rect { min, max })
    }
}

/// Straight (non-premultiplied) RGBA color, components in 0..1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 0.0 };
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };

    /// Color from 8-bit channels and a 0..1 alpha
    pub fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: a.clamp(0.0, 1.0),
        }
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    /// Parse `#rrggbb`; anything malformed yields opaque black
    pub fn hex(code: &str) -> Self {
        let digits = code.trim_start_matches('#');
        let channel = |i: usize| {
            digits
                .get(i..i + 2)
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .unwrap_or(0)
        };
        Self::rgb(channel(0), channel(2), channel(4))
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: if a.is_finite() { a.clamp(0.0, 1.0) } else { 0.0 },
            ..self
        }
    }

    /// Multiply the alpha channel
    pub fn fade(self, factor: f32) -> Self {
        self.with_alpha(self.a * factor)
    }

    pub fn lerp(self, other: Color, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// A color stop at `offset` (0..1) along a gradient
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Color,
}

/// How a path is colored
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Color),
    /// Gradient along the segment `start -> end`, constant across it
    Linear {
        start: Vec2,
        end: Vec2,
        stops: Vec<GradientStop>,
    },
    /// Gradient by distance from `center`, reaching the last stop at `radius`
    Radial {
        center: Vec2,
        radius: f32,
        stops: Vec<GradientStop>,
    },
}

impl Paint {
    pub fn solid(color: Color) -> Self {
        Paint::Solid(color)
    }

    pub fn linear(start: Vec2, end: Vec2, stops: &[(f32, Color)]) -> Self {
        Paint::Linear {
            start,
            end,
            stops: to_stops(stops),
        }
    }

    pub fn radial(center: Vec2, radius: f32, stops: &[(f32, Color)]) -> Self {
        Paint::Radial {
            center,
            radius,
            stops: to_stops(stops),
        }
    }

    pub fn is_solid(&self) -> bool {
        matches!(self, Paint::Solid(_))
    }

    /// Color of the paint at point `p`
    pub fn sample(&self, p: Vec2) -> Color {
        match self {
            Paint::Solid(color) => *color,
            Paint::Linear { start, end, stops } => {
                let axis = *end - *start;
                let len_sq = axis.length_squared();
                let t = if len_sq > f32::EPSILON {
                    (p - *start).dot(axis) / len_sq
                } else {
                    0.0
                };
                sample_stops(stops, t)
            }
            Paint::Radial {
                center,
                radius,
                stops,
            } => {
                let t = if *radius > f32::EPSILON {
                    p.distance(*center) / radius
                } else {
                    1.0
                };
                sample_stops(stops, t)
            }
        }
    }

    /// Strongest alpha anywhere in the paint
    pub fn max_alpha(&self) -> f32 {
        match self {
            Paint::Solid(color) => color.a,
            Paint::Linear { stops, .. } | Paint::Radial { stops, .. } => {
                stops.iter().map(|s| s.color.a).fold(0.0, f32::max)
            }
        }
    }
}

fn to_stops(stops: &[(f32, Color)]) -> Vec<GradientStop> {
    stops
        .iter()
        .map(|&(offset, color)| GradientStop {
            offset: offset.clamp(0.0, 1.0),
            color,
        })
        .collect()
}

fn sample_stops(stops: &[GradientStop], t: f32) -> Color {
    let Some(first) = stops.first() else {
        return Color::TRANSPARENT;
    };
    if t <= first.offset {
        return first.color;
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.offset {
            let span = b.offset - a.offset;
            let local = if span > f32::EPSILON { (t - a.offset) / span } else { 1.0 };
            return a.color.lerp(b.color, local);
        }
    }
    stops[stops.len() - 1].color
}

/// A flattened polyline or polygon
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    points: Vec<Vec2>,
    closed: bool,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn polygon(points: Vec<Vec2>) -> Self {
        Self {
            points,
            closed: true,
        }
    }

    pub fn polyline(points: Vec<Vec2>) -> Self {
        Self {
            points,
            closed: false,
        }
    }

    pub fn line(from: Vec2, to: Vec2) -> Self {
        Self::polyline(vec![from, to])
    }

    pub fn rect(rect: Rect) -> Self {
        Self::polygon(vec![
            rect.min,
            Vec2::new(rect.max.x, rect.min.y),
            rect.max,
            Vec2::new(rect.min.x, rect.max.y),
        ])
    }

    pub fn rounded_rect(rect: Rect, radius: f32) -> Self {
        let r = radius.min(rect.width() * 0.5).min(rect.height() * 0.5).max(0.0);
        if r <= 0.5 {
            return Self::rect(rect);
        }
        let corners = [
            (Vec2::new(rect.max.x - r, rect.min.y + r), -0.25),
            (Vec2::new(rect.max.x - r, rect.max.y - r), 0.0),
            (Vec2::new(rect.min.x + r, rect.max.y - r), 0.25),
            (Vec2::new(rect.min.x + r, rect.min.y + r), 0.5),
        ];
        let mut points = Vec::with_capacity(24);
        for (center, start) in corners {
            for i in 0..=5 {
                let angle = (start + 0.25 * i as f32 / 5.0) * TAU;
                points.push(center + Vec2::new(angle.cos(), angle.sin()) * r);
            }
        }
        Self::polygon(points)
    }

    pub fn circle(center: Vec2, radius: f32) -> Self {
        Self::ellipse(center, Vec2::splat(radius))
    }

    pub fn ellipse(center: Vec2, radii: Vec2) -> Self {
        let segments = ((radii.max_element() * 0.75) as usize).clamp(12, 64);
        Self::arc(center, radii, 0.0, TAU, segments, true)
    }

    /// Elliptical arc from `start` to `end` radians; a closed arc is a pie slice when partial
    pub fn arc(
        center: Vec2,
        radii: Vec2,
        start: f32,
        end: f32,
        segments: usize,
        closed: bool,
    ) -> Self {
        let segments = segments.max(2);
        let full = (end - start).abs() >= TAU - 1e-4;
        let count = if full { segments } else { segments + 1 };
        let mut points: Vec<Vec2> = (0..count)
            .map(|i| {
                let angle = start + (end - start) * i as f32 / segments as f32;
                center + Vec2::new(angle.cos() * radii.x, angle.sin() * radii.y)
            })
            .collect();
        if closed && !full {
            points.push(center);
        }
        Self { points, closed }
    }

    /// Quadratic Bézier from `from` through control `ctrl` to `to`, flattened
    pub fn quadratic(from: Vec2, ctrl: Vec2, to: Vec2, segments: usize) -> Self {
        let segments = segments.max(1);
        let points = (0..=segments)
            .map(|i| {
                let t = i as f32 / segments as f32;
                let u = 1.0 - t;
                from * (u * u) + ctrl * (2.0 * u * t) + to * (t * t)
            })
            .collect();
        Self::polyline(points)
    }

    /// Cubic Bézier with controls `c1` and `c2`, flattened
    pub fn cubic(from: Vec2, c1: Vec2, c2: Vec2, to: Vec2, segments: usize) -> Self {
        let segments = segments.max(1);
        let points = (0..=segments)
            .map(|i| {
                let t = i as f32 / segments as f32;
                let u = 1.0 - t;
                from * (u * u * u) + c1 * (3.0 * u * u * t) + c2 * (3.0 * u * t * t) + to * (t * t * t)
            })
            .collect();
        Self::polyline(points)
    }

    /// Append another path's points
    pub fn extend(mut self, other: &Path) -> Self {
        self.points.extend_from_slice(&other.points);
        self
    }

    pub fn close(mut self) -> Self {
        self.closed = true;
        self
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn bounds(&self) -> Option<Rect> {
        let first = *self.points.first()?;
        let (min, max) = self
            .points
            .iter()
            .fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p)));
        Some(Rect { min, max })
    }
}

/// Stroke style; `dash` is an `[on, off]` pattern in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub width: f32,
    pub dash: Option<[f32; 2]>,
}

impl Stroke {
    pub fn new(width: f32) -> Self {
        Self { width, dash: None }
    }

    pub fn dashed(width: f32, on: f32, off: f32) -> Self {
        Self {
            width,
            dash: Some([on, off]),
        }
    }
}

/// Compositing mode for subsequent primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Source-over alpha blending
    #[default]
    Normal,
    /// Additive ("lighter") blending used for light
    Additive,
}

/// Text drawn centred on `position`
#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    pub position: Vec2,
    pub text: String,
    pub color: Color,
    pub size: f32,
}

impl TextLabel {
    pub fn new(position: Vec2, text: impl Into<String>, color: Color, size: f32) -> Self {
        Self {
            position,
            text: text.into(),
            color,
            size,
        }
    }
}

/// Immediate-mode 2D drawing surface
pub trait Canvas2D {
    /// Drawable area in scene pixels
    fn size(&self) -> Vec2;
    fn clear(&mut self, color: Color);
    fn fill_path(&mut self, path: &Path, paint: &Paint);
    fn stroke_path(&mut self, path: &Path, paint: &Paint, stroke: &Stroke);
    /// Restrict drawing to `rect` intersected with the current clip
    fn push_clip(&mut self, rect: Rect);
    fn pop_clip(&mut self);
    fn set_blend_mode(&mut self, mode: BlendMode);
    fn label(&mut self, label: TextLabel);

    fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
        self.fill_path(&Path::rect(rect), paint);
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, paint: &Paint) {
        if radius > 0.0 {
            self.fill_path(&Path::circle(center, radius), paint);
        }
    }

    fn line(&mut self, from: Vec2, to: Vec2, color: Color, width: f32) {
        self.stroke_path(&Path::line(from, to), &Paint::Solid(color), &Stroke::new(width));
    }

    fn text(&mut self, position: Vec2, text: &str, color: Color, size: f32) {
        self.label(TextLabel::new(position, text, color, size));
    }
}

/// One recorded primitive
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    Fill {
        path: Path,
        paint: Paint,
        blend: BlendMode,
        clip: Option<Rect>,
    },
    Stroke {
        path: Path,
        paint: Paint,
        stroke: Stroke,
        blend: BlendMode,
        clip: Option<Rect>,
    },
    Label(TextLabel),
}

/// A [`Canvas2D`] that records every primitive it receives
#[derive(Debug, Clone)]
pub struct DrawList {
    size: Vec2,
    commands: Vec<DrawCommand>,
    clips: Vec<Rect>,
    blend: BlendMode,
}

impl DrawList {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            commands: Vec::new(),
            clips: Vec::new(),
            blend: BlendMode::Normal,
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn labels(&self) -> impl Iterator<Item = &TextLabel> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Label(label) => Some(label),
            _ => None,
        })
    }

    pub fn has_label(&self, text: &str) -> bool {
        self.labels().any(|l| l.text.contains(text))
    }

    /// Paints of all fills and strokes recorded under `blend`
    pub fn paints(&self, blend: BlendMode) -> impl Iterator<Item = &Paint> {
        self.commands.iter().filter_map(move |c| match c {
            DrawCommand::Fill { paint, blend: b, .. }
            | DrawCommand::Stroke { paint, blend: b, .. }
                if *b == blend =>
            {
                Some(paint)
            }
            _ => None,
        })
    }

    pub fn clip_depth(&self) -> usize {
        self.clips.len()
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
        self.clips.clear();
        self.blend = BlendMode::Normal;
    }
}

impl Canvas2D for DrawList {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn clear(&mut self, color: Color) {
        self.commands.push(DrawCommand::Clear(color));
    }

    fn fill_path(&mut self, path: &Path, paint: &Paint) {
        self.commands.push(DrawCommand::Fill {
            path: path.clone(),
            paint: paint.clone(),
            blend: self.blend,
            clip: self.clips.last().copied(),
        });
    }

    fn stroke_path(&mut self, path: &Path, paint: &Paint, stroke: &Stroke) {
        self.commands.push(DrawCommand::Stroke {
            path: path.clone(),
            paint: paint.clone(),
            stroke: *stroke,
            blend: self.blend,
            clip: self.clips.last().copied(),
        });
    }

    fn push_clip(&mut self, rect: Rect) {
        let clip = match self.clips.last() {
            Some(current) => current.intersect(&rect).unwrap_or(Rect {
                min: rect.min,
                max: rect.min,
            }),
            None => rect,
        };
        self.clips.push(clip);
    }

    fn pop_clip(&mut self) {
        self.clips.pop();
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend = mode;
    }

    fn label(&mut self, label: TextLabel) {
        self.commands.push(DrawCommand::Label(label));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_intersection() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        let i = a.intersect(&b).unwrap();
        assert_eq!(i, Rect::new(5.0, 5.0, 5.0, 5.0));
        assert!(a.intersect(&Rect::new(20.0, 20.0, 1.0, 1.0)).is_none());
    }

    #[test]
    fn test_linear_gradient_sampling() {
        let paint = Paint::linear(
            Vec2::ZERO,
            Vec2::new(10.0, 0.0),
            &[(0.0, Color::BLACK), (1.0, Color::WHITE)],
        );
        let mid = paint.sample(Vec2::new(5.0, 3.0));
        assert!((mid.r - 0.5).abs() < 1e-5);
        assert_eq!(paint.sample(Vec2::new(-5.0, 0.0)), Color::BLACK);
        assert_eq!(paint.sample(Vec2::new(50.0, 0.0)), Color::WHITE);
    }

    #[test]
    fn test_radial_gradient_fades_out() {
        let paint = Paint::radial(
            Vec2::ZERO,
            4.0,
            &[(0.0, Color::WHITE), (1.0, Color::TRANSPARENT)],
        );
        assert!((paint.sample(Vec2::ZERO).a - 1.0).abs() < 1e-6);
        assert!(paint.sample(Vec2::new(4.0, 0.0)).a < 1e-6);
        assert!((paint.max_alpha() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_hex_color() {
        let c = Color::hex("#ff8000");
        assert!((c.r - 1.0).abs() < 1e-6);
        assert!((c.g - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.b, 0.0);
        assert_eq!(Color::hex("zz"), Color::BLACK);
    }

    #[test]
    fn test_with_alpha_rejects_nan() {
        assert_eq!(Color::WHITE.with_alpha(f32::NAN).a, 0.0);
        assert_eq!(Color::WHITE.with_alpha(3.0).a, 1.0);
    }

    #[test]
    fn test_circle_path_is_closed() {
        let path = Path::circle(Vec2::new(5.0, 5.0), 3.0);
        assert!(path.is_closed());
        let bounds = path.bounds().unwrap();
        assert!((bounds.width() - 6.0).abs() < 0.1);
    }

    #[test]
    fn test_draw_list_nested_clip() {
        let mut list = DrawList::new(100.0, 100.0);
        list.push_clip(Rect::new(0.0, 0.0, 50.0, 50.0));
        list.push_clip(Rect::new(25.0, 25.0, 50.0, 50.0));
        list.fill_rect(Rect::new(0.0, 0.0, 100.0, 100.0), &Paint::solid(Color::WHITE));
        list.pop_clip();
        list.pop_clip();
        list.pop_clip();

        match &list.commands()[0] {
            DrawCommand::Fill { clip, .. } => {
                assert_eq!(*clip, Some(Rect::new(25.0, 25.0, 25.0, 25.0)));
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(list.clip_depth(), 0);
    }

    #[test]
    fn test_blend_mode_is_recorded() {
        let mut list = DrawList::new(10.0, 10.0);
        list.set_blend_mode(BlendMode::Additive);
        list.fill_circle(Vec2::ONE, 2.0, &Paint::solid(Color::WHITE));
        list.set_blend_mode(BlendMode::Normal);
        list.line(Vec2::ZERO, Vec2::ONE, Color::BLACK, 1.0);
        assert_eq!(list.paints(BlendMode::Additive).count(), 1);
        assert_eq!(list.paints(BlendMode::Normal).count(), 1);
    }
}
