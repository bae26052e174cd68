//! CPU tessellation of canvas primitives into colored triangles
//!
//! Paths are clipped against the current clip rectangle (Sutherland–Hodgman), triangulated by
//! ear clipping, and colored per vertex. Gradient paints are approximated by subdividing each
//! triangle until its edges are short enough for linear interpolation to follow the stops.
//! Consecutive primitives with the same blend mode share a batch.

use crate::canvas::{BlendMode, Canvas2D, Color, Paint, Path, Rect, Stroke, TextLabel};
use common::Vertex;
use glam::Vec2;

/// Longest triangle edge, in scene pixels, for gradient fills
const GRADIENT_STEP: f32 = 12.0;
/// Subdivision limit per triangle (4^depth pieces)
const MAX_SUBDIVISION: u32 = 4;

/// Triangles sharing one blend mode, in draw order
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub blend: BlendMode,
    pub vertices: Vec<Vertex>,
}

/// A [`Canvas2D`] producing GPU-ready vertex batches
#[derive(Debug, Clone)]
pub struct Tessellator {
    size: Vec2,
    clear_color: Color,
    batches: Vec<Batch>,
    labels: Vec<TextLabel>,
    clips: Vec<Rect>,
    blend: BlendMode,
}

impl Tessellator {
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            clear_color: Color::BLACK,
            batches: Vec::new(),
            labels: Vec::new(),
            clips: Vec::new(),
            blend: BlendMode::Normal,
        }
    }

    pub fn set_size(&mut self, size: Vec2) {
        self.size = size;
    }

    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    pub fn labels(&self) -> &[TextLabel] {
        &self.labels
    }

    pub fn vertex_count(&self) -> usize {
        self.batches.iter().map(|b| b.vertices.len()).sum()
    }

    fn clip(&self) -> Option<Rect> {
        self.clips.last().copied()
    }

    fn emit(&mut self, triangles: &[[Vec2; 3]], paint: &Paint) {
        if triangles.is_empty() {
            return;
        }
        let blend = self.blend;
        if self.batches.last().map(|b| b.blend) != Some(blend) {
            self.batches.push(Batch {
                blend,
                vertices: Vec::new(),
            });
        }
        let Some(batch) = self.batches.last_mut() else {
            return;
        };
        for tri in triangles {
            if paint.is_solid() {
                let color = paint.sample(tri[0]).to_array();
                batch
                    .vertices
                    .extend(tri.iter().map(|p| Vertex::new([p.x, p.y, 0.0], color)));
            } else {
                subdivide(*tri, paint, 0, &mut batch.vertices);
            }
        }
    }

    fn fill_polygon(&mut self, points: &[Vec2], paint: &Paint) {
        let clipped;
        let points = match self.clip() {
            Some(rect) => {
                clipped = clip_polygon(points, &rect);
                clipped.as_slice()
            }
            None => points,
        };
        let triangles = triangulate(points);
        self.emit(&triangles, paint);
    }
}

impl Canvas2D for Tessellator {
    fn size(&self) -> Vec2 {
        self.size
    }

    /// Starts a new frame: batches, labels and clips are discarded
    fn clear(&mut self, color: Color) {
        self.clear_color = color;
        self.batches.clear();
        self.labels.clear();
        self.clips.clear();
        self.blend = BlendMode::Normal;
    }

    fn fill_path(&mut self, path: &Path, paint: &Paint) {
        if path.points().len() < 3 || paint.max_alpha() <= 0.0 {
            return;
        }
        self.fill_polygon(path.points(), paint);
    }

    fn stroke_path(&mut self, path: &Path, paint: &Paint, stroke: &Stroke) {
        if stroke.width <= 0.0 || paint.max_alpha() <= 0.0 {
            return;
        }
        let mut points = path.points().to_vec();
        if path.is_closed() {
            if let Some(first) = points.first().copied() {
                points.push(first);
            }
        }
        for (a, b) in dash_segments(&points, stroke.dash) {
            let Some(dir) = (b - a).try_normalize() else {
                continue;
            };
            let n = dir.perp() * stroke.width * 0.5;
            self.fill_polygon(&[a - n, b - n, b + n, a + n], paint);
        }
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
        self.labels.push(label);
    }
}

fn subdivide(tri: [Vec2; 3], paint: &Paint, depth: u32, out: &mut Vec<Vertex>) {
    let [a, b, c] = tri;
    let longest = a.distance(b).max(b.distance(c)).max(c.distance(a));
    if longest <= GRADIENT_STEP || depth >= MAX_SUBDIVISION {
        out.extend(tri.iter().map(|p| Vertex::new([p.x, p.y, 0.0], paint.sample(*p).to_array())));
        return;
    }
    let (ab, bc, ca) = ((a + b) * 0.5, (b + c) * 0.5, (c + a) * 0.5);
    for piece in [[a, ab, ca], [ab, b, bc], [ca, bc, c], [ab, bc, ca]] {
        subdivide(piece, paint, depth + 1, out);
    }
}

/// Split a polyline into the "on" pieces of a dash pattern
fn dash_segments(points: &[Vec2], dash: Option<[f32; 2]>) -> Vec<(Vec2, Vec2)> {
    let segments = points.windows(2).map(|w| (w[0], w[1]));
    let Some([on, off]) = dash.filter(|[on, off]| *on > 0.0 && *off >= 0.0) else {
        return segments.collect();
    };

    let mut out = Vec::new();
    // Position within the current on+off period
    let mut phase = 0.0;
    for (a, b) in segments {
        let length = a.distance(b);
        let mut t = 0.0;
        while t < length {
            let (in_on, left) = if phase < on {
                (true, on - phase)
            } else {
                (false, on + off - phase)
            };
            let step = left.min(length - t);
            if in_on {
                out.push((a.lerp(b, t / length), a.lerp(b, (t + step) / length)));
            }
            t += step;
            phase += step;
            if phase >= on + off - 1e-4 {
                phase = 0.0;
            }
        }
    }
    out
}

fn signed_area(points: &[Vec2]) -> f32 {
    let n = points.len();
    (0..n)
        .map(|i| points[i].perp_dot(points[(i + 1) % n]))
        .sum::<f32>()
        * 0.5
}

fn is_convex(points: &[Vec2], sign: f32) -> bool {
    let n = points.len();
    (0..n).all(|i| {
        let (a, b, c) = (points[i], points[(i + 1) % n], points[(i + 2) % n]);
        (b - a).perp_dot(c - b) * sign >= 0.0
    })
}

fn in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    let d1 = (b - a).perp_dot(p - a);
    let d2 = (c - b).perp_dot(p - b);
    let d3 = (a - c).perp_dot(p - c);
    let negative = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let positive = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(negative && positive)
}

/// Triangulate a simple polygon; convex input takes a plain fan
fn triangulate(points: &[Vec2]) -> Vec<[Vec2; 3]> {
    let n = points.len();
    if n < 3 {
        return Vec::new();
    }
    let area = signed_area(points);
    if area.abs() <= f32::EPSILON {
        return Vec::new();
    }
    let sign = area.signum();
    if is_convex(points, sign) {
        return (1..n - 1).map(|i| [points[0], points[i], points[i + 1]]).collect();
    }

    let mut remaining: Vec<usize> = (0..n).collect();
    let mut triangles = Vec::with_capacity(n - 2);
    while remaining.len() > 3 {
        let m = remaining.len();
        let ear = (0..m).find(|&i| {
            let (ia, ib, ic) = (remaining[(i + m - 1) % m], remaining[i], remaining[(i + 1) % m]);
            let (a, b, c) = (points[ia], points[ib], points[ic]);
            if (b - a).perp_dot(c - b) * sign <= 0.0 {
                return false;
            }
            !remaining
                .iter()
                .filter(|&&j| j != ia && j != ib && j != ic)
                .any(|&j| in_triangle(points[j], a, b, c))
        });
        match ear {
            Some(i) => {
                let m = remaining.len();
                triangles.push([
                    points[remaining[(i + m - 1) % m]],
                    points[remaining[i]],
                    points[remaining[(i + 1) % m]],
                ]);
                remaining.remove(i);
            }
            // Self-intersecting or degenerate leftovers: fan what is left
            None => break,
        }
    }
    for i in 1..remaining.len().saturating_sub(1) {
        triangles.push([points[remaining[0]], points[remaining[i]], points[remaining[i + 1]]]);
    }
    triangles
}

/// Sutherland–Hodgman clip of a polygon against an axis-aligned rectangle
fn clip_polygon(points: &[Vec2], rect: &Rect) -> Vec<Vec2> {
    let edges: [(fn(Vec2, &Rect) -> bool, fn(Vec2, Vec2, &Rect) -> Vec2); 4] = [
        (|p, r| p.x >= r.min.x, |a, b, r| cut_x(a, b, r.min.x)),
        (|p, r| p.x <= r.max.x, |a, b, r| cut_x(a, b, r.max.x)),
        (|p, r| p.y >= r.min.y, |a, b, r| cut_y(a, b, r.min.y)),
        (|p, r| p.y <= r.max.y, |a, b, r| cut_y(a, b, r.max.y)),
    ];

    let mut output = points.to_vec();
    for (inside, cut) in edges {
        let input = std::mem::take(&mut output);
        let Some(&last) = input.last() else {
            break;
        };
        let mut prev = last;
        for &p in &input {
            match (inside(p, rect), inside(prev, rect)) {
                (true, true) => output.push(p),
                (true, false) => {
                    output.push(cut(prev, p, rect));
                    output.push(p);
                }
                (false, true) => output.push(cut(prev, p, rect)),
                (false, false) => {}
            }
            prev = p;
        }
    }
    output
}

fn cut_x(a: Vec2, b: Vec2, x: f32) -> Vec2 {
    let t = (x - a.x) / (b.x - a.x);
    Vec2::new(x, a.y + (b.y - a.y) * t)
}

fn cut_y(a: Vec2, b: Vec2, y: f32) -> Vec2 {
    let t = (y - a.y) / (b.y - a.y);
    Vec2::new(a.x + (b.x - a.x) * t, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(triangles: &[[Vec2; 3]]) -> f32 {
        triangles
            .iter()
            .map(|[a, b, c]| ((*b - *a).perp_dot(*c - *a) * 0.5).abs())
            .sum()
    }

    fn positions(t: &Tessellator) -> Vec<Vec2> {
        t.batches()
            .iter()
            .flat_map(|b| b.vertices.iter().map(|v| Vec2::new(v.position[0], v.position[1])))
            .collect()
    }

    #[test]
    fn test_solid_rect_is_two_triangles() {
        let mut t = Tessellator::new(Vec2::new(100.0, 100.0));
        t.fill_rect(Rect::new(10.0, 10.0, 20.0, 20.0), &Paint::solid(Color::WHITE));
        assert_eq!(t.vertex_count(), 6);
    }

    #[test]
    fn test_concave_polygon_keeps_its_area() {
        let l_shape = [
            Vec2::new(0.0, 0.0),
            Vec2::new(20.0, 0.0),
            Vec2::new(20.0, 10.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(10.0, 20.0),
            Vec2::new(0.0, 20.0),
        ];
        let triangles = triangulate(&l_shape);
        assert_eq!(triangles.len(), 4);
        assert!((area(&triangles) - 300.0).abs() < 1e-3);
    }

    #[test]
    fn test_clip_confines_vertices() {
        let mut t = Tessellator::new(Vec2::new(100.0, 100.0));
        let clip = Rect::new(20.0, 20.0, 30.0, 30.0);
        t.push_clip(clip);
        t.fill_circle(Vec2::new(20.0, 20.0), 15.0, &Paint::solid(Color::WHITE));
        t.fill_rect(Rect::new(80.0, 80.0, 5.0, 5.0), &Paint::solid(Color::WHITE));
        t.pop_clip();

        let points = positions(&t);
        assert!(!points.is_empty());
        assert!(points.iter().all(|p| clip.inset(-1e-3).contains(*p)));
    }

    #[test]
    fn test_blend_switch_starts_new_batch() {
        let mut t = Tessellator::new(Vec2::new(100.0, 100.0));
        let white = Paint::solid(Color::WHITE);
        t.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), &white);
        t.fill_rect(Rect::new(20.0, 0.0, 10.0, 10.0), &white);
        t.set_blend_mode(BlendMode::Additive);
        t.fill_rect(Rect::new(40.0, 0.0, 10.0, 10.0), &white);
        t.set_blend_mode(BlendMode::Normal);
        t.fill_rect(Rect::new(60.0, 0.0, 10.0, 10.0), &white);

        let blends: Vec<_> = t.batches().iter().map(|b| b.blend).collect();
        assert_eq!(blends, vec![BlendMode::Normal, BlendMode::Additive, BlendMode::Normal]);
        assert_eq!(t.batches()[0].vertices.len(), 12);
    }

    #[test]
    fn test_dashes_split_the_stroke() {
        let mut t = Tessellator::new(Vec2::new(200.0, 100.0));
        let line = Path::line(Vec2::new(0.0, 50.0), Vec2::new(100.0, 50.0));
        t.stroke_path(&line, &Paint::solid(Color::WHITE), &Stroke::dashed(2.0, 10.0, 10.0));
        // Five dashes, one quad each
        assert_eq!(t.vertex_count(), 5 * 6);
    }

    #[test]
    fn test_gradient_is_sampled_per_vertex() {
        let mut t = Tessellator::new(Vec2::new(100.0, 100.0));
        let paint = Paint::linear(
            Vec2::new(0.0, 0.0),
            Vec2::new(100.0, 0.0),
            &[(0.0, Color::BLACK), (1.0, Color::WHITE)],
        );
        t.fill_rect(Rect::new(0.0, 0.0, 100.0, 10.0), &paint);
        let batch = &t.batches()[0];
        assert!(batch.vertices.len() > 6);
        for v in &batch.vertices {
            assert!((v.color[0] - v.position[0] / 100.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_clear_starts_a_frame() {
        let mut t = Tessellator::new(Vec2::new(100.0, 100.0));
        t.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), &Paint::solid(Color::WHITE));
        t.text(Vec2::ZERO, "hello", Color::WHITE, 12.0);
        t.push_clip(Rect::new(0.0, 0.0, 1.0, 1.0));
        t.clear(Color::hex("#102030"));

        assert_eq!(t.vertex_count(), 0);
        assert!(t.labels().is_empty());
        assert_eq!(t.clear_color(), Color::hex("#102030"));
        t.fill_rect(Rect::new(50.0, 50.0, 10.0, 10.0), &Paint::solid(Color::WHITE));
        assert_eq!(t.vertex_count(), 6);
    }

    #[test]
    fn test_invisible_paint_emits_nothing() {
        let mut t = Tessellator::new(Vec2::new(100.0, 100.0));
        t.fill_circle(Vec2::splat(50.0), 10.0, &Paint::solid(Color::TRANSPARENT));
        t.line(Vec2::ZERO, Vec2::ONE, Color::WHITE, 0.0);
        assert_eq!(t.vertex_count(), 0);
    }
}
