use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::vertex::Vertex;

/// Segment count used by the harness (vertex count is one more).
pub const DEFAULT_SEGMENTS: u32 = 100_000;

/// Largest segment count whose x positions stay distinct in `f32`.
///
/// Steps are `2 / segments`; at `2^24` every x is a multiple of `2^-23`, which
/// `f32` still represents exactly across `[-1, 1]`.
pub const MAX_SEGMENTS: u32 = 1 << 24;

/// Largest y increment magnitude per step, before normalization.
const MAX_JITTER: f32 = 1.0;

/// A normalized random walk.
///
/// Invariants (established by [`PathGenerator`], the only constructor):
/// - `len() == segments + 1`
/// - x starts at `-1.0` and increases by `2 / segments` per vertex
/// - y spans exactly `[-1, 1]`, or is `0.0` everywhere when the walk is flat
/// - alpha is always `255`
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    vertices: Vec<Vertex>,
}

impl Path {
    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Vertex count as used by draw calls.
    ///
    /// Always fits: the generator caps segments at [`MAX_SEGMENTS`].
    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    /// Number of line segments a strip over this path produces.
    #[inline]
    pub fn segments(&self) -> usize {
        self.vertices.len().saturating_sub(1)
    }

    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Raw vertex bytes in GPU layout.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Returns `(min_y, max_y)`.
    pub fn y_range(&self) -> (f32, f32) {
        y_bounds(&self.vertices)
    }
}

/// Random-walk path generator.
#[derive(Debug, Clone)]
pub struct PathGenerator {
    segments: u32,
}

impl PathGenerator {
    /// Creates a generator producing `segments + 1` vertices per path.
    pub fn new(segments: u32) -> Result<Self> {
        anyhow::ensure!(segments > 0, "path needs at least one segment");
        anyhow::ensure!(
            segments <= MAX_SEGMENTS,
            "segment count {segments} exceeds {MAX_SEGMENTS}; x positions would collide in f32"
        );
        Ok(Self { segments })
    }

    #[inline]
    pub fn segments(&self) -> u32 {
        self.segments
    }

    /// Generates a new path from a freshly OS-seeded RNG.
    ///
    /// Every call reseeds; consecutive paths are unrelated.
    pub fn generate(&self) -> Path {
        let mut rng = StdRng::from_os_rng();
        let path = self.generate_with(&mut rng);
        log::debug!("generated path: {} vertices", path.len());
        path
    }

    /// Generates a path using the supplied RNG.
    pub fn generate_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Path {
        self.build(rng, |rng| rng.random_range(-MAX_JITTER..=MAX_JITTER))
    }

    fn build<R, J>(&self, rng: &mut R, jitter: J) -> Path
    where
        R: Rng + ?Sized,
        J: FnMut(&mut R) -> f32,
    {
        let mut vertices = walk(self.segments, rng, jitter);
        normalize_y(&mut vertices);
        Path { vertices }
    }
}

impl Default for PathGenerator {
    fn default() -> Self {
        Self { segments: DEFAULT_SEGMENTS }
    }
}

fn walk<R, J>(segments: u32, rng: &mut R, mut jitter: J) -> Vec<Vertex>
where
    R: Rng + ?Sized,
    J: FnMut(&mut R) -> f32,
{
    let n = segments as usize;
    // x is derived from the index, not accumulated, so the last vertex lands on +1.
    let step = 2.0 / f64::from(segments);

    let mut vertices = Vec::with_capacity(n + 1);
    let mut y = 0.0f32;
    vertices.push(Vertex::new(-1.0, y, random_color(rng)));

    for i in 1..=n {
        y += jitter(rng);
        let x = (-1.0 + i as f64 * step) as f32;
        vertices.push(Vertex::new(x, y, random_color(rng)));
    }

    vertices
}

fn random_color<R: Rng + ?Sized>(rng: &mut R) -> [u8; 4] {
    [rng.random(), rng.random(), rng.random(), 255]
}

fn y_bounds(vertices: &[Vertex]) -> (f32, f32) {
    vertices
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v.y()), hi.max(v.y()))
        })
}

/// Rescales y linearly so the minimum maps to `-1` and the maximum to `+1`.
///
/// A flat (or empty) input has no range to rescale; every y becomes `0.0`.
pub fn normalize_y(vertices: &mut [Vertex]) {
    let (min_y, max_y) = y_bounds(vertices);
    let range = max_y - min_y;

    if !(range > 0.0 && range.is_finite()) {
        for v in vertices.iter_mut() {
            v.pos[1] = 0.0;
        }
        return;
    }

    for v in vertices.iter_mut() {
        v.pos[1] = (v.pos[1] - min_y) / range * 2.0 - 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    fn generator(segments: u32) -> PathGenerator {
        PathGenerator::new(segments).unwrap()
    }

    // ── construction ──────────────────────────────────────────────────────

    #[test]
    fn zero_segments_rejected() {
        assert!(PathGenerator::new(0).is_err());
    }

    #[test]
    fn max_segments_rejected() {
        assert!(PathGenerator::new(u32::MAX).is_err());
    }

    #[test]
    fn segments_above_f32_resolution_rejected() {
        assert!(PathGenerator::new(MAX_SEGMENTS).is_ok());
        assert!(PathGenerator::new(MAX_SEGMENTS + 1).is_err());
        assert!(PathGenerator::new(40_000_000).is_err());
    }

    #[test]
    fn x_stays_strictly_increasing_at_max_segments() {
        let path = generator(MAX_SEGMENTS).generate_with(&mut seeded(1));
        let collisions = path
            .vertices()
            .windows(2)
            .filter(|w| w[1].x() <= w[0].x())
            .count();
        assert_eq!(collisions, 0);
        assert_eq!(path.vertices()[0].x(), -1.0);
        assert_eq!(path.vertices()[path.len() - 1].x(), 1.0);
    }

    #[test]
    fn default_uses_default_segments() {
        assert_eq!(PathGenerator::default().segments(), DEFAULT_SEGMENTS);
    }

    // ── x layout ──────────────────────────────────────────────────────────

    #[test]
    fn four_segments_exact_x() {
        let path = generator(4).generate_with(&mut seeded(7));
        let xs: Vec<f32> = path.vertices().iter().map(Vertex::x).collect();
        assert_eq!(xs, vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
        assert_eq!(path.y_range(), (-1.0, 1.0));
    }

    #[test]
    fn x_is_strictly_increasing_with_constant_step() {
        for segments in [1u32, 3, 10, 997, 10_000] {
            let path = generator(segments).generate_with(&mut seeded(u64::from(segments)));
            let v = path.vertices();
            let step = 2.0 / segments as f32;

            assert_eq!(path.len(), segments as usize + 1);
            assert_eq!(path.segments(), segments as usize);
            assert_eq!(v[0].x(), -1.0);
            assert!((v[v.len() - 1].x() - 1.0).abs() <= 1e-6);

            for pair in v.windows(2) {
                let dx = pair[1].x() - pair[0].x();
                assert!(dx > 0.0, "x must increase");
                assert!((dx - step).abs() <= 1e-5, "step {dx} != {step}");
            }
        }
    }

    #[test]
    fn default_size_path_ends_at_plus_one() {
        let path = PathGenerator::default().generate_with(&mut seeded(1));
        assert_eq!(path.len(), DEFAULT_SEGMENTS as usize + 1);
        assert_eq!(path.vertex_count(), DEFAULT_SEGMENTS + 1);
        let last = path.vertices()[path.len() - 1];
        assert!((last.x() - 1.0).abs() <= 1e-6);
    }

    // ── y normalization ───────────────────────────────────────────────────

    #[test]
    fn y_spans_exactly_unit_range() {
        for seed in 0..16 {
            let path = generator(256).generate_with(&mut seeded(seed));
            assert_eq!(path.y_range(), (-1.0, 1.0));
            assert!(path.vertices().iter().all(|v| (-1.0..=1.0).contains(&v.y())));
        }
    }

    #[test]
    fn single_segment_maps_to_endpoints() {
        // Two vertices with distinct y: one lands on -1, the other on +1.
        let path = generator(1).generate_with(&mut seeded(3));
        let mut ys: Vec<f32> = path.vertices().iter().map(Vertex::y).collect();
        ys.sort_by(f32::total_cmp);
        assert_eq!(ys, vec![-1.0, 1.0]);
    }

    #[test]
    fn zero_jitter_walk_is_flat_and_finite() {
        let path = generator(8).build(&mut seeded(5), |_| 0.0);
        assert_eq!(path.len(), 9);
        assert!(path.vertices().iter().all(|v| v.y() == 0.0));
    }

    #[test]
    fn normalize_constant_slice_sets_zero() {
        let mut v = vec![Vertex::new(0.0, 3.5, [0, 0, 0, 255]); 4];
        normalize_y(&mut v);
        assert!(v.iter().all(|v| v.y() == 0.0 && v.y().is_finite()));
    }

    #[test]
    fn normalize_empty_slice_is_noop() {
        let mut v: Vec<Vertex> = Vec::new();
        normalize_y(&mut v);
        assert!(v.is_empty());
    }

    #[test]
    fn normalize_is_linear() {
        let mut v = vec![
            Vertex::new(0.0, 2.0, [0; 4]),
            Vertex::new(0.0, 4.0, [0; 4]),
            Vertex::new(0.0, 6.0, [0; 4]),
        ];
        normalize_y(&mut v);
        let ys: Vec<f32> = v.iter().map(Vertex::y).collect();
        assert_eq!(ys, vec![-1.0, 0.0, 1.0]);
    }

    #[test]
    fn normalize_leaves_x_and_color_untouched() {
        let mut v = vec![
            Vertex::new(-1.0, -10.0, [1, 2, 3, 255]),
            Vertex::new(1.0, 10.0, [4, 5, 6, 255]),
        ];
        normalize_y(&mut v);
        assert_eq!(v[0].pos[0], -1.0);
        assert_eq!(v[1].pos[0], 1.0);
        assert_eq!(v[0].color, [1, 2, 3, 255]);
        assert_eq!(v[1].color, [4, 5, 6, 255]);
    }

    // ── color ─────────────────────────────────────────────────────────────

    #[test]
    fn alpha_is_opaque() {
        let path = generator(512).generate_with(&mut seeded(11));
        assert!(path.vertices().iter().all(|v| v.color[3] == 255));
    }

    #[test]
    fn color_channels_vary() {
        let path = generator(512).generate_with(&mut seeded(13));
        let v = path.vertices();
        for channel in 0..3 {
            let first = v[0].color[channel];
            assert!(v.iter().any(|v| v.color[channel] != first));
        }
    }

    // ── determinism / replacement ─────────────────────────────────────────

    #[test]
    fn same_seed_same_path() {
        let g = generator(64);
        assert_eq!(g.generate_with(&mut seeded(42)), g.generate_with(&mut seeded(42)));
    }

    #[test]
    fn os_seeded_paths_keep_their_length() {
        let g = generator(32);
        let a = g.generate();
        let b = g.generate();
        assert_eq!(a.len(), 33);
        assert_eq!(b.len(), 33);
        assert_eq!(b.y_range(), (-1.0, 1.0));
    }

    #[test]
    fn bytes_cover_every_vertex() {
        let path = generator(10).generate_with(&mut seeded(9));
        assert_eq!(path.as_bytes().len(), path.len() * std::mem::size_of::<Vertex>());
    }
}
