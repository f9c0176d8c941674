use egui::{Pos2, Rect};

/// Separator between two sampled points in an encoded path
pub const POINT_DELIMITER: char = '|';
/// Separator between the x and y of one point
pub const COORD_DELIMITER: char = ',';
/// Arc length between two consecutive samples
pub const DEFAULT_SAMPLE_STEP: f32 = 2.0;
/// Fraction of the step within which a sample snaps onto a vertex
const SNAP_TOLERANCE: f32 = 1e-4;

/// An open polyline: the first point is the move-to origin, every following
/// point is a straight line-to segment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polyline {
    points: Vec<Pos2>,
}

impl Polyline {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Start a polyline at `origin`, dropping any previous geometry
    pub fn move_to(&mut self, origin: Pos2) {
        self.points.clear();
        self.points.push(origin);
    }

    /// Append a straight segment. Without an origin the point becomes the origin.
    pub fn line_to(&mut self, point: Pos2) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[Pos2] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<Pos2> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<Pos2> {
        self.points.last().copied()
    }

    /// Total arc length of all segments
    pub fn length(&self) -> f32 {
        self.points
            .windows(2)
            .map(|segment| segment[0].distance(segment[1]))
            .sum()
    }

    /// Bounding box of the vertices grown by `padding` on every side.
    /// Returns `Rect::NOTHING` for an empty polyline.
    pub fn bounds(&self, padding: f32) -> Rect {
        if self.points.is_empty() {
            return Rect::NOTHING;
        }

        let mut min_x = f32::INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_y = f32::NEG_INFINITY;

        for point in &self.points {
            min_x = min_x.min(point.x);
            min_y = min_y.min(point.y);
            max_x = max_x.max(point.x);
            max_y = max_y.max(point.y);
        }

        Rect::from_min_max(
            Pos2::new(min_x - padding, min_y - padding),
            Pos2::new(max_x + padding, max_y + padding),
        )
    }

    /// Position at `distance` along the polyline, clamped to its ends.
    /// A distance within `tolerance` of a vertex returns that vertex exactly.
    pub fn point_at(&self, distance: f32, tolerance: f32) -> Option<Pos2> {
        let first = self.first()?;
        if distance <= tolerance {
            return Some(first);
        }

        let mut travelled = 0.0;
        for segment in self.points.windows(2) {
            let (start, end) = (segment[0], segment[1]);
            let segment_len = start.distance(end);
            let end_distance = travelled + segment_len;
            if (end_distance - distance).abs() <= tolerance {
                return Some(end);
            }
            if segment_len > 0.0 && end_distance > distance {
                let t = (distance - travelled) / segment_len;
                return Some(start.lerp(end, t));
            }
            travelled = end_distance;
        }

        self.last()
    }
}

impl From<Vec<Pos2>> for Polyline {
    fn from(points: Vec<Pos2>) -> Self {
        Self { points }
    }
}

/// Walks a polyline's arc length in fixed increments and renders the samples
/// as `"x,y|x,y|..."`.
#[derive(Debug, Clone, Copy)]
pub struct PathSampler {
    step: f32,
}

impl Default for PathSampler {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_STEP)
    }
}

impl PathSampler {
    /// Non-positive or non-finite steps fall back to the default step
    pub fn new(step: f32) -> Self {
        let step = if step.is_finite() && step > 0.0 {
            step
        } else {
            DEFAULT_SAMPLE_STEP
        };
        Self { step }
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    /// Encode the polyline. The final point is always emitted, even when it
    /// falls short of a full step. Zero-length and non-finite input encode
    /// to `""`.
    ///
    /// Samples are taken at `i * step`. A sample that lands on a vertex
    /// emits the vertex itself, so a polyline whose vertices are already
    /// one step apart encodes back to the same coordinates.
    pub fn encode(&self, polyline: &Polyline) -> String {
        let length = polyline.length();
        if !length.is_finite() || length <= 0.0 {
            return String::new();
        }

        let tolerance = self.step * SNAP_TOLERANCE;
        let count = (f64::from(length) / f64::from(self.step)).ceil() as u64;
        let mut samples = Vec::new();
        for index in 0..count {
            let distance = (index as f64 * f64::from(self.step)) as f32;
            if index > 0 && distance >= length - tolerance {
                break;
            }
            if let Some(point) = polyline.point_at(distance, tolerance) {
                samples.push(format_point(point));
            }
        }
        if let Some(point) = polyline.last() {
            samples.push(format_point(point));
        }

        samples.join(&POINT_DELIMITER.to_string())
    }

    /// Decode an encoded path into a polyline. Curvature between samples is
    /// not reconstructed. Bad numbers read as `0`; pairs that are not exactly
    /// two coordinates are skipped, and a malformed first pair yields an
    /// empty polyline.
    pub fn decode(&self, encoded: &str) -> Polyline {
        decode(encoded)
    }
}

/// Decoding does not depend on the sampling step
pub fn decode(encoded: &str) -> Polyline {
    let mut polyline = Polyline::new();
    if encoded.is_empty() {
        return polyline;
    }

    let mut pairs = encoded.split(POINT_DELIMITER);
    let Some(origin) = pairs.next().and_then(parse_point) else {
        log::warn!("Discarding encoded path with malformed origin");
        return polyline;
    };
    polyline.move_to(origin);

    for pair in pairs {
        if let Some(point) = parse_point(pair) {
            polyline.line_to(point);
        }
    }

    polyline
}

fn format_point(point: Pos2) -> String {
    format!("{}{}{}", point.x, COORD_DELIMITER, point.y)
}

fn parse_point(pair: &str) -> Option<Pos2> {
    let mut coords = pair.split(COORD_DELIMITER);
    let (Some(x), Some(y), None) = (coords.next(), coords.next(), coords.next()) else {
        return None;
    };
    Some(Pos2::new(parse_coord(x), parse_coord(y)))
}

fn parse_coord(token: &str) -> f32 {
    token.trim().parse().unwrap_or(0.0)
}
