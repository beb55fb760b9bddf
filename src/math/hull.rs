use nalgebra::{Point3, Vector3};
use std::collections::HashMap;

/// Radius, in ångström, each pocket point is dilated by before taking the hull.
pub const MARKER_RADIUS: f64 = 0.5;

const EPS: f64 = 1e-9;

/// Volume enclosed by a pocket's point cloud.
///
/// Each point is replaced by the six vertices of an octahedron of radius `radius`,
/// so the hull is never flat and any non-empty cloud has a positive volume.
pub fn pocket_volume(points: &[Vector3<f64>], radius: f64) -> f64 {
    let dilated: Vec<Point3<f64>> = points
        .iter()
        .flat_map(|p| {
            let c = Point3::from(*p);
            [
                c + Vector3::x() * radius,
                c - Vector3::x() * radius,
                c + Vector3::y() * radius,
                c - Vector3::y() * radius,
                c + Vector3::z() * radius,
                c - Vector3::z() * radius,
            ]
        })
        .collect();
    convex_hull_volume(&dilated)
}

#[derive(Debug, Clone)]
struct Face {
    verts: [usize; 3],
    normal: Vector3<f64>,
    offset: f64,
}

impl Face {
    /// Builds the face and flips it so that `inside` lies behind it.
    fn oriented(mut verts: [usize; 3], points: &[Point3<f64>], inside: &Point3<f64>) -> Option<Self> {
        let mut face = Self::new(verts, points)?;
        if face.distance(inside) > 0.0 {
            verts.swap(0, 1);
            face = Self::new(verts, points)?;
        }
        Some(face)
    }

    fn new(verts: [usize; 3], points: &[Point3<f64>]) -> Option<Self> {
        let [a, b, c] = verts.map(|i| points[i]);
        let n = (b - a).cross(&(c - a));
        let norm = n.norm();
        if norm <= EPS {
            return None;
        }
        let normal = n / norm;
        Some(Self { verts, normal, offset: -normal.dot(&a.coords) })
    }

    fn distance(&self, p: &Point3<f64>) -> f64 {
        self.normal.dot(&p.coords) + self.offset
    }
}

/// Incremental convex hull volume. Returns 0 for clouds that span no volume.
pub fn convex_hull_volume(points: &[Point3<f64>]) -> f64 {
    let Some(seed) = initial_simplex(points) else {
        return 0.0;
    };
    // Centroid of the seed tetrahedron stays strictly inside the growing hull.
    let inside = Point3::from(seed.iter().map(|&i| points[i].coords).sum::<Vector3<f64>>() / 4.0);

    let [a, b, c, d] = seed;
    let mut faces: Vec<Face> = [[a, b, c], [a, b, d], [a, c, d], [b, c, d]]
        .into_iter()
        .filter_map(|v| Face::oriented(v, points, &inside))
        .collect();

    for (idx, p) in points.iter().enumerate() {
        if seed.contains(&idx) {
            continue;
        }
        let visible: Vec<bool> = faces.iter().map(|f| f.distance(p) > EPS).collect();
        if !visible.iter().any(|&v| v) {
            continue;
        }

        // Edges shared by exactly one visible face form the horizon.
        let mut horizon: HashMap<(usize, usize), usize> = HashMap::new();
        for (f, _) in faces.iter().zip(&visible).filter(|&(_, &v)| v) {
            let [x, y, z] = f.verts;
            for (u, w) in [(x, y), (y, z), (z, x)] {
                *horizon.entry((u.min(w), u.max(w))).or_default() += 1;
            }
        }

        let mut kept: Vec<Face> = faces
            .into_iter()
            .zip(visible)
            .filter(|(_, v)| !v)
            .map(|(f, _)| f)
            .collect();
        for ((u, w), count) in horizon {
            if count == 1 {
                if let Some(face) = Face::oriented([u, w, idx], points, &inside) {
                    kept.push(face);
                }
            }
        }
        faces = kept;
    }

    faces
        .iter()
        .map(|f| {
            let [x, y, z] = f.verts.map(|i| points[i] - inside);
            x.dot(&y.cross(&z)).abs() / 6.0
        })
        .sum()
}

/// Four affinely independent points, or `None` for flat clouds.
fn initial_simplex(points: &[Point3<f64>]) -> Option<[usize; 4]> {
    if points.len() < 4 {
        return None;
    }
    let a = 0;
    let b = farthest_by(points, |p| (p - points[a]).norm_squared())?;
    let ab = points[b] - points[a];
    let c = farthest_by(points, |p| ab.cross(&(p - points[a])).norm_squared())?;
    let n = ab.cross(&(points[c] - points[a]));
    if n.norm() <= EPS {
        return None;
    }
    let d = farthest_by(points, |p| n.dot(&(p - points[a])).abs())?;
    if n.dot(&(points[d] - points[a])).abs() / n.norm() <= EPS {
        return None;
    }
    Some([a, b, c, d])
}

fn farthest_by(points: &[Point3<f64>], key: impl Fn(&Point3<f64>) -> f64) -> Option<usize> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| (i, key(p)))
        .filter(|(_, k)| *k > EPS)
        .max_by(|x, y| x.1.total_cmp(&y.1))
        .map(|(i, _)| i)
}
