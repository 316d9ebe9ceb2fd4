//! The simulation mesh: a regular rectilinear grid of cells, and index math for moving data
//! between particles and cells.
//!
//! Cells are stored flat, x-major, then z, then y: `index = x*(nz*ny) + z*ny + y`. Anything that
//! falls off the grid maps to `NO_CELL` (-1); consumers treat that as "no contribution".

use lin_alg::f64::Vec3;

/// Sentinel for an index outside the mesh.
pub const NO_CELL: isize = -1;

/// Bounds and resolution of the mesh. Owned by whichever scene built it; read-only afterwards.
#[derive(Clone, Debug)]
pub struct MeshProperties {
    pub min: Vec3,
    /// Always `min + dim * cell_size`.
    pub max: Vec3,
    /// Cell count along (x, y, z).
    pub dim: [usize; 3],
    /// Cubic cells. m
    pub cell_size: f64,
}

#[derive(Clone, Copy, Debug)]
pub struct Cell {
    pub center: Vec3,
    /// False for cells inside solid geometry. These still have an index, but carry no field.
    pub is_active: bool,
}

impl MeshProperties {
    /// Cover the box `[min, max]` with cubic cells. The upper corner is pushed out to fit a whole
    /// number of cells.
    pub fn new(min: Vec3, max: Vec3, cell_size: f64) -> Self {
        // Round-off can land a whole ratio just above the integer; don't add a cell for it.
        let count = |lo: f64, hi: f64| {
            let n = (hi - lo) / cell_size;
            ((n - n.abs() * 1e-9).ceil() as usize).max(1)
        };
        let dim = [count(min.x, max.x), count(min.y, max.y), count(min.z, max.z)];

        let max = Vec3::new(
            min.x + dim[0] as f64 * cell_size,
            min.y + dim[1] as f64 * cell_size,
            min.z + dim[2] as f64 * cell_size,
        );

        Self {
            min,
            max,
            dim,
            cell_size,
        }
    }

    pub fn num_cells(&self) -> usize {
        self.dim[0] * self.dim[1] * self.dim[2]
    }

    pub fn cell_center(&self, x: usize, y: usize, z: usize) -> Vec3 {
        let h = self.cell_size;
        Vec3::new(
            self.min.x + (x as f64 + 0.5) * h,
            self.min.y + (y as f64 + 0.5) * h,
            self.min.z + (z as f64 + 0.5) * h,
        )
    }

    /// Closed-open on every axis.
    pub fn contains(&self, posit: Vec3) -> bool {
        posit.x >= self.min.x
            && posit.x < self.max.x
            && posit.y >= self.min.y
            && posit.y < self.max.y
            && posit.z >= self.min.z
            && posit.z < self.max.z
    }

    /// Build the flat cell array, in index order. `is_active` is evaluated at each cell center.
    pub fn build_cells<F>(&self, is_active: F) -> Vec<Cell>
    where
        F: Fn(Vec3) -> bool,
    {
        let [nx, ny, nz] = self.dim;
        let mut result = Vec::with_capacity(self.num_cells());

        for x in 0..nx {
            for z in 0..nz {
                for y in 0..ny {
                    let center = self.cell_center(x, y, z);
                    result.push(Cell {
                        center,
                        is_active: is_active(center),
                    });
                }
            }
        }

        result
    }
}

/// Flat index of cell `(x, y, z)`, or `NO_CELL` if any coordinate is out of range.
pub fn linear_index(x: isize, y: isize, z: isize, dim: [usize; 3]) -> isize {
    let [nx, ny, nz] = dim;
    if x < 0 || y < 0 || z < 0 || x >= nx as isize || y >= ny as isize || z >= nz as isize {
        return NO_CELL;
    }

    x * (nz * ny) as isize + z * ny as isize + y
}

/// Inverse of `linear_index`.
pub fn decompose(idx: isize, dim: [usize; 3]) -> Option<[usize; 3]> {
    let [nx, ny, nz] = dim;
    if idx < 0 || idx as usize >= nx * ny * nz {
        return None;
    }
    let idx = idx as usize;

    let x = idx / (nz * ny);
    let rem = idx % (nz * ny);
    let z = rem / ny;
    let y = rem % ny;

    Some([x, y, z])
}

/// The 8 cells used for trilinear interpolation around a point, and their weights.
/// Slot `k = 4*dx + 2*dy + dz`, for offsets of 0 or 1 from the base cell on each axis.
#[derive(Clone, Copy, Debug)]
pub struct ParticleStencil {
    pub indices: [isize; 8],
    pub weights: [f64; 8],
}

impl ParticleStencil {
    pub fn empty() -> Self {
        Self {
            indices: [NO_CELL; 8],
            weights: [0.; 8],
        }
    }
}

/// Per axis: base cell, and the interpolation parameter toward `base + 1`.
///
/// The stencil is half-cell shifted. Field values live at cell centers, so the two cells
/// straddling a point are the one it's in and the one on whichever side of that cell's center
/// the point sits.
fn axis_base(p: f64, min: f64, cell_size: f64) -> (isize, f64) {
    let u = (p - min) / cell_size;
    let cell = u.floor();
    let frac = u - cell;

    let base = if frac < 0.5 { cell - 1. } else { cell };

    (base as isize, u - 0.5 - base)
}

pub fn particle_stencil(posit: Vec3, mesh: &MeshProperties) -> ParticleStencil {
    if !mesh.contains(posit) {
        return ParticleStencil::empty();
    }

    let h = mesh.cell_size;
    let (bx, tx) = axis_base(posit.x, mesh.min.x, h);
    let (by, ty) = axis_base(posit.y, mesh.min.y, h);
    let (bz, tz) = axis_base(posit.z, mesh.min.z, h);

    let wx = [1. - tx, tx];
    let wy = [1. - ty, ty];
    let wz = [1. - tz, tz];

    let mut result = ParticleStencil::empty();
    for a in 0..2 {
        for b in 0..2 {
            for c in 0..2 {
                let k = 4 * a + 2 * b + c;
                result.indices[k] =
                    linear_index(bx + a as isize, by + b as isize, bz + c as isize, mesh.dim);
                result.weights[k] = wx[a] * wy[b] * wz[c];
            }
        }
    }

    result
}

/// Indices of the 8 cells surrounding `posit`; see `particle_stencil`.
pub fn particle_neighbors(posit: Vec3, mesh: &MeshProperties) -> [isize; 8] {
    particle_stencil(posit, mesh).indices
}

/// Slot of offset `(dx, dy, dz)`, each in -1..=1, in the array from `cell_neighbors`.
pub const fn neighbor_slot(dx: isize, dy: isize, dz: isize) -> usize {
    ((dx + 1) * 9 + (dy + 1) * 3 + (dz + 1)) as usize
}

/// Slot of the cell itself; always `NO_CELL` in `cell_neighbors` output.
pub const SELF_SLOT: usize = neighbor_slot(0, 0, 0);

/// The 26-connected neighbors of cell `idx`. The self slot holds `NO_CELL`; callers already
/// have the current cell.
pub fn cell_neighbors(idx: isize, dim: [usize; 3]) -> [isize; 27] {
    let mut result = [NO_CELL; 27];

    let Some([x, y, z]) = decompose(idx, dim) else {
        return result;
    };
    let (x, y, z) = (x as isize, y as isize, z as isize);

    for dx in -1..=1 {
        for dy in -1..=1 {
            for dz in -1..=1 {
                if dx == 0 && dy == 0 && dz == 0 {
                    continue;
                }
                result[neighbor_slot(dx, dy, dz)] = linear_index(x + dx, y + dy, z + dz, dim);
            }
        }
    }

    result
}

/// Trilinear interpolation of a per-cell field. Off-mesh corners are zero-padded: they're
/// skipped, and the remaining weights are not renormalized.
pub fn interpolate(field: &[Vec3], stencil: &ParticleStencil) -> Vec3 {
    let mut result = Vec3::new_zero();

    for (idx, w) in stencil.indices.iter().zip(stencil.weights) {
        if *idx == NO_CELL {
            continue;
        }
        if let Some(v) = field.get(*idx as usize) {
            result += *v * w;
        }
    }

    result
}
