//! Seeded 3D Perlin noise for organic wave jitter.
//!
//! The permutation table is shuffled with a fixed linear-congruential
//! generator, so a given seed always yields the same noise field. Tests pin
//! exact values against it.

use noise::NoiseFn;

const TABLE_SIZE: usize = 256;

/// Classic (improved) 3D Perlin noise with a seed-determined permutation table
#[derive(Clone)]
pub struct PerlinNoise {
    permutation: [u8; TABLE_SIZE * 2],
}

impl PerlinNoise {
    /// Create new noise generator with seed
    pub fn new(seed: u32) -> Self {
        let mut table = [0u8; TABLE_SIZE];
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = i as u8;
        }

        let mut state = seed as u64;
        for i in 0..TABLE_SIZE {
            state = (state.wrapping_mul(1_103_515_245).wrapping_add(12_345)) & 0x7FFF_FFFF;
            let j = (state % TABLE_SIZE as u64) as usize;
            table.swap(i, j);
        }

        // Duplicated so corner hashing never has to wrap
        let mut permutation = [0u8; TABLE_SIZE * 2];
        permutation[..TABLE_SIZE].copy_from_slice(&table);
        permutation[TABLE_SIZE..].copy_from_slice(&table);

        Self { permutation }
    }

    /// Sample 3D noise at position
    ///
    /// Returns value in range [-1, 1]
    pub fn sample(&self, x: f64, y: f64, z: f64) -> f64 {
        let (xi, yi, zi) = (x.floor(), y.floor(), z.floor());
        let cx = (xi as i64 & 255) as usize;
        let cy = (yi as i64 & 255) as usize;
        let cz = (zi as i64 & 255) as usize;

        let xf = x - xi;
        let yf = y - yi;
        let zf = z - zi;

        let u = fade(xf);
        let v = fade(yf);
        let w = fade(zf);

        let a = self.perm(cx) + cy;
        let aa = self.perm(a) + cz;
        let ab = self.perm(a + 1) + cz;
        let b = self.perm(cx + 1) + cy;
        let ba = self.perm(b) + cz;
        let bb = self.perm(b + 1) + cz;

        lerp(
            w,
            lerp(
                v,
                lerp(
                    u,
                    grad(self.perm(aa), xf, yf, zf),
                    grad(self.perm(ba), xf - 1.0, yf, zf),
                ),
                lerp(
                    u,
                    grad(self.perm(ab), xf, yf - 1.0, zf),
                    grad(self.perm(bb), xf - 1.0, yf - 1.0, zf),
                ),
            ),
            lerp(
                v,
                lerp(
                    u,
                    grad(self.perm(aa + 1), xf, yf, zf - 1.0),
                    grad(self.perm(ba + 1), xf - 1.0, yf, zf - 1.0),
                ),
                lerp(
                    u,
                    grad(self.perm(ab + 1), xf, yf - 1.0, zf - 1.0),
                    grad(self.perm(bb + 1), xf - 1.0, yf - 1.0, zf - 1.0),
                ),
            ),
        )
    }

    /// Sample along the x axis (y = z = 0)
    pub fn sample_1d(&self, x: f64) -> f64 {
        self.sample(x, 0.0, 0.0)
    }

    fn perm(&self, index: usize) -> usize {
        self.permutation[index] as usize
    }
}

impl NoiseFn<f64, 3> for PerlinNoise {
    fn get(&self, point: [f64; 3]) -> f64 {
        self.sample(point[0], point[1], point[2])
    }
}

/// Perlin's quintic fade curve: 6t^5 - 15t^4 + 10t^3
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

/// Low 4 bits of the hash select one of 12 gradient directions (plus 4 repeats)
fn grad(hash: usize, x: f64, y: f64, z: f64) -> f64 {
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        x
    } else {
        z
    };
    (if h & 1 == 0 { u } else { -u }) + (if h & 2 == 0 { v } else { -v })
}
