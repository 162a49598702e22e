use tessera_core::{GenerationError, RandomSource};

/// Largest exponent accepted by [`nearest_valid_size`]
pub const MAX_SIZE_EXPONENT: u32 = 10;

/// Square grid of heights, row-major (`values[y * size + x]`)
#[derive(Debug, Clone, PartialEq)]
pub struct Heightmap {
    size: usize,
    values: Vec<f32>,
}

impl Heightmap {
    fn flat(size: usize) -> Self {
        Self {
            size,
            values: vec![0.0; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.values[y * self.size + x]
    }

    fn set(&mut self, x: usize, y: usize, value: f32) {
        self.values[y * self.size + x] = value;
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// (0,0), (0,last), (last,0), (last,last)
    pub fn corners(&self) -> [f32; 4] {
        let last = self.size - 1;
        [
            self.get(0, 0),
            self.get(0, last),
            self.get(last, 0),
            self.get(last, last),
        ]
    }

    pub fn min_max(&self) -> (f32, f32) {
        self.values
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }
}

/// True for `2^n + 1` with n >= 1
pub fn is_valid_size(size: usize) -> bool {
    size >= 3 && (size - 1).is_power_of_two()
}

/// `2^exponent + 1`
pub fn size_for_exponent(exponent: u32) -> usize {
    (1usize << exponent.clamp(1, MAX_SIZE_EXPONENT)) + 1
}

/// Closest valid size to `requested`. Ties round up.
pub fn nearest_valid_size(requested: usize) -> usize {
    let mut best = size_for_exponent(1);
    for exponent in 1..=MAX_SIZE_EXPONENT {
        let candidate = size_for_exponent(exponent);
        if candidate.abs_diff(requested) <= best.abs_diff(requested) {
            best = candidate;
        }
    }
    best
}

/// Diamond-square heightmap. Corners are uniform draws, every later point is
/// the mean of its neighbors perturbed by `(2r - 1) * scale`, with the scale
/// multiplied by `roughness` after each octave.
pub fn synthesize(
    size: usize,
    roughness: f32,
    rng: &mut dyn RandomSource,
) -> Result<Heightmap, GenerationError> {
    if !is_valid_size(size) {
        return Err(GenerationError::InvalidHeightmapSize(size));
    }

    let mut map = Heightmap::flat(size);
    let last = size - 1;

    map.set(0, 0, rng.value());
    map.set(0, last, rng.value());
    map.set(last, 0, rng.value());
    map.set(last, last, rng.value());

    let mut step = last;
    let mut scale = roughness;
    let mut octave = 0;

    while step > 1 {
        let half = step / 2;

        // Diamond: square centers
        for y in (half..size).step_by(step) {
            for x in (half..size).step_by(step) {
                let avg = (map.get(x - half, y - half)
                    + map.get(x - half, y + half)
                    + map.get(x + half, y - half)
                    + map.get(x + half, y + half))
                    * 0.25;
                map.set(x, y, avg + rng.signed(scale));
            }
        }

        // Square: edge midpoints, neighbors clipped at the border
        for y in (0..size).step_by(half) {
            for x in ((y + half) % step..size).step_by(step) {
                let mut sum = 0.0;
                let mut count = 0;
                if x >= half {
                    sum += map.get(x - half, y);
                    count += 1;
                }
                if x + half < size {
                    sum += map.get(x + half, y);
                    count += 1;
                }
                if y >= half {
                    sum += map.get(x, y - half);
                    count += 1;
                }
                if y + half < size {
                    sum += map.get(x, y + half);
                    count += 1;
                }
                map.set(x, y, sum / count as f32 + rng.signed(scale));
            }
        }

        log::debug!("octave {octave}: step {step}, scale {scale:.4}");

        step /= 2;
        scale *= roughness;
        octave += 1;
    }

    Ok(map)
}
