use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// A location in 3D Euclidean space.
///
/// Equality is bitwise per axis except that both zeros are equal, so a
/// point with a NaN coordinate still equals itself.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Point3d {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3d {
    pub const ORIGIN: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance_to(&self, other: &Self) -> f64 {
        self.distance_squared_to(other).sqrt()
    }

    pub fn distance_squared_to(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Copy of this point with one axis replaced. Axis 0 is x, 1 is y, 2 is z.
    pub fn with_axis(&self, axis: usize, value: f64) -> Self {
        let mut arr = self.to_array();
        if let Some(slot) = arr.get_mut(axis) {
            *slot = value;
        }
        Self::from_array(arr)
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn from_array(arr: [f64; 3]) -> Self {
        Self {
            x: arr[0],
            y: arr[1],
            z: arr[2],
        }
    }
}

impl From<[f64; 3]> for Point3d {
    fn from(arr: [f64; 3]) -> Self {
        Self::from_array(arr)
    }
}

/// Bit pattern used to compare and hash coordinates. Both zeros map to
/// the same key.
pub(crate) fn float_key(value: f64) -> u64 {
    if value == 0.0 {
        0.0f64.to_bits()
    } else {
        value.to_bits()
    }
}

impl PartialEq for Point3d {
    fn eq(&self, other: &Self) -> bool {
        self.to_array()
            .into_iter()
            .zip(other.to_array())
            .all(|(a, b)| float_key(a) == float_key(b))
    }
}

impl Eq for Point3d {}

impl Hash for Point3d {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for v in self.to_array() {
            float_key(v).hash(state);
        }
    }
}
