use serde::{
    Deserialize,
    Serialize
};

pub type Vector2F = Vector2X<f32>;
pub type Vector3F = Vector3X<f32>;
pub type Rect2F = Rect2X<f32>;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Vector2X<T> {
    pub x: T,
    pub y: T,
}

/// World-space position, `z` is kept for the map transform rotation only.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vector3X<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rect2X<T> {
    pub pos: Vector2X<T>,
    pub size: Vector2X<T>,
}

impl<T: std::fmt::Display> std::fmt::Display for Vector2X<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{}]", self.x, self.y)
    }
}

impl<T: std::fmt::Display> std::fmt::Display for Vector3X<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{},{}]", self.x, self.y, self.z)
    }
}

impl<T> Vector2X<T> {
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl<T> Vector3X<T> {
    pub fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }
}

impl Vector2X<f32> {
    pub fn length(&self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Vector of given length pointing at `angle_rad`, measured from +x towards +y.
    pub fn from_polar(length: f32, angle_rad: f32) -> Self {
        Self {
            x: length * angle_rad.cos(),
            y: length * angle_rad.sin(),
        }
    }

    pub fn distance(&self, other: Self) -> f32 {
        (*self - other).length()
    }

    /// Component-wise division, used for image to window rescaling.
    pub fn div_components(self, rhs: Self) -> Self {
        Self {
            x: self.x / rhs.x,
            y: self.y / rhs.y,
        }
    }
}

impl Vector3X<f32> {
    /// Rotates around the vertical axis.
    pub fn rotated_z(&self, angle_deg: f32) -> Self {
        let (sin, cos) = angle_deg.to_radians().sin_cos();
        Self {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
            z: self.z,
        }
    }
}

impl<T> std::ops::Add for Vector2X<T>
where
    T: std::ops::Add<Output = T>
{
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y
        }
    }
}

impl<T> std::ops::Mul<T> for Vector2X<T>
where
    T: std::ops::Mul<Output = T> + Copy
{
    type Output = Self;
    fn mul(self, rhs: T) -> Self::Output {
        Self {
            x: self.x * rhs,
            y: self.y * rhs
        }
    }
}

impl<T> std::ops::Div<T> for Vector2X<T>
where
    T: std::ops::Div<Output = T> + Copy
{
    type Output = Self;
    fn div(self, rhs: T) -> Self::Output {
        Self {
            x: self.x / rhs,
            y: self.y / rhs
        }
    }
}

impl<T> std::ops::Sub for Vector2X<T>
where
    T: std::ops::Sub<Output = T>
{
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: T::sub(self.x, rhs.x),
            y: T::sub(self.y, rhs.y)
        }
    }
}

impl<T> std::ops::Add for Vector3X<T>
where
    T: std::ops::Add<Output = T>
{
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl<T> std::ops::Sub for Vector3X<T>
where
    T: std::ops::Sub<Output = T>
{
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl<T> Rect2X<T> {
    pub fn new(x: T, y: T, w: T, h: T) -> Self {
        Self { pos: Vector2X { x, y }, size: Vector2X { x: w, y: h } }
    }
}

impl Rect2X<f32> {
    /// Rectangle of `size` whose geometric center is `center`.
    pub fn centered_at(center: Vector2F, size: Vector2F) -> Self {
        Self {
            pos: center - size / 2.0,
            size,
        }
    }

    pub fn center(&self) -> Vector2F {
        self.pos + self.size / 2.0
    }
}

#[test]
fn test_vector_add() {
    let v1 = Vector2X::<u32>::new(1, 2);
    let v2 = Vector2X::<u32>::new(10, 20);
    let v3 = v1 + v2;
    assert_eq!(v3.x, v1.x + v2.x);
    assert_eq!(v3.y, v1.y + v2.y);
}

#[test]
fn test_vector_from_polar() {
    let v = Vector2F::from_polar(2.0, std::f32::consts::FRAC_PI_2);
    assert!(v.x.abs() < 1e-6);
    assert!((v.y - 2.0).abs() < 1e-6);
    assert!((v.length() - 2.0).abs() < 1e-6);
}

#[test]
fn test_vector_div_components() {
    let v = Vector2F::new(100.0, 60.0).div_components(Vector2F::new(2.0, 3.0));
    assert_eq!(v, Vector2F::new(50.0, 20.0));
}

#[test]
fn test_vector3_rotation_keeps_height() {
    let v = Vector3F::new(1.0, 0.0, 7.0).rotated_z(90.0);
    assert!(v.x.abs() < 1e-6);
    assert!((v.y - 1.0).abs() < 1e-6);
    assert_eq!(v.z, 7.0);
}

#[test]
fn test_rect_centered() {
    let rect = Rect2F::centered_at(Vector2F::new(10.0, 20.0), Vector2F::new(4.0, 6.0));
    assert_eq!(rect.pos, Vector2F::new(8.0, 17.0));
    assert_eq!(rect.center(), Vector2F::new(10.0, 20.0));
}
