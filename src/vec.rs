use std::ops::{
    Add, AddAssign, Deref, DerefMut, Div, DivAssign, Index, IndexMut, Mul, MulAssign, Neg, Sub,
    SubAssign,
};

pub type Mat4x4 = Mat<f32, 4, 4>;

/// Row-major `M x N` matrix. Column vectors are `Mat<T, N, 1>`.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mat<T, const M: usize, const N: usize>([[T; N]; M]);

impl<T: Num, const M: usize, const N: usize> Mat<T, M, N> {
    pub fn zero() -> Self {
        Mat([[T::zero(); N]; M])
    }

    pub fn one() -> Self {
        Mat([[T::one(); N]; M])
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Mat<U, M, N> {
        Mat(self.0.map(|row| row.map(&mut f)))
    }

    pub fn transpose(self) -> Mat<T, N, M> {
        let mut ret = Mat::zero();
        for i in 0..M {
            for j in 0..N {
                ret[(j, i)] = self[(i, j)];
            }
        }
        ret
    }
}

impl<T: Num, const N: usize> Mat<T, N, N> {
    pub fn identity() -> Self {
        let mut ret = Self::zero();
        for i in 0..N {
            ret[(i, i)] = T::one();
        }
        ret
    }
}

impl<T: Num> Mat<T, 4, 4> {
    #[rustfmt::skip]
    pub fn rotation_x(theta: T) -> Self {
        let o = T::one();
        let z = T::zero();
        let cos = theta.cos();
        let sin = theta.sin();
        Mat([[   o,   z,   z,   z],
             [   z, cos,-sin,   z],
             [   z, sin, cos,   z],
             [   z,   z,   z,   o]])
    }

    #[rustfmt::skip]
    pub fn rotation_y(theta: T) -> Self {
        let o = T::one();
        let z = T::zero();
        let cos = theta.cos();
        let sin = theta.sin();
        Mat([[ cos,   z, sin,   z],
             [   z,   o,   z,   z],
             [-sin,   z, cos,   z],
             [   z,   z,   z,   o]])
    }

    #[rustfmt::skip]
    pub fn rotation_z(theta: T) -> Self {
        let o = T::one();
        let z = T::zero();
        let cos = theta.cos();
        let sin = theta.sin();
        Mat([[ cos, -sin,   z,   z],
             [ sin,  cos,   z,   z],
             [   z,    z,   o,   z],
             [   z,    z,   z,   o]])
    }
}

impl Mat4x4 {
    /// Right handed perspective projection mapping the view frustum to `[-1, 1]` NDC, with
    /// `w = -z_view`. `fovy` is measured in degrees.
    #[rustfmt::skip]
    pub fn perspective(aspect_ratio: f32, fovy: f32, near: f32, far: f32) -> Self {
        let f = 1. / (fovy.to_radians() / 2.).tan();
        let depth = near - far;
        Mat([[f / aspect_ratio, 0.,                     0.,                         0.],
             [              0.,  f,                     0.,                         0.],
             [              0., 0., (far + near) / depth, 2. * far * near / depth],
             [              0., 0.,                    -1.,                         0.]])
    }

    /// Right handed view matrix looking from `eye` towards `target`.
    #[rustfmt::skip]
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        let front = (target - eye).normalize();
        let right = front.cross(up).normalize();
        let up = right.cross(front);
        Mat([[ right.x,  right.y,  right.z, -right.dot(eye)],
             [    up.x,     up.y,     up.z,    -up.dot(eye)],
             [-front.x, -front.y, -front.z,  front.dot(eye)],
             [      0.,       0.,       0.,              1.]])
    }
}

impl<T, const M: usize, const N: usize> From<[[T; N]; M]> for Mat<T, M, N> {
    fn from(value: [[T; N]; M]) -> Self {
        Mat(value)
    }
}

pub type Vec<T, const N: usize> = Mat<T, N, 1>;
pub type Vec2 = Vec<f32, 2>;
pub type Vec3 = Vec<f32, 3>;
pub type Vec4 = Vec<f32, 4>;

impl<T: Num, const N: usize> Vec<T, N> {
    pub fn repeat(value: T) -> Self {
        Mat([[value]; N])
    }

    pub fn dot(self, rhs: Self) -> T {
        self.0.iter().zip(rhs.0.iter()).map(|(&[a], &[b])| a * b).sum()
    }

    pub fn mag_sq(&self) -> T {
        self.dot(*self)
    }

    pub fn mag(&self) -> T {
        self.mag_sq().sqrt()
    }

    pub fn normalize(self) -> Self {
        self / self.mag()
    }

    pub fn to_array(self) -> [T; N] {
        self.0.map(|[coord]| coord)
    }
}

impl<T: Num> Vec<T, 3> {
    pub fn cross(self, rhs: Self) -> Self {
        Self::from([
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        ])
    }

    /// Homogeneous point with `w = 1`.
    pub fn to_hom(self) -> Vec<T, 4> {
        Vec::from([self.x, self.y, self.z, T::one()])
    }

    pub fn to_rotation(self) -> Mat<T, 4, 4> {
        Mat::rotation_x(self.x) * Mat::rotation_y(self.y) * Mat::rotation_z(self.z)
    }

    pub fn to_translation(self) -> Mat<T, 4, 4> {
        let mut ret = Mat::identity();
        ret[(0, 3)] = self.x;
        ret[(1, 3)] = self.y;
        ret[(2, 3)] = self.z;
        ret
    }

    pub fn to_scale(self) -> Mat<T, 4, 4> {
        let mut ret = Mat::zero();
        ret[(0, 0)] = self.x;
        ret[(1, 1)] = self.y;
        ret[(2, 2)] = self.z;
        ret[(3, 3)] = T::one();
        ret
    }
}

impl<T, const N: usize> From<[T; N]> for Vec<T, N> {
    fn from(value: [T; N]) -> Self {
        Mat(value.map(|coord| [coord]))
    }
}

impl<T, const M: usize, const N: usize> Index<(usize, usize)> for Mat<T, M, N> {
    type Output = T;

    fn index(&self, (i, j): (usize, usize)) -> &T {
        &self.0[i][j]
    }
}

impl<T, const M: usize, const N: usize> IndexMut<(usize, usize)> for Mat<T, M, N> {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut T {
        &mut self.0[i][j]
    }
}

impl<T: Num, const M: usize, const N: usize> AddAssign for Mat<T, M, N> {
    fn add_assign(&mut self, rhs: Self) {
        for i in 0..M {
            for j in 0..N {
                self[(i, j)] += rhs[(i, j)];
            }
        }
    }
}

impl<T: Num, const M: usize, const N: usize> SubAssign for Mat<T, M, N> {
    fn sub_assign(&mut self, rhs: Self) {
        for i in 0..M {
            for j in 0..N {
                self[(i, j)] -= rhs[(i, j)];
            }
        }
    }
}

impl<T: Num, const M: usize, const N: usize> MulAssign<T> for Mat<T, M, N> {
    fn mul_assign(&mut self, rhs: T) {
        for i in 0..M {
            for j in 0..N {
                self[(i, j)] *= rhs;
            }
        }
    }
}

impl<T: Num, const M: usize, const N: usize> DivAssign<T> for Mat<T, M, N> {
    fn div_assign(&mut self, rhs: T) {
        for i in 0..M {
            for j in 0..N {
                self[(i, j)] /= rhs;
            }
        }
    }
}

impl<T: Num, const M: usize, const N: usize> Add for Mat<T, M, N> {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl<T: Num, const M: usize, const N: usize> Sub for Mat<T, M, N> {
    type Output = Self;

    fn sub(mut self, rhs: Self) -> Self {
        self -= rhs;
        self
    }
}

impl<T: Num, const M: usize, const N: usize> Neg for Mat<T, M, N> {
    type Output = Self;

    fn neg(self) -> Self {
        self.map(|el| -el)
    }
}

impl<T: Num, const M: usize, const N: usize> Mul<T> for Mat<T, M, N> {
    type Output = Self;

    fn mul(mut self, rhs: T) -> Self {
        self *= rhs;
        self
    }
}

impl<T: Num, const M: usize, const N: usize> Div<T> for Mat<T, M, N> {
    type Output = Self;

    fn div(mut self, rhs: T) -> Self {
        self /= rhs;
        self
    }
}

macro_rules! impl_mul_lhs {
    ($($ty:ty),+) => {
        $(impl<const M: usize, const N: usize> Mul<Mat<$ty, M, N>> for $ty {
            type Output = Mat<$ty, M, N>;

            fn mul(self, rhs: Mat<$ty, M, N>) -> Mat<$ty, M, N> {
                rhs * self
            }
        })+
    };
}

impl_mul_lhs!(f32, f64);

impl<T: Num, const M: usize, const K: usize, const N: usize> Mul<Mat<T, K, N>> for Mat<T, M, K> {
    type Output = Mat<T, M, N>;

    fn mul(self, rhs: Mat<T, K, N>) -> Self::Output {
        let mut ret = Mat::zero();
        for i in 0..M {
            for j in 0..N {
                for k in 0..K {
                    ret[(i, j)] += self[(i, k)] * rhs[(k, j)];
                }
            }
        }
        ret
    }
}

macro_rules! impl_swizzle_deref {
    ($n:literal => $target:ident) => {
        impl<T> Deref for Vec<T, $n> {
            type Target = $target<T>;

            fn deref(&self) -> &$target<T> {
                // SAFETY: `Mat` is `repr(transparent)` over `[[T; 1]; N]`, which is laid out exactly
                // like the `repr(C)` struct with N fields of type `T`.
                unsafe { &*(self as *const Self).cast::<$target<T>>() }
            }
        }

        impl<T> DerefMut for Vec<T, $n> {
            fn deref_mut(&mut self) -> &mut $target<T> {
                // SAFETY: see `Deref`.
                unsafe { &mut *(self as *mut Self).cast::<$target<T>>() }
            }
        }
    };
}

impl_swizzle_deref!(2 => XY);
impl_swizzle_deref!(3 => XYZ);
impl_swizzle_deref!(4 => XYZW);

#[repr(C)]
#[derive(Clone, Copy)]
pub struct XY<T> {
    pub x: T,
    pub y: T,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct XYZ<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

impl<T: Copy> XYZ<T> {
    pub fn xy(&self) -> Vec<T, 2> {
        Vec::from([self.x, self.y])
    }
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct XYZW<T> {
    pub x: T,
    pub y: T,
    pub z: T,
    pub w: T,
}

impl<T: Copy> XYZW<T> {
    pub fn xy(&self) -> Vec<T, 2> {
        Vec::from([self.x, self.y])
    }

    pub fn xyz(&self) -> Vec<T, 3> {
        Vec::from([self.x, self.y, self.z])
    }
}

pub trait Num:
    Copy
    + PartialOrd
    + Add<Output = Self>
    + AddAssign
    + Sub<Output = Self>
    + SubAssign
    + Mul<Output = Self>
    + MulAssign
    + Div<Output = Self>
    + DivAssign
    + Neg<Output = Self>
    + std::iter::Sum
{
    fn zero() -> Self;
    fn one() -> Self;
    fn sqrt(self) -> Self;
    fn sin(self) -> Self;
    fn cos(self) -> Self;
}

macro_rules! impl_num_float {
    ($($ty:ty),+) => {
        $(impl Num for $ty {
            fn zero() -> Self {
                0.0
            }

            fn one() -> Self {
                1.0
            }

            fn sqrt(self) -> Self {
                <$ty>::sqrt(self)
            }

            fn sin(self) -> Self {
                <$ty>::sin(self)
            }

            fn cos(self) -> Self {
                <$ty>::cos(self)
            }
        })+
    };
}

impl_num_float!(f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec3, b: Vec3) {
        assert!((a - b).mag() < 1e-5, "{:?} != {:?}", a.to_array(), b.to_array());
    }

    #[test]
    fn cross_follows_right_hand_rule() {
        let x = Vec3::from([1., 0., 0.]);
        let y = Vec3::from([0., 1., 0.]);
        let z = Vec3::from([0., 0., 1.]);
        assert_close(x.cross(y), z);
        assert_close(y.cross(z), x);
        assert_close(z.cross(x), y);
    }

    #[test]
    fn matrix_vector_product() {
        let m = Vec3::from([1., 2., 3.]).to_translation() * Vec3::from([2., 2., 2.]).to_scale();
        let p = m * Vec3::from([1., 1., 1.]).to_hom();
        assert_eq!(p.to_array(), [3., 4., 5., 1.]);
    }

    #[test]
    fn perspective_maps_near_and_far_planes() {
        let proj = Mat4x4::perspective(1., 90., 1., 10.);
        let near = proj * Vec4::from([0., 0., -1., 1.]);
        let far = proj * Vec4::from([0., 0., -10., 1.]);
        assert!((near.z / near.w + 1.).abs() < 1e-5);
        assert!((far.z / far.w - 1.).abs() < 1e-5);
        assert_eq!(near.w, 1.);
        assert_eq!(far.w, 10.);
    }

    #[test]
    fn look_at_moves_target_onto_negative_z() {
        let view = Mat4x4::look_at(
            Vec3::from([0., 0., 5.]),
            Vec3::zero(),
            Vec3::from([0., 1., 0.]),
        );
        let target = view * Vec3::zero().to_hom();
        assert_close(target.xyz(), Vec3::from([0., 0., -5.]));
    }
}
