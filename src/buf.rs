use std::ops::{Index, IndexMut};

/// Row-major view of a `width x height` matrix, indexed by `(x, y)`.
#[derive(Clone, Copy)]
pub struct MatrixSlice<'a, E> {
    pub width: usize,
    pub height: usize,
    pub stride: usize,
    data: &'a [E],
}

impl<'a, E> MatrixSlice<'a, E> {
    pub fn new(data: &'a [E], width: usize, height: usize) -> Self {
        assert_eq!(data.len(), width * height);
        MatrixSlice {
            width,
            height,
            stride: width,
            data,
        }
    }

    pub fn as_slice(&self) -> &'a [E] {
        self.data
    }

    pub fn row(&self, y: usize) -> &'a [E] {
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    /// Rows from the last to the first.
    pub fn rows_rev(&self) -> impl Iterator<Item = &'a [E]> + 'a {
        let (width, stride, data) = (self.width, self.stride, self.data);
        (0..self.height)
            .rev()
            .map(move |y| &data[y * stride..y * stride + width])
    }
}

impl<'a, E> Index<(usize, usize)> for MatrixSlice<'a, E> {
    type Output = E;

    fn index(&self, (x, y): (usize, usize)) -> &E {
        if x >= self.width || y >= self.height {
            panic!("out of bounds");
        }
        &self.data[y * self.stride + x]
    }
}

pub struct MatrixSliceMut<'a, E> {
    pub width: usize,
    pub height: usize,
    pub stride: usize,
    data: &'a mut [E],
}

impl<'a, E> MatrixSliceMut<'a, E> {
    pub fn new(data: &'a mut [E], width: usize, height: usize) -> Self {
        assert_eq!(data.len(), width * height);
        MatrixSliceMut {
            width,
            height,
            stride: width,
            data,
        }
    }

    pub fn as_const(&self) -> MatrixSlice<'_, E> {
        MatrixSlice {
            width: self.width,
            height: self.height,
            stride: self.stride,
            data: &*self.data,
        }
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [E] {
        let start = y * self.stride;
        &mut self.data[start..start + self.width]
    }

    pub fn fill(&mut self, value: E)
    where
        E: Clone,
    {
        self.data.fill(value);
    }
}

impl<'a, E> Index<(usize, usize)> for MatrixSliceMut<'a, E> {
    type Output = E;

    fn index(&self, (x, y): (usize, usize)) -> &E {
        if x >= self.width || y >= self.height {
            panic!("out of bounds");
        }
        &self.data[y * self.stride + x]
    }
}

impl<'a, E> IndexMut<(usize, usize)> for MatrixSliceMut<'a, E> {
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut E {
        if x >= self.width || y >= self.height {
            panic!("out of bounds");
        }
        &mut self.data[y * self.stride + x]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexes_by_column_then_row() {
        let mut data: Vec<u32> = (0..6).collect();
        let mut m = MatrixSliceMut::new(&mut data, 3, 2);
        assert_eq!(m[(2, 0)], 2);
        assert_eq!(m[(0, 1)], 3);
        m[(1, 1)] = 40;
        assert_eq!(m.row_mut(1), &[3, 40, 5]);
        let rows: Vec<_> = m.as_const().rows_rev().collect();
        assert_eq!(rows, vec![&[3, 40, 5][..], &[0, 1, 2][..]]);
    }
}
