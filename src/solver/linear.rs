use crate::field::Field;

/// Solves the square system `rows * x = rhs` by Gauss-Jordan elimination over
/// an exact field. Returns `None` when the system is singular.
pub(crate) fn solve_square<C: Field>(rows: Vec<Vec<C>>, rhs: Vec<C>) -> Option<Vec<C>> {
    let n = rhs.len();
    let mut matrix = Matrix::augmented(rows, rhs);

    for col in 0..n {
        let pivot_idx = (col..n).find(|&r| !matrix.get(r, col).is_zero())?;
        matrix.swap_rows(col, pivot_idx);

        // Normalize pivot row.
        let inv = matrix.get(col, col).inv()?;
        for c in col..matrix.cols {
            let scaled = matrix.get(col, c).mul(&inv);
            *matrix.get_mut(col, c) = scaled;
        }

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = matrix.get(row, col).clone();
            if factor.is_zero() {
                continue;
            }
            for c in col..matrix.cols {
                let updated = matrix.get(row, c).sub(&factor.mul(matrix.get(col, c)));
                *matrix.get_mut(row, c) = updated;
            }
        }
    }

    Some((0..n).map(|r| matrix.get(r, n).clone()).collect())
}

struct Matrix<C> {
    cols: usize,
    data: Vec<C>,
}

impl<C: Field> Matrix<C> {
    fn augmented(rows: Vec<Vec<C>>, rhs: Vec<C>) -> Self {
        let cols = rhs.len() + 1;
        let mut data = Vec::with_capacity(rhs.len() * cols);
        for (row, value) in rows.into_iter().zip(rhs) {
            debug_assert_eq!(row.len() + 1, cols);
            data.extend(row);
            data.push(value);
        }
        Matrix { cols, data }
    }

    fn idx(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    fn get(&self, row: usize, col: usize) -> &C {
        &self.data[self.idx(row, col)]
    }

    fn get_mut(&mut self, row: usize, col: usize) -> &mut C {
        let idx = self.idx(row, col);
        &mut self.data[idx]
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let cols = self.cols;
        for offset in 0..cols {
            self.data.swap(a * cols + offset, b * cols + offset);
        }
    }
}
