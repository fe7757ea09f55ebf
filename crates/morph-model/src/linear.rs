use morph_core::Transform;
use ndarray::{Array1, Array2};

/// A single square matrix applied identically to every feature vector.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    matrix: Array2<f64>,
}

impl LinearModel {
    /// The matrix must be square; its side is the model's window size.
    pub fn new(matrix: Array2<f64>) -> Self {
        assert_eq!(
            matrix.nrows(),
            matrix.ncols(),
            "linear model matrix must be square"
        );
        Self { matrix }
    }

    pub fn window_size(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }
}

impl Transform for LinearModel {
    fn apply(&self, input: &Array1<f64>) -> Array1<f64> {
        self.matrix.dot(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn apply_is_a_matrix_vector_product() {
        let model = LinearModel::new(Array2::from_shape_vec((2, 2), vec![1.0, 2.0, 3.0, 4.0]).unwrap());
        let out = model.apply(&arr1(&[1.0, 1.0]));
        assert_eq!(out, arr1(&[3.0, 7.0]));
    }

    #[test]
    fn apply_is_deterministic() {
        let model = LinearModel::new(Array2::from_shape_vec(
            (3, 3),
            vec![0.3, -0.1, 0.7, 0.2, 0.9, -0.4, 0.5, 0.6, 0.1],
        )
        .unwrap());
        let input = arr1(&[0.25, -0.5, 0.125]);
        let first = model.apply(&input);
        let second = model.apply(&input);
        assert_eq!(first, second);
    }
}
