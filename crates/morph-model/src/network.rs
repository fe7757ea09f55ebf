use morph_core::Transform;
use ndarray::{Array1, Array2};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Pointwise nonlinearity applied after a dense layer's affine map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Tanh,
    /// No nonlinearity; used after the final layer.
    Identity,
}

impl Activation {
    #[inline]
    pub fn eval(self, x: f64) -> f64 {
        match self {
            Activation::Tanh => x.tanh(),
            Activation::Identity => x,
        }
    }

    /// Derivative expressed in terms of the activation output.
    #[inline]
    pub fn derivative_from_output(self, y: f64) -> f64 {
        match self {
            Activation::Tanh => 1.0 - y * y,
            Activation::Identity => 1.0,
        }
    }
}

/// One dense affine layer. Weight is (out, in); the activation runs on
/// the affine output.
#[derive(Debug, Clone)]
pub struct DenseLayer {
    pub weight: Array2<f64>,
    pub bias: Array1<f64>,
    pub activation: Activation,
}

impl DenseLayer {
    pub fn forward(&self, input: &Array1<f64>) -> Array1<f64> {
        let mut out = self.weight.dot(input) + &self.bias;
        if self.activation != Activation::Identity {
            out.mapv_inplace(|x| self.activation.eval(x));
        }
        out
    }
}

/// An ordered stack of dense layers with the tanh nonlinearity between
/// them and none after the last.
///
/// Parameters are mutable only while a fitter owns the model exclusively;
/// once fitting returns, `apply` reads them without synchronization.
#[derive(Debug, Clone)]
pub struct NetworkModel {
    pub layers: Vec<DenseLayer>,
}

impl NetworkModel {
    /// Builds an untrained network with Xavier-uniform weights and zero
    /// biases, deterministic for a given seed.
    pub fn with_random_weights(input: usize, hidden: &[usize], output: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut sizes = Vec::with_capacity(hidden.len() + 2);
        sizes.push(input);
        sizes.extend_from_slice(hidden);
        sizes.push(output);

        let mut layers = Vec::with_capacity(sizes.len() - 1);
        for pair in sizes.windows(2) {
            let (fan_in, fan_out) = (pair[0], pair[1]);
            let bound = (6.0 / (fan_in + fan_out) as f64).sqrt();
            let weight =
                Array2::from_shape_fn((fan_out, fan_in), |_| rng.gen_range(-bound..bound));
            let last = layers.len() + 1 == sizes.len() - 1;
            layers.push(DenseLayer {
                weight,
                bias: Array1::zeros(fan_out),
                activation: if last {
                    Activation::Identity
                } else {
                    Activation::Tanh
                },
            });
        }
        Self { layers }
    }

    pub fn input_dim(&self) -> usize {
        self.layers.first().map_or(0, |l| l.weight.ncols())
    }

    pub fn output_dim(&self) -> usize {
        self.layers.last().map_or(0, |l| l.weight.nrows())
    }
}

impl Transform for NetworkModel {
    fn apply(&self, input: &Array1<f64>) -> Array1<f64> {
        let mut current = input.clone();
        for layer in &self.layers {
            current = layer.forward(&current);
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn layer_shapes_follow_the_size_chain() {
        let net = NetworkModel::with_random_weights(16, &[300, 500], 16, 7);
        assert_eq!(net.layers.len(), 3);
        assert_eq!(net.layers[0].weight.shape(), &[300, 16]);
        assert_eq!(net.layers[1].weight.shape(), &[500, 300]);
        assert_eq!(net.layers[2].weight.shape(), &[16, 500]);
        assert_eq!(net.input_dim(), 16);
        assert_eq!(net.output_dim(), 16);
    }

    #[test]
    fn tanh_between_layers_none_after_last() {
        let net = NetworkModel::with_random_weights(4, &[3, 5], 4, 1);
        assert_eq!(net.layers[0].activation, Activation::Tanh);
        assert_eq!(net.layers[1].activation, Activation::Tanh);
        assert_eq!(net.layers[2].activation, Activation::Identity);
    }

    #[test]
    fn same_seed_same_parameters() {
        let a = NetworkModel::with_random_weights(8, &[6], 8, 99);
        let b = NetworkModel::with_random_weights(8, &[6], 8, 99);
        assert_eq!(a.layers[0].weight, b.layers[0].weight);
        assert_eq!(a.layers[1].weight, b.layers[1].weight);
    }

    #[test]
    fn apply_is_deterministic() {
        let net = NetworkModel::with_random_weights(6, &[4, 4], 6, 3);
        let input = arr1(&[0.1, -0.2, 0.3, -0.4, 0.5, -0.6]);
        assert_eq!(net.apply(&input), net.apply(&input));
    }

    #[test]
    fn output_stays_finite_for_unit_range_input() {
        let net = NetworkModel::with_random_weights(10, &[8, 8], 10, 42);
        let input = Array1::from_elem(10, 1.0);
        assert!(net.apply(&input).iter().all(|v| v.is_finite()));
    }
}
