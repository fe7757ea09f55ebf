//! Full-batch training of the layered network by damped, curvature-aware
//! descent. Per-sample gradients are evaluated in parallel over bounded
//! sub-batches; the damping coefficient adapts between iterations based
//! on how well the quadratic model predicted the actual improvement.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use morph_core::{ConversionConfig, MorphError, Result};
use morph_model::{Activation, NetworkModel};
use ndarray::{Array1, Array2, Axis};
use tracing::{debug, info};

use crate::pairs::TrainingPair;

/// Relative cost improvement below which training stops once the
/// iteration floor has been reached.
const PLATEAU_TOLERANCE: f64 = 1e-4;

/// Trains a network in place against a differentiable cost.
///
/// The fitter only requires stable I/O shapes and a termination policy;
/// the step construction itself sits behind this seam so tests can
/// substitute a trivial optimizer.
pub trait Optimizer {
    fn train(
        &self,
        network: &mut NetworkModel,
        pairs: &[TrainingPair],
        config: &ConversionConfig,
    ) -> Result<()>;
}

/// Iterative second-order fit of the layered nonlinear function on raw
/// sample vectors.
pub struct NetworkFitter<'a> {
    config: &'a ConversionConfig,
}

impl<'a> NetworkFitter<'a> {
    pub fn new(config: &'a ConversionConfig) -> Self {
        Self { config }
    }

    pub fn fit(&self, pairs: &[TrainingPair]) -> Result<NetworkModel> {
        self.fit_with(pairs, &DampedCurvatureOptimizer)
    }

    pub fn fit_with(
        &self,
        pairs: &[TrainingPair],
        optimizer: &dyn Optimizer,
    ) -> Result<NetworkModel> {
        let w = self.config.window_size;
        if pairs.len() < w {
            return Err(MorphError::InsufficientData(format!(
                "have {} usable training pairs, need at least {w}",
                pairs.len()
            )));
        }

        let mut network =
            NetworkModel::with_random_weights(w, &self.config.hidden_sizes, w, self.config.seed);
        info!(
            pairs = pairs.len(),
            layers = network.layers.len(),
            "training network"
        );
        optimizer.train(&mut network, pairs, self.config)?;
        Ok(network)
    }
}

/// Per-parameter gradient with the same shape as the network.
struct Gradient {
    layers: Vec<(Array2<f64>, Array1<f64>)>,
}

impl Gradient {
    fn zeros_like(network: &NetworkModel) -> Self {
        Self {
            layers: network
                .layers
                .iter()
                .map(|l| (Array2::zeros(l.weight.raw_dim()), Array1::zeros(l.bias.raw_dim())))
                .collect(),
        }
    }

    fn accumulate(&mut self, other: &Gradient) {
        for ((w, b), (ow, ob)) in self.layers.iter_mut().zip(&other.layers) {
            w.scaled_add(1.0, ow);
            b.scaled_add(1.0, ob);
        }
    }

    fn scale(&mut self, factor: f64) {
        for (w, b) in &mut self.layers {
            w.mapv_inplace(|v| v * factor);
            b.mapv_inplace(|v| v * factor);
        }
    }

    fn dot(&self, other: &Gradient) -> f64 {
        self.layers
            .iter()
            .zip(&other.layers)
            .map(|((w, b), (ow, ob))| (w * ow).sum() + (b * ob).sum())
            .sum()
    }

    fn norm_squared(&self) -> f64 {
        self.dot(self)
    }
}

/// Moves the parameters by `scale` times the gradient direction.
fn apply_step(network: &mut NetworkModel, gradient: &Gradient, scale: f64) {
    for (layer, (gw, gb)) in network.layers.iter_mut().zip(&gradient.layers) {
        layer.weight.scaled_add(scale, gw);
        layer.bias.scaled_add(scale, gb);
    }
}

/// Backpropagation for one training pair. Returns the gradient of the
/// half squared error and the loss itself.
fn sample_gradient(network: &NetworkModel, pair: &TrainingPair) -> (Gradient, f64) {
    let mut activations = Vec::with_capacity(network.layers.len() + 1);
    activations.push(pair.source.clone());
    for layer in &network.layers {
        let next = layer.forward(activations.last().unwrap_or(&pair.source));
        activations.push(next);
    }

    let output = &activations[network.layers.len()];
    let diff = output - &pair.target;
    let loss = 0.5 * diff.dot(&diff);

    let mut gradient = Gradient::zeros_like(network);
    let mut delta = diff;
    for (idx, layer) in network.layers.iter().enumerate().rev() {
        let out = &activations[idx + 1];
        let dz = match layer.activation {
            Activation::Identity => delta,
            Activation::Tanh => {
                &delta * &out.mapv(|y| Activation::Tanh.derivative_from_output(y))
            }
        };
        let prev = &activations[idx];
        gradient.layers[idx].0 = dz
            .view()
            .insert_axis(Axis(1))
            .dot(&prev.view().insert_axis(Axis(0)));
        gradient.layers[idx].1 = dz.clone();
        delta = layer.weight.t().dot(&dz);
    }
    (gradient, loss)
}

/// Mean gradient and mean cost over the whole batch, evaluated by a
/// bounded pool of workers pulling sub-batches of at most
/// `max_sub_batch` pairs. All workers finish before results combine; no
/// partial results are observable.
fn batch_gradient(
    network: &NetworkModel,
    pairs: &[TrainingPair],
    config: &ConversionConfig,
) -> Result<(Gradient, f64)> {
    let sub_batch = config.max_sub_batch.max(1);
    let batches: Vec<&[TrainingPair]> = pairs.chunks(sub_batch).collect();
    let workers = config.concurrency.max(1).min(batches.len());
    let cursor = AtomicUsize::new(0);

    let partials = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let cursor = &cursor;
                let batches = &batches;
                scope.spawn(move || {
                    let mut grad = Gradient::zeros_like(network);
                    let mut loss = 0.0;
                    loop {
                        let index = cursor.fetch_add(1, Ordering::Relaxed);
                        let Some(batch) = batches.get(index) else {
                            break;
                        };
                        for pair in *batch {
                            let (g, l) = sample_gradient(network, pair);
                            grad.accumulate(&g);
                            loss += l;
                        }
                    }
                    (grad, loss)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join())
            .collect::<Vec<_>>()
    });

    let mut total = Gradient::zeros_like(network);
    let mut cost = 0.0;
    for partial in partials {
        let (grad, loss) = partial
            .map_err(|_| MorphError::Numeric("gradient worker panicked".into()))?;
        total.accumulate(&grad);
        cost += loss;
    }
    let scale = 1.0 / pairs.len() as f64;
    total.scale(scale);
    Ok((total, cost * scale))
}

/// Damped descent along the gradient with directional curvature taken
/// from a gradient finite difference. The damping coefficient rises when
/// an iteration's actual improvement underperforms its quadratic
/// prediction and falls otherwise.
pub struct DampedCurvatureOptimizer;

impl Optimizer for DampedCurvatureOptimizer {
    fn train(
        &self,
        network: &mut NetworkModel,
        pairs: &[TrainingPair],
        config: &ConversionConfig,
    ) -> Result<()> {
        let mut damping = config.step_damping;
        let (mut gradient, mut cost) = batch_gradient(network, pairs, config)?;
        if !cost.is_finite() {
            return Err(MorphError::Numeric("initial cost is not finite".into()));
        }

        for iteration in 0..config.max_iterations {
            let grad_norm_sq = gradient.norm_squared();
            if grad_norm_sq <= f64::EPSILON {
                debug!(iteration, "gradient vanished; stopping");
                break;
            }

            // Curvature along the descent direction d = -g, probed with a
            // second gradient evaluation a small step away.
            let epsilon = (1e-4 / grad_norm_sq.sqrt()).min(1.0);
            let mut probe = network.clone();
            apply_step(&mut probe, &gradient, -epsilon);
            let (probe_gradient, _) = batch_gradient(&probe, pairs, config)?;
            let curvature = (grad_norm_sq - probe_gradient.dot(&gradient)) / epsilon;

            let denominator = curvature.max(0.0) + damping * grad_norm_sq;
            if !denominator.is_finite() || denominator <= 0.0 {
                return Err(MorphError::Numeric(format!(
                    "degenerate curvature estimate: {curvature}"
                )));
            }
            let step = grad_norm_sq / denominator;
            let predicted = 0.5 * step * grad_norm_sq;

            let mut candidate = network.clone();
            apply_step(&mut candidate, &gradient, -step);
            let (candidate_gradient, candidate_cost) = batch_gradient(&candidate, pairs, config)?;
            if !candidate_cost.is_finite() {
                return Err(MorphError::Numeric("cost diverged during training".into()));
            }

            let actual = cost - candidate_cost;
            let ratio = if predicted > 0.0 { actual / predicted } else { 0.0 };

            let previous_cost = cost;
            let accepted = actual > 0.0;
            if accepted {
                *network = candidate;
                cost = candidate_cost;
                gradient = candidate_gradient;
                if ratio > 0.75 {
                    damping *= 2.0 / 3.0;
                } else if ratio < 0.25 {
                    damping *= 1.5;
                }
            } else {
                // Step rejected; tighten the damping and retry.
                damping *= 2.0;
            }
            debug!(iteration, cost, damping, ratio, "optimizer iteration");

            if accepted && iteration + 1 >= config.min_iterations {
                let relative = (previous_cost - cost) / previous_cost.max(f64::MIN_POSITIVE);
                if relative < PLATEAU_TOLERANCE {
                    info!(iteration, cost, "improvement plateaued; stopping");
                    break;
                }
            }
        }
        Ok(())
    }
}
