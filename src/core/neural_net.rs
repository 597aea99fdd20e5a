//! Neural network surrogates for the radiative transfer functions
//!
//! The retrieval uses two trained networks: one estimating the water vapour
//! column, one mapping windspeed to the parameters of a 2-D Gaussian glint
//! model. Both are evaluated through [`NeuralSurrogate`]; implementations may
//! keep scratch buffers, so every concurrent worker must hold its own copy
//! obtained from [`NeuralSurrogate::duplicate`].

use crate::types::{FlintError, FlintResult};
use ndarray::linalg::general_mat_vec_mul;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// A trained, deterministic function from a fixed-size input vector to a
/// fixed-size output vector.
pub trait NeuralSurrogate: Send + Sync {
    fn input_len(&self) -> usize;

    fn output_len(&self) -> usize;

    /// Evaluate the network. The result depends on `input` only.
    fn evaluate(&mut self, input: &[f64], output: &mut [f64]) -> FlintResult<()>;

    /// Independent copy with the same trained parameters and private scratch state
    fn duplicate(&self) -> Box<dyn NeuralSurrogate>;
}

/// Layer activation function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    Linear,
    Sigmoid,
    Tanh,
}

impl Activation {
    fn apply(&self, x: f64) -> f64 {
        match self {
            Activation::Linear => x,
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::Tanh => x.tanh(),
        }
    }
}

/// Fully connected layer: out = activation(weights · in + bias)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    /// (outputs, inputs)
    pub weights: Array2<f64>,
    pub bias: Array1<f64>,
    pub activation: Activation,
}

impl DenseLayer {
    pub fn new(weights: Array2<f64>, bias: Array1<f64>, activation: Activation) -> Self {
        Self {
            weights,
            bias,
            activation,
        }
    }

    pub fn inputs(&self) -> usize {
        self.weights.ncols()
    }

    pub fn outputs(&self) -> usize {
        self.weights.nrows()
    }
}

/// Multilayer perceptron with optional min-max feature scaling.
///
/// Inputs are mapped from `input_range` onto [0, 1] before the first layer,
/// outputs are mapped from [0, 1] back onto `output_range` after the last.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedForwardNet {
    layers: Vec<DenseLayer>,
    #[serde(default)]
    input_range: Option<Vec<(f64, f64)>>,
    #[serde(default)]
    output_range: Option<Vec<(f64, f64)>>,

    #[serde(skip)]
    input_buffer: Array1<f64>,
    #[serde(skip)]
    layer_buffers: Vec<Array1<f64>>,
}

impl FeedForwardNet {
    pub fn new(
        layers: Vec<DenseLayer>,
        input_range: Option<Vec<(f64, f64)>>,
        output_range: Option<Vec<(f64, f64)>>,
    ) -> FlintResult<Self> {
        let net = Self {
            layers,
            input_range,
            output_range,
            input_buffer: Array1::zeros(0),
            layer_buffers: Vec::new(),
        };
        net.validate()?;
        Ok(net)
    }

    /// Check that the layer stack and the scaling ranges fit together.
    /// Deserialized networks are validated on first evaluation.
    pub fn validate(&self) -> FlintResult<()> {
        let first = self
            .layers
            .first()
            .ok_or_else(|| FlintError::Surrogate("network has no layers".to_string()))?;

        for (k, layer) in self.layers.iter().enumerate() {
            if layer.bias.len() != layer.outputs() {
                return Err(FlintError::Surrogate(format!(
                    "layer {}: bias length {} does not match {} outputs",
                    k,
                    layer.bias.len(),
                    layer.outputs()
                )));
            }
            if k > 0 && layer.inputs() != self.layers[k - 1].outputs() {
                return Err(FlintError::Surrogate(format!(
                    "layer {} expects {} inputs but layer {} produces {}",
                    k,
                    layer.inputs(),
                    k - 1,
                    self.layers[k - 1].outputs()
                )));
            }
        }

        let last_outputs = self.layers[self.layers.len() - 1].outputs();
        check_range("input", self.input_range.as_deref(), first.inputs())?;
        check_range("output", self.output_range.as_deref(), last_outputs)?;
        Ok(())
    }

    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    fn ensure_scratch(&mut self) -> FlintResult<()> {
        if self.layer_buffers.len() == self.layers.len() {
            return Ok(());
        }
        self.validate()?;
        self.input_buffer = Array1::zeros(self.layers[0].inputs());
        self.layer_buffers = self
            .layers
            .iter()
            .map(|layer| Array1::zeros(layer.outputs()))
            .collect();
        Ok(())
    }
}

impl NeuralSurrogate for FeedForwardNet {
    fn input_len(&self) -> usize {
        self.layers.first().map_or(0, |l| l.inputs())
    }

    fn output_len(&self) -> usize {
        self.layers.last().map_or(0, |l| l.outputs())
    }

    fn evaluate(&mut self, input: &[f64], output: &mut [f64]) -> FlintResult<()> {
        self.ensure_scratch()?;
        if input.len() != self.input_len() || output.len() != self.output_len() {
            return Err(FlintError::Surrogate(format!(
                "expected {} inputs and {} outputs, got {} and {}",
                self.input_len(),
                self.output_len(),
                input.len(),
                output.len()
            )));
        }

        for (i, (dst, &x)) in self.input_buffer.iter_mut().zip(input).enumerate() {
            *dst = match &self.input_range {
                Some(range) => {
                    let (lo, hi) = range[i];
                    (x - lo) / (hi - lo)
                }
                None => x,
            };
        }

        for k in 0..self.layers.len() {
            let layer = &self.layers[k];
            let (before, rest) = self.layer_buffers.split_at_mut(k);
            let out = &mut rest[0];
            let previous = if k == 0 {
                &self.input_buffer
            } else {
                &before[k - 1]
            };

            out.assign(&layer.bias);
            general_mat_vec_mul(1.0, &layer.weights, previous, 1.0, out);
            out.mapv_inplace(|v| layer.activation.apply(v));
        }

        let last = &self.layer_buffers[self.layers.len() - 1];
        for (i, (dst, &y)) in output.iter_mut().zip(last.iter()).enumerate() {
            *dst = match &self.output_range {
                Some(range) => {
                    let (lo, hi) = range[i];
                    lo + y * (hi - lo)
                }
                None => y,
            };
        }
        Ok(())
    }

    fn duplicate(&self) -> Box<dyn NeuralSurrogate> {
        Box::new(Self {
            layers: self.layers.clone(),
            input_range: self.input_range.clone(),
            output_range: self.output_range.clone(),
            input_buffer: Array1::zeros(0),
            layer_buffers: Vec::new(),
        })
    }
}

fn check_range(which: &str, range: Option<&[(f64, f64)]>, expected: usize) -> FlintResult<()> {
    let range = match range {
        Some(r) => r,
        None => return Ok(()),
    };
    if range.len() != expected {
        return Err(FlintError::Surrogate(format!(
            "{} scaling has {} entries, network has {}",
            which,
            range.len(),
            expected
        )));
    }
    if let Some(i) = range.iter().position(|(lo, hi)| lo == hi) {
        return Err(FlintError::Surrogate(format!(
            "{} scaling entry {} has an empty range",
            which, i
        )));
    }
    Ok(())
}
