//! On-disk model artifact: a tagged JSON document with explicit
//! dimensions and flat row-major parameter data, validated on decode.

use std::fs;
use std::path::Path;

use morph_core::{MorphError, Result, Transform};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::linear::LinearModel;
use crate::network::{Activation, DenseLayer, NetworkModel};

/// Either fitted artifact, ready to persist or apply.
#[derive(Debug, Clone)]
pub enum Model {
    Linear(LinearModel),
    Network(NetworkModel),
}

impl Model {
    pub fn as_transform(&self) -> &dyn Transform {
        match self {
            Model::Linear(m) => m,
            Model::Network(m) => m,
        }
    }

    /// The window size the model was fitted with (its I/O dimension).
    pub fn window_size(&self) -> usize {
        match self {
            Model::Linear(m) => m.window_size(),
            Model::Network(m) => m.input_dim(),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ModelDoc {
    Linear {
        rows: usize,
        cols: usize,
        data: Vec<f64>,
    },
    Network {
        layers: Vec<LayerDoc>,
    },
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum LayerDoc {
    Dense {
        rows: usize,
        cols: usize,
        weight: Vec<f64>,
        bias: Vec<f64>,
        activation: Activation,
    },
}

pub fn encode(model: &Model) -> Result<Vec<u8>> {
    let doc = match model {
        Model::Linear(m) => ModelDoc::Linear {
            rows: m.matrix().nrows(),
            cols: m.matrix().ncols(),
            data: m.matrix().iter().copied().collect(),
        },
        Model::Network(net) => ModelDoc::Network {
            layers: net
                .layers
                .iter()
                .map(|layer| LayerDoc::Dense {
                    rows: layer.weight.nrows(),
                    cols: layer.weight.ncols(),
                    weight: layer.weight.iter().copied().collect(),
                    bias: layer.bias.to_vec(),
                    activation: layer.activation,
                })
                .collect(),
        },
    };
    serde_json::to_vec(&doc).map_err(|e| MorphError::Format(format!("encoding model: {e}")))
}

pub fn decode(bytes: &[u8]) -> Result<Model> {
    let doc: ModelDoc = serde_json::from_slice(bytes)
        .map_err(|e| MorphError::Format(format!("parsing model document: {e}")))?;
    match doc {
        ModelDoc::Linear { rows, cols, data } => {
            if rows != cols {
                return Err(MorphError::Format(format!(
                    "linear model must be square, got {rows}x{cols}"
                )));
            }
            let matrix = Array2::from_shape_vec((rows, cols), data).map_err(|e| {
                MorphError::Format(format!("linear model data does not match {rows}x{cols}: {e}"))
            })?;
            Ok(Model::Linear(LinearModel::new(matrix)))
        }
        ModelDoc::Network { layers } => {
            if layers.is_empty() {
                return Err(MorphError::Format("network model has no layers".into()));
            }
            let mut built = Vec::with_capacity(layers.len());
            let mut prev_out: Option<usize> = None;
            for (idx, layer) in layers.into_iter().enumerate() {
                let LayerDoc::Dense {
                    rows,
                    cols,
                    weight,
                    bias,
                    activation,
                } = layer;
                if let Some(prev) = prev_out {
                    if prev != cols {
                        return Err(MorphError::Format(format!(
                            "layer {idx} expects {cols} inputs but the previous layer outputs {prev}"
                        )));
                    }
                }
                if bias.len() != rows {
                    return Err(MorphError::Format(format!(
                        "layer {idx} bias length {} does not match {rows} outputs",
                        bias.len()
                    )));
                }
                let weight = Array2::from_shape_vec((rows, cols), weight).map_err(|e| {
                    MorphError::Format(format!(
                        "layer {idx} weight data does not match {rows}x{cols}: {e}"
                    ))
                })?;
                prev_out = Some(rows);
                built.push(DenseLayer {
                    weight,
                    bias: Array1::from_vec(bias),
                    activation,
                });
            }
            Ok(Model::Network(NetworkModel { layers: built }))
        }
    }
}

pub fn save_model(path: &Path, model: &Model) -> Result<()> {
    let bytes = encode(model)?;
    fs::write(path, bytes)?;
    Ok(())
}

pub fn load_model(path: &Path) -> Result<Model> {
    let bytes = fs::read(path)?;
    decode(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn linear_model_round_trips() {
        let matrix = Array2::from_shape_vec((2, 2), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let model = Model::Linear(LinearModel::new(matrix.clone()));
        let decoded = decode(&encode(&model).unwrap()).unwrap();
        match decoded {
            Model::Linear(m) => assert_eq!(m.matrix(), &matrix),
            Model::Network(_) => panic!("decoded wrong model kind"),
        }
    }

    #[test]
    fn network_model_round_trips() {
        let net = NetworkModel::with_random_weights(4, &[3], 4, 11);
        let model = Model::Network(net.clone());
        let decoded = decode(&encode(&model).unwrap()).unwrap();
        let input = arr1(&[0.1, 0.2, -0.3, 0.4]);
        assert_eq!(
            model.as_transform().apply(&input),
            decoded.as_transform().apply(&input)
        );
    }

    #[test]
    fn malformed_json_is_a_format_error() {
        let err = decode(b"not a model").unwrap_err();
        assert!(matches!(err, MorphError::Format(_)));
    }

    #[test]
    fn wrong_data_length_is_a_format_error() {
        let doc = br#"{"kind":"linear","rows":2,"cols":2,"data":[1.0,2.0,3.0]}"#;
        assert!(matches!(decode(doc), Err(MorphError::Format(_))));
    }

    #[test]
    fn non_square_linear_model_is_rejected() {
        let doc = br#"{"kind":"linear","rows":2,"cols":3,"data":[1,2,3,4,5,6]}"#;
        assert!(matches!(decode(doc), Err(MorphError::Format(_))));
    }

    #[test]
    fn mismatched_layer_chain_is_rejected() {
        let doc = br#"{"kind":"network","layers":[
            {"kind":"dense","rows":3,"cols":2,"weight":[0,0,0,0,0,0],"bias":[0,0,0],"activation":"tanh"},
            {"kind":"dense","rows":2,"cols":4,"weight":[0,0,0,0,0,0,0,0],"bias":[0,0],"activation":"identity"}
        ]}"#;
        assert!(matches!(decode(doc), Err(MorphError::Format(_))));
    }
}
