pub mod linear;
pub mod network;
pub mod persist;

pub use linear::LinearModel;
pub use network::{Activation, DenseLayer, NetworkModel};
pub use persist::{decode, encode, load_model, save_model, Model};
