pub mod least_squares;
pub mod network_fit;
pub mod pairs;
pub mod report;

pub use least_squares::{LeastSquaresFitter, LeastSquaresSolver, QrSolver};
pub use network_fit::{DampedCurvatureOptimizer, NetworkFitter, Optimizer};
pub use pairs::{build_pairs, TrainingPair};
pub use report::{error_report, ErrorReport};
