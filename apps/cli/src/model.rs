use std::{path::Path, sync::Arc};

use joinwatch_core::{LinearModel, ModelError, Scorer};

pub const FEATURE_DIM: usize = 10;

const WEIGHTS: [f64; FEATURE_DIM] = [
    -10.01, -239.82, 519.85, 324.38, -792.18, 476.74, 101.04, 177.06, 751.27, 67.63,
];
const INTERCEPT: f64 = 152.13;

/// Linear fit over ten standardized features. Also the rule the generator
/// derives ground truth from, so the default RMSE tracks the injected noise.
pub fn default_model() -> LinearModel {
    LinearModel::new(WEIGHTS.to_vec(), INTERCEPT)
}

pub async fn load_scorer(path: Option<&Path>) -> Result<Arc<dyn Scorer>, ModelError> {
    let model = match path {
        Some(path) => LinearModel::load(path).await?,
        None => default_model(),
    };

    if model.dimension() != FEATURE_DIM {
        return Err(ModelError::Dimension {
            expected: FEATURE_DIM,
            actual: model.dimension(),
        });
    }
    Ok(Arc::new(model))
}
