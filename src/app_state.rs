use crate::model::LoadedModel;
use crate::predictor::PredictionService;

/// State injected into every handler; built once at startup
#[derive(Clone)]
pub struct AppState {
    pub predictor: PredictionService,
}

impl AppState {
    pub fn new(predictor: PredictionService) -> Self {
        Self { predictor }
    }

    pub fn from_model(loaded: LoadedModel) -> Self {
        Self::new(PredictionService::new(loaded))
    }
}
