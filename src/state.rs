use std::sync::Arc;

use crate::runtime::TextGenerator;

// app's shared state, one generator shared by every request
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<dyn TextGenerator>,
}

impl AppState {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}
