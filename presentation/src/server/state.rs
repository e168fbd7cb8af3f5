//! Shared handler state

use council_application::{ConversationStore, ModelGateway, RunTurnUseCase};
use std::sync::Arc;

/// State shared by every handler
pub struct AppState<G: ModelGateway + 'static> {
    pub turns: Arc<RunTurnUseCase<G>>,
    pub store: Arc<dyn ConversationStore>,
}

impl<G: ModelGateway + 'static> AppState<G> {
    pub fn new(turns: Arc<RunTurnUseCase<G>>, store: Arc<dyn ConversationStore>) -> Self {
        Self { turns, store }
    }
}

impl<G: ModelGateway + 'static> Clone for AppState<G> {
    fn clone(&self) -> Self {
        Self {
            turns: Arc::clone(&self.turns),
            store: Arc::clone(&self.store),
        }
    }
}
