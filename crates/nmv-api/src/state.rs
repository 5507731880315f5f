use std::sync::Arc;

use nmv_collect::{ClientCollectionService, CollectionService, Scheduler};
use nmv_store::StateStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn StateStore>,
    pub indicator: Arc<dyn CollectionService>,
    pub client: Arc<ClientCollectionService>,
    pub scheduler: Arc<Scheduler>,
}
