// Application state for HTTP handlers
use crate::application::panel_service::ChartPanel;
use tokio::sync::Mutex;

/// One panel per process. Handlers hold the lock for a whole draw, so draws never interleave.
pub struct AppState {
    pub panel: Mutex<ChartPanel>,
}

impl AppState {
    pub fn new(panel: ChartPanel) -> Self {
        Self {
            panel: Mutex::new(panel),
        }
    }
}
