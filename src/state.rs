use std::sync::Arc;
use crate::config::Config;
use crate::macc::{ChartRenderer, PlottersRenderer};
use crate::services::AccountService;

// Application state shared between handlers
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub config: Arc<Config>,
    pub renderer: Arc<dyn ChartRenderer>,
}

impl AppState {
    pub fn new(accounts: AccountService, config: Config) -> Self {
        let renderer = Arc::new(PlottersRenderer::from(&config.chart));
        Self {
            accounts,
            config: Arc::new(config),
            renderer,
        }
    }

    #[cfg(test)]
    pub fn with_renderer(mut self, renderer: Arc<dyn ChartRenderer>) -> Self {
        self.renderer = renderer;
        self
    }
}
