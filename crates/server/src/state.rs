use std::sync::Arc;

use marquee_core::{
    BookingCoordinator, Config, SanitizedConfig, SeatLedger, SessionCatalog, UserDirectory,
};

/// Shared application state
pub struct AppState {
    config: Config,
    catalog: SessionCatalog,
    coordinator: BookingCoordinator,
    ledger: SeatLedger,
    users: Arc<dyn UserDirectory>,
}

impl AppState {
    pub fn new(
        config: Config,
        catalog: SessionCatalog,
        coordinator: BookingCoordinator,
        ledger: SeatLedger,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            config,
            catalog,
            coordinator,
            ledger,
            users,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn catalog(&self) -> &SessionCatalog {
        &self.catalog
    }

    pub fn coordinator(&self) -> &BookingCoordinator {
        &self.coordinator
    }

    pub fn ledger(&self) -> &SeatLedger {
        &self.ledger
    }

    pub fn users(&self) -> &dyn UserDirectory {
        self.users.as_ref()
    }
}
