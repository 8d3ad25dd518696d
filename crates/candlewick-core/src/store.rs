use std::sync::Arc;

use candlewick_warehouse::{ObservationRow, Warehouse, WarehouseError};
use thiserror::Error;

use crate::diagnostics::{Diagnostic, DiagnosticSink, Stage};
use crate::PriceObservation;

/// Store-stage failure for one symbol batch. Nothing from the batch was kept.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Warehouse(#[from] WarehouseError),

    #[error("observation cannot be stored: {0}")]
    Unrepresentable(String),
}

/// Durable sink for one symbol's observations.
pub trait RecordStore: Send + Sync {
    /// Persist `observations` as one unit and return how many were written.
    /// An empty batch returns `Ok(0)` without touching storage.
    fn store(&self, observations: &[PriceObservation]) -> Result<usize, StoreError>;
}

/// [`RecordStore`] over the DuckDB warehouse.
#[derive(Clone)]
pub struct WarehouseStore {
    warehouse: Warehouse,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl WarehouseStore {
    pub fn new(warehouse: Warehouse, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            warehouse,
            diagnostics,
        }
    }

    pub fn warehouse(&self) -> &Warehouse {
        &self.warehouse
    }
}

impl RecordStore for WarehouseStore {
    fn store(&self, observations: &[PriceObservation]) -> Result<usize, StoreError> {
        if observations.is_empty() {
            return Ok(0);
        }

        let rows = observations
            .iter()
            .map(to_row)
            .collect::<Result<Vec<_>, _>>()?;
        let stored = self.warehouse.upsert_observations(&rows)?;

        let symbol = observations[0].symbol.as_str();
        self.diagnostics.emit(
            Diagnostic::debug(Stage::Store, format!("upserted {stored} observations"))
                .for_symbol(symbol),
        );
        Ok(stored)
    }
}

fn to_row(observation: &PriceObservation) -> Result<ObservationRow, StoreError> {
    let volume = i64::try_from(observation.volume).map_err(|_| {
        StoreError::Unrepresentable(format!(
            "volume {} at {} exceeds BIGINT",
            observation.volume, observation.timestamp
        ))
    })?;

    Ok(ObservationRow {
        symbol: observation.symbol.as_str().to_owned(),
        timestamp: observation.timestamp.format_wire(),
        open: observation.open,
        high: observation.high,
        low: observation.low,
        close: observation.close,
        volume,
        last_refreshed: observation.last_refreshed.map(|ts| ts.format_wire()),
        time_zone: observation.time_zone.clone(),
    })
}
