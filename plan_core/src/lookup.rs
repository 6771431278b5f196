//! # External Lookups
//!
//! The engine consumes two backend lookups through these traits. Transport
//! is the implementor's business; the engine only sees the request and the
//! fields it needs from the response.
//!
//! - [`MarkerSource`] - markers for a style and size set, loaded into a
//!   [`MarkerCatalog`]
//! - [`DyeLotPieceSource`] - pieces available for a dye lot / size filter,
//!   used to auto-fill a collaretto row's `pieces`

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::{PlanError, PlanResult};
use crate::markers::{Marker, MarkerCatalog};
use crate::techniques::Technique;

/// Question sent to the dye-lot piece lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieceRequest {
    pub bagno: String,
    pub table_id: Uuid,
    pub row_id: Uuid,
    pub table_type: Technique,
    pub sizes: String,
}

/// Pieces of a dye lot still available to plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieceAvailability {
    /// Total for the requested size filter; the only value the engine uses
    pub pieces: f64,

    /// Per-size breakdown, when the backend provides it
    #[serde(default)]
    pub by_size: BTreeMap<String, f64>,
}

/// Backend answering "how many pieces of this dye lot are available".
#[async_trait]
pub trait DyeLotPieceSource: Send + Sync {
    async fn available_pieces(&self, request: &PieceRequest) -> PlanResult<PieceAvailability>;
}

/// Backend listing the markers of a style.
#[async_trait]
pub trait MarkerSource: Send + Sync {
    async fn markers(&self, style: &str, sizes: &[String]) -> PlanResult<Vec<Marker>>;
}

/// Fetch the markers of a style and build the catalog.
///
/// Failures are reported as [`PlanError::LookupFailed`].
pub async fn load_marker_catalog(
    source: &dyn MarkerSource,
    style: &str,
    sizes: &[String],
) -> PlanResult<MarkerCatalog> {
    match source.markers(style, sizes).await {
        Ok(markers) => {
            let catalog = MarkerCatalog::from_markers(markers);
            info!(style, markers = catalog.len(), "Loaded marker catalog");
            Ok(catalog)
        }
        Err(err) => {
            warn!(style, error = %err, "Marker lookup failed");
            Err(match err {
                PlanError::LookupFailed { .. } => err,
                other => PlanError::lookup_failed("markers", other.to_string()),
            })
        }
    }
}
