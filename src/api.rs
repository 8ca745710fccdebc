//! Request/response shapes for an HTTP front end.
//!
//! Transport is left to the embedding server. A failed call becomes
//! `success: false` with an error message and never carries an image.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::AssetIndex;
use crate::generator::generate;
use crate::resolver::{GenerationOptions, ResolvedTraitSet};
use crate::rng::Seed;

/// Body of a generate request: `{"seed": 1234, "dragonType": "fire", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub seed: Seed,
    #[serde(flatten)]
    pub options: GenerationOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub success: bool,
    /// `data:image/png;base64,...`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub logs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traits: Option<ResolvedTraitSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Short failure code, e.g. `asset_not_found`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Run one request against `index`.
pub fn handle(index: &AssetIndex, request: &GenerateRequest) -> GenerateResponse {
    match generate(index, &request.seed, &request.options) {
        Ok(generation) => GenerateResponse {
            success: true,
            image: Some(generation.data_uri()),
            logs: generation.logs.into_lines(),
            traits: Some(generation.traits),
            error: None,
            kind: None,
        },
        Err(e) => {
            warn!(seed = %request.seed, kind = e.kind(), "generate request failed: {}", e);
            GenerateResponse {
                success: false,
                image: None,
                logs: Vec::new(),
                traits: None,
                error: Some(e.to_string()),
                kind: Some(e.kind().to_string()),
            }
        }
    }
}

/// Parse a JSON body and handle it; malformed bodies also produce
/// `success: false`.
pub fn handle_json(index: &AssetIndex, body: &str) -> GenerateResponse {
    match serde_json::from_str::<GenerateRequest>(body) {
        Ok(request) => handle(index, &request),
        Err(e) => GenerateResponse {
            success: false,
            image: None,
            logs: Vec::new(),
            traits: None,
            error: Some(format!("Invalid request body: {}", e)),
            kind: Some("invalid_request".to_string()),
        },
    }
}
