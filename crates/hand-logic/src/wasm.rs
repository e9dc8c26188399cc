//! WASM bindings for the frontend hand picker

#![cfg(feature = "wasm")]

use std::sync::Arc;

use wasm_bindgen::prelude::*;

use crate::{EngineError, GameConfig, HandCatalog, HandDraw, Outcome, SeededRng, TournamentGraph};

fn load(config_json: Option<String>) -> Result<(Arc<HandCatalog>, Arc<TournamentGraph>), JsError> {
    let config = match config_json {
        Some(json) => GameConfig::from_json(&json)
            .map_err(|e| JsError::new(&format!("Invalid config: {}", e)))?,
        None => GameConfig::reference(),
    };
    config.build().map_err(|e| JsError::new(&e.to_string()))
}

#[derive(serde::Serialize)]
struct HandInfo {
    id: usize,
    name: String,
    beats: Vec<usize>,
}

/// List every hand with the hands it beats
///
/// Uses the built-in seven-hand table when `config_json` is omitted.
#[wasm_bindgen]
pub fn list_hands(config_json: Option<String>) -> Result<JsValue, JsError> {
    let (catalog, graph) = load(config_json)?;
    let hands = catalog
        .hands()
        .iter()
        .map(|hand| {
            Ok(HandInfo {
                id: hand.id,
                name: hand.name.clone(),
                beats: graph.victims(hand.id)?,
            })
        })
        .collect::<Result<Vec<_>, EngineError>>()
        .map_err(|e| JsError::new(&e.to_string()))?;

    serde_wasm_bindgen::to_value(&hands)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

/// Outcome label ("win", "lose", "draw") for hand `a` against hand `b`
#[wasm_bindgen]
pub fn compare_hands(a: u32, b: u32, config_json: Option<String>) -> Result<String, JsError> {
    let (_, graph) = load(config_json)?;
    graph
        .compare(a as usize, b as usize)
        .map(|outcome| outcome.label().to_string())
        .map_err(|e| JsError::new(&e.to_string()))
}

#[derive(serde::Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
struct RoundPreview {
    player_hand_index: usize,
    opponent_hand_index: usize,
    outcome: Outcome,
}

fn preview(
    catalog: &HandCatalog,
    graph: &TournamentGraph,
    player_hand: i64,
    seed: &[u8; 32],
    nonce: u64,
) -> Result<RoundPreview, EngineError> {
    let player = catalog.parse_index(player_hand)?;
    let opponent = SeededRng::new(seed, nonce).draw(catalog.size());
    Ok(RoundPreview {
        player_hand_index: player,
        opponent_hand_index: opponent,
        outcome: graph.compare(player, opponent)?,
    })
}

/// Replay a seeded round without recording it
///
/// # Arguments
/// * `player_hand` - Index of the player's hand
/// * `seed` - 32-byte randomness seed
/// * `nonce` - Round counter mixed into the seed
/// * `config_json` - Win table to play against; the built-in one when omitted
#[wasm_bindgen]
pub fn replay_round(
    player_hand: u32,
    seed: &[u8],
    nonce: u32,
    config_json: Option<String>,
) -> Result<JsValue, JsError> {
    let seed_arr: [u8; 32] = seed
        .try_into()
        .map_err(|_| JsError::new("Seed must be exactly 32 bytes"))?;
    let (catalog, graph) = load(config_json)?;
    let round = preview(&catalog, &graph, player_hand as i64, &seed_arr, nonce as u64)
        .map_err(|e| JsError::new(&e.to_string()))?;

    serde_wasm_bindgen::to_value(&round)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

#[derive(serde::Serialize)]
struct ValidationResult {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Validate a config's win table
///
/// Returns `{valid: true}` or `{valid: false, error: "..."}`.
/// Never throws; validation errors are returned as structured data.
#[wasm_bindgen]
pub fn validate_table(config_json: &str) -> JsValue {
    let result = match GameConfig::from_json(config_json).and_then(|c| c.build()) {
        Ok(_) => ValidationResult { valid: true, error: None },
        Err(e) => ValidationResult { valid: false, error: Some(e.to_string()) },
    };
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}
