//! Read-only stock and camera lookup tables.
//!
//! ```json
//! {
//!   "stocks": [
//!     { "id": "Gold 200", "code": "G200", "manufacturer": "Kodak", "name": "Gold 200",
//!       "box_speed": 200, "process": "C41", "is_color": true, "is_negative": true }
//!   ],
//!   "cameras": [
//!     { "id": "F3", "brand": "Nikon", "model": "F3", "film_type": "135", "film_format": "35mm" }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::ReferenceError;

/// One film stock. `id` is the value written into the scene tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    pub id: String,
    /// Short code, e.g. `G200`
    #[serde(default)]
    pub code: Option<String>,
    pub manufacturer: String,
    pub name: String,
    pub box_speed: u32,
    pub process: String,
    #[serde(default)]
    pub is_color: bool,
    #[serde(default)]
    pub is_black_and_white: bool,
    #[serde(default)]
    pub is_infrared: bool,
    #[serde(default)]
    pub is_negative: bool,
    #[serde(default)]
    pub is_slide: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraRecord {
    pub id: String,
    pub brand: String,
    pub model: String,
    #[serde(default)]
    pub film_type: Option<String>,
    #[serde(default)]
    pub film_format: Option<String>,
}

#[derive(Deserialize)]
struct ReferenceDocument {
    #[serde(default)]
    stocks: Vec<StockRecord>,
    #[serde(default)]
    cameras: Vec<CameraRecord>,
}

/// Stock table keyed by id, camera table keyed by lower-cased brand and model
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    stocks: HashMap<String, StockRecord>,
    cameras: HashMap<(String, String), CameraRecord>,
}

fn camera_key(brand: &str, model: &str) -> (String, String) {
    (brand.trim().to_lowercase(), model.trim().to_lowercase())
}

impl ReferenceTables {
    pub fn new(stocks: Vec<StockRecord>, cameras: Vec<CameraRecord>) -> Result<Self, ReferenceError> {
        let mut tables = Self::default();
        for stock in stocks {
            if tables.stocks.contains_key(&stock.id) {
                return Err(ReferenceError::DuplicateStock { id: stock.id });
            }
            tables.stocks.insert(stock.id.clone(), stock);
        }
        for camera in cameras {
            // Aliases for the same body are allowed; first entry wins
            tables
                .cameras
                .entry(camera_key(&camera.brand, &camera.model))
                .or_insert(camera);
        }
        Ok(tables)
    }

    pub fn load(path: &Path) -> Result<Self, ReferenceError> {
        let content = fs::read_to_string(path).map_err(|source| ReferenceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let document: ReferenceDocument =
            serde_json::from_str(&content).map_err(|e| ReferenceError::Invalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        Self::new(document.stocks, document.cameras)
    }

    pub fn stock(&self, id: &str) -> Option<&StockRecord> {
        self.stocks.get(id.trim())
    }

    /// Case-insensitive brand and model lookup
    pub fn camera(&self, brand: &str, model: &str) -> Option<&CameraRecord> {
        self.cameras.get(&camera_key(brand, model))
    }

    pub fn stock_count(&self) -> usize {
        self.stocks.len()
    }

    pub fn camera_count(&self) -> usize {
        self.cameras.len()
    }
}
