//! USDA FoodData Central REST client
//!
//! Two calls are used: `GET /foods/search` to find candidate foods, and
//! `GET /food/{fdcId}` to read one food's per-100-unit composition.

use crate::config::UsdaConfig;
use crate::nutrition::{FoodDetails, FoodSearchResult, NutritionApiError, NutritionLookup};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

/// USDA nutrient ids for the tracked nutrients
pub mod nutrient_ids {
    pub const ENERGY_KCAL: i64 = 1008;
    pub const PROTEIN: i64 = 1003;
    pub const CARBOHYDRATE: i64 = 1005;
    pub const TOTAL_FAT: i64 = 1004;
    pub const FIBER: i64 = 1079;
    pub const SUGARS: i64 = 2000;
    pub const SODIUM: i64 = 1093;
}

/// Data types included in search results
const SEARCH_DATA_TYPES: &str = "Foundation,SR Legacy";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    foods: Vec<FoodSearchResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FoodResponse {
    fdc_id: i64,
    description: String,
    #[serde(default)]
    food_nutrients: Vec<FoodNutrient>,
}

/// A nutrient row; search and detail endpoints disagree on the shape
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FoodNutrient {
    nutrient_id: Option<i64>,
    nutrient: Option<NutrientRef>,
    amount: Option<f64>,
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct NutrientRef {
    id: Option<i64>,
}

impl FoodNutrient {
    fn matches(&self, id: i64) -> bool {
        self.nutrient_id == Some(id) || self.nutrient.as_ref().and_then(|n| n.id) == Some(id)
    }

    fn quantity(&self) -> f64 {
        self.amount.or(self.value).unwrap_or(0.0)
    }
}

impl FoodResponse {
    fn nutrient(&self, id: i64) -> f64 {
        self.food_nutrients
            .iter()
            .find(|n| n.matches(id))
            .map(FoodNutrient::quantity)
            .unwrap_or(0.0)
    }

    fn into_details(self) -> FoodDetails {
        use nutrient_ids::*;

        FoodDetails {
            fdc_id: self.fdc_id,
            calories: self.nutrient(ENERGY_KCAL),
            protein: self.nutrient(PROTEIN),
            carbs: self.nutrient(CARBOHYDRATE),
            fat: self.nutrient(TOTAL_FAT),
            fiber: self.nutrient(FIBER),
            sugar: self.nutrient(SUGARS),
            sodium: self.nutrient(SODIUM),
            food_name: self.description,
        }
    }
}

/// FoodData Central client
pub struct UsdaClient {
    client: Client,
    config: UsdaConfig,
}

impl UsdaClient {
    /// Create a new client with the given configuration
    pub fn new(config: UsdaConfig) -> Result<Self, NutritionApiError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(NutritionApiError::Request)?;

        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &UsdaConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Response, NutritionApiError> {
        let response = self
            .client
            .get(url)
            .query(&[("api_key", self.config.api_key.as_str())])
            .query(query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NutritionApiError::Timeout
                } else if e.is_connect() {
                    NutritionApiError::Unavailable
                } else {
                    NutritionApiError::Request(e)
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(NutritionApiError::InvalidApiKey),
            _ => {
                let text = response.text().await.unwrap_or_default();
                Err(NutritionApiError::Api {
                    status: status.as_u16(),
                    message: text,
                })
            }
        }
    }
}

#[async_trait]
impl NutritionLookup for UsdaClient {
    async fn search(&self, query: &str) -> Result<Vec<FoodSearchResult>, NutritionApiError> {
        let url = self.url("/foods/search");
        let response = self
            .get(
                &url,
                &[
                    ("query", query.to_string()),
                    ("pageSize", self.config.page_size.to_string()),
                    ("dataType", SEARCH_DATA_TYPES.to_string()),
                ],
            )
            .await?;

        let body: SearchResponse = response.json().await.map_err(NutritionApiError::Request)?;

        tracing::debug!(query = %query, results = body.foods.len(), "USDA food search");
        Ok(body.foods)
    }

    async fn details(&self, fdc_id: i64) -> Result<FoodDetails, NutritionApiError> {
        let url = self.url(&format!("/food/{}", fdc_id));
        let response = self.get(&url, &[]).await.map_err(|e| match e {
            NutritionApiError::Api { status: 404, .. } => NutritionApiError::NotFound(fdc_id),
            other => other,
        })?;

        let body: FoodResponse = response.json().await.map_err(NutritionApiError::Request)?;

        tracing::debug!(fdc_id, food = %body.description, "Fetched USDA food details");
        Ok(body.into_details())
    }
}
