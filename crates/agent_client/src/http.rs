//! `reqwest`-backed [`GameClient`]. Retries transient failures with
//! exponential backoff (base 1s, factor 2, 3 attempts) per the error
//! handling design; everything else is a thin typed wrapper over the
//! game server's REST endpoints.

use crate::client::GameClient;
use crate::error::GameError;
use crate::types::{
    CharacterSnapshot, CraftResult, EquipResult, FightResult, GatherResult, ItemData, MapTile,
    MonsterData, MoveResult, ResourceData, RestResult,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.artifactsmmo.com";
const RETRY_BASE: Duration = Duration::from_secs(1);
const RETRY_FACTOR: u32 = 2;
const MAX_ATTEMPTS: u32 = 3;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpGameClient {
    base_url: String,
    token: String,
    http: reqwest::Client,
}

impl HttpGameClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, token)
    }

    pub fn with_base_url(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .expect("reqwest client builder should not fail on a static config");
        Self { base_url: base_url.into(), token: token.into(), http }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, GameError> {
        self.with_retry(|| async {
            let response = self
                .http
                .get(format!("{}{}", self.base_url, path))
                .bearer_auth(&self.token)
                .send()
                .await
                .map_err(|e| GameError::Transient(e.to_string()))?;
            Self::handle_response(response).await
        })
        .await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: serde_json::Value) -> Result<T, GameError> {
        self.with_retry(|| async {
            let response = self
                .http
                .post(format!("{}{}", self.base_url, path))
                .bearer_auth(&self.token)
                .json(&body)
                .send()
                .await
                .map_err(|e| GameError::Transient(e.to_string()))?;
            Self::handle_response(response).await
        })
        .await
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GameError> {
        let status = response.status().as_u16();
        if response.status().is_success() {
            response.json::<T>().await.map_err(|e| GameError::Transient(e.to_string()))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(GameError::from_status(status, body))
        }
    }

    /// Runs `op` up to `MAX_ATTEMPTS` times, retrying only
    /// [`GameError::Transient`] with exponential backoff.
    async fn with_retry<T, F, Fut>(&self, op: F) -> Result<T, GameError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, GameError>>,
    {
        let mut delay = RETRY_BASE;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < MAX_ATTEMPTS => {
                    log::warn!("transient error on attempt {attempt}/{MAX_ATTEMPTS}: {err}");
                    tokio::time::sleep(delay).await;
                    delay *= RETRY_FACTOR;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait]
impl GameClient for HttpGameClient {
    async fn get_character(&self, name: &str) -> Result<CharacterSnapshot, GameError> {
        self.get(&format!("/characters/{name}")).await
    }

    async fn get_characters(&self) -> Result<Vec<CharacterSnapshot>, GameError> {
        self.get("/my/characters").await
    }

    async fn get_map(&self, x: i32, y: i32) -> Result<MapTile, GameError> {
        self.get(&format!("/maps/{x}/{y}")).await
    }

    async fn get_item(&self, code: &str) -> Result<ItemData, GameError> {
        self.get(&format!("/items/{code}")).await
    }

    async fn get_monster(&self, code: &str) -> Result<MonsterData, GameError> {
        self.get(&format!("/monsters/{code}")).await
    }

    async fn get_resource(&self, code: &str) -> Result<ResourceData, GameError> {
        self.get(&format!("/resources/{code}")).await
    }

    async fn move_to(&self, character: &str, x: i32, y: i32) -> Result<MoveResult, GameError> {
        self.post(&format!("/my/{character}/action/move"), json!({ "x": x, "y": y })).await
    }

    async fn attack(&self, character: &str) -> Result<FightResult, GameError> {
        self.post(&format!("/my/{character}/action/fight"), json!({})).await
    }

    async fn gather(&self, character: &str) -> Result<GatherResult, GameError> {
        self.post(&format!("/my/{character}/action/gathering"), json!({})).await
    }

    async fn craft(&self, character: &str, item_code: &str, quantity: u32) -> Result<CraftResult, GameError> {
        self.post(
            &format!("/my/{character}/action/crafting"),
            json!({ "code": item_code, "quantity": quantity }),
        )
        .await
    }

    async fn equip(&self, character: &str, item_code: &str, slot: &str) -> Result<EquipResult, GameError> {
        self.post(
            &format!("/my/{character}/action/equip"),
            json!({ "code": item_code, "slot": slot }),
        )
        .await
    }

    async fn unequip(&self, character: &str, slot: &str) -> Result<EquipResult, GameError> {
        self.post(&format!("/my/{character}/action/unequip"), json!({ "slot": slot })).await
    }

    async fn rest(&self, character: &str) -> Result<RestResult, GameError> {
        self.post(&format!("/my/{character}/action/rest"), json!({})).await
    }

    fn supports_item_search(&self) -> bool {
        true
    }
}
