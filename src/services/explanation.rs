use std::sync::{Arc, Mutex, PoisonError};

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::{
    config::Settings,
    error::AppError,
    models::{Asset, CryptoSignal, Indicators},
};

const GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub const MISSING_KEY_MSG: &str = "AI services currently unavailable (Missing API Key).";
pub const FAILED_MSG: &str = "Error generating AI analysis. Please try again later.";
pub const EMPTY_MSG: &str = "Unable to generate explanation.";

/// Free-text explanation of a signal, backed by Gemini.
///
/// Holds one cached answer for the asset last asked about; asking about a
/// different asset replaces it.
#[derive(Clone)]
pub struct ExplanationClient {
    http: Client,
    api_key: String,
    model: String,
    cache: Arc<Mutex<Option<(String, String)>>>,
}

impl ExplanationClient {
    pub fn new(settings: &Settings) -> Self {
        Self {
            http: Client::new(),
            api_key: settings.gemini_api_key.trim().to_string(),
            model: settings.gemini_model.clone(),
            cache: Arc::new(Mutex::new(None)),
        }
    }

    fn has_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    pub fn cached(&self, asset_id: &str) -> Option<String> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|(id, _)| id == asset_id)
            .map(|(_, text)| text.clone())
    }

    /// Always returns displayable text; failures become a short message and
    /// are not cached.
    pub async fn explain(
        &self,
        asset: &Asset,
        price: f64,
        signal: &CryptoSignal,
        indicators: &Indicators,
        refresh: bool,
    ) -> String {
        if !refresh {
            if let Some(text) = self.cached(&asset.id) {
                return text;
            }
        }

        if !self.has_key() {
            return MISSING_KEY_MSG.to_string();
        }

        let prompt = build_prompt(asset, price, signal, indicators);
        match self.generate(&prompt).await {
            Ok(Some(text)) => {
                *self.cache.lock().unwrap_or_else(PoisonError::into_inner) =
                    Some((asset.id.clone(), text.clone()));
                text
            }
            Ok(None) => EMPTY_MSG.to_string(),
            Err(err) => {
                tracing::error!("Gemini error: {}", err);
                FAILED_MSG.to_string()
            }
        }
    }

    async fn generate(&self, prompt: &str) -> Result<Option<String>, AppError> {
        let url = format!("{}/{}:generateContent", GEMINI_URL, self.model);
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": 0.7, "maxOutputTokens": 500 }
        });

        let res = self
            .http
            .post(url)
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(AppError::Upstream { status, body });
        }

        let parsed = res.json::<GenerateResponse>().await?;
        Ok(parsed.text())
    }
}

pub fn build_prompt(asset: &Asset, price: f64, signal: &CryptoSignal, ind: &Indicators) -> String {
    format!(
        "Act as a professional crypto analyst. Explain the following trading signal to a user.\n\
         \n\
         Coin: {name} ({symbol})\n\
         Current Price: ${price}\n\
         Signal Type: {kind}\n\
         Score: {score}/100\n\
         \n\
         Technical Context:\n\
         - RSI: {rsi:.2}\n\
         - EMA50: {ema50:.2}\n\
         - EMA200: {ema200:.2}\n\
         - ADX: {adx:.0}\n\
         - Reasons given by system: {reasons}\n\
         \n\
         Provide a concise, human-friendly explanation of why this signal was generated, \
         potential risks, and what to watch for. Format with bullet points if helpful.",
        name = asset.name,
        symbol = asset.symbol,
        price = price,
        kind = signal.kind.label(),
        score = signal.score,
        rsi = ind.rsi,
        ema50 = ind.ema50,
        ema200 = ind.ema200,
        adx = ind.adx,
        reasons = signal.reasons.join(", "),
    )
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateResponse {
    fn text(self) -> Option<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();

        let text = text.trim().to_string();
        (!text.is_empty()).then_some(text)
    }
}
