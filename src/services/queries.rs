//! Typed reads and writes over the shop backend.
//!
//! Reads go through the [`QueryCache`]; the raw collection is cached and
//! decoded per call, skipping (and logging) rows the console cannot read so a
//! single malformed record never blanks a whole table. Writes hit the backend
//! once and, only when it accepted them, invalidate the affected keys.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::error::AppResult;
use crate::services::cache::{self, QueryCache};
use crate::shop::client::{EntrySubmission, ShopClient, created_id};
use crate::shop::models::{
    Customer, CustomerInput, Device, DeviceInput, EntriesStats, MobileEntry, Model, ModelInput,
    ModelUpdate, PaymentPending,
};

#[derive(Clone)]
pub struct Queries {
    shop: Arc<ShopClient>,
    cache: QueryCache,
}

impl Queries {
    #[must_use]
    pub fn new(shop: Arc<ShopClient>, cache: QueryCache) -> Self {
        Self { shop, cache }
    }

    #[must_use]
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    // == Reads ================================================================

    /// # Errors
    ///
    /// Returns the backend error when the collection cannot be fetched.
    pub async fn devices(&self) -> AppResult<Vec<Device>> {
        let raw = self
            .cache
            .get_or_fetch(cache::DEVICES, || self.shop.devices())
            .await?;
        Ok(decode_items(raw, "device"))
    }

    /// # Errors
    ///
    /// Returns the backend error when the collection cannot be fetched.
    pub async fn customers(&self) -> AppResult<Vec<Customer>> {
        let raw = self
            .cache
            .get_or_fetch(cache::CUSTOMERS, || self.shop.customers())
            .await?;
        Ok(decode_items(raw, "customer"))
    }

    /// # Errors
    ///
    /// Returns the backend error when the collection cannot be fetched.
    pub async fn entries(&self) -> AppResult<Vec<MobileEntry>> {
        let raw = self
            .cache
            .get_or_fetch(cache::ENTRIES, || self.shop.entries())
            .await?;
        Ok(decode_items(raw, "entry"))
    }

    /// # Errors
    ///
    /// Returns the backend error when the collection cannot be fetched.
    pub async fn all_models(&self) -> AppResult<Vec<Model>> {
        let raw = self
            .cache
            .get_or_fetch(cache::ALL_MODELS, || self.shop.all_models())
            .await?;
        Ok(decode_items(raw, "model"))
    }

    /// Models of one device. Rows the backend returns for other devices are
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns the backend error when the collection cannot be fetched.
    pub async fn models_for_device(&self, device_id: i64) -> AppResult<Vec<Model>> {
        let raw = self
            .cache
            .get_or_fetch(&cache::models_key(device_id), || {
                self.shop.models_for_device(device_id)
            })
            .await?;
        Ok(decode_items::<Model>(raw, "model")
            .into_iter()
            .filter(|m| m.device_id == device_id)
            .collect())
    }

    /// # Errors
    ///
    /// Returns the backend error when the rollup cannot be fetched.
    pub async fn payment_pending(&self) -> AppResult<Vec<PaymentPending>> {
        let raw = self
            .cache
            .get_or_fetch(cache::PAYMENT_PENDING, || self.shop.payment_pending())
            .await?;
        Ok(decode_items(raw, "payment-pending row"))
    }

    /// # Errors
    ///
    /// Returns the backend error when the id cannot be fetched.
    pub async fn next_entry_id(&self) -> AppResult<Option<i64>> {
        self.cache
            .get_or_fetch(cache::NEXT_ENTRY_ID, || self.shop.next_entry_id())
            .await
    }

    /// # Errors
    ///
    /// Returns the backend error when the statistics cannot be fetched.
    pub async fn entries_stats(&self, year_month: &str) -> AppResult<EntriesStats> {
        let raw = self
            .cache
            .get_or_fetch(&cache::stats_key(year_month), || {
                self.shop.entries_stats(year_month)
            })
            .await?;
        Ok(serde_json::from_value(raw).unwrap_or_else(|e| {
            tracing::warn!(year_month, error = %e, "Unreadable entry statistics");
            EntriesStats::default()
        }))
    }

    // == Customers ============================================================

    /// # Errors
    ///
    /// Returns the backend error; nothing is invalidated in that case.
    pub async fn add_customer(&self, customer: &CustomerInput) -> AppResult<Value> {
        let res = self.shop.add_customer(customer).await?;
        self.cache.invalidate(cache::CUSTOMERS).await;
        Ok(res)
    }

    /// # Errors
    ///
    /// Returns the backend error; nothing is invalidated in that case.
    pub async fn update_customer(&self, id: i64, customer: &CustomerInput) -> AppResult<Value> {
        let res = self.shop.update_customer(id, customer).await?;
        self.cache.invalidate(cache::CUSTOMERS).await;
        Ok(res)
    }

    /// # Errors
    ///
    /// Returns the backend error; nothing is invalidated in that case.
    pub async fn set_customer_active(&self, id: i64, is_active: bool) -> AppResult<Value> {
        let res = self.shop.set_customer_active(id, is_active).await?;
        self.cache.invalidate(cache::CUSTOMERS).await;
        Ok(res)
    }

    /// # Errors
    ///
    /// Returns the backend error; nothing is invalidated in that case.
    pub async fn delete_customer(&self, id: i64) -> AppResult<Value> {
        let res = self.shop.delete_customer(id).await?;
        self.cache.invalidate(cache::CUSTOMERS).await;
        Ok(res)
    }

    /// Id of a customer just created from `input`.
    ///
    /// Uses the id echoed by the backend when there is one, otherwise looks the
    /// customer up by phone and name in the refetched list.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the list has to be refetched and fails.
    pub async fn created_customer_id(
        &self,
        response: &Value,
        input: &CustomerInput,
    ) -> AppResult<Option<i64>> {
        if let Some(id) = created_id(response, "customer") {
            return Ok(Some(id));
        }
        Ok(self
            .customers()
            .await?
            .into_iter()
            .filter(|c| c.phone == input.phone && c.name == input.name)
            .map(|c| c.id)
            .max())
    }

    // == Devices ==============================================================

    /// # Errors
    ///
    /// Returns the backend error; nothing is invalidated in that case.
    pub async fn add_device(&self, device: &DeviceInput) -> AppResult<Value> {
        let res = self.shop.add_device(device).await?;
        self.cache.invalidate(cache::DEVICES).await;
        Ok(res)
    }

    /// # Errors
    ///
    /// Returns the backend error; nothing is invalidated in that case.
    pub async fn update_device(&self, id: i64, device: &DeviceInput) -> AppResult<Value> {
        let res = self.shop.update_device(id, device).await?;
        self.cache.invalidate(cache::DEVICES).await;
        Ok(res)
    }

    /// # Errors
    ///
    /// Returns the backend error; nothing is invalidated in that case.
    pub async fn set_device_active(&self, id: i64, is_active: bool) -> AppResult<Value> {
        let res = self.shop.set_device_active(id, is_active).await?;
        self.cache.invalidate(cache::DEVICES).await;
        Ok(res)
    }

    /// # Errors
    ///
    /// Returns the backend error; nothing is invalidated in that case.
    pub async fn delete_device(&self, id: i64) -> AppResult<Value> {
        let res = self.shop.delete_device(id).await?;
        self.cache.invalidate(cache::DEVICES).await;
        Ok(res)
    }

    /// Id of a device just created from `input`.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the list has to be refetched and fails.
    pub async fn created_device_id(
        &self,
        response: &Value,
        input: &DeviceInput,
    ) -> AppResult<Option<i64>> {
        if let Some(id) = created_id(response, "device") {
            return Ok(Some(id));
        }
        Ok(self
            .devices()
            .await?
            .into_iter()
            .filter(|d| d.device_name.eq_ignore_ascii_case(&input.device_name))
            .map(|d| d.id)
            .max())
    }

    // == Models ===============================================================

    /// # Errors
    ///
    /// Returns the backend error; nothing is invalidated in that case.
    pub async fn add_model(&self, model: &ModelInput) -> AppResult<Value> {
        let res = self.shop.add_model(model).await?;
        self.invalidate_models().await;
        Ok(res)
    }

    /// # Errors
    ///
    /// Returns the backend error; nothing is invalidated in that case.
    pub async fn update_model(&self, update: &ModelUpdate) -> AppResult<Value> {
        let res = self.shop.update_model(update).await?;
        self.invalidate_models().await;
        Ok(res)
    }

    /// # Errors
    ///
    /// Returns the backend error; nothing is invalidated in that case.
    pub async fn set_model_active(&self, id: i64, is_active: bool) -> AppResult<Value> {
        self.update_model(&ModelUpdate {
            model_id: id,
            is_active: Some(is_active),
            ..ModelUpdate::default()
        })
        .await
    }

    /// # Errors
    ///
    /// Returns the backend error; nothing is invalidated in that case.
    pub async fn delete_model(&self, id: i64) -> AppResult<Value> {
        let res = self.shop.delete_model(id).await?;
        self.invalidate_models().await;
        Ok(res)
    }

    /// The model just created from `input`.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the list has to be refetched and fails.
    pub async fn created_model(
        &self,
        response: &Value,
        input: &ModelInput,
    ) -> AppResult<Option<Model>> {
        let models = self.models_for_device(input.device_id).await?;
        let echoed = created_id(response, "model");
        Ok(match echoed {
            Some(id) => models.into_iter().find(|m| m.id == id).or(Some(Model {
                id,
                device_id: input.device_id,
                model_name: input.model_name.clone(),
                is_active: true,
            })),
            None => models
                .into_iter()
                .filter(|m| m.model_name.eq_ignore_ascii_case(&input.model_name))
                .max_by_key(|m| m.id),
        })
    }

    async fn invalidate_models(&self) {
        self.cache.invalidate(cache::ALL_MODELS).await;
        self.cache
            .invalidate_prefix(&cache::cache_key(cache::MODELS, &[""]))
            .await;
    }

    // == Entries ==============================================================

    /// Create an entry, multipart when the submission carries files.
    ///
    /// # Errors
    ///
    /// Returns the backend error; nothing is invalidated in that case.
    pub async fn add_entry(&self, submission: &EntrySubmission) -> AppResult<Value> {
        let res = self.shop.add_entry(submission).await?;
        self.invalidate_entries().await;
        Ok(res)
    }

    /// # Errors
    ///
    /// Returns the backend error; nothing is invalidated in that case.
    pub async fn update_entry(&self, id: i64, submission: &EntrySubmission) -> AppResult<Value> {
        let res = self.shop.update_entry(id, submission).await?;
        self.invalidate_entries().await;
        Ok(res)
    }

    /// # Errors
    ///
    /// Returns the backend error; nothing is invalidated in that case.
    pub async fn delete_entry(&self, id: i64) -> AppResult<Value> {
        let res = self.shop.delete_entry(id).await?;
        self.invalidate_entries().await;
        Ok(res)
    }

    async fn invalidate_entries(&self) {
        self.cache.invalidate(cache::ENTRIES).await;
        self.cache.invalidate(cache::NEXT_ENTRY_ID).await;
        self.cache.invalidate(cache::PAYMENT_PENDING).await;
        self.cache.invalidate_prefix(cache::ENTRIES_STATS).await;
    }
}

/// Decode every element of a JSON array, skipping the ones that do not fit.
fn decode_items<T: DeserializeOwned>(raw: Value, what: &str) -> Vec<T> {
    let Value::Array(items) = raw else {
        return Vec::new();
    };
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable {what}");
                None
            }
        })
        .collect()
}
