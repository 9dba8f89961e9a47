//! Manifest and definition table lookups.

use crate::{DestinyClient, Manifest, MetricDefinition, RecordDefinition};
use std::collections::HashMap;
use tracing::{debug, instrument};
use wayfinder_error::{DestinyError, DestinyErrorKind};

const MANIFEST_KEY: &str = "destiny:manifest:info";
const METRIC_TABLE_KEY: &str = "destiny:manifest:metric";
const RECORD_TABLE_KEY: &str = "destiny:manifest:record";

impl DestinyClient {
    /// Current manifest index, cached for the manifest TTL.
    ///
    /// # Errors
    ///
    /// Returns the request error on a cache miss that fails upstream.
    #[instrument(skip(self))]
    pub async fn get_manifest(&self) -> Result<Manifest, DestinyError> {
        self.cache()
            .get_or_fetch(MANIFEST_KEY, self.ttls().manifest, || {
                self.get_platform::<Manifest>("/Destiny2/Manifest/")
            })
            .await
    }

    /// Metric definitions keyed by metric hash.
    ///
    /// # Errors
    ///
    /// Returns the request error on a cache miss that fails upstream.
    #[instrument(skip(self))]
    pub async fn get_metric_definitions(
        &self,
        path: &str,
    ) -> Result<HashMap<String, MetricDefinition>, DestinyError> {
        self.cache()
            .get_or_fetch(METRIC_TABLE_KEY, self.ttls().manifest, || {
                self.get_asset::<HashMap<String, MetricDefinition>>(path)
            })
            .await
    }

    /// Record definitions keyed by record hash.
    ///
    /// # Errors
    ///
    /// Returns the request error on a cache miss that fails upstream.
    #[instrument(skip(self))]
    pub async fn get_record_definitions(
        &self,
        path: &str,
    ) -> Result<HashMap<String, RecordDefinition>, DestinyError> {
        self.cache()
            .get_or_fetch(RECORD_TABLE_KEY, self.ttls().manifest, || {
                self.get_asset::<HashMap<String, RecordDefinition>>(path)
            })
            .await
    }

    /// Resolve one metric definition through the manifest.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the manifest lacks the metric table or the
    /// table lacks the metric.
    #[instrument(skip(self))]
    pub async fn metric_definition(&self, metric_id: i64) -> Result<MetricDefinition, DestinyError> {
        let manifest = self.get_manifest().await?;
        let path = manifest
            .component_path(Manifest::METRIC_TABLE)
            .ok_or_else(|| {
                DestinyError::new(DestinyErrorKind::NotFound(format!(
                    "{} in manifest {}",
                    Manifest::METRIC_TABLE,
                    manifest.version
                )))
            })?;

        let mut definitions = self.get_metric_definitions(path).await?;
        debug!(count = definitions.len(), "Loaded metric definitions");
        definitions
            .remove(&metric_id.to_string())
            .ok_or_else(|| DestinyError::new(DestinyErrorKind::NotFound(format!("metric {metric_id}"))))
    }

    /// All record definitions, resolved through the manifest.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the manifest lacks the record table.
    pub async fn record_definitions(&self) -> Result<HashMap<String, RecordDefinition>, DestinyError> {
        let manifest = self.get_manifest().await?;
        let path = manifest.component_path(Manifest::RECORD_TABLE).ok_or_else(|| {
            DestinyError::new(DestinyErrorKind::NotFound(format!(
                "{} in manifest {}",
                Manifest::RECORD_TABLE,
                manifest.version
            )))
        })?;
        self.get_record_definitions(path).await
    }
}
