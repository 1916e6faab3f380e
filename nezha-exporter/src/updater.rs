use nezha_common::Result;
use std::sync::Arc;
use tracing::trace;

use crate::mapping::{FieldMapping, INFO_SOURCES};
use crate::record::ServerRecord;

/// Writes server records into the instruments of a [`FieldMapping`]
#[derive(Clone)]
pub struct MetricUpdater {
    mapping: Arc<FieldMapping>,
}

impl MetricUpdater {
    pub fn new(mapping: Arc<FieldMapping>) -> Self {
        Self { mapping }
    }

    pub fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }

    /// Apply one record.
    ///
    /// Fields are written in registration order and the first unresolvable or
    /// non-numeric field aborts the call. Fields written before the failure
    /// keep their new values; the `info` series is only set when every field
    /// succeeded.
    pub fn update(&self, record: &ServerRecord<'_>) -> Result<()> {
        let name = record.name();

        for (spec, instrument) in self.mapping.fields() {
            let value = record.numeric(&spec.source_path)?;
            instrument.set(&name, value)?;
        }

        let descriptions: Vec<String> = INFO_SOURCES.iter().map(|path| record.label(path)).collect();
        let mut labels: Vec<&str> = Vec::with_capacity(INFO_SOURCES.len() + 1);
        labels.push(&name);
        labels.extend(descriptions.iter().map(String::as_str));
        self.mapping.info().get_metric_with_label_values(&labels)?.set(1.0);

        trace!(server = %name, fields = self.mapping.len(), "Updated server metrics");
        Ok(())
    }
}
