//! Static table from Nezha record fields to Prometheus instruments

use nezha_common::{ExporterError, MetricsRegistry, Result, SettableCounterVec};
use prometheus::GaugeVec;

/// Label every field instrument is keyed by
pub const NAME_LABEL: &str = "name";

/// Labels of the `info` instrument, in the order values are supplied
pub const INFO_LABELS: [&str; 5] = ["name", "platform", "platform_version", "arch", "country_code"];

/// Host fields feeding the descriptive `info` labels (after `name`)
pub const INFO_SOURCES: [&str; 4] = [
    "host.Platform",
    "host.PlatformVersion",
    "host.Arch",
    "host.CountryCode",
];

/// Kind of instrument a field is published as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Gauge,
    Counter,
}

/// One row of the mapping table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub source_path: String,
    pub kind: FieldKind,
    pub metric: String,
    pub unit: Option<String>,
}

impl FieldSpec {
    /// Metric name without namespace, with the unit appended
    pub fn metric_name(&self) -> String {
        match &self.unit {
            Some(unit) => format!("{}_{}", self.metric, unit),
            None => self.metric.clone(),
        }
    }

    fn help(&self) -> String {
        format!("Nezha server field {}", self.source_path)
    }
}

/// Instrument backing a [`FieldSpec`]
pub enum Instrument {
    Gauge(GaugeVec),
    Counter(SettableCounterVec),
}

impl Instrument {
    /// Overwrite the value for server `name`
    pub fn set(&self, name: &str, value: f64) -> Result<()> {
        match self {
            Instrument::Gauge(gauge) => {
                gauge.get_metric_with_label_values(&[name])?.set(value);
                Ok(())
            }
            Instrument::Counter(counter) => counter.set(&[name], value),
        }
    }

    /// Current value for server `name`; an unseen server reads as zero
    /// and gets a series from then on
    pub fn get(&self, name: &str) -> Result<f64> {
        match self {
            Instrument::Gauge(gauge) => Ok(gauge.get_metric_with_label_values(&[name])?.get()),
            Instrument::Counter(counter) => counter.get(&[name]),
        }
    }
}

/// Field table plus the instruments it materialized
pub struct FieldMapping {
    fields: Vec<(FieldSpec, Instrument)>,
    info: GaugeVec,
}

impl FieldMapping {
    /// Create an empty mapping whose `info` instrument lives in `registry`
    pub fn new(registry: &MetricsRegistry) -> Result<Self> {
        let info = registry.create_gauge_vec("info", "Nezha server description", &INFO_LABELS)?;
        Ok(Self {
            fields: Vec::new(),
            info,
        })
    }

    /// The table published for a Nezha dashboard
    pub fn nezha(registry: &MetricsRegistry) -> Result<Self> {
        use FieldKind::Gauge;

        let mut mapping = Self::new(registry)?;
        let table: &[(&str, FieldKind, &str, Option<&str>)] = &[
            ("last_active", Gauge, "active", Some("time")),
            ("host.BootTime", Gauge, "boot", Some("time")),
            ("status.Uptime", Gauge, "up", Some("time")),
            ("status.CPU", Gauge, "cpu", Some("percent")),
            ("status.Load1", Gauge, "load1", None),
            ("status.Load5", Gauge, "load5", None),
            ("status.Load15", Gauge, "load15", None),
            ("host.MemTotal", Gauge, "memory_total", Some("bytes")),
            ("status.MemUsed", Gauge, "memory_used", Some("bytes")),
            ("host.DiskTotal", Gauge, "disk_total", Some("bytes")),
            ("status.DiskUsed", Gauge, "disk_used", Some("bytes")),
            ("host.SwapTotal", Gauge, "swap_total", Some("bytes")),
            ("status.SwapUsed", Gauge, "swap_used", Some("bytes")),
            ("status.NetInTransfer", Gauge, "network_rx_total", Some("bytes")),
            ("status.NetOutTransfer", Gauge, "network_tx_total", Some("bytes")),
            ("status.NetInSpeed", Gauge, "network_rx_speed", Some("bytes")),
            ("status.NetOutSpeed", Gauge, "network_tx_speed", Some("bytes")),
            ("status.TcpConnCount", Gauge, "network_tcp_connection", Some("count")),
            ("status.UdpConnCount", Gauge, "network_udp_connection", Some("count")),
            ("status.ProcessCount", Gauge, "process", Some("count")),
        ];

        for (source_path, kind, metric, unit) in table {
            mapping.register(registry, source_path, *kind, metric, *unit)?;
        }
        Ok(mapping)
    }

    /// Add a field and create its instrument.
    ///
    /// Fails on a repeated source path, or when the published name is
    /// already taken in the registry.
    pub fn register(
        &mut self,
        registry: &MetricsRegistry,
        source_path: &str,
        kind: FieldKind,
        metric: &str,
        unit: Option<&str>,
    ) -> Result<()> {
        if self.fields.iter().any(|(spec, _)| spec.source_path == source_path) {
            return Err(ExporterError::DuplicateField(source_path.to_string()));
        }

        let spec = FieldSpec {
            source_path: source_path.to_string(),
            kind,
            metric: metric.to_string(),
            unit: unit.map(str::to_string),
        };
        let name = spec.metric_name();
        let help = spec.help();
        let instrument = match kind {
            FieldKind::Gauge => {
                Instrument::Gauge(registry.create_gauge_vec(&name, &help, &[NAME_LABEL])?)
            }
            FieldKind::Counter => Instrument::Counter(
                registry.create_settable_counter_vec(&name, &help, &[NAME_LABEL])?,
            ),
        };

        self.fields.push((spec, instrument));
        Ok(())
    }

    /// Fields in registration order
    pub fn fields(&self) -> impl Iterator<Item = (&FieldSpec, &Instrument)> {
        self.fields.iter().map(|(spec, instrument)| (spec, instrument))
    }

    /// Instrument registered for `source_path`
    pub fn instrument(&self, source_path: &str) -> Option<&Instrument> {
        self.fields
            .iter()
            .find(|(spec, _)| spec.source_path == source_path)
            .map(|(_, instrument)| instrument)
    }

    /// The `info` instrument
    pub fn info(&self) -> &GaugeVec {
        &self.info
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
