use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::FinopsResult;

use super::{ExportFormat, ProfileReport, ReportExporter};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonExporterConfig {
    pub pretty_print: bool,
    pub indent_size: usize,
    pub wrap_in_object: bool,
    pub root_key: String,
}

impl Default for JsonExporterConfig {
    fn default() -> Self {
        Self {
            pretty_print: true,
            indent_size: 4,
            wrap_in_object: true,
            root_key: "reports".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct JsonExporter {
    config: JsonExporterConfig,
}

impl JsonExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: JsonExporterConfig) -> Self {
        Self { config }
    }

    fn serialize<T: Serialize>(&self, data: &T) -> FinopsResult<Vec<u8>> {
        if !self.config.pretty_print {
            return Ok(serde_json::to_vec(data)?);
        }

        let indent = " ".repeat(self.config.indent_size).into_bytes();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
        let mut writer = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
        data.serialize(&mut serializer)?;
        Ok(writer)
    }
}

#[async_trait]
impl ReportExporter for JsonExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Json
    }

    fn file_extension(&self) -> &str {
        "json"
    }

    async fn export(&self, reports: &[ProfileReport]) -> FinopsResult<Vec<u8>> {
        if self.config.wrap_in_object {
            let mut root = serde_json::Map::new();
            root.insert(self.config.root_key.clone(), serde_json::to_value(reports)?);
            self.serialize(&root)
        } else {
            self.serialize(&reports)
        }
    }
}
