//! Data-review catalog for one reference designator
//!
//! The catalog is a JSON document (`<metadata_dir>/<refdes>.json`) listing
//! the instrument's deployments and, per delivery method and stream, the
//! stream parameters with their units, fill values and data product type.
//! It is the required external metadata of a designator: a missing catalog
//! aborts that designator.

use crate::constants::SCIENCE_DATA_PRODUCT_TYPE;
use crate::error::{RangeError, Result};
use crate::models::{DeploymentInfo, ReferenceDesignator, ScienceVariable};
use crate::sources::DeploymentLookup;
use crate::timestamps::parse_optional_timestamp;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct RawCatalog {
    instrument: RawInstrument,
}

#[derive(Debug, Deserialize)]
struct RawInstrument {
    #[serde(default)]
    deployments: Vec<RawDeployment>,
    #[serde(default)]
    data_streams: Vec<RawDataStream>,
}

#[derive(Debug, Deserialize)]
struct RawDeployment {
    deployment_number: u32,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    stop_date: Option<String>,
    #[serde(default)]
    deployment_depth: Option<f64>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawDataStream {
    method: String,
    stream_name: String,
    stream: RawStream,
}

#[derive(Debug, Deserialize)]
struct RawStream {
    #[serde(default)]
    parameters: Vec<RawParameter>,
}

#[derive(Debug, Deserialize)]
struct RawParameter {
    name: String,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    data_product_type: Option<String>,
    #[serde(default)]
    fill_value: Option<serde_json::Value>,
}

/// A parameter of one stream
#[derive(Debug, Clone, PartialEq)]
pub struct StreamParameter {
    pub variable: ScienceVariable,
    pub is_science: bool,
}

/// Parameters of one `method-stream`
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEntry {
    pub method: String,
    pub stream_name: String,
    pub parameters: Vec<StreamParameter>,
}

impl StreamEntry {
    pub fn method_stream(&self) -> String {
        format!("{}-{}", self.method, self.stream_name)
    }
}

/// Parsed data-review catalog
#[derive(Debug, Clone)]
pub struct DataReviewCatalog {
    pub refdes: ReferenceDesignator,
    deployments: BTreeMap<u32, DeploymentInfo>,
    streams: Vec<StreamEntry>,
}

impl DataReviewCatalog {
    /// Load `<metadata_dir>/<refdes>.json`
    pub fn load(metadata_dir: &Path, refdes: &ReferenceDesignator) -> Result<Self> {
        let path = metadata_dir.join(format!("{refdes}.json"));
        if !path.exists() {
            return Err(RangeError::MetadataNotFound {
                refdes: refdes.to_string(),
                path,
            });
        }

        let contents = std::fs::read_to_string(&path)?;
        let catalog = Self::from_json_str(refdes.clone(), &contents)?;
        info!(
            "Loaded data review catalog for {}: {} deployments, {} streams",
            refdes,
            catalog.deployments.len(),
            catalog.streams.len()
        );
        Ok(catalog)
    }

    pub fn from_json_str(refdes: ReferenceDesignator, contents: &str) -> Result<Self> {
        let raw: RawCatalog = serde_json::from_str(contents)?;

        let deployments = raw
            .instrument
            .deployments
            .into_iter()
            .map(|d| {
                let info = DeploymentInfo {
                    deployment_number: d.deployment_number,
                    start_date: parse_optional_timestamp(d.start_date.as_deref()),
                    stop_date: parse_optional_timestamp(d.stop_date.as_deref()),
                    deployment_depth: d.deployment_depth,
                    latitude: d.latitude,
                    longitude: d.longitude,
                };
                (d.deployment_number, info)
            })
            .collect();

        let streams = raw
            .instrument
            .data_streams
            .into_iter()
            .map(|s| StreamEntry {
                method: s.method,
                stream_name: s.stream_name,
                parameters: s
                    .stream
                    .parameters
                    .into_iter()
                    .map(|p| StreamParameter {
                        is_science: p.data_product_type.as_deref()
                            == Some(SCIENCE_DATA_PRODUCT_TYPE),
                        variable: ScienceVariable {
                            name: p.name,
                            units: p.unit.unwrap_or_default(),
                            fill_value: p.fill_value.as_ref().and_then(json_number),
                        },
                    })
                    .collect(),
            })
            .collect();

        Ok(Self {
            refdes,
            deployments,
            streams,
        })
    }

    /// Deployment numbers in ascending order
    pub fn deployment_numbers(&self) -> Vec<u32> {
        self.deployments.keys().copied().collect()
    }

    /// Science variables of the given `method-stream` keys, first-seen order
    ///
    /// Variables shared between streams (e.g. telemetered and recovered)
    /// appear once.
    pub fn science_variables<'a>(
        &self,
        method_streams: impl IntoIterator<Item = &'a str>,
    ) -> Vec<ScienceVariable> {
        let mut variables: Vec<ScienceVariable> = Vec::new();
        for key in method_streams {
            let Some(stream) = self.streams.iter().find(|s| s.method_stream() == key) else {
                debug!("Stream {} not listed in catalog for {}", key, self.refdes);
                continue;
            };
            for parameter in stream.parameters.iter().filter(|p| p.is_science) {
                if !variables.iter().any(|v| v.name == parameter.variable.name) {
                    variables.push(parameter.variable.clone());
                }
            }
        }
        variables
    }

    /// Every parameter of every stream, first-seen order
    pub fn all_parameters(&self) -> Vec<ScienceVariable> {
        let mut parameters: Vec<ScienceVariable> = Vec::new();
        for parameter in self.streams.iter().flat_map(|s| s.parameters.iter()) {
            if !parameters.iter().any(|p| p.name == parameter.variable.name) {
                parameters.push(parameter.variable.clone());
            }
        }
        parameters
    }
}

impl DeploymentLookup for DataReviewCatalog {
    fn deployment(&self, refdes: &ReferenceDesignator, deployment: u32) -> Option<DeploymentInfo> {
        if *refdes != self.refdes {
            return None;
        }
        self.deployments.get(&deployment).cloned()
    }
}

/// Fill values are written as numbers or numeric strings
fn json_number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
