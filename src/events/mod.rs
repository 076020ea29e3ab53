//! Scalar extraction from TensorBoard event files.
//!
//! [`EventFileReader`] decodes `events.out.tfevents.*` files. The aggregator
//! only sees the [`ScalarReader`] trait, so other sources can stand in.

pub mod proto;
pub mod record;

use crate::error::{Result, SummaryError};
use crate::models::{RunMetrics, ScalarSample, ScalarSeries};
use prost::Message;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Source of scalar series for one log artifact.
pub trait ScalarReader {
    /// Read every scalar series in the log, samples in file order,
    /// series in order of first appearance.
    fn read_scalars(&self, path: &Path) -> Result<Vec<ScalarSeries>>;
}

/// Reader for TFRecord-framed event files.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventFileReader;

impl ScalarReader for EventFileReader {
    fn read_scalars(&self, path: &Path) -> Result<Vec<ScalarSeries>> {
        let file = File::open(path)?;
        let mut collector = SeriesCollector::default();

        let mut records = record::RecordReader::new(BufReader::new(file));
        for (index, payload) in records.by_ref().enumerate() {
            let payload = payload.map_err(|e| SummaryError::EventFile {
                path: path.to_path_buf(),
                reason: format!("record {}: {}", index, e),
            })?;
            let event =
                proto::Event::decode(payload.as_slice()).map_err(|e| SummaryError::EventFile {
                    path: path.to_path_buf(),
                    reason: format!("record {}: {}", index, e),
                })?;
            collector.add_event(&event);
        }

        if let Some(offset) = records.truncated_at() {
            debug!(
                "{} ends in an incomplete record at offset {}",
                path.display(),
                offset
            );
        }

        let series = collector.finish();
        debug!("Read {} scalar series from {}", series.len(), path.display());
        Ok(series)
    }
}

/// Extract the latest value of every series plus the step of the last one read.
pub fn extract_metrics<R: ScalarReader + ?Sized>(reader: &R, path: &Path) -> Result<RunMetrics> {
    let series = reader.read_scalars(path)?;
    Ok(RunMetrics::from_series(&series))
}

#[derive(Default)]
struct SeriesCollector {
    series: Vec<ScalarSeries>,
    index: HashMap<String, usize>,
    /// Tags announced as scalars by plugin metadata. TF2 writers attach the
    /// metadata to the first value of a tag only.
    scalar_tags: HashSet<String>,
}

impl SeriesCollector {
    fn add_event(&mut self, event: &proto::Event) {
        let Some(summary) = &event.summary else {
            return;
        };
        for value in &summary.value {
            if value.is_scalar_plugin() {
                self.scalar_tags.insert(value.tag.clone());
            }
            let scalar = match (value.simple_value, &value.tensor) {
                (Some(v), _) => Some(f64::from(v)),
                (None, Some(tensor)) if self.scalar_tags.contains(&value.tag) => tensor.scalar(),
                _ => None,
            };
            if let Some(v) = scalar {
                self.push(
                    &value.tag,
                    ScalarSample {
                        step: event.step,
                        value: v,
                        wall_time: event.wall_time,
                    },
                );
            }
        }
    }

    fn push(&mut self, tag: &str, sample: ScalarSample) {
        let idx = match self.index.get(tag) {
            Some(&idx) => idx,
            None => {
                self.series.push(ScalarSeries::new(tag));
                self.index.insert(tag.to_string(), self.series.len() - 1);
                self.series.len() - 1
            }
        };
        self.series[idx].samples.push(sample);
    }

    fn finish(self) -> Vec<ScalarSeries> {
        self.series
    }
}

/// Helpers for writing genuine event files in tests.
#[cfg(test)]
pub mod testing {
    use super::proto::{Event, PluginData, Summary, SummaryMetadata, SummaryValue, TensorProto};
    use super::record::write_record;
    use prost::Message;
    use std::fs::File;
    use std::io::BufWriter;
    use std::path::Path;

    /// Builds an event file one scalar at a time.
    #[derive(Default)]
    pub struct EventFileBuilder {
        events: Vec<Event>,
    }

    impl EventFileBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        /// Legacy `simple_value` scalar.
        pub fn scalar(mut self, tag: &str, step: i64, value: f32) -> Self {
            self.events.push(Event {
                wall_time: step as f64,
                step,
                summary: Some(Summary {
                    value: vec![SummaryValue {
                        tag: tag.to_string(),
                        simple_value: Some(value),
                        ..Default::default()
                    }],
                }),
            });
            self
        }

        /// TF2 tensor scalar; metadata is attached when `announce` is set.
        pub fn tensor_scalar(mut self, tag: &str, step: i64, value: f32, announce: bool) -> Self {
            let metadata = announce.then(|| SummaryMetadata {
                plugin_data: Some(PluginData {
                    plugin_name: super::proto::SCALARS_PLUGIN.to_string(),
                    content: Vec::new(),
                }),
            });
            self.events.push(Event {
                wall_time: step as f64,
                step,
                summary: Some(Summary {
                    value: vec![SummaryValue {
                        tag: tag.to_string(),
                        simple_value: None,
                        tensor: Some(TensorProto {
                            dtype: super::proto::DT_FLOAT,
                            float_val: vec![value],
                            ..Default::default()
                        }),
                        metadata,
                    }],
                }),
            });
            self
        }

        /// Write the file, preceded by a file-version event like real writers.
        pub fn write(&self, path: &Path) {
            let mut out = BufWriter::new(File::create(path).unwrap());
            let header = Event {
                wall_time: 0.0,
                step: 0,
                summary: None,
            };
            write_record(&mut out, &header.encode_to_vec()).unwrap();
            for event in &self.events {
                write_record(&mut out, &event.encode_to_vec()).unwrap();
            }
        }
    }
}
