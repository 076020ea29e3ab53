//! Protobuf messages of the TensorBoard event format.
//!
//! Only the fields needed to recover scalars are declared; prost skips the
//! rest on decode. Field tags follow `tensorflow/core/util/event.proto` and
//! `tensorflow/core/framework/summary.proto`.

/// One record of an event file.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Event {
    #[prost(double, tag = "1")]
    pub wall_time: f64,
    #[prost(int64, tag = "2")]
    pub step: i64,
    #[prost(message, optional, tag = "5")]
    pub summary: Option<Summary>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Summary {
    #[prost(message, repeated, tag = "1")]
    pub value: Vec<SummaryValue>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SummaryValue {
    #[prost(string, tag = "1")]
    pub tag: String,
    /// Legacy scalar payload written by `SummaryWriter.add_scalar`.
    #[prost(float, optional, tag = "2")]
    pub simple_value: Option<f32>,
    /// TF2 payload: scalars are rank-0 tensors.
    #[prost(message, optional, tag = "8")]
    pub tensor: Option<TensorProto>,
    #[prost(message, optional, tag = "9")]
    pub metadata: Option<SummaryMetadata>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SummaryMetadata {
    #[prost(message, optional, tag = "1")]
    pub plugin_data: Option<PluginData>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PluginData {
    #[prost(string, tag = "1")]
    pub plugin_name: String,
    #[prost(bytes = "vec", tag = "2")]
    pub content: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TensorProto {
    #[prost(int32, tag = "1")]
    pub dtype: i32,
    #[prost(message, optional, tag = "2")]
    pub tensor_shape: Option<TensorShapeProto>,
    #[prost(bytes = "vec", tag = "4")]
    pub tensor_content: Vec<u8>,
    #[prost(float, repeated, tag = "5")]
    pub float_val: Vec<f32>,
    #[prost(double, repeated, tag = "6")]
    pub double_val: Vec<f64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TensorShapeProto {
    #[prost(message, repeated, tag = "2")]
    pub dim: Vec<TensorShapeDim>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TensorShapeDim {
    #[prost(int64, tag = "1")]
    pub size: i64,
}

/// `DT_FLOAT` in `types.proto`.
pub const DT_FLOAT: i32 = 1;
/// `DT_DOUBLE` in `types.proto`.
pub const DT_DOUBLE: i32 = 2;

/// Plugin name TF2 attaches to scalar summaries.
pub const SCALARS_PLUGIN: &str = "scalars";

impl SummaryValue {
    /// Whether the metadata marks this value as a scalar summary.
    pub fn is_scalar_plugin(&self) -> bool {
        self.metadata
            .as_ref()
            .and_then(|m| m.plugin_data.as_ref())
            .is_some_and(|p| p.plugin_name == SCALARS_PLUGIN)
    }
}

impl TensorProto {
    /// Value of a rank-0 float or double tensor.
    pub fn scalar(&self) -> Option<f64> {
        let rank = self.tensor_shape.as_ref().map_or(0, |s| s.dim.len());
        if rank != 0 {
            return None;
        }
        match self.dtype {
            DT_FLOAT => self.float_val.first().map(|v| f64::from(*v)).or_else(|| {
                let bytes: [u8; 4] = self.tensor_content.get(..4)?.try_into().ok()?;
                Some(f64::from(f32::from_le_bytes(bytes)))
            }),
            DT_DOUBLE => self.double_val.first().copied().or_else(|| {
                let bytes: [u8; 8] = self.tensor_content.get(..8)?.try_into().ok()?;
                Some(f64::from_le_bytes(bytes))
            }),
            _ => None,
        }
    }
}
