use crate::domain::entities::ItemAttributes;
use crate::domain::errors::CodecError;
use crate::ports::outbound::ItemCodec;

/// Human-readable item codec.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonItemCodec;

impl ItemCodec for JsonItemCodec {
    fn encode(&self, attributes: &ItemAttributes) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(attributes).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<ItemAttributes, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }
}
