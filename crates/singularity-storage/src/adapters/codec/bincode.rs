use crate::domain::entities::ItemAttributes;
use crate::domain::errors::CodecError;
use crate::ports::outbound::ItemCodec;

/// Compact item codec using bincode.
#[derive(Debug, Default, Clone, Copy)]
pub struct BincodeItemCodec;

impl ItemCodec for BincodeItemCodec {
    fn encode(&self, attributes: &ItemAttributes) -> Result<Vec<u8>, CodecError> {
        bincode::serialize(attributes).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<ItemAttributes, CodecError> {
        bincode::deserialize(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }
}
