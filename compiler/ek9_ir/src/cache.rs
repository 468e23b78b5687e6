//! Binary encoding of generated IR for the incremental cache.

use crate::Instr;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("failed to serialize IR: {0}")]
    Encode(bincode::Error),
    #[error("failed to deserialize IR: {0}")]
    Decode(bincode::Error),
}

pub fn encode(instrs: &[Instr]) -> Result<Vec<u8>, CacheError> {
    bincode::serialize(instrs).map_err(CacheError::Encode)
}

pub fn decode(bytes: &[u8]) -> Result<Vec<Instr>, CacheError> {
    bincode::deserialize(bytes).map_err(CacheError::Decode)
}
