use std::{fs, path::Path};

use bincode::{config, Decode, Encode};

use crate::error::SimResult;

/// Save to file, using Bincode. We currently use this for the config.
pub fn save<T: Encode>(path: &Path, data: &T) -> SimResult<()> {
    let encoded = bincode::encode_to_vec(data, config::standard())?;
    fs::write(path, encoded)?;
    Ok(())
}

/// Load from file, using Bincode.
pub fn load<T: Decode<()>>(path: &Path) -> SimResult<T> {
    let bytes = fs::read(path)?;
    let (decoded, _len) = bincode::decode_from_slice(&bytes, config::standard())?;
    Ok(decoded)
}
