// Values BLOB: [version: u8][wincode Vec<f64>].

pub(super) const BLOB_VERSION: u8 = 1;

pub(super) fn with_version_prefix(version: u8, payload: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + payload.len());
    out.push(version);
    out.extend_from_slice(&payload);
    out
}

pub(super) fn blob_version(bytes: &[u8]) -> Option<u8> {
    bytes.first().copied()
}

pub(super) fn encode_values(values: &[f64]) -> anyhow::Result<Vec<u8>> {
    let payload = wincode::serialize(&values.to_vec())
        .map_err(|e| anyhow::anyhow!("wincode values: {}", e))?;
    Ok(with_version_prefix(BLOB_VERSION, payload))
}

/// Unknown or missing version is a data-integrity error; values are never guessed.
pub(super) fn decode_values(bytes: &[u8]) -> anyhow::Result<Vec<f64>> {
    match blob_version(bytes) {
        Some(BLOB_VERSION) => wincode::deserialize::<Vec<f64>>(&bytes[1..])
            .map_err(|e| anyhow::anyhow!("wincode deserialize values: {}", e)),
        Some(v) => anyhow::bail!("unsupported values blob version {}", v),
        None => anyhow::bail!("empty values blob"),
    }
}
