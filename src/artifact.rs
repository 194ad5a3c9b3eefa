use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::{ArtifactError, ArtifactLoadError};
use crate::gbm::GradientBoostingModel;
use crate::preprocess::Preprocessor;

const ARTIFACT_VERSION: u32 = 1;

/// A fitted state that can be written to and read back from disk.
pub trait Artifact: Serialize + DeserializeOwned {
    const KIND: &'static str;

    /// Structural checks applied before encoding and after decoding.
    fn validate(&self) -> Result<(), ArtifactError>;
}

impl Artifact for Preprocessor {
    const KIND: &'static str = "xg_preprocessor";

    fn validate(&self) -> Result<(), ArtifactError> {
        Ok(Preprocessor::validate(self)?)
    }
}

impl Artifact for GradientBoostingModel {
    const KIND: &'static str = "xg_gradient_boosting";

    fn validate(&self) -> Result<(), ArtifactError> {
        Ok(GradientBoostingModel::validate(self)?)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    kind: String,
    version: u32,
    generated_at: String,
    // Hex SHA-256 of the payload bytes exactly as stored.
    checksum: String,
    payload: Box<RawValue>,
}

/// Refuses states that `decode` would reject, e.g. non-finite floats that JSON stores as null.
pub fn encode<A: Artifact>(artifact: &A) -> Result<Vec<u8>> {
    artifact
        .validate()
        .with_context(|| format!("refusing to encode invalid {}", A::KIND))?;
    let payload = serde_json::to_string(artifact).context("serialize artifact payload")?;
    let checksum = hex_sha256(payload.as_bytes());
    let envelope = Envelope {
        kind: A::KIND.to_string(),
        version: ARTIFACT_VERSION,
        generated_at: chrono::Utc::now().to_rfc3339(),
        checksum,
        payload: RawValue::from_string(payload).context("wrap artifact payload")?,
    };
    serde_json::to_vec(&envelope).context("serialize artifact envelope")
}

pub fn decode<A: Artifact>(bytes: &[u8]) -> Result<A, ArtifactError> {
    let envelope: Envelope = serde_json::from_slice(bytes).map_err(ArtifactError::Envelope)?;
    if envelope.kind != A::KIND {
        return Err(ArtifactError::WrongKind {
            expected: A::KIND,
            found: envelope.kind,
        });
    }
    if envelope.version != ARTIFACT_VERSION {
        return Err(ArtifactError::UnsupportedVersion(envelope.version));
    }
    let raw = envelope.payload.get();
    if hex_sha256(raw.as_bytes()) != envelope.checksum {
        return Err(ArtifactError::ChecksumMismatch);
    }
    let artifact: A = serde_json::from_str(raw).map_err(ArtifactError::Payload)?;
    artifact.validate()?;
    Ok(artifact)
}

/// Writes via a temporary sibling file and a rename so readers never see a partial file.
pub fn save<A: Artifact>(artifact: &A, path: &Path) -> Result<()> {
    let bytes = encode(artifact)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create artifact dir {}", parent.display()))?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &bytes).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("swap {}", path.display()))?;
    info!(kind = A::KIND, path = %path.display(), bytes = bytes.len(), "artifact written");
    Ok(())
}

pub fn load<A: Artifact>(path: &Path) -> Result<A, ArtifactLoadError> {
    let bytes = fs::read(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            ArtifactLoadError::Missing {
                path: path.to_path_buf(),
            }
        } else {
            ArtifactLoadError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    decode(&bytes).map_err(|source| ArtifactLoadError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

fn hex_sha256(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ShotRecord;

    fn fitted() -> Preprocessor {
        let mut a = ShotRecord {
            numerical: [Some(0.1), Some(0.2), None, Some(1.0 / 3.0), Some(2.5)],
            ..Default::default()
        };
        a.categorical[0] = "Regular Play".to_string();
        let mut b = a.clone();
        b.numerical[0] = Some(99.7);
        b.categorical[0] = "From Corner".to_string();
        Preprocessor::fit(&[a, b])
    }

    #[test]
    fn decode_rejects_wrong_kind() {
        let bytes = encode(&fitted()).unwrap();
        let err = decode::<GradientBoostingModel>(&bytes).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::WrongKind {
                expected: "xg_gradient_boosting",
                ..
            }
        ));
    }

    #[test]
    fn decode_detects_tampered_payload() {
        let bytes = encode(&fitted()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let tampered = text.replacen("From Corner", "From Cornet", 1);
        assert_ne!(text, tampered);
        let err = decode::<Preprocessor>(tampered.as_bytes()).unwrap_err();
        assert!(matches!(err, ArtifactError::ChecksumMismatch));
    }

    #[test]
    fn decode_preserves_exact_floats() {
        let p = fitted();
        let back: Preprocessor = decode(&encode(&p).unwrap()).unwrap();
        assert_eq!(back, p);
        assert_eq!(
            back.numeric_stats()[3].mean.to_bits(),
            (1.0_f64 / 3.0).to_bits()
        );
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            decode::<Preprocessor>(b"not json"),
            Err(ArtifactError::Envelope(_))
        ));
    }

    #[test]
    fn huge_finite_statistics_survive_the_envelope() {
        let mut a = ShotRecord::default();
        a.numerical[0] = Some(1.5e308);
        let mut b = a.clone();
        b.numerical[0] = Some(1.7e308);
        let p = Preprocessor::fit(&[a, b]);
        assert!(p.numeric_stats()[0].mean.is_finite());
        let back: Preprocessor = decode(&encode(&p).unwrap()).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn invalid_state_is_never_written() {
        let mut value = serde_json::to_value(fitted()).unwrap();
        value["categorical"][0]["categories"] = serde_json::json!(["Regular Play", "From Corner"]);
        let unsorted: Preprocessor = serde_json::from_value(value).unwrap();
        assert!(encode(&unsorted).is_err());

        let dir = std::env::temp_dir().join(format!("xg_artifact_invalid_{}", std::process::id()));
        let path = dir.join("preprocessor.json");
        assert!(save(&unsorted, &path).is_err());
        assert!(!path.exists());
        let _ = fs::remove_dir_all(&dir);
    }
}
