use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::error::ContentError;

/// Every content file format currently understood by the loaders.
pub const SUPPORTED_VERSION: u64 = 1;

#[derive(Deserialize)]
struct VersionProbe {
    #[serde(rename = "versionId")]
    version_id: u64,
}

pub(crate) fn read_text(path: &Path) -> Result<String, ContentError> {
    fs::read_to_string(path).map_err(|source| ContentError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses `raw`, reporting the JSON path of the first mismatch.
pub(crate) fn parse<T: DeserializeOwned>(path: &Path, raw: &str) -> Result<T, ContentError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
        let json_path = error.path().to_string();
        ContentError::Json {
            path: path.to_path_buf(),
            json_path,
            source: error.into_inner(),
        }
    })
}

/// Checks `versionId` before the full document is deserialized, so a newer file
/// reports its version rather than whichever field changed shape.
pub(crate) fn parse_versioned<T: DeserializeOwned>(
    path: &Path,
    raw: &str,
    extension: &'static str,
) -> Result<T, ContentError> {
    let probe: VersionProbe = parse(path, raw)?;
    if probe.version_id != SUPPORTED_VERSION {
        return Err(ContentError::UnsupportedVersion {
            path: path.to_path_buf(),
            version: probe.version_id,
            extension,
        });
    }
    parse(path, raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Doc {
        #[allow(dead_code)]
        name: String,
    }

    #[test]
    fn parse_error_reports_json_path() {
        let err = parse::<Vec<Doc>>(Path::new("x.json"), r#"[{"name":"a"},{"name":3}]"#)
            .expect_err("must fail");
        match err {
            ContentError::Json { json_path, .. } => assert_eq!(json_path, "[1].name"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn newer_version_is_rejected_before_shape_check() {
        let err = parse_versioned::<Doc>(Path::new("x.btile"), r#"{"versionId":2}"#, ".btile")
            .expect_err("must fail");
        assert!(matches!(
            err,
            ContentError::UnsupportedVersion { version: 2, extension: ".btile", .. }
        ));
    }
}
