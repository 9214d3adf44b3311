//! Codec configuration
//!
//! Configuration holds the set of `traceparent` versions the codec accepts.
//! Defaults can be overridden through the `TRACEPARENT_SUPPORTED_VERSIONS`
//! environment variable.
use crate::tp_warn;
use crate::trace::Version;
use std::env;

/// Environment variable listing the accepted versions, e.g. `00,01`.
pub(crate) const SUPPORTED_VERSIONS_ENV: &str = "TRACEPARENT_SUPPORTED_VERSIONS";

/// Codec configuration
///
/// The accepted version set is never empty and never contains the forbidden
/// version `ff`. It can only be changed through
/// [`CodecConfig::with_supported_versions`] or the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct CodecConfig {
    supported_versions: Vec<Version>,
}

impl CodecConfig {
    /// Replace the set of accepted versions.
    ///
    /// An empty set, or one containing the forbidden version `ff`, is ignored.
    pub fn with_supported_versions<I>(mut self, versions: I) -> Self
    where
        I: IntoIterator<Item = Version>,
    {
        let versions: Vec<Version> = versions.into_iter().collect();
        if versions.is_empty() || versions.contains(&Version::INVALID) {
            tp_warn!(
                name: "CodecConfig.InvalidSupportedVersions",
                message = "supported versions must be a non-empty set without 'ff', keeping the previous set",
            );
        } else {
            self.supported_versions = versions;
        }
        self
    }

    /// Versions accepted by [`TraceparentCodec::decode`].
    ///
    /// Headers carrying any other version are rejected with
    /// [`TraceparentError::InvalidVersion`].
    ///
    /// [`TraceparentCodec::decode`]: crate::TraceparentCodec::decode
    /// [`TraceparentError::InvalidVersion`]: crate::TraceparentError::InvalidVersion
    pub fn supported_versions(&self) -> &[Version] {
        &self.supported_versions
    }

    /// Returns `true` if `version` is accepted.
    pub fn supports(&self, version: Version) -> bool {
        self.supported_versions.contains(&version)
    }
}

impl Default for CodecConfig {
    /// Create the default configuration, accepting version `00` unless the
    /// environment says otherwise.
    fn default() -> Self {
        let mut config = CodecConfig {
            supported_versions: vec![Version::V00],
        };

        if let Ok(value) = env::var(SUPPORTED_VERSIONS_ENV) {
            match parse_versions(&value) {
                Some(versions) => config.supported_versions = versions,
                None => {
                    tp_warn!(
                        name: "CodecConfig.InvalidSupportedVersions",
                        message = format!(
                            "{SUPPORTED_VERSIONS_ENV} must be a comma separated list of two digit lowercase hex versions other than 'ff'. Using default: 00"
                        ),
                        value = value.as_str(),
                    );
                }
            }
        }

        config
    }
}

fn parse_versions(value: &str) -> Option<Vec<Version>> {
    let versions = value
        .split(',')
        .map(str::trim)
        .map(|v| Version::from_hex(v).ok().filter(|v| *v != Version::INVALID))
        .collect::<Option<Vec<_>>>()?;

    if versions.is_empty() {
        None
    } else {
        Some(versions)
    }
}
