//! Generator configuration: trunk name and pull-request segment predicates.
//!
//! Defaults describe the APIM monorepo layout. A TOML file can override the
//! trunk and the predicates of individual segments:
//!
//! ```toml
//! trunk = "master"
//!
//! [segments]
//! backend = ["src/", "pom.xml"]
//! console = ["gravitee-apim-console-webui/"]
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::changeset::PathPredicate;
use crate::error::ConfigError;

pub const DEFAULT_TRUNK: &str = "master";

/// Pull-request workflow segments, in the order they are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Backend,
    Console,
    Portal,
    Helm,
    E2e,
}

impl Segment {
    pub const ALL: [Segment; 5] = [
        Segment::Backend,
        Segment::Console,
        Segment::Portal,
        Segment::Helm,
        Segment::E2e,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Segment::Backend => "backend",
            Segment::Console => "console",
            Segment::Portal => "portal",
            Segment::Helm => "helm",
            Segment::E2e => "e2e",
        }
    }

    fn default_predicates(&self) -> &'static [&'static str] {
        match self {
            Segment::Backend => &[
                "gravitee-apim-definition/",
                "gravitee-apim-gateway/",
                "gravitee-apim-plugin/",
                "gravitee-apim-repository/",
                "gravitee-apim-rest-api/",
                "gravitee-apim-integration-tests/",
                "gravitee-apim-distribution/",
                "pom.xml",
            ],
            Segment::Console => &["gravitee-apim-console-webui/", "gravitee-apim-webui-libs/"],
            Segment::Portal => &[
                "gravitee-apim-portal-webui/",
                "gravitee-apim-portal-webui-next/",
                "gravitee-apim-webui-libs/",
            ],
            Segment::Helm => &["helm/"],
            Segment::E2e => &["gravitee-apim-e2e/", "docker/"],
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Segment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Segment::ALL
            .into_iter()
            .find(|segment| segment.name() == s)
            .ok_or_else(|| ConfigError::UnknownSegment {
                name: s.to_string(),
            })
    }
}

/// A segment together with the predicates that make it relevant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentRule {
    pub segment: Segment,
    pub predicates: Vec<PathPredicate>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    trunk: Option<String>,
    #[serde(default)]
    segments: BTreeMap<String, Vec<String>>,
}

/// Configuration shared by every generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub trunk: String,
    pub segments: Vec<SegmentRule>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        let segments = Segment::ALL
            .into_iter()
            .map(|segment| SegmentRule {
                segment,
                predicates: segment
                    .default_predicates()
                    .iter()
                    .map(|p| PathPredicate::prefix(*p))
                    .collect(),
            })
            .collect();
        Self {
            trunk: DEFAULT_TRUNK.to_string(),
            segments,
        }
    }
}

impl GeneratorConfig {
    /// Load overrides from a TOML file on top of the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(contents)?;
        let mut config = Self::default();

        if let Some(trunk) = file.trunk {
            config = config.with_trunk(trunk)?;
        }
        for (name, predicates) in &file.segments {
            let segment: Segment = name.parse()?;
            config = config.with_segment_predicates(segment, predicates)?;
        }
        Ok(config)
    }

    pub fn with_trunk(mut self, trunk: impl Into<String>) -> Result<Self, ConfigError> {
        let trunk = trunk.into().trim().to_string();
        if trunk.is_empty() {
            return Err(ConfigError::EmptyTrunk);
        }
        self.trunk = trunk;
        Ok(self)
    }

    /// Replace the predicates of one segment.
    pub fn with_segment_predicates<S: AsRef<str>>(
        mut self,
        segment: Segment,
        predicates: &[S],
    ) -> Result<Self, ConfigError> {
        let parsed = predicates
            .iter()
            .map(|p| PathPredicate::parse(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(rule) = self.segments.iter_mut().find(|r| r.segment == segment) {
            rule.predicates = parsed;
        }
        Ok(self)
    }

    pub fn predicates_for(&self, segment: Segment) -> &[PathPredicate] {
        self.segments
            .iter()
            .find(|r| r.segment == segment)
            .map(|r| r.predicates.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::default();
        assert_eq!(config.trunk, "master");
        let order: Vec<Segment> = config.segments.iter().map(|r| r.segment).collect();
        assert_eq!(order, Segment::ALL.to_vec());
        assert!(config
            .predicates_for(Segment::Backend)
            .contains(&PathPredicate::prefix("gravitee-apim-gateway/")));
    }

    #[test]
    fn test_segment_names_round_trip() {
        for segment in Segment::ALL {
            assert_eq!(segment.name().parse::<Segment>().unwrap(), segment);
        }
    }

    #[test]
    fn test_from_toml_overrides() {
        let config = GeneratorConfig::from_toml_str(
            r#"
            trunk = "main"

            [segments]
            backend = ["src/", "**/*.java"]
            "#,
        )
        .unwrap();
        assert_eq!(config.trunk, "main");
        let backend = config.predicates_for(Segment::Backend);
        assert_eq!(backend.len(), 2);
        assert_eq!(backend[0], PathPredicate::prefix("src/"));
        assert!(matches!(backend[1], PathPredicate::Glob(_)));
        // Untouched segments keep their defaults.
        assert_eq!(
            config.predicates_for(Segment::Helm),
            &[PathPredicate::prefix("helm/")]
        );
    }

    #[test]
    fn test_unknown_segment_rejected() {
        let err = GeneratorConfig::from_toml_str("[segments]\nmobile = [\"ios/\"]").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownSegment { name } if name == "mobile"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = GeneratorConfig::from_toml_str("trunc = \"master\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_empty_trunk_rejected() {
        let err = GeneratorConfig::from_toml_str("trunk = \"  \"").unwrap_err();
        assert!(matches!(err, ConfigError::EmptyTrunk));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apim-ci.toml");
        std::fs::write(&path, "[segments]\nportal = [\"portal/\"]\n").unwrap();
        let config = GeneratorConfig::load(&path).unwrap();
        assert_eq!(
            config.predicates_for(Segment::Portal),
            &[PathPredicate::prefix("portal/")]
        );
    }

    #[test]
    fn test_load_missing_file() {
        let err = GeneratorConfig::load(Path::new("/nonexistent/apim-ci.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
