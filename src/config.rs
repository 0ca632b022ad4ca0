use crate::error::{ResolveError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Largest accepted `leap`.
pub const MAX_LEAP: usize = 99;

/// Settings of a repeat resolution run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Extra neighbour hops when deciding whether two far-side edges touch.
    pub leap: usize,
    /// Upper bound on full resolution rounds; 1 is a single pass.
    pub max_rounds: usize,
    /// Worker threads for the per-vertex scan.
    pub threads: usize,
    /// Match one-sided edges through far-side edges seen from both directions.
    pub bridge_one_sided: bool,
    /// Reject paired info that is not strand symmetric.
    pub strict_symmetry: bool,
    pub symmetry_tolerance: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            leap: 0,
            max_rounds: 1,
            threads: 1,
            bridge_one_sided: true,
            strict_symmetry: false,
            symmetry_tolerance: 1e-6,
        }
    }
}

impl ResolverConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: ResolverConfig = serde_json::from_reader(reader)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.leap > MAX_LEAP {
            return Err(ResolveError::InvalidConfig {
                field: "leap",
                reason: format!("must be at most {}, got {}", MAX_LEAP, self.leap),
            });
        }
        if self.max_rounds == 0 {
            return Err(ResolveError::InvalidConfig {
                field: "max_rounds",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.threads == 0 {
            return Err(ResolveError::InvalidConfig {
                field: "threads",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.symmetry_tolerance.is_nan() || self.symmetry_tolerance < 0.0 {
            return Err(ResolveError::InvalidConfig {
                field: "symmetry_tolerance",
                reason: format!("must be non-negative, got {}", self.symmetry_tolerance),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_is_single_pass() {
        let config = ResolverConfig::default();
        assert_eq!(config.max_rounds, 1);
        assert_eq!(config.leap, 0);
        assert_eq!(config.threads, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut config = ResolverConfig {
            leap: 100,
            ..ResolverConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ResolveError::InvalidConfig { field: "leap", .. })
        ));
        config.leap = 3;
        config.max_rounds = 0;
        assert!(config.validate().is_err());
        config.max_rounds = 2;
        config.threads = 0;
        assert!(config.validate().is_err());
        config.threads = 2;
        config.symmetry_tolerance = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{\"leap\": 2, \"strict_symmetry\": true}}").unwrap();
        file.flush().unwrap();

        let config = ResolverConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.leap, 2);
        assert!(config.strict_symmetry);
        assert_eq!(config.max_rounds, 1);
        assert!(config.bridge_one_sided);
    }
}
