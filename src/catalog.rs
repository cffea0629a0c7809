//! Fixture matrix loading, validation and suite selection.
//!
//! The matrix is a JSON document listing every known playback fixture. Raw
//! records are parsed leniently and then promoted into [`FixtureDefinition`]
//! through a single validating factory, so a malformed entry fails the load
//! with an error naming the fixture instead of surfacing mid-run.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path};

use crate::error::CatalogError;

/// Frame count used when a fixture does not declare one.
pub const DEFAULT_FRAMES: u64 = 60;

/// Suites the CLI can select.
///
/// `smoke` keeps only fixtures carrying that tag; `full` is the exhaustive
/// set and selects the whole catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suite {
    Smoke,
    Full,
}

impl Suite {
    pub fn as_str(&self) -> &'static str {
        match self {
            Suite::Smoke => "smoke",
            Suite::Full => "full",
        }
    }
}

impl std::fmt::Display for Suite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated, immutable description of one playback fixture.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FixtureDefinition {
    pub id: String,
    pub file: String,
    pub url: String,
    pub codec: Option<String>,
    pub container: Option<String>,
    pub frames: u64,
    pub suite: String,
}

impl FixtureDefinition {
    fn from_raw(index: usize, entry: Value) -> Result<Self, CatalogError> {
        let unnamed = |reason: String| CatalogError::InvalidDefinition {
            id: format!("#{index}"),
            reason,
        };
        let raw: RawFixture = serde_json::from_value(entry)
            .map_err(|_| unnamed("fixture entry must be an object".to_string()))?;

        let id = match text_field("id", raw.id).map_err(unnamed)? {
            Some(id) => id.trim().to_string(),
            None => return Err(unnamed("missing id".to_string())),
        };
        let invalid = |reason: String| CatalogError::InvalidDefinition {
            id: id.clone(),
            reason,
        };
        if !is_bare_file_name(&id) {
            return Err(invalid("id must be usable as a plain file name".to_string()));
        }

        let file = text_field("file", raw.file)
            .map_err(invalid)?
            .ok_or_else(|| invalid("missing file or url".to_string()))?;
        let url = text_field("url", raw.url)
            .map_err(invalid)?
            .ok_or_else(|| invalid("missing file or url".to_string()))?;
        if !is_bare_file_name(&file) {
            return Err(invalid("file must be a plain file name".to_string()));
        }

        let frames = match raw.frames {
            None | Some(Value::Null) => DEFAULT_FRAMES,
            Some(value) => value
                .as_u64()
                .filter(|frames| *frames > 0)
                .ok_or_else(|| invalid("frames must be a positive integer".to_string()))?,
        };

        let codec = text_field("codec", raw.codec).map_err(invalid)?;
        let container = text_field("container", raw.container).map_err(invalid)?;
        let suite = text_field("suite", raw.suite)
            .map_err(invalid)?
            .unwrap_or_default();

        Ok(Self {
            id,
            file,
            url,
            codec,
            container,
            frames,
            suite,
        })
    }
}

/// Ordered collection of validated fixtures loaded from a matrix file.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureCatalog {
    fixtures: Vec<FixtureDefinition>,
}

impl FixtureCatalog {
    /// Read and validate the fixture matrix at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|err| CatalogError::Unreadable {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        let catalog = Self::from_json(&contents)?;
        log::info!(
            "[Catalog] Loaded {} fixtures from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Parse matrix contents from JSON and validate invariants.
    pub fn from_json(data: &str) -> Result<Self, CatalogError> {
        let matrix: RawMatrix = serde_json::from_str(data).map_err(|err| {
            CatalogError::Malformed {
                reason: err.to_string(),
            }
        })?;
        if matrix.fixtures.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        let mut fixtures = Vec::with_capacity(matrix.fixtures.len());
        for (index, raw) in matrix.fixtures.into_iter().enumerate() {
            let fixture = FixtureDefinition::from_raw(index, raw)?;
            if !seen.insert(fixture.id.clone()) {
                return Err(CatalogError::DuplicateId { id: fixture.id });
            }
            fixtures.push(fixture);
        }
        Ok(Self { fixtures })
    }

    pub fn fixtures(&self) -> &[FixtureDefinition] {
        &self.fixtures
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }
}

/// Select the fixtures for `suite`, in catalog order.
///
/// `full` selects every fixture; any other suite keeps the fixtures tagged
/// with it.
pub fn filter(
    fixtures: &[FixtureDefinition],
    suite: &str,
) -> Result<Vec<FixtureDefinition>, CatalogError> {
    let exhaustive = suite == Suite::Full.as_str();
    let selected: Vec<FixtureDefinition> = fixtures
        .iter()
        .filter(|fixture| exhaustive || fixture.suite == suite)
        .cloned()
        .collect();
    if selected.is_empty() {
        return Err(CatalogError::EmptySelection {
            suite: suite.to_string(),
        });
    }
    Ok(selected)
}

#[derive(Debug, Deserialize)]
struct RawMatrix {
    #[serde(default)]
    fixtures: Vec<Value>,
}

// Field types are checked in `from_raw` so errors can name the fixture.
#[derive(Debug, Deserialize)]
struct RawFixture {
    id: Option<Value>,
    file: Option<Value>,
    url: Option<Value>,
    codec: Option<Value>,
    container: Option<Value>,
    frames: Option<Value>,
    suite: Option<Value>,
}

/// Optional string field; blank strings count as absent.
fn text_field(name: &str, value: Option<Value>) -> Result<Option<String>, String> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(_) => Err(format!("{name} must be a string")),
    }
}

fn is_bare_file_name(file: &str) -> bool {
    let mut components = Path::new(file).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
