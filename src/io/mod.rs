//! Reading molecule collections from SMILES files

use crate::chem::{Molecule, SmilesError};
use crate::core::item::{Series, Value};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Error types for collection loading
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("Failed to read '{location}': {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to fetch '{location}': {source}")]
    Http {
        location: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to fetch '{location}': HTTP {status}")]
    Status { location: String, status: u16 },

    #[error("Line {line}: no column {column}")]
    MissingColumn { line: usize, column: usize },

    #[error("Line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: SmilesError,
    },
}

/// Layout of a SMILES file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadOptions {
    /// Zero-based column holding the SMILES string
    #[serde(default)]
    pub smiles_column: usize,

    /// Zero-based column holding the molecule name; rows are named by index otherwise
    #[serde(default)]
    pub name_column: Option<usize>,

    /// Skip the first non-comment line
    #[serde(default)]
    pub header: bool,

    /// Skip unparsable lines with a warning instead of failing
    #[serde(default)]
    pub force: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            smiles_column: 0,
            name_column: None,
            header: false,
            force: false,
        }
    }
}

/// Whether a location should be fetched over HTTP
pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Read a SMILES file from a local path or an http(s) URL
pub async fn read_smiles(location: &str, options: &ReadOptions) -> Result<Series, ReadError> {
    let content = if is_remote(location) {
        fetch(location).await?
    } else {
        tokio::fs::read_to_string(location)
            .await
            .map_err(|source| ReadError::Io {
                location: location.to_string(),
                source,
            })?
    };

    let series = parse_smiles_table(&content, options)?;
    info!("Read {} molecules from {}", series.len(), location);
    Ok(series)
}

async fn fetch(location: &str) -> Result<String, ReadError> {
    debug!("Fetching {}", location);
    let http = |source| ReadError::Http {
        location: location.to_string(),
        source,
    };

    let response = reqwest::Client::new().get(location).send().await.map_err(http)?;
    if !response.status().is_success() {
        return Err(ReadError::Status {
            location: location.to_string(),
            status: response.status().as_u16(),
        });
    }
    response.text().await.map_err(http)
}

/// Parse SMILES file content into a named series of molecules
///
/// Fields are separated by whitespace or commas. Blank lines and lines
/// starting with `#` are ignored.
pub fn parse_smiles_table(content: &str, options: &ReadOptions) -> Result<Series, ReadError> {
    let mut series = Series::new();
    let mut header_pending = options.header;
    let mut row = 0;

    for (index, raw) in content.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if header_pending {
            header_pending = false;
            continue;
        }

        let fields: Vec<&str> = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|f| !f.is_empty())
            .collect();
        let current = row;
        row += 1;

        match parse_row(&fields, line_no, current, options) {
            Ok((name, mol)) => series.push(name, Value::Mol(mol)),
            Err(err) if options.force => warn!("Skipping {}", err),
            Err(err) => return Err(err),
        }
    }
    Ok(series)
}

fn parse_row(fields: &[&str], line: usize, row: usize, options: &ReadOptions) -> Result<(String, Molecule), ReadError> {
    let column = |column: usize| {
        fields
            .get(column)
            .copied()
            .ok_or(ReadError::MissingColumn { line, column })
    };

    let smiles = column(options.smiles_column)?;
    let name = match options.name_column {
        Some(c) => column(c)?.to_string(),
        None => row.to_string(),
    };

    let mut mol = Molecule::from_smiles(smiles).map_err(|source| ReadError::Parse { line, source })?;
    mol.name = Some(name.clone());
    Ok((name, mol))
}
