use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use log::{info, warn};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct Teacher {
    pub name: String,
    // plaintext, as stored in the credentials file
    pub password: String,
}

#[derive(Deserialize)]
struct TeachersFile {
    teachers: HashMap<String, Teacher>,
}

#[derive(Debug)]
pub enum LoadError {
    Io(io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for LoadError {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(fmt, "read: {e}"),
            Self::Parse(e) => write!(fmt, "parse: {e}"),
        }
    }
}

/// Read-only username -> teacher mapping.
#[derive(Default)]
pub struct Teachers(HashMap<String, Teacher>);

impl Teachers {
    /// Loads the credentials file, falling back to no teachers at all if
    /// it is missing or malformed.
    pub fn load(path: &Path) -> Self {
        let loaded = File::open(path)
            .map_err(LoadError::Io)
            .and_then(|f| Self::read(BufReader::new(f)));

        match loaded {
            Ok(teachers) => {
                info!("loaded {} teachers from {path:?}", teachers.len());
                teachers
            }
            Err(e) => {
                warn!("couldn't load teachers from {path:?}, nobody can log in: {e}");
                Self::default()
            }
        }
    }

    pub fn read(input: impl Read) -> Result<Self, LoadError> {
        let file: TeachersFile = serde_json::from_reader(input).map_err(LoadError::Parse)?;

        Ok(Self(file.teachers))
    }

    pub fn find(&self, username: &str) -> Option<&Teacher> {
        self.0.get(username)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
impl Teachers {
    pub fn with(entries: &[(&str, &str, &str)]) -> Self {
        Self(
            entries
                .iter()
                .map(|&(username, name, password)| {
                    (
                        username.into(),
                        Teacher {
                            name: name.into(),
                            password: password.into(),
                        },
                    )
                })
                .collect(),
        )
    }
}
