//! Loading configuration documents into a [`Schema`].

mod credentials;
pub use credentials::{sanitize, Credential, Credentials};

use crate::{err, Result};

use datamap_core::{schema::Config, Error, Schema};

use std::path::Path;

const CREDENTIALS_PREFIX: &str = "@credentials:";

/// Text format of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

/// Collects configuration documents, resolves their credentials and
/// produces a verified [`Schema`].
///
/// Each document is validated when it is added; source references across
/// a namespace are verified by [`Loader::finish`].
#[derive(Debug)]
pub struct Loader {
    credentials: Credentials,
    configs: Vec<Config>,
}

impl Format {
    /// Picks the format from a file extension: `.yaml`, `.yml` or `.json`.
    pub fn from_path(path: &Path) -> Option<Format> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(Format::Yaml),
            "json" => Some(Format::Json),
            _ => None,
        }
    }
}

impl Loader {
    /// A loader resolving placeholders against the process environment.
    pub fn new() -> Loader {
        Loader::with_credentials(Credentials::from_env())
    }

    pub fn with_credentials(credentials: Credentials) -> Loader {
        Loader {
            credentials,
            configs: vec![],
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn credentials_mut(&mut self) -> &mut Credentials {
        &mut self.credentials
    }

    /// Loads variables from a `.env` style file. Documents added afterwards
    /// see them.
    pub fn load_env_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        self.credentials.load_env_file(path)?;
        Ok(self)
    }

    /// Loads named credentials for `@credentials:` references.
    pub fn load_credentials_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        self.credentials.load_credentials_file(path)?;
        Ok(self)
    }

    /// Loads one document, picking the format from the file extension.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let path = path.as_ref();
        let located = |err: Error| err.context(err!("loading {}", path.display()));

        let format = Format::from_path(path).ok_or_else(|| {
            located(Error::invalid_config(
                "unsupported file extension (use .yaml, .yml or .json)",
            ))
        })?;

        let text = std::fs::read_to_string(path).map_err(|err| located(err.into()))?;
        self.load_str(&text, format).map_err(located)?;

        tracing::debug!(path = %path.display(), "loaded configuration file");
        Ok(self)
    }

    /// Loads every configuration document in a directory, in file name
    /// order. Files whose name mentions `credential` are skipped.
    pub fn load_dir(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let path = path.as_ref();

        let mut files = vec![];
        for entry in std::fs::read_dir(path)
            .map_err(|err| Error::from(err).context(err!("reading {}", path.display())))?
        {
            let entry = entry?;
            let file = entry.path();

            if !file.is_file() || Format::from_path(&file).is_none() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_lowercase();
            if name.contains("credential") {
                continue;
            }

            files.push(file);
        }

        if files.is_empty() {
            return Err(Error::invalid_config(format!(
                "no configuration files found in {}",
                path.display()
            )));
        }

        files.sort();
        for file in files {
            self.load_file(file)?;
        }

        Ok(self)
    }

    /// Parses and adds one document.
    pub fn load_str(&mut self, text: &str, format: Format) -> Result<&mut Self> {
        let config: Config = match format {
            Format::Yaml => serde_yaml::from_str(text)?,
            Format::Json => serde_json::from_str(text)?,
        };

        self.add(config)
    }

    /// Validates a document, resolves the connection strings of its sources
    /// and adds it.
    pub fn add(&mut self, mut config: Config) -> Result<&mut Self> {
        config.validate()?;

        if self.configs.iter().any(|c| c.namespace == config.namespace) {
            return Err(Error::invalid_config(format!(
                "namespace `{}` is defined more than once",
                config.namespace
            )));
        }

        for (name, source) in &mut config.sources {
            let located = |err: Error| err.context(err!("source `{}.{name}`", config.namespace));

            match source.connection.strip_prefix(CREDENTIALS_PREFIX) {
                Some(reference) => {
                    let credential = self.credentials.credential(reference.trim()).ok_or_else(|| {
                        located(Error::invalid_config(format!(
                            "credential `{}` not found",
                            reference.trim()
                        )))
                    })?;

                    source.connection = credential.connection.clone();
                    for (key, value) in &credential.options {
                        if !source.options.contains_key(key) {
                            source.options.insert(key.clone(), value.clone());
                        }
                    }
                }
                None => {
                    source.connection = self
                        .credentials
                        .resolve(&source.connection)
                        .map_err(located)?;
                }
            }
        }

        tracing::debug!(
            namespace = %config.namespace,
            sources = config.sources.len(),
            mappings = config.mappings.len(),
            "added configuration"
        );

        self.configs.push(config);
        Ok(self)
    }

    /// Verifies every source reference and returns the schema. The loader
    /// is left empty.
    pub fn finish(&mut self) -> Result<Schema> {
        Schema::from_configs(std::mem::take(&mut self.configs))
    }
}

impl Default for Loader {
    fn default() -> Loader {
        Loader::new()
    }
}
