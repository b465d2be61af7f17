use crate::Result;

use datamap_core::{schema::Options, Error};

use regex::{Captures, Regex};
use serde::Deserialize;
use std::{collections::HashMap, path::Path, sync::LazyLock};

const CREDENTIALS_PREFIX: &str = "@credentials:";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").expect("valid placeholder pattern")
});

static URL_PASSWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"://([^:/@\s]+):[^@\s]+@").expect("valid password pattern"));

static QUERY_SECRET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(key|token|secret|password)=[^&\s]+").expect("valid query secret pattern")
});

static BEARER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Bearer\s+\S+").expect("valid bearer pattern"));

/// Resolves placeholders in connection strings.
///
/// Supported forms:
///
/// * `${VAR}`: a variable, failing when unset
/// * `${VAR:-default}`: a variable with a fallback, which may be empty
/// * `@credentials:name`: the whole string is replaced by the connection of
///   a credentials file entry
///
/// Variables come from the process environment, `.env` style files, or
/// [`Credentials::set_var`]; later sources override earlier ones.
#[derive(Clone, Default)]
pub struct Credentials {
    vars: HashMap<String, String>,
    named: HashMap<String, Credential>,
}

/// An entry of a credentials file.
#[derive(Clone, Default, Deserialize)]
pub struct Credential {
    pub connection: String,

    #[serde(default)]
    pub options: Options,
}

#[derive(Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    credentials: HashMap<String, Credential>,
}

impl Credentials {
    /// A resolver with no variables.
    pub fn new() -> Credentials {
        Credentials::default()
    }

    /// A resolver seeded with the process environment.
    pub fn from_env() -> Credentials {
        Credentials {
            vars: std::env::vars().collect(),
            ..Credentials::default()
        }
    }

    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn set_credential(&mut self, name: impl Into<String>, credential: Credential) -> &mut Self {
        self.named.insert(name.into(), credential);
        self
    }

    pub fn credential(&self, name: &str) -> Option<&Credential> {
        self.named.get(name)
    }

    /// Loads `KEY=value` lines from a `.env` style file.
    pub fn load_env_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|err| Error::from(err).context(crate::err!("reading env file {}", path.display())))?;

        self.parse_env(&text)
            .map_err(|err| err.context(crate::err!("env file {}", path.display())))
    }

    /// Parses `KEY=value` lines. Blank lines and `#` comments are skipped,
    /// and matching quotes around a value are removed.
    pub fn parse_env(&mut self, text: &str) -> Result<&mut Self> {
        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let line = line.strip_prefix("export ").unwrap_or(line);
            let Some((key, value)) = line.split_once('=') else {
                return Err(Error::invalid_config(format!(
                    "line {}: expected KEY=value",
                    number + 1
                )));
            };

            self.vars.insert(key.trim().to_string(), unquote(value.trim()).to_string());
        }

        Ok(self)
    }

    /// Loads the `credentials:` map of a YAML credentials file.
    pub fn load_credentials_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let path = path.as_ref();
        let located = |err: Error| err.context(crate::err!("credentials file {}", path.display()));

        let text = std::fs::read_to_string(path).map_err(|err| located(err.into()))?;
        let file: CredentialsFile = serde_yaml::from_str(&text).map_err(|err| located(err.into()))?;

        tracing::debug!(path = %path.display(), entries = file.credentials.len(), "loaded credentials file");
        self.named.extend(file.credentials);
        Ok(self)
    }

    /// Resolves every placeholder in `raw`.
    ///
    /// Errors name the missing variable or credential, never a value.
    pub fn resolve(&self, raw: &str) -> Result<String> {
        if let Some(name) = raw.strip_prefix(CREDENTIALS_PREFIX) {
            return self
                .named
                .get(name.trim())
                .map(|credential| credential.connection.clone())
                .ok_or_else(|| Error::invalid_config(format!("credential `{}` not found", name.trim())));
        }

        let mut missing = None;
        let resolved = PLACEHOLDER.replace_all(raw, |caps: &Captures<'_>| {
            let name = &caps[1];
            match (self.vars.get(name), caps.get(2)) {
                (Some(value), _) => value.clone(),
                (None, Some(default)) => default.as_str().to_string(),
                (None, None) => {
                    missing.get_or_insert_with(|| name.to_string());
                    String::new()
                }
            }
        });

        match missing {
            Some(name) => Err(Error::invalid_config(format!(
                "environment variable `{name}` is not set and has no default"
            ))),
            None => Ok(resolved.into_owned()),
        }
    }
}

/// Masks secrets in text meant for logs: URL passwords, `key=`, `token=`,
/// `secret=` and `password=` values, and bearer tokens.
pub fn sanitize(text: &str) -> String {
    let text = URL_PASSWORD.replace_all(text, "://$1:***@");
    let text = QUERY_SECRET.replace_all(&text, "$1=***");
    BEARER.replace_all(&text, "Bearer ***").into_owned()
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut named: Vec<_> = self.named.keys().collect();
        named.sort();

        f.debug_struct("Credentials")
            .field("vars", &self.vars.len())
            .field("named", &named)
            .finish()
    }
}

impl core::fmt::Debug for Credential {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("Credential")
            .field("connection", &"<redacted>")
            .field("options", &self.options)
            .finish()
    }
}
