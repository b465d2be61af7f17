mod template;
use template::Template;

use datamap_core::{
    adapter::{Action, Operation, Response},
    async_trait, bail, err,
    schema::{Options, Source},
    Adapter, Error, Record, Result, Value,
};

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering::SeqCst},
};

const FILE_SCHEME: &str = "file://";

/// An adapter storing one JSON document per record under a base directory.
///
/// Statements are path templates relative to the base directory, such as
/// `users/{id}.json`; placeholders are filled from the record (or the fetch
/// parameters). A multi-record fetch lists the template's directory and
/// treats placeholders of the file name that have no parameter as
/// wildcards.
///
/// The base directory comes from the `base_path` option, else from the
/// connection string (`file://` prefix optional). Generated fields left
/// empty on insert receive a random UUID.
#[derive(Debug)]
pub struct Fs {
    base: PathBuf,
    closed: AtomicBool,
}

impl Fs {
    pub fn new(base: impl Into<PathBuf>) -> Fs {
        Fs {
            base: base.into(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn factory(source: &Source) -> Result<Box<dyn Adapter>> {
        let base = match source.option_str("base_path") {
            Some(base) => base,
            None => source
                .connection
                .strip_prefix(FILE_SCHEME)
                .unwrap_or(&source.connection),
        };

        if base.trim().is_empty() {
            return Err(Error::invalid_config(
                "fs source needs a `base_path` option or a connection path",
            ));
        }

        Ok(Box::new(Fs::new(base.trim())))
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn check_open(&self) -> Result<()> {
        if self.closed.load(SeqCst) {
            bail!("fs adapter is closed");
        }
        Ok(())
    }

    async fn read(&self, path: &Path) -> Result<Option<Record>> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(Error::from(err).context(err!("reading {}", path.display()))),
        };

        let json: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|err| Error::from(err).context(err!("parsing {}", path.display())))?;

        match Value::from(json) {
            Value::Record(record) => Ok(Some(record)),
            other => Err(Error::invalid_result(format!(
                "{} holds a JSON {} instead of an object",
                path.display(),
                other.kind()
            ))),
        }
    }

    /// Writes through a temporary file in the same directory, then renames
    /// it over the target.
    async fn write(&self, path: &Path, record: &Record) -> Result<()> {
        let dir = path.parent().unwrap_or(&self.base);
        tokio::fs::create_dir_all(dir).await?;

        let json = serde_json::to_vec_pretty(&Value::Record(record.clone()).to_json())?;
        let tmp = dir.join(format!(".{}.tmp", uuid::Uuid::new_v4()));

        tokio::fs::write(&tmp, json).await?;
        if let Err(err) = tokio::fs::rename(&tmp, path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(Error::from(err).context(err!("writing {}", path.display())));
        }

        Ok(())
    }

    /// Reads every document matching the template and `params`. Parameters
    /// not consumed by the template filter the documents by equality.
    async fn scan(&self, template: &Template, params: &Record) -> Result<Vec<Record>> {
        let (dir, pattern) = template.scan(params)?;
        let dir = self.base.join(dir);

        let mut filter = params.clone();
        for field in template.fields() {
            filter.remove(field);
        }

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(err) => return Err(Error::from(err).context(err!("listing {}", dir.display()))),
        };

        let mut paths = vec![];
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };

            if !name.starts_with('.') && pattern.matches(name) && entry.file_type().await?.is_file() {
                paths.push(entry.path());
            }
        }
        paths.sort();

        let mut records = vec![];
        for path in paths {
            if let Some(record) = self.read(&path).await? {
                if record.matches(&filter) {
                    records.push(record);
                }
            }
        }

        Ok(records)
    }
}

#[async_trait]
impl Adapter for Fs {
    async fn connect(&mut self, options: &Options) -> Result<()> {
        if let Some(base) = options.get("base_path").and_then(serde_json::Value::as_str) {
            self.base = PathBuf::from(base);
        }

        tokio::fs::create_dir_all(&self.base)
            .await
            .map_err(|err| Error::from(err).context(err!("creating {}", self.base.display())))?;

        tracing::debug!(base = %self.base.display(), "fs adapter connected");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, SeqCst) {
            bail!("fs adapter is already closed");
        }
        Ok(())
    }

    async fn fetch(&self, op: &Operation, params: &Record) -> Result<Vec<Record>> {
        self.check_open()?;
        let template = Template::parse(&op.statement)?;

        if op.multi {
            return self.scan(&template, params).await;
        }

        let path = self.base.join(template.render(params)?);
        Ok(self.read(&path).await?.into_iter().collect())
    }

    async fn insert(&self, op: &Operation, records: &mut [Record]) -> Result<()> {
        self.check_open()?;
        let template = Template::parse(&op.statement)?;

        for record in records.iter_mut() {
            for field in op.generated_fields() {
                if record.get(field).map_or(true, Value::is_null) {
                    record.insert(field, uuid::Uuid::new_v4().to_string());
                }
            }

            let path = self.base.join(template.render(record)?);
            if tokio::fs::try_exists(&path).await? {
                bail!("{} already exists", path.display());
            }

            self.write(&path, record).await?;
            tracing::trace!(path = %path.display(), "fs insert");
        }

        Ok(())
    }

    async fn update(&self, op: &Operation, records: &[Record]) -> Result<()> {
        self.check_open()?;
        let template = Template::parse(&op.statement)?;

        for record in records {
            let path = self.base.join(template.render(record)?);
            let Some(mut stored) = self.read(&path).await? else {
                return Err(Error::record_not_found(path.display().to_string()));
            };

            let stale = op
                .condition_fields()
                .any(|field| record.contains(field) && stored.get(field) != record.get(field));

            if stale {
                return Err(Error::record_not_found(format!(
                    "{} does not match the update condition",
                    path.display()
                )));
            }

            stored.merge(record);
            for field in op.condition_fields() {
                if let Some(Value::I64(version)) = stored.get_mut(field) {
                    *version += 1;
                }
            }

            self.write(&path, &stored).await?;
        }

        Ok(())
    }

    async fn delete(&self, op: &Operation, identifiers: &[Record]) -> Result<()> {
        self.check_open()?;
        let template = Template::parse(&op.statement)?;

        for identifier in identifiers {
            let path = self.base.join(template.render(identifier)?);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    return Err(Error::record_not_found(path.display().to_string()));
                }
                Err(err) => return Err(err.into()),
            }
        }

        Ok(())
    }

    async fn execute(&self, action: &Action, params: &Record) -> Result<Response> {
        self.check_open()?;
        let template = Template::parse(&action.statement)?;

        match action.name.as_str() {
            "list" => Ok(Response::records(self.scan(&template, params).await?)),
            "count" => Ok(Response::count(self.scan(&template, params).await?.len() as u64)),
            "invalidate" => {
                let path = self.base.join(template.render(params)?);
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => Ok(Response::count(1)),
                    Err(err) if err.kind() == ErrorKind::NotFound => Ok(Response::count(0)),
                    Err(err) => Err(err.into()),
                }
            }
            other => bail!("fs adapter does not support action `{other}`"),
        }
    }
}
