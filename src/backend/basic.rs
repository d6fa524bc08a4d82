//! Basic backend
//!
//! Accepts every call, stores nothing, and logs each operation at `trace`
//! level. Running a workload against it measures the overhead of the harness
//! itself.

use super::{Backend, BackendFactory, BackendOptions, Field, FieldSet, Outcome};
use crate::Result;
use tracing::trace;

/// Factory for [`BasicBackend`]
#[derive(Debug, Clone, Default)]
pub struct BasicFactory {
    /// Log the field values, not just the names
    verbose: bool,
}

impl BasicFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry constructor
    ///
    /// Recognizes `verbose = true|false`.
    pub fn from_options(options: &BackendOptions) -> Result<Self> {
        let verbose = match options.get("verbose") {
            None => false,
            Some(toml::Value::Boolean(b)) => *b,
            Some(other) => anyhow::bail!("backend option `verbose` must be a boolean, got {}", other),
        };
        Ok(Self { verbose })
    }
}

impl BackendFactory for BasicFactory {
    fn name(&self) -> &str {
        "basic"
    }

    fn create(&self, worker_id: usize) -> Result<Box<dyn Backend>> {
        Ok(Box::new(BasicBackend {
            worker: worker_id,
            verbose: self.verbose,
        }))
    }
}

/// Per-worker handle
pub struct BasicBackend {
    worker: usize,
    verbose: bool,
}

impl BasicBackend {
    fn describe(&self, values: &[Field]) -> String {
        let parts: Vec<String> = values
            .iter()
            .map(|f| {
                if self.verbose {
                    format!("{}={}", f.name, String::from_utf8_lossy(&f.value))
                } else {
                    f.name.clone()
                }
            })
            .collect();
        format!("[{}]", parts.join(" "))
    }
}

impl Backend for BasicBackend {
    fn init(&mut self) -> Result<()> {
        trace!(worker = self.worker, "basic backend init");
        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        trace!(worker = self.worker, "basic backend cleanup");
        Ok(())
    }

    fn read(&mut self, table: &str, key: &str, fields: Option<&[String]>) -> (Outcome, FieldSet) {
        trace!(worker = self.worker, table, key, ?fields, "READ");
        (Outcome::Ok, Vec::new())
    }

    fn scan(
        &mut self,
        table: &str,
        start_key: &str,
        len: usize,
        fields: Option<&[String]>,
    ) -> (Outcome, Vec<FieldSet>) {
        trace!(worker = self.worker, table, start_key, len, ?fields, "SCAN");
        (Outcome::Ok, Vec::new())
    }

    fn update(&mut self, table: &str, key: &str, values: &[Field]) -> Outcome {
        trace!(worker = self.worker, table, key, values = %self.describe(values), "UPDATE");
        Outcome::Ok
    }

    fn insert(&mut self, table: &str, key: &str, values: &[Field]) -> Outcome {
        trace!(worker = self.worker, table, key, values = %self.describe(values), "INSERT");
        Outcome::Ok
    }

    fn delete(&mut self, table: &str, key: &str) -> Outcome {
        trace!(worker = self.worker, table, key, "DELETE");
        Outcome::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_accepts_everything() {
        let mut db = BasicFactory::new().create(0).unwrap();
        db.init().unwrap();
        assert_eq!(db.read("t", "k", None).0, Outcome::Ok);
        assert_eq!(db.scan("t", "k", 5, None).0, Outcome::Ok);
        assert_eq!(db.update("t", "k", &[]), Outcome::Ok);
        assert_eq!(db.insert("t", "k", &[]), Outcome::Ok);
        assert_eq!(db.delete("t", "k"), Outcome::Ok);
        db.cleanup().unwrap();
    }

    #[test]
    fn test_basic_options() {
        let mut options = BackendOptions::new();
        options.insert("verbose".into(), toml::Value::Boolean(true));
        assert!(BasicFactory::from_options(&options).unwrap().verbose);

        options.insert("verbose".into(), toml::Value::Integer(1));
        assert!(BasicFactory::from_options(&options).is_err());
    }

    #[test]
    fn test_basic_describe() {
        let db = BasicBackend { worker: 0, verbose: true };
        let values = vec![Field::new("f0", b"ab".to_vec()), Field::new("f1", b"c".to_vec())];
        assert_eq!(db.describe(&values), "[f0=ab f1=c]");

        let quiet = BasicBackend { worker: 0, verbose: false };
        assert_eq!(quiet.describe(&values), "[f0 f1]");
    }
}
