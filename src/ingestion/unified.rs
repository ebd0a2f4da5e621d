//! Path-based ingestion with format detection and outcome reporting.
//!
//! [`ingest_from_path`] picks the delimiter from [`IngestionOptions`] or from the file extension,
//! reads the table through [`super::csv`], and tells the configured observer how it went.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::{IngestionError, IngestionResult};
use crate::types::DataSet;

use super::csv;
use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats};

/// Delimited-text flavours recognised by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionFormat {
    Csv,
    Tsv,
}

impl IngestionFormat {
    /// `csv`/`txt` and `tsv`/`tab`, ignoring case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" | "txt" => Some(Self::Csv),
            "tsv" | "tab" => Some(Self::Tsv),
            _ => None,
        }
    }

    pub fn default_delimiter(self) -> u8 {
        match self {
            Self::Csv => csv::DEFAULT_DELIMITER,
            Self::Tsv => b'\t',
        }
    }
}

/// Settings for [`ingest_from_path`]. The default detects everything and reports nowhere.
#[derive(Clone)]
pub struct IngestionOptions {
    /// Forces a format instead of reading it from the extension.
    pub format: Option<IngestionFormat>,
    /// Forces a delimiter instead of the format's default.
    pub delimiter: Option<u8>,
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Failures at or above this severity also go to `on_alert`.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("format", &self.format)
            .field("delimiter", &self.delimiter.map(char::from))
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            format: None,
            delimiter: None,
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

impl IngestionOptions {
    fn context_for(&self, path: &Path) -> IngestionResult<IngestionContext> {
        let format = match self.format {
            Some(format) => format,
            None => infer_format_from_path(path)?,
        };
        Ok(IngestionContext {
            path: path.to_path_buf(),
            format,
            delimiter: self.delimiter.unwrap_or_else(|| format.default_delimiter()),
        })
    }
}

/// Reads a delimited file into a [`DataSet`].
///
/// An unknown extension fails before anything is reported. Every other outcome goes to the
/// observer, if one is set: `on_success` with the table's shape, or `on_failure` with a severity
/// (and `on_alert` as well once the severity reaches `alert_at_or_above`).
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
///
/// use query_whisperer::ingestion::{ingest_from_path, IngestionOptions, TracingObserver};
///
/// # fn main() -> Result<(), query_whisperer::IngestionError> {
/// let opts = IngestionOptions {
///     observer: Some(Arc::new(TracingObserver)),
///     ..Default::default()
/// };
///
/// // `.tsv` selects a tab delimiter.
/// let ds = ingest_from_path("people.tsv", &opts)?;
/// println!("rows={}", ds.row_count());
/// # Ok(())
/// # }
/// ```
pub fn ingest_from_path(path: impl AsRef<Path>, options: &IngestionOptions) -> IngestionResult<DataSet> {
    let ctx = options.context_for(path.as_ref())?;
    let result = csv::ingest_csv_from_path(&ctx.path, ctx.delimiter);
    if let Some(observer) = &options.observer {
        report(observer.as_ref(), &ctx, &result, options.alert_at_or_above);
    }
    result
}

fn report(
    observer: &dyn IngestionObserver,
    ctx: &IngestionContext,
    result: &IngestionResult<DataSet>,
    alert_at_or_above: IngestionSeverity,
) {
    match result {
        Ok(ds) => observer.on_success(
            ctx,
            IngestionStats {
                rows: ds.row_count(),
                columns: ds.field_count(),
            },
        ),
        Err(e) => {
            let severity = severity_of(e);
            observer.on_failure(ctx, severity, e);
            if severity >= alert_at_or_above {
                observer.on_alert(ctx, severity, e);
            }
        }
    }
}

/// Unreadable input is critical; input that was read but rejected is an error.
fn severity_of(e: &IngestionError) -> IngestionSeverity {
    match e {
        IngestionError::Io(_) => IngestionSeverity::Critical,
        IngestionError::Csv(err) if matches!(err.kind(), ::csv::ErrorKind::Io(_)) => IngestionSeverity::Critical,
        IngestionError::Csv(_)
        | IngestionError::MissingHeader
        | IngestionError::InvalidDelimiter { .. }
        | IngestionError::UnsupportedSource { .. } => IngestionSeverity::Error,
    }
}

fn infer_format_from_path(path: &Path) -> IngestionResult<IngestionFormat> {
    let unsupported = |message: String| IngestionError::UnsupportedSource { message };
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| unsupported(format!("{} has no extension to infer a format from", path.display())))?;
    IngestionFormat::from_extension(ext)
        .ok_or_else(|| unsupported(format!("{}: unrecognised extension '{ext}'", path.display())))
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::path::Path;

    use super::{infer_format_from_path, severity_of, IngestionFormat};
    use crate::error::IngestionError;
    use crate::ingestion::IngestionSeverity;

    #[test]
    fn format_follows_extension() {
        assert_eq!(infer_format_from_path(Path::new("a/b.CSV")).unwrap(), IngestionFormat::Csv);
        assert_eq!(infer_format_from_path(Path::new("b.tsv")).unwrap(), IngestionFormat::Tsv);
        assert!(infer_format_from_path(Path::new("b.parquet")).is_err());
        assert!(infer_format_from_path(Path::new("noext")).is_err());
        assert_eq!(IngestionFormat::Tsv.default_delimiter(), b'\t');
    }

    #[test]
    fn unreadable_input_is_critical() {
        let err = IngestionError::Io(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert_eq!(severity_of(&err), IngestionSeverity::Critical);
        assert_eq!(severity_of(&IngestionError::MissingHeader), IngestionSeverity::Error);
    }
}
