//! File filtering functionality
//!
//! This module provides filters for matching files based on various criteria.
//! A filter is either a custom [`FileFilter`] or a set of [`FilterAttributes`]
//! (`ext`, `size`, `contain`, `mtime`, `atime`, `ctime`) combined with AND or
//! OR. Both resolve into a [`FilterChain`] that is evaluated one file at a
//! time, one condition at a time, so the output keeps the input order.

use std::fs::Metadata;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use futures::future::BoxFuture;
use log::{debug, warn};
use tokio::fs;

use crate::errors::{FindError, FindResult};

/// Trait for file filters
pub trait FileFilter: Send + Sync {
    /// Check if the file matches the filter. I/O failures count as no match.
    fn matches<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, bool>;

    /// Get the filter description
    fn description(&self) -> String;
}

/// Adapter turning an async closure into a [`FileFilter`]
pub struct FnFilter<F> {
    func: F,
    label: String,
}

impl<F, Fut> FnFilter<F>
where
    F: Fn(PathBuf) -> Fut + Send + Sync,
    Fut: Future<Output = bool> + Send + 'static,
{
    pub fn new(label: impl Into<String>, func: F) -> Self {
        Self {
            func,
            label: label.into(),
        }
    }
}

impl<F, Fut> FileFilter for FnFilter<F>
where
    F: Fn(PathBuf) -> Fut + Send + Sync,
    Fut: Future<Output = bool> + Send + 'static,
{
    fn matches<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, bool> {
        Box::pin((self.func)(path.to_path_buf()))
    }

    fn description(&self) -> String {
        self.label.clone()
    }
}

/// Comparator taken from the leading `>` / `<` of a constraint value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Greater,
    Less,
    Equal,
}

impl Comparison {
    /// Split the comparator sign off `raw`, returning the remaining text
    pub fn split(raw: &str) -> (Self, &str) {
        let raw = raw.trim();
        if let Some(rest) = raw.strip_prefix('>') {
            (Comparison::Greater, rest.trim_start())
        } else if let Some(rest) = raw.strip_prefix('<') {
            (Comparison::Less, rest.trim_start())
        } else {
            (Comparison::Equal, raw)
        }
    }

    pub fn test<T: PartialOrd>(self, actual: T, threshold: T) -> bool {
        match self {
            Comparison::Greater => actual > threshold,
            Comparison::Less => actual < threshold,
            Comparison::Equal => actual == threshold,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Comparison::Greater => ">",
            Comparison::Less => "<",
            Comparison::Equal => "=",
        }
    }
}

/// A comparator bound to its parsed threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold<T> {
    pub cmp: Comparison,
    pub value: T,
}

impl<T: PartialOrd + Copy> Threshold<T> {
    pub fn test(&self, actual: T) -> bool {
        self.cmp.test(actual, self.value)
    }
}

impl Threshold<f64> {
    /// Parse a size constraint such as `>100`, `<2.5e3` or `500`
    pub fn parse_size(raw: &str) -> Option<Self> {
        let (cmp, rest) = Comparison::split(raw);
        let value = rest.parse::<f64>().ok().filter(|v| v.is_finite())?;
        Some(Self { cmp, value })
    }
}

impl Threshold<i64> {
    /// Parse a time constraint such as `>2024-01-31` into epoch milliseconds
    pub fn parse_time(raw: &str) -> Option<Self> {
        let (cmp, rest) = Comparison::split(raw);
        let value = parse_date(rest)?.timestamp_millis();
        Some(Self { cmp, value })
    }
}

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse an RFC 3339 timestamp, a bare date (UTC midnight), or a date-time
/// without offset (local time)
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Filesystem timestamp a time condition looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeField {
    /// `mtime`
    Modified,
    /// `atime`
    Accessed,
    /// `ctime`
    Created,
}

impl TimeField {
    pub fn key(self) -> &'static str {
        match self {
            TimeField::Modified => "mtime",
            TimeField::Accessed => "atime",
            TimeField::Created => "ctime",
        }
    }

    /// Read the timestamp as epoch milliseconds
    fn millis(self, metadata: &Metadata) -> Option<i64> {
        let time = match self {
            TimeField::Modified => metadata.modified(),
            TimeField::Accessed => metadata.accessed(),
            // birth time is not available everywhere; fall back to ctime
            TimeField::Created => match metadata.created() {
                Ok(time) => Ok(time),
                Err(_) => return status_change_millis(metadata),
            },
        };
        time.ok().map(|t| DateTime::<Utc>::from(t).timestamp_millis())
    }
}

#[cfg(unix)]
fn status_change_millis(metadata: &Metadata) -> Option<i64> {
    use std::os::unix::fs::MetadataExt;
    DateTime::from_timestamp(metadata.ctime(), metadata.ctime_nsec() as u32)
        .map(|dt| dt.timestamp_millis())
}

#[cfg(not(unix))]
fn status_change_millis(_metadata: &Metadata) -> Option<i64> {
    None
}

/// Elementary attribute conditions
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Extension (with leading dot) is one of these
    Extension(Vec<String>),
    /// Path string contains this text
    Contains(String),
    /// File size in bytes
    Size(Threshold<f64>),
    /// One of the filesystem timestamps
    Time {
        field: TimeField,
        threshold: Threshold<i64>,
    },
}

/// Extension of `path` including the leading dot, or `""` when it has none
pub fn extension_of(path: &Path) -> String {
    match path.extension() {
        Some(ext) => format!(".{}", ext.to_string_lossy()),
        None => String::new(),
    }
}

async fn stat(path: &Path) -> Option<Metadata> {
    match fs::metadata(path).await {
        Ok(metadata) => Some(metadata),
        Err(err) => {
            debug!("Cannot stat {}: {}", path.display(), err);
            None
        }
    }
}

impl FileFilter for Predicate {
    fn matches<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            match self {
                Predicate::Extension(exts) => {
                    let ext = extension_of(path);
                    exts.iter().any(|candidate| *candidate == ext)
                }
                Predicate::Contains(part) => path.to_string_lossy().contains(part.as_str()),
                Predicate::Size(threshold) => stat(path)
                    .await
                    .is_some_and(|metadata| threshold.test(metadata.len() as f64)),
                Predicate::Time { field, threshold } => stat(path)
                    .await
                    .and_then(|metadata| field.millis(&metadata))
                    .is_some_and(|millis| threshold.test(millis)),
            }
        })
    }

    fn description(&self) -> String {
        match self {
            Predicate::Extension(exts) => format!("ext is one of [{}]", exts.join(", ")),
            Predicate::Contains(part) => format!("path contains '{}'", part),
            Predicate::Size(t) => format!("size {} {}", t.cmp.symbol(), t.value),
            Predicate::Time { field, threshold } => {
                let when = DateTime::from_timestamp_millis(threshold.value)
                    .map(|dt| dt.to_rfc3339())
                    .unwrap_or_else(|| threshold.value.to_string());
                format!("{} {} {}", field.key(), threshold.cmp.symbol(), when)
            }
        }
    }
}

/// How the conditions of a chain are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchMode {
    /// Every condition must match
    #[default]
    And,
    /// Any condition may match
    Or,
}

impl FromStr for MatchMode {
    type Err = FindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "and" => Ok(MatchMode::And),
            "or" => Ok(MatchMode::Or),
            _ => Err(FindError::InvalidFilter {
                key: "type".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Value given for an attribute key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::One(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::One(value)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(values: Vec<String>) -> Self {
        AttrValue::Many(values)
    }
}

impl<const N: usize> From<[&str; N]> for AttrValue {
    fn from(values: [&str; N]) -> Self {
        AttrValue::Many(values.iter().map(|v| v.to_string()).collect())
    }
}

/// Declarative attribute conditions
///
/// Raw values are kept as given; they are parsed when the filter is built,
/// and any value that does not parse simply contributes no condition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterAttributes {
    pub ext: Option<Vec<String>>,
    pub size: Option<String>,
    pub contain: Option<String>,
    pub mtime: Option<String>,
    pub atime: Option<String>,
    pub ctime: Option<String>,
    pub mode: MatchMode,
}

impl FilterAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(key, value)` pairs; unknown keys are ignored
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<AttrValue>,
    {
        let mut attrs = Self::new();
        for (key, value) in pairs {
            attrs.insert(key.as_ref(), value);
        }
        attrs
    }

    /// Set one attribute by key. Returns false when the key or value shape
    /// is not recognised and nothing was set.
    pub fn insert(&mut self, key: &str, value: impl Into<AttrValue>) -> bool {
        let value = value.into();

        if key == "ext" {
            self.ext = Some(match value {
                AttrValue::One(ext) => vec![ext],
                AttrValue::Many(exts) => exts,
            });
            return true;
        }

        let value = match value {
            AttrValue::One(value) => value,
            AttrValue::Many(values) => {
                warn!("Ignoring list value for filter key '{}': {:?}", key, values);
                return false;
            }
        };

        match key {
            "size" => self.size = Some(value),
            "contain" => self.contain = Some(value),
            "mtime" => self.mtime = Some(value),
            "atime" => self.atime = Some(value),
            "ctime" => self.ctime = Some(value),
            "type" => match value.parse() {
                Ok(mode) => self.mode = mode,
                Err(_) => {
                    warn!("Unknown filter type '{}', using 'and'", value);
                    return false;
                }
            },
            _ => {
                warn!("Ignoring unknown filter key '{}'", key);
                return false;
            }
        }
        true
    }

    pub fn with_ext<S: Into<String>>(mut self, exts: impl IntoIterator<Item = S>) -> Self {
        self.ext = Some(exts.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    pub fn with_contain(mut self, part: impl Into<String>) -> Self {
        self.contain = Some(part.into());
        self
    }

    pub fn with_time(mut self, field: TimeField, value: impl Into<String>) -> Self {
        let value = Some(value.into());
        match field {
            TimeField::Modified => self.mtime = value,
            TimeField::Accessed => self.atime = value,
            TimeField::Created => self.ctime = value,
        }
        self
    }

    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    fn times(&self) -> [(TimeField, Option<&String>); 3] {
        [
            (TimeField::Modified, self.mtime.as_ref()),
            (TimeField::Accessed, self.atime.as_ref()),
            (TimeField::Created, self.ctime.as_ref()),
        ]
    }

    /// Reject values that would otherwise be silently ignored
    pub fn validate(&self) -> FindResult<()> {
        if let Some(size) = &self.size {
            if Threshold::<f64>::parse_size(size).is_none() {
                return Err(FindError::InvalidFilter {
                    key: "size".to_string(),
                    value: size.clone(),
                });
            }
        }
        for (field, raw) in self.times() {
            if let Some(raw) = raw {
                if Threshold::<i64>::parse_time(raw).is_none() {
                    return Err(FindError::InvalidFilter {
                        key: field.key().to_string(),
                        value: raw.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Parsed conditions, cheapest first: ext, contain, size, mtime, atime, ctime
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();

        if let Some(exts) = &self.ext {
            predicates.push(Predicate::Extension(exts.clone()));
        }
        if let Some(part) = &self.contain {
            predicates.push(Predicate::Contains(part.clone()));
        }
        if let Some(size) = &self.size {
            match Threshold::<f64>::parse_size(size) {
                Some(threshold) => predicates.push(Predicate::Size(threshold)),
                None => warn!("Ignoring malformed size filter '{}'", size),
            }
        }
        for (field, raw) in self.times() {
            if let Some(raw) = raw {
                match Threshold::<i64>::parse_time(raw) {
                    Some(threshold) => predicates.push(Predicate::Time { field, threshold }),
                    None => warn!("Ignoring malformed {} filter '{}'", field.key(), raw),
                }
            }
        }

        predicates
    }
}

/// What to filter by: a custom filter or a set of attributes
pub enum FilterSpec {
    Predicate(Box<dyn FileFilter>),
    Attributes(FilterAttributes),
}

impl FilterSpec {
    pub fn predicate<F: FileFilter + 'static>(filter: F) -> Self {
        FilterSpec::Predicate(Box::new(filter))
    }

    /// Resolve into the chain that is actually evaluated
    pub fn into_chain(self) -> FilterChain {
        match self {
            FilterSpec::Predicate(filter) => FilterChain::new(vec![filter], MatchMode::And),
            FilterSpec::Attributes(attrs) => {
                let filters = attrs
                    .predicates()
                    .into_iter()
                    .map(|p| Box::new(p) as Box<dyn FileFilter>)
                    .collect();
                FilterChain::new(filters, attrs.mode)
            }
        }
    }
}

impl From<FilterAttributes> for FilterSpec {
    fn from(attrs: FilterAttributes) -> Self {
        FilterSpec::Attributes(attrs)
    }
}

/// Conditions evaluated in order with short-circuiting
pub struct FilterChain {
    filters: Vec<Box<dyn FileFilter>>,
    mode: MatchMode,
}

impl FilterChain {
    pub fn new(filters: Vec<Box<dyn FileFilter>>, mode: MatchMode) -> Self {
        Self { filters, mode }
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl FileFilter for FilterChain {
    fn matches<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            // no usable conditions: let everything through
            if self.filters.is_empty() {
                return true;
            }
            match self.mode {
                MatchMode::And => {
                    for filter in &self.filters {
                        if !filter.matches(path).await {
                            return false;
                        }
                    }
                    true
                }
                MatchMode::Or => {
                    for filter in &self.filters {
                        if filter.matches(path).await {
                            return true;
                        }
                    }
                    false
                }
            }
        })
    }

    fn description(&self) -> String {
        let parts: Vec<String> = self.filters.iter().map(|f| f.description()).collect();
        let logic = match self.mode {
            MatchMode::And => "all of",
            MatchMode::Or => "any of",
        };
        format!("{} [{}]", logic, parts.join(", "))
    }
}

/// Keep the files matching `spec`, in their original order
///
/// Files are checked one after another rather than concurrently; several
/// conditions stat the file themselves, and sequential checks keep the
/// output order identical to the input order.
pub async fn filter_files<P: AsRef<Path>>(files: &[P], spec: FilterSpec) -> Vec<PathBuf> {
    let chain = spec.into_chain();
    debug!("Filtering {} files by {}", files.len(), chain.description());

    let mut kept = Vec::new();
    for file in files {
        let file = file.as_ref();
        if chain.matches(file).await {
            kept.push(file.to_path_buf());
        }
    }
    kept
}
