//! Identity of one value store: monitored object, check type and item.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

const STORE_EXTENSION: &str = "json";

/// Separates the check from the item in a store file name. Encoded names
/// never contain it.
const ITEM_SEPARATOR: char = '@';

/// The (monitored object, check type, item) a value store belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreScope {
    object: String,
    check: String,
    item: Option<String>,
}

impl StoreScope {
    pub fn new(
        object: impl Into<String>,
        check: impl Into<String>,
        item: Option<String>,
    ) -> Result<Self> {
        let scope = Self {
            object: object.into(),
            check: check.into(),
            item,
        };
        validate_component("object", &scope.object)?;
        validate_component("check", &scope.check)?;
        if let Some(item) = &scope.item {
            validate_component("item", item)?;
        }
        Ok(scope)
    }

    /// Scope for a check without items.
    pub fn for_check(object: impl Into<String>, check: impl Into<String>) -> Result<Self> {
        Self::new(object, check, None)
    }

    pub fn object(&self) -> &str {
        &self.object
    }

    pub fn check(&self) -> &str {
        &self.check
    }

    pub fn item(&self) -> Option<&str> {
        self.item.as_deref()
    }

    /// `<root>/<object>/<check>[@<item>].json`, every component percent-encoded.
    pub fn path_in(&self, root: &Path) -> PathBuf {
        let mut file_name = urlencoding::encode(&self.check).into_owned();
        if let Some(item) = &self.item {
            file_name.push(ITEM_SEPARATOR);
            file_name.push_str(&urlencoding::encode(item));
        }
        file_name.push('.');
        file_name.push_str(STORE_EXTENSION);
        object_dir(root, &self.object).join(file_name)
    }
}

impl fmt::Display for StoreScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.item {
            Some(item) => write!(f, "{}/{}[{}]", self.object, self.check, item),
            None => write!(f, "{}/{}", self.object, self.check),
        }
    }
}

/// Directory holding every store of one monitored object.
pub(crate) fn object_dir(root: &Path, object: &str) -> PathBuf {
    root.join(urlencoding::encode(object).into_owned())
}

pub(crate) fn decode_object(dir_name: &str) -> Option<String> {
    urlencoding::decode(dir_name).ok().map(|s| s.into_owned())
}

pub(crate) fn validate_component(what: &str, value: &str) -> Result<()> {
    // "." and ".." survive percent-encoding unchanged
    if value.is_empty() || value == "." || value == ".." {
        return Err(Error::invalid_scope(format!("{what} name '{value}' is not allowed")));
    }
    Ok(())
}
