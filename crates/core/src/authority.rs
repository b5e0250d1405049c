use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Authority (role or permission) granted to a subject.
///
/// Authorities are intentionally opaque strings at this layer; there is no
/// hierarchy or inheritance between them. A subject that should hold several
/// privileges carries several authorities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Authority(Cow<'static, str>);

impl Authority {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Authority {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
