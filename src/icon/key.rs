//! Request canonicalization.
//!
//! Maps an [`IconRequest`] to a stable cache key and, per host, a request
//! URL. Parameters are sorted by name before serialization so the same
//! logical request always yields byte-identical keys and query strings.

use url::Url;

use crate::config::schema::HostList;
use crate::error::{IconError, IconResult};
use crate::icon::types::{IconId, IconRequest};

/// The canonical form of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    pub id: IconId,
    /// Sorted, form-urlencoded parameters (may be empty).
    pub query: String,
    /// `"<collection>:<name> [<query>]"`.
    pub key: String,
}

/// Canonicalize `request`. Never fails: malformed identifiers fall back.
pub fn canonicalize(request: &IconRequest) -> CanonicalRequest {
    let id = IconId::parse_or_fallback(&request.identifier);

    let mut pairs = request.params.pairs();
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (name, value) in &pairs {
        serializer.append_pair(name, value);
    }
    let query = serializer.finish();
    let key = format!("{id} [{query}]");

    CanonicalRequest { id, query, key }
}

impl CanonicalRequest {
    /// `<host base>/<collection>/<name>.svg[?<query>]` for host `index`.
    pub fn url(&self, hosts: &HostList, index: usize) -> IconResult<Url> {
        let base = hosts.base_url(index).ok_or_else(|| {
            IconError::InvalidConfiguration(format!("host index {index} out of range"))
        })?;
        let mut url = base
            .join(&format!("{}/{}.svg", self.id.collection(), self.id.name()))
            .map_err(|e| IconError::InvalidConfiguration(format!("cannot build icon URL: {e}")))?;
        if self.query.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(&self.query));
        }
        Ok(url)
    }
}
