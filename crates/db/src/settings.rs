use std::fmt;

use serde::Deserialize;

/// Which [`crate::DocumentStore`] implementation to construct.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Mongo,
    Memory,
}

#[derive(Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Full connection string; when set, the discrete parts below are ignored.
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default = "DatabaseSettings::default_scheme")]
    pub scheme: String,
    #[serde(default = "DatabaseSettings::default_host")]
    pub host: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "DatabaseSettings::default_app_name")]
    pub app_name: String,
    #[serde(default = "DatabaseSettings::default_name")]
    pub name: String,
}

impl DatabaseSettings {
    fn default_scheme() -> String {
        "mongodb".to_string()
    }

    fn default_host() -> String {
        "127.0.0.1:27017".to_string()
    }

    fn default_app_name() -> String {
        "bookshelf".to_string()
    }

    fn default_name() -> String {
        "virtualBook".to_string()
    }

    /// Connection string with credentials percent-encoded.
    pub fn connection_uri(&self) -> String {
        if let Some(uri) = &self.uri {
            return uri.clone();
        }
        let credentials = match (&self.username, &self.password) {
            (Some(user), Some(pass)) => format!(
                "{}:{}@",
                urlencoding::encode(user),
                urlencoding::encode(pass)
            ),
            (Some(user), None) => format!("{}@", urlencoding::encode(user)),
            _ => String::new(),
        };
        format!(
            "{}://{}{}/?retryWrites=true&w=majority&appName={}",
            self.scheme,
            credentials,
            self.host,
            urlencoding::encode(&self.app_name)
        )
    }

    /// Connection string safe to log.
    pub fn redacted_uri(&self) -> String {
        let uri = self.connection_uri();
        let Some((scheme, rest)) = uri.split_once("://") else {
            return uri;
        };
        match rest.rsplit_once('@') {
            Some((_, host)) => format!("{scheme}://***@{host}"),
            None => uri,
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            uri: None,
            scheme: Self::default_scheme(),
            host: Self::default_host(),
            username: None,
            password: None,
            app_name: Self::default_app_name(),
            name: Self::default_name(),
        }
    }
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("backend", &self.backend)
            .field("uri", &self.redacted_uri())
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("name", &self.name)
            .finish()
    }
}
