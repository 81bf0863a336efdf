use serde::{Deserialize, Serialize};

/// Which backend pipeline the user wants to answer their questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pipeline {
    /// Let the backend route the query.
    #[default]
    Auto,
    Navigator,
    Trustbot,
}

impl Pipeline {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pipeline::Auto => "auto",
            Pipeline::Navigator => "navigator",
            Pipeline::Trustbot => "trustbot",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Some(Pipeline::Auto),
            "navigator" => Some(Pipeline::Navigator),
            "trustbot" => Some(Pipeline::Trustbot),
            _ => None,
        }
    }

    pub fn all() -> Vec<Pipeline> {
        vec![Pipeline::Auto, Pipeline::Navigator, Pipeline::Trustbot]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Pipeline::Auto => "Auto",
            Pipeline::Navigator => "Navigator (services)",
            Pipeline::Trustbot => "TrustBot (data)",
        }
    }

    /// The `force_kind` value sent to the backend, if any.
    pub fn force_kind(&self) -> Option<&'static str> {
        match self {
            Pipeline::Auto => None,
            other => Some(other.as_str()),
        }
    }

    pub fn next(&self) -> Pipeline {
        match self {
            Pipeline::Auto => Pipeline::Navigator,
            Pipeline::Navigator => Pipeline::Trustbot,
            Pipeline::Trustbot => Pipeline::Auto,
        }
    }
}
