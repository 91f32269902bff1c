use serde::{Deserialize, Serialize};

#[derive(Serialize, Debug)]
pub struct Health {
    pub status: &'static str,
}

/// Body returned by every endpoint that fails outside the auth family.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(msg: impl Into<String>) -> Self { Self { error: msg.into() } }
}
