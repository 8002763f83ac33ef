use thiserror::Error;

/// Everything that can go wrong while talking to the weather provider or
/// validating what the user asked for.
///
/// The `Display` text is what ends up in front of the user, so each variant
/// renders exactly the message shown on the page or in the JSON `error` field.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeatherError {
    /// The provider could not be reached at all.
    #[error("Network error: {0}")]
    Network(String),

    /// The provider answered with a non-success status.
    #[error("{0}")]
    Api(String),

    /// The provider answered but did not say where the city is.
    #[error("{0}")]
    Resolution(String),

    /// The forecast endpoint returned an empty series.
    #[error("No forecast data returned")]
    NoData,

    /// One of the per-day historical calls failed; the whole history is void.
    #[error("{0}")]
    Historical(String),

    /// The request itself was unusable (e.g. blank city).
    #[error("{0}")]
    Validation(String),

    /// A success response whose body did not have the expected shape.
    #[error("Failed to parse provider response: {0}")]
    Parse(String),
}

impl WeatherError {
    pub fn historical_network(cause: impl std::fmt::Display) -> Self {
        Self::Historical(format!("Network error while fetching historical data: {cause}"))
    }

    pub fn historical_api(msg: impl std::fmt::Display) -> Self {
        Self::Historical(format!("Historical API error: {msg}"))
    }

    /// True for failures caused by the caller rather than the provider.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
