#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location provider unavailable")]
    Unavailable,

    #[error("{0}")]
    Provider(String),
}
