#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Serenity(#[from] serenity::Error),

    #[error(transparent)]
    Relay(#[from] herald_relay::Error),

    /// The interaction names a command this bot never registered.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// A required slash-command option was absent or of the wrong type.
    #[error("missing option {0}")]
    MissingOption(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
