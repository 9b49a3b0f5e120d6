use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid region of interest: {roi}. Expected min_x,min_y,max_x,max_y")]
    InvalidRoi { roi: String },

    #[error("RAM budget must be greater than 0")]
    ZeroRam,

    #[error("Missing required argument: {arg}")]
    MissingArgument { arg: String },

    #[error(transparent)]
    Ardpro(#[from] ardpro::Error),
}
