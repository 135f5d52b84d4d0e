use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlotError>;

/// Errors produced by the plot store, sessions and commands. The display strings double as the
/// messages shown to players, so they are phrased for them.
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("not found")]
    NotFound,

    #[error("malformed plot key of {0} bytes")]
    MalformedKey(usize),

    #[error("{context}: {source}")]
    Store {
        context: &'static str,
        #[source]
        source: sled::Error,
    },

    #[error("{context}: {source}")]
    Encoding {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("the plot database is closed")]
    Closed,

    #[error("You have reached the maximum amount of plot claims. ({owned}/{maximum})")]
    LimitExceeded { owned: usize, maximum: usize },

    #[error("This plot is already claimed by {0}.")]
    AlreadyClaimed(String),

    #[error("You do not own this plot.")]
    NotOwner,

    #[error("You are not currently in a plot.")]
    OutOfBounds,

    #[error("Unknown plot with number {0}. Use /p list to get a list of plots to teleport to.")]
    UnknownPlot(usize),

    #[error("No free plots could be found in a 32x32 square around you.")]
    NoFreePlot,

    #[error("No player named {0} is online.")]
    UnknownPlayer(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}

impl PlotError {
    pub(crate) fn store(context: &'static str) -> impl FnOnce(sled::Error) -> PlotError {
        move |source| PlotError::Store { context, source }
    }

    pub(crate) fn encoding(context: &'static str) -> impl FnOnce(serde_json::Error) -> PlotError {
        move |source| PlotError::Encoding { context, source }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PlotError::NotFound)
    }
}
