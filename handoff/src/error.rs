use thiserror::Error;

#[derive(Error, Debug)]
pub enum HandoffError {
    #[error("eventfd creation failed: {0}")]
    EventfdCreation(String),

    #[error("eventfd write failed: {0}")]
    EventfdWrite(String),

    #[error("eventfd read failed: {0}")]
    EventfdRead(String),

    #[error("poll failed: {0}")]
    Poll(nix::errno::Errno),
}
