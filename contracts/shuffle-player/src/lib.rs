//! Player-side client for the shuffle manager contract.
//!
//! A [`ZkShuffle`] binds a signer and a shuffle secret to one deployed
//! manager. It derives the player's BabyJubJub public key, joins games and
//! answers the read-only questions a game front-end asks before play starts.
//! Proof generation is left to the circuit tooling; the paths to its
//! artifacts travel with the client in [`ShuffleArtifacts`].

pub mod artifacts;
pub mod player;
pub mod secret;

pub use artifacts::ShuffleArtifacts;
pub use player::ZkShuffle;
pub use secret::{generate_shuffle_secret, ShuffleSecret};

use std::path::PathBuf;

use shuffle_manager::ShuffleError;
use soroban_sdk::InvokeError;
use thiserror::Error;

/// Error type for player operations.
#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("shuffle manager rejected the call: {0:?}")]
    Contract(ShuffleError),
    #[error("shuffle manager invocation failed: {0:?}")]
    Invocation(InvokeError),
    #[error("unexpected return value from shuffle manager")]
    UnexpectedResponse,
    #[error("secret does not map to a usable public key")]
    InvalidSecret,
    #[error("missing shuffle artifact: {}", .0.display())]
    MissingArtifact(PathBuf),
}

/// Result type for player operations.
pub type Result<T> = std::result::Result<T, PlayerError>;
