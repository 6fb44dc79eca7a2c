use shuffle_manager::{PublicKey, ShuffleError, ShuffleManagerContractClient};
use soroban_sdk::{Address, Env, InvokeError};
use tracing::info;

use crate::{PlayerError, Result, ShuffleArtifacts, ShuffleSecret};

/// A player bound to one shuffle manager deployment.
pub struct ZkShuffle {
    env: Env,
    manager: Address,
    signer: Address,
    public_key: PublicKey,
    artifacts: ShuffleArtifacts,
}

impl ZkShuffle {
    pub fn create(
        env: &Env,
        manager: &Address,
        signer: &Address,
        secret: ShuffleSecret,
        artifacts: ShuffleArtifacts,
    ) -> Result<Self> {
        let point = secret.public_key()?;
        let public_key = PublicKey {
            x: point.x.to_u256(env),
            y: point.y.to_u256(env),
        };
        info!(player = %abbreviate(signer), "init shuffle context");

        Ok(Self {
            env: env.clone(),
            manager: manager.clone(),
            signer: signer.clone(),
            public_key,
            artifacts,
        })
    }

    /// Registers the signer with its public key; the signer also acts as the
    /// signing address. Returns the assigned seat.
    pub fn join_game(&self, game_id: u64) -> Result<u32> {
        let player_index = settle(self.client().try_player_register(
            &game_id,
            &self.signer,
            &self.signer,
            &self.public_key.x,
            &self.public_key.y,
        ))?;
        info!(
            player = %abbreviate(&self.signer),
            game_id,
            player_index,
            "joined game"
        );
        Ok(player_index)
    }

    pub fn num_cards(&self, game_id: u64) -> Result<u32> {
        settle(self.client().try_num_cards(&game_id))
    }

    pub fn player_index(&self, game_id: u64) -> Result<Option<u32>> {
        settle(self.client().try_player_index(&game_id, &self.signer))
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn address(&self) -> &Address {
        &self.signer
    }

    pub fn artifacts(&self) -> &ShuffleArtifacts {
        &self.artifacts
    }

    fn client(&self) -> ShuffleManagerContractClient<'_> {
        ShuffleManagerContractClient::new(&self.env, &self.manager)
    }
}

type TryResult<T, C> =
    std::result::Result<std::result::Result<T, C>, std::result::Result<ShuffleError, InvokeError>>;

/// Flattens a `try_*` client result.
fn settle<T, C>(result: TryResult<T, C>) -> Result<T> {
    match result {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(_)) => Err(PlayerError::UnexpectedResponse),
        Err(Ok(err)) => Err(PlayerError::Contract(err)),
        Err(Err(err)) => Err(PlayerError::Invocation(err)),
    }
}

/// `GABCDE...WXYZ` style short form of a strkey address.
pub fn abbreviate(address: &Address) -> String {
    let strkey = address.to_string();
    let mut buf = vec![0u8; strkey.len() as usize];
    strkey.copy_into_slice(&mut buf);
    let full = String::from_utf8_lossy(&buf);
    if full.len() <= 12 {
        return full.into_owned();
    }
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}
