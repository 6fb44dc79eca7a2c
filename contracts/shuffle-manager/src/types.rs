use soroban_sdk::{contracttype, Address, Vec, U256};

use crate::bitmap::BitMap;

/// Supported deck sizes. Each size has its own shuffle verifier because the
/// shuffle circuit is specialised to the number of cards.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum DeckConfig {
    Deck5Card = 0,
    Deck30Card = 1,
    Deck52Card = 2,
}

impl DeckConfig {
    pub fn num_cards(&self) -> u32 {
        match self {
            Self::Deck5Card => 5,
            Self::Deck30Card => 30,
            Self::Deck52Card => 52,
        }
    }
}

/// Lifecycle of a shuffle game. The owning game contract moves the game
/// between phases; players act inside a phase in turn order.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum BaseState {
    Uncreated = 0,
    Created = 1,
    Registration = 2,
    Shuffle = 3,
    Deal = 4,
    Open = 5,
    GameError = 6,
    Complete = 7,
}

/// A (partially) decrypted card point.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Card {
    pub x: U256,
    pub y: U256,
}

/// Compressed y-coordinates submitted with the first decryption of a card.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CardDelta {
    pub delta0: U256,
    pub delta1: U256,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PublicKey {
    pub x: U256,
    pub y: U256,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct G1Point {
    pub x: U256,
    pub y: U256,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct G2Point {
    pub x0: U256,
    pub x1: U256,
    pub y0: U256,
    pub y1: U256,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Groth16Proof {
    pub a: G1Point,
    pub b: G2Point,
    pub c: G1Point,
}

/// Deck as submitted by a shuffling player: x-coordinates plus the sign
/// selectors needed to rebuild y-coordinates later.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CompressedDeck {
    pub config: DeckConfig,
    pub x0: Vec<U256>,
    pub x1: Vec<U256>,
    pub selector0: BitMap,
    pub selector1: BitMap,
}

impl CompressedDeck {
    pub fn len_matches(&self) -> bool {
        let len = self.config.num_cards();
        self.x0.len() == len && self.x1.len() == len
    }
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GameInfo {
    pub deck_config: DeckConfig,
    pub num_cards: u32,
    pub num_players: u32,
    pub encrypt_verifier: Address,
}

/// Public view of a game's progress, without the deck.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GameStateView {
    pub state: BaseState,
    pub opening: u32,
    pub cur_player_index: u32,
    pub aggregate_pk: PublicKey,
    pub nonce: U256,
    pub player_addrs: Vec<Address>,
    pub signing_addrs: Vec<Address>,
    pub deck_config: DeckConfig,
    pub player_hand: Vec<u32>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeckView {
    pub x0: Vec<U256>,
    pub x1: Vec<U256>,
    pub y0: Vec<U256>,
    pub y1: Vec<U256>,
    pub selector0: BitMap,
    pub selector1: BitMap,
    pub cards_to_deal: BitMap,
    pub player_to_deal: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VerifierConfig {
    pub decrypt_verifier: Address,
    pub deck5_verifier: Address,
    pub deck30_verifier: Address,
    pub deck52_verifier: Address,
}

impl VerifierConfig {
    pub fn deck_verifier(&self, deck: DeckConfig) -> Address {
        match deck {
            DeckConfig::Deck5Card => self.deck5_verifier.clone(),
            DeckConfig::Deck30Card => self.deck30_verifier.clone(),
            DeckConfig::Deck52Card => self.deck52_verifier.clone(),
        }
    }
}
