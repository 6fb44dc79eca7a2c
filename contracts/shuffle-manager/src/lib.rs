#![no_std]

//! # Shuffle Manager
//!
//! Hosts mental-poker style card games for other contracts. A game contract
//! creates a game here, then drives it through registration, shuffling,
//! dealing and opening while the players submit their cryptographic work
//! in turn order.
//!
//! ## Game flow
//! 1. The game contract (the *owner*) calls `create_game` and `register`.
//! 2. Each player joins with `player_register`, submitting a BabyJubJub
//!    public key. Keys are summed into the aggregated game key; the last
//!    join fixes the game nonce.
//! 3. `shuffle` starts a shuffle round: every player re-encrypts and
//!    permutes the deck under the aggregated key (`player_shuffle`), each
//!    step checked by the deck-size specific encrypt verifier.
//! 4. `deal_cards_to` selects cards for one player; every *other* player
//!    strips their layer of encryption (`player_deal_cards`), each step
//!    checked by the decrypt verifier.
//! 5. `open_cards` asks the receiving player to remove the last layer
//!    publicly (`player_open_cards`); fully decrypted cards map back to card
//!    indices through `card_value`.
//! 6. `end_game` or `error` terminates the game.
//!
//! Whenever a phase completes, the optional callback registered with the
//! phase is invoked on the owner contract as `callback(game_id)`. The
//! callback runs inside the completing call, so receivers must not call
//! back into this contract from it.
//!
//! ## Card encoding
//! A card is an ElGamal pair of BabyJubJub points. Until a card is first
//! decrypted only x-coordinates are stored; the y-coordinates are rebuilt
//! from the decrypter's deltas and the deck's sign selectors.

use soroban_sdk::{
    contract, contractclient, contracterror, contractevent, contractimpl, contracttype, vec,
    Address, BytesN, Env, IntoVal, Symbol, Vec, U256,
};

pub mod bitmap;
pub mod curve;
pub mod deck;
pub mod field;
pub mod types;

pub use crate::bitmap::BitMap;
pub use crate::deck::Deck;
pub use crate::types::{
    BaseState, Card, CardDelta, CompressedDeck, DeckConfig, DeckView, G1Point, G2Point,
    GameInfo, GameStateView, Groth16Proof, PublicKey, VerifierConfig,
};

use crate::curve::{CurveError, Point};
use crate::field::Fq;

// ═══════════════════════════════════════════════════════════════════════════════
//  Contract Events
// ═══════════════════════════════════════════════════════════════════════════════

#[contractevent]
pub struct EvGameCreated {
    pub game_id: u64,
    pub owner: Address,
    pub num_players: u32,
    pub num_cards: u32,
}

#[contractevent]
pub struct EvRegistrationOpened {
    pub game_id: u64,
}

#[contractevent]
pub struct EvPlayerRegistered {
    pub game_id: u64,
    pub player: Address,
    pub player_index: u32,
}

#[contractevent]
pub struct EvShuffleRequested {
    pub game_id: u64,
}

#[contractevent]
pub struct EvDeckShuffled {
    pub game_id: u64,
    pub player_index: u32,
    pub next_player: u32,
}

#[contractevent]
pub struct EvDealRequested {
    pub game_id: u64,
    pub target_player: u32,
    pub num_cards: u32,
}

/// Emitted after one player removes their layer from the dealt cards.
#[contractevent]
pub struct EvCardsDecrypted {
    pub game_id: u64,
    pub player_index: u32,
    pub next_player: u32,
}

#[contractevent]
pub struct EvOpenRequested {
    pub game_id: u64,
    pub player_index: u32,
    pub opening: u32,
}

#[contractevent]
pub struct EvCardsOpened {
    pub game_id: u64,
    pub player_index: u32,
    pub num_cards: u32,
}

#[contractevent]
pub struct EvGameEnded {
    pub game_id: u64,
}

#[contractevent]
pub struct EvGameErrored {
    pub game_id: u64,
}

#[contractevent]
pub struct EvCallbackInvoked {
    pub game_id: u64,
    pub target: Address,
    pub function: Symbol,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  External trait interfaces
// ═══════════════════════════════════════════════════════════════════════════════

/// Groth16 verifier for one circuit (shuffle-encrypt for a deck size, or
/// decrypt). The verification key is baked into the verifier contract.
#[contractclient(name = "Groth16VerifierClient")]
pub trait Groth16Verifier {
    fn verify_proof(env: Env, proof: Groth16Proof, public_inputs: Vec<U256>) -> bool;
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Errors
// ═══════════════════════════════════════════════════════════════════════════════

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum ShuffleError {
    GameNotFound = 1,
    InvalidState = 2,
    NotPlayersTurn = 3,
    GameFull = 4,
    AlreadyRegistered = 5,
    RegistrationIncomplete = 6,
    InvalidPlayer = 7,
    InvalidPublicKey = 8,
    InvalidCardSelection = 9,
    InvalidCardIndex = 10,
    AlreadyDecrypted = 11,
    InvalidProof = 12,
    DeckConfigMismatch = 13,
    DeckLengthMismatch = 14,
    InvalidFieldElement = 15,
    DeltaOutOfRange = 16,
    PointNotOnCurve = 17,
    DegeneratePoint = 18,
    AdminNotSet = 19,
    VerifierNotSet = 20,
}

impl From<CurveError> for ShuffleError {
    fn from(err: CurveError) -> Self {
        match err {
            CurveError::DeltaOutOfRange => ShuffleError::DeltaOutOfRange,
            CurveError::NotOnCurve => ShuffleError::PointNotOnCurve,
            CurveError::Degenerate => ShuffleError::DegeneratePoint,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Game state & storage keys
// ═══════════════════════════════════════════════════════════════════════════════

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ShuffleGame {
    pub state: BaseState,
    /// Number of cards the current player must open.
    pub opening: u32,
    pub cur_player_index: u32,
    pub aggregate_pk: PublicKey,
    pub nonce: U256,
    pub player_hand: Vec<u32>,
    pub player_addrs: Vec<Address>,
    pub signing_addrs: Vec<Address>,
    pub player_pks: Vec<PublicKey>,
    pub deck: Deck,
}

impl ShuffleGame {
    fn new(env: &Env, config: DeckConfig, num_players: u32) -> Self {
        let zero = U256::from_u32(env, 0);
        let mut player_hand = Vec::new(env);
        for _ in 0..num_players {
            player_hand.push_back(0u32);
        }
        ShuffleGame {
            state: BaseState::Created,
            opening: 0,
            cur_player_index: 0,
            aggregate_pk: PublicKey {
                x: zero.clone(),
                y: zero.clone(),
            },
            nonce: zero,
            player_hand,
            player_addrs: Vec::new(env),
            signing_addrs: Vec::new(env),
            player_pks: Vec::new(env),
            deck: Deck::new(env, config),
        }
    }

    pub fn num_registered(&self) -> u32 {
        self.player_addrs.len()
    }
}

#[contracttype]
#[derive(Clone)]
enum StorageKey {
    Admin,
    Verifiers,
    NextGameId,
    Info(u64),
    Game(u64),
    /// Owner of a game that has not ended yet.
    Owner(u64),
    /// Function invoked on the owner when the current phase completes.
    Callback(u64),
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Decryption records are one bit per player.
pub const MAX_PLAYERS: u32 = bitmap::BITMAP_WIDTH;

// Ledger rate is approximately 5 seconds per ledger on Stellar
const LEDGER_RATE_SECS: u32 = 5;

// TTL expressed in human-readable time units (30 days)
const TTL_SECONDS: u32 = 30 * 24 * 60 * 60;

/// TTL for game storage in ledgers: 30 * 24 * 60 * 60 / 5 = 518,400 ledgers
const GAME_TTL_LEDGERS: u32 = TTL_SECONDS / LEDGER_RATE_SECS;

// ═══════════════════════════════════════════════════════════════════════════════
//  Contract
// ═══════════════════════════════════════════════════════════════════════════════

#[contract]
pub struct ShuffleManagerContract;

#[contractimpl]
impl ShuffleManagerContract {
    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Constructor
    // ───────────────────────────────────────────────────────────────────────────

    pub fn __constructor(
        env: Env,
        admin: Address,
        decrypt_verifier: Address,
        deck5_verifier: Address,
        deck30_verifier: Address,
        deck52_verifier: Address,
    ) {
        let verifiers = VerifierConfig {
            decrypt_verifier,
            deck5_verifier,
            deck30_verifier,
            deck52_verifier,
        };
        env.storage().instance().set(&StorageKey::Admin, &admin);
        env.storage()
            .instance()
            .set(&StorageKey::Verifiers, &verifiers);
        env.storage().instance().set(&StorageKey::NextGameId, &0u64);
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Owner lifecycle
    // ───────────────────────────────────────────────────────────────────────────

    /// Create a game owned by `owner`. Game ids start at 1.
    pub fn create_game(
        env: Env,
        owner: Address,
        num_players: u32,
        deck_config: DeckConfig,
    ) -> Result<u64, ShuffleError> {
        owner.require_auth();

        if num_players == 0 || num_players > MAX_PLAYERS {
            return Err(ShuffleError::InvalidPlayer);
        }

        let verifiers = Self::load_verifiers(&env)?;
        let game_id = env
            .storage()
            .instance()
            .get::<_, u64>(&StorageKey::NextGameId)
            .unwrap_or(0)
            + 1;
        env.storage()
            .instance()
            .set(&StorageKey::NextGameId, &game_id);

        let info = GameInfo {
            deck_config,
            num_cards: deck_config.num_cards(),
            num_players,
            encrypt_verifier: verifiers.deck_verifier(deck_config),
        };
        let game = ShuffleGame::new(&env, deck_config, num_players);

        Self::write_info(&env, game_id, &info);
        Self::write_owner(&env, game_id, &owner);
        Self::write_game(&env, game_id, &game);

        EvGameCreated {
            game_id,
            owner,
            num_players,
            num_cards: info.num_cards,
        }
        .publish(&env);

        Ok(game_id)
    }

    /// Open registration. `callback` fires once every seat is taken.
    pub fn register(
        env: Env,
        game_id: u64,
        callback: Option<Symbol>,
    ) -> Result<(), ShuffleError> {
        Self::require_owner(&env, game_id)?;
        let mut game = Self::read_game(&env, game_id)?;
        Self::require_state(&game, BaseState::Created)?;

        game.state = BaseState::Registration;
        Self::write_game(&env, game_id, &game);
        Self::store_callback(&env, game_id, callback);

        EvRegistrationOpened { game_id }.publish(&env);
        Ok(())
    }

    /// Start a shuffle round beginning with player 0. `callback` fires once
    /// every player has shuffled.
    pub fn shuffle(
        env: Env,
        game_id: u64,
        callback: Option<Symbol>,
    ) -> Result<(), ShuffleError> {
        Self::require_owner(&env, game_id)?;
        let info = Self::read_info(&env, game_id)?;
        let mut game = Self::read_game(&env, game_id)?;
        Self::require_live(&game)?;
        if game.cur_player_index != 0 {
            return Err(ShuffleError::NotPlayersTurn);
        }
        if game.num_registered() < info.num_players {
            return Err(ShuffleError::RegistrationIncomplete);
        }

        game.state = BaseState::Shuffle;
        Self::write_game(&env, game_id, &game);
        Self::store_callback(&env, game_id, callback);

        EvShuffleRequested { game_id }.publish(&env);
        Ok(())
    }

    /// Deal the cards in `cards` to `player_id`. Every other player must
    /// decrypt them; `callback` fires after the last one has.
    pub fn deal_cards_to(
        env: Env,
        game_id: u64,
        cards: BitMap,
        player_id: u32,
        callback: Option<Symbol>,
    ) -> Result<(), ShuffleError> {
        Self::require_owner(&env, game_id)?;
        let info = Self::read_info(&env, game_id)?;
        let mut game = Self::read_game(&env, game_id)?;
        Self::require_live(&game)?;
        if game.cur_player_index != 0 {
            return Err(ShuffleError::NotPlayersTurn);
        }
        if player_id >= info.num_players {
            return Err(ShuffleError::InvalidPlayer);
        }
        if game.num_registered() < info.num_players {
            return Err(ShuffleError::RegistrationIncomplete);
        }
        let num_to_deal = Self::checked_selection(&cards, info.num_cards)?;
        if num_to_deal == 0 {
            return Err(ShuffleError::InvalidCardSelection);
        }

        game.state = BaseState::Deal;
        game.deck.cards_to_deal = cards;
        game.deck.player_to_deal = player_id;
        // The receiver never decrypts its own cards during a deal.
        game.cur_player_index = if player_id == 0 && info.num_players > 1 {
            1
        } else {
            0
        };

        Self::write_game(&env, game_id, &game);
        Self::store_callback(&env, game_id, callback);

        EvDealRequested {
            game_id,
            target_player: player_id,
            num_cards: num_to_deal,
        }
        .publish(&env);
        Ok(())
    }

    /// Ask `player_id` to open `opening` of their cards.
    pub fn open_cards(
        env: Env,
        game_id: u64,
        player_id: u32,
        opening: u32,
        callback: Option<Symbol>,
    ) -> Result<(), ShuffleError> {
        Self::require_owner(&env, game_id)?;
        let info = Self::read_info(&env, game_id)?;
        let mut game = Self::read_game(&env, game_id)?;
        Self::require_live(&game)?;
        if player_id >= info.num_players {
            return Err(ShuffleError::InvalidPlayer);
        }
        let hand = game
            .player_hand
            .get(player_id)
            .ok_or(ShuffleError::InvalidPlayer)?;
        if opening > hand {
            return Err(ShuffleError::InvalidCardSelection);
        }

        game.state = BaseState::Open;
        game.opening = opening;
        game.cur_player_index = player_id;
        Self::write_game(&env, game_id, &game);
        Self::store_callback(&env, game_id, callback);

        EvOpenRequested {
            game_id,
            player_index: player_id,
            opening,
        }
        .publish(&env);
        Ok(())
    }

    /// Finish the game. The owner link and any pending callback are dropped;
    /// the final state stays queryable until its TTL runs out.
    pub fn end_game(env: Env, game_id: u64) -> Result<(), ShuffleError> {
        Self::require_owner(&env, game_id)?;
        let mut game = Self::read_game(&env, game_id)?;

        game.state = BaseState::Complete;
        Self::write_game(&env, game_id, &game);
        env.storage()
            .temporary()
            .remove(&StorageKey::Owner(game_id));
        env.storage()
            .temporary()
            .remove(&StorageKey::Callback(game_id));

        EvGameEnded { game_id }.publish(&env);
        Ok(())
    }

    /// Put the game into the error state and fire `callback` immediately.
    pub fn error(
        env: Env,
        game_id: u64,
        callback: Option<Symbol>,
    ) -> Result<(), ShuffleError> {
        Self::require_owner(&env, game_id)?;
        let mut game = Self::read_game(&env, game_id)?;

        game.state = BaseState::GameError;
        Self::write_game(&env, game_id, &game);
        Self::store_callback(&env, game_id, callback);

        EvGameErrored { game_id }.publish(&env);
        Self::fire_callback(&env, game_id)
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Player actions
    // ───────────────────────────────────────────────────────────────────────────

    /// Join a game with a BabyJubJub public key. `signing_addr` may act on the
    /// player's behalf for the rest of the game. Returns the seat index.
    pub fn player_register(
        env: Env,
        game_id: u64,
        player: Address,
        signing_addr: Address,
        pk_x: U256,
        pk_y: U256,
    ) -> Result<u32, ShuffleError> {
        player.require_auth();

        let info = Self::read_info(&env, game_id)?;
        let mut game = Self::read_game(&env, game_id)?;
        Self::require_state(&game, BaseState::Registration)?;
        if game.num_registered() >= info.num_players {
            return Err(ShuffleError::GameFull);
        }
        if game.player_addrs.contains(&player) {
            return Err(ShuffleError::AlreadyRegistered);
        }

        let key = Point {
            x: Fq::from_u256(&pk_x).ok_or(ShuffleError::InvalidPublicKey)?,
            y: Fq::from_u256(&pk_y).ok_or(ShuffleError::InvalidPublicKey)?,
        };
        if !key.is_on_curve() {
            return Err(ShuffleError::InvalidPublicKey);
        }

        let player_index = game.num_registered();
        let aggregate = if player_index == 0 {
            key
        } else {
            let current = Self::point_from(&game.aggregate_pk.x, &game.aggregate_pk.y)?;
            curve::point_add(&current, &key)?
        };
        game.aggregate_pk = PublicKey {
            x: aggregate.x.to_u256(&env),
            y: aggregate.y.to_u256(&env),
        };

        game.player_addrs.push_back(player.clone());
        game.signing_addrs.push_back(signing_addr);
        game.player_pks.push_back(PublicKey { x: pk_x, y: pk_y });

        let seats_filled = game.num_registered() == info.num_players;
        if seats_filled {
            game.nonce = curve::mul_mod_q(&aggregate.x, &aggregate.y).to_u256(&env);
        }
        Self::write_game(&env, game_id, &game);

        EvPlayerRegistered {
            game_id,
            player,
            player_index,
        }
        .publish(&env);

        if seats_filled {
            Self::fire_callback(&env, game_id)?;
        }
        Ok(player_index)
    }

    /// Submit a re-encrypted, permuted deck together with its shuffle proof.
    pub fn player_shuffle(
        env: Env,
        game_id: u64,
        player: Address,
        proof: Groth16Proof,
        deck: CompressedDeck,
    ) -> Result<(), ShuffleError> {
        player.require_auth();

        let info = Self::read_info(&env, game_id)?;
        let mut game = Self::read_game(&env, game_id)?;
        Self::require_state(&game, BaseState::Shuffle)?;
        Self::require_turn(&game, &player)?;

        let old = game.deck.compressed();
        let public_input =
            deck::shuffle_public_input(&env, &deck, &old, &game.nonce, &game.aggregate_pk)?;
        Self::verify(&env, &info.encrypt_verifier, &proof, &public_input)?;
        game.deck.set_from_compressed(deck)?;

        let player_index = game.cur_player_index;
        game.cur_player_index += 1;
        if game.cur_player_index >= game.num_registered() {
            game.cur_player_index = 0;
        }
        Self::write_game(&env, game_id, &game);

        EvDeckShuffled {
            game_id,
            player_index,
            next_player: game.cur_player_index,
        }
        .publish(&env);

        if game.cur_player_index == 0 {
            Self::fire_callback(&env, game_id)?;
        }
        Ok(())
    }

    /// Remove this player's encryption layer from every card being dealt.
    /// One proof, decrypted card and delta pair per selected card, in
    /// ascending card order.
    pub fn player_deal_cards(
        env: Env,
        game_id: u64,
        player: Address,
        proofs: Vec<Groth16Proof>,
        decrypted_cards: Vec<Card>,
        init_deltas: Vec<CardDelta>,
    ) -> Result<(), ShuffleError> {
        player.require_auth();

        let info = Self::read_info(&env, game_id)?;
        let mut game = Self::read_game(&env, game_id)?;
        Self::require_state(&game, BaseState::Deal)?;
        Self::require_turn(&game, &player)?;

        let cards = game.deck.cards_to_deal;
        let num_to_deal = cards.member_count_up_to(info.num_cards);
        if proofs.len() != num_to_deal
            || decrypted_cards.len() != num_to_deal
            || init_deltas.len() != num_to_deal
        {
            return Err(ShuffleError::InvalidCardSelection);
        }

        let verifier = Self::load_verifiers(&env)?.decrypt_verifier;
        let mut counter = 0u32;
        for card_index in 0..info.num_cards {
            if !cards.get(card_index) {
                continue;
            }
            Self::update_decrypted_card(
                &env,
                &mut game,
                &verifier,
                card_index,
                &proofs.get_unchecked(counter),
                &decrypted_cards.get_unchecked(counter),
                &init_deltas.get_unchecked(counter),
            )?;
            counter += 1;
        }

        let player_index = game.cur_player_index;
        game.cur_player_index += 1;
        if game.cur_player_index == game.deck.player_to_deal {
            game.cur_player_index += 1;
        }
        let round_done = game.cur_player_index >= game.num_registered();
        if round_done {
            game.cur_player_index = 0;
            let target = game.deck.player_to_deal;
            let held = game.player_hand.get(target).unwrap_or(0);
            game.player_hand.set(target, held + num_to_deal);
        }
        Self::write_game(&env, game_id, &game);

        EvCardsDecrypted {
            game_id,
            player_index,
            next_player: game.cur_player_index,
        }
        .publish(&env);

        if round_done {
            Self::fire_callback(&env, game_id)?;
        }
        Ok(())
    }

    /// Publicly remove the last encryption layer from `cards`, which must
    /// number exactly the amount requested by `open_cards`.
    pub fn player_open_cards(
        env: Env,
        game_id: u64,
        player: Address,
        cards: BitMap,
        proofs: Vec<Groth16Proof>,
        decrypted_cards: Vec<Card>,
    ) -> Result<(), ShuffleError> {
        player.require_auth();

        let info = Self::read_info(&env, game_id)?;
        let mut game = Self::read_game(&env, game_id)?;
        Self::require_state(&game, BaseState::Open)?;
        Self::require_turn(&game, &player)?;

        let number_to_open = Self::checked_selection(&cards, info.num_cards)?;
        if number_to_open != game.opening
            || proofs.len() != number_to_open
            || decrypted_cards.len() != number_to_open
        {
            return Err(ShuffleError::InvalidCardSelection);
        }

        // Opened cards were dealt earlier, so their y-coordinates are known.
        let no_delta = CardDelta {
            delta0: U256::from_u32(&env, 0),
            delta1: U256::from_u32(&env, 0),
        };
        let verifier = Self::load_verifiers(&env)?.decrypt_verifier;
        let mut counter = 0u32;
        for card_index in 0..info.num_cards {
            if !cards.get(card_index) {
                continue;
            }
            Self::update_decrypted_card(
                &env,
                &mut game,
                &verifier,
                card_index,
                &proofs.get_unchecked(counter),
                &decrypted_cards.get_unchecked(counter),
                &no_delta,
            )?;
            counter += 1;
        }

        let player_index = game.cur_player_index;
        let held = game.player_hand.get(player_index).unwrap_or(0);
        game.player_hand
            .set(player_index, held.saturating_sub(number_to_open));
        game.opening = 0;
        game.cur_player_index = 0;
        Self::write_game(&env, game_id, &game);

        EvCardsOpened {
            game_id,
            player_index,
            num_cards: number_to_open,
        }
        .publish(&env);

        Self::fire_callback(&env, game_id)
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Read
    // ───────────────────────────────────────────────────────────────────────────

    pub fn game_info(env: Env, game_id: u64) -> Result<GameInfo, ShuffleError> {
        Self::read_info(&env, game_id)
    }

    pub fn game_state(env: Env, game_id: u64) -> Result<GameStateView, ShuffleError> {
        let info = Self::read_info(&env, game_id)?;
        let game = Self::read_game(&env, game_id)?;
        Ok(GameStateView {
            state: game.state,
            opening: game.opening,
            cur_player_index: game.cur_player_index,
            aggregate_pk: game.aggregate_pk,
            nonce: game.nonce,
            player_addrs: game.player_addrs,
            signing_addrs: game.signing_addrs,
            deck_config: info.deck_config,
            player_hand: game.player_hand,
        })
    }

    pub fn num_cards(env: Env, game_id: u64) -> Result<u32, ShuffleError> {
        Ok(Self::read_info(&env, game_id)?.num_cards)
    }

    pub fn cur_player_index(env: Env, game_id: u64) -> Result<u32, ShuffleError> {
        Ok(Self::read_game(&env, game_id)?.cur_player_index)
    }

    /// Players that have removed their layer from `card_index`.
    pub fn decrypt_record(
        env: Env,
        game_id: u64,
        card_index: u32,
    ) -> Result<BitMap, ShuffleError> {
        Self::read_game(&env, game_id)?
            .deck
            .decrypt_record
            .get(card_index)
            .ok_or(ShuffleError::InvalidCardIndex)
    }

    pub fn aggregated_pk(env: Env, game_id: u64) -> Result<PublicKey, ShuffleError> {
        Ok(Self::read_game(&env, game_id)?.aggregate_pk)
    }

    pub fn deck(env: Env, game_id: u64) -> Result<DeckView, ShuffleError> {
        let deck = Self::read_game(&env, game_id)?.deck;
        Ok(DeckView {
            x0: deck.x0,
            x1: deck.x1,
            y0: deck.y0,
            y1: deck.y1,
            selector0: deck.selector0,
            selector1: deck.selector1,
            cards_to_deal: deck.cards_to_deal,
            player_to_deal: deck.player_to_deal,
        })
    }

    /// Seat of `address`, matching either the player or its signing address.
    pub fn player_index(
        env: Env,
        game_id: u64,
        address: Address,
    ) -> Result<Option<u32>, ShuffleError> {
        let game = Self::read_game(&env, game_id)?;
        Ok(game
            .player_addrs
            .first_index_of(&address)
            .or_else(|| game.signing_addrs.first_index_of(&address)))
    }

    /// Card index behind `card_index`, once every player has decrypted it.
    pub fn card_value(
        env: Env,
        game_id: u64,
        card_index: u32,
    ) -> Result<Option<u32>, ShuffleError> {
        let info = Self::read_info(&env, game_id)?;
        let game = Self::read_game(&env, game_id)?;
        let record = match game.deck.decrypt_record.get(card_index) {
            Some(record) => record,
            None => return Ok(None),
        };
        if record.member_count_up_to(info.num_players) != info.num_players {
            return Ok(None);
        }
        let x1 = game
            .deck
            .x1
            .get(card_index)
            .ok_or(ShuffleError::InvalidCardIndex)?;
        Ok(deck::card_index_from_x1(&x1, info.deck_config))
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Admin
    // ───────────────────────────────────────────────────────────────────────────

    pub fn get_admin(env: Env) -> Result<Address, ShuffleError> {
        Self::load_admin(&env)
    }

    pub fn set_admin(env: Env, new_admin: Address) -> Result<(), ShuffleError> {
        let admin = Self::load_admin(&env)?;
        admin.require_auth();
        env.storage()
            .instance()
            .set(&StorageKey::Admin, &new_admin);
        Ok(())
    }

    pub fn get_verifiers(env: Env) -> Result<VerifierConfig, ShuffleError> {
        Self::load_verifiers(&env)
    }

    pub fn set_decrypt_verifier(env: Env, verifier: Address) -> Result<(), ShuffleError> {
        let admin = Self::load_admin(&env)?;
        admin.require_auth();
        let mut verifiers = Self::load_verifiers(&env)?;
        verifiers.decrypt_verifier = verifier;
        env.storage()
            .instance()
            .set(&StorageKey::Verifiers, &verifiers);
        Ok(())
    }

    /// Replace the shuffle verifier for one deck size. Games keep the
    /// verifier they were created with.
    pub fn set_deck_verifier(
        env: Env,
        deck_config: DeckConfig,
        verifier: Address,
    ) -> Result<(), ShuffleError> {
        let admin = Self::load_admin(&env)?;
        admin.require_auth();
        let mut verifiers = Self::load_verifiers(&env)?;
        match deck_config {
            DeckConfig::Deck5Card => verifiers.deck5_verifier = verifier,
            DeckConfig::Deck30Card => verifiers.deck30_verifier = verifier,
            DeckConfig::Deck52Card => verifiers.deck52_verifier = verifier,
        }
        env.storage()
            .instance()
            .set(&StorageKey::Verifiers, &verifiers);
        Ok(())
    }

    pub fn upgrade(env: Env, new_wasm_hash: BytesN<32>) -> Result<(), ShuffleError> {
        let admin = Self::load_admin(&env)?;
        admin.require_auth();
        env.deployer().update_current_contract_wasm(new_wasm_hash);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    //  Internal: Decryption
    // ═══════════════════════════════════════════════════════════════════════════

    /// Apply one player's decryption of `card_index`. The first decryption
    /// of a card also fixes its y-coordinates from the submitted deltas.
    fn update_decrypted_card(
        env: &Env,
        game: &mut ShuffleGame,
        verifier: &Address,
        card_index: u32,
        proof: &Groth16Proof,
        decrypted: &Card,
        delta: &CardDelta,
    ) -> Result<(), ShuffleError> {
        let player = game.cur_player_index;
        let mut record = game
            .deck
            .decrypt_record
            .get(card_index)
            .ok_or(ShuffleError::InvalidCardIndex)?;
        if record.get(player) {
            return Err(ShuffleError::AlreadyDecrypted);
        }

        let x0 = game
            .deck
            .x0
            .get(card_index)
            .ok_or(ShuffleError::InvalidCardIndex)?;
        let x1 = game
            .deck
            .x1
            .get(card_index)
            .ok_or(ShuffleError::InvalidCardIndex)?;

        if record.is_zero() {
            let y0 = curve::recover_y(
                &Self::field(&x0)?,
                &Self::field(&delta.delta0)?,
                game.deck.selector0.get(card_index),
            )?;
            let y1 = curve::recover_y(
                &Self::field(&x1)?,
                &Self::field(&delta.delta1)?,
                game.deck.selector1.get(card_index),
            )?;
            game.deck.y0.set(card_index, y0.to_u256(env));
            game.deck.y1.set(card_index, y1.to_u256(env));
        }

        if !Self::point_from(&decrypted.x, &decrypted.y)?.is_on_curve() {
            return Err(ShuffleError::PointNotOnCurve);
        }

        let component0 = Card {
            x: x0,
            y: game.deck.y0.get_unchecked(card_index),
        };
        let component1 = Card {
            x: x1,
            y: game.deck.y1.get_unchecked(card_index),
        };
        let player_pk = game
            .player_pks
            .get(player)
            .ok_or(ShuffleError::InvalidPlayer)?;
        let public_input =
            deck::decrypt_public_input(env, decrypted, &component0, &component1, &player_pk);
        Self::verify(env, verifier, proof, &public_input)?;

        game.deck.x1.set(card_index, decrypted.x.clone());
        game.deck.y1.set(card_index, decrypted.y.clone());
        record.set(player);
        game.deck.decrypt_record.set(card_index, record);
        Ok(())
    }

    fn verify(
        env: &Env,
        verifier: &Address,
        proof: &Groth16Proof,
        public_input: &Vec<U256>,
    ) -> Result<(), ShuffleError> {
        let client = Groth16VerifierClient::new(env, verifier);
        if !client.verify_proof(proof, public_input) {
            return Err(ShuffleError::InvalidProof);
        }
        Ok(())
    }

    fn field(value: &U256) -> Result<Fq, ShuffleError> {
        Fq::from_u256(value).ok_or(ShuffleError::InvalidFieldElement)
    }

    fn point_from(x: &U256, y: &U256) -> Result<Point, ShuffleError> {
        Ok(Point {
            x: Self::field(x)?,
            y: Self::field(y)?,
        })
    }

    /// Number of selected cards; selections past the end of the deck are
    /// rejected.
    fn checked_selection(cards: &BitMap, num_cards: u32) -> Result<u32, ShuffleError> {
        if num_cards < bitmap::BITMAP_WIDTH && cards.bits() >> num_cards != 0 {
            return Err(ShuffleError::InvalidCardIndex);
        }
        Ok(cards.member_count_up_to(num_cards))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    //  Internal: Guards
    // ═══════════════════════════════════════════════════════════════════════════

    fn require_owner(env: &Env, game_id: u64) -> Result<Address, ShuffleError> {
        let owner = Self::load_owner(env, game_id)?;
        owner.require_auth();
        Ok(owner)
    }

    fn require_state(game: &ShuffleGame, expected: BaseState) -> Result<(), ShuffleError> {
        if game.state != expected {
            return Err(ShuffleError::InvalidState);
        }
        Ok(())
    }

    fn require_live(game: &ShuffleGame) -> Result<(), ShuffleError> {
        match game.state {
            BaseState::Complete | BaseState::GameError | BaseState::Uncreated => {
                Err(ShuffleError::InvalidState)
            }
            _ => Ok(()),
        }
    }

    /// The current seat may be driven by the player or its signing address.
    fn require_turn(game: &ShuffleGame, caller: &Address) -> Result<(), ShuffleError> {
        let idx = game.cur_player_index;
        let is_player = game.player_addrs.get(idx).as_ref() == Some(caller);
        let is_signer = game.signing_addrs.get(idx).as_ref() == Some(caller);
        if !(is_player || is_signer) {
            return Err(ShuffleError::NotPlayersTurn);
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    //  Internal: Callbacks
    // ═══════════════════════════════════════════════════════════════════════════

    fn store_callback(env: &Env, game_id: u64, callback: Option<Symbol>) {
        let key = StorageKey::Callback(game_id);
        match callback {
            Some(function) => {
                env.storage().temporary().set(&key, &function);
                env.storage()
                    .temporary()
                    .extend_ttl(&key, GAME_TTL_LEDGERS, GAME_TTL_LEDGERS);
            }
            None => env.storage().temporary().remove(&key),
        }
    }

    /// Invoke and clear the pending callback, if any. Game state must be
    /// written before this runs.
    fn fire_callback(env: &Env, game_id: u64) -> Result<(), ShuffleError> {
        let key = StorageKey::Callback(game_id);
        let function: Symbol = match env.storage().temporary().get(&key) {
            Some(function) => function,
            None => return Ok(()),
        };
        let target = Self::load_owner(env, game_id)?;
        env.storage().temporary().remove(&key);

        env.invoke_contract::<()>(&target, &function, vec![env, game_id.into_val(env)]);

        EvCallbackInvoked {
            game_id,
            target,
            function,
        }
        .publish(env);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    //  Internal: Storage
    // ═══════════════════════════════════════════════════════════════════════════

    fn read_game(env: &Env, game_id: u64) -> Result<ShuffleGame, ShuffleError> {
        env.storage()
            .temporary()
            .get(&StorageKey::Game(game_id))
            .ok_or(ShuffleError::GameNotFound)
    }

    /// Writes the game state and keeps every entry of the game alive with it.
    fn write_game(env: &Env, game_id: u64, game: &ShuffleGame) {
        let key = StorageKey::Game(game_id);
        env.storage().temporary().set(&key, game);
        env.storage()
            .temporary()
            .extend_ttl(&key, GAME_TTL_LEDGERS, GAME_TTL_LEDGERS);
        for companion in [
            StorageKey::Info(game_id),
            StorageKey::Owner(game_id),
            StorageKey::Callback(game_id),
        ] {
            // Owner and callback are gone once a game ends
            if env.storage().temporary().has(&companion) {
                env.storage()
                    .temporary()
                    .extend_ttl(&companion, GAME_TTL_LEDGERS, GAME_TTL_LEDGERS);
            }
        }
        // Keep instance storage (admin, verifiers, id counter) alive
        env.storage()
            .instance()
            .extend_ttl(GAME_TTL_LEDGERS, GAME_TTL_LEDGERS);
    }

    fn read_info(env: &Env, game_id: u64) -> Result<GameInfo, ShuffleError> {
        env.storage()
            .temporary()
            .get(&StorageKey::Info(game_id))
            .ok_or(ShuffleError::GameNotFound)
    }

    fn write_info(env: &Env, game_id: u64, info: &GameInfo) {
        let key = StorageKey::Info(game_id);
        env.storage().temporary().set(&key, info);
        env.storage()
            .temporary()
            .extend_ttl(&key, GAME_TTL_LEDGERS, GAME_TTL_LEDGERS);
    }

    fn load_owner(env: &Env, game_id: u64) -> Result<Address, ShuffleError> {
        env.storage()
            .temporary()
            .get(&StorageKey::Owner(game_id))
            .ok_or(ShuffleError::GameNotFound)
    }

    fn write_owner(env: &Env, game_id: u64, owner: &Address) {
        let key = StorageKey::Owner(game_id);
        env.storage().temporary().set(&key, owner);
        env.storage()
            .temporary()
            .extend_ttl(&key, GAME_TTL_LEDGERS, GAME_TTL_LEDGERS);
    }

    fn load_admin(env: &Env) -> Result<Address, ShuffleError> {
        env.storage()
            .instance()
            .get(&StorageKey::Admin)
            .ok_or(ShuffleError::AdminNotSet)
    }

    fn load_verifiers(env: &Env) -> Result<VerifierConfig, ShuffleError> {
        env.storage()
            .instance()
            .get(&StorageKey::Verifiers)
            .ok_or(ShuffleError::VerifierNotSet)
    }
}
