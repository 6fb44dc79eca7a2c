//! Deck storage and the public-input layouts handed to the verifiers.
//!
//! Each card is an ElGamal pair `(x0, y0), (x1, y1)` on BabyJubJub. Fresh
//! decks carry the identity as the first component and the card point
//! `(i + 1)·BASE8` as the second; only x-coordinates travel on-chain until
//! a card is first decrypted, at which point the y-coordinates are rebuilt
//! from deltas and the sign selectors.

use soroban_sdk::{contracttype, vec, Env, Vec, U256};

use crate::bitmap::BitMap;
use crate::field::Fq;
use crate::types::{Card, CompressedDeck, DeckConfig, PublicKey};
use crate::ShuffleError;

pub const MAX_DECK_SIZE: u32 = 52;

/// Sign selectors for the first component of a fresh deck (all `y0 = 1`).
const SELECTOR0_BASE: u64 = 4_503_599_627_370_495;
/// Sign selectors for the card points `(i + 1)·BASE8`.
const SELECTOR1_BASE: u64 = 3_075_935_501_959_818;

/// x-coordinates of `(i + 1)·BASE8` for `i` in `0..52`.
pub const INIT_X1: [Fq; MAX_DECK_SIZE as usize] = [
    Fq::from_limbs([0x2893f3f6bb957051, 0x2ab8d8010534e0b6, 0x4eacb2e09d6277c1, 0x0bb77a6ad63e739b]),
    Fq::from_limbs([0xeb9fdcd5f81dd902, 0x1133cfca4f558b5f, 0x82f2d227e35b846b, 0x162d7e417903fa1c]),
    Fq::from_limbs([0x00fcb4ab70477e3e, 0x33c947ad93695b80, 0x37e887c8234dcf7c, 0x061c1436d1c30080]),
    Fq::from_limbs([0x37e4232afdbe43c8, 0x5ddae2aef75a4bc4, 0x3398c838aa883cc6, 0x1b16e357953d68d7]),
    Fq::from_limbs([0xfb443e1860e1fbe4, 0xdde68cd35c79c8b9, 0xf3e459a258f5ded2, 0x1961ff2315812fd2]),
    Fq::from_limbs([0x113e2a7137f831b4, 0x7c159de512787257, 0x65223308fe44ba30, 0x172dba8d231345b8]),
    Fq::from_limbs([0x967649cf1e6e2311, 0x63ecc4b52c44afba, 0xe26ec136ec8aec5f, 0x2c6bfc7fe056ed38]),
    Fq::from_limbs([0x7cb49b09bffd4145, 0x8297367209a4f28f, 0x678f9fc29ecd029f, 0x10c347ae3592776a]),
    Fq::from_limbs([0xab76a305859d928f, 0xa4a0dd596d47cabd, 0xb6a544b1006f4b3e, 0x0a677185fd6cd905]),
    Fq::from_limbs([0xb94d32b8d5c3dc96, 0xafdaecc266c1aadf, 0x45be6d1ea242a6b0, 0x0056bb35a182e545]),
    Fq::from_limbs([0xd87bcc705837c765, 0x858984584e429842, 0xd06092adc126e213, 0x2fc449e2dd0c5349]),
    Fq::from_limbs([0x46c892925926574c, 0xeb15e2e1490037b3, 0x78b08379f7ffdcab, 0x1e63a5693d8b1443]),
    Fq::from_limbs([0x6346636a0ce10a69, 0x64e45fd56692179d, 0x6887b01380ca8f72, 0x05d90e36c0fc967d]),
    Fq::from_limbs([0x87051005b9d6cd61, 0xdb82583abe3b5e91, 0x6c42e8f3691617c0, 0x0ddd95af0dc7f8e9]),
    Fq::from_limbs([0x70b17f505c17f048, 0x33cfa83b81d2acec, 0xfdd0d51538022ba5, 0x0d2c8ddcfdd735e9]),
    Fq::from_limbs([0x1aff46d012269648, 0x9ce96b37ef9541be, 0xe2965d03466bc057, 0x2d66d2bb7bd385a5]),
    Fq::from_limbs([0xb568483ef44445c1, 0xdb475f7a7533b645, 0xabeb0bba9446dc44, 0x1dfcdbf7e39fd2a9]),
    Fq::from_limbs([0x7e9f346dd3599e5b, 0x758a27a55f74f2f4, 0xc5fbb80bd94667df, 0x0973a33d37dcd6ba]),
    Fq::from_limbs([0xa65d88ba0119879d, 0x8e6b603cc01d67c6, 0x8d59c3e84258ae1b, 0x07ea98448dca17ae]),
    Fq::from_limbs([0xb1955f61bfac0afa, 0x040be5e4281bd288, 0xd5ad1b304b95fb96, 0x28f4a492bbfdf5ee]),
    Fq::from_limbs([0x5048d21370c4d171, 0x965e59c524c5e99e, 0xefb0d9615a446bf4, 0x04c35ccbb891b482]),
    Fq::from_limbs([0xbd159f7a929a83ae, 0xf1200cc996701751, 0xdd3cba7f28c8a0cf, 0x0403f4c5f05d58ec]),
    Fq::from_limbs([0xee311a1bf11ec90e, 0x0ee2f909f70c86f3, 0xce43712df035d558, 0x080bb2c9aa710cde]),
    Fq::from_limbs([0x96b53a0af21e46cf, 0xf776e7097baf972e, 0x0f2032d0004b3364, 0x2822909a7b938c9f]),
    Fq::from_limbs([0x82b110cdec03dd29, 0x5167cc280f0954db, 0x8a60d13a78a44d75, 0x0b720cb8666a3722]),
    Fq::from_limbs([0xabeec370ac26a2d8, 0x0992112608ce9b20, 0xee4e186c1eb77be1, 0x1a0ca12c0b9d5cea]),
    Fq::from_limbs([0xeb7b917c6b177ddd, 0x339fa5087224930a, 0x8f74840d69ddd2d9, 0x216b057078fda7e6]),
    Fq::from_limbs([0x28a2f0af3be0a212, 0x7412b746b66eede6, 0x03d624b21a260f44, 0x239a26d12954771a]),
    Fq::from_limbs([0x43229b7cc0ca11a3, 0x25d8e8c07373278b, 0xc7c1d72dd140aa10, 0x2290daef092cdb12]),
    Fq::from_limbs([0x751eebef9612bee2, 0xf3d3e9fc48c762a9, 0x39f575599249f4ae, 0x1de5305a20483a9b]),
    Fq::from_limbs([0x545db5582db57f2e, 0xf33fce1689896c95, 0x59b46c2bb964b4b2, 0x1390b1c9d9a82d21]),
    Fq::from_limbs([0xb9e86c0d74b80e8f, 0xfce66bff1447b0c5, 0x637363a8456633b4, 0x26fea02c1cb0b62f]),
    Fq::from_limbs([0xb89b9bdcb8212d3f, 0x73e13bb9e79b3d53, 0x986519722f530a05, 0x277f7b5cc9bfe6b5]),
    Fq::from_limbs([0x892706ff56e48164, 0x5f678ea941c867f5, 0x946b013b8243b78a, 0x1547e0c5efe888ce]),
    Fq::from_limbs([0xdd4fd0c6c10e5a43, 0xcfc8588f07ddc027, 0xf4970a7f62956537, 0x2ad530c497ea4713]),
    Fq::from_limbs([0xac09f68adeb56eed, 0x965027abf7ca5361, 0x2105fbc0b84f38b0, 0x1056ab97cf05bcdb]),
    Fq::from_limbs([0x3f1a2b987d24fd84, 0xc588f33143788926, 0x40ef2ebf3c5c51cf, 0x226bea5ceca4c990]),
    Fq::from_limbs([0x0e755826d904f62b, 0x85b87472c7fa91e2, 0x8a26cdde50a9e65e, 0x0c52c9ec80c57633]),
    Fq::from_limbs([0x6ef75ec72e38ec4f, 0xeef3b252d7ebe49f, 0x38f2fdb7cb853b11, 0x2aebb7ffc8598c52]),
    Fq::from_limbs([0x767e853152cf1323, 0x2d4065212df9f63a, 0x993cfadbfc259653, 0x092d4b125f827c10]),
    Fq::from_limbs([0xcbba837abced761a, 0x585acc7abd05bb4c, 0x877d91b82265542f, 0x1cc142514ccfce20]),
    Fq::from_limbs([0xf0b0200d9557daa9, 0x7150ffa411965b03, 0xe9c1d38cb50980b1, 0x06184da392a17823]),
    Fq::from_limbs([0x71d3bab13401d72e, 0x49cc71d27a9d3f74, 0x0a63881b4af4fb11, 0x2de1f83ba2bf5ef2]),
    Fq::from_limbs([0xa8820850b29446ef, 0xf0da12a81d5f874f, 0xc553d6e01ae9c7e9, 0x294b01e9bef3cbee]),
    Fq::from_limbs([0x6accb54c6858db10, 0x5b73fe0600bec265, 0x1115c24cff5d5647, 0x1f5b4e9c9f3998ac]),
    Fq::from_limbs([0x02aac2bb81944642, 0xb8cdf82114943070, 0xf3f750978ea18828, 0x15ed766f45161e8c]),
    Fq::from_limbs([0x45f1b191c9abd2dc, 0x3ff4d366f2b47682, 0xab175c4c9d2596db, 0x1d98dcee4ad7e854]),
    Fq::from_limbs([0x3600020246d66e12, 0xff0389129e0eedf3, 0xcfc56a2b80f746b1, 0x0eea43c2e39c9465]),
    Fq::from_limbs([0xc2a16cc7b449a179, 0xfb0029c23e2f429a, 0xcb83185bd7758f05, 0x267076b8c3d79269]),
    Fq::from_limbs([0x6c06766d7f2e17e6, 0xcf06de207dc29973, 0x8ca02285f978b47e, 0x1930694c542b3f42]),
    Fq::from_limbs([0x647e7fca3c3e941c, 0x6451d81fc6a58b4c, 0x2b752c5eb037c060, 0x23f14882a28cc7ba]),
    Fq::from_limbs([0x01789f78bf9bcb31, 0x591cab8babacfcf2, 0xe89208103bdf883a, 0x081ee42bc135a4e8]),
];

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Deck {
    pub config: DeckConfig,
    pub x0: Vec<U256>,
    pub x1: Vec<U256>,
    pub y0: Vec<U256>,
    pub y1: Vec<U256>,
    pub selector0: BitMap,
    pub selector1: BitMap,
    pub decrypt_record: Vec<BitMap>,
    pub cards_to_deal: BitMap,
    pub player_to_deal: u32,
}

impl Deck {
    pub fn new(env: &Env, config: DeckConfig) -> Self {
        let size = config.num_cards();
        let zero = U256::from_u32(env, 0);
        let mut x0 = Vec::new(env);
        let mut x1 = Vec::new(env);
        let mut y0 = Vec::new(env);
        let mut y1 = Vec::new(env);
        let mut decrypt_record = Vec::new(env);
        for i in 0..size {
            x0.push_back(zero.clone());
            x1.push_back(INIT_X1[i as usize].to_u256(env));
            y0.push_back(zero.clone());
            y1.push_back(zero.clone());
            decrypt_record.push_back(BitMap::zero());
        }
        Deck {
            config,
            x0,
            x1,
            y0,
            y1,
            selector0: selector_for(size, SELECTOR0_BASE),
            selector1: selector_for(size, SELECTOR1_BASE),
            decrypt_record,
            cards_to_deal: BitMap::zero(),
            player_to_deal: 0,
        }
    }

    pub fn size(&self) -> u32 {
        self.config.num_cards()
    }

    pub fn compressed(&self) -> CompressedDeck {
        CompressedDeck {
            config: self.config,
            x0: self.x0.clone(),
            x1: self.x1.clone(),
            selector0: self.selector0,
            selector1: self.selector1,
        }
    }

    /// Replaces the encrypted x-coordinates and selectors after a shuffle.
    /// The deck size is fixed for the lifetime of a game.
    pub fn set_from_compressed(&mut self, deck: CompressedDeck) -> Result<(), ShuffleError> {
        if deck.config != self.config {
            return Err(ShuffleError::DeckConfigMismatch);
        }
        if !deck.len_matches() {
            return Err(ShuffleError::DeckLengthMismatch);
        }
        self.x0 = deck.x0;
        self.x1 = deck.x1;
        self.selector0 = deck.selector0;
        self.selector1 = deck.selector1;
        Ok(())
    }
}

fn selector_for(deck_size: u32, base: u64) -> BitMap {
    BitMap::from_u64(base >> (MAX_DECK_SIZE - deck_size))
}

/// Public input of the shuffle-encrypt circuit:
/// `[nonce, pk_x, pk_y, old.x0.., old.x1.., enc.x0.., enc.x1.., old.sel0, old.sel1, enc.sel0, enc.sel1]`.
pub fn shuffle_public_input(
    env: &Env,
    enc: &CompressedDeck,
    old: &CompressedDeck,
    nonce: &U256,
    aggregate_pk: &PublicKey,
) -> Result<Vec<U256>, ShuffleError> {
    if enc.config != old.config {
        return Err(ShuffleError::DeckConfigMismatch);
    }
    if !enc.len_matches() || !old.len_matches() {
        return Err(ShuffleError::DeckLengthMismatch);
    }
    let mut input = vec![env, nonce.clone(), aggregate_pk.x.clone(), aggregate_pk.y.clone()];
    for column in [&old.x0, &old.x1, &enc.x0, &enc.x1] {
        for value in column.iter() {
            input.push_back(value);
        }
    }
    for selector in [old.selector0, old.selector1, enc.selector0, enc.selector1] {
        input.push_back(U256::from_u128(env, selector.bits() as u128));
    }
    Ok(input)
}

/// Public input of the decrypt circuit for one card:
/// `[out.x, out.y, x0, y0, x1, y1, pk_x, pk_y]`.
pub fn decrypt_public_input(
    env: &Env,
    decrypted: &Card,
    component0: &Card,
    component1: &Card,
    player_pk: &PublicKey,
) -> Vec<U256> {
    vec![
        env,
        decrypted.x.clone(),
        decrypted.y.clone(),
        component0.x.clone(),
        component0.y.clone(),
        component1.x.clone(),
        component1.y.clone(),
        player_pk.x.clone(),
        player_pk.y.clone(),
    ]
}

/// Maps a fully decrypted x-coordinate back to its card index.
pub fn card_index_from_x1(x1: &U256, config: DeckConfig) -> Option<u32> {
    let value = Fq::from_u256(x1)?;
    INIT_X1
        .iter()
        .take(config.num_cards() as usize)
        .position(|card| *card == value)
        .map(|idx| idx as u32)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::curve::{scalar_mul, BASE8};

    #[test]
    fn initial_table_holds_multiples_of_base8() {
        for (i, x) in INIT_X1.iter().enumerate() {
            let point = scalar_mul(&BASE8, &[i as u64 + 1, 0, 0, 0]).unwrap();
            assert_eq!(point.x, *x, "card {}", i);
        }
    }

    #[test]
    fn fresh_deck_layout() {
        let env = Env::default();
        let deck = Deck::new(&env, DeckConfig::Deck5Card);

        assert_eq!(deck.size(), 5);
        assert_eq!(deck.x0.len(), 5);
        assert_eq!(deck.x1.len(), 5);
        assert_eq!(deck.decrypt_record.len(), 5);
        assert_eq!(deck.x1.get(0).unwrap(), BASE8.x.to_u256(&env));
        assert_eq!(deck.selector0, BitMap::from_u64(SELECTOR0_BASE >> 47));
        assert_eq!(deck.selector0.member_count_up_to(64), 5);
        assert_eq!(deck.selector1, BitMap::from_u64(SELECTOR1_BASE >> 47));

        let full = Deck::new(&env, DeckConfig::Deck52Card);
        assert_eq!(full.selector0.bits(), SELECTOR0_BASE);
        assert_eq!(full.selector1.bits(), SELECTOR1_BASE);
    }

    #[test]
    fn shuffle_input_layout() {
        let env = Env::default();
        let old = Deck::new(&env, DeckConfig::Deck5Card).compressed();
        let mut enc = old.clone();
        enc.x0 = Vec::new(&env);
        enc.x1 = Vec::new(&env);
        for i in 0..5u32 {
            enc.x0.push_back(U256::from_u32(&env, 100 + i));
            enc.x1.push_back(U256::from_u32(&env, 200 + i));
        }
        enc.selector0 = BitMap::from_u64(0b10101);
        enc.selector1 = BitMap::from_u64(0b01010);

        let nonce = U256::from_u32(&env, 7);
        let pk = PublicKey {
            x: U256::from_u32(&env, 8),
            y: U256::from_u32(&env, 9),
        };
        let input = shuffle_public_input(&env, &enc, &old, &nonce, &pk).unwrap();

        assert_eq!(input.len(), 7 + 4 * 5);
        assert_eq!(input.get(0).unwrap(), nonce);
        assert_eq!(input.get(1).unwrap(), pk.x);
        assert_eq!(input.get(2).unwrap(), pk.y);
        assert_eq!(input.get(3).unwrap(), U256::from_u32(&env, 0));
        assert_eq!(input.get(8).unwrap(), old.x1.get(0).unwrap());
        assert_eq!(input.get(13).unwrap(), U256::from_u32(&env, 100));
        assert_eq!(input.get(18).unwrap(), U256::from_u32(&env, 200));
        assert_eq!(input.get(23).unwrap(), U256::from_u128(&env, old.selector0.bits() as u128));
        assert_eq!(input.get(25).unwrap(), U256::from_u32(&env, 0b10101));
        assert_eq!(input.get(26).unwrap(), U256::from_u32(&env, 0b01010));
    }

    #[test]
    fn shuffle_input_rejects_mismatched_decks() {
        let env = Env::default();
        let old = Deck::new(&env, DeckConfig::Deck5Card).compressed();
        let other = Deck::new(&env, DeckConfig::Deck30Card).compressed();
        let nonce = U256::from_u32(&env, 0);
        let pk = PublicKey {
            x: U256::from_u32(&env, 0),
            y: U256::from_u32(&env, 1),
        };
        assert_eq!(
            shuffle_public_input(&env, &other, &old, &nonce, &pk),
            Err(ShuffleError::DeckConfigMismatch)
        );

        let mut short = old.clone();
        short.x1.pop_back();
        assert_eq!(
            shuffle_public_input(&env, &short, &old, &nonce, &pk),
            Err(ShuffleError::DeckLengthMismatch)
        );
    }

    #[test]
    fn set_from_compressed_keeps_size_fixed() {
        let env = Env::default();
        let mut deck = Deck::new(&env, DeckConfig::Deck5Card);
        let other = Deck::new(&env, DeckConfig::Deck30Card).compressed();
        assert_eq!(
            deck.set_from_compressed(other),
            Err(ShuffleError::DeckConfigMismatch)
        );

        let mut swapped = deck.compressed();
        let first = swapped.x1.get(0).unwrap();
        let second = swapped.x1.get(1).unwrap();
        swapped.x1.set(0, second.clone());
        swapped.x1.set(1, first);
        deck.set_from_compressed(swapped).unwrap();
        assert_eq!(deck.x1.get(0).unwrap(), second);
    }

    #[test]
    fn card_lookup_respects_deck_size() {
        let env = Env::default();
        let fifth = INIT_X1[4].to_u256(&env);
        let tenth = INIT_X1[9].to_u256(&env);
        assert_eq!(card_index_from_x1(&fifth, DeckConfig::Deck5Card), Some(4));
        assert_eq!(card_index_from_x1(&tenth, DeckConfig::Deck5Card), None);
        assert_eq!(card_index_from_x1(&tenth, DeckConfig::Deck30Card), Some(9));
        assert_eq!(
            card_index_from_x1(&U256::from_u32(&env, 3), DeckConfig::Deck52Card),
            None
        );
    }
}
