use soroban_sdk::contracttype;

/// Number of addressable members. Decks hold at most 52 cards and games at
/// most [`crate::MAX_PLAYERS`] players, so one word covers every set.
pub const BITMAP_WIDTH: u32 = 64;

/// Fixed-width set of small indices: cards to deal, y-coordinate sign
/// selectors, and which players have decrypted a card.
#[contracttype]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BitMap(pub u64);

impl BitMap {
    pub const fn zero() -> Self {
        BitMap(0)
    }

    pub const fn from_u64(bits: u64) -> Self {
        BitMap(bits)
    }

    pub fn bits(&self) -> u64 {
        self.0
    }

    pub fn get(&self, index: u32) -> bool {
        index < BITMAP_WIDTH && (self.0 >> index) & 1 == 1
    }

    pub fn set(&mut self, index: u32) {
        if index < BITMAP_WIDTH {
            self.0 |= 1 << index;
        }
    }

    pub fn unset(&mut self, index: u32) {
        if index < BITMAP_WIDTH {
            self.0 &= !(1 << index);
        }
    }

    pub fn set_to(&mut self, index: u32, value: bool) {
        if value {
            self.set(index);
        } else {
            self.unset(index);
        }
    }

    /// Members among indices `0..up_to`.
    pub fn member_count_up_to(&self, up_to: u32) -> u32 {
        if up_to >= BITMAP_WIDTH {
            return self.0.count_ones();
        }
        (self.0 & ((1u64 << up_to) - 1)).count_ones()
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn set_get_unset() {
        let mut bitmap = BitMap::zero();
        assert!(bitmap.is_zero());
        assert!(!bitmap.get(0));

        bitmap.set(0);
        bitmap.set(10);
        assert!(bitmap.get(0));
        assert!(bitmap.get(10));
        assert_eq!(bitmap.bits(), 1025);

        bitmap.unset(0);
        assert!(!bitmap.get(0));
        assert!(bitmap.get(10));
        assert_eq!(bitmap.bits(), 1024);

        bitmap.set_to(5, true);
        assert!(bitmap.get(5));
        bitmap.set_to(5, false);
        assert!(!bitmap.get(5));
    }

    #[test]
    fn highest_bit_and_out_of_range() {
        let mut bitmap = BitMap::zero();
        bitmap.set(63);
        assert!(bitmap.get(63));
        assert!(!bitmap.get(62));
        bitmap.unset(63);
        assert!(bitmap.is_zero());

        bitmap.set(64);
        assert!(bitmap.is_zero());
        assert!(!bitmap.get(200));
    }

    #[test]
    fn member_count_is_prefix_limited() {
        let mut bitmap = BitMap::zero();
        bitmap.set(0);
        bitmap.set(2);
        bitmap.set(5);

        assert_eq!(bitmap.member_count_up_to(0), 0);
        assert_eq!(bitmap.member_count_up_to(3), 2);
        assert_eq!(bitmap.member_count_up_to(6), 3);
        assert_eq!(BitMap::from_u64(u64::MAX).member_count_up_to(64), 64);
        assert_eq!(BitMap::from_u64(u64::MAX).member_count_up_to(52), 52);
    }
}
