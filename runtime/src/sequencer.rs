/// Rolling 8-bit transaction id, advanced once per exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionSequencer {
    next: u8,
}

impl TransactionSequencer {
    #[inline]
    pub const fn starting_at(next: u8) -> Self {
        Self {
            next,
        }
    }

    /// The id the next exchange will use.
    #[inline]
    pub const fn peek(&self) -> u8 {
        self.next
    }

    /// Hands out the current id and moves on, wrapping `0xff -> 0x00`.
    #[inline]
    pub fn issue(&mut self) -> u8 {
        let id = self.next;
        self.next = self.next.wrapping_add(1);

        id
    }
}
