/// The player's cash balance. Never negative.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Economy {
    cash: u32,
}

impl Economy {
    pub fn new(starting_cash: u32) -> Self {
        Self {
            cash: starting_cash,
        }
    }

    pub fn cash(&self) -> u32 {
        self.cash
    }

    pub fn can_afford(&self, amount: u32) -> bool {
        amount <= self.cash
    }

    pub fn credit(&mut self, amount: u32) {
        self.cash = self.cash.saturating_add(amount);
    }

    /// Withdraws `amount`; leaves the balance untouched and returns false if
    /// it is not covered.
    pub fn debit(&mut self, amount: u32) -> bool {
        match self.cash.checked_sub(amount) {
            Some(rest) => {
                self.cash = rest;
                true
            }
            None => false,
        }
    }
}
