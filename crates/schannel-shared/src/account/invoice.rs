use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    pub number: String,
    pub link: String,
    pub start_date: NaiveDate,
    pub expire_date: NaiveDate,
    /// Amount in minor currency units
    pub payment: i64,
    pub state: InvoiceState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
pub enum InvoiceState {
    NeedPay,
    FinishedPay,
}

impl Invoice {
    #[must_use]
    pub fn is_unpaid(&self) -> bool {
        self.state == InvoiceState::NeedPay
    }

    /// An unpaid invoice whose expire date is before `today`
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_unpaid() && self.expire_date < today
    }
}
