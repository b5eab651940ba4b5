use derive_more::Display;

use crate::db::Ticket;

/// User-facing messages.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Notice {
    #[display("Iltimos, FROM va TO maydonlarini tanlang!")]
    MissingRoute,

    #[display("Yo'nalishni tanlab qidiring.")]
    ChooseRoute,

    #[display("Bu yo'nalishda ticket topilmadi!")]
    NoTicketsOnRoute,

    #[display("Ticket muvaffaqiyatli sotib olindi!")]
    PurchaseSucceeded,

    #[display("Ticket sotib olishda xatolik yuz berdi!")]
    PurchaseFailed,

    #[display("Barcha maydonlar to'ldirilishi shart!")]
    IncompleteForm,

    #[display("Noto'g'ri parol!")]
    WrongPassword,
}

/// Whoever is on the other side of a purchase.
pub trait Interaction {
    /// Asks for the buyer's name. `None` means the buyer backed out.
    fn buyer_name(&mut self, ticket: &Ticket) -> Option<String>;

    fn notify(&mut self, notice: Notice);
}
