use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::db;

pub use crate::db::purchase::Id;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: Id,
    pub username: String,
    pub from: String,
    pub to: String,
    pub date: String,
    pub time: String,
    pub price: f64,
    pub model_of_bus: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<db::Purchase> for Purchase {
    fn from(purchase: db::Purchase) -> Self {
        let db::ticket::Fields {
            from,
            to,
            date,
            time,
            price,
            model_of_bus,
            ..
        } = purchase.ticket;
        Self {
            id: purchase.id,
            username: purchase.username,
            from,
            to,
            date,
            time,
            price,
            model_of_bus,
            created_at: purchase.created_at,
        }
    }
}
