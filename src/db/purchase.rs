use std::error::Error as StdError;

use derive_more::Display;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio_postgres::{
    types::{accepts, FromSql, Type},
    Row,
};

use super::{
    ticket::{self, ID},
    Client, Collection, Error, Order,
};

pub const USERNAME: &str = "username";

/// Snapshot of a ticket taken at sale time. It is not linked back to the
/// ticket row, which may be gone by now.
#[derive(Clone, Debug, PartialEq)]
pub struct Purchase {
    pub id: Id,
    pub ticket: ticket::Fields,
    pub username: String,
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewPurchase {
    pub ticket: ticket::Fields,
    pub username: String,
}

#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize,
)]
pub struct Id(i64);

impl From<i64> for Id {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl FromSql<'_> for Id {
    accepts!(INT8);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        i64::from_sql(ty, raw).map(Self)
    }
}

impl Purchase {
    fn from_row(row: &Row) -> Result<Self, Error> {
        Ok(Self {
            id: row.try_get(ID)?,
            ticket: ticket::Fields::from_row(row)?,
            username: row.try_get(USERNAME)?,
            created_at: row.try_get(ticket::CREATED_AT)?,
        })
    }
}

impl Client {
    pub async fn get_purchases(
        &self,
        order: Option<Order>,
    ) -> Result<Vec<Purchase>, Error> {
        self.select(Collection::Purchases, order)
            .await?
            .iter()
            .map(Purchase::from_row)
            .collect()
    }

    pub async fn insert_purchase(
        &self,
        purchase: &NewPurchase,
    ) -> Result<(), Error> {
        let seats = i64::from(purchase.ticket.count);
        let [from, to, date, time, price, count, model_of_bus] =
            purchase.ticket.values(&seats);
        self.insert(
            Collection::Purchases,
            &[
                from,
                to,
                date,
                time,
                price,
                count,
                model_of_bus,
                (USERNAME, &purchase.username),
            ],
        )
        .await
    }
}
