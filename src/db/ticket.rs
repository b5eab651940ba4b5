use std::error::Error as StdError;

use derive_more::Display;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio_postgres::{
    types::{
        accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql,
        Type,
    },
    Row,
};
use tracing::warn;

use super::{Client, Collection, Error, Order, Value};

pub const ID: &str = "id";
pub const FROM: &str = "from";
pub const TO: &str = "to";
pub const DATE: &str = "date";
pub const TIME: &str = "time";
pub const PRICE: &str = "price";
pub const COUNT: &str = "count";
pub const MODEL_OF_BUS: &str = "modelOfBus";
pub const CREATED_AT: &str = "created_at";

#[derive(Clone, Debug, PartialEq)]
pub struct Ticket {
    pub id: Id,
    pub fields: Fields,
    pub created_at: OffsetDateTime,
}

/// Everything about a ticket except what the backend assigns.
#[derive(Clone, Debug, PartialEq)]
pub struct Fields {
    pub from: String,
    pub to: String,
    pub date: String,
    pub time: String,
    pub price: f64,
    /// Remaining seats.
    pub count: u32,
    pub model_of_bus: String,
}

#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
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

impl ToSql for Id {
    accepts!(INT8);

    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.0.to_sql(ty, out)
    }
}

impl Ticket {
    fn from_row(row: &Row) -> Result<Self, Error> {
        Ok(Self {
            id: row.try_get(ID)?,
            fields: Fields::from_row(row)?,
            created_at: row.try_get(CREATED_AT)?,
        })
    }
}

impl Fields {
    pub(super) fn from_row(row: &Row) -> Result<Self, Error> {
        let count = row.try_get::<_, i64>(COUNT)?;
        Ok(Self {
            from: row.try_get(FROM)?,
            to: row.try_get(TO)?,
            date: row.try_get(DATE)?,
            time: row.try_get(TIME)?,
            price: row.try_get(PRICE)?,
            count: u32::try_from(count)
                .map_err(|_| Error::MalformedRow(COUNT))?,
            model_of_bus: row.try_get(MODEL_OF_BUS)?,
        })
    }

    /// Binds every column; `count` is the widened seat count.
    pub(super) fn values<'a>(&'a self, count: &'a i64) -> [Value<'a>; 7] {
        [
            (FROM, &self.from),
            (TO, &self.to),
            (DATE, &self.date),
            (TIME, &self.time),
            (PRICE, &self.price),
            (COUNT, count),
            (MODEL_OF_BUS, &self.model_of_bus),
        ]
    }
}

impl Client {
    pub async fn get_tickets(
        &self,
        order: Option<Order>,
    ) -> Result<Vec<Ticket>, Error> {
        self.select(Collection::Tickets, order)
            .await?
            .iter()
            .map(Ticket::from_row)
            .collect()
    }

    pub async fn insert_ticket(&self, fields: &Fields) -> Result<(), Error> {
        let count = i64::from(fields.count);
        self.insert(Collection::Tickets, &fields.values(&count)).await
    }

    pub async fn update_ticket(
        &self,
        id: Id,
        fields: &Fields,
    ) -> Result<(), Error> {
        let count = i64::from(fields.count);
        let updated = self
            .update(Collection::Tickets, &fields.values(&count), &id)
            .await?;
        if updated == 0 {
            warn!(ticket = %id, "no ticket to update");
        }
        Ok(())
    }

    pub async fn update_ticket_count(
        &self,
        id: Id,
        count: u32,
    ) -> Result<(), Error> {
        let count = i64::from(count);
        let updated = self
            .update(Collection::Tickets, &[(COUNT, &count)], &id)
            .await?;
        if updated == 0 {
            warn!(ticket = %id, "no ticket to update the seat count of");
        }
        Ok(())
    }

    pub async fn delete_ticket(&self, id: Id) -> Result<(), Error> {
        let deleted = self.delete(Collection::Tickets, &id).await?;
        if deleted == 0 {
            warn!(ticket = %id, "no ticket to delete");
        }
        Ok(())
    }
}
