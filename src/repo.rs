//! Storage seam between the screens and the backend client.

use async_trait::async_trait;

use crate::db::{
    self,
    purchase::NewPurchase,
    ticket::{self, Fields},
    Order, Purchase, Ticket,
};

#[derive(Debug)]
pub enum Error {
    Db(db::Error),
    /// Connection to the backend is gone.
    Unavailable,
}

impl From<db::Error> for Error {
    fn from(e: db::Error) -> Self {
        if e.is_closed() {
            return Self::Unavailable;
        }
        Self::Db(e)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Listing {
    /// Whatever order the backend returns.
    #[default]
    AsStored,
    NewestFirst,
}

#[async_trait]
pub trait Repository: Send + Sync {
    async fn list_tickets(
        &self,
        listing: Listing,
    ) -> Result<Vec<Ticket>, Error>;

    /// Purchases come newest first.
    async fn list_purchases(&self) -> Result<Vec<Purchase>, Error>;

    /// Updates the ticket with `id`, or inserts a new one when `id` is
    /// `None`.
    async fn upsert_ticket(
        &self,
        id: Option<ticket::Id>,
        fields: &Fields,
    ) -> Result<(), Error>;

    async fn set_ticket_count(
        &self,
        id: ticket::Id,
        count: u32,
    ) -> Result<(), Error>;

    async fn delete_ticket(&self, id: ticket::Id) -> Result<(), Error>;

    async fn record_purchase(
        &self,
        purchase: &NewPurchase,
    ) -> Result<(), Error>;
}

#[async_trait]
impl Repository for db::Client {
    async fn list_tickets(
        &self,
        listing: Listing,
    ) -> Result<Vec<Ticket>, Error> {
        let order = match listing {
            Listing::AsStored => None,
            Listing::NewestFirst => Some(Order::NEWEST_FIRST),
        };
        Ok(self.get_tickets(order).await?)
    }

    async fn list_purchases(&self) -> Result<Vec<Purchase>, Error> {
        Ok(self.get_purchases(Some(Order::NEWEST_FIRST)).await?)
    }

    async fn upsert_ticket(
        &self,
        id: Option<ticket::Id>,
        fields: &Fields,
    ) -> Result<(), Error> {
        match id {
            Some(id) => self.update_ticket(id, fields).await?,
            None => self.insert_ticket(fields).await?,
        }
        Ok(())
    }

    async fn set_ticket_count(
        &self,
        id: ticket::Id,
        count: u32,
    ) -> Result<(), Error> {
        Ok(self.update_ticket_count(id, count).await?)
    }

    async fn delete_ticket(&self, id: ticket::Id) -> Result<(), Error> {
        Ok(db::Client::delete_ticket(self, id).await?)
    }

    async fn record_purchase(
        &self,
        purchase: &NewPurchase,
    ) -> Result<(), Error> {
        Ok(self.insert_purchase(purchase).await?)
    }
}
