//! Public catalog: browsing, route search and buying.

use derive_more::From;
use tracing::{error, info};

use crate::{
    db::{purchase::NewPurchase, ticket, Ticket},
    interaction::{Interaction, Notice},
    repo::{self, Listing, Repository},
};

#[derive(Clone, Debug, Default)]
pub struct Catalog {
    tickets: Vec<Ticket>,
    shown: Vec<Ticket>,
    route: Option<Route>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Route {
    pub from: String,
    pub to: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Purchased {
    pub ticket: ticket::Id,
    /// Seats left after the sale; zero means the ticket row was deleted.
    pub remaining: u32,
}

#[derive(Debug, From)]
pub enum BuyError {
    NotListed(ticket::Id),
    SoldOut(ticket::Id),
    NoBuyerName,
    #[from]
    Backend(repo::Error),
}

impl Catalog {
    pub fn new(tickets: Vec<Ticket>) -> Self {
        Self {
            shown: tickets.clone(),
            tickets,
            route: None,
        }
    }

    pub async fn load(repo: &dyn Repository) -> Result<Self, repo::Error> {
        let tickets = repo
            .list_tickets(Listing::AsStored)
            .await
            .inspect_err(|e| error!(error = ?e, "failed to fetch tickets"))?;
        Ok(Self::new(tickets))
    }

    /// Every listed ticket.
    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    /// Tickets matching the last search.
    pub fn shown(&self) -> &[Ticket] {
        &self.shown
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    /// Narrows the shown tickets to those going exactly `from` -> `to`.
    ///
    /// Both ends are required; otherwise nothing changes and
    /// [`Notice::MissingRoute`] is returned.
    pub fn search(
        &mut self,
        from: &str,
        to: &str,
    ) -> Result<&[Ticket], Notice> {
        if from.is_empty() || to.is_empty() {
            return Err(Notice::MissingRoute);
        }

        self.shown = self
            .tickets
            .iter()
            .filter(|t| t.fields.from == from && t.fields.to == to)
            .cloned()
            .collect();
        self.route = Some(Route {
            from: from.to_owned(),
            to: to.to_owned(),
        });

        Ok(&self.shown)
    }

    pub fn reset(&mut self) {
        self.shown = self.tickets.clone();
        self.route = None;
    }

    /// What to tell the visitor when nothing is shown.
    pub fn notice(&self) -> Option<Notice> {
        if !self.shown.is_empty() {
            return None;
        }
        Some(match self.route {
            Some(_) => Notice::NoTicketsOnRoute,
            None => Notice::ChooseRoute,
        })
    }

    /// Sells one seat of ticket `id` to whoever `interaction` names.
    ///
    /// The purchase is recorded before the seat count changes and is not
    /// undone if the count update fails afterwards.
    pub async fn buy<I>(
        &mut self,
        repo: &dyn Repository,
        id: ticket::Id,
        interaction: &mut I,
    ) -> Result<Purchased, BuyError>
    where
        I: Interaction + ?Sized,
    {
        use BuyError as E;

        let ticket = self
            .tickets
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(E::NotListed(id))?;
        if ticket.fields.count == 0 {
            return Err(E::SoldOut(id));
        }

        let username = interaction
            .buyer_name(&ticket)
            .filter(|name| !name.is_empty())
            .ok_or(E::NoBuyerName)?;

        match self.sell(repo, &ticket, username).await {
            Ok(purchased) => {
                info!(
                    ticket = %id,
                    remaining = purchased.remaining,
                    "ticket sold"
                );
                interaction.notify(Notice::PurchaseSucceeded);
                Ok(purchased)
            }
            Err(e) => {
                error!(ticket = %id, error = ?e, "failed to buy ticket");
                interaction.notify(Notice::PurchaseFailed);
                Err(e.into())
            }
        }
    }

    async fn sell(
        &mut self,
        repo: &dyn Repository,
        ticket: &Ticket,
        username: String,
    ) -> Result<Purchased, repo::Error> {
        repo.record_purchase(&NewPurchase {
            ticket: ticket.fields.clone(),
            username,
        })
        .await?;

        let remaining = ticket.fields.count - 1;
        if remaining > 0 {
            repo.set_ticket_count(ticket.id, remaining).await?;
            self.tickets
                .iter_mut()
                .chain(self.shown.iter_mut())
                .filter(|t| t.id == ticket.id)
                .for_each(|t| t.fields.count = remaining);
        } else {
            repo.delete_ticket(ticket.id).await?;
            self.tickets.retain(|t| t.id != ticket.id);
            self.shown.retain(|t| t.id != ticket.id);
        }

        Ok(Purchased {
            ticket: ticket.id,
            remaining,
        })
    }
}
