//! Admin desk: ticket listing management through a single form.

use derive_more::From;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{
    db::{
        ticket::{self, Fields},
        Purchase, Ticket,
    },
    repo::{self, Listing, Repository},
};

#[derive(Clone, Debug, Default)]
pub struct Desk {
    form: TicketForm,
    tickets: Vec<Ticket>,
    purchases: Vec<Purchase>,
}

/// Draft of a ticket as typed in by the admin. Any field may be missing.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TicketForm {
    pub id: Option<ticket::Id>,
    pub from: String,
    pub to: String,
    pub date: String,
    pub time: String,
    pub price: f64,
    pub count: i64,
    pub model_of_bus: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Mode {
    Create,
    Edit(ticket::Id),
}

#[derive(Debug, From)]
pub enum SaveError {
    /// Names of the fields that are empty or not positive.
    Incomplete(Vec<&'static str>),
    #[from]
    Backend(repo::Error),
}

#[derive(Debug, From)]
pub enum DeleteError {
    MissingId,
    #[from]
    Backend(repo::Error),
}

impl TicketForm {
    pub fn mode(&self) -> Mode {
        self.id.map_or(Mode::Create, Mode::Edit)
    }

    pub fn validate(&self) -> Result<Fields, Vec<&'static str>> {
        let mut missing = [
            ("from", &self.from),
            ("to", &self.to),
            ("date", &self.date),
            ("time", &self.time),
            ("modelOfBus", &self.model_of_bus),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect::<Vec<_>>();

        // NaN fails the comparison as well.
        if !(self.price > 0.0 && self.price.is_finite()) {
            missing.push("price");
        }
        let count = u32::try_from(self.count).ok().filter(|c| *c > 0);
        if count.is_none() {
            missing.push("count");
        }

        match count {
            Some(count) if missing.is_empty() => Ok(Fields {
                from: self.from.clone(),
                to: self.to.clone(),
                date: self.date.clone(),
                time: self.time.clone(),
                price: self.price,
                count,
                model_of_bus: self.model_of_bus.clone(),
            }),
            _ => Err(missing),
        }
    }
}

impl From<&Ticket> for TicketForm {
    fn from(ticket: &Ticket) -> Self {
        let Fields {
            from,
            to,
            date,
            time,
            price,
            count,
            model_of_bus,
        } = ticket.fields.clone();
        Self {
            id: Some(ticket.id),
            from,
            to,
            date,
            time,
            price,
            count: i64::from(count),
            model_of_bus,
        }
    }
}

impl Desk {
    pub async fn load(repo: &dyn Repository) -> Result<Self, repo::Error> {
        let (tickets, purchases) = futures::try_join!(
            repo.list_tickets(Listing::NewestFirst),
            repo.list_purchases()
        )
        .inspect_err(|e| error!(error = ?e, "failed to load admin desk"))?;

        Ok(Self {
            form: TicketForm::default(),
            tickets,
            purchases,
        })
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn purchases(&self) -> &[Purchase] {
        &self.purchases
    }

    pub fn form(&self) -> &TicketForm {
        &self.form
    }

    pub fn set_form(&mut self, form: TicketForm) {
        self.form = form;
    }

    pub fn reset_form(&mut self) {
        self.form = TicketForm::default();
    }

    pub fn mode(&self) -> Mode {
        self.form.mode()
    }

    /// Puts `ticket` into the form for editing.
    pub fn edit(&mut self, ticket: &Ticket) {
        self.form = TicketForm::from(ticket);
    }

    pub async fn refresh_tickets(
        &mut self,
        repo: &dyn Repository,
    ) -> Result<(), repo::Error> {
        self.tickets = repo
            .list_tickets(Listing::NewestFirst)
            .await
            .inspect_err(|e| error!(error = ?e, "failed to fetch tickets"))?;
        Ok(())
    }

    /// Writes the form: an update when it carries an id, an insert
    /// otherwise. An incomplete form never reaches `repo`.
    ///
    /// On success the form is cleared and the ticket list re-fetched.
    pub async fn save(
        &mut self,
        repo: &dyn Repository,
    ) -> Result<Mode, SaveError> {
        let fields = self.form.validate().map_err(SaveError::Incomplete)?;
        let mode = self.mode();

        repo.upsert_ticket(self.form.id, &fields)
            .await
            .inspect_err(|e| error!(error = ?e, "failed to save ticket"))?;
        info!(?mode, "ticket saved");

        self.reset_form();
        self.refresh_tickets(repo).await?;
        Ok(mode)
    }

    pub async fn delete(
        &mut self,
        repo: &dyn Repository,
        id: Option<ticket::Id>,
    ) -> Result<(), DeleteError> {
        let id = id.ok_or(DeleteError::MissingId)?;

        repo.delete_ticket(id).await.inspect_err(
            |e| error!(ticket = %id, error = ?e, "failed to delete ticket"),
        )?;
        info!(ticket = %id, "ticket deleted");

        self.refresh_tickets(repo).await?;
        Ok(())
    }
}
