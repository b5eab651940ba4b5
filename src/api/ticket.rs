use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{catalog::Catalog, db};

pub use crate::{admin::TicketForm as Form, db::ticket::Id};

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: Id,
    pub from: String,
    pub to: String,
    pub date: String,
    pub time: String,
    pub price: f64,
    pub count: u32,
    pub model_of_bus: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<db::Ticket> for Ticket {
    fn from(ticket: db::Ticket) -> Self {
        let db::ticket::Fields {
            from,
            to,
            date,
            time,
            price,
            count,
            model_of_bus,
        } = ticket.fields;
        Self {
            id: ticket.id,
            from,
            to,
            date,
            time,
            price,
            count,
            model_of_bus,
            created_at: ticket.created_at,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub tickets: Vec<Ticket>,
}

impl From<&[db::Ticket]> for List {
    fn from(tickets: &[db::Ticket]) -> Self {
        Self {
            tickets: tickets.iter().cloned().map(Ticket::from).collect(),
        }
    }
}

/// Catalog as the visitor sees it after a search.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    pub tickets: Vec<Ticket>,
    pub notice: Option<String>,
}

impl From<&Catalog> for View {
    fn from(catalog: &Catalog) -> Self {
        Self {
            tickets: catalog
                .shown()
                .iter()
                .cloned()
                .map(Ticket::from)
                .collect(),
            notice: catalog.notice().map(|n| n.to_string()),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchased {
    /// The ticket after the sale, absent once its last seat is sold.
    pub ticket: Option<Ticket>,
    pub remaining: u32,
    pub notice: Option<String>,
}
