use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use async_trait::async_trait;
use constcat::concat;
use reqwest::StatusCode;
use serde_json::{json, Value};
use ticket_sphere::{
    api, config,
    db::{
        purchase::{self, NewPurchase},
        ticket::{self, Fields},
        Purchase, Ticket,
    },
    repo::{Error, Listing},
    server, Interaction, Notice, Repository,
};
use time::OffsetDateTime;

pub const ADMIN_PASSWORD: &str = "admin123";

const TICKETS: &str = "/tickets";
const ADMIN: &str = "/admin";
const ADMIN_AUTH: &str = concat!(ADMIN, "/auth");
const ADMIN_TICKETS: &str = concat!(ADMIN, TICKETS);

pub fn fields(from: &str, to: &str, count: u32) -> Fields {
    Fields {
        from: from.to_owned(),
        to: to.to_owned(),
        date: "2025-03-01".to_owned(),
        time: "08:00".to_owned(),
        price: 50000.0,
        count,
        model_of_bus: "MAN".to_owned(),
    }
}

pub fn ticket(id: i64, from: &str, to: &str, count: u32) -> Ticket {
    Ticket {
        id: ticket::Id::from(id),
        fields: fields(from, to, count),
        created_at: OffsetDateTime::UNIX_EPOCH + time::Duration::hours(id),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    ListTickets(Listing),
    ListPurchases,
    UpsertTicket(Option<ticket::Id>),
    SetTicketCount(ticket::Id, u32),
    DeleteTicket(ticket::Id),
    RecordPurchase(String),
}

impl Call {
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::ListTickets(_) | Self::ListPurchases)
    }
}

/// In-memory stand-in for the hosted backend.
#[derive(Default)]
pub struct MemoryRepository {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    tickets: Vec<Ticket>,
    purchases: Vec<Purchase>,
    calls: Vec<Call>,
    next_id: i64,
    fail_when: Option<fn(&Call) -> bool>,
}

impl MemoryRepository {
    /// Inserted tickets get ids from 1000 on, clear of the fixtures.
    pub fn new(tickets: Vec<Ticket>) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner {
                tickets,
                next_id: 1000,
                ..Inner::default()
            }),
        })
    }

    /// Makes every call matching `predicate` fail after being recorded.
    pub fn fail_when(&self, predicate: fn(&Call) -> bool) {
        self.inner.lock().unwrap().fail_when = Some(predicate);
    }

    pub fn tickets(&self) -> Vec<Ticket> {
        self.inner.lock().unwrap().tickets.clone()
    }

    pub fn purchases(&self) -> Vec<Purchase> {
        self.inner.lock().unwrap().purchases.clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn writes(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_write).collect()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().unwrap().calls.clear();
    }

    fn record(&self, call: Call) -> Result<MutexGuard<'_, Inner>, Error> {
        let mut inner = self.inner.lock().unwrap();
        let fails = inner.fail_when.is_some_and(|f| f(&call));
        inner.calls.push(call);
        if fails {
            return Err(Error::Unavailable);
        }
        Ok(inner)
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn list_tickets(
        &self,
        listing: Listing,
    ) -> Result<Vec<Ticket>, Error> {
        let inner = self.record(Call::ListTickets(listing))?;
        let mut tickets = inner.tickets.clone();
        if listing == Listing::NewestFirst {
            tickets.sort_by(|a, b| {
                b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
            });
        }
        Ok(tickets)
    }

    async fn list_purchases(&self) -> Result<Vec<Purchase>, Error> {
        let inner = self.record(Call::ListPurchases)?;
        Ok(inner.purchases.iter().rev().cloned().collect())
    }

    async fn upsert_ticket(
        &self,
        id: Option<ticket::Id>,
        fields: &Fields,
    ) -> Result<(), Error> {
        let mut inner = self.record(Call::UpsertTicket(id))?;
        match id {
            Some(id) => {
                if let Some(t) =
                    inner.tickets.iter_mut().find(|t| t.id == id)
                {
                    t.fields = fields.clone();
                }
            }
            None => {
                let id = ticket::Id::from(inner.next_id);
                inner.next_id += 1;
                inner.tickets.push(Ticket {
                    id,
                    fields: fields.clone(),
                    created_at: OffsetDateTime::now_utc(),
                });
            }
        }
        Ok(())
    }

    async fn set_ticket_count(
        &self,
        id: ticket::Id,
        count: u32,
    ) -> Result<(), Error> {
        let mut inner = self.record(Call::SetTicketCount(id, count))?;
        if let Some(t) = inner.tickets.iter_mut().find(|t| t.id == id) {
            t.fields.count = count;
        }
        Ok(())
    }

    async fn delete_ticket(&self, id: ticket::Id) -> Result<(), Error> {
        let mut inner = self.record(Call::DeleteTicket(id))?;
        inner.tickets.retain(|t| t.id != id);
        Ok(())
    }

    async fn record_purchase(
        &self,
        purchase: &NewPurchase,
    ) -> Result<(), Error> {
        let mut inner =
            self.record(Call::RecordPurchase(purchase.username.clone()))?;
        let id = purchase::Id::from(inner.purchases.len() as i64 + 1);
        inner.purchases.push(Purchase {
            id,
            ticket: purchase.ticket.clone(),
            username: purchase.username.clone(),
            created_at: OffsetDateTime::now_utc(),
        });
        Ok(())
    }
}

/// Plays the buyer: answers the name prompt and remembers the notices.
#[derive(Debug, Default)]
pub struct Buyer {
    pub name: Option<String>,
    pub prompts: usize,
    pub notices: Vec<Notice>,
}

impl Buyer {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_owned()),
            ..Self::default()
        }
    }
}

impl Interaction for Buyer {
    fn buyer_name(&mut self, _: &Ticket) -> Option<String> {
        self.prompts += 1;
        self.name.clone()
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

/// Serves the app over `repo` on an ephemeral port.
pub async fn serve(repo: Arc<MemoryRepository>) -> Client {
    let state = server::AppState::new(
        repo,
        config::Admin {
            password: ADMIN_PASSWORD.to_owned(),
        },
        &config::Jwt {
            secret: "test-secret".to_owned(),
            expiration_time: Duration::from_secs(600),
        },
    );
    let app = server::router(state, &config::Cors::default())
        .expect("failed to build router");
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind");
    let addr = listener.local_addr().expect("no local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server failed");
    });

    Client {
        inner: reqwest::Client::new(),
        base_url: format!("http://{addr}"),
        auth_token: None,
    }
}

#[derive(Clone)]
pub struct Client {
    inner: reqwest::Client,
    base_url: String,
    pub auth_token: Option<String>,
}

impl Client {
    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorized(
        &self,
        req: reqwest::RequestBuilder,
    ) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => {
                req.header("Authorization", format!("Bearer {token}"))
            }
            None => req,
        }
    }

    pub async fn auth(mut self, password: &str) -> Result<Self, StatusCode> {
        self.auth_token = Some(
            self.inner
                .post(self.url(ADMIN_AUTH))
                .json(&json!({ "password": password }))
                .send()
                .await
                .expect("failed to send a request")
                .error_for_status()
                .map_err(|e| e.status().expect("status error"))?
                .text()
                .await
                .expect("failed to get a response"),
        );
        Ok(self)
    }

    pub async fn options(&self) -> api::Options {
        self.inner
            .get(self.url("/options"))
            .send()
            .await
            .expect("failed to send a request")
            .json::<api::Options>()
            .await
            .expect("failed to get a response")
    }

    pub async fn tickets(
        &self,
        query: &[(&str, &str)],
    ) -> Result<api::ticket::View, (StatusCode, String)> {
        let res = self
            .inner
            .get(self.url(TICKETS))
            .query(query)
            .send()
            .await
            .expect("failed to send a request");
        let status = res.status();
        if !status.is_success() {
            return Err((status, res.text().await.unwrap_or_default()));
        }
        Ok(res.json().await.expect("failed to get a response"))
    }

    pub async fn buy(
        &self,
        id: i64,
        username: Option<&str>,
    ) -> Result<api::ticket::Purchased, (StatusCode, String)> {
        let res = self
            .inner
            .post(self.url(&format!("{TICKETS}/{id}/buy")))
            .json(&json!({ "username": username }))
            .send()
            .await
            .expect("failed to send a request");
        let status = res.status();
        if !status.is_success() {
            return Err((status, res.text().await.unwrap_or_default()));
        }
        Ok(res.json().await.expect("failed to get a response"))
    }

    pub async fn dashboard(&self) -> Result<api::Dashboard, StatusCode> {
        Ok(self
            .authorized(self.inner.get(self.url(ADMIN)))
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<api::Dashboard>()
            .await
            .expect("failed to get a response"))
    }

    pub async fn save_ticket(
        &self,
        form: Value,
    ) -> Result<(StatusCode, api::ticket::List), StatusCode> {
        let res = self
            .authorized(self.inner.post(self.url(ADMIN_TICKETS)))
            .json(&form)
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?;
        let status = res.status();
        Ok((status, res.json().await.expect("failed to get a response")))
    }

    pub async fn update_ticket(
        &self,
        id: i64,
        form: Value,
    ) -> Result<api::ticket::List, StatusCode> {
        Ok(self
            .authorized(
                self.inner.put(self.url(&format!("{ADMIN_TICKETS}/{id}"))),
            )
            .json(&form)
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<api::ticket::List>()
            .await
            .expect("failed to get a response"))
    }

    pub async fn delete_ticket(
        &self,
        id: i64,
    ) -> Result<api::ticket::List, StatusCode> {
        Ok(self
            .authorized(
                self.inner.delete(self.url(&format!("{ADMIN_TICKETS}/{id}"))),
            )
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<api::ticket::List>()
            .await
            .expect("failed to get a response"))
    }
}
