//! Thin client over the hosted Postgres that owns the `tickets` and
//! `buyedTickets` collections.
//!
//! The schema belongs to the hosting provider. Columns are expected as
//! `id int8`, `price float8`, `count int8`, `created_at timestamptz` with a
//! default, and `text` for everything else.

pub mod purchase;
pub mod ticket;

use derive_more::From;
use itertools::Itertools as _;
use tokio_postgres::{
    tls::NoTlsStream, types::ToSql, NoTls, Row, Socket,
};

use crate::config;

pub use self::{purchase::Purchase, ticket::Ticket};

pub type Connection = tokio_postgres::Connection<Socket, NoTlsStream>;

/// Column name paired with the value bound to it.
pub type Value<'a> = (&'static str, &'a (dyn ToSql + Sync));

#[derive(Debug, From)]
pub enum Error {
    #[from]
    Postgres(tokio_postgres::Error),
    /// Row holds a value the domain can't represent, e.g. a negative count.
    MalformedRow(&'static str),
}

impl Error {
    /// Whether the connection behind the client is gone.
    pub fn is_closed(&self) -> bool {
        match self {
            Self::Postgres(e) => e.is_closed(),
            Self::MalformedRow(_) => false,
        }
    }
}

pub async fn connect(
    config: config::Db,
) -> Result<(Client, Connection), tokio_postgres::Error> {
    tokio_postgres::connect(&config.url, NoTls)
        .await
        .map(|(client, connection)| (Client(client), connection))
}

pub struct Client(tokio_postgres::Client);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Collection {
    Tickets,
    Purchases,
}

impl Collection {
    pub fn name(self) -> &'static str {
        match self {
            Self::Tickets => "tickets",
            Self::Purchases => "buyedTickets",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Order {
    pub column: &'static str,
    pub ascending: bool,
}

impl Order {
    pub const NEWEST_FIRST: Self = Self {
        column: "created_at",
        ascending: false,
    };
}

impl Client {
    pub async fn select(
        &self,
        collection: Collection,
        order: Option<Order>,
    ) -> Result<Vec<Row>, Error> {
        let sql = select_sql(collection, order);
        Ok(self.0.query(sql.as_str(), &[]).await?)
    }

    pub async fn insert(
        &self,
        collection: Collection,
        values: &[Value<'_>],
    ) -> Result<(), Error> {
        let sql = insert_sql(collection, &columns(values));
        let params = values.iter().map(|(_, value)| *value).collect_vec();
        self.0.execute(sql.as_str(), &params).await?;
        Ok(())
    }

    /// Returns the number of matched rows, which is zero for an unknown `id`.
    pub async fn update(
        &self,
        collection: Collection,
        values: &[Value<'_>],
        id: &(dyn ToSql + Sync),
    ) -> Result<u64, Error> {
        let sql = update_sql(collection, &columns(values));
        let params = values
            .iter()
            .map(|(_, value)| *value)
            .chain([id])
            .collect_vec();
        Ok(self.0.execute(sql.as_str(), &params).await?)
    }

    /// Returns the number of deleted rows.
    pub async fn delete(
        &self,
        collection: Collection,
        id: &(dyn ToSql + Sync),
    ) -> Result<u64, Error> {
        let sql = delete_sql(collection);
        Ok(self.0.execute(sql.as_str(), &[id]).await?)
    }
}

fn columns(values: &[Value<'_>]) -> Vec<&'static str> {
    values.iter().map(|(column, _)| *column).collect()
}

fn select_sql(collection: Collection, order: Option<Order>) -> String {
    let mut sql = format!("SELECT * FROM {}", quote(collection.name()));
    if let Some(Order { column, ascending }) = order {
        let direction = if ascending { "ASC" } else { "DESC" };
        sql += &format!(" ORDER BY {} {direction}", quote(column));
    }
    sql
}

fn insert_sql(collection: Collection, columns: &[&str]) -> String {
    let placeholders = (1..=columns.len()).map(|n| format!("${n}")).join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({placeholders})",
        quote(collection.name()),
        columns.iter().map(|column| quote(column)).join(", "),
    )
}

/// Values bind to `$1..$n` in column order and the id to `$n+1`.
fn update_sql(collection: Collection, columns: &[&str]) -> String {
    let assignments = columns
        .iter()
        .enumerate()
        .map(|(n, column)| format!("{} = ${}", quote(column), n + 1))
        .join(", ");
    format!(
        "UPDATE {} SET {assignments} WHERE \"id\" = ${}",
        quote(collection.name()),
        columns.len() + 1,
    )
}

fn delete_sql(collection: Collection) -> String {
    format!("DELETE FROM {} WHERE \"id\" = $1", quote(collection.name()))
}

// Column names are compile-time constants, so quoting never has to escape.
fn quote(ident: &str) -> String {
    format!("\"{ident}\"")
}
