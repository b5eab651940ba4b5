pub mod purchase;
pub mod ticket;

use serde::{Deserialize, Serialize};

use crate::admin::Desk;

pub use self::{purchase::Purchase, ticket::Ticket};

pub const REGIONS: [&str; 12] = [
    "Sirdaryo",
    "Navoiy",
    "Jizzax",
    "Xorazm",
    "Buxoro",
    "Surxondaryo",
    "Namangan",
    "Andijon",
    "Qashqadaryo",
    "Samarqand",
    "Fargʻona",
    "Toshkent",
];

pub const DEPARTURE_TIMES: [&str; 8] = [
    "06:00", "08:00", "10:00", "12:00", "14:00", "16:00", "18:00", "20:00",
];

pub const BUS_MODELS: [&str; 7] = [
    "Mercedes-Benz",
    "Isuzu",
    "Yutong",
    "Higer",
    "MAN",
    "Scania",
    "Raketa",
];

/// Values offered by the route and ticket pickers.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    pub regions: Vec<String>,
    pub departure_times: Vec<String>,
    pub bus_models: Vec<String>,
}

impl Default for Options {
    fn default() -> Self {
        fn owned(values: &[&str]) -> Vec<String> {
            values.iter().map(|v| (*v).to_owned()).collect()
        }

        Self {
            regions: owned(&REGIONS),
            departure_times: owned(&DEPARTURE_TIMES),
            bus_models: owned(&BUS_MODELS),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub tickets: Vec<Ticket>,
    pub purchases: Vec<Purchase>,
}

impl From<&Desk> for Dashboard {
    fn from(desk: &Desk) -> Self {
        Self {
            tickets: desk.tickets().iter().cloned().map(Ticket::from).collect(),
            purchases: desk
                .purchases()
                .iter()
                .cloned()
                .map(Purchase::from)
                .collect(),
        }
    }
}
