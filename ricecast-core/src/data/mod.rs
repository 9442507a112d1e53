//! Source adapters and the canonical CSV store.

pub mod futures;
pub mod provider;
pub mod spreadsheet;
pub mod store;
pub mod yahoo;

pub use futures::{fetch_futures, FuturesRequest, ROUGH_RICE_SYMBOL};
pub use provider::{DataError, FetchReport, FuturesFetch, FuturesProvider, WorkbookSource};
pub use spreadsheet::{
    fetch_spreadsheet, fetch_spreadsheet_with, HttpWorkbookSource, LayoutLocator, Located,
    LocatorChain, WORLD_BANK_CMO_URL,
};
pub use store::{read_series, write_series};
pub use yahoo::YahooProvider;
