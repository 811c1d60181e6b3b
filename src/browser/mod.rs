pub mod connection;
pub mod launcher;
pub mod session;

pub use connection::{
    connect_over_cdp, wait_for_endpoint, BrowserConnection, BrowserConnector, ChromeConnector,
    ChromeFetcher,
};
pub use launcher::{launch_login_browser, LoginBrowser};
pub use session::BrowserSession;
